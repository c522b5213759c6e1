//! `mnemo`: generate, version and publish the mnemonic image of every
//! catalog entry.

mod commands;
mod logging;

use crate::commands::{Context, GenerateArgs, PublishArgs, RecordsCommand};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mnemo", about = "Generate, version and publish catalog mnemonic images", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file merged on top of the discovered ones
    #[arg(long, global = true, env = "MNEMO_CONFIG")]
    config: Option<PathBuf>,

    /// More logging (repeat for even more)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the catalog entries
    Catalog,
    /// Show which catalog entries have an artifact in the pool
    Status,
    /// Generate missing artifacts
    Generate(GenerateArgs),
    /// Publish the latest artifact of every key
    Publish(PublishArgs),
    /// Manage the publish records
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // `MNEMO_CONFIG` and `RUST_LOG` may come from the environment files.
    let dotenv_failures = mnemo_config::load_dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    for (file, error) in dotenv_failures {
        tracing::warn!(file, %error, "Ignoring unreadable environment file");
    }

    let ctx = Context::load(cli.config)?;
    match cli.command {
        Command::Catalog => commands::catalog::run(&ctx),
        Command::Status => commands::status::run(&ctx).await,
        Command::Generate(args) => commands::generate::run(&ctx, args).await,
        Command::Publish(args) => commands::publish::run(&ctx, args).await,
        Command::Records { command } => commands::records::run(&ctx, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mnemo", "status", "-vv", "--config", "mnemo.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("mnemo.yaml")));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["mnemo", "-v", "-q", "status"]).is_err());
    }

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from(["mnemo", "generate", "--keys", "1,53,1", "--label", "v2", "--dry-run"]).unwrap();
        let Command::Generate(args) = cli.command else { panic!("expected generate") };
        assert_eq!(args.keys, Some(vec![1, 53, 1]));
        assert_eq!(args.label.map(|l| l.version()), Some(2));
        assert!(args.dry_run);
    }

    #[test]
    fn test_generate_rejects_bad_input() {
        assert!(Cli::try_parse_from(["mnemo", "generate", "--label", "v0"]).is_err());
        assert!(Cli::try_parse_from(["mnemo", "generate", "--batch-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["mnemo", "generate", "--keys", "1,two"]).is_err());
        assert!(Cli::try_parse_from(["mnemo", "generate", "--keys", "1", "--batch-size", "3"]).is_err());
    }

    #[test]
    fn test_publish_arguments() {
        let cli = Cli::try_parse_from(["mnemo", "publish", "--key", "53", "--upload-only"]).unwrap();
        let Command::Publish(args) = cli.command else { panic!("expected publish") };
        assert_eq!(args.key, Some(53));
        assert!(args.upload_only);
        assert!(!args.dry_run);
        assert!(!args.list);
    }

    #[test]
    fn test_records_subcommands() {
        let cli = Cli::try_parse_from(["mnemo", "records", "seed", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Command::Records { command: RecordsCommand::Seed { dry_run: true } }));
        let cli = Cli::try_parse_from(["mnemo", "records", "list"]).unwrap();
        assert!(matches!(cli.command, Command::Records { command: RecordsCommand::List }));
    }
}
