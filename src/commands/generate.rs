use crate::commands::{Context, fatal, summary};
use clap::Args;
use clap::builder::RangedU64ValueParser;
use futures::StreamExt;
use mnemo_catalog::VersionLabel;
use mnemo_library::generate::{Driver, GenerateEvent, GenerateOutcome, GenerateStatus, Selection, generate, select_batch};
use std::pin::pin;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// How many missing entries to generate [default: generator.batch_size]
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub batch_size: Option<usize>,

    /// Comma-separated catalog keys, generated in the given order
    #[arg(long, value_delimiter = ',', conflicts_with = "batch_size")]
    pub keys: Option<Vec<u32>>,

    /// Version label for the new artifacts, e.g. `v2`
    #[arg(long, value_parser = parse_label)]
    pub label: Option<VersionLabel>,

    /// Report what would be generated without calling the generator
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_label(value: &str) -> Result<VersionLabel, String> {
    value.parse::<VersionLabel>().map_err(|e| (*e).to_string())
}

fn describe(outcome: &GenerateOutcome) -> String {
    let key = outcome.key;
    let name = outcome.filename.as_deref().unwrap_or("-");
    match &outcome.status {
        GenerateStatus::Written { size } => format!("  ok       {key:>4}  {name} ({size} bytes)"),
        GenerateStatus::Planned => format!("  planned  {key:>4}  {name}"),
        GenerateStatus::Failed(e) => format!("  failed   {key:>4}  {name}: {}", &**e),
    }
}

fn nothing_to_do() -> String {
    format!("Nothing to generate: every catalog entry has an artifact.\n{}", summary(0, 0))
}

pub async fn run(ctx: &Context, args: GenerateArgs) -> miette::Result<()> {
    let pool = ctx.pool()?;
    let keys = match args.keys {
        Some(keys) => keys,
        None => {
            let listing = ctx.listing(&pool).await?;
            let n = args.batch_size.unwrap_or(ctx.config.generator.batch_size);
            match select_batch(&ctx.catalog, &listing, n) {
                Selection::Keys(keys) => keys,
                Selection::NothingToDo => {
                    println!("{}", nothing_to_do());
                    return Ok(());
                },
            }
        },
    };

    let driver = if args.dry_run {
        Driver::dry_run(pool)
    } else {
        Driver::new(pool, ctx.generator()?, ctx.prompts()?)
    };

    let (mut succeeded, mut attempted) = (0, 0);
    let mut events = pin!(generate(&driver, &ctx.catalog, &keys, args.label.as_ref()));
    while let Some(event) = events.next().await {
        match event.map_err(fatal)? {
            GenerateEvent::Selected(n) if driver.is_dry_run() => println!("Would generate {n} artifact(s):"),
            GenerateEvent::Selected(n) => println!("Generating {n} artifact(s):"),
            GenerateEvent::Generated(outcome) => {
                attempted += 1;
                if outcome.succeeded() {
                    succeeded += 1;
                }
                println!("{}", describe(&outcome));
            },
            GenerateEvent::Started | GenerateEvent::Complete => {},
        }
    }
    println!("{}", summary(succeeded, attempted));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v2", Some(2))]
    #[case("V3", Some(3))]
    #[case("4", Some(4))]
    #[case("v0", None)]
    #[case("latest", None)]
    fn test_parse_label(#[case] value: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_label(value).ok().map(|l| l.version()), expected);
    }

    #[test]
    fn test_describe() {
        let outcome = GenerateOutcome {
            key: 1,
            filename: Some("001_two_sum.png".to_string()),
            status: GenerateStatus::Written { size: 2048 },
        };
        assert_eq!(describe(&outcome), "  ok          1  001_two_sum.png (2048 bytes)");
        let outcome = GenerateOutcome { key: 53, filename: None, status: GenerateStatus::Planned };
        assert_eq!(describe(&outcome), "  planned    53  -");
    }

    #[test]
    fn test_nothing_to_do_ends_with_summary() {
        assert!(nothing_to_do().ends_with("\n0/0 succeeded"));
    }
}
