use crate::commands::{Context, fatal};
use clap::Subcommand;
use mnemo_records::Repository;

#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    /// Create a publish record for every catalog entry that lacks one
    Seed {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// List the publish records
    List,
}

pub async fn run(ctx: &Context, command: RecordsCommand) -> miette::Result<()> {
    let database = ctx.database().await?;
    let result = match command {
        RecordsCommand::Seed { dry_run } => seed(ctx, Repository::new(database.pool().clone(), dry_run)).await,
        RecordsCommand::List => list(Repository::from(&database)).await,
    };
    database.close().await;
    result
}

async fn seed(ctx: &Context, records: Repository) -> miette::Result<()> {
    let entries = ctx.catalog.iter().map(|entry| (entry.key, entry.title.as_str()));
    let summary = records.seed(entries).await.map_err(fatal)?;
    let verb = if records.is_dry_run() { "Would seed" } else { "Seeded" };
    println!(
        "{verb} {} record(s): {} new, {} renamed, {} unchanged",
        ctx.catalog.len(),
        summary.inserted,
        summary.renamed,
        summary.unchanged
    );
    Ok(())
}

async fn list(records: Repository) -> miette::Result<()> {
    let records = records.list().await.map_err(fatal)?;
    for record in &records {
        println!("{:>4}  {:<40}  {}", record.key, record.title, record.image_url.as_deref().unwrap_or("-"));
    }
    let published = records.iter().filter(|record| record.image_url.is_some()).count();
    println!("{published}/{} published", records.len());
    Ok(())
}
