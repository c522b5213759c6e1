use crate::commands::{Context, fatal, summary};
use clap::Args;
use futures::StreamExt;
use mnemo_library::publish::error::ErrorKind as PublishErrorKind;
use mnemo_library::publish::{PublishEvent, PublishOutcome, Publisher, RecordStatus, publish, resolve_targets};
use mnemo_records::Repository;
use std::pin::pin;

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Only publish the artifact of this catalog key
    #[arg(long)]
    pub key: Option<u32>,

    /// Upload without updating the publish records
    #[arg(long)]
    pub upload_only: bool,

    /// Report what would be published without touching the remote store or
    /// the records
    #[arg(long)]
    pub dry_run: bool,

    /// Only list the artifacts that would be published
    #[arg(long, conflicts_with_all = ["upload_only", "dry_run"])]
    pub list: bool,
}

fn describe(outcome: &PublishOutcome) -> String {
    let (key, name) = (outcome.key, &outcome.raw_name);
    match (&outcome.public_url, &outcome.record) {
        (Err(e), _) => format!("  failed   {key:>4}  {name}: {}", &**e),
        (Ok(url), RecordStatus::Updated | RecordStatus::NotRequested) => format!("  ok       {key:>4}  {name} -> {url}"),
        (Ok(url), RecordStatus::Missing) => format!("  failed   {key:>4}  {name} -> {url}: no publish record"),
        (Ok(url), RecordStatus::Failed(e)) => format!("  failed   {key:>4}  {name} -> {url}: {}", &**e),
        (Ok(url), RecordStatus::NotAttempted) => format!("  failed   {key:>4}  {name} -> {url}"),
    }
}

/// The line reported when `key` was requested but has no artifact in
/// `listing`.
fn missing_target(listing: &[String], key: Option<u32>) -> Option<String> {
    match resolve_targets(listing, key) {
        Err(e) => match &*e {
            PublishErrorKind::NotFound(key) => Some(format!("No artifact found for key {key}.")),
            _ => None,
        },
        Ok(_) => None,
    }
}

pub async fn run(ctx: &Context, args: PublishArgs) -> miette::Result<()> {
    let pool = ctx.pool()?;
    let listing = ctx.listing(&pool).await?;

    // Not fatal: reported like any other per-key failure.
    if let Some(line) = missing_target(&listing, args.key) {
        tracing::warn!(key = args.key, "Requested key has no artifact in the pool");
        println!("{line}");
        println!("{}", summary(0, 0));
        return Ok(());
    }

    if args.list {
        let targets = resolve_targets(&listing, args.key).map_err(fatal)?;
        for (key, raw_name) in &targets {
            println!("{key:>4}  {raw_name}");
        }
        println!("{} artifact(s)", targets.len());
        return Ok(());
    }

    let (publisher, database) = if args.dry_run {
        (Publisher::dry_run(pool), None)
    } else {
        let remote = ctx.remote()?;
        let database = ctx.database().await?;
        (Publisher::new(pool, remote, Repository::from(&database)), Some(database))
    };

    let (mut succeeded, mut attempted, mut skipped) = (0, 0, 0);
    let mut events = pin!(publish(&publisher, &listing, args.key, args.upload_only));
    while let Some(event) = events.next().await {
        match event.map_err(fatal)? {
            PublishEvent::Skipped(_) => skipped += 1,
            PublishEvent::DiscoveryComplete(n) if publisher.is_dry_run() => println!("Would publish {n} artifact(s):"),
            PublishEvent::DiscoveryComplete(n) => println!("Publishing {n} artifact(s):"),
            PublishEvent::Published(outcome) => {
                attempted += 1;
                if outcome.succeeded() {
                    succeeded += 1;
                }
                println!("{}", describe(&outcome));
            },
            PublishEvent::Started | PublishEvent::Complete => {},
        }
    }
    if skipped > 0 {
        println!("Ignored {skipped} file(s) that are not artifacts.");
    }
    println!("{}", summary(succeeded, attempted));

    if let Some(database) = database {
        database.close().await;
    }
    Ok(())
}
