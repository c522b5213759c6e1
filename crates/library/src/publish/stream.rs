use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::publish::error::Result as PublishResult;
use crate::publish::file::{PublishOutcome, Publisher, restrict};
use crate::resolve::resolve;
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};

/// Progress events emitted by [`publish`] as it works through a pool
/// listing.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Skipped`](Self::Skipped): zero or more times, one per name that is
///    not an artifact.
/// 3. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of keys to publish.
/// 4. [`Published`](Self::Published): zero or more times, one per key in
///    ascending key order.
/// 5. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// Only a key filter that matches nothing terminates the stream early, in
/// which case [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum PublishEvent {
    /// Publishing has begun; emitted exactly once before any other event.
    Started,
    /// A pool entry that does not parse as an artifact name.
    Skipped(String),
    /// The latest version of every key has been resolved.
    DiscoveryComplete(usize),
    /// A key has been published (or has failed to).
    Published(PublishOutcome),
    /// Every key has been attempted; the stream is finished.
    Complete,
}

/// Streams [`PublishEvent`]s while publishing the latest artifact of every
/// key in `listing`, or only of `filter` if given.
///
/// `listing` is expected to be sorted, as returned by
/// [`list_pool`](crate::list_pool); see [`resolve`] for why.
pub fn publish<'a>(
    publisher: &'a Publisher,
    listing: &'a [String],
    filter: Option<u32>,
    skip_record_update: bool,
) -> impl Stream<Item = LibraryResult<PublishEvent>> + 'a {
    stream! {
        for await event in publish_inner(publisher, listing, filter, skip_record_update) {
            yield event.or_raise(|| LibraryErrorKind::Publish);
        }
    }
}

fn publish_inner<'a>(
    publisher: &'a Publisher,
    listing: &'a [String],
    filter: Option<u32>,
    skip_record_update: bool,
) -> impl Stream<Item = PublishResult<PublishEvent>> + 'a {
    stream!({
        yield Ok(PublishEvent::Started);

        let resolution = resolve(listing);
        for raw_name in &resolution.skipped {
            tracing::debug!(%raw_name, "Skipping file that is not an artifact");
            yield Ok(PublishEvent::Skipped(raw_name.clone()));
        }

        let targets = match restrict(&resolution, filter) {
            Ok(t) => t,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(PublishEvent::DiscoveryComplete(targets.len()));

        for (key, raw_name) in targets {
            yield Ok(PublishEvent::Published(publisher.publish_file(key, &raw_name, skip_record_update).await));
        }

        yield Ok(PublishEvent::Complete);
    })
}

/// Totals of a publish run.
#[derive(Debug, Default)]
pub struct PublishSummary {
    /// One outcome per key, ascending.
    pub outcomes: Vec<PublishOutcome>,
    /// Pool entries that are not artifacts.
    pub skipped: Vec<String>,
}
impl PublishSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded()).count()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }
}

impl Publisher {
    /// Publish every resolved key of `listing` and collect the outcomes.
    ///
    /// Per-key failures are counted, never raised. The only error is a
    /// `filter` key that has no artifact.
    pub async fn publish_all(
        &self,
        listing: &[String],
        filter: Option<u32>,
        skip_record_update: bool,
    ) -> LibraryResult<PublishSummary> {
        let mut summary = PublishSummary::default();
        let mut events = std::pin::pin!(publish(self, listing, filter, skip_record_update));
        while let Some(event) = events.next().await {
            match event? {
                PublishEvent::Skipped(raw_name) => summary.skipped.push(raw_name),
                PublishEvent::Published(outcome) => summary.outcomes.push(outcome),
                PublishEvent::Started | PublishEvent::DiscoveryComplete(_) | PublishEvent::Complete => {},
            }
        }
        tracing::info!(succeeded = summary.succeeded(), attempted = summary.attempted(), "Publishing finished");
        Ok(summary)
    }
}
