// ABOUTME: Core sync engine: fetch, order, filter, publish, checkpoint
// ABOUTME: Items are strictly sequential; media downloads within an item are not

use crate::checkpoint::CheckpointStore;
use crate::content;
use crate::media::{MediaAsset, MediaFetcher};
use crate::publish::{PublishOutcome, Publisher};
use crate::source::EventSource;
use crate::Result;
use std::thread;
use std::time::Duration;

/// Pause between publish attempts, for the destination's rate limits.
const ITEM_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub published: usize,
    pub skipped_duplicates: usize,
    pub skipped_replies: usize,
    pub failed: usize,
}

pub struct SyncEngine<S: EventSource> {
    source: S,
    publisher: Box<dyn Publisher>,
    fetcher: Box<dyn MediaFetcher>,
    store: CheckpointStore,
    item_delay: Duration,
}

impl<S: EventSource> SyncEngine<S> {
    pub fn new(
        source: S,
        publisher: Box<dyn Publisher>,
        fetcher: Box<dyn MediaFetcher>,
        store: CheckpointStore,
    ) -> Self {
        SyncEngine {
            source,
            publisher,
            fetcher,
            store,
            item_delay: ITEM_DELAY,
        }
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    /// One sync pass: fetch everything newer than the checkpoint, publish in
    /// authorship order, advancing the checkpoint after each success. A failed
    /// item never aborts the batch; a checkpoint write failure always does.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut checkpoint = self.store.load();

        println!(
            "Fetching posts since {}...",
            format_timestamp(checkpoint.last_synced_timestamp)
        );
        let mut events = self.source.fetch_since(checkpoint.last_synced_timestamp)?;

        // Publication order must match authorship order; relays return
        // events in whatever order they like.
        events.sort_by_key(|event| event.created_at);

        let mut summary = RunSummary {
            fetched: events.len(),
            ..RunSummary::default()
        };

        if events.is_empty() {
            println!("No new posts found.");
            return Ok(summary);
        }
        println!("Found {} new post(s).", events.len());

        // Set by the first failed item so the checkpoint timestamp never
        // moves past it; the item then stays inside the next fetch window.
        let mut ts_ceiling: Option<u64> = None;

        for event in &events {
            if checkpoint.is_duplicate(&event.id) {
                summary.skipped_duplicates += 1;
                continue;
            }
            if event.is_reply() {
                println!("  skipping reply {}", event.short_id());
                summary.skipped_replies += 1;
                continue;
            }

            let draft = content::extract_media(&event.content);
            let preview: String = draft.text.chars().take(50).collect();
            println!(
                "  processing {} from {}: \"{}\"",
                event.short_id(),
                format_timestamp(event.created_at),
                preview
            );

            let assets = self.resolve_all(&draft.media_urls);

            match self.publisher.publish(&draft.text, &assets) {
                Ok(PublishOutcome::Posted { post_id }) => {
                    let effective_ts = match ts_ceiling {
                        Some(ceiling) => event.created_at.min(ceiling),
                        None => event.created_at,
                    };
                    checkpoint.record_published(&event.id, effective_ts);
                    self.store.save(&checkpoint)?;
                    summary.published += 1;
                    println!("  posted {} as {}", event.short_id(), post_id);
                }
                Ok(PublishOutcome::DryRun) => {
                    // Nothing recorded: the next run re-evaluates this item.
                }
                Err(e) => {
                    eprintln!("  failed to publish {}: {}", event.short_id(), e);
                    summary.failed += 1;
                    ts_ceiling.get_or_insert(event.created_at.saturating_sub(1));
                }
            }

            // assets drop here, removing their files before the next item.
            drop(assets);
            thread::sleep(self.item_delay);
        }

        println!(
            "Sync complete: {} published, {} duplicates skipped, {} replies skipped, {} failed.",
            summary.published, summary.skipped_duplicates, summary.skipped_replies, summary.failed
        );

        Ok(summary)
    }

    /// Download all media for one item concurrently; failures drop the asset
    /// and the post goes out with whatever resolved.
    fn resolve_all(&self, urls: &[String]) -> Vec<MediaAsset> {
        if urls.is_empty() {
            return Vec::new();
        }
        println!("    downloading {} media item(s)", urls.len());

        let fetcher = self.fetcher.as_ref();
        thread::scope(|scope| {
            let handles: Vec<_> = urls
                .iter()
                .map(|url| scope.spawn(move || fetcher.resolve(url)))
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(Ok(asset)) => Some(asset),
                    Ok(Err(e)) => {
                        eprintln!("    warning: {}", e);
                        None
                    }
                    Err(_) => None,
                })
                .collect()
        })
    }
}

fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
