//! Long-running background task that polls the Soroban RPC, writes decoded
//! voting events to the database and announces newly counted votes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::events::{VoteNotice, VotingEvent};
use crate::feed::VoteFeed;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
    pub feed: VoteFeed,
}

/// Poll until `cancel` fires. Intended to be spawned as a [`tokio`] task.
pub async fn run(state: Arc<IndexerState>, cancel: CancellationToken) {
    info!("Indexer starting for contract {}", state.config.contract_id);

    // Load the cursor from the DB; fall back to config start_ledger.
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let mut cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);

    let mut current_ledger = if last_ledger > 0 {
        last_ledger as u32
    } else {
        state.config.start_ledger
    };

    info!("Resuming from ledger {current_ledger}");

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = poll_once(&state, current_ledger, cursor.as_deref()) => polled,
        };

        match polled {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => {
                error!("Indexer poll error: {e}");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {current_ledger}");
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    state: &IndexerState,
    start_ledger: u32,
    cursor: Option<&str>,
) -> crate::errors::Result<(u32, Option<String>)> {
    let config = &state.config;
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    let decoded = rpc::decode_events(&raw_events, &config.contract_id);

    // Advance the ledger cursor:
    // - If there is a next_cursor string, keep the same start_ledger so the next
    //   call paginates within the same ledger range.
    // - Otherwise advance to the latest known ledger.
    let next_ledger = latest_ledger
        .map(|l| (l as u32).max(start_ledger))
        .unwrap_or(start_ledger);

    // Events and cursor land together so a restart never skips or re-counts.
    let inserted = db::store_page(
        &state.pool,
        &decoded,
        next_ledger as i64,
        next_cursor.as_deref(),
    )
    .await?;

    if !raw_events.is_empty() {
        info!(
            "Polled {} raw events → {} new records stored",
            raw_events.len(),
            inserted.len()
        );
    }

    announce(&state.feed, &inserted);

    Ok((next_ledger, next_cursor))
}

/// Publish a notice for every newly stored vote; returns how many were sent.
fn announce(feed: &VoteFeed, inserted: &[VotingEvent]) -> usize {
    let mut sent = 0;
    for notice in inserted.iter().filter_map(VoteNotice::from_event) {
        feed.publish(notice);
        sent += 1;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::vote;
    use crate::events::EventKind;

    #[tokio::test]
    async fn only_votes_are_announced() {
        let feed = VoteFeed::new(8);
        let mut rx = feed.subscribe();
        let registration = VotingEvent {
            event_type: EventKind::VoterRegistered.as_str().to_string(),
            proposal_index: None,
            ..vote("r1", "GA", 0, 90)
        };

        let sent = announce(&feed, &[registration, vote("e1", "GA", 4, 100)]);
        assert_eq!(sent, 1);
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.proposal_index, 4);
        assert_eq!(notice.voter.as_deref(), Some("GA"));
        assert!(rx.try_recv().is_err());
    }
}
