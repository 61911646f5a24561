//! In-process push channel for counted votes and the live tally fed by it.
//!
//! The indexer publishes a [`VoteNotice`] for every newly stored `vote_cast`
//! event. Subscribers that fall behind lose notices rather than blocking the
//! indexer; [`LiveTally`] therefore never accumulates deltas and instead
//! re-reads the counts from the database whenever it is woken up.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db;
use crate::errors::Result;
use crate::events::{ProposalTally, VoteNotice};

/// Fan-out of vote notices to any number of observers.
#[derive(Clone)]
pub struct VoteFeed {
    sender: broadcast::Sender<VoteNotice>,
}

impl VoteFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many observers received the notice.
    pub fn publish(&self, notice: VoteNotice) -> usize {
        // No subscribers is not an error.
        self.sender.send(notice).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteNotice> {
        self.sender.subscribe()
    }
}

/// Current vote count per proposal index.
#[derive(Clone, Default)]
pub struct LiveTally {
    counts: Arc<RwLock<BTreeMap<i64, i64>>>,
}

impl LiveTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-memory counts with the ones stored in the database.
    pub async fn reconcile(&self, pool: &SqlitePool) -> Result<()> {
        let tallies = db::get_tallies(pool).await?;
        let fresh: BTreeMap<i64, i64> = tallies
            .into_iter()
            .map(|t| (t.proposal_index, t.votes))
            .collect();
        *self.counts.write().await = fresh;
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<ProposalTally> {
        self.counts
            .read()
            .await
            .iter()
            .map(|(&proposal_index, &votes)| ProposalTally {
                proposal_index,
                votes,
            })
            .collect()
    }

    pub async fn get(&self, proposal_index: i64) -> i64 {
        self.counts
            .read()
            .await
            .get(&proposal_index)
            .copied()
            .unwrap_or(0)
    }
}

/// Keep `tally` current until `cancel` fires.
pub async fn run_live_tally(
    pool: SqlitePool,
    tally: LiveTally,
    mut notices: broadcast::Receiver<VoteNotice>,
    cancel: CancellationToken,
) {
    if let Err(e) = tally.reconcile(&pool).await {
        warn!("Initial tally load failed: {e}");
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Live tally stopped");
                return;
            }
            received = notices.recv() => match received {
                Ok(notice) => {
                    debug!(
                        "Vote for proposal {} at ledger {}",
                        notice.proposal_index, notice.ledger
                    );
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Live tally lagged behind by {missed} notices, resyncing");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Vote feed closed, live tally stopping");
                    return;
                }
            },
        }

        if let Err(e) = tally.reconcile(&pool).await {
            warn!("Live tally refresh failed: {e}");
        }
    }
}
