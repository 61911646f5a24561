//! Database layer: migrations, queries, and cursor management.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::events::{EventKind, EventRecord, ProposalTally, VoterActivity, VotingEvent};

const EVENT_COLUMNS: &str = "id, event_type, proposal_index, actor, detail, ledger, timestamp, \
                             contract_id, tx_hash, created_at";

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let url = if url.contains('?') || url.contains(":memory:") {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist one polled page and advance the cursor in a single transaction.
///
/// Events whose `dedup_key` is already stored are ignored, so a page that is
/// fetched twice (crash between fetch and commit, overlapping ranges) changes
/// nothing. Returns the events that were actually new.
pub async fn store_page(
    pool: &SqlitePool,
    events: &[VotingEvent],
    next_ledger: i64,
    next_cursor: Option<&str>,
) -> Result<Vec<VotingEvent>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::new();

    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (dedup_key, event_type, proposal_index, actor, detail,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ev.dedup_key)
        .bind(&ev.event_type)
        .bind(ev.proposal_index)
        .bind(&ev.actor)
        .bind(&ev.detail)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected > 0 {
            inserted.push(ev.clone());
        }
    }

    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(next_ledger)
        .bind(next_cursor)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(inserted)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events for a given proposal, ordered by ledger ascending.
pub async fn get_events_for_proposal(
    pool: &SqlitePool,
    proposal_index: i64,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE proposal_index = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(proposal_index)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// `vote_cast` events within an inclusive ledger range; open ends are unbounded.
pub async fn get_vote_history(
    pool: &SqlitePool,
    from_ledger: Option<i64>,
    to_ledger: Option<i64>,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE event_type = ?1 AND ledger >= ?2 AND ledger <= ?3 \
         ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(EventKind::VoteCast.as_str())
        .bind(from_ledger.unwrap_or(0))
        .bind(to_ledger.unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Vote counts per proposal, ascending by index. Proposals without votes are omitted.
///
/// A voter counts at most once per proposal even if the same vote was
/// delivered under two different keys.
pub async fn get_tallies(pool: &SqlitePool) -> Result<Vec<ProposalTally>> {
    let rows = sqlx::query_as::<_, ProposalTally>(
        r#"
        SELECT proposal_index, COUNT(DISTINCT COALESCE(actor, dedup_key)) AS votes
        FROM   events
        WHERE  event_type = ?1 AND proposal_index IS NOT NULL
        GROUP  BY proposal_index
        ORDER  BY proposal_index ASC
        "#,
    )
    .bind(EventKind::VoteCast.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Vote count for one proposal; `0` when no vote was indexed for it.
pub async fn get_proposal_tally(pool: &SqlitePool, proposal_index: i64) -> Result<ProposalTally> {
    let (votes,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT COALESCE(actor, dedup_key))
        FROM   events
        WHERE  event_type = ?1 AND proposal_index = ?2
        "#,
    )
    .bind(EventKind::VoteCast.as_str())
    .bind(proposal_index)
    .fetch_one(pool)
    .await?;
    Ok(ProposalTally {
        proposal_index,
        votes,
    })
}

/// Registration and voting activity observed for `address`.
pub async fn get_voter_activity(pool: &SqlitePool, address: &str) -> Result<VoterActivity> {
    let (registrations,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_type = ?1 AND actor = ?2")
            .bind(EventKind::VoterRegistered.as_str())
            .bind(address)
            .fetch_one(pool)
            .await?;

    let voted_for: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT proposal_index
        FROM   events
        WHERE  event_type = ?1 AND actor = ?2 AND proposal_index IS NOT NULL
        ORDER  BY proposal_index ASC
        "#,
    )
    .bind(EventKind::VoteCast.as_str())
    .bind(address)
    .fetch_all(pool)
    .await?;

    let voted_for: Vec<i64> = voted_for.into_iter().map(|(i,)| i).collect();
    Ok(VoterActivity {
        address: address.to_string(),
        registered: registrations > 0 || !voted_for.is_empty(),
        voted: !voted_for.is_empty(),
        voted_for,
    })
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[cfg(test)]
pub(crate) fn vote(key: &str, voter: &str, proposal_index: i64, ledger: i64) -> VotingEvent {
    VotingEvent {
        dedup_key: key.to_string(),
        event_type: EventKind::VoteCast.as_str().to_string(),
        proposal_index: Some(proposal_index),
        actor: Some(voter.to_string()),
        detail: None,
        ledger,
        timestamp: 1_704_067_200,
        contract_id: "CONTRACT1".to_string(),
        tx_hash: Some(format!("tx-{key}")),
    }
}
