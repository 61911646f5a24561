//! Soroban RPC client: polls `getEvents` and decodes voting contract events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transport errors (connection reset, timeout) are retried silently. Only
//!   reads go through this client, so a retry can never apply anything twice.
//! * JSON-RPC `-32600` / `-32601` mean the request itself is wrong and are
//!   returned to the caller instead.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, VotingEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct RawEvent {
    /// XDR-decoded topic list
    pub topic: Vec<String>,
    /// XDR-decoded event value / data
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents`: `(events, next_cursor, latest_ledger)`.
pub type EventsPage = (Vec<RawEvent>, Option<String>, Option<u64>);

/// Doubling delay between retries, capped at [`MAX_BACKOFF_SECS`].
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = Backoff::new();

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await
            .map_err(IndexerError::from);

        let resp = match response {
            Err(e) if e.is_transient() => {
                warn!("RPC request failed (will retry in {}s): {e}", backoff.secs);
                backoff.wait().await;
                continue;
            }
            Err(e) => return Err(e),
            Ok(resp) => resp,
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {}s)", backoff.secs);
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if err.code == -32600 || err.code == -32601 {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {}s): {} {}",
                backoff.secs, err.code, err.message
            );
            backoff.wait().await;
            continue;
        }

        let result = body.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok((result.events, result.cursor, result.latest_ledger));
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`VotingEvent`] structs.
///
/// Events from failed contract calls are dropped: they were never applied.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<VotingEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<VotingEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let proposal_index = if kind.is_proposal_scoped() {
        raw.topic
            .get(1)
            .and_then(|t| extract_index(t))
            .or_else(|| {
                extract_field(&raw.value, &["proposal_index", "index"])
                    .and_then(|s| s.parse().ok())
            })
    } else {
        None
    };

    let (actor, detail) = decode_data(&raw.value, &kind);

    let dedup_key = raw.id.clone().unwrap_or_else(|| {
        format!(
            "{}:{}:{}:{}:{}",
            ledger,
            raw.tx_hash.as_deref().unwrap_or(""),
            kind.as_str(),
            proposal_index.map(|i| i.to_string()).unwrap_or_default(),
            actor.as_deref().unwrap_or("")
        )
    });

    Some(VotingEvent {
        dedup_key,
        event_type: kind.as_str().to_string(),
        proposal_index,
        actor,
        detail,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pull apart the JSON `value` blob that Soroban returns for event data.
/// The XDR is decoded by the RPC into a `{"field": …, …}` JSON object.
///
/// Returns `(actor, detail)`.
fn decode_data(value: &Value, kind: &EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::Initialized => {
            let actor = extract_field(value, &["admin", "address"]);
            let detail = json!({
                "registration_deadline": extract_field(value, &["registration_deadline"]),
                "voting_deadline": extract_field(value, &["voting_deadline"]),
                "max_votes_per_voter": extract_field(value, &["max_votes_per_voter"]),
            })
            .to_string();
            (actor, Some(detail))
        }
        EventKind::ProposalRegistered => {
            let actor = extract_field(value, &["proposer", "address"])
                .or_else(|| find_nested(value, "proposer"));
            let detail = value.get("project_name").and_then(decode_project_name);
            (actor, detail)
        }
        EventKind::ProposalStateSet => (None, value.get("state").and_then(state_label)),
        EventKind::VoterRegistered => {
            let actor = value
                .as_str()
                .map(String::from)
                .or_else(|| extract_field(value, &["voter", "address"]));
            (actor, None)
        }
        EventKind::VoteCast => {
            let actor = extract_field(value, &["voter", "address"])
                .or_else(|| find_nested(value, "voter"));
            (actor, None)
        }
        EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => v.get("value").and_then(|inner| match inner {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

fn find_nested(value: &Value, key: &str) -> Option<String> {
    if let Value::Object(map) = value {
        for (k, v) in map {
            if k == key {
                return v.as_str().map(String::from);
            }
            if let Some(found) = find_nested(v, key) {
                return Some(found);
            }
        }
    }
    None
}

/// Extract a Soroban Symbol from the XDR-decoded topic string.
/// The RPC may return `{"type":"symbol","value":"vote_cast"}` or just the raw string.
fn extract_symbol(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    // Fallback: treat the raw string as the symbol
    raw.to_string()
}

/// Extract a proposal index from a topic entry that might be a JSON object or a raw number.
fn extract_index(raw: &str) -> Option<i64> {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(n) = v.as_i64() {
            return Some(n);
        }
        if let Some(inner) = v.get("value") {
            return inner
                .as_i64()
                .or_else(|| inner.as_str().and_then(|s| s.parse().ok()));
        }
    }
    raw.trim().parse().ok()
}

/// Decode the fixed-width `project_name` (hex of 32 zero-padded bytes).
/// Values that are not 32 bytes of hex are passed through unchanged.
fn decode_project_name(value: &Value) -> Option<String> {
    let raw = value
        .as_str()
        .or_else(|| value.get("value").and_then(|v| v.as_str()))?;
    match hex::decode(raw) {
        Ok(bytes) if bytes.len() == 32 => {
            let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
            String::from_utf8(bytes[..end].to_vec()).ok()
        }
        _ => Some(raw.to_string()),
    }
}

/// Map the numeric `ProposalState` code to a label.
fn state_label(value: &Value) -> Option<String> {
    let code = value
        .as_u64()
        .or_else(|| value.get("value").and_then(|v| v.as_u64()));
    match code {
        Some(0) => Some("active".to_string()),
        Some(1) => Some("inactive".to_string()),
        Some(other) => Some(other.to_string()),
        None => value.as_str().map(|s| s.to_lowercase()),
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_event(topic: &[&str], value: Value) -> RawEvent {
        RawEvent {
            topic: topic.iter().map(|t| t.to_string()).collect(),
            value,
            contract_id: Some("CONTRACT1".to_string()),
            tx_hash: Some("TX1".to_string()),
            id: None,
            ledger: Some(1000),
            ledger_closed_at: Some("2024-01-01T00:00:00Z".to_string()),
            in_successful_contract_call: Some(true),
            paging_token: None,
        }
    }

    #[test]
    fn event_kind_from_topic() {
        assert_eq!(EventKind::from_topic("init"), EventKind::Initialized);
        assert_eq!(
            EventKind::from_topic("proposed"),
            EventKind::ProposalRegistered
        );
        assert_eq!(
            EventKind::from_topic("state_set"),
            EventKind::ProposalStateSet
        );
        assert_eq!(EventKind::from_topic("voter_reg"), EventKind::VoterRegistered);
        assert_eq!(EventKind::from_topic("vote_cast"), EventKind::VoteCast);
        assert_eq!(EventKind::from_topic("something_else"), EventKind::Unknown);
    }

    #[test]
    fn event_kind_as_str() {
        assert_eq!(EventKind::Initialized.as_str(), "initialized");
        assert_eq!(EventKind::ProposalRegistered.as_str(), "proposal_registered");
        assert_eq!(EventKind::ProposalStateSet.as_str(), "proposal_state_set");
        assert_eq!(EventKind::VoterRegistered.as_str(), "voter_registered");
        assert_eq!(EventKind::VoteCast.as_str(), "vote_cast");
    }

    #[test]
    fn extract_symbol_from_json() {
        let raw = r#"{"type":"symbol","value":"vote_cast"}"#;
        assert_eq!(extract_symbol(raw), "vote_cast");
    }

    #[test]
    fn extract_symbol_raw_fallback() {
        assert_eq!(extract_symbol("proposed"), "proposed");
    }

    #[test]
    fn extract_index_variants() {
        assert_eq!(extract_index(r#"{"type":"u32","value":4}"#), Some(4));
        assert_eq!(extract_index(r#"{"type":"u32","value":"4"}"#), Some(4));
        assert_eq!(extract_index("7"), Some(7));
        assert_eq!(extract_index("not-a-number"), None);
    }

    #[test]
    fn decode_vote_cast_event() {
        let raw = raw_event(
            &[
                r#"{"type":"symbol","value":"vote_cast"}"#,
                r#"{"type":"u32","value":2}"#,
            ],
            json!({ "voter": "GVOTER1", "proposal_index": 2 }),
        );

        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.event_type, "vote_cast");
        assert_eq!(ev.proposal_index, Some(2));
        assert_eq!(ev.actor.as_deref(), Some("GVOTER1"));
        assert_eq!(ev.ledger, 1000);
        assert_eq!(ev.timestamp, 1_704_067_200);
        assert_eq!(ev.dedup_key, "1000:TX1:vote_cast:2:GVOTER1");
    }

    #[test]
    fn rpc_event_id_is_the_dedup_key() {
        let mut raw = raw_event(
            &["vote_cast", "1"],
            json!({ "voter": "GVOTER1", "proposal_index": 1 }),
        );
        raw.id = Some("0000004294971392-0000000001".to_string());
        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events[0].dedup_key, "0000004294971392-0000000001");
    }

    #[test]
    fn decode_proposal_registered_event() {
        let mut name = b"DAO Governance Tool".to_vec();
        name.resize(32, 0);
        let raw = raw_event(
            &[
                r#"{"type":"symbol","value":"proposed"}"#,
                r#"{"type":"u32","value":0}"#,
            ],
            json!({
                "index": 0,
                "proposer": "GPROPOSER",
                "project_name": hex::encode(&name),
            }),
        );

        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events[0].event_type, "proposal_registered");
        assert_eq!(events[0].proposal_index, Some(0));
        assert_eq!(events[0].actor.as_deref(), Some("GPROPOSER"));
        assert_eq!(events[0].detail.as_deref(), Some("DAO Governance Tool"));
    }

    #[test]
    fn decode_state_set_event() {
        let raw = raw_event(
            &[
                r#"{"type":"symbol","value":"state_set"}"#,
                r#"{"type":"u32","value":3}"#,
            ],
            json!({ "index": 3, "state": 1 }),
        );
        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events[0].event_type, "proposal_state_set");
        assert_eq!(events[0].proposal_index, Some(3));
        assert_eq!(events[0].detail.as_deref(), Some("inactive"));
    }

    #[test]
    fn decode_voter_registered_event() {
        let raw = raw_event(
            &[r#"{"type":"symbol","value":"voter_reg"}"#],
            json!({ "voter": "GVOTER9" }),
        );
        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events[0].event_type, "voter_registered");
        assert_eq!(events[0].proposal_index, None);
        assert_eq!(events[0].actor.as_deref(), Some("GVOTER9"));
    }

    #[test]
    fn failed_contract_calls_are_skipped() {
        let mut raw = raw_event(&["vote_cast", "1"], json!({ "voter": "GVOTER1" }));
        raw.in_successful_contract_call = Some(false);
        assert!(decode_events(&[raw], "CONTRACT1").is_empty());
    }

    #[test]
    fn project_name_passthrough_for_non_hex() {
        assert_eq!(
            decode_project_name(&json!("Cross-Chain Bridge")).as_deref(),
            Some("Cross-Chain Bridge")
        );
    }

    #[test]
    fn parse_iso_timestamp() {
        let ts = parse_iso_to_unix("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, 1_704_067_200);
    }
}
