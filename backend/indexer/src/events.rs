//! Canonical event types emitted by the voting contract.
//!
//! These mirror the Soroban contract events defined in `contracts/voting/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the voting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The contract was initialised (`init` topic).
    Initialized,
    /// A project proposal was registered (`proposed` topic).
    ProposalRegistered,
    /// The admin changed a proposal's state (`state_set` topic).
    ProposalStateSet,
    /// A voter spent a registration token (`voter_reg` topic).
    VoterRegistered,
    /// A vote was counted for one proposal (`vote_cast` topic).
    VoteCast,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "init" => Self::Initialized,
            "proposed" => Self::ProposalRegistered,
            "state_set" => Self::ProposalStateSet,
            "voter_reg" => Self::VoterRegistered,
            "vote_cast" => Self::VoteCast,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::ProposalRegistered => "proposal_registered",
            Self::ProposalStateSet => "proposal_state_set",
            Self::VoterRegistered => "voter_registered",
            Self::VoteCast => "vote_cast",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds whose second topic is the proposal index.
    pub fn is_proposal_scoped(&self) -> bool {
        matches!(
            self,
            Self::ProposalRegistered | Self::ProposalStateSet | Self::VoteCast
        )
    }
}

/// A fully decoded voting event, ready to be stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingEvent {
    /// Uniqueness key; re-inserting an event with a known key is a no-op.
    pub dedup_key: String,
    pub event_type: String,
    pub proposal_index: Option<i64>,
    /// Proposer, voter or admin address, depending on the kind.
    pub actor: Option<String>,
    /// Kind-specific payload: project name, new proposal state, or init parameters.
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub proposal_index: Option<i64>,
    pub actor: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Per-proposal vote count derived from stored `vote_cast` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProposalTally {
    pub proposal_index: i64,
    pub votes: i64,
}

/// What the indexer has observed about one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterActivity {
    pub address: String,
    pub registered: bool,
    pub voted: bool,
    /// Proposal indices this address voted for, ascending.
    pub voted_for: Vec<i64>,
}

/// Push notification for one counted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteNotice {
    pub voter: Option<String>,
    pub proposal_index: i64,
    pub ledger: i64,
    pub tx_hash: Option<String>,
}

impl VoteNotice {
    /// Build a notice from a stored `vote_cast` event; `None` for any other kind.
    pub fn from_event(event: &VotingEvent) -> Option<Self> {
        if event.event_type != EventKind::VoteCast.as_str() {
            return None;
        }
        Some(VoteNotice {
            voter: event.actor.clone(),
            proposal_index: event.proposal_index?,
            ledger: event.ledger,
            tx_hash: event.tx_hash.clone(),
        })
    }
}
