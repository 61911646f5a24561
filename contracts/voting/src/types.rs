//! # Types
//!
//! Shared data structures used across all modules of the voting contract.
//!
//! ## Design decisions
//!
//! ### Info / Tally split
//!
//! A `Proposal` is internally stored as two separate ledger entries:
//!
//! - [`ProposalInfo`]: written once at registration; never mutated.
//! - [`ProposalTally`]: written on every accepted vote and on admin state changes.
//!
//! The public API exposes the reconstructed [`Proposal`] struct for convenience.
//!
//! ### Lifecycles
//!
//! ```text
//! Proposal:  Active ◄──► Inactive          (admin controlled, orthogonal to voting)
//! Voter:     Unregistered ──► Registered ──► Voted   (no skips, no reversal)
//! Phase:     Registration ──► Voting ──► Closed      (derived from ledger time)
//! ```

use soroban_sdk::{contracttype, Address, BytesN, String, Vec};

/// Administrative state of a proposal. Votes are only accepted while `Active`.
///
/// Numeric codes are part of the wire format (`0 = Active`).
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProposalState {
    Active = 0,
    Inactive = 1,
}

/// Time window the contract is currently in.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Phase {
    /// `now < registration_deadline`: proposals and voters may register.
    Registration = 0,
    /// `registration_deadline <= now < voting_deadline`: votes are accepted.
    Voting = 1,
    /// `now >= voting_deadline`: read-only.
    Closed = 2,
}

/// Where a voter stands in the `Unregistered -> Registered -> Voted` lifecycle.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum VoterStatus {
    Unregistered = 0,
    Registered = 1,
    Voted = 2,
}

/// Deployment parameters, fixed by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractParams {
    /// Ledger timestamp at which proposal registration closes and voting opens.
    pub registration_deadline: u64,
    /// Ledger timestamp at which voting closes.
    pub voting_deadline: u64,
    /// Maximum number of proposals a voter may select in their single vote.
    pub max_votes_per_voter: u32,
}

/// Immutable proposal data, written once at registration.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalInfo {
    pub index: u32,
    pub proposer: Address,
    pub project_name: BytesN<32>,
    pub team_name: String,
    pub git_address: String,
    pub image_url: String,
    pub participant1: String,
    pub participant2: String,
}

/// Mutable proposal data. Kept small since it is rewritten on every vote.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalTally {
    pub vote_count: u32,
    pub state: ProposalState,
}

/// Full representation of a registered proposal.
///
/// Used as the public API return type; reconstructed internally from
/// the split `ProposalInfo` + `ProposalTally` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    /// Zero-based registration index; also the identifier used when voting.
    pub index: u32,
    /// Account that registered the proposal.
    pub proposer: Address,
    /// Fixed-width project name (see [`crate::name`]).
    pub project_name: BytesN<32>,
    pub team_name: String,
    pub git_address: String,
    /// Content-store URL of the project image (e.g. an IPFS gateway link).
    pub image_url: String,
    pub participant1: String,
    pub participant2: String,
    /// Number of accepted votes that selected this proposal.
    pub vote_count: u32,
    pub state: ProposalState,
}

/// Registration record of a voter.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Voter {
    pub registered: bool,
    pub voted: bool,
    /// Capability issued by `register_voter`, required by `cast_vote`.
    pub voting_token: BytesN<32>,
    /// Ledger timestamp of registration.
    pub registered_at: u64,
}

/// Returned by `cast_vote` once the vote has been applied.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteReceipt {
    pub voter: Address,
    pub proposal_indices: Vec<u32>,
    pub ledger: u32,
    pub timestamp: u64,
}
