//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the
//! voting contract:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type             | Description                         |
//! |------------------|------------------|-------------------------------------|
//! | `Admin`          | `Address`        | Account allowed to administer       |
//! | `Params`         | `ContractParams` | Deadlines and vote ceiling          |
//! | `ProposalCount`  | `u32`            | Auto-increment proposal index       |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                   | Type            | Description                          |
//! |-----------------------|-----------------|--------------------------------------|
//! | `PropInfo(index)`     | `ProposalInfo`  | Immutable proposal data              |
//! | `PropTally(index)`    | `ProposalTally` | Vote count and admin state           |
//! | `Voter(address)`      | `Voter`         | Registration / vote flags and token  |
//! | `RegToken(hash)`      | `bool`          | Registration token commitment, `true` once consumed |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## Why split Info and Tally?
//!
//! Every accepted vote rewrites the tally of each selected proposal. The
//! tally entry is a few bytes; the info entry carries five strings. Writing
//! only the tally keeps vote transactions cheap.

use soroban_sdk::{contracttype, Address, BytesN, Env};

use crate::types::{ContractParams, Proposal, ProposalInfo, ProposalTally, Voter};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Administrator address (Instance).
    Admin,
    /// Deployment parameters (Instance).
    Params,
    /// Number of registered proposals, i.e. the next index (Instance).
    ProposalCount,
    /// Immutable proposal data keyed by index (Persistent).
    PropInfo(u32),
    /// Mutable proposal tally keyed by index (Persistent).
    PropTally(u32),
    /// Voter record keyed by address (Persistent).
    Voter(Address),
    /// SHA-256 commitment of a registration token (Persistent).
    RegToken(BytesN<32>),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

/// Store the administrator and the deployment parameters in one go.
pub fn save_config(env: &Env, admin: &Address, params: &ContractParams) {
    env.storage().instance().set(&DataKey::Admin, admin);
    env.storage().instance().set(&DataKey::Params, params);
    env.storage().instance().set(&DataKey::ProposalCount, &0u32);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Admin)
}

pub fn get_params(env: &Env) -> Option<ContractParams> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Params)
}

pub fn get_proposal_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::ProposalCount)
        .unwrap_or(0)
}

/// Reads, increments, and stores the proposal counter.
/// Returns the index to use for the *current* proposal (pre-increment value).
pub fn get_and_increment_proposal_index(env: &Env) -> Result<u32, Error> {
    bump_instance(env);
    let current = get_proposal_count(env);
    let next = current.checked_add(1).ok_or(Error::Overflow)?;
    env.storage()
        .instance()
        .set(&DataKey::ProposalCount, &next);
    Ok(current)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save both the immutable info and the initial tally for a new proposal.
pub fn save_proposal(env: &Env, proposal: &Proposal) {
    let info_key = DataKey::PropInfo(proposal.index);
    let tally_key = DataKey::PropTally(proposal.index);

    let info = ProposalInfo {
        index: proposal.index,
        proposer: proposal.proposer.clone(),
        project_name: proposal.project_name.clone(),
        team_name: proposal.team_name.clone(),
        git_address: proposal.git_address.clone(),
        image_url: proposal.image_url.clone(),
        participant1: proposal.participant1.clone(),
        participant2: proposal.participant2.clone(),
    };

    let tally = ProposalTally {
        vote_count: proposal.vote_count,
        state: proposal.state,
    };

    env.storage().persistent().set(&info_key, &info);
    env.storage().persistent().set(&tally_key, &tally);
    bump_persistent(env, &info_key);
    bump_persistent(env, &tally_key);
}

/// Load the full `Proposal` by combining info and tally.
pub fn load_proposal(env: &Env, index: u32) -> Option<Proposal> {
    let info_key = DataKey::PropInfo(index);
    let info: ProposalInfo = env.storage().persistent().get(&info_key)?;
    bump_persistent(env, &info_key);
    let tally = load_proposal_tally(env, index)?;
    Some(Proposal {
        index: info.index,
        proposer: info.proposer,
        project_name: info.project_name,
        team_name: info.team_name,
        git_address: info.git_address,
        image_url: info.image_url,
        participant1: info.participant1,
        participant2: info.participant2,
        vote_count: tally.vote_count,
        state: tally.state,
    })
}

/// Load only the mutable proposal tally.
pub fn load_proposal_tally(env: &Env, index: u32) -> Option<ProposalTally> {
    let key = DataKey::PropTally(index);
    let tally: ProposalTally = env.storage().persistent().get(&key)?;
    bump_persistent(env, &key);
    Some(tally)
}

/// Save only the mutable proposal tally (votes and state changes).
pub fn save_proposal_tally(env: &Env, index: u32, tally: &ProposalTally) {
    let key = DataKey::PropTally(index);
    env.storage().persistent().set(&key, tally);
    bump_persistent(env, &key);
}

pub fn load_voter(env: &Env, address: &Address) -> Option<Voter> {
    let key = DataKey::Voter(address.clone());
    let voter: Voter = env.storage().persistent().get(&key)?;
    bump_persistent(env, &key);
    Some(voter)
}

pub fn save_voter(env: &Env, address: &Address, voter: &Voter) {
    let key = DataKey::Voter(address.clone());
    env.storage().persistent().set(&key, voter);
    bump_persistent(env, &key);
}

/// Returns `None` for an unknown commitment, otherwise whether it was consumed.
pub fn registration_token_consumed(env: &Env, commitment: &BytesN<32>) -> Option<bool> {
    let key = DataKey::RegToken(commitment.clone());
    let consumed: bool = env.storage().persistent().get(&key)?;
    bump_persistent(env, &key);
    Some(consumed)
}

pub fn save_registration_token(env: &Env, commitment: &BytesN<32>, consumed: bool) {
    let key = DataKey::RegToken(commitment.clone());
    env.storage().persistent().set(&key, &consumed);
    bump_persistent(env, &key);
}
