//! # Voting Contract
//!
//! Soroban contract `Voting` holding the authoritative state of a project
//! vote: which projects were proposed, who registered to vote, who already
//! voted, and how many votes each project received.
//!
//! | Phase        | Entry Point(s)                                        |
//! |--------------|-------------------------------------------------------|
//! | Bootstrap    | [`Voting::init`], `add_registration_tokens`           |
//! | Registration | [`Voting::register_proposal`], [`Voting::register_voter`] |
//! | Voting       | [`Voting::cast_vote`], `register_voter`               |
//! | Any          | `set_proposal_state` (admin)                          |
//! | Queries      | `current_phase`, `get_contract_params`, `get_all_proposals`, `get_active_proposals`, `get_proposal`, `get_number_of_proposals`, `has_voted`, `is_registered`, `voter_status` |
//!
//! ## Architecture
//!
//! Time windows live in [`phase`], storage access in [`storage`], the
//! fixed-width name codec in [`name`], token handling in [`token`] and event
//! emission in [`events`]. Every mutating entry point performs all of its
//! checks before its first write; an `Err` return additionally rolls back the
//! whole invocation, so a vote is applied to every selected proposal or to
//! none.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, BytesN, Env, String, Vec};

pub mod events;
pub mod name;
pub mod phase;
mod storage;
pub mod token;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use types::{
    ContractParams, Phase, Proposal, ProposalState, VoteReceipt, Voter, VoterStatus,
};
use types::ProposalTally;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized     = 1,
    AlreadyInitialized = 2,
    NotAuthorized      = 3,
    /// Operation attempted outside its time window.
    WrongPhase         = 4,
    NotRegistered      = 5,
    AlreadyRegistered  = 6,
    AlreadyVoted       = 7,
    InvalidToken       = 8,
    /// Malformed, out-of-range or duplicate input.
    InvalidInput       = 9,
    ProposalNotFound   = 10,
    Overflow           = 11,
}

#[contract]
pub struct Voting;

#[contractimpl]
impl Voting {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract with its administrator and fixed parameters.
    ///
    /// Must be called exactly once immediately after deployment.
    /// - `registration_deadline` must be strictly before `voting_deadline`.
    /// - `max_votes_per_voter` must be at least 1.
    pub fn init(
        env: Env,
        admin: Address,
        registration_deadline: u64,
        voting_deadline: u64,
        max_votes_per_voter: u32,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();

        if registration_deadline >= voting_deadline || max_votes_per_voter == 0 {
            return Err(Error::InvalidInput);
        }

        let params = ContractParams {
            registration_deadline,
            voting_deadline,
            max_votes_per_voter,
        };
        storage::save_config(&env, &admin, &params);
        events::emit_initialized(&env, &admin, &params);
        Ok(())
    }

    /// Store commitments (SHA-256 hashes) of registration tokens distributed
    /// off-chain. Known commitments are left untouched, consumed or not.
    ///
    /// Returns the number of newly stored commitments.
    pub fn add_registration_tokens(
        env: Env,
        admin: Address,
        token_hashes: Vec<BytesN<32>>,
    ) -> Result<u32, Error> {
        let params = require_initialized(&env)?;
        require_admin(&env, &admin)?;
        phase::require(&env, &params, &[Phase::Registration, Phase::Voting])?;

        let mut added = 0u32;
        for hash in token_hashes.iter() {
            if storage::registration_token_consumed(&env, &hash).is_none() {
                storage::save_registration_token(&env, &hash, false);
                added += 1;
            }
        }
        Ok(added)
    }

    // ─────────────────────────────────────────────────────────
    // Phase clock
    // ─────────────────────────────────────────────────────────

    pub fn current_phase(env: Env) -> Result<Phase, Error> {
        let params = require_initialized(&env)?;
        Ok(phase::current(&env, &params))
    }

    pub fn get_contract_params(env: Env) -> Result<ContractParams, Error> {
        require_initialized(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Proposal registry
    // ─────────────────────────────────────────────────────────

    /// Register a new project proposal and return its index.
    ///
    /// Only accepted during the registration phase. `project_name` must fit the
    /// 32-byte fixed-width field. The proposal starts `Active` with no votes.
    pub fn register_proposal(
        env: Env,
        proposer: Address,
        project_name: String,
        team_name: String,
        git_address: String,
        image_url: String,
        participant1: String,
        participant2: String,
    ) -> Result<u32, Error> {
        let params = require_initialized(&env)?;
        proposer.require_auth();
        phase::require(&env, &params, &[Phase::Registration])?;

        let encoded_name = name::encode(&env, &project_name)?;
        let index = storage::get_and_increment_proposal_index(&env)?;

        let proposal = Proposal {
            index,
            proposer,
            project_name: encoded_name,
            team_name,
            git_address,
            image_url,
            participant1,
            participant2,
            vote_count: 0,
            state: ProposalState::Active,
        };
        storage::save_proposal(&env, &proposal);

        events::emit_proposal_registered(&env, index, &proposal.proposer, &proposal.project_name);
        Ok(index)
    }

    /// Set the administrative state of a proposal.
    ///
    /// Any transition is allowed in any phase, including a no-op one. Votes
    /// already counted for a proposal are kept when it becomes `Inactive`.
    pub fn set_proposal_state(
        env: Env,
        admin: Address,
        index: u32,
        state: ProposalState,
    ) -> Result<(), Error> {
        require_initialized(&env)?;
        require_admin(&env, &admin)?;

        let mut tally =
            storage::load_proposal_tally(&env, index).ok_or(Error::ProposalNotFound)?;
        tally.state = state;
        storage::save_proposal_tally(&env, index, &tally);

        events::emit_proposal_state_set(&env, index, state);
        Ok(())
    }

    pub fn get_proposal(env: Env, index: u32) -> Result<Proposal, Error> {
        require_initialized(&env)?;
        storage::load_proposal(&env, index).ok_or(Error::ProposalNotFound)
    }

    pub fn get_number_of_proposals(env: Env) -> Result<u32, Error> {
        require_initialized(&env)?;
        Ok(storage::get_proposal_count(&env))
    }

    /// All proposals in registration order.
    pub fn get_all_proposals(env: Env) -> Result<Vec<Proposal>, Error> {
        require_initialized(&env)?;
        Ok(collect_proposals(&env, false))
    }

    /// `Active` proposals in registration order. Each entry keeps its original
    /// `index`, which is what `cast_vote` expects.
    pub fn get_active_proposals(env: Env) -> Result<Vec<Proposal>, Error> {
        require_initialized(&env)?;
        Ok(collect_proposals(&env, true))
    }

    // ─────────────────────────────────────────────────────────
    // Voter registry
    // ─────────────────────────────────────────────────────────

    /// Spend a registration token and receive the voting token.
    ///
    /// Allowed during registration and voting. A second registration of the
    /// same address fails with `AlreadyRegistered`; the first voting token
    /// stays the only valid one.
    pub fn register_voter(
        env: Env,
        voter: Address,
        registration_token: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        let params = require_initialized(&env)?;
        voter.require_auth();
        phase::require(&env, &params, &[Phase::Registration, Phase::Voting])?;

        if storage::load_voter(&env, &voter).is_some() {
            return Err(Error::AlreadyRegistered);
        }
        if !token::is_well_formed(&registration_token) {
            return Err(Error::InvalidToken);
        }

        let commitment = token::commitment(&env, &registration_token);
        match storage::registration_token_consumed(&env, &commitment) {
            Some(false) => {}
            Some(true) | None => return Err(Error::InvalidToken),
        }

        let voting_token = token::issue_voting_token(&env, &voter, &registration_token);
        storage::save_registration_token(&env, &commitment, true);
        storage::save_voter(
            &env,
            &voter,
            &Voter {
                registered: true,
                voted: false,
                voting_token: voting_token.clone(),
                registered_at: env.ledger().timestamp(),
            },
        );

        events::emit_voter_registered(&env, &voter);
        Ok(voting_token)
    }

    pub fn has_voted(env: Env, voter: Address) -> bool {
        storage::load_voter(&env, &voter).is_some_and(|v| v.voted)
    }

    pub fn is_registered(env: Env, voter: Address) -> bool {
        storage::load_voter(&env, &voter).is_some_and(|v| v.registered)
    }

    pub fn voter_status(env: Env, voter: Address) -> VoterStatus {
        match storage::load_voter(&env, &voter) {
            Some(v) if v.voted => VoterStatus::Voted,
            Some(v) if v.registered => VoterStatus::Registered,
            _ => VoterStatus::Unregistered,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Vote casting
    // ─────────────────────────────────────────────────────────

    /// Cast the voter's single vote for between one and
    /// `max_votes_per_voter` distinct `Active` proposals.
    ///
    /// Each selected proposal gains exactly one vote and a `vote_cast` event
    /// is published for it. Checks run in this order: phase, registration,
    /// already voted, voting token, selection.
    pub fn cast_vote(
        env: Env,
        voter: Address,
        proposal_indices: Vec<u32>,
        voting_token: BytesN<32>,
    ) -> Result<VoteReceipt, Error> {
        let params = require_initialized(&env)?;
        voter.require_auth();
        phase::require(&env, &params, &[Phase::Voting])?;

        let mut record = match storage::load_voter(&env, &voter) {
            Some(v) if v.registered => v,
            _ => return Err(Error::NotRegistered),
        };
        if record.voted {
            return Err(Error::AlreadyVoted);
        }
        if record.voting_token != voting_token {
            return Err(Error::InvalidToken);
        }

        let tallies = validate_selection(&env, &params, &proposal_indices)?;

        // All checks passed; apply.
        for (index, mut tally) in proposal_indices.iter().zip(tallies.iter()) {
            tally.vote_count = tally.vote_count.checked_add(1).ok_or(Error::Overflow)?;
            storage::save_proposal_tally(&env, index, &tally);
        }
        record.voted = true;
        storage::save_voter(&env, &voter, &record);

        for index in proposal_indices.iter() {
            events::emit_vote_cast(&env, &voter, index);
        }

        Ok(VoteReceipt {
            voter,
            proposal_indices,
            ledger: env.ledger().sequence(),
            timestamp: env.ledger().timestamp(),
        })
    }
}

// ─────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────

fn require_initialized(env: &Env) -> Result<ContractParams, Error> {
    storage::get_params(env).ok_or(Error::NotInitialized)
}

fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin = storage::get_admin(env).ok_or(Error::NotInitialized)?;
    caller.require_auth();
    if caller != &admin {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn collect_proposals(env: &Env, active_only: bool) -> Vec<Proposal> {
    let mut out = Vec::new(env);
    for index in 0..storage::get_proposal_count(env) {
        if let Some(proposal) = storage::load_proposal(env, index) {
            if !active_only || proposal.state == ProposalState::Active {
                out.push_back(proposal);
            }
        }
    }
    out
}

/// Checks a vote selection and returns the current tallies, in selection
/// order, of the proposals it references.
fn validate_selection(
    env: &Env,
    params: &ContractParams,
    proposal_indices: &Vec<u32>,
) -> Result<Vec<ProposalTally>, Error> {
    if proposal_indices.is_empty() || proposal_indices.len() > params.max_votes_per_voter {
        return Err(Error::InvalidInput);
    }

    let mut seen: Vec<u32> = Vec::new(env);
    let mut tallies: Vec<ProposalTally> = Vec::new(env);
    for index in proposal_indices.iter() {
        if seen.contains(index) {
            return Err(Error::InvalidInput);
        }
        seen.push_back(index);

        let tally = storage::load_proposal_tally(env, index).ok_or(Error::InvalidInput)?;
        if tally.state != ProposalState::Active {
            return Err(Error::InvalidInput);
        }
        tallies.push_back(tally);
    }
    Ok(tallies)
}
