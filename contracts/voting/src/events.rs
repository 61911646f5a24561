//! Contract events.
//!
//! | Topic                       | Data                 |
//! |-----------------------------|----------------------|
//! | `("init",)`                 | [`Initialized`]      |
//! | `("proposed", index)`       | [`ProposalRegistered`] |
//! | `("state_set", index)`      | [`ProposalStateSet`] |
//! | `("voter_reg",)`            | [`VoterRegistered`]  |
//! | `("vote_cast", index)`      | [`VoteCast`]         |
//!
//! `vote_cast` is published once per selected proposal so observers can
//! update a single count without re-reading the whole registry. The backend
//! indexer decodes these topics; keep both sides in sync.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

use crate::types::{ContractParams, ProposalState};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Initialized {
    pub admin: Address,
    pub registration_deadline: u64,
    pub voting_deadline: u64,
    pub max_votes_per_voter: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalRegistered {
    pub index: u32,
    pub proposer: Address,
    pub project_name: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalStateSet {
    pub index: u32,
    pub state: ProposalState,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoterRegistered {
    pub voter: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteCast {
    pub voter: Address,
    pub proposal_index: u32,
}

pub fn emit_initialized(env: &Env, admin: &Address, params: &ContractParams) {
    env.events().publish(
        (symbol_short!("init"),),
        Initialized {
            admin: admin.clone(),
            registration_deadline: params.registration_deadline,
            voting_deadline: params.voting_deadline,
            max_votes_per_voter: params.max_votes_per_voter,
        },
    );
}

pub fn emit_proposal_registered(
    env: &Env,
    index: u32,
    proposer: &Address,
    project_name: &BytesN<32>,
) {
    env.events().publish(
        (symbol_short!("proposed"), index),
        ProposalRegistered {
            index,
            proposer: proposer.clone(),
            project_name: project_name.clone(),
        },
    );
}

pub fn emit_proposal_state_set(env: &Env, index: u32, state: ProposalState) {
    env.events().publish(
        (symbol_short!("state_set"), index),
        ProposalStateSet { index, state },
    );
}

pub fn emit_voter_registered(env: &Env, voter: &Address) {
    env.events().publish(
        (symbol_short!("voter_reg"),),
        VoterRegistered {
            voter: voter.clone(),
        },
    );
}

pub fn emit_vote_cast(env: &Env, voter: &Address, proposal_index: u32) {
    env.events().publish(
        (symbol_short!("vote_cast"), proposal_index),
        VoteCast {
            voter: voter.clone(),
            proposal_index,
        },
    );
}
