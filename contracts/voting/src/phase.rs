//! Phase clock: classifies ledger time against the configured deadlines.

use soroban_sdk::Env;

use crate::types::{ContractParams, Phase};
use crate::Error;

/// Pure classification of `now` into exactly one phase.
pub fn phase_at(now: u64, params: &ContractParams) -> Phase {
    if now < params.registration_deadline {
        Phase::Registration
    } else if now < params.voting_deadline {
        Phase::Voting
    } else {
        Phase::Closed
    }
}

/// Phase at the current ledger timestamp.
pub fn current(env: &Env, params: &ContractParams) -> Phase {
    phase_at(env.ledger().timestamp(), params)
}

/// Fail with [`Error::WrongPhase`] unless the current phase is one of `allowed`.
pub fn require(env: &Env, params: &ContractParams, allowed: &[Phase]) -> Result<Phase, Error> {
    let phase = current(env, params);
    if allowed.contains(&phase) {
        Ok(phase)
    } else {
        Err(Error::WrongPhase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ContractParams {
        ContractParams {
            registration_deadline: 1_000,
            voting_deadline: 2_000,
            max_votes_per_voter: 3,
        }
    }

    #[test]
    fn before_registration_deadline_is_registration() {
        assert_eq!(phase_at(0, &params()), Phase::Registration);
        assert_eq!(phase_at(999, &params()), Phase::Registration);
    }

    #[test]
    fn registration_deadline_opens_voting() {
        assert_eq!(phase_at(1_000, &params()), Phase::Voting);
        assert_eq!(phase_at(1_999, &params()), Phase::Voting);
    }

    #[test]
    fn voting_deadline_closes() {
        assert_eq!(phase_at(2_000, &params()), Phase::Closed);
        assert_eq!(phase_at(u64::MAX, &params()), Phase::Closed);
    }
}
