//! Registration and voting tokens.
//!
//! Registration tokens are handed out off-chain. The admin stores only their
//! SHA-256 commitments, so the token itself is first revealed by the voter
//! who spends it. A successful registration issues a voting token bound to
//! the voter address, the spent registration token and the ledger sequence.
//! The voter must still authorize `cast_vote`; the token alone is not enough.

use soroban_sdk::{xdr::ToXdr, Address, Bytes, BytesN, Env};

/// An all-zero token is what an unset `bytes32` looks like; never valid.
pub fn is_well_formed(token: &BytesN<32>) -> bool {
    token.to_array() != [0u8; 32]
}

/// SHA-256 commitment under which a registration token is stored.
pub fn commitment(env: &Env, token: &BytesN<32>) -> BytesN<32> {
    let preimage = Bytes::from_array(env, &token.to_array());
    env.crypto().sha256(&preimage).into()
}

pub fn issue_voting_token(
    env: &Env,
    voter: &Address,
    registration_token: &BytesN<32>,
) -> BytesN<32> {
    let mut preimage = voter.clone().to_xdr(env);
    preimage.extend_from_array(&registration_token.to_array());
    preimage.extend_from_array(&env.ledger().sequence().to_be_bytes());
    env.crypto().sha256(&preimage).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn zero_token_is_malformed() {
        let env = Env::default();
        assert!(!is_well_formed(&BytesN::from_array(&env, &[0u8; 32])));
        assert!(is_well_formed(&BytesN::from_array(&env, &[7u8; 32])));
    }

    #[test]
    fn commitment_is_deterministic_and_hides_the_token() {
        let env = Env::default();
        let token = BytesN::from_array(&env, &[7u8; 32]);
        assert_eq!(commitment(&env, &token), commitment(&env, &token));
        assert_ne!(commitment(&env, &token), token);
    }

    #[test]
    fn voting_tokens_are_bound_to_the_voter() {
        let env = Env::default();
        let alice = Address::generate(&env);
        let bob = Address::generate(&env);
        let reg = BytesN::from_array(&env, &[1u8; 32]);
        assert_ne!(
            issue_voting_token(&env, &alice, &reg),
            issue_voting_token(&env, &bob, &reg)
        );
    }
}
