#![allow(dead_code)]

extern crate std;

use soroban_sdk::Vec;

use crate::types::{Proposal, ProposalState};

/// INV-1: Proposal indices are sequential starting from 0, in registration order.
pub fn assert_sequential_indices(proposals: &Vec<Proposal>) {
    for (i, proposal) in proposals.iter().enumerate() {
        assert_eq!(
            proposal.index, i as u32,
            "INV-1 violated: expected index {}, got {}",
            i, proposal.index
        );
    }
}

/// INV-2: vote counts never decrease.
pub fn assert_vote_count_monotonic(count_before: u32, count_after: u32) {
    assert!(
        count_after >= count_before,
        "INV-2 violated: vote_count decreased from {} to {}",
        count_before,
        count_after
    );
}

/// INV-3: an accepted vote adds exactly one vote to each selected proposal
/// and leaves every other proposal untouched.
pub fn assert_vote_applied(before: &Vec<Proposal>, after: &Vec<Proposal>, selected: &[u32]) {
    assert_eq!(
        before.len(),
        after.len(),
        "INV-3 violated: proposal count changed while voting"
    );
    for (old, new) in before.iter().zip(after.iter()) {
        let expected = if selected.contains(&old.index) {
            old.vote_count + 1
        } else {
            old.vote_count
        };
        assert_eq!(
            new.vote_count, expected,
            "INV-3 violated: proposal {} has {} votes, expected {}",
            old.index, new.vote_count, expected
        );
    }
}

/// INV-4: a rejected vote changes no proposal at all.
pub fn assert_unchanged(before: &Vec<Proposal>, after: &Vec<Proposal>) {
    assert_eq!(before, after, "INV-4 violated: rejected vote changed the registry");
}

/// INV-5: registration data is immutable once stored.
pub fn assert_proposal_immutable_fields(original: &Proposal, current: &Proposal) {
    assert_eq!(original.index, current.index, "INV-5 violated: index changed");
    assert_eq!(
        original.proposer, current.proposer,
        "INV-5 violated: proposer changed"
    );
    assert_eq!(
        original.project_name, current.project_name,
        "INV-5 violated: project_name changed"
    );
    assert_eq!(
        original.team_name, current.team_name,
        "INV-5 violated: team_name changed"
    );
    assert_eq!(
        original.git_address, current.git_address,
        "INV-5 violated: git_address changed"
    );
}

/// INV-6: the active listing is exactly the `Active` subset of the full
/// listing, same order, same indices.
pub fn assert_active_listing(all: &Vec<Proposal>, active: &Vec<Proposal>) {
    let mut expected = std::vec::Vec::new();
    for proposal in all.iter() {
        if proposal.state == ProposalState::Active {
            expected.push(proposal);
        }
    }
    let listed: std::vec::Vec<Proposal> = active.iter().collect();
    assert_eq!(
        listed, expected,
        "INV-6 violated: active listing does not match the Active subset"
    );
}
