extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger},
    vec, Address, BytesN, Env, IntoVal, String, Symbol, TryFromVal, TryIntoVal, Val, Vec,
};

use crate::events::{Initialized, ProposalRegistered, ProposalStateSet, VoteCast, VoterRegistered};
use crate::{name, token, ProposalState, Voting, VotingClient};

const REGISTRATION_DEADLINE: u64 = 10_000;
const VOTING_DEADLINE: u64 = 20_000;

fn setup_with_init() -> (Env, VotingClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(Voting, ());
    let client = VotingClient::new(&env, &contract_id);
    let admin = Address::generate(&env);
    client.init(&admin, &REGISTRATION_DEADLINE, &VOTING_DEADLINE, &3);
    (env, client, admin)
}

fn has_leading_topic(env: &Env, topics: &Vec<Val>, topic: Symbol) -> bool {
    topics
        .get(0)
        .and_then(|first| Symbol::try_from_val(env, &first).ok())
        .is_some_and(|symbol| symbol == topic)
}

fn propose(env: &Env, client: &VotingClient, proposer: &Address, project_name: &str) -> u32 {
    let text = String::from_str(env, "n/a");
    client.register_proposal(
        proposer,
        &String::from_str(env, project_name),
        &text,
        &text,
        &text,
        &text,
        &text,
    )
}

#[test]
fn test_init_event() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(Voting, ());
    let client = VotingClient::new(&env, &contract_id);
    let admin = Address::generate(&env);
    client.init(&admin, &REGISTRATION_DEADLINE, &VOTING_DEADLINE, &3);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, client.address);
    let expected_topics: Vec<Val> = vec![&env, symbol_short!("init").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: Initialized = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Initialized {
            admin,
            registration_deadline: REGISTRATION_DEADLINE,
            voting_deadline: VOTING_DEADLINE,
            max_votes_per_voter: 3,
        }
    );
}

#[test]
fn test_proposal_registered_event() {
    let (env, client, _admin) = setup_with_init();
    let proposer = Address::generate(&env);
    let index = propose(&env, &client, &proposer, "NFT Marketplace");

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("proposed"), index)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("proposed").into_val(&env),
        index.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ProposalRegistered = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(event_data.index, index);
    assert_eq!(event_data.proposer, proposer);
    assert_eq!(
        name::decode(&env, &event_data.project_name),
        String::from_str(&env, "NFT Marketplace")
    );
}

#[test]
fn test_proposal_state_set_event() {
    let (env, client, admin) = setup_with_init();
    let proposer = Address::generate(&env);
    let index = propose(&env, &client, &proposer, "Cross-Chain Bridge");

    client.set_proposal_state(&admin, &index, &ProposalState::Inactive);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &env,
        symbol_short!("state_set").into_val(&env),
        index.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ProposalStateSet = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProposalStateSet {
            index,
            state: ProposalState::Inactive,
        }
    );
}

#[test]
fn test_voter_registered_event() {
    let (env, client, admin) = setup_with_init();
    let registration_token = BytesN::from_array(&env, &[5u8; 32]);
    client.add_registration_tokens(
        &admin,
        &vec![&env, token::commitment(&env, &registration_token)],
    );

    let voter = Address::generate(&env);
    client.register_voter(&voter, &registration_token);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics: Vec<Val> = vec![&env, symbol_short!("voter_reg").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: VoterRegistered = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(event_data, VoterRegistered { voter });
}

#[test]
fn test_vote_cast_event_per_selected_proposal() {
    let (env, client, admin) = setup_with_init();
    let proposer = Address::generate(&env);
    for project_name in ["A", "B", "C", "D"] {
        propose(&env, &client, &proposer, project_name);
    }
    let registration_token = BytesN::from_array(&env, &[5u8; 32]);
    client.add_registration_tokens(
        &admin,
        &vec![&env, token::commitment(&env, &registration_token)],
    );
    let voter = Address::generate(&env);
    let voting_token = client.register_voter(&voter, &registration_token);

    env.ledger().with_mut(|li| li.timestamp = REGISTRATION_DEADLINE);
    client.cast_vote(&voter, &vec![&env, 3u32, 1], &voting_token);

    let mut seen = std::vec::Vec::new();
    for (contract, topics, data) in env.events().all().iter() {
        if contract != client.address
            || !has_leading_topic(&env, &topics, symbol_short!("vote_cast"))
        {
            continue;
        }
        let event_data: VoteCast = data.try_into_val(&env).unwrap();
        let topic_index: u32 = topics.get(1).unwrap().try_into_val(&env).unwrap();
        assert_eq!(topic_index, event_data.proposal_index);
        assert_eq!(event_data.voter, voter);
        seen.push(event_data.proposal_index);
    }
    assert_eq!(seen, std::vec![3, 1]);
}

#[test]
fn test_rejected_vote_emits_no_vote_cast() {
    let (env, client, admin) = setup_with_init();
    let proposer = Address::generate(&env);
    propose(&env, &client, &proposer, "A");
    let registration_token = BytesN::from_array(&env, &[5u8; 32]);
    client.add_registration_tokens(
        &admin,
        &vec![&env, token::commitment(&env, &registration_token)],
    );
    let voter = Address::generate(&env);
    let voting_token = client.register_voter(&voter, &registration_token);

    env.ledger().with_mut(|li| li.timestamp = REGISTRATION_DEADLINE);
    // Index 0 is valid, index 9 is not: nothing may be applied.
    assert!(client
        .try_cast_vote(&voter, &vec![&env, 0u32, 9], &voting_token)
        .is_err());

    let vote_events = env
        .events()
        .all()
        .iter()
        .filter(|(_, topics, _)| has_leading_topic(&env, topics, symbol_short!("vote_cast")))
        .count();
    assert_eq!(vote_events, 0);
    assert_eq!(client.get_proposal(&0).vote_count, 0);
}
