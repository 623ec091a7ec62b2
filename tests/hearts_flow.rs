//! Black-box coverage for the bundled Hearts ruleset: one full trick
//! resolved from a hand-constructed four-seat state (so the winning
//! seat is known ahead of time without predicting a shuffle), plus the
//! card-conservation invariant across `start_game`'s deal.

use std::collections::HashMap;

use card_engine::{
    clear_builtins, create_initial_state, create_reducer, register_all_builtins,
    state::{CardGameState, GameStatus, PlayerState, TurnDirection, ZoneState},
    Card, CardGameAction, CardId,
};
use serial_test::serial;

const HEARTS_RULESET: &str = include_str!("../rulesets/hearts.json");

fn seats() -> Vec<(String, String)> {
    vec![
        ("p0".to_string(), "P0".to_string()),
        ("p1".to_string(), "P1".to_string()),
        ("p2".to_string(), "P2".to_string()),
        ("p3".to_string(), "P3".to_string()),
    ]
}

fn ruleset() -> card_engine::Ruleset {
    card_engine::Ruleset::load(HEARTS_RULESET).expect("bundled ruleset parses")
}

#[test]
#[serial]
fn start_game_deals_thirteen_cards_to_every_seat_with_no_card_loss() {
    clear_builtins();
    register_all_builtins();

    let ruleset = ruleset();
    let initial = create_initial_state(&ruleset, "h1", &seats(), 3);
    let before_cards = initial.total_cards();
    let mut reducer = create_reducer(ruleset, 3);

    let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();

    assert_eq!(started.current_phase, "play");
    for i in 0..4 {
        assert_eq!(started.zone(&format!("hand:{i}")).unwrap().cards.len(), 13);
    }
    assert_eq!(started.total_cards(), before_cards);
}

/// Four seats each hold one card of a trick in progress; seat 2 holds
/// the highest-ranked card (ace), so playing the last card should
/// resolve the trick to seat 2, collect all four cards into `won:2`,
/// and make seat 2 the next lead player.
fn state_mid_trick() -> CardGameState {
    let mut zones = HashMap::new();
    zones.insert("draw_pile".to_string(), ZoneState::empty());
    // Seats 0 and 1 still hold a spare card after this trick so the
    // round doesn't end and cascade into a reshuffle within the same
    // `reduce` call - this test is only about trick resolution.
    let hands = [
        vec![
            Card { id: CardId(10), suit: "clubs".into(), rank: "2".into(), face_up: false },
            Card { id: CardId(20), suit: "hearts".into(), rank: "3".into(), face_up: false },
        ],
        vec![
            Card { id: CardId(11), suit: "clubs".into(), rank: "king".into(), face_up: false },
            Card { id: CardId(21), suit: "hearts".into(), rank: "4".into(), face_up: false },
        ],
        vec![],
        vec![],
    ];
    let tricks = [
        vec![],
        vec![],
        vec![Card { id: CardId(12), suit: "clubs".into(), rank: "ace".into(), face_up: true }],
        vec![Card { id: CardId(13), suit: "clubs".into(), rank: "queen".into(), face_up: true }],
    ];
    for (i, hand) in hands.into_iter().enumerate() {
        zones.insert(format!("hand:{i}"), ZoneState { cards: hand });
    }
    for (i, trick) in tricks.into_iter().enumerate() {
        zones.insert(format!("trick:{i}"), ZoneState { cards: trick });
    }
    for i in 0..4 {
        zones.insert(format!("won:{i}"), ZoneState::empty());
    }

    let mut players = HashMap::new();
    for (id, name) in seats() {
        players.insert(id, PlayerState { role: "player".into(), connected: true, name });
    }

    let mut variables = HashMap::new();
    variables.insert("tricks_played".to_string(), 0.0);
    variables.insert("trick_winner_seat".to_string(), 0.0);

    CardGameState {
        session_id: "h2".to_string(),
        status: GameStatus::InProgress { started_at: 0 },
        players,
        player_order: vec!["p0".to_string(), "p1".to_string(), "p2".to_string(), "p3".to_string()],
        zones,
        current_phase: "play".to_string(),
        current_player_index: 0,
        turn_direction: TurnDirection::Clockwise,
        turn_number: 10,
        turns_taken_this_phase: 0,
        scores: HashMap::new(),
        variables,
        action_log: Vec::new(),
        version: 0,
    }
}

#[test]
#[serial]
fn the_highest_card_wins_the_trick_and_its_seat_leads_next() {
    clear_builtins();
    register_all_builtins();

    let ruleset = ruleset();
    let mut state = state_mid_trick();
    let mut reducer = create_reducer(ruleset, 1);

    // Seats 0 and 1 still need to play into the trick before it has four
    // cards; seat 0 goes first since current_player_index is 0.
    state = reducer
        .reduce(
            &state,
            &CardGameAction::Declare {
                player_id: "p0".to_string(),
                declaration: "play_card".to_string(),
                params: HashMap::new(),
            },
        )
        .unwrap();
    state = reducer
        .reduce(
            &state,
            &CardGameAction::Declare {
                player_id: "p1".to_string(),
                declaration: "play_card".to_string(),
                params: HashMap::new(),
            },
        )
        .unwrap();

    // The trick now has four cards and the automatic `resolve_trick`
    // phase has already run to a fixpoint inside the second `reduce`.
    assert_eq!(state.current_phase, "play");
    assert_eq!(state.current_player_index, 2, "the ace of clubs on seat 2 wins the trick and leads next");
    assert_eq!(state.zone("won:2").unwrap().cards.len(), 4);
    for i in 0..4 {
        assert_eq!(state.zone(&format!("trick:{i}")).unwrap().cards.len(), 0);
    }
    assert_eq!(state.variables.get("tricks_played"), Some(&1.0));
}
