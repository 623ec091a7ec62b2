//! Walkthrough of a full Blackjack round against the bundled ruleset,
//! exercising the public API surface a host application is expected to
//! drive: load a ruleset, build the zero state, feed actions through a
//! reducer, and read back a per-viewer projection after each step.
//!
//! Run with `cargo run --example play_blackjack` (the file lives under
//! `demos/` so it doesn't collide with the read-only retrieval pack's
//! own `examples/` directory, but Cargo still treats it as a normal
//! `--example` target).

use card_engine::{create_initial_state, create_reducer, CardGameAction, Ruleset};

const BLACKJACK_RULESET: &str = include_str!("../rulesets/blackjack.json");

fn main() {
    card_engine::register_all_builtins();

    let ruleset = Ruleset::load(BLACKJACK_RULESET).expect("bundled ruleset should parse");
    let players = vec![
        ("alice".to_string(), "Alice".to_string()),
        ("bob".to_string(), "Bob".to_string()),
    ];
    let mut state = create_initial_state(&ruleset, "demo-session", &players, 42);
    let mut reducer = create_reducer(ruleset, 42);

    println!("status before start_game: {:?}", state.status);
    state = reducer
        .reduce(&state, &CardGameAction::StartGame)
        .expect("start_game should never fail on a well-formed ruleset");
    println!(
        "after start_game: phase = {}, dealer shows one face-up card, hands dealt",
        state.current_phase
    );

    for (player_id, _) in &players {
        let view = reducer
            .create_player_view(&state, player_id)
            .expect("every seated player has a view");
        let hand = &view.zones[&format!("hand:{}", state.player_order.iter().position(|p| p == player_id).unwrap())];
        println!(
            "{player_id}'s view of their own hand: {} card(s), all visible",
            hand.cards.iter().filter(|c| c.is_some()).count()
        );
    }

    // Every player stands immediately; the dealer then plays out its
    // own hand automatically via the phase machine's automatic sequence.
    for (player_id, _) in &players {
        let valid = reducer.get_valid_actions(&state, player_id);
        println!("{player_id}'s valid actions: {valid:?}");
        state = reducer
            .reduce(
                &state,
                &CardGameAction::Declare {
                    player_id: player_id.clone(),
                    declaration: "stand".to_string(),
                    params: Default::default(),
                },
            )
            .expect("stand always succeeds when it's this player's turn");
    }

    println!("final status: {:?}", state.status);
    println!("final scores: {:?}", state.scores);
    println!("{} actions recorded in the log", state.action_log.len());
}
