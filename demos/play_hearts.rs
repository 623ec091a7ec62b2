//! Walkthrough of a full Hearts round against the bundled ruleset. Unlike
//! the Blackjack demo, nobody needs to declare anything here: every turn
//! is a single `play_card` action and the phase machine drives trick
//! resolution, scoring, and round resets automatically once a trick or a
//! round is complete.
//!
//! Run with `cargo run --example play_hearts` (see `demos/play_blackjack.rs`
//! for why this lives under `demos/` rather than `examples/`).

use card_engine::state::GameStatus;
use card_engine::{create_initial_state, create_reducer, CardGameAction, Ruleset};

const HEARTS_RULESET: &str = include_str!("../rulesets/hearts.json");

fn main() {
    card_engine::register_all_builtins();

    let ruleset = Ruleset::load(HEARTS_RULESET).expect("bundled ruleset should parse");
    let players = vec![
        ("north".to_string(), "North".to_string()),
        ("east".to_string(), "East".to_string()),
        ("south".to_string(), "South".to_string()),
        ("west".to_string(), "West".to_string()),
    ];
    let mut state = create_initial_state(&ruleset, "demo-session", &players, 7);
    let mut reducer = create_reducer(ruleset, 7);

    state = reducer
        .reduce(&state, &CardGameAction::StartGame)
        .expect("start_game should never fail on a well-formed ruleset");
    println!(
        "after start_game: phase = {}, each seat holds 13 cards",
        state.current_phase
    );

    // Nobody ever has a choice of which card to play in this ruleset (the
    // phase always plays the top card of the current player's hand), so
    // every seat's only legal declaration is `play_card`. Drive the whole
    // round to completion, one trick at a time.
    let mut turns = 0;
    while !matches!(state.status, GameStatus::Finished { .. }) {
        let Some(current) = state.current_player().map(str::to_string) else {
            break;
        };
        state = reducer
            .reduce(
                &state,
                &CardGameAction::Declare {
                    player_id: current,
                    declaration: "play_card".to_string(),
                    params: Default::default(),
                },
            )
            .expect("play_card always succeeds when it's this player's turn");
        turns += 1;
        if turns > 13 * 4 {
            break;
        }
    }

    println!(
        "after one full round: phase = {}, tricks_played = {:?}",
        state.current_phase,
        state.variables.get("tricks_played")
    );
    println!("cumulative scores: {:?}", state.scores);
    println!("{} actions recorded in the log", state.action_log.len());
}
