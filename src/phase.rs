//! The phase state machine: automatic-phase effect sequences
//! and guarded transitions, driven to a fixpoint after every accepted
//! action (and once up front, to carry a freshly created game through
//! any automatic phases before the first player action ever arrives).

use log::debug;

use crate::effect;
use crate::error::{EngineError, InvariantViolation};
use crate::expr::eval::{eval, EvalContext};
use crate::expr::parse::parse;
use crate::prng::Prng;
use crate::ruleset::{PhaseKind, PhaseSpec, Ruleset};
use crate::state::{CardGameState, PhaseTransitionLogEntry};

/// Upper bound on the number of phase transitions a single `run` call
/// will take before giving up — a ruleset whose transitions cycle
/// forever (`a -> b -> a -> ...`) is an authoring bug, not a hang.
pub const TRANSITION_BUDGET: u32 = 50;

/// Drive `state` forward: execute the current phase's automatic effect
/// sequence (if it has one), then follow guarded transitions to a
/// fixpoint — stopping as soon as a phase has no satisfied transition,
/// which for a `turn_based`/`all_players` phase means "waiting on a
/// player action." Returns every transition fired, in order,
/// for the reducer to fold into the action log.
///
/// A parse or evaluation failure in an automatic sequence or a
/// transition guard is a ruleset-authoring bug, not a false guard: it
/// propagates to the caller immediately, and any intents already
/// accumulated for the failing expression are discarded rather than
/// applied.
pub fn run(
    state: &mut CardGameState,
    ruleset: &Ruleset,
    prng: &mut Prng,
    timestamp: u64,
) -> Result<Vec<PhaseTransitionLogEntry>, EngineError> {
    let start_phase = state.current_phase.clone();
    let mut budget = TRANSITION_BUDGET;
    let mut fired = Vec::new();

    loop {
        let phase = ruleset.phase(&state.current_phase).ok_or_else(|| {
            InvariantViolation::UnknownPlayer(format!("unknown phase `{}`", state.current_phase))
        })?;

        if phase.kind == PhaseKind::Automatic {
            run_automatic_sequence(state, ruleset, prng, timestamp, phase)?;
        }

        let phase = ruleset.phase(&state.current_phase).expect("phase validated above");
        match first_satisfied_transition(state, ruleset, phase)? {
            Some((target, guard)) => {
                if budget == 0 {
                    return Err(InvariantViolation::TransitionBudgetExceeded {
                        budget: TRANSITION_BUDGET,
                        start_phase,
                    });
                }
                budget -= 1;
                debug!(
                    "phase transition: `{}` -> `{target}` (guard: {guard})",
                    state.current_phase
                );
                fired.push(PhaseTransitionLogEntry {
                    from_phase: state.current_phase.clone(),
                    to_phase: target.clone(),
                    guard,
                });
                state.current_phase = target;
                state.turns_taken_this_phase = 0;
                // Entering a turn_based phase resets the
                // per-phase turn counter;
                // currentPlayerIndex is left alone unless the incoming
                // automatic sequence calls `set_lead_player`.
                if ruleset.phase(&state.current_phase).map(|p| p.kind) == Some(PhaseKind::TurnBased) {
                    state.turn_number += 1;
                }
            }
            None => break,
        }
    }
    Ok(fired)
}

fn run_automatic_sequence(
    state: &mut CardGameState,
    ruleset: &Ruleset,
    prng: &mut Prng,
    timestamp: u64,
    phase: &PhaseSpec,
) -> Result<(), EngineError> {
    for source in &phase.automatic_sequence {
        debug!("phase `{}` automatic step: {source}", phase.name);
        let expr = parse(source).map_err(|e| InvariantViolation::InvalidScoringExpression {
            field: format!("phases[{}].automaticSequence", phase.name),
            reason: e.to_string(),
        })?;
        let intents = {
            let mut ctx = EvalContext::new(state, ruleset);
            eval(&expr, &mut ctx)?;
            ctx.intents
        };
        for intent in intents {
            effect::apply(state, ruleset, prng, timestamp, &intent)?;
        }
    }
    Ok(())
}

fn first_satisfied_transition(
    state: &CardGameState,
    ruleset: &Ruleset,
    phase: &PhaseSpec,
) -> Result<Option<(String, String)>, EngineError> {
    for transition in &phase.transitions {
        let expr = parse(&transition.when).map_err(|e| InvariantViolation::InvalidScoringExpression {
            field: format!("phases[{}].transitions[{}].when", phase.name, transition.to),
            reason: e.to_string(),
        })?;
        let mut ctx = EvalContext::new(state, ruleset);
        if eval(&expr, &mut ctx)?.is_truthy() {
            return Ok(Some((transition.to.clone(), transition.when.clone())));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::registry;
    use serial_test::serial;
    use std::collections::HashMap;

    fn ruleset_with_auto_phase() -> Ruleset {
        Ruleset::load(
            r#"{
                "meta": {"name": "T", "slug": "t", "version": "1.0.0", "author": "me",
                          "players": {"min": 1, "max": 2}},
                "deck": {"kind": "preset", "preset": "standard_52", "copies": 1},
                "cardValues": {},
                "zones": [
                    {"name": "draw_pile", "visibility": {"kind": "hidden"}, "owners": []},
                    {"name": "hand", "visibility": {"kind": "owner_only"}, "owners": []}
                ],
                "roles": [{"name": "player", "isHuman": true, "count": "per_player"}],
                "phases": [
                    {"name": "deal", "kind": "automatic", "actions": [], "transitions": [
                        {"to": "play", "when": "card_count(\"hand\") >= 1"}
                    ], "automaticSequence": ["deal(\"draw_pile\", \"hand\", 1)"]},
                    {"name": "play", "kind": "turn_based", "actions": [], "transitions": []}
                ],
                "scoring": {"method": "0", "winCondition": "false"}
            }"#,
        )
        .unwrap()
    }

    fn state_with_cards(draw_pile_count: usize) -> CardGameState {
        use crate::card::{Card, CardId};
        use crate::state::{GameStatus, TurnDirection, ZoneState};
        let cards = (0..draw_pile_count)
            .map(|i| Card {
                id: CardId(i as u64),
                suit: "hearts".into(),
                rank: "ace".into(),
                face_up: false,
            })
            .collect();
        let mut zones = HashMap::new();
        zones.insert("draw_pile".to_string(), ZoneState { cards });
        zones.insert("hand".to_string(), ZoneState::empty());
        CardGameState {
            session_id: "test".into(),
            status: GameStatus::InProgress { started_at: 0 },
            players: HashMap::new(),
            player_order: vec!["p1".to_string()],
            zones,
            current_phase: "deal".into(),
            current_player_index: 0,
            turn_direction: TurnDirection::Clockwise,
            turn_number: 0,
            turns_taken_this_phase: 0,
            scores: HashMap::new(),
            variables: HashMap::new(),
            action_log: Vec::new(),
            version: 0,
        }
    }

    #[test]
    #[serial]
    fn drives_through_automatic_phase_until_transition_guard_holds() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = ruleset_with_auto_phase();
        let mut state = state_with_cards(5);
        let mut prng = Prng::new(1);
        run(&mut state, &ruleset, &mut prng, 0).unwrap();
        assert_eq!(state.current_phase, "play");
        assert_eq!(state.zone("hand").unwrap().cards.len(), 1);
    }

    #[test]
    #[serial]
    fn stops_in_turn_based_phase_with_no_satisfied_transition() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = ruleset_with_auto_phase();
        let mut state = state_with_cards(0);
        state.current_phase = "play".to_string();
        let mut prng = Prng::new(1);
        run(&mut state, &ruleset, &mut prng, 0).unwrap();
        assert_eq!(state.current_phase, "play");
    }
}
