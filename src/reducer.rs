//! The reducer: the single entry point that turns
//! `(state, action)` into the next state.
//!
//! Every path through [`Reducer::reduce`] that doesn't return `Err` also
//! satisfies the "untrusted input never errors" contract: a
//! malformed, out-of-turn, or unknown action is indistinguishable from a
//! no-op — the input state comes back unchanged, `version` untouched,
//! nothing appended to `action_log`. Only a ruleset-authoring bug
//! (`ExpressionError`) or a structural invariant failure
//! (`InvariantViolation`) ever reaches the caller as `Err`, and when they
//! do, the state returned to the caller is the *original*, never a
//! partially-mutated working copy — see `run_effects` below.

use std::collections::HashMap;

use log::{debug, error, warn};

use crate::effect::{self, EffectIntent};
use crate::error::EngineError;
use crate::expr::eval::{eval, EvalContext};
use crate::expr::parse::parse;
use crate::phase;
use crate::prng::Prng;
use crate::ruleset::Ruleset;
use crate::state::{CardGameState, GameStatus, ResolvedAction};
use crate::validate::{self, ValidAction};
use crate::view::{self, PlayerView};
use crate::{action::CardGameAction, error::InvariantViolation};

/// Owns the pieces a reducer needs that don't belong in `CardGameState`
/// itself: the ruleset being played and the seeded PRNG stream (no PRNG
/// stream lives inside the state).
pub struct Reducer {
    ruleset: Ruleset,
    prng: Prng,
    timestamp: u64,
}

impl Reducer {
    #[must_use]
    pub fn new(ruleset: Ruleset, seed: u64) -> Self {
        Self {
            ruleset,
            prng: Prng::new(seed),
            timestamp: 0,
        }
    }

    #[must_use]
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Convenience wrapper bundled on the reducer itself so a
    /// host doesn't need to import `validate` separately.
    #[must_use]
    pub fn get_valid_actions(&self, state: &CardGameState, player_id: &str) -> Vec<ValidAction> {
        validate::get_valid_actions(state, &self.ruleset, player_id)
    }

    /// Convenience wrapper for the per-viewer state filter.
    pub fn create_player_view(
        &self,
        state: &CardGameState,
        viewer_id: &str,
    ) -> Result<PlayerView, InvariantViolation> {
        view::create_player_view(state, &self.ruleset, viewer_id)
    }

    /// Process one action against `state`, returning the next state.
    ///
    /// Step order: reject actions while not in progress
    /// unless they're one of the three session-lifecycle actions; run
    /// the action's own effects against a working copy; drive the phase
    /// machine to a fixpoint; then, only if the working copy actually
    /// differs from the input, bump `version` and append a log entry.
    /// That last comparison is what makes every distinct no-op path
    /// above collapse into the same "return the input unchanged"
    /// behavior instead of needing to be special-cased individually.
    pub fn reduce(
        &mut self,
        state: &CardGameState,
        action: &CardGameAction,
    ) -> Result<CardGameState, EngineError> {
        let timestamp = self.timestamp;
        self.timestamp += 1;

        if !state.status.is_in_progress()
            && !matches!(
                action,
                CardGameAction::StartGame | CardGameAction::Join { .. } | CardGameAction::Leave { .. }
            )
        {
            debug!(
                "rejecting `{}`: game is not in progress (status = {:?})",
                action.kind_name(),
                state.status
            );
            return Ok(state.clone());
        }

        let mut next = state.clone();
        if let Err(err) = self.dispatch(state, &mut next, action, timestamp) {
            error!("reducing `{}` failed: {err}", action.kind_name());
            return Err(err);
        };

        let transitions = phase::run(&mut next, &self.ruleset, &mut self.prng, timestamp)?;

        if content_equal(state, &next) {
            return Ok(state.clone());
        }

        next.version += 1;
        next.action_log.push(ResolvedAction {
            turn_number: next.turn_number,
            player_id: action.player_id().map(String::from),
            action_name: action.kind_name().to_string(),
            timestamp,
            phase_transitions: transitions,
        });
        Ok(next)
    }

    /// Mutates `next` (a working copy of `state`) according to `action`.
    /// `state` is only consulted for turn/validity checks — everything
    /// this function writes lands on `next`, so an early `?` here leaves
    /// `state` untouched for the caller to return as-is.
    fn dispatch(
        &mut self,
        state: &CardGameState,
        next: &mut CardGameState,
        action: &CardGameAction,
        timestamp: u64,
    ) -> Result<(), EngineError> {
        match action {
            CardGameAction::Join { player_id, name } => {
                if let Some(player) = next.players.get_mut(player_id) {
                    player.connected = true;
                    player.name.clone_from(name);
                } else {
                    warn!("join rejected: `{player_id}` has no pre-allocated seat");
                }
            }
            CardGameAction::Leave { player_id } => {
                if let Some(player) = next.players.get_mut(player_id) {
                    player.connected = false;
                } else {
                    warn!("leave rejected: unknown player `{player_id}`");
                }
            }
            CardGameAction::StartGame => {
                if matches!(next.status, GameStatus::WaitingForPlayers) {
                    next.status = GameStatus::InProgress {
                        started_at: timestamp,
                    };
                    next.current_phase = self.ruleset.first_phase().to_string();
                } else {
                    debug!("start_game is a no-op once the game has already started");
                }
            }
            CardGameAction::PlayCard {
                player_id,
                card_id,
                from_zone,
                to_zone,
            } => {
                if !validate::is_players_turn(state, &self.ruleset, player_id) {
                    warn!("play_card rejected: it is not `{player_id}`'s turn");
                    return Ok(());
                }
                if !move_card_by_id(next, from_zone, to_zone, *card_id) {
                    warn!("play_card rejected: card#{card_id} not found in `{from_zone}`");
                    return Ok(());
                }
                if let Some(decl) = validate::find_declared_action(&self.ruleset, next, "play_card") {
                    let effects = decl.effects.clone();
                    run_effects(next, &self.ruleset, &mut self.prng, timestamp, &effects, &HashMap::new())?;
                }
            }
            CardGameAction::DrawCard {
                player_id,
                from_zone,
                to_zone,
                count,
            } => {
                if !validate::is_players_turn(state, &self.ruleset, player_id) {
                    warn!("draw_card rejected: it is not `{player_id}`'s turn");
                    return Ok(());
                }
                effect::apply(
                    next,
                    &self.ruleset,
                    &mut self.prng,
                    timestamp,
                    &EffectIntent::MoveTop {
                        from_zone: from_zone.clone(),
                        to_zone: to_zone.clone(),
                        count: *count,
                    },
                )?;
            }
            CardGameAction::Declare {
                player_id,
                declaration,
                params,
            } => {
                let Some(decl) = validate::find_declared_action(&self.ruleset, next, declaration) else {
                    warn!("declare rejected: unknown declaration `{declaration}`");
                    return Ok(());
                };
                let decl = decl.clone();
                if !validate::is_action_enabled(state, &self.ruleset, player_id, &decl) {
                    warn!("declare rejected: `{declaration}` is not currently enabled for `{player_id}`");
                    return Ok(());
                }
                run_effects(next, &self.ruleset, &mut self.prng, timestamp, &decl.effects, params)?;
            }
            CardGameAction::EndTurn { player_id } => {
                if !validate::is_players_turn(state, &self.ruleset, player_id) {
                    warn!("end_turn rejected: it is not `{player_id}`'s turn");
                    return Ok(());
                }
                effect::apply(next, &self.ruleset, &mut self.prng, timestamp, &EffectIntent::EndTurn)?;
            }
            CardGameAction::AdvancePhase => {
                // No intrinsic mutation: this action exists purely to
                // nudge the phase machine below into re-checking its
                // transition guards.
            }
            CardGameAction::ResetRound => {
                effect::apply(next, &self.ruleset, &mut self.prng, timestamp, &EffectIntent::ResetRound)?;
                effect::apply(
                    next,
                    &self.ruleset,
                    &mut self.prng,
                    timestamp,
                    &EffectIntent::CollectAllTo {
                        to_zone: "draw_pile".to_string(),
                    },
                )?;
                next.current_phase = self.ruleset.first_phase().to_string();
                next.current_player_index = 0;
                next.turn_number = 0;
                next.turns_taken_this_phase = 0;
            }
        }
        Ok(())
    }
}

/// Construct a [`Reducer`].
#[must_use]
pub fn create_reducer(ruleset: Ruleset, seed: u64) -> Reducer {
    Reducer::new(ruleset, seed)
}

/// Evaluate each effect-expression source in order, applying the intents
/// accumulated by one expression before evaluating the next — the same
/// evaluate-then-apply-then-advance pattern `phase::run_automatic_sequence`
/// uses, so a `declare`'s later effects see the earlier ones' results.
///
/// A parse or evaluation failure here is folded into `EngineError` and
/// propagated immediately, discarding any intents collected for the
/// failing expression; the caller (`Reducer::dispatch`) is always
/// working against a copy of the input state, so nothing partially
/// applied ever reaches the caller of `reduce`.
fn run_effects(
    state: &mut CardGameState,
    ruleset: &Ruleset,
    prng: &mut Prng,
    timestamp: u64,
    effects: &[String],
    params: &HashMap<String, f64>,
) -> Result<(), EngineError> {
    for source in effects {
        let expr = parse(source).map_err(|e| InvariantViolation::InvalidScoringExpression {
            field: "action.effects".to_string(),
            reason: e.to_string(),
        })?;
        let intents = {
            let mut ctx = EvalContext::new(state, ruleset).with_params(params.clone());
            eval(&expr, &mut ctx)?;
            ctx.intents
        };
        for intent in intents {
            effect::apply(state, ruleset, prng, timestamp, &intent)?;
        }
    }
    Ok(())
}

/// Removes the card with id `card_id` from `from_zone` and appends it to
/// the end of `to_zone`. Returns `false` (no mutation) if either zone is
/// missing or the card isn't in `from_zone` — the caller treats that as
/// an ordinary action rejection, not an error.
fn move_card_by_id(state: &mut CardGameState, from_zone: &str, to_zone: &str, card_id: u64) -> bool {
    if !state.zones.contains_key(to_zone) {
        return false;
    }
    let Some(from) = state.zones.get_mut(from_zone) else {
        return false;
    };
    let Some(pos) = from.cards.iter().position(|c| c.id.0 == card_id) else {
        return false;
    };
    let card = from.cards.remove(pos);
    state.zones.get_mut(to_zone).expect("checked above").cards.push(card);
    true
}

/// Whether `a` and `b` would look identical to every observer: same
/// status, seating, zones, phase, turn bookkeeping, scores and
/// variables. Deliberately ignores `version` and `action_log`, which are
/// exactly the two fields this comparison exists to decide whether to
/// bump.
fn content_equal(a: &CardGameState, b: &CardGameState) -> bool {
    a.status == b.status
        && a.players == b.players
        && a.player_order == b.player_order
        && a.zones == b.zones
        && a.current_phase == b.current_phase
        && a.current_player_index == b.current_player_index
        && a.turn_direction == b.turn_direction
        && a.turn_number == b.turn_number
        && a.turns_taken_this_phase == b.turns_taken_this_phase
        && a.scores == b.scores
        && a.variables == b.variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::registry;
    use crate::initial::create_initial_state;
    use serial_test::serial;

    fn blackjack_like_ruleset() -> Ruleset {
        Ruleset::load(
            r#"{
                "meta": {"name": "T", "slug": "t", "version": "1.0.0", "author": "me",
                          "players": {"min": 1, "max": 2}},
                "deck": {"kind": "preset", "preset": "standard_52", "copies": 1},
                "cardValues": {},
                "zones": [
                    {"name": "draw_pile", "visibility": {"kind": "hidden"}, "owners": []},
                    {"name": "hand", "visibility": {"kind": "owner_only"}, "owners": ["player"]},
                    {"name": "discard", "visibility": {"kind": "public"}, "owners": []}
                ],
                "roles": [{"name": "player", "isHuman": true, "count": "per_player"}],
                "phases": [
                    {"name": "deal", "kind": "automatic", "transitions": [
                        {"to": "play", "when": "card_count(\"hand:0\") >= 2"}
                    ], "automaticSequence": ["deal(\"draw_pile\", \"hand\", 2)"]},
                    {"name": "play", "kind": "turn_based", "actions": [
                        {"name": "hit", "condition": null, "effects": ["draw(\"draw_pile\", current_player.hand, 1)"]}
                    ], "transitions": []}
                ],
                "scoring": {"method": "0", "winCondition": "false"}
            }"#,
        )
        .unwrap()
    }

    fn players(n: usize) -> Vec<(String, String)> {
        (0..n).map(|i| (format!("p{i}"), format!("Player {i}"))).collect()
    }

    #[test]
    #[serial]
    fn start_game_drives_through_automatic_deal_phase() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let next = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        assert_eq!(next.current_phase, "play");
        assert_eq!(next.zone("hand:0").unwrap().cards.len(), 2);
        assert_eq!(next.zone("hand:1").unwrap().cards.len(), 2);
        assert_eq!(next.version, 1);
        assert_eq!(next.action_log.len(), 1);
    }

    #[test]
    #[serial]
    fn start_game_twice_is_a_no_op() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        let again = reducer.reduce(&started, &CardGameAction::StartGame).unwrap();
        assert_eq!(again.version, started.version);
        assert_eq!(again.action_log.len(), started.action_log.len());
    }

    #[test]
    #[serial]
    fn out_of_turn_action_is_a_no_op() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        let not_my_turn = if started.current_player() == Some("p0") { "p1" } else { "p0" };
        let rejected = reducer
            .reduce(
                &started,
                &CardGameAction::EndTurn {
                    player_id: not_my_turn.to_string(),
                },
            )
            .unwrap();
        assert_eq!(rejected.version, started.version);
    }

    #[test]
    #[serial]
    fn unknown_declaration_is_a_no_op() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        let current = started.current_player().unwrap().to_string();
        let rejected = reducer
            .reduce(
                &started,
                &CardGameAction::Declare {
                    player_id: current,
                    declaration: "nonexistent".to_string(),
                    params: HashMap::new(),
                },
            )
            .unwrap();
        assert_eq!(rejected, started);
    }

    #[test]
    #[serial]
    fn declared_hit_draws_a_card_for_current_player() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        let current = started.current_player().unwrap().to_string();
        let hand_zone = format!("hand:{}", started.current_player_index);
        let before = started.zone(&hand_zone).unwrap().cards.len();
        let after_hit = reducer
            .reduce(
                &started,
                &CardGameAction::Declare {
                    player_id: current,
                    declaration: "hit".to_string(),
                    params: HashMap::new(),
                },
            )
            .unwrap();
        assert_eq!(after_hit.zone(&hand_zone).unwrap().cards.len(), before + 1);
    }

    #[test]
    #[serial]
    fn reset_round_collects_cards_and_redeals_through_the_automatic_phase() {
        registry::clear_all();
        registry::register_all_defaults();
        let ruleset = blackjack_like_ruleset();
        let initial = create_initial_state(&ruleset, "s1", &players(2), 42);
        let mut reducer = Reducer::new(ruleset, 42);
        let started = reducer.reduce(&initial, &CardGameAction::StartGame).unwrap();
        let total_before = started.total_cards();
        // reset_round collects everything back to draw_pile, returns to the
        // ruleset's first phase, and the reducer's post-action phase-machine
        // pass immediately redeals through that automatic phase again.
        let reset = reducer.reduce(&started, &CardGameAction::ResetRound).unwrap();
        assert_eq!(reset.current_phase, "play");
        assert_eq!(reset.zone("hand:0").unwrap().cards.len(), 2);
        assert_eq!(reset.zone("hand:1").unwrap().cards.len(), 2);
        assert_eq!(reset.zone("draw_pile").unwrap().cards.len(), total_before - 4);
    }
}
