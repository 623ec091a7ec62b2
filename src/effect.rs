//! Deferred effect intents produced by effect builtins.
//!
//! Calling an effect builtin from inside an expression never mutates
//! state in place: it appends an [`EffectIntent`] to the evaluation
//! context and returns a value describing the outcome (e.g. how many
//! cards actually moved). The reducer applies the accumulated intents,
//! in order, once the whole expression (and, for phase automatic
//! sequences, the whole fixpoint loop) has finished evaluating. This
//! separation is what keeps expression evaluation free of partial-write
//! bugs: a query or a guard can call an effect-bearing expression for
//! its return value without the state changing out from under a sibling
//! evaluation in the same pass.

#[derive(Clone, Debug, PartialEq)]
pub enum EffectIntent {
    Shuffle {
        zone: String,
    },
    /// Distributes `count` cards one at a time, round-robin, from
    /// `from_zone` into every existing per-player `to_zone:<i>` (falling
    /// back to a single `to_zone` if no per-player expansion exists).
    Deal {
        count: u32,
        from_zone: String,
        to_zone: String,
    },
    Draw {
        from_zone: String,
        to_zone: String,
        count: u32,
    },
    MoveTop {
        from_zone: String,
        to_zone: String,
        count: u32,
    },
    MoveAll {
        from_zone: String,
        to_zone: String,
    },
    FlipTop {
        zone: String,
        count: u32,
    },
    SetFaceUp {
        zone: String,
        index: usize,
        face_up: bool,
    },
    RevealAll {
        zone: String,
    },
    /// Collects every existing `base:<i>` per-player zone into `to_zone`.
    CollectTrick {
        base: String,
        to_zone: String,
    },
    CollectAllTo {
        to_zone: String,
    },
    EndTurn,
    SkipNextPlayer,
    ReverseTurnOrder,
    SetLeadPlayer {
        index: usize,
    },
    SetVar {
        name: String,
        value: f64,
    },
    IncVar {
        name: String,
        delta: f64,
    },
    CalculateScores,
    DetermineWinners,
    AccumulateScores,
    EndGame,
    ResetRound,
}

use crate::error::InvariantViolation;
use crate::expr::eval::{eval, EvalContext};
use crate::expr::parse::{parse, Expr};
use crate::expr::value::Value;
use crate::prng::Prng;
use crate::ruleset::Ruleset;
use crate::state::{CardGameState, GameStatus};

/// Apply one resolved intent to `state` in place. `prng` is threaded in
/// for `Shuffle`; every other variant is a pure function of the state it
/// already holds.
///
/// Expression parse failures here are ruleset-authoring bugs (a bad
/// `winCondition` string, say) and are folded into
/// [`InvariantViolation`] rather than threaded back out as
/// `ExpressionError`, since by the time effects are being applied the
/// reducer has committed to this action succeeding.
pub fn apply(
    state: &mut CardGameState,
    ruleset: &Ruleset,
    prng: &mut Prng,
    timestamp: u64,
    intent: &EffectIntent,
) -> Result<(), InvariantViolation> {
    match intent {
        EffectIntent::Shuffle { zone } => {
            if let Some(z) = state.zones.get_mut(zone) {
                prng.shuffle(&mut z.cards);
            }
        }
        EffectIntent::Deal {
            count,
            from_zone,
            to_zone,
        } => {
            let seats: Vec<String> = (0..state.player_order.len())
                .map(|i| format!("{to_zone}:{i}"))
                .filter(|name| state.zones.contains_key(name))
                .collect();
            let targets: Vec<String> = if seats.is_empty() {
                vec![to_zone.clone()]
            } else {
                seats
            };
            for target in &targets {
                for _ in 0..*count {
                    move_one(state, from_zone, target);
                }
            }
        }
        EffectIntent::Draw {
            from_zone,
            to_zone,
            count,
        } => {
            for _ in 0..*count {
                move_one(state, from_zone, to_zone);
            }
        }
        EffectIntent::MoveTop {
            from_zone,
            to_zone,
            count,
        } => {
            for _ in 0..*count {
                move_one(state, from_zone, to_zone);
            }
        }
        EffectIntent::MoveAll { from_zone, to_zone } => {
            let cards: Vec<_> = state
                .zones
                .get_mut(from_zone)
                .map(|z| std::mem::take(&mut z.cards))
                .unwrap_or_default();
            if let Some(to) = state.zones.get_mut(to_zone) {
                to.cards.extend(cards);
            }
        }
        EffectIntent::FlipTop { zone, count } => {
            if let Some(z) = state.zones.get_mut(zone) {
                for card in z.cards.iter_mut().take(*count as usize) {
                    card.face_up = true;
                }
            }
        }
        EffectIntent::SetFaceUp {
            zone,
            index,
            face_up,
        } => {
            if let Some(z) = state.zones.get_mut(zone) {
                if let Some(card) = z.cards.get_mut(*index) {
                    card.face_up = *face_up;
                }
            }
        }
        EffectIntent::RevealAll { zone } => {
            if let Some(z) = state.zones.get_mut(zone) {
                for card in &mut z.cards {
                    card.face_up = true;
                }
            }
        }
        EffectIntent::CollectTrick { base, to_zone } => {
            let from_zones: Vec<String> = (0..state.player_order.len())
                .map(|i| format!("{base}:{i}"))
                .collect();
            let mut collected = Vec::new();
            for from in &from_zones {
                if let Some(z) = state.zones.get_mut(from) {
                    collected.append(&mut z.cards);
                }
            }
            if let Some(to) = state.zones.get_mut(to_zone) {
                to.cards.extend(collected);
            }
        }
        EffectIntent::CollectAllTo { to_zone } => {
            let mut names: Vec<String> = state.zones.keys().cloned().collect();
            names.sort();
            let mut collected = Vec::new();
            for name in &names {
                if name != to_zone {
                    if let Some(zone) = state.zones.get_mut(name) {
                        collected.append(&mut zone.cards);
                    }
                }
            }
            if let Some(to) = state.zones.get_mut(to_zone) {
                to.cards.extend(collected);
            }
        }
        EffectIntent::EndTurn => advance_turn(state, 1),
        EffectIntent::SkipNextPlayer => advance_turn(state, 2),
        EffectIntent::ReverseTurnOrder => {
            state.turn_direction = state.turn_direction.reversed();
        }
        EffectIntent::SetLeadPlayer { index } => {
            if *index < state.player_order.len() {
                state.current_player_index = *index;
            }
            state.turns_taken_this_phase = 0;
        }
        EffectIntent::SetVar { name, value } => {
            state.variables.insert(name.clone(), *value);
        }
        EffectIntent::IncVar { name, delta } => {
            *state.variables.entry(name.clone()).or_insert(0.0) += delta;
        }
        EffectIntent::CalculateScores => calculate_scores(state, ruleset)?,
        EffectIntent::DetermineWinners => determine_winners(state, ruleset)?,
        EffectIntent::AccumulateScores => {
            for i in 0..state.player_order.len() {
                let score = state
                    .scores
                    .get(&format!("player_score:{i}"))
                    .copied()
                    .unwrap_or(0.0);
                *state
                    .variables
                    .entry(format!("cumulative_score_{i}"))
                    .or_insert(0.0) += score;
            }
        }
        EffectIntent::EndGame => {
            let winner_id = (0..state.player_order.len())
                .find(|i| state.scores.get(&format!("result:{i}")).copied() == Some(1.0))
                .map(|i| state.player_order[i].clone());
            state.status = GameStatus::Finished {
                finished_at: timestamp,
                winner_id,
            };
        }
        EffectIntent::ResetRound => reset_round_vars(state),
    }
    Ok(())
}

/// Moves the top card (index 0) of `from_zone` to the end of `to_zone`.
/// A no-op if `from_zone` is empty, matching `draw`'s documented
/// shrinking-hand behavior when fewer cards remain than requested.
fn move_one(state: &mut CardGameState, from_zone: &str, to_zone: &str) {
    let card = state.zones.get_mut(from_zone).and_then(|z| {
        if z.cards.is_empty() {
            None
        } else {
            Some(z.cards.remove(0))
        }
    });
    if let Some(card) = card {
        if let Some(to) = state.zones.get_mut(to_zone) {
            to.cards.push(card);
        }
    }
}

fn advance_turn(state: &mut CardGameState, steps: usize) {
    if state.player_order.is_empty() {
        return;
    }
    let len = state.player_order.len();
    let delta = match state.turn_direction {
        crate::state::TurnDirection::Clockwise => steps as isize,
        crate::state::TurnDirection::Counterclockwise => -(steps as isize),
    };
    let current = state.current_player_index as isize;
    let next = (current + delta).rem_euclid(len as isize);
    state.current_player_index = next as usize;
    state.turn_number += 1;
    state.turns_taken_this_phase += 1;
}

/// Evaluates the ruleset's scoring `method` once per seat with a synthetic
/// `current_player_index`, writing `player_score:<i>`, and once more with
/// index `-1` for `dealer_score` if a `dealer` role is declared.
fn calculate_scores(state: &mut CardGameState, ruleset: &Ruleset) -> Result<(), InvariantViolation> {
    let expr = parse(&ruleset.scoring.method).map_err(|e| InvariantViolation::InvalidScoringExpression {
        field: "scoring.method".to_string(),
        reason: e.to_string(),
    })?;
    let mut computed = Vec::new();
    for i in 0..state.player_order.len() {
        let mut ctx =
            EvalContext::new(state, ruleset).with_local("current_player_index", Value::Number(i as f64));
        if let Ok(score) = eval(&expr, &mut ctx).and_then(|v| v.as_number()) {
            computed.push((format!("player_score:{i}"), score));
        }
    }
    if ruleset.role("dealer").is_some() {
        let mut ctx =
            EvalContext::new(state, ruleset).with_local("current_player_index", Value::Number(-1.0));
        if let Ok(score) = eval(&expr, &mut ctx).and_then(|v| v.as_number()) {
            computed.push(("dealer_score".to_string(), score));
        }
    }
    for (key, score) in computed {
        state.scores.insert(key, score);
    }
    Ok(())
}

/// Evaluates `winCondition` (and, if declared, `bustCondition` and
/// `tieCondition`) once per seat with `current_player_index`/`my_score`
/// bound, writing `result:<i> ∈ {+1, 0, -1}`. `bustCondition` takes priority over a win, and an
/// explicit tie takes priority over both — a ruleset that declares a tie
/// condition wants it checked before awarding a win.
fn determine_winners(state: &mut CardGameState, ruleset: &Ruleset) -> Result<(), InvariantViolation> {
    let win_expr = parse(&ruleset.scoring.win_condition).map_err(|e| {
        InvariantViolation::InvalidScoringExpression {
            field: "scoring.winCondition".to_string(),
            reason: e.to_string(),
        }
    })?;
    let bust_expr = ruleset
        .scoring
        .bust_condition
        .as_ref()
        .map(|src| {
            parse(src).map_err(|e| InvariantViolation::InvalidScoringExpression {
                field: "scoring.bustCondition".to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;
    let tie_expr = ruleset
        .scoring
        .tie_condition
        .as_ref()
        .map(|src| {
            parse(src).map_err(|e| InvariantViolation::InvalidScoringExpression {
                field: "scoring.tieCondition".to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;
    let mut results = Vec::new();
    for i in 0..state.player_order.len() {
        let my_score = Value::Number(
            state
                .scores
                .get(&format!("player_score:{i}"))
                .copied()
                .unwrap_or(0.0),
        );
        let eval_guard = |expr: &Expr| {
            let mut ctx = EvalContext::new(state, ruleset)
                .with_local("current_player_index", Value::Number(i as f64))
                .with_local("my_score", my_score.clone());
            eval(expr, &mut ctx).map(|v| v.is_truthy()).unwrap_or(false)
        };
        let busted = bust_expr.as_ref().is_some_and(&eval_guard);
        let tied = tie_expr.as_ref().is_some_and(&eval_guard);
        let won = eval_guard(&win_expr);
        let result = if busted {
            -1.0
        } else if tied {
            0.0
        } else if won {
            1.0
        } else {
            0.0
        };
        results.push((format!("result:{i}"), result));
    }
    for (key, result) in results {
        state.scores.insert(key, result);
    }
    Ok(())
}

/// The `reset_round()` *builtin*'s scope: clear every score
/// key and every variable except the `cumulative_*` ones a multi-round
/// ruleset (Hearts) relies on to survive a round boundary. Resetting card
/// positions and the current phase is the top-level `reset_round` *action*'s
/// job (see [`crate::reducer`]), not this builtin's — the two are distinct
/// operations that happen to share a name.
fn reset_round_vars(state: &mut CardGameState) {
    state.scores.clear();
    state
        .variables
        .retain(|name, _| name.starts_with("cumulative_"));
}
