//! Effect builtins. Every function here returns a `Value`
//! describing its outcome *and* an [`EffectIntent`] the caller is
//! expected to push onto [`crate::expr::eval::EvalContext::intents`] —
//! none of them touch `state` directly, matching [`crate::effect`]'s
//! deferred-application design.

use std::sync::Arc;

use crate::effect::EffectIntent;
use crate::error::ExpressionError;
use crate::expr::value::Value;
use crate::ruleset::Ruleset;
use crate::state::CardGameState;

use super::registry::{register, Builtin};

pub fn register_defaults() {
    register("shuffle", Builtin::Effect(Arc::new(shuffle)));
    register("deal", Builtin::Effect(Arc::new(deal)));
    register("draw", Builtin::Effect(Arc::new(draw)));
    register("move_top", Builtin::Effect(Arc::new(move_top)));
    register("move_all", Builtin::Effect(Arc::new(move_all)));
    register("flip_top", Builtin::Effect(Arc::new(flip_top)));
    register("set_face_up", Builtin::Effect(Arc::new(set_face_up)));
    register("reveal_all", Builtin::Effect(Arc::new(reveal_all)));
    register("collect_trick", Builtin::Effect(Arc::new(collect_trick)));
    register(
        "collect_all_to",
        Builtin::Effect(Arc::new(collect_all_to)),
    );
    register("end_turn", Builtin::Effect(Arc::new(end_turn)));
    register(
        "skip_next_player",
        Builtin::Effect(Arc::new(skip_next_player)),
    );
    register(
        "reverse_turn_order",
        Builtin::Effect(Arc::new(reverse_turn_order)),
    );
    register(
        "set_lead_player",
        Builtin::Effect(Arc::new(set_lead_player)),
    );
    register("set_var", Builtin::Effect(Arc::new(set_var)));
    register("inc_var", Builtin::Effect(Arc::new(inc_var)));
    register(
        "calculate_scores",
        Builtin::Effect(Arc::new(calculate_scores)),
    );
    register(
        "determine_winners",
        Builtin::Effect(Arc::new(determine_winners)),
    );
    register(
        "accumulate_scores",
        Builtin::Effect(Arc::new(accumulate_scores)),
    );
    register("end_game", Builtin::Effect(Arc::new(end_game)));
    register("reset_round", Builtin::Effect(Arc::new(reset_round)));
}

type EffectResult = Result<(Value, EffectIntent), ExpressionError>;

fn arg_str<'a>(args: &'a [Value], index: usize, function: &str) -> Result<&'a str, ExpressionError> {
    args.get(index)
        .ok_or_else(|| ExpressionError::Arity {
            function: function.to_string(),
            expected: format!("at least {}", index + 1),
            got: args.len(),
        })?
        .as_str()
}

fn arg_num(args: &[Value], index: usize, function: &str) -> Result<f64, ExpressionError> {
    args.get(index)
        .ok_or_else(|| ExpressionError::Arity {
            function: function.to_string(),
            expected: format!("at least {}", index + 1),
            got: args.len(),
        })?
        .as_number()
}

fn arg_bool(args: &[Value], index: usize, function: &str) -> Result<bool, ExpressionError> {
    args.get(index)
        .ok_or_else(|| ExpressionError::Arity {
            function: function.to_string(),
            expected: format!("at least {}", index + 1),
            got: args.len(),
        })?
        .as_boolean()
}

fn zone_len(state: &CardGameState, zone: &str) -> usize {
    state.zone(zone).map_or(0, |z| z.cards.len())
}

fn shuffle(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let zone = arg_str(args, 0, "shuffle")?.to_string();
    Ok((Value::Boolean(true), EffectIntent::Shuffle { zone }))
}

fn deal(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let from_zone = arg_str(args, 0, "deal")?.to_string();
    let to_zone = arg_str(args, 1, "deal")?.to_string();
    let count = arg_num(args, 2, "deal")? as u32;
    let seats = (0..state.player_order.len())
        .filter(|i| state.zone(&format!("{to_zone}:{i}")).is_some())
        .count()
        .max(1) as u32;
    let available = zone_len(state, &from_zone) as u32;
    let actual = count.saturating_mul(seats).min(available);
    Ok((
        Value::Number(f64::from(actual)),
        EffectIntent::Deal {
            count,
            from_zone,
            to_zone,
        },
    ))
}

fn draw(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let from_zone = arg_str(args, 0, "draw")?.to_string();
    let to_zone = arg_str(args, 1, "draw")?.to_string();
    let count = arg_num(args, 2, "draw")? as u32;
    let actual = count.min(zone_len(state, &from_zone) as u32);
    Ok((
        Value::Number(f64::from(actual)),
        EffectIntent::Draw {
            from_zone,
            to_zone,
            count,
        },
    ))
}

fn move_top(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let from_zone = arg_str(args, 0, "move_top")?.to_string();
    let to_zone = arg_str(args, 1, "move_top")?.to_string();
    let count = arg_num(args, 2, "move_top")? as u32;
    let actual = count.min(zone_len(state, &from_zone) as u32);
    Ok((
        Value::Number(f64::from(actual)),
        EffectIntent::MoveTop {
            from_zone,
            to_zone,
            count,
        },
    ))
}

fn move_all(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let from_zone = arg_str(args, 0, "move_all")?.to_string();
    let to_zone = arg_str(args, 1, "move_all")?.to_string();
    let count = zone_len(state, &from_zone);
    Ok((
        Value::Number(count as f64),
        EffectIntent::MoveAll { from_zone, to_zone },
    ))
}

fn flip_top(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let zone = arg_str(args, 0, "flip_top")?.to_string();
    let count = arg_num(args, 1, "flip_top")? as u32;
    let actual = count.min(zone_len(state, &zone) as u32);
    Ok((
        Value::Number(f64::from(actual)),
        EffectIntent::FlipTop { zone, count },
    ))
}

fn set_face_up(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let zone = arg_str(args, 0, "set_face_up")?.to_string();
    let index = arg_num(args, 1, "set_face_up")? as usize;
    let face_up = arg_bool(args, 2, "set_face_up")?;
    Ok((
        Value::Boolean(true),
        EffectIntent::SetFaceUp {
            zone,
            index,
            face_up,
        },
    ))
}

fn reveal_all(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let zone = arg_str(args, 0, "reveal_all")?.to_string();
    Ok((Value::Boolean(true), EffectIntent::RevealAll { zone }))
}

fn collect_trick(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let base = arg_str(args, 0, "collect_trick")?.to_string();
    let to_zone = arg_str(args, 1, "collect_trick")?.to_string();
    let count: usize = (0..state.player_order.len())
        .map(|i| zone_len(state, &format!("{base}:{i}")))
        .sum();
    Ok((
        Value::Number(count as f64),
        EffectIntent::CollectTrick { base, to_zone },
    ))
}

fn collect_all_to(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let to_zone = arg_str(args, 0, "collect_all_to")?.to_string();
    Ok((Value::Boolean(true), EffectIntent::CollectAllTo { to_zone }))
}

fn end_turn(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::EndTurn))
}

fn skip_next_player(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::SkipNextPlayer))
}

fn reverse_turn_order(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::ReverseTurnOrder))
}

fn set_lead_player(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let index = arg_num(args, 0, "set_lead_player")? as usize;
    Ok((
        Value::Boolean(true),
        EffectIntent::SetLeadPlayer { index },
    ))
}

fn set_var(_state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let name = arg_str(args, 0, "set_var")?.to_string();
    let value = arg_num(args, 1, "set_var")?;
    Ok((Value::Number(value), EffectIntent::SetVar { name, value }))
}

fn inc_var(state: &CardGameState, _ruleset: &Ruleset, args: &[Value]) -> EffectResult {
    let name = arg_str(args, 0, "inc_var")?.to_string();
    let delta = arg_num(args, 1, "inc_var")?;
    let current = state.variables.get(&name).copied().unwrap_or(0.0);
    Ok((
        Value::Number(current + delta),
        EffectIntent::IncVar { name, delta },
    ))
}

fn calculate_scores(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::CalculateScores))
}

fn determine_winners(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::DetermineWinners))
}

fn accumulate_scores(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::AccumulateScores))
}

fn end_game(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::EndGame))
}

fn reset_round(_state: &CardGameState, _ruleset: &Ruleset, _args: &[Value]) -> EffectResult {
    Ok((Value::Boolean(true), EffectIntent::ResetRound))
}
