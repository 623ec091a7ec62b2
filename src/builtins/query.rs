//! Read-only query builtins. None of these ever touch
//! [`crate::effect::EffectIntent`] — they only ever read `state` and
//! `ruleset` and return a [`Value`].

use std::sync::Arc;

use crate::card::{Card, WILD_SUIT};
use crate::error::ExpressionError;
use crate::expr::value::Value;
use crate::ruleset::{CardValue, Ruleset};
use crate::state::CardGameState;

use super::registry::{register, Builtin};

/// The bust threshold `hand_value` optimizes dual-valued ranks (e.g. an
/// ace counted as 1 or 11) against. Every bundled ruleset that uses dual
/// card values is a blackjack-family game, so a single constant — rather
/// than a ruleset-configurable one — matches every caller this engine
/// ships with today.
const DUAL_VALUE_BUST_THRESHOLD: f64 = 21.0;

pub fn register_defaults() {
    register("hand_value", Builtin::Query(Arc::new(hand_value)));
    register("card_count", Builtin::Query(Arc::new(card_count)));
    register("card_rank", Builtin::Query(Arc::new(card_rank)));
    register("card_rank_name", Builtin::Query(Arc::new(card_rank_name)));
    register("card_suit", Builtin::Query(Arc::new(card_suit)));
    register("count_rank", Builtin::Query(Arc::new(count_rank)));
    register(
        "count_cards_by_suit",
        Builtin::Query(Arc::new(count_cards_by_suit)),
    );
    register("top_card_rank", Builtin::Query(Arc::new(top_card_rank)));
    register(
        "top_card_rank_name",
        Builtin::Query(Arc::new(top_card_rank_name)),
    );
    register("top_card_suit", Builtin::Query(Arc::new(top_card_suit)));
    register("max_card_rank", Builtin::Query(Arc::new(max_card_rank)));
    register(
        "trick_card_count",
        Builtin::Query(Arc::new(trick_card_count)),
    );
    register("trick_winner", Builtin::Query(Arc::new(trick_winner)));
    register(
        "has_playable_card",
        Builtin::Query(Arc::new(has_playable_card)),
    );
    register(
        "card_matches_top",
        Builtin::Query(Arc::new(card_matches_top)),
    );
    register("has_card_with", Builtin::Query(Arc::new(has_card_with)));
    register("get_var", Builtin::Query(Arc::new(get_var)));
    register(
        "get_cumulative_score",
        Builtin::Query(Arc::new(get_cumulative_score)),
    );
    register(
        "min_cumulative_score",
        Builtin::Query(Arc::new(get_cumulative_score_min)),
    );
    register(
        "max_cumulative_score",
        Builtin::Query(Arc::new(get_cumulative_score_max)),
    );
    register("concat", Builtin::Query(Arc::new(concat)));
    register(
        "all_players_done",
        Builtin::Query(Arc::new(all_players_done)),
    );
    register("all_hands_dealt", Builtin::Query(Arc::new(always_true)));
    register("scores_calculated", Builtin::Query(Arc::new(always_true)));
    register("continue_game", Builtin::Query(Arc::new(always_true)));
}

/// The per-player zones a `base` name expands to: `base:0 .. base:N-1`
/// for `N` seats. Used by `trick_card_count`/`trick_winner`.
fn trick_zones<'s>(state: &'s CardGameState, base: &str) -> Vec<(usize, &'s Vec<Card>)> {
    (0..state.player_order.len())
        .filter_map(|i| state.zone(&format!("{base}:{i}")).map(|z| (i, &z.cards)))
        .collect()
}

fn arg_zone<'s>(
    state: &'s CardGameState,
    args: &[Value],
    index: usize,
) -> Result<&'s Vec<Card>, ExpressionError> {
    let name = args
        .get(index)
        .ok_or_else(|| arity_err("zone argument", index + 1, args.len()))?
        .as_str()?;
    state
        .zone(name)
        .map(|z| &z.cards)
        .ok_or_else(|| ExpressionError::UnknownZone(name.to_string()))
}

fn arity_err(function: &str, expected: usize, got: usize) -> ExpressionError {
    ExpressionError::Arity {
        function: function.to_string(),
        expected: expected.to_string(),
        got,
    }
}

/// The rank value used for numeric comparisons other than `hand_value`:
/// a dual-valued rank contributes its low value, a rank absent from
/// `cardValues` contributes 0.
fn base_rank_value(ruleset: &Ruleset, rank: &str) -> f64 {
    match ruleset.card_values.get(rank) {
        Some(CardValue::Fixed { value }) => *value as f64,
        Some(CardValue::Dual { low, .. }) => *low as f64,
        None => 0.0,
    }
}

fn hand_value(
    state: &CardGameState,
    ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let target = match args.get(1) {
        Some(v) => v.as_number()?,
        None => DUAL_VALUE_BUST_THRESHOLD,
    };
    let mut total = 0.0;
    let mut duals: Vec<(i64, i64)> = Vec::new();
    for card in cards {
        match ruleset.card_values.get(&card.rank) {
            Some(CardValue::Fixed { value }) => total += *value as f64,
            Some(CardValue::Dual { low, high }) => {
                total += *high as f64;
                duals.push((*low, *high));
            }
            None => {}
        }
    }
    for (low, high) in duals {
        if total <= target {
            break;
        }
        total -= (high - low) as f64;
    }
    Ok(Value::Number(total))
}

fn card_count(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::Number(arg_zone(state, args, 0)?.len() as f64))
}

fn card_at<'s>(
    state: &'s CardGameState,
    args: &[Value],
) -> Result<&'s Card, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let index = args
        .get(1)
        .ok_or_else(|| arity_err("card_rank/card_suit", 2, args.len()))?
        .as_number()? as usize;
    cards
        .get(index)
        .ok_or_else(|| ExpressionError::ZoneIndexOutOfBounds {
            zone: args[0].as_str().unwrap_or_default().to_string(),
            index,
        })
}

fn card_rank(
    state: &CardGameState,
    ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let card = card_at(state, args)?;
    Ok(Value::Number(base_rank_value(ruleset, &card.rank)))
}

fn card_rank_name(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::String(card_at(state, args)?.rank.clone()))
}

fn card_suit(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::String(card_at(state, args)?.suit.clone()))
}

fn count_rank(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let rank = args
        .get(1)
        .ok_or_else(|| arity_err("count_rank", 2, args.len()))?
        .as_str()?;
    Ok(Value::Number(
        cards.iter().filter(|c| c.rank == rank).count() as f64,
    ))
}

fn count_cards_by_suit(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let suit = args
        .get(1)
        .ok_or_else(|| arity_err("count_cards_by_suit", 2, args.len()))?
        .as_str()?;
    Ok(Value::Number(
        cards.iter().filter(|c| c.suit == suit).count() as f64,
    ))
}

fn top_card<'s>(state: &'s CardGameState, args: &[Value]) -> Result<&'s Card, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    cards
        .first()
        .ok_or_else(|| ExpressionError::EmptyZone(args[0].as_str().unwrap_or_default().to_string()))
}

fn top_card_rank(
    state: &CardGameState,
    ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::Number(base_rank_value(
        ruleset,
        &top_card(state, args)?.rank,
    )))
}

fn top_card_rank_name(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::String(top_card(state, args)?.rank.clone()))
}

fn top_card_suit(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::String(top_card(state, args)?.suit.clone()))
}

fn max_card_rank(
    state: &CardGameState,
    ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let max = cards
        .iter()
        .map(|c| base_rank_value(ruleset, &c.rank))
        .fold(f64::MIN, f64::max);
    Ok(Value::Number(if cards.is_empty() { 0.0 } else { max }))
}

/// The seat index whose `base:<i>` trick zone holds the highest-ranked
/// top card, ties broken toward the lowest seat index. `base` expands to
/// every existing `base:0 .. base:N-1` zone.
fn trick_winner(
    state: &CardGameState,
    ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let base = args
        .first()
        .ok_or_else(|| arity_err("trick_winner", 1, args.len()))?
        .as_str()?;
    let zones = trick_zones(state, base);
    let winner = zones
        .iter()
        .filter_map(|(i, cards)| cards.first().map(|c| (*i, base_rank_value(ruleset, &c.rank))))
        .max_by(|(a_i, a_rank), (b_i, b_rank)| {
            a_rank
                .total_cmp(b_rank)
                .then(b_i.cmp(a_i))
        })
        .ok_or_else(|| ExpressionError::EmptyZone(base.to_string()))?
        .0;
    Ok(Value::Number(winner as f64))
}

/// The total number of cards across every existing `base:<i>` zone.
fn trick_card_count(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let base = args
        .first()
        .ok_or_else(|| arity_err("trick_card_count", 1, args.len()))?
        .as_str()?;
    let total: usize = trick_zones(state, base).iter().map(|(_, c)| c.len()).sum();
    Ok(Value::Number(total as f64))
}

fn has_playable_card(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let target = top_card(state, &args[1..])?;
    Ok(Value::Boolean(cards.iter().any(|c| {
        c.suit == WILD_SUIT || c.suit == target.suit || c.rank == target.rank
    })))
}

fn card_matches_top(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let card = card_at(state, args)?;
    let target = top_card(state, &args[2..])?;
    Ok(Value::Boolean(
        card.suit == WILD_SUIT || card.suit == target.suit || card.rank == target.rank,
    ))
}

fn has_card_with(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let cards = arg_zone(state, args, 0)?;
    let rank = args
        .get(1)
        .ok_or_else(|| arity_err("has_card_with", 3, args.len()))?
        .as_str()?;
    let suit = args
        .get(2)
        .ok_or_else(|| arity_err("has_card_with", 3, args.len()))?
        .as_str()?;
    Ok(Value::Boolean(cards.iter().any(|c| {
        (suit.is_empty() || c.suit == suit) && (rank.is_empty() || c.rank == rank)
    })))
}

fn get_var(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let name = args
        .first()
        .ok_or_else(|| arity_err("get_var", 1, args.len()))?
        .as_str()?;
    Ok(Value::Number(
        state.variables.get(name).copied().unwrap_or(0.0),
    ))
}

fn get_cumulative_score(
    state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let index = args
        .first()
        .ok_or_else(|| arity_err("get_cumulative_score", 1, args.len()))?
        .as_number()? as usize;
    Ok(Value::Number(
        state
            .variables
            .get(&format!("cumulative_score_{index}"))
            .copied()
            .unwrap_or(0.0),
    ))
}

fn cumulative_scores(state: &CardGameState) -> impl Iterator<Item = f64> + '_ {
    (0..state.player_order.len()).map(move |i| {
        state
            .variables
            .get(&format!("cumulative_score_{i}"))
            .copied()
            .unwrap_or(0.0)
    })
}

fn get_cumulative_score_min(
    state: &CardGameState,
    _ruleset: &Ruleset,
    _args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::Number(
        cumulative_scores(state).fold(f64::MAX, f64::min),
    ))
}

fn get_cumulative_score_max(
    state: &CardGameState,
    _ruleset: &Ruleset,
    _args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::Number(
        cumulative_scores(state).fold(f64::MIN, f64::max),
    ))
}

fn always_true(
    _state: &CardGameState,
    _ruleset: &Ruleset,
    _args: &[Value],
) -> Result<Value, ExpressionError> {
    Ok(Value::Boolean(true))
}

/// `true` once every human seat has taken a turn this phase.
fn all_players_done(
    state: &CardGameState,
    ruleset: &Ruleset,
    _args: &[Value],
) -> Result<Value, ExpressionError> {
    let human_count = state
        .players
        .values()
        .filter(|p| ruleset.role(&p.role).is_some_and(|r| r.is_human))
        .count();
    Ok(Value::Boolean(
        state.turns_taken_this_phase as usize >= human_count,
    ))
}

fn concat(
    _state: &CardGameState,
    _ruleset: &Ruleset,
    args: &[Value],
) -> Result<Value, ExpressionError> {
    let mut out = String::new();
    for arg in args {
        match arg {
            Value::String(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Boolean(b) => out.push_str(&b.to_string()),
        }
    }
    Ok(Value::String(out))
}
