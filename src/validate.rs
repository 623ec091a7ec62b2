//! Action validation: the single place that decides whether
//! a named, ruleset-declared action is currently legal for a player.
//!
//! `get_valid_actions` never mutates anything and never errors on
//! malformed input — an unknown player or phase just yields an empty
//! list, consistent with the "untrusted action always collapses to a
//! no-op, never an `Err`" design.

use serde::{Deserialize, Serialize};

use crate::expr::eval::{eval, EvalContext};
use crate::expr::parse::parse;
use crate::ruleset::{ActionDecl, PhaseKind, Ruleset};
use crate::state::CardGameState;

/// One entry of [`get_valid_actions`]'s result: every
/// action declared in the current phase, paired with whether it's
/// currently usable. Declarations are never filtered out of the list —
/// only their `enabled` flag changes — so a caller can render a disabled
/// button instead of hiding it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ValidAction {
    pub action_name: String,
    pub enabled: bool,
}

/// Whether `player_id` may currently act during the ruleset's current
/// phase at all, independent of any individual action's `condition`.
#[must_use]
pub fn is_players_turn(state: &CardGameState, ruleset: &Ruleset, player_id: &str) -> bool {
    let Some(phase) = ruleset.phase(&state.current_phase) else {
        return false;
    };
    match phase.kind {
        PhaseKind::Automatic => false,
        PhaseKind::TurnBased => state.current_player() == Some(player_id),
        PhaseKind::AllPlayers => state
            .players
            .get(player_id)
            .is_some_and(|p| p.connected),
    }
}

/// Every action declared in the current phase, each paired with whether
/// `player_id` may invoke it right now: it must be their turn
/// (or the phase is `all_players`), the player must be present and
/// connected, and the action's `condition`, if any, must hold.
#[must_use]
pub fn get_valid_actions(state: &CardGameState, ruleset: &Ruleset, player_id: &str) -> Vec<ValidAction> {
    let Some(phase) = ruleset.phase(&state.current_phase) else {
        return Vec::new();
    };
    let is_present = state.players.get(player_id).is_some_and(|p| p.connected);
    let turn_ok = is_present && is_players_turn(state, ruleset, player_id);
    phase
        .actions
        .iter()
        .map(|decl| ValidAction {
            action_name: decl.name.clone(),
            enabled: turn_ok && action_condition_holds(state, ruleset, player_id, decl),
        })
        .collect()
}

/// Whether a single declared action is currently usable by `player_id` —
/// the same check `get_valid_actions` performs per-entry, exposed
/// directly for the reducer's `declare` dispatch so it doesn't have to
/// scan the whole phase just to validate one name.
#[must_use]
pub fn is_action_enabled(
    state: &CardGameState,
    ruleset: &Ruleset,
    player_id: &str,
    decl: &ActionDecl,
) -> bool {
    let is_present = state.players.get(player_id).is_some_and(|p| p.connected);
    is_present
        && is_players_turn(state, ruleset, player_id)
        && action_condition_holds(state, ruleset, player_id, decl)
}

fn action_condition_holds(
    state: &CardGameState,
    ruleset: &Ruleset,
    player_id: &str,
    decl: &ActionDecl,
) -> bool {
    let Some(condition) = &decl.condition else {
        return true;
    };
    let Ok(expr) = parse(condition) else {
        return false;
    };
    let mut ctx = EvalContext::new(state, ruleset).with_local(
        "player",
        crate::expr::value::Value::String(player_id.to_string()),
    );
    eval(&expr, &mut ctx).map(|v| v.is_truthy()).unwrap_or(false)
}

/// Look up the declared action named `action_name` in the ruleset's
/// current phase.
#[must_use]
pub fn find_declared_action<'a>(
    ruleset: &'a Ruleset,
    state: &CardGameState,
    action_name: &str,
) -> Option<&'a ActionDecl> {
    ruleset
        .phase(&state.current_phase)?
        .actions
        .iter()
        .find(|decl| decl.name == action_name)
}
