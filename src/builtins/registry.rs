//! The process-wide builtin function table.
//!
//! Grounded on the pack's `thurn-oldsdawn` rules crate, which keeps its
//! card-ability dispatch table as a single `once_cell::sync::Lazy`
//! static rather than threading a table through every call site. The
//! registry is global for the same reason: builtins are pure functions
//! of `(state, args)`, fixed at process startup, and every reducer in
//! the process shares the same vocabulary regardless of which ruleset
//! it was built from.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::effect::EffectIntent;
use crate::error::ExpressionError;
use crate::expr::value::Value;
use crate::ruleset::Ruleset;
use crate::state::CardGameState;

pub type QueryFn =
    Arc<dyn Fn(&CardGameState, &Ruleset, &[Value]) -> Result<Value, ExpressionError> + Send + Sync>;
pub type EffectFn = Arc<
    dyn Fn(&CardGameState, &Ruleset, &[Value]) -> Result<(Value, EffectIntent), ExpressionError>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub enum Builtin {
    Query(QueryFn),
    Effect(EffectFn),
}

static REGISTRY: Lazy<Mutex<HashMap<String, Builtin>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Register a single builtin under `name`, overwriting any prior
/// registration. Exposed mainly for tests that want to stub a builtin
/// out; production code registers everything through
/// [`register_all_defaults`].
pub fn register(name: &str, builtin: Builtin) {
    REGISTRY
        .lock()
        .expect("builtin registry mutex poisoned")
        .insert(name.to_string(), builtin);
}

pub fn lookup(name: &str) -> Option<Builtin> {
    REGISTRY
        .lock()
        .expect("builtin registry mutex poisoned")
        .get(name)
        .cloned()
}

/// Drop every registered builtin. Used by `serial_test`-guarded tests
/// that want a registry with nothing but a hand-picked set of stubs.
pub fn clear_all() {
    REGISTRY
        .lock()
        .expect("builtin registry mutex poisoned")
        .clear();
}

/// Populate the registry with the full default vocabulary.
/// Idempotent: safe to call more than once, e.g. once per test
/// that needs a known-good registry state after `clear_all`.
pub fn register_all_defaults() {
    super::query::register_defaults();
    super::effect::register_defaults();
}
