//! # Card Engine
//!
//! A declarative, ruleset-driven card-game engine: load a JSON document
//! describing a game's deck, zones, phases and scoring, and drive a pure
//! `(state, action) -> state` reducer against it. The engine never
//! renders a table, never talks to a network, and never picks winners
//! on its own — it evaluates the ruleset's own expressions to do all of
//! that, which is what lets one engine run Blackjack, War, Uno,
//! Ninety-Nine and Hearts off the same code.
//!
//! ## Shape of a session
//!
//! 1. Parse a ruleset with [`Ruleset::load`].
//! 2. Build the zero state with [`initial::create_initial_state`].
//! 3. Build a [`reducer::Reducer`] with [`reducer::create_reducer`] and
//!    feed it actions one at a time via [`reducer::Reducer::reduce`].
//! 4. Project each resulting state per viewer with
//!    [`reducer::Reducer::create_player_view`], and ask
//!    [`reducer::Reducer::get_valid_actions`] what a given player may do
//!    next.
//!
//! ## Core modules
//!
//! - [`ruleset`]: the ruleset document and its data model.
//! - [`state`], [`card`], [`action`]: the state shape, card instances,
//!   and inbound actions.
//! - [`expr`]: the tokenizer, parser and evaluator for ruleset-authored
//!   expressions.
//! - [`builtins`]: the process-wide registry of query and effect
//!   functions expressions can call.
//! - [`effect`]: deferred effect intents and their application.
//! - [`phase`]: the phase state machine.
//! - [`validate`]: action-legality checks.
//! - [`reducer`]: the `(state, action) -> state` entry point.
//! - [`view`]: the per-viewer state filter.
//! - [`initial`]: the zero-state factory.
//! - [`deck`]: deck instantiation from a ruleset's deck specification.
//! - [`prng`]: the seeded, deterministic random stream.
//! - [`error`]: the engine's error taxonomy.

pub mod action;
pub mod builtins;
pub mod card;
pub mod deck;
pub mod effect;
pub mod error;
pub mod expr;
pub mod initial;
pub mod phase;
pub mod prng;
pub mod reducer;
pub mod ruleset;
pub mod state;
pub mod validate;
pub mod view;

pub use action::CardGameAction;
pub use builtins::registry::{clear_all as clear_builtins, register_all_defaults as register_all_builtins};
pub use card::{Card, CardId};
pub use error::{EngineError, ExpressionError, InvariantViolation, ParseError};
pub use initial::create_initial_state;
pub use reducer::{create_reducer, Reducer};
pub use ruleset::Ruleset;
pub use state::CardGameState;
pub use validate::{get_valid_actions, ValidAction};
pub use view::{create_player_view, PlayerView};
