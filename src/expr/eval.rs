//! Tree-walking evaluator.
//!
//! Evaluation is pure with respect to [`CardGameState`]: nothing here
//! ever mutates state directly. Calling an effect builtin instead pushes
//! an [`EffectIntent`] onto [`EvalContext::intents`] and yields a value
//! describing the call's outcome; it's up to the caller (the reducer or
//! the phase machine) to apply the accumulated intents afterward.

use std::collections::HashMap;

use log::{debug, trace};

use crate::builtins::registry::{self, Builtin};
use crate::effect::EffectIntent;
use crate::error::ExpressionError;
use crate::ruleset::Ruleset;
use crate::state::CardGameState;

use super::parse::{BinaryOp, Expr, UnaryOp};
use super::value::Value;

/// `while` loops are bounded the same way the parser bounds nesting: an
/// expression is ruleset-authored, not untrusted in the security sense,
/// but an authoring bug (an inverted loop condition) must not hang the
/// reducer forever, so the cap below bounds it at 100 iterations.
pub const WHILE_ITERATION_CAP: u32 = 100;

pub struct EvalContext<'a> {
    pub state: &'a CardGameState,
    pub ruleset: &'a Ruleset,
    pub locals: HashMap<String, Value>,
    /// Numeric params supplied by a `declare` action, read
    /// back through the `get_param(key)` builtin.
    pub params: HashMap<String, f64>,
    pub intents: Vec<EffectIntent>,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(state: &'a CardGameState, ruleset: &'a Ruleset) -> Self {
        Self {
            state,
            ruleset,
            locals: HashMap::new(),
            params: HashMap::new(),
            intents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_local(mut self, name: impl Into<String>, value: Value) -> Self {
        self.locals.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, f64>) -> Self {
        self.params = params;
        self
    }
}

/// Identifier resolution order: locals (internal plumbing
/// such as the `player` binding used by scoring expressions), then a
/// fixed set of state-derived fields, then `state.scores`, then
/// `state.variables`.
fn resolve_identifier(name: &str, ctx: &EvalContext) -> Result<Value, ExpressionError> {
    if let Some(value) = ctx.locals.get(name) {
        return Ok(value.clone());
    }
    match name {
        "turn_number" => return Ok(Value::Number(ctx.state.turn_number as f64)),
        "player_count" => return Ok(Value::Number(ctx.state.player_order.len() as f64)),
        "current_player_index" => return Ok(Value::Number(ctx.state.current_player_index as f64)),
        "turn_direction" => {
            return Ok(Value::Number(match ctx.state.turn_direction {
                crate::state::TurnDirection::Clockwise => 1.0,
                crate::state::TurnDirection::Counterclockwise => -1.0,
            }))
        }
        _ => {}
    }
    if let Some(score) = ctx.state.scores.get(name) {
        return Ok(Value::Number(*score));
    }
    if let Some(var) = ctx.state.variables.get(name) {
        return Ok(Value::Number(*var));
    }
    Err(ExpressionError::UnknownIdentifier(name.to_string()))
}

/// `current_player.<zone_base>` is the only composite identifier the
/// language resolves: it names the per-player zone
/// `<zone_base>:<currentPlayerIndex>`.
fn resolve_member(base: &Expr, field: &str, ctx: &EvalContext) -> Result<Value, ExpressionError> {
    match base {
        Expr::Identifier(name) if name == "current_player" => Ok(Value::String(format!(
            "{field}:{}",
            ctx.state.current_player_index
        ))),
        Expr::Identifier(name) => Err(ExpressionError::UnknownIdentifier(format!("{name}.{field}"))),
        _ => Err(ExpressionError::UnknownIdentifier(field.to_string())),
    }
}

pub fn eval(expr: &Expr, ctx: &mut EvalContext) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),
        Expr::Identifier(name) => resolve_identifier(name, ctx),
        Expr::Member { base, field } => resolve_member(base, field, ctx),
        Expr::Unary { op, expr } => eval_unary(*op, expr, ctx),
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, ctx),
        Expr::Call { name, args } => eval_call(name, args, ctx),
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => {
            trace!("evaluating `if` special form");
            if eval(cond, ctx)?.as_boolean()? {
                eval(then_branch, ctx)
            } else {
                eval(else_branch, ctx)
            }
        }
        Expr::While { cond, body } => {
            trace!("evaluating `while` special form");
            eval_while(cond, body, ctx)
        }
    }
}

fn eval_unary(op: UnaryOp, expr: &Expr, ctx: &mut EvalContext) -> Result<Value, ExpressionError> {
    let value = eval(expr, ctx)?;
    match op {
        UnaryOp::Neg => Ok(Value::Number(-value.as_number()?)),
        UnaryOp::Not => Ok(Value::Boolean(!value.as_boolean()?)),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &mut EvalContext,
) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::And => {
            let l = eval(lhs, ctx)?.as_boolean()?;
            if !l {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(eval(rhs, ctx)?.as_boolean()?))
        }
        BinaryOp::Or => {
            let l = eval(lhs, ctx)?.as_boolean()?;
            if l {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(eval(rhs, ctx)?.as_boolean()?))
        }
        BinaryOp::Eq => Ok(Value::Boolean(eval(lhs, ctx)? == eval(rhs, ctx)?)),
        BinaryOp::NotEq => Ok(Value::Boolean(eval(lhs, ctx)? != eval(rhs, ctx)?)),
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => {
            let l = eval(lhs, ctx)?.as_number()?;
            let r = eval(rhs, ctx)?.as_number()?;
            match op {
                BinaryOp::Add => Ok(Value::Number(l + r)),
                BinaryOp::Sub => Ok(Value::Number(l - r)),
                BinaryOp::Mul => Ok(Value::Number(l * r)),
                BinaryOp::Div => {
                    if r == 0.0 {
                        Err(ExpressionError::DivisionByZero)
                    } else {
                        Ok(Value::Number(l / r))
                    }
                }
                BinaryOp::Mod => {
                    if r == 0.0 {
                        Err(ExpressionError::DivisionByZero)
                    } else {
                        Ok(Value::Number(l % r))
                    }
                }
                BinaryOp::Lt => Ok(Value::Boolean(l < r)),
                BinaryOp::LtEq => Ok(Value::Boolean(l <= r)),
                BinaryOp::Gt => Ok(Value::Boolean(l > r)),
                BinaryOp::GtEq => Ok(Value::Boolean(l >= r)),
                _ => unreachable!(),
            }
        }
    }
}

fn eval_call(name: &str, args: &[Expr], ctx: &mut EvalContext) -> Result<Value, ExpressionError> {
    debug!("dispatching builtin `{name}` ({} arg(s))", args.len());
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(arg, ctx)?);
    }

    if name == "get_param" {
        let key = values
            .first()
            .ok_or_else(|| ExpressionError::Arity {
                function: "get_param".to_string(),
                expected: "1".to_string(),
                got: values.len(),
            })?
            .as_str()?;
        return Ok(Value::Number(ctx.params.get(key).copied().unwrap_or(0.0)));
    }

    match registry::lookup(name) {
        Some(Builtin::Query(f)) => f(ctx.state, ctx.ruleset, &values),
        Some(Builtin::Effect(f)) => {
            let (value, intent) = f(ctx.state, ctx.ruleset, &values)?;
            ctx.intents.push(intent);
            Ok(value)
        }
        None => Err(ExpressionError::UnknownFunction(name.to_string())),
    }
}

fn eval_while(cond: &Expr, body: &Expr, ctx: &mut EvalContext) -> Result<Value, ExpressionError> {
    let mut last = Value::Boolean(false);
    let mut iterations = 0u32;
    while eval(cond, ctx)?.as_boolean()? {
        iterations += 1;
        if iterations > WHILE_ITERATION_CAP {
            return Err(ExpressionError::WhileOverflow {
                cap: WHILE_ITERATION_CAP,
            });
        }
        last = eval(body, ctx)?;
    }
    Ok(last)
}
