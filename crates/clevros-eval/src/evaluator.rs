//! Expression evaluator: walks a logical form against one scene.

use std::collections::BTreeSet;

use clevros_types::ast::*;
use clevros_types::ty;
use tracing::trace;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::ontology::{Attribute, Relation};
use crate::operators::{Operator, Param};
use crate::scene::{ObjectId, Scene};
use crate::value::{LambdaResult, Value};

/// Default number of steps one evaluation may take.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Tree-walking evaluator bound to a single scene.
pub struct Evaluator<'s> {
    scene: &'s Scene,
    /// Bindings of the enclosing lambdas' variables.
    env: Environment,
    /// Steps taken so far: one per visited node and per enumerated candidate.
    steps: u64,
    step_limit: u64,
}

impl<'s> Evaluator<'s> {
    pub fn new(scene: &'s Scene) -> Self {
        Self::with_step_limit(scene, DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(scene: &'s Scene, step_limit: u64) -> Self {
        Self {
            scene,
            env: Environment::new(),
            steps: 0,
            step_limit,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.step_limit {
            Err(EvalError::StepLimitExceeded(self.step_limit))
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval(&mut self, expr: &LogicalExpr) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Constant(constant) => self.eval_constant(constant),
            ExprKind::Variable(variable) => self.eval_variable(variable),
            ExprKind::Literal { predicate, args } => self.eval_literal(predicate, args),
            ExprKind::Lambda { argument, body } => self.eval_lambda(argument, body),
        }
    }

    // ── Constants ─────────────────────────────────────────────────────────

    /// Resolve a constant outside predicate position: an operator used as a
    /// set, a truth value, a numeral, an attribute name, a relation tag, or
    /// an attribute value.
    fn eval_constant(&mut self, constant: &Constant) -> EvalResult<Value> {
        let scene = self.scene;
        let name = constant.base_name();
        let annotated = constant.ty.as_ref();

        if let Some(op) = scene.ontology().operators().get(name) {
            return self.apply(op, Vec::new());
        }

        if matches!(name, "true" | "false") && annotated.is_none_or(|t| t.is_truth()) {
            return Ok(Value::Bool(name == "true"));
        }

        let is_numeral = !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit());
        if annotated.is_some_and(|t| t.is_primitive(ty::INTEGER))
            || (annotated.is_none() && is_numeral)
        {
            return name
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::UnknownConstant(format!("'{constant}' is not an integer")));
        }

        if let Some(attr) = Attribute::from_name(name) {
            if annotated.is_none_or(|t| t.is_primitive(ty::ATTRIBUTE)) {
                return Ok(Value::Attribute(attr));
            }
        }

        if let Some(relation) = Relation::from_name(name) {
            return Ok(Value::Relation(relation));
        }

        if let Some((attr, token)) = scene.ontology().vocabulary().lookup(name) {
            if annotated.is_some_and(|t| t.is_entity_set()) {
                return Ok(Value::Set(scene.objects_with(attr, &token)));
            }
            return Ok(Value::Str(token));
        }

        Err(EvalError::UnknownConstant(constant.to_string()))
    }

    // ── Variables ─────────────────────────────────────────────────────────

    fn eval_variable(&mut self, variable: &Variable) -> EvalResult<Value> {
        check_entity_variable(variable)?;
        self.env
            .get(variable.index)
            .map(Value::Object)
            .ok_or_else(|| {
                EvalError::UnsupportedConstruct(format!("variable ${} is not bound", variable.index))
            })
    }

    // ── Literal application ───────────────────────────────────────────────

    fn eval_literal(&mut self, predicate: &LogicalExpr, args: &[LogicalExpr]) -> EvalResult<Value> {
        let ExprKind::Constant(constant) = &predicate.kind else {
            return Err(EvalError::UnsupportedConstruct(format!(
                "predicate position holds '{predicate}', not a constant"
            )));
        };
        let scene = self.scene;
        let op = scene
            .ontology()
            .operators()
            .get(constant.base_name())
            .ok_or_else(|| EvalError::UnknownOperator(constant.to_string()))?;

        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<EvalResult<Vec<_>>>()?;
        self.apply(op, values)
    }

    /// Check `values` against `op`'s parameters, then call it, or enumerate
    /// the missing trailing entity arguments.
    fn apply(&mut self, op: &Operator, values: Vec<Value>) -> EvalResult<Value> {
        if values.len() > op.arity() {
            return Err(EvalError::ArgumentType(format!(
                "'{}' takes {} arguments, got {}",
                op.name(),
                op.arity(),
                values.len()
            )));
        }
        for (position, (param, value)) in op.params().iter().zip(&values).enumerate() {
            check_argument(op, position, *param, value)?;
        }

        if values.len() == op.arity() {
            trace!(operator = op.name(), "dispatch");
            return op.call(self.scene, &values);
        }
        if op.can_enumerate(values.len()) {
            return self.enumerate(op, values);
        }
        Err(EvalError::ArgumentType(format!(
            "'{}' takes {} arguments, got {}",
            op.name(),
            op.arity(),
            values.len()
        )))
    }

    /// Evaluate a truth-valued operator for every assignment of scene objects
    /// to its missing trailing parameters, keeping the assignments that hold.
    fn enumerate(&mut self, op: &Operator, supplied: Vec<Value>) -> EvalResult<Value> {
        let candidates: Vec<ObjectId> = self.scene.object_ids().collect();
        let fixed = supplied.len();
        let missing = op.arity() - fixed;
        let mut result = LambdaResult::new(missing);
        trace!(operator = op.name(), missing, candidates = candidates.len(), "enumerate");
        if candidates.is_empty() {
            return Ok(Value::Set(result));
        }

        let mut args = supplied;
        let mut positions = vec![0usize; missing];
        loop {
            self.tick()?;
            let tuple: Vec<ObjectId> = positions.iter().map(|&i| candidates[i]).collect();
            args.truncate(fixed);
            args.extend(tuple.iter().copied().map(Value::Object));
            if op.call(self.scene, &args)?.as_bool()? {
                result.insert(tuple)?;
            }

            // Advance to the next assignment, last position fastest.
            let mut slot = missing;
            loop {
                if slot == 0 {
                    return Ok(Value::Set(result));
                }
                slot -= 1;
                positions[slot] += 1;
                if positions[slot] < candidates.len() {
                    break;
                }
                positions[slot] = 0;
            }
        }
    }

    // ── Lambda abstraction ────────────────────────────────────────────────

    /// Bind the variable to each scene object in turn and collect the
    /// bindings for which the body holds.
    fn eval_lambda(&mut self, argument: &Variable, body: &LogicalExpr) -> EvalResult<Value> {
        check_entity_variable(argument)?;
        let candidates: Vec<ObjectId> = self.scene.object_ids().collect();

        self.env.push_scope();
        let result = self.collect_bindings(argument.index, body, &candidates);
        self.env.pop_scope();
        result.map(Value::Set)
    }

    fn collect_bindings(
        &mut self,
        index: u32,
        body: &LogicalExpr,
        candidates: &[ObjectId],
    ) -> EvalResult<LambdaResult> {
        let mut arity = 1;
        let mut tuples: BTreeSet<Vec<ObjectId>> = BTreeSet::new();

        for &candidate in candidates {
            self.tick()?;
            self.env.define(index, candidate);
            match self.eval(body)? {
                Value::Bool(true) => {
                    tuples.insert(vec![candidate]);
                }
                Value::Bool(false) => {}
                // A nested abstraction: prefix each inner binding with ours.
                Value::Set(inner) => {
                    arity = 1 + inner.arity();
                    for binding in inner.iter() {
                        let mut tuple = Vec::with_capacity(arity);
                        tuple.push(candidate);
                        tuple.extend_from_slice(binding);
                        tuples.insert(tuple);
                    }
                }
                other => {
                    return Err(EvalError::ArgumentType(format!(
                        "lambda body must be truth-valued, got {}",
                        other.kind()
                    )));
                }
            }
        }

        let mut result = LambdaResult::new(arity);
        for tuple in tuples {
            result.insert(tuple)?;
        }
        Ok(result)
    }
}

fn check_entity_variable(variable: &Variable) -> EvalResult<()> {
    match &variable.ty {
        Some(t) if !t.is_entity() => Err(EvalError::UnsupportedVariableType(format!(
            "${}:{t}",
            variable.index
        ))),
        _ => Ok(()),
    }
}

fn check_argument(op: &Operator, position: usize, param: Param, value: &Value) -> EvalResult<()> {
    if param == Param::Entity && *value == Value::Nothing {
        return Err(EvalError::AmbiguousOrEmptyReference(format!(
            "argument {position} of '{}' does not denote exactly one object",
            op.name()
        )));
    }
    if !param.accepts(value) {
        return Err(EvalError::ArgumentType(format!(
            "argument {position} of '{}' expects {param}, got {}",
            op.name(),
            value.kind()
        )));
    }
    Ok(())
}
