//! The operator table: named semantic functions logical forms dispatch to.
//!
//! Every operator has a fixed parameter list. The evaluator checks arguments
//! against it before the call, and partially applies truth-valued operators
//! whose missing trailing parameters are all entities by enumerating
//! candidate objects (so `(filter_size scene large)` denotes a set).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{EvalError, EvalResult};
use crate::ontology::Attribute;
use crate::scene::Scene;
use crate::value::Value;

/// Signature of an operator implementation. Arguments have already been
/// checked against the operator's [`Param`] list.
pub type OperatorFn = dyn Fn(&Scene, &[Value]) -> EvalResult<Value> + Send + Sync;

/// The kind of value a parameter accepts or an operator returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Entity,
    /// A one-place tuple-set.
    Set,
    Bool,
    Int,
    Str,
    Attribute,
    Relation,
    /// Any of `Bool`, `Int` or `Str`.
    Scalar,
}

impl Param {
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Param::Entity, Value::Object(_)) => true,
            (Param::Set, Value::Set(s)) => s.arity() == 1,
            (Param::Bool, Value::Bool(_)) => true,
            (Param::Int, Value::Int(_)) => true,
            (Param::Str, Value::Str(_)) => true,
            (Param::Attribute, Value::Attribute(_)) => true,
            (Param::Relation, Value::Relation(_)) => true,
            (Param::Scalar, Value::Bool(_) | Value::Int(_) | Value::Str(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Param::Entity => "object",
            Param::Set => "set",
            Param::Bool => "bool",
            Param::Int => "int",
            Param::Str => "string",
            Param::Attribute => "attribute",
            Param::Relation => "relation",
            Param::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

// ── Operator ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Operator {
    name: String,
    params: Vec<Param>,
    result: Param,
    func: Arc<OperatorFn>,
}

impl Operator {
    pub fn new<F>(name: impl Into<String>, params: Vec<Param>, result: Param, func: F) -> Self
    where
        F: Fn(&Scene, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            result,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn result(&self) -> Param {
        self.result
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether a literal supplying only `supplied` arguments can be evaluated
    /// by enumerating objects for the rest.
    pub fn can_enumerate(&self, supplied: usize) -> bool {
        self.result == Param::Bool
            && supplied < self.params.len()
            && self.params[supplied..].iter().all(|p| *p == Param::Entity)
    }

    /// Invoke the implementation on a full argument list.
    pub fn call(&self, scene: &Scene, args: &[Value]) -> EvalResult<Value> {
        if args.len() != self.params.len() {
            return Err(EvalError::ArgumentType(format!(
                "'{}' takes {} arguments, got {}",
                self.name,
                self.params.len(),
                args.len()
            )));
        }
        (self.func)(scene, args)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

// ── Operator Table ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct OperatorTable {
    operators: BTreeMap<String, Operator>,
}

impl OperatorTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `operator`, replacing any operator of the same name.
    pub fn register(&mut self, operator: Operator) {
        self.operators.insert(operator.name.clone(), operator);
    }

    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// The CLEVR operators: scene root, per-attribute filter/query/same/equal,
    /// their factored forms, reductions, set combination, integer
    /// comparison and spatial relations.
    pub fn standard() -> Self {
        use Param::{Bool, Entity, Int, Scalar, Set, Str};

        let mut table = Self::empty();

        table.register(Operator::new("scene", vec![Entity], Bool, |_, _| {
            Ok(Value::Bool(true))
        }));

        // ── Per-attribute operators ──
        for attr in Attribute::ALL {
            table.register(Operator::new(
                format!("filter_{attr}"),
                vec![Set, Str, Entity],
                Bool,
                move |scene, args| {
                    filter(scene, attr, &args[0], &args[1], &args[2])
                },
            ));
            table.register(Operator::new(
                format!("query_{attr}"),
                vec![Entity],
                Str,
                move |scene, args| query(scene, attr, &args[0]),
            ));
            table.register(Operator::new(
                format!("same_{attr}"),
                vec![Entity, Entity],
                Bool,
                move |scene, args| same(scene, attr, &args[0], &args[1]),
            ));
            table.register(Operator::new(
                format!("equal_{attr}"),
                vec![Str, Str],
                Bool,
                |_, args| Ok(Value::Bool(args[0].as_str()? == args[1].as_str()?)),
            ));
        }

        // ── Factored forms: the attribute is an argument ──
        table.register(Operator::new(
            "filter",
            vec![Param::Attribute, Set, Str, Entity],
            Bool,
            |scene, args| filter(scene, args[0].as_attribute()?, &args[1], &args[2], &args[3]),
        ));
        table.register(Operator::new(
            "query",
            vec![Param::Attribute, Entity],
            Str,
            |scene, args| query(scene, args[0].as_attribute()?, &args[1]),
        ));
        table.register(Operator::new(
            "same",
            vec![Param::Attribute, Entity, Entity],
            Bool,
            |scene, args| same(scene, args[0].as_attribute()?, &args[1], &args[2]),
        ));
        table.register(Operator::new("equal", vec![Scalar, Scalar], Bool, |_, args| {
            if args[0].kind() != args[1].kind() {
                return Err(EvalError::ArgumentType(format!(
                    "'equal' compares a {} with a {}",
                    args[0].kind(),
                    args[1].kind()
                )));
            }
            Ok(Value::Bool(args[0] == args[1]))
        }));

        // ── Reductions ──
        table.register(Operator::new("unique", vec![Set], Entity, |_, args| {
            let set = args[0].as_set()?;
            let mut members = set.first_elements().into_iter();
            match (members.next(), members.next()) {
                (Some(only), None) => Ok(Value::Object(only)),
                _ => {
                    trace!(size = set.len(), "unique over a non-singleton set");
                    Ok(Value::Nothing)
                }
            }
        }));
        table.register(Operator::new("exists", vec![Set], Bool, |_, args| {
            Ok(Value::Bool(!args[0].as_set()?.is_empty()))
        }));
        table.register(Operator::new("count", vec![Set], Int, |_, args| {
            let n = args[0].as_set()?.len();
            i64::try_from(n)
                .map(Value::Int)
                .map_err(|_| EvalError::ArgumentType(format!("set of {n} objects is too large to count")))
        }));

        // ── Set combination, tested per candidate object ──
        table.register(Operator::new("union", vec![Set, Set, Entity], Bool, |_, args| {
            let candidate = args[2].as_object()?;
            Ok(Value::Bool(
                args[0].as_set()?.contains(candidate) || args[1].as_set()?.contains(candidate),
            ))
        }));
        let intersection = |_: &Scene, args: &[Value]| -> EvalResult<Value> {
            let candidate = args[2].as_object()?;
            Ok(Value::Bool(
                args[0].as_set()?.contains(candidate) && args[1].as_set()?.contains(candidate),
            ))
        };
        table.register(Operator::new("intersection", vec![Set, Set, Entity], Bool, intersection));
        // CLEVR programs spell it `intersect`.
        table.register(Operator::new("intersect", vec![Set, Set, Entity], Bool, intersection));

        // ── Integer comparison ──
        table.register(Operator::new("equal_integer", vec![Int, Int], Bool, |_, args| {
            Ok(Value::Bool(args[0].as_int()? == args[1].as_int()?))
        }));
        table.register(Operator::new("greater_than", vec![Int, Int], Bool, |_, args| {
            Ok(Value::Bool(args[0].as_int()? > args[1].as_int()?))
        }));
        table.register(Operator::new("less_than", vec![Int, Int], Bool, |_, args| {
            Ok(Value::Bool(args[0].as_int()? < args[1].as_int()?))
        }));

        // ── Spatial relation: (relate anchor front) is the set of objects in front of anchor ──
        table.register(Operator::new(
            "relate",
            vec![Entity, Param::Relation, Entity],
            Bool,
            |scene, args| {
                let anchor = args[0].as_object()?;
                let relation = args[1].as_relation()?;
                let candidate = args[2].as_object()?;
                scene.has_relation(anchor, candidate, relation).map(Value::Bool)
            },
        ));

        table
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.operators.keys()).finish()
    }
}

fn filter(scene: &Scene, attr: Attribute, set: &Value, value: &Value, candidate: &Value) -> EvalResult<Value> {
    let candidate = candidate.as_object()?;
    if !set.as_set()?.contains(candidate) {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(scene.object(candidate)?.attribute(attr) == value.as_str()?))
}

fn query(scene: &Scene, attr: Attribute, object: &Value) -> EvalResult<Value> {
    let object = scene.object(object.as_object()?)?;
    Ok(Value::Str(Arc::clone(object.token(attr))))
}

fn same(scene: &Scene, attr: Attribute, a: &Value, b: &Value) -> EvalResult<Value> {
    let a = scene.object(a.as_object()?)?;
    let b = scene.object(b.as_object()?)?;
    Ok(Value::Bool(a.attribute(attr) == b.attribute(attr)))
}
