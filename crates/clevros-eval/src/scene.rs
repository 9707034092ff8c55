//! The scene model: objects, their spatial relations, and the evaluation
//! entry point.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clevros_types::ast::LogicalExpr;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::answer::AnswerValue;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Evaluator, DEFAULT_STEP_LIMIT};
use crate::object::SceneObject;
use crate::ontology::{Attribute, Ontology, Relation};
use crate::raw::RawScene;
use crate::value::LambdaResult;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to one object of one scene.
///
/// Handles from different scenes never compare equal, so a relation query
/// with an object from another scene is caught instead of silently reading
/// the wrong row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    scene: u64,
    index: usize,
}

impl ObjectId {
    /// Position of the object in its scene's object list.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.index as u64)
    }
}

/// Sparse relation facts: `table[relation][source]` holds the indices of the
/// objects that stand in `relation` to `source` (e.g. the objects in front
/// of it). Absent entries are false.
pub type RelationTable = BTreeMap<Relation, BTreeMap<usize, BTreeSet<usize>>>;

/// An immutable scene. Evaluating against it never changes it, so one scene
/// can be shared by any number of concurrent evaluations.
#[derive(Debug, Clone)]
pub struct Scene {
    id: u64,
    image_index: usize,
    objects: Vec<SceneObject>,
    relations: RelationTable,
    ontology: Arc<Ontology>,
}

impl Scene {
    /// Build a scene, checking every attribute token against the ontology's
    /// vocabulary and every relation index against the object list.
    pub fn new(
        ontology: Arc<Ontology>,
        image_index: usize,
        objects: Vec<SceneObject>,
        relations: RelationTable,
    ) -> EvalResult<Self> {
        let objects = objects
            .iter()
            .enumerate()
            .map(|(i, obj)| obj.interned(ontology.vocabulary(), i))
            .collect::<EvalResult<Vec<_>>>()?;

        let count = objects.len();
        for (relation, table) in &relations {
            for (&source, targets) in table {
                let out_of_range = std::iter::once(&source)
                    .chain(targets)
                    .find(|&&i| i >= count);
                if let Some(index) = out_of_range {
                    return Err(EvalError::MalformedScene(format!(
                        "'{relation}' relation refers to object {index}, but the scene has {count} objects"
                    )));
                }
            }
        }

        debug!(image_index, objects = count, "built scene");
        Ok(Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            image_index,
            objects,
            relations,
            ontology,
        })
    }

    /// Build a scene from a CLEVR scene record.
    pub fn from_raw(ontology: Arc<Ontology>, raw: &RawScene) -> EvalResult<Self> {
        let objects = raw.objects.iter().map(|o| o.to_object()).collect();

        let mut relations = RelationTable::new();
        for (name, rows) in &raw.relationships {
            let relation = Relation::from_name(name).ok_or_else(|| {
                EvalError::MalformedScene(format!("unknown relation '{name}'"))
            })?;
            if rows.len() > raw.objects.len() {
                return Err(EvalError::MalformedScene(format!(
                    "'{name}' lists {} rows for {} objects",
                    rows.len(),
                    raw.objects.len()
                )));
            }
            let table = relations.entry(relation).or_default();
            for (source, targets) in rows.iter().enumerate() {
                if !targets.is_empty() {
                    table.insert(source, targets.iter().copied().collect());
                }
            }
        }

        Self::new(ontology, raw.image_index, objects, relations)
    }

    pub fn image_index(&self) -> usize {
        self.image_index
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ── Objects ───────────────────────────────────────────────────────────────

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.object_ids().zip(&self.objects)
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(|index| ObjectId {
            scene: self.id,
            index,
        })
    }

    /// Handle for the `index`-th object, if there is one.
    pub fn object_id(&self, index: usize) -> Option<ObjectId> {
        (index < self.objects.len()).then_some(ObjectId {
            scene: self.id,
            index,
        })
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        id.scene == self.id && id.index < self.objects.len()
    }

    pub fn object(&self, id: ObjectId) -> EvalResult<&SceneObject> {
        if id.scene != self.id {
            return Err(EvalError::UnknownObject(format!(
                "{id} belongs to a different scene"
            )));
        }
        self.objects
            .get(id.index)
            .ok_or_else(|| EvalError::UnknownObject(id.to_string()))
    }

    /// Objects whose `attribute` is `value`, as a one-place result.
    pub fn objects_with(&self, attribute: Attribute, value: &str) -> LambdaResult {
        LambdaResult::unary(
            self.objects()
                .filter(|(_, obj)| obj.attribute(attribute) == value)
                .map(|(id, _)| id),
        )
    }

    // ── Relations ─────────────────────────────────────────────────────────────

    /// Whether `obj2` stands in `relation` to `obj1`.
    pub fn has_relation(
        &self,
        obj1: ObjectId,
        obj2: ObjectId,
        relation: Relation,
    ) -> EvalResult<bool> {
        self.object(obj1)?;
        self.object(obj2)?;
        Ok(self
            .relations
            .get(&relation)
            .and_then(|table| table.get(&obj1.index))
            .is_some_and(|targets| targets.contains(&obj2.index)))
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    pub fn evaluate(&self, expr: &LogicalExpr) -> EvalResult<AnswerValue> {
        self.evaluate_with_limit(expr, DEFAULT_STEP_LIMIT)
    }

    pub fn evaluate_with_limit(&self, expr: &LogicalExpr, step_limit: u64) -> EvalResult<AnswerValue> {
        let mut evaluator = Evaluator::with_step_limit(self, step_limit);
        let value = evaluator.eval(expr)?;
        trace!(steps = evaluator.steps(), %value, "evaluated {expr}");
        AnswerValue::from_value(value)
    }

    /// Read `text` as a logical form and evaluate it.
    pub fn evaluate_str(&self, text: &str) -> EvalResult<AnswerValue> {
        let expr =
            clevros_parser::read(text).map_err(|errors| EvalError::Syntax(errors.to_string()))?;
        self.evaluate(&expr)
    }
}
