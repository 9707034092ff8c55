//! A single scene entity.

use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, EvalResult};
use crate::ontology::{Attribute, Vocabulary};

/// An object with four categorical attributes and a pose.
///
/// Objects carry no identity of their own: two attribute-identical objects in
/// one scene are told apart by their [`ObjectId`](crate::ObjectId).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    color: Arc<str>,
    size: Arc<str>,
    shape: Arc<str>,
    material: Arc<str>,
    rotation: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl SceneObject {
    pub fn new(color: &str, size: &str, shape: &str, material: &str) -> Self {
        Self {
            color: Arc::from(color),
            size: Arc::from(size),
            shape: Arc::from(shape),
            material: Arc::from(material),
            rotation: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn with_pose(mut self, rotation: f64, x: f64, y: f64, z: f64) -> Self {
        self.rotation = rotation;
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    pub fn attribute(&self, attribute: Attribute) -> &str {
        self.token(attribute)
    }

    /// Look up an attribute by name (`color`, `size`, `shape` or `material`).
    pub fn get_attribute(&self, name: &str) -> EvalResult<&str> {
        Attribute::from_name(name)
            .map(|attr| self.attribute(attr))
            .ok_or_else(|| EvalError::UnknownAttribute(name.to_string()))
    }

    pub(crate) fn token(&self, attribute: Attribute) -> &Arc<str> {
        match attribute {
            Attribute::Color => &self.color,
            Attribute::Size => &self.size,
            Attribute::Shape => &self.shape,
            Attribute::Material => &self.material,
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Replace every attribute token with the vocabulary's interned copy,
    /// rejecting tokens the vocabulary does not know.
    pub(crate) fn interned(&self, vocabulary: &Vocabulary, index: usize) -> EvalResult<Self> {
        let intern = |attr: Attribute| {
            let token = self.token(attr);
            vocabulary.intern(attr, token).ok_or_else(|| {
                EvalError::MalformedScene(format!("object {index} has unknown {attr} '{token}'"))
            })
        };
        let color = intern(Attribute::Color)?;
        let size = intern(Attribute::Size)?;
        let shape = intern(Attribute::Shape)?;
        let material = intern(Attribute::Material)?;
        Ok(Self {
            color,
            size,
            shape,
            material,
            rotation: self.rotation,
            x: self.x,
            y: self.y,
            z: self.z,
        })
    }
}

impl fmt::Display for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.size, self.color, self.material, self.shape
        )
    }
}
