//! Serde records matching the CLEVR scene JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::object::SceneObject;

/// One entry of a CLEVR `scenes` file. Fields the evaluator does not use
/// (pixel coordinates, directions, split) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScene {
    pub image_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,
    pub objects: Vec<RawObject>,
    /// Relation name to one row per object: row `i` lists the objects that
    /// stand in that relation to object `i`.
    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<Vec<usize>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObject {
    pub color: String,
    pub size: String,
    pub shape: String,
    pub material: String,
    #[serde(default)]
    pub rotation: f64,
    #[serde(rename = "3d_coords", default)]
    pub coords: [f64; 3],
}

impl RawObject {
    pub fn to_object(&self) -> SceneObject {
        let [x, y, z] = self.coords;
        SceneObject::new(&self.color, &self.size, &self.shape, &self.material)
            .with_pose(self.rotation, x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "image_index": 4,
        "image_filename": "CLEVR_val_000004.png",
        "split": "val",
        "objects": [
            {"color": "red", "size": "small", "shape": "cylinder", "material": "metal",
             "rotation": 12.5, "3d_coords": [1.0, 2.0, 0.35], "pixel_coords": [10, 20, 9.5]},
            {"color": "blue", "size": "large", "shape": "cube", "material": "rubber",
             "rotation": 90.0, "3d_coords": [-1.0, 0.5, 0.7]}
        ],
        "relationships": {"front": [[1], []], "behind": [[], [0]], "left": [[], []], "right": [[], []]}
    }"#;

    #[test]
    fn test_deserialize_clevr_scene() {
        let raw: RawScene = serde_json::from_str(SCENE).unwrap();
        assert_eq!(raw.image_index, 4);
        assert_eq!(raw.objects.len(), 2);
        assert_eq!(raw.objects[0].coords, [1.0, 2.0, 0.35]);
        assert_eq!(raw.relationships["front"], vec![vec![1], vec![]]);
    }

    #[test]
    fn test_to_object() {
        let raw: RawScene = serde_json::from_str(SCENE).unwrap();
        let obj = raw.objects[1].to_object();
        assert_eq!(obj.get_attribute("shape").unwrap(), "cube");
        assert_eq!(obj.rotation(), 90.0);
        assert_eq!(obj.coords(), [-1.0, 0.5, 0.7]);
    }
}
