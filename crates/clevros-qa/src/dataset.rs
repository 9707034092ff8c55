//! CLEVR scenes and questions files.

use std::path::Path;
use std::sync::Arc;

use clevros_eval::{AnswerValue, Ontology, RawScene, Scene};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QaError, QaResult};

#[derive(Debug, Deserialize)]
struct ScenesFile {
    scenes: Vec<RawScene>,
}

#[derive(Debug, Deserialize)]
struct QuestionsFile {
    questions: Vec<Question>,
}

/// One entry of a questions file. Programs are the s-expressions written by
/// the dataset preprocessor; questions without one are loaded but not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub image_index: usize,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_sexpr: Option<String>,
}

/// A question together with its parsed gold answer.
#[derive(Debug, Clone)]
pub struct Example {
    pub question: Question,
    pub gold: Option<AnswerValue>,
}

/// Scenes indexed by `image_index`, plus the questions about them.
#[derive(Debug)]
pub struct Dataset {
    scenes: Vec<Scene>,
    examples: Vec<Example>,
}

impl Dataset {
    /// Load a dataset from a scenes file and a questions file.
    pub fn load(
        scenes_path: impl AsRef<Path>,
        questions_path: impl AsRef<Path>,
        ontology: Arc<Ontology>,
    ) -> QaResult<Self> {
        let scenes = read(scenes_path.as_ref())?;
        let questions = read(questions_path.as_ref())?;
        Self::from_json_str(&scenes, &questions, ontology)
    }

    pub fn from_json_str(scenes: &str, questions: &str, ontology: Arc<Ontology>) -> QaResult<Self> {
        let scenes_file = parse_scenes(scenes)?;
        let questions_file: QuestionsFile =
            serde_json::from_str(questions).map_err(|source| QaError::Json {
                what: "questions".into(),
                source,
            })?;

        let scenes = load_scenes(&scenes_file.scenes, &ontology)?;
        let examples = questions_file
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| attach_gold(i, question, &scenes))
            .collect::<QaResult<Vec<_>>>()?;

        info!(scenes = scenes.len(), questions = examples.len(), "loaded dataset");
        Ok(Self { scenes, examples })
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, image_index: usize) -> Option<&Scene> {
        self.scenes.get(image_index)
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }
}

/// Load the scene with `image_index` from a scenes file without building
/// the others.
pub fn load_scene(
    path: impl AsRef<Path>,
    image_index: usize,
    ontology: Arc<Ontology>,
) -> QaResult<Scene> {
    let file = parse_scenes(&read(path.as_ref())?)?;
    let raw = file
        .scenes
        .iter()
        .find(|s| s.image_index == image_index)
        .ok_or(QaError::UnknownScene(image_index))?;
    Ok(Scene::from_raw(ontology, raw)?)
}

fn parse_scenes(text: &str) -> QaResult<ScenesFile> {
    serde_json::from_str(text).map_err(|source| QaError::Json {
        what: "scenes".into(),
        source,
    })
}

fn read(path: &Path) -> QaResult<String> {
    std::fs::read_to_string(path).map_err(|source| QaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_scenes(raw: &[RawScene], ontology: &Arc<Ontology>) -> QaResult<Vec<Scene>> {
    raw.iter()
        .enumerate()
        .map(|(position, raw)| {
            if raw.image_index != position {
                return Err(QaError::SceneOrder {
                    position,
                    image_index: raw.image_index,
                });
            }
            Ok(Scene::from_raw(Arc::clone(ontology), raw)?)
        })
        .collect()
}

fn attach_gold(index: usize, question: Question, scenes: &[Scene]) -> QaResult<Example> {
    let scene = scenes.get(question.image_index).ok_or(QaError::MissingScene {
        question: index,
        image_index: question.image_index,
    })?;
    let gold = question
        .answer
        .as_ref()
        .map(|answer| AnswerValue::from_gold(answer, scene))
        .transpose()?;
    if gold.is_none() {
        debug!(question = index, "question has no gold answer");
    }
    Ok(Example { question, gold })
}
