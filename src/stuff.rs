//! Data shapes exchanged with the engine.
//!
//! These are pass-through containers: the engine owns their meaning. The
//! server builds [`WorkingMemory`] from tool arguments and reads
//! [`PipeOutput`] back.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Concept code of the engine's native text concept.
pub const NATIVE_TEXT: &str = "native.Text";

/// A single named piece of content in working memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stuff {
    /// Concept code. `None` lets the engine infer it from the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub content: serde_json::Value,
}

impl Stuff {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            concept: Some(NATIVE_TEXT.to_string()),
            content: serde_json::json!({ "text": text.into() }),
        }
    }
}

/// Content tagged with an explicit concept code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictStuff {
    pub concept: String,
    pub content: serde_json::Value,
}

impl From<DictStuff> for Stuff {
    fn from(d: DictStuff) -> Self {
        Self {
            concept: Some(d.concept),
            content: d.content,
        }
    }
}

/// Fully explicit pipeline inputs, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineInputs {
    pub inputs: BTreeMap<String, DictStuff>,
}

/// Input set for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingMemory {
    stuffs: BTreeMap<String, Stuff>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, stuff: Stuff) {
        self.stuffs.insert(name.into(), stuff);
    }

    pub fn get(&self, name: &str) -> Option<&Stuff> {
        self.stuffs.get(name)
    }

    pub fn len(&self) -> usize {
        self.stuffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stuffs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stuffs.keys().map(String::as_str)
    }
}

impl From<PipelineInputs> for WorkingMemory {
    fn from(inputs: PipelineInputs) -> Self {
        Self {
            stuffs: inputs
                .inputs
                .into_iter()
                .map(|(name, d)| (name, d.into()))
                .collect(),
        }
    }
}

/// Excerpt of a text with the reason it answers a question.
///
/// Structured content produced by the `retrieve` base library pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedExcerpt {
    pub text: String,
    pub justification: String,
}

/// Output of a pipeline run, as returned by the engine.
///
/// The server forwards it untouched; accessors exist for callers that want
/// typed access to the main result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipeOutput(serde_json::Value);

impl PipeOutput {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Name of the stuff aliased as the main result, if any.
    pub fn main_stuff_name(&self) -> Option<&str> {
        self.0
            .pointer("/working_memory/aliases/main_stuff")
            .and_then(|v| v.as_str())
    }

    /// Content of the main stuff.
    pub fn main_stuff_content(&self) -> Option<&serde_json::Value> {
        let name = self.main_stuff_name()?;
        self.0
            .get("working_memory")?
            .get("root")?
            .get(name)?
            .get("content")
    }

    /// Deserialize the main stuff's content.
    pub fn main_stuff_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.main_stuff_content()
            .map(|content| T::deserialize(content))
    }

    /// Deserialize the items of a list-valued main stuff.
    pub fn main_stuff_as_list<T: DeserializeOwned>(
        &self,
    ) -> Option<Result<Vec<T>, serde_json::Error>> {
        let items = self.main_stuff_content()?.get("items")?;
        Some(Vec::<T>::deserialize(items))
    }
}
