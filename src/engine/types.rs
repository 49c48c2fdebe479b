use serde::{Deserialize, Serialize};

/// Concept reference as reported by the engine.
///
/// `json_schema` is the JSON Schema of the concept's structure class when the
/// engine could resolve it; `structure_error` explains why it could not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRef {
    pub code: String,
    #[serde(default)]
    pub structure_class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_error: Option<String>,
}

impl ConceptRef {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let structure_class_name = code.rsplit('.').next().unwrap_or_default().to_string();
        Self {
            code,
            structure_class_name,
            json_schema: None,
            structure_error: None,
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

/// One named input of a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRequirement {
    pub name: String,
    pub concept: ConceptRef,
}

/// A pipe registered in the engine's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeInfo {
    pub code: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Inputs in declaration order.
    #[serde(default)]
    pub inputs: Vec<InputRequirement>,
    pub output: ConceptRef,
}

/// Result of running the engine's builder on a brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltBundle {
    pub plx_content: String,
    #[serde(default)]
    pub main_pipe: Option<String>,
}

/// Opaque identifier of a bundle currently loaded in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleHandle(pub String);

impl std::fmt::Display for BundleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed, validated and dry-run bundle that is loaded in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedBundle {
    #[serde(rename = "bundle_id")]
    pub handle: BundleHandle,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub main_pipe: Option<String>,
    #[serde(default)]
    pub pipes: Vec<PipeInfo>,
}

impl LoadedBundle {
    pub fn pipe(&self, code: &str) -> Option<&PipeInfo> {
        self.pipes.iter().find(|p| p.code == code)
    }
}
