//! Translation between tool-call JSON and engine inputs.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::engine::{ConceptRef, PipeInfo};
use crate::protocol::{McpErrorCode, McpErrorResponse};
use crate::stuff::{DictStuff, PipelineInputs, Stuff, WorkingMemory, NATIVE_TEXT};

/// Bound on `$ref` indirections followed while building a skeleton.
const MAX_SCHEMA_DEPTH: usize = 32;

/// How the raw `inputs_json` argument arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputsSource {
    Absent,
    Object,
    /// The client sent the object encoded as a JSON string.
    String,
}

/// Normalize the `inputs_json` tool argument into a JSON object.
///
/// Clients disagree on whether structured arguments are sent as objects or as
/// JSON-encoded strings, so both are accepted.
pub fn coerce_inputs(
    raw: Option<&Value>,
) -> Result<(Map<String, Value>, InputsSource), McpErrorResponse> {
    match raw {
        None | Some(Value::Null) => Ok((Map::new(), InputsSource::Absent)),
        Some(Value::Object(map)) => Ok((map.clone(), InputsSource::Object)),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Ok((map, InputsSource::String)),
            Ok(Value::Null) => Ok((Map::new(), InputsSource::String)),
            Ok(other) => Err(McpErrorResponse::new(
                McpErrorCode::InvalidInputs,
                format!(
                    "inputs_json must be a JSON object, got {}",
                    json_type_name(&other)
                ),
            )),
            Err(e) => Err(McpErrorResponse::new(
                McpErrorCode::InvalidInputs,
                format!("inputs_json must be valid JSON string or dict, got invalid JSON string: {e}"),
            )),
        },
        Some(other) => Err(McpErrorResponse::new(
            McpErrorCode::InvalidInputs,
            format!(
                "inputs_json must be valid JSON string or dict, got {}",
                json_type_name(other)
            ),
        )),
    }
}

/// Build working memory from a normalized inputs object.
///
/// - `{"concept": "...", "content": ...}` is taken as an explicit stuff
/// - a bare string becomes native text
/// - anything else is passed through and the engine infers its concept
pub fn working_memory_from_inputs(inputs: Map<String, Value>) -> WorkingMemory {
    let mut memory = WorkingMemory::new();
    for (name, value) in inputs {
        memory.insert(name, stuff_from_value(value));
    }
    memory
}

fn stuff_from_value(value: Value) -> Stuff {
    match value {
        Value::String(text) => Stuff::text(text),
        Value::Object(mut map)
            if map.len() == 2 && map.get("concept").map_or(false, Value::is_string) && map.contains_key("content") =>
        {
            let concept = match map.remove("concept") {
                Some(Value::String(c)) => Some(c),
                _ => None,
            };
            let content = map.remove("content").unwrap_or(Value::Null);
            Stuff { concept, content }
        }
        other => Stuff {
            concept: None,
            content: other,
        },
    }
}

/// Inputs template for a pipe: one explicit stuff per declared input with a
/// placeholder content shaped like the concept's structure.
pub fn inputs_template(pipe: &PipeInfo) -> PipelineInputs {
    let inputs: BTreeMap<String, DictStuff> = pipe
        .inputs
        .iter()
        .map(|req| {
            (
                req.name.clone(),
                DictStuff {
                    concept: req.concept.code.clone(),
                    content: content_skeleton(&req.concept),
                },
            )
        })
        .collect();
    PipelineInputs { inputs }
}

/// Pretty JSON text of [`inputs_template`], as handed back to clients.
pub fn inputs_template_json(pipe: &PipeInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&inputs_template(pipe).inputs)
}

/// Placeholder content for a concept.
pub fn content_skeleton(concept: &ConceptRef) -> Value {
    match &concept.json_schema {
        Some(schema) => {
            let mut visiting = HashSet::new();
            skeleton_for(schema, schema, &mut visiting, 0)
        }
        None if concept.code == NATIVE_TEXT => serde_json::json!({ "text": "" }),
        None => Value::Object(Map::new()),
    }
}

fn skeleton_for(root: &Value, schema: &Value, visiting: &mut HashSet<String>, depth: usize) -> Value {
    if depth > MAX_SCHEMA_DEPTH {
        return Value::Null;
    }

    if let Some(default) = schema.get("default") {
        return default.clone();
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if !visiting.insert(reference.to_string()) {
            // Recursive structure: stop here.
            return Value::Null;
        }
        let resolved = resolve_ref(root, reference)
            .map(|target| skeleton_for(root, target, visiting, depth + 1))
            .unwrap_or(Value::Null);
        visiting.remove(reference);
        return resolved;
    }

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(branches) = schema.get(key).and_then(Value::as_array) {
            let branch = branches
                .iter()
                .find(|b| b.get("type").and_then(Value::as_str) != Some("null"))
                .or_else(|| branches.first());
            return match branch {
                Some(b) => skeleton_for(root, b, visiting, depth + 1),
                None => Value::Null,
            };
        }
    }

    let ty = match schema.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("null"),
        _ if schema.get("properties").is_some() => "object",
        _ => return Value::Null,
    };

    match ty {
        "object" => {
            let mut out = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    out.insert(name.clone(), skeleton_for(root, prop, visiting, depth + 1));
                }
            }
            Value::Object(out)
        }
        "string" => Value::String(String::new()),
        "integer" | "number" => Value::from(0),
        "boolean" => Value::Bool(false),
        "array" => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

/// Resolve a local `#/...` JSON pointer reference against the root schema.
fn resolve_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    reference.strip_prefix('#').and_then(|pointer| root.pointer(pointer))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
