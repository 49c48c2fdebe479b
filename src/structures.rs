//! Concept structure reports for loaded pipes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{ConceptRef, PipeInfo};

/// Structure of one concept: its JSON schema, or why it is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptStructure {
    pub concept_code: String,
    pub structure_class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_structure: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Input and output structures of one pipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeStructure {
    pub inputs: BTreeMap<String, ConceptStructure>,
    pub output: ConceptStructure,
}

pub fn concept_structure(concept: &ConceptRef) -> ConceptStructure {
    match &concept.json_schema {
        Some(schema) => ConceptStructure {
            concept_code: concept.code.clone(),
            structure_class_name: concept.structure_class_name.clone(),
            class_structure: Some(schema.clone()),
            error: None,
        },
        None => ConceptStructure {
            concept_code: concept.code.clone(),
            structure_class_name: concept.structure_class_name.clone(),
            class_structure: None,
            error: Some(concept.structure_error.clone().unwrap_or_else(|| {
                format!("Class '{}' not found in registry", concept.structure_class_name)
            })),
        },
    }
}

/// Map each pipe code to its input and output concept structures.
pub fn extract_pipe_structures(pipes: &[PipeInfo]) -> BTreeMap<String, PipeStructure> {
    pipes
        .iter()
        .map(|pipe| {
            let inputs = pipe
                .inputs
                .iter()
                .map(|req| (req.name.clone(), concept_structure(&req.concept)))
                .collect();
            (
                pipe.code.clone(),
                PipeStructure {
                    inputs,
                    output: concept_structure(&pipe.output),
                },
            )
        })
        .collect()
}
