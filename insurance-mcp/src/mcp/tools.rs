//! Tool catalogue derived from the API description.
//!
//! Each backend operation becomes one MCP tool whose input schema merges the
//! operation's parameters with the fields of its JSON body.

use crate::client::BODY_ARG;
use crate::openapi::{ApiSpec, Operation};
use rmcp::model::{JsonObject, Tool};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A tool together with the operation it calls.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub tool: Tool,
    pub operation: Operation,
}

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn from_spec(spec: &ApiSpec) -> Self {
        let mut registry = Self::default();
        for op in &spec.operations {
            let tool = Tool::new(
                op.name.clone(),
                describe(op),
                Arc::new(input_schema(op)),
            );
            registry.by_name.insert(op.name.clone(), registry.entries.len());
            registry.entries.push(ToolEntry {
                tool,
                operation: op.clone(),
            });
        }
        registry
    }

    /// Tools in document order.
    pub fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.tool.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Summary, long description, then the HTTP line.
pub fn describe(op: &Operation) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(summary) = &op.summary {
        parts.push(summary.clone());
    }
    if let Some(description) = &op.description {
        if op.summary.as_deref() != Some(description.as_str()) {
            parts.push(description.clone());
        }
    }
    parts.push(format!("{} {}", op.method, op.path));
    parts.join("\n\n")
}

/// JSON Schema for the tool's arguments object.
pub fn input_schema(op: &Operation) -> JsonObject {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();
    let mut open = false;

    for param in &op.parameters {
        let mut schema = param.schema.clone();
        if let (Some(text), Value::Object(fields)) = (&param.description, &mut schema) {
            fields
                .entry("description")
                .or_insert_with(|| Value::String(text.clone()));
        }
        properties.insert(param.name.clone(), schema);
        if param.required {
            required.push(param.name.clone());
        }
    }

    if let Some(body) = &op.request_body {
        match body.object_shape() {
            Some(shape) => {
                for (name, schema) in shape.properties {
                    // Parameters keep their slot; the field is still sent in the body.
                    properties.entry(name).or_insert(schema);
                }
                if body.required {
                    required.extend(shape.required);
                }
                open = shape.open;
            }
            None => {
                let mut schema = body.schema.clone();
                if let Value::Object(fields) = &mut schema {
                    fields
                        .entry("description")
                        .or_insert_with(|| json!("Request body sent as JSON"));
                }
                properties.insert(BODY_ARG.to_string(), schema);
                if body.required {
                    required.push(BODY_ARG.to_string());
                }
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    required.retain(|name| seen.insert(name.clone()));

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }
    if open {
        schema.insert("additionalProperties".into(), json!(true));
    }
    schema
}
