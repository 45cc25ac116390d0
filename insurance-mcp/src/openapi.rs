//! OpenAPI 3.x document loading.
//!
//! Reads an API description (YAML or JSON), resolves local `$ref` pointers and
//! flattens every path/method pair into an [`Operation`]. The adapter builds one
//! tool per operation; nothing here talks to the network.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Longest tool name MCP clients accept.
const MAX_NAME_LEN: usize = 64;

const METHODS: &[(&str, HttpMethod)] = &[
    ("get", HttpMethod::Get),
    ("post", HttpMethod::Post),
    ("put", HttpMethod::Put),
    ("patch", HttpMethod::Patch),
    ("delete", HttpMethod::Delete),
];

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read API description {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse API description: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid API description: {0}")]
    Invalid(String),
    #[error("duplicate operation name: {0}")]
    DuplicateOperation(String),
    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub schema: Value,
}

impl RequestBody {
    /// Flattened view of the body when it is an object (directly or via `allOf`).
    /// `None` means the body has to be passed through as a single value.
    pub fn object_shape(&self) -> Option<ObjectShape> {
        object_shape(&self.schema)
    }
}

/// Properties of an object-shaped schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectShape {
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
    /// Whether keys outside `properties` are allowed.
    pub open: bool,
}

fn object_shape(schema: &Value) -> Option<ObjectShape> {
    let map = schema.as_object()?;
    let mut object_like = match map.get("type") {
        Some(Value::String(t)) if t == "object" => true,
        Some(_) => return None,
        None => false,
    };

    let mut shape = ObjectShape::default();
    if let Some(parts) = map.get("allOf").and_then(Value::as_array) {
        for part in parts {
            let inner = object_shape(part)?;
            shape.properties.extend(inner.properties);
            shape.required.extend(inner.required);
            shape.open |= inner.open;
        }
        object_like = true;
    }
    if let Some(props) = map.get("properties").and_then(Value::as_object) {
        shape
            .properties
            .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
        object_like = true;
    }
    if let Some(required) = map.get("required").and_then(Value::as_array) {
        shape
            .required
            .extend(required.iter().filter_map(Value::as_str).map(str::to_string));
    }
    if !object_like {
        return None;
    }

    shape.open |= match map.get("additionalProperties") {
        Some(Value::Bool(allowed)) => *allowed,
        Some(Value::Object(_)) => true,
        _ => shape.properties.is_empty(),
    };
    let mut seen = HashSet::new();
    shape.required.retain(|name| seen.insert(name.clone()));
    Some(shape)
}

/// A single callable endpoint of the backend.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// Tool name: the `operationId`, or one derived from method and path.
    pub name: String,
    pub method: HttpMethod,
    /// Path template relative to the base URL, e.g. `/api/policies/{id}`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl Operation {
    pub fn parameters_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

/// Parsed API description.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSpec {
    pub title: String,
    pub version: String,
    pub servers: Vec<String>,
    pub operations: Vec<Operation>,
}

impl ApiSpec {
    /// Load and parse the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Read`] when the file cannot be read, and the parse
    /// errors of [`ApiSpec::from_str`] otherwise.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = fs::read_to_string(path).map_err(|source| SpecError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

impl FromStr for ApiSpec {
    type Err = SpecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
        let doc = yaml_to_json(raw)?;
        build_spec(&doc)
    }
}

fn build_spec(doc: &Value) -> Result<ApiSpec, SpecError> {
    let root = doc
        .as_object()
        .ok_or_else(|| SpecError::Invalid("document root must be a mapping".into()))?;

    match root.get("openapi").and_then(Value::as_str) {
        Some(v) if v.starts_with("3.") => {}
        Some(v) => return Err(SpecError::Invalid(format!("unsupported OpenAPI version {v}"))),
        None => return Err(SpecError::Invalid("missing `openapi` version field".into())),
    }

    let info = root.get("info").and_then(Value::as_object);
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("API")
        .to_string();
    let version = info
        .and_then(|i| i.get("version"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let servers = root
        .get("servers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|s| s.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let paths = root
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SpecError::Invalid("missing `paths` mapping".into()))?;

    let resolver = Resolver { root: doc };
    let mut operations = Vec::new();
    let mut seen = HashSet::new();

    for (path, item) in paths {
        let item = resolver.resolve(item)?;
        let Some(item) = item.as_object() else {
            return Err(SpecError::Invalid(format!("path item {path} is not a mapping")));
        };
        let shared = parse_parameters(&resolver, item.get("parameters"))?;

        for (key, method) in METHODS {
            let Some(op) = item.get(*key).and_then(Value::as_object) else {
                continue;
            };
            let operation = parse_operation(&resolver, path, *method, op, &shared)?;
            if !seen.insert(operation.name.clone()) {
                return Err(SpecError::DuplicateOperation(operation.name));
            }
            operations.push(operation);
        }
    }

    Ok(ApiSpec {
        title,
        version,
        servers,
        operations,
    })
}

fn parse_operation(
    resolver: &Resolver<'_>,
    path: &str,
    method: HttpMethod,
    op: &Map<String, Value>,
    shared: &[Parameter],
) -> Result<Operation, SpecError> {
    let name = match op.get("operationId").and_then(Value::as_str) {
        Some(id) => sanitize_name(id),
        None => derive_operation_name(method, path),
    };

    // Operation-level parameters override path-level ones with the same key.
    let own = parse_parameters(resolver, op.get("parameters"))?;
    let mut parameters: Vec<Parameter> = shared
        .iter()
        .filter(|s| !own.iter().any(|p| p.name == s.name && p.location == s.location))
        .cloned()
        .collect();
    parameters.extend(own);

    let request_body = match op.get("requestBody") {
        Some(body) => parse_request_body(resolver, body)?,
        None => None,
    };

    let response_schema = match op.get("responses").and_then(Value::as_object) {
        Some(responses) => success_schema(resolver, responses)?,
        None => None,
    };

    let tags = op
        .get("tags")
        .and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    Ok(Operation {
        name,
        method,
        path: path.to_string(),
        summary: text_field(op, "summary"),
        description: text_field(op, "description"),
        tags,
        parameters,
        request_body,
        response_schema,
    })
}

fn parse_parameters(
    resolver: &Resolver<'_>,
    list: Option<&Value>,
) -> Result<Vec<Parameter>, SpecError> {
    let Some(list) = list.and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(list.len());
    for entry in list {
        let entry = resolver.resolve(entry)?;
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::Invalid("parameter without a name".into()))?;
        let location = match entry.get("in").and_then(Value::as_str) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            // Cookie parameters are not forwarded.
            Some("cookie") => continue,
            other => {
                return Err(SpecError::Invalid(format!(
                    "parameter {name} has unsupported location {other:?}"
                )))
            }
        };
        let required = location == ParamLocation::Path
            || entry.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema = entry
            .get("schema")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({ "type": "string" }));

        out.push(Parameter {
            name: name.to_string(),
            location,
            required,
            description: entry.get("description").and_then(Value::as_str).map(str::to_string),
            schema,
        });
    }
    Ok(out)
}

fn parse_request_body(
    resolver: &Resolver<'_>,
    body: &Value,
) -> Result<Option<RequestBody>, SpecError> {
    let body = resolver.resolve(body)?;
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Ok(None);
    };
    let media = content
        .get("application/json")
        .or_else(|| content.values().next());
    let schema = media
        .and_then(|m| m.get("schema"))
        .cloned()
        .unwrap_or_else(|| serde_json::json!({ "type": "object" }));

    Ok(Some(RequestBody {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        schema,
    }))
}

fn success_schema(
    resolver: &Resolver<'_>,
    responses: &Map<String, Value>,
) -> Result<Option<Value>, SpecError> {
    let Some((_, response)) = responses.iter().find(|(code, _)| code.starts_with('2')) else {
        return Ok(None);
    };
    let response = resolver.resolve(response)?;
    Ok(response
        .get("content")
        .and_then(|c| c.get("application/json"))
        .and_then(|m| m.get("schema"))
        .cloned())
}

fn text_field(op: &Map<String, Value>, key: &str) -> Option<String> {
    op.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build a tool name from method and path, e.g. `GET /api/policies/{id}` ->
/// `get_api_policies_id`.
pub fn derive_operation_name(method: HttpMethod, path: &str) -> String {
    let mut name = method.as_str().to_ascii_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.trim_start_matches('{').trim_end_matches('}');
        name.push('_');
        name.push_str(&segment.to_ascii_lowercase().replace('-', "_"));
    }
    sanitize_name(&name)
}

fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    name.truncate(MAX_NAME_LEN);
    name
}

/// Resolves local JSON pointers against the document root.
struct Resolver<'a> {
    root: &'a Value,
}

impl Resolver<'_> {
    fn resolve(&self, value: &Value) -> Result<Value, SpecError> {
        let mut stack = Vec::new();
        self.resolve_inner(value, &mut stack)
    }

    fn resolve_inner(&self, value: &Value, stack: &mut Vec<String>) -> Result<Value, SpecError> {
        match value {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    return self.follow(reference, map, stack);
                }
                let mut out = Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_inner(v, stack)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|v| self.resolve_inner(v, stack))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn follow(
        &self,
        reference: &str,
        siblings: &Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Result<Value, SpecError> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(SpecError::UnresolvedRef(reference.to_string()));
        };

        // Recursive schemas collapse to an open object at the point of recursion.
        if stack.iter().any(|r| r == reference) {
            return Ok(serde_json::json!({ "type": "object" }));
        }

        let target = self
            .root
            .pointer(pointer)
            .ok_or_else(|| SpecError::UnresolvedRef(reference.to_string()))?;

        stack.push(reference.to_string());
        let resolved = self.resolve_inner(target, stack);
        stack.pop();
        let mut resolved = resolved?;

        if let Value::Object(out) = &mut resolved {
            for (k, v) in siblings {
                if k != "$ref" {
                    out.insert(k.clone(), self.resolve_inner(v, stack)?);
                }
            }
        }
        Ok(resolved)
    }
}

/// YAML allows non-string keys (`200:` is an integer); JSON does not.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, SpecError> {
    use serde_yaml::Value as Y;

    Ok(match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Y::Mapping(mapping) => {
            let mut out = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                let key = match k {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => {
                        return Err(SpecError::Invalid(format!(
                            "unsupported mapping key {other:?}"
                        )))
                    }
                };
                out.insert(key, yaml_to_json(v)?);
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
