//! Declarative prop schemas.
//!
//! A [`PropSchema`] describes the props a partial accepts. It is deserialized
//! from the `schema` block of a partial file or built in code, and validates a
//! JSON props object into a normalized copy: declared defaults are filled in
//! and keys the schema does not mention are dropped.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // scheme://host followed by anything without whitespace
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("Invalid url regex")
});

/// Schema for the props of a single partial, keyed by prop name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PropSchema {
    fields: IndexMap<String, FieldSchema>,
}

/// The kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    /// One of a fixed set of strings
    Enum,
    /// Absolute URL with a scheme and host
    Url,
    Array,
    Object,
    /// Anything, passed through unchanged
    Any,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum => "enum",
            FieldKind::Url => "url",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Any => "any",
        };
        f.pad(name)
    }
}

/// Schema for one prop.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    kind: FieldKind,

    #[serde(default)]
    optional: bool,

    /// Value used when the prop is absent
    #[serde(default)]
    default: Option<Value>,

    /// Lower bound: length for strings and arrays, value for numbers
    #[serde(default)]
    min: Option<f64>,

    /// Upper bound, same interpretation as `min`
    #[serde(default)]
    max: Option<f64>,

    #[serde(default)]
    pattern: Option<Pattern>,

    /// Allowed values for `enum` fields
    #[serde(default)]
    values: Vec<String>,

    /// Element schema for `array` fields
    #[serde(default)]
    items: Option<Box<FieldSchema>>,

    /// Nested schema for `object` fields
    #[serde(default)]
    fields: Option<PropSchema>,

    #[serde(default)]
    description: Option<String>,
}

/// A compiled regular expression used by string fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Pattern(Regex);

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Regex::new(&source).map(Self)
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Dotted path to the offending value (`cta.href`, `items.2`); empty for the root
    pub path: String,

    /// Human-readable reason
    pub message: String,
}

impl SchemaIssue {
    /// Create an issue at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl PropSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any field with the same name.
    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Iterate fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a props object.
    ///
    /// Returns the normalized props, or every issue found. Validation does not
    /// stop at the first failure.
    pub fn validate(&self, props: &Value) -> Result<Value, Vec<SchemaIssue>> {
        let mut issues = Vec::new();
        let output = self.check_object(props, "", &mut issues);

        if issues.is_empty() {
            Ok(output)
        } else {
            Err(issues)
        }
    }

    fn check_object(&self, value: &Value, path: &str, issues: &mut Vec<SchemaIssue>) -> Value {
        let Some(object) = value.as_object() else {
            issues.push(type_mismatch(path, "object", value));
            return Value::Null;
        };

        let mut output = Map::new();
        for (key, field) in &self.fields {
            let field_path = join_path(path, key);

            // null counts as absent
            match object.get(key).filter(|v| !v.is_null()) {
                Some(v) => {
                    let checked = field.check(v, &field_path, issues);
                    output.insert(key.clone(), checked);
                }
                None => {
                    if let Some(default) = &field.default {
                        output.insert(key.clone(), default.clone());
                    } else if !field.optional {
                        issues.push(SchemaIssue::new(field_path, "Required"));
                    }
                }
            }
        }

        Value::Object(output)
    }
}

impl FieldSchema {
    /// Create a required field of the given kind with no constraints.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            optional: false,
            default: None,
            min: None,
            max: None,
            pattern: None,
            values: Vec::new(),
            items: None,
            fields: None,
            description: None,
        }
    }

    /// Required string field.
    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// Required number field.
    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    /// Required whole-number field.
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// Required boolean field.
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// Required absolute URL field.
    pub fn url() -> Self {
        Self::new(FieldKind::Url)
    }

    /// Required field accepting one of `values`.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::new(FieldKind::Enum);
        field.values = values.into_iter().map(Into::into).collect();
        field
    }

    /// Required array whose elements match `items`.
    pub fn array(items: FieldSchema) -> Self {
        let mut field = Self::new(FieldKind::Array);
        field.items = Some(Box::new(items));
        field
    }

    /// Required object validated against `fields`.
    pub fn object(fields: PropSchema) -> Self {
        let mut field = Self::new(FieldKind::Object);
        field.fields = Some(fields);
        field
    }

    /// Allow the field to be absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value to use when the field is absent.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Require strings to match `pattern`.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(Pattern(pattern));
        self
    }

    /// Attach a description for documentation.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field may be omitted, either optional or defaulted.
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Get the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<SchemaIssue>) -> Value {
        match self.kind {
            FieldKind::String => {
                let Some(s) = value.as_str() else {
                    issues.push(type_mismatch(path, "string", value));
                    return value.clone();
                };
                self.check_bounds(s.chars().count() as f64, path, issues, |bound, at_least| {
                    let side = if at_least { "at least" } else { "at most" };
                    format!("String must contain {side} {bound} character(s)")
                });
                if let Some(Pattern(re)) = &self.pattern {
                    if !re.is_match(s) {
                        issues.push(SchemaIssue::new(path, "Invalid"));
                    }
                }
                value.clone()
            }
            FieldKind::Url => {
                match value.as_str() {
                    Some(s) if URL_RE.is_match(s) => {}
                    Some(_) => issues.push(SchemaIssue::new(path, "Invalid url")),
                    None => issues.push(type_mismatch(path, "string", value)),
                }
                value.clone()
            }
            FieldKind::Number | FieldKind::Integer => {
                let Some(n) = value.as_f64() else {
                    issues.push(type_mismatch(path, "number", value));
                    return value.clone();
                };
                if self.kind == FieldKind::Integer && n.fract() != 0.0 {
                    issues.push(SchemaIssue::new(path, "Expected integer, received float"));
                }
                self.check_bounds(n, path, issues, |bound, at_least| {
                    let side = if at_least { "greater" } else { "less" };
                    format!("Number must be {side} than or equal to {bound}")
                });
                value.clone()
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    issues.push(type_mismatch(path, "boolean", value));
                }
                value.clone()
            }
            FieldKind::Enum => {
                match value.as_str() {
                    Some(s) if self.values.iter().any(|v| v == s) => {}
                    _ => {
                        let expected = self
                            .values
                            .iter()
                            .map(|v| format!("'{v}'"))
                            .collect::<Vec<_>>()
                            .join(" | ");
                        let received = match value {
                            Value::String(s) => format!("'{s}'"),
                            other => type_name(other).to_string(),
                        };
                        issues.push(SchemaIssue::new(
                            path,
                            format!("Invalid enum value. Expected {expected}, received {received}"),
                        ));
                    }
                }
                value.clone()
            }
            FieldKind::Array => {
                let Some(elements) = value.as_array() else {
                    issues.push(type_mismatch(path, "array", value));
                    return value.clone();
                };
                self.check_bounds(elements.len() as f64, path, issues, |bound, at_least| {
                    let side = if at_least { "at least" } else { "at most" };
                    format!("Array must contain {side} {bound} element(s)")
                });
                let checked = match &self.items {
                    Some(items) => elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| items.check(element, &join_path(path, &i.to_string()), issues))
                        .collect(),
                    None => elements.clone(),
                };
                Value::Array(checked)
            }
            FieldKind::Object => match &self.fields {
                Some(fields) => fields.check_object(value, path, issues),
                None if value.is_object() => value.clone(),
                None => {
                    issues.push(type_mismatch(path, "object", value));
                    value.clone()
                }
            },
            FieldKind::Any => value.clone(),
        }
    }

    fn check_bounds(
        &self,
        measured: f64,
        path: &str,
        issues: &mut Vec<SchemaIssue>,
        message: impl Fn(f64, bool) -> String,
    ) {
        if let Some(min) = self.min {
            if measured < min {
                issues.push(SchemaIssue::new(path, message(min, true)));
            }
        }
        if let Some(max) = self.max {
            if measured > max {
                issues.push(SchemaIssue::new(path, message(max, false)));
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> SchemaIssue {
    SchemaIssue::new(
        path,
        format!("Expected {expected}, received {}", type_name(value)),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
