//! Partial definitions and the unvalidated candidates they are built from.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use minijinja::Environment;
use serde_json::Value;

use crate::schema::PropSchema;

/// Category a partial is filed under in the component catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Layout,
    Content,
    Media,
    Navigation,
    Interactive,
    Utility,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Layout,
        Category::Content,
        Category::Media,
        Category::Navigation,
        Category::Interactive,
        Category::Utility,
    ];

    /// Name used in partial files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Layout => "layout",
            Category::Content => "content",
            Category::Media => "media",
            Category::Navigation => "navigation",
            Category::Interactive => "interactive",
            Category::Utility => "utility",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category \"{s}\""))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error produced while compiling or rendering a template.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TemplateError(String);

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self(err.to_string())
    }
}

/// Renders validated props into markup.
///
/// Templates are pure: they read props and produce a string, nothing else.
#[derive(Clone)]
pub struct Template {
    kind: TemplateKind,
}

#[derive(Clone)]
enum TemplateKind {
    /// minijinja source, compiled once
    Source {
        env: Arc<Environment<'static>>,
        entry: String,
    },
    Function(Arc<dyn Fn(&Value) -> String + Send + Sync>),
}

impl Template {
    /// Wrap a Rust closure.
    pub fn from_fn<F>(render: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self {
            kind: TemplateKind::Function(Arc::new(render)),
        }
    }

    /// Compile a minijinja template. Output is HTML-escaped by default.
    pub fn from_source(name: &str, source: impl Into<String>) -> Result<Self, TemplateError> {
        let entry = format!("{name}.html");

        let mut env = Environment::new();
        env.add_template_owned(entry.clone(), source.into())?;

        Ok(Self {
            kind: TemplateKind::Source {
                env: Arc::new(env),
                entry,
            },
        })
    }

    /// Render markup from validated props.
    pub fn render(&self, props: &Value) -> Result<String, TemplateError> {
        match &self.kind {
            TemplateKind::Source { env, entry, .. } => {
                let template = env.get_template(entry)?;
                Ok(template.render(props)?)
            }
            TemplateKind::Function(render) => Ok(render(props)),
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TemplateKind::Source { entry, .. } => f.debug_tuple("Template").field(entry).finish(),
            TemplateKind::Function(_) => f.write_str("Template(<fn>)"),
        }
    }
}

/// Descriptive metadata for a registered partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialMetadata {
    pub description: String,
    pub category: Category,
    pub keywords: Vec<String>,
    pub usage_examples: Vec<String>,
}

/// A structurally valid partial.
///
/// Only produced by structural validation, so every instance has a schema,
/// a template, styles and complete metadata.
#[derive(Debug, Clone)]
pub struct PartialDefinition {
    pub(crate) schema: Arc<PropSchema>,
    pub(crate) template: Template,
    pub(crate) styles: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) metadata: PartialMetadata,
}

impl PartialDefinition {
    /// Get the prop schema.
    pub fn schema(&self) -> &Arc<PropSchema> {
        &self.schema
    }

    /// Get the template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Get the styles, possibly empty.
    pub fn styles(&self) -> &str {
        &self.styles
    }

    /// Names of partials this one needs, in declared order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Get the catalog metadata.
    pub fn metadata(&self) -> &PartialMetadata {
        &self.metadata
    }
}

/// Metadata as supplied, before validation.
#[derive(Debug, Clone, Default)]
pub struct CandidateMetadata {
    pub description: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub usage_examples: Option<Vec<String>>,
}

/// An unvalidated partial, as handed to `register` or produced by a loader.
#[derive(Debug, Clone, Default)]
pub struct PartialCandidate {
    pub schema: Option<Arc<PropSchema>>,
    pub template: Option<Template>,
    pub styles: Option<String>,
    pub dependencies: Vec<String>,
    pub metadata: Option<CandidateMetadata>,
}

impl PartialCandidate {
    /// Start a candidate with every required field filled in.
    pub fn new(
        schema: PropSchema,
        template: Template,
        styles: impl Into<String>,
        metadata: CandidateMetadata,
    ) -> Self {
        Self {
            schema: Some(Arc::new(schema)),
            template: Some(template),
            styles: Some(styles.into()),
            dependencies: Vec::new(),
            metadata: Some(metadata),
        }
    }

    /// Set the dependency list.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_category() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("sidebar".parse::<Category>().is_err());
    }

    #[test]
    fn source_templates_escape_html() {
        let template = Template::from_source("hero", "<h1>{{ title }}</h1>").unwrap();

        let html = template.render(&json!({ "title": "Fast & <free>" })).unwrap();

        assert_eq!(html, "<h1>Fast &amp; &lt;free&gt;</h1>");
    }

    #[test]
    fn rejects_template_with_syntax_error() {
        assert!(Template::from_source("broken", "{% if title %}<h1>").is_err());
    }

    #[test]
    fn function_templates_render_props() {
        let template = Template::from_fn(|props| {
            format!("<hr class=\"{}\">", props["tone"].as_str().unwrap_or("plain"))
        });

        let html = template.render(&json!({ "tone": "muted" })).unwrap();

        assert_eq!(html, "<hr class=\"muted\">");
    }
}
