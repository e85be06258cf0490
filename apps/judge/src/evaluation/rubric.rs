//! Rubric template: the versioned system prompt for instructor evaluation.
//!
//! The template lives in `prompts/instructor_rubric.txt` and is embedded as the default.
//! A deployment can point `RUBRIC_TEMPLATE_PATH` at another file; it is loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Embedded default rubric. Replace `{context}` before sending.
pub const DEFAULT_RUBRIC: &str = include_str!("../../prompts/instructor_rubric.txt");

const VERSION_HEADER: &str = "# rubric-version:";

/// Placeholders every rubric body must contain.
const REQUIRED_PLACEHOLDERS: &[&str] = &["context"];

/// The seven scored dimensions, in the order the rubric presents them.
pub const CRITERIA: [&str; 7] = [
    "Communication Clarity",
    "Positivity",
    "Personal Engagement",
    "Classroom Management Practices",
    "Adherence to Rules",
    "Classroom Atmosphere",
    "Student Participation",
];

pub const SCORE_MIN: u8 = 0;
pub const SCORE_MAX: u8 = 3;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read rubric template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rubric template is missing the '# rubric-version: <version>' header line")]
    MissingVersion,

    #[error("Rubric template body has no '{0}' placeholder")]
    MissingPlaceholder(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RubricTemplate {
    version: String,
    body: String,
}

impl RubricTemplate {
    /// Parses template source: a version header line followed by the body.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let (header, body) = source.split_once('\n').unwrap_or((source, ""));
        let version = header
            .trim()
            .strip_prefix(VERSION_HEADER)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(TemplateError::MissingVersion)?;

        for &name in REQUIRED_PLACEHOLDERS {
            if !body.contains(&format!("{{{name}}}")) {
                return Err(TemplateError::MissingPlaceholder(name));
            }
        }

        Ok(Self {
            version: version.to_string(),
            body: body.to_string(),
        })
    }

    /// Loads the template from `path`, or the embedded default when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::parse(&source)
            }
            None => Self::parse(DEFAULT_RUBRIC),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Renders the rubric with the joined transcript text.
    pub fn render(&self, context: &str) -> String {
        render_placeholders(&self.body, &HashMap::from([("context", context)]))
    }
}

/// Single-pass `{name}` substitution.
///
/// Substituted values are never rescanned. Braces that do not enclose a known
/// name are copied through unchanged.
pub fn render_placeholders(template: &str, values: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match values.get(&after[..close]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
