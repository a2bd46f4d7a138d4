// SPDX-License-Identifier: GPL-3.0-only

//! Core data types for the JSON layout template parser.
//!
//! This module defines the error types, validation structures, and the serde
//! definitions a layout template is read into before its geometry is resolved.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::model::Layout;

// ============================================================================
// Validation Issues
// ============================================================================

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The template cannot be scaled or toggled
    Error,
    /// The template works but probably not as intended
    Warning,
}

/// One problem found while checking a resolved layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    /// Where the problem is, e.g. `rows[3].keys[1].width`
    pub field_path: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, message, field_path)
    }

    pub fn warning(message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message, field_path)
    }

    fn with_severity(
        severity: Severity,
        message: impl Into<String>,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            field_path: field_path.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} at {}: {}", level, self.field_path, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Where a template was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A JSON file on disk
    File(String),
    /// A template embedded in the binary
    Builtin(String),
    /// A JSON string handed in by the caller
    Inline,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::File(path) => write!(f, "layout file '{}'", path),
            TemplateSource::Builtin(name) => write!(f, "built-in layout '{}'", name),
            TemplateSource::Inline => write!(f, "inline layout"),
        }
    }
}

/// Why a template could not be turned into a [`Layout`].
#[derive(Debug)]
pub enum ParseError {
    /// The template file could not be read
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The template is not valid JSON or misses required fields
    Json {
        origin: TemplateSource,
        source: serde_json::Error,
    },

    /// The resolved layout has fatal validation issues. `issues` also keeps
    /// the warnings found in the same pass.
    Invalid {
        origin: TemplateSource,
        issues: Vec<ValidationIssue>,
    },

    /// No template with this name is embedded
    UnknownBuiltin {
        name: String,
        available: Vec<String>,
    },
}

impl ParseError {
    /// Re-labels JSON and validation errors with where the template came from.
    pub fn with_origin(self, origin: TemplateSource) -> Self {
        match self {
            ParseError::Json { source, .. } => ParseError::Json { origin, source },
            ParseError::Invalid { issues, .. } => ParseError::Invalid { origin, issues },
            other => other,
        }
    }

    /// The fatal validation issues, empty for other kinds of error.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        let issues: &[ValidationIssue] = match self {
            ParseError::Invalid { issues, .. } => issues.as_slice(),
            _ => &[],
        };
        issues.iter().filter(|issue| issue.is_error())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Read { path, source } => {
                write!(f, "cannot read layout file '{}': {}", path, source)
            }
            ParseError::Json { origin, source } => write!(f, "malformed {}: {}", origin, source),
            ParseError::Invalid { origin, .. } => {
                write!(f, "{} failed validation with {} error(s)", origin, self.errors().count())?;
                for issue in self.errors() {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
            ParseError::UnknownBuiltin { name, available } => write!(
                f,
                "no built-in layout named '{}' (available: {})",
                name,
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Read { source, .. } => Some(source),
            ParseError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A layout that passed validation, with the warnings it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLayout {
    pub layout: Layout,
    pub warnings: Vec<ValidationIssue>,
}

impl ParsedLayout {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ============================================================================
// Template Definitions
// ============================================================================

/// Name of a layout boundary as written in template files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeName {
    /// Key touches the left boundary
    Left,
    /// Key touches the right boundary
    Right,
    /// Key sits in the top row
    Top,
    /// Key sits in the bottom row
    Bottom,
}

/// A key as declared in a template file.
///
/// Geometry fields are optional; the parser resolves them against the row
/// and layout defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyDefinition {
    /// Input codes, primary first
    #[serde(default)]
    pub codes: Vec<i32>,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Icon resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Icon shown in the key preview popup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_preview: Option<String>,

    /// Width in pixels (layout `key_width` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,

    /// Height in pixels (row `key_height` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,

    /// Gap to the left of the key (layout `horizontal_gap` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<i32>,

    /// Explicit x position; computed from the running row position when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,

    /// Explicit edge flags; derived from the key's position when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_flags: Option<Vec<EdgeName>>,

    /// Key repeats while held
    #[serde(default)]
    pub repeatable: bool,

    /// Key latches on tap
    #[serde(default)]
    pub sticky: bool,

    /// Key acts as a modifier
    #[serde(default)]
    pub modifier: bool,
}

/// A row of keys as declared in a template file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowDefinition {
    /// Key height for this row (layout `key_height` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_height: Option<i32>,

    /// Vertical gap above this row (layout `vertical_gap` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_gap: Option<i32>,

    /// Keys in declaration order
    #[serde(default)]
    pub keys: Vec<KeyDefinition>,
}

fn default_key_width() -> i32 {
    crate::app_settings::DEFAULT_KEY_WIDTH
}

fn default_key_height() -> i32 {
    crate::app_settings::DEFAULT_KEY_HEIGHT
}

/// A complete layout template as declared in a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    /// Unique template identifier (e.g., "qwerty")
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Canonical (design) width in pixels
    pub total_width: i32,

    /// Default key width
    #[serde(default = "default_key_width")]
    pub key_width: i32,

    /// Default key height
    #[serde(default = "default_key_height")]
    pub key_height: i32,

    /// Default gap to the left of each key
    #[serde(default)]
    pub horizontal_gap: i32,

    /// Default gap above each row
    #[serde(default)]
    pub vertical_gap: i32,

    /// Rows from top to bottom
    #[serde(default)]
    pub rows: Vec<RowDefinition>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: JSON errors name their origin and position
    #[test]
    fn test_json_error_names_origin() {
        let invalid_json = r#"{
  "id": "test",
  "total_width":
}"#;

        let source = serde_json::from_str::<LayoutDefinition>(invalid_json).unwrap_err();
        let err = ParseError::Json {
            origin: TemplateSource::Inline,
            source,
        }
        .with_origin(TemplateSource::File("test.json".into()));

        let display_str = err.to_string();
        assert!(display_str.contains("layout file 'test.json'"));
        assert!(display_str.contains("line 4"));
    }

    /// Test 2: Validation errors list only fatal issues
    #[test]
    fn test_invalid_display_lists_errors() {
        let err = ParseError::Invalid {
            origin: TemplateSource::Builtin("broken".into()),
            issues: vec![
                ValidationIssue::warning("Layout name is empty", "name"),
                ValidationIssue::error("Key has no codes", "rows[0].keys[2].codes")
                    .with_hint("Give every key at least one code"),
            ],
        };

        assert_eq!(err.errors().count(), 1);
        let display_str = err.to_string();
        assert!(display_str.contains("built-in layout 'broken'"));
        assert!(display_str.contains("1 error(s)"));
        assert!(display_str.contains("error at rows[0].keys[2].codes"));
        assert!(display_str.contains("(hint: Give every key at least one code)"));
        assert!(!display_str.contains("Layout name is empty"));
    }

    /// Test 3: Unknown built-in lists the available names
    #[test]
    fn test_unknown_builtin_display() {
        let err = ParseError::UnknownBuiltin {
            name: "dvorak".to_string(),
            available: vec!["qwerty".to_string(), "symbols".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "no built-in layout named 'dvorak' (available: qwerty, symbols)"
        );
        assert_eq!(err.errors().count(), 0);
        assert!(matches!(
            err.with_origin(TemplateSource::Inline),
            ParseError::UnknownBuiltin { .. }
        ));
    }

    /// Test 4: Issue constructors set the severity
    #[test]
    fn test_issue_constructors() {
        let error = ValidationIssue::error("Total width 0 must be positive", "total_width");
        let warning = ValidationIssue::warning("Layout has no rows", "rows");
        assert!(error.is_error());
        assert!(!warning.is_error());
        assert_eq!(warning.to_string(), "warning at rows: Layout has no rows");
    }

    /// Test 5: Key definition defaults when fields are omitted
    #[test]
    fn test_key_definition_defaults() {
        let key: KeyDefinition = serde_json::from_str(r#"{ "codes": [113] }"#).unwrap();

        assert_eq!(key.codes, vec![113]);
        assert!(key.width.is_none());
        assert!(key.x.is_none());
        assert!(key.edge_flags.is_none());
        assert!(!key.repeatable);
        assert!(!key.sticky);
        assert!(!key.modifier);
    }

    /// Test 6: Layout definition picks up default key size
    #[test]
    fn test_layout_definition_defaults() {
        let json = r#"{ "id": "mini", "total_width": 300, "rows": [] }"#;
        let def: LayoutDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.key_width, crate::app_settings::DEFAULT_KEY_WIDTH);
        assert_eq!(def.key_height, crate::app_settings::DEFAULT_KEY_HEIGHT);
        assert_eq!(def.horizontal_gap, 0);
        assert!(def.name.is_empty());
    }

    /// Test 7: Edge names deserialize from snake case
    #[test]
    fn test_edge_names() {
        let edges: Vec<EdgeName> = serde_json::from_str(r#"["left", "bottom"]"#).unwrap();
        assert_eq!(edges, vec![EdgeName::Left, EdgeName::Bottom]);
    }
}
