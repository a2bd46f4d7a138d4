// SPDX-License-Identifier: GPL-3.0-only

//! Layout parsing logic for loading JSON layout templates.
//!
//! Templates are read into [`LayoutDefinition`]s, their geometry is resolved
//! into absolute pixel positions, and the resulting [`Layout`] is validated.

use rust_embed::RustEmbed;
use std::fs;

use crate::layout::model::{EdgeFlags, IconRef, Key, Layout, Row};
use crate::layout::types::{
    EdgeName, KeyDefinition, LayoutDefinition, ParseError, ParsedLayout, TemplateSource,
};
use crate::layout::validation::validate_layout;

/// Prefix that selects an embedded template in [`load_layout`].
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Templates shipped inside the binary.
#[derive(RustEmbed)]
#[folder = "resources/layouts/"]
struct BuiltinLayouts;

/// Parses a keyboard layout from a JSON file.
///
/// I/O errors (file not found, permission denied) and JSON errors (malformed
/// JSON, missing required fields) are reported separately, both with the path.
///
/// # Example
///
/// ```rust,ignore
/// use floatboard::layout::parser::parse_layout_file;
///
/// match parse_layout_file("resources/layouts/qwerty.json") {
///     Ok(result) => {
///         println!("Loaded layout: {}", result.layout.name);
///         for warning in &result.warnings {
///             println!("{}", warning);
///         }
///     }
///     Err(e) => eprintln!("Failed to parse layout: {}", e),
/// }
/// ```
pub fn parse_layout_file(path: &str) -> Result<ParsedLayout, ParseError> {
    let json_str = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_string(),
        source,
    })?;

    parse_definition(json_str.as_bytes(), TemplateSource::File(path.to_string()))
}

/// Parses a keyboard layout from a JSON string.
pub fn parse_layout_from_string(json: &str) -> Result<ParsedLayout, ParseError> {
    parse_definition(json.as_bytes(), TemplateSource::Inline)
}

fn parse_definition(json: &[u8], origin: TemplateSource) -> Result<ParsedLayout, ParseError> {
    let definition: LayoutDefinition = match serde_json::from_slice(json) {
        Ok(definition) => definition,
        Err(source) => return Err(ParseError::Json { origin, source }),
    };

    tracing::debug!(%origin, id = %definition.id, "parsed layout template");
    validate_layout(build_layout(definition)).map_err(|e| e.with_origin(origin))
}

/// Parses one of the templates embedded in the binary by name (without the
/// `.json` extension).
pub fn parse_builtin_layout(name: &str) -> Result<ParsedLayout, ParseError> {
    let Some(file) = BuiltinLayouts::get(&format!("{}.json", name)) else {
        return Err(ParseError::UnknownBuiltin {
            name: name.to_string(),
            available: builtin_layout_names(),
        });
    };

    parse_definition(&file.data, TemplateSource::Builtin(name.to_string()))
}

/// Names of the embedded templates, sorted.
pub fn builtin_layout_names() -> Vec<String> {
    let mut names: Vec<String> = BuiltinLayouts::iter()
        .filter_map(|file| file.strip_suffix(".json").map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Loads `builtin:NAME` from the embedded templates, anything else from disk.
pub fn load_layout(source: &str) -> Result<ParsedLayout, ParseError> {
    match source.strip_prefix(BUILTIN_PREFIX) {
        Some(name) => parse_builtin_layout(name),
        None => parse_layout_file(source),
    }
}

/// Resolves a template definition into absolute key geometry.
///
/// Each row starts at the running y and each key at the running x plus its
/// left gap, unless the key gives an explicit `x`. Keys without explicit
/// edge flags get LEFT/RIGHT from their position in the row and TOP/BOTTOM
/// from the row's position in the layout.
pub fn build_layout(definition: LayoutDefinition) -> Layout {
    let row_count = definition.rows.len();
    let mut rows = Vec::with_capacity(row_count);
    let mut y = 0;

    for (row_idx, row_def) in definition.rows.into_iter().enumerate() {
        let row_height = row_def.key_height.unwrap_or(definition.key_height);
        let vertical_gap = row_def.vertical_gap.unwrap_or(definition.vertical_gap);

        let mut row_edges = EdgeFlags::empty();
        if row_idx == 0 {
            row_edges |= EdgeFlags::TOP;
        }
        if row_idx + 1 == row_count {
            row_edges |= EdgeFlags::BOTTOM;
        }

        let key_count = row_def.keys.len();
        let mut x = 0;
        let mut keys = Vec::with_capacity(key_count);

        for (key_idx, key_def) in row_def.keys.into_iter().enumerate() {
            let gap = key_def.gap.unwrap_or(definition.horizontal_gap);
            let width = key_def.width.unwrap_or(definition.key_width);
            let height = key_def.height.unwrap_or(row_height);
            let key_x = key_def.x.unwrap_or(x + gap);
            x = key_x + width;

            let mut derived = row_edges;
            if key_idx == 0 {
                derived |= EdgeFlags::LEFT;
            }
            if key_idx + 1 == key_count {
                derived |= EdgeFlags::RIGHT;
            }

            keys.push(build_key(key_def, key_x, y, width, height, gap, derived));
        }

        rows.push(Row::new(y, keys));
        y += row_height + vertical_gap;
    }

    Layout::new(definition.id, definition.name, definition.total_width, rows)
}

fn build_key(
    definition: KeyDefinition,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    gap: i32,
    derived_edges: EdgeFlags,
) -> Key {
    let edge_flags = match &definition.edge_flags {
        Some(names) => names.iter().fold(EdgeFlags::empty(), |flags, name| {
            flags
                | match name {
                    EdgeName::Left => EdgeFlags::LEFT,
                    EdgeName::Right => EdgeFlags::RIGHT,
                    EdgeName::Top => EdgeFlags::TOP,
                    EdgeName::Bottom => EdgeFlags::BOTTOM,
                }
        }),
        None => derived_edges,
    };

    let mut key = Key::new(definition.codes)
        .with_geometry(x, y, width, height)
        .with_gap(gap)
        .with_edge_flags(edge_flags);
    key.label = definition.label;
    key.icon = definition.icon.map(IconRef::new);
    key.icon_preview = definition.icon_preview.map(IconRef::new);
    key.repeatable = definition.repeatable;
    key.sticky = definition.sticky;
    key.modifier = definition.modifier;
    key
}

// ============================================================================
// Tests
// ============================================================================
