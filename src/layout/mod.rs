// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard layout templates and the runtime key model.
//!
//! Templates are JSON documents describing rows of keys at a fixed design
//! width. Parsing resolves them into a [`Layout`] with absolute pixel
//! geometry, which the scaling engine then derives other widths from.
//!
//! # Features
//!
//! - **Android-style geometry**: keys are placed by running x plus left gap,
//!   rows by running y plus vertical gap
//! - **Derived edge flags**: LEFT/RIGHT/TOP/BOTTOM filled in from position
//! - **Permissive validation**: geometry problems are warnings, only broken
//!   codes, widths and duplicate special keys are fatal
//! - **Built-in templates**: `qwerty`, `symbols` and `symbols_shift` ship
//!   inside the binary
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use floatboard::layout::load_layout;
//!
//! match load_layout("builtin:qwerty") {
//!     Ok(result) => {
//!         for warning in &result.warnings {
//!             println!("  {}", warning);
//!         }
//!         println!("{} keys at width {}", result.layout.key_count(), result.layout.total_width);
//!     }
//!     Err(e) => eprintln!("Failed to load layout: {}", e),
//! }
//! ```

pub mod model;
pub mod parser;
pub mod types;
pub mod validation;

pub use model::{EdgeFlags, IconRef, Key, Layout, Row};
pub use parser::{
    builtin_layout_names, load_layout, parse_builtin_layout, parse_layout_file,
    parse_layout_from_string,
};
pub use types::{
    KeyDefinition, LayoutDefinition, ParseError, ParsedLayout, RowDefinition, Severity,
    TemplateSource, ValidationIssue,
};
pub use validation::validate_layout;
