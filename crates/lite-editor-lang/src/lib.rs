#![warn(missing_docs)]
//! `lite-editor-lang` - data-driven language and editor configuration for `lite-editor-core`.
//!
//! This crate stays lightweight and knows nothing about buffers or rendering. It provides the
//! small structs a host uses to configure the editor kernel: comment tokens (used to skip comment
//! lines during block navigation), which delimiters auto-pair, how one indent unit is spelled,
//! and which gutter columns are shown.
//!
//! Everything is `serde`-friendly so hosts can keep settings in a JSON file:
//!
//! ```rust
//! use lite_editor_lang::{EditorSettings, IndentStyle};
//!
//! let settings = EditorSettings::from_json_str(r#"{ "indent": { "style": "spaces", "width": 2 } }"#)
//!     .unwrap();
//! assert_eq!(settings.indent.style, IndentStyle::Spaces);
//! assert_eq!(settings.indent.unit(), "  ");
//! assert!(settings.auto_pair.brace);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Comment tokens/config for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Comment tokens of the Go language (LiteIDE's primary language).
    pub fn go() -> Self {
        Self::line_and_block("//", "/*", "*/")
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if `trimmed_line` starts with the configured line comment token.
    pub fn is_line_comment(&self, trimmed_line: &str) -> bool {
        match self.line.as_deref() {
            Some(token) if !token.is_empty() => trimmed_line.starts_with(token),
            _ => false,
        }
    }
}

/// Per-delimiter auto-pair toggles.
///
/// When a toggle is on, typing the opening character also inserts its partner (if the cursor is
/// followed by whitespace or the end of the line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPairConfig {
    /// `{` → `}`
    pub brace: bool,
    /// `(` → `)`
    pub paren: bool,
    /// `[` → `]`
    pub bracket: bool,
    /// `'` → `'`
    pub single_quote: bool,
    /// `"` → `"`
    pub double_quote: bool,
}

impl Default for AutoPairConfig {
    fn default() -> Self {
        Self {
            brace: true,
            paren: true,
            bracket: true,
            single_quote: true,
            double_quote: true,
        }
    }
}

impl AutoPairConfig {
    /// All toggles off.
    pub fn disabled() -> Self {
        Self {
            brace: false,
            paren: false,
            bracket: false,
            single_quote: false,
            double_quote: false,
        }
    }

    /// Closing partner to auto-insert after `open`, if pairing is enabled for it.
    pub fn closing_for(&self, open: char) -> Option<char> {
        match open {
            '{' if self.brace => Some('}'),
            '(' if self.paren => Some(')'),
            '[' if self.bracket => Some(']'),
            '\'' if self.single_quote => Some('\''),
            '"' if self.double_quote => Some('"'),
            _ => None,
        }
    }
}

/// How one indent unit is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// A literal tab character.
    #[default]
    Tabs,
    /// `width` spaces.
    Spaces,
}

/// Indentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    /// Tabs or spaces.
    pub style: IndentStyle,
    /// Tab width in cells; also the number of spaces per unit in [`IndentStyle::Spaces`] mode.
    pub width: usize,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            style: IndentStyle::Tabs,
            width: 4,
        }
    }
}

impl IndentConfig {
    /// The text of one indent unit.
    pub fn unit(&self) -> String {
        match self.style {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces => " ".repeat(self.width.max(1)),
        }
    }
}

/// Which gutter columns are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GutterConfig {
    /// Line numbers.
    pub line_numbers: bool,
    /// Annotation marks (breakpoints, bookmarks, ...).
    pub marks: bool,
    /// Fold boxes.
    pub folding: bool,
}

impl Default for GutterConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
            marks: true,
            folding: true,
        }
    }
}

/// Complete editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Copy indentation (and indent after an opening bracket) on Enter.
    pub auto_indent: bool,
    /// Auto-pair toggles.
    pub auto_pair: AutoPairConfig,
    /// Indentation.
    pub indent: IndentConfig,
    /// Gutter columns.
    pub gutter: GutterConfig,
    /// Comment tokens of the edited language.
    pub comments: CommentConfig,
    /// Maximum depth of the back/forward navigation stacks.
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            auto_indent: true,
            auto_pair: AutoPairConfig::default(),
            indent: IndentConfig::default(),
            gutter: GutterConfig::default(),
            comments: CommentConfig::go(),
            history_limit: 100,
        }
    }
}

/// Errors produced while loading [`EditorSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading the settings file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for [`EditorSettings`].
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EditorSettings {
    /// Parse settings from JSON text; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
