//! Semantic color theme for terminal output
//!
//! - `active` => cyan: headers
//! - `success` => green: completed operations
//! - `warning` => yellow: skipped work, non-fatal failures
//! - `fail` => red: errors

use std::sync::LazyLock;

use owo_colors::Style;

/// Semantic color definitions for terminal output
pub struct SemanticColors {
    pub active: Style,
    pub success: Style,
    pub warning: Style,
    pub fail: Style,
}

impl Default for SemanticColors {
    fn default() -> Self {
        Self {
            active: Style::new().cyan().bold(),
            success: Style::new().green(),
            warning: Style::new().yellow(),
            fail: Style::new().red().bold(),
        }
    }
}

/// Global default theme
pub static COLORS: LazyLock<SemanticColors> = LazyLock::new(SemanticColors::default);
