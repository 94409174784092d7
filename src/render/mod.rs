//! Document rendering
//!
//! The counter text is written into the single element matching a
//! class selector such as `.views-count`. A document without such an
//! element is left alone.
//!
//! - **memory**: In-process document used by tests and dry runs
//! - **html**: HTML file on disk, rewritten in place

mod html;
mod memory;

pub use html::HtmlDocument;
pub use memory::MemoryDocument;

use std::fmt;
use std::str::FromStr;

/// Selector used when none is configured
pub const DEFAULT_SELECTOR: &str = ".views-count";

/// Errors that can occur while rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector {0:?}: expected a class selector like \".views-count\"")]
    InvalidSelector(String),
}

/// A single-class selector (`.name`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    class: String,
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, RenderError> {
        let class = raw
            .trim()
            .strip_prefix('.')
            .filter(|c| is_class_name(c))
            .ok_or_else(|| RenderError::InvalidSelector(raw.to_string()))?;

        Ok(Self {
            class: class.to_string(),
        })
    }

    /// Class name without the leading dot
    pub fn class(&self) -> &str {
        &self.class
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            class: DEFAULT_SELECTOR[1..].to_string(),
        }
    }
}

impl FromStr for Selector {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.class)
    }
}

fn is_class_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A document the counter text is written into
pub trait Renderer: Send + Sync {
    /// Replace the text of the element matching `selector`
    ///
    /// Returns `Ok(false)` when no element matches.
    fn render(&self, selector: &Selector, text: &str) -> Result<bool, RenderError>;
}
