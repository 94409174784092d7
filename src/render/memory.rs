//! In-memory document
//!
//! Stands in for a page when there is no HTML file to write to.
//! Elements are keyed by class name.

use super::{RenderError, Renderer, Selector};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory document holding class-named elements and their text
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: Mutex<HashMap<String, String>>,
}

impl MemoryDocument {
    /// A document with no elements
    pub fn empty() -> Self {
        Self::default()
    }

    /// A document with one empty element carrying `selector`'s class
    pub fn with_element(selector: &Selector) -> Self {
        let doc = Self::default();
        if let Ok(mut elements) = doc.elements.lock() {
            elements.insert(selector.class().to_string(), String::new());
        }
        doc
    }

    /// Current text of the element matching `selector`
    pub fn text(&self, selector: &Selector) -> Option<String> {
        self.elements
            .lock()
            .ok()
            .and_then(|elements| elements.get(selector.class()).cloned())
    }
}

impl Renderer for MemoryDocument {
    fn render(&self, selector: &Selector, text: &str) -> Result<bool, RenderError> {
        let mut elements = match self.elements.lock() {
            Ok(elements) => elements,
            Err(poisoned) => poisoned.into_inner(),
        };

        match elements.get_mut(selector.class()) {
            Some(current) => {
                *current = text.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_into_existing_element() {
        let selector = Selector::default();
        let doc = MemoryDocument::with_element(&selector);

        assert_eq!(doc.text(&selector).as_deref(), Some(""));
        assert!(doc.render(&selector, "5.001k views").unwrap());
        assert_eq!(doc.text(&selector).as_deref(), Some("5.001k views"));
    }

    #[test]
    fn test_render_without_element_is_noop() {
        let selector = Selector::default();
        let doc = MemoryDocument::empty();

        assert!(!doc.render(&selector, "5.001k views").unwrap());
        assert_eq!(doc.text(&selector), None);
    }
}
