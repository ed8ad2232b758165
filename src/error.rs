//! Error types for the composition engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering, editing or exporting a page
#[derive(Error, Debug)]
pub enum Error {
    /// No renderer is registered for the component's type tag
    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    /// A renderer rejected (or panicked on) the component's content
    #[error("Malformed data in component {component_id} ({component_type}): {reason}")]
    MalformedComponentData {
        component_id: i64,
        component_type: String,
        reason: String,
    },

    /// The backing store rejected a live edit
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// A persistence call did not resolve in time
    #[error("Persistence timed out after {0}ms")]
    Timeout(u64),

    /// Static export was requested for a page that is not published
    #[error("Page {page_id} is not published; refusing to export")]
    UnpublishedExport { page_id: i64 },

    /// Page metadata violates a routing invariant (slug, subdomain)
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// No component with this id exists in the edit buffer
    #[error("Component {0} not found")]
    ComponentNotFound(i64),

    /// A reorder request was not a permutation of the page's components
    #[error("Invalid reorder: {0}")]
    InvalidReorder(String),

    /// A mutation was issued while a previous one is still persisting
    #[error("Another edit is still persisting for this page")]
    SessionBusy,

    /// Filesystem error while writing a deployment artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input (page payloads, configuration files)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from the persistence round-trip of a live edit.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_) | Error::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_classification() {
        assert!(Error::Persistence("boom".into()).is_persistence());
        assert!(Error::Timeout(10).is_persistence());
        assert!(!Error::SessionBusy.is_persistence());
    }

    #[test]
    fn unpublished_message_names_page() {
        let e = Error::UnpublishedExport { page_id: 7 };
        assert_eq!(e.to_string(), "Page 7 is not published; refusing to export");
    }
}
