//! Error types for tableau_layout

use tableau_core::CollectionId;
use thiserror::Error;

/// Errors raised by collection bookkeeping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A collection with this id is already registered
    #[error("collection '{0}' is already registered")]
    DuplicateCollection(CollectionId),

    /// No collection with this id is registered
    #[error("collection '{0}' is not registered")]
    UnknownCollection(CollectionId),
}

/// Result type for tableau_layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
