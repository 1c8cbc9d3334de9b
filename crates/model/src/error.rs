//! Errors

use futures::future::BoxFuture;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Deferred result returned by operations that round-trip to the database.
pub type ModelFuture<T> = BoxFuture<'static, Result<T>>;

/// Errors raised while defining entities or running their operations.
#[derive(Error, Debug)]
pub enum Error {
    // --- Definition errors ---
    /// The declared type matched no registered type rule.
    #[error("type '{declared}' of attribute '{attribute}' is not a valid type")]
    TypeResolution {
        /// Attribute being declared.
        attribute: String,
        /// Type as declared.
        declared: String,
    },

    /// A type rule matched but the declaration could not be turned into an attribute.
    #[error("attribute '{attribute}': {reason}")]
    InvalidDeclaration {
        /// Attribute being declared.
        attribute: String,
        /// Why the rule rejected it.
        reason: String,
    },

    /// A type rule pattern is not a valid regular expression.
    #[error("invalid type pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// More than one attribute of an entity is marked as primary key.
    #[error("table '{table}' declares more than one primary key: {}", attributes.join(", "))]
    PrimaryKey {
        /// Entity table.
        table: String,
        /// Every attribute marked as primary key.
        attributes: Vec<String>,
    },

    // --- Operation errors ---
    /// No row matched a single-row lookup.
    #[error("no row found in '{table}'")]
    NotFound {
        /// Table queried.
        table: String,
    },

    /// The instance has no primary-key value to address it by.
    #[error("instance of '{table}' has no primary key value")]
    NotPersisted {
        /// Entity table.
        table: String,
    },

    /// A statement could not be rendered to SQL.
    #[error("invalid statement: {0}")]
    Statement(#[source] anyhow::Error),

    /// A lifecycle hook rejected the operation. The hook's own error is kept as-is.
    #[error(transparent)]
    Rejected(anyhow::Error),

    /// The connection failed to run a statement.
    #[error(transparent)]
    Connection(#[from] anyhow::Error),
}

impl Error {
    /// Returns `true` for the recoverable "no matching row" case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("title is required")]
    struct MissingTitle;

    #[test]
    fn rejected_keeps_hook_error() {
        let err = Error::Rejected(anyhow::Error::new(MissingTitle));
        assert_eq!(err.to_string(), "title is required");

        let Error::Rejected(inner) = err else {
            panic!("expected rejected");
        };
        assert!(inner.downcast_ref::<MissingTitle>().is_some());
    }

    #[test]
    fn primary_key_lists_attributes() {
        let err = Error::PrimaryKey {
            table: "posts".to_string(),
            attributes: vec!["id".to_string(), "uuid".to_string()],
        };
        assert_eq!(err.to_string(), "table 'posts' declares more than one primary key: id, uuid");
    }

    #[test]
    fn not_found_is_recoverable() {
        assert!(Error::NotFound { table: "posts".to_string() }.is_not_found());
        assert!(!Error::Connection(anyhow::anyhow!("closed")).is_not_found());
    }
}
