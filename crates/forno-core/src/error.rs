//! # Error Types
//!
//! Domain-specific error types for forno-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forno-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  forno-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - Core ∪ Db, what callers of services see        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → UI                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, names, counts)
//! 3. Errors are enum variants, never String
//! 4. Integrity *warnings* (orphaned lines, conversion gaps) are data in
//!    results, not errors — they degrade gracefully, they don't fail

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A recipe line references a recipe that is not flagged as base.
    /// Only intermediates may be nested; sellable recipes may not.
    #[error("Recipe '{id}' is not a base recipe and cannot be used as a component")]
    NotBaseRecipe { id: String },

    /// Saving these items would make the base-recipe graph cyclic.
    #[error("Recipe '{recipe_id}' would depend on itself through its base recipes")]
    CyclicDependency { recipe_id: String },

    /// An ingredient cannot be deleted while recipes reference it.
    #[error("Ingredient '{id}' is referenced by {references} recipe item(s)")]
    IngredientInUse { id: String, references: i64 },

    /// An operator may have at most one open cash session.
    #[error("Operator '{operator_id}' already has an open cash session")]
    SessionAlreadyOpen { operator_id: String },

    /// The session is not in a state that allows the requested operation.
    #[error("Cash session '{session_id}' is {status}, cannot perform operation")]
    InvalidSessionStatus { session_id: String, status: String },

    /// A sale must contain at least one line item.
    #[error("Sale has no items")]
    EmptySale,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unknown unit).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that must not be empty is empty.
    #[error("{field} must have at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::IngredientInUse {
            id: "flour-1".to_string(),
            references: 3,
        };
        assert_eq!(
            err.to_string(),
            "Ingredient 'flour-1' is referenced by 3 recipe item(s)"
        );

        let err = CoreError::SessionAlreadyOpen {
            operator_id: "op-9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Operator 'op-9' already has an open cash session"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "yield".to_string(),
        };
        assert_eq!(err.to_string(), "yield must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Empty {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
