//! # Validation Module
//!
//! Input validation utilities shared by the catalog and register services.
//! Rules run here before any business logic touches the data; the database
//! constraints behind them (NOT NULL, UNIQUE, FK) are the last line of
//! defense, not the first.

use crate::error::ValidationError;
use crate::money::{Quantity, Rate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (ingredient, recipe, employee).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use forno_core::validation::validate_name;
///
/// assert!(validate_name("name", "Farinha de trigo").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a recipe yield: must be strictly positive.
///
/// The rollup engine itself tolerates `yield ≤ 0` (unit cost becomes 0),
/// but a recipe *saved* with no yield is operator error.
pub fn validate_yield(yield_units: Quantity) -> ValidationResult<()> {
    if !yield_units.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "yield".to_string(),
        });
    }

    Ok(())
}

/// Validates a preparation time in minutes: zero is allowed (no-labor
/// assembly recipes), negative is not.
pub fn validate_prep_minutes(minutes: i64) -> ValidationResult<()> {
    if minutes < 0 {
        return Err(ValidationError::OutOfRange {
            field: "prep_minutes".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a quantity entered on a recipe line or package.
pub fn validate_quantity(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// A recipe must have at least one bill-of-materials line.
pub fn validate_items_not_empty(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Bolo de cenoura").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_yield() {
        assert!(validate_yield(Quantity::from_units(4)).is_ok());
        assert!(validate_yield(Quantity::zero()).is_err());
        assert!(validate_yield(Quantity::from_units(-1)).is_err());
    }

    #[test]
    fn test_validate_prep_minutes() {
        assert!(validate_prep_minutes(0).is_ok());
        assert!(validate_prep_minutes(60).is_ok());
        assert!(validate_prep_minutes(-1).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("tax", Rate::from_bps(0)).is_ok());
        assert!(validate_rate("tax", Rate::from_bps(10_000)).is_ok());
        assert!(validate_rate("tax", Rate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_items_not_empty() {
        assert!(validate_items_not_empty(1).is_ok());
        assert!(validate_items_not_empty(0).is_err());
    }
}
