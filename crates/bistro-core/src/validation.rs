//! # Validation Module
//!
//! Field rules and raw-text parsers for the back office forms.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form text (presentation)                                     │
//! │  └── parse_price / parse_amount / parse_quantity  ← THIS MODULE        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Input structs (NewMenu::validated, ...)                      │
//! │  └── validate_text / validate_email / validate_amount  ← THIS MODULE   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repository pre-checks (bistro-db)                            │
//! │  ├── Name / email uniqueness                                           │
//! │  └── Referenced ingredient, client, menu exist                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite constraints (UNIQUE, FOREIGN KEY, CHECK)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators return the normalised value (trimmed text, the checked
//! number) so callers store exactly what was checked.
//!
//! ## Usage
//! ```rust
//! use bistro_core::validation::{parse_amount, parse_quantity, validate_email};
//!
//! assert_eq!(parse_amount("quantity", "0.2").unwrap(), 0.2);
//! assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
//! assert_eq!(validate_email(" a@x.com ", 100).unwrap(), "a@x.com");
//! ```

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_PRICE_CENTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// Length is counted in characters, not bytes.
///
/// ```rust
/// use bistro_core::validation::validate_text;
///
/// assert_eq!(validate_text("name", "  Bread ", 100).unwrap(), "Bread");
/// assert!(validate_text("name", "   ", 100).is_err());
/// assert!(validate_text("unit", &"k".repeat(21), 20).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional text field. Missing or blank input becomes `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_text(field, v, max).map(Some),
    }
}

/// Validates an email address and returns it trimmed.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part
/// - Domain contains a `.` that is neither its first nor last character
/// - No whitespace
pub fn validate_email(email: &str, max: usize) -> ValidationResult<String> {
    let email = validate_text("email", email, max)?;
    let invalid = |reason: &str| ValidationError::invalid_format("email", reason);

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain exactly one '@'")),
    };

    if local.is_empty() {
        return Err(invalid("missing name before '@'"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(email)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a real-valued quantity (stock level, per-menu ingredient use).
///
/// NaN and infinities are rejected along with zero and negatives.
pub fn validate_amount(field: &str, value: f64) -> ValidationResult<f64> {
    if !value.is_finite() {
        return Err(ValidationError::invalid_format(field, "not a number"));
    }

    if value <= 0.0 {
        return Err(ValidationError::must_be_positive(field));
    }

    Ok(value)
}

/// Validates an order or cart quantity.
///
/// ```rust
/// use bistro_core::validation::validate_quantity;
///
/// assert!(validate_quantity(3).is_ok());
/// assert!(validate_quantity(0).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<i64> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    Ok(qty)
}

/// Validates a menu price in cents. Free menus are not allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<i64> {
    if cents <= 0 {
        return Err(ValidationError::must_be_positive("price"));
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::too_large("price", MAX_PRICE_CENTS));
    }

    Ok(cents)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a menu's ingredient mapping.
///
/// ## Rules
/// - At least one ingredient
/// - Every ingredient id non-blank (trimmed in the result)
/// - Every quantity finite and > 0
pub fn validate_ingredient_quantities(
    ingredients: &BTreeMap<String, f64>,
) -> ValidationResult<BTreeMap<String, f64>> {
    if ingredients.is_empty() {
        return Err(ValidationError::required("ingredients"));
    }

    let mut valid = BTreeMap::new();
    for (id, qty) in ingredients {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::required("ingredient"));
        }
        valid.insert(id.to_string(), validate_amount("ingredient quantity", *qty)?);
    }

    Ok(valid)
}

// =============================================================================
// Raw Text Parsers
// =============================================================================

/// Parses a menu price typed into a form.
///
/// ```rust
/// use bistro_core::validation::parse_price;
///
/// assert_eq!(parse_price("5.00").unwrap().cents(), 500);
/// assert!(parse_price("0").is_err());
/// assert!(parse_price("5.005").is_err());
/// assert!(parse_price("2000000.00").is_err());
/// ```
pub fn parse_price(raw: &str) -> ValidationResult<Money> {
    let money: Money = raw.parse().map_err(|err| match err {
        ValidationError::Required { .. } => ValidationError::required("price"),
        ValidationError::InvalidFormat { reason, .. } => {
            ValidationError::invalid_format("price", reason)
        }
        other => other,
    })?;

    validate_price_cents(money.cents())?;
    Ok(money)
}

/// Parses a real quantity typed into a form (`"0.2"`, `"10"`).
pub fn parse_amount(field: &str, raw: &str) -> ValidationResult<f64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::required(field));
    }

    let value: f64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_format(field, "not a number"))?;

    validate_amount(field, value)
}

/// Parses an integer order quantity typed into a form.
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::required("quantity"));
    }

    let qty: i64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_format("quantity", "must be a whole number"))?;

    validate_quantity(qty)
}

// =============================================================================
// Unit Tests
// =============================================================================
