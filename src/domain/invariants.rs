// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Every externally supplied value passes through one of these functions
//! before any node consumes it. All functions are pure and return a detailed
//! [`ValidationError`] on failure.
//!
//! # Invariant Categories
//!
//! 1. **Parameter Invariants**: allowed-value sets, required values, types
//! 2. **Capacity Invariants**: `0 < min <= max` for elastic scaling
//! 3. **Identifier Invariants**: node ids usable as graph keys

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Value not in the declared allowed set
    #[error("Parameter {parameter}: value {value:?} is not one of {allowed:?}")]
    NotAllowed {
        parameter: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Required value missing or empty
    #[error("Parameter {parameter} requires a value")]
    MissingValue { parameter: String },

    /// Value does not parse as the declared type
    #[error("Parameter {parameter}: expected a {expected} value")]
    InvalidType { parameter: String, expected: String },

    /// Value supplied for an undeclared parameter
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Elastic capacity bounds out of order or non-positive
    #[error("Invalid scaling bounds: min {min} must be > 0 and <= max {max}")]
    InvalidScaling { min: f64, max: f64 },

    /// Node identifier is malformed
    #[error("Invalid node identifier: {0}")]
    InvalidIdentifier(String),

    /// CIDR block is malformed
    #[error("Invalid CIDR block: {0}")]
    InvalidCidr(String),

    /// Network layout cannot be realized
    #[error("Invalid network layout: {0}")]
    InvalidNetwork(String),
}

/// Validate a resolved parameter value against its allowed set
///
/// # Rules
/// - No allowed set declared: any value passes
/// - Otherwise the value must be an exact member
///
/// `display` is what the error reports in place of the value, so sensitive
/// parameters can pass a redacted form.
pub fn validate_allowed_value(
    parameter: &str,
    value: &str,
    display: &str,
    allowed: Option<&[String]>,
) -> ValidationResult {
    match allowed {
        Some(allowed) if !allowed.iter().any(|a| a == value) => {
            Err(ValidationError::NotAllowed {
                parameter: parameter.to_string(),
                value: display.to_string(),
                allowed: allowed.to_vec(),
            })
        }
        _ => Ok(()),
    }
}

/// Validate elastic capacity bounds
///
/// # Rules
/// - `min > 0`
/// - `min <= max`
/// - Both finite
pub fn validate_scaling(min: f64, max: f64) -> ValidationResult {
    if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
        return Err(ValidationError::InvalidScaling { min, max });
    }
    Ok(())
}

/// Validate a node identifier
///
/// # Rules
/// - Non-empty
/// - Segments separated by `/`, none empty
/// - Segment characters: ASCII alphanumeric, `-`, `_`
pub fn validate_identifier(id: &str) -> ValidationResult {
    if id.is_empty() {
        return Err(ValidationError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    for segment in id.split('/') {
        if segment.is_empty() {
            return Err(ValidationError::InvalidIdentifier(id.to_string()));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidIdentifier(id.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn providers() -> Vec<String> {
        vec!["google".into(), "github".into(), "okta".into()]
    }

    #[test]
    fn test_validate_allowed_value() {
        let allowed = providers();
        assert!(
            validate_allowed_value("OauthProvider", "github", "github", Some(&allowed)).is_ok()
        );
        assert!(validate_allowed_value("Free", "anything", "anything", None).is_ok());

        let err = validate_allowed_value("OauthProvider", "bing", "bing", Some(&allowed))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NotAllowed { ref value, .. } if value == "bing"
        ));
    }

    #[test]
    fn test_validate_allowed_value_reports_display_form() {
        let allowed = vec!["a".to_string()];
        let err =
            validate_allowed_value("Secret", "hunter2", "***", Some(&allowed)).unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_validate_scaling() {
        assert!(validate_scaling(0.5, 32.0).is_ok());
        assert!(validate_scaling(1.0, 1.0).is_ok());

        assert!(validate_scaling(0.0, 32.0).is_err());
        assert!(validate_scaling(-1.0, 32.0).is_err());
        assert!(validate_scaling(4.0, 2.0).is_err());
        assert!(validate_scaling(f64::NAN, 2.0).is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("Database").is_ok());
        assert!(validate_identifier("Database/Instance1").is_ok());
        assert!(validate_identifier("Service/oauth2-proxy").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("Database/").is_err());
        assert!(validate_identifier("/Database").is_err());
        assert!(validate_identifier("has space").is_err());
    }
}
