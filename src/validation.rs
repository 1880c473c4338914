//! Validation for operator-supplied settings (callsigns, think-time window)

use std::collections::HashSet;

/// Validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Callsign is empty")]
    EmptyCallsign,

    #[error("Callsign is too long (maximum {max} characters)")]
    CallsignTooLong { max: usize },

    #[error("Callsign contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Callsign '{0}' must contain at least one letter and one digit")]
    NotACallsign(String),

    #[error("Think time window is inverted ({min_ms} ms > {max_ms} ms)")]
    InvertedWindow { min_ms: u64, max_ms: u64 },

    #[error("Think time of {max_ms} ms exceeds the {limit_ms} ms limit")]
    WindowTooLarge { max_ms: u64, limit_ms: u64 },
}

/// Longest accepted callsign including portable suffixes (`F4ABC/P`)
pub const MAX_CALLSIGN_LEN: usize = 12;

/// Upper bound for a single simulated operator pause
pub const MAX_THINK_TIME_MS: u64 = 60_000;

/// Trim, uppercase and check a callsign. Letters, digits and `/` are allowed.
pub fn normalize_callsign(raw: &str) -> Result<String, ValidationError> {
    let call = raw.trim().to_ascii_uppercase();
    if call.is_empty() {
        return Err(ValidationError::EmptyCallsign);
    }
    if call.chars().count() > MAX_CALLSIGN_LEN {
        return Err(ValidationError::CallsignTooLong {
            max: MAX_CALLSIGN_LEN,
        });
    }

    let invalid: HashSet<char> = call
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '/'))
        .collect();
    if !invalid.is_empty() {
        let mut chars: Vec<String> = invalid
            .into_iter()
            .map(|c| {
                if c.is_control() || c.is_whitespace() {
                    format!("\\u{{{:04x}}}", c as u32)
                } else {
                    format!("'{}'", c)
                }
            })
            .collect();
        chars.sort();
        return Err(ValidationError::InvalidCharacters {
            chars: chars.join(", "),
        });
    }

    let has_digit = call.chars().any(|c| c.is_ascii_digit());
    let has_letter = call.chars().any(|c| c.is_ascii_alphabetic());
    if !has_digit || !has_letter {
        return Err(ValidationError::NotACallsign(call));
    }
    Ok(call)
}

/// Optional callsign: blank means "not set".
pub fn normalize_optional_callsign(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(call) => normalize_callsign(call).map(Some),
    }
}

pub fn validate_think_time(min_ms: u64, max_ms: u64) -> Result<(), ValidationError> {
    if min_ms > max_ms {
        return Err(ValidationError::InvertedWindow { min_ms, max_ms });
    }
    if max_ms > MAX_THINK_TIME_MS {
        return Err(ValidationError::WindowTooLarge {
            max_ms,
            limit_ms: MAX_THINK_TIME_MS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callsign_normalization() {
        assert_eq!(normalize_callsign(" f4abc ").unwrap(), "F4ABC");
        assert_eq!(normalize_callsign("dl1xyz/p").unwrap(), "DL1XYZ/P");
        assert_eq!(normalize_callsign("3D2XY").unwrap(), "3D2XY");
    }

    #[test]
    fn test_callsign_rejections() {
        assert_eq!(normalize_callsign("   "), Err(ValidationError::EmptyCallsign));
        assert_eq!(
            normalize_callsign("ABCDEFGHIJ123"),
            Err(ValidationError::CallsignTooLong { max: MAX_CALLSIGN_LEN })
        );
        assert!(matches!(
            normalize_callsign("F4 ABC"),
            Err(ValidationError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            normalize_callsign("F4-ABC!"),
            Err(ValidationError::InvalidCharacters { chars })
                if chars.contains("'!'") && chars.contains("'-'")
        ));
        // Digits only or letters only are not callsigns
        assert_eq!(
            normalize_callsign("599"),
            Err(ValidationError::NotACallsign("599".into()))
        );
        assert!(normalize_callsign("HELLO").is_err());
    }

    #[test]
    fn test_optional_callsign() {
        assert_eq!(normalize_optional_callsign(None), Ok(None));
        assert_eq!(normalize_optional_callsign(Some("  ")), Ok(None));
        assert_eq!(normalize_optional_callsign(Some("k1zz")), Ok(Some("K1ZZ".into())));
        assert!(normalize_optional_callsign(Some("??")).is_err());
    }

    #[test]
    fn test_think_time_window() {
        assert!(validate_think_time(2000, 5000).is_ok());
        assert!(validate_think_time(0, 0).is_ok());
        assert_eq!(
            validate_think_time(5000, 2000),
            Err(ValidationError::InvertedWindow { min_ms: 5000, max_ms: 2000 })
        );
        assert!(matches!(
            validate_think_time(0, MAX_THINK_TIME_MS + 1),
            Err(ValidationError::WindowTooLarge { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = normalize_callsign("").unwrap_err();
        assert_eq!(err.to_string(), "Callsign is empty");
        let err = validate_think_time(3, 1).unwrap_err();
        assert_eq!(err.to_string(), "Think time window is inverted (3 ms > 1 ms)");
    }
}
