//! Input validation for profile names and MFA codes.

use crate::{Result, TokenmuxError};

/// Characters that are never accepted in a profile name.
const DANGEROUS_CHARS: &str = ";|&$`<>(){}[]!*?~#%^\\\"'";

/// Maximum allowed length for profile names.
const MAX_NAME_LENGTH: usize = 255;

/// Accepted MFA code lengths (TOTP apps and hardware tokens emit 6 digits).
const MFA_CODE_LENGTH: usize = 6;

/// Validates a profile name.
///
/// Profile names end up in cache keys and on-disk file names, so they are
/// held to the same rules as any other identifier that may reach a shell or
/// a filesystem:
/// - not empty
/// - at most 255 characters
/// - no null bytes or control characters
/// - no shell metacharacters
///
/// # Errors
///
/// Returns [`TokenmuxError::InvalidProfileName`] if validation fails.
///
/// # Example
///
/// ```
/// use tokenmux::validation::validate_profile_name;
///
/// assert!(validate_profile_name("work").is_ok());
/// assert!(validate_profile_name("prod-admin_2").is_ok());
///
/// assert!(validate_profile_name("").is_err());
/// assert!(validate_profile_name("work; rm -rf /").is_err());
/// ```
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TokenmuxError::InvalidProfileName(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(TokenmuxError::InvalidProfileName(format!(
            "name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }

    if name.contains('\0') {
        return Err(TokenmuxError::InvalidProfileName(
            "name contains null byte".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(TokenmuxError::InvalidProfileName(
            "name contains control characters".to_string(),
        ));
    }

    if name.chars().any(|c| DANGEROUS_CHARS.contains(c)) {
        return Err(TokenmuxError::InvalidProfileName(format!(
            "name contains dangerous characters (not allowed: {})",
            DANGEROUS_CHARS
        )));
    }

    Ok(())
}

/// Validates a one-time MFA code: exactly six ASCII digits.
///
/// # Errors
///
/// Returns [`TokenmuxError::InvalidMfaCode`] if validation fails. The code
/// itself is never included in the error message.
pub fn validate_mfa_code(code: &str) -> Result<()> {
    if code.len() != MFA_CODE_LENGTH {
        return Err(TokenmuxError::InvalidMfaCode(format!(
            "code must be {} digits",
            MFA_CODE_LENGTH
        )));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(TokenmuxError::InvalidMfaCode(
            "code must contain only digits".to_string(),
        ));
    }

    Ok(())
}
