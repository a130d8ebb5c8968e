//! One-time MFA code sources.

use crate::validation::validate_mfa_code;
use crate::{Result, TokenmuxError};
use async_trait::async_trait;
use std::fmt;

/// Supplies one-time codes for MFA-protected session requests.
///
/// The provider calls [`get_code`](CodeSource::get_code) at most once per new
/// session, and only when the profile has an MFA serial configured.
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Returns a one-time code for `mfa_serial`.
    ///
    /// # Errors
    ///
    /// Any error aborts the session request before the token service is
    /// contacted and is returned to the caller unchanged.
    async fn get_code(&self, mfa_serial: &str) -> Result<String>;
}

/// Code source that always returns the same, pre-validated code.
///
/// Useful when the code is collected up front (e.g. from a command-line flag).
#[derive(Clone)]
pub struct StaticCodeSource {
    code: String,
}

impl StaticCodeSource {
    /// Creates a code source for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenmuxError::InvalidMfaCode`] if `code` is not six digits.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        validate_mfa_code(&code)?;
        Ok(Self { code })
    }
}

impl fmt::Debug for StaticCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCodeSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl CodeSource for StaticCodeSource {
    async fn get_code(&self, _mfa_serial: &str) -> Result<String> {
        Ok(self.code.clone())
    }
}

/// Code source backed by a closure.
///
/// The closure's output is validated before being handed to the provider,
/// so a typo is reported as [`TokenmuxError::InvalidMfaCode`] instead of a
/// rejected request.
///
/// # Example
///
/// ```
/// use tokenmux::mfa::{CodeSource, FnCodeSource};
///
/// #[tokio::main]
/// async fn main() -> tokenmux::Result<()> {
///     let source = FnCodeSource::new(|_serial: &str| Ok("123456".to_string()));
///     assert_eq!(source.get_code("arn:device1").await?, "123456");
///     Ok(())
/// }
/// ```
pub struct FnCodeSource<F> {
    func: F,
}

impl<F> FnCodeSource<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    /// Wraps `func` as a code source.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> CodeSource for FnCodeSource<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn get_code(&self, mfa_serial: &str) -> Result<String> {
        let code = (self.func)(mfa_serial)?;
        let code = code.trim().to_string();
        validate_mfa_code(&code)?;
        Ok(code)
    }
}

/// Code source for profiles that must never prompt.
///
/// Always fails with [`TokenmuxError::MfaCodeUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCodeSource;

#[async_trait]
impl CodeSource for NoCodeSource {
    async fn get_code(&self, mfa_serial: &str) -> Result<String> {
        Err(TokenmuxError::MfaCodeUnavailable(format!(
            "no code source configured for {}",
            mfa_serial
        )))
    }
}
