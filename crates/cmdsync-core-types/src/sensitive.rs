//! Redaction wrapper for secrets
//!
//! Bot tokens end up inside configuration structs that are routinely
//! `{:?}`-logged at startup. `Sensitive<T>` keeps them out of every log line.

use serde::{Deserialize, Deserializer};
use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// Wrapper for secret values that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use cmdsync_core_types::Sensitive;
///
/// let token = Sensitive::new("Bot abc.def.ghi");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(format!("{}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &"Bot abc.def.ghi");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    ///
    /// Only call this at the point the secret is actually needed, such as
    /// building an `Authorization` header.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Sensitive)
    }
}
