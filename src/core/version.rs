use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{OptLockError, Result, Value};

/// Optimistic-lock version of a row: either "no version yet" or "version N".
///
/// Backed by a single nullable integer column. The text (JSON) form is a
/// stable contract: absent renders as the literal `null`, present(N) as the
/// bare decimal integer N, never quoted.
///
/// # Examples
///
/// ```
/// use optilock::{Value, Version};
///
/// let v = Version::new(3);
/// assert_eq!(v.to_storage(), Value::Integer(3));
/// assert_eq!(Version::scan(&Value::Null).unwrap(), Version::unset());
/// assert_eq!(serde_json::to_string(&v).unwrap(), "3");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Option<i64>);

impl Version {
    pub fn new(n: i64) -> Self {
        Self(Some(n))
    }

    pub fn unset() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<i64> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Decode the storage representation: SQL NULL or an integer.
    pub fn scan(raw: &Value) -> Result<Self> {
        match raw {
            Value::Null => Ok(Self::unset()),
            Value::Integer(n) => Ok(Self::new(*n)),
            other => Err(OptLockError::Decode(format!(
                "version column expects NULL or INTEGER, got {}",
                other.type_name()
            ))),
        }
    }

    /// Encode for storage: absent becomes SQL NULL, present(N) the integer N.
    pub fn to_storage(&self) -> Value {
        match self.0 {
            Some(n) => Value::Integer(n),
            None => Value::Null,
        }
    }

    /// Parse the text interchange form: the literal `null`, or a signed
    /// decimal integer.
    pub fn parse_text(bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| OptLockError::Parse(format!("version is not valid UTF-8: {}", e)))?;
        if s == "null" {
            return Ok(Self::unset());
        }
        s.parse::<i64>()
            .map(Self::new)
            .map_err(|e| OptLockError::Parse(format!("invalid version '{}': {}", s, e)))
    }

    /// Render the text interchange form: `null` or bare decimal digits.
    pub fn to_text(&self) -> Vec<u8> {
        match self.0 {
            Some(n) => n.to_string().into_bytes(),
            None => b"null".to_vec(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "null"),
        }
    }
}

impl From<i64> for Version {
    fn from(n: i64) -> Self {
        Self::new(n)
    }
}
