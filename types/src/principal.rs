//! Account principals, rendered as `0x`-prefixed hex.

use crate::error::DaoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The authenticated identity behind every call: a 20-byte account id.
///
/// Rendered as `0x` followed by 40 lowercase hex characters. Parsing accepts
/// either case.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal([u8; 20]);

impl Principal {
    /// The standard prefix for rendered principals.
    pub const PREFIX: &'static str = "0x";

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a principal from its `0x`-prefixed hex form.
    pub fn parse(s: &str) -> Result<Self, DaoError> {
        let body = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| DaoError::InvalidPrincipal(format!("{s}: missing 0x prefix")))?;
        if body.len() != 40 {
            return Err(DaoError::InvalidPrincipal(format!(
                "{s}: expected 40 hex characters, got {}",
                body.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| DaoError::InvalidPrincipal(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({}{})", Self::PREFIX, hex::encode(&self.0[..4]))
    }
}

impl FromStr for Principal {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = DaoError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.to_string()
    }
}
