//! API version negotiation.

use crate::error::{BrokerError, BrokerResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default name of the API version header.
pub const DEFAULT_VERSION_HEADER: &str = "X-Broker-API-Version";

/// Sentinel accepting any version, including none.
pub const ANY_VERSION: &str = "*";

/// The API version a broker is configured to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedApiVersion {
    /// Any version header, or none at all.
    Any,
    /// Exactly this version.
    Exact(String),
}

impl ExpectedApiVersion {
    /// Parses a configured version; `*` means [`ExpectedApiVersion::Any`].
    pub fn parse(value: &str) -> Self {
        if value == ANY_VERSION {
            Self::Any
        } else {
            Self::Exact(value.to_string())
        }
    }

    /// Returns the configured value as written.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => ANY_VERSION,
            Self::Exact(version) => version,
        }
    }
}

impl std::fmt::Display for ExpectedApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExpectedApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpectedApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Checks a request's version header against the configured expectation.
///
/// | Configured | Header | Result |
/// |---|---|---|
/// | none | any | pass |
/// | `*` | any | pass |
/// | `v` | absent | `VersionMissing` (400) |
/// | `v` | `v` | pass |
/// | `v` | other | `VersionMismatch` (412) |
///
/// # Errors
///
/// See the table above.
///
/// # Example
///
/// ```
/// use hermes_core::{check_api_version, ExpectedApiVersion};
///
/// let expected = ExpectedApiVersion::parse("2.14");
/// assert!(check_api_version("X-Broker-API-Version", Some(&expected), Some("2.14")).is_ok());
/// assert!(check_api_version("X-Broker-API-Version", Some(&expected), Some("2.13")).is_err());
/// assert!(check_api_version("X-Broker-API-Version", None, None).is_ok());
/// ```
pub fn check_api_version(
    header_name: &str,
    expected: Option<&ExpectedApiVersion>,
    provided: Option<&str>,
) -> BrokerResult<()> {
    let expected = match expected {
        None | Some(ExpectedApiVersion::Any) => return Ok(()),
        Some(ExpectedApiVersion::Exact(version)) => version,
    };

    match provided {
        None => Err(BrokerError::version_missing(header_name, expected.as_str())),
        Some(provided) if provided == expected => Ok(()),
        Some(provided) => Err(BrokerError::version_mismatch(expected.as_str(), provided)),
    }
}
