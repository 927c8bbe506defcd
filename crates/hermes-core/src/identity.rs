//! Platform identity context.
//!
//! A platform describes the caller of a broker operation with a [`Context`]:
//! a platform name plus an open bag of properties. The same value arrives in
//! two places, the `context` field of request bodies and the originating
//! identity header, which carries it as `"<platform> <base64 json>"`.
//!
//! Two platforms are recognized and validated:
//!
//! | Platform | Required properties |
//! |---|---|
//! | `cloudfoundry` | `organization_guid`, `space_guid` |
//! | `kubernetes` | `namespace` |
//!
//! Any other platform name is accepted as [`Context::Other`].

use crate::error::{BrokerError, BrokerResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Open property bag carried by contexts, parameters, and metadata.
pub type Properties = serde_json::Map<String, Value>;

/// Platform name for Cloud Foundry contexts.
pub const CLOUD_FOUNDRY_PLATFORM: &str = "cloudfoundry";

/// Platform name for Kubernetes contexts.
pub const KUBERNETES_PLATFORM: &str = "kubernetes";

const PLATFORM_KEY: &str = "platform";
const ORGANIZATION_GUID_KEY: &str = "organization_guid";
const SPACE_GUID_KEY: &str = "space_guid";
const NAMESPACE_KEY: &str = "namespace";

/// Identity of the platform (and end user) behind a request.
///
/// # Example
///
/// ```
/// use hermes_core::{Context, Properties};
/// use serde_json::json;
///
/// let mut properties = Properties::new();
/// properties.insert("namespace".to_string(), json!("team-a"));
///
/// let context = Context::from_parts("kubernetes", properties).unwrap();
/// assert_eq!(context.platform(), "kubernetes");
/// assert_eq!(context.namespace(), Some("team-a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Cloud Foundry caller; the bag holds `organization_guid` and `space_guid`.
    CloudFoundry {
        /// All properties, including the required ones.
        properties: Properties,
    },
    /// Kubernetes caller; the bag holds `namespace`.
    Kubernetes {
        /// All properties, including the required ones.
        properties: Properties,
    },
    /// Any other platform.
    Other {
        /// The platform name as sent.
        platform: String,
        /// All properties.
        properties: Properties,
    },
}

impl Context {
    /// Builds a context from a platform name and its properties.
    ///
    /// A `platform` key inside `properties` is dropped; the explicit name wins.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidIdentity`] when a recognized platform is
    /// missing one of its required properties.
    pub fn from_parts(
        platform: impl Into<String>,
        mut properties: Properties,
    ) -> BrokerResult<Self> {
        let platform = platform.into();
        properties.remove(PLATFORM_KEY);

        match platform.as_str() {
            CLOUD_FOUNDRY_PLATFORM => {
                require_string(&platform, &properties, ORGANIZATION_GUID_KEY)?;
                require_string(&platform, &properties, SPACE_GUID_KEY)?;
                Ok(Self::CloudFoundry { properties })
            }
            KUBERNETES_PLATFORM => {
                require_string(&platform, &properties, NAMESPACE_KEY)?;
                Ok(Self::Kubernetes { properties })
            }
            _ => Ok(Self::Other {
                platform,
                properties,
            }),
        }
    }

    /// Returns the platform name.
    pub fn platform(&self) -> &str {
        match self {
            Self::CloudFoundry { .. } => CLOUD_FOUNDRY_PLATFORM,
            Self::Kubernetes { .. } => KUBERNETES_PLATFORM,
            Self::Other { platform, .. } => platform,
        }
    }

    /// Returns the property bag.
    pub fn properties(&self) -> &Properties {
        match self {
            Self::CloudFoundry { properties }
            | Self::Kubernetes { properties }
            | Self::Other { properties, .. } => properties,
        }
    }

    /// Returns a raw property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties().get(key)
    }

    /// Returns a property when it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns a property converted into `T`, or `None` when absent or of another shape.
    pub fn property<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Projects the whole property bag onto a typed structure.
    ///
    /// ```
    /// use hermes_core::{Context, Properties};
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct CfScope {
    ///     organization_guid: String,
    ///     space_guid: String,
    /// }
    ///
    /// let mut properties = Properties::new();
    /// properties.insert("organization_guid".into(), json!("org"));
    /// properties.insert("space_guid".into(), json!("space"));
    /// let context = Context::from_parts("cloudfoundry", properties).unwrap();
    ///
    /// let scope: CfScope = context.project().unwrap();
    /// assert_eq!(scope.space_guid, "space");
    /// ```
    pub fn project<T: DeserializeOwned>(&self) -> BrokerResult<T> {
        serde_json::from_value(Value::Object(self.properties().clone())).map_err(|e| {
            BrokerError::invalid_parameters(format!(
                "context properties do not match the expected shape: {e}"
            ))
        })
    }

    /// Returns the Cloud Foundry organization guid.
    pub fn organization_guid(&self) -> Option<&str> {
        match self {
            Self::CloudFoundry { .. } => self.get_str(ORGANIZATION_GUID_KEY),
            _ => None,
        }
    }

    /// Returns the Cloud Foundry space guid.
    pub fn space_guid(&self) -> Option<&str> {
        match self {
            Self::CloudFoundry { .. } => self.get_str(SPACE_GUID_KEY),
            _ => None,
        }
    }

    /// Returns the Kubernetes namespace.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Kubernetes { .. } => self.get_str(NAMESPACE_KEY),
            _ => None,
        }
    }

    /// Encodes this context in the originating identity header form.
    pub fn to_header_value(&self) -> String {
        let json = Value::Object(self.properties().clone()).to_string();
        format!("{} {}", self.platform(), STANDARD.encode(json))
    }
}

fn require_string(platform: &str, properties: &Properties, key: &str) -> BrokerResult<()> {
    match properties.get(key) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(BrokerError::invalid_identity(format!(
            "{platform} identity requires property {key}"
        ))),
    }
}

/// Decodes an originating identity header value.
///
/// The value has the form `"<platform> <base64 json object>"`; the split
/// happens on the first space.
///
/// # Errors
///
/// Returns [`BrokerError::InvalidIdentity`] when the value has no properties,
/// the properties are not base64, the decoded bytes are not a JSON object, or
/// a recognized platform lacks its required properties.
///
/// # Example
///
/// ```
/// use hermes_core::decode_originating_identity;
///
/// // base64 of {"user_id":"683ea748"}
/// let context = decode_originating_identity("acme eyJ1c2VyX2lkIjoiNjgzZWE3NDgifQ==").unwrap();
/// assert_eq!(context.platform(), "acme");
/// assert_eq!(context.get_str("user_id"), Some("683ea748"));
/// ```
pub fn decode_originating_identity(value: &str) -> BrokerResult<Context> {
    let (platform, encoded) = value
        .trim()
        .split_once(' ')
        .map(|(platform, encoded)| (platform, encoded.trim()))
        .filter(|(platform, encoded)| !platform.is_empty() && !encoded.is_empty())
        .ok_or_else(|| BrokerError::invalid_identity("no properties supplied"))?;

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| BrokerError::invalid_identity("properties are not properly encoded"))?;

    let properties: Properties = serde_json::from_slice(&bytes)
        .map_err(|_| BrokerError::invalid_identity("properties are not valid JSON"))?;

    Context::from_parts(platform, properties)
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let properties = self.properties();
        let mut map = serializer.serialize_map(Some(properties.len() + 1))?;
        map.serialize_entry(PLATFORM_KEY, self.platform())?;
        for (key, value) in properties {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut properties = Properties::deserialize(deserializer)?;
        let platform = match properties.remove(PLATFORM_KEY) {
            Some(Value::String(platform)) => platform,
            Some(_) => return Err(D::Error::custom("context platform must be a string")),
            None => return Err(D::Error::missing_field(PLATFORM_KEY)),
        };
        Context::from_parts(platform, properties).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(json: &Value) -> String {
        STANDARD.encode(json.to_string())
    }

    fn description(result: BrokerResult<Context>) -> String {
        result.unwrap_err().description()
    }

    #[test]
    fn test_decode_cloud_foundry() {
        let header = format!(
            "cloudfoundry {}",
            encode(&json!({"organization_guid": "org-1", "space_guid": "space-1", "user_id": "u"}))
        );
        let context = decode_originating_identity(&header).unwrap();

        assert!(matches!(context, Context::CloudFoundry { .. }));
        assert_eq!(context.organization_guid(), Some("org-1"));
        assert_eq!(context.space_guid(), Some("space-1"));
        assert_eq!(context.get_str("user_id"), Some("u"));
        assert_eq!(context.namespace(), None);
    }

    #[test]
    fn test_decode_kubernetes() {
        let header = format!("kubernetes {}", encode(&json!({"namespace": "ns"})));
        let context = decode_originating_identity(&header).unwrap();
        assert_eq!(context.namespace(), Some("ns"));
        assert_eq!(context.platform(), "kubernetes");
    }

    #[test]
    fn test_decode_unknown_platform_falls_back() {
        let header = format!("test-platform {}", encode(&json!({"a": 1})));
        let context = decode_originating_identity(&header).unwrap();
        assert_eq!(context.platform(), "test-platform");
        assert_eq!(context.property::<i64>("a"), Some(1));
        assert!(matches!(context, Context::Other { .. }));
    }

    #[test]
    fn test_decode_without_properties() {
        for header in ["cloudfoundry", "cloudfoundry   ", ""] {
            let result = decode_originating_identity(header);
            assert!(description(result).contains("no properties supplied"), "{header:?}");
        }
    }

    #[test]
    fn test_decode_bad_base64() {
        let result = decode_originating_identity("cloudfoundry !!!not-base64!!!");
        assert!(description(result).contains("properties are not properly encoded"));
    }

    #[test]
    fn test_decode_bad_json() {
        for properties in ["{not json", "[1,2]"] {
            let header = format!("cloudfoundry {}", STANDARD.encode(properties));
            let result = decode_originating_identity(&header);
            assert!(description(result).contains("properties are not valid JSON"));
        }
    }

    #[test]
    fn test_decode_recognized_platform_missing_fields() {
        let header = format!("cloudfoundry {}", encode(&json!({"organization_guid": "o"})));
        let message = description(decode_originating_identity(&header));
        assert!(message.contains("space_guid"));

        let header = format!("kubernetes {}", encode(&json!({})));
        assert!(description(decode_originating_identity(&header)).contains("namespace"));
    }

    #[test]
    fn test_invalid_identity_is_bad_request() {
        let error = decode_originating_identity("x").unwrap_err();
        assert_eq!(error.status_code().as_u16(), 400);
    }

    #[test]
    fn test_header_round_trip() {
        let mut properties = Properties::new();
        properties.insert("namespace".to_string(), json!("default"));
        let context = Context::from_parts("kubernetes", properties).unwrap();

        let decoded = decode_originating_identity(&context.to_header_value()).unwrap();
        assert_eq!(decoded, context);
    }

    #[test]
    fn test_serialize_flattens_properties() {
        let mut properties = Properties::new();
        properties.insert("organization_guid".to_string(), json!("o"));
        properties.insert("space_guid".to_string(), json!("s"));
        let context = Context::from_parts("cloudfoundry", properties).unwrap();

        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(
            value,
            json!({"platform": "cloudfoundry", "organization_guid": "o", "space_guid": "s"})
        );
    }

    #[test]
    fn test_deserialize_from_body() {
        let context: Context = serde_json::from_value(
            json!({"platform": "kubernetes", "namespace": "n", "clusterid": "c"}),
        )
        .unwrap();
        assert_eq!(context.namespace(), Some("n"));
        assert!(context.get("platform").is_none());

        let missing: Result<Context, _> = serde_json::from_value(json!({"namespace": "n"}));
        assert!(missing.is_err());

        let invalid: Result<Context, _> = serde_json::from_value(json!({"platform": "kubernetes"}));
        assert!(invalid.is_err());
    }

    #[test]
    fn test_project_typed() {
        #[derive(serde::Deserialize)]
        struct Scope {
            namespace: String,
            #[serde(default)]
            clusterid: Option<String>,
        }

        let context: Context =
            serde_json::from_value(json!({"platform": "kubernetes", "namespace": "n"})).unwrap();
        let scope: Scope = context.project().unwrap();
        assert_eq!(scope.namespace, "n");
        assert!(scope.clusterid.is_none());
    }
}
