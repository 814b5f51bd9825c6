//! Wire types exchanged with the connector host and the Access Profiles API.
//!
//! Host side: [`StdAccountUpdateInput`] carrying a list of [`AttributeChange`].
//! API side: [`AccessProfile`], [`EntitlementRef`] and [`JsonPatchOperation`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute name the host uses for Access Profile entitlements.
pub const ENTITLEMENTS_ATTRIBUTE: &str = "entitlements";

/// JSON Patch path of the entitlement list.
pub const ENTITLEMENTS_PATH: &str = "/entitlements";

/// JSON Patch path of the enabled flag.
pub const ENABLED_PATH: &str = "/enabled";

// ── Host envelope ─────────────────────────────────────────────────────

/// Kind of change requested by the host for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeChangeOp {
    Add,
    Remove,
    Set,
}

/// Value carried by an [`AttributeChange`]: one identifier or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ChangeValue {
    /// Iterate over every identifier in the value.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for ChangeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ChangeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl<T: Into<String>> From<Vec<T>> for ChangeValue {
    fn from(values: Vec<T>) -> Self {
        Self::Multiple(values.into_iter().map(Into::into).collect())
    }
}

/// One requested mutation from the host's update plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub op: AttributeChangeOp,
    pub attribute: String,
    pub value: ChangeValue,
}

impl AttributeChange {
    /// Create a `Remove` change for the given attribute.
    pub fn remove(attribute: impl Into<String>, value: impl Into<ChangeValue>) -> Self {
        Self {
            op: AttributeChangeOp::Remove,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an `Add` change for the given attribute.
    pub fn add(attribute: impl Into<String>, value: impl Into<ChangeValue>) -> Self {
        Self {
            op: AttributeChangeOp::Add,
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Account update request handed to the hook by the host runtime.
///
/// For Access Profile sources `identity` is the Access Profile id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdAccountUpdateInput {
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default)]
    pub changes: Vec<AttributeChange>,
}

// ── Access Profiles API ───────────────────────────────────────────────

/// Reference to an entitlement attached to an Access Profile.
///
/// Only `id` matters to reconciliation; everything else is kept verbatim so a
/// replacement list is sent back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRef {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntitlementRef {
    /// Create a reference of type `ENTITLEMENT` with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ref_type: Some("ENTITLEMENT".to_string()),
            name: Some(name.into()),
            extra: Map::new(),
        }
    }
}

/// Access Profile as returned by the API (subset; remaining fields opaque).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlements: Option<Vec<EntitlementRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// RFC 6902 operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonPatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// A single JSON Patch operation sent to the Access Profiles API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: JsonPatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl JsonPatchOperation {
    /// `replace /entitlements` with the given list.
    pub fn replace_entitlements(entitlements: &[EntitlementRef]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            op: JsonPatchOp::Replace,
            path: ENTITLEMENTS_PATH.to_string(),
            value: Some(serde_json::to_value(entitlements)?),
        })
    }

    /// `replace /enabled` with `"false"`.
    ///
    /// The API accepts the boolean as a string in patch bodies.
    #[must_use]
    pub fn disable() -> Self {
        Self {
            op: JsonPatchOp::Replace,
            path: ENABLED_PATH.to_string(),
            value: Some(Value::String("false".to_string())),
        }
    }
}
