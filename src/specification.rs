//! Chain specification documents
//!
//! A chain specification is the JSON document that describes a Polkadot-based
//! network: its identity, its boot nodes, and the genesis state that nodes
//! must agree on. This layer treats the document as opaque — only the two
//! fields required of every specification (`name` and `id`) are read here,
//! everything else is passed through to the engine, which is the sole judge
//! of schema conformance.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{LightlinkError, Result};

/// Well-known networks bundled with the crate as static assets
pub const WELL_KNOWN_NETWORKS: &[&str] = &["polkadot", "kusama", "rococo", "westend"];

/// An immutable, key-ordered chain specification document.
///
/// Identity (equality and hashing) is defined solely by the `id` field,
/// independent of every other field in the document.
#[derive(Debug, Clone)]
pub struct ChainSpecification {
    document: Map<String, Value>,
}

impl ChainSpecification {
    /// Build a specification from an in-memory JSON object.
    ///
    /// Only structural requirements are checked: `name` and `id` must be
    /// present as strings. Anything else in the document is engine-defined
    /// and deliberately unvalidated here.
    pub fn from_document(document: Map<String, Value>) -> Result<Self> {
        for field in ["name", "id"] {
            match document.get(field) {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(LightlinkError::InvalidSpecification(format!(
                        "field `{field}` must be a string"
                    )));
                }
                None => {
                    return Err(LightlinkError::InvalidSpecification(format!(
                        "missing required field `{field}`"
                    )));
                }
            }
        }
        Ok(Self { document })
    }

    /// Parse a specification from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(document) => Self::from_document(document),
            other => Err(LightlinkError::InvalidSpecification(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Load a specification from a JSON file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Network name, e.g. `"Polkadot"`. Required by the engine's ChainSpec contract.
    pub fn name(&self) -> &str {
        match &self.document["name"] {
            Value::String(name) => name,
            _ => unreachable!("validated at construction"),
        }
    }

    /// Network identifier, e.g. `"polkadot"`. Required by the engine's ChainSpec contract.
    pub fn id(&self) -> &str {
        match &self.document["id"] {
            Value::String(id) => id,
            _ => unreachable!("validated at construction"),
        }
    }

    /// Raw access to any other engine-defined field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// The full underlying document, keys in original order.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Serialize the document back to JSON text for handing to the engine.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.document)
            .map_err(|e| LightlinkError::InvalidSpecification(e.to_string()))
    }

    /// The Polkadot relay chain specification bundled with the crate.
    pub fn polkadot() -> Self {
        Self::bundled("polkadot", include_str!("chainspecs/polkadot.json"))
    }

    /// The Kusama canary network specification bundled with the crate.
    pub fn kusama() -> Self {
        Self::bundled("kusama", include_str!("chainspecs/kusama.json"))
    }

    /// The Rococo testnet specification bundled with the crate.
    pub fn rococo() -> Self {
        Self::bundled("rococo", include_str!("chainspecs/rococo.json"))
    }

    /// The Westend testnet specification bundled with the crate.
    pub fn westend() -> Self {
        Self::bundled("westend", include_str!("chainspecs/westend.json"))
    }

    /// Look a bundled network up by resource name.
    pub fn well_known(network: &str) -> Option<Self> {
        match network {
            "polkadot" => Some(Self::polkadot()),
            "kusama" => Some(Self::kusama()),
            "rococo" => Some(Self::rococo()),
            "westend" => Some(Self::westend()),
            _ => None,
        }
    }

    // A corrupt bundled asset is a packaging defect, not a runtime
    // condition. Fail loudly instead of falling back.
    fn bundled(network: &str, text: &str) -> Self {
        Self::from_json(text)
            .unwrap_or_else(|e| panic!("bundled chain specification `{network}` is corrupt: {e}"))
    }
}

impl PartialEq for ChainSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ChainSpecification {}

impl Hash for ChainSpecification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl Serialize for ChainSpecification {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl fmt::Display for ChainSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
