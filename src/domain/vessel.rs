//! Vessel domain types.
//!
//! Defines the canonical `VesselRecord` delivered to subscribers and the
//! lenient `RawVessel` wrapper over upstream JSON. These types are the
//! inner ring of the hexagonal architecture: no transport concerns here.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder name for vessels the upstream did not name.
pub const UNKNOWN_NAME: &str = "Unknown Vessel";

/// Placeholder for missing IMO / MMSI identifiers.
pub const MISSING_IDENTIFIER: &str = "N/A";

/// Default for missing vessel type and flag.
pub const UNKNOWN: &str = "Unknown";

/// Default vessel status.
pub const DEFAULT_STATUS: &str = "active";

/// Vessel identity.
///
/// `Synthetic` ids are display-only placeholders generated when the
/// upstream record carried no usable id. They are never stable across
/// fetches and must not be used to correlate vessels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselId {
    /// Identity supplied by the upstream record.
    Upstream(i64),
    /// Placeholder generated during normalization.
    Synthetic(i64),
}

impl VesselId {
    /// Numeric value regardless of origin.
    pub fn value(&self) -> i64 {
        match self {
            Self::Upstream(id) | Self::Synthetic(id) => *id,
        }
    }

    /// Whether this id was fabricated during normalization.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }
}

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(id) => write!(f, "{id}"),
            Self::Synthetic(id) => write!(f, "~{id}"),
        }
    }
}

/// Canonical, fully-populated vessel record.
///
/// Every record in the canonical set has finite coordinates; every other
/// field is either an upstream value or its documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselRecord {
    pub id: VesselId,
    pub name: String,
    pub imo: String,
    pub mmsi: String,
    pub vessel_type: String,
    pub flag: String,
    /// Latitude in decimal degrees.
    pub current_lat: f64,
    /// Longitude in decimal degrees.
    pub current_lng: f64,
    /// Speed over ground (knots).
    pub current_speed: f64,
    /// Course over ground (degrees).
    pub course: f64,
    /// Voyage progress (percent).
    pub progress: f64,
    pub status: String,
    pub destination: Option<String>,
    pub departure_time: Option<String>,
    pub cargo_type: Option<String>,
    pub cargo_amount: Option<f64>,
}

/// Raw upstream vessel record.
///
/// Upstream sources disagree on field types (numbers arrive as JSON
/// numbers or numeric strings), so the record is kept as an untyped JSON
/// value and read through lenient accessors. Non-object values have no
/// fields at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawVessel(Value);

impl RawVessel {
    /// Wrap an arbitrary JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Field lookup; `null` is treated as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Read a field as a finite number, accepting numeric strings.
    pub fn number(&self, name: &str) -> Option<f64> {
        lenient_number(self.field(name)?)
    }

    /// Read a field as an integer id, accepting integral numeric strings.
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.field(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Read a field as a non-empty string. Numbers are rendered as text.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<Value> for RawVessel {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Finite number from a JSON number or numeric string.
fn lenient_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Deserialize an upstream `totalCount`.
///
/// Accepts integers, floats and numeric strings; fractions are truncated.
/// Anything negative or non-numeric reads as absent, so callers fall back
/// to the batch length instead of rejecting the batch.
pub fn deserialize_total_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as u64))
}

/// Deserialize a vessel list where `null` means empty.
pub fn deserialize_vessel_list<'de, D>(deserializer: D) -> Result<Vec<RawVessel>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawVessel>>::deserialize(deserializer)?.unwrap_or_default())
}
