//! Normalization pipeline — raw upstream records to canonical vessels.
//!
//! Three pure stages, applied in order:
//! 1. Coordinate filter (the only hard drop)
//! 2. Category filter (active only for the "oil" vessel type)
//! 3. Field completion (defaults + synthetic ids)
//!
//! The input slice is never mutated; running the pipeline twice over the
//! same input yields the same records (modulo synthetic ids).

use rand::Rng;

use super::tracking::TrackingConfig;
use super::vessel::{
    DEFAULT_STATUS, MISSING_IDENTIFIER, RawVessel, UNKNOWN, UNKNOWN_NAME, VesselId, VesselRecord,
};

/// Substrings that mark a vessel as part of the oil/energy category.
pub const OIL_KEYWORDS: [&str; 8] = [
    "oil", "tanker", "crude", "vlcc", "gas", "fuel", "diesel", "petrol",
];

/// Synthetic ids are drawn from this range.
const SYNTHETIC_ID_RANGE: std::ops::Range<i64> = 1_000_000_000..9_000_000_000;

/// Normalize a batch of raw upstream records.
pub fn normalize(raw: &[RawVessel], config: &TrackingConfig) -> Vec<VesselRecord> {
    let mut rng = rand::rng();
    normalize_with(raw, config, || rng.random_range(SYNTHETIC_ID_RANGE))
}

/// Normalize with an explicit synthetic id generator.
pub fn normalize_with<G>(
    raw: &[RawVessel],
    config: &TrackingConfig,
    mut next_id: G,
) -> Vec<VesselRecord>
where
    G: FnMut() -> i64,
{
    let oil_only = config.is_oil_filter();

    raw.iter()
        .filter_map(|vessel| coordinates(vessel).map(|coords| (vessel, coords)))
        .filter(|(vessel, _)| !oil_only || matches_oil_category(vessel))
        .map(|(vessel, (lat, lng))| complete(vessel, lat, lng, &mut next_id))
        .collect()
}

/// Extract finite latitude/longitude, or `None` if either is unusable.
pub fn coordinates(vessel: &RawVessel) -> Option<(f64, f64)> {
    let lat = vessel.number("currentLat")?;
    let lng = vessel.number("currentLng")?;
    Some((lat, lng))
}

/// Whether `vesselType` or `cargoType` names an oil/energy category.
pub fn matches_oil_category(vessel: &RawVessel) -> bool {
    ["vesselType", "cargoType"].iter().any(|field| {
        vessel.text(field).is_some_and(|value| {
            let value = value.to_lowercase();
            OIL_KEYWORDS.iter().any(|keyword| value.contains(keyword))
        })
    })
}

fn complete<G>(vessel: &RawVessel, lat: f64, lng: f64, next_id: &mut G) -> VesselRecord
where
    G: FnMut() -> i64,
{
    let id = match vessel.integer("id") {
        Some(id) => VesselId::Upstream(id),
        None => VesselId::Synthetic(next_id()),
    };

    VesselRecord {
        id,
        name: vessel.text("name").unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        imo: vessel.text("imo").unwrap_or_else(|| MISSING_IDENTIFIER.to_string()),
        mmsi: vessel.text("mmsi").unwrap_or_else(|| MISSING_IDENTIFIER.to_string()),
        vessel_type: vessel.text("vesselType").unwrap_or_else(|| UNKNOWN.to_string()),
        flag: vessel.text("flag").unwrap_or_else(|| UNKNOWN.to_string()),
        current_lat: lat,
        current_lng: lng,
        current_speed: vessel.number("currentSpeed").unwrap_or(0.0),
        course: vessel.number("course").unwrap_or(0.0),
        progress: vessel.number("progress").unwrap_or(0.0),
        status: vessel.text("status").unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        destination: vessel.text("destination"),
        departure_time: vessel.text("departureTime"),
        cargo_type: vessel.text("cargoType"),
        cargo_amount: vessel.number("cargoAmount"),
    }
}
