//! Tracking configuration — the subscription intent.
//!
//! `TrackingConfig` is owned by the feed client and read as an immutable
//! snapshot by both transports when they build query parameters or the
//! config push message. Changes arrive as a `TrackingConfigPatch`.

use serde::{Deserialize, Serialize};

/// What the client is asking the upstream to stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingConfig {
    /// Geographic region filter.
    #[serde(default = "default_region")]
    pub region: String,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Vessels per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Category filter ("all", "oil", ...).
    #[serde(default = "default_vessel_type")]
    pub vessel_type: String,
    /// Ask the server to ignore pagination.
    #[serde(default)]
    pub load_all_vessels: bool,
    /// Include vessels near tracked ports.
    #[serde(default)]
    pub track_port_vessels: bool,
    /// Radius around ports, in kilometres.
    #[serde(default = "default_port_radius")]
    pub port_radius_km: f64,
    /// Upper bound on vessels the server should push.
    #[serde(default = "default_max_vessels")]
    pub max_vessels: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            page: default_page(),
            page_size: default_page_size(),
            vessel_type: default_vessel_type(),
            load_all_vessels: false,
            track_port_vessels: false,
            port_radius_km: default_port_radius(),
            max_vessels: default_max_vessels(),
        }
    }
}

impl TrackingConfig {
    /// Apply a partial update, returning whether anything changed.
    pub fn merge(&mut self, patch: &TrackingConfigPatch) -> bool {
        let before = self.clone();

        if let Some(region) = &patch.region {
            self.region = region.clone();
        }
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(page_size) = patch.page_size {
            self.page_size = page_size;
        }
        if let Some(vessel_type) = &patch.vessel_type {
            self.vessel_type = vessel_type.clone();
        }
        if let Some(load_all) = patch.load_all_vessels {
            self.load_all_vessels = load_all;
        }
        if let Some(track_ports) = patch.track_port_vessels {
            self.track_port_vessels = track_ports;
        }
        if let Some(radius) = patch.port_radius_km {
            self.port_radius_km = radius;
        }
        if let Some(max) = patch.max_vessels {
            self.max_vessels = max;
        }

        *self != before
    }

    /// Whether the oil/energy category filter is active.
    pub fn is_oil_filter(&self) -> bool {
        self.vessel_type.eq_ignore_ascii_case("oil")
    }

    /// Query parameters shared by both REST tiers.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("region", self.region.clone()),
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("vesselType", self.vessel_type.clone()),
        ]
    }
}

/// Partial tracking configuration update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingConfigPatch {
    pub region: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub vessel_type: Option<String>,
    pub load_all_vessels: Option<bool>,
    pub track_port_vessels: Option<bool>,
    pub port_radius_km: Option<f64>,
    pub max_vessels: Option<u32>,
}

impl TrackingConfigPatch {
    /// Patch that replaces every field with the values of `config`.
    pub fn replace_with(config: &TrackingConfig) -> Self {
        Self {
            region: Some(config.region.clone()),
            page: Some(config.page),
            page_size: Some(config.page_size),
            vessel_type: Some(config.vessel_type.clone()),
            load_all_vessels: Some(config.load_all_vessels),
            track_port_vessels: Some(config.track_port_vessels),
            port_radius_km: Some(config.port_radius_km),
            max_vessels: Some(config.max_vessels),
        }
    }

    /// Patch that only moves to another page.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }
}

fn default_region() -> String {
    "global".to_string()
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    100
}

fn default_vessel_type() -> String {
    "all".to_string()
}

fn default_port_radius() -> f64 {
    50.0
}

fn default_max_vessels() -> u32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_applies_only_present_fields() {
        let mut config = TrackingConfig::default();
        let changed = config.merge(&TrackingConfigPatch {
            page: Some(2),
            vessel_type: Some("oil".to_string()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(config.page, 2);
        assert_eq!(config.vessel_type, "oil");
        assert_eq!(config.region, "global");
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_merge_reports_no_change() {
        let mut config = TrackingConfig::default();
        assert!(!config.merge(&TrackingConfigPatch::page(1)));
        assert!(!config.merge(&TrackingConfigPatch::default()));
    }

    #[test]
    fn test_oil_filter_case_insensitive() {
        let config = TrackingConfig {
            vessel_type: "OIL".to_string(),
            ..Default::default()
        };
        assert!(config.is_oil_filter());
        assert!(!TrackingConfig::default().is_oil_filter());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(TrackingConfig::default()).unwrap();
        assert_eq!(json["pageSize"], 100);
        assert_eq!(json["vesselType"], "all");
        assert_eq!(json["loadAllVessels"], false);
        assert_eq!(json["portRadiusKm"], 50.0);
    }

    #[test]
    fn test_replace_with_round_trips_through_merge() {
        let target = TrackingConfig {
            region: "north-sea".to_string(),
            page: 3,
            ..Default::default()
        };
        let mut config = TrackingConfig::default();
        config.merge(&TrackingConfigPatch::replace_with(&target));
        assert_eq!(config, target);
    }
}
