//! Map report rendering
//! Colored zone listing and legend, as plain text or JSON.

use crate::colors::ZoneColorResolver;
use crate::country::friendly_name;
use crate::legend::LegendEntry;
use crate::map::{ParsedMap, ZoneRecord};
use crate::router::MapType;
use crate::state::SelectionState;
use serde::Serialize;
use std::fmt::Write;

/// Fill of the background squares on the iberia map
pub const DECORATIVE_ZONE_COLOR: &str = "#f1f5f9";

#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub geometry: &'static str,
    pub color: String,
    pub is_origin: bool,
    /// `Some` only for zones that have a destination assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapReport {
    pub map_type: MapType,
    pub rule: String,
    pub service: Option<String>,
    pub origin: Option<String>,
    pub origin_name: Option<String>,
    pub pending_world_view: bool,
    pub view_box: String,
    pub zones: Vec<ZoneReport>,
    pub legend: Vec<LegendEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn zone_report(map_type: MapType, zone: &ZoneRecord, resolver: &ZoneColorResolver<'_>, origin: Option<&str>) -> ZoneReport {
    let key = zone.zone_key();
    let color = if zone.is_decorative() {
        DECORATIVE_ZONE_COLOR
    } else if map_type.is_country_keyed() {
        resolver.country_color(key)
    } else {
        resolver.color_for(key)
    };
    let destination = resolver.destination_info(key).filter(|_| !zone.is_decorative());

    ZoneReport {
        id: zone.id.clone(),
        code: zone.resolved_code.clone(),
        name: if map_type.is_country_keyed() {
            friendly_name(zone.resolved_code.as_deref(), &zone.display_name)
        } else {
            zone.display_name.clone()
        },
        geometry: zone.geometry.kind(),
        color: color.to_string(),
        is_origin: origin.is_some_and(|o| o.eq_ignore_ascii_case(key)),
        rate_code: destination.and_then(|d| d.rate_code.clone()),
        is_available: destination.map(|d| d.is_available),
    }
}

/// Builds the report for a parsed map under the current selection
pub fn build_report(state: &SelectionState, map: &ParsedMap, rule: &str) -> MapReport {
    let resolver = state.resolver();
    let zones = map
        .zones
        .iter()
        .map(|zone| zone_report(map.map_type, zone, &resolver, state.origin()))
        .collect();

    MapReport {
        map_type: map.map_type,
        rule: rule.to_string(),
        service: state.service_code().map(str::to_string),
        origin: state.origin().map(str::to_string),
        origin_name: state.origin_name().map(str::to_string),
        pending_world_view: state.pending_world_view(),
        view_box: map.view_box.clone(),
        zones,
        legend: state.legend(),
        error: state.summary_error().map(str::to_string),
    }
}

/// One legend line, e.g. `#15803d  Peninsular (PEN)`
pub fn legend_line(entry: &LegendEntry) -> String {
    format!(
        "{}  {} ({}){}",
        entry.color,
        entry.label,
        entry.code,
        if entry.is_available { "" } else { " · No disponible" }
    )
}

pub fn render_text(report: &MapReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Map: {} ({})", report.map_type, report.rule);
    let _ = writeln!(out, "Service: {}", report.service.as_deref().unwrap_or("-"));
    match (&report.origin, &report.origin_name) {
        (Some(code), Some(name)) => {
            let _ = writeln!(out, "Origin: {} ({})", name, code);
        }
        (Some(code), None) => {
            let _ = writeln!(out, "Origin: {}", code);
        }
        _ => {
            let _ = writeln!(out, "Origin: -");
        }
    }
    if report.pending_world_view {
        let _ = writeln!(out, "Select an origin to open the international map");
    }
    if let Some(ref error) = report.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Zones ({}):", report.zones.len());
    for zone in &report.zones {
        let marker = if zone.is_origin { "*" } else { " " };
        let _ = write!(out, "{} {:<12} {:<8} {}  {}", marker, zone.id, zone.geometry, zone.color, zone.name);
        if let Some(ref rate) = zone.rate_code {
            let _ = write!(out, "  [{}]", rate);
        }
        let _ = writeln!(out);
    }

    if !report.legend.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Legend:");
        for entry in &report.legend {
            let _ = writeln!(out, "  {}", legend_line(entry));
        }
    }

    out
}
