//! Destination and zone color resolution
//! Maps every zone id to a fill color for the active origin/service pair.

use crate::catalog::{
    self, normalize_code, AVAILABLE_FALLBACK_COLOR, DEFAULT_ZONE_COLOR, NOT_PERMITTED,
    NOT_PERMITTED_COLOR, ORIGIN_ZONE_COLOR, PALETTE,
};
use crate::country::{extract_country_code, normalize_country_code};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rate code and availability of one destination zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationAssignment {
    #[serde(rename = "destin_zone_code", default)]
    pub destination_zone_code: Option<String>,
    #[serde(rename = "destin_zone_name", default)]
    pub destination_zone_name: Option<String>,
    #[serde(rename = "zone_code", default)]
    pub rate_code: Option<String>,
    #[serde(default)]
    pub is_available: bool,
}

impl DestinationAssignment {
    pub fn new(destination: Option<&str>, rate_code: Option<&str>, is_available: bool) -> Self {
        Self {
            destination_zone_code: destination.map(str::to_string),
            destination_zone_name: None,
            rate_code: rate_code.map(str::to_string),
            is_available,
        }
    }

    /// Trims and uppercases both codes
    pub fn normalized(self) -> Self {
        Self {
            destination_zone_code: normalize_code(self.destination_zone_code.as_deref()),
            rate_code: normalize_code(self.rate_code.as_deref()),
            ..self
        }
    }

    /// Country the destination belongs to (leading alpha-2 of its code)
    pub fn country_code(&self) -> Option<String> {
        let normalized = normalize_country_code(self.destination_zone_code.as_deref());
        extract_country_code(normalized.as_deref())
    }

    /// Has a rate code other than the sentinel
    fn has_real_rate(&self) -> bool {
        matches!(normalize_code(self.rate_code.as_deref()), Some(code) if code != NOT_PERMITTED)
    }
}

/// Append-only rate code -> palette color table.
/// Never reassigns a code; wraps around the palette once it is exhausted.
#[derive(Debug, Default, Clone)]
pub struct PaletteAssignment {
    colors: HashMap<String, &'static str>,
    order: Vec<String>,
}

impl PaletteAssignment {
    /// Color for `code`, assigning the next palette slot on first sight
    pub fn assign(&mut self, code: &str) -> &'static str {
        if let Some(color) = self.colors.get(code) {
            return *color;
        }
        let color = PALETTE[self.order.len() % PALETTE.len()];
        self.colors.insert(code.to_string(), color);
        self.order.push(code.to_string());
        color
    }

    pub fn get(&self, code: &str) -> Option<&'static str> {
        self.colors.get(code).copied()
    }

    /// Codes in assignment order
    pub fn codes(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One destination-assignment set plus the palette built for it.
///
/// Replaced wholesale whenever origin or service changes, so palette colors
/// never leak from one set into the next.
#[derive(Debug, Default, Clone)]
pub struct AssignmentSession {
    destinations: Vec<DestinationAssignment>,
    by_zone: HashMap<String, usize>,
    palette: PaletteAssignment,
}

impl AssignmentSession {
    pub fn new(destinations: Vec<DestinationAssignment>) -> Self {
        let mut by_zone = HashMap::new();
        let mut palette = PaletteAssignment::default();

        for (index, destination) in destinations.iter().enumerate() {
            if let Some(key) = normalize_code(destination.destination_zone_code.as_deref()) {
                by_zone.insert(key, index);
            }
            if let Some(code) = normalize_code(destination.rate_code.as_deref()) {
                if code != NOT_PERMITTED && catalog::lookup(&code).is_none() {
                    palette.assign(&code);
                }
            }
        }

        Self {
            destinations,
            by_zone,
            palette,
        }
    }

    pub fn destinations(&self) -> &[DestinationAssignment] {
        &self.destinations
    }

    pub fn palette(&self) -> &PaletteAssignment {
        &self.palette
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Assignment for a zone id; the last one wins on duplicates
    pub fn get(&self, zone_id: &str) -> Option<&DestinationAssignment> {
        let key = normalize_code(Some(zone_id))?;
        self.by_zone.get(&key).map(|&index| &self.destinations[index])
    }

    /// Assignments grouped under a country code, in input order
    pub fn for_country(&self, country: &str) -> Vec<&DestinationAssignment> {
        self.destinations
            .iter()
            .filter(|d| d.country_code().as_deref() == Some(country))
            .collect()
    }

    /// Color of a rate code within this session. Never fails: unknown or
    /// absent codes fall back on availability.
    pub fn rate_color(&self, rate_code: Option<&str>, is_available: bool) -> &'static str {
        let availability_color = if is_available {
            AVAILABLE_FALLBACK_COLOR
        } else {
            NOT_PERMITTED_COLOR
        };
        let Some(code) = normalize_code(rate_code) else {
            return availability_color;
        };
        if code == NOT_PERMITTED {
            return NOT_PERMITTED_COLOR;
        }
        if let Some(entry) = catalog::lookup(&code) {
            return entry.color;
        }
        self.palette.get(&code).unwrap_or(availability_color)
    }
}

/// Picks the destination that best represents a country: an available one
/// with a real rate, then any with a real rate, then the first.
pub fn pick_preferred<'a>(list: &[&'a DestinationAssignment]) -> Option<&'a DestinationAssignment> {
    list.iter()
        .find(|d| d.is_available && d.has_real_rate())
        .or_else(|| list.iter().find(|d| d.has_real_rate()))
        .or_else(|| list.first())
        .copied()
}

/// Resolves zone colors for the current origin against one session
#[derive(Debug, Clone, Copy)]
pub struct ZoneColorResolver<'a> {
    origin: Option<&'a str>,
    service_selected: bool,
    session: &'a AssignmentSession,
}

impl<'a> ZoneColorResolver<'a> {
    pub fn new(origin: Option<&'a str>, service_selected: bool, session: &'a AssignmentSession) -> Self {
        Self {
            origin,
            service_selected,
            session,
        }
    }

    /// Fill color for a zone id. Total and idempotent.
    pub fn color_for(&self, zone_id: &str) -> &'static str {
        let Some(origin) = self.origin.filter(|_| self.service_selected) else {
            return DEFAULT_ZONE_COLOR;
        };
        let Some(zone) = normalize_code(Some(zone_id)) else {
            return DEFAULT_ZONE_COLOR;
        };
        if normalize_code(Some(origin)).as_deref() == Some(zone.as_str()) {
            return ORIGIN_ZONE_COLOR;
        }
        match self.session.get(&zone) {
            Some(destination) => self
                .session
                .rate_color(destination.rate_code.as_deref(), destination.is_available),
            None => DEFAULT_ZONE_COLOR,
        }
    }

    /// Fill color for a whole country on the world and europe maps.
    /// Uses the preferred destination among those inside the country.
    pub fn country_color(&self, country_id: &str) -> &'static str {
        let Some(country) = normalize_country_code(Some(country_id)) else {
            return self.color_for(country_id);
        };
        if self.origin.is_none() || !self.service_selected {
            return self.color_for(&country);
        }
        let entries = self.session.for_country(&country);
        match pick_preferred(&entries).and_then(|d| d.destination_zone_code.as_deref()) {
            Some(code) => self.color_for(code),
            None => self.color_for(&country),
        }
    }

    pub fn destination_info(&self, zone_id: &str) -> Option<&'a DestinationAssignment> {
        self.session.get(zone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(items: &[(&str, Option<&str>, bool)]) -> AssignmentSession {
        AssignmentSession::new(
            items
                .iter()
                .map(|(zone, code, available)| DestinationAssignment::new(Some(*zone), *code, *available))
                .collect(),
        )
    }

    #[test]
    fn test_origin_and_defaults() {
        let s = session(&[("BCN", Some("PEN"), true)]);
        let resolver = ZoneColorResolver::new(Some("MAD"), true, &s);
        assert_eq!(resolver.color_for("mad"), ORIGIN_ZONE_COLOR);
        assert_eq!(resolver.color_for("BCN"), "#15803d");
        assert_eq!(resolver.color_for("XXX"), DEFAULT_ZONE_COLOR);
        assert_eq!(resolver.color_for(""), DEFAULT_ZONE_COLOR);
    }

    #[test]
    fn test_nothing_selected_gives_default() {
        let s = session(&[("BCN", Some("PEN"), true)]);
        assert_eq!(ZoneColorResolver::new(None, true, &s).color_for("BCN"), DEFAULT_ZONE_COLOR);
        assert_eq!(ZoneColorResolver::new(Some("MAD"), false, &s).color_for("BCN"), DEFAULT_ZONE_COLOR);
    }

    #[test]
    fn test_sentinel_and_missing_codes() {
        let s = session(&[("A1", Some("np"), true), ("A2", None, true), ("A3", None, false)]);
        let resolver = ZoneColorResolver::new(Some("MAD"), true, &s);
        assert_eq!(resolver.color_for("A1"), NOT_PERMITTED_COLOR);
        assert_eq!(resolver.color_for("A2"), AVAILABLE_FALLBACK_COLOR);
        assert_eq!(resolver.color_for("A3"), NOT_PERMITTED_COLOR);
    }

    #[test]
    fn test_palette_first_seen_order() {
        let s = session(&[
            ("FR", Some("ZFR"), true),
            ("DE", Some("ZDE"), false),
            ("IT", Some("zfr"), true),
            ("PT", Some("PTC"), true),
        ]);
        assert_eq!(s.palette().codes(), &["ZFR".to_string(), "ZDE".to_string()]);

        let resolver = ZoneColorResolver::new(Some("ES"), true, &s);
        assert_eq!(resolver.color_for("FR"), PALETTE[0]);
        assert_eq!(resolver.color_for("DE"), PALETTE[1]);
        assert_eq!(resolver.color_for("IT"), PALETTE[0]);
        assert_eq!(resolver.color_for("PT"), "#db2777");
    }

    #[test]
    fn test_palette_never_reassigns() {
        let mut palette = PaletteAssignment::default();
        let first = palette.assign("ZAA");
        for i in 0..30 {
            palette.assign(&format!("Z{:02}", i));
        }
        assert_eq!(palette.assign("ZAA"), first);
        assert_eq!(palette.len(), 31);
        // wraps once the palette is exhausted
        assert_eq!(palette.get("Z12"), Some(PALETTE[0]));
    }

    #[test]
    fn test_color_is_total_and_idempotent() {
        let s = session(&[("FR", Some("ZFR"), true), ("DE", Some("??"), false)]);
        let resolver = ZoneColorResolver::new(Some("ES"), true, &s);
        for zone in ["FR", "DE", "ES", "unknown", "", "  ", "ñ"] {
            let color = resolver.color_for(zone);
            assert!(color.starts_with('#') && color.len() == 7, "{:?} -> {}", zone, color);
            assert_eq!(resolver.color_for(zone), color);
        }
    }

    #[test]
    fn test_duplicate_destination_last_wins() {
        let s = session(&[("FR", Some("ZFR"), true), ("fr", Some("NP"), false)]);
        assert_eq!(s.get("FR").unwrap().rate_code.as_deref(), Some("NP"));
    }

    #[test]
    fn test_country_color_prefers_available_real_rate() {
        let s = session(&[
            ("FR01", Some("NP"), false),
            ("FR02", Some("ZFR"), false),
            ("FR03", Some("ZFX"), true),
            ("DEU", Some("ZDE"), true),
        ]);
        let resolver = ZoneColorResolver::new(Some("ES"), true, &s);
        assert_eq!(resolver.country_color("FRA"), PALETTE[1]);
        assert_eq!(resolver.country_color("DE"), PALETTE[2]);
        assert_eq!(resolver.country_color("BR"), DEFAULT_ZONE_COLOR);
        assert_eq!(resolver.destination_info("fr02").unwrap().rate_code.as_deref(), Some("ZFR"));
    }

    #[test]
    fn test_pick_preferred_order() {
        let a = DestinationAssignment::new(Some("X1"), Some("NP"), true);
        let b = DestinationAssignment::new(Some("X2"), Some("ZXA"), false);
        let c = DestinationAssignment::new(Some("X3"), None, true);
        assert_eq!(pick_preferred(&[&a, &b, &c]), Some(&b));
        assert_eq!(pick_preferred(&[&a, &c]), Some(&a));
        assert_eq!(pick_preferred(&[]), None);
    }

    #[test]
    fn test_country_code_derivation() {
        assert_eq!(DestinationAssignment::new(Some("fra"), None, true).country_code().as_deref(), Some("FR"));
        assert_eq!(DestinationAssignment::new(Some("PT02"), None, true).country_code().as_deref(), Some("PT"));
        assert_eq!(DestinationAssignment::new(None, None, true).country_code(), None);
    }
}
