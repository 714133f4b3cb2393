//! Map type routing
//! Picks one of the three base maps for the selected shipping service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shipping service as listed by the map API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

impl ServiceDescriptor {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive code comparison
    pub fn has_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// Base vector maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    Iberia,
    World,
    Europe,
}

impl MapType {
    /// Asset file served for this map
    pub fn asset_file(&self) -> &'static str {
        match self {
            MapType::Iberia => "iberian_map.svg",
            MapType::World => "world.svg",
            MapType::Europe => "europe-iso.svg",
        }
    }

    /// Whether zones on this map are identified by country codes
    pub fn is_country_keyed(&self) -> bool {
        matches!(self, MapType::World | MapType::Europe)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MapType::Iberia => "iberia",
            MapType::World => "world",
            MapType::Europe => "europe",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iberia" => Ok(MapType::Iberia),
            "world" => Ok(MapType::World),
            "europe" => Ok(MapType::Europe),
            other => Err(format!("unknown map type: {}", other)),
        }
    }
}

const INTERNATIONAL_PREFIX: &str = "CI";
const INTERNATIONAL_MAP_PREFIX: &str = "MAPA_INTER";

/// Services billed with international rate codes
pub const INTERNATIONAL_CODES: &[&str] = &[
    "CIE", "CIY", "CIC", "CIL", "CIEX", "CIES", "CIEM", "CIS", "CISE", "CIEC", "CIEU",
];

const EUROPE_CODE_CANDIDATES: &[&str] = &["CIS", "CIEC", "CIES", "CIEU"];
const EUROPE_KEYWORDS: &[&str] = &["internacional economy", "international economy"];

/// Routing rule: first match wins
#[derive(Clone, Copy)]
pub struct MapRule {
    pub name: &'static str,
    pub map_type: MapType,
    pub predicate: fn(Option<&ServiceDescriptor>) -> bool,
}

impl fmt::Debug for MapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRule")
            .field("name", &self.name)
            .field("map_type", &self.map_type)
            .finish_non_exhaustive()
    }
}

/// Result of routing a service
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch {
    pub map_type: MapType,
    pub rule: &'static MapRule,
}

pub static MAP_RULES: &[MapRule] = &[
    MapRule {
        name: "Internacional Economy",
        map_type: MapType::Europe,
        predicate: is_europe_economy,
    },
    MapRule {
        name: "Servicios Internacionales",
        map_type: MapType::World,
        predicate: is_international_descriptor,
    },
    CATCH_ALL,
];

const CATCH_ALL: MapRule = MapRule {
    name: "Servicios Ibéricos",
    map_type: MapType::Iberia,
    predicate: always,
};

static FALLBACK_RULE: MapRule = CATCH_ALL;

fn always(_: Option<&ServiceDescriptor>) -> bool {
    true
}

fn is_international_descriptor(service: Option<&ServiceDescriptor>) -> bool {
    service.is_some_and(|s| is_international_service(Some(&s.code)))
}

fn is_europe_economy(service: Option<&ServiceDescriptor>) -> bool {
    let Some(service) = service else {
        return false;
    };
    let code = service.code.trim().to_uppercase();
    if EUROPE_CODE_CANDIDATES.contains(&code.as_str()) {
        return true;
    }
    let name = service.name.to_lowercase();
    EUROPE_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// Checks whether a service code belongs to the international catalog
pub fn is_international_service(code: Option<&str>) -> bool {
    let Some(code) = code else {
        return false;
    };
    let normalized = code.trim().to_uppercase();
    if normalized.is_empty() {
        return false;
    }
    INTERNATIONAL_CODES.contains(&normalized.as_str())
        || normalized.starts_with(INTERNATIONAL_PREFIX)
        || normalized.starts_with(INTERNATIONAL_MAP_PREFIX)
}

/// Resolves the base map for a service using [`MAP_RULES`]
pub fn map_type_for_service(service: Option<&ServiceDescriptor>) -> RouteMatch {
    route_with(MAP_RULES, service)
}

/// Evaluates an ordered rule list; the last rule is the catch-all
pub fn route_with(rules: &'static [MapRule], service: Option<&ServiceDescriptor>) -> RouteMatch {
    let rule = rules
        .iter()
        .find(|rule| (rule.predicate)(service))
        .or_else(|| rules.last())
        .unwrap_or(&FALLBACK_RULE);

    tracing::debug!(
        "Service {:?} routed to {} map by rule '{}'",
        service.map(|s| &s.code),
        rule.map_type,
        rule.name
    );

    RouteMatch {
        map_type: rule.map_type,
        rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_service_routes_to_world() {
        let service = ServiceDescriptor::new("CIY", "Courier Internacional");
        let route = map_type_for_service(Some(&service));
        assert_eq!(route.map_type, MapType::World);
        assert_eq!(route.rule.name, "Servicios Internacionales");
    }

    #[test]
    fn test_unknown_service_falls_back_to_iberia() {
        let service = ServiceDescriptor::new("P24", "Paquetería 24h");
        assert_eq!(map_type_for_service(Some(&service)).map_type, MapType::Iberia);
        assert_eq!(map_type_for_service(None).map_type, MapType::Iberia);
    }

    #[test]
    fn test_europe_rule_has_priority() {
        let by_code = ServiceDescriptor::new("cies", "Whatever");
        assert_eq!(map_type_for_service(Some(&by_code)).map_type, MapType::Europe);

        let by_name = ServiceDescriptor::new("X01", "Envío International Economy");
        assert_eq!(map_type_for_service(Some(&by_name)).map_type, MapType::Europe);
    }

    #[test]
    fn test_international_prefixes() {
        assert!(is_international_service(Some("CIZZ")));
        assert!(is_international_service(Some("mapa_inter_2")));
        assert!(!is_international_service(Some("PEN")));
        assert!(!is_international_service(Some("")));
        assert!(!is_international_service(None));
    }

    #[test]
    fn test_map_type_parse_and_assets() {
        assert_eq!("World".parse::<MapType>(), Ok(MapType::World));
        assert!("mars".parse::<MapType>().is_err());
        assert_eq!(MapType::Europe.asset_file(), "europe-iso.svg");
        assert!(MapType::World.is_country_keyed());
        assert!(!MapType::Iberia.is_country_keyed());
    }

    #[test]
    fn test_service_code_is_case_insensitive() {
        let service = ServiceDescriptor::new("CiE", "x");
        assert!(service.has_code("cie"));
    }
}
