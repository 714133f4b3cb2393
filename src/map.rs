//! Vector map loader
//! Fetches an SVG map asset and flattens it into addressable zone records.

use crate::country::{is_expected_country, normalize_country_code};
use crate::identity::resolve_zone_identity;
use crate::router::MapType;
use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_VIEW_BOX: &str = "0 0 800 600";
const FALLBACK_NAME: &str = "zone";
const DECORATIVE_PREFIX: &str = "cuadrado_";
const NAME_ATTRIBUTES: &[&str] = &["name", "title", "data-name"];

/// Errors that can occur while loading a map asset
#[derive(Debug, Error)]
pub enum MapError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Map asset {location} returned HTTP {status}")]
    Status { location: String, status: u16 },
    #[error("Failed to read map asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid map markup: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Drawable primitive of a zone; attribute values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Path {
        d: String,
    },
    Rect {
        x: String,
        y: String,
        width: String,
        height: String,
    },
    Ellipse {
        cx: String,
        cy: String,
        rx: String,
        ry: String,
    },
}

impl Geometry {
    /// Classifies by attribute presence: rect, then ellipse, then path
    fn from_node(node: &Node<'_, '_>) -> Option<Self> {
        let attr = |name: &str| node.attribute(name).map(str::to_string);

        if let (Some(x), Some(y), Some(width), Some(height)) =
            (attr("x"), attr("y"), attr("width"), attr("height"))
        {
            return Some(Geometry::Rect { x, y, width, height });
        }
        if let (Some(cx), Some(cy), Some(rx), Some(ry)) = (attr("cx"), attr("cy"), attr("rx"), attr("ry")) {
            return Some(Geometry::Ellipse { cx, cy, rx, ry });
        }
        attr("d").map(|d| Geometry::Path { d })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Path { .. } => "path",
            Geometry::Rect { .. } => "rect",
            Geometry::Ellipse { .. } => "ellipse",
        }
    }
}

/// One addressable zone of a parsed map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneRecord {
    /// Presentation id, unique within one parse
    pub id: String,
    /// Canonical zone code (country-normalized on country-keyed maps)
    pub resolved_code: Option<String>,
    pub display_name: String,
    pub geometry: Geometry,
    /// Concatenated `transform` chain, outermost first
    pub transform: Option<String>,
}

impl ZoneRecord {
    /// Background squares drawn behind the iberian islands
    pub fn is_decorative(&self) -> bool {
        self.id.starts_with(DECORATIVE_PREFIX)
    }

    /// Key used for color and origin lookups
    pub fn zone_key(&self) -> &str {
        self.resolved_code.as_deref().unwrap_or(&self.id)
    }
}

/// Flattened map ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMap {
    pub map_type: MapType,
    pub view_box: String,
    pub zones: Vec<ZoneRecord>,
    /// Inner markup of the first `<defs>` block, verbatim
    pub defs: Option<String>,
}

impl ParsedMap {
    pub fn zone(&self, id: &str) -> Option<&ZoneRecord> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Zones that resolved to the given code
    pub fn zones_for_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ZoneRecord> + 'a {
        self.zones
            .iter()
            .filter(move |zone| zone.resolved_code.as_deref() == Some(code))
    }
}

/// Hands out unique presentation ids in document order
#[derive(Default)]
struct IdAllocator {
    used: HashSet<String>,
    occurrences: HashMap<String, usize>,
}

impl IdAllocator {
    fn allocate(&mut self, raw_id: Option<&str>, key: &str) -> String {
        let seen = self.occurrences.entry(key.to_string()).or_insert(0);
        *seen += 1;
        let mut occurrence = *seen;

        if let Some(raw) = raw_id.filter(|raw| !raw.is_empty()) {
            if !self.used.contains(raw) {
                self.used.insert(raw.to_string());
                return raw.to_string();
            }
        } else if occurrence == 1 && !self.used.contains(key) {
            self.used.insert(key.to_string());
            return key.to_string();
        }

        if occurrence == 1 {
            occurrence = 2;
        }
        loop {
            let candidate = format!("{}__{}", key, occurrence);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            occurrence += 1;
        }
    }
}

/// Parses SVG markup into a [`ParsedMap`].
///
/// Only `path`, `rect` and `ellipse` elements become zones. On country-keyed
/// maps the resolved code is normalized to ISO alpha-2 and elements whose
/// country does not belong on the map are dropped.
pub fn parse_map(markup: &str, map_type: MapType) -> Result<ParsedMap, MapError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(markup, options)?;
    let root = doc.root_element();

    let view_box = root
        .attribute("viewBox")
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_VIEW_BOX.to_string());
    let defs = root
        .descendants()
        .find(|node| node.has_tag_name("defs"))
        .and_then(|node| inner_markup(markup, &node));

    let country_keyed = map_type.is_country_keyed();
    let mut ids = IdAllocator::default();
    let mut zones = Vec::new();
    let mut dropped = 0usize;

    for node in root.descendants().filter(is_zone_primitive) {
        let Some(geometry) = Geometry::from_node(&node) else {
            dropped += 1;
            continue;
        };

        let raw_code = resolve_zone_identity(&node);
        let resolved_code = if country_keyed {
            normalize_country_code(raw_code.as_deref())
        } else {
            raw_code
        };

        if country_keyed {
            if let Some(code) = resolved_code.as_deref() {
                if !is_expected_country(map_type, code) {
                    tracing::trace!("Dropping {} outside the {} map", code, map_type);
                    dropped += 1;
                    continue;
                }
            }
        }

        let raw_id = node.attribute("id").filter(|id| !id.is_empty());
        let display_name = NAME_ATTRIBUTES
            .iter()
            .find_map(|name| node.attribute(*name).filter(|value| !value.trim().is_empty()))
            .map(str::to_string)
            .or_else(|| resolved_code.clone())
            .or_else(|| raw_id.map(str::to_string))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        let key = if country_keyed {
            resolved_code.as_deref().or(raw_id)
        } else {
            raw_id.or(resolved_code.as_deref())
        }
        .unwrap_or(FALLBACK_NAME)
        .to_string();
        let id = ids.allocate(raw_id, &key);

        zones.push(ZoneRecord {
            id,
            resolved_code,
            display_name,
            geometry,
            transform: transform_chain(&node),
        });
    }

    tracing::debug!(
        "Parsed {} map: {} zones, {} elements dropped",
        map_type,
        zones.len(),
        dropped
    );

    Ok(ParsedMap {
        map_type,
        view_box,
        zones,
        defs,
    })
}

/// Drawable primitives outside `<defs>`; defs content is reinjected as-is
fn is_zone_primitive(node: &Node<'_, '_>) -> bool {
    node.is_element()
        && matches!(node.tag_name().name(), "path" | "rect" | "ellipse")
        && !node.ancestors().any(|a| a.has_tag_name("defs"))
}

/// All `transform` attributes from the outermost ancestor down to the node
fn transform_chain(node: &Node<'_, '_>) -> Option<String> {
    let mut chain: Vec<&str> = node
        .ancestors()
        .filter_map(|n| n.attribute("transform"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if chain.is_empty() {
        return None;
    }
    chain.reverse();
    Some(chain.join(" "))
}

/// Source text between the node's start and end tags
fn inner_markup(source: &str, node: &Node<'_, '_>) -> Option<String> {
    let first = node.first_child()?;
    let last = node.last_child()?;
    source
        .get(first.range().start..last.range().end)
        .map(str::to_string)
}

/// Reads a map asset from an `http(s)://` URL or a filesystem path
pub async fn fetch_markup(location: &str, timeout: Duration) -> Result<String, MapError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let client = reqwest::Client::new();
        let response = client.get(location).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(MapError::Status {
                location: location.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.text().await?)
    } else {
        Ok(tokio::fs::read_to_string(location).await?)
    }
}

/// Fetches and parses a map asset; no partial map on failure
pub async fn load_map(location: &str, map_type: MapType, timeout: Duration) -> Result<ParsedMap, MapError> {
    tracing::info!("Loading {} map from {}", map_type, location);
    let markup = fetch_markup(location, timeout).await?;
    parse_map(&markup, map_type)
}
