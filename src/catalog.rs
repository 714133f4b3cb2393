//! Rate code catalog
//! Static baremo table, fixed colors and the rotating palette used for
//! rate codes the catalog does not know.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Sentinel for destinations without a valid rate ("no permitido")
pub const NOT_PERMITTED: &str = "NP";

/// Zones without any destination assignment
pub const DEFAULT_ZONE_COLOR: &str = "#e2e8f0";
/// The selected origin zone
pub const ORIGIN_ZONE_COLOR: &str = "#fbbf24";
/// Available destination whose rate code cannot be colored otherwise
pub const AVAILABLE_FALLBACK_COLOR: &str = "#2563eb";

/// Colors handed out, in order, to unknown rate codes
pub const PALETTE: &[&str] = &[
    "#2563eb", "#9333ea", "#f97316", "#0ea5e9", "#ef4444", "#22c55e", "#facc15", "#a855f7",
    "#14b8a6", "#f472b6", "#38bdf8", "#fb7185", "#84cc16",
];

/// One baremo known at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateCodeEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub color: &'static str,
}

pub const CATALOG: &[RateCodeEntry] = &[
    RateCodeEntry { code: "CEU", name: "Ceuta", color: "#1e40af" },
    RateCodeEntry { code: "AND", name: "Andorra", color: "#3b82f6" },
    RateCodeEntry { code: "PEN", name: "Peninsular", color: "#15803d" },
    RateCodeEntry { code: "PRO", name: "Provincial", color: "#86efac" },
    RateCodeEntry { code: "PEL", name: "Peninsular Largo", color: "#6d28d9" },
    RateCodeEntry { code: "REG", name: "Regional", color: "#f97316" },
    RateCodeEntry { code: "PTC", name: "Portugal Continental", color: "#db2777" },
    RateCodeEntry { code: "PTI", name: "Portugal Islas", color: "#fbbf24" },
    RateCodeEntry { code: "MEL", name: "Melilla", color: "#dc2626" },
    RateCodeEntry { code: "GIB", name: "Gibraltar", color: "#78350f" },
    RateCodeEntry { code: "PTM", name: "Portugal Marítimo", color: "#84cc16" },
    RateCodeEntry { code: "CAM", name: "Canarias Mayores", color: "#ca8a04" },
    RateCodeEntry { code: "BAM", name: "Baleares Mayores", color: "#eab308" },
    RateCodeEntry { code: NOT_PERMITTED, name: "No permitido", color: "#94a3b8" },
];

/// Color of the `NP` sentinel, also used for unavailable destinations
pub const NOT_PERMITTED_COLOR: &str = "#94a3b8";

static SINGLE_LETTER_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ZI([A-Z])$").expect("valid regex"));
static TWO_LETTER_ZONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Z([A-Z]{2})$").expect("valid regex"));

/// Trims and uppercases a code; blank gives `None`
pub fn normalize_code(code: Option<&str>) -> Option<String> {
    let trimmed = code?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Looks up a catalog entry by (already normalized) code
pub fn lookup(code: &str) -> Option<&'static RateCodeEntry> {
    CATALOG.iter().find(|entry| entry.code == code)
}

/// Whether the code is a domestic catalog baremo (the sentinel excluded)
pub fn is_catalog_code(code: &str) -> bool {
    code != NOT_PERMITTED && lookup(code).is_some()
}

/// Human label for a rate code.
///
/// Catalog names first, then the zone-number conventions used by the
/// international rates (`ZIA` -> "Zona A", `ZFR` -> "Zona FR"), then a
/// generic "Baremo <code>".
pub fn rate_label(code: Option<&str>) -> String {
    let Some(normalized) = normalize_code(code) else {
        return "No permitido".to_string();
    };
    if let Some(entry) = lookup(&normalized) {
        return entry.name.to_string();
    }
    if let Some(caps) = SINGLE_LETTER_ZONE.captures(&normalized) {
        return format!("Zona {}", &caps[1]);
    }
    if let Some(caps) = TWO_LETTER_ZONE.captures(&normalized) {
        return format!("Zona {}", &caps[1]);
    }
    if let Some(rest) = normalized.strip_prefix('Z') {
        return format!("Zona {}", rest);
    }
    format!("Baremo {}", normalized)
}
