//! Legend builder
//! Aggregates the active destination set into sorted legend entries.

use crate::catalog::{is_catalog_code, normalize_code, rate_label, NOT_PERMITTED};
use crate::colors::AssignmentSession;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub code: String,
    pub label: String,
    pub color: String,
    /// Not a domestic catalog baremo (international zone codes and the like)
    pub is_foreign_code: bool,
    /// True when any destination in the group is available
    pub is_available: bool,
}

/// Builds the legend for a session, recomputed from scratch on every call.
///
/// Ordering: `NP` last, catalog codes before foreign ones, then by label
/// under Spanish collation, then by code.
pub fn build_legend(session: &AssignmentSession) -> Vec<LegendEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut availability: HashMap<String, bool> = HashMap::new();

    for destination in session.destinations() {
        let code = normalize_code(destination.rate_code.as_deref())
            .unwrap_or_else(|| NOT_PERMITTED.to_string());
        match availability.get_mut(&code) {
            Some(available) => *available |= destination.is_available,
            None => {
                availability.insert(code.clone(), destination.is_available);
                order.push(code);
            }
        }
    }

    let mut entries: Vec<LegendEntry> = order
        .into_iter()
        .map(|code| {
            let is_available = availability.get(&code).copied().unwrap_or(false);
            LegendEntry {
                label: rate_label(Some(&code)),
                color: session.rate_color(Some(&code), is_available).to_string(),
                is_foreign_code: code != NOT_PERMITTED && !is_catalog_code(&code),
                is_available,
                code,
            }
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}

fn compare_entries(a: &LegendEntry, b: &LegendEntry) -> Ordering {
    let a_np = a.code == NOT_PERMITTED;
    let b_np = b.code == NOT_PERMITTED;
    a_np.cmp(&b_np)
        .then(a.is_foreign_code.cmp(&b.is_foreign_code))
        .then_with(|| collate_es(&a.label, &b.label))
        .then_with(|| a.code.cmp(&b.code))
}

/// Spanish-aware label comparison: case and accent insensitive, with `ñ`
/// sorting right after `n`.
pub fn collate_es(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(s: &str) -> Vec<(char, u8)> {
    s.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => ('a', 0),
            'é' | 'è' | 'ê' | 'ë' => ('e', 0),
            'í' | 'ì' | 'î' | 'ï' => ('i', 0),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => ('o', 0),
            'ú' | 'ù' | 'û' | 'ü' => ('u', 0),
            'ç' => ('c', 0),
            'ñ' => ('n', 1),
            other => (other, 0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NOT_PERMITTED_COLOR, PALETTE};
    use crate::colors::DestinationAssignment;

    fn session(items: &[(&str, Option<&str>, bool)]) -> AssignmentSession {
        AssignmentSession::new(
            items
                .iter()
                .map(|(zone, code, available)| DestinationAssignment::new(Some(*zone), *code, *available))
                .collect(),
        )
    }

    #[test]
    fn test_mixed_foreign_and_null_codes() {
        let s = session(&[("FR", Some("ZFR"), true), ("DE", Some("ZDE"), false), ("IT", None, true)]);
        let legend = build_legend(&s);

        assert_eq!(legend.len(), 3);
        let np = legend.last().unwrap();
        assert_eq!(np.code, "NP");
        assert!(np.is_available);
        assert!(!np.is_foreign_code);
        assert_eq!(np.color, NOT_PERMITTED_COLOR);

        let zfr = legend.iter().find(|e| e.code == "ZFR").unwrap();
        let zde = legend.iter().find(|e| e.code == "ZDE").unwrap();
        assert_eq!(zfr.color, PALETTE[0]);
        assert_eq!(zde.color, PALETTE[1]);
        assert_ne!(zfr.color, zde.color);
        assert!(zfr.is_foreign_code && zde.is_foreign_code);
        assert!(!zde.is_available);

        // "Zona DE" < "Zona FR"
        assert_eq!(legend[0].code, "ZDE");
        assert_eq!(legend[1].code, "ZFR");
    }

    #[test]
    fn test_domestic_before_foreign_and_np_last() {
        let s = session(&[
            ("A", Some("NP"), false),
            ("B", Some("ZIA"), true),
            ("C", Some("REG"), true),
            ("D", Some("BAM"), false),
            ("E", Some("PEN"), true),
        ]);
        let codes: Vec<_> = build_legend(&s).into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["BAM", "PEN", "REG", "ZIA", "NP"]);
    }

    #[test]
    fn test_availability_is_or_across_group() {
        let s = session(&[("A", Some("PEN"), false), ("B", Some("pen"), true), ("C", Some("PEN"), false)]);
        let legend = build_legend(&s);
        assert_eq!(legend.len(), 1);
        assert!(legend[0].is_available);
        assert_eq!(legend[0].label, "Peninsular");
    }

    #[test]
    fn test_legend_is_deterministic() {
        let s = session(&[
            ("A", Some("ZFR"), true),
            ("B", None, false),
            ("C", Some("PTC"), true),
            ("D", Some("X1"), false),
            ("E", Some("ZIB"), true),
        ]);
        let first = serde_json::to_string(&build_legend(&s)).unwrap();
        for _ in 0..5 {
            assert_eq!(serde_json::to_string(&build_legend(&s)).unwrap(), first);
        }
    }

    #[test]
    fn test_empty_session_gives_empty_legend() {
        assert!(build_legend(&AssignmentSession::default()).is_empty());
    }

    #[test]
    fn test_spanish_collation() {
        assert_eq!(collate_es("Ávila", "Badajoz"), Ordering::Less);
        assert_eq!(collate_es("nube", "ñandú"), Ordering::Less);
        assert_eq!(collate_es("ñandú", "oca"), Ordering::Less);
        assert_eq!(collate_es("Portugal Marítimo", "portugal maritimo"), Ordering::Equal);
    }
}
