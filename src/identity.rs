//! Zone identity resolution
//! Extracts a canonical 2-3 letter zone code from an element's class or id,
//! walking from the element up to the document root.

use once_cell::sync::Lazy;
use regex::Regex;

static ZONE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("valid regex"));

/// Prefix used by some exporters to wrap a zone group id (e.g. `gESP`)
const GROUP_PREFIX: char = 'g';

/// Attribute access needed by the matchers
pub trait ZoneAttributes {
    fn class_attr(&self) -> Option<&str>;
    fn id_attr(&self) -> Option<&str>;
}

/// A node that can be walked towards the document root
pub trait ZoneElement: ZoneAttributes + Clone {
    fn enclosing(&self) -> Option<Self>;
}

impl<'a, 'input> ZoneAttributes for roxmltree::Node<'a, 'input> {
    fn class_attr(&self) -> Option<&str> {
        self.attribute("class")
    }

    fn id_attr(&self) -> Option<&str> {
        self.attribute("id")
    }
}

impl<'a, 'input> ZoneElement for roxmltree::Node<'a, 'input> {
    fn enclosing(&self) -> Option<Self> {
        self.parent_element()
    }
}

/// One identity-encoding convention, tried against a single node
pub type IdentityMatcher = fn(&dyn ZoneAttributes) -> Option<String>;

/// Conventions in priority order
pub static DEFAULT_MATCHERS: &[IdentityMatcher] = &[match_class_tokens, match_id, match_group_id];

/// Resolves the zone code of `element` with [`DEFAULT_MATCHERS`]
pub fn resolve_zone_identity<E: ZoneElement>(element: &E) -> Option<String> {
    resolve_with(element, DEFAULT_MATCHERS)
}

/// Runs every matcher on the element, then on each ancestor in turn.
/// The first hit wins; `None` when nothing up to the root matches.
pub fn resolve_with<E: ZoneElement>(element: &E, matchers: &[IdentityMatcher]) -> Option<String> {
    let mut current = Some(element.clone());
    while let Some(node) = current {
        if let Some(code) = matchers.iter().find_map(|matcher| matcher(&node)) {
            return Some(code);
        }
        current = node.enclosing();
    }
    None
}

/// Keeps ASCII letters only, uppercased, and tests the zone code pattern
fn as_zone_code(raw: &str) -> Option<String> {
    let letters: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    ZONE_CODE.is_match(&letters).then_some(letters)
}

/// First whitespace-separated class token that reduces to a zone code
pub fn match_class_tokens(node: &dyn ZoneAttributes) -> Option<String> {
    node.class_attr()?.split_whitespace().find_map(as_zone_code)
}

/// The id itself, reduced to letters
pub fn match_id(node: &dyn ZoneAttributes) -> Option<String> {
    node.id_attr().and_then(as_zone_code)
}

/// Four-character ids of the form `gXXX`
pub fn match_group_id(node: &dyn ZoneAttributes) -> Option<String> {
    let id = node.id_attr()?;
    if id.chars().count() != 4 {
        return None;
    }
    let rest = id.strip_prefix(GROUP_PREFIX)?.to_uppercase();
    ZONE_CODE.is_match(&rest).then_some(rest)
}
