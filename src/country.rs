//! Country code normalization module
//! Converts ISO 3166-1 alpha-3 codes (and a few legacy variants) to alpha-2
//! and provides the country sets expected by the world and europe maps.

use crate::router::MapType;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Explicit rewrites checked before the ISO3 table: retired or
/// non-ISO alpha-3 codes still found in map assets.
/// Keys are three letters only; a two-letter key could collide with the
/// prefix fallback and break idempotence.
const OVERRIDES: &[(&str, &str)] = &[
    ("KOS", "XK"),
    ("XKX", "XK"),
    ("ROM", "RO"),
    ("ZAR", "CD"),
    ("TMP", "TL"),
];

/// ISO 3166-1 alpha-3 to alpha-2
const ISO3_TO_ISO2: &[(&str, &str)] = &[
    ("ABW", "AW"), ("AFG", "AF"), ("AGO", "AO"), ("AIA", "AI"), ("ALA", "AX"),
    ("ALB", "AL"), ("AND", "AD"), ("ARE", "AE"), ("ARG", "AR"), ("ARM", "AM"),
    ("ASM", "AS"), ("ATA", "AQ"), ("ATF", "TF"), ("ATG", "AG"), ("AUS", "AU"),
    ("AUT", "AT"), ("AZE", "AZ"), ("BDI", "BI"), ("BEL", "BE"), ("BEN", "BJ"),
    ("BES", "BQ"), ("BFA", "BF"), ("BGD", "BD"), ("BGR", "BG"), ("BHR", "BH"),
    ("BHS", "BS"), ("BIH", "BA"), ("BLM", "BL"), ("BLR", "BY"), ("BLZ", "BZ"),
    ("BMU", "BM"), ("BOL", "BO"), ("BRA", "BR"), ("BRB", "BB"), ("BRN", "BN"),
    ("BTN", "BT"), ("BVT", "BV"), ("BWA", "BW"), ("CAF", "CF"), ("CAN", "CA"),
    ("CCK", "CC"), ("CHE", "CH"), ("CHL", "CL"), ("CHN", "CN"), ("CIV", "CI"),
    ("CMR", "CM"), ("COD", "CD"), ("COG", "CG"), ("COK", "CK"), ("COL", "CO"),
    ("COM", "KM"), ("CPV", "CV"), ("CRI", "CR"), ("CUB", "CU"), ("CUW", "CW"),
    ("CXR", "CX"), ("CYM", "KY"), ("CYP", "CY"), ("CZE", "CZ"), ("DEU", "DE"),
    ("DJI", "DJ"), ("DMA", "DM"), ("DNK", "DK"), ("DOM", "DO"), ("DZA", "DZ"),
    ("ECU", "EC"), ("EGY", "EG"), ("ERI", "ER"), ("ESH", "EH"), ("ESP", "ES"),
    ("EST", "EE"), ("ETH", "ET"), ("FIN", "FI"), ("FJI", "FJ"), ("FLK", "FK"),
    ("FRA", "FR"), ("FRO", "FO"), ("FSM", "FM"), ("GAB", "GA"), ("GBR", "GB"),
    ("GEO", "GE"), ("GGY", "GG"), ("GHA", "GH"), ("GIB", "GI"), ("GIN", "GN"),
    ("GLP", "GP"), ("GMB", "GM"), ("GNB", "GW"), ("GNQ", "GQ"), ("GRC", "GR"),
    ("GRD", "GD"), ("GRL", "GL"), ("GTM", "GT"), ("GUF", "GF"), ("GUM", "GU"),
    ("GUY", "GY"), ("HKG", "HK"), ("HMD", "HM"), ("HND", "HN"), ("HRV", "HR"),
    ("HTI", "HT"), ("HUN", "HU"), ("IDN", "ID"), ("IMN", "IM"), ("IND", "IN"),
    ("IOT", "IO"), ("IRL", "IE"), ("IRN", "IR"), ("IRQ", "IQ"), ("ISL", "IS"),
    ("ISR", "IL"), ("ITA", "IT"), ("JAM", "JM"), ("JEY", "JE"), ("JOR", "JO"),
    ("JPN", "JP"), ("KAZ", "KZ"), ("KEN", "KE"), ("KGZ", "KG"), ("KHM", "KH"),
    ("KIR", "KI"), ("KNA", "KN"), ("KOR", "KR"), ("KWT", "KW"), ("LAO", "LA"),
    ("LBN", "LB"), ("LBR", "LR"), ("LBY", "LY"), ("LCA", "LC"), ("LIE", "LI"),
    ("LKA", "LK"), ("LSO", "LS"), ("LTU", "LT"), ("LUX", "LU"), ("LVA", "LV"),
    ("MAC", "MO"), ("MAF", "MF"), ("MAR", "MA"), ("MCO", "MC"), ("MDA", "MD"),
    ("MDG", "MG"), ("MDV", "MV"), ("MEX", "MX"), ("MHL", "MH"), ("MKD", "MK"),
    ("MLI", "ML"), ("MLT", "MT"), ("MMR", "MM"), ("MNE", "ME"), ("MNG", "MN"),
    ("MNP", "MP"), ("MOZ", "MZ"), ("MRT", "MR"), ("MSR", "MS"), ("MTQ", "MQ"),
    ("MUS", "MU"), ("MWI", "MW"), ("MYS", "MY"), ("MYT", "YT"), ("NAM", "NA"),
    ("NCL", "NC"), ("NER", "NE"), ("NFK", "NF"), ("NGA", "NG"), ("NIC", "NI"),
    ("NIU", "NU"), ("NLD", "NL"), ("NOR", "NO"), ("NPL", "NP"), ("NRU", "NR"),
    ("NZL", "NZ"), ("OMN", "OM"), ("PAK", "PK"), ("PAN", "PA"), ("PCN", "PN"),
    ("PER", "PE"), ("PHL", "PH"), ("PLW", "PW"), ("PNG", "PG"), ("POL", "PL"),
    ("PRI", "PR"), ("PRK", "KP"), ("PRT", "PT"), ("PRY", "PY"), ("PSE", "PS"),
    ("PYF", "PF"), ("QAT", "QA"), ("REU", "RE"), ("ROU", "RO"), ("RUS", "RU"),
    ("RWA", "RW"), ("SAU", "SA"), ("SDN", "SD"), ("SEN", "SN"), ("SGP", "SG"),
    ("SGS", "GS"), ("SHN", "SH"), ("SJM", "SJ"), ("SLB", "SB"), ("SLE", "SL"),
    ("SLV", "SV"), ("SMR", "SM"), ("SOM", "SO"), ("SPM", "PM"), ("SRB", "RS"),
    ("SSD", "SS"), ("STP", "ST"), ("SUR", "SR"), ("SVK", "SK"), ("SVN", "SI"),
    ("SWE", "SE"), ("SWZ", "SZ"), ("SXM", "SX"), ("SYC", "SC"), ("SYR", "SY"),
    ("TCA", "TC"), ("TCD", "TD"), ("TGO", "TG"), ("THA", "TH"), ("TJK", "TJ"),
    ("TKL", "TK"), ("TKM", "TM"), ("TLS", "TL"), ("TON", "TO"), ("TTO", "TT"),
    ("TUN", "TN"), ("TUR", "TR"), ("TUV", "TV"), ("TWN", "TW"), ("TZA", "TZ"),
    ("UGA", "UG"), ("UKR", "UA"), ("UMI", "UM"), ("URY", "UY"), ("USA", "US"),
    ("UZB", "UZ"), ("VAT", "VA"), ("VCT", "VC"), ("VEN", "VE"), ("VGB", "VG"),
    ("VIR", "VI"), ("VNM", "VN"), ("VUT", "VU"), ("WLF", "WF"), ("WSM", "WS"),
    ("YEM", "YE"), ("ZAF", "ZA"), ("ZMB", "ZM"), ("ZWE", "ZW"),
];

/// Spanish display names keyed by ISO 3166-1 alpha-2 code.
/// Doubles as the country set of the world map.
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AD", "Andorra"), ("AE", "Emiratos Árabes Unidos"), ("AF", "Afganistán"),
    ("AG", "Antigua y Barbuda"), ("AI", "Anguila"), ("AL", "Albania"), ("AM", "Armenia"),
    ("AO", "Angola"), ("AR", "Argentina"), ("AT", "Austria"), ("AU", "Australia"),
    ("AW", "Aruba"), ("AZ", "Azerbaiyán"), ("BA", "Bosnia y Herzegovina"),
    ("BB", "Barbados"), ("BD", "Bangladés"), ("BE", "Bélgica"), ("BF", "Burkina Faso"),
    ("BG", "Bulgaria"), ("BH", "Baréin"), ("BI", "Burundi"), ("BJ", "Benín"),
    ("BL", "San Bartolomé"), ("BM", "Bermudas"), ("BN", "Brunéi"), ("BO", "Bolivia"),
    ("BQ", "Bonaire"), ("BR", "Brasil"), ("BS", "Bahamas"), ("BT", "Bután"),
    ("BW", "Botsuana"), ("BY", "Bielorrusia"), ("BZ", "Belice"), ("CA", "Canadá"),
    ("CD", "Rep. Dem. del Congo"), ("CF", "República Centroafricana"), ("CG", "Congo"),
    ("CH", "Suiza"), ("CI", "Costa de Marfil"), ("CL", "Chile"), ("CM", "Camerún"),
    ("CN", "China"), ("CO", "Colombia"), ("CR", "Costa Rica"), ("CU", "Cuba"),
    ("CV", "Cabo Verde"), ("CW", "Curazao"), ("CY", "Chipre"), ("CZ", "República Checa"),
    ("DE", "Alemania"), ("DJ", "Yibuti"), ("DK", "Dinamarca"), ("DM", "Dominica"),
    ("DO", "República Dominicana"), ("DZ", "Argelia"), ("EC", "Ecuador"),
    ("EE", "Estonia"), ("EG", "Egipto"), ("ER", "Eritrea"), ("ES", "España"),
    ("ET", "Etiopía"), ("FI", "Finlandia"), ("FJ", "Fiyi"), ("FM", "Micronesia"),
    ("FO", "Islas Feroe"), ("FR", "Francia"), ("GA", "Gabón"), ("GB", "Reino Unido"),
    ("GD", "Granada"), ("GE", "Georgia"), ("GF", "Guayana Francesa"), ("GG", "Guernsey"),
    ("GH", "Ghana"), ("GI", "Gibraltar"), ("GL", "Groenlandia"), ("GM", "Gambia"),
    ("GN", "Guinea"), ("GP", "Guadalupe"), ("GQ", "Guinea Ecuatorial"), ("GR", "Grecia"),
    ("GT", "Guatemala"), ("GU", "Guam"), ("GW", "Guinea-Bisáu"), ("GY", "Guyana"),
    ("HK", "Hong Kong"), ("HN", "Honduras"), ("HR", "Croacia"), ("HT", "Haití"),
    ("HU", "Hungría"), ("ID", "Indonesia"), ("IE", "Irlanda"), ("IL", "Israel"),
    ("IM", "Isla de Man"), ("IN", "India"), ("IQ", "Irak"), ("IR", "Irán"),
    ("IS", "Islandia"), ("IT", "Italia"), ("JE", "Jersey"), ("JM", "Jamaica"),
    ("JO", "Jordania"), ("JP", "Japón"), ("KE", "Kenia"), ("KG", "Kirguistán"),
    ("KH", "Camboya"), ("KM", "Comoras"), ("KN", "San Cristóbal y Nieves"),
    ("KP", "Corea del Norte"), ("KR", "Corea del Sur"), ("KW", "Kuwait"),
    ("KY", "Islas Caimán"), ("KZ", "Kazajistán"), ("LA", "Laos"), ("LB", "Líbano"),
    ("LC", "Santa Lucía"), ("LI", "Liechtenstein"), ("LK", "Sri Lanka"), ("LR", "Liberia"),
    ("LS", "Lesoto"), ("LT", "Lituania"), ("LU", "Luxemburgo"), ("LV", "Letonia"),
    ("LY", "Libia"), ("MA", "Marruecos"), ("MC", "Mónaco"), ("MD", "Moldavia"),
    ("ME", "Montenegro"), ("MF", "San Martín"), ("MG", "Madagascar"),
    ("MH", "Islas Marshall"), ("MK", "Macedonia del Norte"), ("ML", "Malí"),
    ("MM", "Birmania"), ("MN", "Mongolia"), ("MO", "Macao"), ("MQ", "Martinica"),
    ("MR", "Mauritania"), ("MS", "Montserrat"), ("MT", "Malta"), ("MU", "Mauricio"),
    ("MV", "Maldivas"), ("MW", "Malaui"), ("MX", "México"), ("MY", "Malasia"),
    ("MZ", "Mozambique"), ("NA", "Namibia"), ("NC", "Nueva Caledonia"), ("NE", "Níger"),
    ("NG", "Nigeria"), ("NI", "Nicaragua"), ("NL", "Países Bajos"), ("NO", "Noruega"),
    ("NP", "Nepal"), ("NZ", "Nueva Zelanda"), ("OM", "Omán"), ("PA", "Panamá"),
    ("PE", "Perú"), ("PF", "Polinesia Francesa"), ("PG", "Papúa Nueva Guinea"),
    ("PH", "Filipinas"), ("PK", "Pakistán"), ("PL", "Polonia"),
    ("PM", "San Pedro y Miquelón"), ("PR", "Puerto Rico"), ("PS", "Palestina"),
    ("PT", "Portugal"), ("PY", "Paraguay"), ("QA", "Catar"), ("RE", "Reunión"),
    ("RO", "Rumanía"), ("RS", "Serbia"), ("RU", "Rusia"), ("RW", "Ruanda"),
    ("SA", "Arabia Saudita"), ("SB", "Islas Salomón"), ("SC", "Seychelles"),
    ("SD", "Sudán"), ("SE", "Suecia"), ("SG", "Singapur"), ("SH", "Santa Elena"),
    ("SI", "Eslovenia"), ("SJ", "Svalbard y Jan Mayen"), ("SK", "Eslovaquia"),
    ("SL", "Sierra Leona"), ("SM", "San Marino"), ("SN", "Senegal"), ("SO", "Somalia"),
    ("SR", "Surinam"), ("SS", "Sudán del Sur"), ("ST", "Santo Tomé y Príncipe"),
    ("SV", "El Salvador"), ("SX", "Sint Maarten"), ("SY", "Siria"), ("SZ", "Esuatini"),
    ("TC", "Islas Turcas y Caicos"), ("TD", "Chad"), ("TG", "Togo"), ("TH", "Tailandia"),
    ("TJ", "Tayikistán"), ("TL", "Timor Oriental"), ("TM", "Turkmenistán"),
    ("TN", "Túnez"), ("TO", "Tonga"), ("TR", "Turquía"), ("TT", "Trinidad y Tobago"),
    ("TV", "Tuvalu"), ("TW", "Taiwán"), ("TZ", "Tanzania"), ("UA", "Ucrania"),
    ("UG", "Uganda"), ("US", "Estados Unidos"), ("UY", "Uruguay"), ("UZ", "Uzbekistán"),
    ("VA", "Ciudad del Vaticano"), ("VC", "San Vicente y las Granadinas"),
    ("VE", "Venezuela"), ("VG", "Islas Vírgenes Británicas"),
    ("VI", "Islas Vírgenes de EE.UU."), ("VN", "Vietnam"), ("VU", "Vanuatu"),
    ("WF", "Wallis y Futuna"), ("WS", "Samoa"), ("XK", "Kosovo"), ("YE", "Yemen"),
    ("YT", "Mayotte"), ("ZA", "Sudáfrica"), ("ZM", "Zambia"), ("ZW", "Zimbabue"),
];

/// Countries drawn on the europe map
const EUROPE_COUNTRIES: &[&str] = &[
    "AD", "AL", "AT", "BA", "BE", "BG", "BY", "CH", "CY", "CZ", "DE", "DK", "EE", "ES",
    "FI", "FO", "FR", "GB", "GG", "GI", "GR", "HR", "HU", "IE", "IM", "IS", "IT", "JE",
    "LI", "LT", "LU", "LV", "MC", "MD", "ME", "MK", "MT", "NL", "NO", "PL", "PT", "RO",
    "RS", "RU", "SE", "SI", "SJ", "SK", "SM", "TR", "UA", "VA", "XK",
];

static OVERRIDE_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| OVERRIDES.iter().copied().collect());

static ISO3_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ISO3_TO_ISO2.iter().copied().collect());

static NAME_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_NAMES.iter().copied().collect());

static WORLD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COUNTRY_NAMES.iter().map(|(code, _)| *code).collect());

static EUROPE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| EUROPE_COUNTRIES.iter().copied().collect());

/// Normalizes a country code variant to ISO 3166-1 alpha-2.
///
/// Lookup order: override table, then the alpha-3 table, then the
/// first-two-letters fallback for unknown alpha-3 codes. Anything that is
/// not three letters is returned uppercased as-is. Blank input gives `None`.
pub fn normalize_country_code(code: Option<&str>) -> Option<String> {
    let upper = code?.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    if let Some(mapped) = OVERRIDE_MAP.get(upper.as_str()) {
        return Some((*mapped).to_string());
    }

    if upper.len() == 3 && upper.chars().all(|c| c.is_ascii_alphabetic()) {
        if let Some(mapped) = ISO3_MAP.get(upper.as_str()) {
            return Some((*mapped).to_string());
        }
        // Unverified guess: only right when alpha-2 is a prefix of alpha-3
        return Some(upper[..2].to_string());
    }

    Some(upper)
}

/// Leading two-letter country prefix of a zone code (e.g. "FR01" -> "FR")
pub fn extract_country_code(code: Option<&str>) -> Option<String> {
    let upper = code?.trim().to_uppercase();
    let prefix: String = upper.chars().take(2).collect();
    if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_uppercase()) {
        Some(prefix)
    } else {
        None
    }
}

/// Spanish display name for an alpha-2 code
pub fn country_name(code: &str) -> Option<&'static str> {
    NAME_MAP.get(code.trim().to_uppercase().as_str()).copied()
}

/// Checks whether a normalized country code belongs on the given map.
/// Maps that are not country-keyed accept every code.
pub fn is_expected_country(map_type: MapType, code: &str) -> bool {
    match map_type {
        MapType::World => WORLD_SET.contains(code),
        MapType::Europe => EUROPE_SET.contains(code),
        MapType::Iberia => true,
    }
}

/// Best human label for a zone on a country-keyed map.
/// Prefers the country dictionary when the map only carries the bare code.
pub fn friendly_name(code: Option<&str>, display_name: &str) -> String {
    match code {
        Some(code) if display_name.eq_ignore_ascii_case(code) || display_name.is_empty() => {
            country_name(code).unwrap_or(display_name).to_string()
        }
        _ => display_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso3_in_table() {
        assert_eq!(normalize_country_code(Some("FRA")).as_deref(), Some("FR"));
        assert_eq!(normalize_country_code(Some("deu")).as_deref(), Some("DE"));
        assert_eq!(normalize_country_code(Some(" ESP ")).as_deref(), Some("ES"));
        assert_eq!(normalize_country_code(Some("PRT")).as_deref(), Some("PT"));
    }

    #[test]
    fn test_iso3_fallback_takes_prefix() {
        assert_eq!(normalize_country_code(Some("XYZ")).as_deref(), Some("XY"));
        assert_eq!(normalize_country_code(Some("qqq")).as_deref(), Some("QQ"));
    }

    #[test]
    fn test_every_table_entry_maps_exactly() {
        for (iso3, iso2) in ISO3_TO_ISO2 {
            if OVERRIDE_MAP.contains_key(iso3) {
                continue;
            }
            assert_eq!(normalize_country_code(Some(iso3)).as_deref(), Some(*iso2), "{}", iso3);
        }
    }

    #[test]
    fn test_overrides_win() {
        assert_eq!(normalize_country_code(Some("kos")).as_deref(), Some("XK"));
        assert_eq!(normalize_country_code(Some("ZAR")).as_deref(), Some("CD"));
        assert_eq!(normalize_country_code(Some("TMP")).as_deref(), Some("TL"));
        assert_eq!(normalize_country_code(Some("XKX")).as_deref(), Some("XK"));
        assert_eq!(normalize_country_code(Some("ROM")).as_deref(), Some("RO"));
    }

    #[test]
    fn test_two_letter_and_other_lengths_unchanged() {
        assert_eq!(normalize_country_code(Some("fr")).as_deref(), Some("FR"));
        assert_eq!(normalize_country_code(Some("PEN1")).as_deref(), Some("PEN1"));
        assert_eq!(normalize_country_code(Some("A1B")).as_deref(), Some("A1B"));
    }

    #[test]
    fn test_blank_is_none() {
        assert_eq!(normalize_country_code(None), None);
        assert_eq!(normalize_country_code(Some("")), None);
        assert_eq!(normalize_country_code(Some("   ")), None);
    }

    fn all_alpha3() -> impl Iterator<Item = String> {
        ('A'..='Z').flat_map(|a| {
            ('A'..='Z').flat_map(move |b| ('A'..='Z').map(move |c| String::from_iter([a, b, c])))
        })
    }

    fn assert_idempotent(input: &str) {
        let once = normalize_country_code(Some(input));
        let twice = normalize_country_code(once.as_deref());
        assert_eq!(once, twice, "not idempotent for {:?}", input);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for code in all_alpha3() {
            assert_idempotent(&code);
        }
        for (key, value) in OVERRIDES {
            assert_idempotent(key);
            assert_idempotent(value);
        }
        for a in 'A'..='Z' {
            for b in 'A'..='Z' {
                assert_idempotent(&format!("{}{}", a, b));
            }
        }
        for input in ["UKA", "ELX", "es", "a1b", "g", "ABCD", "  deu ", "PEN1"] {
            assert_idempotent(input);
        }
    }

    #[test]
    fn test_every_alpha3_maps_by_table_or_prefix() {
        for code in all_alpha3() {
            let expected = match (OVERRIDE_MAP.get(code.as_str()), ISO3_MAP.get(code.as_str())) {
                (Some(mapped), _) | (None, Some(mapped)) => mapped.to_string(),
                (None, None) => code[..2].to_string(),
            };
            assert_eq!(normalize_country_code(Some(code.as_str())), Some(expected), "{}", code);
        }
        assert_eq!(normalize_country_code(Some("UKA")).as_deref(), Some("UK"));
        assert_eq!(normalize_country_code(Some("ELX")).as_deref(), Some("EL"));
    }

    #[test]
    fn test_extract_country_code() {
        assert_eq!(extract_country_code(Some("fr01")).as_deref(), Some("FR"));
        assert_eq!(extract_country_code(Some("DE")).as_deref(), Some("DE"));
        assert_eq!(extract_country_code(Some("1A")), None);
        assert_eq!(extract_country_code(Some("F")), None);
        assert_eq!(extract_country_code(None), None);
    }

    #[test]
    fn test_expected_country_sets() {
        assert!(is_expected_country(MapType::World, "BR"));
        assert!(!is_expected_country(MapType::Europe, "BR"));
        assert!(is_expected_country(MapType::Europe, "PT"));
        assert!(!is_expected_country(MapType::World, "XY"));
        assert!(is_expected_country(MapType::Iberia, "XY"));
    }

    #[test]
    fn test_europe_is_subset_of_world() {
        for code in EUROPE_COUNTRIES {
            assert!(WORLD_SET.contains(code), "{}", code);
        }
    }

    #[test]
    fn test_friendly_name() {
        assert_eq!(friendly_name(Some("PL"), "PL"), "Polonia");
        assert_eq!(friendly_name(Some("PL"), "Poland"), "Poland");
        assert_eq!(friendly_name(None, "zone"), "zone");
        assert_eq!(friendly_name(Some("XY"), "XY"), "XY");
    }
}
