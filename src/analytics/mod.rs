//! Reporting over loaded jobs. Everything here is pure: callers load the
//! rows, these functions shape them. Empty inputs produce fully populated,
//! zero-valued payloads.

pub mod clearance;
pub mod distribution;
pub mod timeline;
pub mod validity;

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::model::Container;

pub const ALL_IMPORTERS: &str = "All Importers";

/// `None` for "no importer filter": missing, blank, or the dashboard's
/// all-importers sentinel.
pub fn importer_filter(raw: Option<&str>) -> Option<String> {
    let v = raw?.trim();
    if v.is_empty() || v.eq_ignore_ascii_case(ALL_IMPORTERS) {
        return None;
    }
    Some(v.to_string())
}

pub fn teu_for_size(size: &str) -> u64 {
    match size.trim() {
        "20" => 1,
        "40" => 2,
        _ => 0,
    }
}

/// `"2x20, 1x40"`, sizes in ascending numeric order with non-numeric sizes
/// last. Blank sizes are skipped.
pub fn size_breakdown(containers: &[Container]) -> String {
    let mut counts: BTreeMap<(u32, &str), usize> = BTreeMap::new();
    for c in containers {
        let size = c.size.trim();
        if size.is_empty() {
            continue;
        }
        let rank = size.parse::<u32>().unwrap_or(u32::MAX);
        *counts.entry((rank, size)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((_, size), n)| format!("{}x{}", n, size))
        .collect::<Vec<_>>()
        .join(", ")
}

fn scrap_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)scrap|waste|recyclable").expect("static regex"))
}

pub fn is_scrap_commodity(description: &str) -> bool {
    scrap_pattern().is_match(description)
}

/// Container counts by size class plus TEU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeTally {
    pub containers: u64,
    pub twenty: u64,
    pub forty: u64,
    pub other: u64,
    pub teu: u64,
}

impl SizeTally {
    pub fn of(containers: &[Container]) -> Self {
        let mut t = SizeTally::default();
        for c in containers {
            t.add(&c.size);
        }
        t
    }

    pub fn add(&mut self, size: &str) {
        self.containers += 1;
        match teu_for_size(size) {
            1 => self.twenty += 1,
            2 => self.forty += 1,
            _ => self.other += 1,
        }
        self.teu += teu_for_size(size);
    }
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(100.0 * part as f64 / whole as f64, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(size: &str) -> Container {
        Container {
            size: size.into(),
            ..Container::default()
        }
    }

    #[test]
    fn importer_filter_ignores_sentinel() {
        assert_eq!(importer_filter(None), None);
        assert_eq!(importer_filter(Some("  ")), None);
        assert_eq!(importer_filter(Some("All Importers")), None);
        assert_eq!(importer_filter(Some("all importers")), None);
        assert_eq!(importer_filter(Some(" ACME ")), Some("ACME".into()));
    }

    #[test]
    fn teu_sum_matches_size_counts() {
        let containers: Vec<_> = ["20", "40", "40", "20", "20", "45", ""]
            .iter()
            .map(|s| sized(s))
            .collect();
        let t = SizeTally::of(&containers);
        assert_eq!(t.twenty, 3);
        assert_eq!(t.forty, 2);
        assert_eq!(t.other, 2);
        assert_eq!(t.containers, 7);
        assert_eq!(t.teu, t.twenty + 2 * t.forty);
    }

    #[test]
    fn size_breakdown_groups_sizes() {
        let containers = vec![sized("40"), sized("20"), sized("40"), sized("")];
        assert_eq!(size_breakdown(&containers), "1x20, 2x40");
        assert_eq!(size_breakdown(&[]), "");
    }

    #[test]
    fn size_breakdown_orders_numerically() {
        let containers = vec![sized("100"), sized("HC"), sized("40"), sized("20"), sized("100")];
        assert_eq!(size_breakdown(&containers), "1x20, 1x40, 2x100, 1xHC");
    }

    #[test]
    fn scrap_match_is_case_insensitive() {
        assert!(is_scrap_commodity("HMS 1&2 Steel SCRAP"));
        assert!(is_scrap_commodity("Plastic waste bales"));
        assert!(is_scrap_commodity("Recyclable paper"));
        assert!(!is_scrap_commodity("Copper cathodes"));
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.3);
    }
}
