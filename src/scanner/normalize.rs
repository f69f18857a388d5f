//! Aggregate name cleanup.
//!
//! Candidates from all strategies are singularized, filtered, deduplicated
//! case-insensitively and sorted. The operation is idempotent.

use std::collections::{BTreeMap, HashSet};

use crate::constants::scanner::MIN_NAME_LEN_EXCLUSIVE;

/// Strip one trailing plural `s`.
///
/// Names ending in `ss` (`Address`, `Class`) are left alone so a second
/// pass cannot shorten them again.
pub fn singularize(name: &str) -> &str {
    if name.len() > 1 && name.ends_with('s') && !name.ends_with("ss") {
        &name[..name.len() - 1]
    } else {
        name
    }
}

/// Clean the union of aggregate candidates.
///
/// When several spellings collapse to the same lowercase key, the smallest
/// one in byte order is kept, so capitalized forms win.
pub fn normalize_aggregates<I, S>(candidates: I, noise_names: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let noise: HashSet<String> = noise_names.iter().map(|n| n.to_lowercase()).collect();
    let mut unique: BTreeMap<String, String> = BTreeMap::new();

    for candidate in candidates {
        let name = singularize(candidate.as_ref().trim());
        let key = name.to_lowercase();

        if name.chars().count() <= MIN_NAME_LEN_EXCLUSIVE || noise.contains(&key) {
            continue;
        }

        unique
            .entry(key)
            .and_modify(|kept| {
                if name < kept.as_str() {
                    *kept = name.to_string();
                }
            })
            .or_insert_with(|| name.to_string());
    }

    let mut names: Vec<String> = unique.into_values().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::scanner::NOISE_NAMES;
    use proptest::prelude::*;

    fn noise() -> Vec<String> {
        NOISE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_variants_collapse() {
        let cleaned = normalize_aggregates(["Invoices", "invoice", "Invoice"], &noise());
        assert_eq!(cleaned, vec!["Invoice".to_string()]);
    }

    #[test]
    fn test_noise_and_short_names_dropped() {
        let cleaned = normalize_aggregates(
            ["Commands", "Dtos", "Services", "Ab", "Ox", "Employee", "Base"],
            &noise(),
        );
        assert_eq!(cleaned, vec!["Employee".to_string()]);
    }

    #[test]
    fn test_double_s_kept() {
        assert_eq!(singularize("Address"), "Address");
        assert_eq!(singularize("Orders"), "Order");
        assert_eq!(singularize("s"), "s");
        assert_eq!(singularize("Status"), "Statu");
        assert_eq!(singularize("Statu"), "Statu");
    }

    #[test]
    fn test_sorted_output() {
        let cleaned = normalize_aggregates(["Zone", "Account", "Employee"], &noise());
        assert_eq!(cleaned, vec!["Account", "Employee", "Zone"]);
    }

    proptest! {
        #[test]
        fn cleanup_is_idempotent(names in prop::collection::vec("[A-Za-z]{0,12}", 0..24)) {
            let once = normalize_aggregates(&names, &noise());
            let twice = normalize_aggregates(&once, &noise());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn cleanup_has_no_case_duplicates(names in prop::collection::vec("[A-Za-z]{3,10}s?", 0..24)) {
            let cleaned = normalize_aggregates(&names, &noise());
            let keys: HashSet<String> = cleaned.iter().map(|n| n.to_lowercase()).collect();
            prop_assert_eq!(keys.len(), cleaned.len());
        }
    }
}
