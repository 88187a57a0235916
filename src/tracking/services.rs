//! The `services` column: a sorted, comma-separated set of category tags.

use crate::common::constants::{is_missing, NOT_AVAILABLE, SERVICES_SEPARATOR};
use std::collections::BTreeSet;

fn tags(services: &str) -> BTreeSet<String> {
    services
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !is_missing(t))
        .map(|t| t.to_string())
        .collect()
}

fn join(set: BTreeSet<String>) -> String {
    if set.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        set.into_iter().collect::<Vec<_>>().join(SERVICES_SEPARATOR)
    }
}

/// Tags contributed by one subcategory page.
pub fn format_unique_categories(category: &str, subcategory: &str) -> String {
    let set: BTreeSet<String> = [category, subcategory]
        .iter()
        .map(|t| t.trim())
        .filter(|t| !is_missing(t))
        .map(|t| t.to_string())
        .collect();
    join(set)
}

/// Union of the tags already stored for an outlet and newly found ones.
pub fn merge_services(existing: &str, new: &str) -> String {
    let mut set = tags(existing);
    set.extend(tags(new));
    join(set)
}

/// Whether two service strings carry the same tags, ignoring order and spacing.
pub fn same_services(a: &str, b: &str) -> bool {
    tags(a) == tags(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unique_categories() {
        assert_eq!(format_unique_categories("Health", "Dental"), "Dental, Health");
        assert_eq!(format_unique_categories("Health", "Health"), "Health");
        assert_eq!(format_unique_categories("Health", "N/A"), "Health");
        assert_eq!(format_unique_categories("N/A", " "), "N/A");
    }

    #[test]
    fn test_merge_services() {
        assert_eq!(merge_services("Health, Dental", "Dental, Aged Care"), "Aged Care, Dental, Health");
        assert_eq!(merge_services("", "Health"), "Health");
        assert_eq!(merge_services("N/A", "N/A"), "N/A");
        assert_eq!(merge_services("Health,Dental", "Health"), "Dental, Health");
    }

    #[test]
    fn test_same_services() {
        assert!(same_services("Dental, Health", "Health,Dental"));
        assert!(!same_services("Dental", "Dental, Health"));
        assert!(same_services("N/A", ""));
    }
}
