//! Reference catalog of the bias categories the detection service reports.

use crate::models::{BiasType, Severity};

/// Every known bias type, in display order.
pub const BIAS_TYPES: &[BiasType] = &[
    BiasType {
        id: "confirmation",
        name: "Confirmation Bias",
        description: "AI favors information confirming existing beliefs",
        severity: Severity::High,
        examples: &[
            "Job screening favoring certain demographics",
            "News recommendation echo chambers",
        ],
        detection_rate: 78,
        color: "#ef4444",
    },
    BiasType {
        id: "anchoring",
        name: "Anchoring Bias",
        description: "Over-reliance on first piece of information",
        severity: Severity::Medium,
        examples: &[
            "Price estimation based on initial value",
            "First impression in resume screening",
        ],
        detection_rate: 65,
        color: "#f59e0b",
    },
    BiasType {
        id: "availability",
        name: "Availability Heuristic",
        description: "Overweighting recent or memorable events",
        severity: Severity::High,
        examples: &[
            "Risk assessment after viral news",
            "Trend prediction from limited samples",
        ],
        detection_rate: 82,
        color: "#8b5cf6",
    },
    BiasType {
        id: "groupthink",
        name: "Groupthink",
        description: "Consensus-seeking suppresses alternatives",
        severity: Severity::Medium,
        examples: &[
            "Popular opinion amplification",
            "Majority viewpoint dominance",
        ],
        detection_rate: 71,
        color: "#3b82f6",
    },
    BiasType {
        id: "recency",
        name: "Recency Bias",
        description: "Recent information weighted too heavily",
        severity: Severity::Medium,
        examples: &[
            "Stock prediction from latest data only",
            "Customer behavior based on last interaction",
        ],
        detection_rate: 88,
        color: "#10b981",
    },
    BiasType {
        id: "survivorship",
        name: "Survivorship Bias",
        description: "Focusing only on successful cases",
        severity: Severity::Critical,
        examples: &[
            "Business advice from only successful startups",
            "Medical treatment from survivors only",
        ],
        detection_rate: 56,
        color: "#ec4899",
    },
];

/// Reduce a service identifier to its catalog id.
///
/// The service reports long forms such as `confirmation_bias` or
/// `availability_heuristic`; the catalog keys on the short stem.
pub fn normalize_id(id: &str) -> String {
    let id = id.trim().to_lowercase().replace(['-', ' '], "_");
    let stem = id
        .strip_suffix("_bias")
        .or_else(|| id.strip_suffix("_heuristic"))
        .unwrap_or(&id);
    stem.to_string()
}

/// Look up a bias type by short or long identifier.
pub fn find(id: &str) -> Option<&'static BiasType> {
    let key = normalize_id(id);
    BIAS_TYPES.iter().find(|b| b.id == key)
}

/// Display name for an identifier, falling back to the raw id.
pub fn display_name(id: &str) -> String {
    find(id)
        .map(|b| b.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Bias types sorted from most to least severe, ties keeping display order.
pub fn by_severity() -> Vec<&'static BiasType> {
    let mut types: Vec<_> = BIAS_TYPES.iter().collect();
    types.sort_by(|a, b| b.severity.cmp(&a.severity));
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = BIAS_TYPES.iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), BIAS_TYPES.len());
    }

    #[test]
    fn test_find_accepts_service_ids() {
        assert_eq!(find("confirmation").map(|b| b.id), Some("confirmation"));
        assert_eq!(find("confirmation_bias").map(|b| b.id), Some("confirmation"));
        assert_eq!(find("availability_heuristic").map(|b| b.id), Some("availability"));
        assert_eq!(find("Survivorship-Bias").map(|b| b.id), Some("survivorship"));
        assert_eq!(find("groupthink").map(|b| b.id), Some("groupthink"));
        assert!(find("halo_effect").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name("anchoring_bias"), "Anchoring Bias");
        assert_eq!(display_name("halo_effect"), "halo_effect");
    }

    #[test]
    fn test_by_severity_order() {
        let sorted = by_severity();
        assert_eq!(sorted[0].id, "survivorship");
        assert!(sorted
            .windows(2)
            .all(|pair| pair[0].severity >= pair[1].severity));
        // confirmation precedes availability (both high) as in display order
        let high: Vec<_> = sorted
            .iter()
            .filter(|b| b.severity == Severity::High)
            .map(|b| b.id)
            .collect();
        assert_eq!(high, vec!["confirmation", "availability"]);
    }
}
