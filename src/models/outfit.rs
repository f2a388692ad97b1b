//! Day-by-day outfit plan

use serde::{Deserialize, Serialize};

/// What to wear on one day of the trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutfit {
    pub date: String,
    pub outfit: String,
}

/// Ordered outfits, one per trip day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitPlan {
    pub outfits: Vec<DayOutfit>,
}

impl OutfitPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }

    /// Drop outfits past the last trip day
    pub fn truncate(&mut self, days: usize) {
        self.outfits.truncate(days);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_order() {
        let mut plan: OutfitPlan = serde_json::from_str(
            r#"{"outfits":[
                {"date":"2026-10-18","outfit":"Jeans and a sweater"},
                {"date":"2026-10-19","outfit":"Dress with a denim jacket"},
                {"date":"2026-10-20","outfit":"Chinos and a polo"}
            ]}"#,
        )
        .unwrap();
        plan.truncate(2);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.outfits[1].date, "2026-10-19");
    }
}
