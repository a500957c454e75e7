use std::collections::HashSet;

use serde::Serialize;

use super::tags::{NutritionTag, Severity};

/// How much personalized impact analysis this meal warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactStrategy {
    /// Generic tips only.
    None,
    /// Mostly fine, gentle suggestions.
    LightTips,
    /// Clear or severe risk, full short/mid/long-term analysis.
    FullRiskAnalysis,
}

/// Overall risk level surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    None,
    Mild,
    Moderate,
    High,
}

/// Per-meal verdict returned inline in the upload response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub strategy: ImpactStrategy,
    pub risk_level: RiskLevel,
    /// 0-100, for gauges and progress bars.
    pub overall_score: u8,
}

fn has_severity(tags: &HashSet<NutritionTag>, wanted: &[Severity]) -> bool {
    tags.iter()
        .filter_map(|t| t.severity())
        .any(|s| wanted.contains(&s))
}

/// Decide strategy, risk level and score from the analyzer's balanced
/// verdict plus the meal's tag set.
///
/// The rules form an ordered table and several of them can match the same
/// tag set, so the order is load-bearing: very-high/multiple-high is checked
/// before single-high, which is checked before the mild-only case.
pub fn decide(ai_balanced: bool, tags: &HashSet<NutritionTag>) -> Decision {
    let has_very_high = has_severity(tags, &[Severity::VeryHigh, Severity::VeryLow]);
    let has_high = has_severity(tags, &[Severity::High, Severity::Low]);
    let high_count = tags
        .iter()
        .filter_map(|t| t.severity())
        .filter(|s| matches!(s, Severity::VeryHigh | Severity::High | Severity::VeryLow))
        .count();
    let only_mild = !has_high && !has_very_high;

    let (strategy, risk_level, score) = if tags.is_empty() {
        (
            ImpactStrategy::None,
            RiskLevel::None,
            if ai_balanced { 90 } else { 80 },
        )
    } else if has_very_high || high_count >= 2 {
        // "balanced" from the analyzer only speaks to macro structure, it
        // does not cancel a severe risk signal
        (
            ImpactStrategy::FullRiskAnalysis,
            RiskLevel::High,
            if ai_balanced { 70 } else { 60 },
        )
    } else if has_high {
        (
            ImpactStrategy::FullRiskAnalysis,
            RiskLevel::Moderate,
            if ai_balanced { 75 } else { 65 },
        )
    } else if only_mild {
        (
            ImpactStrategy::LightTips,
            if ai_balanced {
                RiskLevel::Mild
            } else {
                RiskLevel::Moderate
            },
            if ai_balanced { 80 } else { 70 },
        )
    } else {
        (
            if ai_balanced {
                ImpactStrategy::LightTips
            } else {
                ImpactStrategy::FullRiskAnalysis
            },
            RiskLevel::Moderate,
            if ai_balanced { 75 } else { 65 },
        )
    };

    Decision {
        strategy,
        risk_level,
        overall_score: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[NutritionTag]) -> HashSet<NutritionTag> {
        tags.iter().copied().collect()
    }

    #[test]
    fn empty_tags_mean_no_analysis() {
        let d = decide(true, &HashSet::new());
        assert_eq!(d.strategy, ImpactStrategy::None);
        assert_eq!(d.risk_level, RiskLevel::None);
        assert_eq!(d.overall_score, 90);

        let d = decide(false, &HashSet::new());
        assert_eq!(d.strategy, ImpactStrategy::None);
        assert_eq!(d.risk_level, RiskLevel::None);
        assert_eq!(d.overall_score, 80);
    }

    #[test]
    fn very_high_dominates_regardless_of_balanced_verdict() {
        for balanced in [true, false] {
            let d = decide(balanced, &set(&[NutritionTag::VeryHighSodium]));
            assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
            assert_eq!(d.risk_level, RiskLevel::High);
        }
        assert_eq!(decide(true, &set(&[NutritionTag::VeryHighSodium])).overall_score, 70);
        assert_eq!(decide(false, &set(&[NutritionTag::VeryHighSodium])).overall_score, 60);
    }

    #[test]
    fn very_low_fiber_counts_as_very_high() {
        let d = decide(false, &set(&[NutritionTag::VeryLowFiber]));
        assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
        assert_eq!(d.risk_level, RiskLevel::High);
    }

    #[test]
    fn two_high_tags_escalate_to_high() {
        let d = decide(
            true,
            &set(&[NutritionTag::HighSodium, NutritionTag::HighSugar]),
        );
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
        assert_eq!(d.overall_score, 70);
    }

    #[test]
    fn single_high_tag_is_moderate() {
        let d = decide(true, &set(&[NutritionTag::HighSodium]));
        assert_eq!(d.risk_level, RiskLevel::Moderate);
        assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
        assert_eq!(d.overall_score, 75);

        // a single Low band tag lands in the same rule
        let d = decide(false, &set(&[NutritionTag::LowSodium]));
        assert_eq!(d.risk_level, RiskLevel::Moderate);
        assert_eq!(d.overall_score, 65);
    }

    #[test]
    fn mild_only_gives_light_tips() {
        let mild = set(&[NutritionTag::MediumSugar, NutritionTag::MediumSatFat]);
        let d = decide(true, &mild);
        assert_eq!(d.strategy, ImpactStrategy::LightTips);
        assert_eq!(d.risk_level, RiskLevel::Mild);
        assert_eq!(d.overall_score, 80);

        let d = decide(false, &mild);
        assert_eq!(d.strategy, ImpactStrategy::LightTips);
        assert_eq!(d.risk_level, RiskLevel::Moderate);
        assert_eq!(d.overall_score, 70);
    }

    #[test]
    fn unweighted_compound_tags_count_as_mild() {
        // tags with no severity never trip the high/very-high rules
        let d = decide(true, &set(&[NutritionTag::LeanProtein, NutritionTag::BalancedMeal]));
        assert_eq!(d.strategy, ImpactStrategy::LightTips);
        assert_eq!(d.risk_level, RiskLevel::Mild);
    }

    #[test]
    fn high_fiber_meal_carries_high_weight() {
        // a deliberate quirk of the weighting: HIGH_FIBER_MEAL weighs in as
        // a high-level tag even though it is protective for stress scoring
        let d = decide(true, &set(&[NutritionTag::HighFiberMeal]));
        assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
        assert_eq!(d.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn sodium_only_snapshot_escalates_through_missing_fiber() {
        // a snapshot carrying only sodium bands fiber as zero, and the
        // resulting VERY_LOW_FIBER trips the very-high rule on its own
        let tags = crate::nutrition::tags::snapshot_tags(
            &crate::nutrition::tags::NutrientSnapshot {
                sodium_mg: Some(1500.0),
                ..Default::default()
            },
        );
        assert!(tags.contains(&NutritionTag::VeryLowFiber));

        let d = decide(false, &tags);
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.strategy, ImpactStrategy::FullRiskAnalysis);
        assert_eq!(d.overall_score, 60);
    }

    #[test]
    fn rule_order_checks_escalation_before_single_high() {
        // one VERY_HIGH plus one HIGH must resolve through the escalation
        // rule (HIGH risk), not the single-high rule
        let d = decide(
            false,
            &set(&[NutritionTag::VeryHighSugar, NutritionTag::HighSodium]),
        );
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.overall_score, 60);
    }
}
