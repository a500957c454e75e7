use std::collections::HashSet;

use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::meals::repo as meals_repo;

use super::tags::{meal_tags, NutritionTag};

/// Score assigned to a day with no meal records.
pub const DEFAULT_DAILY_SCORE: i32 = 40;

/// Tags that push the daily stress score up.
///
/// Only the HIGH_* band variants are listed; the VERY_HIGH_* bands are
/// deliberately absent, so an extreme value alone contributes nothing here
/// unless another listed tag fires. Kept as-is for score compatibility.
fn is_risk(tag: NutritionTag) -> bool {
    matches!(
        tag,
        NutritionTag::HighSodium
            | NutritionTag::HighSugar
            | NutritionTag::LowFiber
            | NutritionTag::HighSatFat
            | NutritionTag::HighEnergyDense
            | NutritionTag::ProcessedMeat
            | NutritionTag::DeepFried
            | NutritionTag::SugaryDrink
            | NutritionTag::GenericHighRisk
    )
}

/// Tags that pull the daily stress score down.
fn is_protective(tag: NutritionTag) -> bool {
    matches!(
        tag,
        NutritionTag::HighFiberMeal
            | NutritionTag::VegetableRich
            | NutritionTag::LeanProtein
            | NutritionTag::BalancedMeal
    )
}

/// Score delta contributed by a single meal's tag set, driven by the net
/// risk count (risk tags minus protective tags).
pub fn delta_for_tags(tags: &HashSet<NutritionTag>) -> i32 {
    let risk = tags.iter().filter(|t| is_risk(**t)).count() as i32;
    let protect = tags.iter().filter(|t| is_protective(**t)).count() as i32;

    match risk - protect {
        n if n >= 3 => 20,
        2 => 15,
        1 => 10,
        0 => 0,
        -1 | -2 => -10,
        _ => -20,
    }
}

/// Fold a day's per-meal tag sets (in eaten order) into the daily score.
/// Starts at the default, clamps to [0, 100] after every meal so a spike
/// cannot carry overflow into the next delta.
pub fn score_for_day<'a>(tag_sets: impl IntoIterator<Item = &'a HashSet<NutritionTag>>) -> i32 {
    let mut score = DEFAULT_DAILY_SCORE;
    for tags in tag_sets {
        score = (score + delta_for_tags(tags)).clamp(0, 100);
    }
    score
}

/// Compute and persist the stress score for one user-day.
///
/// Loads the day's meals in ascending eaten-at order, classifies each one,
/// folds the deltas, and upserts the result keyed by (user, day), so
/// recomputation overwrites rather than accumulates. A day without meals is
/// not an error: the default score is persisted.
pub async fn calculate_daily_score(db: &PgPool, user_id: Uuid, date: Date) -> anyhow::Result<i32> {
    let meals = meals_repo::list_for_day(db, user_id, date).await?;

    let tag_sets: Vec<HashSet<NutritionTag>> = meals
        .iter()
        .map(|m| {
            meal_tags(
                m.snapshot().as_ref(),
                m.is_balanced.unwrap_or(false),
                m.risk_level.as_deref() == Some("HIGH"),
            )
        })
        .collect();

    let score = score_for_day(&tag_sets);

    sqlx::query(
        r#"
        INSERT INTO stress_scores (user_id, score_day, score)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, score_day)
        DO UPDATE SET score = EXCLUDED.score, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(score)
    .execute(db)
    .await?;

    tracing::info!(%user_id, %date, score, meals = meals.len(), "daily stress score persisted");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::tags::{snapshot_tags, NutrientSnapshot};

    fn set(tags: &[NutritionTag]) -> HashSet<NutritionTag> {
        tags.iter().copied().collect()
    }

    #[test]
    fn delta_table() {
        assert_eq!(
            delta_for_tags(&set(&[
                NutritionTag::HighSodium,
                NutritionTag::HighSugar,
                NutritionTag::HighSatFat,
            ])),
            20
        );
        assert_eq!(
            delta_for_tags(&set(&[NutritionTag::HighSodium, NutritionTag::HighSugar])),
            15
        );
        assert_eq!(delta_for_tags(&set(&[NutritionTag::HighSodium])), 10);
        assert_eq!(delta_for_tags(&HashSet::new()), 0);
        assert_eq!(delta_for_tags(&set(&[NutritionTag::HighFiberMeal])), -10);
        assert_eq!(
            delta_for_tags(&set(&[
                NutritionTag::HighFiberMeal,
                NutritionTag::VegetableRich,
            ])),
            -10
        );
        assert_eq!(
            delta_for_tags(&set(&[
                NutritionTag::HighFiberMeal,
                NutritionTag::VegetableRich,
                NutritionTag::LeanProtein,
            ])),
            -20
        );
    }

    #[test]
    fn very_high_bands_do_not_count_as_risk() {
        assert_eq!(delta_for_tags(&set(&[NutritionTag::VeryHighSodium])), 0);
    }

    #[test]
    fn empty_day_scores_default() {
        let day: Vec<HashSet<NutritionTag>> = Vec::new();
        assert_eq!(score_for_day(day.iter()), DEFAULT_DAILY_SCORE);
    }

    #[test]
    fn day_of_single_risk_meals_accumulates() {
        let one_risk = set(&[NutritionTag::HighSodium]);
        let day = vec![one_risk.clone(), one_risk.clone(), one_risk];
        assert_eq!(score_for_day(day.iter()), 70);
    }

    #[test]
    fn score_clamps_at_each_step() {
        // ten +20 meals pin the score at 100 rather than 240
        let heavy = set(&[
            NutritionTag::HighSodium,
            NutritionTag::HighSugar,
            NutritionTag::HighSatFat,
        ]);
        let day = vec![heavy; 10];
        assert_eq!(score_for_day(day.iter()), 100);

        // ...and a protective meal afterwards still pulls from 100, not
        // from an unclamped running total
        let mut day = vec![
            set(&[
                NutritionTag::HighSodium,
                NutritionTag::HighSugar,
                NutritionTag::HighSatFat,
            ]);
            5
        ];
        day.push(set(&[NutritionTag::HighFiberMeal]));
        assert_eq!(score_for_day(day.iter()), 90);
    }

    #[test]
    fn realistic_day_through_the_calculator() {
        // breakfast: sodium 1500 -> HIGH_SODIUM (+10)
        let breakfast = snapshot_tags(&NutrientSnapshot {
            sodium_mg: Some(1500.0),
            ..Default::default()
        });
        // lunch: sugar 30 -> HIGH_SUGAR (+10)
        let lunch = snapshot_tags(&NutrientSnapshot {
            sugar_g: Some(30.0),
            ..Default::default()
        });
        // dinner: fiber 12 -> HIGH_FIBER_MEAL + VEGETABLE_RICH (-10)
        let dinner = snapshot_tags(&NutrientSnapshot {
            fiber_g: Some(12.0),
            ..Default::default()
        });

        let day = vec![breakfast, lunch, dinner];
        assert_eq!(score_for_day(day.iter()), 50);
    }

    #[test]
    fn balanced_flag_alone_is_protective() {
        // record flagged balanced by the analyzer, macros too weak to earn
        // BALANCED_MEAL on their own
        let tags = meal_tags(
            Some(&NutrientSnapshot {
                sodium_mg: Some(100.0),
                sugar_g: Some(5.0),
                sat_fat_g: Some(5.0),
                fiber_g: Some(2.0),
                ..Default::default()
            }),
            true,
            false,
        );
        let day = vec![tags];
        assert_eq!(score_for_day(day.iter()), 30);
    }

    #[test]
    fn high_risk_flag_without_nutrition_is_penalized() {
        let tags = meal_tags(None, false, true);
        let day = vec![tags];
        assert_eq!(score_for_day(day.iter()), 50);
    }
}
