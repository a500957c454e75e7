use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::tags::NutrientSnapshot;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub source_type: String,
    pub note: Option<String>,
    /// Analyzer verdict: was the meal nutritionally balanced.
    pub is_balanced: Option<bool>,
    /// Analyzer verdict: LOW / MEDIUM / HIGH.
    pub risk_level: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct MealNutritionRow {
    pub meal_id: Uuid,
    pub energy_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sat_fat_g: Option<f64>,
    pub created_at: OffsetDateTime,
}

impl MealNutritionRow {
    pub fn snapshot(&self) -> NutrientSnapshot {
        NutrientSnapshot {
            energy_kcal: self.energy_kcal,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carb_g: self.carb_g,
            fiber_g: self.fiber_g,
            sodium_mg: self.sodium_mg,
            sugar_g: self.sugar_g,
            sat_fat_g: self.sat_fat_g,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_meal(
    db: &PgPool,
    user_id: Uuid,
    eaten_at: OffsetDateTime,
    source_type: &str,
    note: Option<&str>,
    is_balanced: Option<bool>,
    risk_level: Option<&str>,
) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        r#"
        INSERT INTO meals (id, user_id, eaten_at, source_type, note, is_balanced, risk_level)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, eaten_at, source_type, note, is_balanced, risk_level, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(eaten_at)
    .bind(source_type)
    .bind(note)
    .bind(is_balanced)
    .bind(risk_level)
    .fetch_one(db)
    .await?;
    Ok(meal)
}

pub async fn insert_nutrition(
    db: &PgPool,
    meal_id: Uuid,
    n: &NutrientSnapshot,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meal_nutrition
            (meal_id, energy_kcal, protein_g, fat_g, carb_g, fiber_g, sodium_mg, sugar_g, sat_fat_g)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(meal_id)
    .bind(n.energy_kcal)
    .bind(n.protein_g)
    .bind(n.fat_g)
    .bind(n.carb_g)
    .bind(n.fiber_g)
    .bind(n.sodium_mg)
    .bind(n.sugar_g)
    .bind(n.sat_fat_g)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, user_id, eaten_at, source_type, note, is_balanced, risk_level, created_at
        FROM meals
        WHERE user_id = $1
        ORDER BY eaten_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_with_nutrition(
    db: &PgPool,
    meal_id: Uuid,
) -> anyhow::Result<Option<(Meal, Option<MealNutritionRow>)>> {
    let Some(meal) = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, user_id, eaten_at, source_type, note, is_balanced, risk_level, created_at
        FROM meals
        WHERE id = $1
        "#,
    )
    .bind(meal_id)
    .fetch_optional(db)
    .await?
    else {
        return Ok(None);
    };

    let nutrition = sqlx::query_as::<_, MealNutritionRow>(
        r#"
        SELECT meal_id, energy_kcal, protein_g, fat_g, carb_g, fiber_g,
               sodium_mg, sugar_g, sat_fat_g, created_at
        FROM meal_nutrition
        WHERE meal_id = $1
        "#,
    )
    .bind(meal_id)
    .fetch_optional(db)
    .await?;

    Ok(Some((meal, nutrition)))
}

/// Flattened meal + nutrition row for the daily stress-score fold.
#[derive(Debug, Clone, FromRow)]
pub struct DayMealRow {
    pub eaten_at: OffsetDateTime,
    pub is_balanced: Option<bool>,
    pub risk_level: Option<String>,
    /// NULL when the meal has no nutrition row at all.
    pub nutrition_meal_id: Option<Uuid>,
    pub energy_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sat_fat_g: Option<f64>,
}

impl DayMealRow {
    /// The nutrient snapshot, when the meal has one; a meal without a
    /// nutrition row classifies from its flags only.
    pub fn snapshot(&self) -> Option<NutrientSnapshot> {
        self.nutrition_meal_id?;
        Some(NutrientSnapshot {
            energy_kcal: self.energy_kcal,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carb_g: self.carb_g,
            fiber_g: self.fiber_g,
            sodium_mg: self.sodium_mg,
            sugar_g: self.sugar_g,
            sat_fat_g: self.sat_fat_g,
        })
    }
}

/// One day's summed calorie intake. Days without meals produce no row.
#[derive(Debug, Clone, FromRow)]
pub struct DayCaloriesRow {
    pub day: Date,
    pub calories: f64,
}

/// Per-day calorie totals over an inclusive date range (UTC days). Meals
/// without a nutrition row count as zero calories.
pub async fn daily_calories(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<DayCaloriesRow>> {
    let range_start = start.midnight().assume_utc();
    let range_end = (end + time::Duration::days(1)).midnight().assume_utc();

    let rows = sqlx::query_as::<_, DayCaloriesRow>(
        r#"
        SELECT (m.eaten_at AT TIME ZONE 'UTC')::date AS day,
               COALESCE(SUM(n.energy_kcal), 0)::double precision AS calories
        FROM meals m
        LEFT JOIN meal_nutrition n ON n.meal_id = m.id
        WHERE m.user_id = $1 AND m.eaten_at >= $2 AND m.eaten_at < $3
        GROUP BY day
        ORDER BY day ASC
        "#,
    )
    .bind(user_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// All of a user's meals for one calendar day (UTC), ascending by eaten
/// time -- the order the stress fold requires.
pub async fn list_for_day(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<Vec<DayMealRow>> {
    let start = date.midnight().assume_utc();
    let end = start + time::Duration::days(1);

    let rows = sqlx::query_as::<_, DayMealRow>(
        r#"
        SELECT m.eaten_at, m.is_balanced, m.risk_level,
               n.meal_id AS nutrition_meal_id,
               n.energy_kcal, n.protein_g, n.fat_g, n.carb_g, n.fiber_g,
               n.sodium_mg, n.sugar_g, n.sat_fat_g
        FROM meals m
        LEFT JOIN meal_nutrition n ON n.meal_id = m.id
        WHERE m.user_id = $1 AND m.eaten_at >= $2 AND m.eaten_at < $3
        ORDER BY m.eaten_at ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
