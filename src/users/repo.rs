use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::targets::NutritionTargets;

#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub health_goal: Option<String>,
    pub target_calories: Option<i32>,
    pub target_protein_g: Option<i32>,
    pub target_carb_g: Option<i32>,
    pub target_fat_g: Option<i32>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const PROFILE_COLUMNS: &str = "id, gender, birth_year, height_cm, weight_kg, activity_level, \
     health_goal, target_calories, target_protein_g, target_carb_g, target_fat_g, \
     created_at, updated_at";

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
    let row = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert or update a profile together with its derived targets, in one
/// atomic statement.
#[allow(clippy::too_many_arguments)]
pub async fn upsert(
    db: &PgPool,
    id: Uuid,
    gender: Option<&str>,
    birth_year: Option<i32>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<&str>,
    health_goal: Option<&str>,
    targets: &NutritionTargets,
) -> anyhow::Result<UserProfile> {
    let row = sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        INSERT INTO users
            (id, gender, birth_year, height_cm, weight_kg, activity_level, health_goal,
             target_calories, target_protein_g, target_carb_g, target_fat_g)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            gender = EXCLUDED.gender,
            birth_year = EXCLUDED.birth_year,
            height_cm = EXCLUDED.height_cm,
            weight_kg = EXCLUDED.weight_kg,
            activity_level = EXCLUDED.activity_level,
            health_goal = EXCLUDED.health_goal,
            target_calories = EXCLUDED.target_calories,
            target_protein_g = EXCLUDED.target_protein_g,
            target_carb_g = EXCLUDED.target_carb_g,
            target_fat_g = EXCLUDED.target_fat_g,
            updated_at = now()
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(gender)
    .bind(birth_year)
    .bind(height_cm)
    .bind(weight_kg)
    .bind(activity_level)
    .bind(health_goal)
    .bind(targets.target_calories)
    .bind(targets.target_protein_g)
    .bind(targets.target_carb_g)
    .bind(targets.target_fat_g)
    .fetch_one(db)
    .await?;
    Ok(row)
}
