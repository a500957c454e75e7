use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::nutrition::targets::NutritionTargets;

use super::repo::UserProfile;

/// Profile fields the client can set. All optional; targets are derived
/// from whatever is present (defaults apply when the profile is too thin).
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// sedentary / light / moderate / active / veryActive
    #[serde(default)]
    pub activity_level: Option<String>,
    /// loseWeight / maintain / gainWeight / improveHealth / controlBloodSugar
    #[serde(default)]
    pub health_goal: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub health_goal: Option<String>,
    pub targets: Option<NutritionTargets>,
}

impl ProfileResponse {
    pub fn from_row(p: UserProfile, targets: Option<NutritionTargets>) -> Self {
        Self {
            id: p.id,
            gender: p.gender,
            birth_year: p.birth_year,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            activity_level: p.activity_level,
            health_goal: p.health_goal,
            targets,
        }
    }
}
