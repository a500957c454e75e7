use serde::Serialize;
use time::OffsetDateTime;

// Harris-Benedict activity factors.
const ACTIVITY_SEDENTARY: f64 = 1.2;
const ACTIVITY_LIGHT: f64 = 1.375;
const ACTIVITY_MODERATE: f64 = 1.55;
const ACTIVITY_ACTIVE: f64 = 1.725;
const ACTIVITY_VERY_ACTIVE: f64 = 1.9;

// Daily calorie adjustment per health goal.
const CALORIE_DEFICIT_FOR_WEIGHT_LOSS: f64 = 500.0;
const CALORIE_SURPLUS_FOR_WEIGHT_GAIN: f64 = 300.0;

const CALORIES_PER_GRAM_PROTEIN: f64 = 4.0;
const CALORIES_PER_GRAM_CARB: f64 = 4.0;
const CALORIES_PER_GRAM_FAT: f64 = 9.0;

// Macro split per goal: (protein, carb, fat) shares of target calories.
const MACRO_RATIO_BALANCED: (f64, f64, f64) = (0.25, 0.50, 0.25);
const MACRO_RATIO_WEIGHT_LOSS: (f64, f64, f64) = (0.30, 0.40, 0.30);
const MACRO_RATIO_WEIGHT_GAIN: (f64, f64, f64) = (0.25, 0.55, 0.20);
const MACRO_RATIO_BLOOD_SUGAR: (f64, f64, f64) = (0.30, 0.35, 0.35);

// Safety floors.
const MIN_CALORIES_MALE: i32 = 1500;
const MIN_CALORIES_FEMALE: i32 = 1200;

/// Daily intake targets derived from a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionTargets {
    pub target_calories: i32,
    pub target_protein_g: i32,
    pub target_carb_g: i32,
    pub target_fat_g: i32,
    /// Basal metabolic rate, kept for debugging the derivation.
    pub bmr: f64,
    /// Total daily energy expenditure before goal adjustment.
    pub tdee: f64,
}

impl NutritionTargets {
    /// Fallback when the profile is incomplete or implausible.
    fn default_targets() -> Self {
        Self {
            target_calories: 2000,
            target_protein_g: 60,
            target_carb_g: 250,
            target_fat_g: 65,
            bmr: 0.0,
            tdee: 0.0,
        }
    }
}

/// Derive daily nutrition targets: Mifflin-St Jeor BMR, activity-scaled
/// TDEE, goal-adjusted calories with a safety floor, then a per-goal macro
/// split. Total over its inputs: anything missing or implausible yields the
/// default targets.
pub fn calculate(
    gender: Option<&str>,
    birth_year: Option<i32>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<&str>,
    health_goal: Option<&str>,
) -> NutritionTargets {
    let (Some(gender), Some(birth_year), Some(height_cm), Some(weight_kg), Some(activity), Some(goal)) =
        (gender, birth_year, height_cm, weight_kg, activity_level, health_goal)
    else {
        tracing::warn!("incomplete profile, falling back to default nutrition targets");
        return NutritionTargets::default_targets();
    };

    let age = OffsetDateTime::now_utc().year() - birth_year;
    if !(0..=150).contains(&age) {
        tracing::warn!(age, "implausible age, falling back to default nutrition targets");
        return NutritionTargets::default_targets();
    }

    let bmr = bmr(gender, age, height_cm, weight_kg);
    let tdee = bmr * activity_factor(activity);
    let target_calories = adjust_for_goal(tdee, goal, gender);

    let (protein_share, carb_share, fat_share) = macro_ratios(goal);
    let calories = f64::from(target_calories);
    let target_protein_g = (calories * protein_share / CALORIES_PER_GRAM_PROTEIN).round() as i32;
    let target_carb_g = (calories * carb_share / CALORIES_PER_GRAM_CARB).round() as i32;
    let target_fat_g = (calories * fat_share / CALORIES_PER_GRAM_FAT).round() as i32;

    tracing::debug!(
        target_calories,
        target_protein_g,
        target_carb_g,
        target_fat_g,
        "nutrition targets derived"
    );

    NutritionTargets {
        target_calories,
        target_protein_g,
        target_carb_g,
        target_fat_g,
        bmr,
        tdee,
    }
}

/// Mifflin-St Jeor: 10*kg + 6.25*cm - 5*age, +5 for male, -161 for female.
/// Other genders use the midpoint of the two offsets.
fn bmr(gender: &str, age: i32, height_cm: f64, weight_kg: f64) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    if gender.eq_ignore_ascii_case("male") {
        base + 5.0
    } else if gender.eq_ignore_ascii_case("female") {
        base - 161.0
    } else {
        base - 78.0
    }
}

fn activity_factor(level: &str) -> f64 {
    match level.to_ascii_lowercase().as_str() {
        "sedentary" => ACTIVITY_SEDENTARY,
        "light" => ACTIVITY_LIGHT,
        "moderate" => ACTIVITY_MODERATE,
        "active" => ACTIVITY_ACTIVE,
        "veryactive" => ACTIVITY_VERY_ACTIVE,
        _ => ACTIVITY_MODERATE,
    }
}

fn adjust_for_goal(tdee: f64, goal: &str, gender: &str) -> i32 {
    let adjusted = match goal.to_ascii_lowercase().as_str() {
        "loseweight" => (tdee - CALORIE_DEFICIT_FOR_WEIGHT_LOSS).round() as i32,
        "gainweight" => (tdee + CALORIE_SURPLUS_FOR_WEIGHT_GAIN).round() as i32,
        // maintain / improveHealth / controlBloodSugar hold at TDEE
        _ => tdee.round() as i32,
    };

    let floor = if gender.eq_ignore_ascii_case("female") {
        MIN_CALORIES_FEMALE
    } else {
        MIN_CALORIES_MALE
    };
    if adjusted < floor {
        tracing::warn!(adjusted, floor, "calorie target below safety floor, clamping");
        floor
    } else {
        adjusted
    }
}

fn macro_ratios(goal: &str) -> (f64, f64, f64) {
    match goal.to_ascii_lowercase().as_str() {
        "loseweight" => MACRO_RATIO_WEIGHT_LOSS,
        "gainweight" => MACRO_RATIO_WEIGHT_GAIN,
        "controlbloodsugar" => MACRO_RATIO_BLOOD_SUGAR,
        _ => MACRO_RATIO_BALANCED,
    }
}
