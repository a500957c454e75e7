use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Per-meal nutrient snapshot produced by the external food analyzer.
///
/// Units are fixed at the boundary: kcal for energy, mg for sodium, grams
/// for everything else. Missing fields are treated as 0.0 when banding,
/// which conflates "no data" with "zero consumption" -- kept for
/// compatibility with the upstream analyzer contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientSnapshot {
    pub energy_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sat_fat_g: Option<f64>,
}

impl NutrientSnapshot {
    fn energy(&self) -> f64 {
        self.energy_kcal.unwrap_or(0.0)
    }
    fn protein(&self) -> f64 {
        self.protein_g.unwrap_or(0.0)
    }
    fn fat(&self) -> f64 {
        self.fat_g.unwrap_or(0.0)
    }
    fn fiber(&self) -> f64 {
        self.fiber_g.unwrap_or(0.0)
    }
    fn sodium(&self) -> f64 {
        self.sodium_mg.unwrap_or(0.0)
    }
    fn sugar(&self) -> f64 {
        self.sugar_g.unwrap_or(0.0)
    }
    fn sat_fat(&self) -> f64 {
        self.sat_fat_g.unwrap_or(0.0)
    }
}

/// Threshold family a band tag belongs to. Each family contributes exactly
/// one tag per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagFamily {
    Sodium,
    Sugar,
    SatFat,
    Fiber,
}

/// Severity used by the decision engine to weigh a tag. Band tags carry the
/// severity of their band; a couple of compound tags carry `High` as well
/// (they describe a pronounced dietary signal, not a band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

/// Categorical nutrition labels. The enum names are stable identifiers that
/// may be surfaced to clients, so variants serialize as SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NutritionTag {
    // sodium bands (mg)
    VeryHighSodium,
    HighSodium,
    MediumSodium,
    LowSodium,
    // sugar bands (g)
    VeryHighSugar,
    HighSugar,
    MediumSugar,
    LowSugar,
    // saturated fat bands (g)
    VeryHighSatFat,
    HighSatFat,
    MediumSatFat,
    LowSatFat,
    // fiber bands (g)
    VeryLowFiber,
    LowFiber,
    MediumFiber,
    HighFiber,
    // compound protective tags
    HighFiberMeal,
    VegetableRich,
    LeanProtein,
    BalancedMeal,
    // compound risk tags (food-type tags are reserved for a future
    // classifier pass; only GENERIC_HIGH_RISK is emitted today)
    HighEnergyDense,
    ProcessedMeat,
    DeepFried,
    SugaryDrink,
    GenericHighRisk,
}

impl NutritionTag {
    /// Band family, or `None` for compound tags.
    pub fn family(self) -> Option<TagFamily> {
        use NutritionTag::*;
        match self {
            VeryHighSodium | HighSodium | MediumSodium | LowSodium => Some(TagFamily::Sodium),
            VeryHighSugar | HighSugar | MediumSugar | LowSugar => Some(TagFamily::Sugar),
            VeryHighSatFat | HighSatFat | MediumSatFat | LowSatFat => Some(TagFamily::SatFat),
            VeryLowFiber | LowFiber | MediumFiber | HighFiber => Some(TagFamily::Fiber),
            _ => None,
        }
    }

    /// Decision weight. `None` means the tag does not participate in the
    /// high/very-high classification at all.
    pub fn severity(self) -> Option<Severity> {
        use NutritionTag::*;
        match self {
            VeryHighSodium | VeryHighSugar | VeryHighSatFat => Some(Severity::VeryHigh),
            HighSodium | HighSugar | HighSatFat | HighFiber | HighFiberMeal | HighEnergyDense => {
                Some(Severity::High)
            }
            MediumSodium | MediumSugar | MediumSatFat | MediumFiber => Some(Severity::Medium),
            LowSodium | LowSugar | LowSatFat | LowFiber => Some(Severity::Low),
            VeryLowFiber => Some(Severity::VeryLow),
            VegetableRich | LeanProtein | BalancedMeal | ProcessedMeat | DeepFried
            | SugaryDrink | GenericHighRisk => None,
        }
    }
}

/// Ratios of a single meal against daily guideline amounts, for client-side
/// progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuidelineRatios {
    pub sodium_ratio: f64,
    pub sugar_ratio: f64,
    pub sat_fat_ratio: f64,
    pub fiber_ratio: f64,
}

// WHO / national dietary guideline reference amounts.
pub const SODIUM_DAILY_LIMIT_MG: f64 = 2000.0;
pub const SUGAR_DAILY_LIMIT_G: f64 = 50.0;
pub const SAT_FAT_DAILY_LIMIT_G: f64 = 20.0;
pub const FIBER_DAILY_MIN_G: f64 = 25.0;

pub fn guideline_ratios(n: &NutrientSnapshot) -> GuidelineRatios {
    GuidelineRatios {
        sodium_ratio: n.sodium() / SODIUM_DAILY_LIMIT_MG,
        sugar_ratio: n.sugar() / SUGAR_DAILY_LIMIT_G,
        sat_fat_ratio: n.sat_fat() / SAT_FAT_DAILY_LIMIT_G,
        fiber_ratio: n.fiber() / FIBER_DAILY_MIN_G,
    }
}

/// Classify a nutrient snapshot into its tag set: exactly one tag per band
/// family (bands are closed on the lower bound, first match wins) plus any
/// compound protective tags the raw values support.
pub fn snapshot_tags(n: &NutrientSnapshot) -> HashSet<NutritionTag> {
    let mut tags = HashSet::new();

    let sodium = n.sodium();
    tags.insert(if sodium >= 2000.0 {
        NutritionTag::VeryHighSodium
    } else if sodium >= 1000.0 {
        NutritionTag::HighSodium
    } else if sodium >= 600.0 {
        NutritionTag::MediumSodium
    } else {
        NutritionTag::LowSodium
    });

    let sugar = n.sugar();
    tags.insert(if sugar >= 40.0 {
        NutritionTag::VeryHighSugar
    } else if sugar >= 25.0 {
        NutritionTag::HighSugar
    } else if sugar >= 12.0 {
        NutritionTag::MediumSugar
    } else {
        NutritionTag::LowSugar
    });

    let sat_fat = n.sat_fat();
    tags.insert(if sat_fat >= 20.0 {
        NutritionTag::VeryHighSatFat
    } else if sat_fat >= 10.0 {
        NutritionTag::HighSatFat
    } else if sat_fat >= 5.0 {
        NutritionTag::MediumSatFat
    } else {
        NutritionTag::LowSatFat
    });

    let fiber = n.fiber();
    tags.insert(if fiber < 4.0 {
        NutritionTag::VeryLowFiber
    } else if fiber < 8.0 {
        NutritionTag::LowFiber
    } else if fiber < 12.0 {
        NutritionTag::MediumFiber
    } else {
        NutritionTag::HighFiber
    });

    if fiber > 10.0 {
        tags.insert(NutritionTag::HighFiberMeal);
    }
    if fiber > 8.0 && n.energy() < 400.0 {
        tags.insert(NutritionTag::VegetableRich);
    }
    if n.protein() > 20.0 && n.fat() < 10.0 {
        tags.insert(NutritionTag::LeanProtein);
    }
    if n.protein() > 15.0 && fiber > 5.0 && n.fat() < 20.0 {
        tags.insert(NutritionTag::BalancedMeal);
    }

    tags
}

/// Classify at the meal-record level. On top of the snapshot tags (when a
/// snapshot exists at all), the analyzer's own verdicts contribute: a
/// balanced-meal verdict adds BALANCED_MEAL, a HIGH risk verdict adds
/// GENERIC_HIGH_RISK. A record with no snapshot can still be classified
/// from the flags alone.
pub fn meal_tags(
    nutrition: Option<&NutrientSnapshot>,
    ai_balanced: bool,
    high_risk: bool,
) -> HashSet<NutritionTag> {
    let mut tags = nutrition.map(snapshot_tags).unwrap_or_default();
    if ai_balanced {
        tags.insert(NutritionTag::BalancedMeal);
    }
    if high_risk {
        tags.insert(NutritionTag::GenericHighRisk);
    }
    tags
}
