//! Stateless goal computation.

use log::debug;

use super::goals_model::{DailyGoal, GoalProgress, Objective};
use crate::readings::NutrientTotals;

/// Per-objective multipliers (grams per kg of body weight) and the fixed
/// vegetable target.
struct GoalFactors {
    protein_per_kg: f64,
    carbohydrate_per_kg: f64,
    vegetable_g: i64,
}

fn factors(objective: Objective) -> GoalFactors {
    match objective {
        Objective::Gain => GoalFactors {
            protein_per_kg: 2.0,
            carbohydrate_per_kg: 4.0,
            vegetable_g: 80,
        },
        Objective::Lose => GoalFactors {
            protein_per_kg: 1.8,
            carbohydrate_per_kg: 2.2,
            vegetable_g: 130,
        },
        Objective::Maintain => GoalFactors {
            protein_per_kg: 1.6,
            carbohydrate_per_kg: 3.0,
            vegetable_g: 100,
        },
    }
}

fn scaled_grams(factor: f64, weight_kg: f64) -> i64 {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return 0;
    }
    (factor * weight_kg).trunc() as i64
}

/// Daily nutrient goal for a body weight and objective.
///
/// Gram values are truncated toward zero. A non-positive or non-finite
/// weight yields zero for the weight-scaled targets.
pub fn daily_goal(weight_kg: f64, objective: Objective) -> DailyGoal {
    let f = factors(objective);
    DailyGoal {
        protein_g: scaled_grams(f.protein_per_kg, weight_kg),
        carbohydrate_g: scaled_grams(f.carbohydrate_per_kg, weight_kg),
        vegetable_g: f.vegetable_g,
    }
}

/// Ratio of `actual` to `goal`, clamped to `[0, 1]`.
///
/// A goal of zero or less returns 0 instead of dividing.
pub fn progress(actual: f64, goal: f64) -> f64 {
    if goal <= 0.0 || goal.is_nan() {
        debug!("Goal {} is not positive, reporting zero progress", goal);
        return 0.0;
    }
    let ratio = actual / goal;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Progress of each compartment's total against its goal.
pub fn progress_against(totals: &NutrientTotals, goal: &DailyGoal) -> GoalProgress {
    GoalProgress {
        protein: progress(totals.protein, goal.protein_g as f64),
        carbohydrate: progress(totals.carbohydrate, goal.carbohydrate_g as f64),
        vegetable: progress(totals.vegetable, goal.vegetable_g as f64),
    }
}
