//! Goals module - daily nutrient targets and progress.

mod goals_engine;
mod goals_model;
mod goals_service;

pub use goals_engine::{daily_goal, progress, progress_against};
pub use goals_model::{CachedGoal, DailyGoal, GoalProgress, Objective};
pub use goals_service::GoalService;
