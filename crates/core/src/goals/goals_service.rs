use log::{debug, info};
use std::sync::Arc;

use super::goals_engine::daily_goal;
use super::goals_model::{CachedGoal, DailyGoal, Objective};
use crate::constants::{
    carbohydrate_goal_key, objective_key, protein_goal_key, vegetable_goal_key,
    DEFAULT_CARBOHYDRATE_GOAL_G, DEFAULT_PROTEIN_GOAL_G, DEFAULT_VEGETABLE_GOAL_G,
};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::preferences::{PreferenceStore, PreferenceStoreExt};

/// Per-user goal cache on top of the stateless engine.
pub struct GoalService {
    preferences: Arc<dyn PreferenceStore>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl GoalService {
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            preferences,
            event_sink,
        }
    }

    /// Cached objective and goal for `user_id`, falling back to the
    /// defaults shown before any goal was computed.
    pub fn load(&self, user_id: i64) -> Result<CachedGoal> {
        let objective = Objective::parse(
            &self
                .preferences
                .get_or(&objective_key(user_id), Objective::Maintain.as_key())?,
        );
        let goal = DailyGoal {
            protein_g: self
                .preferences
                .get_i64_or(&protein_goal_key(user_id), DEFAULT_PROTEIN_GOAL_G)?,
            carbohydrate_g: self
                .preferences
                .get_i64_or(&carbohydrate_goal_key(user_id), DEFAULT_CARBOHYDRATE_GOAL_G)?,
            vegetable_g: self
                .preferences
                .get_i64_or(&vegetable_goal_key(user_id), DEFAULT_VEGETABLE_GOAL_G)?,
        };
        Ok(CachedGoal { objective, goal })
    }

    /// Store a new objective. Cached gram targets are left alone until the
    /// next [`GoalService::recompute`].
    pub fn set_objective(&self, user_id: i64, objective: Objective) -> Result<()> {
        debug!("Setting objective for user {} to {:?}", user_id, objective);
        self.preferences
            .set(&objective_key(user_id), objective.as_key())
    }

    /// Compute the goal for `weight_kg` with the cached objective and persist
    /// all four cache keys.
    pub fn recompute(&self, user_id: i64, weight_kg: f64) -> Result<DailyGoal> {
        let objective = self.load(user_id)?.objective;
        let goal = daily_goal(weight_kg, objective);

        self.preferences
            .set_i64(&protein_goal_key(user_id), goal.protein_g)?;
        self.preferences
            .set_i64(&carbohydrate_goal_key(user_id), goal.carbohydrate_g)?;
        self.preferences
            .set_i64(&vegetable_goal_key(user_id), goal.vegetable_g)?;
        self.preferences
            .set(&objective_key(user_id), objective.as_key())?;

        info!(
            "Recomputed daily goal for user {} ({:?}, {} kg): {:?}",
            user_id, objective, weight_kg, goal
        );
        self.event_sink.emit(DomainEvent::GoalRecomputed {
            user_id,
            objective,
            goal,
        });
        Ok(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockDomainEventSink;
    use crate::preferences::InMemoryPreferenceStore;

    fn service() -> (GoalService, Arc<InMemoryPreferenceStore>, MockDomainEventSink) {
        let prefs = Arc::new(InMemoryPreferenceStore::new());
        let sink = MockDomainEventSink::new();
        let service = GoalService::new(prefs.clone(), Arc::new(sink.clone()));
        (service, prefs, sink)
    }

    #[test]
    fn test_defaults_before_any_computation() {
        let (service, _, _) = service();
        let cached = service.load(7).unwrap();
        assert_eq!(cached.objective, Objective::Maintain);
        assert_eq!(
            cached.goal,
            DailyGoal {
                protein_g: 1000,
                carbohydrate_g: 1800,
                vegetable_g: 500
            }
        );
    }

    #[test]
    fn test_recompute_uses_cached_objective_and_persists() {
        let (service, prefs, sink) = service();
        service.set_objective(7, Objective::Gain).unwrap();

        let goal = service.recompute(7, 80.0).unwrap();
        assert_eq!(
            goal,
            DailyGoal {
                protein_g: 160,
                carbohydrate_g: 320,
                vegetable_g: 80
            }
        );

        assert_eq!(prefs.get("objetivo_7").unwrap().as_deref(), Some("subir"));
        assert_eq!(prefs.get("meta_prote_7").unwrap().as_deref(), Some("160"));
        assert_eq!(prefs.get("meta_carbo_7").unwrap().as_deref(), Some("320"));
        assert_eq!(prefs.get("meta_vegetal_7").unwrap().as_deref(), Some("80"));

        let cached = service.load(7).unwrap();
        assert_eq!(cached.objective, Objective::Gain);
        assert_eq!(cached.goal, goal);

        assert_eq!(
            sink.events(),
            vec![DomainEvent::GoalRecomputed {
                user_id: 7,
                objective: Objective::Gain,
                goal
            }]
        );
    }

    #[test]
    fn test_cache_is_keyed_per_user() {
        let (service, _, _) = service();
        service.set_objective(7, Objective::Lose).unwrap();
        service.recompute(7, 70.0).unwrap();

        let other = service.load(8).unwrap();
        assert_eq!(other.objective, Objective::Maintain);
        assert_eq!(other.goal.protein_g, 1000);
    }
}
