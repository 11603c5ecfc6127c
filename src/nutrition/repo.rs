use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
#[cfg(test)]
use time::OffsetDateTime;
#[cfg(test)]
use tokio::sync::RwLock;

use super::balance::select_active_goal;
use super::dto::NutritionGoal;

/// Goal persistence as seen by the services.
#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn insert(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal>;
    /// The subject's most relevant goal (latest start date), if any.
    async fn fetch_active_goal(&self, subject_id: i64) -> anyhow::Result<Option<NutritionGoal>>;
    async fn update(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal>;
}

const GOAL_COLUMNS: &str = "id, subject_id, calorie_target, protein_target, carb_target, \
     fat_target, fiber_target, water_target, target_weight, start_date, end_date, \
     objective_date, active, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct PgGoalStore {
    db: PgPool,
}

impl PgGoalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GoalStore for PgGoalStore {
    async fn insert(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal> {
        let sql = format!(
            r#"
            INSERT INTO nutrition_goals
                (id, subject_id, calorie_target, protein_target, carb_target, fat_target,
                 fiber_target, water_target, target_weight, start_date, end_date,
                 objective_date, active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {GOAL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, NutritionGoal>(&sql)
            .bind(goal.id)
            .bind(goal.subject_id)
            .bind(goal.calorie_target)
            .bind(goal.protein_target)
            .bind(goal.carb_target)
            .bind(goal.fat_target)
            .bind(goal.fiber_target)
            .bind(goal.water_target)
            .bind(goal.target_weight)
            .bind(&goal.start_date)
            .bind(&goal.end_date)
            .bind(&goal.objective_date)
            .bind(goal.active)
            .bind(goal.created_by)
            .bind(goal.created_at)
            .bind(goal.updated_at)
            .fetch_one(&self.db)
            .await
            .context("insert nutrition goal")?;
        Ok(row)
    }

    async fn fetch_active_goal(&self, subject_id: i64) -> anyhow::Result<Option<NutritionGoal>> {
        let sql = format!(
            r#"
            SELECT {GOAL_COLUMNS}
              FROM nutrition_goals
             WHERE subject_id = $1
            "#
        );
        let rows = sqlx::query_as::<_, NutritionGoal>(&sql)
            .bind(subject_id)
            .fetch_all(&self.db)
            .await
            .context("fetch nutrition goals")?;
        Ok(select_active_goal(&rows).cloned())
    }

    async fn update(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal> {
        let sql = format!(
            r#"
            UPDATE nutrition_goals
               SET calorie_target = $2, protein_target = $3, carb_target = $4,
                   fat_target = $5, fiber_target = $6, water_target = $7,
                   target_weight = $8, start_date = $9, end_date = $10,
                   objective_date = $11, active = $12, created_by = $13,
                   updated_at = $14
             WHERE id = $1
            RETURNING {GOAL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, NutritionGoal>(&sql)
            .bind(goal.id)
            .bind(goal.calorie_target)
            .bind(goal.protein_target)
            .bind(goal.carb_target)
            .bind(goal.fat_target)
            .bind(goal.fiber_target)
            .bind(goal.water_target)
            .bind(goal.target_weight)
            .bind(&goal.start_date)
            .bind(&goal.end_date)
            .bind(&goal.objective_date)
            .bind(goal.active)
            .bind(goal.created_by)
            .bind(goal.updated_at)
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("update nutrition goal {}", goal.id))?;
        Ok(row)
    }
}

/// Process-local store for tests and `AppState::fake()`.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryGoalStore {
    goals: RwLock<Vec<NutritionGoal>>,
}

#[cfg(test)]
#[async_trait]
impl GoalStore for InMemoryGoalStore {
    async fn insert(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal> {
        self.goals.write().await.push(goal.clone());
        Ok(goal.clone())
    }

    async fn fetch_active_goal(&self, subject_id: i64) -> anyhow::Result<Option<NutritionGoal>> {
        let goals = self.goals.read().await;
        let own = goals.iter().filter(|g| g.subject_id == subject_id);
        Ok(select_active_goal(own).cloned())
    }

    async fn update(&self, goal: &NutritionGoal) -> anyhow::Result<NutritionGoal> {
        let mut goals = self.goals.write().await;
        let slot = goals
            .iter_mut()
            .find(|g| g.id == goal.id)
            .with_context(|| format!("nutrition goal {} vanished", goal.id))?;
        *slot = NutritionGoal {
            updated_at: OffsetDateTime::now_utc().max(goal.updated_at),
            ..goal.clone()
        };
        Ok(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::dto::GoalDraft;

    fn goal(subject: i64, start: &str) -> NutritionGoal {
        NutritionGoal::from_draft(
            subject,
            GoalDraft {
                start_date: Some(start.into()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn in_memory_store_scopes_by_subject() {
        let store = InMemoryGoalStore::default();
        store.insert(&goal(1, "2024-01-01")).await.unwrap();
        let newest = store.insert(&goal(1, "2024-06-01")).await.unwrap();
        store.insert(&goal(2, "2025-01-01")).await.unwrap();

        let active = store.fetch_active_goal(1).await.unwrap().unwrap();
        assert_eq!(active.id, newest.id);
        assert!(store.fetch_active_goal(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn in_memory_update_replaces_by_id() {
        let store = InMemoryGoalStore::default();
        let mut g = store.insert(&goal(1, "2024-01-01")).await.unwrap();
        g.calorie_target = Some(1900.0);
        let updated = store.update(&g).await.unwrap();
        assert_eq!(updated.calorie_target, Some(1900.0));
        let fetched = store.fetch_active_goal(1).await.unwrap().unwrap();
        assert_eq!(fetched.calorie_target, Some(1900.0));
    }

    #[tokio::test]
    async fn in_memory_update_of_unknown_goal_fails() {
        let store = InMemoryGoalStore::default();
        assert!(store.update(&goal(1, "2024-01-01")).await.is_err());
    }
}
