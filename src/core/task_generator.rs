//! Task generation - Seeds the initial care schedule for a new plant.
//!
//! The schedule comes from [`CareSchedule`]: each cadence produces one task per
//! occurrence inside the horizon, counted in days from "today".

use crate::{
    config::settings::{Cadence, CareSchedule},
    entities::{Task, TaskPriority, TaskStatus, TaskType, task},
    errors::Result,
};
use chrono::{Days, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// A task the generator intends to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    /// Kind of care action
    pub task_type: TaskType,
    /// Display title
    pub title: String,
    /// Longer instructions
    pub description: String,
    /// Due day
    pub scheduled_date: NaiveDate,
    /// Urgency
    pub priority: TaskPriority,
}

/// Display title for a generated task.
#[must_use]
pub fn task_title(task_type: TaskType, plant_name: &str) -> String {
    match task_type {
        TaskType::Watering => format!("Water {plant_name}"),
        TaskType::HealthCheck => format!("Health check: {plant_name}"),
        TaskType::Fertilizing => format!("Fertilize {plant_name}"),
        TaskType::Rotate => format!("Rotate {plant_name}"),
        TaskType::Repot => format!("Repot {plant_name}"),
    }
}

fn task_description(cadence: &Cadence) -> String {
    let every = match cadence.interval_days {
        1 => "Repeats daily".to_string(),
        7 => "Repeats weekly".to_string(),
        n => format!("Repeats every {n} days"),
    };
    let what = match cadence.task_type {
        TaskType::Watering => "Check the soil and water if the top layer is dry.",
        TaskType::HealthCheck => "Inspect leaves, stems and soil for pests or discoloration.",
        TaskType::Fertilizing => "Feed with a diluted balanced fertilizer.",
        TaskType::Rotate => "Turn the pot a quarter so all sides get light.",
        TaskType::Repot => "Check whether roots have outgrown the pot.",
    };
    format!("{what} {every}.")
}

/// Expands a schedule into concrete tasks, ordered by date then cadence order.
///
/// An occurrence is included when `first_offset_days + k * interval_days` is strictly
/// below `horizon_days`. Cadences with a zero interval are skipped.
#[must_use]
pub fn plan_tasks(schedule: &CareSchedule, plant_name: &str, today: NaiveDate) -> Vec<PlannedTask> {
    let mut planned = Vec::new();

    for cadence in schedule.cadences.iter().filter(|c| c.interval_days > 0) {
        let title = task_title(cadence.task_type, plant_name);
        let description = task_description(cadence);

        let mut offset = cadence.first_offset_days;
        while offset < schedule.horizon_days {
            let Some(scheduled_date) = today.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            planned.push(PlannedTask {
                task_type: cadence.task_type,
                title: title.clone(),
                description: description.clone(),
                scheduled_date,
                priority: cadence.priority,
            });
            let Some(next) = offset.checked_add(cadence.interval_days) else {
                break;
            };
            offset = next;
        }
    }

    // Stable sort keeps cadence order within a day
    planned.sort_by_key(|t| t.scheduled_date);
    planned
}

/// Inserts the planned tasks for a plant in one transaction.
///
/// Returns how many tasks were created.
pub async fn seed_tasks_for_plant(
    db: &DatabaseConnection,
    schedule: &CareSchedule,
    plant_id: i64,
    user_id: &str,
    plant_name: &str,
    today: NaiveDate,
) -> Result<usize> {
    let planned = plan_tasks(schedule, plant_name, today);
    if planned.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let count = planned.len();
    let models = planned.into_iter().map(|p| task::ActiveModel {
        plant_id: Set(plant_id),
        user_id: Set(user_id.to_string()),
        task_type: Set(p.task_type),
        title: Set(p.title),
        description: Set(Some(p.description)),
        scheduled_date: Set(p.scheduled_date),
        scheduled_time: Set(None),
        priority: Set(p.priority),
        status: Set(TaskStatus::Scheduled),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    });

    let txn = db.begin().await?;
    Task::insert_many(models).exec(&txn).await?;
    txn.commit().await?;

    info!(plant_id, user_id, count, "Seeded care tasks");
    Ok(count)
}

/// Seeds tasks, logging and swallowing any failure.
///
/// Plant creation has already succeeded when this runs and must not be undone because
/// the schedule could not be written.
pub async fn seed_tasks_best_effort(
    db: &DatabaseConnection,
    schedule: &CareSchedule,
    plant_id: i64,
    user_id: &str,
    plant_name: &str,
    today: NaiveDate,
) -> usize {
    match seed_tasks_for_plant(db, schedule, plant_id, user_id, plant_name, today).await {
        Ok(count) => count,
        Err(e) => {
            warn!(plant_id, user_id, error = %e, "Failed to seed care tasks");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::TaskColumn;
    use crate::test_utils::{create_test_plant, date, setup_test_db};
    use sea_orm::QueryOrder;

    #[test]
    fn test_default_plan() {
        let today = date(2025, 1, 30);
        let planned = plan_tasks(&CareSchedule::default(), "Fern", today);

        let watering: Vec<_> = planned
            .iter()
            .filter(|t| t.task_type == TaskType::Watering)
            .map(|t| t.scheduled_date)
            .collect();
        assert_eq!(
            watering,
            vec![date(2025, 1, 30), date(2025, 2, 6), date(2025, 2, 13), date(2025, 2, 20)]
        );

        let checks: Vec<_> = planned
            .iter()
            .filter(|t| t.task_type == TaskType::HealthCheck)
            .map(|t| t.scheduled_date)
            .collect();
        assert_eq!(checks, vec![date(2025, 2, 6), date(2025, 2, 20)]);

        let feeding: Vec<_> = planned
            .iter()
            .filter(|t| t.task_type == TaskType::Fertilizing)
            .collect();
        assert_eq!(feeding.len(), 1);
        assert_eq!(feeding[0].scheduled_date, date(2025, 2, 13));
        assert_eq!(feeding[0].priority, TaskPriority::Low);
        assert_eq!(feeding[0].title, "Fertilize Fern");

        assert_eq!(planned.len(), 7);
        assert_eq!(planned[0].scheduled_date, today);
        assert_eq!(planned[0].title, "Water Fern");
        assert!(planned.windows(2).all(|w| w[0].scheduled_date <= w[1].scheduled_date));
    }

    #[test]
    fn test_custom_plan() {
        let schedule = CareSchedule {
            horizon_days: 10,
            cadences: vec![
                Cadence {
                    task_type: TaskType::Rotate,
                    interval_days: 3,
                    first_offset_days: 1,
                    priority: TaskPriority::High,
                },
                Cadence {
                    task_type: TaskType::Repot,
                    interval_days: 1,
                    first_offset_days: 12,
                    priority: TaskPriority::Low,
                },
                Cadence {
                    task_type: TaskType::Watering,
                    interval_days: 0,
                    first_offset_days: 0,
                    priority: TaskPriority::Normal,
                },
            ],
        };

        let planned = plan_tasks(&schedule, "Ivy", date(2025, 6, 1));
        let dates: Vec<_> = planned.iter().map(|t| t.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 6, 2), date(2025, 6, 5), date(2025, 6, 8)]
        );
        assert!(planned.iter().all(|t| t.task_type == TaskType::Rotate));
        assert_eq!(planned[0].title, "Rotate Ivy");
    }

    #[test]
    fn test_plan_stops_at_u32_limit() {
        let schedule = CareSchedule {
            horizon_days: u32::MAX,
            cadences: vec![Cadence {
                task_type: TaskType::Repot,
                interval_days: u32::MAX - 1,
                first_offset_days: 2,
                priority: TaskPriority::Low,
            }],
        };

        let planned = plan_tasks(&schedule, "Ivy", date(2025, 6, 1));
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].scheduled_date, date(2025, 6, 3));
    }

    #[test]
    fn test_titles() {
        assert_eq!(task_title(TaskType::HealthCheck, "Basil"), "Health check: Basil");
        assert_eq!(task_title(TaskType::Repot, "Basil"), "Repot Basil");
    }

    #[tokio::test]
    async fn test_seed_tasks_for_plant() -> Result<()> {
        let db = setup_test_db().await?;
        let plant = create_test_plant(&db, "alice", "Fern").await?;
        let today = date(2025, 3, 1);

        let count =
            seed_tasks_for_plant(&db, &CareSchedule::default(), plant.id, "alice", "Fern", today)
                .await?;
        assert_eq!(count, 7);

        let tasks = Task::find()
            .filter(TaskColumn::PlantId.eq(plant.id))
            .order_by_asc(TaskColumn::ScheduledDate)
            .all(&db)
            .await?;
        assert_eq!(tasks.len(), 7);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Scheduled));
        assert!(tasks.iter().all(|t| t.completed_at.is_none()));
        assert!(tasks.iter().all(|t| t.scheduled_time.is_none()));
        assert!(tasks.iter().all(|t| t.user_id == "alice"));
        assert_eq!(tasks[0].scheduled_date, today);
        assert_eq!(tasks[0].task_type, TaskType::Watering);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_empty_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        let plant = create_test_plant(&db, "alice", "Fern").await?;
        let schedule = CareSchedule {
            horizon_days: 28,
            cadences: Vec::new(),
        };

        let count =
            seed_tasks_for_plant(&db, &schedule, plant.id, "alice", "Fern", date(2025, 3, 1))
                .await?;
        assert_eq!(count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() -> Result<()> {
        let db = setup_test_db().await?;
        db.execute_unprepared("DROP TABLE tasks").await?;

        let count = seed_tasks_best_effort(
            &db,
            &CareSchedule::default(),
            1,
            "alice",
            "Fern",
            date(2025, 3, 1),
        )
        .await;
        assert_eq!(count, 0);
        Ok(())
    }
}
