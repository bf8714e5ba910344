//! Task scheduling and aggregation.
//!
//! Reads tasks by date, summarizes months, lists what is coming up, and applies the
//! only mutations tasks ever see: status transitions.
//!
//! A task's lifecycle is:
//!
//! ```text
//! scheduled --+--> completed
//!             +--> cancelled
//!             +--> overdue --+--> completed
//!                            +--> cancelled
//! ```
//!
//! `overdue` is derived from the date. [`sweep_overdue`] persists it, and
//! [`monthly_stats`] also counts scheduled tasks whose date has passed, so the figure
//! is right whether or not a sweep has run.

use crate::{
    core::{page_size, plant::get_plant},
    entities::{
        Plant, PlantModel, Task, TaskColumn, TaskModel, TaskStatus, TaskType, task,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use sea_orm::{
    Order, QueryOrder, QuerySelect, Select, Set, prelude::*,
    sea_query::{Expr, NullOrdering},
};
use serde::Serialize;
use tracing::{debug, info};

/// Monthly task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Tasks dated in the month, any status
    pub total: u64,
    /// Tasks completed
    pub completed: u64,
    /// Tasks overdue, stored or derived
    pub overdue: u64,
    /// Watering tasks
    pub watering: u64,
    /// Health-check tasks
    pub health_check: u64,
    /// Fertilizing tasks
    pub fertilizing: u64,
}

/// An upcoming task with its plant's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingTask {
    /// The task
    #[serde(flatten)]
    pub task: TaskModel,
    /// Name of the plant the task belongs to
    pub plant_name: String,
}

/// First and last day of a calendar month.
///
/// # Errors
/// [`Error::Validation`] when `month` is not 1-12 or the year is out of range.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("Invalid month {year}-{month}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::validation(format!("Invalid month {year}-{month}")))?;
    Ok((first, last))
}

/// Orders by date, then time with "any time" first, then id for stability.
pub(crate) fn chronological(select: Select<Task>) -> Select<Task> {
    select
        .order_by_asc(TaskColumn::ScheduledDate)
        .order_by_with_nulls(TaskColumn::ScheduledTime, Order::Asc, NullOrdering::First)
        .order_by_asc(TaskColumn::Id)
}

/// Lists a user's tasks dated between `start` and `end` inclusive.
pub async fn list_tasks_in_range(
    db: &DatabaseConnection,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TaskModel>> {
    if start > end {
        return Err(Error::validation(format!(
            "Range start {start} is after range end {end}"
        )));
    }

    debug!(user_id, %start, %end, "Listing tasks in range");
    chronological(
        Task::find()
            .filter(TaskColumn::UserId.eq(user_id))
            .filter(TaskColumn::ScheduledDate.between(start, end)),
    )
    .all(db)
    .await
    .map_err(Into::into)
}

/// Counts a set of tasks. Scheduled tasks dated before `today` count as overdue.
#[must_use]
pub fn summarize(tasks: &[TaskModel], today: NaiveDate) -> TaskStats {
    tasks.iter().fold(TaskStats::default(), |mut stats, task| {
        stats.total += 1;
        match task.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::Overdue => stats.overdue += 1,
            TaskStatus::Scheduled if task.scheduled_date < today => stats.overdue += 1,
            TaskStatus::Scheduled | TaskStatus::Cancelled => {}
        }
        match task.task_type {
            TaskType::Watering => stats.watering += 1,
            TaskType::HealthCheck => stats.health_check += 1,
            TaskType::Fertilizing => stats.fertilizing += 1,
            TaskType::Rotate | TaskType::Repot => {}
        }
        stats
    })
}

/// Summarizes the tasks dated in one calendar month.
///
/// Uses the same window as `list_tasks_in_range(first_day, last_day)`, so `total`
/// always equals the length of that list.
pub async fn monthly_stats(
    db: &DatabaseConnection,
    user_id: &str,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<TaskStats> {
    let (first, last) = month_bounds(year, month)?;
    let tasks = list_tasks_in_range(db, user_id, first, last).await?;
    Ok(summarize(&tasks, today))
}

/// Lists scheduled tasks dated today or later, soonest first, with plant names.
///
/// # Errors
/// [`Error::Validation`] when `limit` is above [`crate::core::MAX_PAGE_SIZE`].
pub async fn upcoming_tasks(
    db: &DatabaseConnection,
    user_id: &str,
    today: NaiveDate,
    limit: u64,
) -> Result<Vec<UpcomingTask>> {
    let limit = page_size(limit)?;
    let rows: Vec<(TaskModel, Option<PlantModel>)> = chronological(
        Task::find()
            .filter(TaskColumn::UserId.eq(user_id))
            .filter(TaskColumn::Status.eq(TaskStatus::Scheduled))
            .filter(TaskColumn::ScheduledDate.gte(today)),
    )
    .limit(limit)
    .find_also_related(Plant)
    .all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(task, plant)| UpcomingTask {
            task,
            plant_name: plant.map(|p| p.name).unwrap_or_default(),
        })
        .collect())
}

/// Completes or cancels an owned task.
///
/// Setting the status a task already has is a no-op that returns the task unchanged,
/// so repeating a completion keeps the original `completed_at`.
///
/// # Errors
/// * [`Error::Validation`] if `status` is neither completed nor cancelled
/// * [`Error::NotFound`] if the task is missing or owned by someone else
/// * [`Error::InvalidTransition`] if the task is already completed or cancelled
pub async fn set_task_status(
    db: &DatabaseConnection,
    task_id: i64,
    user_id: &str,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> Result<TaskModel> {
    if !matches!(status, TaskStatus::Completed | TaskStatus::Cancelled) {
        return Err(Error::validation(format!(
            "Tasks can only be marked completed or cancelled, not {status}"
        )));
    }

    let existing = Task::find_by_id(task_id)
        .filter(TaskColumn::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("task", task_id))?;

    if existing.status == status {
        debug!(task_id, %status, "Task already in requested status");
        return Ok(existing);
    }
    if !existing.status.is_open() {
        return Err(Error::InvalidTransition {
            from: existing.status,
            to: status,
        });
    }

    let from = existing.status;
    let mut active: task::ActiveModel = existing.into();
    active.status = Set(status);
    active.completed_at = Set((status == TaskStatus::Completed).then_some(now));
    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    info!(task_id, user_id, %from, to = %status, "Task status changed");
    Ok(updated)
}

/// Marks a user's scheduled tasks dated before `today` as overdue.
///
/// Returns how many tasks changed.
pub async fn sweep_overdue(db: &DatabaseConnection, user_id: &str, today: NaiveDate) -> Result<u64> {
    let result = Task::update_many()
        .col_expr(TaskColumn::Status, Expr::value(TaskStatus::Overdue.as_str()))
        .col_expr(TaskColumn::UpdatedAt, Expr::value(Utc::now()))
        .filter(TaskColumn::UserId.eq(user_id))
        .filter(TaskColumn::Status.eq(TaskStatus::Scheduled))
        .filter(TaskColumn::ScheduledDate.lt(today))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(user_id, count = result.rows_affected, "Marked tasks overdue");
    }
    Ok(result.rows_affected)
}

/// Lists all tasks of an owned plant, earliest first.
pub async fn tasks_for_plant(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
) -> Result<Vec<TaskModel>> {
    let plant = get_plant(db, plant_id, user_id).await?;
    chronological(Task::find().filter(TaskColumn::PlantId.eq(plant.id)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Year and month of a date, for callers that default to "this month".
#[must_use]
pub fn year_month(day: NaiveDate) -> (i32, u32) {
    (day.year(), day.month())
}
