//! Task, calendar and stats endpoints.

use super::{
    AppState, CurrentUser,
    extract::{JsonBody, PathParam, QueryParams},
};
use crate::{
    core::{
        calendar::{CalendarView, calendar_view},
        scheduler::{self, TaskStats, UpcomingTask, year_month},
    },
    entities::{TaskModel, TaskStatus},
    errors::Result,
};
use axum::{
    Json,
    extract::State,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

/// Default number of upcoming tasks.
pub const DEFAULT_UPCOMING_LIMIT: u64 = 10;

/// Query for `GET /tasks`.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// First day, inclusive
    pub start: NaiveDate,
    /// Last day, inclusive
    pub end: NaiveDate,
}

/// Query for `GET /tasks/upcoming`.
#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    /// Most tasks to return
    pub limit: Option<u64>,
}

/// Month selector; missing parts default to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// Year to show
    pub year: Option<i32>,
    /// Month to show (1-12)
    pub month: Option<u32>,
}

impl MonthQuery {
    fn resolve(&self, today: NaiveDate) -> (i32, u32) {
        let (year, month) = year_month(today);
        (self.year.unwrap_or(year), self.month.unwrap_or(month))
    }
}

/// Body of `PUT /tasks/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    /// Target status
    pub status: TaskStatus,
}

/// `GET /tasks?start=&end=`
pub async fn range(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<RangeQuery>,
) -> Result<Json<Vec<TaskModel>>> {
    Ok(Json(
        scheduler::list_tasks_in_range(&state.db, &user_id, query.start, query.end).await?,
    ))
}

/// `GET /tasks/upcoming?limit=`
pub async fn upcoming(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<UpcomingQuery>,
) -> Result<Json<Vec<UpcomingTask>>> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    Ok(Json(
        scheduler::upcoming_tasks(&state.db, &user_id, state.today(), limit).await?,
    ))
}

/// `GET /plants/:id/tasks`
pub async fn for_plant(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<Json<Vec<TaskModel>>> {
    Ok(Json(
        scheduler::tasks_for_plant(&state.db, plant_id, &user_id).await?,
    ))
}

/// `PUT /tasks/:id/status`
pub async fn set_status(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
    JsonBody(change): JsonBody<StatusChange>,
) -> Result<Json<TaskModel>> {
    Ok(Json(
        scheduler::set_task_status(&state.db, task_id, &user_id, change.status, Utc::now())
            .await?,
    ))
}

/// `GET /calendar?year=&month=`
pub async fn calendar(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<MonthQuery>,
) -> Result<Json<CalendarView>> {
    let today = state.today();
    let (year, month) = query.resolve(today);
    Ok(Json(
        calendar_view(&state.db, &user_id, year, month, today).await?,
    ))
}

/// `GET /stats?year=&month=`
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<MonthQuery>,
) -> Result<Json<TaskStats>> {
    let today = state.today();
    let (year, month) = query.resolve(today);
    Ok(Json(
        scheduler::monthly_stats(&state.db, &user_id, year, month, today).await?,
    ))
}
