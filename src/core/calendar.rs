//! Calendar view - Six-week month grid with tasks, stats and what's next.

use crate::{
    core::scheduler::{
        TaskStats, UpcomingTask, list_tasks_in_range, monthly_stats, month_bounds, sweep_overdue,
        upcoming_tasks,
    },
    entities::TaskModel,
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of cells in a calendar grid (six full weeks).
pub const GRID_CELLS: u64 = 42;

/// Number of upcoming tasks shown beside the calendar.
pub const UPCOMING_PREVIEW: u64 = 5;

/// One day cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// The cell's date
    pub date: NaiveDate,
    /// Whether the date belongs to the displayed month
    pub in_month: bool,
    /// Whether the date is today
    pub is_today: bool,
    /// Tasks due that day
    pub tasks: Vec<TaskModel>,
}

/// A month laid out as 42 cells starting on a Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGrid {
    /// Displayed year
    pub year: i32,
    /// Displayed month (1-12)
    pub month: u32,
    /// Cells in display order
    pub days: Vec<CalendarDay>,
}

/// Everything the calendar page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    /// The month grid
    pub grid: CalendarGrid,
    /// Counters for the displayed month
    pub stats: TaskStats,
    /// Next scheduled tasks from today
    pub upcoming: Vec<UpcomingTask>,
}

/// First and last date shown for a month: from the Sunday on or before the 1st,
/// 42 days long.
pub fn grid_span(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let (first, _) = month_bounds(year, month)?;
    let lead = u64::from(first.weekday().num_days_from_sunday());

    let start = first
        .checked_sub_days(Days::new(lead))
        .ok_or_else(|| Error::validation(format!("Month {year}-{month} is out of range")))?;
    let end = start
        .checked_add_days(Days::new(GRID_CELLS - 1))
        .ok_or_else(|| Error::validation(format!("Month {year}-{month} is out of range")))?;
    Ok((start, end))
}

/// Lays tasks out on the month grid. Tasks dated outside the span are ignored.
pub fn build_calendar_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    tasks: Vec<TaskModel>,
) -> Result<CalendarGrid> {
    let (start, end) = grid_span(year, month)?;

    let mut by_date: BTreeMap<NaiveDate, Vec<TaskModel>> = BTreeMap::new();
    for task in tasks
        .into_iter()
        .filter(|t| (start..=end).contains(&t.scheduled_date))
    {
        by_date.entry(task.scheduled_date).or_default().push(task);
    }

    let days = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| CalendarDay {
            date,
            in_month: date.year() == year && date.month() == month,
            is_today: date == today,
            tasks: by_date.remove(&date).unwrap_or_default(),
        })
        .collect();

    Ok(CalendarGrid { year, month, days })
}

/// Builds the calendar page for a month.
///
/// Overdue tasks are swept first so the grid shows current statuses.
pub async fn calendar_view(
    db: &DatabaseConnection,
    user_id: &str,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<CalendarView> {
    let (start, end) = grid_span(year, month)?;
    sweep_overdue(db, user_id, today).await?;

    let tasks = list_tasks_in_range(db, user_id, start, end).await?;
    let grid = build_calendar_grid(year, month, today, tasks)?;
    let stats = monthly_stats(db, user_id, year, month, today).await?;
    let upcoming = upcoming_tasks(db, user_id, today, UPCOMING_PREVIEW).await?;

    Ok(CalendarView {
        grid,
        stats,
        upcoming,
    })
}
