use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use super::{announce_unlock, with_db, ApiError, AppState, AuthUser};
use crate::achievements::store::SqliteAchievementStore;
use crate::achievements::tracker::{self, AchievementOverview};
use crate::achievements::types::UserStats;
use crate::diary::types::{DailySummary, DayActivity, DiaryEvent, Reminder, VoiceEntry};
use crate::diary::{
    calendar as cal, entries, events, is_storable_day, stats as diary_stats, YEAR_RANGE,
};

const MAX_UPCOMING: usize = 50;

fn parse_day(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    raw.map(|d| {
        NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .ok()
            .filter(|day| is_storable_day(*day))
            .ok_or_else(|| ApiError::BadRequest(format!("invalid date '{d}', expected YYYY-MM-DD")))
    })
    .transpose()
}

#[derive(Deserialize)]
pub(super) struct DateQuery {
    date: Option<String>,
}

/// All entries newest first, or only those of one local day.
pub(super) async fn list_entries(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<VoiceEntry>>, ApiError> {
    let day = parse_day(q.date.as_deref())?;
    let offset = state.config.diary.offset();
    let list = with_db(&state, move |conn| match day {
        Some(day) => entries::entries_for_day(conn, &user, day, offset),
        None => entries::list_entries(conn, &user),
    })
    .await?;
    Ok(Json(list))
}

#[derive(Deserialize)]
pub(super) struct UpcomingQuery {
    limit: Option<usize>,
}

pub(super) async fn upcoming_events(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(q): Query<UpcomingQuery>,
) -> Result<Json<Vec<DiaryEvent>>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(state.config.diary.upcoming_events_limit)
        .min(MAX_UPCOMING);
    let list = with_db(&state, move |conn| {
        events::upcoming_events(conn, &user, Utc::now(), limit)
    })
    .await?;
    Ok(Json(list))
}

#[derive(Deserialize)]
pub(super) struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// Per-day counts for a month; defaults to the current local month.
pub(super) async fn calendar(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<Vec<DayActivity>>, ApiError> {
    let today = state.today();
    let year = q.year.unwrap_or(today.year());
    let month = q.month.unwrap_or(today.month());
    if !YEAR_RANGE.contains(&year) {
        return Err(ApiError::BadRequest(format!("invalid year: {year}")));
    }
    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!("invalid month: {month}")));
    }
    let offset = state.config.diary.offset();
    let days = with_db(&state, move |conn| {
        cal::month_activity(conn, &user, year, month, offset)
    })
    .await?;
    Ok(Json(days))
}

pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(q): Query<DateQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    let day = parse_day(q.date.as_deref())?.unwrap_or_else(|| state.today());
    let offset = state.config.diary.offset();
    let summary = with_db(&state, move |conn| cal::daily_summary(conn, &user, day, offset)).await?;
    Ok(Json(summary))
}

pub(super) async fn due_reminders(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let due = with_db(&state, move |conn| {
        events::take_due_reminders(conn, &user, Utc::now())
    })
    .await?;
    Ok(Json(due))
}

/// Stats snapshot; a user with no activity gets all zeros.
pub(super) async fn stats(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<UserStats>, ApiError> {
    let today = state.today();
    let snapshot = with_db(&state, move |conn| {
        Ok(diary_stats::load_stats(conn, &user, today)?.unwrap_or_default())
    })
    .await?;
    Ok(Json(snapshot))
}

pub(super) async fn achievements(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<AchievementOverview>, ApiError> {
    let today = state.today();
    let overview = with_db(&state, move |conn| {
        let store = SqliteAchievementStore::new(conn, today);
        tracker::overview(&store, &user, |icon, name| announce_unlock(&user, icon, name))
    })
    .await?;
    Ok(Json(overview))
}
