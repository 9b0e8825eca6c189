use actix_web::{body, http::{self, header::ContentType, StatusCode}, HttpResponse};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{entity::{attendance_event::{self, PeriodList}, prelude::*, schedule_period, sea_orm_active_enums::{AttendanceStatus, EventType}}, utils};

/// Request-scoped settings every attendance call receives explicitly.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceContext {
    pub tz_offset_minutes: i32,
    pub grace_minutes: i64,
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("no schedule for this day")]
    NoScheduleToday,
    #[error("already checked in for this day")]
    AlreadyCheckedIn,
    #[error("not checked in yet")]
    NotCheckedInYet,
    #[error("already checked out for this day")]
    AlreadyCheckedOut,
    #[error("check-out must come after check-in")]
    InvalidDuration,
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl actix_web::error::ResponseError for AttendanceError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AttendanceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Where a teacher's day stands. One check-in then one check-out, never
/// backwards; a day without schedule never advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    NoSchedule,
    AwaitingCheckIn,
    AwaitingCheckOut,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub phase: DayPhase,
    pub has_schedule: bool,
    pub periods: Vec<schedule_period::Model>,
    pub expected_check_in: Option<NaiveTime>,
    pub expected_check_out: Option<NaiveTime>,
    pub check_in: Option<attendance_event::Model>,
    pub check_out: Option<attendance_event::Model>,
    pub can_check_in: bool,
    pub can_check_out: bool,
}

impl DayStatus {
    fn assemble(
        date: NaiveDate,
        periods: Vec<schedule_period::Model>,
        check_in: Option<attendance_event::Model>,
        check_out: Option<attendance_event::Model>,
    ) -> Self {
        let has_schedule = !periods.is_empty();

        let phase = match (has_schedule, &check_in, &check_out) {
            (false, ..) => DayPhase::NoSchedule,
            (true, None, _) => DayPhase::AwaitingCheckIn,
            (true, Some(_), None) => DayPhase::AwaitingCheckOut,
            (true, Some(_), Some(_)) => DayPhase::Complete,
        };

        Self {
            date,
            phase,
            has_schedule,
            expected_check_in: periods.first().map(|period| period.start_time),
            expected_check_out: periods.iter().map(|period| period.end_time).max(),
            periods,
            check_in,
            check_out,
            can_check_in: phase == DayPhase::AwaitingCheckIn,
            can_check_out: phase == DayPhase::AwaitingCheckOut,
        }
    }
}

/// Single source of truth for a teacher's day: the published schedule plus
/// whatever check-in/check-out events already exist.
pub async fn day_status<C: ConnectionTrait>(
    db: &C,
    ctx: AttendanceContext,
    teacher_id: Uuid,
    date: NaiveDate,
) -> Result<DayStatus, AttendanceError> {
    let periods = SchedulePeriod::find()
        .filter(schedule_period::Column::TeacherId.eq(teacher_id))
        .filter(schedule_period::Column::Date.eq(date))
        .order_by_asc(schedule_period::Column::StartTime)
        .all(db).await?;

    let (check_in, check_out) = day_events(db, ctx, teacher_id, date).await?;

    Ok(DayStatus::assemble(date, periods, check_in, check_out))
}

pub async fn check_in<C: ConnectionTrait>(
    db: &C,
    ctx: AttendanceContext,
    teacher_id: Uuid,
    date: NaiveDate,
    requested_time: DateTime<Utc>,
    note: Option<String>,
) -> Result<attendance_event::Model, AttendanceError> {
    let status = day_status(db, ctx, teacher_id, date).await?;

    let Some(expected) = status.expected_check_in else {
        return Err(AttendanceError::NoScheduleToday);
    };

    if status.check_in.is_some() {
        return Err(AttendanceError::AlreadyCheckedIn);
    }

    let expected_at = utils::local_instant(date, expected, ctx.tz_offset_minutes);
    let event_status = classify_check_in(requested_time, expected_at, ctx.grace_minutes);

    let covered = status.periods.iter().map(|period| period.period.clone()).collect();

    let event = attendance_event::ActiveModel {
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
        created_by: Set(Some(teacher_id)),
        updated_by: Set(Some(teacher_id)),
        teacher_id: Set(teacher_id),
        event_type: Set(EventType::CheckIn),
        timestamp: Set(requested_time.into()),
        periods: Set(PeriodList(covered)),
        status: Set(event_status),
        note: Set(note),
        working_hours: Set(None),
        ..Default::default()
    };

    let event = AttendanceEvent::insert(event)
        .exec_with_returning(db).await?;

    Ok(event)
}

pub async fn check_out<C: ConnectionTrait>(
    db: &C,
    ctx: AttendanceContext,
    teacher_id: Uuid,
    date: NaiveDate,
    requested_time: DateTime<Utc>,
    note: Option<String>,
) -> Result<attendance_event::Model, AttendanceError> {
    let status = day_status(db, ctx, teacher_id, date).await?;

    let Some(expected) = status.expected_check_out else {
        return Err(AttendanceError::NoScheduleToday);
    };

    let Some(check_in) = status.check_in else {
        return Err(AttendanceError::NotCheckedInYet);
    };

    if status.check_out.is_some() {
        return Err(AttendanceError::AlreadyCheckedOut);
    }

    let worked = working_hours(check_in.timestamp.with_timezone(&Utc), requested_time)?;

    let expected_at = utils::local_instant(date, expected, ctx.tz_offset_minutes);
    let event_status = classify_check_out(requested_time, expected_at, ctx.grace_minutes);

    let event = attendance_event::ActiveModel {
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
        created_by: Set(Some(teacher_id)),
        updated_by: Set(Some(teacher_id)),
        teacher_id: Set(teacher_id),
        event_type: Set(EventType::CheckOut),
        timestamp: Set(requested_time.into()),
        periods: Set(PeriodList::default()),
        status: Set(event_status),
        note: Set(note),
        working_hours: Set(Some(worked)),
        ..Default::default()
    };

    let event = AttendanceEvent::insert(event)
        .exec_with_returning(db).await?;

    Ok(event)
}

async fn day_events<C: ConnectionTrait>(
    db: &C,
    ctx: AttendanceContext,
    teacher_id: Uuid,
    date: NaiveDate,
) -> Result<(Option<attendance_event::Model>, Option<attendance_event::Model>), AttendanceError> {
    let (start, end) = utils::day_window(date, ctx.tz_offset_minutes);

    let events = AttendanceEvent::find()
        .filter(attendance_event::Column::TeacherId.eq(teacher_id))
        .filter(attendance_event::Column::Timestamp.gte(start))
        .filter(attendance_event::Column::Timestamp.lt(end))
        .order_by_asc(attendance_event::Column::Timestamp)
        .all(db).await?;

    let mut check_in = None;
    let mut check_out = None;

    for event in events {
        match event.event_type {
            EventType::CheckIn => check_in.get_or_insert(event),
            EventType::CheckOut => check_out.get_or_insert(event),
        };
    }

    Ok((check_in, check_out))
}

fn classify_check_in(requested: DateTime<Utc>, expected: DateTime<Utc>, grace_minutes: i64) -> AttendanceStatus {
    if requested <= expected + Duration::minutes(grace_minutes) {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

fn classify_check_out(requested: DateTime<Utc>, expected: DateTime<Utc>, grace_minutes: i64) -> AttendanceStatus {
    if requested < expected - Duration::minutes(grace_minutes) {
        AttendanceStatus::EarlyLeave
    } else {
        AttendanceStatus::Completed
    }
}

/// Hours between check-in and check-out, rounded to one decimal.
fn working_hours(checked_in_at: DateTime<Utc>, checked_out_at: DateTime<Utc>) -> Result<f64, AttendanceError> {
    let worked = checked_out_at - checked_in_at;

    if worked <= Duration::zero() {
        return Err(AttendanceError::InvalidDuration);
    }

    Ok((worked.num_seconds() as f64 / 3600.0 * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    const CTX: AttendanceContext = AttendanceContext { tz_offset_minutes: 420, grace_minutes: 15 };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 9).unwrap()
    }

    fn period_fixture(teacher_id: Uuid, label: &str, start: (u32, u32), end: (u32, u32)) -> schedule_period::Model {
        schedule_period::Model {
            id: Uuid::new_v4(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            created_by: None,
            updated_by: None,
            teacher_id,
            date: date(),
            period: label.to_string(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            subject: "Mathematics".to_string(),
            class_id: "7A".to_string(),
            room: None,
        }
    }

    fn event_fixture(teacher_id: Uuid, event_type: EventType, timestamp: DateTime<Utc>, status: AttendanceStatus) -> attendance_event::Model {
        attendance_event::Model {
            id: Uuid::new_v4(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            created_by: Some(teacher_id),
            updated_by: Some(teacher_id),
            teacher_id,
            event_type,
            timestamp: timestamp.into(),
            periods: PeriodList::default(),
            status,
            note: None,
            working_hours: None,
        }
    }

    /// Local 2025-08-09 HH:MM under the UTC+7 test offset.
    fn local(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 9, hour, minute, 0).unwrap() - Duration::minutes(420)
    }

    #[test]
    fn test_phase_no_schedule() {
        let status = DayStatus::assemble(date(), Vec::new(), None, None);

        assert_eq!(status.phase, DayPhase::NoSchedule);
        assert!(!status.has_schedule);
        assert!(!status.can_check_in);
        assert!(!status.can_check_out);
    }

    #[test]
    fn test_phase_progression() {
        let teacher_id = Uuid::new_v4();
        let periods = vec![
            period_fixture(teacher_id, "1", (8, 0), (8, 45)),
            period_fixture(teacher_id, "2", (9, 0), (9, 45)),
        ];
        let check_in = event_fixture(teacher_id, EventType::CheckIn, local(8, 10), AttendanceStatus::Present);
        let check_out = event_fixture(teacher_id, EventType::CheckOut, local(9, 50), AttendanceStatus::Completed);

        let awaiting_in = DayStatus::assemble(date(), periods.clone(), None, None);
        assert_eq!(awaiting_in.phase, DayPhase::AwaitingCheckIn);
        assert!(awaiting_in.can_check_in);
        assert!(!awaiting_in.can_check_out);
        assert_eq!(awaiting_in.expected_check_in, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(awaiting_in.expected_check_out, NaiveTime::from_hms_opt(9, 45, 0));

        let awaiting_out = DayStatus::assemble(date(), periods.clone(), Some(check_in.clone()), None);
        assert_eq!(awaiting_out.phase, DayPhase::AwaitingCheckOut);
        assert!(!awaiting_out.can_check_in);
        assert!(awaiting_out.can_check_out);

        let complete = DayStatus::assemble(date(), periods, Some(check_in), Some(check_out));
        assert_eq!(complete.phase, DayPhase::Complete);
        assert!(!complete.can_check_in);
        assert!(!complete.can_check_out);
    }

    #[test]
    fn test_classify_check_in() {
        let expected = local(8, 0);

        assert_eq!(classify_check_in(local(7, 50), expected, 15), AttendanceStatus::Present);
        assert_eq!(classify_check_in(local(8, 10), expected, 15), AttendanceStatus::Present);
        assert_eq!(classify_check_in(local(8, 15), expected, 15), AttendanceStatus::Present);
        assert_eq!(classify_check_in(local(8, 30), expected, 15), AttendanceStatus::Late);
    }

    #[test]
    fn test_classify_check_out() {
        let expected = local(9, 45);

        assert_eq!(classify_check_out(local(9, 0), expected, 15), AttendanceStatus::EarlyLeave);
        assert_eq!(classify_check_out(local(9, 30), expected, 15), AttendanceStatus::Completed);
        assert_eq!(classify_check_out(local(9, 50), expected, 15), AttendanceStatus::Completed);
    }

    #[test]
    fn test_working_hours_rounding() {
        assert_eq!(working_hours(local(8, 0), local(9, 45)).unwrap(), 1.8);
        assert_eq!(working_hours(local(8, 0), local(16, 0)).unwrap(), 8.0);
        assert!(matches!(working_hours(local(9, 0), local(9, 0)), Err(AttendanceError::InvalidDuration)));
        assert!(matches!(working_hours(local(9, 0), local(8, 0)), Err(AttendanceError::InvalidDuration)));
    }

    #[actix_web::test]
    async fn test_check_in_appends_event() {
        let teacher_id = Uuid::new_v4();
        let appended = event_fixture(teacher_id, EventType::CheckIn, local(8, 10), AttendanceStatus::Present);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ period_fixture(teacher_id, "1", (8, 0), (8, 45)) ] ])
            .append_query_results([ Vec::<attendance_event::Model>::new() ])
            .append_query_results([ vec![ appended.clone() ] ])
            .into_connection();

        let event = check_in(&db, CTX, teacher_id, date(), local(8, 10), None).await.unwrap();
        assert_eq!(event, appended);
    }

    #[actix_web::test]
    async fn test_check_in_requires_schedule() {
        let teacher_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ Vec::<schedule_period::Model>::new() ])
            .append_query_results([ Vec::<attendance_event::Model>::new() ])
            .into_connection();

        let result = check_in(&db, CTX, teacher_id, date(), local(8, 0), None).await;
        assert!(matches!(result, Err(AttendanceError::NoScheduleToday)));
    }

    #[actix_web::test]
    async fn test_check_in_rejects_second_check_in() {
        let teacher_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ period_fixture(teacher_id, "1", (8, 0), (8, 45)) ] ])
            .append_query_results([ vec![ event_fixture(teacher_id, EventType::CheckIn, local(8, 5), AttendanceStatus::Present) ] ])
            .into_connection();

        let result = check_in(&db, CTX, teacher_id, date(), local(8, 10), None).await;
        assert!(matches!(result, Err(AttendanceError::AlreadyCheckedIn)));
    }

    #[actix_web::test]
    async fn test_check_out_requires_check_in() {
        let teacher_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ period_fixture(teacher_id, "1", (8, 0), (8, 45)) ] ])
            .append_query_results([ Vec::<attendance_event::Model>::new() ])
            .into_connection();

        let result = check_out(&db, CTX, teacher_id, date(), local(9, 0), None).await;
        assert!(matches!(result, Err(AttendanceError::NotCheckedInYet)));
    }

    #[actix_web::test]
    async fn test_check_out_rejects_second_check_out() {
        let teacher_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ period_fixture(teacher_id, "1", (8, 0), (8, 45)) ] ])
            .append_query_results([ vec![
                event_fixture(teacher_id, EventType::CheckIn, local(8, 0), AttendanceStatus::Present),
                event_fixture(teacher_id, EventType::CheckOut, local(9, 0), AttendanceStatus::Completed),
            ] ])
            .into_connection();

        let result = check_out(&db, CTX, teacher_id, date(), local(9, 30), None).await;
        assert!(matches!(result, Err(AttendanceError::AlreadyCheckedOut)));
    }

    #[actix_web::test]
    async fn test_check_out_rejects_non_positive_duration() {
        let teacher_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ period_fixture(teacher_id, "1", (8, 0), (8, 45)) ] ])
            .append_query_results([ vec![ event_fixture(teacher_id, EventType::CheckIn, local(9, 0), AttendanceStatus::Late) ] ])
            .into_connection();

        let result = check_out(&db, CTX, teacher_id, date(), local(8, 0), None).await;
        assert!(matches!(result, Err(AttendanceError::InvalidDuration)));
    }

    #[actix_web::test]
    async fn test_check_out_appends_event() {
        let teacher_id = Uuid::new_v4();
        let appended = event_fixture(teacher_id, EventType::CheckOut, local(9, 50), AttendanceStatus::Completed);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![
                period_fixture(teacher_id, "1", (8, 0), (8, 45)),
                period_fixture(teacher_id, "2", (9, 0), (9, 45)),
            ] ])
            .append_query_results([ vec![ event_fixture(teacher_id, EventType::CheckIn, local(8, 0), AttendanceStatus::Present) ] ])
            .append_query_results([ vec![ appended.clone() ] ])
            .into_connection();

        let event = check_out(&db, CTX, teacher_id, date(), local(9, 50), None).await.unwrap();
        assert_eq!(event, appended);
    }
}
