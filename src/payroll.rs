use actix_web::{body, http::{self, header::ContentType, StatusCode}, HttpResponse};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{entity::{attendance_event, payroll_record, prelude::*, sea_orm_active_enums::{CountMode, EventType}}, utils::{self, InvalidMonth}};

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error(transparent)]
    InvalidMonth(#[from] InvalidMonth),
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("payroll record not found")]
    RecordNotFound,
    #[error("payroll record is locked")]
    RecordLocked,
    #[error("payroll record is not locked yet")]
    NotLocked,
    #[error("payroll record is already paid")]
    AlreadyPaid,
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl actix_web::error::ResponseError for PayrollError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            PayrollError::InvalidMonth(_) | PayrollError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PayrollError::RecordNotFound => StatusCode::NOT_FOUND,
            PayrollError::RecordLocked | PayrollError::NotLocked | PayrollError::AlreadyPaid => StatusCode::CONFLICT,
            PayrollError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct ComputeInput {
    pub teacher_id: Uuid,
    pub month: String,
    pub total_sessions: i32,
    pub base_salary: i64,
    pub mode: CountMode,
    pub tz_offset_minutes: i32,
}

/// A computed salary row that has not touched the ledger yet. Computing
/// twice over an unchanged event set yields identical drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollDraft {
    pub teacher_id: Uuid,
    pub month: String,
    pub total_sessions: i32,
    pub base_salary: i64,
    pub actual_sessions: i32,
    pub mode: CountMode,
    pub rate: f64,
    pub salary: i64,
}

impl PayrollDraft {
    fn settle(input: &ComputeInput, actual_sessions: i64) -> Self {
        let credited = actual_sessions.min(input.total_sessions as i64);
        let rate = credited as f64 / input.total_sessions as f64;
        let salary = (input.base_salary as f64 * rate).round() as i64;

        Self {
            teacher_id: input.teacher_id,
            month: input.month.clone(),
            total_sessions: input.total_sessions,
            base_salary: input.base_salary,
            actual_sessions: actual_sessions as i32,
            mode: input.mode,
            rate,
            salary,
        }
    }
}

/// Sessions credited to a teacher within a month, counted either as one per
/// check-in or as the number of covered periods per check-in.
pub async fn count_sessions<C: ConnectionTrait>(
    db: &C,
    teacher_id: Uuid,
    month: &str,
    tz_offset_minutes: i32,
    mode: CountMode,
) -> Result<i64, PayrollError> {
    let (start, end) = utils::month_window(month, tz_offset_minutes)?;

    let events = AttendanceEvent::find()
        .filter(attendance_event::Column::TeacherId.eq(teacher_id))
        .filter(attendance_event::Column::EventType.eq(EventType::CheckIn))
        .filter(attendance_event::Column::Timestamp.gte(start))
        .filter(attendance_event::Column::Timestamp.lt(end))
        .order_by_asc(attendance_event::Column::Timestamp)
        .all(db).await?;

    let sessions = match mode {
        CountMode::ByCheckin => events.len() as i64,
        CountMode::ByPeriods => events.iter().map(|event| event.periods.len() as i64).sum(),
    };

    Ok(sessions)
}

pub async fn compute<C: ConnectionTrait>(db: &C, input: &ComputeInput) -> Result<PayrollDraft, PayrollError> {
    if input.total_sessions <= 0 {
        return Err(PayrollError::InvalidInput("total_sessions must be positive"));
    }

    if input.base_salary < 0 {
        return Err(PayrollError::InvalidInput("base_salary cannot be negative"));
    }

    let actual_sessions = count_sessions(db, input.teacher_id, &input.month, input.tz_offset_minutes, input.mode).await?;

    Ok(PayrollDraft::settle(input, actual_sessions))
}

pub async fn get<C: ConnectionTrait>(db: &C, teacher_id: Uuid, month: &str) -> Result<Option<payroll_record::Model>, PayrollError> {
    let record = PayrollRecord::find()
        .filter(payroll_record::Column::TeacherId.eq(teacher_id))
        .filter(payroll_record::Column::Month.eq(month))
        .one(db).await?;

    Ok(record)
}

/// Upserts the single ledger row for (teacher, month). A locked row only
/// ever changes through `mark_paid`.
pub async fn save<C: ConnectionTrait>(db: &C, draft: &PayrollDraft, saved_by: Uuid) -> Result<Uuid, PayrollError> {
    let existing = get(db, draft.teacher_id, &draft.month).await?;

    if existing.as_ref().is_some_and(|record| record.locked) {
        return Err(PayrollError::RecordLocked);
    }

    let record = match existing {
        Some(existing) => {
            PayrollRecord::update(payroll_record::ActiveModel {
                id: Unchanged(existing.id),
                updated_at: Set(Utc::now().into()),
                updated_by: Set(Some(saved_by)),
                total_sessions: Set(draft.total_sessions),
                base_salary: Set(draft.base_salary),
                actual_sessions: Set(draft.actual_sessions),
                mode: Set(draft.mode),
                rate: Set(draft.rate),
                salary: Set(draft.salary),
                ..Default::default()
            }).exec(db).await?
        },
        None => {
            PayrollRecord::insert(payroll_record::ActiveModel {
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
                created_by: Set(Some(saved_by)),
                updated_by: Set(Some(saved_by)),
                teacher_id: Set(draft.teacher_id),
                month: Set(draft.month.clone()),
                total_sessions: Set(draft.total_sessions),
                base_salary: Set(draft.base_salary),
                actual_sessions: Set(draft.actual_sessions),
                mode: Set(draft.mode),
                rate: Set(draft.rate),
                salary: Set(draft.salary),
                locked: Set(false),
                paid: Set(false),
                ..Default::default()
            }).exec_with_returning(db).await?
        },
    };

    info!(teacher_id = %draft.teacher_id, month = %draft.month, salary = record.salary, "saved payroll record");

    Ok(record.id)
}

/// One-way: a locked record is no longer subject to recomputation. Locking
/// an already-locked record is a no-op.
pub async fn lock<C: ConnectionTrait>(db: &C, teacher_id: Uuid, month: &str, locked_by: Uuid) -> Result<(), PayrollError> {
    let Some(record) = get(db, teacher_id, month).await? else {
        return Err(PayrollError::RecordNotFound);
    };

    if record.locked {
        return Ok(());
    }

    PayrollRecord::update(payroll_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(Utc::now().into()),
        updated_by: Set(Some(locked_by)),
        locked: Set(true),
        ..Default::default()
    }).exec(db).await?;

    info!(%teacher_id, month, "locked payroll record");

    Ok(())
}

/// One-way: payment is only valid on a locked record and never re-applies.
pub async fn mark_paid<C: ConnectionTrait>(
    db: &C,
    teacher_id: Uuid,
    month: &str,
    paid_by: Uuid,
    paid_amount: Option<i64>,
    paid_at: DateTime<Utc>,
) -> Result<(), PayrollError> {
    let Some(record) = get(db, teacher_id, month).await? else {
        return Err(PayrollError::RecordNotFound);
    };

    if !record.locked {
        return Err(PayrollError::NotLocked);
    }

    if record.paid {
        return Err(PayrollError::AlreadyPaid);
    }

    let amount = paid_amount.unwrap_or(record.salary);

    PayrollRecord::update(payroll_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(paid_at.into()),
        updated_by: Set(Some(paid_by)),
        paid: Set(true),
        paid_amount: Set(Some(amount)),
        paid_by: Set(Some(paid_by)),
        paid_at: Set(Some(paid_at.into())),
        ..Default::default()
    }).exec(db).await?;

    info!(%teacher_id, month, amount, "marked payroll record paid");

    Ok(())
}
