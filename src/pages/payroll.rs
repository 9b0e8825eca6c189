use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{attendance::AttendanceContext, auth::Admin, entity::{prelude::*, sea_orm_active_enums::{CountMode, RoleType}, user}, payroll::{self, ComputeInput, PayrollDraft, PayrollError}};

use model::*;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(compute_payroll)
        .service(compute_all_payrolls)
        .service(save_payroll)
        .service(get_payroll)
        .service(lock_payroll)
        .service(pay_payroll);
}

/// Dry run: computes the draft without touching the ledger.
#[post("/compute")]
async fn compute_payroll(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    _admin: Admin,
    payload: web::Json<ComputePayroll>,
) -> Result<impl Responder, PayrollError> {
    let input = resolve_input(db.as_ref(), &payload, ctx.tz_offset_minutes).await?;

    let draft = payroll::compute(db.as_ref(), &input).await?;

    Ok(web::Json(draft))
}

#[post("/save")]
async fn save_payroll(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    admin: Admin,
    payload: web::Json<ComputePayroll>,
) -> Result<impl Responder, PayrollError> {
    let input = resolve_input(db.as_ref(), &payload, ctx.tz_offset_minutes).await?;

    let draft = payroll::compute(db.as_ref(), &input).await?;
    let id = payroll::save(db.as_ref(), &draft, admin.id).await?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(SavedPayroll { id, record: draft }))
    )
}

#[get("/{teacher_id}/{month}")]
async fn get_payroll(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, PayrollError> {
    let (teacher_id, month) = path.into_inner();

    let Some(record) = payroll::get(db.as_ref(), teacher_id, &month).await? else {
        return Err(PayrollError::RecordNotFound);
    };

    Ok(web::Json(record))
}

#[post("/{teacher_id}/{month}/lock")]
async fn lock_payroll(
    db: web::Data<DatabaseConnection>,
    admin: Admin,
    path: web::Path<(Uuid, String)>,
) -> Result<impl Responder, PayrollError> {
    let (teacher_id, month) = path.into_inner();

    payroll::lock(db.as_ref(), teacher_id, &month, admin.id).await?;

    Ok(HttpResponse::Ok().finish())
}

#[post("/{teacher_id}/{month}/pay")]
async fn pay_payroll(
    db: web::Data<DatabaseConnection>,
    admin: Admin,
    path: web::Path<(Uuid, String)>,
    payload: web::Json<PayPayroll>,
) -> Result<impl Responder, PayrollError> {
    let (teacher_id, month) = path.into_inner();

    payroll::mark_paid(db.as_ref(), teacher_id, &month, admin.id, payload.amount, Utc::now()).await?;

    Ok(HttpResponse::Ok().finish())
}

/// One independent computation per teacher; one teacher failing does not
/// abort the rest.
#[post("/compute-all")]
async fn compute_all_payrolls(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    _admin: Admin,
    payload: web::Json<ComputeAllPayrolls>,
) -> Result<impl Responder, PayrollError> {
    let teachers = User::find()
        .filter(user::Column::Role.eq(RoleType::Teacher))
        .all(db.as_ref()).await?;

    let outcomes = futures_util::future::join_all(
        teachers.into_iter().map(|teacher|
            compute_for_teacher(db.as_ref(), teacher, &payload, ctx.tz_offset_minutes)
        )
    ).await;

    Ok(web::Json(outcomes))
}

async fn compute_for_teacher(
    db: &DatabaseConnection,
    teacher: user::Model,
    payload: &ComputeAllPayrolls,
    tz_offset_minutes: i32,
) -> TeacherPayrollOutcome {
    let input = ComputeInput {
        teacher_id: teacher.id,
        month: payload.month.clone(),
        total_sessions: payload.total_sessions,
        base_salary: teacher.base_salary,
        mode: payload.mode,
        tz_offset_minutes,
    };

    match payroll::compute(db, &input).await {
        Ok(draft) => TeacherPayrollOutcome {
            teacher_id: teacher.id,
            username: teacher.username,
            draft: Some(draft),
            error: None,
        },
        Err(error) => TeacherPayrollOutcome {
            teacher_id: teacher.id,
            username: teacher.username,
            draft: None,
            error: Some(error.to_string()),
        },
    }
}

async fn resolve_input(db: &DatabaseConnection, payload: &ComputePayroll, tz_offset_minutes: i32) -> Result<ComputeInput, PayrollError> {
    let base_salary = match payload.base_salary {
        Some(base_salary) => base_salary,
        None => {
            let Some(teacher) = User::find_by_id(payload.teacher_id).one(db).await? else {
                return Err(PayrollError::InvalidInput("unknown teacher"));
            };

            teacher.base_salary
        },
    };

    Ok(ComputeInput {
        teacher_id: payload.teacher_id,
        month: payload.month.clone(),
        total_sessions: payload.total_sessions,
        base_salary,
        mode: payload.mode,
        tz_offset_minutes,
    })
}
