use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{attendance::{self, AttendanceContext, AttendanceError}, auth::Admin, entity::user};

use model::*;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_day_status)
        .service(get_teacher_day_status)
        .service(create_check_in)
        .service(create_check_out);
}

#[get("/status")]
async fn get_day_status(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    teacher: user::Model,
    query: web::Query<StatusQuery>,
) -> Result<impl Responder, AttendanceError> {
    let ctx = *ctx.get_ref();
    let date = query.date.unwrap_or_else(|| local_today(ctx));

    let status = attendance::day_status(db.as_ref(), ctx, teacher.id, date).await?;

    Ok(web::Json(status))
}

#[get("/{teacher_id}/status")]
async fn get_teacher_day_status(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    _admin: Admin,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> Result<impl Responder, AttendanceError> {
    let ctx = *ctx.get_ref();
    let date = query.date.unwrap_or_else(|| local_today(ctx));

    let status = attendance::day_status(db.as_ref(), ctx, path.into_inner(), date).await?;

    Ok(web::Json(status))
}

#[post("/check-in")]
async fn create_check_in(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    teacher: user::Model,
    payload: web::Json<CheckInOut>,
) -> Result<impl Responder, AttendanceError> {
    let ctx = *ctx.get_ref();
    let (date, requested_time) = resolve_request_time(ctx, payload.time);

    let event = attendance::check_in(db.as_ref(), ctx, teacher.id, date, requested_time, payload.note.clone()).await?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(event))
    )
}

#[post("/check-out")]
async fn create_check_out(
    db: web::Data<DatabaseConnection>,
    ctx: web::Data<AttendanceContext>,
    teacher: user::Model,
    payload: web::Json<CheckInOut>,
) -> Result<impl Responder, AttendanceError> {
    let ctx = *ctx.get_ref();
    let (date, requested_time) = resolve_request_time(ctx, payload.time);

    let event = attendance::check_out(db.as_ref(), ctx, teacher.id, date, requested_time, payload.note.clone()).await?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(event))
    )
}

/// The attendance day is the local calendar date of the requested instant.
fn resolve_request_time(ctx: AttendanceContext, time: Option<DateTime<FixedOffset>>) -> (NaiveDate, DateTime<Utc>) {
    let requested_time = time.map(|time| time.with_timezone(&Utc)).unwrap_or_else(Utc::now);
    let date = (requested_time + Duration::minutes(ctx.tz_offset_minutes as i64)).date_naive();

    (date, requested_time)
}

fn local_today(ctx: AttendanceContext) -> NaiveDate {
    (Utc::now() + Duration::minutes(ctx.tz_offset_minutes as i64)).date_naive()
}
