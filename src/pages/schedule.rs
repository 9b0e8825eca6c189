use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::Admin, entity::{prelude::*, schedule_period}};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_period)
        .service(list_periods);
}

#[derive(Debug, Serialize, Deserialize)]
struct CreatePeriod {
    teacher_id: Uuid,
    date: NaiveDate,
    period: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    subject: String,
    class_id: String,
    room: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    date: NaiveDate,
}

#[post("")]
async fn create_period(db: web::Data<DatabaseConnection>, admin: Admin, payload: web::Json<CreatePeriod>) -> actix_web::Result<impl Responder> {
    if payload.end_time <= payload.start_time {
        return Err(actix_web::error::ErrorBadRequest("end_time is not after start_time"));
    }

    let period = schedule_period::ActiveModel {
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
        created_by: Set(Some(admin.id)),
        updated_by: Set(Some(admin.id)),
        teacher_id: Set(payload.teacher_id),
        date: Set(payload.date),
        period: Set(payload.period.clone()),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        subject: Set(payload.subject.clone()),
        class_id: Set(payload.class_id.clone()),
        room: Set(payload.room.clone()),
        ..Default::default()
    };

    let period = SchedulePeriod::insert(period)
        .exec_with_returning(db.as_ref()).await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(period))
    )
}

#[get("/{teacher_id}")]
async fn list_periods(db: web::Data<DatabaseConnection>, _admin: Admin, path: web::Path<Uuid>, query: web::Query<PeriodQuery>) -> actix_web::Result<impl Responder> {
    let periods = SchedulePeriod::find()
        .filter(schedule_period::Column::TeacherId.eq(path.into_inner()))
        .filter(schedule_period::Column::Date.eq(query.date))
        .order_by_asc(schedule_period::Column::StartTime)
        .all(db.as_ref()).await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(web::Json(periods))
}
