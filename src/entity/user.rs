use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RoleType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub username: String,
    pub password: Vec<u8>,
    pub role: RoleType,
    pub base_salary: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_event::Entity")]
    AttendanceEvent,
    #[sea_orm(has_many = "super::payroll_record::Entity")]
    PayrollRecord,
    #[sea_orm(has_many = "super::schedule_period::Entity")]
    SchedulePeriod,
}

impl Related<super::attendance_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceEvent.def()
    }
}

impl Related<super::payroll_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollRecord.def()
    }
}

impl Related<super::schedule_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchedulePeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
