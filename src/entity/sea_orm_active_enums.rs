use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "teacher")]
    Teacher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "event_type")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[sea_orm(string_value = "check_in")]
    CheckIn,
    #[sea_orm(string_value = "check_out")]
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "early_leave")]
    EarlyLeave,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "count_mode")]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    #[sea_orm(string_value = "by_checkin")]
    ByCheckin,
    #[sea_orm(string_value = "by_periods")]
    ByPeriods,
}
