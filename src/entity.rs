pub mod prelude;

pub mod sea_orm_active_enums;

pub mod attendance_event;
pub mod payroll_record;
pub mod schedule_period;
pub mod user;
