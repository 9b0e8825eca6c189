pub use super::attendance_event::Entity as AttendanceEvent;
pub use super::payroll_record::Entity as PayrollRecord;
pub use super::schedule_period::Entity as SchedulePeriod;
pub use super::user::Entity as User;
