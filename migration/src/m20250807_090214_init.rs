use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{setup_user_table_fk, util::{default_table_statement, default_user_table_statement, DefaultColumn}};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager
            .create_type(
                schema.create_enum_from_active_enum::<RoleType>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<EventType>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<AttendanceStatus>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<CountMode>()
            ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // Password should be in a hashed format
                .col(ColumnDef::new(User::BaseSalary)
                    .big_integer()
                    .not_null()) // In a perfect world we would use u64 / unsigned big int, but PostgreSQL doesn't support unsigned integer...
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .take()
            ).await.unwrap();

        manager
            .create_table(default_user_table_statement()
                .table(SchedulePeriod::Table)
                .col(ColumnDef::new(SchedulePeriod::TeacherId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::Period)
                    .text()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::StartTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::EndTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::Subject)
                    .text()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::ClassId)
                    .text()
                    .not_null())
                .col(ColumnDef::new(SchedulePeriod::Room)
                    .text())
                .take()
            ).await.unwrap();
        setup_user_table_fk!(manager, SchedulePeriod::Table);

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(SchedulePeriod::Table, SchedulePeriod::TeacherId)
            .to(User::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager.create_index(Index::create()
            .name("idx_schedule_period_teacher_date")
            .table(SchedulePeriod::Table)
            .col(SchedulePeriod::TeacherId)
            .col(SchedulePeriod::Date)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_user_table_statement()
                .table(AttendanceEvent::Table)
                .col(ColumnDef::new(AttendanceEvent::TeacherId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(AttendanceEvent::EventType)
                    .custom(EventType::name())
                    .not_null())
                .col(ColumnDef::new(AttendanceEvent::Timestamp)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(AttendanceEvent::Periods)
                    .json_binary()
                    .not_null())
                .col(ColumnDef::new(AttendanceEvent::Status)
                    .custom(AttendanceStatus::name())
                    .not_null())
                .col(ColumnDef::new(AttendanceEvent::Note)
                    .text())
                .col(ColumnDef::new(AttendanceEvent::WorkingHours)
                    .double())
                .take()
            ).await.unwrap();
        setup_user_table_fk!(manager, AttendanceEvent::Table);

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(AttendanceEvent::Table, AttendanceEvent::TeacherId)
            .to(User::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        // Month windows always query (teacher, timestamp range)
        manager.create_index(Index::create()
            .name("idx_attendance_event_teacher_timestamp")
            .table(AttendanceEvent::Table)
            .col(AttendanceEvent::TeacherId)
            .col(AttendanceEvent::Timestamp)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_user_table_statement()
                .table(PayrollRecord::Table)
                .col(ColumnDef::new(PayrollRecord::TeacherId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Month)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::TotalSessions)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::BaseSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::ActualSessions)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Mode)
                    .custom(CountMode::name())
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Rate)
                    .double()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Salary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRecord::Locked)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(PayrollRecord::Paid)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(PayrollRecord::PaidAmount)
                    .big_integer())
                .col(ColumnDef::new(PayrollRecord::PaidBy)
                    .uuid())
                .col(ColumnDef::new(PayrollRecord::PaidAt)
                    .timestamp_with_time_zone())
                .take()
            ).await.unwrap();
        setup_user_table_fk!(manager, PayrollRecord::Table);

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(PayrollRecord::Table, PayrollRecord::TeacherId)
            .to(User::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        // One ledger row per (teacher, month)
        manager.create_index(Index::create()
            .name("uq_payroll_record_teacher_month")
            .table(PayrollRecord::Table)
            .col(PayrollRecord::TeacherId)
            .col(PayrollRecord::Month)
            .unique()
            .take()
        ).await.unwrap();

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(
            TableDropStatement::new()
                .table(PayrollRecord::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(AttendanceEvent::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(SchedulePeriod::Table)
                .take()
        ).await.unwrap();

        manager
            .drop_table(
                TableDropStatement::new()
                    .table(User::Table)
                    .take()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(CountMode::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(AttendanceStatus::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(EventType::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(RoleType::name())
                    .to_owned()
            ).await.unwrap();

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum User {
    Table,
    Username,
    Password,
    Role,
    BaseSalary,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "teacher")]
    Teacher,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "event_type")]
enum EventType {
    #[sea_orm(string_value = "check_in")]
    CheckIn,
    #[sea_orm(string_value = "check_out")]
    CheckOut,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
enum AttendanceStatus {
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

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "count_mode")]
enum CountMode {
    #[sea_orm(string_value = "by_checkin")]
    ByCheckin,
    #[sea_orm(string_value = "by_periods")]
    ByPeriods,
}
