use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250807_090214_init::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-08-07T10:15:30.000Z").cast_as("timestamptz");

        // Creates 20 teachers
        for i in 1..=20 {
            let uuid = format!("{:032x}", i as u128);
            let username = format!("teacher{}", i);
            let base_salary = rand::random_range(8_000_000..=15_000_000);

            let hashed_password = &sha2::Sha256::digest(&format!("{}:{}", username, username))[..];

            manager
                .exec_stmt(Query::insert()
                    .into_table(User::Table)
                    .columns(["id", "created_at", "updated_at", "username", "password", "role", "base_salary"])
                    .values_panic([Expr::val(uuid).cast_as("uuid"), time.clone(), time.clone(), username.into(), hashed_password.into(), Expr::val("teacher").cast_as("role_type"), base_salary.into()])
                    .to_owned()
            ).await.unwrap();
        }

        // Create an admin

        let hashed_password = &sha2::Sha256::digest("admin:admin")[..];

        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(["id", "created_at", "updated_at", "username", "password", "role", "base_salary"])
                .values_panic([Expr::val(format!("{:032x}", 12345 as u128)).cast_as("uuid"), time.clone(), time.clone(), "admin".into(), hashed_password.into(), Expr::val("admin").cast_as("role_type"), 0.into()])
                .to_owned()
        ).await.unwrap();

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for i in 1..=20 {
            let uuid = format!("{:032x}", i as u128);

            manager
                .exec_stmt(Query::delete()
                    .from_table(User::Table)
                    .and_where(Expr::col("id").eq(Expr::val(uuid).cast_as("uuid")))
                    .to_owned()
            ).await.unwrap();
        }

        manager
            .exec_stmt(Query::delete()
                .from_table(User::Table)
                .and_where(Expr::col("id").eq(Expr::val(format!("{:032x}", 12345 as u128)).cast_as("uuid")))
                .to_owned()
        ).await.unwrap();

        Ok(())
    }
}
