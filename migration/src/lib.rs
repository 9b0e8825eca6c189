pub use sea_orm_migration::prelude::*;

mod util;
mod m20250807_090214_init;
mod m20250807_101530_generate_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250807_090214_init::Migration),
            Box::new(m20250807_101530_generate_users::Migration),
        ]
    }
}
