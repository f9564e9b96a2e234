pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_hostels_and_rooms;
mod m20250101_000002_create_guests_and_bookings;
mod m20250101_000003_create_checkin_tables;
mod m20250101_000004_create_email_reminders;
mod m20250101_000005_create_content_tables;
mod m20250101_000006_create_invitations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_hostels_and_rooms::Migration),
            Box::new(m20250101_000002_create_guests_and_bookings::Migration),
            Box::new(m20250101_000003_create_checkin_tables::Migration),
            Box::new(m20250101_000004_create_email_reminders::Migration),
            Box::new(m20250101_000005_create_content_tables::Migration),
            Box::new(m20250101_000006_create_invitations::Migration),
        ]
    }
}
