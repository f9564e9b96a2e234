use sea_orm_migration::cli;

/// `DATABASE_URL=... migrations up|down|status|fresh`
#[tokio::main]
async fn main() {
    cli::run_cli(migrations::Migrator).await;
}
