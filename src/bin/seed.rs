use std::process::ExitCode;

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use volunteer_portal::config::AppConfig;
use volunteer_portal::db;
use volunteer_portal::services::seed_service::{self, ADMIN_EMAIL, DEMO_EMAIL};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url = match AppConfig::from_env() {
        Ok(cfg) => cfg.database_url,
        Err(_) => std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://volunteer.db?mode=rwc".to_string()),
    };

    let pool = match db::open_pool(&database_url, 1).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("seed failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match seed_service::seed_demo_data(&pool).await {
        Ok(report) => {
            println!(
                "seed: users={}, activities={}, groups={} (demo login {}, admin login {})",
                report.users_created,
                report.activities_created,
                report.groups_created,
                DEMO_EMAIL,
                ADMIN_EMAIL
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("seed failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
