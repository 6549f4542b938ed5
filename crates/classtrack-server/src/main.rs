//! CLASSTRACK Server — application entry point.
//!
//! Connects to SurrealDB, applies migrations, and wires the auth,
//! registrar, and notification services together.

use classtrack_auth::{AuthConfig, AuthService};
use classtrack_db::repository::{
    SurrealAttendanceRepository, SurrealFeePaymentRepository, SurrealInstituteRepository,
    SurrealStudentRepository, SurrealUserRepository,
};
use classtrack_db::{DbConfig, DbManager, run_migrations};
use classtrack_notify::{Fast2SmsConfig, Fast2SmsNotifier};
use classtrack_registrar::{AttendanceService, FeeService, StudentAllocator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("classtrack=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting CLASSTRACK server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "CLASSTRACK server failed");
        std::process::exit(1);
    }

    tracing::info!("CLASSTRACK server stopped.");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config).await?;
    let db = manager.client().clone();

    run_migrations(&db).await?;

    let auth_config = AuthConfig::from_env()?;
    // The repository hashes with the same pepper the service verifies
    // with.
    let user_repo = match &auth_config.pepper {
        Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
        None => SurrealUserRepository::new(db.clone()),
    };
    let _auth = AuthService::new(
        user_repo,
        SurrealInstituteRepository::new(db.clone()),
        auth_config,
    );
    let _allocator = StudentAllocator::new(SurrealStudentRepository::new(db.clone()));
    let _fees = FeeService::new(
        SurrealFeePaymentRepository::new(db.clone()),
        SurrealStudentRepository::new(db.clone()),
    );

    let notifier = match Fast2SmsConfig::from_env() {
        Some(config) => Some(Fast2SmsNotifier::new(config)?),
        None => {
            tracing::warn!("CLASSTRACK_SMS_API_KEY not set, absence SMS disabled");
            None
        }
    };
    let _attendance = AttendanceService::new(
        SurrealAttendanceRepository::new(db.clone()),
        SurrealStudentRepository::new(db),
        notifier,
    );

    // TODO: Start REST API server

    Ok(())
}
