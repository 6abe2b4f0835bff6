//! Wiring & DI. Entry point: bootstrap the store, inject into services,
//! dispatch the CLI command. No business logic here.

use clap::Parser;
use registrar::adapters::cli::{self, Cli, Services};
use registrar::adapters::persistence::SqliteStore;
use registrar::ports::{CourseStore, EnrollmentStore, GradeStore, StudentStore};
use registrar::shared::config::AppConfig;
use registrar::usecases::{EnrollmentService, GradeService, ReportService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::load().unwrap_or_default();
    let data_dir = cfg.data_dir_or_default();
    info!(data_dir = %data_dir, "opening record store");

    let store = Arc::new(
        SqliteStore::connect(&data_dir)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {e}"))?,
    );
    let students: Arc<dyn StudentStore> = store.clone();
    let courses: Arc<dyn CourseStore> = store.clone();
    let enrollments: Arc<dyn EnrollmentStore> = store.clone();
    let grades: Arc<dyn GradeStore> = store.clone();

    let services = Services {
        enrollment: EnrollmentService::new(students.clone(), courses.clone(), enrollments.clone()),
        grades: GradeService::new(
            students.clone(),
            courses.clone(),
            enrollments,
            grades.clone(),
        ),
        reports: ReportService::new(students.clone(), grades),
        students,
        courses,
    };

    cli::run(cli, &services)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
}
