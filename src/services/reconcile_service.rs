use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{begin_write, courses, enrollments, progress};
use crate::error::AppError;

/// Rebuilds the derived enrollment state from the Enrollment collection.
pub struct ReconcileService {
    db: SqlitePool,
}

#[derive(Debug, Default, Serialize)]
pub struct ReconcileStats {
    pub enrolled_students_added: u64,
    pub enrolled_students_removed: u64,
    pub progress_rows_added: u64,
    pub progress_rows_removed: u64,
    pub enrollments_completed: u64,
    pub enrollments_reopened: u64,
}

impl ReconcileService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn run(&self) -> Result<ReconcileStats, AppError> {
        info!("Starting reconciliation...");
        let mut tx = begin_write(&self.db).await?;

        info!("Step 1: Rebuilding enrolled-student entries");
        let enrolled_students_added = courses::add_missing_enrolled_students(&mut *tx).await?;
        let enrolled_students_removed = courses::drop_stale_enrolled_students(&mut *tx).await?;

        info!("Step 2: Topping up progress rows");
        let progress_rows_added = progress::seed_missing_for_all_enrollments(&mut *tx).await?;

        info!("Step 3: Removing orphaned progress rows");
        let progress_rows_removed = progress::delete_orphaned_progress(&mut *tx).await?;

        info!("Step 4: Re-deriving enrollment status");
        let (enrollments_completed, enrollments_reopened) = enrollments::sync_completion(&mut *tx, None).await?;

        tx.commit().await?;

        let stats = ReconcileStats {
            enrolled_students_added,
            enrolled_students_removed,
            progress_rows_added,
            progress_rows_removed,
            enrollments_completed,
            enrollments_reopened,
        };
        info!("Reconciliation completed: {:?}", stats);
        Ok(stats)
    }
}
