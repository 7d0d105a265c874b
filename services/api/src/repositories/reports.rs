//! Report repository for image moderation

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewReport, Report, ReportStatus};

/// Report repository
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    /// Create a new report repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// File a report and flag the reported image in the same transaction,
    /// which hides the duel from the voting feed until moderation runs.
    pub async fn file(&self, reporter_id: Uuid, new_report: &NewReport) -> Result<Report> {
        info!(
            "Filing report against competition {} side {}",
            new_report.competition_id, new_report.image_side
        );

        let mut tx = self.pool.begin().await?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (competition_id, reporter_id, image_side, categories, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new_report.competition_id)
        .bind(reporter_id)
        .bind(new_report.image_side)
        .bind(&new_report.categories)
        .bind(new_report.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE competitions
            SET image1_flagged = image1_flagged OR $2 = 1,
                image2_flagged = image2_flagged OR $2 = 2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(new_report.competition_id)
        .bind(new_report.image_side)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(report)
    }

    /// List reports, optionally filtered by status, newest first
    pub async fn list(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE $1::report_status IS NULL OR status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }

    /// Mark a report resolved and lift the image flag once no other open
    /// report still targets the same image
    pub async fn resolve(&self, id: Uuid) -> Result<Option<Report>> {
        let mut tx = self.pool.begin().await?;

        let resolved = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET status = 'resolved'
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(report) = resolved else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE competitions c
            SET image1_flagged = image1_flagged AND ($2 <> 1 OR EXISTS (
                    SELECT 1 FROM reports r
                    WHERE r.competition_id = c.id AND r.image_side = 1 AND r.status = 'open'
                )),
                image2_flagged = image2_flagged AND ($2 <> 2 OR EXISTS (
                    SELECT 1 FROM reports r
                    WHERE r.competition_id = c.id AND r.image_side = 2 AND r.status = 'open'
                )),
                updated_at = NOW()
            WHERE c.id = $1
            "#,
        )
        .bind(report.competition_id)
        .bind(report.image_side)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(report))
    }
}
