use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{MessageReport, ReportCounts};
use sqlx::{
    migrate,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, instrument};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("This message was already reported by this user")]
    AlreadyReported,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(path);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrated(pool).await
    }

    /// A fresh database that lives as long as its only connection.
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, Error> {
        migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn optimize(&self) -> Result<(), Error> {
        sqlx::query("pragma optimize;").execute(&self.pool).await?;
        Ok(())
    }

    /// Store a report, returning its row id.
    ///
    /// A user can only report a given message once, the second attempt is
    /// [`Error::AlreadyReported`].
    #[instrument(skip(self))]
    pub async fn add_message_report(&self, report: &MessageReport) -> Result<i64, Error> {
        let res = sqlx::query(
            "insert into MessageReports (message_id, reporter_id, reportee_id, reason, created_at) values (?, ?, ?, ?, ?)",
        )
        .bind(&report.message_id)
        .bind(&report.reporter_id)
        .bind(&report.reportee_id)
        .bind(&report.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;
        match res {
            Ok(r) => Ok(r.last_insert_rowid()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("duplicate report");
                Err(Error::AlreadyReported)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count_reports_for_message(&self, message_id: &str) -> Result<u64, Error> {
        self.count("select count(*) from MessageReports where message_id = ?", message_id)
            .await
    }

    pub async fn count_reports_against(&self, reportee_id: &str) -> Result<u64, Error> {
        self.count("select count(*) from MessageReports where reportee_id = ?", reportee_id)
            .await
    }

    pub async fn count_reports_by(&self, reporter_id: &str) -> Result<u64, Error> {
        self.count("select count(*) from MessageReports where reporter_id = ?", reporter_id)
            .await
    }

    async fn count(&self, sql: &'static str, key: &str) -> Result<u64, Error> {
        let n: i64 = sqlx::query_scalar(sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    /// The three counts shown next to a report. These are not read in a
    /// transaction, so concurrent reports may already be included.
    pub async fn report_counts(&self, report: &MessageReport) -> Result<ReportCounts, Error> {
        let (message, reportee, reporter) = tokio::try_join!(
            self.count_reports_for_message(&report.message_id),
            self.count_reports_against(&report.reportee_id),
            self.count_reports_by(&report.reporter_id),
        )?;
        Ok(ReportCounts {
            message,
            reportee,
            reporter,
        })
    }

    /// Newest reports against a user first.
    pub async fn recent_reports_against(
        &self,
        reportee_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredReport>, Error> {
        let rows: Vec<DBReport> = sqlx::query_as(
            "select id, message_id, reporter_id, reportee_id, reason, created_at from MessageReports where reportee_id = ? order by id desc limit ?",
        )
        .bind(reportee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DBReport::into_stored).collect())
    }
}

/// A report as it sits in the database.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub id: i64,
    pub report: MessageReport,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DBReport {
    id: i64,
    message_id: String,
    reporter_id: String,
    reportee_id: String,
    reason: String,
    created_at: DateTime<Utc>,
}

impl DBReport {
    fn into_stored(self) -> StoredReport {
        StoredReport {
            id: self.id,
            // straight from the table, no validation
            report: MessageReport {
                message_id: self.message_id,
                reporter_id: self.reporter_id,
                reportee_id: self.reportee_id,
                reason: self.reason,
            },
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, Error};
    use common::{MessageReport, ReportCounts};

    fn report(message: &str, reporter: &str, reportee: &str, reason: &str) -> MessageReport {
        MessageReport::new(message, reporter, reportee, reason).unwrap()
    }

    #[tokio::test]
    async fn first_report_counts_once() {
        let db = Database::in_memory().await.unwrap();
        let r = report("M", "A", "B", "spam");
        db.add_message_report(&r).await.unwrap();
        assert_eq!(
            db.report_counts(&r).await.unwrap(),
            ReportCounts {
                message: 1,
                reportee: 1,
                reporter: 1
            }
        );
    }

    #[tokio::test]
    async fn duplicate_report_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let r = report("M", "A", "B", "spam");
        db.add_message_report(&r).await.unwrap();
        let again = report("M", "A", "B", "different reason, same message");
        assert!(matches!(
            db.add_message_report(&again).await,
            Err(Error::AlreadyReported)
        ));
        assert_eq!(db.count_reports_for_message("M").await.unwrap(), 1);
        assert_eq!(db.recent_reports_against("B", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counts_are_independent() {
        let db = Database::in_memory().await.unwrap();
        db.add_message_report(&report("M1", "A", "B", "spam")).await.unwrap();
        db.add_message_report(&report("M1", "C", "B", "spam")).await.unwrap();
        db.add_message_report(&report("M2", "A", "B", "rude")).await.unwrap();
        db.add_message_report(&report("M3", "A", "D", "rude")).await.unwrap();

        let counts = db.report_counts(&report("M1", "C", "B", "x")).await.unwrap();
        assert_eq!(
            counts,
            ReportCounts {
                message: 2,
                reportee: 3,
                reporter: 1
            }
        );
        assert_eq!(db.count_reports_by("A").await.unwrap(), 3);
        assert_eq!(db.count_reports_against("D").await.unwrap(), 1);
        assert_eq!(db.count_reports_for_message("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recent_reports_newest_first() {
        let db = Database::in_memory().await.unwrap();
        db.add_message_report(&report("M1", "A", "B", "first")).await.unwrap();
        db.add_message_report(&report("M2", "A", "B", "second")).await.unwrap();
        db.add_message_report(&report("M3", "A", "B", "third")).await.unwrap();

        let recent = db.recent_reports_against("B", 2).await.unwrap();
        let reasons: Vec<_> = recent.iter().map(|r| r.report.reason.as_str()).collect();
        assert_eq!(reasons, vec!["third", "second"]);
        assert!(recent[0].id > recent[1].id);
    }

    #[tokio::test]
    async fn optimize_runs() {
        let db = Database::in_memory().await.unwrap();
        db.optimize().await.unwrap();
    }
}
