//! SQLite-backed roster/tracking store
//!
//! Rows are validated into domain types as they are read, so malformed
//! roster or period data fails here with a `DataIntegrity` error.

use super::RosterStore;
use crate::error::{EngineError, Result};
use crate::model::{
    ContactPolicy, HistoryRecord, Metric, MetricValue, PeriodDescriptor, PeriodStatus,
    RosterEntry, RosterId, SubmissionRecord,
};
use rollcall_common::db::{init_database, HistoryRow, PeriodRow, RosterRow, SubmissionRow};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

/// Roster store on top of the rollcall SQLite schema
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace one roster row
    pub async fn upsert_roster_entry(&self, row: &RosterRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO roster (id, first_name, last_name, active, direct_contact, delegate_id, contact_address)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                active = excluded.active,
                direct_contact = excluded.direct_contact,
                delegate_id = excluded.delegate_id,
                contact_address = excluded.contact_address,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(row.id)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(row.active)
        .bind(row.direct_contact)
        .bind(row.delegate_id)
        .bind(&row.contact_address)
        .execute(&self.pool)
        .await?;

        debug!(id = row.id, "Roster entry saved");
        Ok(())
    }

    /// Start tracking a period; the newest opened period is the current one
    ///
    /// Re-opening an existing period updates its links and keeps its status.
    pub async fn open_period(
        &self,
        period_key: &str,
        form_link: &str,
        response_link: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO periods (period_key, form_link, response_link, status)
            VALUES (?, ?, ?, 'pending')
            ON CONFLICT(period_key) DO UPDATE SET
                form_link = excluded.form_link,
                response_link = excluded.response_link
            "#,
        )
        .bind(period_key)
        .bind(form_link)
        .bind(response_link)
        .execute(&self.pool)
        .await?;

        info!(period = %period_key, "Period opened");
        Ok(())
    }

    /// Store one received submission for `period_key`
    ///
    /// Numeric metrics must be finite: JSON has no NaN or infinity, so such a
    /// value could not be read back.
    pub async fn record_submission(
        &self,
        period_key: &str,
        submission: &SubmissionRecord,
    ) -> Result<i64> {
        let non_finite = submission
            .metrics
            .iter()
            .find(|m| matches!(m.value, MetricValue::Number(n) if !n.is_finite()));
        if let Some(metric) = non_finite {
            return Err(EngineError::DataIntegrity(format!(
                "metric {} of {} is not a finite number",
                metric.name, submission.reported_identity
            )));
        }

        let metrics = serde_json::to_string(&submission.metrics)
            .map_err(|e| EngineError::Transport(format!("Encode metrics failed: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO submissions (period_key, submitted_at, reported_identity, metrics)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(period_key)
        .bind(&submission.submitted_at)
        .bind(&submission.reported_identity)
        .bind(metrics)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

impl RosterStore for SqliteStore {
    async fn current_period_key(&self) -> Result<String> {
        let key: Option<String> =
            sqlx::query_scalar("SELECT period_key FROM periods ORDER BY rowid DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        key.ok_or_else(|| EngineError::DataIntegrity("no period has been opened".to_string()))
    }

    async fn read_period(&self, period_key: &str) -> Result<PeriodDescriptor> {
        let row = sqlx::query_as::<_, PeriodRow>(
            "SELECT period_key, form_link, response_link, status FROM periods WHERE period_key = ?",
        )
        .bind(period_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::DataIntegrity(format!("period {} not found", period_key)))?;

        period_from_row(row)
    }

    async fn read_roster(&self, period_key: &str) -> Result<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT id, first_name, last_name, active, direct_contact, delegate_id, contact_address
            FROM roster
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(EngineError::DataIntegrity(format!(
                "roster for period {} is empty",
                period_key
            )));
        }

        rows.into_iter().map(roster_entry_from_row).collect()
    }

    async fn read_submissions(&self, period_key: &str) -> Result<Vec<SubmissionRecord>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, period_key, submitted_at, reported_identity, metrics
            FROM submissions
            WHERE period_key = ?
            ORDER BY id ASC
            "#,
        )
        .bind(period_key)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<SubmissionRecord> {
                Ok(SubmissionRecord {
                    metrics: decode_metrics(&row.metrics, "submission", row.id)?,
                    reported_identity: row.reported_identity,
                    submitted_at: row.submitted_at,
                })
            })
            .collect()
    }

    async fn read_history(&self) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT period_key, reported_identity, submitted_at, metrics
            FROM history
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .enumerate()
            .map(|(position, row)| -> Result<HistoryRecord> {
                Ok(HistoryRecord {
                    metrics: decode_metrics(&row.metrics, "history row", position as i64)?,
                    period_key: row.period_key,
                    reported_identity: row.reported_identity,
                    submitted_at: row.submitted_at,
                })
            })
            .collect()
    }

    async fn write_period_status(&self, period_key: &str, status: PeriodStatus) -> Result<()> {
        let result = sqlx::query("UPDATE periods SET status = ? WHERE period_key = ?")
            .bind(status.as_str())
            .bind(period_key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::DataIntegrity(format!(
                "period {} not found while writing status",
                period_key
            )));
        }

        info!(period = %period_key, status = %status, "Period status written");
        Ok(())
    }

    async fn write_history(&self, rows: &[HistoryRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for row in rows {
            let metrics = serde_json::to_string(&row.metrics)
                .map_err(|e| EngineError::Transport(format!("Encode metrics failed: {}", e)))?;

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO history (period_key, reported_identity, submitted_at, metrics)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&row.period_key)
            .bind(&row.reported_identity)
            .bind(&row.submitted_at)
            .bind(metrics)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(rows = inserted, "History rows appended");
        Ok(())
    }
}

/// Validate a roster row into a [`RosterEntry`]
pub(crate) fn roster_entry_from_row(row: RosterRow) -> Result<RosterEntry> {
    let full_name = format!("{} {}", row.first_name.trim(), row.last_name.trim())
        .trim()
        .to_string();

    if full_name.is_empty() {
        return Err(EngineError::DataIntegrity(format!(
            "roster id {} has no name",
            row.id
        )));
    }

    let policy = if !row.active {
        ContactPolicy::Inactive
    } else if row.direct_contact {
        ContactPolicy::Direct
    } else {
        match row.delegate_id {
            Some(delegate) if delegate == row.id => {
                return Err(EngineError::DataIntegrity(format!(
                    "{} (id {}) delegates to itself",
                    full_name, row.id
                )));
            }
            Some(delegate) => ContactPolicy::Delegated {
                delegate_id: RosterId(delegate),
            },
            None => {
                return Err(EngineError::DataIntegrity(format!(
                    "{} (id {}) cannot be contacted directly and has no delegate",
                    full_name, row.id
                )));
            }
        }
    };

    Ok(RosterEntry::new(
        RosterId(row.id),
        full_name,
        policy,
        row.contact_address,
    ))
}

fn period_from_row(row: PeriodRow) -> Result<PeriodDescriptor> {
    let status = PeriodStatus::parse(&row.status).ok_or_else(|| {
        EngineError::DataIntegrity(format!(
            "period {} has unknown status {:?}",
            row.period_key, row.status
        ))
    })?;

    Ok(PeriodDescriptor {
        period_key: row.period_key,
        form_link: row.form_link,
        status,
    })
}

fn decode_metrics(raw: &str, what: &str, id: i64) -> Result<Vec<Metric>> {
    serde_json::from_str(raw).map_err(|e| {
        EngineError::DataIntegrity(format!("{} {} has malformed metrics: {}", what, id, e))
    })
}
