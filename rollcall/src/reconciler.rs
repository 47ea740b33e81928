//! Reconciliation pass: the engine's single entry point
//!
//! Pipeline for the current period:
//! 1. read period; already complete -> stop (re-entrancy guard)
//! 2. read roster and submissions, normalize identities
//! 3. compute gaps and decide the period's terminal action
//! 4. check every delegation pointer, plan escalation jobs (fatal data
//!    errors abort here, nothing written)
//! 5. read history and merge
//! 6. send reminders, collecting per-recipient failures
//! 7. write history (only if rows were added), then the period status
//! 8. surface delivery failures as one aggregate error
//!
//! Re-running against unchanged store state is a no-op.

use crate::delegation::{build_index, check_delegations, normalize_address};
use crate::error::{DeliveryFailure, EngineError, Result};
use crate::gaps::compute_gaps;
use crate::gateway::{render_reminder, render_run_failure, NotificationGateway};
use crate::history::{find_duplicates, merge};
use crate::model::{EngineConfig, EscalationJob, PeriodDescriptor, RosterEntry};
use crate::normalize::normalize_submissions;
use crate::planner::plan;
use crate::status::{decide, is_settled, Decision};
use crate::store::RosterStore;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Period was already complete; nothing read beyond the descriptor
    AlreadyComplete { period_key: String },
    /// No gaps remained; period marked complete
    Completed {
        period_key: String,
        history_appended: usize,
    },
    /// Gaps remain; reminders sent, period still pending
    Escalated {
        period_key: String,
        jobs_sent: usize,
        history_appended: usize,
    },
}

/// Read-only view of what a run would do
#[derive(Debug, Clone)]
pub struct Preview {
    pub period: PeriodDescriptor,
    pub gaps: Vec<RosterEntry>,
    pub jobs: Vec<EscalationJob>,
    pub duplicates: Vec<String>,
}

/// Reconciliation engine bound to its collaborators
pub struct Reconciler<S, G> {
    store: S,
    gateway: G,
    config: EngineConfig,
}

impl<S: RosterStore, G: NotificationGateway> Reconciler<S, G> {
    pub fn new(store: S, gateway: G, config: EngineConfig) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One pass over the store's current period
    pub async fn run(&self) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        self.run_current()
            .instrument(info_span!("reconcile", %run_id))
            .await
    }

    async fn run_current(&self) -> Result<RunOutcome> {
        let period_key = self.store.current_period_key().await?;
        self.run_period(&period_key).await
    }

    /// One pass over `period_key`
    pub async fn run_period(&self, period_key: &str) -> Result<RunOutcome> {
        let period = self.store.read_period(period_key).await?;
        if is_settled(&period) {
            info!(period = %period_key, "All reports collected, nothing to do");
            return Ok(RunOutcome::AlreadyComplete {
                period_key: period_key.to_string(),
            });
        }

        let roster = self.store.read_roster(period_key).await?;
        let mut submissions = self.store.read_submissions(period_key).await?;
        normalize_submissions(&mut submissions);

        let duplicates = find_duplicates(&submissions);
        if !duplicates.is_empty() {
            warn!(period = %period_key, "Duplicate submissions: {:?}", duplicates);
        }

        let gaps = compute_gaps(&roster, &submissions);
        let decision = decide(&period, &gaps);
        info!(period = %period_key, submissions = submissions.len(), gaps = gaps.len(), "Gaps computed");

        let index = build_index(&roster)?;
        check_delegations(&index, &self.config)?;

        let jobs = match decision {
            Decision::Escalate { .. } => plan(&gaps, &index, &period.form_link, &self.config)?,
            _ => Vec::new(),
        };

        let history = self.store.read_history().await?;
        let merged = merge(history, period_key, &submissions);

        // Pure work done; side effects start here
        let failures = self.send_all(&jobs).await;
        let jobs_sent = jobs.len() - failures.len();

        if merged.is_noop() {
            info!(period = %period_key, "No new history rows");
        } else {
            self.store.write_history(merged.new_rows()).await?;
        }

        if let Some(status) = decision.status_write() {
            self.store.write_period_status(period_key, status).await?;
            info!(period = %period_key, "Report collection complete");
        }

        if !failures.is_empty() {
            return Err(EngineError::Delivery(failures));
        }

        let period_key = period_key.to_string();
        Ok(match decision {
            Decision::MarkComplete => RunOutcome::Completed {
                period_key,
                history_appended: merged.appended,
            },
            Decision::Escalate { .. } => RunOutcome::Escalated {
                period_key,
                jobs_sent,
                history_appended: merged.appended,
            },
            Decision::AlreadyComplete => RunOutcome::AlreadyComplete { period_key },
        })
    }

    /// Compute gaps and planned jobs for the current period without writing
    /// or sending anything
    pub async fn preview(&self) -> Result<Preview> {
        let period_key = self.store.current_period_key().await?;
        let period = self.store.read_period(&period_key).await?;
        if is_settled(&period) {
            return Ok(Preview {
                period,
                gaps: Vec::new(),
                jobs: Vec::new(),
                duplicates: Vec::new(),
            });
        }

        let roster = self.store.read_roster(&period_key).await?;
        let mut submissions = self.store.read_submissions(&period_key).await?;
        normalize_submissions(&mut submissions);

        let gaps = compute_gaps(&roster, &submissions);
        let index = build_index(&roster)?;
        check_delegations(&index, &self.config)?;
        let jobs = plan(&gaps, &index, &period.form_link, &self.config)?;

        Ok(Preview {
            duplicates: find_duplicates(&submissions),
            period,
            gaps,
            jobs,
        })
    }

    async fn send_all(&self, jobs: &[EscalationJob]) -> Vec<DeliveryFailure> {
        let mut failures = Vec::new();

        for job in jobs {
            let body = render_reminder(job, &self.config);
            match self.gateway.send(&job.target_contact_address, &body).await {
                Ok(()) => {
                    info!(subject = %job.subject_identity, "Reminder sent");
                }
                Err(detail) => {
                    error!(subject = %job.subject_identity, "Failed reminder: {}", detail);
                    failures.push(DeliveryFailure {
                        recipient: job.subject_identity.clone(),
                        contact_address: job.target_contact_address.clone(),
                        detail,
                    });
                }
            }
        }

        if !jobs.is_empty() {
            info!("Sent {} of {} reminders", jobs.len() - failures.len(), jobs.len());
        }

        failures
    }

    /// Report a run's result on the operator path
    ///
    /// Success is logged. Failures are logged and, when an operator address
    /// is configured, sent there through the gateway. Returns whether an
    /// operator alert was delivered.
    pub async fn report_outcome(&self, result: &Result<RunOutcome>) -> bool {
        let err = match result {
            Ok(outcome) => {
                info!("Run finished: {:?}", outcome);
                return false;
            }
            Err(err) => err,
        };

        error!("Run failed: {}", err);

        // Best effort: the key is unknown when reading it was what failed
        let period_key = self.store.current_period_key().await.ok();

        let operator = self
            .config
            .operator_address
            .as_deref()
            .map(|a| normalize_address(a, &self.config.region_code))
            .filter(|a| !a.is_empty());

        let Some(operator) = operator else {
            warn!("No operator address configured, failure reported to log only");
            return false;
        };

        let body = render_run_failure(period_key.as_deref(), err);
        match self.gateway.send(&operator, &body).await {
            Ok(()) => true,
            Err(detail) => {
                error!("Operator alert failed: {}", detail);
                false
            }
        }
    }
}
