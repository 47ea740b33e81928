//! Test helpers: in-memory store and recording gateway

#![allow(dead_code)]

use rollcall::gateway::NotificationGateway;
use rollcall::store::{RosterStore, SqliteStore};
use rollcall::{
    ContactPolicy, DeliveryError, EngineError, HistoryRecord, PeriodDescriptor, PeriodStatus,
    Result, RosterEntry, RosterId, SubmissionRecord,
};
use rollcall_common::db::RosterRow;
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::TempDir;

pub const PERIOD: &str = "2026-10";
pub const FORM_LINK: &str = "https://forms.example.org/2026-10";

/// Store fake that counts every write
pub struct MemoryStore {
    pub period: Mutex<PeriodDescriptor>,
    pub roster: Vec<RosterEntry>,
    pub submissions: Vec<SubmissionRecord>,
    pub history: Mutex<Vec<HistoryRecord>>,
    pub status_writes: Mutex<Vec<PeriodStatus>>,
    pub history_writes: Mutex<usize>,
    pub last_history_write: Mutex<Vec<HistoryRecord>>,
    pub fail_history_read: bool,
}

impl MemoryStore {
    pub fn new(roster: Vec<RosterEntry>, submissions: Vec<SubmissionRecord>) -> Self {
        Self {
            period: Mutex::new(PeriodDescriptor {
                period_key: PERIOD.to_string(),
                form_link: FORM_LINK.to_string(),
                status: PeriodStatus::Pending,
            }),
            roster,
            submissions,
            history: Mutex::new(Vec::new()),
            status_writes: Mutex::new(Vec::new()),
            history_writes: Mutex::new(0),
            last_history_write: Mutex::new(Vec::new()),
            fail_history_read: false,
        }
    }

    pub fn status(&self) -> PeriodStatus {
        self.period.lock().unwrap().status
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.status_writes.lock().unwrap().len() + *self.history_writes.lock().unwrap()
    }
}

impl RosterStore for MemoryStore {
    async fn current_period_key(&self) -> Result<String> {
        Ok(self.period.lock().unwrap().period_key.clone())
    }

    async fn read_period(&self, period_key: &str) -> Result<PeriodDescriptor> {
        let period = self.period.lock().unwrap().clone();
        if period.period_key != period_key {
            return Err(EngineError::DataIntegrity(format!("period {} not found", period_key)));
        }
        Ok(period)
    }

    async fn read_roster(&self, _period_key: &str) -> Result<Vec<RosterEntry>> {
        Ok(self.roster.clone())
    }

    async fn read_submissions(&self, _period_key: &str) -> Result<Vec<SubmissionRecord>> {
        Ok(self.submissions.clone())
    }

    async fn read_history(&self) -> Result<Vec<HistoryRecord>> {
        if self.fail_history_read {
            return Err(EngineError::Transport("history unavailable".to_string()));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn write_period_status(&self, _period_key: &str, status: PeriodStatus) -> Result<()> {
        self.period.lock().unwrap().status = status;
        self.status_writes.lock().unwrap().push(status);
        Ok(())
    }

    async fn write_history(&self, rows: &[HistoryRecord]) -> Result<()> {
        self.history.lock().unwrap().extend_from_slice(rows);
        *self.last_history_write.lock().unwrap() = rows.to_vec();
        *self.history_writes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Gateway fake that records messages and can reject chosen addresses
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reject: HashSet<String>,
}

impl RecordingGateway {
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }
}

impl NotificationGateway for RecordingGateway {
    async fn send(&self, contact_address: &str, message_body: &str) -> std::result::Result<(), DeliveryError> {
        if self.reject.contains(contact_address) {
            return Err(DeliveryError::Rejected {
                status: 400,
                body: "invalid number".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((contact_address.to_string(), message_body.to_string()));
        Ok(())
    }
}

pub fn direct(id: i64, name: &str, address: &str) -> RosterEntry {
    RosterEntry::new(RosterId(id), name, ContactPolicy::Direct, address)
}

pub fn delegated(id: i64, name: &str, delegate: i64) -> RosterEntry {
    RosterEntry::new(
        RosterId(id),
        name,
        ContactPolicy::Delegated {
            delegate_id: RosterId(delegate),
        },
        "",
    )
}

pub fn inactive(id: i64, name: &str) -> RosterEntry {
    RosterEntry::new(RosterId(id), name, ContactPolicy::Inactive, "5550000000")
}

pub fn submission(name: &str) -> SubmissionRecord {
    SubmissionRecord::new(name, "2026-10-02 18:30:00")
}

/// Temporary SQLite store; keep the TempDir alive for the test's duration
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("rollcall_test.db");
    let store = SqliteStore::open(&db_path).await.unwrap();
    (temp_dir, store)
}

pub fn roster_row(id: i64, first: &str, last: &str, address: &str) -> RosterRow {
    RosterRow {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        active: true,
        direct_contact: true,
        delegate_id: None,
        contact_address: address.to_string(),
    }
}
