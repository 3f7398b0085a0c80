//! Append-only audit log of typed records.
//!
//! Each deployed component owns one log. Entries get a gap-free sequence
//! number and are never modified or removed. The log can be fingerprinted
//! with [`EventLog::digest`], a SHA-256 chain over every entry, so two
//! replicas that replayed the same calls can compare a single hash.

use chrono::Utc;
use flewpay_types::{AccountId, EventRecord, LedgerEvent, constants};
use sha2::{Digest, Sha256};

/// Append-only list of [`EventRecord`]s for one emitter.
#[derive(Debug, Clone)]
pub struct EventLog {
    emitter: AccountId,
    records: Vec<EventRecord>,
}

impl EventLog {
    #[must_use]
    pub fn new(emitter: AccountId) -> Self {
        Self {
            emitter,
            records: Vec::new(),
        }
    }

    /// Append a committed event.
    pub fn append(&mut self, event: LedgerEvent) -> &EventRecord {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            emitter: self.emitter,
            event,
            recorded_at: Utc::now(),
        });
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn emitter(&self) -> AccountId {
        self.emitter
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.records.len());
        &self.records[start..]
    }

    #[must_use]
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// Events with the given name, in log order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LedgerEvent> + 'a {
        self.records
            .iter()
            .map(|r| &r.event)
            .filter(move |e| e.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// SHA-256 chain over `(sequence, event)` of every entry.
    ///
    /// Timestamps are excluded: replicas replaying the same calls agree.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut acc = [0u8; 32];
        for record in &self.records {
            let mut hasher = Sha256::new();
            hasher.update(constants::EVENT_LOG_DOMAIN);
            hasher.update(acc);
            hasher.update(record.sequence.to_le_bytes());
            hasher.update(record.emitter.as_bytes());
            // Events hold only addresses, amounts and enums; serialization cannot fail.
            let payload = serde_json::to_vec(&record.event).unwrap_or_default();
            hasher.update(&payload);
            acc = hasher.finalize().into();
        }
        acc
    }

    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
