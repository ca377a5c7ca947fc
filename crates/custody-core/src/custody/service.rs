//! Custody service: the state machine wired to a store and the codec.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use super::actor::Actor;
use super::status::{FinalStatus, SampleStatus, TransitionGuard};
use crate::crypto::{open, seal_with, MasterSecret, OsRandom, RandomSource};
use crate::error::{CustodyError, Result};
use crate::storage::traits::CustodyStore;
use crate::storage::types::{CustodyTransfer, Location, NewSample, Sample, StatusUpdate};

/// Which statuses may receive a pass/fail decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatusPolicy {
    /// Only `submitted` samples may be decided.
    #[default]
    RequireSubmitted,
    /// `pending` and `in_custody_transfer` samples may also be decided; each
    /// such decision is logged as a warning.
    AllowAnyOpen,
}

/// How a transfer write and its status update are coupled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusWriteMode {
    /// The transfer is written first. A failed status update is logged and
    /// the transfer is still returned.
    #[default]
    BestEffort,
    /// Transfer and status update commit together or not at all.
    Transactional,
}

/// Tunable behavior of [`CustodyService`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyPolicy {
    #[serde(default)]
    pub final_status: FinalStatusPolicy,
    #[serde(default)]
    pub status_write: StatusWriteMode,
}

/// Input for [`CustodyService::create_transfer`].
///
/// `received_by` and `signature` are optional here so that missing values
/// surface as validation errors rather than at the call site.
#[derive(Clone)]
pub struct TransferRequest {
    pub sample_id: Uuid,
    pub transferred_by: String,
    pub received_by: Option<String>,
    pub signature: Option<Vec<u8>>,
    pub location: Option<Location>,
    /// Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransferRequest {
    pub fn new(sample_id: Uuid, transferred_by: impl Into<String>) -> Self {
        Self {
            sample_id,
            transferred_by: transferred_by.into(),
            received_by: None,
            signature: None,
            location: None,
            timestamp: None,
        }
    }

    pub fn received_by(mut self, user: impl Into<String>) -> Self {
        self.received_by = Some(user.into());
        self
    }

    pub fn signature(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.signature = Some(bytes.into());
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl std::fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRequest")
            .field("sample_id", &self.sample_id)
            .field("transferred_by", &self.transferred_by)
            .field("received_by", &self.received_by)
            .field(
                "signature",
                &self.signature.as_ref().map(|s| format!("[{} bytes]", s.len())),
            )
            .field("location", &self.location)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Chain-of-custody operations over a [`CustodyStore`].
pub struct CustodyService<S> {
    store: S,
    secret: Arc<MasterSecret>,
    rng: Box<dyn RandomSource>,
    policy: CustodyPolicy,
}

impl<S: CustodyStore> CustodyService<S> {
    pub fn new(store: S, secret: Arc<MasterSecret>) -> Self {
        Self {
            store,
            secret,
            rng: Box::new(OsRandom),
            policy: CustodyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CustodyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the random source used for sealing.
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> CustodyPolicy {
        self.policy
    }

    // --- Sample lifecycle ---

    /// Register a sample in `pending`.
    pub fn create_sample(&self, name: &str) -> Result<Sample> {
        let sample = self.store.insert_sample(&NewSample::new(name))?;
        tracing::info!(sample_id = %sample.id, "Registered sample");
        Ok(sample)
    }

    /// Fetch a live sample.
    pub fn sample(&self, sample_id: &Uuid) -> Result<Sample> {
        self.store
            .get_sample(sample_id)?
            .ok_or(CustodyError::SampleNotFound(*sample_id))
    }

    /// Soft-delete a sample. Its transfer history is kept.
    pub fn delete_sample(&self, sample_id: &Uuid) -> Result<()> {
        self.store.soft_delete_sample(sample_id)?;
        tracing::info!(sample_id = %sample_id, "Soft-deleted sample");
        Ok(())
    }

    // --- Transitions ---

    /// Record a physical handoff and move the sample into
    /// `in_custody_transfer`.
    ///
    /// The receiver's signature is sealed before it reaches the store.
    ///
    /// # Errors
    ///
    /// - `SampleNotFound` if the sample is absent or soft-deleted
    /// - `Validation` if the receiver or signature is missing or blank
    /// - `InvalidTransition` if the sample is `submitted`, `pass`, or `fail`
    pub fn create_transfer(&self, request: TransferRequest) -> Result<CustodyTransfer> {
        let TransferRequest {
            sample_id,
            transferred_by,
            received_by,
            signature,
            location,
            timestamp,
        } = request;
        let mut signature = signature;

        let sample = self.sample(&sample_id)?;

        let transferred_by = required_text(Some(transferred_by), "transferred_by")?;
        let received_by = required_text(received_by, "received_by")?;
        let signature_bytes = match signature.as_deref() {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(CustodyError::Validation(
                    "signature is required".to_string(),
                ))
            }
        };
        if let Some(loc) = location {
            Location::new(loc.latitude, loc.longitude)?;
        }

        let next = sample.status.on_transfer()?;

        let sealed = seal_with(self.rng.as_ref(), signature_bytes, &self.secret);
        if let Some(bytes) = signature.as_mut() {
            bytes.zeroize();
        }
        let transfer = CustodyTransfer {
            id: Uuid::new_v4(),
            sample_id,
            transferred_by,
            received_by,
            timestamp: timestamp.unwrap_or_else(Utc::now),
            location,
            sealed_signature: sealed?,
        };
        let update = StatusUpdate::new(next).guarded(TransitionGuard::TRANSFER);

        match self.policy.status_write {
            StatusWriteMode::Transactional => {
                self.store.insert_transfer_with_status(&transfer, &update)?;
            }
            StatusWriteMode::BestEffort => {
                self.store.insert_transfer(&transfer)?;
                if let Err(e) = self.store.update_sample_status(&sample_id, &update) {
                    tracing::warn!(
                        sample_id = %sample_id,
                        transfer_id = %transfer.id,
                        error = %e,
                        "Transfer recorded but sample status update failed"
                    );
                }
            }
        }

        tracing::debug!(
            sample_id = %sample_id,
            transfer_id = %transfer.id,
            "Recorded custody transfer"
        );
        Ok(transfer)
    }

    /// Hand a sample in for testing. Idempotent for `submitted` samples.
    pub fn mark_submitted(&self, sample_id: &Uuid) -> Result<Sample> {
        let sample = self.sample(sample_id)?;
        let next = sample.status.on_submit()?;
        if next == sample.status {
            return Ok(sample);
        }

        let update = StatusUpdate::new(next).guarded(TransitionGuard::SUBMIT);
        let updated = self.store.update_sample_status(sample_id, &update)?;
        tracing::debug!(sample_id = %sample_id, "Sample submitted");
        Ok(updated)
    }

    /// Record the pass/fail outcome of a sample.
    ///
    /// `status` must be exactly `pass` or `fail`. Blank notes are ignored.
    ///
    /// # Errors
    ///
    /// - `Validation` for any other status string
    /// - `PermissionDenied` unless the actor is privileged
    /// - `SampleNotFound` if the sample is absent or soft-deleted
    /// - `InvalidTransition` if the sample is already decided, or is not yet
    ///   submitted under [`FinalStatusPolicy::RequireSubmitted`]
    pub fn set_final_status(
        &self,
        actor: &Actor,
        sample_id: &Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Sample> {
        let outcome = FinalStatus::parse(status)?;
        actor.require_privileged("Recording a final status")?;
        let sample = self.sample(sample_id)?;

        let guard = match self.policy.final_status {
            FinalStatusPolicy::RequireSubmitted => TransitionGuard::DECIDE,
            FinalStatusPolicy::AllowAnyOpen => TransitionGuard::DECIDE_OPEN,
        };
        guard.check(sample.status)?;
        if sample.status != SampleStatus::Submitted {
            tracing::warn!(
                sample_id = %sample_id,
                from = %sample.status,
                actor = %actor.user_id,
                "Final status recorded for a sample that was never submitted"
            );
        }

        let mut update = StatusUpdate::new(outcome.into()).guarded(guard);
        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            update = update.with_notes(notes);
        }

        let updated = self.store.update_sample_status(sample_id, &update)?;
        tracing::debug!(
            sample_id = %sample_id,
            status = %updated.status,
            actor = %actor.user_id,
            "Recorded final status"
        );
        Ok(updated)
    }

    // --- Reads ---

    /// Transfers for a live sample, oldest first. Signatures stay sealed.
    pub fn transfer_history(&self, sample_id: &Uuid) -> Result<Vec<CustodyTransfer>> {
        self.sample(sample_id)?;
        self.store.list_transfers(sample_id)
    }

    /// Decrypt the signature on one transfer. Requires a privileged actor.
    pub fn open_signature(&self, actor: &Actor, transfer_id: &Uuid) -> Result<Vec<u8>> {
        actor.require_privileged("Opening a sealed signature")?;
        let transfer = self
            .store
            .get_transfer(transfer_id)?
            .ok_or(CustodyError::TransferNotFound(*transfer_id))?;

        let plaintext = open(&transfer.sealed_signature, &self.secret)?;
        tracing::info!(
            transfer_id = %transfer_id,
            actor = %actor.user_id,
            "Opened sealed signature"
        );
        Ok(plaintext)
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(CustodyError::Validation(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use chrono::TimeZone;

    use super::*;
    use crate::crypto::{open, IV_LENGTH, SALT_LENGTH};
    use crate::storage::sqlite::SqliteStore;
    use crate::storage::types::SampleFilter;

    /// Delegates to an in-memory store, optionally failing status writes or
    /// deciding a sample behind the caller's back.
    struct FlakyStore {
        inner: SqliteStore,
        fail_status: AtomicBool,
        pass_after_read: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                fail_status: AtomicBool::new(false),
                pass_after_read: AtomicBool::new(false),
            }
        }

        fn fail_status_writes(&self) {
            self.fail_status.store(true, Ordering::SeqCst);
        }

        /// The next `get_sample` returns what it read, then the sample is
        /// moved to `pass` as if another reviewer got there first.
        fn pass_after_next_read(&self) {
            self.pass_after_read.store(true, Ordering::SeqCst);
        }

        fn status_error(&self) -> Result<()> {
            if self.fail_status.load(Ordering::SeqCst) {
                return Err(CustodyError::Persistence("status write refused".to_string()));
            }
            Ok(())
        }
    }

    impl CustodyStore for FlakyStore {
        fn insert_sample(&self, sample: &NewSample) -> Result<Sample> {
            self.inner.insert_sample(sample)
        }

        fn get_sample(&self, id: &Uuid) -> Result<Option<Sample>> {
            let read = self.inner.get_sample(id)?;
            if self.pass_after_read.swap(false, Ordering::SeqCst) {
                self.inner
                    .update_sample_status(id, &StatusUpdate::new(SampleStatus::Pass))?;
            }
            Ok(read)
        }

        fn list_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>> {
            self.inner.list_samples(filter)
        }

        fn update_sample_status(&self, id: &Uuid, update: &StatusUpdate) -> Result<Sample> {
            self.status_error()?;
            self.inner.update_sample_status(id, update)
        }

        fn soft_delete_sample(&self, id: &Uuid) -> Result<()> {
            self.inner.soft_delete_sample(id)
        }

        fn insert_transfer(&self, transfer: &CustodyTransfer) -> Result<()> {
            self.inner.insert_transfer(transfer)
        }

        fn insert_transfer_with_status(
            &self,
            transfer: &CustodyTransfer,
            update: &StatusUpdate,
        ) -> Result<Sample> {
            self.status_error()?;
            self.inner.insert_transfer_with_status(transfer, update)
        }

        fn get_transfer(&self, id: &Uuid) -> Result<Option<CustodyTransfer>> {
            self.inner.get_transfer(id)
        }

        fn list_transfers(&self, sample_id: &Uuid) -> Result<Vec<CustodyTransfer>> {
            self.inner.list_transfers(sample_id)
        }

        fn check_integrity(&self) -> Result<()> {
            self.inner.check_integrity()
        }
    }

    fn secret() -> Arc<MasterSecret> {
        Arc::new(MasterSecret::new("service-test-secret").unwrap())
    }

    fn service() -> CustodyService<SqliteStore> {
        CustodyService::new(SqliteStore::open_in_memory().unwrap(), secret())
    }

    /// Log lines written by a scoped subscriber.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs.contents())
    }

    /// Fills every buffer with one byte value.
    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn fill(&self, buf: &mut [u8]) -> Result<()> {
            buf.fill(self.0);
            Ok(())
        }
    }

    fn handoff(sample_id: Uuid) -> TransferRequest {
        TransferRequest::new(sample_id, "userA")
            .received_by("userB")
            .signature(vec![0x01, 0x02, 0x03])
    }

    #[test]
    fn test_end_to_end_transfer_scenario() {
        let svc = service();
        let s1 = svc.create_sample("S1").unwrap();
        assert_eq!(s1.status, SampleStatus::Pending);

        let transfer = svc.create_transfer(handoff(s1.id)).unwrap();

        assert_eq!(
            open(&transfer.sealed_signature, &secret()).unwrap(),
            vec![0x01, 0x02, 0x03]
        );
        assert_eq!(
            svc.sample(&s1.id).unwrap().status,
            SampleStatus::InCustodyTransfer
        );
    }

    #[test]
    fn test_transfer_is_reentrant() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();

        svc.create_transfer(handoff(sample.id)).unwrap();
        svc.create_transfer(handoff(sample.id)).unwrap();

        assert_eq!(svc.transfer_history(&sample.id).unwrap().len(), 2);
        assert_eq!(
            svc.sample(&sample.id).unwrap().status,
            SampleStatus::InCustodyTransfer
        );
    }

    #[test]
    fn test_transfer_for_missing_sample() {
        let svc = service();
        let result = svc.create_transfer(handoff(Uuid::new_v4()));
        assert!(matches!(result, Err(CustodyError::SampleNotFound(_))));
    }

    #[test]
    fn test_transfer_for_deleted_sample_persists_nothing() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        svc.delete_sample(&sample.id).unwrap();

        let result = svc.create_transfer(handoff(sample.id));
        assert!(matches!(result, Err(CustodyError::SampleNotFound(_))));
        assert!(svc.store().list_transfers(&sample.id).unwrap().is_empty());
    }

    #[test]
    fn test_transfer_requires_receiver_and_signature() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();

        let no_receiver = TransferRequest::new(sample.id, "userA").signature(vec![1]);
        let blank_receiver = TransferRequest::new(sample.id, "userA")
            .received_by("   ")
            .signature(vec![1]);
        let no_signature = TransferRequest::new(sample.id, "userA").received_by("userB");
        let empty_signature = TransferRequest::new(sample.id, "userA")
            .received_by("userB")
            .signature(Vec::new());

        for request in [no_receiver, blank_receiver, no_signature, empty_signature] {
            assert!(matches!(
                svc.create_transfer(request),
                Err(CustodyError::Validation(_))
            ));
        }
        assert!(svc.store().list_transfers(&sample.id).unwrap().is_empty());
        assert_eq!(svc.sample(&sample.id).unwrap().status, SampleStatus::Pending);
    }

    #[test]
    fn test_transfer_rejects_out_of_range_location() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        let request = handoff(sample.id).location(Location {
            latitude: 120.0,
            longitude: 0.0,
        });
        assert!(matches!(
            svc.create_transfer(request),
            Err(CustodyError::Validation(_))
        ));
    }

    #[test]
    fn test_transfer_after_submit_rejected() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        svc.mark_submitted(&sample.id).unwrap();

        let result = svc.create_transfer(handoff(sample.id));
        assert!(matches!(
            result,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Submitted,
                ..
            })
        ));
        assert!(svc.store().list_transfers(&sample.id).unwrap().is_empty());
    }

    #[test]
    fn test_best_effort_keeps_transfer_when_status_write_fails() {
        let svc = CustodyService::new(FlakyStore::new(), secret());
        let sample = svc.create_sample("s").unwrap();
        svc.store().fail_status_writes();

        let (transfer, logs) = with_captured_logs(|| svc.create_transfer(handoff(sample.id)));
        let transfer = transfer.unwrap();

        let history = svc.transfer_history(&sample.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, transfer.id);
        assert_eq!(svc.sample(&sample.id).unwrap().status, SampleStatus::Pending);

        assert!(logs.contains("WARN"), "logs: {}", logs);
        assert!(logs.contains("sample status update failed"), "logs: {}", logs);
        assert!(logs.contains(&format!("sample_id={}", sample.id)), "logs: {}", logs);
        assert!(logs.contains(&format!("transfer_id={}", transfer.id)), "logs: {}", logs);
        assert!(logs.contains("status write refused"), "logs: {}", logs);
    }

    #[test]
    fn test_successful_transfer_logs_no_warning() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();

        let (result, logs) = with_captured_logs(|| svc.create_transfer(handoff(sample.id)));
        result.unwrap();
        assert!(!logs.contains("WARN"), "logs: {}", logs);
    }

    #[test]
    fn test_transfer_does_not_reopen_sample_decided_after_guard() {
        for mode in [StatusWriteMode::BestEffort, StatusWriteMode::Transactional] {
            let svc = CustodyService::new(FlakyStore::new(), secret()).with_policy(CustodyPolicy {
                status_write: mode,
                ..CustodyPolicy::default()
            });
            let sample = svc.create_sample("s").unwrap();
            svc.store().pass_after_next_read();

            let result = svc.create_transfer(handoff(sample.id));

            assert!(
                matches!(
                    result,
                    Err(CustodyError::InvalidTransition {
                        from: SampleStatus::Pass,
                        event: "transfer",
                    })
                ),
                "{:?}: {:?}",
                mode,
                result
            );
            assert_eq!(svc.sample(&sample.id).unwrap().status, SampleStatus::Pass);
            assert!(svc.transfer_history(&sample.id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_decision_does_not_overwrite_concurrent_decision() {
        let svc = CustodyService::new(FlakyStore::new(), secret());
        let sample = svc.create_sample("s").unwrap();
        svc.mark_submitted(&sample.id).unwrap();
        svc.store().pass_after_next_read();

        let result = svc.set_final_status(&Actor::admin("lab"), &sample.id, "fail", Some("late"));

        assert!(matches!(
            result,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pass,
                event: "decide",
            })
        ));
        let stored = svc.sample(&sample.id).unwrap();
        assert_eq!(stored.status, SampleStatus::Pass);
        assert!(stored.notes.is_none());
    }

    #[test]
    fn test_submit_does_not_reopen_sample_decided_after_guard() {
        let svc = CustodyService::new(FlakyStore::new(), secret());
        let sample = svc.create_sample("s").unwrap();
        svc.store().pass_after_next_read();

        assert!(matches!(
            svc.mark_submitted(&sample.id),
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pass,
                event: "submit",
            })
        ));
        assert_eq!(svc.sample(&sample.id).unwrap().status, SampleStatus::Pass);
    }

    #[test]
    fn test_random_source_drives_iv_and_salt() {
        let svc = service().with_random_source(Box::new(FixedRandom(0x5a)));
        let sample = svc.create_sample("s").unwrap();

        let transfer = svc.create_transfer(handoff(sample.id)).unwrap();

        assert_eq!(transfer.sealed_signature.iv, [0x5a; IV_LENGTH]);
        assert_eq!(transfer.sealed_signature.salt, [0x5a; SALT_LENGTH]);
        assert_eq!(
            svc.open_signature(&Actor::admin("lab"), &transfer.id).unwrap(),
            vec![0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn test_transactional_mode_surfaces_status_failure() {
        let svc = CustodyService::new(FlakyStore::new(), secret()).with_policy(CustodyPolicy {
            status_write: StatusWriteMode::Transactional,
            ..CustodyPolicy::default()
        });
        let sample = svc.create_sample("s").unwrap();
        svc.store().fail_status_writes();

        assert!(svc.create_transfer(handoff(sample.id)).is_err());
        assert!(svc.transfer_history(&sample.id).unwrap().is_empty());
    }

    #[test]
    fn test_transactional_mode_updates_status() {
        let svc = service().with_policy(CustodyPolicy {
            status_write: StatusWriteMode::Transactional,
            ..CustodyPolicy::default()
        });
        let sample = svc.create_sample("s").unwrap();
        svc.create_transfer(handoff(sample.id)).unwrap();
        assert_eq!(
            svc.sample(&sample.id).unwrap().status,
            SampleStatus::InCustodyTransfer
        );
    }

    #[test]
    fn test_history_is_ordered_and_sealed() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let second = svc
            .create_transfer(handoff(sample.id).at(base + chrono::Duration::hours(2)))
            .unwrap();
        let first = svc.create_transfer(handoff(sample.id).at(base)).unwrap();

        let history = svc.transfer_history(&sample.id).unwrap();
        assert_eq!(
            history.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        for transfer in &history {
            assert!(!transfer.sealed_signature.ciphertext.is_empty());
            assert_ne!(transfer.sealed_signature.ciphertext, vec![0x01, 0x02, 0x03]);
        }
    }

    #[test]
    fn test_history_for_missing_sample() {
        let svc = service();
        assert!(matches!(
            svc.transfer_history(&Uuid::new_v4()),
            Err(CustodyError::SampleNotFound(_))
        ));
    }

    #[test]
    fn test_mark_submitted_is_idempotent() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();

        let first = svc.mark_submitted(&sample.id).unwrap();
        let again = svc.mark_submitted(&sample.id).unwrap();

        assert_eq!(first.status, SampleStatus::Submitted);
        assert_eq!(again, first);
    }

    #[test]
    fn test_final_status_happy_path() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        svc.create_transfer(handoff(sample.id)).unwrap();
        svc.mark_submitted(&sample.id).unwrap();

        let decided = svc
            .set_final_status(&Actor::admin("lab"), &sample.id, "pass", Some("clean"))
            .unwrap();
        assert_eq!(decided.status, SampleStatus::Pass);
        assert_eq!(decided.notes.as_deref(), Some("clean"));
    }

    #[test]
    fn test_final_status_rejects_other_values() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        svc.mark_submitted(&sample.id).unwrap();

        let result = svc.set_final_status(&Actor::admin("lab"), &sample.id, "maybe", None);
        assert!(matches!(result, Err(CustodyError::Validation(_))));
        assert_eq!(
            svc.sample(&sample.id).unwrap().status,
            SampleStatus::Submitted
        );
    }

    #[test]
    fn test_final_status_requires_privilege() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        svc.mark_submitted(&sample.id).unwrap();

        let result = svc.set_final_status(&Actor::user("field"), &sample.id, "fail", None);
        assert!(matches!(result, Err(CustodyError::PermissionDenied(_))));
    }

    #[test]
    fn test_final_status_missing_sample() {
        let svc = service();
        let result = svc.set_final_status(&Actor::admin("lab"), &Uuid::new_v4(), "pass", None);
        assert!(matches!(result, Err(CustodyError::SampleNotFound(_))));
    }

    #[test]
    fn test_final_status_requires_submitted_by_default() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();

        let result = svc.set_final_status(&Actor::admin("lab"), &sample.id, "pass", None);
        assert!(matches!(
            result,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pending,
                event: "decide",
            })
        ));
    }

    #[test]
    fn test_allow_any_open_policy() {
        let svc = service().with_policy(CustodyPolicy {
            final_status: FinalStatusPolicy::AllowAnyOpen,
            ..CustodyPolicy::default()
        });
        let sample = svc.create_sample("s").unwrap();
        svc.create_transfer(handoff(sample.id)).unwrap();

        let decided = svc
            .set_final_status(&Actor::admin("lab"), &sample.id, "fail", None)
            .unwrap();
        assert_eq!(decided.status, SampleStatus::Fail);
    }

    #[test]
    fn test_decided_sample_cannot_be_redecided() {
        let svc = service().with_policy(CustodyPolicy {
            final_status: FinalStatusPolicy::AllowAnyOpen,
            ..CustodyPolicy::default()
        });
        let sample = svc.create_sample("s").unwrap();
        svc.set_final_status(&Actor::admin("lab"), &sample.id, "pass", None)
            .unwrap();

        let result = svc.set_final_status(&Actor::admin("lab"), &sample.id, "fail", None);
        assert!(matches!(
            result,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pass,
                ..
            })
        ));
    }

    #[test]
    fn test_open_signature_requires_privilege() {
        let svc = service();
        let sample = svc.create_sample("s").unwrap();
        let transfer = svc.create_transfer(handoff(sample.id)).unwrap();

        assert!(matches!(
            svc.open_signature(&Actor::user("userB"), &transfer.id),
            Err(CustodyError::PermissionDenied(_))
        ));
        assert_eq!(
            svc.open_signature(&Actor::admin("lab"), &transfer.id)
                .unwrap(),
            vec![0x01, 0x02, 0x03]
        );
        assert!(matches!(
            svc.open_signature(&Actor::admin("lab"), &Uuid::new_v4()),
            Err(CustodyError::TransferNotFound(_))
        ));
    }

    #[test]
    fn test_open_signature_with_wrong_secret() {
        let store = SqliteStore::open_in_memory().unwrap();
        let writer = CustodyService::new(store, secret());
        let sample = writer.create_sample("s").unwrap();
        let transfer = writer.create_transfer(handoff(sample.id)).unwrap();

        let other = Arc::new(MasterSecret::new("a different secret").unwrap());
        let reader = CustodyService::new(writer.store, other);
        assert!(matches!(
            reader.open_signature(&Actor::admin("lab"), &transfer.id),
            Err(CustodyError::Authentication)
        ));
    }

    #[test]
    fn test_transfer_request_debug_hides_signature() {
        let request = handoff(Uuid::new_v4());
        let debug = format!("{:?}", request);
        assert!(debug.contains("[3 bytes]"));
        assert!(!debug.contains("[1, 2, 3]"));
    }

    #[test]
    fn test_service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CustodyService<SqliteStore>>();
    }
}
