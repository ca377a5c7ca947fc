//! Store trait definition.
//!
//! `CustodyStore` is the durable collaborator behind the custody state
//! machine. The core never talks to a database directly; any backend that
//! implements this trait can carry samples and transfer records.

use uuid::Uuid;

use super::types::{CustodyTransfer, NewSample, Sample, SampleFilter, StatusUpdate};
use crate::error::Result;

/// Durable storage for samples and custody transfers.
///
/// All implementations must ensure:
/// - Each `insert_transfer` call writes exactly one record, atomically
/// - Transfer records are never updated or deleted
/// - Sealed signatures are stored exactly as given (no re-encoding)
/// - Soft-deleted samples are invisible to `get_sample`
/// - Status guards and the transfer guard are checked in the same atomic
///   unit as the write they protect
pub trait CustodyStore: Send + Sync {
    // --- Sample operations ---

    /// Register a new sample in `pending`.
    fn insert_sample(&self, sample: &NewSample) -> Result<Sample>;

    /// Get a sample by ID.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the sample does not exist or is soft-deleted.
    fn get_sample(&self, id: &Uuid) -> Result<Option<Sample>>;

    /// List samples, oldest first.
    fn list_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>>;

    /// Set the status (and optionally notes) of a live sample.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::SampleNotFound` if the sample is absent or
    /// soft-deleted, and `CustodyError::InvalidTransition` if the update
    /// carries a guard the current status does not pass.
    fn update_sample_status(&self, id: &Uuid, update: &StatusUpdate) -> Result<Sample>;

    /// Mark a sample deleted. Its transfers stay on record.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::SampleNotFound` if the sample is absent or
    /// already soft-deleted.
    fn soft_delete_sample(&self, id: &Uuid) -> Result<()>;

    // --- Transfer operations ---

    /// Persist one transfer record.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::SampleNotFound` if the referenced sample is
    /// absent or soft-deleted at write time, and
    /// `CustodyError::InvalidTransition` if its status no longer accepts a
    /// transfer.
    fn insert_transfer(&self, transfer: &CustodyTransfer) -> Result<()>;

    /// Persist a transfer record and a status update as one unit.
    ///
    /// Either both writes land or neither does. Guards are checked as in
    /// `insert_transfer` and `update_sample_status`.
    fn insert_transfer_with_status(
        &self,
        transfer: &CustodyTransfer,
        update: &StatusUpdate,
    ) -> Result<Sample>;

    /// Get a transfer by ID.
    fn get_transfer(&self, id: &Uuid) -> Result<Option<CustodyTransfer>>;

    /// List transfers for a sample, ordered by timestamp ascending.
    fn list_transfers(&self, sample_id: &Uuid) -> Result<Vec<CustodyTransfer>>;

    // --- Maintenance operations ---

    /// Check store integrity.
    ///
    /// Verifies:
    /// - Backend consistency checks pass
    /// - Every transfer references an existing sample
    /// - Every stored signature parses as a sealed blob
    fn check_integrity(&self) -> Result<()>;
}
