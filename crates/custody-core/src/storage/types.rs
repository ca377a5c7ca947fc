//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::SealedBlob;
use crate::custody::{SampleStatus, TransitionGuard};
use crate::error::{CustodyError, Result};

/// A sample under custody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier for this sample
    pub id: Uuid,

    /// Free-text label (site, container number, etc.)
    pub name: String,

    /// Current lifecycle status
    pub status: SampleStatus,

    /// Reviewer notes recorded with the final status
    pub notes: Option<String>,

    /// When this sample was registered
    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,

    /// Soft-deletion marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Sample {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Builder for registering new samples.
#[derive(Debug, Clone)]
pub struct NewSample {
    /// Free-text label
    pub name: String,

    /// Optional: Override created_at timestamp
    pub created_at: Option<DateTime<Utc>>,
}

impl NewSample {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Where a handoff took place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build a location, rejecting out-of-range or non-finite coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CustodyError::Validation(format!(
                "Latitude must be between -90 and 90 (got {})",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CustodyError::Validation(format!(
                "Longitude must be between -180 and 180 (got {})",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One physical handoff of a sample. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct CustodyTransfer {
    /// Unique identifier for this transfer
    pub id: Uuid,

    /// Sample that changed hands
    pub sample_id: Uuid,

    /// User handing the sample over
    pub transferred_by: String,

    /// User taking the sample
    pub received_by: String,

    /// When the handoff happened
    pub timestamp: DateTime<Utc>,

    /// Optional geolocation of the handoff
    pub location: Option<Location>,

    /// Receiver's signature, sealed. Raw signatures are never stored.
    pub sealed_signature: SealedBlob,
}

/// A status write, optionally carrying reviewer notes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: SampleStatus,

    /// `None` leaves existing notes untouched.
    pub notes: Option<String>,

    /// Statuses the sample must still be in when the write lands.
    pub guard: Option<TransitionGuard>,
}

impl StatusUpdate {
    pub fn new(status: SampleStatus) -> Self {
        Self {
            status,
            notes: None,
            guard: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn guarded(mut self, guard: TransitionGuard) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Filter for listing samples.
#[derive(Debug, Clone, Default)]
pub struct SampleFilter {
    /// Filter by status
    pub status: Option<SampleStatus>,

    /// Include soft-deleted samples
    pub include_deleted: bool,

    /// Maximum number of results
    pub limit: Option<usize>,
}

impl SampleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: SampleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
