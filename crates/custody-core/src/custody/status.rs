//! Sample lifecycle states and the transitions between them.
//!
//! ```text
//! pending ──transfer──▶ in_custody_transfer ◀─┐
//!    │                      │     └──transfer──┘
//!    └──────submit──────────┴──submit──▶ submitted ──decide──▶ pass | fail
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CustodyError, Result};

/// Status of a sample under custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Pending,
    InCustodyTransfer,
    Submitted,
    Pass,
    Fail,
}

impl SampleStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [SampleStatus; 5] = [
        SampleStatus::Pending,
        SampleStatus::InCustodyTransfer,
        SampleStatus::Submitted,
        SampleStatus::Pass,
        SampleStatus::Fail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "pending",
            SampleStatus::InCustodyTransfer => "in_custody_transfer",
            SampleStatus::Submitted => "submitted",
            SampleStatus::Pass => "pass",
            SampleStatus::Fail => "fail",
        }
    }

    /// `pass` and `fail` are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SampleStatus::Pass | SampleStatus::Fail)
    }

    /// Status after a custody transfer is recorded.
    ///
    /// Re-entrant: a sample already in transfer stays in transfer.
    pub fn on_transfer(self) -> Result<SampleStatus> {
        TransitionGuard::TRANSFER.check(self)?;
        Ok(SampleStatus::InCustodyTransfer)
    }

    /// Status after the sample is handed in for testing.
    pub fn on_submit(self) -> Result<SampleStatus> {
        TransitionGuard::SUBMIT.check(self)?;
        Ok(SampleStatus::Submitted)
    }
}

/// The statuses an event may start from.
///
/// Services check a guard against the status they read; stores check it
/// again inside the write, so a status changed in between is not
/// overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionGuard {
    pub event: &'static str,
    pub allowed: &'static [SampleStatus],
}

impl TransitionGuard {
    pub const TRANSFER: TransitionGuard = TransitionGuard {
        event: "transfer",
        allowed: &[SampleStatus::Pending, SampleStatus::InCustodyTransfer],
    };

    pub const SUBMIT: TransitionGuard = TransitionGuard {
        event: "submit",
        allowed: &[
            SampleStatus::Pending,
            SampleStatus::InCustodyTransfer,
            SampleStatus::Submitted,
        ],
    };

    /// Decide a submitted sample.
    pub const DECIDE: TransitionGuard = TransitionGuard {
        event: "decide",
        allowed: &[SampleStatus::Submitted],
    };

    /// Decide any sample that is not yet decided.
    pub const DECIDE_OPEN: TransitionGuard = TransitionGuard {
        event: "decide",
        allowed: &[
            SampleStatus::Pending,
            SampleStatus::InCustodyTransfer,
            SampleStatus::Submitted,
        ],
    };

    pub fn permits(&self, from: SampleStatus) -> bool {
        self.allowed.contains(&from)
    }

    /// `InvalidTransition` unless `from` is allowed.
    pub fn check(&self, from: SampleStatus) -> Result<()> {
        if self.permits(from) {
            return Ok(());
        }
        Err(CustodyError::InvalidTransition {
            from,
            event: self.event,
        })
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleStatus {
    type Err = CustodyError;

    fn from_str(value: &str) -> Result<Self> {
        SampleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| CustodyError::Validation(format!("Unknown sample status: {}", value)))
    }
}

/// Outcome recorded by a privileged reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Pass,
    Fail,
}

impl FinalStatus {
    /// Parse a caller-supplied outcome. Only the exact strings `pass` and
    /// `fail` are accepted.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pass" => Ok(FinalStatus::Pass),
            "fail" => Ok(FinalStatus::Fail),
            other => Err(CustodyError::Validation(format!(
                "Final status must be 'pass' or 'fail' (got '{}')",
                other
            ))),
        }
    }
}

impl FromStr for FinalStatus {
    type Err = CustodyError;

    fn from_str(value: &str) -> Result<Self> {
        FinalStatus::parse(value)
    }
}

impl From<FinalStatus> for SampleStatus {
    fn from(value: FinalStatus) -> Self {
        match value {
            FinalStatus::Pass => SampleStatus::Pass,
            FinalStatus::Fail => SampleStatus::Fail,
        }
    }
}
