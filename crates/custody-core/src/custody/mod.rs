//! Chain-of-custody state machine.
//!
//! Samples start in `pending`, move through custody transfers, are handed in
//! for testing, and end in `pass` or `fail`. Every transfer carries the
//! receiver's signature, sealed with the envelope codec before it is stored.

pub mod actor;
pub mod service;
pub mod status;

pub use actor::{Actor, Role};
pub use service::{
    CustodyPolicy, CustodyService, FinalStatusPolicy, StatusWriteMode, TransferRequest,
};
pub use status::{FinalStatus, SampleStatus, TransitionGuard};
