//! Admission, metering and caching core for the Furrow gateway.
//!
//! - [`quota::QuotaStore`]: per-identity daily ceilings per category
//! - [`ledger::CostLedger`]: monthly spend with an at-or-above breaker
//! - [`gate::AdmissionGate`]: budget first, then quota
//! - [`cache::ResponseCache`]: identity-independent payload cache with TTL
//! - [`personalize::personalize`]: pure per-caller decoration
//! - [`service::Metering`]: the above behind one handle, plus the sweep task
//!
//! Nothing here performs I/O.  Time comes from an injected [`clock::Clock`].

pub mod cache;
pub mod clock;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod personalize;
pub mod quota;
pub mod service;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::MeteringError;
pub use gate::{AdmissionResult, Denial};
pub use service::Metering;
