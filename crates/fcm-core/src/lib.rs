//! # fcm-core: Foundational Types for Forensic Case Management
//!
//! Leaf crate of the workspace. Defines the identifier newtypes and the
//! UTC timestamp that every other crate builds on.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `EvidenceId`, `CaseId` and
//!    `UserId` are distinct types. No bare strings or UUIDs cross crate
//!    boundaries as identifiers.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] normalizes every input to UTC
//!    and renders ISO-8601 with a `Z` suffix, the representation the
//!    backing store persists for custody events.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fcm-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{CaseId, EvidenceId, UserId};
pub use temporal::Timestamp;
