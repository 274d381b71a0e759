//! # fcm-custody: Chain-of-Custody Ledger
//!
//! Maintains the ordered, append-only sequence of custody events for one
//! evidence item and derives display state from it.
//!
//! - **Action** (`action.rs`): the closed set of custody actions plus
//!   free-form custom labels.
//! - **Event** (`event.rs`): the immutable `CustodyEvent`, its sparse
//!   persisted representation, and `StoredEntry` for entries as stored.
//! - **Classification** (`classify.rs`): presentation category of an
//!   action label. Pure; never persisted.
//! - **Store** (`store.rs`): the collaborator seams (record store, identity
//!   resolver, current-actor provider) and in-memory implementations in
//!   `memory.rs`.
//! - **Ledger** (`ledger.rs`): `register_evidence`, `append_entry` and
//!   `read_timeline`.
//! - **Timeline** (`timeline.rs`): resolved, display-ready entries.
//! - **Intake** (`intake.rs`): device-acquisition parsing and the seed log
//!   written when evidence is first recorded.
//!
//! ## Crate Policy
//!
//! - Depends on `fcm-core` internally; no transport code lives here.
//! - Events are never edited or removed once written.

pub mod action;
pub mod classify;
pub mod error;
pub mod event;
pub mod intake;
pub mod ledger;
pub mod memory;
pub mod store;
pub mod timeline;

pub use action::CustodyAction;
pub use classify::{classify_action, ActionCategory, ActionClass, ActionColor, ActionIcon};
pub use error::LedgerError;
pub use event::{CustodyEvent, EntryDetails, StoredEntry};
pub use intake::{EvidenceIntake, RegisteredEvidence};
pub use ledger::{ConcurrencyMode, CustodyLedger};
pub use memory::{MemoryDirectory, MemoryRecordStore, StaticActor};
pub use store::{
    ActorProfile, ActorProvider, CustodyRecord, CustodyWrite, IdentityResolver, NewEvidence,
    RecordStore, RecordVersion, StoreError, WriteOutcome,
};
pub use timeline::{ResolvedActor, Timeline, TimelineEntry};
