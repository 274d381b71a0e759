//! # Route Modules
//!
//! | Prefix | Module |
//! |--------|--------|
//! | `/v1/evidence/{evidence_id}/custody` | [`custody`] |
//! | `/v1/custody/*` | [`custody`] |

pub mod custody;
