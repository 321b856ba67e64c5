//! Domain logic for the showcase gallery.
//!
//! Everything here is pure: no database, no HTTP. The `db` crate persists
//! what this crate produces and the `api` crate wires both to the network.

pub mod entry;
pub mod error;
pub mod listing;
pub mod photo;
pub mod types;
pub mod voting;
