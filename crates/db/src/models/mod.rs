//! Row structs and DTOs.
//!
//! Each submodule contains `FromRow` structs matching the columns a
//! repository selects, plus the DTOs it accepts for inserts.

pub mod entry;
pub mod vote;
