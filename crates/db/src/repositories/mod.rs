//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool`, or `&mut PgConnection` when the call must run inside
//! a caller-owned transaction.

pub mod entry_repo;
pub mod vote_repo;

pub use entry_repo::EntryRepo;
pub use vote_repo::VoteRepo;
