//! MemTable Module
//!
//! In-memory staging area for the rows of an open transaction.
//!
//! ## Responsibilities
//! - Collapse repeated upserts of the same id (last write wins)
//! - Track approximate size for logging
//! - Ordered iteration for table file creation
//!
//! ## Data Structure Choice
//! A `BTreeMap` keyed by record id: table files need sorted keys and the
//! owning transaction has exclusive access, so no locking is involved.

mod table;

pub use table::MemTable;
