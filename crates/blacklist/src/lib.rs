//! Adaptive failure memory.
//!
//! Remembers that interacting with a particular object keeps failing, without
//! excluding it forever: getting closer to it, or becoming more capable of
//! dealing with it, wipes the slate clean.

#![warn(missing_docs)]

pub mod config;
pub mod blacklist;

pub use config::BlacklistConfig;
pub use blacklist::{BlacklistEntry, ObjectBlacklist, Observation, PositionBlacklist};
