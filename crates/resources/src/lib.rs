#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock-avoiding resource allocation for the banker allocator
//!
//! This crate holds the Banker's-algorithm core: the allocation tables
//! ([`ResourceState`]), the safety check ([`SafetyChecker`]) and the
//! thread-safe façade that grants and releases units ([`AllocationManager`]).
//! A request is granted only if the resulting state still admits an order in
//! which every process can obtain its declared maximum and finish.

pub mod manager;
pub mod safety;
pub mod state;

pub use manager::AllocationManager;
pub use safety::{SafetyChecker, SafetyVerdict};
pub use state::ResourceState;
