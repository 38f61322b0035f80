//! Application layer orchestrating the transition engine against a ledger store.
//!
//! `LifecycleService` is the single write path: it loads an item, asks the
//! engine for the next state and commits it with optimistic concurrency.
//! `TransactionBinder` guards the one-transaction-per-item rule and
//! `CommandRunner` replays batch files against the service.

pub mod binder;
pub mod runner;
pub mod service;
