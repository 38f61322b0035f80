//! Domain layer: item records, the transition engine and the storage port.

pub mod action;
pub mod audit;
pub mod engine;
pub mod item;
pub mod ports;
pub mod transaction;
