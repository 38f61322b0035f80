//! Adapters between the outside world and the lifecycle service.

pub mod csv;
