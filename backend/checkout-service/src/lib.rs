pub mod config;
pub mod payments;
pub mod service;
pub mod telemetry;
