//! Membership application intake and staff review for the HeartBeats band site.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
