//! Subcommand implementations

pub mod cloud_ranges;
pub mod combine;
pub mod convert;
pub mod distribution;
pub mod topology;
