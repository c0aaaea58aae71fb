//! Retention for Kubernetes Jobs.
//!
//! Lists the Jobs matching a label selector, keeps the most recent ones and
//! deletes (or, in dry-run mode, reports) the older Jobs that have succeeded.

pub mod cluster;
pub mod config;
pub mod models;
pub mod observability;
pub mod retention;

#[cfg(test)]
mod tests;
