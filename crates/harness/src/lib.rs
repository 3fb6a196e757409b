//! Building blocks for the cluster deployer end-to-end harness.
//!
//! The harness provisions a Kubernetes cluster through the terraform CLI,
//! validates the cluster and a deployed workload, and destroys everything it
//! created. Each lifecycle phase is a named, individually skippable stage so
//! a long-running test can be re-entered without redoing completed stages.

pub mod cluster;
pub mod config;
pub mod error;
mod process;
pub mod stage;
pub mod terraform;
pub mod workload;

pub use error::HarnessError;

#[cfg(test)]
mod tests;
