//! # kc-provision
//!
//! Idempotent Keycloak realm provisioning.
//!
//! This crate provides:
//! - Readiness polling against the admin token endpoint
//! - Upsert of an OAuth public client (PKCE)
//! - Upsert of client roles
//! - Upsert of an admin user and assignment of a client role
//!
//! Every step looks before it creates, so a second run against the same realm
//! leaves it unchanged.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod provision;
pub mod report;
pub mod retry;

pub use cli::Cli;
pub use config::{ProvisionConfig, RetryPolicy, UserAssignment};
pub use error::{ProvisionError, ProvisionResult};
pub use provision::Provisioner;
pub use report::{RunReport, Step, StepOutcome};
