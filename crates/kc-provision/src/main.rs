//! # Keycloak Provisioner
//!
//! Waits for Keycloak, then provisions the configured client, roles and user.

#![forbid(unsafe_code)]
#![deny(warnings)]

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kc_provision::{
    cli::{Cli, OutputFormat},
    output::{error, info, output_report, success, summary_block, warning},
    ProvisionConfig, Provisioner,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "kc_provision=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match ProvisionConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };
    cli.apply(&mut config);

    let provisioner = match Provisioner::new(config) {
        Ok(p) => p,
        Err(e) => {
            error(&e.to_string());
            std::process::exit(1);
        }
    };

    let human = cli.output == OutputFormat::Table;
    if human {
        info("Waiting for Keycloak to be ready...");
    }

    let report = match provisioner.run().await {
        Ok(report) => report,
        Err(e) => {
            error(&e.to_string());
            std::process::exit(1);
        }
    };

    if let Err(e) = output_report(&report, cli.output) {
        error(&e.to_string());
        std::process::exit(1);
    }

    if human {
        if report.has_warnings() {
            warning("Setup completed with warnings");
        } else {
            success("Setup completed successfully!");
        }
        if let Some(assignment) = &provisioner.config().user {
            println!("{}", summary_block(assignment));
        }
    }
}
