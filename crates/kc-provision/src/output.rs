//! Output formatting utilities.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;
use crate::config::UserAssignment;
use crate::report::{RunReport, StepOutcome, StepReport};

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Report row for table display.
#[derive(Debug, Tabled)]
struct ReportRow {
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&StepReport> for ReportRow {
    fn from(report: &StepReport) -> Self {
        Self {
            step: report.step.to_string(),
            target: report.target.clone(),
            status: report.outcome.label().to_string(),
            detail: report.outcome.detail().unwrap_or_default().to_string(),
        }
    }
}

/// Renders the run report as a table.
#[must_use]
pub fn report_table(report: &RunReport) -> String {
    let rows: Vec<ReportRow> = report.steps.iter().map(ReportRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Outputs the run report in the specified format.
pub fn output_report(report: &RunReport, format: OutputFormat) -> crate::ProvisionResult<()> {
    match format {
        OutputFormat::Table => {
            for step in &report.steps {
                let line = format!("{} '{}': {}", step.step, step.target, step.outcome.label());
                match &step.outcome {
                    StepOutcome::Warning(detail) => warning(&format!("{line} ({detail})")),
                    StepOutcome::Skipped(detail) => info(&format!("{line} ({detail})")),
                    _ => success(&line),
                }
            }
            if !report.steps.is_empty() {
                println!("{}", report_table(report));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Renders the provisioned admin user's credentials block.
#[must_use]
pub fn summary_block(assignment: &UserAssignment) -> String {
    let user = &assignment.user;
    let rule = "=".repeat(50);
    let mut lines = vec![rule.clone(), "Provisioned Admin User:".to_string()];
    lines.push(format!("  Username: {}", user.username));
    if let Some(password) = user.initial_password() {
        lines.push(format!("  Password: {password}"));
    }
    if let Some(email) = &user.email {
        lines.push(format!("  Email: {email}"));
    }
    lines.push(format!("  Client Role: {}", assignment.client_role));
    lines.push(rule);
    lines.join("\n")
}
