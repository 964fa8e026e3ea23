use orbit_core::config::{AppConfig, LoadOptions};
use orbit_documents::{locate_wkhtmltopdf, ReceiptDocxGenerator};
use serde::Serialize;

use crate::commands::CommandResult;

const EXIT_NOT_READY: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_NOT_READY };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_letterhead(&config));
            checks.push(check_receipt_template(&config));
            checks.push(check_pdf_converter(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["letterhead_asset", "receipt_template", "pdf_converter"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // A missing converter only downgrades quotations to HTML.
    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_letterhead(config: &AppConfig) -> DoctorCheck {
    let path = &config.documents.letterhead_path;
    if path.is_file() {
        DoctorCheck {
            name: "letterhead_asset",
            status: CheckStatus::Pass,
            details: format!("found `{}`", path.display()),
        }
    } else {
        DoctorCheck {
            name: "letterhead_asset",
            status: CheckStatus::Fail,
            details: format!("letterhead image `{}` not found", path.display()),
        }
    }
}

fn check_receipt_template(config: &AppConfig) -> DoctorCheck {
    let generator = ReceiptDocxGenerator::new(&config.documents.receipt_template_path);
    match generator.check_template() {
        Ok(()) => DoctorCheck {
            name: "receipt_template",
            status: CheckStatus::Pass,
            details: format!("`{}` is a usable DOCX template", generator.template_path().display()),
        },
        Err(error) => DoctorCheck {
            name: "receipt_template",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_pdf_converter(config: &AppConfig) -> DoctorCheck {
    match locate_wkhtmltopdf(config.documents.wkhtmltopdf_path.as_deref()) {
        Some(path) => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Pass,
            details: format!("wkhtmltopdf at `{}`", path.display()),
        },
        None => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Skipped,
            details: "wkhtmltopdf not found; quotations will be delivered as HTML".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
