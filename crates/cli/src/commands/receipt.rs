use std::path::Path;

use chrono::Local;
use orbit_core::cpq::catalog::Catalog;
use orbit_core::domain::receipt::ReceiptForm;
use orbit_documents::{write_atomically, ReceiptDocxGenerator};

use crate::commands::{load_config, read_form, CommandResult, EXIT_DOCUMENT};

const COMMAND: &str = "receipt";

pub fn run(input: &Path, output_dir: Option<&Path>) -> CommandResult {
    match execute(input, output_dir) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(input: &Path, output_dir: Option<&Path>) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND)?;
    let form: ReceiptForm = read_form(COMMAND, input)?;
    let today = Local::now().date_naive();
    let receipt = form
        .parse(&Catalog::standard(), today)
        .map_err(|error| CommandResult::invalid_input(COMMAND, &error))?;

    let generator = ReceiptDocxGenerator::new(&config.documents.receipt_template_path);
    let written = generator
        .render(&receipt)
        .and_then(|bytes| {
            let directory = output_dir.unwrap_or(config.documents.output_dir.as_path());
            write_atomically(directory, &receipt.output_filename(), &bytes)
        })
        .map_err(|error| {
            CommandResult::failure(
                COMMAND,
                "document",
                format!("document generation failed: {error}"),
                EXIT_DOCUMENT,
            )
        })?;

    Ok(CommandResult::success(
        COMMAND,
        format!("proforma receipt {} written to {}", receipt.receipt_no, written.display()),
    ))
}
