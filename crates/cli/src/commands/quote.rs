use std::path::{Path, PathBuf};

use orbit_core::config::DocumentsConfig;
use orbit_core::forms::QuoteForm;
use orbit_documents::{write_atomically, DocumentError, QuotationPdfGenerator};

use crate::commands::{load_config, read_form, runtime, CommandResult, EXIT_DOCUMENT};

const COMMAND: &str = "quote";

pub fn run(input: &Path, output: Option<&Path>, preview: bool) -> CommandResult {
    match execute(input, output, preview) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(
    input: &Path,
    output: Option<&Path>,
    preview: bool,
) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND)?;
    let form: QuoteForm = read_form(COMMAND, input)?;
    let state =
        form.into_state().map_err(|error| CommandResult::invalid_input(COMMAND, &error))?;

    if preview {
        let summary = serde_json::to_string_pretty(&state.summary()).map_err(|error| {
            CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_DOCUMENT)
        })?;
        return Ok(CommandResult { exit_code: 0, output: summary });
    }

    let quotation =
        state.finalize().map_err(|error| CommandResult::invalid_input(COMMAND, &error))?;
    let generator = build_generator(&config.documents).map_err(document_failure)?;

    let runtime = runtime(COMMAND)?;
    let document = runtime.block_on(generator.generate(&quotation)).map_err(document_failure)?;

    let destination = destination(
        output,
        &config.documents.output_dir,
        document.file_name(),
        document.is_pdf(),
    );
    let directory = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.file_name().to_owned());

    let format = if document.is_pdf() { "PDF" } else { "HTML (wkhtmltopdf unavailable)" };
    let written = write_atomically(&directory, &file_name, &document.into_bytes())
        .map_err(document_failure)?;

    Ok(CommandResult::success(
        COMMAND,
        format!(
            "quotation for {} written as {format} to {}",
            quotation.customer_name,
            written.display()
        ),
    ))
}

fn build_generator(
    documents: &DocumentsConfig,
) -> Result<QuotationPdfGenerator, DocumentError> {
    let letterhead = Some(documents.letterhead_path.clone());
    let converter = documents.wkhtmltopdf_path.as_deref();
    match documents.template_dir.as_deref() {
        Some(template_dir) => QuotationPdfGenerator::new(template_dir, letterhead, converter),
        None => QuotationPdfGenerator::with_embedded_templates(letterhead, converter),
    }
}

/// Explicit output wins; an HTML fallback swaps a `.pdf` extension for `.html`.
fn destination(
    output: Option<&Path>,
    output_dir: &Path,
    default_name: &str,
    is_pdf: bool,
) -> PathBuf {
    match output {
        Some(path) if !is_pdf && path.extension().is_some_and(|extension| extension == "pdf") => {
            path.with_extension("html")
        }
        Some(path) => path.to_path_buf(),
        None => output_dir.join(default_name),
    }
}

fn document_failure(error: DocumentError) -> CommandResult {
    CommandResult::failure(
        COMMAND,
        "document",
        format!("document generation failed: {error}"),
        EXIT_DOCUMENT,
    )
}
