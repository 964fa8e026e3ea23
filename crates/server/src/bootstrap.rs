use std::sync::Arc;

use orbit_core::config::{AppConfig, ConfigError, DocumentsConfig, LoadOptions};
use orbit_core::cpq::catalog::Catalog;
use orbit_documents::{DocumentError, QuotationPdfGenerator, ReceiptDocxGenerator};
use thiserror::Error;
use tracing::{info, warn};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quotation template setup failed: {0}")]
    Templates(#[source] DocumentError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let quotation = quotation_generator(&config.documents)?;
    let receipt = ReceiptDocxGenerator::new(&config.documents.receipt_template_path);
    if let Err(error) = receipt.check_template() {
        warn!(
            event_name = "system.bootstrap.receipt_template_unusable",
            correlation_id = "bootstrap",
            path = %receipt.template_path().display(),
            error = %error,
            "receipt downloads will fail until the template is fixed"
        );
    }

    info!(
        event_name = "system.bootstrap.documents_ready",
        correlation_id = "bootstrap",
        pdf_converter = quotation.converter_path().is_some(),
        "document generators initialized"
    );

    let state = AppState {
        catalog: Arc::new(Catalog::standard()),
        quotation: Arc::new(quotation),
        receipt: Arc::new(receipt),
    };
    Ok(Application { config, state })
}

/// A configured template directory that cannot be loaded falls back to the embedded template.
fn quotation_generator(
    documents: &DocumentsConfig,
) -> Result<QuotationPdfGenerator, BootstrapError> {
    let letterhead = Some(documents.letterhead_path.clone());
    let converter = documents.wkhtmltopdf_path.as_deref();

    if let Some(template_dir) = documents.template_dir.as_deref() {
        match QuotationPdfGenerator::new(template_dir, letterhead.clone(), converter) {
            Ok(generator) => return Ok(generator),
            Err(error) => warn!(
                event_name = "system.bootstrap.template_dir_unusable",
                correlation_id = "bootstrap",
                template_dir = %template_dir.display(),
                error = %error,
                "using embedded quotation template"
            ),
        }
    }

    QuotationPdfGenerator::with_embedded_templates(letterhead, converter)
        .map_err(BootstrapError::Templates)
}

#[cfg(test)]
mod tests {
    use orbit_core::config::{ConfigOverrides, LoadOptions};
    use tempfile::TempDir;

    use crate::bootstrap::bootstrap;

    fn options(dir: &TempDir) -> LoadOptions {
        LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            overrides: ConfigOverrides {
                output_dir: Some(dir.path().join("out")),
                receipt_template_path: Some(dir.path().join("receipt.docx")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_succeeds_without_optional_assets() {
        let dir = TempDir::new().expect("tempdir");
        let app = bootstrap(options(&dir)).expect("bootstrap");

        assert_eq!(app.state.catalog.len(), 11);
        assert_eq!(app.state.receipt.template_path(), dir.path().join("receipt.docx"));
    }

    #[test]
    fn bootstrap_rejects_invalid_configuration() {
        let dir = TempDir::new().expect("tempdir");
        let mut options = options(&dir);
        options.overrides.receipt_template_path = Some(dir.path().join("receipt.txt"));

        let message = bootstrap(options).err().expect("invalid config").to_string();
        assert!(message.contains("receipt_template_path"));
    }
}
