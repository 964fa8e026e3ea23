//! Quotation documents.
//!
//! The quotation is rendered as HTML from a Tera template and converted to
//! PDF with `wkhtmltopdf`. When the converter is missing or fails, the HTML
//! itself is returned so it can still be printed from a browser.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

use orbit_core::domain::quote::QuotationResult;

use crate::error::DocumentError;
use crate::format::{register_template_filters, CURRENCY_LABEL};

pub const QUOTATION_TEMPLATE: &str = "quotation.html.tera";
pub const QUOTATION_FILE_NAME: &str = "Orbit_Quotation.pdf";
pub const QUOTATION_HTML_FILE_NAME: &str = "Orbit_Quotation.html";
const QUOTATION_TITLE: &str = "Quotation Summary";

/// Converter binary: the configured path when given, otherwise `wkhtmltopdf` on `PATH`.
pub fn locate_wkhtmltopdf(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => which::which("wkhtmltopdf").ok(),
    }
}

#[derive(Clone, Debug)]
pub struct QuotationPdfGenerator {
    tera: Tera,
    letterhead_path: Option<PathBuf>,
    wkhtmltopdf_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuotationDocument {
    Pdf(Vec<u8>),
    Html(String),
}

impl QuotationDocument {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "application/pdf",
            Self::Html(_) => "text/html; charset=utf-8",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Pdf(_) => QUOTATION_FILE_NAME,
            Self::Html(_) => QUOTATION_HTML_FILE_NAME,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf(_))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Pdf(bytes) => bytes,
            Self::Html(html) => html.into_bytes(),
        }
    }
}

#[derive(Serialize)]
struct QuotationView<'a> {
    title: &'static str,
    currency: &'static str,
    letterhead_url: Option<String>,
    quotation: &'a QuotationResult,
}

impl QuotationPdfGenerator {
    /// Loads every template under `template_dir`.
    pub fn new(
        template_dir: &Path,
        letterhead_path: Option<PathBuf>,
        wkhtmltopdf_path: Option<&Path>,
    ) -> Result<Self, DocumentError> {
        let pattern = format!("{}/**/*", template_dir.display());
        let mut tera = Tera::new(&pattern)?;
        configure(&mut tera);
        if !tera.get_template_names().any(|name| name == QUOTATION_TEMPLATE) {
            return Err(DocumentError::MissingAsset(template_dir.join(QUOTATION_TEMPLATE)));
        }

        Ok(Self::from_parts(tera, letterhead_path, wkhtmltopdf_path))
    }

    /// Uses the template compiled into the binary.
    pub fn with_embedded_templates(
        letterhead_path: Option<PathBuf>,
        wkhtmltopdf_path: Option<&Path>,
    ) -> Result<Self, DocumentError> {
        let mut tera = Tera::default();
        configure(&mut tera);
        tera.add_raw_template(
            QUOTATION_TEMPLATE,
            include_str!("../templates/quotation.html.tera"),
        )?;

        Ok(Self::from_parts(tera, letterhead_path, wkhtmltopdf_path))
    }

    fn from_parts(
        tera: Tera,
        letterhead_path: Option<PathBuf>,
        wkhtmltopdf_path: Option<&Path>,
    ) -> Self {
        let wkhtmltopdf_path = locate_wkhtmltopdf(wkhtmltopdf_path);
        match &wkhtmltopdf_path {
            Some(path) => info!(path = %path.display(), "wkhtmltopdf found"),
            None => warn!("wkhtmltopdf not found - quotations will be delivered as HTML"),
        }

        let letterhead_path = letterhead_path.filter(|path| {
            let exists = path.exists();
            if !exists {
                warn!(path = %path.display(), "letterhead not found - rendering without it");
            }
            exists
        });

        Self { tera, letterhead_path, wkhtmltopdf_path }
    }

    /// Forces HTML output regardless of what is installed.
    pub fn without_converter(mut self) -> Self {
        self.wkhtmltopdf_path = None;
        self
    }

    pub fn converter_path(&self) -> Option<&Path> {
        self.wkhtmltopdf_path.as_deref()
    }

    pub fn render_html(&self, quotation: &QuotationResult) -> Result<String, DocumentError> {
        let letterhead_url = self
            .letterhead_path
            .as_deref()
            .map(|path| path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
            .map(|path| format!("file://{}", path.display()));

        let view = QuotationView {
            title: QUOTATION_TITLE,
            currency: CURRENCY_LABEL,
            letterhead_url,
            quotation,
        };
        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(QUOTATION_TEMPLATE, &context)?)
    }

    /// Renders the quotation and converts it to PDF when a converter is available.
    pub async fn generate(
        &self,
        quotation: &QuotationResult,
    ) -> Result<QuotationDocument, DocumentError> {
        let html = self.render_html(quotation)?;

        let Some(wkhtmltopdf) = self.wkhtmltopdf_path.as_deref() else {
            return Ok(QuotationDocument::Html(html));
        };

        match convert_html_to_pdf(&html, wkhtmltopdf).await {
            Ok(bytes) => Ok(QuotationDocument::Pdf(bytes)),
            Err(error) => {
                warn!(error = %error, "PDF conversion failed, falling back to HTML");
                Ok(QuotationDocument::Html(html))
            }
        }
    }
}

fn configure(tera: &mut Tera) {
    tera.autoescape_on(vec![".html.tera", ".html"]);
    register_template_filters(tera);
}

async fn convert_html_to_pdf(html: &str, wkhtmltopdf: &Path) -> Result<Vec<u8>, DocumentError> {
    // Dropping the directory removes both files on every exit path.
    let workdir = tempfile::tempdir()?;
    let html_path = workdir.path().join("quotation.html");
    let pdf_path = workdir.path().join("quotation.pdf");

    tokio::fs::write(&html_path, html).await?;

    let output = Command::new(wkhtmltopdf)
        .args(["--page-size", "A4"])
        .args(["--margin-top", "0", "--margin-bottom", "0"])
        .args(["--margin-left", "0", "--margin-right", "0"])
        .args(["--encoding", "utf-8"])
        .arg("--enable-local-file-access")
        .arg(&html_path)
        .arg(&pdf_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(stderr = %stderr, "wkhtmltopdf failed");
        return Err(DocumentError::Conversion(stderr.into_owned()));
    }

    let bytes = tokio::fs::read(&pdf_path).await?;
    info!(event_name = "documents.quotation.converted", size = bytes.len(), "PDF generated");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use orbit_core::domain::quote::{LineItem, QuotationResult};
    use tempfile::TempDir;

    use super::{QuotationDocument, QuotationPdfGenerator, QUOTATION_TEMPLATE};
    use crate::error::DocumentError;

    fn quotation() -> QuotationResult {
        QuotationResult {
            customer_name: "Ravi <Kumar>".to_owned(),
            customer_address: "Mandya, Karnataka".to_owned(),
            customer_phone: "9876543210".to_owned(),
            line_items: vec![
                LineItem { name: "12 HP PT Pro incl Dead Weight".to_owned(), quantity: 1 },
                LineItem { name: "Battery Sets".to_owned(), quantity: 2 },
            ],
            gross_total: 224_000,
            subsidy_applied: 75_000,
            net_total: 149_000,
        }
    }

    fn html_only() -> QuotationPdfGenerator {
        QuotationPdfGenerator::with_embedded_templates(None, None)
            .expect("embedded template")
            .without_converter()
    }

    #[test]
    fn renders_summary_lines_and_table() {
        let html = html_only().render_html(&quotation()).expect("render");

        assert!(html.contains("Quotation Summary"));
        assert!(html.contains("<th>Item Name</th>"));
        assert!(html.contains("12 HP PT Pro incl Dead Weight"));
        assert!(html.contains("Total Price: Rs 224,000"));
        assert!(html.contains("Subsidy Applied: Rs 75,000"));
        assert!(html.contains("Subsidized Price (All Inclusive): Rs 149,000"));
        assert!(!html.contains("class=\"letterhead\""));
    }

    #[test]
    fn customer_text_is_escaped() {
        let html = html_only().render_html(&quotation()).expect("render");
        assert!(html.contains("Ravi &lt;Kumar&gt;"));
        assert!(!html.contains("<Kumar>"));
    }

    #[test]
    fn existing_letterhead_becomes_the_page_background() {
        let dir = TempDir::new().expect("tempdir");
        let letterhead = dir.path().join("letterhead.jpg");
        fs::write(&letterhead, b"jpeg").expect("letterhead");

        let generator = QuotationPdfGenerator::with_embedded_templates(Some(letterhead), None)
            .expect("generator")
            .without_converter();
        let html = generator.render_html(&quotation()).expect("render");

        assert!(html.contains("class=\"letterhead\""));
        assert!(html.contains("letterhead.jpg"));
    }

    #[test]
    fn template_directory_must_contain_the_quotation_template() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("other.html.tera"), "<p>other</p>").expect("template");

        let error = QuotationPdfGenerator::new(dir.path(), None, None).expect_err("missing");
        assert!(matches!(
            error,
            DocumentError::MissingAsset(path) if path.ends_with(QUOTATION_TEMPLATE)
        ));
    }

    #[test]
    fn custom_template_directory_is_used() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join(QUOTATION_TEMPLATE),
            "{{ quotation.customer_name }} owes {{ currency }} {{ quotation.net_total | rupees }}",
        )
        .expect("template");

        let generator = QuotationPdfGenerator::new(dir.path(), None, None)
            .expect("generator")
            .without_converter();
        let html = generator.render_html(&quotation()).expect("render");
        assert_eq!(html, "Ravi &lt;Kumar&gt; owes Rs 149,000");
    }

    #[tokio::test]
    async fn falls_back_to_html_without_converter() {
        let document = html_only().generate(&quotation()).await.expect("generate");

        assert!(!document.is_pdf());
        assert_eq!(document.content_type(), "text/html; charset=utf-8");
        assert_eq!(document.file_name(), "Orbit_Quotation.html");
        match document {
            QuotationDocument::Html(html) => assert!(html.contains("Rs 224,000")),
            QuotationDocument::Pdf(_) => panic!("expected HTML without a converter"),
        }
    }

    #[tokio::test]
    async fn failing_converter_falls_back_to_html() {
        let dir = TempDir::new().expect("tempdir");
        let fake = dir.path().join("not-a-converter");
        fs::write(&fake, b"").expect("fake converter");

        let generator = QuotationPdfGenerator::with_embedded_templates(None, Some(&fake))
            .expect("generator");
        assert!(generator.converter_path().is_some());

        let document = generator.generate(&quotation()).await.expect("generate");
        assert!(matches!(document, QuotationDocument::Html(_)));
    }
}
