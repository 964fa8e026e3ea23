//! Document emitters for finalized quotations and proforma receipts.

pub mod error;
pub mod format;
pub mod output;
pub mod quotation;
pub mod receipt;

pub use error::DocumentError;
pub use format::{format_rupees, register_template_filters};
pub use output::write_atomically;
pub use quotation::{locate_wkhtmltopdf, QuotationDocument, QuotationPdfGenerator};
pub use receipt::{render_docx, ReceiptDocxGenerator, DOCX_CONTENT_TYPE};
