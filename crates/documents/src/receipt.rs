use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tera::{Context, Tera};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use orbit_core::domain::receipt::ProformaReceipt;

use crate::error::DocumentError;

const DOCUMENT_PART: &str = "word/document.xml";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Fills the proforma receipt template.
///
/// Only the body, header and footer parts are rendered; every other part of
/// the archive is copied through byte for byte.
#[derive(Clone, Debug)]
pub struct ReceiptDocxGenerator {
    template_path: PathBuf,
}

impl ReceiptDocxGenerator {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self { template_path: template_path.into() }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Confirms the template is a readable DOCX archive with a document body.
    pub fn check_template(&self) -> Result<(), DocumentError> {
        if !self.template_path.exists() {
            return Err(DocumentError::MissingAsset(self.template_path.clone()));
        }
        let bytes = fs::read(&self.template_path)?;
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        archive.by_name(DOCUMENT_PART)?;
        Ok(())
    }

    pub fn render(&self, receipt: &ProformaReceipt) -> Result<Vec<u8>, DocumentError> {
        if !self.template_path.exists() {
            return Err(DocumentError::MissingAsset(self.template_path.clone()));
        }
        let template = fs::read(&self.template_path)?;
        let bytes = render_docx(&template, receipt)?;

        info!(
            event_name = "documents.receipt.rendered",
            receipt_no = %receipt.receipt_no,
            size = bytes.len(),
            "proforma receipt rendered"
        );
        Ok(bytes)
    }
}

/// Renders the placeholders of a DOCX archive held in memory.
///
/// Text values are written as bold runs; quantities keep the formatting of
/// the run they are typed in.
pub fn render_docx(template: &[u8], receipt: &ProformaReceipt) -> Result<Vec<u8>, DocumentError> {
    let context = Context::from_value(emphasized(receipt.placeholders()).into())?;
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_owned();

        if !is_templated_part(&name) {
            writer.raw_copy_file(entry)?;
            continue;
        }

        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        let rendered = render_part(&name, &xml, &context)?;
        debug!(part = %name, "receipt part rendered");

        writer.start_file(name, options)?;
        writer.write_all(rendered.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

fn is_templated_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Bindings are escaped here, so Tera's own escaping stays off.
fn render_part(name: &str, xml: &str, context: &Context) -> Result<String, DocumentError> {
    let mut tera = Tera::default();
    tera.autoescape_on(Vec::new());
    tera.add_raw_template(name, &merge_split_placeholders(xml))?;
    let rendered = tera.render(name, context)?;

    if let Some(offset) = rendered.find("{{") {
        let end = rendered.len().min(offset + 40);
        let excerpt = rendered.get(offset..end).unwrap_or("{{");
        return Err(DocumentError::Template(format!(
            "unrendered placeholder in {name}: {excerpt}"
        )));
    }
    Ok(rendered)
}

fn emphasized(bindings: Map<String, Value>) -> Map<String, Value> {
    bindings
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => Value::String(bold_run(&text)),
                other => other,
            };
            (name, value)
        })
        .collect()
}

/// Closes the run the placeholder sits in, writes the value as its own bold
/// run and reopens a plain run for the text that follows.
fn bold_run(text: &str) -> String {
    format!(
        concat!(
            "</w:t></w:r>",
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
            r#"<w:r><w:t xml:space="preserve">"#,
        ),
        escape_xml(text)
    )
}

/// Braces are written as character references so bound values never read as
/// template syntax.
fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Word splits typed text into runs, so a `{{ name }}` typed in the editor
/// can end up with markup between the braces, or even between the two
/// braces of a pair. Markup inside a placeholder is dropped so Tera sees the
/// expression whole.
fn merge_split_placeholders(xml: &str) -> String {
    let joined = join_split_braces(xml);
    let mut output = String::with_capacity(joined.len());
    let mut rest = joined.as_str();

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find("}}") else {
            output.push_str(tail);
            return output;
        };

        output.push_str(&strip_tags(&tail[..end + 2]));
        rest = &tail[end + 2..];
    }

    output.push_str(rest);
    output
}

/// Drops markup that separates two identical braces, turning
/// `{</w:t></w:r><w:r><w:t>{` into `{{`.
fn join_split_braces(xml: &str) -> String {
    let mut output = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(offset) = rest.find(['{', '}']) {
        let brace = rest.as_bytes()[offset];
        output.push_str(&rest[..=offset]);
        rest = &rest[offset + 1..];

        let markup = leading_markup_len(rest);
        if markup > 0 && rest.as_bytes().get(markup) == Some(&brace) {
            rest = &rest[markup..];
        }
    }

    output.push_str(rest);
    output
}

fn leading_markup_len(text: &str) -> usize {
    let mut len = 0;
    while text[len..].starts_with('<') {
        match text[len..].find('>') {
            Some(end) => len += end + 1,
            None => break,
        }
    }
    len
}

fn strip_tags(fragment: &str) -> String {
    let mut stripped = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    stripped
}
