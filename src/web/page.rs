//! HTML rendering for the upload form and the result view.
//!
//! Pages are plain server-rendered HTML with no JavaScript. The result view
//! puts the uploaded PDF on the left and the OCR output on the right, with a
//! CSS-only tab switch between the rendered preview and the raw markdown.

use super::ApiError;
use crate::output::ConversionOutput;
use crate::pipeline::input::PdfUpload;
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, Options, Parser};

const TITLE: &str = "PDF OCR";

const CONSOLE_URL: &str = "https://console.mistral.ai/";

const KEY_REJECTED: &str = r#"<div class="warning">The API key configured on the server was rejected. Update MISTRAL_API_KEY and restart the server.</div>"#;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; padding: 1rem 2rem; background: #f4f5f7; color: #222; }
h1 { margin-top: 0; }
form.upload { display: flex; gap: 1rem; align-items: center; flex-wrap: wrap; margin-bottom: 1rem; }
.warning { background: #fff4e5; border: 1px solid #f0b36b; padding: .75rem 1rem; border-radius: 5px; }
.error { background: #fdecea; border: 1px solid #e57373; padding: .75rem 1rem; border-radius: 5px; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
.pdf-view { width: 100%; height: 90vh; border: 1px solid #ccc; border-radius: 5px; background: white; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: .5rem 1rem; cursor: pointer; border-bottom: 2px solid transparent; }
.tabs > input:checked + label { border-bottom-color: #ff7000; font-weight: 600; }
.panel { display: none; }
#tab-preview:checked ~ #panel-preview, #tab-raw:checked ~ #panel-raw { display: block; }
.ocr-result { background-color: white; color: black; padding: 20px 30px; border-radius: 5px;
  box-shadow: 0 0 10px rgba(0, 0, 0, 0.1); overflow: auto; max-height: 90vh; }
.ocr-result img { max-width: 50%; max-height: 50vh; display: block; margin: 10px auto; object-fit: contain; }
.markdown-text { background-color: #f8f9fa; color: #333; padding: 20px; border-radius: 5px;
  font-family: monospace; white-space: pre-wrap; overflow-x: auto; max-height: 90vh; }
.stats { color: #666; font-size: .9rem; }
"#;

/// The landing page: just the upload form.
pub fn index_page(needs_key: bool) -> String {
    layout(&upload_form(needs_key))
}

/// The form again, plus a message. Used for every failure.
///
/// A credential problem asks for a key only when the form can take one. A
/// key configured on the server that the service rejected is reported as
/// such, since the form cannot override it.
pub fn error_page(needs_key: bool, error: &ApiError) -> String {
    let mut body = String::new();
    if error.credential {
        if needs_key {
            body.push_str(&key_prompt());
        } else {
            body.push_str(KEY_REJECTED);
        }
    }
    body.push_str(&upload_form(needs_key));
    let prefix = if error.from_service {
        "OCR processing failed: "
    } else {
        ""
    };
    body.push_str(&format!(
        r#"<div class="error">{prefix}{}</div>"#,
        encode_text(&error.message)
    ));
    layout(&body)
}

/// Form, then the PDF and the OCR result side by side.
pub fn result_page(needs_key: bool, upload: &PdfUpload, output: &ConversionOutput) -> String {
    let mut body = upload_form(needs_key);

    body.push_str(r#"<div class="columns">"#);

    body.push_str(&format!(
        r#"<section><h2>Uploaded PDF</h2><iframe class="pdf-view" title="{}" src="{}"></iframe></section>"#,
        encode_double_quoted_attribute(upload.filename()),
        encode_double_quoted_attribute(&upload.data_url()),
    ));

    body.push_str("<section><h2>OCR result</h2>");
    body.push_str(&format!(
        r#"<p class="stats">{} page(s), {} image(s), {} ms</p>"#,
        output.stats.total_pages, output.stats.total_images, output.stats.total_duration_ms
    ));
    body.push_str(r#"<div class="tabs">"#);
    body.push_str(r#"<input type="radio" name="view" id="tab-preview" checked><label for="tab-preview">Preview</label>"#);
    body.push_str(r#"<input type="radio" name="view" id="tab-raw"><label for="tab-raw">Markdown text</label>"#);
    body.push_str(&format!(
        r#"<div class="panel ocr-result" id="panel-preview">{}</div>"#,
        render_markdown(&output.markdown)
    ));
    body.push_str(&format!(
        r#"<div class="panel" id="panel-raw"><pre class="markdown-text">{}</pre></div>"#,
        encode_text(&output.markdown)
    ));
    body.push_str("</div></section></div>");

    layout(&body)
}

/// Markdown → HTML. Raw HTML in the markdown is passed through, the OCR
/// service emits it for some tables.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() + markdown.len() / 4);
    html::push_html(&mut out, parser);
    out
}

fn upload_form(needs_key: bool) -> String {
    let mut form = String::from(
        r#"<form class="upload" method="post" action="/ocr" enctype="multipart/form-data">"#,
    );
    form.push_str(r#"<input type="file" name="file" accept="application/pdf,.pdf" required>"#);
    if needs_key {
        form.push_str(
            r#"<input type="password" name="api_key" placeholder="Mistral API key" autocomplete="off">"#,
        );
    }
    form.push_str(r#"<button type="submit">Run OCR</button></form>"#);
    form
}

fn key_prompt() -> String {
    format!(
        r#"<div class="warning">Please enter your Mistral API key. Keys are issued in the <a href="{CONSOLE_URL}">Mistral Console</a>.</div>"#
    )
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{TITLE}</h1>\n\
<p>Upload a PDF file to run OCR on it.</p>\n{body}\n</body>\n</html>\n"
    )
}
