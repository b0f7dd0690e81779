//! Reconciliation: splice extracted image payloads into the page markdown.
//!
//! The OCR service returns each page's markdown with images referenced as
//! `![img-0.jpeg](img-0.jpeg)` and ships the image data separately. Replacing
//! the second `img-0.jpeg` with the image's `data:` URL makes the markdown
//! self-contained and directly renderable.
//!
//! Substitution is literal text replacement of the exact `![id](id)` form.
//! Ids with no matching reference, and references with no matching id, are
//! both left alone.

use crate::config::PageSeparator;
use crate::ocr::OcrPage;
use crate::output::PageResult;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Replace every `![id](id)` in `markdown` with `![id](payload)`, for each
/// `(id, payload)` pair in `images`.
///
/// Pairs are applied in iteration order. A payload that itself contains a
/// later pair's placeholder is rewritten again by that pair.
///
/// ```rust
/// use pdf_ocr_viewer::replace_images_in_markdown;
///
/// let out = replace_images_in_markdown(
///     "See ![img-0.jpeg](img-0.jpeg) below.",
///     [("img-0.jpeg", "data:image/jpeg;base64,AAAA")],
/// );
/// assert_eq!(out, "See ![img-0.jpeg](data:image/jpeg;base64,AAAA) below.");
/// ```
pub fn replace_images_in_markdown<I, K, V>(markdown: &str, images: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = markdown.to_string();
    for (id, payload) in images {
        let (id, payload) = (id.as_ref(), payload.as_ref());
        let placeholder = format!("![{id}]({id})");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &format!("![{id}]({payload})"));
        }
    }
    out
}

// `![alt](target)` with no whitespace in the target.
static RE_IMAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]\n]*)\]\(([^)\s]*)\)").unwrap());

/// Ids referenced in placeholder form (`![id](id)`), in order of appearance,
/// without duplicates.
pub fn image_references(markdown: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in RE_IMAGE_REF.captures_iter(markdown) {
        let (alt, target) = (&caps[1], &caps[2]);
        if !alt.is_empty() && alt == target && !ids.iter().any(|id| id == alt) {
            ids.push(alt.to_string());
        }
    }
    ids
}

/// Reconcile one page.
pub fn reconcile_page(page: &OcrPage) -> PageResult {
    let markdown = replace_images_in_markdown(&page.markdown, page.image_payloads());
    let unresolved_images = image_references(&markdown);
    if !unresolved_images.is_empty() {
        debug!(
            "Page {}: {} image reference(s) without payload: {:?}",
            page.index + 1,
            unresolved_images.len(),
            unresolved_images
        );
    }

    PageResult {
        page_num: page.index + 1,
        markdown,
        image_count: page.images.len(),
        unresolved_images,
    }
}

/// Reconcile every page, keeping the order they were received in.
pub fn reconcile_pages(pages: &[OcrPage]) -> Vec<PageResult> {
    pages.iter().map(reconcile_page).collect()
}

/// Join reconciled pages into one document.
///
/// The separator goes *between* pages only; an empty list yields `""`.
pub fn assemble_document(pages: &[PageResult], separator: &PageSeparator) -> String {
    let mut doc = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            doc.push_str(&separator.render(page.page_num));
        }
        doc.push_str(&page.markdown);
    }
    doc
}

/// Reconcile and assemble in one go with the default blank-line separator.
pub fn markdown_with_images(pages: &[OcrPage]) -> String {
    assemble_document(&reconcile_pages(pages), &PageSeparator::None)
}
