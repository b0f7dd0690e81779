//! Local processing stages around the OCR call.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ [OCR service] ──▶ reconcile
//! (upload)                    (inline images, assemble pages)
//! ```
//!
//! 1. [`input`]: validate and hold the uploaded PDF
//! 2. [`reconcile`]: splice image payloads into each page's markdown and
//!    join the pages into one document; pure string work that never fails

pub mod input;
pub mod reconcile;
