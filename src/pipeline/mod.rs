//! Pipeline stages for resume analysis.
//!
//! Each submodule implements one step. Only [`render`] and [`llm`] sit
//! behind traits, since those are the two stages with host or network
//! dependencies.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ interpret
//! (path/URL) (pdfium)  (base64)  (model)  (score + band)
//! ```
//!
//! 1. [`input`]    : read the resume from disk or URL and check the `%PDF` magic
//! 2. [`render`]   : rasterise page 1; runs in `spawn_blocking` because
//!    pdfium is not async-aware
//! 3. [`encode`]   : PNG-encode and base64-wrap the page image
//! 4. [`llm`]      : send instruction, image and job description to the model
//! 5. [`interpret`]: regex out the match percentage and classify it

pub mod encode;
pub mod input;
pub mod interpret;
pub mod llm;
pub mod render;
