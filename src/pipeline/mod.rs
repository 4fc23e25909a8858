//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step and works on
//! plain owned data from [`crate::backend`], so every stage is testable
//! without a PDF library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ (backend) ──▶ style ──▶ images ──▶ emit ──▶ postprocess
//! (%PDF check) (pdfium)   (emphasis) (PNG files) (Markdown) (cleanup)
//! ```
//!
//! 1. [`input`]  — reject missing, unreadable and non-PDF files early
//! 2. [`style`]  — font name + flags → bold / italic / both / plain
//! 3. [`images`] — decode-checked page images → `image_{page}_{n}.png`
//! 4. [`emit`]   — spans and placed images → one page of Markdown;
//!    document assembly with header and page separators
//! 5. [`postprocess`] — deterministic whitespace / Unicode cleanup

pub mod emit;
pub mod images;
pub mod input;
pub mod postprocess;
pub mod style;
