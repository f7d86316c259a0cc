//! Pipeline stages for PDF analysis.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the network-facing parts stay small.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ encode ──▶ request ──▶ backoff(transport) ──▶ response
//! (validate) (pdfium)   (JPEG)     (shape)     (retry on 429)          (normalise)
//! ```
//!
//! 1. [`input`]: check the path is an existing, size-limited `.pdf`
//! 2. [`extract`]: per-page text, embedded images, metadata; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: flatten embedded images to RGB JPEG bytes
//! 4. [`request`]: build the provider-neutral chat payload
//! 5. [`backoff`]: bounded exponential backoff around the transport call
//! 6. [`response`]: decode the raw completion into the expected shape

pub mod backoff;
pub mod encode;
pub mod extract;
pub mod input;
pub mod request;
pub mod response;
