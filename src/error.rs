//! Error types for the vlm2doc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Vlm2DocError`] — **Fatal**: the caller misused the library
//!   (invalid configuration). Returned as `Err(Vlm2DocError)` from
//!   constructors and builders.
//!
//! * [`ClientError`] — **Per-item**: one inference call to the endpoint
//!   failed. The generation orchestrator never propagates these across a
//!   batch; a failed call becomes `failed = true` on that item's
//!   [`crate::output::GenerationResult`] and is eligible for retry, so one
//!   bad page never takes down its siblings.
//!
//! Degenerate model output and malformed layout markup are deliberately not
//! errors at all — the former drives the retry policy, the latter recovers
//! per block with a default bounding box.

use thiserror::Error;

/// All fatal errors returned by the vlm2doc library.
///
/// Per-item inference failures use [`ClientError`] and surface as data on
/// [`crate::output::GenerationResult`] rather than propagating here.
#[derive(Debug, Error)]
pub enum Vlm2DocError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failure of one inference call against the model-serving endpoint.
///
/// Implementations of [`crate::client::VisionClient`] return these; the
/// orchestrator converts them into `failed = true` results.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, timeout at the transport layer).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned HTTP {status}: {message}")]
    Endpoint { status: u16, message: String },

    /// The endpoint answered 2xx but the body did not match the
    /// chat-completion shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// The page image could not be encoded for the request body.
    #[error("image encoding failed: {0}")]
    ImageEncoding(#[from] image::ImageError),
}
