//! Configuration for OCR generation and document reconstruction.
//!
//! All behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`]. Keeping every knob in one value makes it trivial to
//! share configs across workers, serialise them for logging, and diff two
//! runs to understand why their outputs differ. There is deliberately no
//! process-wide settings singleton — the config is passed explicitly into
//! the orchestrator and the page-assembly entry points.

use crate::error::Vlm2DocError;
use serde::{Deserialize, Serialize};

/// Configuration for a batch OCR run.
///
/// Built via [`OcrConfig::builder()`] or using [`OcrConfig::default()`].
///
/// # Example
/// ```rust
/// use vlm2doc::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .max_workers(4)
///     .max_retries(2)
///     .include_headers_footers(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Sampling temperature for the first attempt on each page. Default: 0.0.
    ///
    /// Zero temperature makes the model deterministic and faithful to what it
    /// sees on the page — exactly what you want for transcription. The cost
    /// is that a model stuck in a repetition loop will stay stuck, which is
    /// why retries switch to [`Self::retry_temperature`].
    pub temperature: f32,

    /// Nucleus sampling bound for the first attempt. Default: 0.1.
    pub top_p: f32,

    /// Sampling temperature for retry attempts. Default: 0.3.
    ///
    /// Retries only happen after the repeat detector flagged the output (or
    /// the call failed outright). A higher-entropy configuration gives the
    /// model a chance to break out of the repetition that triggered the
    /// retry; keeping it modest preserves transcription fidelity.
    pub retry_temperature: f32,

    /// Nucleus sampling bound for retry attempts. Default: 0.95.
    pub retry_top_p: f32,

    /// Maximum tokens the model may generate per page. Default: 8192.
    ///
    /// Dense pages (tables, multi-column text) routinely exceed 4 000 output
    /// tokens of markup. Setting this too low truncates blocks mid-element
    /// and the truncated tail often trips the repeat detector.
    pub max_tokens: u32,

    /// Maximum retry attempts per page on degenerate or failed output.
    /// Default: 6.
    ///
    /// Bounded by count, not wall-clock: timeouts belong to the inference
    /// transport. After the budget is exhausted the last result is returned
    /// as-is — a degraded page is more useful to the caller than none.
    pub max_retries: u32,

    /// Upper bound on concurrent inference calls. Default: 8.
    ///
    /// The effective pool size is `min(max_workers, batch_len)`. Inference
    /// is network-bound, so the pool hides per-request latency; lower this
    /// if the endpoint rate-limits, raise it for a wide serving deployment.
    pub max_workers: usize,

    /// Keep `Page-Header` / `Page-Footer` blocks in rendered views.
    /// Default: false.
    pub include_headers_footers: bool,

    /// Window (in characters) the repeat detector examines at the end of the
    /// model output. Default: 50.
    pub repeat_window: usize,

    /// Consecutive repeats of a trailing unit tolerated before output is
    /// considered degenerate. Default: 4.
    ///
    /// Conservative on purpose: a false positive burns a retry at higher
    /// temperature, a false negative merely returns a garbled page.
    pub repeat_max_repeats: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.1,
            retry_temperature: 0.3,
            retry_top_p: 0.95,
            max_tokens: 8192,
            max_retries: 6,
            max_workers: 8,
            include_headers_footers: false,
            repeat_window: 50,
            repeat_max_repeats: 4,
        }
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn retry_temperature(mut self, t: f32) -> Self {
        self.config.retry_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn retry_top_p(mut self, p: f32) -> Self {
        self.config.retry_top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = n.max(1);
        self
    }

    pub fn include_headers_footers(mut self, v: bool) -> Self {
        self.config.include_headers_footers = v;
        self
    }

    pub fn repeat_window(mut self, n: usize) -> Self {
        self.config.repeat_window = n;
        self
    }

    pub fn repeat_max_repeats(mut self, n: usize) -> Self {
        self.config.repeat_max_repeats = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, Vlm2DocError> {
        let c = &self.config;
        if c.max_workers == 0 {
            return Err(Vlm2DocError::InvalidConfig(
                "max_workers must be ≥ 1".into(),
            ));
        }
        if c.repeat_window < 2 {
            return Err(Vlm2DocError::InvalidConfig(format!(
                "repeat_window must be ≥ 2, got {}",
                c.repeat_window
            )));
        }
        if c.repeat_max_repeats == 0 {
            return Err(Vlm2DocError::InvalidConfig(
                "repeat_max_repeats must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
