//! The generation orchestrator: concurrent inference with
//! degeneracy-triggered retries.
//!
//! ## Retry Strategy
//!
//! The first attempt on each item runs at the conservative sampling
//! configuration (`temperature`/`top_p`). When the call fails at the
//! transport level or the repeat detector flags the output, the item is
//! re-issued at the higher-entropy retry configuration
//! (`retry_temperature`/`retry_top_p`) — repetition loops are an artefact
//! of near-greedy decoding, and a little entropy is usually enough to break
//! out. Retries are bounded by count; after the budget is spent the last
//! result is returned as-is, degenerate or not, because a degraded page is
//! more useful to the caller than none.
//!
//! ## Concurrency
//!
//! Items are independent: no shared mutable state, no ordering dependency
//! between them. They run on a bounded pool of
//! `min(max_workers, batch_len)` concurrent tasks; each item's retry loop
//! stays sequential inside its task. Results are re-aligned to input order
//! by index, so `results[i]` always corresponds to `batch[i]` regardless of
//! completion order.

use crate::client::{CompletionRequest, VisionClient};
use crate::config::OcrConfig;
use crate::output::GenerationResult;
use crate::pipeline::repeat;
use crate::prompts::PromptKind;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One item of a generation batch: a page image plus its prompt.
///
/// Immutable once constructed. A custom `prompt` wins over `prompt_kind`.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: DynamicImage,
    pub prompt: Option<String>,
    pub prompt_kind: PromptKind,
}

impl GenerationRequest {
    /// A request using one of the built-in prompts.
    pub fn new(image: DynamicImage, prompt_kind: PromptKind) -> Self {
        Self {
            image,
            prompt: None,
            prompt_kind,
        }
    }

    /// A request with a caller-supplied prompt.
    pub fn with_prompt(image: DynamicImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: Some(prompt.into()),
            prompt_kind: PromptKind::Layout,
        }
    }

    fn resolved_prompt(&self) -> &str {
        self.prompt
            .as_deref()
            .unwrap_or_else(|| self.prompt_kind.prompt())
    }
}

/// Run a batch of generation requests against the inference client.
///
/// Order-preserving: `results[i]` corresponds to `batch[i]`. Per-item
/// failures are isolated — a transport error on one item never aborts its
/// siblings, it surfaces as `failed = true` on that item's result after
/// retries are exhausted.
pub async fn generate_batch(
    client: &Arc<dyn VisionClient>,
    batch: &[GenerationRequest],
    config: &OcrConfig,
) -> Vec<GenerationResult> {
    if batch.is_empty() {
        return Vec::new();
    }

    let workers = config.max_workers.min(batch.len()).max(1);
    info!("Generating {} pages with {} workers", batch.len(), workers);

    let mut indexed: Vec<(usize, GenerationResult)> =
        stream::iter(batch.iter().enumerate().map(|(index, request)| async move {
            (index, process_item(client, index, request, config).await)
        }))
        .buffer_unordered(workers)
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Drive one item to completion: first attempt plus bounded retries.
async fn process_item(
    client: &Arc<dyn VisionClient>,
    index: usize,
    request: &GenerationRequest,
    config: &OcrConfig,
) -> GenerationResult {
    let mut result = attempt(client, request, config.temperature, config.top_p, config).await;
    let mut retries = 0u32;

    while retries < config.max_retries
        && repeat::needs_retry(
            &result.raw,
            result.failed,
            config.repeat_window,
            config.repeat_max_repeats,
        )
    {
        warn!(
            "Item {}: degenerate or failed output, retrying ({}/{})",
            index,
            retries + 1,
            config.max_retries
        );
        result = attempt(
            client,
            request,
            config.retry_temperature,
            config.retry_top_p,
            config,
        )
        .await;
        retries += 1;
    }

    result
}

/// Issue one inference call; transport errors become data, not panics.
async fn attempt(
    client: &Arc<dyn VisionClient>,
    request: &GenerationRequest,
    temperature: f32,
    top_p: f32,
    config: &OcrConfig,
) -> GenerationResult {
    let completion = client
        .complete(CompletionRequest {
            image: &request.image,
            prompt: request.resolved_prompt(),
            temperature,
            top_p,
            max_tokens: config.max_tokens,
        })
        .await;

    match completion {
        Ok(response) => {
            debug!(tokens = response.token_count, "completion received");
            GenerationResult {
                raw: response.text,
                token_count: response.token_count,
                failed: false,
            }
        }
        Err(e) => {
            warn!("Inference call failed: {e}");
            GenerationResult::failure()
        }
    }
}
