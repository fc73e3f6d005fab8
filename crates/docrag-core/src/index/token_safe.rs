//! Token-limit enforcement around any chunking strategy

use super::chunker::{ChunkingStrategy, StrategyKind};
use crate::error::{DocRagError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Tokenizer used to measure and cut chunks
pub trait TokenCounter: Send + Sync {
    fn encode(&self, text: &str) -> Vec<usize>;

    /// `None` when the tokens do not form valid text on their own
    fn decode(&self, tokens: &[usize]) -> Option<String>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// `cl100k_base`, the encoding of the OpenAI embedding models
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| DocRagError::Configuration(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[usize]) -> Option<String> {
        self.bpe.decode(tokens.to_vec()).ok()
    }
}

/// Most tokens a single UTF-8 character can encode to, one per byte.
/// Lower limits cannot be honoured for every character.
pub const MIN_TOKEN_LIMIT: usize = 4;

/// Cut every chunk longer than `max_tokens` into consecutive windows of at
/// most `max_tokens` tokens. Chunks within the limit pass through untouched.
pub fn enforce_token_limit(
    chunks: Vec<String>,
    counter: &dyn TokenCounter,
    max_tokens: usize,
) -> Vec<String> {
    let max_tokens = max_tokens.max(1);
    let mut out = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let tokens = counter.encode(&chunk);
        if tokens.len() <= max_tokens {
            out.push(chunk);
            continue;
        }

        debug!(
            "Splitting chunk of {} tokens into windows of {}",
            tokens.len(),
            max_tokens
        );

        let mut start = 0;
        while start < tokens.len() {
            if let Some((text, end)) = decode_window(counter, &tokens, start, max_tokens) {
                push_text(&mut out, text);
                start = end;
                continue;
            }

            // Tokens inside the limit end mid-character: decode the shortest
            // valid run and cut it between characters instead
            let Some((text, end)) = shortest_valid_run(counter, &tokens, start) else {
                break;
            };
            for piece in split_chars(&text, counter, max_tokens) {
                push_text(&mut out, piece);
            }
            start = end;
        }
    }

    out
}

fn push_text(out: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        out.push(text);
    }
}

/// Decode the longest window of at most `max_tokens` from `start` that forms valid text
fn decode_window(
    counter: &dyn TokenCounter,
    tokens: &[usize],
    start: usize,
    max_tokens: usize,
) -> Option<(String, usize)> {
    let limit = (start + max_tokens).min(tokens.len());
    (start + 1..=limit)
        .rev()
        .find_map(|end| counter.decode(&tokens[start..end]).map(|text| (text, end)))
}

fn shortest_valid_run(
    counter: &dyn TokenCounter,
    tokens: &[usize],
    start: usize,
) -> Option<(String, usize)> {
    (start + 1..=tokens.len())
        .find_map(|end| counter.decode(&tokens[start..end]).map(|text| (text, end)))
}

/// Greedy character pieces of at most `max_tokens`; a character that alone
/// needs more stays whole
fn split_chars(text: &str, counter: &dyn TokenCounter, max_tokens: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && counter.count(&candidate) > max_tokens {
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Decorator applying [`enforce_token_limit`] to the output of `S`
pub struct TokenSafeChunker<S> {
    inner: S,
    counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
}

impl<S: ChunkingStrategy> TokenSafeChunker<S> {
    pub fn new(inner: S, counter: Arc<dyn TokenCounter>, max_tokens: usize) -> Self {
        Self {
            inner,
            counter,
            max_tokens,
        }
    }
}

#[async_trait]
impl<S: ChunkingStrategy> ChunkingStrategy for TokenSafeChunker<S> {
    async fn chunk(&self, text: &str) -> Result<Vec<String>> {
        let chunks = self.inner.chunk(text).await?;
        Ok(enforce_token_limit(
            chunks,
            self.counter.as_ref(),
            self.max_tokens,
        ))
    }

    fn kind(&self) -> StrategyKind {
        self.inner.kind()
    }
}
