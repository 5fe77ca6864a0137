//! Request-size aware chunking
//!
//! DeepL caps the size of a single request. This module keeps every call
//! under that ceiling while returning exactly one result per input item,
//! in input order.
//!
//! The decision is two-level:
//!
//! 1. **Batch level** - if the whole batch fits, it is sent as one call and
//!    the chunker is not involved at all.
//! 2. **Item level** - otherwise every item is sent on its own, and only the
//!    items that are themselves larger than the ceiling are cut into pieces.
//!
//! Pieces are cut at the ceiling without looking for sentence or paragraph
//! breaks, so the provider sees no context across a cut. Translation quality
//! at the seam may suffer for very large items; staying under the hard limit
//! wins.

use std::future::Future;

use crate::error::TranslatorResult;

/// Default request ceiling in bytes of text content
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 76_824;

/// Splits oversized requests and reassembles their results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSizeChunker {
    max_bytes: usize,
}

impl Default for RequestSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUEST_BYTES)
    }
}

impl RequestSizeChunker {
    /// Create a chunker with the given ceiling (clamped to at least one byte)
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes: max_bytes.max(1),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Total byte size of a batch
    pub fn batch_size<S: AsRef<str>>(items: &[S]) -> usize {
        items.iter().map(|s| s.as_ref().len()).sum()
    }

    /// True if the batch as a whole would exceed the ceiling
    pub fn needs_chunking<S: AsRef<str>>(&self, items: &[S]) -> bool {
        Self::batch_size(items) > self.max_bytes
    }

    /// Cut one item into contiguous pieces of at most `max_bytes` bytes
    ///
    /// Every piece but the last is as long as the ceiling allows. A cut
    /// never lands inside a multi-byte character: the piece ends at the
    /// closest character boundary below the ceiling instead. For ASCII text
    /// this gives exactly `ceil(len / max_bytes)` pieces.
    ///
    /// If the ceiling is smaller than a single character, that character
    /// becomes a piece on its own.
    pub fn split_item<'a>(&self, item: &'a str) -> Vec<&'a str> {
        if item.len() <= self.max_bytes {
            return vec![item];
        }

        let mut pieces = Vec::with_capacity(item.len().div_ceil(self.max_bytes));
        let mut start = 0;

        while start < item.len() {
            let mut end = (start + self.max_bytes).min(item.len());
            while !item.is_char_boundary(end) {
                end -= 1;
            }
            if end == start {
                // ceiling narrower than this character
                end = start + 1;
                while !item.is_char_boundary(end) {
                    end += 1;
                }
            }
            pieces.push(&item[start..end]);
            start = end;
        }

        pieces
    }

    /// Translate a batch item by item, splitting oversized items
    ///
    /// `translate_one` performs a single provider call for one piece of
    /// text. Items and pieces are translated strictly one after another.
    ///
    /// # Errors
    ///
    /// The first failing call aborts the whole batch and its error is
    /// returned. No partial result is produced.
    pub async fn chunk_translate<S, F, Fut>(
        &self,
        items: &[S],
        mut translate_one: F,
    ) -> TranslatorResult<Vec<String>>
    where
        S: AsRef<str>,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = TranslatorResult<String>>,
    {
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let item = item.as_ref();

            if item.len() <= self.max_bytes {
                results.push(translate_one(item.to_string()).await?);
                continue;
            }

            let pieces = self.split_item(item);
            tracing::debug!(
                item = index,
                bytes = item.len(),
                pieces = pieces.len(),
                "Splitting oversized item"
            );

            let mut joined = String::with_capacity(item.len());
            for piece in pieces {
                joined.push_str(&translate_one(piece.to_string()).await?);
            }
            results.push(joined);
        }

        Ok(results)
    }
}
