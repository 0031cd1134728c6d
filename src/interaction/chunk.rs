//! Splitting replies to fit the platform's message ceiling.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::base::types::{MESSAGE_LIMIT, Void};

/// Somewhere a reply can be posted, one message at a time.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Void;
}

/// Split `text` into consecutive slices of at most `limit` characters.
///
/// Purely positional: words and markup may be cut in half.
pub fn split_chunks(text: &str, limit: usize) -> Vec<&str> {
    assert!(limit > 0, "chunk limit must be positive");

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == limit {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Send `text` through `sink`, chunked to `MESSAGE_LIMIT`, strictly in order.
#[instrument(skip_all)]
pub async fn emit(text: &str, sink: &dyn MessageSink) -> Void {
    let chunks = split_chunks(text, MESSAGE_LIMIT);

    debug!("Emitting reply in {} chunk(s).", chunks.len());

    for chunk in chunks {
        sink.send(chunk).await?;
    }

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_chunks("hello", 2000), vec!["hello"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_chunks("", 2000).is_empty());
    }

    #[test]
    fn test_boundaries() {
        let exact = "a".repeat(2000);
        assert_eq!(split_chunks(&exact, 2000), vec![exact.as_str()]);

        let over = "b".repeat(2001);
        let chunks = split_chunks(&over, 2000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2000);
        assert_eq!(chunks[1], "b");
    }

    #[test]
    fn test_chunks_reassemble_exactly() {
        let text: String = (0..4500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = split_chunks(&text, 2000);

        assert_eq!(chunks.len(), 3);
        assert!(chunks[..2].iter().all(|c| c.chars().count() == 2000));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "⚡".repeat(5);
        let chunks = split_chunks(&text, 2);

        assert_eq!(chunks, vec!["⚡⚡", "⚡⚡", "⚡"]);
    }
}
