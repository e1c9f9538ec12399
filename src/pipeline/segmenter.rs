//! Splitting documents into translation-sized chunks
//!
//! Chunks are cut at the last whitespace character inside the size window so
//! words stay intact. When a window contains no whitespace after its start,
//! the chunk is cut mid-word at exactly `max_len` characters. That is the
//! accepted degenerate case for very long tokens such as URLs.

use crate::data::Chunk;

/// Default chunk size in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

/// Split `text` into ordered, contiguous chunks of at most `max_len` characters
///
/// The whitespace character at each soft cut is not part of either chunk; it
/// is recorded as the chunk's `separator` so the input can be rebuilt
/// exactly. Empty input yields no chunks. A `max_len` of 0 is treated as 1.
///
/// # Example
///
/// ```ignore
/// let chunks = split("Guten Tag. Wie geht es dir?", 15);
/// assert_eq!(chunks[0].text, "Guten Tag. Wie");
/// assert_eq!(chunks[1].text, "geht es dir?");
/// ```
pub fn split(text: &str, max_len: usize) -> Vec<Chunk> {
    let max_len = max_len.max(1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();
    let byte_at = |i: usize| if i < total { chars[i].0 } else { text.len() };

    let mut chunks = Vec::new();
    let mut offset = 0;

    while offset < total {
        let tentative = offset + max_len;
        if tentative >= total {
            chunks.push(Chunk::new(chunks.len(), &text[byte_at(offset)..], None));
            break;
        }

        // Nearest whitespace at or before the tentative end, strictly after offset
        let cut = (offset + 1..=tentative)
            .rev()
            .find(|&i| chars[i].1.is_whitespace());

        match cut {
            Some(at) => {
                chunks.push(Chunk::new(
                    chunks.len(),
                    &text[byte_at(offset)..byte_at(at)],
                    Some(chars[at].1),
                ));
                offset = at + 1;
            }
            None => {
                chunks.push(Chunk::new(
                    chunks.len(),
                    &text[byte_at(offset)..byte_at(tentative)],
                    None,
                ));
                offset = tentative;
            }
        }
    }

    chunks
}

/// Join per-chunk texts back together using each chunk's recorded separator
///
/// `texts[i]` replaces `chunks[i].text`. Passing the chunks' own texts
/// reconstructs the original input.
pub fn join<S: AsRef<str>>(chunks: &[Chunk], texts: &[S]) -> String {
    let capacity = texts.iter().map(|t| t.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(capacity);
    for (chunk, text) in chunks.iter().zip(texts) {
        out.push_str(text.as_ref());
        if let Some(sep) = chunk.separator {
            out.push(sep);
        }
    }
    out
}

/// Rebuild the original text from its chunks
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    join(chunks, &texts)
}
