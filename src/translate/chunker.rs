use regex::Regex;
use std::sync::OnceLock;

/// Chunk size used when the caller does not specify one.
pub const DEFAULT_CHUNK_SIZE: usize = 300;

/// How far back from a tentative cut we look for a sentence ending.
const SENTENCE_WINDOW: usize = 50;

fn sentence_end() -> &'static Regex {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]\s").expect("Invalid regex"))
}

/// Split text into ordered chunks of at most `max_size` characters.
///
/// Text that already fits is returned as a single, untrimmed chunk. Longer
/// text is cut at the latest sentence ending (`.`, `!` or `?` followed by
/// whitespace) within the last 50 characters of each window, otherwise at the
/// last whitespace, otherwise hard at `max_size`. Every emitted chunk is
/// trimmed and non-empty, so joining chunks with single spaces reproduces the
/// text up to whitespace normalization.
///
/// Sizes count `char`s, not bytes.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let max_size = max_size.max(1);

    // Byte offset of every char boundary, with the end of the text appended.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    if len <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut cursor = 0;

    while cursor < len {
        let mut end = (cursor + max_size).min(len);
        if end < len {
            end = find_break(text, &offsets, cursor, end);
        }

        let piece = text[offsets[cursor]..offsets[end]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        cursor = end;
    }

    chunks
}

/// Pick the cut position (in chars) for the window `[cursor, end)`.
///
/// Always returns a position in `(cursor, end + 1]`. The word search also
/// looks at the char at `end`, so a word ending exactly on the limit is kept
/// whole; cutting after that space still trims to at most `end - cursor` chars.
fn find_break(text: &str, offsets: &[usize], cursor: usize, end: usize) -> usize {
    let window_start = cursor.max(end.saturating_sub(SENTENCE_WINDOW));
    let window = &text[offsets[window_start]..offsets[end]];

    if let Some(found) = sentence_end().find_iter(window).last() {
        return window_start + window[..found.end()].chars().count();
    }

    let span_end = (end + 1).min(offsets.len() - 1);
    let span = &text[offsets[cursor]..offsets[span_end]];
    let last_space = span
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .last();

    match last_space {
        Some(i) if i > 0 => cursor + i + 1,
        _ => end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapse(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 300).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("Hello world", 300), vec!["Hello world"]);
    }

    #[test]
    fn test_short_text_not_trimmed() {
        assert_eq!(chunk_text("  padded  ", 300), vec!["  padded  "]);
        assert_eq!(chunk_text("exact", 5), vec!["exact"]);
    }

    #[test]
    fn test_breaks_at_sentence_end() {
        let chunks = chunk_text("One two three. Four five six seven.", 20);
        assert_eq!(chunks, vec!["One two three.", "Four five six seven."]);
    }

    #[test]
    fn test_prefers_latest_sentence_end() {
        let chunks = chunk_text("Hi. Yo. abcdefghijklmnop", 10);
        assert_eq!(chunks, vec!["Hi. Yo.", "abcdefghij", "klmnop"]);
    }

    #[test]
    fn test_breaks_at_word_boundary() {
        let chunks = chunk_text("alpha beta gamma delta epsilon", 12);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon"]);
    }

    #[test]
    fn test_word_ending_on_limit_kept_whole() {
        assert_eq!(chunk_text("alpha beta gamma", 5), vec!["alpha", "beta", "gamma"]);
        assert_eq!(chunk_text("one two three four", 7), vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let chunks = chunk_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_sentence_end_outside_window_ignored() {
        let text = format!("Start. {}", "word ".repeat(20));
        let chunks = chunk_text(&text, 80);
        assert!(chunks[0].starts_with("Start. word"));
        assert!(chunks[0].chars().count() <= 80);
    }

    #[test]
    fn test_multibyte_text() {
        let chunks = chunk_text("ééééé ééééé", 6);
        assert_eq!(chunks, vec!["ééééé", "ééééé"]);

        let chunks = chunk_text("日本語のテキスト", 3);
        assert_eq!(chunks, vec!["日本語", "のテキ", "スト"]);
    }

    #[test]
    fn test_zero_size_terminates() {
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_whitespace_only_pieces_dropped() {
        assert!(chunk_text("      ", 2).is_empty());
    }

    #[test]
    fn test_chunks_reassemble_and_respect_size() {
        let text = "The quick brown fox jumps over the lazy dog. Pack my box with five dozen \
                    liquor jugs!  How vexingly quick daft zebras jump?\nSphinx of black quartz, \
                    judge my vow. The five boxing wizards jump quickly. "
            .repeat(6);

        for size in [20, 37, 50, 64, 100, 300] {
            let chunks = chunk_text(&text, size);
            assert!(chunks.len() > 1, "size {} should split", size);
            for chunk in &chunks {
                assert!(!chunk.is_empty());
                assert!(
                    chunk.chars().count() <= size,
                    "chunk longer than {}: {:?}",
                    size,
                    chunk
                );
            }
            assert_eq!(collapse(&chunks.join(" ")), collapse(&text));
        }
    }
}
