//! Pluggable tokenization.
//!
//! `Tokenizer` is the one seam the core is built around: the indexer feeds
//! it whole field values in [`TokenizeMode::Index`], the searcher feeds it
//! the query string in [`TokenizeMode::Search`]. Built-in tokenizers never
//! need a dictionary; `JiebaTokenizer` is the one exception, gated behind
//! the `tokenizer-jieba` feature exactly like the teacher gates it.

use std::sync::Arc;

/// Which side of the pipeline is calling the tokenizer. A tokenizer is
/// free to ignore this (both built-ins do); `JiebaTokenizer` does not —
/// its search mode re-splits long words the way a user's query terms
/// should be more eagerly matched than a document's own text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeMode {
    Index,
    Search,
}

/// One token surfaced by a tokenizer, with the byte offset into the
/// source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub surface: String,
    pub start: usize,
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str, mode: TokenizeMode) -> Vec<Term>;
    fn name(&self) -> &str;
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `text` into maximal runs of word characters, each paired with
/// its starting byte offset.
fn word_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            spans.push((s, &text[s..i]));
        }
    }
    if let Some(s) = start {
        spans.push((s, &text[s..]));
    }
    spans
}

/// Splits on runs of non-alphanumeric characters. Fast and dependency-free;
/// the right default for space-delimited text.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    pub case_sensitive: bool,
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self { case_sensitive: false, min_len: 1, max_len: 64 }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str, _mode: TokenizeMode) -> Vec<Term> {
        word_spans(text)
            .into_iter()
            .filter_map(|(start, s)| {
                let len = s.chars().count();
                if len < self.min_len || len > self.max_len {
                    return None;
                }
                let surface = if self.case_sensitive { s.to_string() } else { s.to_lowercase() };
                Some(Term { surface, start })
            })
            .collect()
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Sliding character window of size `n`. Useful for CJK text and
/// fuzzy/substring matching where whitespace doesn't separate words.
#[derive(Debug, Clone)]
pub struct NgramTokenizer {
    pub n: usize,
    pub case_sensitive: bool,
}

impl NgramTokenizer {
    pub fn new(n: usize) -> Self {
        Self { n, case_sensitive: false }
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str, _mode: TokenizeMode) -> Vec<Term> {
        let normalized = if self.case_sensitive { text.to_string() } else { text.to_lowercase() };
        let indices: Vec<(usize, char)> = normalized.char_indices().collect();
        if indices.len() < self.n {
            return Vec::new();
        }

        indices
            .windows(self.n)
            .map(|window| {
                let start = window[0].0;
                let last = window[self.n - 1];
                let end = last.0 + last.1.len_utf8();
                Term { surface: normalized[start..end].to_string(), start }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "ngram"
    }
}

#[cfg(feature = "tokenizer-jieba")]
mod jieba_plugin {
    use super::*;
    use jieba_rs::Jieba;

    /// Chinese word segmentation backed by `jieba-rs`.
    ///
    /// Index mode uses precise cut (one partition of the input); search
    /// mode additionally re-splits long words, matching the original
    /// system's `gojieba.DefaultMode` / `gojieba.SearchMode` split.
    pub struct JiebaTokenizer {
        jieba: Arc<Jieba>,
        case_sensitive: bool,
        min_len: usize,
        max_len: usize,
    }

    impl Default for JiebaTokenizer {
        fn default() -> Self {
            Self { jieba: Arc::new(Jieba::new()), case_sensitive: false, min_len: 1, max_len: 64 }
        }
    }

    impl JiebaTokenizer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn case_sensitive(mut self, sensitive: bool) -> Self {
            self.case_sensitive = sensitive;
            self
        }

        pub fn with_length_range(mut self, min: usize, max: usize) -> Self {
            self.min_len = min;
            self.max_len = max;
            self
        }
    }

    impl Tokenizer for JiebaTokenizer {
        fn tokenize(&self, text: &str, mode: TokenizeMode) -> Vec<Term> {
            let words = match mode {
                TokenizeMode::Index => self.jieba.cut(text, false),
                TokenizeMode::Search => self.jieba.cut_for_search(text, false),
            };

            let base = text.as_ptr() as usize;
            words
                .into_iter()
                .filter_map(|w| {
                    let trimmed = w.trim();
                    if trimmed.is_empty() {
                        return None;
                    }
                    let len = trimmed.chars().count();
                    if len < self.min_len || len > self.max_len {
                        return None;
                    }
                    // `w` is a slice of `text` — jieba-rs never copies —
                    // so pointer subtraction recovers its byte offset.
                    let start = w.as_ptr() as usize - base;
                    let surface = if self.case_sensitive { trimmed.to_string() } else { trimmed.to_lowercase() };
                    Some(Term { surface, start })
                })
                .collect()
        }

        fn name(&self) -> &str {
            "jieba"
        }
    }

}

#[cfg(feature = "tokenizer-jieba")]
pub use jieba_plugin::JiebaTokenizer;

/// Constructs a tokenizer from its configured name (`whitespace`, `ngram`,
/// and, with the `tokenizer-jieba` feature, `jieba`).
pub fn from_name(name: &str) -> Option<Arc<dyn Tokenizer>> {
    match name {
        "whitespace" => Some(Arc::new(WhitespaceTokenizer::default())),
        "ngram" => Some(Arc::new(NgramTokenizer::new(2))),
        #[cfg(feature = "tokenizer-jieba")]
        "jieba" => Some(Arc::new(jieba_plugin::JiebaTokenizer::default())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_offsets_point_back_into_source() {
        let tokenizer = WhitespaceTokenizer::default();
        let text = "Hello, World!";
        let terms = tokenizer.tokenize(text, TokenizeMode::Index);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].surface, "hello");
        assert_eq!(&text[terms[0].start..terms[0].start + 5], "Hello");
        assert_eq!(terms[1].surface, "world");
        assert_eq!(&text[terms[1].start..terms[1].start + 5], "World");
    }

    #[test]
    fn whitespace_respects_length_bounds() {
        let tokenizer = WhitespaceTokenizer { case_sensitive: false, min_len: 3, max_len: 64 };
        let terms = tokenizer.tokenize("a bb ccc dddd", TokenizeMode::Search);
        let surfaces: Vec<_> = terms.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["ccc", "dddd"]);
    }

    #[test]
    fn ngram_windows_by_char_not_byte() {
        let tokenizer = NgramTokenizer::new(2);
        let terms = tokenizer.tokenize("rust", TokenizeMode::Index);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].surface, "ru");
        assert_eq!(terms[1].surface, "us");
        assert_eq!(terms[2].surface, "st");
    }

    #[test]
    fn ngram_too_short_yields_nothing() {
        let tokenizer = NgramTokenizer::new(5);
        assert!(tokenizer.tokenize("hi", TokenizeMode::Index).is_empty());
    }

    #[test]
    fn from_name_resolves_builtins() {
        assert_eq!(from_name("whitespace").unwrap().name(), "whitespace");
        assert_eq!(from_name("ngram").unwrap().name(), "ngram");
        assert!(from_name("does-not-exist").is_none());
    }
}
