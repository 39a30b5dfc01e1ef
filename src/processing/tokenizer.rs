//! Pluggable text segmentation strategies.
//!
//! Every strategy implements [`Tokenizer`]: it turns text into an ordered list of token strings
//! and names the separator that glues a window of tokens back into text. Strategies differ by
//! script:
//!
//! - [`WhitespaceTokenizer`]: space-delimited scripts, rejoined with a single space.
//! - [`UnicodeWordTokenizer`]: UAX #29 word boundaries with punctuation kept as tokens.
//! - `JiebaTokenizer`: dictionary-based Chinese segmentation (feature `jieba`), rejoined
//!   verbatim.
//! - [`BpeTokenizer`]: tiktoken encodings, so windows line up with an embedding model's budget.
//!
//! Tokenizers hold read-only state (dictionaries, BPE ranks) that is costly to load. Build them
//! once and share them through `Arc`.

use std::{fmt, sync::Arc};

use anyhow::Error as TokenizerError;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};
use unicode_segmentation::UnicodeSegmentation;

use super::types::ChunkingError;

/// Segments text into an ordered, deterministic sequence of tokens.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into tokens without reordering them.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// String placed between tokens when a window is turned back into text.
    fn separator(&self) -> &str {
        " "
    }
}

/// Tokenizer strategy selected through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Split on Unicode whitespace.
    Whitespace,
    /// Split on UAX #29 word boundaries.
    Unicode,
    /// Dictionary-based Chinese word segmentation.
    Jieba,
    /// tiktoken BPE for the named model or encoding.
    Bpe(String),
}

impl std::str::FromStr for TokenizerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err(()),
            "whitespace" | "ws" => Ok(Self::Whitespace),
            "unicode" | "words" => Ok(Self::Unicode),
            "jieba" => Ok(Self::Jieba),
            _ => Ok(Self::Bpe(trimmed.to_string())),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace => f.write_str("whitespace"),
            Self::Unicode => f.write_str("unicode"),
            Self::Jieba => f.write_str("jieba"),
            Self::Bpe(model) => f.write_str(model),
        }
    }
}

/// Build a shareable tokenizer for the configured strategy.
pub fn build_tokenizer(kind: &TokenizerKind) -> Result<Arc<dyn Tokenizer>, ChunkingError> {
    tracing::debug!(tokenizer = %kind, "Building tokenizer");
    match kind {
        TokenizerKind::Whitespace => Ok(Arc::new(WhitespaceTokenizer)),
        TokenizerKind::Unicode => Ok(Arc::new(UnicodeWordTokenizer)),
        TokenizerKind::Jieba => build_jieba(),
        TokenizerKind::Bpe(model) => Ok(Arc::new(BpeTokenizer::new(model)?)),
    }
}

#[cfg(feature = "jieba")]
fn build_jieba() -> Result<Arc<dyn Tokenizer>, ChunkingError> {
    Ok(Arc::new(JiebaTokenizer::new()))
}

#[cfg(not(feature = "jieba"))]
fn build_jieba() -> Result<Arc<dyn Tokenizer>, ChunkingError> {
    Err(ChunkingError::Tokenizer {
        model: "jieba".to_string(),
        source: anyhow::anyhow!("rustykb was built without the `jieba` feature"),
    })
}

/// Splits on runs of Unicode whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Splits on UAX #29 word boundaries, dropping whitespace-only segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_word_bounds()
            .filter(|segment| !segment.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Chinese word segmentation backed by the jieba dictionary.
///
/// Whitespace is kept as tokens and the separator is empty, so every window is a verbatim
/// slice of the source text.
#[cfg(feature = "jieba")]
pub struct JiebaTokenizer {
    segmenter: jieba_rs::Jieba,
}

#[cfg(feature = "jieba")]
impl JiebaTokenizer {
    /// Load the bundled dictionary.
    pub fn new() -> Self {
        Self {
            segmenter: jieba_rs::Jieba::new(),
        }
    }
}

#[cfg(feature = "jieba")]
impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "jieba")]
impl Tokenizer for JiebaTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.segmenter
            .cut(text, true)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn separator(&self) -> &str {
        ""
    }
}

/// tiktoken BPE tokenizer; each token is decoded back to its text piece.
///
/// A character whose UTF-8 bytes straddle several BPE tokens is emitted once, as part of the
/// piece where its last byte lands. Pieces therefore concatenate to the exact source text,
/// and such a merged piece counts as a single token in a window.
pub struct BpeTokenizer {
    model: String,
    encoding: CoreBPE,
}

impl BpeTokenizer {
    /// Resolve the encoding for a model name or encoding name.
    ///
    /// Unknown names fall back to `cl100k_base` with a warning.
    pub fn new(model: &str) -> Result<Self, ChunkingError> {
        let normalized = model.trim();
        let target = if normalized.is_empty() {
            "cl100k_base"
        } else {
            normalized
        };
        let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
            model: target.to_string(),
            source,
        })?;
        Ok(Self {
            model: target.to_string(),
            encoding,
        })
    }

    /// Model or encoding name this tokenizer was built for.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Tokenizer for BpeTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let ids = self.encoding.encode_ordinary(text);
        let mut pieces = Vec::with_capacity(ids.len());
        let mut pending: Vec<u8> = Vec::new();
        for bytes in self.encoding._decode_native_and_split(ids) {
            pending.extend_from_slice(&bytes);
            if let Ok(piece) = std::str::from_utf8(&pending) {
                pieces.push(piece.to_string());
                pending.clear();
            }
        }
        if !pending.is_empty() {
            // Unreachable for `&str` input: the full byte stream is the source text.
            pieces.push(String::from_utf8_lossy(&pending).into_owned());
        }
        pieces
    }

    fn separator(&self) -> &str {
        ""
    }
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; trying encoding name"
            );
            if let Some(candidate) = encoding_from_name(model) {
                candidate
            } else {
                tracing::warn!(model, "Falling back to 'cl100k_base' encoding");
                cl100k_base()
            }
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, TokenizerError>> {
    match name {
        "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses_runs() {
        let tokens = WhitespaceTokenizer.tokenize("  one\ttwo \n three ");
        assert_eq!(tokens, vec!["one", "two", "three"]);
        assert_eq!(WhitespaceTokenizer.separator(), " ");
    }

    #[test]
    fn unicode_words_keep_punctuation() {
        let tokens = UnicodeWordTokenizer.tokenize("Hello, world!");
        assert_eq!(tokens, vec!["Hello", ",", "world", "!"]);
    }

    #[test]
    fn tokenizers_are_deterministic() {
        let text = "Determinism matters: same input, same tokens.";
        assert_eq!(
            UnicodeWordTokenizer.tokenize(text),
            UnicodeWordTokenizer.tokenize(text)
        );
    }

    #[test]
    fn bpe_pieces_rebuild_source_text() {
        let tokenizer = BpeTokenizer::new("cl100k_base").expect("encoding available");
        let text = "The quick brown fox jumps over the lazy dog.";
        let tokens = tokenizer.tokenize(text);
        assert!(tokens.len() > 1);
        assert_eq!(tokens.concat(), text);
        assert_eq!(tokenizer.separator(), "");
    }

    #[test]
    fn bpe_pieces_keep_multibyte_characters_whole() {
        let tokenizer = BpeTokenizer::new("cl100k_base").expect("encoding available");
        let text = "我来到北京清华大学，研究自然语言处理和机器学习 deep learning 🦀";
        let tokens = tokenizer.tokenize(text);
        assert!(tokens.len() > 1);
        assert_eq!(tokens.concat(), text);
        assert!(tokens.iter().all(|token| !token.contains('\u{FFFD}')));
        assert!(tokens.iter().any(|token| token.contains('🦀')));
    }

    #[test]
    fn bpe_unknown_model_falls_back_to_cl100k() {
        let tokenizer = BpeTokenizer::new("not-a-real-model").expect("fallback encoding");
        assert_eq!(tokenizer.model(), "not-a-real-model");
        assert!(!tokenizer.tokenize("hello").is_empty());
    }

    #[cfg(feature = "jieba")]
    #[test]
    fn jieba_segments_chinese_words() {
        let tokenizer = JiebaTokenizer::new();
        let tokens = tokenizer.tokenize("我来到北京清华大学");
        assert_eq!(tokens, vec!["我", "来到", "北京", "清华大学"]);
        assert_eq!(tokens.join(tokenizer.separator()), "我来到北京清华大学");
    }

    #[test]
    fn parses_tokenizer_kinds() {
        assert_eq!("Whitespace".parse::<TokenizerKind>(), Ok(TokenizerKind::Whitespace));
        assert_eq!("unicode".parse::<TokenizerKind>(), Ok(TokenizerKind::Unicode));
        assert_eq!("jieba".parse::<TokenizerKind>(), Ok(TokenizerKind::Jieba));
        assert_eq!(
            " text-embedding-3-small ".parse::<TokenizerKind>(),
            Ok(TokenizerKind::Bpe("text-embedding-3-small".into()))
        );
        assert_eq!("  ".parse::<TokenizerKind>(), Err(()));
    }

    #[test]
    fn build_tokenizer_selects_strategy() {
        let tokenizer = build_tokenizer(&TokenizerKind::Whitespace).unwrap();
        assert_eq!(tokenizer.tokenize("a b"), vec!["a", "b"]);
        let bpe = build_tokenizer(&TokenizerKind::Bpe("gpt2".into())).unwrap();
        assert_eq!(bpe.separator(), "");
    }
}
