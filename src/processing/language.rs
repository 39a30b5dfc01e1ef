//! Tokenizer selection by document language or script.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use super::{
    tokenizer::{Tokenizer, WhitespaceTokenizer},
    types::Document,
};

/// Metadata key consulted for an explicit language tag.
pub const DEFAULT_LANGUAGE_KEY: &str = "language";

/// Share of non-whitespace chars that must be Han ideographs to treat text as Chinese.
const HAN_RATIO_THRESHOLD: f32 = 0.3;

/// Routes each document to the tokenizer registered for its language.
///
/// Lookup order: the metadata language tag (primary subtag, case-insensitive), then script
/// detection when enabled, then the default tokenizer.
#[derive(Clone)]
pub struct TokenizerRouter {
    default: Arc<dyn Tokenizer>,
    by_language: HashMap<String, Arc<dyn Tokenizer>>,
    language_key: String,
    detect_script: bool,
}

impl TokenizerRouter {
    /// Route every document to `default` until languages are registered.
    pub fn new(default: Arc<dyn Tokenizer>) -> Self {
        Self {
            default,
            by_language: HashMap::new(),
            language_key: DEFAULT_LANGUAGE_KEY.to_string(),
            detect_script: true,
        }
    }

    /// Register `tokenizer` for a primary language subtag such as `zh`.
    pub fn with_language(mut self, language: &str, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.by_language.insert(primary_subtag(language), tokenizer);
        self
    }

    /// Read the language tag from `key` instead of `language`.
    pub fn with_language_key(mut self, key: impl Into<String>) -> Self {
        self.language_key = key.into();
        self
    }

    /// Toggle script detection for documents without a usable language tag.
    pub fn with_script_detection(mut self, enabled: bool) -> Self {
        self.detect_script = enabled;
        self
    }

    /// Pick the tokenizer for `document`.
    pub fn select(&self, document: &Document) -> &dyn Tokenizer {
        let tagged = document
            .metadata
            .get(&self.language_key)
            .and_then(Value::as_str)
            .map(primary_subtag)
            .and_then(|language| self.by_language.get(&language));
        if let Some(tokenizer) = tagged {
            return tokenizer.as_ref();
        }

        if self.detect_script {
            if let Some(tokenizer) =
                detect_language(document.text()).and_then(|language| self.by_language.get(language))
            {
                return tokenizer.as_ref();
            }
        }

        self.default.as_ref()
    }
}

impl Default for TokenizerRouter {
    fn default() -> Self {
        Self::new(Arc::new(WhitespaceTokenizer))
    }
}

impl std::fmt::Debug for TokenizerRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<_> = self.by_language.keys().collect();
        languages.sort();
        f.debug_struct("TokenizerRouter")
            .field("languages", &languages)
            .field("language_key", &self.language_key)
            .field("detect_script", &self.detect_script)
            .finish_non_exhaustive()
    }
}

/// Guess a language from the dominant script of `text`.
///
/// Only Han-dominant text is recognized (`zh`); everything else returns `None`.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let (mut total, mut han) = (0usize, 0usize);
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_han(c) {
            han += 1;
        }
    }
    if total > 0 && han as f32 / total as f32 >= HAN_RATIO_THRESHOLD {
        Some("zh")
    } else {
        None
    }
}

fn is_han(c: char) -> bool {
    matches!(c,
        '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{2A700}'..='\u{2EBEF}')
}

fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
