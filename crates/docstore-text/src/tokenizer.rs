use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use docstore_core::config::TextConfig;

/// Tokens longer than this many bytes are dropped.
pub const MAX_TOKEN_LEN: usize = 40;

pub const STOP_WORDS: &[&str] = &[
    "a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// A normalized term and its ordinal in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,
}

/// The one tokenizer used for both documents and queries.
///
/// Policy: split on every non-alphanumeric character, drop tokens over
/// `MAX_TOKEN_LEN` bytes, lowercase, then optionally remove `STOP_WORDS`.
/// Positions count tokens before stop-word removal, so phrases keep their
/// gaps.
#[derive(Clone)]
pub struct Tokenizer {
    analyzer: TextAnalyzer,
    stop_words: bool,
}

impl Tokenizer {
    pub fn new(config: &TextConfig) -> Self {
        let analyzer = if config.stop_words {
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
                .filter(LowerCaser)
                .filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
                .build()
        } else {
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
                .filter(LowerCaser)
                .build()
        };
        Self { analyzer, stop_words: config.stop_words }
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            let token = stream.token();
            tokens.push(Token { text: token.text.clone(), position: token.position as u32 });
        }
        tokens
    }

    /// Identifies the policy so a persisted index built under a different
    /// one can be detected.
    pub fn fingerprint(&self) -> String {
        format!("simple+max{}+lower{}", MAX_TOKEN_LEN, if self.stop_words { "+stop" } else { "" })
    }
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(&TextConfig::default()) }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer").field("policy", &self.fingerprint()).finish()
    }
}
