use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use tokenizers::models::wordlevel::WordLevel;
use tokenizers::normalizers::{Lowercase, NormalizerWrapper};
use tokenizers::pre_tokenizers::whitespace::WhitespaceSplit;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::vocabulary::{VocabularyIndex, UNKNOWN_ID};

/// Number of ids the model was trained on.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 100;

// Contains whitespace, so whitespace splitting can never produce it as a token.
const UNKNOWN_TOKEN: &str = "<unk> \u{0}";

// Keras `Tokenizer` default `filters`.
const KERAS_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Text clean-up applied before whitespace splitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextNormalization {
    /// Lowercase only. Punctuation stays glued to its word.
    #[default]
    Verbatim,
    /// Replace the Keras tokenizer's filter characters with spaces first,
    /// matching how the vocabulary was built at training time.
    KerasFilters,
}

impl TextNormalization {
    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::Verbatim => Cow::Borrowed(text),
            Self::KerasFilters => Cow::Owned(
                text.chars()
                    .map(|c| if KERAS_FILTERS.contains(c) { ' ' } else { c })
                    .collect(),
            ),
        }
    }
}

impl FromStr for TextNormalization {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verbatim" => Ok(Self::Verbatim),
            "keras" | "keras-filters" => Ok(Self::KerasFilters),
            other => Err(ClassifierError::ValidationError(format!(
                "Unknown text normalization '{}' (expected 'verbatim' or 'keras-filters')",
                other
            ))),
        }
    }
}

impl fmt::Display for TextNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verbatim => write!(f, "verbatim"),
            Self::KerasFilters => write!(f, "keras-filters"),
        }
    }
}

/// A fixed-length, zero-padded sequence of vocabulary ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence {
    ids: Vec<u32>,
    token_count: usize,
}

impl EncodedSequence {
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when no token of the input landed in the sequence.
    pub fn is_blank(&self) -> bool {
        self.token_count == 0
    }

    /// Number of input tokens kept (before padding, after truncation).
    pub fn token_count(&self) -> usize {
        self.token_count
    }
}

/// Turns raw text into an [`EncodedSequence`].
///
/// The text is lowercased, split on runs of whitespace and every token is
/// looked up as a whole word; unknown words become [`UNKNOWN_ID`]. The ids
/// are then copied left to right into a zero-filled sequence of fixed
/// length, dropping whatever does not fit.
#[derive(Debug, Clone)]
pub struct Encoder {
    tokenizer: Tokenizer,
    sequence_length: usize,
    normalization: TextNormalization,
}

impl Encoder {
    /// # Errors
    /// - `ValidationError` if `sequence_length` is zero
    /// - `BuildError` if the word-level tokenizer cannot be built from the vocabulary
    pub fn new(
        vocabulary: &VocabularyIndex,
        sequence_length: usize,
        normalization: TextNormalization,
    ) -> Result<Self, ClassifierError> {
        if sequence_length == 0 {
            return Err(ClassifierError::ValidationError(
                "Sequence length must be greater than zero".into(),
            ));
        }

        let mut vocab = vocabulary.as_map().clone();
        vocab.insert(UNKNOWN_TOKEN.to_string(), UNKNOWN_ID);
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token(UNKNOWN_TOKEN.to_string())
            .build()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to build tokenizer: {}", e)))?;

        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_normalizer(NormalizerWrapper::Lowercase(Lowercase));
        tokenizer.with_pre_tokenizer(PreTokenizerWrapper::WhitespaceSplit(WhitespaceSplit));

        Ok(Self {
            tokenizer,
            sequence_length,
            normalization,
        })
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn normalization(&self) -> TextNormalization {
        self.normalization
    }

    /// Ids for every token of `text`, without padding or truncation.
    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        let text = self.normalization.apply(text);
        let encoding = self
            .tokenizer
            .encode(&*text, false)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.tokenize(text).map(|ids| ids.len())
    }

    pub fn encode(&self, text: &str) -> Result<EncodedSequence, ClassifierError> {
        let tokens = self.tokenize(text)?;
        let kept = tokens.len().min(self.sequence_length);

        let mut ids = vec![UNKNOWN_ID; self.sequence_length];
        ids[..kept].copy_from_slice(&tokens[..kept]);

        Ok(EncodedSequence {
            ids,
            token_count: kept,
        })
    }
}
