use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;
use serde_json::{Map, Value};

use super::error::ClassifierError;

/// Id every word missing from the vocabulary resolves to. Also the padding value.
pub const UNKNOWN_ID: u32 = 0;

/// Read-only mapping from lowercase word to model input id.
///
/// Artifacts come in several shapes (a flat object, an object nested under
/// `word_index`, a JSON-encoded string under `word_index`, or the full Keras
/// `Tokenizer.to_json()` document). All of them are normalised here, at load
/// time, so lookups never have to care where the mapping came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyIndex {
    word_index: HashMap<String, u32>,
}

impl VocabularyIndex {
    /// Loads and normalises a vocabulary artifact from disk.
    ///
    /// # Errors
    /// - `VocabularyError` if the file cannot be read
    /// - `VocabularyError` if the content is not a recognised vocabulary shape
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ClassifierError::VocabularyError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let vocabulary = Self::from_json_str(&raw)?;
        info!("Loaded vocabulary with {} entries from {:?}", vocabulary.len(), path);
        Ok(vocabulary)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ClassifierError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::VocabularyError(format!("Invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ClassifierError> {
        let entries = locate_word_index(value)?;
        if entries.is_empty() {
            return Err(ClassifierError::VocabularyError(
                "Vocabulary contains no entries".into(),
            ));
        }

        let mut word_index = HashMap::with_capacity(entries.len());
        for (word, id) in entries {
            let id = id
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(|| {
                    ClassifierError::VocabularyError(format!(
                        "Id for '{}' is not a non-negative 32-bit integer: {}",
                        word, id
                    ))
                })?;
            word_index.insert(word, id);
        }
        Ok(Self { word_index })
    }

    /// Resolves a token to its id, falling back to [`UNKNOWN_ID`].
    pub fn id(&self, word: &str) -> u32 {
        self.word_index.get(word).copied().unwrap_or(UNKNOWN_ID)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_index.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, u32> {
        &self.word_index
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for VocabularyIndex {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            word_index: iter.into_iter().map(|(w, id)| (w.into(), id)).collect(),
        }
    }
}

fn locate_word_index(value: Value) -> Result<Map<String, Value>, ClassifierError> {
    let Value::Object(mut root) = value else {
        return Err(ClassifierError::VocabularyError(
            "Vocabulary artifact must be a JSON object".into(),
        ));
    };

    // Keras Tokenizer.to_json(): {"class_name": ..., "config": {"word_index": "<json>"}}
    let nested_config = matches!(
        root.get("config"),
        Some(Value::Object(config)) if config.contains_key("word_index")
    );
    if nested_config {
        if let Some(Value::Object(mut config)) = root.remove("config") {
            if let Some(inner) = config.remove("word_index") {
                return unwrap_word_index(inner);
            }
        }
    }

    match root.get("word_index") {
        Some(Value::Object(_)) | Some(Value::String(_)) => match root.remove("word_index") {
            Some(inner) => unwrap_word_index(inner),
            None => Ok(root),
        },
        _ => Ok(root),
    }
}

fn unwrap_word_index(inner: Value) -> Result<Map<String, Value>, ClassifierError> {
    match inner {
        Value::Object(map) => Ok(map),
        Value::String(encoded) => match serde_json::from_str(&encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ClassifierError::VocabularyError(
                "Encoded word_index is not a JSON object".into(),
            )),
            Err(e) => Err(ClassifierError::VocabularyError(format!(
                "Encoded word_index is not valid JSON: {}",
                e
            ))),
        },
        other => Err(ClassifierError::VocabularyError(format!(
            "word_index must be an object or an encoded object, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flat_mapping() {
        let vocab = VocabularyIndex::from_json_str(r#"{"i": 1, "feel": 2, "sad": 3}"#).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("feel"), 2);
    }

    #[test]
    fn test_nested_word_index_object() {
        let vocab =
            VocabularyIndex::from_json_str(r#"{"word_index": {"i": 1, "feel": 2}, "num_words": 10}"#)
                .unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.id("i"), 1);
        assert!(!vocab.contains("num_words"));
    }

    #[test]
    fn test_nested_word_index_string() {
        let vocab =
            VocabularyIndex::from_json_str(r#"{"word_index": "{\"happy\": 7, \"angry\": 9}"}"#)
                .unwrap();
        assert_eq!(vocab.id("happy"), 7);
        assert_eq!(vocab.id("angry"), 9);
    }

    #[test]
    fn test_keras_tokenizer_json() {
        let raw = r#"{
            "class_name": "Tokenizer",
            "config": {
                "num_words": 5000,
                "oov_token": "<OOV>",
                "word_index": "{\"<OOV>\": 1, \"i\": 2, \"am\": 3}"
            }
        }"#;
        let vocab = VocabularyIndex::from_json_str(raw).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("am"), 3);
    }

    #[test]
    fn test_flat_mapping_with_config_word() {
        // A plain vocabulary may legitimately contain the word "config".
        let vocab = VocabularyIndex::from_json_str(r#"{"config": 4, "file": 5}"#).unwrap();
        assert_eq!(vocab.id("config"), 4);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_unknown_word_resolves_to_zero() {
        let vocab: VocabularyIndex = vec![("known", 12)].into_iter().collect();
        assert_eq!(vocab.id("unknown"), UNKNOWN_ID);
        assert_eq!(vocab.id("Known"), UNKNOWN_ID);
        assert_eq!(vocab.id(""), UNKNOWN_ID);
    }

    #[test]
    fn test_malformed_artifacts_are_rejected() {
        let cases = [
            "not json",
            "[1, 2, 3]",
            "{}",
            r#"{"word": -1}"#,
            r#"{"word": 1.5}"#,
            r#"{"word": "one"}"#,
            r#"{"word": 4294967296}"#,
            r#"{"word_index": "[1]"}"#,
            r#"{"word_index": "{broken"}"#,
        ];
        for raw in cases {
            let result = VocabularyIndex::from_json_str(raw);
            assert!(
                matches!(result, Err(ClassifierError::VocabularyError(_))),
                "expected vocabulary error for {}",
                raw
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"word_index": {{"tired": 42}}}}"#).unwrap();
        let vocab = VocabularyIndex::from_file(file.path()).unwrap();
        assert_eq!(vocab.id("tired"), 42);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = VocabularyIndex::from_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ClassifierError::VocabularyError(_))));
    }
}
