use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use super::error::ClassifierError;

/// Output classes of the emotion model, in the order of its score vector.
pub const EMOTION_LABELS: [&str; 5] = ["neutral", "sadness", "anger", "fear", "suicidal"];

/// Ordered class labels, index-aligned with the model's score vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::emotions()
    }
}

impl LabelSet {
    pub fn emotions() -> Self {
        Self {
            labels: EMOTION_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// # Errors
    /// - `ValidationError` if the set is empty, or a label is empty or repeated
    pub fn new(labels: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ClassifierError::ValidationError("Label set cannot be empty".into()));
        }
        if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Label {} cannot be empty",
                pos + 1
            )));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ClassifierError::ValidationError(format!(
                    "Duplicate label '{}'",
                    label
                )));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Reduces a score vector to a [`ClassificationResult`].
    ///
    /// The winner is the first index holding the maximum score. A vector
    /// whose length differs from the label set, or that holds a NaN or an
    /// infinite value, is rejected instead of guessed at.
    pub fn resolve(&self, scores: &[f32]) -> Result<ClassificationResult, ClassifierError> {
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::InferenceError(format!(
                "Model returned {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }
        if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ClassifierError::InferenceError(format!(
                "Model returned a non-finite score for '{}'",
                self.labels[pos]
            )));
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }

        Ok(ClassificationResult {
            label: self.labels[best].clone(),
            scores: self
                .labels
                .iter()
                .cloned()
                .zip(scores.iter().copied())
                .collect(),
        })
    }
}

/// The selected label and every label's score, in label-set order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    label: String,
    scores: Vec<(String, f32)>,
}

impl ClassificationResult {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scores(&self) -> &[(String, f32)] {
        &self.scores
    }

    pub fn score(&self, label: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, score)| *score)
    }

    pub fn confidence(&self) -> f32 {
        self.score(&self.label).unwrap_or_default()
    }
}

struct OrderedScores<'a>(&'a [(String, f32)]);

impl Serialize for OrderedScores<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in self.0 {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}

// Serialized by hand so `scores` keeps label-set order on the wire.
impl Serialize for ClassificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ClassificationResult", 2)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("scores", &OrderedScores(&self.scores))?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax() {
        let result = LabelSet::emotions().resolve(&[0.1, 0.05, 0.7, 0.1, 0.05]).unwrap();
        assert_eq!(result.label(), "anger");
        assert_eq!(result.confidence(), 0.7);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let labels = LabelSet::emotions();
        let result = labels.resolve(&[0.1, 0.4, 0.1, 0.4, 0.0]).unwrap();
        assert_eq!(result.label(), "sadness");
        let result = labels.resolve(&[0.2; 5]).unwrap();
        assert_eq!(result.label(), "neutral");
    }

    #[test]
    fn test_scores_cover_every_label_in_order() {
        let result = LabelSet::emotions().resolve(&[0.5, 0.1, 0.1, 0.2, 0.1]).unwrap();
        let labels: Vec<&str> = result.scores().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, EMOTION_LABELS);
        assert_eq!(result.score("fear"), Some(0.2));
        assert_eq!(result.score("joy"), None);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let labels = LabelSet::emotions();
        assert!(matches!(
            labels.resolve(&[0.5, 0.5]),
            Err(ClassifierError::InferenceError(_))
        ));
        assert!(labels.resolve(&[]).is_err());
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let labels = LabelSet::emotions();
        assert!(labels.resolve(&[f32::NAN, 0.1, 0.1, 0.1, 0.1]).is_err());
        assert!(labels.resolve(&[0.1, f32::INFINITY, 0.1, 0.1, 0.1]).is_err());
    }

    #[test]
    fn test_label_set_validation() {
        assert!(LabelSet::new(Vec::<String>::new()).is_err());
        assert!(LabelSet::new(vec!["a", ""]).is_err());
        assert!(LabelSet::new(vec!["a", "b", "a"]).is_err());
        let labels = LabelSet::new(vec!["calm", "upset"]).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(1), Some("upset"));
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["calm", "upset"]);
    }

    #[test]
    fn test_serialized_order() {
        let result = LabelSet::emotions().resolve(&[0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"label":"fear","scores":{"neutral":0.0,"sadness":0.0,"anger":0.0,"fear":1.0,"suicidal":0.0}}"#
        );
    }
}
