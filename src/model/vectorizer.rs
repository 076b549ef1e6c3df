//! Bag-of-terms tf-idf vectorizer with a bounded vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Words carrying no class signal, dropped during tokenization.
const STOPWORDS: [&str; 36] = [
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "he", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "we", "were", "will",
    "with", "you", "your", "i", "not", "but", "they", "their",
];

/// Fixed feature-extraction function shared by trainer and oracle.
///
/// The vocabulary is frozen at fit time; transforming unseen text maps
/// out-of-vocabulary terms to nothing. Vectors are L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Term at index `i` is feature `i`.
    pub vocabulary: Vec<String>,
    /// Inverse document frequency per feature, smoothed.
    pub idf: Vec<f32>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TfIdfVectorizer {
    /// Fit a vocabulary of at most `max_features` terms over the corpus,
    /// keeping the terms seen in the most documents.
    pub fn fit(documents: &[String], max_features: usize) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
            for token in tokenize(doc) {
                if seen.insert(token.clone()) {
                    *doc_freq.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
        // Highest document frequency first; ties broken alphabetically so
        // the fitted vocabulary is deterministic.
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max_features);

        let n_docs = documents.len() as f32;
        let vocabulary: Vec<String> = terms.iter().map(|(t, _)| t.clone()).collect();
        let idf: Vec<f32> = terms
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f32)).ln() + 1.0)
            .collect();

        let mut vectorizer = Self {
            vocabulary,
            idf,
            index: HashMap::new(),
        };
        vectorizer.rebuild_index();
        vectorizer
    }

    /// Rebuild the term lookup table. Must be called after deserializing.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
    }

    /// Transform text into a dense tf-idf vector of vocabulary length.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&i) = self.index.get(&token) {
                vector[i] += 1.0;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Lowercased alphanumeric tokens of length >= 2, stopwords removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn vocabulary_is_bounded_and_deterministic() {
        let corpus = docs(&[
            "please confirm password details",
            "password reset link expires",
            "weather news sports password",
        ]);
        let a = TfIdfVectorizer::fit(&corpus, 3);
        let b = TfIdfVectorizer::fit(&corpus, 3);
        assert_eq!(a.vocabulary, b.vocabulary);
        assert_eq!(a.vocabulary.len(), 3);
        // "password" appears in every document.
        assert!(a.vocabulary.contains(&"password".to_string()));
    }

    #[test]
    fn transform_is_l2_normalized() {
        let corpus = docs(&["confirm password now", "daily weather report"]);
        let v = TfIdfVectorizer::fit(&corpus, 100);
        let x = v.transform("confirm password");
        let norm: f32 = x.iter().map(|a| a * a).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unseen_terms_map_to_zero_vector() {
        let corpus = docs(&["confirm password now", "daily weather report"]);
        let v = TfIdfVectorizer::fit(&corpus, 100);
        let x = v.transform("zzz qqq");
        assert!(x.iter().all(|&a| a == 0.0));
    }

    #[test]
    fn stopwords_never_enter_the_vocabulary() {
        let corpus = docs(&["the the the password", "the the weather"]);
        let v = TfIdfVectorizer::fit(&corpus, 100);
        assert!(!v.vocabulary.contains(&"the".to_string()));
    }
}
