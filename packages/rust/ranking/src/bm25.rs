//! Okapi BM25 over an in-memory corpus.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use distill_shared::RankingConfig;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Options {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization (0 disables it).
    pub b: f64,
}

impl Default for Bm25Options {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl From<&RankingConfig> for Bm25Options {
    fn from(config: &RankingConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
        }
    }
}

/// Lowercase, turn punctuation into spaces, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NON_WORD
        .replace_all(&lower, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// A BM25 index. Built once per corpus; cheap to throw away.
#[derive(Debug, Clone)]
pub struct Bm25 {
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lengths: Vec<usize>,
    avg_doc_length: f64,
    idf: HashMap<String, f64>,
    options: Bm25Options,
}

impl Bm25 {
    pub fn new<S: AsRef<str>>(corpus: &[S], options: Bm25Options) -> Self {
        let documents: Vec<Vec<String>> = corpus.iter().map(|d| tokenize(d.as_ref())).collect();
        let doc_lengths: Vec<usize> = documents.iter().map(Vec::len).collect();

        let total: usize = doc_lengths.iter().sum();
        let avg_doc_length = total as f64 / documents.len().max(1) as f64;

        let mut doc_freqs: HashMap<&str, usize> = HashMap::new();
        for doc in &documents {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freqs.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = doc_freqs
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                let value = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                (term.to_string(), value.max(0.0))
            })
            .collect();

        let term_freqs = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for term in doc {
                    *tf.entry(term.clone()).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        Self {
            term_freqs,
            doc_lengths,
            avg_doc_length,
            idf,
            options,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }

    /// IDF of a (lowercase) term, `None` if it occurs in no document.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// One score per document, in corpus order.
    pub fn score(&self, query: &str) -> Vec<f64> {
        let query_terms = tokenize(query);
        let Bm25Options { k1, b } = self.options;

        self.term_freqs
            .iter()
            .zip(&self.doc_lengths)
            .map(|(tf, &len)| {
                if len == 0 {
                    return 0.0;
                }
                let norm = 1.0 - b + b * (len as f64 / self.avg_doc_length);
                query_terms
                    .iter()
                    .filter_map(|term| {
                        let idf = self.idf.get(term)?;
                        // Terms missing from this document add nothing, even with k1 = 0.
                        let freq = *tf.get(term)? as f64;
                        Some(idf * (freq * (k1 + 1.0)) / (freq + k1 * norm))
                    })
                    .sum::<f64>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_strips_punctuation() {
        assert_eq!(tokenize("Hello, World! it's"), vec!["hello", "world", "it", "s"]);
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn absent_terms_score_zero() {
        let bm25 = Bm25::new(&["apple banana", "cherry date"], Bm25Options::default());
        let scores = bm25.score("apple");
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        let bm25 = Bm25::new(&["apple banana", "cherry"], Bm25Options::default());
        assert_eq!(bm25.score(""), vec![0.0, 0.0]);
        assert_eq!(bm25.score("!!!"), vec![0.0, 0.0]);
    }

    #[test]
    fn empty_corpus_is_harmless() {
        let corpus: [&str; 0] = [];
        let bm25 = Bm25::new(&corpus, Bm25Options::default());
        assert!(bm25.is_empty());
        assert_eq!(bm25.avg_doc_length(), 0.0);
        assert!(bm25.score("anything").is_empty());
    }

    #[test]
    fn empty_documents_score_zero() {
        let bm25 = Bm25::new(&["", "apple"], Bm25Options::default());
        let scores = bm25.score("apple");
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn idf_is_never_negative() {
        // a term in every document would go negative without the +1
        let bm25 = Bm25::new(&["the cat", "the dog", "the fox"], Bm25Options::default());
        let idf = bm25.idf("the").unwrap();
        assert!(idf >= 0.0);
        assert!(bm25.idf("cat").unwrap() > idf);
        assert!(bm25.idf("missing").is_none());
    }

    #[test]
    fn shorter_documents_win_with_length_normalization() {
        let corpus = ["rust is fast", "rust is fast and also has many other qualities worth noting"];
        let scores = Bm25::new(&corpus, Bm25Options::default()).score("rust");
        assert!(scores[0] > scores[1]);

        let flat = Bm25::new(&corpus, Bm25Options { k1: 1.2, b: 0.0 }).score("rust");
        assert_eq!(flat[0], flat[1]);
    }

    #[test]
    fn scores_follow_corpus_order() {
        let bm25 = Bm25::new(
            &["nothing here", "banana split", "banana banana bread"],
            Bm25Options::default(),
        );
        let scores = bm25.score("banana");
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0], 0.0);
        assert!(scores[2] > scores[1]);
    }

    #[test]
    fn zero_k1_keeps_scores_finite() {
        let bm25 = Bm25::new(&["apple banana", "cherry date"], Bm25Options { k1: 0.0, b: 0.75 });
        let scores = bm25.score("apple");
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn options_from_config() {
        let opts = Bm25Options::from(&RankingConfig::default());
        assert_eq!(opts, Bm25Options::default());
    }
}
