use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

// Runs of two or more word characters; single letters ("a", "i") carry no signal.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static punctuation pattern"));

/// One example phrase and the command it trains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseEntry {
    pub intent: String,
    pub command: String,
    pub phrase: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseMatch {
    pub intent: String,
    pub command: String,
    /// Cosine similarity, 0.0 - 1.0.
    pub confidence: f64,
}

/// Sorted by term id.
type SparseVector = Vec<(usize, f64)>;

/// Nearest-neighbour matcher over unigram+bigram TF-IDF vectors of every
/// registered example phrase.
///
/// Immutable once built. A registry change means building a new matcher.
#[derive(Debug, Clone, Default)]
pub struct PhraseMatcher {
    entries: Vec<PhraseEntry>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl PhraseMatcher {
    pub fn build(entries: Vec<PhraseEntry>) -> Self {
        if entries.is_empty() {
            warn!("No command examples found. Matcher disabled.");
            return Self::default();
        }

        let docs: Vec<Vec<String>> = entries.iter().map(|e| ngrams(&e.phrase)).collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &docs {
            let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // Smoothed idf, as if one extra document contained every term.
        let n = docs.len() as f64;
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (id, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), id);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        let mut matcher = Self {
            entries,
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        matcher.rows = docs.iter().map(|doc| matcher.vectorize(doc)).collect();

        info!(
            examples = matcher.entries.len(),
            terms = matcher.idf.len(),
            "Phrase index built"
        );
        matcher
    }

    pub fn is_enabled(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best example for `text`. `None` means "no match, confidence 0": the
    /// matcher is disabled or the text shares no n-gram with any example.
    /// Ties go to the earliest entry.
    pub fn best_match(&self, text: &str) -> Option<PhraseMatch> {
        if !self.is_enabled() {
            return None;
        }

        let query = self.vectorize(&ngrams(text));
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let score = dot(&query, row);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((i, score));
            }
        }

        best.map(|(i, score)| {
            let entry = &self.entries[i];
            PhraseMatch {
                intent: entry.intent.clone(),
                command: entry.command.clone(),
                confidence: score.clamp(0.0, 1.0),
            }
        })
    }

    fn vectorize(&self, terms: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms {
            if let Some(&id) = self.vocabulary.get(term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector
    }
}

/// Lowercase, drop punctuation, trim.
pub fn normalize(text: &str) -> String {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), "")
        .trim()
        .to_string()
}

/// Unigrams followed by bigrams of the normalized text.
fn ngrams(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let tokens: Vec<&str> = TOKEN.find_iter(&normalized).map(|m| m.as_str()).collect();

    let mut grams: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    grams.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    grams
}

/// Both vectors are unit length, so this is the cosine.
fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
