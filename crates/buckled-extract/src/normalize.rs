//! Local spelling correction and mapping of free text to canonical service
//! names. Runs before every text extraction and is the fallback when the
//! collaborator is unavailable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Misspellings and their corrections, applied in order as whole words.
const CORRECTIONS: &[(&str, &str)] = &[
    ("oild", "oil"),
    ("oile", "oil"),
    ("oill", "oil"),
    ("brakes", "brake"),
    ("braek", "brake"),
    ("brack", "brake"),
    ("tyre", "tire"),
    ("tires", "tire"),
    ("battary", "battery"),
    ("battrey", "battery"),
    ("batter", "battery"),
    ("transmision", "transmission"),
    ("transmition", "transmission"),
    ("maintnance", "maintenance"),
    ("maintanance", "maintenance"),
    ("replacment", "replacement"),
    ("replacemnt", "replacement"),
    ("inspekshun", "inspection"),
    ("inspecshun", "inspection"),
    ("chekup", "checkup"),
    ("checkup", "check up"),
    ("airconditioner", "air conditioner"),
    ("aircon", "air conditioning"),
    ("ac", "air conditioning"),
];

/// Lookup phrases and the canonical service each maps to. Order breaks ties.
pub const CANONICAL_SERVICES: &[(&str, &str)] = &[
    ("oil change", "Oil Change"),
    ("oil", "Oil Change"),
    ("brake service", "Brake Service"),
    ("brake", "Brake Service"),
    ("brakes", "Brake Service"),
    ("brake pad", "Brake Pad Replacement"),
    ("brake pads", "Brake Pad Replacement"),
    ("tire rotation", "Tire Rotation"),
    ("tire", "Tire Service"),
    ("tires", "Tire Service"),
    ("battery", "Battery Replacement"),
    ("battery replacement", "Battery Replacement"),
    ("transmission", "Transmission Service"),
    ("air filter", "Air Filter Replacement"),
    ("cabin filter", "Cabin Air Filter Replacement"),
    ("tune up", "Tune Up"),
    ("tuneup", "Tune Up"),
    ("inspection", "Vehicle Inspection"),
    ("check up", "Vehicle Inspection"),
    ("checkup", "Vehicle Inspection"),
    ("air conditioning", "AC Service"),
    ("ac service", "AC Service"),
    ("air conditioner", "AC Service"),
];

/// Leading words that carry no service meaning ("my brakes", "the oil").
const FILLER_WORDS: &[&str] = &["my", "the", "our", "a", "an"];

const MATCH_THRESHOLD: f64 = 0.6;

static CORRECTION_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    CORRECTIONS
        .iter()
        .map(|(typo, fix)| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(typo))).unwrap();
            (re, *fix)
        })
        .collect()
});

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub corrected: String,
    pub standardized: String,
    pub confidence: u8,
}

/// Correct common misspellings and map the text to a canonical service name.
pub fn normalize(text: &str) -> Normalized {
    let mut corrected = text.trim().to_lowercase();
    let mut confidence: f64 = 100.0;

    for (re, fix) in CORRECTION_RES.iter() {
        if re.is_match(&corrected) {
            corrected = re.replace_all(&corrected, *fix).into_owned();
            confidence = (confidence - 5.0).max(85.0);
        }
    }

    let corrected = strip_leading_fillers(&corrected);

    let mut best: Option<(&str, f64)> = None;
    for (key, canonical) in CANONICAL_SERVICES {
        let score = match_score(&corrected, key, canonical);
        let better = match best {
            Some((_, s)) => score > s,
            None => true,
        };
        if score > MATCH_THRESHOLD && better {
            best = Some((canonical, score));
        }
    }

    let standardized = match best {
        Some((canonical, score)) => {
            confidence = (confidence + score * 10.0).min(95.0);
            canonical.to_string()
        }
        None => {
            // Unrecognized services are capped at 60 so an unmatched guess
            // never outranks a canonical match.
            confidence = (confidence - 15.0).min(60.0);
            let titled = title_case(&corrected);
            if titled.is_empty() {
                "General Service".to_string()
            } else {
                titled
            }
        }
    };

    Normalized {
        corrected,
        standardized,
        confidence: confidence.round().clamp(0.0, 100.0) as u8,
    }
}

/// Strip punctuation, collapse whitespace and title-case each word.
pub fn clean_user_input(input: &str) -> String {
    let stripped = NON_WORD_RE.replace_all(input.trim(), "");
    let collapsed = WHITESPACE_RE.replace_all(stripped.trim(), " ");
    collapsed
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| capitalize(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1 - levenshtein / max_len`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let longer = a_len.max(b_len);
    if longer == 0 {
        return 1.0;
    }
    (longer - levenshtein(a, b)) as f64 / longer as f64
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Best of: whole text vs key, whole text vs the canonical name, and every
/// run of words as long as the key. Phrase runs are discounted by
/// `len / (len + 1)` so a longer exact phrase outranks its own prefix.
fn match_score(text: &str, key: &str, canonical: &str) -> f64 {
    let mut score = similarity(text, key).max(similarity(text, &canonical.to_lowercase()));

    let words: Vec<&str> = text.split_whitespace().collect();
    let key_words = key.split_whitespace().count();
    if key_words > 0 && words.len() > key_words {
        let key_len = key.chars().count() as f64;
        let discount = key_len / (key_len + 1.0);
        for window in words.windows(key_words) {
            let phrase = window.join(" ");
            score = score.max(similarity(&phrase, key) * discount);
        }
    }
    score
}

fn strip_leading_fillers(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| !FILLER_WORDS.contains(w))
        .unwrap_or(words.len());
    words[start..].join(" ")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
