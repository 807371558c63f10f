//! # Genre Classification
//!
//! Maps free-text genre labels (as reported by the streaming service, e.g.
//! `"indie folk"`, `"jazz rap"`, `"k-pop"`) onto a small closed set of
//! semantic [`Category`] values with fractional weights.
//!
//! ## Rule Families
//!
//! Rules are grouped in families and evaluated top to bottom; the first match
//! wins. Family order matters, because many labels contain tokens of several
//! families:
//!
//! 1. hip-hop / rhythm-and-bass (`"pop rap"` must not land in pop)
//! 2. pop (`"electropop"` must not fall through to electronic)
//! 3. rock and metal
//! 4. electronic and dance
//! 5. jazz and blues
//! 6. folk and country
//! 7. classical and orchestral
//!
//! Inside each family the blended rules (two categories) come before the
//! family's plain rule. A label that matches nothing gets the fallback vector,
//! so classification is total.
//!
//! ```
//! use musemap::classify::{classify, Category};
//!
//! let v = classify("Electropop");
//! assert!(v.weight(Category::Pop) > 0.0);
//! assert!(v.weight(Category::Electronic) > 0.0);
//! assert_eq!(v.weight(Category::Classical), 0.0);
//! ```

use log::trace;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::Mutex;

/// Number of semantic categories.
pub const CATEGORY_COUNT: usize = 7;

/// Semantic music category used as a layout anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Mainstream pop
    Pop,
    /// Guitar rock, punk and metal
    Rock,
    /// Hip-hop, R&B, soul, funk and reggae
    HipHop,
    /// Electronic and dance music
    Electronic,
    /// Jazz and blues
    Jazz,
    /// Folk, country and acoustic songwriting
    Folk,
    /// Orchestral, classical and soundtrack
    Classical,
}

impl Category {
    /// All categories in anchor order.
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Pop,
        Category::Rock,
        Category::HipHop,
        Category::Electronic,
        Category::Jazz,
        Category::Folk,
        Category::Classical,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Category::Pop => "pop",
            Category::Rock => "rock",
            Category::HipHop => "hip-hop",
            Category::Electronic => "electronic",
            Category::Jazz => "jazz",
            Category::Folk => "folk",
            Category::Classical => "classical",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weight per category. Weights are relative mass, they need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryVector {
    weights: [f64; CATEGORY_COUNT],
}

impl CategoryVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the weight of one category. Negative weights are clamped to zero.
    #[must_use]
    pub fn with(mut self, category: Category, weight: f64) -> Self {
        self.weights[category.index()] = weight.max(0.0);
        self
    }

    #[must_use]
    pub fn weight(&self, category: Category) -> f64 {
        self.weights[category.index()]
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// True when every weight is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.iter().all(|&w| w <= 0.0)
    }

    /// Iterate over categories with a non-zero weight.
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL
            .iter()
            .map(move |&c| (c, self.weights[c.index()]))
            .filter(|&(_, w)| w > 0.0)
    }

    /// The category carrying the most weight (first in anchor order on ties).
    #[must_use]
    pub fn dominant(&self) -> Option<Category> {
        self.iter()
            .fold(None, |best: Option<(Category, f64)>, (c, w)| match best {
                Some((_, bw)) if bw >= w => best,
                _ => Some((c, w)),
            })
            .map(|(c, _)| c)
    }

    /// Element-wise sum.
    #[must_use]
    pub fn plus(mut self, other: &CategoryVector) -> Self {
        for (w, o) in self.weights.iter_mut().zip(other.weights.iter()) {
            *w += o;
        }
        self
    }
}

impl Serialize for CategoryVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<_> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (category, weight) in entries {
            map.serialize_entry(category.name(), &weight)?;
        }
        map.end()
    }
}

/// One substring rule: any of `patterns` matching yields `weights`.
struct Rule {
    patterns: &'static [&'static str],
    weights: &'static [(Category, f64)],
}

use Category::{Classical, Electronic, Folk, HipHop, Jazz, Pop, Rock};

/// Ordered rule table. Patterns are written in normalized form
/// (lower case, single spaces, no hyphens).
static RULES: &[Rule] = &[
    // hip-hop / rhythm-and-bass family
    Rule { patterns: &["jazz rap", "jazz hip hop", "jazzhop"], weights: &[(HipHop, 0.7), (Jazz, 0.3)] },
    Rule { patterns: &["pop rap", "melodic rap"], weights: &[(HipHop, 0.7), (Pop, 0.3)] },
    Rule { patterns: &["rap rock", "rap metal", "rapcore", "nu metal"], weights: &[(Rock, 0.6), (HipHop, 0.4)] },
    Rule { patterns: &["trip hop"], weights: &[(Electronic, 0.6), (HipHop, 0.4)] },
    Rule { patterns: &["lo fi", "lofi", "chillhop"], weights: &[(HipHop, 0.5), (Electronic, 0.5)] },
    Rule { patterns: &["grime", "uk garage"], weights: &[(HipHop, 0.6), (Electronic, 0.4)] },
    Rule { patterns: &["soul jazz", "acid jazz", "jazz funk"], weights: &[(Jazz, 0.6), (HipHop, 0.4)] },
    Rule { patterns: &["latin", "reggaeton", "dancehall", "afrobeats"], weights: &[(HipHop, 0.5), (Pop, 0.5)] },
    Rule {
        patterns: &["hip hop", "hiphop", "rap", "drill", "boom bap", "r&b", "rnb", "soul", "funk", "reggae", "motown", "gospel"],
        weights: &[(HipHop, 1.0)],
    },
    // pop family
    Rule {
        patterns: &["electropop", "electro pop", "synthpop", "synth pop", "dance pop", "hyperpop", "future pop"],
        weights: &[(Pop, 0.6), (Electronic, 0.4)],
    },
    Rule { patterns: &["pop punk", "power pop", "pop rock"], weights: &[(Rock, 0.5), (Pop, 0.5)] },
    Rule { patterns: &["indie pop", "dream pop", "bedroom pop"], weights: &[(Pop, 0.7), (Rock, 0.3)] },
    Rule { patterns: &["chamber pop", "baroque pop"], weights: &[(Pop, 0.7), (Classical, 0.3)] },
    Rule { patterns: &["country pop", "folk pop"], weights: &[(Pop, 0.5), (Folk, 0.5)] },
    Rule { patterns: &["pop", "boy band", "girl group", "idol", "schlager", "mandopop", "cantopop"], weights: &[(Pop, 1.0)] },
    // rock family
    Rule { patterns: &["indietronica", "electronic rock", "industrial", "new wave", "darkwave"], weights: &[(Rock, 0.5), (Electronic, 0.5)] },
    Rule { patterns: &["folk rock", "country rock", "southern rock", "roots rock", "folk punk"], weights: &[(Rock, 0.5), (Folk, 0.5)] },
    Rule { patterns: &["indie folk", "freak folk"], weights: &[(Folk, 0.7), (Rock, 0.3)] },
    Rule { patterns: &["blues rock", "jazz rock", "jazz fusion"], weights: &[(Rock, 0.5), (Jazz, 0.5)] },
    Rule { patterns: &["symphonic metal", "orchestral rock", "progressive rock"], weights: &[(Rock, 0.7), (Classical, 0.3)] },
    Rule {
        patterns: &["rock", "metal", "punk", "grunge", "hardcore", "emo", "shoegaze", "indie", "alternative", "garage", "stoner", "djent", "screamo"],
        weights: &[(Rock, 1.0)],
    },
    // electronic family
    Rule { patterns: &["ambient", "downtempo", "chillout", "new age"], weights: &[(Electronic, 0.7), (Classical, 0.3)] },
    Rule {
        patterns: &["electronic", "electronica", "electro", "house", "techno", "trance", "edm", "dubstep", "drum and bass", "dnb", "jungle", "breakbeat", "idm", "synthwave", "vaporwave", "dance", "disco", "eurobeat", "bass music", "glitch"],
        weights: &[(Electronic, 1.0)],
    },
    // jazz and blues family
    Rule { patterns: &["vocal jazz", "jazz standards", "torch song"], weights: &[(Jazz, 0.7), (Pop, 0.3)] },
    Rule { patterns: &["country blues", "delta blues"], weights: &[(Jazz, 0.6), (Folk, 0.4)] },
    Rule { patterns: &["jazz", "blues", "swing", "bebop", "bossa nova", "big band", "ragtime", "dixieland"], weights: &[(Jazz, 1.0)] },
    // folk and country family
    Rule { patterns: &["celtic", "chamber folk"], weights: &[(Folk, 0.7), (Classical, 0.3)] },
    Rule {
        patterns: &["folk", "country", "americana", "bluegrass", "singer songwriter", "acoustic", "honky tonk", "outlaw", "cantautor", "chanson"],
        weights: &[(Folk, 1.0)],
    },
    // classical family
    Rule { patterns: &["soundtrack", "video game music", "anime score", "film score", "musical theatre", "show tunes"], weights: &[(Classical, 0.7), (Pop, 0.3)] },
    Rule {
        patterns: &["classical", "orchestra", "orchestral", "symphon", "baroque", "opera", "choral", "choir", "chamber", "piano", "composition", "minimalism", "romantic era", "early music", "string quartet"],
        weights: &[(Classical, 1.0)],
    },
];

/// Vector returned for labels that match no rule.
///
/// Split between the two most mainstream categories so that unknown genres
/// settle near the middle of the pop/rock side of the map.
#[must_use]
pub fn fallback_vector() -> CategoryVector {
    CategoryVector::new().with(Pop, 0.5).with(Rock, 0.5)
}

/// Normalize a label: lower case, separators folded to spaces, whitespace collapsed.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['-', '_', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

lazy_static::lazy_static! {
    /// Memoized classification results keyed by normalized label
    static ref CLASSIFY_CACHE: Mutex<HashMap<String, CategoryVector>> = Mutex::new(HashMap::new());
}

/// Classify a genre label into a weighted category vector.
///
/// Deterministic and case-insensitive. Never returns an empty vector.
#[must_use]
pub fn classify(label: &str) -> CategoryVector {
    let normalized = normalize_label(label);

    if let Ok(cache) = CLASSIFY_CACHE.lock() {
        if let Some(&cached) = cache.get(&normalized) {
            return cached;
        }
    }

    let vector = classify_uncached(&normalized);

    if let Ok(mut cache) = CLASSIFY_CACHE.lock() {
        cache.insert(normalized, vector);
        if cache.len() > 10000 {
            cache.clear();
        }
    }

    vector
}

fn classify_uncached(normalized: &str) -> CategoryVector {
    let matched = RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| normalized.contains(p)));

    match matched {
        Some(rule) => rule
            .weights
            .iter()
            .fold(CategoryVector::new(), |v, &(c, w)| v.with(c, w)),
        None => {
            trace!("No classification rule for genre `{normalized}', using fallback");
            fallback_vector()
        }
    }
}

/// Sum of the vectors of several labels; the fallback for an empty list.
#[must_use]
pub fn classify_all<S: AsRef<str>>(labels: &[S]) -> CategoryVector {
    let summed = labels
        .iter()
        .map(|label| classify(label.as_ref()))
        .fold(CategoryVector::new(), |acc, v| acc.plus(&v));

    if summed.is_empty() {
        fallback_vector()
    } else {
        summed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_total() {
        let labels = [
            "", "   ", "zzzz", "polka", "vaportrap", "Jazz Rap", "k-pop", "DEATH METAL",
            "unknown genre 42", "🎵", "indie folk", "neo-classical", "chiptune",
        ];
        for label in labels {
            let v = classify(label);
            assert!(!v.is_empty(), "classification of `{label}' must not be empty");
            assert!(v.iter().all(|(_, w)| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn test_electropop_is_pop_and_electronic_only() {
        let v = classify("electropop");
        assert!(v.weight(Pop) > 0.0);
        assert!(v.weight(Electronic) > 0.0);
        assert_eq!(v.weight(Classical), 0.0);
        assert_eq!(v.weight(Rock), 0.0);
        assert_eq!(v.weight(Jazz), 0.0);
        assert_eq!(v.iter().count(), 2);
    }

    #[test]
    fn test_jazz_rap_is_mostly_hip_hop() {
        let v = classify("jazz rap");
        assert!(v.weight(HipHop) > v.weight(Jazz));
        assert!(v.weight(Jazz) > 0.0);
        assert_eq!(v.dominant(), Some(HipHop));
    }

    #[test]
    fn test_hip_hop_family_precedes_pop() {
        assert_eq!(classify("pop rap").dominant(), Some(HipHop));
        assert_eq!(classify("Hip-Hop").dominant(), Some(HipHop));
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        assert_eq!(classify("SYNTH-POP"), classify("synth pop"));
        assert_eq!(classify("Drum_and_Bass"), classify("drum and bass"));
    }

    #[test]
    fn test_unmatched_label_gets_fallback() {
        assert_eq!(classify("polka"), fallback_vector());
        assert_eq!(classify(""), fallback_vector());
    }

    #[test]
    fn test_family_examples() {
        assert_eq!(classify("death metal").dominant(), Some(Rock));
        assert_eq!(classify("deep house").dominant(), Some(Electronic));
        assert_eq!(classify("bebop").dominant(), Some(Jazz));
        assert_eq!(classify("bluegrass").dominant(), Some(Folk));
        assert_eq!(classify("baroque").dominant(), Some(Classical));
        assert_eq!(classify("k-pop").dominant(), Some(Pop));
    }

    #[test]
    fn test_dubstep_is_not_reggae() {
        assert_eq!(classify("dubstep").dominant(), Some(Electronic));
    }

    #[test]
    fn test_classify_all_sums_and_falls_back() {
        let v = classify_all(&["rock", "jazz"]);
        assert_eq!(v.weight(Rock), 1.0);
        assert_eq!(v.weight(Jazz), 1.0);

        let empty: [&str; 0] = [];
        assert_eq!(classify_all(&empty), fallback_vector());
    }

    #[test]
    fn test_cached_result_matches_uncached() {
        let first = classify("shoegaze");
        let second = classify("shoegaze");
        assert_eq!(first, second);
        assert_eq!(first, classify_uncached(&normalize_label("shoegaze")));
    }
}
