//! Key Pattern Module
//!
//! Glob matching for bulk invalidation. `*` matches any run of characters,
//! including an empty one; every other character is literal. A pattern must
//! match the whole key.

// == Key Pattern ==
/// A compiled invalidation pattern.
///
/// The pattern is split on `*` into literal segments. The first segment must
/// prefix the key, the last must suffix it, and the ones in between must
/// appear in order in the remaining middle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    segments: Vec<String>,
}

impl KeyPattern {
    // == Constructor ==
    /// Compiles a glob pattern. Every string is a valid pattern.
    pub fn new(pattern: &str) -> Self {
        Self {
            segments: pattern.split('*').map(str::to_string).collect(),
        }
    }

    /// True when the pattern contains no wildcard.
    pub fn is_exact(&self) -> bool {
        self.segments.len() == 1
    }

    // == Matches ==
    /// Checks whether `key` matches the pattern in full.
    pub fn matches(&self, key: &str) -> bool {
        let (first, rest) = match self.segments.split_first() {
            Some(split) => split,
            None => return key.is_empty(),
        };

        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return key == first,
        };

        if key.len() < first.len() + last.len()
            || !key.starts_with(first.as_str())
            || !key.ends_with(last.as_str())
        {
            return false;
        }

        // Leftmost-first search is sufficient when the only wildcard is `*`
        let mut remaining = &key[first.len()..key.len() - last.len()];
        for segment in middle.iter().filter(|segment| !segment.is_empty()) {
            match remaining.find(segment.as_str()) {
                Some(index) => remaining = &remaining[index + segment.len()..],
                None => return false,
            }
        }

        true
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}
