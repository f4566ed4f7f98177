//! Source sets
//!
//! A `SourceSet` is a set of concrete source ids plus an optional wildcard
//! flag. The wildcard (see [`SourceSet::ALL`]) never matches through
//! [`SourceSet::contains`]; it is only honoured by the registry's fallback
//! resolution pass.

use crate::types::{RegistryError, SourceId};
use std::fmt;
use std::str::FromStr;

/// A set of source ids, or the ALL wildcard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceSet {
    /// One bit per possible source id
    bits: [u64; 4],
    wildcard: bool,
}

impl SourceSet {
    /// Wildcard set: applies to every active source not claimed by a
    /// concrete binding
    pub const ALL: SourceSet = SourceSet {
        bits: [0; 4],
        wildcard: true,
    };

    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing a single source
    pub fn single(source: SourceId) -> Self {
        let mut set = Self::new();
        set.insert(source);
        set
    }

    /// Add a concrete source to the set
    pub fn insert(&mut self, source: SourceId) {
        let (word, bit) = Self::slot(source);
        self.bits[word] |= 1u64 << bit;
    }

    /// Remove a concrete source from the set
    pub fn remove(&mut self, source: SourceId) {
        let (word, bit) = Self::slot(source);
        self.bits[word] &= !(1u64 << bit);
    }

    /// True if `source` is a concrete member of this set
    pub fn contains(&self, source: SourceId) -> bool {
        let (word, bit) = Self::slot(source);
        self.bits[word] & (1u64 << bit) != 0
    }

    /// True if this set carries the wildcard
    pub fn is_all(&self) -> bool {
        self.wildcard
    }

    /// True if there are no concrete members and no wildcard
    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.bits.iter().all(|w| *w == 0)
    }

    /// Number of concrete members
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Union of both sets (concrete members and wildcard flag)
    pub fn union(&self, other: &SourceSet) -> SourceSet {
        let mut bits = self.bits;
        for (word, other_word) in bits.iter_mut().zip(other.bits.iter()) {
            *word |= other_word;
        }
        SourceSet {
            bits,
            wildcard: self.wildcard || other.wildcard,
        }
    }

    /// Iterate concrete members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = SourceId> + '_ {
        (0..=SourceId::MAX).filter(move |s| self.contains(*s))
    }

    fn slot(source: SourceId) -> (usize, u32) {
        ((source / 64) as usize, (source % 64) as u32)
    }
}

impl FromIterator<SourceId> for SourceSet {
    fn from_iter<I: IntoIterator<Item = SourceId>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for source in iter {
            set.insert(source);
        }
        set
    }
}

impl From<&[SourceId]> for SourceSet {
    fn from(sources: &[SourceId]) -> Self {
        sources.iter().copied().collect()
    }
}

impl<const N: usize> From<[SourceId; N]> for SourceSet {
    fn from(sources: [SourceId; N]) -> Self {
        sources.into_iter().collect()
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == SourceSet::ALL {
            return write!(f, "ALL");
        }

        let mut parts: Vec<String> = self.iter().map(|s| s.to_string()).collect();
        if self.wildcard {
            parts.push("*".to_string());
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl FromStr for SourceSet {
    type Err = RegistryError;

    /// Parse `all` / `*` or a comma separated list of source ids (`0,1,3`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed == "*" {
            return Ok(SourceSet::ALL);
        }
        if trimmed.is_empty() {
            return Err(RegistryError::InvalidSourceSet(
                "empty source list".to_string(),
            ));
        }

        trimmed
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<SourceId>().map_err(|e| {
                    RegistryError::InvalidSourceSet(format!("'{}': {}", part, e))
                })
            })
            .collect()
    }
}
