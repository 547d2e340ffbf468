//! Canonical signatures for sets of selected option values.
//!
//! Two cart lines for the same product are the same line when their selected
//! option-value *sets* are equal, regardless of order or duplicates. Instead
//! of comparing sets pairwise, every line stores a signature: the sorted,
//! de-duplicated ids joined with commas (`"3,7,12"`, or `""` for no options).
//! The database keeps a unique index on `(user, product, signature)`, which
//! turns the match into a single indexed lookup.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::types::OptionValueId;

/// A canonical, order-independent set of option values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OptionSignature {
    ids: Vec<OptionValueId>,
}

impl OptionSignature {
    /// Build a signature from option values in any order.
    #[must_use]
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = OptionValueId>,
    {
        let set: BTreeSet<OptionValueId> = ids.into_iter().collect();
        Self {
            ids: set.into_iter().collect(),
        }
    }

    /// The option values in ascending id order, without duplicates.
    #[must_use]
    pub fn ids(&self) -> &[OptionValueId] {
        &self.ids
    }

    /// The ids as raw integers, for binding as a database array.
    #[must_use]
    pub fn raw_ids(&self) -> Vec<i32> {
        self.ids.iter().map(OptionValueId::as_i32).collect()
    }

    /// Whether no option values are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct option values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The stored text form.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OptionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.ids {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

/// Error parsing a stored signature.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid option signature segment: {0:?}")]
pub struct SignatureParseError(pub String);

impl FromStr for OptionSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let ids = s
            .split(',')
            .map(|segment| {
                segment
                    .parse::<i32>()
                    .map(OptionValueId::new)
                    .map_err(|_| SignatureParseError(segment.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ids))
    }
}

impl FromIterator<OptionValueId> for OptionSignature {
    fn from_iter<T: IntoIterator<Item = OptionValueId>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(ids: &[i32]) -> OptionSignature {
        ids.iter().copied().map(OptionValueId::new).collect()
    }

    #[test]
    fn test_order_and_duplicates_do_not_matter() {
        assert_eq!(sig(&[12, 3, 7]), sig(&[7, 12, 3]));
        assert_eq!(sig(&[5, 5, 1]), sig(&[1, 5]));
        assert_eq!(sig(&[12, 3, 7]).key(), "3,7,12");
    }

    #[test]
    fn test_subsets_differ() {
        assert_ne!(sig(&[1, 2]), sig(&[1]));
        assert_ne!(sig(&[1]).key(), sig(&[]).key());
    }

    #[test]
    fn test_empty_signature() {
        let empty = sig(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.key(), "");
        assert_eq!("".parse::<OptionSignature>(), Ok(empty));
    }

    #[test]
    fn test_parse_stored_form() {
        let parsed: OptionSignature = "9,2,4".parse().unwrap_or_default();
        assert_eq!(parsed.raw_ids(), vec![2, 4, 9]);
        assert_eq!(parsed.len(), 3);
        assert!("1,x".parse::<OptionSignature>().is_err());
    }
}
