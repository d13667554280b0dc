//! Metric name allowlist.
//!
//! An absent or empty allowlist permits every name. Only a non-empty set
//! restricts which metrics reach the backend.

use std::collections::HashSet;
use std::sync::Arc;

use ahash::RandomState;

type NameSet = HashSet<String, RandomState>;

/// Immutable set of permitted metric names, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    names: Option<Arc<NameSet>>,
}

impl Allowlist {
    /// Allowlist that permits every name
    pub fn allow_all() -> Self {
        Allowlist { names: None }
    }

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Into::into).collect()
    }

    /// True iff the allowlist is absent/empty or contains `name`
    #[inline]
    pub fn is_allowed(&self, name: &str) -> bool {
        match self.names {
            Some(ref names) if !names.is_empty() => names.contains(name),
            _ => true,
        }
    }

    /// Whether any filtering takes place at all
    pub fn is_filtering(&self) -> bool {
        self.len() > 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.as_ref().is_some_and(|names| names.contains(name))
    }

    pub fn len(&self) -> usize {
        self.names.as_ref().map_or(0, |names| names.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Permitted names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .names
            .iter()
            .flat_map(|names| names.iter().map(String::as_str))
            .collect();
        out.sort_unstable();
        out
    }

    /// Whether `other` shares our backing set
    pub(crate) fn shares_set_with(&self, other: &Allowlist) -> bool {
        match (&self.names, &other.names) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names: NameSet = iter.into_iter().map(Into::into).collect();
        Allowlist {
            names: Some(Arc::new(names)),
        }
    }
}

impl From<HashSet<String>> for Allowlist {
    fn from(names: HashSet<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<Vec<String>> for Allowlist {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl<T: Into<Allowlist>> From<Option<T>> for Allowlist {
    fn from(names: Option<T>) -> Self {
        names.map_or_else(Allowlist::allow_all, Into::into)
    }
}
