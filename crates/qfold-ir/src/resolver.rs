//! Symbol assignments and batches of assignments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from symbol names to concrete values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamResolver {
    values: BTreeMap<String, f64>,
}

impl ParamResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Set the value of a symbol, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Look up the value of a symbol.
    #[inline]
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Whether the resolver assigns `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of assigned symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no symbol is assigned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(symbol, value)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// A resolver restricted to the symbols accepted by `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Copy every assignment of `other` into this resolver.
    pub fn extend(&mut self, other: &ParamResolver) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), *v);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParamResolver {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// An ordered batch of parameter assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sweep {
    entries: Vec<ParamResolver>,
}

impl Sweep {
    /// Build a sweep from explicit resolvers.
    pub fn new(entries: Vec<ParamResolver>) -> Self {
        Self { entries }
    }

    /// A sweep with a single empty assignment.
    pub fn unit() -> Self {
        Self {
            entries: vec![ParamResolver::new()],
        }
    }

    /// One entry per value, each assigning `key`.
    pub fn points(key: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        let key = key.into();
        Self {
            entries: values
                .into_iter()
                .map(|v| ParamResolver::new().with_value(key.clone(), v))
                .collect(),
        }
    }

    /// Entry-wise union of sweeps, as long as the shortest one.
    ///
    /// Zipping no sweeps gives an empty sweep.
    #[must_use]
    pub fn zip(sweeps: impl IntoIterator<Item = Sweep>) -> Self {
        let mut iter = sweeps.into_iter();
        let Some(mut acc) = iter.next() else {
            return Self::default();
        };
        for sweep in iter {
            acc.entries.truncate(sweep.len());
            for (into, from) in acc.entries.iter_mut().zip(&sweep.entries) {
                into.extend(from);
            }
        }
        acc
    }

    /// Cartesian product; `self` varies slowest.
    #[must_use]
    pub fn product(&self, other: &Sweep) -> Self {
        let mut entries = Vec::with_capacity(self.len() * other.len());
        for outer in &self.entries {
            for inner in &other.entries {
                let mut r = outer.clone();
                r.extend(inner);
                entries.push(r);
            }
        }
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sweep has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParamResolver> {
        self.entries.iter()
    }

    /// The entries as a slice.
    pub fn entries(&self) -> &[ParamResolver] {
        &self.entries
    }

    /// Entry `index`, if present.
    pub fn get(&self, index: usize) -> Option<&ParamResolver> {
        self.entries.get(index)
    }

    /// Append an entry.
    pub fn push(&mut self, resolver: ParamResolver) {
        self.entries.push(resolver);
    }
}

impl From<Vec<ParamResolver>> for Sweep {
    fn from(entries: Vec<ParamResolver>) -> Self {
        Self { entries }
    }
}

impl FromIterator<ParamResolver> for Sweep {
    fn from_iter<T: IntoIterator<Item = ParamResolver>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Sweep {
    type Item = ParamResolver;
    type IntoIter = std::vec::IntoIter<ParamResolver>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sweep {
    type Item = &'a ParamResolver;
    type IntoIter = std::slice::Iter<'a, ParamResolver>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
