//! Structural query keys.
//!
//! A `QueryKey` is the sole identity of a cache entry: a query name plus a
//! set of named parameters. Two keys are equal iff the name matches and
//! every parameter matches; parameter order is irrelevant. Keys are never
//! mutated after construction — a changed parameter is a different key, and
//! therefore a different cache entry.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    name: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. Builder-style so key construction reads as one
    /// expression at the call site.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.params.is_empty() {
            return Ok(());
        }
        write!(f, "{{")?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_params() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9/_-]{0,12}"), 0..5)
    }

    proptest! {
        /// Property: insertion order never affects key identity.
        #[test]
        fn prop_param_order_irrelevant(name in "[a-z]{1,10}", params in arb_params()) {
            let forward = params.iter().fold(QueryKey::new(name.clone()), |k, (p, v)| {
                k.with_param(p.clone(), v)
            });
            let reverse = params.iter().rev().fold(QueryKey::new(name), |k, (p, v)| {
                k.with_param(p.clone(), v)
            });
            prop_assert_eq!(forward, reverse);
        }

        /// Property: equal keys hash equally (HashMap addressing is sound).
        #[test]
        fn prop_equal_keys_collide(name in "[a-z]{1,10}", params in arb_params()) {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};

            let a = params.iter().fold(QueryKey::new(name.clone()), |k, (p, v)| {
                k.with_param(p.clone(), v)
            });
            let b = params.iter().rev().fold(QueryKey::new(name), |k, (p, v)| {
                k.with_param(p.clone(), v)
            });

            let mut ha = DefaultHasher::new();
            let mut hb = DefaultHasher::new();
            a.hash(&mut ha);
            b.hash(&mut hb);
            prop_assert_eq!(ha.finish(), hb.finish());
        }
    }
}
