//! Version compatibility table
//!
//! Pure data: the set of (postgres, bdr) version pairs an architecture
//! supports, plus default-inference maps in both directions. The maps are
//! consulted only when one side of the pair is unspecified.

use std::collections::{BTreeMap, BTreeSet};

/// Valid (postgres, bdr) version pairs and default inference maps
#[derive(Debug, Clone, Default)]
pub struct CompatibilityTable {
    pairs: BTreeSet<(String, String)>,
    default_bdr: BTreeMap<String, String>,
    default_postgres: BTreeMap<String, String>,
    fallback_bdr: Option<String>,
}

impl CompatibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a supported (postgres, bdr) pair
    pub fn with_pair(mut self, postgres: &str, bdr: &str) -> Self {
        self.pairs.insert((postgres.to_string(), bdr.to_string()));
        self
    }

    /// Register the default BDR version inferred from a postgres version
    pub fn with_default_bdr(mut self, postgres: &str, bdr: &str) -> Self {
        self.default_bdr
            .insert(postgres.to_string(), bdr.to_string());
        self
    }

    /// Register the default postgres version inferred from a BDR version
    pub fn with_default_postgres(mut self, bdr: &str, postgres: &str) -> Self {
        self.default_postgres
            .insert(bdr.to_string(), postgres.to_string());
        self
    }

    /// Register the BDR version used when neither version is specified
    pub fn with_fallback_bdr(mut self, bdr: &str) -> Self {
        self.fallback_bdr = Some(bdr.to_string());
        self
    }

    pub fn is_supported(&self, postgres: &str, bdr: &str) -> bool {
        self.pairs
            .contains(&(postgres.to_string(), bdr.to_string()))
    }

    /// Default BDR version for a postgres version hint (or the fallback
    /// when no hint was given at all)
    pub fn default_bdr_for(&self, postgres: Option<&str>) -> Option<&str> {
        match postgres {
            Some(pg) => self.default_bdr.get(pg).map(String::as_str),
            None => self.fallback_bdr.as_deref(),
        }
    }

    pub fn default_postgres_for(&self, bdr: &str) -> Option<&str> {
        self.default_postgres.get(bdr).map(String::as_str)
    }

    /// All supported pairs, in sorted order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(p, b)| (p.as_str(), b.as_str()))
    }

    /// Distinct BDR major versions across all supported pairs
    pub fn bdr_major_versions(&self) -> Vec<String> {
        let versions: BTreeSet<&str> = self.pairs.iter().map(|(_, b)| b.as_str()).collect();
        versions.into_iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let table = CompatibilityTable::new()
            .with_pair("13", "3")
            .with_pair("14", "4")
            .with_default_bdr("13", "3")
            .with_default_postgres("4", "14")
            .with_fallback_bdr("3");

        assert!(table.is_supported("13", "3"));
        assert!(!table.is_supported("13", "4"));
        assert_eq!(table.default_bdr_for(Some("13")), Some("3"));
        assert_eq!(table.default_bdr_for(Some("9.4")), None);
        assert_eq!(table.default_bdr_for(None), Some("3"));
        assert_eq!(table.default_postgres_for("4"), Some("14"));
        assert_eq!(table.bdr_major_versions(), vec!["3", "4"]);
    }
}
