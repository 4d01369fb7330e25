//! Version resolution
//!
//! Resolves a single valid (postgres, bdr) version pair from zero, one, or
//! two user hints against a [`CompatibilityTable`]. Pure: the same inputs
//! always yield the same output, which is what makes re-resolution of an
//! already-resolved cluster a no-op.

use crate::compat::CompatibilityTable;
use crate::error::{Error, Result};

/// Resolve a (postgres, bdr) version pair from optional hints
///
/// With both hints the pair is checked against the table; with one hint the
/// other side is inferred from the table's default maps; with neither the
/// table's fallback applies. Any gap or mismatch is an
/// [`Error::UnsupportedCombination`].
pub fn resolve(
    postgres_hint: Option<&str>,
    bdr_hint: Option<&str>,
    table: &CompatibilityTable,
) -> Result<(String, String)> {
    let bdr = match bdr_hint {
        Some(v) => Some(v.to_string()),
        None => table.default_bdr_for(postgres_hint).map(String::from),
    };
    let postgres = match postgres_hint {
        Some(v) => Some(v.to_string()),
        None => bdr
            .as_deref()
            .and_then(|b| table.default_postgres_for(b))
            .map(String::from),
    };

    match (postgres, bdr) {
        (Some(pg), Some(bdr)) if table.is_supported(&pg, &bdr) => Ok((pg, bdr)),
        (pg, bdr) => Err(Error::UnsupportedCombination {
            postgres: pg.unwrap_or_else(|| "(unset)".to_string()),
            bdr: bdr.unwrap_or_else(|| "(unset)".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CompatibilityTable {
        CompatibilityTable::new()
            .with_pair("9.4", "1")
            .with_pair("9.6", "2")
            .with_pair("13", "3")
            .with_pair("14", "4")
            .with_default_bdr("9.4", "1")
            .with_default_bdr("9.6", "2")
            .with_default_bdr("13", "3")
            .with_default_bdr("14", "4")
            .with_default_postgres("1", "9.4")
            .with_default_postgres("2", "9.6")
            .with_default_postgres("3", "13")
            .with_default_postgres("4", "14")
            .with_fallback_bdr("3")
    }

    #[test]
    fn test_both_hints_valid() {
        assert_eq!(
            resolve(Some("13"), Some("3"), &table()).unwrap(),
            ("13".to_string(), "3".to_string())
        );
    }

    #[test]
    fn test_both_hints_invalid_pair() {
        let err = resolve(Some("13"), Some("4"), &table()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCombination { .. }));
    }

    #[test]
    fn test_single_hint_resolves_to_table_pair() {
        // Every supported pair must be reachable from either hint alone.
        let table = table();
        for (pg, bdr) in table.pairs() {
            assert_eq!(
                resolve(Some(pg), None, &table).unwrap(),
                (pg.to_string(), bdr.to_string()),
                "postgres hint {pg}"
            );
            assert_eq!(
                resolve(None, Some(bdr), &table).unwrap(),
                (pg.to_string(), bdr.to_string()),
                "bdr hint {bdr}"
            );
        }
    }

    #[test]
    fn test_no_hints_uses_fallback() {
        assert_eq!(
            resolve(None, None, &table()).unwrap(),
            ("13".to_string(), "3".to_string())
        );
    }

    #[test]
    fn test_unknown_hint() {
        let err = resolve(Some("8.4"), None, &table()).unwrap_err();
        match err {
            Error::UnsupportedCombination { postgres, bdr } => {
                assert_eq!(postgres, "8.4");
                assert_eq!(bdr, "(unset)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let table = table();
        let a = resolve(Some("14"), None, &table).unwrap();
        let b = resolve(Some("14"), None, &table).unwrap();
        assert_eq!(a, b);
    }
}
