//! Replication architecture implementations
//!
//! An architecture decides which versions, repositories, roles, and
//! synthesized instances a cluster gets. New architectures are added as new
//! implementations of [`topology::Architecture`] and an entry in
//! [`by_name`].

pub mod bdr;

use topology::Architecture;

pub use bdr::Bdr;

/// Look up an architecture by its CLI name
pub fn by_name(name: &str) -> Option<Box<dyn Architecture>> {
    match name.to_ascii_lowercase().as_str() {
        "bdr" => Some(Box::new(Bdr)),
        _ => None,
    }
}

/// Names accepted by [`by_name`], for error messages
pub fn names() -> &'static [&'static str] {
    &["bdr"]
}
