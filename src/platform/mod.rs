//! Platform implementations
//!
//! A platform decides where instances run: regions, availability zones, and
//! machine images. New cloud platforms are added as new implementations of
//! [`topology::Platform`] and an entry in [`by_name`].

pub mod aws;
pub mod bare;

use topology::Platform;

pub use aws::Aws;
pub use bare::Bare;

/// Look up a platform by its CLI name
pub fn by_name(name: &str) -> Option<Box<dyn Platform>> {
    match name.to_ascii_lowercase().as_str() {
        "aws" => Some(Box::new(Aws)),
        "bare" => Some(Box::new(Bare)),
        _ => None,
    }
}

/// Names accepted by [`by_name`], for error messages
pub fn names() -> &'static [&'static str] {
    &["aws", "bare"]
}
