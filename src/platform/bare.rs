//! Bare platform: pre-provisioned machines
//!
//! No regions, no availability zones, no image catalogue. Locations keep
//! whatever the caller supplied, and image labels pass through unresolved.

use std::collections::BTreeMap;
use topology::Platform;

pub struct Bare;

impl Platform for Bare {
    fn name(&self) -> &'static str {
        "bare"
    }

    fn zones_by_region(&self) -> BTreeMap<String, Vec<String>> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::{allocator, ClusterOptions, Location};

    #[test]
    fn test_no_region_assignment() {
        let platform = Bare;
        let regions = platform.validate_regions(&ClusterOptions::default()).unwrap();
        assert_eq!(regions, vec![String::new()]);

        let mut locations = vec![Location::new("main")];
        allocator::allocate(&mut locations, &regions, &platform.zones_by_region(), &[]).unwrap();
        assert_eq!(locations[0].region, None);
        assert_eq!(locations[0].az, None);
    }
}
