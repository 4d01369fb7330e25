//! Location allocation
//!
//! Maps the ordered location list onto concrete region/availability-zone
//! pairs by deterministic round-robin: location `i` gets region `i mod R`,
//! and zones within a region advance every full cycle through the region
//! list. Values already supplied by the caller are preserved; the allocator
//! only fills gaps.

use crate::error::{Error, Result};
use crate::spec::Location;
use std::collections::BTreeMap;

/// Fill in region, availability zone, and subnet for every location
///
/// `regions` is consumed round-robin by index; an empty region string
/// selects single-region mode for that slot (no region or az is assigned).
/// A location with a caller-supplied region keeps it, and its az gap is
/// filled from that region's zone list rather than the round-robin slot;
/// if that region has no zone list, the az is left unset. `subnets` is
/// indexed positionally and may be shorter than the location list. Fails
/// with [`Error::RegionNotConfigured`] before any mutation if a round-robin
/// region is missing from `zones_by_region`.
pub fn allocate(
    locations: &mut [Location],
    regions: &[String],
    zones_by_region: &BTreeMap<String, Vec<String>>,
    subnets: &[String],
) -> Result<()> {
    if regions.is_empty() {
        return Ok(());
    }

    // Validate every assignment up front so a failure leaves the
    // locations untouched.
    let mut assignments: Vec<Option<(String, String)>> = Vec::with_capacity(locations.len());
    for (i, location) in locations.iter().enumerate() {
        let slot = &regions[i % regions.len()];
        let region = location.region.as_deref().unwrap_or(slot);
        if region.is_empty() {
            assignments.push(None);
            continue;
        }
        let az = match zones_by_region.get(region).filter(|z| !z.is_empty()) {
            Some(zones) => Some(format!(
                "{}{}",
                region,
                zones[(i / regions.len()) % zones.len()]
            )),
            // A caller-supplied region outside the zone table keeps its
            // region but gets no az.
            None if location.region.is_some() => None,
            None => return Err(Error::RegionNotConfigured(region.to_string())),
        };
        assignments.push(az.map(|az| (region.to_string(), az)));
    }

    for (i, location) in locations.iter_mut().enumerate() {
        if location.subnet.is_none() {
            location.subnet = subnets.get(i).cloned();
        }
        if let Some((region, az)) = &assignments[i] {
            if location.region.is_none() {
                location.region = Some(region.clone());
            }
            if location.az.is_none() {
                location.az = Some(az.clone());
            }
        }
    }

    Ok(())
}
