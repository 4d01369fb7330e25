//! # Topology
//!
//! Cluster topology derivation: turn partial, possibly-contradictory user
//! input plus two plugin policies into a fully resolved, internally
//! consistent cluster specification.
//!
//! ## Core Concepts
//!
//! - **ClusterSpec**: the root aggregate (vars, tags, locations, instances)
//! - **CompatibilityTable / versions**: resolve a valid (postgres, bdr) pair
//! - **repos**: derive the package-repository list from required channels
//! - **allocator**: round-robin locations onto region/availability-zone pairs
//! - **builder**: expand a role-indexed plan into instances
//! - **augment / pairing**: synthesized roles and symmetric CAMO partners
//! - **Architecture / Platform**: the two policy seams, implemented by the
//!   binary and selected at startup
//!
//! The pipeline is synchronous and single-threaded: one exclusively-owned
//! `ClusterSpec`, one writer at a time, stages in fixed order.

pub mod allocator;
pub mod augment;
pub mod builder;
pub mod capability;
pub mod compat;
pub mod error;
pub mod pairing;
pub mod pipeline;
pub mod repos;
pub mod spec;
pub mod versions;

pub use capability::{
    Architecture, ClusterOptions, ImageCache, ImageRecord, Platform, RoleSets,
};
pub use compat::CompatibilityTable;
pub use error::{Error, Result};
pub use repos::Channel;
pub use spec::{ClusterSpec, Instance, Location, CAMO_PARTNER_VAR};
