//! Router Module Index
//!
//! Routes are split by whether the access policy applies to them.

/// Routes outside the resource table (API root, health check).
pub mod public;

/// The university and student routes, guarded by the access policy.
pub mod resources;
