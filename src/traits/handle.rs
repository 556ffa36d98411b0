// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Debug;
use std::hash::Hash as StdHash;

/// Identifier of a single site in the collection.
///
/// Site identifiers are opaque to the engine and assumed stable for the
/// lifetime of the registry.
pub trait SiteId: Clone + Debug + Eq + StdHash {}

/// Identifier of a user, unique across the whole installation.
///
/// One user directory is shared by all sites; there are no per-site user
/// identities, only per-site role assignments.
pub trait UserId: Clone + Debug + Eq + StdHash {}

/// Name of a role assignable to a user on a site.
pub trait RoleName: Clone + Debug + Eq + StdHash {}
