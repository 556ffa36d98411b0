// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::traits::{RoleName, SiteId};

/// Directory of all sites known to the installation.
///
/// The engine only queries the registry; creating sites and committing them
/// to the registry happens before the site-created event is delivered.
pub trait SiteRegistry<S, R>
where
    S: SiteId,
    R: RoleName,
{
    type Error: Error;

    /// All known site ids in enumeration order.
    ///
    /// The order is assumed stable within one call but not across calls. An
    /// error here means the registry is unreachable and aborts the current
    /// propagation pass.
    fn all_sites(&self) -> Result<Vec<S>, Self::Error>;

    /// The configured default role for new memberships on the given site.
    fn default_role(&self, site: &S) -> Result<R, Self::Error>;

    /// Whether the installation is a multi-site network at all.
    ///
    /// Role and user-registration events are only propagated on networks.
    fn is_multi_site(&self) -> bool {
        true
    }
}
