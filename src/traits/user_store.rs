// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::error::Error;

use crate::traits::{RoleName, SiteId, UserId};

/// Store holding user identity and, per site, the set of roles held by each
/// user.
///
/// A user has a _membership record_ on a site once they were added to it;
/// role mutations are scoped to one (site, user) pair and each write is
/// independent, no transaction spans sites.
pub trait UserStore<S, U, R>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
{
    type Error: Error;

    /// Whether the user exists in the shared directory at all.
    fn user_exists(&self, user: &U) -> Result<bool, Self::Error>;

    /// All users with a membership record on the given site.
    fn users_on_site(&self, site: &S) -> Result<Vec<U>, Self::Error>;

    /// The user's role set on the given site, or `None` when the user has no
    /// membership record there.
    fn roles_on_site(&self, user: &U, site: &S) -> Result<Option<HashSet<R>>, Self::Error>;

    /// Replace the user's role set on the given site with exactly the given
    /// roles.
    fn set_roles(&mut self, site: &S, user: &U, roles: HashSet<R>) -> Result<(), Self::Error>;

    /// Add a single role to the user's role set on the given site, leaving
    /// other roles untouched.
    fn add_role(&mut self, site: &S, user: &U, role: R) -> Result<(), Self::Error>;

    /// Remove a single role from the user's role set on the given site.
    ///
    /// Removing a role the user does not hold there is a no-op, not an
    /// error.
    fn remove_role(&mut self, site: &S, user: &U, role: &R) -> Result<(), Self::Error>;

    /// Create a membership record for the user on the given site carrying
    /// the given role, or add the role to an already existing record.
    fn add_user_to_site(&mut self, site: &S, user: &U, role: R) -> Result<(), Self::Error>;
}
