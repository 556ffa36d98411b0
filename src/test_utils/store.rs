// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};

use crate::test_utils::MemoryError;
use crate::traits::{RoleName, SiteId, UserId, UserStore};

/// One successful write recorded by [`MemoryUserStore`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreWrite<S, U, R> {
    SetRoles { site: S, user: U },
    AddRole { site: S, user: U, role: R },
    RemoveRole { site: S, user: U, role: R },
    AddUserToSite { site: S, user: U, role: R },
}

/// In-memory user store keeping per-site role sets.
///
/// Each successful write is appended to a log so tests can count exactly
/// how many store mutations one propagation pass produced. Writes against
/// sites registered via [`MemoryUserStore::fail_writes_on`] fail without
/// touching any state.
#[derive(Clone, Debug)]
pub struct MemoryUserStore<S, U, R> {
    users: HashSet<U>,
    memberships: HashMap<U, HashMap<S, HashSet<R>>>,
    fail_sites: HashSet<S>,
    fail_reads: HashSet<S>,
    writes: Vec<StoreWrite<S, U, R>>,
}

impl<S, U, R> Default for MemoryUserStore<S, U, R> {
    fn default() -> Self {
        Self {
            users: HashSet::new(),
            memberships: HashMap::new(),
            fail_sites: HashSet::new(),
            fail_reads: HashSet::new(),
            writes: Vec::new(),
        }
    }
}

impl<S, U, R> MemoryUserStore<S, U, R>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
{
    /// Register the user and give them a membership record with the given
    /// roles on the given site.
    pub fn seed(&mut self, site: S, user: U, roles: impl IntoIterator<Item = R>) {
        self.users.insert(user.clone());
        let record = self
            .memberships
            .entry(user)
            .or_default()
            .entry(site)
            .or_default();
        record.extend(roles);
    }

    /// Register the user with an empty role set on the given site.
    pub fn seed_empty(&mut self, site: S, user: U) {
        self.users.insert(user.clone());
        self.memberships.entry(user).or_default().entry(site).or_default();
    }

    /// Register the user in the directory without any site membership.
    pub fn register_user(&mut self, user: U) {
        self.users.insert(user);
    }

    /// Make every subsequent write against the given site fail.
    pub fn fail_writes_on(&mut self, site: S) {
        self.fail_sites.insert(site);
    }

    /// Make every subsequent membership or role-set read against the given
    /// site fail.
    pub fn fail_reads_on(&mut self, site: S) {
        self.fail_reads.insert(site);
    }

    /// All successful writes in the order they happened.
    pub fn writes(&self) -> &[StoreWrite<S, U, R>] {
        &self.writes
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn check_writable(&self, site: &S) -> Result<(), MemoryError> {
        if self.fail_sites.contains(site) {
            return Err(MemoryError::InjectedFailure);
        }
        Ok(())
    }

    fn check_readable(&self, site: &S) -> Result<(), MemoryError> {
        if self.fail_reads.contains(site) {
            return Err(MemoryError::InjectedFailure);
        }
        Ok(())
    }
}

impl<S, U, R> UserStore<S, U, R> for MemoryUserStore<S, U, R>
where
    S: SiteId,
    U: UserId + Ord,
    R: RoleName,
{
    type Error = MemoryError;

    fn user_exists(&self, user: &U) -> Result<bool, Self::Error> {
        Ok(self.users.contains(user))
    }

    fn users_on_site(&self, site: &S) -> Result<Vec<U>, Self::Error> {
        self.check_readable(site)?;
        let mut users: Vec<U> = self
            .memberships
            .iter()
            .filter(|(_, records)| records.contains_key(site))
            .map(|(user, _)| user.clone())
            .collect();
        // Deterministic enumeration order for tests.
        users.sort();
        Ok(users)
    }

    fn roles_on_site(&self, user: &U, site: &S) -> Result<Option<HashSet<R>>, Self::Error> {
        self.check_readable(site)?;
        Ok(self
            .memberships
            .get(user)
            .and_then(|records| records.get(site))
            .cloned())
    }

    fn set_roles(&mut self, site: &S, user: &U, roles: HashSet<R>) -> Result<(), Self::Error> {
        self.check_writable(site)?;
        self.memberships
            .entry(user.clone())
            .or_default()
            .insert(site.clone(), roles);
        self.writes.push(StoreWrite::SetRoles {
            site: site.clone(),
            user: user.clone(),
        });
        Ok(())
    }

    fn add_role(&mut self, site: &S, user: &U, role: R) -> Result<(), Self::Error> {
        self.check_writable(site)?;
        self.memberships
            .entry(user.clone())
            .or_default()
            .entry(site.clone())
            .or_default()
            .insert(role.clone());
        self.writes.push(StoreWrite::AddRole {
            site: site.clone(),
            user: user.clone(),
            role,
        });
        Ok(())
    }

    fn remove_role(&mut self, site: &S, user: &U, role: &R) -> Result<(), Self::Error> {
        self.check_writable(site)?;
        if let Some(record) = self
            .memberships
            .get_mut(user)
            .and_then(|records| records.get_mut(site))
        {
            record.remove(role);
        }
        self.writes.push(StoreWrite::RemoveRole {
            site: site.clone(),
            user: user.clone(),
            role: role.clone(),
        });
        Ok(())
    }

    fn add_user_to_site(&mut self, site: &S, user: &U, role: R) -> Result<(), Self::Error> {
        self.check_writable(site)?;
        self.users.insert(user.clone());
        self.memberships
            .entry(user.clone())
            .or_default()
            .entry(site.clone())
            .or_default()
            .insert(role.clone());
        self.writes.push(StoreWrite::AddUserToSite {
            site: site.clone(),
            user: user.clone(),
            role,
        });
        Ok(())
    }
}
