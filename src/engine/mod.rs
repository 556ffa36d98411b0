// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-propagation engine.
//!
//! The engine subscribes to the five change events and replays the
//! equivalent mutation across every site the registry knows about. Each
//! replayed write redelivers its own event with the target site as origin,
//! exactly like a direct edit on that site would; the per-kind re-entrancy
//! guard is what stops those echoes from recursing without bound.
//!
//! Everything runs synchronously on the calling thread. There is no queue
//! and no retry: registry failures abort a pass, per-site write failures
//! are recorded in the [`PropagationReport`] and skipped. Two passes fired
//! in quick succession from different origins converge last-write-wins per
//! target site with no conflict detection.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::marker::PhantomData;
use std::mem;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::engine::guard::EventGuards;
use crate::event::SyncEvent;
use crate::traits::{RoleName, SiteId, SiteRegistry, UserId, UserStore};

mod guard;

#[derive(Debug, Error)]
pub enum SyncError<RE, SE>
where
    RE: StdError,
    SE: StdError,
{
    /// Site enumeration failed; the whole pass is aborted and writes made
    /// by a prior partial pass stay as they are.
    #[error("site registry unavailable: {0}")]
    Registry(RE),

    /// The user store failed outside the per-site fan-out loop, before any
    /// propagation happened.
    #[error("user store error on the origin site: {0}")]
    Store(SE),
}

/// What happened to one propagation pass.
///
/// Per-site write failures do not abort a pass, each site's write is
/// independent. Partial propagation is preferred over blocking all sites on
/// one failure, so failures are carried here rather than returned as errors.
#[derive(Debug)]
pub struct PropagationReport<S, E> {
    /// Role-mutation and membership writes performed during the pass.
    pub writes: usize,

    /// Sites skipped because the user had no membership record there.
    pub skipped: Vec<S>,

    /// Sites on which a read or write failed; the pass continued past them.
    pub failures: Vec<(S, E)>,
}

impl<S, E> PropagationReport<S, E> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<S, E> Default for PropagationReport<S, E> {
    fn default() -> Self {
        Self {
            writes: 0,
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Outcome of delivering one event to the engine.
#[derive(Debug)]
pub enum Propagation<S, E> {
    /// The delivery arrived while a pass of the same kind was already
    /// running: it is the engine's own write echoing back and was dropped.
    /// This is a handled no-op, not an error.
    Suppressed,

    /// A full fan-out pass ran.
    Completed(PropagationReport<S, E>),
}

impl<S, E> Propagation<S, E> {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Propagation::Suppressed)
    }

    pub fn report(self) -> Option<PropagationReport<S, E>> {
        match self {
            Propagation::Completed(report) => Some(report),
            Propagation::Suppressed => None,
        }
    }
}

/// Keeps user membership and role assignments consistent across all sites.
///
/// The registry and store are injected at construction; the engine holds no
/// ambient global state. The "current site" context lives on the engine and
/// is only ever changed through a scoped switch which restores the previous
/// value on every exit path.
#[derive(Debug)]
pub struct SyncEngine<S, U, R, SR, US>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
    SR: SiteRegistry<S, R>,
    US: UserStore<S, U, R>,
{
    registry: SR,
    store: US,

    /// Role granted to a freshly registered user who holds no roles yet.
    ///
    /// Deliberately distinct from the per-site default role the registry
    /// hands out during site creation; the two defaults come from different
    /// places and are not unified.
    fallback_role: R,

    /// The site whose scope the hosting request currently runs in.
    current_site: S,

    guards: EventGuards,

    _phantom: PhantomData<U>,
}

impl<S, U, R, SR, US> SyncEngine<S, U, R, SR, US>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
    SR: SiteRegistry<S, R>,
    US: UserStore<S, U, R>,
{
    pub fn new(registry: SR, store: US, current_site: S, fallback_role: R) -> Self {
        Self {
            registry,
            store,
            fallback_role,
            current_site,
            guards: EventGuards::default(),
            _phantom: PhantomData,
        }
    }

    /// The site context currently in effect.
    pub fn current_site(&self) -> &S {
        &self.current_site
    }

    pub fn store(&self) -> &US {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut US {
        &mut self.store
    }

    pub fn registry_mut(&mut self) -> &mut SR {
        &mut self.registry
    }

    /// Whether the installation is a multi-site network at all.
    pub fn is_multi_site(&self) -> bool {
        self.registry.is_multi_site()
    }

    /// The user's role set on the given site, or `None` when the user has
    /// no membership record there.
    pub fn roles_on_site(&self, user: &U, site: &S) -> Result<Option<HashSet<R>>, US::Error> {
        self.store.roles_on_site(user, site)
    }

    /// Deliver one change event to the engine.
    ///
    /// `origin` is the site the change happened on, the caller's ambient
    /// "current site". Re-entrant deliveries of a kind whose pass is
    /// already running return [`Propagation::Suppressed`].
    pub fn handle(
        &mut self,
        origin: &S,
        event: &SyncEvent<S, U, R>,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        let kind = event.kind();
        if self.guards.is_active(kind) {
            trace!(?kind, "dropping re-entrant event delivery");
            return Ok(Propagation::Suppressed);
        }

        self.guards.activate(kind);
        let result = self.run_pass(origin, event);
        // Release even when the pass failed, otherwise this event kind
        // would stay unpropagated for the rest of the process lifetime.
        self.guards.deactivate(kind);

        result.map(Propagation::Completed)
    }

    /// Replace the user's role set on the origin site with exactly the
    /// given role and propagate the overwrite everywhere.
    pub fn set_role(
        &mut self,
        origin: &S,
        user: &U,
        role: R,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        self.store
            .set_roles(origin, user, HashSet::from([role.clone()]))
            .map_err(SyncError::Store)?;
        let event = SyncEvent::RoleSet {
            user: user.clone(),
            role,
        };
        self.handle(origin, &event)
    }

    /// Add one role on the origin site and propagate the addition.
    pub fn add_role(
        &mut self,
        origin: &S,
        user: &U,
        role: R,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        self.store
            .add_role(origin, user, role.clone())
            .map_err(SyncError::Store)?;
        let event = SyncEvent::RoleAdded {
            user: user.clone(),
            role,
        };
        self.handle(origin, &event)
    }

    /// Remove one role on the origin site and propagate the removal.
    pub fn remove_role(
        &mut self,
        origin: &S,
        user: &U,
        role: R,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        self.store
            .remove_role(origin, user, &role)
            .map_err(SyncError::Store)?;
        let event = SyncEvent::RoleRemoved {
            user: user.clone(),
            role,
        };
        self.handle(origin, &event)
    }

    /// Notify the engine about a site that was created and already
    /// committed to the registry.
    pub fn site_created(
        &mut self,
        site: S,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        let event = SyncEvent::SiteCreated { site: site.clone() };
        self.handle(&site, &event)
    }

    /// Notify the engine about a user registered in the shared directory.
    pub fn user_created(
        &mut self,
        origin: &S,
        user: U,
    ) -> Result<Propagation<S, US::Error>, SyncError<SR::Error, US::Error>> {
        let event = SyncEvent::UserCreated { user };
        self.handle(origin, &event)
    }

    fn run_pass(
        &mut self,
        origin: &S,
        event: &SyncEvent<S, U, R>,
    ) -> Result<PropagationReport<S, US::Error>, SyncError<SR::Error, US::Error>> {
        match event {
            SyncEvent::SiteCreated { site } => self.on_site_created(site),
            SyncEvent::UserCreated { user } => self.on_user_created(origin, user),
            SyncEvent::RoleSet { user, role } => {
                self.fan_out_role_change(event, user, |store, site| {
                    store.set_roles(site, user, HashSet::from([role.clone()]))
                })
            }
            SyncEvent::RoleAdded { user, role } => {
                self.fan_out_role_change(event, user, |store, site| {
                    store.add_role(site, user, role.clone())
                })
            }
            SyncEvent::RoleRemoved { user, role } => {
                self.fan_out_role_change(event, user, |store, site| {
                    // Removing a role the user does not hold on this site
                    // is a local no-op, not an error.
                    store.remove_role(site, user, role)
                })
            }
        }
    }

    /// Seed a just-created site with the memberships observed on every
    /// existing site.
    ///
    /// Roles are copied additively: a role ends up granted on the new site
    /// if _any_ source site grants it, there is no per-user deduplication
    /// across disagreeing sources. Users with an empty role set are added
    /// with the new site's configured default role.
    fn on_site_created(
        &mut self,
        new_site: &S,
    ) -> Result<PropagationReport<S, US::Error>, SyncError<SR::Error, US::Error>> {
        let sites = self.registry.all_sites().map_err(SyncError::Registry)?;
        let default_role = self
            .registry
            .default_role(new_site)
            .map_err(SyncError::Registry)?;

        let mut report = PropagationReport::default();
        for source in sites {
            // Enumerating the new site among the sources is harmlessly
            // redundant: anything read back from it was copied there
            // earlier in this pass, and re-adding it is idempotent.
            let users = match self.store.users_on_site(&source) {
                Ok(users) => users,
                Err(error) => {
                    warn!(?source, %error, "cannot read memberships, skipping site");
                    report.failures.push((source, error));
                    continue;
                }
            };

            for user in users {
                let roles = match self.store.roles_on_site(&user, &source) {
                    Ok(roles) => roles.unwrap_or_default(),
                    Err(error) => {
                        warn!(?source, %error, "cannot read role set, skipping user");
                        report.failures.push((source.clone(), error));
                        continue;
                    }
                };

                if roles.is_empty() {
                    self.copy_membership(new_site, &user, default_role.clone(), &mut report);
                } else {
                    for role in roles {
                        self.copy_membership(new_site, &user, role, &mut report);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Add a freshly registered user to every site with their current
    /// roles, or with the fixed fallback role when they hold none yet.
    fn on_user_created(
        &mut self,
        origin: &S,
        user: &U,
    ) -> Result<PropagationReport<S, US::Error>, SyncError<SR::Error, US::Error>> {
        if !self.registry.is_multi_site() {
            debug!("not a multi-site installation, nothing to propagate");
            return Ok(PropagationReport::default());
        }

        if !self.store.user_exists(user).map_err(SyncError::Store)? {
            warn!(?user, "user is unknown to the directory, nothing to propagate");
            return Ok(PropagationReport::default());
        }

        let roles = self
            .store
            .roles_on_site(user, origin)
            .map_err(SyncError::Store)?
            .unwrap_or_default();
        let sites = self.registry.all_sites().map_err(SyncError::Registry)?;
        let fallback = self.fallback_role.clone();

        let mut report = PropagationReport::default();
        for site in sites {
            if roles.is_empty() {
                self.copy_membership(&site, user, fallback.clone(), &mut report);
            } else {
                for role in &roles {
                    self.copy_membership(&site, user, role.clone(), &mut report);
                }
            }
        }

        Ok(report)
    }

    /// Replay one role mutation on every site the registry yields.
    ///
    /// Each target site is processed inside a scoped context switch; a
    /// missing membership record skips the site and a write failure is
    /// recorded without aborting the remainder. Every applied write
    /// redelivers the event with the target site as origin, which the
    /// raised guard drops.
    fn fan_out_role_change<F>(
        &mut self,
        event: &SyncEvent<S, U, R>,
        user: &U,
        write: F,
    ) -> Result<PropagationReport<S, US::Error>, SyncError<SR::Error, US::Error>>
    where
        F: Fn(&mut US, &S) -> Result<(), US::Error>,
    {
        if !self.registry.is_multi_site() {
            debug!("not a multi-site installation, nothing to propagate");
            return Ok(PropagationReport::default());
        }

        let sites = self.registry.all_sites().map_err(SyncError::Registry)?;

        let mut report = PropagationReport::default();
        for site in sites {
            let applied = self.with_site_context(site.clone(), |engine| {
                if engine.store.roles_on_site(user, &site)?.is_none() {
                    return Ok(false);
                }
                write(&mut engine.store, &site)?;
                Ok(true)
            });

            match applied {
                Ok(true) => {
                    report.writes += 1;
                    let delivery = self.handle(&site, event)?;
                    debug_assert!(delivery.is_suppressed());
                }
                Ok(false) => {
                    debug!(?site, ?user, "no membership record on this site, skipping");
                    report.skipped.push(site);
                }
                Err(error) => {
                    warn!(?site, %error, "write failed, continuing fan-out");
                    report.failures.push((site, error));
                }
            }
        }

        Ok(report)
    }

    fn copy_membership(
        &mut self,
        site: &S,
        user: &U,
        role: R,
        report: &mut PropagationReport<S, US::Error>,
    ) {
        match self.store.add_user_to_site(site, user, role) {
            Ok(()) => report.writes += 1,
            Err(error) => {
                warn!(?site, %error, "membership write failed, continuing");
                report.failures.push((site.clone(), error));
            }
        }
    }

    /// Run `f` with the current-site context switched to `site`, restoring
    /// the previous context on success and failure alike.
    fn with_site_context<T, E>(
        &mut self,
        site: S,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let previous = mem::replace(&mut self.current_site, site);
        let result = f(self);
        self.current_site = previous;
        result
    }
}
