// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change notifications delivered synchronously on the calling thread.
//!
//! An event exists only for the duration of one propagation pass; it is
//! never queued or persisted. Delivery is re-entrant by design: the engine's
//! own corrective writes fire the same events again, which is why dispatch
//! is bracketed by the per-kind guard in [`crate::engine`].

use serde::{Deserialize, Serialize};

use crate::traits::{RoleName, SiteId, UserId};

/// The kind of a change notification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    SiteCreated,
    UserCreated,
    RoleSet,
    RoleAdded,
    RoleRemoved,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::SiteCreated,
        EventKind::UserCreated,
        EventKind::RoleSet,
        EventKind::RoleAdded,
        EventKind::RoleRemoved,
    ];

    /// Stable position of this kind in the guard table.
    pub(crate) fn index(self) -> usize {
        match self {
            EventKind::SiteCreated => 0,
            EventKind::UserCreated => 1,
            EventKind::RoleSet => 2,
            EventKind::RoleAdded => 3,
            EventKind::RoleRemoved => 4,
        }
    }
}

/// A single change notification.
///
/// Role events do not carry the site they happened on; the origin site is
/// passed alongside the event at delivery, as the ambient "current site" of
/// the caller.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent<S, U, R>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
{
    /// A site was created and committed to the registry.
    SiteCreated { site: S },

    /// A user was registered in the shared directory.
    UserCreated { user: U },

    /// A single role now fully replaces the user's role set on the origin
    /// site.
    RoleSet { user: U, role: R },

    /// A role was added to the user's role set on the origin site.
    RoleAdded { user: U, role: R },

    /// A role was removed from the user's role set on the origin site.
    RoleRemoved { user: U, role: R },
}

impl<S, U, R> SyncEvent<S, U, R>
where
    S: SiteId,
    U: UserId,
    R: RoleName,
{
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::SiteCreated { .. } => EventKind::SiteCreated,
            SyncEvent::UserCreated { .. } => EventKind::UserCreated,
            SyncEvent::RoleSet { .. } => EventKind::RoleSet,
            SyncEvent::RoleAdded { .. } => EventKind::RoleAdded,
            SyncEvent::RoleRemoved { .. } => EventKind::RoleRemoved,
        }
    }
}
