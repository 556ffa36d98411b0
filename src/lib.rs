// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keep user membership and role assignments consistent across a collection
//! of independently addressable sites.
//!
//! All sites share one user directory; only role assignments are scoped per
//! site. Whenever a site is created, a user is registered or a role is set,
//! added or removed anywhere in the installation, the [`SyncEngine`] replays
//! the equivalent mutation on every other site. Since every replayed write
//! re-enters the event path exactly like a direct edit would, the engine
//! holds a per-event-kind re-entrancy guard while fanning out, which is what
//! keeps propagation from recursing without bound.
//!
//! The surrounding system is injected through trait seams: a [`SiteRegistry`]
//! enumerating site identifiers, a [`UserStore`] holding per-site role sets,
//! a [`RoleCatalog`] of assignable roles and an [`EditAuthorizer`] gating the
//! bulk role-diff adapter. In-memory implementations of all of them live
//! behind the `test_utils` feature.
//!
//! [`SiteRegistry`]: crate::traits::SiteRegistry
//! [`UserStore`]: crate::traits::UserStore
//! [`RoleCatalog`]: crate::traits::RoleCatalog
//! [`EditAuthorizer`]: crate::traits::EditAuthorizer

pub mod diff;
pub mod engine;
pub mod event;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use diff::{BulkRoleSubmission, RoleDiffAdapter};
pub use engine::{Propagation, PropagationReport, SyncEngine, SyncError};
pub use event::{EventKind, SyncEvent};
