// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter translating a third-party bulk role submission into role
//! removals.
//!
//! The editing surface submits one primary role plus a set of checked
//! secondary roles. Everything the catalog knows that was _not_ submitted
//! counts as unchecked and gets removed from the edited user, on the origin
//! site first; the engine's remove path fans each removal out to every
//! other site. Additions implied by the submission are not handled here,
//! the editing surface performs its own role assignment which reaches the
//! engine through the ordinary set/add events.

use std::collections::HashSet;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::engine::{SyncEngine, SyncError};
use crate::traits::{EditAuthorizer, RoleCatalog, RoleName, SiteId, SiteRegistry, UserId, UserStore};

/// Page marker identifying requests coming from the bulk role editor.
pub const ROLE_EDITOR_PAGE: &str = "users-role-editor";

#[derive(Debug, Error)]
pub enum DiffError<CE, RE, SE>
where
    CE: StdError,
    RE: StdError,
    SE: StdError,
{
    #[error("role catalog unavailable: {0}")]
    Catalog(CE),

    #[error("cannot read the target's roles on the origin site: {0}")]
    Origin(SE),

    #[error(transparent)]
    Sync(SyncError<RE, SE>),
}

/// A bulk "save user roles" submission as received from the editing
/// surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkRoleSubmission<U, R>
where
    U: UserId,
    R: RoleName,
{
    /// The acting principal.
    pub actor: U,

    /// The user being edited, when the request names one.
    pub user: Option<U>,

    /// Page marker the editing surface stamps on its requests.
    pub page: Option<String>,

    /// Anti-forgery token; its presence is required, its value is checked
    /// upstream.
    pub token: Option<String>,

    pub primary_role: Option<R>,

    /// Secondary roles that were checked in the submission.
    pub secondary_roles: Vec<R>,
}

/// Drives role removals computed as the difference between the role
/// catalog and a bulk submission.
///
/// The adapter only acts on requests attributable to the bulk-edit surface
/// (recognised page marker, token present) by a principal allowed to edit
/// the target user. Anything else is a silent no-op: the caller was never
/// supposed to reach this path, so nothing is reported back.
#[derive(Debug)]
pub struct RoleDiffAdapter<RC, AZ> {
    catalog: RC,
    authorizer: AZ,
    page_marker: String,
}

impl<RC, AZ> RoleDiffAdapter<RC, AZ> {
    pub fn new(catalog: RC, authorizer: AZ) -> Self {
        Self {
            catalog,
            authorizer,
            page_marker: ROLE_EDITOR_PAGE.to_string(),
        }
    }

    /// Recognise a different page marker than [`ROLE_EDITOR_PAGE`].
    pub fn with_page_marker(mut self, page_marker: impl Into<String>) -> Self {
        self.page_marker = page_marker.into();
        self
    }

    /// Apply one bulk submission against the engine.
    ///
    /// Returns the roles whose removal was propagated, in no particular
    /// order. Gate failures return an empty list without touching any
    /// role set.
    pub fn apply<S, U, R, SR, US>(
        &self,
        engine: &mut SyncEngine<S, U, R, SR, US>,
        origin: &S,
        submission: &BulkRoleSubmission<U, R>,
    ) -> Result<Vec<R>, DiffError<RC::Error, SR::Error, US::Error>>
    where
        S: SiteId,
        U: UserId,
        R: RoleName,
        SR: SiteRegistry<S, R>,
        US: UserStore<S, U, R>,
        RC: RoleCatalog<R>,
        AZ: EditAuthorizer<U>,
    {
        if !engine.is_multi_site() {
            return Ok(Vec::new());
        }

        let Some(target) = submission.user.as_ref() else {
            trace!("submission names no target user, ignoring");
            return Ok(Vec::new());
        };
        if submission.page.as_deref() != Some(self.page_marker.as_str()) {
            trace!("submission does not carry the editor page marker, ignoring");
            return Ok(Vec::new());
        }
        if submission.token.is_none() {
            trace!("submission carries no anti-forgery token, ignoring");
            return Ok(Vec::new());
        }
        if !self.authorizer.can_edit_user(&submission.actor, target) {
            debug!(?target, "actor may not edit this user, ignoring");
            return Ok(Vec::new());
        }

        let catalog = self
            .catalog
            .assignable_roles()
            .map_err(DiffError::Catalog)?;

        // Submitted roles the catalog does not recognise are discarded.
        let mut submitted: HashSet<&R> = submission
            .secondary_roles
            .iter()
            .filter(|role| catalog.contains_key(*role))
            .collect();
        if let Some(primary) = &submission.primary_role {
            if catalog.contains_key(primary) {
                submitted.insert(primary);
            }
        }

        let held = engine
            .roles_on_site(target, origin)
            .map_err(DiffError::Origin)?
            .unwrap_or_default();

        // Everything in the catalog that was not submitted counts as
        // unchecked; removals are only driven for roles the target actually
        // holds on the origin site. The engine fans each one out.
        let mut propagated = Vec::new();
        for role in catalog.keys() {
            if submitted.contains(role) || !held.contains(role) {
                continue;
            }
            engine
                .remove_role(origin, target, role.clone())
                .map_err(DiffError::Sync)?;
            propagated.push(role.clone());
        }

        Ok(propagated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        MemoryAuthorizer, MemoryCatalog, MemoryError, MemoryRegistry, MemoryUserStore, TestEngine,
        init_logging,
    };

    type TestAdapter = RoleDiffAdapter<MemoryCatalog, MemoryAuthorizer>;

    const ALICE: u64 = 1;
    const CAROL: u64 = 9;

    fn engine() -> TestEngine {
        init_logging();
        let registry = MemoryRegistry::with_sites(['1', '2', '3']);
        let mut store = MemoryUserStore::default();
        for site in ['1', '2', '3'] {
            store.seed(site, ALICE, ["editor", "author", "contributor"]);
        }
        TestEngine::new(registry, store, '1', "subscriber")
    }

    fn submission(
        page: Option<&str>,
        token: Option<&str>,
        primary: Option<&'static str>,
        secondary: &[&'static str],
    ) -> BulkRoleSubmission<u64, &'static str> {
        BulkRoleSubmission {
            actor: CAROL,
            user: Some(ALICE),
            page: page.map(str::to_string),
            token: token.map(str::to_string),
            primary_role: primary,
            secondary_roles: secondary.to_vec(),
        }
    }

    fn adapter() -> TestAdapter {
        let catalog =
            MemoryCatalog::with_roles(["administrator", "editor", "author", "contributor"]);
        RoleDiffAdapter::new(catalog, MemoryAuthorizer::allow_all())
    }

    #[test]
    fn removes_unchecked_roles_everywhere() {
        let mut engine = engine();
        let submission = submission(
            Some(ROLE_EDITOR_PAGE),
            Some("nonce"),
            Some("editor"),
            &["author"],
        );

        let mut removed = adapter().apply(&mut engine, &'1', &submission).unwrap();
        removed.sort();
        // "administrator" is unchecked too but alice never held it, so only
        // "contributor" is driven through the remove path.
        assert_eq!(removed, vec!["contributor"]);

        for site in ['1', '2', '3'] {
            let mut roles: Vec<_> = engine
                .roles_on_site(&ALICE, &site)
                .unwrap()
                .unwrap()
                .into_iter()
                .collect();
            roles.sort();
            assert_eq!(roles, vec!["author", "editor"]);
        }
    }

    #[test]
    fn missing_token_is_a_silent_no_op() {
        let mut engine = engine();
        let submission = submission(Some(ROLE_EDITOR_PAGE), None, Some("editor"), &[]);

        let removed = adapter().apply(&mut engine, &'1', &submission).unwrap();
        assert!(removed.is_empty());
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn unrecognised_page_marker_is_a_silent_no_op() {
        let mut engine = engine();
        let submission = submission(Some("somewhere-else"), Some("nonce"), Some("editor"), &[]);

        let removed = adapter().apply(&mut engine, &'1', &submission).unwrap();
        assert!(removed.is_empty());
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn unauthorized_actor_is_a_silent_no_op() {
        let mut engine = engine();
        let catalog = MemoryCatalog::with_roles(["editor", "author", "contributor"]);
        let adapter = RoleDiffAdapter::new(catalog, MemoryAuthorizer::deny_all());
        let submission = submission(Some(ROLE_EDITOR_PAGE), Some("nonce"), Some("editor"), &[]);

        let removed = adapter.apply(&mut engine, &'1', &submission).unwrap();
        assert!(removed.is_empty());
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn submission_without_target_user_is_ignored() {
        let mut engine = engine();
        let mut submission = submission(Some(ROLE_EDITOR_PAGE), Some("nonce"), None, &[]);
        submission.user = None;

        let removed = adapter().apply(&mut engine, &'1', &submission).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn catalog_outage_aborts_with_an_error() {
        let mut engine = engine();
        let mut catalog = MemoryCatalog::with_roles(["editor", "author", "contributor"]);
        catalog.go_offline();
        let adapter = RoleDiffAdapter::new(catalog, MemoryAuthorizer::allow_all());
        let submission = submission(Some(ROLE_EDITOR_PAGE), Some("nonce"), Some("editor"), &[]);

        let result = adapter.apply(&mut engine, &'1', &submission);

        // Past the gate, a missing catalog is a reported error, not a
        // silent no-op, and nothing was removed anywhere.
        assert!(matches!(
            result,
            Err(DiffError::Catalog(MemoryError::CatalogOffline))
        ));
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn unreadable_origin_roles_abort_with_an_error() {
        let mut engine = engine();
        engine.store_mut().fail_reads_on('1');
        let submission = submission(Some(ROLE_EDITOR_PAGE), Some("nonce"), Some("editor"), &[]);

        let result = adapter().apply(&mut engine, &'1', &submission);

        assert!(matches!(
            result,
            Err(DiffError::Origin(MemoryError::InjectedFailure))
        ));
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn unknown_submitted_roles_are_discarded_against_the_catalog() {
        let mut engine = engine();
        // "superhero" is not in the catalog, it neither protects anything
        // from removal nor causes one.
        let submission = submission(
            Some(ROLE_EDITOR_PAGE),
            Some("nonce"),
            Some("superhero"),
            &["editor", "author", "contributor"],
        );

        let removed = adapter().apply(&mut engine, &'1', &submission).unwrap();
        assert!(removed.is_empty());
    }
}
