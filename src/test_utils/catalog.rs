// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use crate::test_utils::MemoryError;
use crate::traits::{EditAuthorizer, RoleCatalog, RoleInfo, UserId};

/// In-memory role catalog over `&'static str` role names.
#[derive(Clone, Debug)]
pub struct MemoryCatalog {
    roles: HashMap<&'static str, RoleInfo>,
    online: bool,
}

impl MemoryCatalog {
    pub fn with_roles(roles: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|role| (role, RoleInfo::new(role)))
                .collect(),
            online: true,
        }
    }

    pub fn go_offline(&mut self) {
        self.online = false;
    }
}

impl RoleCatalog<&'static str> for MemoryCatalog {
    type Error = MemoryError;

    fn assignable_roles(&self) -> Result<HashMap<&'static str, RoleInfo>, Self::Error> {
        if !self.online {
            return Err(MemoryError::CatalogOffline);
        }
        Ok(self.roles.clone())
    }
}

/// Authorizer with a fixed answer.
#[derive(Clone, Copy, Debug)]
pub struct MemoryAuthorizer {
    allow: bool,
}

impl MemoryAuthorizer {
    pub fn allow_all() -> Self {
        Self { allow: true }
    }

    pub fn deny_all() -> Self {
        Self { allow: false }
    }
}

impl<U> EditAuthorizer<U> for MemoryAuthorizer
where
    U: UserId,
{
    fn can_edit_user(&self, _actor: &U, _target: &U) -> bool {
        self.allow
    }
}
