// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::traits::RoleName;

/// Display metadata attached to a catalog entry.
///
/// Only the key of a catalog entry matters to the engine; the label is
/// carried for editing surfaces.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub label: String,
}

impl RoleInfo {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// The full set of role names the installation recognises.
pub trait RoleCatalog<R>
where
    R: RoleName,
{
    type Error: Error;

    /// All assignable roles mapped to their display metadata.
    fn assignable_roles(&self) -> Result<HashMap<R, RoleInfo>, Self::Error>;
}
