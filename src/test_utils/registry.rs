// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use crate::test_utils::MemoryError;
use crate::traits::{RoleName, SiteId, SiteRegistry};

/// In-memory site registry with switchable availability.
#[derive(Clone, Debug)]
pub struct MemoryRegistry<S, R> {
    sites: Vec<S>,
    defaults: HashMap<S, R>,
    network_default: Option<R>,
    online: bool,
    multi_site: bool,
}

impl<S, R> MemoryRegistry<S, R>
where
    S: SiteId,
    R: RoleName,
{
    pub fn with_sites(sites: impl IntoIterator<Item = S>) -> Self {
        Self {
            sites: sites.into_iter().collect(),
            defaults: HashMap::new(),
            network_default: None,
            online: true,
            multi_site: true,
        }
    }

    /// Default role handed out on every site unless overridden per site.
    pub fn network_default(mut self, role: R) -> Self {
        self.network_default = Some(role);
        self
    }

    pub fn set_default_role(&mut self, site: S, role: R) {
        self.defaults.insert(site, role);
    }

    pub fn add_site(&mut self, site: S) {
        self.sites.push(site);
    }

    pub fn go_offline(&mut self) {
        self.online = false;
    }

    pub fn go_online(&mut self) {
        self.online = true;
    }

    pub fn set_multi_site(&mut self, multi_site: bool) {
        self.multi_site = multi_site;
    }
}

impl<S, R> SiteRegistry<S, R> for MemoryRegistry<S, R>
where
    S: SiteId,
    R: RoleName,
{
    type Error = MemoryError;

    fn all_sites(&self) -> Result<Vec<S>, Self::Error> {
        if !self.online {
            return Err(MemoryError::RegistryOffline);
        }
        Ok(self.sites.clone())
    }

    fn default_role(&self, site: &S) -> Result<R, Self::Error> {
        if !self.online {
            return Err(MemoryError::RegistryOffline);
        }
        self.defaults
            .get(site)
            .or(self.network_default.as_ref())
            .cloned()
            .ok_or(MemoryError::NoDefaultRole)
    }

    fn is_multi_site(&self) -> bool {
        self.multi_site
    }
}
