// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces onto the collaborators the engine orchestrates.

mod authorizer;
mod handle;
mod role_catalog;
mod site_registry;
mod user_store;

pub use authorizer::EditAuthorizer;
pub use handle::{RoleName, SiteId, UserId};
pub use role_catalog::{RoleCatalog, RoleInfo};
pub use site_registry::SiteRegistry;
pub use user_store::UserStore;
