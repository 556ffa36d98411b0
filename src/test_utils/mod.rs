// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of all collaborator traits, for tests and for
//! applications that want to exercise the engine without a real backend.

mod catalog;
mod registry;
mod store;

use thiserror::Error;

pub use catalog::{MemoryAuthorizer, MemoryCatalog};
pub use registry::MemoryRegistry;
pub use store::{MemoryUserStore, StoreWrite};

use crate::engine::SyncEngine;
use crate::traits::{RoleName, SiteId, UserId};

impl SiteId for char {}
impl UserId for u64 {}
impl RoleName for &'static str {}

pub type TestRegistry = MemoryRegistry<char, &'static str>;
pub type TestStore = MemoryUserStore<char, u64, &'static str>;
pub type TestEngine = SyncEngine<char, u64, &'static str, TestRegistry, TestStore>;

/// Errors produced by the in-memory fakes, including injected ones.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum MemoryError {
    #[error("site registry offline")]
    RegistryOffline,

    #[error("role catalog offline")]
    CatalogOffline,

    #[error("no default role configured for this site")]
    NoDefaultRole,

    #[error("injected write failure")]
    InjectedFailure,
}

/// Initialise a compact log subscriber driven by `RUST_LOG`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
