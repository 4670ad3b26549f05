//! Symbol resolution and scope validation.
//!
//! One validation pass covers one scope:
//! 1. `rebuild_registries` indexes every declaration of the scope's files
//! 2. `validate_classes` links and checks the class hierarchy
//! 3. `validate_expressions` links the symbol tables into the scope and resolves
//!    every name, then unlinks them
//!
//! Passes return raw findings. `aggregate_multi_scope` folds the findings of all
//! scopes of one program cycle into one diagnostic per problem.

pub mod cache;
pub mod class_validator;
pub mod create_object;
pub mod dedup;
pub mod error;
pub mod registry;
pub mod scope;
pub mod scope_validator;

pub use cache::Cache;
pub use class_validator::validate_classes;
pub use dedup::{aggregate_multi_scope, Dedup, ScopeFindings, ScopedFinding, ValidationCycle};
pub use error::ResolveDiagnostic;
pub use registry::{Callable, Declaration, NamespaceContainer, ScopeRegistries};
pub use scope::{Scope, ScopeChain, ScopeKind, ScopeLabel, SOURCE_SCOPE};
pub use scope_validator::{validate_expressions, validate_expressions_cached, FileInventory, InventoryCache};

use bsc_platform::Platform;

/// Index the declarations of every file in `chain`.
pub fn rebuild_registries<'a>(chain: &ScopeChain<'a>, platform: &'a Platform) -> ScopeRegistries<'a> {
    ScopeRegistries::build(chain, platform)
}

/// Run the whole per-scope pipeline.
pub fn validate_scope<'a>(chain: &ScopeChain<'a>, platform: &'a Platform) -> ScopeFindings {
    validate_scope_cached(chain, platform, &InventoryCache::new())
}

/// `validate_scope`, sharing file inventories with other scopes of the same cycle.
pub fn validate_scope_cached<'a>(
    chain: &ScopeChain<'a>,
    platform: &'a Platform,
    cache: &InventoryCache<'a>,
) -> ScopeFindings {
    let registries = rebuild_registries(chain, platform);
    let mut findings = validate_classes(chain, &registries);
    findings.extend(validate_expressions_cached(chain, &registries, cache));
    log::debug!("scope {} produced {} findings", chain.scope.name, findings.len());
    ScopeFindings {
        scope: chain.scope.label(),
        findings,
    }
}
