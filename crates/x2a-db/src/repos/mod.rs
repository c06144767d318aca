//! Repository modules implementing the store operations.
//!
//! Each module adds methods to `MigrationStore` via `impl MigrationStore` blocks.

pub mod artifact;
pub mod job;
pub mod module;
pub mod project;

use x2a_core::identity::AccessScope;

/// SQL fragment restricting `projects` rows to the caller's scope.
///
/// Returns an `AND ...` clause (empty for [`AccessScope::All`]) and its bound
/// parameters, numbered from `start_param`.
pub(crate) fn scope_filter_sql(
    scope: &AccessScope,
    column: &str,
    start_param: u32,
) -> (String, Vec<libsql::Value>) {
    match scope {
        AccessScope::All => (String::new(), vec![]),
        AccessScope::Owner(user_ref) => (
            format!("AND {column} = ?{start_param}"),
            vec![user_ref.as_str().into()],
        ),
    }
}
