//! Built-in docflow schema migrations.
//!
//! These migrations create the internal tables the runtime depends on.
//! They are versioned and only applied once (tracked in
//! docflow_migrations).

use super::runner::Migration;

/// The internal docflow schema SQL, embedded from the migrations
/// directory.
const DOCFLOW_INTERNAL_SQL: &str = include_str!("../../migrations/0000_docflow_internal.sql");

/// Get all built-in docflow migrations.
///
/// These are applied in order before any user migrations.
pub fn get_builtin_migrations() -> Vec<Migration> {
    vec![Migration::new("0000_docflow_internal", DOCFLOW_INTERNAL_SQL)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_builtin_migrations() {
        let migrations = get_builtin_migrations();
        assert!(!migrations.is_empty());
        assert_eq!(migrations[0].name, "0000_docflow_internal");
    }

    #[test]
    fn test_migration_sql_contains_tables() {
        let migrations = get_builtin_migrations();
        let sql = &migrations[0].sql;

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS docflow_users"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS docflow_documents"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS docflow_workflow_steps"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS docflow_audit_log"));
    }
}
