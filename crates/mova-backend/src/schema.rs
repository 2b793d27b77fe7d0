//! Schema adapter configuration.
//!
//! Deployments differ on whether the profiles table keys on `id` or
//! `user_id`. The answer is resolved once at startup into an explicit
//! configuration struct and passed by reference wherever rows are mapped,
//! never cached ambiently.

use serde::{Deserialize, Serialize};

/// Which column the profiles table uses as its primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdColumn {
    #[default]
    Id,
    UserId,
}

impl IdColumn {
    /// Column name on the wire.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
        }
    }
}

/// Resolved schema facts, passed by reference to row mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaAdapter {
    /// Primary key column of the profiles table.
    pub profile_id_column: IdColumn,
}

impl SchemaAdapter {
    /// Detect the profile id column from a sample row.
    ///
    /// Prefers `id` when both keys are present (both-present rows come from
    /// stores that expose the auth uid alongside a surrogate key).
    pub fn detect_from_row(row: &serde_json::Value) -> Self {
        let profile_id_column = if row.get("id").is_some() {
            IdColumn::Id
        } else if row.get("user_id").is_some() {
            IdColumn::UserId
        } else {
            IdColumn::default()
        };
        Self { profile_id_column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_id_column() {
        let adapter = SchemaAdapter::detect_from_row(&json!({"id": "u1", "name": "A"}));
        assert_eq!(adapter.profile_id_column, IdColumn::Id);
    }

    #[test]
    fn test_detect_user_id_column() {
        let adapter = SchemaAdapter::detect_from_row(&json!({"user_id": "u1"}));
        assert_eq!(adapter.profile_id_column, IdColumn::UserId);
    }

    #[test]
    fn test_detect_prefers_id() {
        let adapter = SchemaAdapter::detect_from_row(&json!({"id": "a", "user_id": "b"}));
        assert_eq!(adapter.profile_id_column, IdColumn::Id);
    }

    #[test]
    fn test_detect_falls_back_to_default() {
        let adapter = SchemaAdapter::detect_from_row(&json!({"name": "A"}));
        assert_eq!(adapter.profile_id_column, IdColumn::Id);
    }
}
