//! Small per-member decisions: forced nicknames and the API-key role.

use crate::types::Snowflake;

/// Longest nickname the chat platform accepts.
pub const MAX_NICKNAME_LEN: usize = 32;

/// The nickname to set, or `None` if the displayed name already contains
/// the account name (case-insensitively).
pub fn forced_nickname(display_name: &str, account_name: &str) -> Option<String> {
    if account_name.is_empty() {
        return None;
    }
    if display_name
        .to_lowercase()
        .contains(&account_name.to_lowercase())
    {
        return None;
    }
    Some(account_name.chars().take(MAX_NICKNAME_LEN).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleEdit {
    Grant(Snowflake),
    Revoke(Snowflake),
}

/// Keep `role` held by exactly the members with a stored credential.
pub fn key_role_edit(current: &[Snowflake], role: Snowflake, has_credential: bool) -> Option<RoleEdit> {
    match (has_credential, current.contains(&role)) {
        (true, false) => Some(RoleEdit::Grant(role)),
        (false, true) => Some(RoleEdit::Revoke(role)),
        _ => None,
    }
}
