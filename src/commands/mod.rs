pub mod add;
pub mod auth;
pub mod delete;
pub mod list;
pub mod listall;
pub mod memberships;

use crate::api::models::Member;

/// `alias -> member` lines for a membership snapshot.
pub(crate) fn snapshot_lines(alias: &str, members: &[Member]) -> Vec<String> {
    if members.is_empty() {
        return vec![format!("{alias} -> (empty)")];
    }

    members
        .iter()
        .map(|member| format!("{alias} -> {}", member.email))
        .collect()
}
