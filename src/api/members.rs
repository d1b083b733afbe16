pub fn list_endpoint(group_key: &str) -> String {
    format!("/admin/directory/v1/groups/{group_key}/members")
}

pub fn member_endpoint(group_key: &str, member_key: &str) -> String {
    format!("/admin/directory/v1/groups/{group_key}/members/{member_key}")
}

pub fn has_member_endpoint(group_key: &str, member_key: &str) -> String {
    format!("/admin/directory/v1/groups/{group_key}/hasMember/{member_key}")
}

pub fn list_query(page_token: Option<&str>) -> Vec<(String, String)> {
    match page_token {
        Some(token) => vec![("pageToken".to_string(), token.to_string())],
        None => Vec::new(),
    }
}
