pub fn list_endpoint() -> &'static str {
    "/admin/directory/v1/groups"
}

pub fn group_endpoint(group_key: &str) -> String {
    format!("/admin/directory/v1/groups/{group_key}")
}

pub fn settings_endpoint(group_email: &str) -> String {
    format!("/groups/v1/groups/{group_email}")
}

pub fn list_query(
    domain: Option<&str>,
    member: Option<&str>,
    page_token: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(domain) = domain {
        params.push(("domain".to_string(), domain.to_string()));
    }
    if let Some(member) = member {
        params.push(("userKey".to_string(), member.to_string()));
    }
    if let Some(token) = page_token {
        params.push(("pageToken".to_string(), token.to_string()));
    }
    params
}
