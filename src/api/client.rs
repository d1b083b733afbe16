use std::collections::HashMap;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AppError, AppResult};

use super::groups;
use super::members;
use super::models::{
    AddReport, DeleteReport, Group, GroupLookup, GroupWithMembers, Member, Membership,
};
use super::retry::{drain_pages, with_backoff, Page, RetryPolicy};

const DIRECTORY_API_BASE_URL: &str = "https://admin.googleapis.com";
const GROUPS_SETTINGS_BASE_URL: &str = "https://www.googleapis.com";

/// Client for the Admin SDK Directory API plus the Groups Settings API.
///
/// Reads (get, hasMember, and every page of a listing) are retried with
/// backoff when the API throttles; mutations are issued once and their
/// failures surface to the caller.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: Client,
    directory_base_url: String,
    settings_base_url: String,
    retry: RetryPolicy,
}

impl DirectoryClient {
    pub fn new() -> Self {
        Self::with_config(
            DIRECTORY_API_BASE_URL,
            GROUPS_SETTINGS_BASE_URL,
            RetryPolicy::default(),
        )
    }

    pub fn with_config(
        directory_base_url: impl Into<String>,
        settings_base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http: Client::new(),
            directory_base_url: directory_base_url.into(),
            settings_base_url: settings_base_url.into(),
            retry,
        }
    }

    // ----- groups ---------------------------------------------------------

    /// All groups visible under `domain`, optionally narrowed to the groups
    /// `member` belongs to.
    pub async fn list_groups(
        &self,
        access_token: &str,
        domain: Option<&str>,
        member: Option<&str>,
    ) -> AppResult<Vec<Group>> {
        let endpoint = groups::list_endpoint();

        drain_pages(&self.retry, |page_token| {
            let query = groups::list_query(domain, member, page_token.as_deref());
            async move {
                let resource: GroupListResource = self
                    .get_json(&self.directory_base_url, endpoint, access_token, Some(&query))
                    .await?;

                Ok(Page {
                    items: resource
                        .groups
                        .unwrap_or_default()
                        .into_iter()
                        .map(GroupResource::into_group)
                        .collect(),
                    next_page_token: resource.next_page_token,
                })
            }
        })
        .await
    }

    pub async fn get_group(&self, access_token: &str, group_key: &str) -> AppResult<Group> {
        let endpoint = groups::group_endpoint(group_key);
        let resource: GroupResource = with_backoff(&self.retry, || {
            self.get_json(&self.directory_base_url, &endpoint, access_token, None)
        })
        .await?;

        Ok(resource.into_group())
    }

    pub async fn lookup_group(
        &self,
        access_token: &str,
        group_key: &str,
    ) -> AppResult<GroupLookup> {
        match self.get_group(access_token, group_key).await {
            Ok(group) => Ok(GroupLookup::Found(group)),
            Err(err) if err.is_not_found() => Ok(GroupLookup::NotFound),
            Err(err) => Err(err),
        }
    }

    pub async fn insert_group(
        &self,
        access_token: &str,
        email: &str,
        name: &str,
        description: &str,
    ) -> AppResult<Group> {
        let request = InsertGroupRequest {
            email: email.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        };
        let resource: GroupResource = self
            .post_json(&self.directory_base_url, groups::list_endpoint(), access_token, &request)
            .await?;

        Ok(resource.into_group())
    }

    pub async fn delete_group(&self, access_token: &str, group_key: &str) -> AppResult<()> {
        let endpoint = groups::group_endpoint(group_key);
        self.delete(&self.directory_base_url, &endpoint, access_token)
            .await
    }

    /// Opens up join/post/view on a freshly created alias through the Groups
    /// Settings API.
    pub async fn apply_open_access(&self, access_token: &str, group_email: &str) -> AppResult<()> {
        let endpoint = groups::settings_endpoint(group_email);
        let request = OpenAccessRequest::default();
        let _: GroupsSettingsResource = self
            .patch_json(&self.settings_base_url, &endpoint, access_token, &request)
            .await?;

        Ok(())
    }

    // ----- members --------------------------------------------------------

    /// The full membership snapshot of a group, in server order. A response
    /// without a `members` field counts as an empty page; an unknown group
    /// propagates the not-found error.
    pub async fn list_members(&self, access_token: &str, group_key: &str) -> AppResult<Vec<Member>> {
        let endpoint_owned = members::list_endpoint(group_key);
        let endpoint = endpoint_owned.as_str();

        drain_pages(&self.retry, |page_token| {
            let query = members::list_query(page_token.as_deref());
            async move {
                let resource: MemberListResource = self
                    .get_json(&self.directory_base_url, endpoint, access_token, Some(&query))
                    .await?;

                Ok(Page {
                    items: resource
                        .members
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(MemberResource::into_member)
                        .collect(),
                    next_page_token: resource.next_page_token,
                })
            }
        })
        .await
    }

    pub async fn has_member(
        &self,
        access_token: &str,
        group_key: &str,
        address: &str,
    ) -> AppResult<bool> {
        let endpoint = members::has_member_endpoint(group_key, address);
        let result: AppResult<HasMemberResource> = with_backoff(&self.retry, || {
            self.get_json(&self.directory_base_url, &endpoint, access_token, None)
        })
        .await;

        match result {
            Ok(resource) => Ok(resource.is_member),
            // addresses the directory has never seen come back 404
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn insert_member(
        &self,
        access_token: &str,
        group_key: &str,
        address: &str,
    ) -> AppResult<Member> {
        let endpoint = members::list_endpoint(group_key);
        let request = InsertMemberRequest {
            email: address.to_string(),
            role: "MEMBER".to_string(),
        };
        let resource: MemberResource = self
            .post_json(&self.directory_base_url, &endpoint, access_token, &request)
            .await?;

        resource.into_member().ok_or_else(|| {
            AppError::Api("member insert response did not carry an email".to_string())
        })
    }

    pub async fn remove_member(
        &self,
        access_token: &str,
        group_key: &str,
        address: &str,
    ) -> AppResult<()> {
        let endpoint = members::member_endpoint(group_key, address);
        self.delete(&self.directory_base_url, &endpoint, access_token)
            .await
    }

    // ----- alias workflows ------------------------------------------------

    /// Makes sure `address` is a member of `alias`, creating the alias when
    /// it does not exist yet. A duplicate insert is reported, not failed.
    pub async fn ensure_alias_member(
        &self,
        access_token: &str,
        alias: &str,
        address: &str,
    ) -> AppResult<AddReport> {
        let mut created_alias = false;
        let group = match self.lookup_group(access_token, alias).await? {
            GroupLookup::Found(group) => group,
            GroupLookup::NotFound => {
                info!(alias, "alias does not exist, creating it");
                self.insert_group(access_token, alias, &format!("Alias {alias}"), "")
                    .await?;
                self.apply_open_access(access_token, alias).await?;
                created_alias = true;

                match self.lookup_group(access_token, alias).await? {
                    GroupLookup::Found(group) => group,
                    GroupLookup::NotFound => {
                        return Err(AppError::Api(format!(
                            "alias {alias} did not appear after creation"
                        )));
                    }
                }
            }
        };

        let already_member = match self.insert_member(access_token, &group.email, address).await {
            Ok(_) => false,
            Err(AppError::AlreadyExists { .. }) => {
                debug!(alias, address, "address is already a member");
                true
            }
            Err(err) => return Err(err),
        };

        let members = self.list_members(access_token, &group.email).await?;
        Ok(AddReport {
            alias: group.email,
            address: address.to_string(),
            created_alias,
            already_member,
            members,
        })
    }

    /// Removes `address` from `alias`, deleting the alias when the removal
    /// empties it. The not-a-member path mutates nothing.
    pub async fn remove_alias_member(
        &self,
        access_token: &str,
        alias: &str,
        address: &str,
    ) -> AppResult<DeleteReport> {
        let group = match self.lookup_group(access_token, alias).await? {
            GroupLookup::Found(group) => group,
            GroupLookup::NotFound => {
                return Ok(DeleteReport::UnknownAlias {
                    alias: alias.to_string(),
                });
            }
        };

        if !self.has_member(access_token, &group.email, address).await? {
            let members = self.list_members(access_token, &group.email).await?;
            return Ok(DeleteReport::NotAMember {
                alias: group.email,
                address: address.to_string(),
                members,
            });
        }

        self.remove_member(access_token, &group.email, address).await?;

        let members = self.list_members(access_token, &group.email).await?;
        if members.is_empty() {
            warn!(alias = %group.email, "alias emptied, deleting it");
            self.delete_group(access_token, &group.email).await?;
            return Ok(DeleteReport::Removed {
                alias: group.email,
                address: address.to_string(),
                members: Vec::new(),
                alias_deleted: true,
            });
        }

        Ok(DeleteReport::Removed {
            alias: group.email,
            address: address.to_string(),
            members,
            alias_deleted: false,
        })
    }

    // ----- reporting ------------------------------------------------------

    pub async fn list_groups_with_members(
        &self,
        access_token: &str,
        domain: &str,
    ) -> AppResult<Vec<GroupWithMembers>> {
        let groups = self.list_groups(access_token, Some(domain), None).await?;

        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let members = self.list_members(access_token, &group.email).await?;
            out.push(GroupWithMembers { group, members });
        }

        Ok(out)
    }

    /// The aliases each address belongs to. With an explicit address list
    /// the output follows that list; with no addresses every group in the
    /// domain is walked and the result is sorted by address.
    pub async fn list_memberships(
        &self,
        access_token: &str,
        domain: &str,
        addresses: &[String],
    ) -> AppResult<Vec<Membership>> {
        if addresses.is_empty() {
            let groups = self.list_groups(access_token, Some(domain), None).await?;

            let mut pairs = Vec::with_capacity(groups.len());
            for group in &groups {
                let members = self.list_members(access_token, &group.email).await?;
                pairs.push((
                    group.email.clone(),
                    members.into_iter().map(|member| member.email).collect(),
                ));
            }

            return Ok(invert_memberships(&pairs));
        }

        let mut memberships = Vec::with_capacity(addresses.len());
        for address in addresses {
            let groups = self
                .list_groups(access_token, Some(domain), Some(address))
                .await?;
            memberships.push(Membership {
                address: address.clone(),
                groups: groups.into_iter().map(|group| group.email).collect(),
            });
        }

        Ok(memberships)
    }

    // ----- http plumbing --------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        base_url: &str,
        endpoint: &str,
        access_token: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = endpoint_url(base_url, endpoint)?;
        let mut request = self.http.get(url).bearer_auth(access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        base_url: &str,
        endpoint: &str,
        access_token: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = endpoint_url(base_url, endpoint)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        parse_json_response(response).await
    }

    async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        base_url: &str,
        endpoint: &str,
        access_token: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = endpoint_url(base_url, endpoint)?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        parse_json_response(response).await
    }

    async fn delete(&self, base_url: &str, endpoint: &str, access_token: &str) -> AppResult<()> {
        let url = endpoint_url(base_url, endpoint)?;
        let response = self.http.delete(url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }
}

impl Default for DirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds address -> [group] from per-group member lists, keeping discovery
/// order within each address and sorting the addresses.
pub fn invert_memberships(pairs: &[(String, Vec<String>)]) -> Vec<Membership> {
    let mut by_address: HashMap<String, Vec<String>> = HashMap::new();
    for (group, member_addresses) in pairs {
        for address in member_addresses {
            by_address
                .entry(address.clone())
                .or_default()
                .push(group.clone());
        }
    }

    let mut memberships: Vec<Membership> = by_address
        .into_iter()
        .map(|(address, groups)| Membership { address, groups })
        .collect();
    memberships.sort_by(|a, b| a.address.cmp(&b.address));
    memberships
}

fn endpoint_url(base_url: &str, endpoint: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)?;
    url.set_path(endpoint.trim_start_matches('/'));
    Ok(url)
}

async fn parse_json_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_api_error(status, &body))
}

#[derive(Debug, Deserialize)]
struct GroupResource {
    id: Option<String>,
    email: String,
    name: Option<String>,
    description: Option<String>,
}

impl GroupResource {
    fn into_group(self) -> Group {
        Group {
            id: self.id,
            email: self.email,
            name: self.name,
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupListResource {
    groups: Option<Vec<GroupResource>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberResource {
    email: Option<String>,
    role: Option<String>,
    #[serde(rename = "type")]
    member_type: Option<String>,
}

impl MemberResource {
    fn into_member(self) -> Option<Member> {
        let email = self.email?;
        Some(Member {
            email,
            role: self.role,
            member_type: self.member_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MemberListResource {
    members: Option<Vec<MemberResource>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HasMemberResource {
    #[serde(rename = "isMember")]
    is_member: bool,
}

#[derive(Debug, Serialize)]
struct InsertGroupRequest {
    email: String,
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct InsertMemberRequest {
    email: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct OpenAccessRequest {
    #[serde(rename = "whoCanJoin")]
    who_can_join: &'static str,
    #[serde(rename = "whoCanPostMessage")]
    who_can_post_message: &'static str,
    #[serde(rename = "whoCanViewGroup")]
    who_can_view_group: &'static str,
    #[serde(rename = "whoCanViewMembership")]
    who_can_view_membership: &'static str,
}

impl Default for OpenAccessRequest {
    fn default() -> Self {
        Self {
            who_can_join: "ANYONE_CAN_JOIN",
            who_can_post_message: "ANYONE_CAN_POST",
            who_can_view_group: "ALL_IN_DOMAIN_CAN_VIEW",
            who_can_view_membership: "ALL_IN_DOMAIN_CAN_VIEW",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupsSettingsResource {}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    errors: Option<Vec<ApiErrorDetail>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}

struct ErrorDetail {
    message: Option<String>,
    reason: Option<String>,
}

fn parse_error_detail(body: &str) -> ErrorDetail {
    let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) else {
        return ErrorDetail {
            message: None,
            reason: None,
        };
    };

    ErrorDetail {
        message: envelope.error.message,
        reason: envelope
            .error
            .errors
            .and_then(|details| details.into_iter().find_map(|detail| detail.reason)),
    }
}

fn reason_is_rate_limit(reason: Option<&str>) -> bool {
    matches!(
        reason,
        Some("rateLimitExceeded" | "userRateLimitExceeded" | "quotaExceeded" | "dailyLimitExceeded")
    )
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let detail = parse_error_detail(body);
    let message = detail.message.unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });
    let reason = detail.reason;

    if status == StatusCode::TOO_MANY_REQUESTS || reason_is_rate_limit(reason.as_deref()) {
        return AppError::RateLimited(format!("{status}: {message}"));
    }

    if status == StatusCode::NOT_FOUND
        || matches!(
            reason.as_deref(),
            Some("notFound" | "groupNotFound" | "memberNotFound")
        )
    {
        return AppError::NotFound {
            reason: reason.unwrap_or_else(|| "notFound".to_string()),
            message,
        };
    }

    if status == StatusCode::CONFLICT || reason.as_deref() == Some("duplicate") {
        return AppError::AlreadyExists { message };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "directory api authorization failed ({status}): {message}. run `galias auth login`"
        ));
    }

    AppError::Api(format!(
        "directory api request failed ({status}): {message}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_429_to_rate_limited() {
        let error = map_api_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Rate limit exceeded."}}"#,
        );
        assert!(error.is_rate_limit());
    }

    #[test]
    fn maps_403_rate_reason_to_rate_limited() {
        let error = map_api_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"User rate limit exceeded.","errors":[{"reason":"userRateLimitExceeded"}]}}"#,
        );
        assert!(error.is_rate_limit());
    }

    #[test]
    fn maps_plain_403_to_auth_error() {
        let error = map_api_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"Not Authorized to access this resource/api","errors":[{"reason":"forbidden"}]}}"#,
        );
        match error {
            AppError::Auth(message) => assert!(message.contains("Not Authorized")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_404_to_not_found_with_reason() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"Resource Not Found: groupKey","errors":[{"reason":"notFound"}]}}"#,
        );
        match error {
            AppError::NotFound { reason, message } => {
                assert_eq!(reason, "notFound");
                assert!(message.contains("groupKey"));
            }
            other => panic!("expected not-found error, got {other:?}"),
        }
    }

    #[test]
    fn maps_409_to_already_exists() {
        let error = map_api_error(
            StatusCode::CONFLICT,
            r#"{"error":{"code":409,"message":"Member already exists.","errors":[{"reason":"duplicate"}]}}"#,
        );
        assert!(matches!(error, AppError::AlreadyExists { .. }));
    }

    #[test]
    fn unparseable_body_falls_back_to_raw_text() {
        let error = map_api_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        match error {
            AppError::Api(message) => assert!(message.contains("upstream exploded")),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn inverts_group_member_pairs() {
        let pairs = vec![
            (
                "g1@example.com".to_string(),
                vec!["a@example.com".to_string(), "b@example.com".to_string()],
            ),
            ("g2@example.com".to_string(), vec!["b@example.com".to_string()]),
        ];

        let memberships = invert_memberships(&pairs);
        assert_eq!(memberships.len(), 2);
        assert_eq!(memberships[0].address, "a@example.com");
        assert_eq!(memberships[0].groups, ["g1@example.com"]);
        assert_eq!(memberships[1].address, "b@example.com");
        assert_eq!(memberships[1].groups, ["g1@example.com", "g2@example.com"]);
    }

    #[test]
    fn inversion_of_empty_input_is_empty() {
        assert!(invert_memberships(&[]).is_empty());
    }
}
