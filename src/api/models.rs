use serde::Serialize;

/// A directory group, addressed by its email.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One membership edge inside a group. Entries the API reports without an
/// email address (deleted accounts, customer-wide members) are dropped
/// before this type is built.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
}

/// Lookup result callers pattern-match on instead of probing error strings.
#[derive(Debug)]
pub enum GroupLookup {
    Found(Group),
    NotFound,
}

/// A group together with its membership snapshot.
#[derive(Debug, Serialize)]
pub struct GroupWithMembers {
    pub group: Group,
    pub members: Vec<Member>,
}

/// The aliases one address belongs to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Membership {
    pub address: String,
    pub groups: Vec<String>,
}

/// What `add` did and the membership snapshot afterwards.
#[derive(Debug, Serialize)]
pub struct AddReport {
    pub alias: String,
    pub address: String,
    pub created_alias: bool,
    pub already_member: bool,
    pub members: Vec<Member>,
}

/// What `delete` did.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteReport {
    /// The alias does not exist; nothing was touched.
    UnknownAlias { alias: String },
    /// The address is not in the alias; nothing was touched.
    NotAMember {
        alias: String,
        address: String,
        members: Vec<Member>,
    },
    /// The address was removed. `alias_deleted` is set when the alias was
    /// emptied by the removal and deleted as well.
    Removed {
        alias: String,
        address: String,
        members: Vec<Member>,
        alias_deleted: bool,
    },
}
