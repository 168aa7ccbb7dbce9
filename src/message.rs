//! Typed wire messages.
//!
//! The serde renames carry the exact element names of the SOAP protocol and
//! must not be changed.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errcode::ErrorCode;

/// A server-assigned session identifier. Zero means "no session".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    pub const NONE: SessionId = SessionId(0);

    pub fn is_none(self) -> bool {
        self == SessionId::NONE
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned data of a logon or SSO logon request.
#[derive(Clone, Debug, Deserialize)]
pub struct LogonResponse {
    pub er: ErrorCode,
    #[serde(rename = "ulSessionId", default)]
    pub session_id: SessionId,
    #[serde(rename = "sServerGuid", default)]
    pub server_guid: String,
}

/// Returned data of a logoff request.
#[derive(Clone, Debug, Deserialize)]
pub struct LogoffResponse {
    pub er: ErrorCode,
}

/// Returned data of a resolve-username request.
#[derive(Clone, Debug, Deserialize)]
pub struct ResolveUserResponse {
    pub er: ErrorCode,
    #[serde(rename = "ulUserId", default)]
    pub user_id: u64,
    #[serde(rename = "sUserId", default)]
    pub user_entry_id: String,
}

/// Returned data of a get-user request.
#[derive(Clone, Debug, Deserialize)]
pub struct GetUserResponse {
    pub er: ErrorCode,
    #[serde(rename = "lpsUser", default)]
    pub user: Option<User>,
}

/// User meta data as stored by the server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct User {
    #[serde(rename = "ulUserId", default)]
    pub user_id: u64,
    #[serde(rename = "lpszUsername", default)]
    pub username: String,
    #[serde(rename = "lpszMailAddress", default)]
    pub mail_address: String,
    #[serde(rename = "lpszFullName", default)]
    pub full_name: String,
    #[serde(rename = "ulIsAdmin", default)]
    pub is_admin: u64,
    #[serde(rename = "ulIsNonActive", default)]
    pub is_non_active: u64,
    #[serde(rename = "sUserId", default)]
    pub user_entry_id: String,
    #[serde(rename = "propMap", default)]
    pub prop_map: Option<PropMap>,
    #[serde(rename = "multiValuePropMap", default)]
    pub multi_value_prop_map: Option<MultiValuePropMap>,
}

/// Additional single-value user properties keyed by property ID.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropMap {
    #[serde(rename = "item", default)]
    pub items: Vec<PropMapEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropMapEntry {
    #[serde(rename = "ulPropId", default)]
    pub prop_id: u32,
    #[serde(rename = "lpszValue", default)]
    pub value: String,
}

/// Additional multi-value user properties keyed by property ID.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MultiValuePropMap {
    #[serde(rename = "item", default)]
    pub items: Vec<MultiValuePropMapEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MultiValuePropMapEntry {
    #[serde(rename = "ulPropId", default)]
    pub prop_id: u32,
    #[serde(rename = "sValues", default)]
    pub values: PropValueList,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropValueList {
    #[serde(rename = "item", default)]
    pub items: Vec<String>,
}

/// A tagged property value in a resolve-names request row.
#[derive(Clone, Debug)]
pub struct NamedProp {
    pub prop_tag: u32,
    pub value: String,
}

/// Returned data of a resolve-names request.
#[derive(Clone, Debug, Deserialize)]
pub struct ResolveNamesResponse {
    pub er: ErrorCode,
    #[serde(rename = "sRowSet", default)]
    pub row_set: RowSet,
    #[serde(rename = "aFlags", default)]
    pub flags: FlagList,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RowSet {
    #[serde(rename = "item", default)]
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Row {
    #[serde(rename = "item", default)]
    pub props: Vec<PropValue>,
}

/// A typed property value in a resolve-names response row. Exactly one of
/// the value fields is set, depending on the property type.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropValue {
    #[serde(rename = "ulPropTag", default)]
    pub prop_tag: u32,
    #[serde(rename = "lpszA", default)]
    pub text: Option<String>,
    #[serde(rename = "ul", default)]
    pub unsigned: Option<u64>,
    #[serde(rename = "bin", default)]
    pub binary: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlagList {
    #[serde(rename = "item", default)]
    pub items: Vec<u32>,
}
