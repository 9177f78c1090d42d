//! Response shapes of the upstream Helix API. Only the fields the timeline reads are
//! modelled; everything else in a payload is ignored.

use super::*;

/// One page of a list endpoint: `{data: [...], pagination: {cursor?}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// The continuation cursor, if more pages remain.
    pub fn cursor(&self) -> Option<&str> {
        self.pagination.cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct FollowedChannel {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    pub broadcaster_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct ChannelSuggestion {
    pub broadcaster_login: String,
    pub display_name: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub is_live: bool,
}

impl ChannelSuggestion {
    pub fn thumbnail(&self, width: u32, height: u32) -> String {
        self.thumbnail_url
            .replace("{width}x{height}", &format!("{width}x{height}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct LiveStream {
    pub user_id: String,
    pub user_login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct HelixVideo {
    pub id: String,
    pub user_login: String,
    pub title: String,
    pub created_at: Timestamp,
    /// Compact duration such as `3h2m1s`.
    pub duration: String,
    pub url: String,
}
