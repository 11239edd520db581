//! Anonymous peer-support forum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use calmly_core::{ForumPostId, ForumReplyId, UserId};

/// A post as listed. Author identity never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    pub id: ForumPostId,
    pub author_alias: String,
    pub title: String,
    pub body: String,
    pub upvotes: i64,
    pub reply_count: i64,
    pub last_reply_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumReply {
    pub id: ForumReplyId,
    pub post_id: ForumPostId,
    pub author_alias: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForumPost {
    pub author_id: UserId,
    pub author_alias: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForumReply {
    pub post_id: ForumPostId,
    pub author_id: UserId,
    pub author_alias: String,
    pub body: String,
}

/// Listing order for the forum index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumSort {
    #[default]
    Latest,
    Top,
}
