//! Peer-support forum posts, replies and upvotes.

use std::future::Future;

use chrono::{DateTime, Utc};

use calmly_core::{ForumPostId, ForumReplyId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{ForumPost, ForumReply, ForumSort, NewForumPost, NewForumReply};

pub trait ForumStore: Send + Sync {
    fn create_post(
        &self,
        post: &NewForumPost,
    ) -> impl Future<Output = Result<ForumPost, RepositoryError>> + Send;

    fn list_posts(
        &self,
        sort: ForumSort,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<ForumPost>, RepositoryError>> + Send;

    fn find_post(
        &self,
        id: ForumPostId,
    ) -> impl Future<Output = Result<Option<ForumPost>, RepositoryError>> + Send;

    /// Replies to a post, oldest first.
    fn list_replies(
        &self,
        post_id: ForumPostId,
    ) -> impl Future<Output = Result<Vec<ForumReply>, RepositoryError>> + Send;

    /// # Errors
    /// `NotFound` when the post does not exist.
    fn add_reply(
        &self,
        reply: &NewForumReply,
    ) -> impl Future<Output = Result<ForumReply, RepositoryError>> + Send;

    /// Record one upvote per user; repeated calls are no-ops.
    ///
    /// # Errors
    /// `NotFound` when the post does not exist.
    fn upvote(
        &self,
        post_id: ForumPostId,
        user_id: UserId,
    ) -> impl Future<Output = Result<ForumPost, RepositoryError>> + Send;
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: ForumPostId,
    author_alias: String,
    title: String,
    body: String,
    upvotes: i64,
    reply_count: i64,
    last_reply_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for ForumPost {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_alias: row.author_alias,
            title: row.title,
            body: row.body,
            upvotes: row.upvotes,
            reply_count: row.reply_count,
            last_reply_by: row.last_reply_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReplyRow {
    id: ForumReplyId,
    post_id: ForumPostId,
    author_alias: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReplyRow> for ForumReply {
    fn from(row: ReplyRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_alias: row.author_alias,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

const POST_COLUMNS: &str =
    "id, author_alias, title, body, upvotes, reply_count, last_reply_by, created_at";
const REPLY_COLUMNS: &str = "id, post_id, author_alias, body, created_at";

impl ForumStore for PgStore {
    async fn create_post(&self, post: &NewForumPost) -> Result<ForumPost, RepositoryError> {
        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO forum_post (author_id, author_alias, title, body) \
             VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(post.author_id)
        .bind(&post.author_alias)
        .bind(&post.title)
        .bind(&post.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_posts(
        &self,
        sort: ForumSort,
        limit: i64,
    ) -> Result<Vec<ForumPost>, RepositoryError> {
        let order = match sort {
            ForumSort::Latest => "created_at DESC, id DESC",
            ForumSort::Top => "upvotes DESC, reply_count DESC, created_at DESC",
        };
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM forum_post ORDER BY {order} LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_post(&self, id: ForumPostId) -> Result<Option<ForumPost>, RepositoryError> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM forum_post WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn list_replies(&self, post_id: ForumPostId) -> Result<Vec<ForumReply>, RepositoryError> {
        let rows: Vec<ReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM forum_reply WHERE post_id = $1 ORDER BY created_at, id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_reply(&self, reply: &NewForumReply) -> Result<ForumReply, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            "UPDATE forum_post SET reply_count = reply_count + 1, last_reply_by = $2 \
             WHERE id = $1",
        )
        .bind(reply.post_id)
        .bind(&reply.author_alias)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row: ReplyRow = sqlx::query_as(&format!(
            "INSERT INTO forum_reply (post_id, author_id, author_alias, body) \
             VALUES ($1, $2, $3, $4) RETURNING {REPLY_COLUMNS}"
        ))
        .bind(reply.post_id)
        .bind(reply.author_id)
        .bind(&reply.author_alias)
        .bind(&reply.body)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn upvote(
        &self,
        post_id: ForumPostId,
        user_id: UserId,
    ) -> Result<ForumPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<ForumPostId> =
            sqlx::query_scalar("SELECT id FROM forum_post WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let inserted = sqlx::query(
            "INSERT INTO forum_upvote (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let row: PostRow = sqlx::query_as(&format!(
            "UPDATE forum_post SET upvotes = upvotes + $2 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(post_id)
        .bind(i64::try_from(inserted.rows_affected()).unwrap_or(0))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
