//! Anonymous peer-support forum.
//!
//! Authors are stored for moderation and upvote bookkeeping but only ever
//! shown through a generated alias such as `QuietOwl417`.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use calmly_core::{ForumPostId, RequestContext};

use crate::db::ForumStore;
use crate::error::AppError;
use crate::models::{ForumPost, ForumReply, ForumSort, NewForumPost, NewForumReply};
use crate::random::{RandomSource, choose};

pub const MAX_TITLE_CHARS: usize = 150;
pub const MAX_BODY_CHARS: usize = 5000;
pub const POST_LIST_LIMIT: i64 = 50;

const ALIAS_ADJECTIVES: [&str; 12] = [
    "Quiet", "Gentle", "Brave", "Calm", "Kind", "Hopeful", "Steady", "Bright", "Warm", "Patient",
    "Curious", "Soft",
];

const ALIAS_NOUNS: [&str; 12] = [
    "Owl", "River", "Maple", "Sparrow", "Lotus", "Cloud", "Pebble", "Fern", "Otter", "Willow",
    "Comet", "Harbor",
];

/// Generate a display alias: adjective + noun + a number in `100..1000`.
pub fn generate_alias<R: RandomSource + ?Sized>(random: &R) -> String {
    let adjective = choose(random, &ALIAS_ADJECTIVES).copied().unwrap_or("Quiet");
    let noun = choose(random, &ALIAS_NOUNS).copied().unwrap_or("Owl");
    let number = 100 + random.pick(900);
    format!("{adjective}{noun}{number}")
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyForm {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostThread {
    pub post: ForumPost,
    pub replies: Vec<ForumReply>,
}

pub struct ForumService<'a, S, R> {
    store: &'a S,
    random: &'a R,
}

impl<'a, S, R> ForumService<'a, S, R>
where
    S: ForumStore,
    R: RandomSource,
{
    #[must_use]
    pub const fn new(store: &'a S, random: &'a R) -> Self {
        Self { store, random }
    }

    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    pub async fn list(&self, sort: ForumSort) -> Result<Vec<ForumPost>, AppError> {
        Ok(self.store.list_posts(sort, POST_LIST_LIMIT).await?)
    }

    /// # Errors
    ///
    /// `NotFound` when the post does not exist.
    pub async fn thread(&self, id: ForumPostId) -> Result<PostThread, AppError> {
        let post = self
            .store
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        let replies = self.store.list_replies(id).await?;
        Ok(PostThread { post, replies })
    }

    /// # Errors
    ///
    /// `Validation` for a blank or oversized title or body.
    #[instrument(skip_all, fields(user_id = %ctx.user_id))]
    pub async fn create_post(
        &self,
        ctx: &RequestContext,
        form: PostForm,
    ) -> Result<ForumPost, AppError> {
        let title = required_text("Title", &form.title, MAX_TITLE_CHARS)?;
        let body = required_text("Body", &form.body, MAX_BODY_CHARS)?;

        let post = self
            .store
            .create_post(&NewForumPost {
                author_id: ctx.user_id,
                author_alias: generate_alias(self.random),
                title,
                body,
            })
            .await?;

        info!(post_id = %post.id, "Forum post created");
        Ok(post)
    }

    /// # Errors
    ///
    /// `Validation` for a blank or oversized body; `NotFound` when the post
    /// does not exist.
    #[instrument(skip_all, fields(user_id = %ctx.user_id, post_id = %post_id))]
    pub async fn reply(
        &self,
        ctx: &RequestContext,
        post_id: ForumPostId,
        form: ReplyForm,
    ) -> Result<ForumReply, AppError> {
        let body = required_text("Body", &form.body, MAX_BODY_CHARS)?;

        let reply = self
            .store
            .add_reply(&NewForumReply {
                post_id,
                author_id: ctx.user_id,
                author_alias: generate_alias(self.random),
                body,
            })
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => AppError::not_found("Post not found"),
                other => other.into(),
            })?;

        Ok(reply)
    }

    /// One upvote per user; repeats are no-ops.
    ///
    /// # Errors
    ///
    /// `NotFound` when the post does not exist.
    pub async fn upvote(
        &self,
        ctx: &RequestContext,
        post_id: ForumPostId,
    ) -> Result<ForumPost, AppError> {
        self.store
            .upvote(post_id, ctx.user_id)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => AppError::not_found("Post not found"),
                other => other.into(),
            })
    }
}

fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use crate::random::FixedRandom;

    use super::*;

    #[test]
    fn test_alias_is_deterministic_with_fixed_source() {
        assert_eq!(generate_alias(&FixedRandom(0)), "QuietOwl100");
        assert_eq!(generate_alias(&FixedRandom(3)), "CalmSparrow103");
        // Clamped to the last entry of each list.
        assert_eq!(generate_alias(&FixedRandom(5000)), "SoftHarbor999");
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("Title", "  Exams  ", 10).unwrap(), "Exams");
        assert!(required_text("Title", "   ", 10).is_err());
        assert!(required_text("Title", "abcdefghijk", 10).is_err());
    }
}
