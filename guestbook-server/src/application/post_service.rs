use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::datastore::{Datastore, PageQuery, QueryPage};
use crate::domain::cursor::Cursor;
use crate::domain::error::DomainError;
use crate::domain::key::Key;
use crate::domain::post::{NewPost, POST_KIND, Post, PostPatch};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    fn from_query(page: QueryPage<T>) -> Self {
        let next_token = match (page.more, page.cursor) {
            (true, Some(cursor)) => Some(cursor.encode()),
            _ => None,
        };
        Self {
            items: page.items,
            next_token,
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Datastore>,
}

impl PostService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        next_token: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Page<Post>, DomainError> {
        let query = page_query(next_token, limit)?;
        let page = self.store.query(&query).await?;
        Ok(Page::from_query(page))
    }

    #[instrument(skip(self))]
    pub async fn list_post_ids(
        &self,
        next_token: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Page<Key>, DomainError> {
        let query = page_query(next_token, limit)?;
        let page = self.store.query_keys(&query).await?;
        Ok(Page::from_query(page))
    }

    #[instrument(skip(self))]
    pub async fn get_post(&self, id: &str) -> Result<Post, DomainError> {
        let key = Key::from_urlsafe(id)
            .filter(|key| key.kind() == POST_KIND)
            .ok_or_else(|| DomainError::PostNotFound(id.to_string()))?;

        self.store
            .get(&key)
            .await?
            .ok_or_else(|| DomainError::PostNotFound(id.to_string()))
    }

    #[instrument(skip(self, body))]
    pub async fn create_post(&self, name: String, body: String) -> Result<Post, DomainError> {
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".into()));
        }
        if body.is_empty() {
            return Err(DomainError::Validation("body is required".into()));
        }

        self.store.insert(NewPost::new(name, body)).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post, DomainError> {
        let mut post = self.get_post(id).await?;
        post.apply(patch);
        self.store.put(&post).await?;
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn remove_post(&self, id: &str) -> Result<(), DomainError> {
        let post = self.get_post(id).await?;
        if !self.store.delete(&post.key).await? {
            info!(post_id = %post.key, "post vanished before delete");
        }
        Ok(())
    }
}

/// Any requested limit is accepted; values above `MAX_LIMIT` are cut down.
pub fn clamp_limit(limit: Option<u64>) -> usize {
    limit
        .unwrap_or(u64::from(DEFAULT_LIMIT))
        .min(u64::from(MAX_LIMIT)) as usize
}

fn page_query(next_token: Option<&str>, limit: Option<u64>) -> Result<PageQuery, DomainError> {
    Ok(PageQuery {
        limit: clamp_limit(limit),
        start: Cursor::decode_for(POST_KIND, next_token)?,
    })
}
