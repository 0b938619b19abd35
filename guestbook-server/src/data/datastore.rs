use async_trait::async_trait;

use crate::domain::cursor::Cursor;
use crate::domain::error::DomainError;
use crate::domain::key::Key;
use crate::domain::post::{NewPost, Post};

/// One page of a query. `cursor` points past the last item and is set
/// whenever the page is non-empty; `more` tells whether anything follows it.
#[derive(Debug, Clone)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub cursor: Option<Cursor>,
    pub more: bool,
}

impl<T> QueryPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            more: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageQuery {
    pub limit: usize,
    pub start: Option<Cursor>,
}

/// Storage capability behind the post service. Entities are returned in
/// ascending key order.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Stores a post without a key and returns it with the assigned one.
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError>;
    /// Overwrites the post stored under `post.key`.
    async fn put(&self, post: &Post) -> Result<Key, DomainError>;
    async fn get(&self, key: &Key) -> Result<Option<Post>, DomainError>;
    async fn query(&self, query: &PageQuery) -> Result<QueryPage<Post>, DomainError>;
    async fn query_keys(&self, query: &PageQuery) -> Result<QueryPage<Key>, DomainError>;
    /// Returns whether anything was deleted.
    async fn delete(&self, key: &Key) -> Result<bool, DomainError>;
}
