//! Client library for the guestbook API, over HTTP/JSON or gRPC.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;
mod grpc_client;
mod http_client;

pub use error::GuestbookClientError;
pub use grpc_client::GuestbookClientGrpc;
pub use http_client::GuestbookClientHttp;

pub mod guestbook {
    tonic::include_proto!("guestbook");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub name: String,
    pub body: String,
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}\n{}", self.id, self.name, self.body)
    }
}

/// One page of a listing; pass `next_token` back to get the following page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    pub posts: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostId {
    pub id: String,
}

#[async_trait]
pub trait GuestbookClient: Send {
    async fn list_posts(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<Post>, GuestbookClientError>;
    async fn list_post_ids(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<PostId>, GuestbookClientError>;
    async fn get_post(&mut self, id: &str) -> Result<Post, GuestbookClientError>;
    async fn create_post(&mut self, name: String, body: String)
    -> Result<Post, GuestbookClientError>;
    async fn update_post(
        &mut self,
        id: &str,
        name: Option<String>,
        body: Option<String>,
    ) -> Result<Post, GuestbookClientError>;
    async fn remove_post(&mut self, id: &str) -> Result<(), GuestbookClientError>;

    /// Follows `next_token` until the listing is exhausted.
    async fn list_all_posts(&mut self, limit: Option<u32>) -> Result<Vec<Post>, GuestbookClientError> {
        let mut posts = Vec::new();
        let mut next_token = None;
        loop {
            let page = self.list_posts(next_token, limit).await?;
            posts.extend(page.posts);
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(posts),
            }
        }
    }
}

pub(crate) fn validate_new_post(name: &str, body: &str) -> Result<(), GuestbookClientError> {
    if name.is_empty() {
        return Err(GuestbookClientError::InvalidRequest(
            "name must not be empty".to_string(),
        ));
    }
    if body.is_empty() {
        return Err(GuestbookClientError::InvalidRequest(
            "body must not be empty".to_string(),
        ));
    }
    Ok(())
}
