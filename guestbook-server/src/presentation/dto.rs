use serde::{Deserialize, Serialize};

use crate::application::post_service::Page;
use crate::domain::key::Key;
use crate::domain::post::{Post, PostPatch};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub next_token: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostMessage {
    pub id: String,
    pub name: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostIdMessage {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostsCollection {
    pub posts: Vec<PostMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostIdsCollection {
    pub posts: Vec<PostIdMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl From<UpdatePostRequest> for PostPatch {
    fn from(update: UpdatePostRequest) -> Self {
        PostPatch {
            name: update.name,
            body: update.body,
        }
    }
}

impl From<Post> for PostMessage {
    fn from(post: Post) -> Self {
        PostMessage {
            id: post.id(),
            name: post.name,
            body: post.body,
        }
    }
}

impl From<Key> for PostIdMessage {
    fn from(key: Key) -> Self {
        PostIdMessage { id: key.urlsafe() }
    }
}

impl From<Page<Post>> for PostsCollection {
    fn from(page: Page<Post>) -> Self {
        PostsCollection {
            posts: page.items.into_iter().map(Into::into).collect(),
            next_token: page.next_token,
        }
    }
}

impl From<Page<Key>> for PostIdsCollection {
    fn from(page: Page<Key>) -> Self {
        PostIdsCollection {
            posts: page.items.into_iter().map(Into::into).collect(),
            next_token: page.next_token,
        }
    }
}
