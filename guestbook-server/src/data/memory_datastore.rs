use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::data::datastore::{Datastore, PageQuery, QueryPage};
use crate::domain::cursor::Cursor;
use crate::domain::error::DomainError;
use crate::domain::key::Key;
use crate::domain::post::{NewPost, POST_KIND, Post};

#[derive(Debug, Clone)]
struct StoredPost {
    name: String,
    body: String,
}

/// Process-local datastore used when no database is configured.
pub struct InMemoryDatastore {
    posts: RwLock<BTreeMap<i64, StoredPost>>,
    next_id: AtomicI64,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    async fn page<T>(
        &self,
        query: &PageQuery,
        map: impl Fn(i64, &StoredPost) -> T,
    ) -> QueryPage<T> {
        if query.limit == 0 {
            return QueryPage::empty();
        }

        let lower = match &query.start {
            Some(cursor) => Bound::Excluded(cursor.after()),
            None => Bound::Unbounded,
        };

        let posts = self.posts.read().await;
        let mut range = posts.range((lower, Bound::Unbounded));
        let mut items = Vec::with_capacity(query.limit.min(posts.len()));
        let mut last = None;
        for (id, post) in range.by_ref().take(query.limit) {
            items.push(map(*id, post));
            last = Some(*id);
        }
        let more = range.next().is_some();

        QueryPage {
            items,
            cursor: last.map(|id| Cursor::new(POST_KIND, id)),
            more,
        }
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.posts.write().await.insert(
            id,
            StoredPost {
                name: post.name.clone(),
                body: post.body.clone(),
            },
        );

        let key = Key::new(POST_KIND, id);
        info!(post_id = %key, "post created");
        Ok(Post {
            key,
            name: post.name,
            body: post.body,
        })
    }

    async fn put(&self, post: &Post) -> Result<Key, DomainError> {
        if post.key.kind() != POST_KIND {
            return Err(DomainError::Internal(format!(
                "cannot store kind {} as a post",
                post.key.kind()
            )));
        }
        self.posts.write().await.insert(
            post.key.id(),
            StoredPost {
                name: post.name.clone(),
                body: post.body.clone(),
            },
        );
        info!(post_id = %post.key, "post updated");
        Ok(post.key.clone())
    }

    async fn get(&self, key: &Key) -> Result<Option<Post>, DomainError> {
        if key.kind() != POST_KIND {
            return Ok(None);
        }
        let posts = self.posts.read().await;
        Ok(posts.get(&key.id()).map(|stored| Post {
            key: key.clone(),
            name: stored.name.clone(),
            body: stored.body.clone(),
        }))
    }

    async fn query(&self, query: &PageQuery) -> Result<QueryPage<Post>, DomainError> {
        Ok(self
            .page(query, |id, stored| Post {
                key: Key::new(POST_KIND, id),
                name: stored.name.clone(),
                body: stored.body.clone(),
            })
            .await)
    }

    async fn query_keys(&self, query: &PageQuery) -> Result<QueryPage<Key>, DomainError> {
        Ok(self.page(query, |id, _| Key::new(POST_KIND, id)).await)
    }

    async fn delete(&self, key: &Key) -> Result<bool, DomainError> {
        if key.kind() != POST_KIND {
            return Ok(false);
        }
        let removed = self.posts.write().await.remove(&key.id()).is_some();
        if removed {
            info!(post_id = %key, "post deleted");
        }
        Ok(removed)
    }
}
