use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use crate::data::datastore::{Datastore, PageQuery, QueryPage};
use crate::domain::cursor::Cursor;
use crate::domain::error::DomainError;
use crate::domain::key::Key;
use crate::domain::post::{NewPost, POST_KIND, Post};

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    name: String,
    body: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            key: Key::new(POST_KIND, row.id),
            name: row.name,
            body: row.body,
        }
    }
}

#[derive(Clone)]
pub struct PostgresDatastore {
    pool: PgPool,
}

impl PostgresDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // One row past the limit is fetched so the page knows whether the result
    // set continues.
    fn bounds(query: &PageQuery) -> (Option<i64>, i64) {
        let after = query.start.as_ref().map(Cursor::after);
        let fetch = i64::try_from(query.limit)
            .unwrap_or(i64::MAX)
            .saturating_add(1);
        (after, fetch)
    }
}

fn into_page<T>(mut rows: Vec<T>, limit: usize, id_of: impl Fn(&T) -> i64) -> QueryPage<T> {
    let more = rows.len() > limit;
    rows.truncate(limit);
    let cursor = rows.last().map(|row| Cursor::new(POST_KIND, id_of(row)));
    QueryPage {
        items: rows,
        cursor,
        more,
    }
}

#[async_trait]
impl Datastore for PostgresDatastore {
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (name, body)
            VALUES ($1, $2)
            RETURNING id, name, body
            "#,
        )
        .bind(&post.name)
        .bind(&post.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        let post = Post::from(row);
        info!(post_id = %post.key, "post created");
        Ok(post)
    }

    async fn put(&self, post: &Post) -> Result<Key, DomainError> {
        if post.key.kind() != POST_KIND {
            return Err(DomainError::Internal(format!(
                "cannot store kind {} as a post",
                post.key.kind()
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO posts (id, name, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, body = EXCLUDED.body
            "#,
        )
        .bind(post.key.id())
        .bind(&post.name)
        .bind(&post.body)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.key, e);
            DomainError::Internal(e.to_string())
        })?;

        info!(post_id = %post.key, "post updated");
        Ok(post.key.clone())
    }

    async fn get(&self, key: &Key) -> Result<Option<Post>, DomainError> {
        if key.kind() != POST_KIND {
            return Ok(None);
        }

        sqlx::query_as::<_, PostRow>("SELECT id, name, body FROM posts WHERE id = $1")
            .bind(key.id())
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Post::from))
            .map_err(|e| {
                error!("db error get {}: {}", key, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn query(&self, query: &PageQuery) -> Result<QueryPage<Post>, DomainError> {
        if query.limit == 0 {
            return Ok(QueryPage::empty());
        }

        let (after, fetch) = Self::bounds(query);
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, name, body
            FROM posts
            WHERE ($1::BIGINT IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        let page = into_page(rows, query.limit, |row| row.id);
        Ok(QueryPage {
            items: page.items.into_iter().map(Post::from).collect(),
            cursor: page.cursor,
            more: page.more,
        })
    }

    async fn query_keys(&self, query: &PageQuery) -> Result<QueryPage<Key>, DomainError> {
        if query.limit == 0 {
            return Ok(QueryPage::empty());
        }

        let (after, fetch) = Self::bounds(query);
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM posts
            WHERE ($1::BIGINT IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching post ids: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        let page = into_page(ids, query.limit, |id| *id);
        Ok(QueryPage {
            items: page
                .items
                .into_iter()
                .map(|id| Key::new(POST_KIND, id))
                .collect(),
            cursor: page.cursor,
            more: page.more,
        })
    }

    async fn delete(&self, key: &Key) -> Result<bool, DomainError> {
        if key.kind() != POST_KIND {
            return Ok(false);
        }

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(key.id())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        info!(post_id = %key, "post deleted");
        Ok(true)
    }
}
