use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::GuestbookClientError;
use crate::{GuestbookClient, Page, Post, PostId, validate_new_post};

#[derive(Clone)]
pub struct GuestbookClientHttp {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl GuestbookClientHttp {
    pub fn connect(endpoint: &str) -> Result<Self, GuestbookClientError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| GuestbookClientError::InvalidRequest(format!("bad endpoint: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GuestbookClientError::InvalidRequest(format!(
                "bad endpoint: {endpoint}"
            )));
        }
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Appends each segment under `/api`, percent-encoding it, so ids can
    /// never turn into a different route or carry a query string.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, GuestbookClientError> {
        let resp = self.authorized(req).send().await?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(GuestbookClientError::from_http_response(resp).await)
        }
    }
}

#[async_trait]
impl GuestbookClient for GuestbookClientHttp {
    async fn list_posts(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<Post>, GuestbookClientError> {
        let req = self
            .client
            .get(self.url(&["posts"]))
            .query(&ListQuery { next_token, limit });
        self.send_json(req).await
    }

    async fn list_post_ids(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<PostId>, GuestbookClientError> {
        let req = self
            .client
            .get(self.url(&["posts_ids"]))
            .query(&ListQuery { next_token, limit });
        self.send_json(req).await
    }

    async fn get_post(&mut self, id: &str) -> Result<Post, GuestbookClientError> {
        let req = self.client.get(self.url(&["posts", id]));
        self.send_json(req).await
    }

    async fn create_post(
        &mut self,
        name: String,
        body: String,
    ) -> Result<Post, GuestbookClientError> {
        validate_new_post(&name, &body)?;

        let req = self
            .client
            .post(self.url(&["posts"]))
            .json(&serde_json::json!({ "name": name, "body": body }));
        let post: Post = self.send_json(req).await?;
        debug!(post_id = %post.id, "post created");
        Ok(post)
    }

    async fn update_post(
        &mut self,
        id: &str,
        name: Option<String>,
        body: Option<String>,
    ) -> Result<Post, GuestbookClientError> {
        let req = self
            .client
            .patch(self.url(&["posts", id]))
            .json(&UpdateBody { name, body });
        self.send_json(req).await
    }

    async fn remove_post(&mut self, id: &str) -> Result<(), GuestbookClientError> {
        let req = self.client.delete(self.url(&["posts", id]));
        let resp = self.authorized(req).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(GuestbookClientError::from_http_response(resp).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_api_urls() {
        let client = GuestbookClientHttp::connect("http://localhost:8080/").unwrap();
        assert_eq!(
            client.url(&["posts"]).as_str(),
            "http://localhost:8080/api/posts"
        );
        assert_eq!(
            client.url(&["posts", "abc"]).as_str(),
            "http://localhost:8080/api/posts/abc"
        );

        let prefixed = GuestbookClientHttp::connect("http://localhost:8080/guestbook").unwrap();
        assert_eq!(
            prefixed.url(&["posts_ids"]).as_str(),
            "http://localhost:8080/guestbook/api/posts_ids"
        );
    }

    #[test]
    fn post_ids_stay_a_single_path_segment() {
        let client = GuestbookClientHttp::connect("http://localhost:8080").unwrap();

        let empty = client.url(&["posts", ""]);
        assert_eq!(empty.as_str(), "http://localhost:8080/api/posts/");
        assert_ne!(empty.path(), client.url(&["posts"]).path());

        let slashed = client.url(&["posts", "a/b"]);
        assert_eq!(slashed.path(), "/api/posts/a%2Fb");
        assert_eq!(slashed.path_segments().unwrap().count(), 3);

        let questioned = client.url(&["posts", "a?b"]);
        assert_eq!(questioned.path(), "/api/posts/a%3Fb");
        assert_eq!(questioned.query(), None);
    }

    #[test]
    fn rejects_unusable_endpoints() {
        assert!(GuestbookClientHttp::connect("not a url").is_err());
        assert!(GuestbookClientHttp::connect("mailto:someone@example.com").is_err());
    }

    #[test]
    fn empty_token_means_anonymous() {
        let client = GuestbookClientHttp::connect("http://localhost:8080")
            .unwrap()
            .with_token(Some(String::new()));
        assert!(client.token.is_none());
    }
}
