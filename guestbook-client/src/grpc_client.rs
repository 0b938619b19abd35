use async_trait::async_trait;
use tonic::Request;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};

use crate::error::GuestbookClientError;
use crate::guestbook::guestbook_service_client::GuestbookServiceClient;
use crate::guestbook::{
    self as proto, CreatePostRequest, ListPostsRequest, PostIdRequest, UpdatePostRequest,
};
use crate::{GuestbookClient, Page, Post, PostId, validate_new_post};

#[derive(Clone)]
pub struct GuestbookClientGrpc {
    client: GuestbookServiceClient<Channel>,
    token: Option<String>,
}

impl GuestbookClientGrpc {
    pub async fn connect(endpoint: &str) -> Result<Self, GuestbookClientError> {
        let channel = Endpoint::from_shared(endpoint.to_owned())
            .map_err(|e| GuestbookClientError::InvalidRequest(e.to_string()))?
            .connect()
            .await?;
        Ok(Self {
            client: GuestbookServiceClient::new(channel),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn request<T>(&self, message: T) -> Result<Request<T>, GuestbookClientError> {
        let mut req = Request::new(message);
        if let Some(token) = &self.token {
            let header: MetadataValue<Ascii> = format!("Bearer {token}")
                .parse()
                .map_err(|_| GuestbookClientError::Unauthorized("malformed token".into()))?;
            req.metadata_mut().insert("authorization", header);
        }
        Ok(req)
    }
}

impl From<proto::Post> for Post {
    fn from(p: proto::Post) -> Self {
        Post {
            id: p.id,
            name: p.name,
            body: p.body,
        }
    }
}

#[async_trait]
impl GuestbookClient for GuestbookClientGrpc {
    async fn list_posts(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<Post>, GuestbookClientError> {
        let req = self.request(ListPostsRequest { next_token, limit })?;
        let resp = self.client.list_posts(req).await?.into_inner();
        Ok(Page {
            posts: resp.posts.into_iter().map(Post::from).collect(),
            next_token: resp.next_token,
        })
    }

    async fn list_post_ids(
        &mut self,
        next_token: Option<String>,
        limit: Option<u32>,
    ) -> Result<Page<PostId>, GuestbookClientError> {
        let req = self.request(ListPostsRequest { next_token, limit })?;
        let resp = self.client.list_posts_ids(req).await?.into_inner();
        Ok(Page {
            posts: resp
                .posts
                .into_iter()
                .map(|p| PostId { id: p.id })
                .collect(),
            next_token: resp.next_token,
        })
    }

    async fn get_post(&mut self, id: &str) -> Result<Post, GuestbookClientError> {
        let req = self.request(PostIdRequest { id: id.to_string() })?;
        Ok(self.client.get_post(req).await?.into_inner().into())
    }

    async fn create_post(
        &mut self,
        name: String,
        body: String,
    ) -> Result<Post, GuestbookClientError> {
        validate_new_post(&name, &body)?;

        let req = self.request(CreatePostRequest { name, body })?;
        Ok(self.client.create_post(req).await?.into_inner().into())
    }

    async fn update_post(
        &mut self,
        id: &str,
        name: Option<String>,
        body: Option<String>,
    ) -> Result<Post, GuestbookClientError> {
        let req = self.request(UpdatePostRequest {
            id: id.to_string(),
            name,
            body,
        })?;
        Ok(self.client.update_post(req).await?.into_inner().into())
    }

    async fn remove_post(&mut self, id: &str) -> Result<(), GuestbookClientError> {
        let req = self.request(PostIdRequest { id: id.to_string() })?;
        self.client.remove_post(req).await?;
        Ok(())
    }
}
