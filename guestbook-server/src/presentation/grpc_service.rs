use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::key::Key;
use crate::domain::post::{Post, PostPatch};
use crate::guestbook::guestbook_service_server::GuestbookService;
use crate::guestbook::{
    CreatePostRequest, ListPostsRequest, Post as ProtoPost, PostId, PostIdRequest,
    PostIdsCollection, PostsCollection, UpdatePostRequest,
};
use crate::infrastructure::config::AuthLevel;
use crate::infrastructure::security::TokenVerifier;
use crate::presentation::middleware::authorize;

#[derive(Clone)]
pub struct GuestbookGrpcService {
    post_service: PostService,
}

impl GuestbookGrpcService {
    pub fn new(post_service: PostService) -> Self {
        Self { post_service }
    }
}

#[tonic::async_trait]
impl GuestbookService for GuestbookGrpcService {
    async fn list_posts(
        &self,
        request: Request<ListPostsRequest>,
    ) -> Result<Response<PostsCollection>, Status> {
        let req = request.into_inner();
        let page = self
            .post_service
            .list_posts(req.next_token.as_deref(), req.limit.map(u64::from))
            .await?;

        Ok(Response::new(PostsCollection {
            posts: page.items.into_iter().map(Into::into).collect(),
            next_token: page.next_token,
        }))
    }

    async fn list_posts_ids(
        &self,
        request: Request<ListPostsRequest>,
    ) -> Result<Response<PostIdsCollection>, Status> {
        let req = request.into_inner();
        let page = self
            .post_service
            .list_post_ids(req.next_token.as_deref(), req.limit.map(u64::from))
            .await?;

        Ok(Response::new(PostIdsCollection {
            posts: page.items.into_iter().map(Into::into).collect(),
            next_token: page.next_token,
        }))
    }

    async fn get_post(
        &self,
        request: Request<PostIdRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let req = request.into_inner();
        let post = self.post_service.get_post(&req.id).await?;
        Ok(Response::new(post.into()))
    }

    async fn create_post(
        &self,
        request: Request<CreatePostRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let req = request.into_inner();
        let post = self.post_service.create_post(req.name, req.body).await?;

        info!(post_id = %post.key, "post created over gRPC");
        Ok(Response::new(post.into()))
    }

    async fn update_post(
        &self,
        request: Request<UpdatePostRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let req = request.into_inner();
        let patch = PostPatch {
            name: req.name,
            body: req.body,
        };
        let post = self.post_service.update_post(&req.id, patch).await?;

        info!(post_id = %post.key, "post updated over gRPC");
        Ok(Response::new(post.into()))
    }

    async fn remove_post(&self, request: Request<PostIdRequest>) -> Result<Response<()>, Status> {
        let req = request.into_inner();
        self.post_service.remove_post(&req.id).await?;

        info!(post_id = %req.id, "post deleted over gRPC");
        Ok(Response::new(()))
    }
}

/// Builds the tonic interceptor that applies the same gate as the HTTP side.
pub fn auth_interceptor(
    level: AuthLevel,
    verifier: Option<Arc<dyn TokenVerifier>>,
) -> impl FnMut(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |mut req: Request<()>| {
        let header = req
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let caller = authorize(level, verifier.as_deref(), header.as_deref())
            .map_err(Status::from)?;
        if let Some(caller) = caller {
            req.extensions_mut().insert(caller);
        }
        Ok(req)
    }
}

impl From<Post> for ProtoPost {
    fn from(p: Post) -> Self {
        ProtoPost {
            id: p.id(),
            name: p.name,
            body: p.body,
        }
    }
}

impl From<Key> for PostId {
    fn from(key: Key) -> Self {
        PostId { id: key.urlsafe() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory_datastore::InMemoryDatastore;
    use crate::infrastructure::config::AuthConfig;
    use crate::infrastructure::security::JwtVerifier;
    use crate::infrastructure::security::tests::{SECRET, issue, valid_claims};

    fn service() -> GuestbookGrpcService {
        GuestbookGrpcService::new(PostService::new(Arc::new(InMemoryDatastore::new())))
    }

    #[tokio::test]
    async fn crud_over_grpc() {
        let service = service();

        let created = service
            .create_post(Request::new(CreatePostRequest {
                name: "Alice".into(),
                body: "Hi".into(),
            }))
            .await
            .unwrap()
            .into_inner();

        let updated = service
            .update_post(Request::new(UpdatePostRequest {
                id: created.id.clone(),
                name: None,
                body: Some("Hello again".into()),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.body, "Hello again");

        service
            .remove_post(Request::new(PostIdRequest {
                id: created.id.clone(),
            }))
            .await
            .unwrap();

        let status = service
            .get_post(Request::new(PostIdRequest { id: created.id }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn listing_over_grpc_pages() {
        let service = service();
        for i in 0..3 {
            service
                .create_post(Request::new(CreatePostRequest {
                    name: format!("Guest {i}"),
                    body: "hi".into(),
                }))
                .await
                .unwrap();
        }

        let first = service
            .list_posts_ids(Request::new(ListPostsRequest {
                next_token: None,
                limit: Some(2),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(first.posts.len(), 2);

        let rest = service
            .list_posts(Request::new(ListPostsRequest {
                next_token: first.next_token,
                limit: Some(2),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(rest.posts.len(), 1);
        assert_eq!(rest.posts[0].name, "Guest 2");
        assert!(rest.next_token.is_none());
    }

    #[tokio::test]
    async fn empty_name_is_invalid_argument() {
        let status = service()
            .create_post(Request::new(CreatePostRequest {
                name: String::new(),
                body: "text".into(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn interceptor_enforces_required_level() {
        let verifier: Arc<dyn TokenVerifier> =
            Arc::new(JwtVerifier::new(SECRET, &AuthConfig::default()));
        let mut intercept = auth_interceptor(AuthLevel::Required, Some(verifier));

        let status = intercept(Request::new(())).unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);

        let mut req = Request::new(());
        let header = format!("Bearer {}", issue(valid_claims()));
        req.metadata_mut()
            .insert("authorization", header.parse().unwrap());
        assert!(intercept(req).is_ok());
    }
}
