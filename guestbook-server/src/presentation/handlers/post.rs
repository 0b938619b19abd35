use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{
    CreatePostRequest, ListPostsQuery, PostIdsCollection, PostMessage, PostsCollection,
    UpdatePostRequest,
};
use crate::presentation::utils::{MaybeCaller, request_id};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_posts)
        .service(list_post_ids)
        .service(create_post)
        .service(get_post)
        .service(update_post)
        .service(remove_post);
}

#[get("/posts")]
async fn list_posts(
    req: HttpRequest,
    posts: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let query = query.into_inner();
    let page = posts
        .list_posts(query.next_token.as_deref(), query.limit)
        .await?;

    info!(
        request_id = %request_id(&req),
        count = page.items.len(),
        has_more = page.next_token.is_some(),
        "posts listed"
    );

    Ok(HttpResponse::Ok().json(PostsCollection::from(page)))
}

#[get("/posts_ids")]
async fn list_post_ids(
    req: HttpRequest,
    posts: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let query = query.into_inner();
    let page = posts
        .list_post_ids(query.next_token.as_deref(), query.limit)
        .await?;

    info!(
        request_id = %request_id(&req),
        count = page.items.len(),
        has_more = page.next_token.is_some(),
        "post ids listed"
    );

    Ok(HttpResponse::Ok().json(PostIdsCollection::from(page)))
}

#[get("/posts/{id}")]
async fn get_post(
    posts: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostMessage::from(post)))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    caller: MaybeCaller,
    posts: web::Data<PostService>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let CreatePostRequest { name, body } = payload.into_inner();
    let post = posts.create_post(name, body).await?;

    info!(
        request_id = %request_id(&req),
        caller = %caller.subject(),
        post_id = %post.key,
        "post created"
    );

    Ok(HttpResponse::Ok().json(PostMessage::from(post)))
}

#[patch("/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    caller: MaybeCaller,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .update_post(&path.into_inner(), payload.into_inner().into())
        .await?;

    info!(
        request_id = %request_id(&req),
        caller = %caller.subject(),
        post_id = %post.key,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(PostMessage::from(post)))
}

#[delete("/posts/{id}")]
async fn remove_post(
    req: HttpRequest,
    caller: MaybeCaller,
    posts: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.remove_post(&post_id).await?;

    info!(
        request_id = %request_id(&req),
        caller = %caller.subject(),
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::json;

    use super::*;
    use crate::data::memory_datastore::InMemoryDatastore;
    use crate::presentation::handlers::{json_config, query_config};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(json_config())
                    .app_data(query_config())
                    .app_data(web::Data::new(PostService::new(Arc::new(
                        InMemoryDatastore::new(),
                    ))))
                    .service(web::scope("/api").configure(configure)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn create_then_get_round_trips_fields() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "name": "Alice", "body": "Lovely guestbook" }))
            .to_request();
        let created: PostMessage = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.name, "Alice");
        assert!(!created.id.is_empty());

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", created.id))
            .to_request();
        let fetched: PostMessage = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, created);
    }

    #[actix_web::test]
    async fn create_with_missing_field_is_bad_request() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "name": "Alice" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "name": "", "body": "text" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_id_is_not_found() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/posts/not-a-real-id")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["details"]["resource"], "not-a-real-id");
    }

    #[actix_web::test]
    async fn patch_changes_only_supplied_fields() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "name": "Alice", "body": "Keep me" }))
            .to_request();
        let created: PostMessage = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/api/posts/{}", created.id))
            .set_json(json!({ "name": "X", "body": "" }))
            .to_request();
        let updated: PostMessage = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "X");
        assert_eq!(updated.body, "Keep me");
    }

    #[actix_web::test]
    async fn delete_then_get_is_not_found() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "name": "Alice", "body": "Bye" }))
            .to_request();
        let created: PostMessage = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn listing_pages_through_everything() {
        let app = app!();

        for i in 0..7 {
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .set_json(json!({ "name": format!("Guest {i}"), "body": "hi" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get()
            .uri("/api/posts?limit=5")
            .to_request();
        let first: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first["posts"].as_array().unwrap().len(), 5);
        let token = first["next_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts?limit=5&next_token={token}"))
            .to_request();
        let second: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second["posts"].as_array().unwrap().len(), 2);
        assert!(second.get("next_token").is_none());

        let req = test::TestRequest::get()
            .uri("/api/posts_ids?limit=100")
            .to_request();
        let ids: PostIdsCollection = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ids.posts.len(), 7);
        assert!(ids.next_token.is_none());
    }

    #[actix_web::test]
    async fn oversized_limit_is_clamped_not_rejected() {
        let app = app!();

        for i in 0..3 {
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .set_json(json!({ "name": format!("Guest {i}"), "body": "hi" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get()
            .uri("/api/posts?limit=4294967296")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: PostsCollection = test::read_body_json(resp).await;
        assert_eq!(page.posts.len(), 3);
        assert!(page.posts.len() <= 1000);

        let req = test::TestRequest::get()
            .uri("/api/posts_ids?limit=4294967296")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn bad_paging_parameters_are_rejected() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/posts?next_token=garbage!")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/posts?limit=-1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
