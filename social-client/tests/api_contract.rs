use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use social_client::{
    ApiRequest, ClientConfig, Credentials, GENERIC_FAILURE_MESSAGE, GetPostOptions, HttpRequest,
    HttpResponse, HttpTransport, ListPostsOptions, MemorySessionStore, NewComment, NewPost,
    PostUpdate, ProfileOptions, ProfileUpdate, RegisterUser, SearchOptions, Session, SessionStore,
    SocialClient, SocialClientError, SocialClientResult, SortOrder,
};

#[derive(Debug, Default)]
struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<SocialClientResult<HttpResponse>>>,
}

impl RecordingTransport {
    fn reply(&self, status: StatusCode, body: serde_json::Value) {
        self.responses
            .lock()
            .expect("lock")
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
    }

    fn reply_raw(&self, status: StatusCode, body: &str) {
        self.responses
            .lock()
            .expect("lock")
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    fn fail(&self, message: &str) {
        self.responses
            .lock()
            .expect("lock")
            .push_back(Err(SocialClientError::Transport(message.into())));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> SocialClientResult<HttpResponse> {
        self.requests.lock().expect("lock").push(request);
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(StatusCode::NO_CONTENT, "")))
    }
}

struct Harness {
    client: SocialClient,
    transport: Arc<RecordingTransport>,
    session: Arc<MemorySessionStore>,
}

fn harness() -> Harness {
    harness_with_session(MemorySessionStore::new())
}

fn harness_with_session(session: MemorySessionStore) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let session = Arc::new(session);
    let config = ClientConfig::new("https://api.example.test", "test-key")
        .with_email_domain("stud.noroff.no");
    let client = SocialClient::with_transport(config, session.clone(), transport.clone())
        .expect("config must be valid");
    Harness {
        client,
        transport,
        session,
    }
}

fn body_json(request: &HttpRequest) -> serde_json::Value {
    let body = request.body.as_ref().expect("request must have a body");
    serde_json::from_slice(body).expect("body must be json")
}

fn post_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "body": "text",
        "tags": ["rust"],
        "media": {"url": "https://img.example/1.png", "alt": "pic"},
        "created": "2026-01-01T10:00:00.000Z",
        "updated": "2026-01-02T10:00:00.000Z",
        "_count": {"comments": 2, "reactions": 5}
    })
}

fn meta_json() -> serde_json::Value {
    json!({
        "isFirstPage": true,
        "isLastPage": false,
        "currentPage": 1,
        "previousPage": null,
        "nextPage": 2,
        "pageCount": 4,
        "totalCount": 40
    })
}

#[tokio::test]
async fn login_saves_session_and_authenticates_later_requests() {
    let h = harness();
    h.transport.reply(
        StatusCode::OK,
        json!({"data": {
            "name": "alice",
            "email": "alice@stud.noroff.no",
            "avatar": {"url": "https://img.example/a.png", "alt": ""},
            "accessToken": "jwt-token"
        }, "meta": {}}),
    );

    let user = h
        .client
        .login(&Credentials::new("alice@stud.noroff.no", "password123"))
        .await
        .expect("login must succeed");

    assert_eq!(user.name, "alice");
    assert!(h.client.is_logged_in());
    assert_eq!(h.client.current_username().as_deref(), Some("alice"));
    assert_eq!(h.session.token().as_deref(), Some("jwt-token"));

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(requests[0].url.path(), "/auth/login");
    assert!(requests[0].headers.get(AUTHORIZATION).is_none());
    assert_eq!(
        body_json(&requests[0]),
        json!({"email": "alice@stud.noroff.no", "password": "password123"})
    );

    let _ = h.client.get_all_posts(&ListPostsOptions::default()).await;
    let requests = h.transport.requests();
    assert_eq!(requests[1].headers[AUTHORIZATION], "Bearer jwt-token");
    assert_eq!(requests[1].headers["x-noroff-api-key"], "test-key");
}

#[tokio::test]
async fn failed_login_keeps_client_anonymous() {
    let h = harness();
    h.transport.reply(
        StatusCode::UNAUTHORIZED,
        json!({"errors": [{"message": "Invalid email or password"}], "status": "Unauthorized", "statusCode": 401}),
    );

    let err = h
        .client
        .login(&Credentials::new("alice@stud.noroff.no", "wrong"))
        .await
        .expect_err("login must fail");

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(err.is_unauthorized());
    assert!(!h.client.is_logged_in());
}

#[tokio::test]
async fn logout_clears_session_regardless_of_prior_state() {
    let h = harness_with_session(MemorySessionStore::with_session(Session::new("t", "bob")));
    assert!(h.client.is_logged_in());

    h.client.logout().expect("logout");
    assert!(!h.client.is_logged_in());
    assert!(h.client.current_username().is_none());

    h.client.logout().expect("second logout");
    assert!(!h.client.is_logged_in());
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn no_content_yields_empty_object() {
    let h = harness();
    h.transport.reply_raw(StatusCode::NO_CONTENT, "");

    let value = h
        .client
        .http()
        .send(ApiRequest::delete("/social/posts").segment(5))
        .await
        .expect("204 must succeed");

    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn delete_post_issues_delete_and_accepts_no_content() {
    let h = harness();
    h.client.delete_post(5).await.expect("delete must succeed");

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::DELETE);
    assert_eq!(requests[0].url.path(), "/social/posts/5");
    assert!(requests[0].body.is_none());
}

#[tokio::test]
async fn update_post_sends_only_changed_fields() {
    let h = harness();
    h.transport
        .reply(StatusCode::OK, json!({"data": post_json(5, "renamed"), "meta": {}}));

    let update = PostUpdate {
        title: Some("renamed".to_string()),
        ..PostUpdate::default()
    };
    let post = h.client.update_post(5, &update).await.expect("update");

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::PUT);
    assert_eq!(requests[0].url.path(), "/social/posts/5");
    assert_eq!(body_json(&requests[0]), json!({"title": "renamed"}));
    assert_eq!(post.title, "renamed");
    assert_eq!(post.count.map(|count| count.reactions), Some(5));
}

#[tokio::test]
async fn error_envelope_message_is_surfaced_verbatim() {
    let h = harness();
    h.transport
        .reply(StatusCode::BAD_REQUEST, json!({"errors": [{"message": "X"}]}));

    let err = h
        .client
        .create_post(&NewPost::new("title"))
        .await
        .expect_err("must fail");

    assert_eq!(err.to_string(), "X");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn unparsable_error_body_uses_generic_message() {
    let h = harness();
    h.transport.reply_raw(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");

    let err = h
        .client
        .get_post(1, &GetPostOptions::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, SocialClientError::UnreadableErrorBody { .. }));
    assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn absent_error_body_uses_generic_message() {
    let h = harness();
    h.transport.reply_raw(StatusCode::NOT_FOUND, "");

    let err = h
        .client
        .get_profile("ghost", &ProfileOptions::default())
        .await
        .expect_err("must fail");

    assert!(err.is_not_found());
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn transport_failure_propagates_as_transport_error() {
    let h = harness();
    h.transport.fail("connection refused");

    let err = h
        .client
        .get_all_posts(&ListPostsOptions::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, SocialClientError::Transport(_)));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn get_all_posts_uses_default_query_and_returns_meta() {
    let h = harness();
    h.transport.reply(
        StatusCode::OK,
        json!({"data": [post_json(1, "first"), post_json(2, "second")], "meta": meta_json()}),
    );

    let page = h
        .client
        .get_all_posts(&ListPostsOptions::default())
        .await
        .expect("must succeed");

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::GET);
    assert_eq!(requests[0].url.path(), "/social/posts");
    assert_eq!(
        requests[0].url.query(),
        Some("page=1&limit=12&_author=true&_comments=false&_reactions=false")
    );

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[1].title, "second");
    assert_eq!(page.data[0].count.map(|c| c.reactions), Some(5));
    assert_eq!(page.meta.current_page, 1);
    assert_eq!(page.meta.page_count, 4);
    assert!(page.meta.is_first_page);
    assert!(!page.meta.is_last_page);
    assert_eq!(page.meta.next_page, Some(2));
}

#[tokio::test]
async fn feed_tolerates_null_alt_and_tags() {
    let h = harness();
    let mut post = post_json(3, "nulls");
    post["media"] = json!({"url": "https://img.example/3.png", "alt": null});
    post["tags"] = serde_json::Value::Null;
    h.transport
        .reply(StatusCode::OK, json!({"data": [post], "meta": meta_json()}));

    let page = h
        .client
        .get_all_posts(&ListPostsOptions::default())
        .await
        .expect("page must decode");

    let media = page.data[0].media.as_ref().expect("media expected");
    assert_eq!(media.alt, "");
    assert!(page.data[0].tags.is_empty());
}

#[tokio::test]
async fn get_all_posts_sends_sorting_when_requested() {
    let h = harness();
    h.transport
        .reply(StatusCode::OK, json!({"data": [], "meta": meta_json()}));

    let options = ListPostsOptions {
        page: Some(2),
        sort: Some("created".to_string()),
        sort_order: Some(SortOrder::Desc),
        ..ListPostsOptions::default()
    };
    h.client.get_all_posts(&options).await.expect("must succeed");

    let requests = h.transport.requests();
    assert_eq!(
        requests[0].url.query(),
        Some("page=2&limit=12&_author=true&_comments=false&_reactions=false&sort=created&sortOrder=desc")
    );
}

#[tokio::test]
async fn get_post_builds_expected_url_and_unwraps_data() {
    let h = harness();
    h.transport
        .reply(StatusCode::OK, json!({"data": post_json(42, "answer"), "meta": {}}));

    let post = h
        .client
        .get_post(42, &GetPostOptions::default())
        .await
        .expect("must succeed");

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::GET);
    assert_eq!(
        requests[0].url.as_str(),
        "https://api.example.test/social/posts/42?_author=true&_comments=true&_reactions=false"
    );
    assert_eq!(post.id, 42);
    assert_eq!(post.title, "answer");
    assert_eq!(post.tags, vec!["rust".to_string()]);
}

#[tokio::test]
async fn reacting_twice_sends_two_independent_requests() {
    let h = harness();
    let reacted = json!({"data": {
        "postId": 9,
        "symbol": "👍",
        "reactions": [{"symbol": "👍", "count": 1, "reactors": ["alice"]}]
    }, "meta": {}});
    h.transport.reply(StatusCode::OK, reacted);
    h.transport.reply(
        StatusCode::OK,
        json!({"data": {"postId": 9, "symbol": "👍", "reactions": []}, "meta": {}}),
    );

    let first = h.client.react_to_post(9, "👍").await.expect("first react");
    let second = h.client.react_to_post(9, "👍").await.expect("second react");

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.method, reqwest::Method::PUT);
        assert_eq!(request.url.path(), "/social/posts/9/react/%F0%9F%91%8D");
    }
    assert_eq!(first.reactions[0].reactors, vec!["alice".to_string()]);
    assert!(second.reactions.is_empty());
}

#[tokio::test]
async fn register_with_foreign_email_domain_never_hits_network() {
    let h = harness();
    let user = RegisterUser::new("alice", "alice@gmail.com", "password123");

    let err = h.client.register(&user).await.expect_err("must be rejected");

    assert!(matches!(err, SocialClientError::Validation(_)));
    assert_eq!(
        err.user_message(),
        "Email must be a valid @stud.noroff.no address"
    );
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn register_surfaces_backend_message() {
    let h = harness();
    h.transport.reply(
        StatusCode::BAD_REQUEST,
        json!({"errors": [{"message": "Profile already exists"}]}),
    );

    let err = h
        .client
        .register(&RegisterUser::new("alice", "alice@stud.noroff.no", "password123"))
        .await
        .expect_err("must fail");

    assert_eq!(err.to_string(), "Profile already exists");
    assert!(!h.client.is_logged_in());
    let requests = h.transport.requests();
    assert_eq!(requests[0].url.path(), "/auth/register");
    assert_eq!(body_json(&requests[0])["name"], "alice");
}

#[tokio::test]
async fn create_post_with_blank_title_is_rejected_locally() {
    let h = harness();
    let err = h
        .client
        .create_post(&NewPost::new("  "))
        .await
        .expect_err("must fail");

    assert!(matches!(err, SocialClientError::Validation(_)));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn update_profile_sends_null_to_clear_fields() {
    let h = harness_with_session(MemorySessionStore::with_session(Session::new("t", "alice")));
    h.transport.reply(
        StatusCode::OK,
        json!({"data": {"name": "alice", "bio": "hi", "avatar": null, "banner": null}, "meta": {}}),
    );

    let update = ProfileUpdate::default().bio("hi").clear_avatar();
    let profile = h
        .client
        .update_profile("alice", &update)
        .await
        .expect("must succeed");

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::PUT);
    assert_eq!(requests[0].url.path(), "/social/profiles/alice");
    assert_eq!(body_json(&requests[0]), json!({"bio": "hi", "avatar": null}));
    assert_eq!(profile.bio.as_deref(), Some("hi"));
    assert!(profile.avatar.is_none());
}

#[tokio::test]
async fn profile_operations_use_expected_paths() {
    let h = harness();
    let follow = json!({"data": {"followers": [{"name": "bob"}], "following": []}, "meta": {}});
    h.transport.reply(StatusCode::OK, follow.clone());
    h.transport.reply(StatusCode::OK, follow);
    h.transport
        .reply(StatusCode::OK, json!({"data": [], "meta": meta_json()}));

    let followed = h.client.follow_user("bob").await.expect("follow");
    h.client.unfollow_user("bob").await.expect("unfollow");
    h.client
        .get_posts_by_user("bob", &ListPostsOptions::default())
        .await
        .expect("posts by user");

    let requests = h.transport.requests();
    assert_eq!(requests[0].url.path(), "/social/profiles/bob/follow");
    assert_eq!(requests[1].url.path(), "/social/profiles/bob/unfollow");
    assert_eq!(requests[0].method, reqwest::Method::PUT);
    assert_eq!(requests[2].url.path(), "/social/profiles/bob/posts");
    assert_eq!(
        requests[2].url.query(),
        Some("page=1&limit=12&_author=true&_comments=false&_reactions=false")
    );
    assert_eq!(followed.followers[0].name, "bob");
}

#[tokio::test]
async fn get_profile_uses_relation_flags() {
    let h = harness();
    h.transport.reply(
        StatusCode::OK,
        json!({"data": {
            "name": "bob",
            "_count": {"posts": 3, "followers": 1, "following": 0},
            "followers": [{"name": "alice"}]
        }, "meta": {}}),
    );

    let options = ProfileOptions {
        followers: Some(true),
        ..ProfileOptions::default()
    };
    let profile = h.client.get_profile("bob", &options).await.expect("profile");

    let requests = h.transport.requests();
    assert_eq!(
        requests[0].url.query(),
        Some("_posts=false&_followers=true&_following=false")
    );
    assert_eq!(profile.count.map(|c| c.posts), Some(3));
    assert_eq!(profile.followers[0].name, "alice");
}

#[tokio::test]
async fn search_posts_encodes_query_string() {
    let h = harness();
    h.transport
        .reply(StatusCode::OK, json!({"data": [post_json(3, "rust tips")], "meta": meta_json()}));

    let page = h
        .client
        .search_posts("rust tips", &SearchOptions::default())
        .await
        .expect("search");

    let requests = h.transport.requests();
    assert_eq!(requests[0].url.path(), "/social/posts/search");
    assert_eq!(
        requests[0].url.query(),
        Some("q=rust+tips&_author=false&_reactions=false&_comments=false")
    );
    assert_eq!(page.data[0].id, 3);
}

#[tokio::test]
async fn comment_on_post_posts_body_and_returns_comment() {
    let h = harness();
    h.transport.reply(
        StatusCode::CREATED,
        json!({"data": {
            "id": 11,
            "body": "nice",
            "replyToId": null,
            "postId": 9,
            "owner": "alice",
            "created": "2026-01-03T12:00:00.000Z"
        }, "meta": {}}),
    );

    let comment = h
        .client
        .comment_on_post(9, &NewComment::new("nice"))
        .await
        .expect("comment");

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(requests[0].url.path(), "/social/posts/9/comment");
    assert_eq!(body_json(&requests[0]), json!({"body": "nice"}));
    assert_eq!(comment.id, 11);
    assert_eq!(comment.owner.as_deref(), Some("alice"));
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let h = harness();
    h.transport.reply_raw(StatusCode::OK, "{not json");

    let err = h
        .client
        .get_post(1, &GetPostOptions::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, SocialClientError::Decode(_)));
}
