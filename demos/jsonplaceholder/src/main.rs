//! JSONPlaceholder demo
//!
//! One declared trait, a live service against the public API and a mock.

#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use sprig::prelude::*;

// ============================================================================
// Data Types
// ============================================================================

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: u64,
    pub id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

// ============================================================================
// Declared endpoints
// ============================================================================

#[service(url = "https://jsonplaceholder.typicode.com")]
pub trait TestEndpoint {
    #[get("/posts/{id=2}")]
    async fn get_post(&self, id: u64) -> sprig::Result<Post>;

    #[get("/posts/{id=4}/comments")]
    async fn get_comments(&self, id: u64) -> sprig::Result<Vec<Comment>>;

    #[get("/posts/{id=4}/comments/{comment_id=2}")]
    async fn get_certain_comment(&self, id: u64, comment_id: u64) -> sprig::Result<Vec<Comment>>;

    #[post("/posts")]
    #[headers("Content-Type" = "application/json")]
    #[body("model")]
    async fn add_post(&self, model: Post) -> sprig::Result<Post>;

    #[get("/posts/")]
    async fn get_non_throwing_posts(&self) -> Option<Vec<Post>>;

    #[get("posts")]
    async fn get_no_response_posts(&self) -> sprig::Result<()>;

    #[get("/posts/{id}")]
    async fn get_nullable_post(&self, id: Option<u64>) -> sprig::Result<Post>;

    #[get("/posts/{id}")]
    async fn get_post_with_query_item(
        &self,
        id: u64,
        #[query("boolVal")] bool_val: bool,
        #[query("intVal")] int_val: i64,
        #[query("stringVal")] string_val: String,
    ) -> sprig::Result<Post>;

    #[post("/file")]
    #[body("body")]
    #[file_upload]
    async fn upload_file(&self, body: Vec<u8>) -> sprig::Result<()>;
}

/// Title of a post, whichever implementation serves it.
async fn title_of(endpoint: &impl TestEndpoint, id: u64) -> sprig::Result<String> {
    Ok(endpoint.get_post(id).await?.title)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> sprig::Result<()> {
    let mut service = TestEndpointService::from_default_url()?;
    service.register_before_send(None, |request| {
        println!("-> {} {}", request.method(), request.url());
        request
    });
    service.register_on_response_matching("posts/.{1,}/comments", |response| {
        println!("<- {} {}", response.status(), response.url());
        response
    })?;

    let post = service.get_post_with_defaults().await?;
    println!("post #{}: {}", post.id, post.title);

    let comments = service.get_comments(7).await?;
    println!("{} comments on post #7", comments.len());

    match service.get_certain_comment(9, 1).await {
        Ok(comments) => println!("{} matching comments", comments.len()),
        Err(error) => println!("expected failure: {error}"),
    }

    let created = service
        .add_post(Post {
            id: 101,
            user_id: 1,
            title: "Some title".to_string(),
            body: "some body".to_string(),
        })
        .await?;
    println!("created post titled {:?}", created.title);

    let posts = service.get_non_throwing_posts().await.unwrap_or_default();
    println!("{} posts", posts.len());

    let mut mock = TestEndpointMock::default();
    mock.get_post_result = Ok(Post {
        id: 1,
        user_id: 1,
        title: "Mock title".to_string(),
        body: "Mock body".to_string(),
    });
    println!("mock title: {}", title_of(&mock, 5).await?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, method, path},
    };

    use super::*;

    fn post(id: u64) -> Post {
        Post {
            id,
            user_id: 1,
            title: "Some title".to_string(),
            body: "some body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_post_with_defaults() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post(2)))
            .mount(&mock_server)
            .await;

        let service = TestEndpointService::new(mock_server.uri()).expect("service");
        let_assert!(Ok(result) = service.get_post_with_defaults().await);
        check!(result.id == 2);
    }

    #[tokio::test]
    async fn test_interception_and_query_items() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post(12)))
            .mount(&mock_server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut service = TestEndpointService::new(mock_server.uri()).expect("service");
        service.register_before_send(None, move |request| {
            log.lock().expect("lock").push(request.url().to_string());
            request
        });

        let_assert!(Ok(_) = service.get_post_with_query(12, vec![QueryItem::new("test", true)]).await);
        let_assert!(Ok(_) = service.get_post_with_query_item(12, true, 5, "five".to_string()).await);
        let _ = service.get_nullable_post(None).await;

        let base = mock_server.uri();
        let seen = seen.lock().expect("lock").clone();
        check!(
            seen == vec![
                format!("{base}/posts/12?test=true"),
                format!("{base}/posts/12?boolVal=true&intVal=5&stringVal=five"),
                format!("{base}/posts/"),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_200_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/9/comments/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let service = TestEndpointService::new(mock_server.uri()).expect("service");
        let_assert!(Err(error) = service.get_certain_comment(9, 1).await);
        check!(error.kind() == ErrorKind::UnexpectedResponse);
        check!(error.status() == Some(404));
        check!(error.description() == Some("Not Found"));
    }

    #[tokio::test]
    async fn test_file_upload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/file"))
            .and(body_string_contains("Content-Disposition: form-data; name="))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let service = TestEndpointService::new(mock_server.uri()).expect("service");
        let_assert!(Ok(()) = service.upload_file(b"{\"logo\": true}".to_vec()).await);
    }

    #[tokio::test]
    async fn test_mock() {
        let mut mock = TestEndpointMock::default();
        mock.get_post_result = Ok(post(1));
        let_assert!(Ok(title) = title_of(&mock, 5).await);
        check!(title == "Some title");

        mock.get_no_response_posts_result = Some(Error::failed_to_map(".", "unexpected"));
        let_assert!(Err(error) = mock.get_no_response_posts().await);
        check!(error.kind() == ErrorKind::FailedToMapResponse);
    }
}
