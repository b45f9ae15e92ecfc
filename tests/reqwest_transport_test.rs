//! The reqwest transport against a mock server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use couchdb_client::prelude::*;

fn connection(server: &MockServer, build: impl FnOnce(ClientConfig) -> ClientConfig) -> Connection {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .build()
        .expect("config");
    Connection::new(build(config)).expect("connection")
}

#[tokio::test]
async fn find_posts_the_query_and_follows_bookmarks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks/_find"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "selector": { "done": false }, "limit": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{ "_id": "t1" }],
            "bookmark": "g1AAAA"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks/_find"))
        .and(body_json(
            json!({ "selector": { "done": false }, "limit": 1, "bookmark": "g1AAAA" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [],
            "bookmark": "g1AAAA"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = connection(&server, |c| c).database("tasks");
    let mut cursor = db
        .find(json!({ "done": false }), None, FindOptions::new().limit(1))
        .await
        .expect("find")
        .into_cursor();

    let mut ids = Vec::new();
    while cursor.advance().await {
        let doc: serde_json::Value = cursor.decode().unwrap();
        ids.push(doc["_id"].as_str().unwrap().to_string());
    }
    assert_eq!(ids, ["t1"]);
    assert!(cursor.last_error().is_none());
}

#[tokio::test]
async fn basic_credentials_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_up"))
        // admin:secret
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server, |mut c| {
        c.auth = AuthScheme::Basic {
            username: "admin".into(),
            password: "secret".to_string().into(),
        };
        c
    });
    let status = conn.up().await.expect("up");
    assert_eq!(status.code, 200);
    assert_eq!(status.status, "200 OK");
}

#[tokio::test]
async fn session_cookie_is_sent_and_captured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/doc-1"))
        .and(query_param("revs", "true"))
        .and(header("cookie", "AuthSession=old-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("server", "CouchDB/3.3.3 (Erlang OTP/24)")
                .insert_header("set-cookie", "AuthSession=new-token; Version=1; Path=/; HttpOnly")
                .set_body_json(json!({ "_id": "doc-1", "_rev": "1-abc" })),
        )
        .mount(&server)
        .await;

    let conn = connection(&server, |mut c| {
        c.auth = AuthScheme::Cookie {
            session: "old-token".to_string().into(),
        };
        c
    });
    let request = couchdb_client::execution::http::RequestBuilder::new()
        .method_name("GET")
        .endpoint("/tasks/doc-1")
        .param("revs", "true")
        .build()
        .unwrap();
    let mut result = conn.request(request, &CancelHandle::new()).await.unwrap();

    assert_eq!(result.session_cookie(), Some("new-token"));
    assert_eq!(
        result.status().server.as_deref(),
        Some("CouchDB/3.3.3 (Erlang OTP/24)")
    );
    let doc: serde_json::Value = result.decode().await.unwrap();
    assert_eq!(doc["_rev"], "1-abc");
    assert!(matches!(
        result.decode::<serde_json::Value>().await,
        Err(CouchError::AlreadyConsumed)
    ));
}

#[tokio::test]
async fn missing_document_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "not_found", "reason": "missing" })),
        )
        .mount(&server)
        .await;

    let err = connection(&server, |c| c)
        .database("tasks")
        .get("nope")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        CouchError::Api { error, reason, .. } => {
            assert_eq!(error, "not_found");
            assert_eq!(reason, "missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_server_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "db_name": "tasks" }))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let conn = connection(&server, |mut c| {
        c.request_timeout = Some(std::time::Duration::from_millis(100));
        c
    });
    let err = conn.database("tasks").stat().await.unwrap_err();
    assert!(matches!(
        err,
        CouchError::Cancelled(couchdb_client::CancelReason::TimedOut(_))
    ));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    // Nothing listens on the discard port.
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:9")
        .build()
        .unwrap();
    let err = Connection::new(config).unwrap().up().await.unwrap_err();
    assert!(matches!(err, CouchError::Transport(_)), "got {err:?}");
}
