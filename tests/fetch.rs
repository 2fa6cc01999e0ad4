use rspc_contract::{
    fetch::{FetchHandler, Request},
    Context, Error, ErrorCode, HttpMethod, Procedure, Router, Schema, Value,
};
use serde_json::json;

mod utils;
use utils::*;

fn server() -> FetchHandler {
    let router = Router::new()
        .procedure("echo", echo())
        .procedure(
            "search",
            Procedure::builder()
                .route(HttpMethod::Get, "/planets/search")
                .input(Schema::object([
                    ("page", Schema::number()),
                    ("tags", Schema::array(Schema::string())),
                    ("exact", Schema::boolean().optional()),
                ]))
                .handler(|input: Value, _, _| async move { Ok(input) }),
        )
        .procedure(
            "find",
            Procedure::builder()
                .route(HttpMethod::Get, "/planets/{id}")
                .input(Schema::object([("id", Schema::number())]))
                .handler(|input: Value, _, _| async move { Ok(input) }),
        )
        .procedure(
            "rename",
            Procedure::builder()
                .route(HttpMethod::Put, "/planets/{id}")
                .input(Schema::object([
                    ("id", Schema::number()),
                    ("name", Schema::string()),
                ]))
                .handler(|input: Value, _, _| async move { Ok(input) }),
        )
        .procedure(
            "update",
            Procedure::builder()
                .input(Schema::object([("value", Schema::string())]))
                .handler(|input: Value, _, _| async move { Ok(input) }),
        )
        .procedure(
            "broken",
            Procedure::builder().handler(|_, _, _| async {
                Err::<(), _>(Error::internal(std::io::Error::other(
                    "password=hunter2 rejected",
                )))
            }),
        );

    FetchHandler::new(build(router)).prefix("/api")
}

#[tokio::test]
async fn test_query_strings_are_coerced() {
    let response = server()
        .fetch(
            Request::new("GET", "/api/planets/search?page=2&tags[]=a&tags[]=b&exact=true"),
            Context::new(),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        json!({ "page": 2, "tags": ["a", "b"], "exact": true })
    );
}

#[tokio::test]
async fn test_path_params_are_coerced() {
    let response = server()
        .fetch(Request::new("get", "/api/planets/42"), Context::new())
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "id": 42 }));
}

#[tokio::test]
async fn test_json_bodies() {
    let server = server();

    let response = server
        .fetch(
            Request::new("POST", "/api/echo").json(r#"{"value":"x","n":1.5}"#),
            Context::new(),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": "x", "n": 1.5 }));
    assert_eq!(response.to_vec(), br#"{"value":"x","n":1.5}"#);

    // JSON is never coerced
    let response = server
        .fetch(
            Request::new("POST", "/api/update").json(r#"{"value":1234}"#),
            Context::new(),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body["code"], json!("BAD_REQUEST"));
    assert_eq!(response.body["message"], json!("Validation input failed"));
    assert_eq!(response.body["issues"][0]["path"], json!(["value"]));

    let err = Error::from_response(response.status, &response.body);
    assert_eq!(err.code(), ErrorCode::BadRequest);
    assert_eq!(err.validation_error().map(|e| e.issues.len()), Some(1));
}

#[tokio::test]
async fn test_path_params_are_coerced_with_json_bodies() {
    let server = server();

    let response = server
        .fetch(
            Request::new("PUT", "/api/planets/42").json(r#"{"name":"earth"}"#),
            Context::new(),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "id": 42, "name": "earth" }));

    // The body is still strictly typed
    let response = server
        .fetch(
            Request::new("PUT", "/api/planets/42").json(r#"{"name":7}"#),
            Context::new(),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body["issues"][0]["path"], json!(["name"]));

    // Body fields win over path parameters
    let response = server
        .fetch(
            Request::new("PUT", "/api/planets/42").json(r#"{"id":"x","name":"earth"}"#),
            Context::new(),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body["issues"][0]["path"], json!(["id"]));
}

#[tokio::test]
async fn test_form_bodies() {
    let response = server()
        .fetch(
            Request::new("POST", "/api/update").form("value=1234"),
            Context::new(),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": "1234" }));
}

#[tokio::test]
async fn test_malformed_json() {
    let response = server()
        .fetch(
            Request::new("POST", "/api/echo").json("{not json"),
            Context::new(),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["message"], json!("Malformed JSON body"));
}

#[tokio::test]
async fn test_unroutable_requests() {
    let server = server();

    for url in ["/echo", "/apiecho", "/api/missing", "/api"] {
        let response = server.fetch(Request::new("POST", url), Context::new()).await;
        assert_eq!(response.status, 404, "{url}");
        assert_eq!(response.body["code"], json!("NOT_FOUND"));
    }

    let response = server
        .fetch(Request::new("TRACE", "/api/echo"), Context::new())
        .await;
    assert_eq!(response.status, 405);
    assert_eq!(response.body["code"], json!("METHOD_NOT_SUPPORTED"));
}

#[tokio::test]
async fn test_internal_errors_are_not_leaked() {
    let response = server()
        .fetch(Request::new("POST", "/api/broken"), Context::new())
        .await;

    assert_eq!(response.status, 500);
    assert_eq!(
        response.body,
        json!({
            "code": "INTERNAL_SERVER_ERROR",
            "status": 500,
            "message": "Internal server error",
        })
    );
    assert!(!String::from_utf8_lossy(&response.to_vec()).contains("hunter2"));
}

#[test]
fn test_unknown_error_bodies() {
    assert_eq!(
        Error::from_response(400, &json!({})),
        Error::new(ErrorCode::InternalServerError, "Internal server error")
    );
    assert_eq!(
        Error::from_response(404, &json!({ "code": "NOT_FOUND", "status": 500, "message": "x" })),
        Error::new(ErrorCode::InternalServerError, "Internal server error")
    );
    assert_eq!(
        Error::from_response(403, &json!({ "code": "FORBIDDEN", "message": "no entry" })),
        Error::new(ErrorCode::Forbidden, "no entry")
    );
}
