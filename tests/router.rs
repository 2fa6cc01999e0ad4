use rspc_contract::{
    matcher::PatternError, BuildErrorCause, Config, HttpMethod, Procedure, Router, RouterHandler,
    Value,
};

mod utils;
use utils::*;

#[test]
fn test_router_build_errors() {
    let router = Router::new()
        .procedure("", echo())
        .procedure("a.b", echo())
        .procedure("ok", echo())
        .procedure("ok", echo())
        .nest(
            "nested",
            Router::new().procedure("bad", echo().prefix("/files/*/tail")),
        );

    let causes = router
        .errors()
        .iter()
        .map(|err| err.cause().clone())
        .collect::<Vec<_>>();
    assert_eq!(
        causes,
        vec![
            BuildErrorCause::InvalidName,
            BuildErrorCause::InvalidCharInName('.'),
            BuildErrorCause::DuplicateName("ok".into()),
            BuildErrorCause::InvalidPath(PatternError::WildcardNotLast("/files/*/tail".into())),
        ]
    );

    #[cfg(debug_assertions)]
    assert_eq!(router.errors()[3].expose().0, "nested.bad");

    let errors = rspc_contract::create_router_handler(router).unwrap_err();
    assert_eq!(errors.len(), 4);
}

#[test]
fn test_prefixed_duplicate_params_fail_the_build() {
    let router = Router::new()
        .procedure("dup", echo().prefix("/{id}"))
        .prefix("/{id}");
    assert!(router.errors().is_empty());

    let errors = RouterHandler::new(router, Config::new()).unwrap_err();

    assert!(matches!(
        errors[0].cause(),
        BuildErrorCause::InvalidPath(PatternError::DuplicateParam { param, .. }) if param == "id"
    ));
}

#[test]
fn test_procedures_keep_declaration_order() {
    let router = Router::new()
        .procedure("b", echo())
        .nest("a", Router::new().procedure("z", echo()).procedure("y", echo()))
        .procedure("c", echo().prefix("/custom"));

    let routes = router
        .flatten()
        .into_iter()
        .map(|route| (route.keys.join("."), route.method, route.path))
        .collect::<Vec<_>>();

    assert_eq!(
        routes,
        vec![
            ("b".to_string(), HttpMethod::Post, "/b".to_string()),
            ("a.z".to_string(), HttpMethod::Post, "/a/z".to_string()),
            ("a.y".to_string(), HttpMethod::Post, "/a/y".to_string()),
            ("c".to_string(), HttpMethod::Post, "/custom".to_string()),
        ]
    );
}

#[test]
fn test_prefix_applies_to_every_procedure() {
    let router = Router::new()
        .procedure(
            "get",
            Procedure::builder()
                .route(HttpMethod::Get, "/{id}")
                .handler(|input: Value, _, _| async move { Ok(input) }),
        )
        .nest("nested", Router::new().procedure("list", echo()))
        .prefix("/planets")
        .prefix("/api");

    let paths = router
        .procedures()
        .into_iter()
        .map(|(_, procedure)| procedure.contract().http_path().map(str::to_string))
        .collect::<Vec<_>>();

    assert_eq!(
        paths,
        vec![
            Some("/api/planets/{id}".to_string()),
            Some("/api/planets".to_string())
        ]
    );

    // Prefixing returns a new procedure
    let procedure = echo().prefix("/a");
    let prefixed = procedure.prefix("/b");
    assert_eq!(procedure.contract().http_path(), Some("/a"));
    assert_eq!(prefixed.contract().http_path(), Some("/b/a"));
}

#[tokio::test]
async fn test_serverless_and_compiled_handlers_agree() {
    let router = || {
        Router::new()
            .procedure("echo", echo())
            .procedure(
                "find",
                Procedure::builder()
                    .route(HttpMethod::Get, "/planets/{id}")
                    .handler(|input: Value, _, _| async move { Ok(input) }),
            )
            .procedure(
                "files",
                Procedure::builder()
                    .route(HttpMethod::Get, "/files/{rest*}")
                    .handler(|input: Value, _, _| async move { Ok(input) }),
            )
            .nest("nested", Router::new().procedure("keys", keys_procedure()))
    };

    let compiled = RouterHandler::new(router(), Config::new()).expect("router should build");
    let serverless =
        RouterHandler::new(router(), Config::new().serverless(true)).expect("router should build");

    let requests = [
        (HttpMethod::Post, "/echo"),
        (HttpMethod::Get, "/echo"),
        (HttpMethod::Get, "/planets/1"),
        (HttpMethod::Get, "/planets/1/moons"),
        (HttpMethod::Get, "/files"),
        (HttpMethod::Get, "/files/a/b/c"),
        (HttpMethod::Post, "/nested/keys"),
        (HttpMethod::Post, "/nested"),
        (HttpMethod::Delete, "/"),
    ];

    for (method, path) in requests {
        assert_eq!(
            request(&compiled, method, path, Value::Undefined).await,
            request(&serverless, method, path, Value::Undefined).await,
            "{method} {path}"
        );
    }

    assert_eq!(
        request(&compiled, HttpMethod::Get, "/files/a/b/c", Value::Undefined).await,
        Ok(Value::object([("rest", "a/b/c")]))
    );
}
