use rspc_contract::{
    matcher::{CompiledMatcher, LinearMatcher, Matcher},
    HttpMethod,
};

const ROUTES: &[(HttpMethod, &str)] = &[
    (HttpMethod::Get, "/"),
    (HttpMethod::Get, "/users"),
    (HttpMethod::Get, "/users/{id}"),
    (HttpMethod::Get, "/users/me"),
    (HttpMethod::Post, "/users/{id}"),
    (HttpMethod::Get, "/users/{id}/posts/{post}"),
    (HttpMethod::Get, "/users/{id}/{rest*}"),
    (HttpMethod::Get, "/static/*"),
    (HttpMethod::Delete, "/users/{id}"),
    (HttpMethod::Get, "/{slug}"),
];

const REQUESTS: &[(HttpMethod, &str)] = &[
    (HttpMethod::Get, "/"),
    (HttpMethod::Get, ""),
    (HttpMethod::Get, "/users"),
    (HttpMethod::Get, "/users/"),
    (HttpMethod::Get, "/users/me"),
    (HttpMethod::Get, "/users/42"),
    (HttpMethod::Post, "/users/42"),
    (HttpMethod::Put, "/users/42"),
    (HttpMethod::Get, "/users/42/posts/7"),
    (HttpMethod::Get, "/users/42/posts"),
    (HttpMethod::Get, "/users/42/likes/a/b"),
    (HttpMethod::Get, "/static"),
    (HttpMethod::Get, "/static/css/site.css"),
    (HttpMethod::Delete, "/users/42"),
    (HttpMethod::Delete, "/users"),
    (HttpMethod::Get, "/about"),
    (HttpMethod::Get, "/about/team"),
    (HttpMethod::Patch, "/"),
];

fn build<M: Matcher<usize> + Default>() -> M {
    let mut matcher = M::default();
    for (i, (method, path)) in ROUTES.iter().enumerate() {
        matcher.add(*method, path, i).expect("valid route");
    }
    matcher
}

#[test]
fn test_linear_and_compiled_matchers_agree() {
    let linear = build::<LinearMatcher<usize>>();
    let compiled = build::<CompiledMatcher<usize>>();

    for (method, path) in REQUESTS {
        let expected = linear.find(*method, path).map(|(i, p)| (*i, p));
        let actual = compiled.find(*method, path).map(|(i, p)| (*i, p));
        assert_eq!(expected, actual, "{method} {path}");
    }
}

#[test]
fn test_matched_routes() {
    let matcher = build::<CompiledMatcher<usize>>();
    let find = |method, path| {
        matcher.find(method, path).map(|(i, params)| {
            (
                *i,
                params
                    .into_iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>(),
            )
        })
    };

    assert_eq!(find(HttpMethod::Get, ""), Some((0, vec![])));
    assert_eq!(find(HttpMethod::Get, "/users/"), Some((1, vec![])));
    // Registered before `/users/me`
    assert_eq!(find(HttpMethod::Get, "/users/me"), Some((2, vec!["id=me".into()])));
    assert_eq!(find(HttpMethod::Post, "/users/42"), Some((4, vec!["id=42".into()])));
    assert_eq!(
        find(HttpMethod::Get, "/users/42/posts/7"),
        Some((5, vec!["id=42".into(), "post=7".into()]))
    );
    assert_eq!(
        find(HttpMethod::Get, "/users/42/posts"),
        Some((6, vec!["id=42".into(), "rest=posts".into()]))
    );
    assert_eq!(find(HttpMethod::Get, "/static"), Some((7, vec![])));
    assert_eq!(find(HttpMethod::Get, "/about"), Some((9, vec!["slug=about".into()])));
    assert_eq!(find(HttpMethod::Get, "/about/team"), None);
    assert_eq!(find(HttpMethod::Put, "/users/42"), None);
}
