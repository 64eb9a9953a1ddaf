use problemkit::axum::{
    body::{Body, to_bytes},
    http::{HeaderMap, Request, header},
    routing::get,
};
use problemkit::prelude::*;
use problemkit::response::{decode_json, decode_xml};
use tower::ServiceExt;

#[derive(Debug, thiserror::Error, Exception)]
#[error("there is no Dana")]
struct ZuulException;

#[derive(Debug, thiserror::Error, Exception)]
#[error("the river of slime is rising")]
struct SlimeOverflow;

async fn zuul() -> RaisedResult<&'static str> {
    Err(ZuulException.into())
}

async fn slime() -> RaisedResult<&'static str> {
    Err(SlimeOverflow.into())
}

/// Only speaks `text/plain`.
async fn plain(headers: HeaderMap) -> RaisedResult<String> {
    let accept = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok());
    require_acceptable(accept, &[TEXT_PLAIN])?;
    Ok("Who you gonna call?".to_string())
}

fn app() -> Router {
    // Resolution logs show up with --nocapture.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let resolver = Arc::new(
        ExceptionResolver::builder()
            .register_fn::<ZuulException, _>(|_, _| {
                ErrorResponse::builder(StatusCode::NOT_FOUND).title("There's no Dana, only Zuul!")
            })
            .register_fn::<SlimeOverflow, _>(|_, _| {
                ErrorResponse::builder(StatusCode::INSUFFICIENT_STORAGE)
            })
            .build()
            .unwrap(),
    );

    let local = OperationHandlers::builder("GET /museum")
        .register_fn::<SlimeOverflow, _>(|_, _| {
            ErrorResponse::builder(StatusCode::LOCKED).title("Vigo is awake")
        })
        .build()
        .unwrap();

    Router::new()
        .route("/zuul", get(zuul))
        .route("/plain", get(plain))
        .route("/sewer", get(slime))
        .route(
            "/museum",
            get(slime).layer(ExceptionLayer::new(resolver.clone()).with_operation(local)),
        )
        .layer(ExceptionLayer::new(resolver).translate_router_errors(true))
}

async fn send(uri: &str, accept: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(accept) = accept {
        request = request.header(header::ACCEPT, accept);
    }
    app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn content_type(response: &Response) -> &str {
    response.headers()[header::CONTENT_TYPE].to_str().unwrap()
}

#[tokio::test]
async fn zuul_renders_as_xml() {
    let response = send("/zuul", Some("application/xml")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "application/xml; charset=utf-8");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        decode_xml(&body).unwrap().title(),
        "There's no Dana, only Zuul!"
    );
}

#[tokio::test]
async fn plain_resource_serves_plain_text() {
    let response = send("/plain", Some("text/plain")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn plain_resource_rejects_json_with_406() {
    let response = send("/plain", Some("application/json")).await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(content_type(&response), "application/json; charset=utf-8");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = decode_json(&body).unwrap();
    assert_eq!(body.title(), "Not Acceptable");
    assert_eq!(
        body.detail(),
        Some(
            "The resource cannot produce any of the requested media types. Supported media types: text/plain"
        )
    );
}

#[tokio::test]
async fn not_acceptable_is_rendered_in_default_type() {
    let resolver = ExceptionResolver::builder()
        .default_content_type(APPLICATION_XML)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/plain", get(plain))
        .layer(ExceptionLayer::new(Arc::new(resolver)));

    let response = app
        .oneshot(
            Request::get("/plain")
                .header(header::ACCEPT, "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(content_type(&response), "application/xml; charset=utf-8");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(decode_xml(&body).unwrap().title(), "Not Acceptable");
}

#[tokio::test]
async fn missing_accept_uses_default_content_type() {
    let response = send("/zuul", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "application/json; charset=utf-8");
}

#[tokio::test]
async fn route_local_handlers_take_priority() {
    let response = send("/museum", None).await;
    assert_eq!(response.status(), StatusCode::LOCKED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(decode_json(&body).unwrap().title(), "Vigo is awake");

    let response = send("/sewer", None).await;
    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
}

#[tokio::test]
async fn unknown_route_is_rendered() {
    let response = send("/firehouse", Some("application/problem+json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        content_type(&response),
        "application/problem+json; charset=utf-8"
    );
}
