//! End-to-end test of an application wired from the djutils crates.
//!
//! Tests the full flow: load settings -> obtain token -> download a CSV
//! export behind token authentication.

use std::sync::Arc;

use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::get;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use djutils::auth::backends::ModelBackend;
use djutils::auth::resolvers::{DirectResolver, InMemoryUserStore};
use djutils::auth::views::{token_router, AuthTokenSerializer};
use djutils::core::settings_loader::from_toml_str;
use djutils::prelude::*;

struct Invoice {
    number: String,
    total: String,
}

impl CsvExport for Invoice {
    fn csv_header() -> Vec<String> {
        vec!["number".into(), "total".into()]
    }

    fn csv_row(&self) -> Vec<String> {
        vec![self.number.clone(), self.total.clone()]
    }
}

async fn app() -> axum::Router {
    let settings = from_toml_str(
        r#"
        secret_key = "app-secret"

        [token_auth]
        max_age = 600
        "#,
    )
    .unwrap();

    let users = Arc::new(InMemoryUserStore::new());
    let mut alice = User::new(1, "alice");
    alice.set_password("pw").await.unwrap();
    users.add_user(alice).await;

    let auth = Arc::new(
        StatelessTokenAuthentication::from_settings(
            &settings,
            Arc::new(DirectResolver::new(users.clone())),
        )
        .unwrap(),
    );
    let serializer = AuthTokenSerializer::new(vec![Arc::new(ModelBackend::new(users))]);
    let view = ObtainStatelessAuthToken::for_authenticator(&auth, Arc::new(serializer));

    let export = move |req: Request<Body>| {
        let auth = auth.clone();
        async move {
            let (parts, _) = req.into_parts();
            let request = HttpRequest::from_axum(parts, Vec::new());
            match auth.authenticate(&request).await {
                Ok(Some(_)) => {
                    let invoices = [
                        Invoice { number: "INV-1".into(), total: "10.00".into() },
                        Invoice { number: "INV-2".into(), total: "1,000.00".into() },
                    ];
                    Invoice::write_csv_response("invoices.csv", &invoices).into_response()
                }
                Ok(None) => HttpResponse::unauthorized(
                    "Authentication credentials were not provided.",
                    auth.authenticate_header(),
                )
                .into_response(),
                Err(err) => err.to_response(auth.authenticate_header()).into_response(),
            }
        }
    };

    axum::Router::new()
        .nest("/api-token-auth", token_router(Arc::new(view)))
        .route("/invoices.csv", get(export))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_token_then_export() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/api-token-auth")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=alice&password=pw"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get("/invoices.csv")
                .header("authorization", format!("Token {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"invoices.csv\""
    );
    assert_eq!(
        body_string(response).await,
        "number,total\r\nINV-1,10.00\r\nINV-2,\"1,000.00\"\r\n"
    );
}

#[tokio::test]
async fn test_export_requires_token() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/invoices.csv").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Token");

    let response = app
        .oneshot(
            Request::get("/invoices.csv")
                .header("authorization", "Token forged:token:value")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["detail"], "Invalid credentials");
}
