//! HTTP-level tests: real routes, SQLite in memory, JWT auth, and a CDN
//! stand-in that records nothing and answers with predictable URLs.

use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use rg_api::{configure_routes, LogMailer};
use rg_auth_jwt::JwtAuthProvider;
use rg_core::{AuthProvider, MediaStore, Role, StoredMedia, TokenScope, Transformation};
use rg_db_sqlite::SqliteRepo;
use rg_services::{ImageUpload, Ports, Services, SignupRequest};
use serde_json::{json, Value};

const PASSWORD: &str = "hunter22";

/// 1x1 transparent PNG.
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

struct FakeCdn;

#[async_trait]
impl MediaStore for FakeCdn {
    async fn save_upload(&self, _data: Vec<u8>, public_id: &str) -> anyhow::Result<StoredMedia> {
        Ok(StoredMedia {
            public_id: public_id.to_string(),
            version: Some("1".to_string()),
            secure_url: format!("https://cdn.test/v1/{public_id}"),
        })
    }

    async fn save_qr_code(&self, payload: &str, public_id: &str) -> anyhow::Result<StoredMedia> {
        self.save_upload(payload.as_bytes().to_vec(), public_id).await
    }

    fn get_url(&self, public_id: &str, version: Option<String>, t: &Transformation) -> String {
        let chain = match (t.width, t.effect.as_deref()) {
            (Some(w), _) => format!("w_{w}/"),
            (None, Some(e)) => format!("e_{e}/"),
            (None, None) => String::new(),
        };
        let version = version.map(|v| format!("v{v}/")).unwrap_or_default();
        format!("https://cdn.test/{chain}{version}{public_id}")
    }
}

struct Harness {
    services: Services,
    auth: Arc<JwtAuthProvider>,
}

impl Harness {
    async fn new() -> Self {
        let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
        let auth = Arc::new(JwtAuthProvider::new(b"api-test-secret", "HS256", 15, 7).unwrap());
        let ports = Ports {
            users: Arc::new(repo.clone()),
            images: Arc::new(repo.clone()),
            tags: Arc::new(repo.clone()),
            comments: Arc::new(repo.clone()),
            ratings: Arc::new(repo.clone()),
            messages: Arc::new(repo.clone()),
            transforms: Arc::new(repo),
            media: Arc::new(FakeCdn),
            auth: auth.clone(),
            mailer: Arc::new(LogMailer::new("http://gallery.test", "noreply@gallery.test")),
        };
        Harness {
            services: Services::new(ports, "gallery"),
            auth,
        }
    }

    fn data(&self) -> web::Data<Services> {
        web::Data::new(self.services.clone())
    }

    /// Signs up and confirms an account, returning its access token.
    async fn account(&self, name: &str) -> String {
        let email = format!("{name}@example.com");
        self.services
            .users
            .signup(SignupRequest {
                username: name.to_string(),
                email: email.clone(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap();
        let token = self.auth.issue_token(&email, TokenScope::EmailConfirmation).unwrap();
        self.services.users.confirm_email(&token).await.unwrap();
        self.services.users.login(&email, PASSWORD).await.unwrap().access_token
    }

    async fn image_of(&self, token: &str, name: &str, description: &str) -> i64 {
        let principal = self.services.users.authenticate(token).await.unwrap();
        self.services
            .images
            .upload(
                &principal,
                ImageUpload {
                    file_name: format!("{name}.png"),
                    data: PNG_1X1.to_vec(),
                    description: Some(description.to_string()),
                    tags: vec!["pets".to_string()],
                },
            )
            .await
            .unwrap()
            .item
            .id
    }
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_web::test]
async fn health_is_public() {
    let h = Harness::new().await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn signup_confirm_login_me() {
    let h = Harness::new().await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({"username": "alice", "email": "Alice@Example.com", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let login = || {
        test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", "alice@example.com"), ("password", PASSWORD)])
            .to_request()
    };
    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"success": false, "message": "Email not confirmed"}));

    let token = h
        .auth
        .issue_token("alice@example.com", TokenScope::EmailConfirmation)
        .unwrap();
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/auth/confirmed_email/{token}"))
            .to_request(),
    )
    .await;
    assert_eq!(body["message"], "Email confirmed");

    let pair: Value = test::call_and_read_body_json(&app, login()).await;
    assert_eq!(pair["token_type"], "bearer");
    let access = pair["access_token"].as_str().unwrap();

    let me: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/users/me").insert_header(bearer(access)).to_request(),
    )
    .await;
    assert_eq!(me["username"], "alice");
    // first account bootstraps the admin
    assert_eq!(me["role"], "admin");

    let refreshed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/auth/refresh_token")
            .insert_header(bearer(pair["refresh_token"].as_str().unwrap()))
            .to_request(),
    )
    .await;
    assert!(refreshed["access_token"].is_string());
}

#[actix_web::test]
async fn missing_or_bad_token_is_401() {
    let h = Harness::new().await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/images").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/images")
            .insert_header(bearer("not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn multipart_upload_caps_tags() {
    let h = Harness::new().await;
    let alice = h.account("alice").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let boundary = "XgalleryX";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"My Cat.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(PNG_1X1);
    body.extend_from_slice(
        format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n\
             sleepy cat\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\n\
             Cat, cat, sun, nap, home, fluff, extra\r\n--{boundary}--\r\n"
        )
        .as_bytes(),
    );

    let req = test::TestRequest::post()
        .uri("/images")
        .insert_header(bearer(&alice))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let image: Value = test::read_body_json(resp).await;

    assert_eq!(image["public_name"], "My_Cat");
    assert_eq!(image["public_id"], "gallery/My_Cat_alice");
    assert_eq!(image["url"], "https://cdn.test/w_250/v1/gallery/My_Cat_alice");
    assert_eq!(image["description"], "sleepy cat");
    let tags: Vec<&str> = image["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["cat", "sun", "nap", "home", "fluff"]);
    assert!(image["detail"].is_string());
}

#[actix_web::test]
async fn comment_moderation() {
    let h = Harness::new().await;
    let admin = h.account("root").await;
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let image_id = h.image_of(&alice, "cat", "a cat").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/comments")
            .insert_header(bearer(&bob))
            .set_json(json!({"image_id": image_id, "content": "lovely"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    let uri = format!("/comments/{}", comment["id"]);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&alice))
            .set_json(json!({"content": "rewritten"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // plain users cannot delete, even their own comment
    for token in [&alice, &bob] {
        let resp = test::call_service(
            &app,
            test::TestRequest::delete().uri(&uri).insert_header(bearer(token)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/access/role")
            .insert_header(bearer(&admin))
            .set_json(json!({"email": "alice@example.com", "role": "moderator"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&uri).insert_header(bearer(&alice)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(bearer(&bob)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn ratings_flow() {
    let h = Harness::new().await;
    let _admin = h.account("root").await;
    let alice = h.account("alice").await;
    let bob = h.account("bob").await;
    let carol = h.account("carol").await;
    let image_id = h.image_of(&alice, "cat", "a cat").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;
    let rate_uri = format!("/ratings/image/{image_id}");

    let rate = |token: &str, body: Value| {
        test::TestRequest::post()
            .uri(&rate_uri)
            .insert_header(bearer(token))
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, rate(alice.as_str(), json!({"five_stars": true}))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        rate(bob.as_str(), json!({"one_star": true, "two_stars": true})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, rate(bob.as_str(), json!({"two_stars": true}))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Value = test::read_body_json(resp).await;
    assert_eq!(first["two_stars"], true);
    assert_eq!(first["five_stars"], false);

    let resp = test::call_service(&app, rate(bob.as_str(), json!({"five_stars": true}))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let again: Value = test::read_body_json(resp).await;
    assert_eq!(again["id"], first["id"]);
    assert_eq!(again["two_stars"], true);
    assert_eq!(again["five_stars"], false);

    let resp = test::call_service(&app, rate(carol.as_str(), json!({"four_stars": true}))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let avg: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/ratings/image/{image_id}/average"))
            .insert_header(bearer(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(avg["average"], 3.0);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/ratings/image/999/average")
            .insert_header(bearer(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn tags_search_and_messages() {
    let h = Harness::new().await;
    let admin = h.account("root").await;
    let alice = h.account("alice").await;
    h.image_of(&alice, "cat", "sleepy cat on a sofa").await;
    h.image_of(&alice, "dog", "dog in the park").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/tags")
            .insert_header(bearer(&alice))
            .set_json(json!({"name": "Pets"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let found: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/find/words?words=sofa&sort=id")
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["public_name"], "cat");

    let found: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/find/tag?tag=PETS")
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(found.as_array().unwrap().len(), 2);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/messages")
            .insert_header(bearer(&admin))
            .set_json(json!({"receiver_email": "alice@example.com", "body": "welcome"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = test::read_body_json(resp).await;
    let uri = format!("/messages/{}", message["id"]);

    let inbox: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/messages").insert_header(bearer(&alice)).to_request(),
    )
    .await;
    assert_eq!(inbox[0]["body"], "welcome");

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&uri).insert_header(bearer(&admin)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&uri).insert_header(bearer(&alice)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn transformations_belong_to_their_owner() {
    let h = Harness::new().await;
    let admin = h.account("root").await;
    let alice = h.account("alice").await;
    let image_id = h.image_of(&alice, "cat", "a cat").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let create = |token: &str| {
        test::TestRequest::post()
            .uri("/transformations")
            .insert_header(bearer(token))
            .set_json(json!({"image_id": image_id, "settings": {"effect": "sepia"}}))
            .to_request()
    };

    let resp = test::call_service(&app, create(admin.as_str())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, create(alice.as_str())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let t: Value = test::read_body_json(resp).await;
    assert_eq!(t["transformed_url"], "https://cdn.test/e_sepia/gallery/cat_alice");
    assert!(t["qrcode_url"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.test/v1/gallery/qrcodes/cat_"));

    let uri = format!("/transformations/{}", t["id"]);
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(bearer(&admin)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let mine: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/transformations")
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn blocked_accounts_are_shut_out() {
    let h = Harness::new().await;
    let admin = h.account("root").await;
    let bob = h.account("bob").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/access/block_user")
            .insert_header(bearer(&bob))
            .set_json(json!({"email": "root@example.com"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let blocked: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri("/access/block_user")
            .insert_header(bearer(&admin))
            .set_json(json!({"email": "bob@example.com"}))
            .to_request(),
    )
    .await;
    assert_eq!(blocked["access"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/users/me").insert_header(bearer(&bob)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let user = h.services.users.authenticate(&admin).await.unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[actix_web::test]
async fn malformed_input_gets_json_errors() {
    let h = Harness::new().await;
    let alice = h.account("alice").await;
    let app = test::init_service(App::new().app_data(h.data()).configure(configure_routes)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/images/abc").insert_header(bearer(&alice)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/comments")
            .insert_header(bearer(&alice))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}
