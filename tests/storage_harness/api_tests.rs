//! Macro-generated HTTP tests running the whole application on a backend
//!
//! `api_tests!(factory)` builds a [`TestApp`](super::TestApp) on the
//! repositories returned by `$factory` and drives it through
//! `axum_test::TestServer`: envelopes, the auth gate, the category tree,
//! the catalog, orders, quotes, contact messages and uploads.

/// Generate the HTTP suite for a storage backend.
#[macro_export]
macro_rules! api_tests {
    ($factory:expr) => {
        mod api_integration_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::multipart::{MultipartForm, Part};
            use serde_json::{Value, json};
            use yooreed::storage::Repository as _;

            async fn app() -> TestApp {
                test_app($factory)
            }

            fn png_form(field: &str, names: &[&str]) -> MultipartForm {
                names.iter().fold(MultipartForm::new(), |form, name| {
                    form.add_part(
                        field.to_string(),
                        Part::bytes(vec![0x89, b'P', b'N', b'G'])
                            .file_name(name.to_string())
                            .mime_type("image/png"),
                    )
                })
            }

            // ==============================================================
            // Envelopes
            // ==============================================================

            #[tokio::test]
            async fn test_health() {
                let app = app().await;
                let response = app.server.get("/api/health").await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["status"], "OK");
                assert_eq!(body["message"], "Yooreed Event API is running");
                assert_eq!(body["storage"]["state"], "connected");
            }

            #[tokio::test]
            async fn test_debug_db_counts() {
                let app = app().await;
                let token = app.admin_token().await;
                app.create_product(&token, "Vase", 45.0, 3).await;

                let body: Value = app.server.get("/api/debug/db").await.json();
                assert_eq!(body["collections"]["products"]["total"], 1);
                assert_eq!(body["collections"]["products"]["sample"][0]["nom"], "Vase");
                assert_eq!(body["collections"]["categories"]["total"], 0);
            }

            #[tokio::test]
            async fn test_unknown_route_is_json_404() {
                let app = app().await;
                let response = app.server.get("/api/nope").expect_failure().await;
                response.assert_status(StatusCode::NOT_FOUND);

                let body: Value = response.json();
                assert_eq!(body["success"], false);
                assert_eq!(body["error"]["message"], "Route not found");
            }

            #[tokio::test]
            async fn test_security_headers_present() {
                let app = app().await;
                let response = app.server.get("/api/health").await;
                assert_eq!(response.header("x-content-type-options"), "nosniff");
                assert_eq!(response.header("x-frame-options"), "SAMEORIGIN");
            }

            // ==============================================================
            // Auth gate
            // ==============================================================

            #[tokio::test]
            async fn test_admin_route_without_token() {
                let app = app().await;
                let response = app
                    .server
                    .post("/api/products")
                    .json(&product_payload("Vase", 45.0, 3))
                    .expect_failure()
                    .await;
                response.assert_status(StatusCode::UNAUTHORIZED);

                let body: Value = response.json();
                assert_eq!(body["error"]["message"], "Token d'authentification manquant");
                assert_eq!(body["error"]["code"], "MISSING_TOKEN");
            }

            #[tokio::test]
            async fn test_admin_route_with_bad_token() {
                let app = app().await;
                let response = app
                    .server
                    .get("/api/orders")
                    .authorization_bearer("not.a.token")
                    .expect_failure()
                    .await;
                response.assert_status(StatusCode::UNAUTHORIZED);
                let body: Value = response.json();
                assert_eq!(body["error"]["message"], "Token invalide");
            }

            #[tokio::test]
            async fn test_token_of_deleted_admin() {
                let app = app().await;
                let token = app.admin_token().await;
                let me: Value = app
                    .server
                    .get("/api/auth/me")
                    .authorization_bearer(&token)
                    .await
                    .json();
                let id: uuid::Uuid = me["data"]["admin"]["id"].as_str().unwrap().parse().unwrap();
                app.state.repositories.admins.delete_by_id(&id).await.unwrap();

                let response = app
                    .server
                    .get("/api/auth/me")
                    .authorization_bearer(&token)
                    .expect_failure()
                    .await;
                response.assert_status(StatusCode::UNAUTHORIZED);
                let body: Value = response.json();
                assert_eq!(body["error"]["message"], "Admin non trouvé");
            }

            #[tokio::test]
            async fn test_login_me_and_password_change() {
                let app = app().await;
                app.create_admin("Alice", yooreed::core::auth::Role::SuperAdmin).await;

                let wrong = app
                    .server
                    .post("/api/auth/login")
                    .json(&json!({ "username": "alice", "password": "nope" }))
                    .expect_failure()
                    .await;
                wrong.assert_status(StatusCode::UNAUTHORIZED);
                let body: Value = wrong.json();
                assert_eq!(body["error"]["message"], "Identifiants invalides");

                let login = app
                    .server
                    .post("/api/auth/login")
                    .json(&json!({ "username": "ALICE", "password": ADMIN_PASSWORD }))
                    .await;
                login.assert_status_ok();
                let body: Value = login.json();
                let token = body["data"]["token"].as_str().unwrap().to_string();
                assert_eq!(body["data"]["admin"]["role"], "super_admin");
                assert!(body["data"]["admin"].get("passwordHash").is_none());

                let me: Value = app
                    .server
                    .get("/api/auth/me")
                    .authorization_bearer(&token)
                    .await
                    .json();
                assert_eq!(me["data"]["admin"]["username"], "alice");
                assert_eq!(me["data"]["admin"]["pays"], "Tunisie");
                assert!(!me["data"]["admin"]["lastLogin"].is_null());
                assert!(!me.to_string().contains("argon2"));

                let short = app
                    .server
                    .put("/api/auth/password")
                    .authorization_bearer(&token)
                    .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "abc" }))
                    .expect_failure()
                    .await;
                short.assert_status(StatusCode::BAD_REQUEST);

                let changed = app
                    .server
                    .put("/api/auth/password")
                    .authorization_bearer(&token)
                    .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "battery-staple" }))
                    .await;
                changed.assert_status_ok();

                app.server
                    .post("/api/auth/login")
                    .json(&json!({ "username": "alice", "password": "battery-staple" }))
                    .await
                    .assert_status_ok();

                let logout: Value = app
                    .server
                    .post("/api/auth/logout")
                    .authorization_bearer(&token)
                    .await
                    .json();
                assert_eq!(logout["message"], "Déconnexion réussie");
            }

            #[tokio::test]
            async fn test_login_attempts_are_rate_limited() {
                let app = test_app_with($factory, |config| config.rate_limit.login_max = 3);
                app.create_admin("alice", yooreed::core::auth::Role::Admin).await;

                let mut statuses = Vec::new();
                for _ in 0..4 {
                    let response = app
                        .server
                        .post("/api/auth/login")
                        .json(&json!({ "username": "alice", "password": "nope" }))
                        .expect_failure()
                        .await;
                    statuses.push(response.status_code());
                }
                assert_eq!(
                    statuses,
                    vec![
                        StatusCode::UNAUTHORIZED,
                        StatusCode::UNAUTHORIZED,
                        StatusCode::UNAUTHORIZED,
                        StatusCode::TOO_MANY_REQUESTS,
                    ]
                );

                let limited = app
                    .server
                    .post("/api/auth/login")
                    .json(&json!({ "username": "alice", "password": ADMIN_PASSWORD }))
                    .expect_failure()
                    .await;
                limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
                let body: Value = limited.json();
                assert_eq!(body["success"], false);
                assert_eq!(body["error"]["code"], "RATE_LIMITED");
                assert_eq!(
                    body["error"]["message"],
                    "Trop de tentatives de connexion. Veuillez réessayer dans 15 minutes."
                );

                app.server.get("/api/health").await.assert_status_ok();
            }

            #[tokio::test]
            async fn test_api_requests_are_rate_limited_per_client() {
                let app = test_app_with($factory, |config| config.rate_limit.api_max = 2);

                for _ in 0..2 {
                    app.server
                        .get("/api/products")
                        .add_header("x-forwarded-for", "203.0.113.7")
                        .await
                        .assert_status_ok();
                }
                let limited = app
                    .server
                    .get("/api/products")
                    .add_header("x-forwarded-for", "203.0.113.7")
                    .expect_failure()
                    .await;
                limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
                let body: Value = limited.json();
                assert_eq!(body["error"]["code"], "RATE_LIMITED");

                app.server
                    .get("/api/products")
                    .add_header("x-forwarded-for", "198.51.100.9")
                    .await
                    .assert_status_ok();
            }

            #[tokio::test]
            async fn test_profile_update() {
                let app = app().await;
                let token = app.admin_token().await;

                let body: Value = app
                    .server
                    .put("/api/auth/profile")
                    .authorization_bearer(&token)
                    .json(&json!({ "nomComplet": "Alice Martin", "ville": "Sousse" }))
                    .await
                    .json();
                assert_eq!(body["data"]["admin"]["nomComplet"], "Alice Martin");
                assert_eq!(body["data"]["admin"]["ville"], "Sousse");
            }

            // ==============================================================
            // Categories
            // ==============================================================

            #[tokio::test]
            async fn test_category_tree_end_to_end() {
                let app = app().await;
                let token = app.admin_token().await;

                let vases: Value = app
                    .server
                    .post("/api/categories")
                    .authorization_bearer(&token)
                    .json(&json!({ "nom": "Vases" }))
                    .await
                    .json();
                let vases = &vases["data"]["category"];
                assert_eq!(vases["slug"], "vases");

                let child = app
                    .server
                    .post("/api/categories")
                    .authorization_bearer(&token)
                    .json(&json!({ "nom": "Vases en verre", "parentId": vases["id"] }))
                    .await;
                child.assert_status(StatusCode::CREATED);

                let tree: Value = app.server.get("/api/categories").await.json();
                let roots = tree["data"]["categories"].as_array().unwrap();
                assert_eq!(roots.len(), 1);
                assert_eq!(roots[0]["nom"], "Vases");
                assert_eq!(roots[0]["children"].as_array().unwrap().len(), 1);
                assert_eq!(roots[0]["children"][0]["slug"], "vases-en-verre");
                assert_eq!(tree["data"]["flat"].as_array().unwrap().len(), 2);

                let duplicate = app
                    .server
                    .post("/api/categories")
                    .authorization_bearer(&token)
                    .json(&json!({ "nom": "Vases" }))
                    .expect_failure()
                    .await;
                duplicate.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = duplicate.json();
                assert_eq!(body["error"]["message"], "Une catégorie avec ce nom existe déjà");

                let delete_parent = app
                    .server
                    .delete(&format!("/api/categories/{}", vases["id"].as_str().unwrap()))
                    .authorization_bearer(&token)
                    .expect_failure()
                    .await;
                delete_parent.assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_category_unknown_parent() {
                let app = app().await;
                let token = app.admin_token().await;
                let response = app
                    .server
                    .post("/api/categories")
                    .authorization_bearer(&token)
                    .json(&json!({ "nom": "Orpheline", "parentId": uuid::Uuid::new_v4() }))
                    .expect_failure()
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["error"]["message"], "Catégorie parente non trouvée");
            }

            // ==============================================================
            // Products
            // ==============================================================

            #[tokio::test]
            async fn test_product_crud() {
                let app = app().await;
                let token = app.admin_token().await;
                let bougie = app.create_product(&token, "Bougie", 12.0, 5).await;
                let vase = app.create_product(&token, "Vase en verre", 45.0, 3).await;
                let vase_id = vase["id"].as_str().unwrap().to_string();
                assert_eq!(vase["delaiLivraison"], "Sur demande");

                let updated = app
                    .server
                    .put(&format!("/api/products/{}", vase_id))
                    .authorization_bearer(&token)
                    .json(&json!({ "prix": 50.0, "recommandations": [bougie["id"]] }))
                    .await;
                updated.assert_status_ok();

                let fetched: Value = app
                    .server
                    .get(&format!("/api/products/{}", vase_id))
                    .await
                    .json();
                let product = &fetched["data"]["product"];
                assert_eq!(product["prix"], 50.0);
                assert_eq!(product["recommandations"][0]["nom"], "Bougie");

                let search: Value = app
                    .server
                    .get("/api/products")
                    .add_query_param("search", "VERRE")
                    .await
                    .json();
                assert_eq!(search["data"]["pagination"]["total"], 1);
                assert_eq!(search["data"]["products"][0]["nom"], "Vase en verre");

                let by_category: Value = app
                    .server
                    .get("/api/products/category/decoration")
                    .await
                    .json();
                assert_eq!(by_category["data"]["products"].as_array().unwrap().len(), 2);

                app.server
                    .delete(&format!("/api/products/{}", vase_id))
                    .authorization_bearer(&token)
                    .await
                    .assert_status_ok();
                let gone = app
                    .server
                    .get(&format!("/api/products/{}", vase_id))
                    .expect_failure()
                    .await;
                gone.assert_status(StatusCode::NOT_FOUND);
                let body: Value = gone.json();
                assert_eq!(body["error"]["message"], "Produit non trouvé");
            }

            #[tokio::test]
            async fn test_page_far_past_the_end() {
                let app = app().await;
                let token = app.admin_token().await;
                app.create_product(&token, "Vase", 45.0, 3).await;

                let response = app
                    .server
                    .get("/api/products")
                    .add_query_param("page", u64::MAX.to_string())
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert!(body["data"]["products"].as_array().unwrap().is_empty());
                assert_eq!(body["data"]["pagination"]["total"], 1);
            }

            #[tokio::test]
            async fn test_product_validation() {
                let app = app().await;
                let token = app.admin_token().await;
                let response = app
                    .server
                    .post("/api/products")
                    .authorization_bearer(&token)
                    .json(&json!({ "nom": "Vase", "prix": -1 }))
                    .expect_failure()
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            }

            #[tokio::test]
            async fn test_invalid_id_is_bad_request() {
                let app = app().await;
                app.server
                    .get("/api/products/not-a-uuid")
                    .expect_failure()
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Orders
            // ==============================================================

            #[tokio::test]
            async fn test_order_flow() {
                let app = app().await;
                let token = app.admin_token().await;
                let vase = app.create_product(&token, "Vase", 45.0, 5).await;

                let created = app
                    .server
                    .post("/api/orders")
                    .json(&json!({
                        "client": client_payload(),
                        "produits": [{ "produitId": vase["id"], "quantite": 2 }],
                        "instructions": "Livrer le matin",
                    }))
                    .await;
                created.assert_status(StatusCode::CREATED);
                let body: Value = created.json();
                let order = &body["data"]["order"];

                let code = order["numeroCommande"].as_str().unwrap();
                let pattern = regex::Regex::new(r"^CMD-\d{13}-000001$").unwrap();
                assert!(pattern.is_match(code), "unexpected code {}", code);
                assert_eq!(order["total"], 90.0);
                assert_eq!(order["statut"], "en_attente");
                assert_eq!(order["client"]["email"], "alice@example.com");
                assert_eq!(order["produits"][0]["produitId"]["nom"], "Vase");
                assert_eq!(order["produits"][0]["prixUnitaire"], 45.0);

                let sent = app.outbox.sent();
                assert_eq!(sent.len(), 1);
                assert_eq!(sent[0].to, "alice@example.com");
                assert!(sent[0].html.contains(code));

                let order_id = order["id"].as_str().unwrap().to_string();
                let invalid = app
                    .server
                    .put(&format!("/api/orders/{}/status", order_id))
                    .authorization_bearer(&token)
                    .json(&json!({ "statut": "perdue" }))
                    .expect_failure()
                    .await;
                invalid.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = invalid.json();
                assert_eq!(body["error"]["message"], "Statut invalide");

                let shipped: Value = app
                    .server
                    .put(&format!("/api/orders/{}/status", order_id))
                    .authorization_bearer(&token)
                    .json(&json!({ "statut": "expediee" }))
                    .await
                    .json();
                assert_eq!(shipped["data"]["order"]["statut"], "expediee");
                assert_eq!(app.outbox.sent().len(), 2);

                let list: Value = app
                    .server
                    .get("/api/orders")
                    .authorization_bearer(&token)
                    .add_query_param("statut", "expediee")
                    .await
                    .json();
                assert_eq!(list["data"]["pagination"]["total"], 1);
                assert_eq!(list["data"]["orders"][0]["numeroCommande"], code);
            }

            #[tokio::test]
            async fn test_order_rejections() {
                let app = app().await;
                let token = app.admin_token().await;
                let vase = app.create_product(&token, "Vase", 45.0, 1).await;

                let too_many = app
                    .server
                    .post("/api/orders")
                    .json(&json!({
                        "client": client_payload(),
                        "produits": [{ "produitId": vase["id"], "quantite": 3 }],
                    }))
                    .expect_failure()
                    .await;
                too_many.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = too_many.json();
                assert_eq!(body["error"]["message"], "Stock insuffisant pour Vase");

                let unknown = uuid::Uuid::new_v4();
                let missing = app
                    .server
                    .post("/api/orders")
                    .json(&json!({
                        "client": client_payload(),
                        "produits": [{ "produitId": unknown, "quantite": 1 }],
                    }))
                    .expect_failure()
                    .await;
                missing.assert_status(StatusCode::NOT_FOUND);
                let body: Value = missing.json();
                assert_eq!(body["error"]["message"], format!("Produit {} non trouvé", unknown));

                let empty = app
                    .server
                    .post("/api/orders")
                    .json(&json!({ "client": client_payload(), "produits": [] }))
                    .expect_failure()
                    .await;
                empty.assert_status(StatusCode::BAD_REQUEST);

                assert!(app.outbox.sent().is_empty());
            }

            // ==============================================================
            // Quotes
            // ==============================================================

            #[tokio::test]
            async fn test_quote_flow() {
                let app = app().await;
                let token = app.admin_token().await;
                let vase = app.create_product(&token, "Vase", 45.0, 0).await;

                let created = app
                    .server
                    .post("/api/quotes")
                    .json(&json!({
                        "client": client_payload(),
                        "produits": [{ "produitId": vase["id"], "besoinsSpecifiques": "Gravure" }],
                    }))
                    .await;
                created.assert_status(StatusCode::CREATED);
                let body: Value = created.json();
                let quote = &body["data"]["quote"];
                assert!(quote["numeroDevis"].as_str().unwrap().starts_with("DEV-"));
                assert_eq!(quote["produits"][0]["quantite"], 1);
                assert_eq!(quote["statut"], "en_cours");
                assert_eq!(app.outbox.sent().len(), 1);

                let processed: Value = app
                    .server
                    .put(&format!("/api/quotes/{}/status", quote["id"].as_str().unwrap()))
                    .authorization_bearer(&token)
                    .json(&json!({ "statut": "traite", "notes": "Envoyé par email" }))
                    .await
                    .json();
                assert_eq!(processed["data"]["quote"]["statut"], "traite");
                assert_eq!(processed["data"]["quote"]["notes"], "Envoyé par email");
            }

            // ==============================================================
            // Contact
            // ==============================================================

            #[tokio::test]
            async fn test_contact_message() {
                let app = app().await;
                let response = app
                    .server
                    .post("/api/contact")
                    .json(&json!({
                        "nom": "Alice",
                        "email": "alice@example.com",
                        "message": "Bonjour, je voudrais un devis.",
                    }))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["message"], "Message envoyé avec succès");

                let recipients: Vec<String> = app.outbox.sent().into_iter().map(|e| e.to).collect();
                assert!(recipients.contains(&"alice@example.com".to_string()));
                assert!(recipients.contains(&"contact@yooreed-event.com".to_string()));

                app.server
                    .post("/api/contact")
                    .json(&json!({ "nom": "Alice", "email": "nope", "message": "x" }))
                    .expect_failure()
                    .await
                    .assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Uploads
            // ==============================================================

            #[tokio::test]
            async fn test_upload_image() {
                let app = app().await;
                let token = app.admin_token().await;

                let response = app
                    .server
                    .post("/api/upload/image")
                    .authorization_bearer(&token)
                    .multipart(png_form("image", &["photo.png"]))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert!(body["data"]["url"].as_str().unwrap().starts_with("memory://image/"));
                assert!(body["data"]["publicId"].as_str().is_some());
                assert_eq!(app.media.stored(), vec!["photo.png".to_string()]);
            }

            #[tokio::test]
            async fn test_upload_many_images() {
                let app = app().await;
                let token = app.admin_token().await;

                let body: Value = app
                    .server
                    .post("/api/upload/images")
                    .authorization_bearer(&token)
                    .multipart(png_form("images", &["a.png", "b.png", "c.png"]))
                    .await
                    .json();
                assert_eq!(body["data"]["files"].as_array().unwrap().len(), 3);
            }

            #[tokio::test]
            async fn test_upload_rejections() {
                let app = app().await;
                let token = app.admin_token().await;

                let wrong_type = app
                    .server
                    .post("/api/upload/image")
                    .authorization_bearer(&token)
                    .multipart(MultipartForm::new().add_part(
                        "image",
                        Part::bytes(b"#!/bin/sh".to_vec())
                            .file_name("script.sh")
                            .mime_type("text/x-shellscript"),
                    ))
                    .expect_failure()
                    .await;
                wrong_type.assert_status(StatusCode::BAD_REQUEST);

                let no_file = app
                    .server
                    .post("/api/upload/video")
                    .authorization_bearer(&token)
                    .multipart(png_form("image", &["photo.png"]))
                    .expect_failure()
                    .await;
                no_file.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = no_file.json();
                assert_eq!(body["error"]["message"], "Aucun fichier uploadé");

                app.server
                    .post("/api/upload/image")
                    .multipart(png_form("image", &["photo.png"]))
                    .expect_failure()
                    .await
                    .assert_status(StatusCode::UNAUTHORIZED);

                assert!(app.media.stored().is_empty());
            }
        }
    };
}
