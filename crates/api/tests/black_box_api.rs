use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

use autoproposal_api::app::{build_router, services::Services};
use autoproposal_infra::InMemoryRecordStore;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let store = Arc::new(InMemoryRecordStore::new());
        let app = build_router(Arc::new(Services::new(store)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn patch(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .patch(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Seed {
    company_id: String,
    client_id: String,
    user_id: String,
}

async fn seed(srv: &TestServer, access_end_date: Option<String>) -> Seed {
    let (status, company) = srv.post("/companies", json!({ "name": "Acme Interiors" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let company_id = company["id"].as_str().unwrap().to_string();

    let (status, user) = srv
        .post(
            "/users",
            json!({
                "company_id": company_id,
                "full_name": "Sam Sales",
                "email": "sam@acme.com",
                "access_end_date": access_end_date,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, client) = srv
        .post("/clients", json!({ "company_id": company_id, "name": "Jane Client" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let client_id = client["id"].as_str().unwrap().to_string();

    Seed {
        company_id,
        client_id,
        user_id,
    }
}

fn login_body(company: &str, email: &str, password: &str) -> Value {
    json!({ "company_name": company, "email": email, "password": password })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_flow_reports_each_failure_code() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    let (status, body) = srv.post("/auth/login", login_body("Nope", "sam@acme.com", "pw")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "INVALID_COMPANY");
    assert_eq!(body["success"], false);

    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "ghost@acme.com", "pw"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "INVALID_USER");

    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "pw"))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "NO_PASSWORD");

    let (status, body) = srv
        .post(
            &format!("/auth/set-password/{}", s.user_id),
            json!({ "password": "s3cret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password set successfully for user sam@acme.com");

    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "wrong"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "INVALID_PASSWORD");

    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "s3cret"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], s.user_id.as_str());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_mismatch_and_expiry() {
    let srv = TestServer::spawn().await;
    let yesterday = (Utc::now().date_naive() - ChronoDuration::days(1)).to_string();
    let s = seed(&srv, Some(yesterday)).await;
    srv.post(
        &format!("/auth/set-password/{}", s.user_id),
        json!({ "password": "pw" }),
    )
    .await;

    let (status, _) = srv.post("/companies", json!({ "name": "Globex" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.post("/auth/login", login_body("Globex", "sam@acme.com", "pw")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "COMPANY_MISMATCH");

    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "pw"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "ACCESS_EXPIRED");
}

#[tokio::test]
async fn set_password_rejects_bad_input() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    let (status, body) = srv
        .post(&format!("/auth/set-password/{}", s.user_id), json!({ "password": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post("/auth/set-password/not-a-uuid", json!({ "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn duplicate_user_email_conflicts() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;
    let (status, body) = srv
        .post(
            "/users",
            json!({ "company_id": s.company_id, "full_name": "Dup", "email": "sam@acme.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn proposal_lifecycle_with_item_reconciliation() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    // Create with two items.
    let (status, created) = srv
        .post(
            "/proposals",
            json!({
                "company_id": s.company_id,
                "client_id": s.client_id,
                "title": "Kitchen remodel",
                "project_type": "Residential",
                "items": [
                    { "name": "Flooring", "quantity": 2, "unit_price": 10 },
                    { "name": "Paint", "quantity": 1, "unit_price": 5 },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["proposal"]["status"], "Draft");
    let pid = created["proposal"]["id"].as_str().unwrap().to_string();
    let flooring = created["items"][0]["id"].as_str().unwrap().to_string();

    // Edit: update flooring, add lighting, drop paint, one bad line.
    let (status, outcome) = srv
        .put(
            &format!("/proposals/{pid}/items"),
            json!({
                "items": [
                    { "id": flooring, "name": "Flooring", "quantity": 3, "unit_price": 10 },
                    { "name": "Lighting", "quantity": 1, "unit_price": 20 },
                    { "name": "Broken", "quantity": 1, "unit_price": -5 },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["updated"], 1);
    assert_eq!(outcome["created"], 1);
    assert_eq!(outcome["deleted"], 1);
    assert_eq!(outcome["failures"][0]["error"], "InvalidItemValue");
    assert_eq!(outcome["failures"][0]["index"], 2);

    let (status, listed) = srv.get(&format!("/proposals/{pid}/items")).await;
    assert_eq!(status, StatusCode::OK);
    let totals: Vec<f64> = listed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["total"].as_f64().unwrap())
        .collect();
    assert_eq!(totals, vec![30.0, 20.0]);

    // Status transitions.
    let (status, body) = srv.patch(&format!("/proposals/{pid}/status/Sent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Sent");

    let (status, body) = srv.patch(&format!("/proposals/{pid}/status/Archived")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Invalid status. Must be one of: Draft, Sent, Approved, Rejected")
    );

    // Listing with status filter.
    let (status, body) = srv
        .get(&format!("/proposals/company/{}?status=Sent", s.company_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = srv
        .get(&format!("/proposals/company/{}?status=Draft", s.company_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reconcile_unknown_proposal_is_404() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .put(
            "/proposals/01890a5d-ac96-774b-bcce-b302099a8057/items",
            json!({ "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "proposal_not_found");
}

#[tokio::test]
async fn boq_import_list_and_project_types() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    let (status, body) = srv
        .post(
            "/boq-items/import",
            json!({
                "company_id": s.company_id,
                "rows": [
                    { "project_type": "Residential", "description": "Vitrified tiles", "unit": "sqft", "basic_rate": 45.0 },
                    { "project_type": "Commercial", "description": "Gypsum ceiling", "premium_rate": 95.0 },
                    { "project_type": "Commercial", "title": "No rates", "description": "Skipped" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_imported"], 2);
    assert_eq!(body["skipped"][0]["row"], 3);

    let (status, types) = srv
        .get(&format!("/boq-items/project-types/{}", s.company_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(types, json!(["Commercial", "Residential"]));

    let (status, body) = srv
        .get(&format!("/boq-items?company_id={}&project_type=Commercial", s.company_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["premium_rate"], 95.0);
}

async fn create_proposal(srv: &TestServer, s: &Seed, title: &str) -> String {
    let (status, created) = srv
        .post(
            "/proposals",
            json!({ "company_id": s.company_id, "client_id": s.client_id, "title": title }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    created["proposal"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn malformed_items_fail_individually() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;
    let pid = create_proposal(&srv, &s, "Lobby").await;

    let (status, body) = srv
        .put(
            &format!("/proposals/{pid}/items"),
            json!({ "items": [
                { "name": "Tiles", "quantity": 2, "unit_price": 10 },
                { "quantity": 1, "unit_price": 2 },
                { "name": "Grout", "quantity": "abc", "unit_price": 3 },
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 1);
    let failures = body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["index"], 1);
    assert_eq!(failures[1]["index"], 2);
    assert!(failures.iter().all(|f| f["error"] == "InvalidItemValue"));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["total"], 20.0);

    let (status, body) = srv
        .put(
            &format!("/proposals/{pid}/items"),
            json!({ "items": [{ "name": "Huge", "quantity": 1e200, "unit_price": 1e200 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failures"][0]["error"], "InvalidItemValue");
    assert_eq!(body["created"], 0);
}

#[tokio::test]
async fn user_edit_and_activation() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;
    srv.post(
        &format!("/auth/set-password/{}", s.user_id),
        json!({ "password": "pw" }),
    )
    .await;
    let user_path = format!("/users/{}", s.user_id);

    let (status, body) = srv.patch(&format!("{user_path}/deactivate")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["active"], false);
    let (status, body) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "pw"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "ACCOUNT_INACTIVE");

    let (status, _) = srv.patch(&format!("{user_path}/activate")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .put(&user_path, json!({ "full_name": "Sam Senior", "designation": "Lead" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Sam Senior");
    assert_eq!(body["email"], "sam@acme.com");
    assert_eq!(body["has_password"], true);

    let (status, body) = srv.get(&user_path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["designation"], "Lead");

    let (status, body) = srv.put(&user_path, json!({ "email": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .post("/auth/login", login_body("Acme Interiors", "sam@acme.com", "pw"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = srv
        .patch("/users/0190f5c2-0000-7000-8000-000000000000/deactivate")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clients_by_id_and_company() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    let (status, body) = srv.get(&format!("/clients/{}", s.client_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jane Client");

    let (status, body) = srv.get(&format!("/clients/company/{}", s.company_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = srv
        .get(&format!("/clients/company/{}?is_active=false", s.company_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, _) = srv.get("/clients/0190f5c2-0000-7000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn proposal_edit_delete_and_client_listing() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;
    let pid = create_proposal(&srv, &s, "Kitchen").await;
    create_proposal(&srv, &s, "Bathroom").await;
    srv.put(
        &format!("/proposals/{pid}/items"),
        json!({ "items": [{ "name": "Sink", "quantity": 1, "unit_price": 300 }] }),
    )
    .await;

    let (status, body) = srv
        .put(&format!("/proposals/{pid}"), json!({ "title": "Kitchen and pantry", "amount": 900 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Kitchen and pantry");
    assert_eq!(body["amount"], 900.0);

    let (status, body) = srv
        .put(&format!("/proposals/{pid}"), json!({ "status": "Archived" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.get(&format!("/proposals/client/{}", s.client_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (status, body) = srv.delete(&format!("/proposals/{pid}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], format!("Proposal with ID {pid} deleted successfully"));

    let (status, _) = srv.get(&format!("/proposals/{pid}/items")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv.delete(&format!("/proposals/{pid}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = srv.get(&format!("/proposals/client/{}", s.client_id)).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn boq_preview_writes_nothing() {
    let srv = TestServer::spawn().await;
    let s = seed(&srv, None).await;

    let (status, body) = srv
        .post(
            "/boq-items/import/preview",
            json!({
                "company_id": s.company_id,
                "rows": [
                    { "project_type": "Residential", "description": "Vitrified tiles", "basic_rate": 45.0 },
                    { "description": "No rates" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_rows"], 2);
    assert_eq!(body["message"], "Found 1 valid rows to import");
    assert_eq!(body["skipped"][0]["row"], 2);

    let (_, body) = srv.get(&format!("/boq-items?company_id={}", s.company_id)).await;
    assert!(body["items"].as_array().unwrap().is_empty());
}
