use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use taller_infra::InMemoryWorkshopStore;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = taller_api::app::build_app(Arc::new(InMemoryWorkshopStore::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_part(client: &reqwest::Client, base: &str, stock: i64) -> Value {
    let resp = client
        .post(format!("{base}/parts"))
        .json(&json!({ "description": "brake pad", "stock": stock, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn create_repair(client: &reqwest::Client, base: &str) -> Value {
    let resp = client
        .post(format!("{base}/repairs"))
        .json(&json!({ "plate": "abc1234", "entered_at": "2024-06-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn part_stock(client: &reqwest::Client, base: &str, part_id: i64) -> i64 {
    let part: Value = client
        .get(format!("{base}/parts/{part_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    part["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn line_item_lifecycle_reserves_and_releases_stock() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    let part = create_part(&client, base, 10).await;
    let part_id = part["id"].as_i64().unwrap();
    let repair = create_repair(&client, base).await;
    let folio = repair["folio"].as_i64().unwrap();
    // Plate is normalized to upper case on the way in.
    assert_eq!(repair["plate"], "ABC1234");
    assert_eq!(repair["status"], "pending");

    // Reserve 4 units.
    let resp = client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": part_id, "quantity": 4, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let item: Value = resp.json().await.unwrap();
    assert_eq!(part_stock(&client, base, part_id).await, 6);

    // Over-reserve: rejected with a conflict, stock untouched.
    let resp = client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": part_id, "quantity": 10, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
    assert_eq!(part_stock(&client, base, part_id).await, 6);

    // Listing shows the denormalized part data.
    let items: Value = client
        .get(format!("{base}/repairs/{folio}/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["part_description"], "brake pad");
    assert_eq!(items[0]["current_price"], 2500);

    // Deleting the item releases the reservation.
    let item_id = item["id"].as_i64().unwrap();
    let resp = client
        .delete(format!("{base}/items/{item_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(part_stock(&client, base, part_id).await, 10);
}

#[tokio::test]
async fn deleting_a_repair_cascades_through_the_coordinator() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    let part = create_part(&client, base, 10).await;
    let part_id = part["id"].as_i64().unwrap();
    let repair = create_repair(&client, base).await;
    let folio = repair["folio"].as_i64().unwrap();

    client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": part_id, "quantity": 3, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": part_id, "quantity": 2, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(part_stock(&client, base, part_id).await, 5);

    let resp = client
        .delete(format!("{base}/repairs/{folio}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(part_stock(&client, base, part_id).await, 10);

    let resp = client
        .get(format!("{base}/repairs/{folio}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_and_reference_errors_map_to_http_statuses() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    // Departure before entry: 400.
    let resp = client
        .post(format!("{base}/repairs"))
        .json(&json!({
            "plate": "abc1234",
            "entered_at": "2024-06-10",
            "left_at": "2024-06-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown repair: 404.
    let resp = client
        .get(format!("{base}/repairs/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Non-numeric id: 400.
    let resp = client
        .get(format!("{base}/parts/not-a-number"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Line item against a part that does not exist: 404, and the repair
    // keeps no half-created rows.
    let repair = create_repair(&client, base).await;
    let folio = repair["folio"].as_i64().unwrap();
    let resp = client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": 999, "quantity": 1, "unit_price": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let items: Value = client
        .get(format!("{base}/repairs/{folio}/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(items.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn a_part_on_an_open_repair_cannot_be_deleted() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    let part = create_part(&client, base, 10).await;
    let part_id = part["id"].as_i64().unwrap();
    let repair = create_repair(&client, base).await;
    let folio = repair["folio"].as_i64().unwrap();
    client
        .post(format!("{base}/repairs/{folio}/items"))
        .json(&json!({ "part_id": part_id, "quantity": 1, "unit_price": 2500 }))
        .send()
        .await
        .unwrap();

    let resp = client
        .delete(format!("{base}/parts/{part_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stock_corrections_go_through_the_ledger() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    let part = create_part(&client, base, 10).await;
    let part_id = part["id"].as_i64().unwrap();

    // A restock delta lands directly on the part.
    let resp = client
        .patch(format!("{base}/parts/{part_id}/stock"))
        .json(&json!({ "delta": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["stock"], 15);

    // A write-down past zero is refused and changes nothing.
    let resp = client
        .patch(format!("{base}/parts/{part_id}/stock"))
        .json(&json!({ "delta": -20 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(part_stock(&client, base, part_id).await, 15);

    let resp = client
        .patch(format!("{base}/parts/999/stock"))
        .json(&json!({ "delta": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repairs_can_be_filtered_by_plate() {
    let server = TestServer::spawn().await;
    let base = &server.base_url;
    let client = reqwest::Client::new();

    create_repair(&client, base).await;
    let resp = client
        .post(format!("{base}/repairs"))
        .json(&json!({ "plate": "xyz9876", "entered_at": "2024-06-02" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The filter normalizes just like creation does.
    let matches: Value = client
        .get(format!("{base}/repairs?plate=abc1234"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["plate"], "ABC1234");

    let none: Value = client
        .get(format!("{base}/repairs?plate=QQQ0000"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none.as_array().unwrap().is_empty());

    // Without the filter the listing still returns everything.
    let all: Value = client
        .get(format!("{base}/repairs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);
}
