use std::sync::Arc;

use mkt_api::config::AppConfig;
use mkt_api::store::{AppStore, CollectionStore, GrantStore, MemoryStore};
use mkt_api::{App, NewCollection};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
const PUBLISHER_ID: &str = "31337";
const REGULAR_ID: &str = "2519";
const APP_IDS: [i64; 4] = [11, 12, 13, 14];

/// Who a request is sent as
#[derive(Clone, Copy)]
enum Caller {
    Anon,
    Regular,
    Publisher,
}

impl Caller {
    fn user_id(self) -> Option<&'static str> {
        match self {
            Caller::Anon => None,
            Caller::Regular => Some(REGULAR_ID),
            Caller::Publisher => Some(PUBLISHER_ID),
        }
    }
}

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
    collection_id: i64,
}

impl TestClient {
    /// Start a server over a fresh in-memory store holding one empty
    /// collection, four apps and a user granted `Apps:Publisher`.
    async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        for id in APP_IDS {
            store.upsert_app(App::new(id, format!("App {}", id))).await.unwrap();
        }
        store.grant(PUBLISHER_ID, "Apps:Publisher").await.unwrap();
        let collection = store
            .create_collection(NewCollection {
                name: "My Favorite Games".to_string(),
                description: "A collection of my favorite games".to_string(),
            })
            .await
            .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let app = mkt_api::app(store, AppConfig::default());
        tokio::spawn(mkt_api::serve(listener, app));

        Self {
            client: Client::new(),
            base_url,
            collection_id: collection.id,
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        caller: Caller,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match caller.user_id() {
            Some(user_id) => builder.header("X-User-Id", user_id),
            None => builder,
        }
    }

    async fn get(&self, path: &str, caller: Caller) -> (StatusCode, Value) {
        let response = self
            .request(reqwest::Method::GET, path, caller)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn post(&self, path: &str, caller: Caller, json: Value) -> (StatusCode, Value) {
        let response = self
            .request(reqwest::Method::POST, path, caller)
            .json(&json)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn patch(&self, path: &str, caller: Caller, json: Value) -> (StatusCode, Value) {
        let response = self
            .request(reqwest::Method::PATCH, path, caller)
            .json(&json)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    fn collection_path(&self, action: &str) -> String {
        match action {
            "detail" => format!("/collections/{}", self.collection_id),
            action => format!("/collections/{}/{}", self.collection_id, action),
        }
    }

    async fn add_app(&self, caller: Caller, app: Value) -> (StatusCode, Value) {
        let body = if app.is_null() { json!({}) } else { json!({ "app": app }) };
        self.post(&self.collection_path("add-app"), caller, body).await
    }

    async fn remove_app(&self, caller: Caller, app: Value) -> (StatusCode, Value) {
        let body = if app.is_null() { json!({}) } else { json!({ "app": app }) };
        self.post(&self.collection_path("remove-app"), caller, body).await
    }
}

fn app_url(id: i64) -> String {
    format!("/api/v1/apps/app/{}/", id)
}

async fn listing(caller: Caller) {
    let client = TestClient::start().await;
    for id in APP_IDS {
        let (status, _) = client.add_app(Caller::Publisher, json!(id)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, data) = client.get("/collections", caller).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["meta"]["total_count"], 1);
    assert_eq!(
        data["objects"][0]["apps"],
        json!(APP_IDS.iter().map(|id| app_url(*id)).collect::<Vec<_>>())
    );
}

#[tokio::test]
async fn test_listing() {
    listing(Caller::Anon).await;
}

#[tokio::test]
async fn test_listing_no_perms() {
    listing(Caller::Regular).await;
}

#[tokio::test]
async fn test_listing_has_perms() {
    listing(Caller::Publisher).await;
}

#[tokio::test]
async fn test_listing_past_the_end() {
    let client = TestClient::start().await;

    let (status, data) = client
        .get("/collections?offset=18446744073709551615", Caller::Anon)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["objects"], json!([]));
    assert_eq!(data["meta"]["total_count"], 1);
    assert!(data["meta"]["next"].is_null());

    let (status, data) = client
        .get("/collections?offset=18446744073709551610&limit=5", Caller::Anon)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["objects"], json!([]));
}

async fn create(caller: Caller) -> (StatusCode, Value) {
    let client = TestClient::start().await;
    client
        .post(
            "/collections",
            caller,
            json!({
                "name": "My Favorite Games",
                "description": "A collection of my favorite games"
            }),
        )
        .await
}

#[tokio::test]
async fn test_create_anon() {
    let (status, data) = create(Caller::Anon).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_create_no_perms() {
    let (status, data) = create(Caller::Regular).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_create_has_perms() {
    let (status, data) = create(Caller::Publisher).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["name"], "My Favorite Games");
    assert_eq!(data["apps"], json!([]));
}

#[tokio::test]
async fn test_create_requires_name() {
    let client = TestClient::start().await;
    let (status, data) = client
        .post("/collections", Caller::Publisher, json!({"description": "no name"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "name: This field is required.");
}

#[tokio::test]
async fn test_add_app_anon() {
    let client = TestClient::start().await;
    let (status, data) = client.add_app(Caller::Anon, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_add_app_no_perms() {
    let client = TestClient::start().await;
    let (status, data) = client.add_app(Caller::Regular, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_add_app_has_perms() {
    let client = TestClient::start().await;
    let (status, data) = client.add_app(Caller::Publisher, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["apps"], json!([app_url(APP_IDS[0])]));
}

#[tokio::test]
async fn test_add_app_nonexistent() {
    let client = TestClient::start().await;
    let (status, data) = client.add_app(Caller::Publisher, json!(100000)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` does not exist.");
}

#[tokio::test]
async fn test_add_app_empty() {
    let client = TestClient::start().await;
    let (status, data) = client.add_app(Caller::Publisher, Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` was not provided.");
}

#[tokio::test]
async fn test_add_app_duplicate() {
    let client = TestClient::start().await;
    client.add_app(Caller::Publisher, json!(APP_IDS[0])).await;
    let (status, data) = client.add_app(Caller::Publisher, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` already exists in collection.");
}

#[tokio::test]
async fn test_add_app_to_missing_collection() {
    let client = TestClient::start().await;
    let (status, data) = client
        .post("/collections/9999/add-app", Caller::Publisher, json!({"app": APP_IDS[0]}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(data["detail"], "Not found.");
}

#[tokio::test]
async fn test_remove_app_anon() {
    let client = TestClient::start().await;
    let (status, data) = client.remove_app(Caller::Anon, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_remove_app_no_perms() {
    let client = TestClient::start().await;
    let (status, data) = client.remove_app(Caller::Regular, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_remove_app_has_perms() {
    let client = TestClient::start().await;
    client.add_app(Caller::Publisher, json!(APP_IDS[0])).await;
    let (status, data) = client.remove_app(Caller::Publisher, json!(APP_IDS[0])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["apps"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_remove_app_nonexistent() {
    let client = TestClient::start().await;
    let (status, data) = client.remove_app(Caller::Publisher, json!(100000)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` does not exist.");
}

#[tokio::test]
async fn test_remove_app_empty() {
    let client = TestClient::start().await;
    let (status, data) = client.remove_app(Caller::Publisher, json!(false)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` was not provided.");
}

#[tokio::test]
async fn test_remove_app_invalid() {
    let client = TestClient::start().await;
    client.add_app(Caller::Publisher, json!(APP_IDS[0])).await;
    let (status, data) = client.remove_app(Caller::Publisher, json!(APP_IDS[1])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["detail"], "`app` not in collection.");
}

#[tokio::test]
async fn test_edit_collection_anon() {
    let client = TestClient::start().await;
    let (status, data) = client
        .patch(&client.collection_path("detail"), Caller::Anon, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_edit_collection_no_perms() {
    let client = TestClient::start().await;
    let (status, data) = client
        .patch(&client.collection_path("detail"), Caller::Regular, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(data["detail"], PERMISSION_DENIED);
}

#[tokio::test]
async fn test_edit_collection_has_perms() {
    let client = TestClient::start().await;
    let updates = json!({
        "name": "clouserw soundboard",
        "description": "Get off my lawn!"
    });
    let (status, data) = client
        .patch(&client.collection_path("detail"), Caller::Publisher, updates.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["name"], updates["name"]);
    assert_eq!(data["description"], updates["description"]);

    let (status, data) = client
        .get(&client.collection_path("detail"), Caller::Anon)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["name"], "clouserw soundboard");
}

#[tokio::test]
async fn test_edit_collection_apps() {
    let client = TestClient::start().await;
    let (status, data) = client
        .patch(&client.collection_path("detail"), Caller::Publisher, json!({"apps": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        data["detail"],
        "Collection apps may not be updated using this endpoint."
    );
}

#[tokio::test]
async fn test_delete_collection() {
    let client = TestClient::start().await;
    let path = client.collection_path("detail");

    let response = client
        .request(reqwest::Method::DELETE, &path, Caller::Regular)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .request(reqwest::Method::DELETE, &path, Caller::Publisher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = client.get(&path, Caller::Anon).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
