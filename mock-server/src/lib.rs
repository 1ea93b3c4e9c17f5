use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub tags: Vec<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ItemPage {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub items: Vec<Item>,
}

#[derive(Deserialize)]
pub struct PageParams {
    page: Option<u64>,
    per_page: Option<u64>,
}

pub type Catalog = Arc<Vec<Item>>;

/// Fixed catalog served by `/items`.
pub fn catalog() -> Vec<Item> {
    let names = [
        "widget", "gadget", "sprocket", "flange", "gear", "bolt", "nut", "washer", "spring",
        "hinge", "bracket", "rivet",
    ];
    names
        .iter()
        .zip(1u64..)
        .map(|(name, id)| Item {
            id,
            name: name.to_string(),
            price: id as f64 * 1.25,
            tags: if id % 2 == 0 {
                vec!["even".to_string()]
            } else {
                vec!["odd".to_string()]
            },
            note: (id % 3 == 0).then(|| format!("{name} ships separately")),
        })
        .collect()
}

pub fn app() -> Router {
    let catalog: Catalog = Arc::new(catalog());
    Router::new()
        .route("/items", get(list_items))
        .route("/items/{id}", get(get_item))
        .route("/echo", any(echo))
        .route("/empty", get(empty))
        .route("/list", get(bare_list))
        .with_state(catalog)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_items(
    State(catalog): State<Catalog>,
    Query(params): Query<PageParams>,
) -> Result<Json<ItemPage>, StatusCode> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(10);
    if page == 0 || per_page == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    debug!(page, per_page, "list items");
    let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
    let take = usize::try_from(per_page).unwrap_or(usize::MAX);
    Ok(Json(ItemPage {
        page,
        per_page,
        total: catalog.len() as u64,
        items: catalog.iter().skip(skip).take(take).cloned().collect(),
    }))
}

async fn get_item(
    State(catalog): State<Catalog>,
    Path(id): Path<u64>,
) -> Result<Json<Item>, StatusCode> {
    debug!(id, "get item");
    catalog
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Reflects the method, query and headers of the incoming request.
async fn echo(
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    debug!(%method, "echo");
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": headers,
    }))
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn bare_list(State(catalog): State<Catalog>) -> Json<Vec<Item>> {
    Json(catalog.iter().take(2).cloned().collect())
}
