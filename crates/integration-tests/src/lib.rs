//! Integration test harness for Tidepool.
//!
//! Tests drive the real storefront router in-process. Shopify is replaced by
//! [`FakeShopify`], a local GraphQL endpoint that answers each operation by
//! name and records every request it receives. The image API and the CDN are
//! replaced by [`FakeApi`], which answers by method and path.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidepool-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode, Uri, header};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tidepool_core::GiftPolicy;
use tidepool_storefront::config::{
    AnalyticsConfig, CdnConfig, LogFormat, MediaConfig, ShopifyStorefrontConfig,
    StorefrontConfig, ThemeConfig,
};
use tidepool_storefront::state::AppState;
use tower::ServiceExt;

/// Client address sent on every request so the rate limiter can key it.
pub const CLIENT_IP: &str = "203.0.113.7";

type Responder = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Clone, Default)]
struct FakeState {
    responders: Arc<Mutex<HashMap<String, Responder>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// A stand-in for the Storefront GraphQL API.
#[derive(Clone)]
pub struct FakeShopify {
    state: FakeState,
    endpoint: String,
}

impl FakeShopify {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/graphql.json", post(graphql))
            .with_state(state.clone());
        let addr = serve(app).await;

        Self {
            state,
            endpoint: format!("http://{addr}/graphql.json"),
        }
    }

    /// URL the storefront should send GraphQL requests to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Answer `operation` with `data`, ignoring its variables.
    pub fn respond(&self, operation: &str, data: Value) {
        self.respond_with(operation, move |_| data.clone());
    }

    /// Answer `operation` with a function of its variables.
    pub fn respond_with<F>(&self, operation: &str, responder: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.state
            .responders
            .lock()
            .expect("responders lock")
            .insert(operation.to_string(), Arc::new(responder));
    }

    /// Variables of every received request for `operation`, oldest first.
    #[must_use]
    pub fn calls(&self, operation: &str) -> Vec<Value> {
        self.state
            .requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|request| request["operationName"] == operation)
            .map(|request| request["variables"].clone())
            .collect()
    }
}

async fn graphql(State(state): State<FakeState>, Json(request): Json<Value>) -> Json<Value> {
    let operation = request["operationName"].as_str().unwrap_or_default().to_string();
    let responder = state
        .responders
        .lock()
        .expect("responders lock")
        .get(&operation)
        .cloned();
    let variables = request["variables"].clone();
    state.requests.lock().expect("requests lock").push(request);

    match responder {
        Some(responder) => Json(json!({ "data": responder(&variables) })),
        None => Json(json!({
            "data": null,
            "errors": [{ "message": format!("unexpected operation {operation}") }]
        })),
    }
}

/// Serve `app` on an ephemeral localhost port.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        0,
    ))
    .await
    .expect("bind fake server listener");
    let addr = listener.local_addr().expect("fake server address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });
    addr
}

// =============================================================================
// Fake HTTP API
// =============================================================================

/// A request received by [`FakeApi`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
struct FakeApiState {
    routes: Arc<Mutex<HashMap<(Method, String), (StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A stand-in for a JSON HTTP API such as the image API or the CDN.
#[derive(Clone)]
pub struct FakeApi {
    state: FakeApiState,
    base_url: String,
}

impl FakeApi {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = FakeApiState::default();
        let app = Router::new().fallback(fake_api).with_state(state.clone());
        let addr = serve(app).await;

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer `method path` with `status` and a JSON `body`.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.state
            .routes
            .lock()
            .expect("routes lock")
            .insert((method, path.to_string()), (status, body));
    }

    /// Every received request, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

async fn fake_api(
    State(state): State<FakeApiState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let answer = state
        .routes
        .lock()
        .expect("routes lock")
        .get(&(method.clone(), path.clone()))
        .cloned();
    state.requests.lock().expect("requests lock").push(RecordedRequest {
        method,
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });

    answer.map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": { "message": format!("no route for {path}") } })),
            )
        },
        |(status, body)| (status, Json(body)),
    )
}

/// Image API settings pointed at `api`.
#[must_use]
pub fn media_config(api: &FakeApi) -> MediaConfig {
    MediaConfig {
        api_base_url: api.base_url().to_string(),
        access_key: "ak-tidepool-test".to_string(),
        secret_key: SecretString::from("mk_Rt5Vb8Nq2Ws6Xe9Yu3Zi".to_string()),
        model: "kling-v1".to_string(),
    }
}

/// CDN settings pointed at `api`.
#[must_use]
pub fn cdn_config(api: &FakeApi) -> CdnConfig {
    CdnConfig {
        cloud_name: "tidepool-test".to_string(),
        api_key: "873215904417".to_string(),
        api_secret: SecretString::from("cdn_Lk4Pj7Hg1Fd5Sa8Qw2Er".to_string()),
        upload_folder: "storefront".to_string(),
        api_base_url: api.base_url().to_string(),
    }
}

/// Storefront configuration pointed at `shopify`.
#[must_use]
pub fn test_config(shopify: &FakeShopify, gift: Option<GiftPolicy>) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        shopify: ShopifyStorefrontConfig {
            store: "tidepool-test.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_endpoint: Some(shopify.endpoint().to_string()),
            storefront_private_token: SecretString::from("shpat_Zq81mRkW2vXc7LpN4tYd".to_string()),
            customer_shop_id: "12345".to_string(),
            customer_client_id: "client-abc".to_string(),
            customer_client_secret: SecretString::from("cs_Hn5Jw9Qe3Ur7Ty1Ik6Ol".to_string()),
        },
        gift,
        media: None,
        cdn: None,
        theme: ThemeConfig::default(),
        analytics: AnalyticsConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        log_format: LogFormat::Text,
    }
}

/// In-process storefront under test.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let state = AppState::new(config);
        Self {
            router: tidepool_storefront::app(state.clone()),
            state,
        }
    }

    /// Shared state behind the router, for reaching the API clients.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send a request, stamping the client IP header.
    pub async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        request
            .headers_mut()
            .insert("x-real-ip", CLIENT_IP.parse().expect("client ip header"));
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).expect("request"))
            .await
    }

    /// POST a JSON body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }

    /// POST a urlencoded form.
    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(
            "content-type",
            "application/x-www-form-urlencoded",
        );
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).expect("request"))
            .await
    }
}

/// Read a response body as UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// The `name=value` part of the session cookie set on `response`.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("tp_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

// =============================================================================
// Fixtures
// =============================================================================

/// A USD `MoneyV2` object.
#[must_use]
pub fn money(amount: &str) -> Value {
    json!({ "amount": amount, "currencyCode": "USD" })
}

/// A single-variant product.
#[must_use]
pub fn product(handle: &str, title: &str, price: &str) -> Value {
    json!({
        "id": "gid://shopify/Product/101",
        "handle": handle,
        "title": title,
        "vendor": "Tidepool",
        "availableForSale": true,
        "tags": [],
        "description": "A sturdy mug.",
        "descriptionHtml": "<p>A sturdy mug.</p>",
        "productType": "Kitchen",
        "seo": { "title": null, "description": null },
        "featuredImage": null,
        "priceRange": { "minVariantPrice": money(price), "maxVariantPrice": money(price) },
        "compareAtPriceRange": { "maxVariantPrice": money("0.00") },
        "images": { "nodes": [] },
        "options": [{ "name": "Title", "optionValues": [{ "name": "Default Title" }] }],
        "variants": { "nodes": [{
            "id": "gid://shopify/ProductVariant/1001",
            "title": "Default Title",
            "availableForSale": true,
            "sku": "MUG-1",
            "price": money(price),
            "compareAtPrice": null,
            "selectedOptions": [{ "name": "Title", "value": "Default Title" }],
            "image": null
        }]},
        "sellingPlanGroups": { "nodes": [] }
    })
}

/// A cart line. Gift lines carry the gift attribute and cost nothing.
#[must_use]
pub fn cart_line(id: &str, variant_id: u64, quantity: i64, line_total: &str, gift: bool) -> Value {
    let attributes = if gift {
        json!([{ "key": tidepool_core::gift::GIFT_ATTRIBUTE_KEY, "value": tidepool_core::gift::GIFT_ATTRIBUTE_VALUE }])
    } else {
        json!([])
    };
    json!({
        "id": id,
        "quantity": quantity,
        "attributes": attributes,
        "cost": {
            "amountPerQuantity": money(line_total),
            "compareAtAmountPerQuantity": null,
            "subtotalAmount": money(line_total),
            "totalAmount": money(line_total)
        },
        "discountAllocations": [],
        "merchandise": {
            "id": format!("gid://shopify/ProductVariant/{variant_id}"),
            "title": "Default Title",
            "availableForSale": true,
            "price": money(line_total),
            "selectedOptions": [],
            "image": null,
            "product": {
                "id": "gid://shopify/Product/101",
                "handle": "harbor-mug",
                "title": if gift { "Tote bag" } else { "Harbor mug" },
                "vendor": "Tidepool",
                "featuredImage": null
            }
        }
    })
}

/// A cart holding `lines`, totalled from their line totals.
#[must_use]
pub fn cart(lines: &[Value]) -> Value {
    let quantity: i64 = lines.iter().filter_map(|line| line["quantity"].as_i64()).sum();
    let subtotal: f64 = lines
        .iter()
        .filter_map(|line| line["cost"]["subtotalAmount"]["amount"].as_str())
        .filter_map(|amount| amount.parse::<f64>().ok())
        .sum();
    let subtotal = format!("{subtotal:.2}");

    json!({
        "id": "gid://shopify/Cart/c1-test",
        "checkoutUrl": "https://tidepool-test.myshopify.com/cart/c/c1-test",
        "note": null,
        "totalQuantity": quantity,
        "buyerIdentity": { "email": null, "countryCode": "US" },
        "cost": {
            "subtotalAmount": money(&subtotal),
            "totalAmount": money(&subtotal),
            "totalTaxAmount": null,
            "totalDutyAmount": null
        },
        "discountCodes": [],
        "appliedGiftCards": [],
        "lines": { "nodes": lines }
    })
}

/// A successful cart mutation payload.
#[must_use]
pub fn cart_payload(cart: Value) -> Value {
    json!({ "cart": cart, "userErrors": [] })
}
