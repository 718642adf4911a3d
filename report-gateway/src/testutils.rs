use crate::config::{
    ApiKeyConfig, Config, CurrencyConfig, FilterConfig, Listener, RemoteConfig, StoreConfig,
};
use crate::filters::RangePolicy;
use crate::projection::{CurrencyTable, ReportContext};
use crate::store::{Snapshot, SnapshotStore};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, StatusCode};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use serde_json::{Value, json};
use shared::http::{ResponseBody, full_body, serve_listener};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub const INSTANCE: &str = "10018";
pub const USER_KEY: &str = "user-key";
pub const ADMIN_KEY: &str = "admin-key";
pub const INACTIVE_KEY: &str = "inactive-key";
pub const OUTBOUND_KEY: &str = "outbound-key";

pub fn test_context() -> Arc<ReportContext> {
    test_context_with(RangePolicy::BothBounds)
}

pub fn test_context_with(range_policy: RangePolicy) -> Arc<ReportContext> {
    Arc::new(ReportContext {
        instance: INSTANCE.to_string(),
        currencies: CurrencyTable::from_config(&CurrencyConfig::default()),
        range_policy,
    })
}

pub fn api_keys() -> Vec<ApiKeyConfig> {
    let key = |key: &str, user: &str, active, admin| ApiKeyConfig {
        key: key.to_string(),
        user: user.to_string(),
        active,
        admin,
    };
    vec![
        key(USER_KEY, "pos", true, false),
        key(ADMIN_KEY, "bi", true, true),
        key(INACTIVE_KEY, "former", false, true),
    ]
}

/// Gateway configuration pointing at `remote_base`
pub fn test_config(remote_base: Url) -> Config {
    Config {
        listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 8069,
        },
        admin_listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 8070,
        },
        instance: INSTANCE.to_string(),
        remote: RemoteConfig {
            base_url: remote_base,
            api_key: OUTBOUND_KEY.to_string(),
            timeout_secs: 2,
        },
        filters: FilterConfig::default(),
        currency: CurrencyConfig::default(),
        api_keys: api_keys(),
        store: StoreConfig {
            snapshot_path: PathBuf::from("unused.json"),
        },
        endpoints: HashMap::new(),
    }
}

/// Small but complete set of business records: one product with a three
/// level category, one without any relations, orders with and without
/// shop/session/customer, and purchase orders in every relevant state.
pub fn fixture_snapshot() -> Snapshot {
    serde_json::from_value(json!({
        "categories": [
            {"id": 1, "name": "Boutique"},
            {"id": 2, "name": "Femme", "parent_id": 1},
            {"id": 3, "name": "Robe", "parent_id": 2}
        ],
        "products": [
            {
                "id": 1,
                "name": "Robe soirée",
                "barcode": "611000",
                "default_code": "RS-1",
                "item_id": "IT-1",
                "standard_price": 120.0,
                "hs_code": "6204",
                "origin_country": "FR",
                "category_id": 3,
                "composition": "Soie",
                "detailed_type": "product",
                "invoice_policy": "order",
                "available_in_pos": true,
                "pos_categories": ["Maison A", "Soirée"],
                "taxes": ["TVA 20%"],
                "sellers": [{"name": "Atelier", "price": 80.0, "currency": "EUR"}],
                "variant_id": 101
            },
            {
                "id": 2,
                "name": "Carte cadeau",
                "detailed_type": "service",
                "invoice_policy": "order",
                "variant_id": 102
            },
            {
                "id": 3,
                "name": "Écharpe",
                "category_id": 2,
                "detailed_type": "product",
                "invoice_policy": "delivery"
            }
        ],
        "variants": [
            {"id": 101, "template_id": 1, "display_name": "Robe soirée (M)"},
            {"id": 102, "template_id": 2, "display_name": "Carte cadeau"}
        ],
        "pricelist_items": [
            {"template_id": 1, "fixed_price": 399.0, "pricelist_active": false},
            {"template_id": 1, "fixed_price": 450.0}
        ],
        "stock_quants": [
            {
                "id": 1, "product_id": 101, "location": "WH/Stock",
                "quantity": 3.0, "quantity_auto_apply": 3.0, "value": 360.0,
                "in_date": "2024-01-10T09:00:00",
                "warehouse": {"id": 1, "name": "Casablanca"}
            },
            {
                "id": 2, "product_id": 101, "location": "WH/Vitrine",
                "quantity": 1.0, "quantity_auto_apply": 1.0, "value": 120.0,
                "in_date": "2024-02-15T10:00:00",
                "warehouse": {"id": 1, "name": "Casablanca"}
            },
            {
                "id": 3, "product_id": 102, "location": "Partners/Customers",
                "quantity": -2.0, "quantity_auto_apply": -2.0, "value": 0.0
            }
        ],
        "pos_orders": [
            {
                "id": 10,
                "name": "Shop/0010",
                "pos_reference": "Order 00001-001-0010",
                "date_order": "2024-05-02T14:00:00",
                "session": {"id": 3, "name": "POS/00003", "config_id": 1},
                "config": {"id": 1, "name": "Shop Maarif"},
                "partner": {"id": 77, "name": "Amina"},
                "employee": "Karim",
                "suggestion": "Sara",
                "lines": [
                    {"product_id": 101, "product_name": "Robe soirée (M)", "qty": 1.0, "price_subtotal_incl": 450.0},
                    {"product_id": 102, "product_name": "Carte cadeau", "qty": 1.0, "customer_note": "gift wrap", "discount": 10.0, "price_subtotal_incl": 200.0}
                ],
                "payments": [
                    {"method": "Cash", "amount": 300.0},
                    {"method": "Card", "amount": 350.0}
                ]
            },
            {
                "id": 11,
                "name": "Shop/0011",
                "pos_reference": "Order 00001-001-0011",
                "date_order": "2024-06-10T11:00:00",
                "lines": [
                    {"product_id": 102, "product_name": "Carte cadeau", "qty": 2.0, "price_subtotal_incl": 400.0}
                ],
                "payments": [
                    {"method": "Cash", "amount": 100.0},
                    {"method": "Cash", "amount": 300.0}
                ]
            }
        ],
        "purchase_orders": [
            {
                "id": 20, "name": "P00020", "state": "purchase",
                "date_approve": "2024-03-01T10:00:00",
                "partner": {"id": 5, "name": "Tissus Lyon"}, "user_id": 2,
                "picking_type": {"name": "Réceptions", "warehouse": {"id": 1, "name": "Casablanca"}},
                "dd_impot": "DD-9", "supplier_invoice": "F-77",
                "currency": "EUR", "amount_total": 1000.0,
                "lines": [
                    {"product_qty": 10.0, "qty_received": 4.0},
                    {"product_qty": 5.0, "qty_received": 5.0}
                ]
            },
            {
                "id": 21, "name": "P00021", "state": "draft",
                "partner": {"id": 6, "name": "Coton Fès"},
                "currency": "MAD", "amount_total": 500.0
            },
            {
                "id": 22, "name": "P00022", "state": "cancel",
                "date_approve": "2024-03-02T10:00:00",
                "partner": {"id": 5, "name": "Tissus Lyon"},
                "currency": "EUR", "amount_total": 10.0
            },
            {
                "id": 23, "name": "P00023", "state": "purchase",
                "date_approve": "2024-07-01T08:00:00",
                "partner": {"id": 7, "name": "London Mills"},
                "currency": "GBP", "amount_total": 50.0
            },
            {
                "id": 24, "name": "P00024", "state": "done",
                "date_approve": "2024-04-01T08:00:00",
                "partner": {"id": 5, "name": "Tissus Lyon"},
                "currency": "EUR", "amount_total": 20.0
            }
        ],
        "valuation_layers": [
            {
                "id": 30, "create_date": "2024-01-10T09:00:00", "reference": "WH/IN/0001",
                "product_id": 101, "quantity": 3.0, "remaining_qty": 3.0,
                "value": 360.0, "remaining_value": 360.0
            },
            {
                "id": 31, "create_date": "2024-02-15T10:00:00", "reference": "WH/OUT/0002",
                "product_id": 102, "quantity": -1.0, "value": -50.5
            },
            {"id": 32, "quantity": 0.0, "value": 0.0}
        ]
    }))
    .unwrap()
}

pub fn fixture_store() -> SnapshotStore {
    SnapshotStore::new(fixture_snapshot())
}

/// What a request reached the stand-in remote with
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// Canned reply of the stand-in remote
#[derive(Clone, Debug)]
pub struct RemoteReply {
    status: StatusCode,
    body: Bytes,
    delay: Option<Duration>,
}

impl RemoteReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: Bytes::from(body.to_string()),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from_static(br#"{"error": "remote failure"}"#),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn respond(&self) -> Response<ResponseBody> {
        let mut response = Response::new(full_body(self.body.clone()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// HTTP server on 127.0.0.1 standing in for the remote instance. Every
/// request gets the same reply. Stops when dropped.
pub struct TestRemote {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl TestRemote {
    pub async fn spawn(reply: RemoteReply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let recorded = recorded.clone();
            let reply = reply.clone();
            async move {
                recorded.lock().unwrap().push(RecordedRequest {
                    path: req.uri().path().to_string(),
                    query: req.uri().query().map(str::to_string),
                    authorization: req
                        .headers()
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                });
                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, Infallible>(reply.respond())
            }
        });

        let handle = tokio::spawn(async move {
            let _ = serve_listener(listener, service).await;
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn url(&self, path: &str) -> Url {
        self.base_url().join(path).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestRemote {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
