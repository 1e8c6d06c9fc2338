/// Common test utilities for the recovery API integration tests
///
/// Provides:
/// - A mock indexer serving the balances and transaction JSON-RPC methods plus an
///   Esplora-style `POST /tx` broadcast endpoint
/// - A helper that serves the real router on an ephemeral port against that mock
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use inscription_recovery::api::{server::create_router, AppState};
use inscription_recovery::RecoveryConfig;

pub const TAPROOT: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";
pub const P2WPKH: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";
/// Wallet the mock answers with an RPC error object
pub const UNKNOWN_WALLET: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
/// Wallet the mock answers with HTTP 503
pub const OVERLOADED_WALLET: &str =
    "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
/// Wallet the mock answers only after [`API_TIMEOUT`] has passed
pub const SLOW_WALLET: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
/// Wallet the mock answers with an envelope lacking `result`
pub const MISSING_RESULT_WALLET: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
/// Wallet the mock answers with an HTML page
pub const NON_JSON_WALLET: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";

/// Upstream timeout the API under test is configured with
pub const API_TIMEOUT: Duration = Duration::from_secs(2);

pub const SMALL_TXID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const LARGE_TXID: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const DUST_TXID: &str = "cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";
pub const THIN_TXID: &str = "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";

/// OP_1 <32-byte key>
pub const P2TR_SCRIPT: &str = "51201111111111111111111111111111111111111111111111111111111111111111";
pub const P2WPKH_SCRIPT: &str = "00142222222222222222222222222222222222222222";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct MockIndexer {
    balances: HashMap<String, Value>,
    transactions: HashMap<String, Value>,
}

impl MockIndexer {
    /// Inscription wallet at [`TAPROOT`] with matching parent transactions.
    pub fn with_fixtures() -> Self {
        let mut mock = Self::default();

        mock.balances.insert(
            TAPROOT.to_string(),
            json!({
                "spendable": [
                    { "outpoint": format!("{}:2", LARGE_TXID), "value": 80_000, "height": 850_100 }
                ],
                "assets": [
                    {
                        "outpoint": format!("{}:0", SMALL_TXID),
                        "value": 3_000,
                        "height": 850_000,
                        "inscriptions": ["aaaai0"]
                    },
                    {
                        "outpoint": format!("{}:0", DUST_TXID),
                        "value": 546,
                        "height": 850_000,
                        "inscriptions": ["cccci0"]
                    },
                    {
                        "outpoint": format!("{}:1", LARGE_TXID),
                        "value": 10_000,
                        "height": 850_001,
                        "inscriptions": ["bbbbi0", "bbbbi1"],
                        "runes": [
                            {
                                "rune": {
                                    "id": { "block": "0xcf850", "tx": "0x2" },
                                    "name": "DOGGOTOTHEMOON",
                                    "spacedName": "DOG•GO•TO•THE•MOON",
                                    "divisibility": 5,
                                    "symbol": "🐕"
                                },
                                "balance": "0x2540be400"
                            },
                            {
                                "rune": {
                                    "id": { "block": "0x2", "tx": "0x0" },
                                    "name": "DIESEL",
                                    "divisibility": 8
                                },
                                "balance": "0x5f5e100"
                            },
                            { "rune": { "name": "BROKEN" }, "balance": "0x1" }
                        ]
                    }
                ],
                "pending": [],
                "ord_height": 870_000,
                "index_height": 870_001
            }),
        );

        mock.insert_tx(SMALL_TXID, &[(3_000, P2TR_SCRIPT)]);
        mock.insert_tx(LARGE_TXID, &[(546, P2WPKH_SCRIPT), (10_000, P2TR_SCRIPT)]);
        mock.insert_tx(DUST_TXID, &[(546, P2TR_SCRIPT)]);
        mock.insert_tx(THIN_TXID, &[(1_000, P2TR_SCRIPT)]);
        mock
    }

    fn insert_tx(&mut self, txid: &str, outputs: &[(u64, &str)]) {
        let vout: Vec<Value> = outputs
            .iter()
            .map(|(value, script)| json!({ "scriptpubkey": script, "value": value }))
            .collect();
        self.transactions
            .insert(txid.to_string(), json!({ "txid": txid, "vout": vout }));
    }
}

async fn rpc_handler(State(mock): State<Arc<MockIndexer>>, Json(request): Json<Value>) -> Response {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();

    match method {
        "sandshrew_balances" => {
            let address = request["params"][0]["address"].as_str().unwrap_or_default();
            match address {
                OVERLOADED_WALLET => {
                    return (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response()
                }
                SLOW_WALLET => tokio::time::sleep(API_TIMEOUT * 2).await,
                MISSING_RESULT_WALLET => {
                    return Json(json!({ "jsonrpc": "2.0", "id": id })).into_response()
                }
                NON_JSON_WALLET => {
                    return "<html><body>502 Bad Gateway</body></html>".into_response()
                }
                _ => {}
            }
            match mock.balances.get(address) {
                Some(result) => Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response(),
                None => Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32602, "message": "unknown address" }
                }))
                .into_response(),
            }
        }
        "esplora_tx" => {
            let txid = request["params"][0].as_str().unwrap_or_default();
            let result = mock.transactions.get(txid).cloned().unwrap_or(Value::Null);
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
        }
        other => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("method {} not found", other) }
        }))
        .into_response(),
    }
}

async fn broadcast_handler(body: String) -> Response {
    let decoded = hex::decode(body.trim())
        .ok()
        .and_then(|bytes| bitcoin::consensus::deserialize::<bitcoin::Transaction>(&bytes).ok());
    match decoded {
        Some(tx) => tx.compute_txid().to_string().into_response(),
        None => (StatusCode::BAD_REQUEST, "sendrawtransaction RPC error: TX decode failed").into_response(),
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start the mock indexer and the recovery API; returns the API base URL.
pub async fn spawn_app() -> String {
    init_logging();

    let mock = Arc::new(MockIndexer::with_fixtures());
    let indexer_url = serve(
        Router::new()
            .route("/", post(rpc_handler))
            .route("/tx", post(broadcast_handler))
            .with_state(mock),
    )
    .await;

    spawn_api(indexer_url).await
}

/// Base URL of a local port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Start the recovery API against `indexer_url`; returns the API base URL.
pub async fn spawn_api(indexer_url: String) -> String {
    init_logging();

    let config = RecoveryConfig {
        rpc_url: indexer_url.clone(),
        broadcast_url: indexer_url,
        request_timeout: API_TIMEOUT,
        ..Default::default()
    };
    let state = Arc::new(AppState::from_config(config).unwrap());
    serve(create_router(state).unwrap()).await
}
