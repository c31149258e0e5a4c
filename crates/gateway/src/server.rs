use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::messaging::MessagingClient;
use nomen_registrar::{Destination, Registrar, RegistrarError};
use nomen_types::{Address, TxId};

/// Shared state behind every handler.
pub struct AppState {
    pub registrar: Arc<Registrar>,
    pub messaging: Option<MessagingClient>,
    pub start_time: Instant,
}

type SharedState = Arc<AppState>;

/// HTTP-facing error: a status code plus a JSON body. Step-attributed
/// registrar failures keep their step and committed transaction ids so an
/// operator can resume from the right intermediate state.
struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RegistrarError> for ApiError {
    fn from(err: RegistrarError) -> Self {
        let status = match &err {
            RegistrarError::InvalidLabel(_) => StatusCode::BAD_REQUEST,
            RegistrarError::Wallet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RegistrarError::Rpc(_) | RegistrarError::StepRpc { .. } => StatusCode::BAD_GATEWAY,
            RegistrarError::Rejected { .. } => StatusCode::CONFLICT,
            RegistrarError::InclusionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };

        let mut body = json!({ "error": err.to_string() });
        if let Some(step) = err.step() {
            body["step"] = json!(step);
            body["committed"] = json!(err
                .committed()
                .iter()
                .map(TxId::to_hex)
                .collect::<Vec<_>>());
        }

        Self { status, body }
    }
}

fn parse_address(raw: &str, field: &'static str) -> Result<Address, ApiError> {
    raw.parse().map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid {field}: {err}"),
        )
    })
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    label: String,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    label: String,
}

#[derive(Debug, Deserialize)]
struct RegisterAddressRequest {
    label: String,
    destination: String,
}

#[derive(Debug, Deserialize)]
struct RegisterSmartWalletRequest {
    label: String,
    owner: String,
    #[serde(default)]
    deploy_nonce: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    label: String,
    new_owner: String,
}

#[derive(Debug, Serialize)]
struct TransferResponse {
    tx_id: TxId,
    name: String,
    new_owner: Address,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    parent_name: String,
    uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    address: String,
    message: String,
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        parent_name: state.registrar.zone().parent_name.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn check_name(
    State(state): State<SharedState>,
    Json(req): Json<CheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.registrar.check(&req.label).await?;
    Ok(Json(status))
}

async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state
        .registrar
        .register(&req.label, Destination::Generated)
        .await?;
    Ok(Json(registration))
}

async fn register_address(
    State(state): State<SharedState>,
    Json(req): Json<RegisterAddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let destination = parse_address(&req.destination, "destination address")?;
    let registration = state
        .registrar
        .register(&req.label, Destination::External(destination))
        .await?;
    Ok(Json(registration))
}

async fn register_smart_wallet(
    State(state): State<SharedState>,
    Json(req): Json<RegisterSmartWalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = parse_address(&req.owner, "owner address")?;
    let registration = state
        .registrar
        .register(
            &req.label,
            Destination::SmartWallet {
                owner,
                deploy_nonce: req.deploy_nonce.unwrap_or(0),
            },
        )
        .await?;
    Ok(Json(registration))
}

async fn transfer(
    State(state): State<SharedState>,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_owner = parse_address(&req.new_owner, "new owner address")?;
    let name = state
        .registrar
        .zone()
        .name(&req.label)
        .map_err(RegistrarError::from)?
        .full();
    let tx_id = state.registrar.transfer(&req.label, new_owner).await?;
    Ok(Json(TransferResponse {
        tx_id,
        name,
        new_owner,
    }))
}

fn messaging_client(state: &AppState) -> Result<&MessagingClient, ApiError> {
    state.messaging.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "messaging agent not configured",
        )
    })
}

async fn messaging_health(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let client = messaging_client(&state)?;
    let body = client
        .health()
        .await
        .map_err(|err| ApiError::new(err.http_status(), err.to_string()))?;
    Ok(Json(body))
}

async fn messaging_send(
    State(state): State<SharedState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = messaging_client(&state)?;
    let body = client
        .send(&req.address, &req.message)
        .await
        .map_err(|err| ApiError::new(err.http_status(), err.to_string()))?;
    Ok(Json(body))
}

async fn messaging_list(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let client = messaging_client(&state)?;
    let body = client
        .messages_for(&address)
        .await
        .map_err(|err| ApiError::new(err.http_status(), err.to_string()))?;
    Ok(Json(body))
}

/// Build the gateway router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/names/check", post(check_name))
        .route("/v1/names/register", post(register))
        .route("/v1/names/register-address", post(register_address))
        .route("/v1/names/register-smart-wallet", post(register_smart_wallet))
        .route("/v1/names/transfer", post(transfer))
        .route("/v1/messages/health", get(messaging_health))
        .route("/v1/messages/send", post(messaging_send))
        .route("/v1/messages/:address", get(messaging_list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the gateway until the process is stopped.
pub async fn serve(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use nomen_ledger::{LedgerRead, LedgerWrite, ReceiptWait, Signer};
    use nomen_registrar::ParentZone;
    use nomen_types::{NodeId, Receipt, SignedTransaction};

    /// Minimal ledger stub: everything unowned, nonce zero, writes never
    /// reached by these tests.
    struct StubLedger;

    #[async_trait]
    impl LedgerRead for StubLedger {
        async fn owner_of(&self, _node: &NodeId) -> nomen_ledger::Result<Address> {
            Ok(Address::ZERO)
        }

        async fn nonce_of(&self, _account: &Address) -> nomen_ledger::Result<u64> {
            Ok(0)
        }

        async fn predicted_address(
            &self,
            _factory: &Address,
            _owner: &Address,
            _deploy_nonce: u64,
        ) -> nomen_ledger::Result<Address> {
            Ok(Address([0x42; 20]))
        }

        async fn receipt_of(&self, _tx: &TxId) -> nomen_ledger::Result<Option<Receipt>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl LedgerWrite for StubLedger {
        async fn submit(&self, tx: &SignedTransaction) -> nomen_ledger::Result<TxId> {
            Ok(tx.tx_id())
        }
    }

    fn test_router() -> Router {
        let ledger = Arc::new(StubLedger);
        let registrar = Arc::new(Registrar::new(
            ledger.clone(),
            ledger,
            Arc::new(Signer::new([0xB2; 32])),
            ParentZone {
                parent_name: "kantina.base.eth".into(),
                registry: Address([0x01; 20]),
                resolver: Address([0x02; 20]),
                wallet_factory: Address([0x03; 20]),
                subnode_ttl: 0,
            },
            ReceiptWait::default(),
        ));

        router(Arc::new(AppState {
            registrar,
            messaging: None,
            start_time: Instant::now(),
        }))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_zone() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["parent_name"], "kantina.base.eth");
    }

    #[tokio::test]
    async fn check_unregistered_label() {
        let response = test_router()
            .oneshot(post_json("/v1/names/check", json!({ "label": "Alice" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["exists"], false);
        assert_eq!(body["name"], "alice.kantina.base.eth");
    }

    #[tokio::test]
    async fn malformed_label_is_a_bad_request() {
        let response = test_router()
            .oneshot(post_json("/v1/names/check", json!({ "label": "no spaces" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid label"));
    }

    #[tokio::test]
    async fn malformed_destination_is_a_bad_request() {
        let response = test_router()
            .oneshot(post_json(
                "/v1/names/register-address",
                json!({ "label": "alice", "destination": "not-an-address" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn messaging_routes_require_configuration() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/v1/messages/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
