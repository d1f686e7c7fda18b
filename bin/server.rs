// Household Ledger - Web Server
// JSON API over the ledger with Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use household_ledger::{
    balances, db, entities::round_amount, installments, invoice, seed, summary, transactions,
    EntryKind, InvoicePayment, LedgerConfig, LedgerError, NewTransaction, Owner, OwnerFilter,
    Payer, ReservedCategories, ReservedNames, SplitMode, TransactionFilter, TransactionPatch,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    reserved: Arc<ReservedNames>,
}

impl AppState {
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, LedgerError>,
    ) -> Result<T, ApiError> {
        let conn = self
            .db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        Ok(f(&*conn)?)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let status = match &e {
            e if e.is_user_error() => StatusCode::BAD_REQUEST,
            LedgerError::Configuration(_) => StatusCode::CONFLICT,
            LedgerError::Batch { source, .. } if source.is_user_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %e, "request failed");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Deserialize, Default)]
struct ListQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    owner: Option<String>,
    account_id: Option<i64>,
}

impl ListQuery {
    fn into_filter(self) -> Result<TransactionFilter, ApiError> {
        let owner = match self.owner.as_deref() {
            Some(raw) => raw.parse::<OwnerFilter>()?,
            None => OwnerFilter::All,
        };
        Ok(TransactionFilter {
            start: self.start,
            end: self.end,
            owner,
            account_id: self.account_id,
        })
    }
}

#[derive(Deserialize)]
struct BalanceQuery {
    as_of: Option<NaiveDate>,
    #[serde(default)]
    include_credit: bool,
}

#[derive(Deserialize)]
struct AsOfQuery {
    as_of: Option<NaiveDate>,
}

/// Entry as typed in a form: unsigned amount + kind
#[derive(Deserialize)]
struct EntryRequest {
    date: NaiveDate,
    amount: Decimal,
    kind: EntryKind,
    #[serde(default)]
    description: String,
    account_id: i64,
    category_id: i64,
    owner: Option<Owner>,
    paid_by: Option<Payer>,
    split_mode: Option<SplitMode>,
    card_label: Option<String>,
}

impl EntryRequest {
    fn into_new(self, conn: &Connection) -> Result<NewTransaction, LedgerError> {
        let account = db::get_account(conn, self.account_id)?.ok_or(LedgerError::Reference {
            kind: "account",
            id: self.account_id,
        })?;
        let card_label = household_ledger::entities::normalize_card_label(
            account.account_type,
            self.card_label.as_deref(),
        );

        Ok(NewTransaction::new(
            self.date,
            self.kind.signed(round_amount(self.amount)),
            self.description.trim(),
            self.account_id,
            self.category_id,
        )
        .with_owner(self.owner.unwrap_or(Owner::Primary))
        .with_paid_by(self.paid_by.unwrap_or(Payer::Primary))
        .with_split_mode(self.split_mode.unwrap_or(SplitMode::None))
        .with_card_label(card_label))
    }
}

#[derive(Deserialize)]
struct InstallmentRequest {
    #[serde(flatten)]
    entry: EntryRequest,
    current: u32,
    total: u32,
}

#[derive(Deserialize)]
struct InvoiceRequest {
    origin_account_id: i64,
    destination_account_id: i64,
    amount: Decimal,
    date: Option<NaiveDate>,
    description: Option<String>,
}

#[derive(Serialize)]
struct Created {
    ids: Vec<i64>,
}

#[derive(Serialize)]
struct Changed {
    changed: bool,
}

#[derive(Serialize)]
struct CashBalances {
    total: Decimal,
    accounts: Vec<balances::AccountBalance>,
}

#[derive(Serialize)]
struct CreditBalances {
    total_owed: Decimal,
    accounts: Vec<balances::CreditOutstanding>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/transactions - Enriched listing, newest first
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<household_ledger::TransactionRow>> {
    let filter = query.into_filter()?;
    let rows = state.with_conn(|conn| transactions::list(conn, &filter))?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// POST /api/transactions - Record one entry
async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<EntryRequest>,
) -> ApiResult<Created> {
    let id = state.with_conn(|conn| {
        let new = req.into_new(conn)?;
        transactions::create(conn, &new)
    })?;
    Ok(Json(ApiResponse::ok(Created { ids: vec![id] })))
}

/// PATCH /api/transactions/:id - Partial update (missing id: changed = false)
async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TransactionPatch>,
) -> ApiResult<Changed> {
    let changed = state.with_conn(|conn| transactions::update(conn, id, &patch))?;
    Ok(Json(ApiResponse::ok(Changed { changed })))
}

/// DELETE /api/transactions/:id
async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Changed> {
    let changed = state.with_conn(|conn| transactions::delete(conn, id))?;
    Ok(Json(ApiResponse::ok(Changed { changed })))
}

/// POST /api/installments - Expand and record an installment plan
async fn create_installments(
    State(state): State<AppState>,
    Json(req): Json<InstallmentRequest>,
) -> ApiResult<Created> {
    let ids = state.with_conn(|conn| {
        let base = req.entry.into_new(conn)?;
        installments::create_installments(conn, &base, req.current, req.total)
    })?;
    Ok(Json(ApiResponse::ok(Created { ids })))
}

/// POST /api/invoice-payments - Pay a credit card invoice (two entries)
async fn pay_invoice(
    State(state): State<AppState>,
    Json(req): Json<InvoiceRequest>,
) -> ApiResult<invoice::InvoiceSettlement> {
    let payment = InvoicePayment {
        origin_account_id: req.origin_account_id,
        destination_account_id: req.destination_account_id,
        amount: req.amount,
        date: req.date.unwrap_or_else(today),
        description: req
            .description
            .unwrap_or_else(|| state.reserved.invoice.clone()),
    };
    let settlement = state.with_conn(|conn| {
        let reserved = ReservedCategories::resolve(conn, &state.reserved)?;
        invoice::settle_invoice(conn, &payment, &reserved)
    })?;
    Ok(Json(ApiResponse::ok(settlement)))
}

/// GET /api/balances - Per-account balances and cash total
async fn get_balances(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<CashBalances> {
    let as_of = query.as_of.unwrap_or_else(today);
    let result = state.with_conn(|conn| {
        Ok(CashBalances {
            total: balances::cash_total_balance(conn, Some(as_of))?,
            accounts: balances::balances_by_account(conn, query.include_credit, Some(as_of))?,
        })
    })?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/credit - Owed / in-credit per credit account
async fn get_credit(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<CreditBalances> {
    let as_of = query.as_of.unwrap_or_else(today);
    let result = state.with_conn(|conn| {
        Ok(CreditBalances {
            total_owed: balances::total_credit_outstanding(conn, Some(as_of))?,
            accounts: balances::credit_outstanding_by_account(conn, Some(as_of))?,
        })
    })?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/summary - Period income/expense and spending by category
async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<summary::PeriodSummary> {
    let filter = query.into_filter()?;
    let result = state.with_conn(|conn| summary::period_summary(conn, &filter))?;
    Ok(Json(ApiResponse::ok(result)))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            patch(update_transaction).delete(delete_transaction),
        )
        .route("/installments", post(create_installments))
        .route("/invoice-payments", post(pay_invoice))
        .route("/balances", get(get_balances))
        .route("/credit", get(get_credit))
        .route("/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    household_ledger::init_tracing();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = LedgerConfig::load(config_path.as_deref())?;

    let conn = db::open_database(&cfg.database.path, cfg.database.wal)?;
    seed::seed_defaults(&conn, &cfg.reserved_names())?;
    tracing::info!(path = %cfg.database.path.display(), "database opened");

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        reserved: Arc::new(cfg.reserved_names()),
    };

    let addr = cfg.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/transactions", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use household_ledger::{AccountType, NewAccount};
    use tower::ServiceExt;

    fn test_state() -> (AppState, i64, i64) {
        let conn = db::open_in_memory().unwrap();
        let names = ReservedNames::default();
        seed::seed_defaults(&conn, &names).unwrap();
        let bank = db::get_account_by_name(&conn, "Main checking").unwrap().unwrap().id;
        let card = db::insert_account(
            &conn,
            &NewAccount::new("Card", Owner::Primary, AccountType::Credit),
        )
        .unwrap();

        let state = AppState {
            db: Arc::new(Mutex::new(conn)),
            reserved: Arc::new(names),
        };
        (state, bank, card)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
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
    async fn test_health() {
        let (state, _, _) = test_state();
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(state), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_installments_then_list() {
        let (state, bank, _) = test_state();
        let food = state
            .with_conn(|conn| db::get_category_by_name(conn, "Food"))
            .ok()
            .flatten()
            .unwrap()
            .id;

        let (status, body) = send(
            app(state.clone()),
            post_json(
                "/api/installments",
                serde_json::json!({
                    "date": "2024-01-15", "amount": "300", "kind": "expense",
                    "description": "Sofa", "account_id": bank, "category_id": food,
                    "current": 1, "total": 3
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ids"].as_array().unwrap().len(), 3);

        let req = Request::builder()
            .uri("/api/transactions?start=2024-02-01&end=2024-02-29")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app(state), req).await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["description"], "Sofa (2/3)");
        assert_eq!(rows[0]["amount"], "-300");
    }

    #[tokio::test]
    async fn test_out_of_sequence_installments_are_bad_request() {
        let (state, bank, _) = test_state();
        let (status, body) = send(
            app(state.clone()),
            post_json(
                "/api/installments",
                serde_json::json!({
                    "date": "2024-01-15", "amount": "300", "kind": "expense",
                    "account_id": bank, "category_id": 1, "current": 3, "total": 2
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(state.with_conn(db::count_transactions).ok(), Some(0));
    }

    #[tokio::test]
    async fn test_invoice_payment_and_credit() {
        let (state, bank, card) = test_state();
        let (status, _) = send(
            app(state.clone()),
            post_json(
                "/api/invoice-payments",
                serde_json::json!({
                    "origin_account_id": bank, "destination_account_id": card,
                    "amount": "120.50", "date": "2024-03-01"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::builder()
            .uri("/api/credit?as_of=2024-03-31")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app(state), req).await;
        assert_eq!(body["data"]["total_owed"], "0");
        let cards = body["data"]["accounts"].as_array().unwrap();
        let card_row = cards.iter().find(|c| c["account"] == "Card").unwrap();
        assert_eq!(card_row["in_credit"], "120.50");
    }

    #[tokio::test]
    async fn test_patch_null_clears_card_label() {
        let (state, _, card) = test_state();
        let (status, body) = send(
            app(state.clone()),
            post_json(
                "/api/transactions",
                serde_json::json!({
                    "date": "2024-04-02", "amount": "59.90", "kind": "expense",
                    "description": "Books", "account_id": card, "category_id": 1,
                    "card_label": " 4321 "
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["ids"][0].as_i64().unwrap();

        let list = || {
            Request::builder()
                .uri(format!("/api/transactions?account_id={card}"))
                .body(Body::empty())
                .unwrap()
        };
        let (_, body) = send(app(state.clone()), list()).await;
        assert_eq!(body["data"][0]["card_label"], "4321");

        let req = Request::builder()
            .method("PATCH")
            .uri(format!("/api/transactions/{id}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"card_label": null}"#))
            .unwrap();
        let (status, body) = send(app(state.clone()), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["changed"], true);

        let (_, body) = send(app(state), list()).await;
        assert!(body["data"][0]["card_label"].is_null());
    }

    #[tokio::test]
    async fn test_patch_missing_transaction_is_soft() {
        let (state, _, _) = test_state();
        let req = Request::builder()
            .method("PATCH")
            .uri("/api/transactions/4242")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"description": "nope"}"#))
            .unwrap();
        let (status, body) = send(app(state), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["changed"], false);
    }
}
