mod params;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::advisor::{AdvisorError, SchemeAdvisor, SchemeQuery};
use crate::config::ServerConfig;
use crate::core::{CalcError, TaxRules};

pub use params::{
    ApyParams, Calculator, FdVsPpfParams, FundText, LoanParams, NpsParams, OverlapPayload,
    PpfParams, RetirementParams, SsyParams, TaxParams,
};

pub struct AppState {
    pub tax_rules: TaxRules,
    pub advisor: Arc<dyn SchemeAdvisor>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    advisor: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/ppf",
            get(calc_get_handler::<PpfParams>).post(calc_post_handler::<PpfParams>),
        )
        .route("/api/ppf/csv", get(calc_csv_handler::<PpfParams>))
        .route(
            "/api/ssy",
            get(calc_get_handler::<SsyParams>).post(calc_post_handler::<SsyParams>),
        )
        .route("/api/ssy/csv", get(calc_csv_handler::<SsyParams>))
        .route(
            "/api/nps",
            get(calc_get_handler::<NpsParams>).post(calc_post_handler::<NpsParams>),
        )
        .route("/api/nps/csv", get(calc_csv_handler::<NpsParams>))
        .route(
            "/api/fd-vs-ppf",
            get(calc_get_handler::<FdVsPpfParams>).post(calc_post_handler::<FdVsPpfParams>),
        )
        .route(
            "/api/apy",
            get(calc_get_handler::<ApyParams>).post(calc_post_handler::<ApyParams>),
        )
        .route(
            "/api/loan",
            get(calc_get_handler::<LoanParams>).post(calc_post_handler::<LoanParams>),
        )
        .route("/api/loan/csv", get(calc_csv_handler::<LoanParams>))
        .route(
            "/api/tax",
            get(calc_get_handler::<TaxParams>).post(calc_post_handler::<TaxParams>),
        )
        .route(
            "/api/retirement",
            get(calc_get_handler::<RetirementParams>)
                .post(calc_post_handler::<RetirementParams>),
        )
        .route(
            "/api/retirement/csv",
            get(calc_csv_handler::<RetirementParams>),
        )
        .route("/api/overlap", post(calc_post_handler::<OverlapPayload>))
        .route("/api/scheme-selector", post(scheme_selector_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let tax_rules = TaxRules::fy2023_24()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    let state = Arc::new(AppState {
        tax_rules,
        advisor: Arc::new(config.advisor()),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("finlit HTTP API listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            advisor: state.advisor.backend_tag(),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calc_get_handler<C: Calculator>(
    State(state): State<Arc<AppState>>,
    Query(params): Query<C>,
) -> Response {
    calc_handler_impl(&state, params)
}

async fn calc_post_handler<C: Calculator>(
    State(state): State<Arc<AppState>>,
    Json(params): Json<C>,
) -> Response {
    calc_handler_impl(&state, params)
}

async fn calc_csv_handler<C: Calculator>(
    State(state): State<Arc<AppState>>,
    Query(params): Query<C>,
) -> Response {
    let output = match params.run(&state.tax_rules) {
        Ok(output) => output,
        Err(e) => return calc_error_response(C::NAME, e),
    };
    match C::csv(&output) {
        Some(Ok(body)) => csv_response(C::NAME, body),
        Some(Err(e)) => calc_error_response(C::NAME, e),
        None => error_response(StatusCode::NOT_FOUND, "CSV export not available"),
    }
}

fn calc_handler_impl<C: Calculator>(state: &AppState, params: C) -> Response {
    match params.run(&state.tax_rules) {
        Ok(output) => {
            info!("{} calculation served", C::NAME);
            json_response(StatusCode::OK, output)
        }
        Err(e) => calc_error_response(C::NAME, e),
    }
}

async fn scheme_selector_handler(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SchemeQuery>,
) -> Response {
    if let Err(e) = query.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }
    match state.advisor.recommend(&query).await {
        Ok(recommendation) => {
            info!(
                "scheme selector served via {} backend",
                state.advisor.backend_tag()
            );
            json_response(StatusCode::OK, recommendation)
        }
        Err(AdvisorError::InvalidQuery(msg)) => error_response(StatusCode::BAD_REQUEST, &msg),
        Err(e) => {
            warn!("scheme selector failed: {e}");
            error_response(
                StatusCode::BAD_GATEWAY,
                "Could not get a recommendation right now. Please try again later.",
            )
        }
    }
}

fn calc_error_response(name: &str, error: CalcError) -> Response {
    match error {
        CalcError::Export(msg) => {
            warn!("{name} export failed: {msg}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
        other => error_response(StatusCode::BAD_REQUEST, &other.to_string()),
    }
}

fn with_cache_control(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)).into_response())
}

fn csv_response(name: &str, body: String) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{name}.csv\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    with_cache_control(
        (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/csv; charset=utf-8"),
                ),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response(),
    )
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

pub fn render_cli<C: Calculator>(params: C, csv: bool) -> anyhow::Result<String> {
    let rules = TaxRules::fy2023_24()?;
    let output = params.run(&rules)?;
    if csv {
        match C::csv(&output) {
            Some(body) => Ok(body?),
            None => anyhow::bail!("{} has no CSV export", C::NAME),
        }
    } else {
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cli_reports_missing_csv_export() {
        let err = render_cli(ApyParams::default(), true).expect_err("no csv for apy");
        assert!(err.to_string().contains("apy"));
        let json = render_cli(ApyParams::default(), false).expect("json");
        assert!(json.contains("\"monthlyContribution\""));
    }

    #[test]
    fn render_cli_emits_retirement_csv() {
        let csv = render_cli(RetirementParams::default(), true).expect("csv");
        assert!(csv.starts_with("year,age,savings_value,sip_invested,sip_value,total_value\n"));
        assert_eq!(csv.lines().count(), 31);
    }
}
