use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use finlit::advisor::{
    AdvisorError, Scheme, SchemeAdvisor, SchemeQuery, SchemeRecommendation,
};
use finlit::api::{AppState, router};
use finlit::core::TaxRules;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct FixedAdvisor(Option<Scheme>);

#[async_trait]
impl SchemeAdvisor for FixedAdvisor {
    fn backend_tag(&self) -> &'static str {
        "fixed"
    }

    async fn recommend(&self, query: &SchemeQuery) -> Result<SchemeRecommendation, AdvisorError> {
        query.validate()?;
        match self.0 {
            Some(scheme) => Ok(SchemeRecommendation {
                recommendation: scheme,
                reasoning: format!("Fits a {} year old.", query.age),
            }),
            None => Err(AdvisorError::Status(503)),
        }
    }
}

async fn spawn_app(advisor: FixedAdvisor) -> SocketAddr {
    let state = Arc::new(AppState {
        tax_rules: TaxRules::fy2023_24().expect("default rules"),
        advisor: Arc::new(advisor),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(addr: SocketAddr, request: String) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_ascii_lowercase(), body.to_string())
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String, String) {
    send_raw(
        addr,
        format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"),
    )
    .await
}

async fn post_json(addr: SocketAddr, path: &str, body: &str) -> (u16, String, String) {
    send_raw(
        addr,
        format!(
            "POST {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
             Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
    .await
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("json body")
}

#[tokio::test]
async fn health_reports_advisor_backend() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, head, body) = get(addr, "/healthz").await;
    assert_eq!(status, 200);
    assert!(head.contains("cache-control: no-store"));
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["advisor"], "fixed");
}

#[tokio::test]
async fn ppf_query_and_json_body_agree() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, _, from_query) = get(addr, "/api/ppf?amount=150000&tenure=15&rate=7.1").await;
    assert_eq!(status, 200);
    let (status, _, from_body) =
        post_json(addr, "/api/ppf", r#"{"amount":150000,"tenure":15,"rate":7.1}"#).await;
    assert_eq!(status, 200);

    let from_query = json(&from_query);
    assert_eq!(from_query, json(&from_body));
    let maturity = from_query["maturityValue"].as_f64().expect("maturity");
    assert!((maturity - 4_068_209.22).abs() < 0.01);
    assert_eq!(from_query["rows"].as_array().map(Vec::len), Some(15));
}

#[tokio::test]
async fn invalid_inputs_are_client_errors() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, _, body) = get(addr, "/api/ppf?amount=200000").await;
    assert_eq!(status, 400);
    assert!(json(&body)["error"].as_str().expect("message").contains("amount"));

    let (status, _, _) = get(addr, "/api/apy?age=45").await;
    assert_eq!(status, 400);

    let (status, _, _) = get(addr, "/api/loan?rate=abc").await;
    assert_eq!(status, 400);

    for path in ["/api/loan?tenure=4294967295", "/api/fd-vs-ppf?tenure=4294967295"] {
        let (status, _, body) = get(addr, path).await;
        assert_eq!(status, 400);
        assert!(json(&body)["error"].as_str().expect("message").contains("tenure"));
    }
    let (status, _, _) = get(addr, "/healthz").await;
    assert_eq!(status, 200);

    let (status, _, body) = get(addr, "/api/nowhere").await;
    assert_eq!(status, 404);
    assert_eq!(json(&body)["error"], "Not found");
}

#[tokio::test]
async fn loan_prepayment_saves_interest() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, _, body) = get(
        addr,
        "/api/loan?principal=1000000&rate=8.5&tenure=10&prepaymentAmount=200000&prepaymentMonth=24",
    )
    .await;
    assert_eq!(status, 200);
    let body = json(&body);
    let emi = body["baseline"]["emi"].as_f64().expect("emi");
    assert!((emi - 12_398.57).abs() < 0.01);
    assert_eq!(body["withPrepayment"]["months"], 92);
    assert_eq!(body["monthsSaved"], 28);
    assert!(body["interestSaved"].as_f64().expect("saved") > 150_000.0);
}

#[tokio::test]
async fn csv_export_sets_download_headers() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, head, body) = get(addr, "/api/ppf/csv").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/csv"));
    assert!(head.contains("attachment; filename=\"ppf.csv\""));
    assert!(body.starts_with("year,opening_balance,contribution,interest,closing_balance\n"));
    assert_eq!(body.lines().count(), 16);
}

#[tokio::test]
async fn tax_comparison_picks_cheaper_regime() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let (status, _, body) = post_json(addr, "/api/tax", r#"{"grossSalary":700000}"#).await;
    assert_eq!(status, 200);
    let body = json(&body);
    assert_eq!(body["newRegime"]["totalTax"], 0.0);
    assert_eq!(body["betterRegime"], "new");
}

#[tokio::test]
async fn overlap_accepts_pasted_holdings() {
    let addr = spawn_app(FixedAdvisor(None)).await;
    let payload = r#"{"funds":[
        {"name":"Alpha","holdings":"HDFCBANK,HDFC Bank,8,Financials\nINFY,Infosys,6,IT"},
        {"name":"Beta","holdings":"HDFCBANK,HDFC Bank,5,Financials\nTCS,TCS,7,IT"}
    ]}"#;
    let (status, _, body) = post_json(addr, "/api/overlap", payload).await;
    assert_eq!(status, 200);
    let body = json(&body);
    assert_eq!(body["weightedOverlap"], 5.0);
    assert_eq!(body["commonHoldings"][0]["symbol"], "HDFCBANK");

    let (status, _, _) = post_json(addr, "/api/overlap", r#"{"funds":[]}"#).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn scheme_selector_relays_advisor_outcome() {
    let query = r#"{"age":28,"riskTolerance":"low","investmentGoal":"retirement",
        "investmentHorizon":"long","currentIncome":600000}"#;

    let addr = spawn_app(FixedAdvisor(Some(Scheme::Ppf))).await;
    let (status, _, body) = post_json(addr, "/api/scheme-selector", query).await;
    assert_eq!(status, 200);
    assert_eq!(json(&body)["recommendation"], "PPF");

    let (status, _, _) = post_json(
        addr,
        "/api/scheme-selector",
        &query.replace("\"age\":28", "\"age\":12"),
    )
    .await;
    assert_eq!(status, 400);

    let failing = spawn_app(FixedAdvisor(None)).await;
    let (status, _, body) = post_json(failing, "/api/scheme-selector", query).await;
    assert_eq!(status, 502);
    assert!(!body.contains("503"));
}
