use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scheme {
    Ppf,
    Ssy,
    Nps,
    Apy,
    Fd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeQuery {
    pub age: u32,
    pub risk_tolerance: RiskTolerance,
    pub investment_goal: String,
    pub investment_horizon: InvestmentHorizon,
    pub current_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRecommendation {
    pub recommendation: Scheme,
    pub reasoning: String,
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("advisor endpoint is not configured")]
    NotConfigured,
    #[error("advisor request failed: {0}")]
    Transport(String),
    #[error("advisor returned status {0}")]
    Status(u16),
    #[error("advisor reply did not match schema: {0}")]
    MalformedResponse(String),
}

const MAX_GOAL_LEN: usize = 500;

impl SchemeQuery {
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if !(18..=100).contains(&self.age) {
            return Err(AdvisorError::InvalidQuery(
                "age must be between 18 and 100".to_string(),
            ));
        }
        if self.investment_goal.trim().is_empty() {
            return Err(AdvisorError::InvalidQuery(
                "investmentGoal must not be empty".to_string(),
            ));
        }
        if self.investment_goal.len() > MAX_GOAL_LEN {
            return Err(AdvisorError::InvalidQuery(format!(
                "investmentGoal must be at most {MAX_GOAL_LEN} characters"
            )));
        }
        if !self.current_income.is_finite() || self.current_income < 0.0 {
            return Err(AdvisorError::InvalidQuery(
                "currentIncome must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn build_prompt(query: &SchemeQuery) -> String {
    format!(
        "You are a financial literacy assistant for Indian investors.\n\
         Recommend exactly one government-backed savings scheme from: PPF, SSY, NPS, APY, FD.\n\
         SSY is only suitable when saving for a girl child under 10. APY is for unorganised \
         sector workers aged 18 to 40.\n\n\
         Investor profile:\n\
         - Age: {age}\n\
         - Risk tolerance: {risk:?}\n\
         - Investment goal: {goal}\n\
         - Investment horizon: {horizon:?}\n\
         - Current annual income (INR): {income:.0}\n\n\
         Reply with JSON only, matching {{\"recommendation\": \"PPF|SSY|NPS|APY|FD\", \
         \"reasoning\": \"<two or three sentences>\"}}.",
        age = query.age,
        risk = query.risk_tolerance,
        goal = query.investment_goal.trim(),
        horizon = query.investment_horizon,
        income = query.current_income,
    )
}

/// Validates a model reply. Tolerates a fenced ```json block around the object.
pub fn parse_recommendation(text: &str) -> Result<SchemeRecommendation, AdvisorError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let parsed: SchemeRecommendation = serde_json::from_str(body)
        .map_err(|e| AdvisorError::MalformedResponse(e.to_string()))?;
    if parsed.reasoning.trim().is_empty() {
        return Err(AdvisorError::MalformedResponse(
            "reasoning is empty".to_string(),
        ));
    }
    Ok(parsed)
}

#[async_trait]
pub trait SchemeAdvisor: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn recommend(&self, query: &SchemeQuery) -> Result<SchemeRecommendation, AdvisorError>;
}

#[derive(Debug, Clone)]
pub struct GenerativeAdvisorConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

pub struct GenerativeAdvisor {
    config: GenerativeAdvisorConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerativeAdvisor {
    pub fn new(config: GenerativeAdvisorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

fn reply_text(response: GenerateResponse) -> Result<String, AdvisorError> {
    response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AdvisorError::MalformedResponse("no candidates in reply".to_string()))
}

#[async_trait]
impl SchemeAdvisor for GenerativeAdvisor {
    fn backend_tag(&self) -> &'static str {
        "generative"
    }

    async fn recommend(&self, query: &SchemeQuery) -> Result<SchemeRecommendation, AdvisorError> {
        query.validate()?;
        let Some(key) = self.config.api_key.as_deref() else {
            return Err(AdvisorError::NotConfigured);
        };
        let prompt = build_prompt(query);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        debug!("advisor request to {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            warn!("advisor responded with {}", response.status());
            return Err(AdvisorError::Status(response.status().as_u16()));
        }
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::MalformedResponse(e.to_string()))?;
        parse_recommendation(&reply_text(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> SchemeQuery {
        SchemeQuery {
            age: 32,
            risk_tolerance: RiskTolerance::Low,
            investment_goal: "  daughter's higher education  ".to_string(),
            investment_horizon: InvestmentHorizon::Long,
            current_income: 1_200_000.0,
        }
    }

    #[test]
    fn prompt_carries_profile_and_schema() {
        let prompt = build_prompt(&sample_query());
        assert!(prompt.contains("Age: 32"));
        assert!(prompt.contains("Risk tolerance: Low"));
        assert!(prompt.contains("Investment goal: daughter's higher education\n"));
        assert!(prompt.contains("Investment horizon: Long"));
        assert!(prompt.contains("1200000"));
        assert!(prompt.contains("\"recommendation\": \"PPF|SSY|NPS|APY|FD\""));
    }

    #[test]
    fn parses_plain_and_fenced_replies() {
        let plain = parse_recommendation(r#"{"recommendation":"SSY","reasoning":"Girl child."}"#)
            .expect("plain reply");
        assert_eq!(plain.recommendation, Scheme::Ssy);

        let fenced = parse_recommendation(
            "```json\n{\"recommendation\": \"NPS\", \"reasoning\": \"Long horizon.\"}\n```",
        )
        .expect("fenced reply");
        assert_eq!(fenced.recommendation, Scheme::Nps);
    }

    #[test]
    fn rejects_replies_outside_the_schema() {
        for reply in [
            r#"{"recommendation":"ELSS","reasoning":"Equity."}"#,
            r#"{"recommendation":"PPF"}"#,
            r#"{"recommendation":"PPF","reasoning":"   "}"#,
            "PPF is best",
        ] {
            let err = parse_recommendation(reply).expect_err("must reject");
            assert!(matches!(err, AdvisorError::MalformedResponse(_)));
        }
    }

    #[test]
    fn query_validation_bounds() {
        let mut query = sample_query();
        assert!(query.validate().is_ok());
        query.age = 17;
        assert!(query.validate().is_err());
        query.age = 30;
        query.investment_goal = " ".to_string();
        assert!(query.validate().is_err());
        query.investment_goal = "x".repeat(MAX_GOAL_LEN + 1);
        assert!(query.validate().is_err());
    }

    #[test]
    fn query_deserializes_web_keys() {
        let query: SchemeQuery = serde_json::from_str(
            r#"{"age":45,"riskTolerance":"medium","investmentGoal":"retirement",
                "investmentHorizon":"long","currentIncome":900000}"#,
        )
        .expect("valid json");
        assert_eq!(query.risk_tolerance, RiskTolerance::Medium);
        assert_eq!(query.investment_horizon, InvestmentHorizon::Long);
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"recommendation\":"},
               {"text":"\"FD\",\"reasoning\":\"Short horizon.\"}"}]}}]}"#,
        )
        .expect("valid json");
        let text = reply_text(response).expect("text");
        assert_eq!(
            parse_recommendation(&text).expect("valid").recommendation,
            Scheme::Fd
        );

        let empty: GenerateResponse = serde_json::from_str("{}").expect("valid json");
        assert!(reply_text(empty).is_err());
    }

    #[tokio::test]
    async fn missing_api_key_is_reported_before_any_request() {
        let advisor = GenerativeAdvisor::new(GenerativeAdvisorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            timeout: Duration::from_secs(1),
        });
        let err = advisor
            .recommend(&sample_query())
            .await
            .expect_err("must fail");
        assert!(matches!(err, AdvisorError::NotConfigured));
        assert_eq!(
            advisor.endpoint(),
            "http://127.0.0.1:9/models/test-model:generateContent"
        );
    }
}
