// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Market commentary and chat through an OpenAI-compatible chat completions API.

use crate::config::Config;
use crate::error::GoldError;
use crate::formatters::format_currency;
use crate::models::{AiAnalysis, AiPriceSnapshot, ChatMessage, Recommendation};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Value, json};

pub const ANALYSIS_TTL_MINUTES: i64 = 60;
pub const CHAT_CONTEXT_MESSAGES: usize = 10;
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f64 = 0.7;
const EMPTY_REPLY: &str = "Không thể tạo phản hồi.";

static JSON_OBJECT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Anything that can answer a list of prompt messages.
pub trait ChatBackend {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(client: Client, cfg: &Config) -> Result<Self, GoldError> {
        let key = cfg.require_openai_api_key()?;
        Ok(Self::new(client, key, cfg.openai_model.clone(), cfg.openai_base_url.clone()))
    }
}

pub fn extract_reply(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(EMPTY_REPLY)
        .to_string()
}

impl ChatBackend for OpenAiClient {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });
        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .context("Request to OpenAI failed")?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(anyhow::Error::new(GoldError::Http {
                service: "OpenAI",
                status: status.as_u16(),
            })
            .context(detail));
        }
        let body: Value = resp.json().context("Decode OpenAI response")?;
        Ok(extract_reply(&body))
    }
}

fn signed(v: f64) -> String {
    format!("{}{:.2}", if v >= 0.0 { "+" } else { "" }, v)
}

fn millions(vnd: f64) -> String {
    format!("{:.2}", vnd / 1_000_000.0)
}

pub fn analysis_prompts(s: &AiPriceSnapshot) -> Vec<PromptMessage> {
    let system = "Bạn là chuyên gia phân tích thị trường vàng với 20 năm kinh nghiệm.
Hãy phân tích ngắn gọn và đưa ra gợi ý đầu tư bằng tiếng Việt.
Luôn trả lời theo format JSON với cấu trúc:
{
  \"analysis\": \"Nội dung phân tích 3-4 câu\",
  \"recommendation\": \"BUY\" hoặc \"SELL\" hoặc \"HOLD\",
  \"confidence\": số từ 0-100 thể hiện độ tin cậy,
  \"reason\": \"Lý do ngắn gọn cho gợi ý\"
}";
    let user = format!(
        "Phân tích thị trường vàng với dữ liệu sau:
- Giá vàng thế giới: ${:.2}/oz
- Thay đổi 24h: {} ({}%)
- Cao nhất 24h: ${:.2}
- Thấp nhất 24h: ${:.2}
- Giá vàng SJC Việt Nam: {} triệu VNĐ/lượng
- Tỷ giá USD/VND: {}

Hãy phân tích xu hướng và đưa ra gợi ý.",
        s.world_price,
        signed(s.world_change),
        signed(s.world_change_percent),
        s.world_high_24h,
        s.world_low_24h,
        millions(s.vn_price),
        format_currency(s.exchange_rate, 0),
    );
    vec![
        PromptMessage::new(PromptRole::System, system),
        PromptMessage::new(PromptRole::User, user),
    ]
}

/// System prompt with current prices, the last few turns of history, then
/// the new question.
pub fn chat_prompts(s: &AiPriceSnapshot, history: &[ChatMessage], message: &str) -> Vec<PromptMessage> {
    let system = format!(
        "Bạn là trợ lý AI chuyên về thị trường vàng, tên là \"Vàng AI\".
Bạn giúp người dùng Việt Nam hiểu về giá vàng, xu hướng thị trường, và đưa ra gợi ý đầu tư.

Thông tin giá vàng hiện tại:
- Giá vàng thế giới: ${:.2}/oz ({}%)
- Giá vàng SJC: {} triệu VNĐ/lượng
- Tỷ giá: 1 USD = {} VNĐ

Quy tắc:
1. Trả lời bằng tiếng Việt, ngắn gọn và dễ hiểu
2. Luôn nhắc nhở rằng đây chỉ là tham khảo, không phải lời khuyên đầu tư chính thức
3. Nếu không biết, hãy nói thật
4. Giữ câu trả lời dưới 200 từ",
        s.world_price,
        signed(s.world_change_percent),
        millions(s.vn_price),
        format_currency(s.exchange_rate, 0),
    );
    let skip = history.len().saturating_sub(CHAT_CONTEXT_MESSAGES);
    let mut out = Vec::with_capacity(CHAT_CONTEXT_MESSAGES + 2);
    out.push(PromptMessage::new(PromptRole::System, system));
    for m in &history[skip..] {
        let role = match m.role {
            crate::models::ChatRole::User => PromptRole::User,
            crate::models::ChatRole::Assistant => PromptRole::Assistant,
        };
        out.push(PromptMessage::new(role, m.content.clone()));
    }
    out.push(PromptMessage::new(PromptRole::User, message));
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub analysis: String,
    pub recommendation: Recommendation,
    pub confidence: u8,
    pub reason: String,
}

impl ParsedAnalysis {
    /// Analysis text with the reason appended after a blank line.
    pub fn content(&self) -> String {
        if self.reason.is_empty() {
            self.analysis.clone()
        } else {
            format!("{}\n\n{}", self.analysis, self.reason)
        }
    }
}

/// Reads the JSON object embedded in a model reply. Missing or unusable
/// fields fall back to the raw text, HOLD and 50.
pub fn parse_analysis_reply(reply: &str) -> ParsedAnalysis {
    let mut parsed = ParsedAnalysis {
        analysis: reply.to_string(),
        recommendation: Recommendation::Hold,
        confidence: 50,
        reason: String::new(),
    };
    let obj = JSON_OBJECT
        .as_ref()
        .and_then(|re| re.find(reply))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());
    let Some(obj) = obj else {
        tracing::debug!("model reply is not JSON, using raw text");
        return parsed;
    };
    if let Some(a) = obj.get("analysis").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        parsed.analysis = a.to_string();
    }
    if let Some(r) = obj
        .get("recommendation")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Recommendation>().ok())
    {
        parsed.recommendation = r;
    }
    if let Some(c) = obj.get("confidence").and_then(Value::as_f64).filter(|c| *c != 0.0) {
        parsed.confidence = c.round().clamp(0.0, 100.0) as u8;
    }
    if let Some(r) = obj.get("reason").and_then(Value::as_str) {
        parsed.reason = r.to_string();
    }
    parsed
}

pub fn build_analysis(parsed: &ParsedAnalysis, snapshot: AiPriceSnapshot, now: DateTime<Utc>) -> AiAnalysis {
    AiAnalysis {
        content: parsed.content(),
        recommendation: parsed.recommendation,
        confidence: parsed.confidence,
        price_snapshot: snapshot,
        created_at: now,
        expires_at: now + Duration::minutes(ANALYSIS_TTL_MINUTES),
    }
}

/// Asks the backend for a fresh analysis of `snapshot`.
pub fn analyze_market(backend: &dyn ChatBackend, snapshot: AiPriceSnapshot, now: DateTime<Utc>) -> Result<AiAnalysis> {
    let reply = backend.complete(&analysis_prompts(&snapshot))?;
    Ok(build_analysis(&parse_analysis_reply(&reply), snapshot, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use std::cell::RefCell;

    fn snapshot() -> AiPriceSnapshot {
        AiPriceSnapshot {
            world_price: 2650.0,
            world_change: -12.5,
            world_change_percent: -0.47,
            world_high_24h: 2670.0,
            world_low_24h: 2640.0,
            vn_price: 86_000_000.0,
            exchange_rate: 25_400.0,
        }
    }

    struct Canned {
        reply: String,
        seen: RefCell<Vec<PromptMessage>>,
    }

    impl ChatBackend for Canned {
        fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
            self.seen.borrow_mut().extend_from_slice(messages);
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn reply_json_is_extracted_from_prose() {
        let reply = "Đây là phân tích:\n```json\n{\"analysis\":\"Giá đi ngang.\",\"recommendation\":\"SELL\",\"confidence\":72,\"reason\":\"USD mạnh.\"}\n```";
        let p = parse_analysis_reply(reply);
        assert_eq!(p.recommendation, Recommendation::Sell);
        assert_eq!(p.confidence, 72);
        assert_eq!(p.content(), "Giá đi ngang.\n\nUSD mạnh.");
    }

    #[test]
    fn unparseable_reply_falls_back() {
        let p = parse_analysis_reply("Thị trường khó đoán {không phải json}");
        assert_eq!(p.analysis, "Thị trường khó đoán {không phải json}");
        assert_eq!(p.recommendation, Recommendation::Hold);
        assert_eq!(p.confidence, 50);
        assert_eq!(p.content(), p.analysis);

        let partial = parse_analysis_reply(r#"{"recommendation":"MAYBE","confidence":0}"#);
        assert_eq!(partial.recommendation, Recommendation::Hold);
        assert_eq!(partial.confidence, 50);
    }

    #[test]
    fn prompts_carry_the_snapshot() {
        let msgs = analysis_prompts(&snapshot());
        assert_eq!(msgs[0].role, PromptRole::System);
        let user = &msgs[1].content;
        assert!(user.contains("$2650.00/oz"));
        assert!(user.contains("-12.50 (-0.47%)"));
        assert!(user.contains("86.00 triệu"));
        assert!(user.contains("25,400"));
    }

    #[test]
    fn chat_prompts_keep_the_last_ten_turns() {
        let now = Utc::now();
        let history: Vec<ChatMessage> = (0..14)
            .map(|i| ChatMessage {
                id: format!("m{}", i),
                role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
                content: format!("tin {}", i),
                timestamp: now,
            })
            .collect();
        let msgs = chat_prompts(&snapshot(), &history, "Có nên mua?");
        assert_eq!(msgs.len(), 12);
        assert_eq!(msgs[1].content, "tin 4");
        assert_eq!(msgs[11].content, "Có nên mua?");
        assert_eq!(msgs[11].role, PromptRole::User);
        assert_eq!(msgs[10].role, PromptRole::Assistant);
    }

    #[test]
    fn analysis_expires_after_an_hour() {
        let backend = Canned {
            reply: r#"{"analysis":"Tăng nhẹ.","recommendation":"BUY","confidence":65,"reason":""}"#.into(),
            seen: RefCell::new(Vec::new()),
        };
        let now = Utc::now();
        let a = analyze_market(&backend, snapshot(), now).unwrap();
        assert_eq!(a.recommendation, Recommendation::Buy);
        assert_eq!(a.content, "Tăng nhẹ.");
        assert_eq!(a.expires_at - a.created_at, Duration::minutes(60));
        assert_eq!(backend.seen.borrow().len(), 2);
    }

    #[test]
    fn empty_completion_gets_placeholder() {
        assert_eq!(extract_reply(&json!({"choices": []})), EMPTY_REPLY);
        assert_eq!(
            extract_reply(&json!({"choices": [{"message": {"content": "Chào"}}]})),
            "Chào"
        );
    }
}
