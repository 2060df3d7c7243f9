//! Delivery chat assistant
//!
//! Questions go to a Perplexity-compatible chat-completions endpoint with a
//! system prompt describing today's deliveries. Without an API key, or when
//! the endpoint fails, a reply is composed locally from the same context.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::resilience::ExternalGuard;
use crate::config::Config;
use crate::types::{Area, OrderView, RouteResult};

/// Messages kept between questions
const HISTORY_LIMIT: usize = 10;

/// Messages from history sent with each question
const HISTORY_SENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    fn name(&self) -> &'static str;
}

// ==========================================================================
// Perplexity backend
// ==========================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    return_related_questions: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

pub struct PerplexityBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl PerplexityBackend {
    pub fn new(url: &str, api_key: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for PerplexityBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.2,
            max_tokens: 500,
            top_p: 0.9,
            frequency_penalty: 0.5,
            return_related_questions: false,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send chat request")?;

        if !response.status().is_success() {
            anyhow::bail!("chat endpoint answered {}", response.status());
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("chat response had no choices")
    }

    fn name(&self) -> &'static str {
        "perplexity"
    }
}

// ==========================================================================
// Context
// ==========================================================================

/// What the assistant knows about one customer
#[derive(Debug, Clone)]
pub struct CustomerBrief {
    pub name: String,
    pub area: Area,
    pub address: String,
    /// Best slot for today with its presented failure rate
    pub best_time: Option<(String, f64)>,
}

/// Snapshot of the planner state handed to the assistant
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub today: NaiveDate,
    pub customers: Vec<CustomerBrief>,
    pub todays_orders: Vec<OrderView>,
    /// Last optimized route, if one was computed in this session
    pub route: Option<RouteResult>,
}

impl ChatContext {
    fn customer_lines(&self) -> String {
        if self.customers.is_empty() {
            return "No customer information available.".to_string();
        }
        self.customers
            .iter()
            .map(|c| format!("- {}: Area: {}, Address: {}", c.name, c.area, c.address))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn delivery_lines(&self) -> String {
        if self.todays_orders.is_empty() {
            return "No deliveries scheduled for today.".to_string();
        }
        self.todays_orders
            .iter()
            .map(|o| {
                let slot = o
                    .time_slot
                    .map_or_else(|| "unspecified time".to_string(), |s| s.to_string());
                format!(
                    "- Order #{}: {} - {} - Package: {} - Scheduled for: {} at {} - Address: {}",
                    o.order_id, o.customer, o.area, o.package_size, o.delivery_day, slot, o.address
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn route_lines(&self) -> String {
        match &self.route {
            Some(route) if !route.is_empty() => format!(
                "Optimized route: {}\nTotal distance: {}\nEstimated time: {}",
                route.route.join(" → "),
                route.total_distance,
                route.total_duration
            ),
            _ => "No route currently optimized.".to_string(),
        }
    }

    fn best_time_lines(&self) -> String {
        self.customers
            .iter()
            .map(|c| match &c.best_time {
                Some((time, rate)) => {
                    format!("- {}: Best time is around {} (Failure rate: {:.1}%)", c.name, time, rate)
                }
                None => format!("- {}: No optimal delivery time available", c.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant for a delivery courier in Ahmedabad, India.\n\
             Answer questions about pending deliveries, optimal delivery times, the current route and customers.\n\
             \n\
             Today is {}.\n\
             \n\
             CUSTOMER INFORMATION:\n{}\n\
             \n\
             TODAY'S PENDING DELIVERIES:\n{}\n\
             \n\
             ROUTE INFORMATION:\n{}\n\
             \n\
             OPTIMAL DELIVERY TIMES:\n{}\n\
             \n\
             Be brief and specific. If you do not know something, say so instead of guessing.",
            self.today.format("%A, %B %d, %Y"),
            self.customer_lines(),
            self.delivery_lines(),
            self.route_lines(),
            self.best_time_lines(),
        )
    }

    fn mentioned_customer(&self, query: &str) -> Option<&CustomerBrief> {
        self.customers
            .iter()
            .find(|c| query.contains(&c.name.to_lowercase()))
    }

    /// Local answer built from the context alone
    pub fn canned_reply(&self, query: &str) -> String {
        let query = query.to_lowercase();
        let customer = self.mentioned_customer(&query);

        if query.contains("optimal") && query.contains("time") {
            return match customer {
                Some(c) => describe_best_time(c),
                None => {
                    let lines: Vec<String> = self
                        .customers
                        .iter()
                        .filter(|c| c.best_time.is_some())
                        .map(describe_best_time)
                        .collect();
                    if lines.is_empty() {
                        "There is no delivery history yet to suggest optimal times.".to_string()
                    } else {
                        format!("Optimal delivery times for today:\n{}", lines.join("\n"))
                    }
                }
            };
        }

        if query.contains("route") {
            return self.route_lines();
        }

        if let Some(c) = customer {
            let pending = self
                .todays_orders
                .iter()
                .filter(|o| o.customer == c.name)
                .count();
            return format!(
                "{} is in the {} area at {}. {} {} pending today.",
                c.name,
                c.area,
                c.address,
                describe_best_time(c),
                match pending {
                    0 => "No orders are".to_string(),
                    1 => "One order is".to_string(),
                    n => format!("{} orders are", n),
                }
            );
        }

        if query.contains("today") || query.contains("deliveries") {
            return format!("Today's pending deliveries:\n{}", self.delivery_lines());
        }

        "I can help with today's deliveries and routes. Try asking:\n\
         • What are today's deliveries?\n\
         • What's the optimal time to deliver to [customer name]?\n\
         • Tell me about [customer name]\n\
         • Explain the current optimized route"
            .to_string()
    }
}

fn describe_best_time(customer: &CustomerBrief) -> String {
    match &customer.best_time {
        Some((time, rate)) => format!(
            "Best time for {} ({}) is around {} with a {:.1}% failure rate.",
            customer.name, customer.area, time, rate
        ),
        None => format!("There is no delivery history for {} yet.", customer.name),
    }
}

// ==========================================================================
// Assistant
// ==========================================================================

/// Answer to one question
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    /// Backend name, or "canned" for a local reply
    pub source: &'static str,
}

pub struct ChatAssistant {
    backend: Option<Box<dyn ChatBackend>>,
    guard: ExternalGuard,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatAssistant {
    pub fn new(backend: Option<Box<dyn ChatBackend>>, guard: ExternalGuard) -> Self {
        Self {
            backend,
            guard,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Perplexity when an API key is configured, canned replies otherwise
    pub fn from_config(config: &Config, guard: ExternalGuard) -> Self {
        let backend = config.chat_api_key.as_deref().and_then(|key| {
            match PerplexityBackend::new(&config.chat_api_url, key, &config.chat_model) {
                Ok(backend) => Some(Box::new(backend) as Box<dyn ChatBackend>),
                Err(e) => {
                    tracing::warn!("Chat backend unavailable ({:#}), using canned replies", e);
                    None
                }
            }
        });
        if backend.is_none() {
            info!("No chat API key configured, assistant uses canned replies");
        }
        Self::new(backend, guard)
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    pub async fn ask(&self, query: &str, context: &ChatContext) -> ChatReply {
        let Some(backend) = &self.backend else {
            return ChatReply {
                answer: context.canned_reply(query),
                source: "canned",
            };
        };

        let mut messages = vec![ChatMessage::system(context.system_prompt())];
        {
            let history = self.history.lock();
            let start = history.len().saturating_sub(HISTORY_SENT);
            messages.extend(history[start..].iter().cloned());
        }
        messages.push(ChatMessage::user(query));

        match self.guard.call(|| backend.complete(&messages)).await {
            Ok(answer) => {
                let mut history = self.history.lock();
                history.push(ChatMessage::user(query));
                history.push(ChatMessage::assistant(answer.clone()));
                let excess = history.len().saturating_sub(HISTORY_LIMIT);
                history.drain(..excess);
                ChatReply {
                    answer,
                    source: backend.name(),
                }
            }
            Err(e) => {
                debug!("Chat backend failed ({}), answering locally", e);
                ChatReply {
                    answer: context.canned_reply(query),
                    source: "canned",
                }
            }
        }
    }
}
