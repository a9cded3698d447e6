//! LINE Webhook Lambda - Handles attendance check-ins from group chats.
//!
//! This Lambda receives LINE Messaging API webhooks through API Gateway,
//! verifies the channel signature, records check-ins in the attendance
//! ledger and replies with the member's calendar for the month.

mod command;
mod dispatch;
mod events;
mod flex;
mod line;
mod signature;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Config, HolidayCache, HttpHolidaySource, PgStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::Command;
use crate::dispatch::{failure_message, Services};
use crate::events::{WebhookBody, WebhookEvent};
use crate::line::LineClient;
use crate::signature::SignatureValidator;

/// API Gateway proxy request (simplified)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGatewayRequest {
    headers: Option<HashMap<String, String>>,
    body: Option<String>,
    is_base64_encoded: Option<bool>,
}

impl ApiGatewayRequest {
    /// Header value, matched case-insensitively.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Raw body bytes exactly as signed by LINE.
    fn raw_body(&self) -> Result<Vec<u8>, Error> {
        let body = self.body.as_deref().unwrap_or_default();
        if self.is_base64_encoded.unwrap_or(false) {
            Ok(STANDARD
                .decode(body)
                .map_err(|e| format!("Invalid base64 body: {}", e))?)
        } else {
            Ok(body.as_bytes().to_vec())
        }
    }
}

/// API Gateway proxy response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGatewayResponse {
    status_code: u16,
    headers: HashMap<String, String>,
    body: String,
    is_base64_encoded: bool,
}

impl ApiGatewayResponse {
    fn text(status_code: u16, body: &str) -> Result<Value, Error> {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        Ok(serde_json::to_value(Self {
            status_code,
            headers,
            body: body.to_string(),
            is_base64_encoded: false,
        })?)
    }
}

/// Application state
struct AppState {
    config: Config,
    services: Services<PgStore, Option<HttpHolidaySource>>,
    line: LineClient,
    signature: SignatureValidator,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let db_credentials =
            shared::get_database_credentials(&secrets_client, &config.db_secret_arn).await?;
        let line_credentials =
            shared::get_line_credentials(&secrets_client, config.require_line_secret_arn()?).await?;

        let store = Arc::new(shared::db::connect_store(&config, &db_credentials).await?);
        let http_client = reqwest::Client::new();

        let holiday_source = config.holiday_api_url.clone().map(|url| {
            HttpHolidaySource::new(http_client.clone(), url, config.holiday_api_key.clone())
        });
        if holiday_source.is_none() {
            warn!("HOLIDAY_API_URL not set, calendars will only mark Sundays");
        }

        Ok(Self {
            services: Services::new(store, HolidayCache::new(holiday_source)),
            line: LineClient::new(http_client, line_credentials.channel_access_token),
            signature: SignatureValidator::new(line_credentials.channel_secret),
            config,
        })
    }

    async fn handle_event(&self, event: &WebhookEvent) {
        let Some(command) = event.text().and_then(Command::parse) else {
            return;
        };
        let Some(source) = event.source.as_ref().and_then(|s| s.chat_source()) else {
            warn!("Ignoring command from an unidentified sender");
            return;
        };

        info!(
            group_id = source.group_id(),
            user_id = source.user_id(),
            "Processing {:?}",
            command
        );

        if command == Command::Leave {
            if let Err(e) = self.line.leave(&source).await {
                error!("Failed to leave chat: {}", e);
            }
            return;
        }

        let messages = match self
            .services
            .execute(command, &source, self.config.local_today(), &self.line)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                error!(group_id = source.group_id(), "Command failed: {}", e);
                vec![failure_message(&e)]
            }
        };

        let Some(reply_token) = event.reply_token.as_deref() else {
            return;
        };
        if let Err(e) = self.line.reply(reply_token, messages).await {
            error!("Failed to send reply: {}", e);
        }
    }
}

/// Events in a signed body. An unreadable body yields none; it is still
/// acknowledged so LINE does not redeliver it.
fn parse_events(body: &[u8]) -> Vec<WebhookEvent> {
    match serde_json::from_slice::<WebhookBody>(body) {
        Ok(webhook) => webhook.events,
        Err(e) => {
            error!("Failed to parse webhook body: {}", e);
            Vec::new()
        }
    }
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, _context) = event.into_parts();
    let request: ApiGatewayRequest = serde_json::from_value(payload)?;

    let body = request.raw_body()?;
    let signature = request.header("x-line-signature").unwrap_or("");

    if let Err(e) = state.signature.verify(&body, signature) {
        warn!("Rejected webhook: {}", e);
        return ApiGatewayResponse::text(401, "Invalid signature");
    }

    for event in &parse_events(&body) {
        state.handle_event(event).await;
    }

    ApiGatewayResponse::text(200, "OK")
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    lambda_runtime::run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
