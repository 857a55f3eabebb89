//! services/ai_gateway_service.rs
//! Cliente del gateway de IA (API estilo chat-completions).

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::support_chat_model::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct AiGatewayService {
    http_client: Client,
    gateway_url: String,
    api_key: Option<String>,
    model: String,
}

impl AiGatewayService {
    pub fn new(gateway_url: String, api_key: Option<String>, model: String) -> Self {
        AiGatewayService {
            http_client: Client::new(),
            gateway_url,
            api_key,
            model,
        }
    }

    /// Llamada sin streaming; devuelve el contenido del primer choice.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, AppError> {
        let resp = self.post(messages, Some(temperature), false).await?;

        let body: ChatCompletionResponse = resp.json().await.map_err(|e| {
            AppError::GenerationFailed(format!("Respuesta inválida del gateway: {}", e))
        })?;

        body.choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::GenerationFailed("No content generated".to_string()))
    }

    /// Llamada con `stream: true`; devuelve la respuesta SSE sin consumir.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<Response, AppError> {
        self.post(messages, None, true).await
    }

    async fn post(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
        stream: bool,
    ) -> Result<Response, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Config("AI_GATEWAY_API_KEY is not configured".to_string()))?;

        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
            stream,
        };

        let resp = self
            .http_client
            .post(&self.gateway_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::GenerationFailed(format!("Gateway de IA inaccesible: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        log::error!("(AiGatewayService::post) Error del gateway: {} {}", status, body);
        Err(map_gateway_status(status))
    }
}

/// 429 y 402 tienen errores propios; el resto es un fallo genérico.
pub fn map_gateway_status(status: StatusCode) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AppError::QuotaExceeded,
        other => AppError::GenerationFailed(format!("AI gateway returned {}", other)),
    }
}
