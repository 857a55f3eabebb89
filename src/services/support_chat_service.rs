//! services/support_chat_service.rs
//! Chat de soporte con streaming SSE; guarda la conversación al terminar.

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use futures_util::StreamExt;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_timestamp};
use crate::errors::AppError;
use crate::models::support_chat_model::{ChatMessage, SupportChatMessageRecord};
use crate::services::ai_gateway_service::AiGatewayService;

const SUPPORT_SYSTEM_PROMPT: &str = "Você é o assistente de suporte do ComunicaZap, uma plataforma \
de envio de mensagens em massa pelo WhatsApp.\n\n\
Regras:\n\
- Nunca revele detalhes de banco de dados, servidores, APIs ou código.\n\
- Ensine apenas a usar a interface: conectar o WhatsApp pelo QR Code, importar e organizar \
contatos com tags, criar campanhas (use {nome} para personalizar e variações para parecer \
natural), acompanhar o histórico e gerenciar a assinatura.\n\
- Recomende testar com poucos contatos antes de enviar em massa.\n\n\
Responda de forma clara, objetiva e amigável.";

/// Canal hacia el cliente; el cierre lo marca el fin del stream
pub type ChatStream = mpsc::Receiver<Result<Bytes, std::io::Error>>;

/// Extrae `choices[0].delta.content` de las líneas `data:` de un stream SSE.
/// Tolera líneas partidas entre chunks.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    pending: Vec<u8>,
    content: String,
}

impl SseAccumulator {
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.process_line(&line);
        }
    }

    /// Procesa lo que quedó sin salto de línea y devuelve el texto acumulado.
    pub fn finish(mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        self.process_line(&rest);
        self.content
    }

    fn process_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);

        let Some(data) = line.strip_prefix("data: ") else {
            return;
        };
        if data.trim() == "[DONE]" {
            return;
        }

        // Líneas que no son JSON se ignoran
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(data) {
            if let Some(delta) = json
                .pointer("/choices/0/delta/content")
                .and_then(|v| v.as_str())
            {
                self.content.push_str(delta);
            }
        }
    }
}

#[derive(Clone)]
pub struct SupportChatService {
    db_pool: Pool<Sqlite>,
    gateway: AiGatewayService,
}

impl SupportChatService {
    pub fn new(db_pool: Pool<Sqlite>, gateway: AiGatewayService) -> Self {
        SupportChatService { db_pool, gateway }
    }

    /// Abre el stream contra el gateway y lo reenvía tal cual al cliente.
    /// La respuesta del asistente se guarda cuando el gateway termina.
    pub async fn open_stream(
        &self,
        user_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatStream, AppError> {
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(ChatMessage::system(SUPPORT_SYSTEM_PROMPT));
        full.extend(messages.iter().cloned());

        let upstream = self.gateway.stream(&full).await?;

        if let Some(last) = messages.last().filter(|m| m.role == "user") {
            if let Err(e) = self.save_message(user_id, "user", &last.content).await {
                log::error!("(open_stream) No se pudo guardar el mensaje del usuario: {:?}", e);
            }
        }

        let (mut tx, rx) = mpsc::channel(16);
        let service = self.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            let mut body = upstream.bytes_stream();
            let mut accumulator = SseAccumulator::default();
            let mut client_open = true;

            // Si el cliente se va, se sigue leyendo el gateway para guardar la respuesta
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        accumulator.push(&bytes);
                        if client_open && tx.send(Ok(bytes)).await.is_err() {
                            log::warn!("(open_stream) El cliente cerró la conexión");
                            client_open = false;
                        }
                    }
                    Err(e) => {
                        log::error!("(open_stream) Error en el stream del gateway: {:?}", e);
                        if client_open {
                            let _ = tx.send(Err(std::io::Error::other(e))).await;
                        }
                        break;
                    }
                }
            }

            let reply = accumulator.finish();
            if !reply.is_empty() {
                if let Err(e) = service.save_message(&user_id, "assistant", &reply).await {
                    log::error!("(open_stream) No se pudo guardar la respuesta: {:?}", e);
                }
            }
        });

        Ok(rx)
    }

    pub async fn save_message(&self, user_id: &str, role: &str, content: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO support_chat_messages (id, user_id, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(role)
        .bind(content)
        .bind(now_timestamp())
        .execute(&self.db_pool)
        .await
        .context("Error guardando support_chat_message")?;
        Ok(())
    }

    /// Conversación del usuario en orden cronológico
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SupportChatMessageRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, role, content, created_at
            FROM support_chat_messages
            WHERE user_id = ?1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Error listando support_chat_messages")?;

        rows.iter()
            .map(|row| -> Result<SupportChatMessageRecord> {
                let created_at: String = row.try_get("created_at")?;
                Ok(SupportChatMessageRecord {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    role: row.try_get("role")?,
                    content: row.try_get("content")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}
