//! services/dispatch_service.rs
//! Pipeline de envío de campañas.
//!
//! Crea la campaña, lanza una rama por destinatario (escalonadas según su
//! posición), registra el resultado de cada una y cierra la campaña cuando
//! todas terminaron. El fallo de un destinatario nunca aborta a los demás.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::{sleep_until, Instant};

use crate::config::SendPolicy;
use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::auth_model::AuthUser;
use crate::models::campaign_model::{
    render_message, Campaign, CampaignResult, Recipient, RecipientOutcome, SubmitCampaignRequest,
};
use crate::models::instance_model::InstanceStatus;
use crate::services::campaign_service::{CampaignCounter, CampaignService};
use crate::services::gateway_service::{MessageGateway, OutboundMessage, SendError};
use crate::services::instance_service::InstanceService;
use crate::services::message_log_service::MessageLogService;

/// Mensaje ya renderizado para un destinatario
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipient: Recipient,
    pub message: String,
}

/// Campaña creada en la base, lista para el fan-out
#[derive(Debug, Clone)]
pub struct PreparedCampaign {
    pub campaign: Campaign,
    pub instance_name: String,
    pub deliveries: Vec<Delivery>,
}

#[derive(Clone)]
pub struct DispatchService {
    campaign_service: CampaignService,
    log_service: MessageLogService,
    instance_service: InstanceService,
    gateway: Arc<dyn MessageGateway>,
    policy: SendPolicy,
}

impl DispatchService {
    pub fn new(
        campaign_service: CampaignService,
        log_service: MessageLogService,
        instance_service: InstanceService,
        gateway: Arc<dyn MessageGateway>,
        policy: SendPolicy,
    ) -> Self {
        Self {
            campaign_service,
            log_service,
            instance_service,
            gateway,
            policy,
        }
    }

    /// Prepara y ejecuta la campaña completa.
    pub async fn submit(
        &self,
        caller: &AuthUser,
        req: SubmitCampaignRequest,
    ) -> Result<CampaignResult, AppError> {
        let prepared = self.prepare(caller, req).await?;
        Ok(self.run(prepared).await)
    }

    /// Valida precondiciones y crea la campaña. Ningún log se escribe si falla.
    pub async fn prepare(
        &self,
        caller: &AuthUser,
        req: SubmitCampaignRequest,
    ) -> Result<PreparedCampaign, AppError> {
        log::info!(
            "(prepare) Solicitud de envío user={} destinatarios={} campaña={:?}",
            caller.id,
            req.recipients.len(),
            req.campaign_name
        );

        let instance = self
            .instance_service
            .find_for_user(&caller.id)
            .await?
            .ok_or(AppError::InstanceNotFound)?;

        if instance.status != InstanceStatus::Connected {
            log::warn!(
                "(prepare) Instancia '{}' en estado '{}', no se envía",
                instance.instance_name,
                instance.status.as_str()
            );
            return Err(AppError::InstanceNotConnected);
        }

        if req.recipients.is_empty() {
            return Err(AppError::NoRecipients);
        }

        let campaign_name = req
            .campaign_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Campaign {}", now_timestamp()));

        let deliveries: Vec<Delivery> = req
            .recipients
            .iter()
            .enumerate()
            .map(|(index, recipient)| Delivery {
                recipient: recipient.clone(),
                message: render_message(req.template_for(index), &recipient.name),
            })
            .collect();

        let campaign = self
            .campaign_service
            .create_campaign(&caller.id, &instance.id, &campaign_name, deliveries.len())
            .await
            .map_err(|e| {
                log::error!("(prepare) Error creando campaña: {:?}", e);
                AppError::CampaignCreateFailed(e.to_string())
            })?;

        log::info!("(prepare) Campaña creada: {}", campaign.id);

        Ok(PreparedCampaign {
            campaign,
            instance_name: instance.instance_name,
            deliveries,
        })
    }

    /// Fan-out de la campaña. Siempre termina en `completed`.
    pub async fn run(&self, prepared: PreparedCampaign) -> CampaignResult {
        let PreparedCampaign {
            campaign,
            instance_name,
            deliveries,
        } = prepared;

        let start = Instant::now();
        // Control de concurrencia de los envíos salientes
        let limiter = Semaphore::new(self.policy.max_concurrency.max(1));

        let branches = deliveries
            .into_iter()
            .enumerate()
            .map(|(index, delivery)| {
                let deadline = start + self.stagger_offset(index);
                self.deliver(&campaign.id, &instance_name, delivery, deadline, &limiter)
            });

        // El orden de finalización no importa: join_all devuelve en orden de entrada
        let outcomes = join_all(branches).await;

        if let Err(e) = self.campaign_service.complete_campaign(&campaign.id).await {
            log::error!(
                "(run) No se pudo marcar la campaña {} como completed: {:?}",
                campaign.id,
                e
            );
        }

        let result = CampaignResult::from_outcomes(campaign.id, outcomes);
        log::info!(
            "(run) Campaña {} completada: sent={} failed={}",
            result.campaign_id,
            result.sent,
            result.failed
        );
        result
    }

    fn stagger_offset(&self, index: usize) -> Duration {
        self.policy
            .stagger
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Rama de un destinatario: log pending, espera, envío y registro.
    async fn deliver(
        &self,
        campaign_id: &str,
        instance_name: &str,
        delivery: Delivery,
        deadline: Instant,
        limiter: &Semaphore,
    ) -> RecipientOutcome {
        let Delivery { recipient, message } = delivery;

        let (log_id, attempt) = match self
            .log_service
            .insert_pending(campaign_id, &recipient, &message)
            .await
        {
            Ok(log_id) => {
                sleep_until(deadline).await;
                let _permit = limiter.acquire().await.ok();

                let outbound = OutboundMessage {
                    instance_name: instance_name.to_string(),
                    recipient_name: recipient.name.clone(),
                    recipient_phone: recipient.phone.clone(),
                    rendered_message: message,
                };
                (Some(log_id), self.gateway.send(&outbound).await)
            }
            Err(e) => (None, Err(SendError::NotRecorded(e.to_string()))),
        };

        match attempt {
            Ok(()) => {
                self.record_sent(campaign_id, log_id.as_deref()).await;
                RecipientOutcome {
                    name: recipient.name,
                    phone: recipient.phone,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                let error = e.to_string();
                log::error!("(deliver) Falló el envío a {}: {}", recipient.name, error);
                self.record_failed(campaign_id, log_id.as_deref(), &recipient.phone, &error)
                    .await;
                RecipientOutcome {
                    name: recipient.name,
                    phone: recipient.phone,
                    success: false,
                    error: Some(error),
                }
            }
        }
    }

    async fn record_sent(&self, campaign_id: &str, log_id: Option<&str>) {
        if let Some(log_id) = log_id {
            if let Err(e) = self.log_service.mark_sent(log_id).await {
                log::error!("(record_sent) log={}: {:?}", log_id, e);
            }
        }
        if let Err(e) = self
            .campaign_service
            .increment(campaign_id, CampaignCounter::Sent)
            .await
        {
            log::error!("(record_sent) campaign={}: {:?}", campaign_id, e);
        }
    }

    async fn record_failed(
        &self,
        campaign_id: &str,
        log_id: Option<&str>,
        phone: &str,
        error: &str,
    ) {
        if let Err(e) = self
            .log_service
            .mark_failed(campaign_id, log_id, phone, error)
            .await
        {
            log::error!("(record_failed) phone={}: {:?}", phone, e);
        }
        if let Err(e) = self
            .campaign_service
            .increment(campaign_id, CampaignCounter::Failed)
            .await
        {
            log::error!("(record_failed) campaign={}: {:?}", campaign_id, e);
        }
    }
}
