//! handlers/campaign_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::campaign_model::{CampaignDetails, SubmitCampaignRequest};
use crate::models::risk_model::{RiskAssessment, RiskQuery};
use crate::services::auth_service::{resolve_caller, IdentityProvider};
use crate::services::campaign_service::CampaignService;
use crate::services::dispatch_service::DispatchService;
use crate::services::message_log_service::MessageLogService;

/// POST /api/campaigns/send
pub async fn send_campaign_endpoint(
    req: HttpRequest,
    body: web::Json<SubmitCampaignRequest>,
    identity: web::Data<dyn IdentityProvider>,
    dispatch_service: web::Data<DispatchService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    let req_body = body.into_inner();
    let async_send = req_body.async_send;

    let prepared = match dispatch_service.prepare(&caller, req_body).await {
        Ok(prepared) => prepared,
        Err(e) => {
            log::error!("(send_campaign_endpoint) {}", e);
            return e.to_response();
        }
    };
    let campaign_id = prepared.campaign.id.clone();
    let total = prepared.deliveries.len();

    // La campaña corre en su propia tarea: cortar la petición no la cancela
    let service = dispatch_service.get_ref().clone();
    let handle = tokio::spawn(async move { service.run(prepared).await });

    if async_send {
        return HttpResponse::Ok().json(json!({
            "success": true,
            "campaign": campaign_id,
            "total": total,
            "message": "Campaign queued for async processing"
        }));
    }

    match handle.await {
        Ok(result) => HttpResponse::Ok().json(json!({
            "success": true,
            "campaign": result.campaign_id,
            "results": {
                "total": result.total,
                "sent": result.sent,
                "failed": result.failed
            },
            "outcomes": result.outcomes
        })),
        Err(e) => {
            log::error!("(send_campaign_endpoint) La tarea de la campaña falló: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "campaign": campaign_id,
                "error": "Campaign task failed"
            }))
        }
    }
}

/// GET /api/campaigns
pub async fn list_campaigns_endpoint(
    req: HttpRequest,
    identity: web::Data<dyn IdentityProvider>,
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    match campaign_service.list_for_user(&caller.id).await {
        Ok(campaigns) => HttpResponse::Ok().json(campaigns),
        Err(e) => AppError::from(e).to_response(),
    }
}

/// GET /api/campaigns/{id}
pub async fn get_campaign_endpoint(
    req: HttpRequest,
    path: web::Path<String>,
    identity: web::Data<dyn IdentityProvider>,
    campaign_service: web::Data<CampaignService>,
    log_service: web::Data<MessageLogService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };
    let campaign_id = path.into_inner();

    let campaign = match campaign_service.get_campaign(&campaign_id).await {
        // Una campaña ajena se reporta igual que una inexistente
        Ok(Some(campaign)) if campaign.user_id == caller.id => campaign,
        Ok(_) => return AppError::CampaignNotFound.to_response(),
        Err(e) => return AppError::from(e).to_response(),
    };

    match log_service.list_for_campaign(&campaign.id).await {
        Ok(logs) => HttpResponse::Ok().json(CampaignDetails { campaign, logs }),
        Err(e) => AppError::from(e).to_response(),
    }
}

/// GET /api/campaigns/risk?contacts=N
pub async fn campaign_risk_endpoint(
    req: HttpRequest,
    query: web::Query<RiskQuery>,
    identity: web::Data<dyn IdentityProvider>,
    campaign_service: web::Data<CampaignService>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    match campaign_service.count_sent_today(&caller.id).await {
        Ok(sent_today) => HttpResponse::Ok().json(RiskAssessment::assess(
            query.contacts,
            config.daily_send_limit,
            sent_today,
        )),
        Err(e) => AppError::from(e).to_response(),
    }
}
