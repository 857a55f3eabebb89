use std::sync::Arc;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use comunicazap_service::app;
use comunicazap_service::config::AppConfig;
use comunicazap_service::db::{run_migrations, setup_database};
use comunicazap_service::logger::init_logger;
use comunicazap_service::services::ai_gateway_service::AiGatewayService;
use comunicazap_service::services::audit_service::AuditService;
use comunicazap_service::services::auth_service::{HttpIdentityProvider, IdentityProvider};
use comunicazap_service::services::campaign_service::CampaignService;
use comunicazap_service::services::dispatch_service::DispatchService;
use comunicazap_service::services::gateway_service::{MessageGateway, WebhookGateway};
use comunicazap_service::services::instance_service::InstanceService;
use comunicazap_service::services::message_log_service::MessageLogService;
use comunicazap_service::services::support_chat_service::SupportChatService;
use comunicazap_service::services::variation_service::VariationService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env();
    if config.send_webhook_url.is_empty() {
        log::warn!("SEND_WEBHOOK_URL no definida: todos los envíos van a fallar");
    }

    // Conectarnos a la DB y migrar
    let db_pool = setup_database(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    run_migrations(&db_pool)
        .await
        .map_err(std::io::Error::other)?;

    let campaign_service = CampaignService::new(db_pool.clone());
    let log_service = MessageLogService::new(db_pool.clone());
    let instance_service = InstanceService::new(
        db_pool.clone(),
        config.evolution_api_url.clone(),
        config.evolution_api_key.clone(),
    );
    let audit_service = AuditService::new(db_pool.clone(), config.audit_log_limit);

    let gateway: Arc<dyn MessageGateway> =
        Arc::new(WebhookGateway::new(config.send_webhook_url.clone(), config.send_timeout));
    let dispatch_service = DispatchService::new(
        campaign_service.clone(),
        log_service.clone(),
        instance_service.clone(),
        gateway,
        config.send_policy,
    );

    let ai_gateway = AiGatewayService::new(
        config.ai_gateway_url.clone(),
        config.ai_gateway_api_key.clone(),
        config.ai_model.clone(),
    );
    let variation_service = VariationService::new(ai_gateway.clone(), config.variation_batch_size)
        .with_max_variations(config.max_variations);
    let support_chat_service = SupportChatService::new(db_pool.clone(), ai_gateway);

    let identity: Arc<dyn IdentityProvider> = Arc::new(HttpIdentityProvider::new(
        config.auth_url.clone(),
        config.auth_api_key.clone(),
    ));
    let identity = web::Data::from(identity);

    let bind = (config.bind_addr.clone(), config.port);
    let workers = config.http_workers;
    let config = web::Data::new(config);

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add((
                        "Access-Control-Allow-Headers",
                        "authorization, x-client-info, apikey, content-type",
                    )),
            )
            .app_data(config.clone())
            .app_data(identity.clone())
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(log_service.clone()))
            .app_data(web::Data::new(instance_service.clone()))
            .app_data(web::Data::new(audit_service.clone()))
            .app_data(web::Data::new(dispatch_service.clone()))
            .app_data(web::Data::new(variation_service.clone()))
            .app_data(web::Data::new(support_chat_service.clone()))
            .configure(app::init_app)
    })
    .workers(workers)
    .bind(bind)?
    .run()
    .await
}
