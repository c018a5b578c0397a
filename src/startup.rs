use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{SessionFlow, SystemClock};
use crate::configuration::Settings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::{cors_policy, AuthGate};
use crate::routes::{
    batch_restart, create_user, describe_execution, health_check, list_executions, list_machines,
    list_regions, login, logout, refresh_token, restart_execution, start_execution,
};
use crate::stepfunctions::StepFunctions;
use crate::store::UserStore;

pub fn run(
    listener: TcpListener,
    settings: Settings,
    user_store: Arc<dyn UserStore>,
    step_functions: Arc<dyn StepFunctions>,
) -> Result<Server, std::io::Error> {
    let session = SessionFlow::from_settings(&settings.auth, user_store, Arc::new(SystemClock));
    let verifier = session.verifier().clone();
    let auth_check = settings.auth.auth_check;
    let cors_settings = settings.cors.clone();

    let session = web::Data::new(session);
    let step_functions = web::Data::new(step_functions);
    let aws_settings = web::Data::new(settings.aws.clone());

    let server = HttpServer::new(move || {
        // Undecodable bodies and queries use the JSON error envelope.
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
        let form_config = web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
        let query_config = web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

        App::new()
            // Global middleware
            .wrap(cors_policy(&cors_settings))
            .wrap(LoggerMiddleware) // Transaction id and request logging
            .wrap(Logger::default()) // Access log

            // Shared state
            .app_data(session.clone())
            .app_data(step_functions.clone())
            .app_data(aws_settings.clone())
            .app_data(json_config)
            .app_data(form_config)
            .app_data(query_config)

            // Public routes
            .route("/healthcheck", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/createuser", web::post().to(create_user))
            .route("/refreshtoken", web::post().to(refresh_token))
            .route("/logout", web::get().to(logout))

            // Step Functions routes (require an access token)
            .service(
                web::scope("/aws")
                    .wrap(AuthGate::new(verifier.clone(), auth_check))
                    .route("/regions", web::get().to(list_regions))
                    .route("/machines", web::get().to(list_machines))
                    .route("/executions", web::get().to(list_executions))
                    .route("/execution", web::post().to(start_execution))
                    .route("/execution/restart", web::post().to(restart_execution))
                    .route("/execution/batch", web::post().to(batch_restart))
                    .route("/execution/{execution}", web::get().to(describe_execution)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
