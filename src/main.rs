use std::net::TcpListener;
use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use sfr_gateway::configuration::{get_configuration, AuthCheck, UserStoreBackend};
use sfr_gateway::startup::run;
use sfr_gateway::stepfunctions::{AwsStepFunctions, StepFunctions};
use sfr_gateway::store::{DynamoDbUserStore, InMemoryUserStore, UserStore};
use sfr_gateway::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if configuration.auth.auth_check == AuthCheck::Disabled {
        tracing::warn!("Authorization check is DISABLED; /aws routes are open");
    }

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(configuration.aws.default_region.clone()))
        .load()
        .await;
    tracing::info!(region = %configuration.aws.default_region, "AWS configuration loaded");

    let user_store: Arc<dyn UserStore> = match configuration.user_store.backend {
        UserStoreBackend::Dynamodb => {
            tracing::info!(table = %configuration.aws.user_table, "Using DynamoDB user store");
            Arc::new(DynamoDbUserStore::new(
                &sdk_config,
                configuration.aws.user_table.clone(),
            ))
        }
        UserStoreBackend::Memory => {
            tracing::warn!("Using in-memory user store; accounts are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let step_functions: Arc<dyn StepFunctions> = Arc::new(AwsStepFunctions::new(sdk_config));

    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, configuration, user_store, step_functions)?;
    tracing::info!("Server started successfully");

    server.await
}
