//! Shared harness for the integration tests: a real server on a random port backed
//! by an in-memory user store and a scripted Step Functions fake.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use sfr_gateway::auth::PasswordHasher;
use sfr_gateway::configuration::{
    ApplicationSettings, AuthCheck, AuthSettings, AwsSettings, CorsSettings, Settings,
    UserStoreSettings,
};
use sfr_gateway::error::UpstreamError;
use sfr_gateway::startup::run;
use sfr_gateway::stepfunctions::{
    ExecutionDescription, ExecutionListQuery, ExecutionPage, ExecutionSummary, PageRequest,
    StartedExecution, StateMachinePage, StateMachineSummary, StepFunctions,
};
use sfr_gateway::store::{InMemoryUserStore, UserRecord};

pub const MACHINE_ARN: &str = "arn:aws:states:us-east-1:123456789012:stateMachine:orders";
pub const KNOWN_EXECUTION: &str = "arn:aws:states:us-east-1:123456789012:execution:orders:run-1";
pub const KNOWN_INPUT: &str = r#"{"order":42}"#;

/// One `StartExecution` call seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCall {
    pub region: String,
    pub machine_arn: String,
    pub input: String,
}

/// Step Functions fake. Knows a single past execution and records every start.
#[derive(Default)]
pub struct FakeStepFunctions {
    pub started: Mutex<Vec<StartCall>>,
    pub listed: Mutex<Vec<(String, ExecutionListQuery)>>,
}

fn timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[async_trait]
impl StepFunctions for FakeStepFunctions {
    async fn list_executions(
        &self,
        region: &str,
        query: ExecutionListQuery,
    ) -> Result<ExecutionPage, UpstreamError> {
        self.listed
            .lock()
            .unwrap()
            .push((region.to_string(), query.clone()));

        Ok(ExecutionPage {
            executions: vec![ExecutionSummary {
                execution_arn: KNOWN_EXECUTION.to_string(),
                state_machine_arn: query.machine_arn,
                name: "run-1".to_string(),
                status: "FAILED".to_string(),
                start_date: timestamp(),
                stop_date: Some(timestamp()),
            }],
            next_token: Some("page-2".to_string()),
        })
    }

    async fn describe_execution(
        &self,
        _region: &str,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, UpstreamError> {
        if execution_arn != KNOWN_EXECUTION {
            return Err(UpstreamError::Request(format!(
                "ExecutionDoesNotExist: {}",
                execution_arn
            )));
        }

        Ok(ExecutionDescription {
            execution_arn: KNOWN_EXECUTION.to_string(),
            state_machine_arn: MACHINE_ARN.to_string(),
            name: Some("run-1".to_string()),
            status: "FAILED".to_string(),
            start_date: timestamp(),
            stop_date: Some(timestamp()),
            input: Some(KNOWN_INPUT.to_string()),
            output: None,
        })
    }

    async fn start_execution(
        &self,
        region: &str,
        machine_arn: &str,
        input: &str,
    ) -> Result<StartedExecution, UpstreamError> {
        let mut started = self.started.lock().unwrap();
        started.push(StartCall {
            region: region.to_string(),
            machine_arn: machine_arn.to_string(),
            input: input.to_string(),
        });

        Ok(StartedExecution {
            execution_arn: format!("{}:rerun-{}", machine_arn, started.len()),
            start_date: timestamp(),
        })
    }

    async fn list_state_machines(
        &self,
        _region: &str,
        _page: PageRequest,
    ) -> Result<StateMachinePage, UpstreamError> {
        Ok(StateMachinePage {
            state_machines: vec![StateMachineSummary {
                state_machine_arn: MACHINE_ARN.to_string(),
                name: "orders".to_string(),
                r#type: "STANDARD".to_string(),
                creation_date: timestamp(),
            }],
            next_token: None,
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub step_functions: Arc<FakeStepFunctions>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Log in as the seeded user and return the response body.
    pub async fn login_alice(&self) -> Value {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&serde_json::json!({ "username": "alice", "password": "secret" }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn access_token(&self) -> String {
        self.login_alice().await["accessToken"]
            .as_str()
            .expect("accessToken should be a string")
            .to_string()
    }
}

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

fn settings(auth_check: AuthCheck, allowed_origin: &str) -> Settings {
    Settings {
        application: ApplicationSettings::default(),
        auth: AuthSettings {
            secret: "integration-test-secret".to_string(),
            access_token_ttl: 120,
            refresh_token_ttl: 86400,
            bcrypt_cost: 4,
            auth_check,
        },
        aws: AwsSettings::default(),
        user_store: UserStoreSettings::default(),
        cors: CorsSettings {
            allowed_origin: allowed_origin.to_string(),
        },
    }
}

fn alice() -> UserRecord {
    UserRecord {
        firstname: "Alice".to_string(),
        lastname: "Liddell".to_string(),
        username: "alice".to_string(),
        password: PasswordHasher::new(4)
            .hash("secret")
            .expect("Failed to hash password"),
        email: "alice@example.com".to_string(),
    }
}

pub fn spawn_app() -> TestApp {
    spawn(settings(AuthCheck::Enforced, ALLOWED_ORIGIN))
}

pub fn spawn_app_with(auth_check: AuthCheck) -> TestApp {
    spawn(settings(auth_check, ALLOWED_ORIGIN))
}

/// Server with the stock `cors.allowed_origin` of `*`
pub fn spawn_app_with_any_origin() -> TestApp {
    spawn(settings(AuthCheck::Enforced, &CorsSettings::default().allowed_origin))
}

fn spawn(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let user_store = Arc::new(InMemoryUserStore::with_users(vec![alice()]));
    let step_functions = Arc::new(FakeStepFunctions::default());

    let server = run(
        listener,
        settings,
        user_store,
        step_functions.clone(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        step_functions,
        client: reqwest::Client::new(),
    }
}
