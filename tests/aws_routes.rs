mod common;

use common::{spawn_app, spawn_app_with, MACHINE_ARN, KNOWN_EXECUTION, KNOWN_INPUT};
use serde_json::Value;
use sfr_gateway::configuration::AuthCheck;

// --- Gate Tests ---

#[tokio::test]
async fn aws_routes_return_401_without_authorization_header() {
    let app = spawn_app();

    for path in ["/aws/regions", "/aws/machines"] {
        let response = app
            .client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(), "GET {}", path);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "MISSING_TOKEN");
    }
    assert!(app.step_functions.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn aws_routes_reject_refresh_token() {
    let app = spawn_app();
    let login = app.login_alice().await;

    let response = app
        .client
        .get(app.url("/aws/regions"))
        .header("Authorization", login["refreshToken"].as_str().unwrap())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn aws_routes_reject_garbage_token() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/aws/regions"))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn aws_routes_treat_bare_bearer_as_missing_token() {
    let app = spawn_app();

    for header in ["Bearer ", "Bearer", "  Bearer   "] {
        let response = app
            .client
            .get(app.url("/aws/regions"))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(), "header {:?}", header);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "MISSING_TOKEN", "header {:?}", header);
    }
}

#[tokio::test]
async fn aws_routes_accept_access_token_with_or_without_bearer() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    for header in [access_token.clone(), format!("Bearer {}", access_token)] {
        let response = app
            .client
            .get(app.url("/aws/regions"))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(200, response.status().as_u16());
        let regions: Vec<String> = response.json().await.expect("Failed to parse response");
        assert!(regions.contains(&"us-east-1".to_string()));
    }
}

#[tokio::test]
async fn disabled_auth_check_forwards_unchecked() {
    let app = spawn_app_with(AuthCheck::Disabled);

    let response = app
        .client
        .get(app.url("/aws/machines"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["StateMachines"][0]["StateMachineArn"], MACHINE_ARN);
}

// --- Execution Tests ---

#[tokio::test]
async fn list_executions_passes_query_through() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .get(app.url("/aws/executions"))
        .header("Authorization", &access_token)
        .query(&[
            ("machine", MACHINE_ARN),
            ("region", "eu-west-1"),
            ("count", "10"),
            ("statusFilter", "FAILED"),
        ])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["Executions"][0]["ExecutionArn"], KNOWN_EXECUTION);
    assert_eq!(body["NextToken"], "page-2");

    let listed = app.step_functions.listed.lock().unwrap();
    let (region, query) = &listed[0];
    assert_eq!(region, "eu-west-1");
    assert_eq!(query.page.max_results, Some(10));
    assert_eq!(query.status_filter.as_deref(), Some("FAILED"));
}

#[tokio::test]
async fn list_executions_ignores_bad_count_and_status() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .get(app.url("/aws/executions"))
        .header("Authorization", &access_token)
        .query(&[
            ("machine", MACHINE_ARN),
            ("count", "lots"),
            ("statusFilter", "DONE"),
        ])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let listed = app.step_functions.listed.lock().unwrap();
    let (region, query) = &listed[0];
    assert_eq!(region, "us-east-1");
    assert_eq!(query.page.max_results, None);
    assert_eq!(query.status_filter, None);
}

#[tokio::test]
async fn list_executions_requires_machine() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .get(app.url("/aws/executions"))
        .header("Authorization", &access_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn describe_unknown_execution_returns_502() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .get(app.url("/aws/execution/arn:aws:states:us-east-1:1:execution:orders:nope"))
        .header("Authorization", &access_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(502, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn start_execution_defaults_input() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .post(app.url("/aws/execution"))
        .header("Authorization", &access_token)
        .form(&[("machine", MACHINE_ARN)])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["ExecutionArn"].as_str().unwrap().starts_with(MACHINE_ARN));
    assert!(body.get("StartDate").is_some());

    let started = app.step_functions.started.lock().unwrap();
    assert_eq!(started[0].input, "{}");
    assert_eq!(started[0].region, "us-east-1");
}

#[tokio::test]
async fn restart_reuses_original_input() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let response = app
        .client
        .post(app.url("/aws/execution/restart?region=us-west-2"))
        .header("Authorization", &access_token)
        .form(&[("machine", MACHINE_ARN), ("execution", KNOWN_EXECUTION)])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let started = app.step_functions.started.lock().unwrap();
    assert_eq!(started[0].input, KNOWN_INPUT);
    assert_eq!(started[0].region, "us-west-2");
}

#[tokio::test]
async fn batch_restart_collects_errors() {
    let app = spawn_app();
    let access_token = app.access_token().await;
    let executions = serde_json::to_string(&[KNOWN_EXECUTION, "arn:missing"]).unwrap();

    let response = app
        .client
        .post(app.url("/aws/execution/batch"))
        .header("Authorization", &access_token)
        .form(&[
            ("machine", MACHINE_ARN),
            ("executions", executions.as_str()),
            ("useOriginalInput", "true"),
        ])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["Execution"].as_array().unwrap().len(), 1);
    assert_eq!(body["Errors"].as_array().unwrap().len(), 1);
    assert!(body["Errors"][0].as_str().unwrap().contains("arn:missing"));

    let started = app.step_functions.started.lock().unwrap();
    assert_eq!(started[0].input, KNOWN_INPUT);
}

#[tokio::test]
async fn batch_restart_with_explicit_input() {
    let app = spawn_app();
    let access_token = app.access_token().await;
    let executions = serde_json::to_string(&["arn:a", "arn:b"]).unwrap();

    let response = app
        .client
        .post(app.url("/aws/execution/batch"))
        .header("Authorization", &access_token)
        .form(&[
            ("machine", MACHINE_ARN),
            ("executions", executions.as_str()),
            ("useOriginalInput", "false"),
            ("input", r#"{"retry":true}"#),
        ])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["Execution"].as_array().unwrap().len(), 2);
    assert!(body["Errors"].as_array().unwrap().is_empty());

    let started = app.step_functions.started.lock().unwrap();
    assert!(started.iter().all(|call| call.input == r#"{"retry":true}"#));
}

#[tokio::test]
async fn batch_restart_without_input_reuses_original_input() {
    let app = spawn_app();
    let access_token = app.access_token().await;
    let executions = serde_json::to_string(&[KNOWN_EXECUTION]).unwrap();

    let response = app
        .client
        .post(app.url("/aws/execution/batch"))
        .header("Authorization", &access_token)
        .form(&[
            ("machine", MACHINE_ARN),
            ("executions", executions.as_str()),
            ("useOriginalInput", "false"),
        ])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["Execution"].as_array().unwrap().len(), 1);
    assert!(body["Errors"].as_array().unwrap().is_empty());

    let started = app.step_functions.started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].input, KNOWN_INPUT);
}

#[tokio::test]
async fn batch_restart_returns_400_for_bad_form() {
    let app = spawn_app();
    let access_token = app.access_token().await;

    let test_cases = vec![
        (
            vec![
                ("machine", MACHINE_ARN),
                ("executions", "not json"),
                ("useOriginalInput", "true"),
            ],
            "executions not a JSON array",
        ),
        (
            vec![
                ("machine", MACHINE_ARN),
                ("executions", "[]"),
                ("useOriginalInput", "maybe"),
            ],
            "useOriginalInput not a boolean",
        ),
    ];

    for (form, description) in test_cases {
        let response = app
            .client
            .post(app.url("/aws/execution/batch"))
            .header("Authorization", &access_token)
            .form(&form)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject {}",
            description
        );
    }
    assert!(app.step_functions.started.lock().unwrap().is_empty());
}
