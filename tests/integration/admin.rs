use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pcq::admin::FeatureState;
use pcq::cli::{self, AgentlessMembersArgs, LabelPoliciesArgs, OnboardAzureArgs};

use crate::common::{config_for, mount_primary_login, PRIMARY_TOKEN};

#[tokio::test]
async fn label_policies_attempts_every_policy() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;

    for (id, status) in [("p-1", 200), ("p-2", 500), ("p-3", 200)] {
        Mock::given(method("PUT"))
            .and(path(format!("/policy/{id}")))
            .and(header("x-redlock-auth", PRIMARY_TOKEN))
            .and(body_json(json!({"labels": ["Retain_Severity"]})))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("policy_ids.csv");
    std::fs::write(&csv, "PolicyIDs\np-1\np-2\np-3\n").unwrap();

    let args = LabelPoliciesArgs {
        csv,
        column: "PolicyIDs".to_string(),
        labels: vec!["Retain_Severity".to_string()],
    };
    let err = cli::label_policies(&config_for(&server), args)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "1 of 3 policies failed");

    let received = server.received_requests().await.unwrap();
    let updated: Vec<String> = received
        .iter()
        .filter(|r| r.url.path().starts_with("/policy/"))
        .map(|r| r.url.path().to_string())
        .collect();
    // p-2 is retried on 500 before giving up.
    assert!(updated.contains(&"/policy/p-3".to_string()));
    assert_eq!(updated.first().map(String::as_str), Some("/policy/p-1"));
}

#[tokio::test]
async fn agentless_members_prompts_for_org_id() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;

    Mock::given(method("PUT"))
        .and(path("/cas/api/v1/org/o-42/features"))
        .and(body_json(json!({
            "memberIds": ["111111111111", "222222222222"],
            "features": [{"name": "Agentless Scanning", "state": "disabled"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("member_accounts.csv");
    std::fs::write(&csv, "member_account_id\n111111111111\n222222222222\n").unwrap();

    let args = AgentlessMembersArgs {
        org_id: None,
        members_csv: csv,
        column: "member_account_id".to_string(),
        state: FeatureState::Disabled,
        feature: "Agentless Scanning".to_string(),
    };
    let mut input = std::io::Cursor::new("o-42\n");
    cli::agentless_members(&config_for(&server), args, &mut input)
        .await
        .unwrap();
}

#[tokio::test]
async fn onboard_azure_posts_each_subscription() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/cas/v1/azure_account"))
        .and(header("x-redlock-auth", PRIMARY_TOKEN))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("azure_details.csv");
    std::fs::write(&csv, "subscription_id,prisma_name\nsub-1,Prod\nsub-2,Dev\n").unwrap();

    let args = OnboardAzureArgs {
        tenant_id: "tenant".to_string(),
        client_id: "client".to_string(),
        service_principal_id: "sp".to_string(),
        csv,
        group_ids: Vec::new(),
    };
    cli::onboard_azure(&config_for(&server), args, "app-secret".to_string())
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let bodies: Vec<serde_json::Value> = received
        .iter()
        .filter(|r| r.url.path() == "/cas/v1/azure_account")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(bodies[0]["cloudAccount"]["accountId"], "sub-1");
    assert_eq!(bodies[1]["cloudAccount"]["name"], "Dev");
    assert_eq!(bodies[1]["key"], "app-secret");
}
