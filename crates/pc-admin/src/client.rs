//! Administration client.

use serde::Deserialize;
use tracing::{error, info, instrument};

use pcq_auth::Session;
use pcq_client::{ClientConfig, HttpClient, ServiceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{
    AzureAppRegistration, AzureOnboardingRequest, AzureSubscription, BatchOutcome, FeatureState,
    FeatureToggle, MemberFeaturesRequest,
};

/// Feature name of agentless workload scanning.
pub const AGENTLESS_SCANNING_FEATURE: &str = "Agentless Scanning";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Client for administration calls on the primary service.
///
/// Requests present the primary session token in `x-redlock-auth`.
#[derive(Debug, Clone)]
pub struct AdminClient {
    service: ServiceClient,
    session: Session,
}

impl AdminClient {
    /// Create an admin client with default HTTP settings.
    pub fn new(session: Session) -> Result<Self> {
        Self::with_config(session, ClientConfig::default())
    }

    /// Create an admin client with custom HTTP settings.
    pub fn with_config(session: Session, config: ClientConfig) -> Result<Self> {
        let service = ServiceClient::with_config(session.service_url(), config)?;
        Ok(Self { service, session })
    }

    /// Create an admin client sharing an existing HTTP client.
    pub fn from_http(http: HttpClient, session: Session) -> Self {
        Self {
            service: ServiceClient::from_http(http, session.service_url()),
            session,
        }
    }

    /// Set one feature's state for member accounts of an organization
    /// (AWS Org, Azure tenant or GCP org).
    ///
    /// Returns the server's confirmation message.
    #[instrument(skip(self, member_ids), fields(members = member_ids.len()))]
    pub async fn update_member_features(
        &self,
        org_id: &str,
        member_ids: &[String],
        feature: &str,
        state: FeatureState,
    ) -> Result<String> {
        if org_id.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "organization id is empty".to_string(),
            )));
        }
        if member_ids.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "no member account ids given".to_string(),
            )));
        }

        let body = MemberFeaturesRequest {
            member_ids: member_ids.to_vec(),
            features: vec![FeatureToggle {
                name: feature.to_string(),
                state,
            }],
        };
        let path = format!(
            "cas/api/v1/org/{}/features",
            urlencoding::encode(org_id.trim())
        );
        let request = self
            .session
            .authorize(self.service.put(&path))
            .accept("application/json")
            .json(&body)?;

        let response: MessageResponse = self.service.send_json(&request).await?;
        let message = response.message.unwrap_or_default();
        info!(message = %message, "member features updated");
        Ok(message)
    }

    /// Onboard one Azure subscription.
    ///
    /// Returns the server's response body. The request is sent at most
    /// once: a timeout or 5xx is reported, never resubmitted.
    #[instrument(
        skip(self, request),
        fields(account_id = %request.cloud_account.account_id, name = %request.cloud_account.name)
    )]
    pub async fn onboard_azure_subscription(
        &self,
        request: &AzureOnboardingRequest,
    ) -> Result<serde_json::Value> {
        let http_request = self
            .session
            .authorize(self.service.post("cas/v1/azure_account"))
            .accept("application/json")
            .json(request)?
            .at_most_once();

        let response = self.service.execute(&http_request).await?;
        let body = response.text().await?;
        info!("onboarded Azure subscription");

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }

    /// Onboard every subscription with the same app registration.
    ///
    /// Every subscription is attempted; outcomes are keyed by subscription
    /// id.
    pub async fn onboard_azure_subscriptions(
        &self,
        app: &AzureAppRegistration,
        subscriptions: &[AzureSubscription],
    ) -> BatchOutcome<Error> {
        self.onboard_azure_subscriptions_with_groups(app, subscriptions, &[])
            .await
    }

    /// Onboard every subscription into the given account groups.
    pub async fn onboard_azure_subscriptions_with_groups(
        &self,
        app: &AzureAppRegistration,
        subscriptions: &[AzureSubscription],
        group_ids: &[String],
    ) -> BatchOutcome<Error> {
        let mut outcome = BatchOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for subscription in subscriptions {
            let request =
                AzureOnboardingRequest::new(app, subscription).with_group_ids(group_ids.to_vec());
            match self.onboard_azure_subscription(&request).await {
                Ok(_) => outcome.succeeded.push(subscription.subscription_id.clone()),
                Err(e) => {
                    error!(
                        subscription_id = %subscription.subscription_id,
                        error = %e,
                        "onboarding failed"
                    );
                    outcome.failed.push((subscription.subscription_id.clone(), e));
                }
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Azure onboarding finished"
        );
        outcome
    }

    /// Set the labels of one policy.
    #[instrument(skip(self, labels))]
    pub async fn add_policy_label(&self, policy_id: &str, labels: &[String]) -> Result<()> {
        if policy_id.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "policy id is empty".to_string(),
            )));
        }

        let path = format!("policy/{}", urlencoding::encode(policy_id.trim()));
        let request = self
            .session
            .authorize(self.service.put(&path))
            .accept("application/json")
            .json(&serde_json::json!({ "labels": labels }))?;

        self.service.execute(&request).await?;
        info!("policy updated");
        Ok(())
    }

    /// Set the labels of every policy.
    ///
    /// Every policy is attempted, in order; a failure does not stop the
    /// remaining updates.
    pub async fn add_policy_labels(
        &self,
        policy_ids: &[String],
        labels: &[String],
    ) -> BatchOutcome<Error> {
        let mut outcome = BatchOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for policy_id in policy_ids {
            match self.add_policy_label(policy_id, labels).await {
                Ok(()) => outcome.succeeded.push(policy_id.clone()),
                Err(e) => {
                    error!(policy_id = %policy_id, error = %e, "policy update failed");
                    outcome.failed.push((policy_id.clone(), e));
                }
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "policy labelling finished"
        );
        outcome
    }
}
