//! Request and result types for administration calls.

use serde::{Deserialize, Serialize};

/// Desired state of an organization member feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureState {
    Enabled,
    Disabled,
}

impl std::fmt::Display for FeatureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureState::Enabled => f.write_str("enabled"),
            FeatureState::Disabled => f.write_str("disabled"),
        }
    }
}

impl std::str::FromStr for FeatureState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(FeatureState::Enabled),
            "disabled" => Ok(FeatureState::Disabled),
            other => Err(format!("unknown feature state: {other}")),
        }
    }
}

/// One feature name and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggle {
    pub name: String,
    pub state: FeatureState,
}

/// Body of `PUT cas/api/v1/org/{org_id}/features`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFeaturesRequest {
    pub member_ids: Vec<String>,
    pub features: Vec<FeatureToggle>,
}

/// Cloud account part of an Azure onboarding request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCloudAccount {
    pub account_id: String,
    pub enabled: bool,
    pub group_ids: Vec<String>,
    pub name: String,
}

/// Azure application registration used to read subscriptions.
///
/// The application secret is redacted in Debug output.
#[derive(Clone)]
pub struct AzureAppRegistration {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub service_principal_id: String,
}

impl std::fmt::Debug for AzureAppRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAppRegistration")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("service_principal_id", &self.service_principal_id)
            .finish()
    }
}

/// A subscription row from the onboarding input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AzureSubscription {
    pub subscription_id: String,
    /// Display name of the account on the platform.
    pub prisma_name: String,
}

/// Body of `POST cas/v1/azure_account`.
///
/// The `key` field holds the application secret and is redacted in Debug
/// output.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureOnboardingRequest {
    pub cloud_account: AzureCloudAccount,
    pub client_id: String,
    pub key: String,
    pub monitor_flow_logs: bool,
    pub tenant_id: String,
    pub service_principal_id: String,
}

impl std::fmt::Debug for AzureOnboardingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOnboardingRequest")
            .field("cloud_account", &self.cloud_account)
            .field("client_id", &self.client_id)
            .field("key", &"[REDACTED]")
            .field("monitor_flow_logs", &self.monitor_flow_logs)
            .field("tenant_id", &self.tenant_id)
            .field("service_principal_id", &self.service_principal_id)
            .finish()
    }
}

impl AzureOnboardingRequest {
    /// Build the request for one subscription: enabled, no account groups,
    /// flow logs off.
    pub fn new(app: &AzureAppRegistration, subscription: &AzureSubscription) -> Self {
        Self {
            cloud_account: AzureCloudAccount {
                account_id: subscription.subscription_id.clone(),
                enabled: true,
                group_ids: Vec::new(),
                name: subscription.prisma_name.clone(),
            },
            client_id: app.client_id.clone(),
            key: app.client_secret.clone(),
            monitor_flow_logs: false,
            tenant_id: app.tenant_id.clone(),
            service_principal_id: app.service_principal_id.clone(),
        }
    }

    /// Attach account groups.
    pub fn with_group_ids(mut self, group_ids: Vec<String>) -> Self {
        self.cloud_account.group_ids = group_ids;
        self
    }
}

/// Per-item results of a batch call.
#[derive(Debug, Default)]
pub struct BatchOutcome<E> {
    /// Items that succeeded, in input order.
    pub succeeded: Vec<String>,
    /// Items that failed with their error, in input order.
    pub failed: Vec<(String, E)>,
}

impl<E> BatchOutcome<E> {
    /// Returns true if no item failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of items attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
