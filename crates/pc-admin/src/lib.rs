//! # pcq-admin
//!
//! Administration calls on the primary service of the cloud security
//! platform.
//!
//! - Enable or disable a feature for member accounts of a cloud
//!   organization ([`AdminClient::update_member_features`])
//! - Onboard Azure subscriptions ([`AdminClient::onboard_azure_subscription`],
//!   [`AdminClient::onboard_azure_subscriptions`])
//! - Label policies ([`AdminClient::add_policy_labels`])
//!
//! Batch calls never stop at the first failure: every item is attempted and
//! the result is reported as a [`BatchOutcome`].
//!
//! Inputs are usually read from CSV files with the helpers in [`input`].

mod client;
mod error;
pub mod input;
mod types;

pub use client::{AdminClient, AGENTLESS_SCANNING_FEATURE};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    AzureAppRegistration, AzureCloudAccount, AzureOnboardingRequest, AzureSubscription,
    BatchOutcome, FeatureState, FeatureToggle, MemberFeaturesRequest,
};
