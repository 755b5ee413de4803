use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::adapters::aws::profiles::ProfileListing;
use crate::core::errors::{MonitorError, Result};

/// The identity STS reports for the loaded credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub user_id: String,
    pub arn: String,
}

/// An authenticated AWS session: SDK config, verified identity, and the
/// runtime every SDK call in this process is driven on.
pub struct AwsSession {
    runtime: Arc<Runtime>,
    config: SdkConfig,
    pub identity: CallerIdentity,
}

impl AwsSession {
    /// Validate the profile, load credentials and confirm them with STS.
    pub fn resolve(profile: &str, region: &str) -> Result<Self> {
        ProfileListing::discover().validate(profile)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| MonitorError::AuthFailure {
                profile: profile.to_string(),
                reason: format!("Failed to create async runtime: {e}"),
            })?;

        let (config, identity) = runtime.block_on(async {
            debug!(profile, region, "loading AWS config");
            let config = aws_config::defaults(BehaviorVersion::latest())
                .profile_name(profile)
                .region(Region::new(region.to_string()))
                .load()
                .await;

            let caller = aws_sdk_sts::Client::new(&config)
                .get_caller_identity()
                .send()
                .await
                .map_err(|e| MonitorError::AuthFailure {
                    profile: profile.to_string(),
                    reason: aws_sdk_sts::error::DisplayErrorContext(&e).to_string(),
                })?;

            let identity = CallerIdentity {
                account: caller.account().unwrap_or_default().to_string(),
                user_id: caller.user_id().unwrap_or_default().to_string(),
                arn: caller.arn().unwrap_or_default().to_string(),
            };
            Ok::<_, MonitorError>((config, identity))
        })?;

        info!(account = %identity.account, arn = %identity.arn, "authenticated");

        Ok(Self {
            runtime: Arc::new(runtime),
            config,
            identity,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn runtime(&self) -> Arc<Runtime> {
        Arc::clone(&self.runtime)
    }
}
