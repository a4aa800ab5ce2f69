// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::{InternalError, ResultIntoInternal};
use url::Url;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Decides whether this process currently holds leadership
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait LeaderCheck: Send + Sync {
    async fn is_leader(&self) -> Result<bool, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Used for single-replica deployments and for runners that are safe to run
/// on every replica
pub struct AlwaysLeader;

#[async_trait::async_trait]
impl LeaderCheck for AlwaysLeader {
    async fn is_leader(&self) -> Result<bool, InternalError> {
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Queries a leader-election sidecar that answers `GET /` with the name of the
/// current leader. Without a configured elector every replica is the leader.
pub struct HttpLeaderElection {
    client: reqwest::Client,
    elector_url: Option<Url>,
    hostname: String,
}

#[derive(Debug, serde::Deserialize)]
struct ElectorResponse {
    name: String,
}

impl HttpLeaderElection {
    /// `elector_path` is a `host:port` pair as exposed by the sidecar
    pub fn new(
        elector_path: Option<&str>,
        hostname: impl Into<String>,
    ) -> Result<Self, InternalError> {
        let elector_url = match elector_path {
            None => None,
            Some(path) if path.is_empty() => None,
            Some(path) if path.starts_with("http://") || path.starts_with("https://") => {
                Some(Url::parse(path).int_err()?)
            }
            Some(path) => Some(Url::parse(&format!("http://{path}")).int_err()?),
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .int_err()?;

        Ok(Self {
            client,
            elector_url,
            hostname: hostname.into(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

#[async_trait::async_trait]
impl LeaderCheck for HttpLeaderElection {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn is_leader(&self) -> Result<bool, InternalError> {
        let Some(elector_url) = &self.elector_url else {
            return Ok(true);
        };

        let response = self
            .client
            .get(elector_url.clone())
            .send()
            .await
            .int_err()?
            .error_for_status()
            .int_err()?
            .json::<ElectorResponse>()
            .await
            .int_err()?;

        let is_leader = response.name == self.hostname;

        tracing::debug!(
            leader = %response.name,
            hostname = %self.hostname,
            is_leader,
            "Leader resolved"
        );

        Ok(is_leader)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
