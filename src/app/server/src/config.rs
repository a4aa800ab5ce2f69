// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::path::{Path, PathBuf};
use std::time::Duration;

use duration_string::DurationString;
use internal_error::{InternalError, ResultIntoInternal};
use merge::Merge;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use syncer::SyncerOptions;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const CONFIG_PATH_ENV_VAR: &str = "NADA_CONFIG";
pub const ELECTOR_PATH_ENV_VAR: &str = "ELECTOR_PATH";
pub const HOSTNAME_ENV_VAR: &str = "HOSTNAME";
pub const SHARED_SERVICE_ACCOUNT_KEY_ENV_VAR: &str = "NADA_SHARED_SERVICE_ACCOUNT_KEY";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Log output format and filter
    #[merge(strategy = merge::option::recurse)]
    pub logging: Option<LoggingConfig>,

    /// Cloud settings of the provisioning workflows
    #[merge(strategy = merge::option::recurse)]
    pub integrations: Option<IntegrationsConfig>,

    /// Mapping queue worker
    #[merge(strategy = merge::option::recurse)]
    pub mapping_queue: Option<MappingQueueConfig>,

    /// Leader election sidecar
    #[merge(strategy = merge::option::recurse)]
    pub leader_election: Option<LeaderElectionConfig>,

    /// Schedules of the reconciliation loops
    #[merge(strategy = merge::option::recurse)]
    pub syncers: Option<SyncersConfig>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            logging: None,
            integrations: None,
            mapping_queue: None,
            leader_election: None,
            syncers: None,
        }
    }

    /// Environment variables take precedence over the file, the gaps are
    /// filled from the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, InternalError> {
        let mut config = Self::from_env();

        if let Some(path) = path {
            config.merge(Self::from_file(path)?);
        }

        config.merge(Self::default());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, InternalError> {
        let content = std::fs::read_to_string(path)
            .context_int_err(format!("failed to read config from {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, InternalError> {
        serde_yaml::from_str(content).int_err()
    }

    pub fn from_env() -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            leader_election: Some(LeaderElectionConfig {
                elector_path: env(ELECTOR_PATH_ENV_VAR),
                hostname: env(HOSTNAME_ENV_VAR),
            }),
            ..Self::new()
        }
    }

    pub fn to_yaml(&self) -> Result<String, InternalError> {
        serde_yaml::to_string(self).int_err()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn syncer(&self, runner_name: &str) -> SyncerConfig {
        let configured = self
            .syncers
            .as_ref()
            .and_then(|syncers| syncers.get(runner_name))
            .cloned();

        let mut syncer = configured.unwrap_or_else(SyncerConfig::new);
        syncer.merge(SyncerConfig::default());
        syncer
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            logging: Some(LoggingConfig::default()),
            integrations: Some(IntegrationsConfig::default()),
            mapping_queue: Some(MappingQueueConfig::default()),
            leader_election: Some(LeaderElectionConfig::default()),
            syncers: Some(SyncersConfig::default()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Logging
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatConfig {
    Text,
    Json,
}

impl From<LogFormatConfig> for observability::init::LogFormat {
    fn from(value: LogFormatConfig) -> Self {
        match value {
            LogFormatConfig::Text => Self::Text,
            LogFormatConfig::Json => Self::Json,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[merge(strategy = merge::option::overwrite_none)]
pub struct LoggingConfig {
    pub format: Option<LogFormatConfig>,
    /// Used when `RUST_LOG` is not set
    pub default_filter: Option<String>,
}

impl LoggingConfig {
    pub fn format(&self) -> observability::init::LogFormat {
        self.format.unwrap_or(LogFormatConfig::Json).into()
    }

    pub fn default_filter(&self) -> &str {
        self.default_filter.as_deref().unwrap_or("info")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: Some(LogFormatConfig::Json),
            default_filter: Some("info".to_string()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Integrations
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[merge(strategy = merge::option::overwrite_none)]
pub struct IntegrationsConfig {
    pub gcp_project: Option<String>,
    pub kms_key_id: Option<String>,
    pub dataset_management_role: Option<String>,
    pub shared_service_account_email: Option<String>,
    /// JSON credentials of the shared service account. Overridden by the
    /// `NADA_SHARED_SERVICE_ACCOUNT_KEY` variable.
    pub shared_service_account_key_file: Option<PathBuf>,
    /// Log a warning when the BI tool takes longer than this to sync a
    /// database
    pub verify_warn_after: Option<DurationString>,
    /// A workflow step that has not moved for this long while no run of
    /// this process owns it is failed so the dataset can be mapped again
    pub abandoned_workflow_after: Option<DurationString>,
}

impl IntegrationsConfig {
    pub fn to_domain(&self) -> Result<nada_integrations::IntegrationsConfig, InternalError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| InternalError::new(format!("integrations.{name} is not configured")))
        };

        let shared_service_account_key = match std::env::var(SHARED_SERVICE_ACCOUNT_KEY_ENV_VAR) {
            Ok(key) if !key.is_empty() => key,
            _ => match &self.shared_service_account_key_file {
                Some(path) => std::fs::read_to_string(path).context_int_err(format!(
                    "failed to read shared service account key from {}",
                    path.display()
                ))?,
                None => {
                    return InternalError::bail(format!(
                        "shared service account key is not configured, set \
                         {SHARED_SERVICE_ACCOUNT_KEY_ENV_VAR} or \
                         integrations.sharedServiceAccountKeyFile"
                    ));
                }
            },
        };

        Ok(nada_integrations::IntegrationsConfig {
            gcp_project: required(&self.gcp_project, "gcpProject")?,
            kms_key_id: required(&self.kms_key_id, "kmsKeyId")?,
            dataset_management_role: required(
                &self.dataset_management_role,
                "datasetManagementRole",
            )?,
            shared_service_account_email: required(
                &self.shared_service_account_email,
                "sharedServiceAccountEmail",
            )?,
            shared_service_account_key: SecretString::from(shared_service_account_key),
            verify_warn_after: self
                .verify_warn_after
                .clone()
                .map_or(Duration::from_secs(60 * 60), Into::into),
            abandoned_workflow_after: self
                .abandoned_workflow_after
                .clone()
                .map_or(Duration::from_secs(30 * 60), Into::into),
        })
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            gcp_project: Some("nada-dev".to_string()),
            kms_key_id: Some(
                "projects/nada-dev/locations/europe-north1/keyRings/nada/cryptoKeys/sa-keys"
                    .to_string(),
            ),
            dataset_management_role: Some(
                "projects/nada-dev/roles/nadaDatasetMetadataViewer".to_string(),
            ),
            shared_service_account_email: Some(
                "nada-metabase@nada-dev.iam.gserviceaccount.com".to_string(),
            ),
            shared_service_account_key_file: None,
            verify_warn_after: Some(DurationString::from(Duration::from_secs(60 * 60))),
            abandoned_workflow_after: Some(DurationString::from(Duration::from_secs(30 * 60))),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Mapping queue
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[merge(strategy = merge::option::overwrite_none)]
pub struct MappingQueueConfig {
    pub capacity: Option<usize>,
    pub item_deadline: Option<DurationString>,
}

impl MappingQueueConfig {
    pub fn to_domain(&self) -> nada_integrations::MappingQueueConfig {
        let defaults = nada_integrations::MappingQueueConfig::default();

        nada_integrations::MappingQueueConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            item_deadline: self
                .item_deadline
                .clone()
                .map_or(defaults.item_deadline, Into::into),
        }
    }
}

impl Default for MappingQueueConfig {
    fn default() -> Self {
        let defaults = nada_integrations::MappingQueueConfig::default();

        Self {
            capacity: Some(defaults.capacity),
            item_deadline: Some(DurationString::from(defaults.item_deadline)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Leader election
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[merge(strategy = merge::option::overwrite_none)]
pub struct LeaderElectionConfig {
    /// `host:port` of the election sidecar. Without it this replica always
    /// considers itself the leader.
    pub elector_path: Option<String>,
    /// Name this replica is known by to the sidecar, the OS hostname by
    /// default
    pub hostname: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Syncers
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SyncersConfig {
    #[merge(strategy = merge::option::recurse)]
    pub mapping_queue_producer: Option<SyncerConfig>,
    #[merge(strategy = merge::option::recurse)]
    pub bi_tool_table_visibility: Option<SyncerConfig>,
    #[merge(strategy = merge::option::recurse)]
    pub warehouse_missing_tables: Option<SyncerConfig>,
    #[merge(strategy = merge::option::recurse)]
    pub iam_policy_drift: Option<SyncerConfig>,
    #[merge(strategy = merge::option::recurse)]
    pub bi_tool_stale_group_members: Option<SyncerConfig>,
    #[merge(strategy = merge::option::recurse)]
    pub access_expiry: Option<SyncerConfig>,
}

impl SyncersConfig {
    pub fn get(&self, runner_name: &str) -> Option<&SyncerConfig> {
        match runner_name {
            "mapping-queue-producer" => self.mapping_queue_producer.as_ref(),
            "bi-tool-table-visibility" => self.bi_tool_table_visibility.as_ref(),
            "warehouse-missing-tables" => self.warehouse_missing_tables.as_ref(),
            "iam-policy-drift" => self.iam_policy_drift.as_ref(),
            "bi-tool-stale-group-members" => self.bi_tool_stale_group_members.as_ref(),
            "access-expiry" => self.access_expiry.as_ref(),
            _ => None,
        }
    }
}

impl Default for SyncersConfig {
    fn default() -> Self {
        let every = |secs: u64, run_at_start: bool| SyncerConfig {
            run_at_start: Some(run_at_start),
            interval: Some(DurationString::from(Duration::from_secs(secs))),
            ..SyncerConfig::default()
        };

        Self {
            mapping_queue_producer: Some(every(5 * 60, true)),
            bi_tool_table_visibility: Some(every(60 * 60, false)),
            warehouse_missing_tables: Some(every(60 * 60, false)),
            iam_policy_drift: Some(every(60 * 60, false)),
            bi_tool_stale_group_members: Some(every(60 * 60, false)),
            access_expiry: Some(every(5 * 60, true)),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Merge, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[merge(strategy = merge::option::overwrite_none)]
pub struct SyncerConfig {
    pub enabled: Option<bool>,
    pub run_at_start: Option<bool>,
    pub initial_delay: Option<DurationString>,
    pub interval: Option<DurationString>,
    /// Tick only on the elected leader replica
    pub leader_only: Option<bool>,
}

impl SyncerConfig {
    pub fn new() -> Self {
        Self {
            enabled: None,
            run_at_start: None,
            initial_delay: None,
            interval: None,
            leader_only: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn is_leader_only(&self) -> bool {
        self.leader_only.unwrap_or(true)
    }

    pub fn to_options(&self) -> SyncerOptions {
        let defaults = SyncerOptions::default();

        SyncerOptions {
            run_at_start: self.run_at_start.unwrap_or(defaults.run_at_start),
            initial_delay: self
                .initial_delay
                .clone()
                .map_or(defaults.initial_delay, Into::into),
            interval: self
                .interval
                .clone()
                .map_or(defaults.interval, Into::into),
        }
    }
}

impl Default for SyncerConfig {
    fn default() -> Self {
        let defaults = SyncerOptions::default();

        Self {
            enabled: Some(true),
            run_at_start: Some(defaults.run_at_start),
            initial_delay: Some(DurationString::from(defaults.initial_delay)),
            interval: Some(DurationString::from(defaults.interval)),
            leader_only: Some(true),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
