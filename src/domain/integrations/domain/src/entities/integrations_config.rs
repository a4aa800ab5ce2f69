// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::time::Duration;

use secrecy::SecretString;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cloud settings used by the provisioning workflows
#[derive(Debug)]
pub struct IntegrationsConfig {
    /// Project hosting the per-dataset service accounts
    pub gcp_project: String,
    /// KMS key encrypting service account keys at rest
    pub kms_key_id: String,
    /// Custom project role letting the BI tool run queries and read metadata
    pub dataset_management_role: String,
    /// Identity the BI tool uses for all open databases
    pub shared_service_account_email: String,
    pub shared_service_account_key: SecretString,
    /// Verify keeps being retried, but after this long a warning is logged
    pub verify_warn_after: Duration,
    /// Running workflows no run of this process owns are failed once their
    /// current step is older than this
    pub abandoned_workflow_after: Duration,
}

#[cfg(any(feature = "testing", test))]
impl IntegrationsConfig {
    pub fn sample() -> Self {
        Self {
            gcp_project: "nada-prod".to_string(),
            kms_key_id: "projects/nada-prod/locations/europe-north1/keyRings/nada/cryptoKeys/sa-keys"
                .to_string(),
            dataset_management_role: "projects/nada-prod/roles/nadaDatasetMetadataViewer"
                .to_string(),
            shared_service_account_email: "nada-metabase@nada-prod.iam.gserviceaccount.com"
                .to_string(),
            shared_service_account_key: SecretString::from(
                r#"{"type":"service_account","client_email":"nada-metabase@nada-prod.iam.gserviceaccount.com"}"#,
            ),
            verify_warn_after: Duration::from_secs(60 * 60),
            abandoned_workflow_after: Duration::from_secs(30 * 60),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct MappingQueueConfig {
    /// Items beyond this block producers until the worker catches up
    pub capacity: usize,
    /// Deadline for mapping a single dataset
    pub item_deadline: Duration,
}

impl Default for MappingQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            item_deadline: Duration::from_secs(5 * 60),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
