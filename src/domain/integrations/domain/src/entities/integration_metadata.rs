// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use chrono::{DateTime, Utc};
use nada_datasets::DatasetID;
use nada_platform_apis::{CollectionID, DatabaseID, PermissionGroupID};
use serde::{Deserialize, Serialize};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    /// Database readable by every BI-tool user
    Open,
    /// Database gated by a per-dataset permission group
    Restricted,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-dataset record of the BI-tool resources provisioned for it.
///
/// Optional fields are checkpoints: each is filled by exactly one workflow
/// step, in workflow order, and a filled checkpoint means the step must not
/// be repeated.
///
/// | Checkpoint              | Filled by             | Open    | Restricted                      |
/// |-------------------------|-----------------------|---------|---------------------------------|
/// | `permission_group_id`   | PreflightCheck (open) | `0`     | unset                           |
/// |                         | PermissionGroup       |         | positive                        |
/// | `collection_id`         | Collection            | unset   | set                             |
/// | `service_account_email` | ServiceAccount        | unset   | set                             |
/// | `encrypted_private_key` | ServiceAccountKey     | unset   | ciphertext, emptied by Finalize |
/// | `database_id`           | Database              | set     | set                             |
/// | `sync_completed`        | Finalize              | set     | set                             |
/// | `deleted_at`            | first deletion step   | set     | set                             |
///
/// A row never changes shape except through [`IntegrationMetadata::reset_to_open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationMetadata {
    dataset_id: DatasetID,
    permission_group_id: Option<PermissionGroupID>,
    collection_id: Option<CollectionID>,
    service_account_email: Option<String>,
    encrypted_private_key: Option<Vec<u8>>,
    database_id: Option<DatabaseID>,
    sync_completed: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl IntegrationMetadata {
    pub fn new_open(dataset_id: DatasetID) -> Self {
        Self {
            permission_group_id: Some(PermissionGroupID::OPEN),
            ..Self::new_restricted(dataset_id)
        }
    }

    pub fn new_restricted(dataset_id: DatasetID) -> Self {
        Self {
            dataset_id,
            permission_group_id: None,
            collection_id: None,
            service_account_email: None,
            encrypted_private_key: None,
            database_id: None,
            sync_completed: None,
            deleted_at: None,
        }
    }

    pub fn dataset_id(&self) -> DatasetID {
        self.dataset_id
    }

    pub fn kind(&self) -> IntegrationKind {
        match self.permission_group_id {
            Some(id) if id.is_open_sentinel() => IntegrationKind::Open,
            _ => IntegrationKind::Restricted,
        }
    }

    pub fn is_open(&self) -> bool {
        self.kind() == IntegrationKind::Open
    }

    pub fn is_restricted(&self) -> bool {
        self.kind() == IntegrationKind::Restricted
    }

    /// Positive group id of a restricted integration, once created
    pub fn permission_group_id(&self) -> Option<PermissionGroupID> {
        self.permission_group_id
            .filter(|id| !id.is_open_sentinel())
    }

    pub fn collection_id(&self) -> Option<CollectionID> {
        self.collection_id
    }

    pub fn service_account_email(&self) -> Option<&str> {
        self.service_account_email.as_deref()
    }

    pub fn encrypted_private_key(&self) -> Option<&[u8]> {
        self.encrypted_private_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    /// The key was stored and later wiped by Finalize
    pub fn is_key_wiped(&self) -> bool {
        self.encrypted_private_key
            .as_ref()
            .is_some_and(Vec::is_empty)
    }

    pub fn database_id(&self) -> Option<DatabaseID> {
        self.database_id
    }

    pub fn sync_completed(&self) -> Option<DateTime<Utc>> {
        self.sync_completed
    }

    pub fn is_sync_completed(&self) -> bool {
        self.sync_completed.is_some()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    pub fn record_permission_group(
        &mut self,
        group_id: PermissionGroupID,
    ) -> Result<(), IntegrationShapeError> {
        self.require_restricted()?;
        if group_id.is_open_sentinel() {
            return Err(IntegrationShapeError::new(
                self.dataset_id,
                "permission group id 0 is reserved for open integrations",
            ));
        }
        self.permission_group_id = Some(group_id);
        Ok(())
    }

    pub fn record_collection(
        &mut self,
        collection_id: CollectionID,
    ) -> Result<(), IntegrationShapeError> {
        self.require_restricted()?;
        self.collection_id = Some(collection_id);
        Ok(())
    }

    pub fn record_service_account(
        &mut self,
        email: impl Into<String>,
    ) -> Result<(), IntegrationShapeError> {
        self.require_restricted()?;
        self.service_account_email = Some(email.into());
        Ok(())
    }

    pub fn record_encrypted_private_key(
        &mut self,
        ciphertext: Vec<u8>,
    ) -> Result<(), IntegrationShapeError> {
        self.require_restricted()?;
        if ciphertext.is_empty() {
            return Err(IntegrationShapeError::new(
                self.dataset_id,
                "encrypted key must not be empty",
            ));
        }
        self.encrypted_private_key = Some(ciphertext);
        Ok(())
    }

    pub fn record_database(&mut self, database_id: DatabaseID) {
        self.database_id = Some(database_id);
    }

    /// Overwrites the stored key with zero-length data
    pub fn wipe_private_key(&mut self) {
        if self.encrypted_private_key.is_some() {
            self.encrypted_private_key = Some(Vec::new());
        }
    }

    pub fn mark_sync_completed(&mut self, at: DateTime<Utc>) {
        self.sync_completed = Some(at);
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(at);
        }
    }

    /// Nothing is synced once the database is gone
    pub fn clear_database(&mut self) {
        self.database_id = None;
        self.sync_completed = None;
    }

    pub fn clear_collection(&mut self) {
        self.collection_id = None;
    }

    /// Drops the key together with the account it belongs to, so a new
    /// account gets a new key
    pub fn clear_service_account(&mut self) {
        self.service_account_email = None;
        self.encrypted_private_key = None;
    }

    pub fn clear_permission_group(&mut self) {
        if self.is_restricted() {
            self.permission_group_id = None;
        }
    }

    /// The only shape flip: restricted becomes open once the per-dataset
    /// resources are gone
    pub fn reset_to_open(&mut self) -> Result<(), IntegrationShapeError> {
        self.require_restricted()?;
        if self.service_account_email.is_some() {
            return Err(IntegrationShapeError::new(
                self.dataset_id,
                "per-dataset service account must be deleted before opening",
            ));
        }
        self.permission_group_id = Some(PermissionGroupID::OPEN);
        self.collection_id = None;
        self.encrypted_private_key = None;
        Ok(())
    }

    fn require_restricted(&self) -> Result<(), IntegrationShapeError> {
        if self.is_open() {
            return Err(IntegrationShapeError::new(
                self.dataset_id,
                "integration is open",
            ));
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
#[error("Integration of dataset '{dataset_id}' has unexpected shape: {reason}")]
pub struct IntegrationShapeError {
    pub dataset_id: DatasetID,
    pub reason: String,
}

impl IntegrationShapeError {
    pub fn new(dataset_id: DatasetID, reason: impl Into<String>) -> Self {
        Self {
            dataset_id,
            reason: reason.into(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
