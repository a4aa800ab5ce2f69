// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dill::*;
use internal_error::InternalError;
use nada_datasets::DatasetID;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryIntegrationMetadataRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    metadata_by_dataset_id: BTreeMap<DatasetID, IntegrationMetadata>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn IntegrationMetadataRepository)]
#[scope(Singleton)]
impl InMemoryIntegrationMetadataRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl IntegrationMetadataRepository for InMemoryIntegrationMetadataRepository {
    async fn find_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.metadata_by_dataset_id.get(&dataset_id).cloned())
    }

    async fn create_metadata(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<(), CreateIntegrationMetadataError> {
        let mut guard = self.state.lock().unwrap();
        let dataset_id = metadata.dataset_id();
        if guard.metadata_by_dataset_id.contains_key(&dataset_id) {
            return Err(IntegrationMetadataAlreadyExistsError { dataset_id }.into());
        }

        guard
            .metadata_by_dataset_id
            .insert(dataset_id, metadata.clone());
        Ok(())
    }

    async fn update_metadata(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<(), UpdateIntegrationMetadataError> {
        let mut guard = self.state.lock().unwrap();
        let dataset_id = metadata.dataset_id();
        let Some(existing) = guard.metadata_by_dataset_id.get_mut(&dataset_id) else {
            return Err(IntegrationMetadataNotFoundError { dataset_id }.into());
        };

        *existing = metadata.clone();
        Ok(())
    }

    async fn delete_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<(), DeleteIntegrationMetadataError> {
        let mut guard = self.state.lock().unwrap();
        match guard.metadata_by_dataset_id.remove(&dataset_id) {
            Some(_) => Ok(()),
            None => Err(IntegrationMetadataNotFoundError { dataset_id }.into()),
        }
    }

    async fn list_metadata(&self) -> Result<Vec<IntegrationMetadata>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.metadata_by_dataset_id.values().cloned().collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
