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

pub struct InMemoryThirdPartyMappingRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    mappings_by_dataset_id: BTreeMap<DatasetID, ThirdPartyMapping>,
}

#[component(pub)]
#[interface(dyn ThirdPartyMappingRepository)]
#[scope(Singleton)]
impl InMemoryThirdPartyMappingRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

#[async_trait::async_trait]
impl ThirdPartyMappingRepository for InMemoryThirdPartyMappingRepository {
    async fn set_mapping(&self, mapping: &ThirdPartyMapping) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        guard
            .mappings_by_dataset_id
            .insert(mapping.dataset_id, mapping.clone());
        Ok(())
    }

    async fn get_mapping(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<ThirdPartyMapping>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.mappings_by_dataset_id.get(&dataset_id).cloned())
    }

    async fn list_mappings(&self) -> Result<Vec<ThirdPartyMapping>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.mappings_by_dataset_id.values().cloned().collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
