// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dill::*;
use internal_error::InternalError;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryDatasetRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    datasets_by_id: HashMap<DatasetID, Dataset>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn DatasetRepository)]
#[scope(Singleton)]
impl InMemoryDatasetRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl DatasetRepository for InMemoryDatasetRepository {
    async fn get_dataset(&self, dataset_id: DatasetID) -> Result<Dataset, GetDatasetError> {
        let guard = self.state.lock().unwrap();
        guard
            .datasets_by_id
            .get(&dataset_id)
            .cloned()
            .ok_or(GetDatasetError::NotFound(DatasetNotFoundError { dataset_id }))
    }

    async fn list_datasets(&self) -> Result<Vec<Dataset>, InternalError> {
        let guard = self.state.lock().unwrap();
        let mut datasets: Vec<_> = guard.datasets_by_id.values().cloned().collect();
        datasets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(datasets)
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        guard.datasets_by_id.insert(dataset.id, dataset.clone());
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
