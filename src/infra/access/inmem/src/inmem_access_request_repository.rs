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
use nada_datasets::DatasetID;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryAccessRequestRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    requests_by_id: HashMap<AccessRequestID, AccessRequest>,
    request_ids: Vec<AccessRequestID>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn AccessRequestRepository)]
#[scope(Singleton)]
impl InMemoryAccessRequestRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AccessRequestRepository for InMemoryAccessRequestRepository {
    async fn create_access_request(&self, request: &AccessRequest) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        if guard.requests_by_id.contains_key(&request.id) {
            return InternalError::bail(format!("Access request '{}' already exists", request.id));
        }

        guard.requests_by_id.insert(request.id, request.clone());
        guard.request_ids.push(request.id);
        Ok(())
    }

    async fn get_access_request(
        &self,
        request_id: AccessRequestID,
    ) -> Result<AccessRequest, GetAccessRequestError> {
        let guard = self.state.lock().unwrap();
        guard
            .requests_by_id
            .get(&request_id)
            .cloned()
            .ok_or(GetAccessRequestError::NotFound(
                AccessRequestNotFoundError { request_id },
            ))
    }

    async fn update_access_request(
        &self,
        request: &AccessRequest,
    ) -> Result<(), GetAccessRequestError> {
        let mut guard = self.state.lock().unwrap();
        let Some(existing) = guard.requests_by_id.get_mut(&request.id) else {
            return Err(AccessRequestNotFoundError {
                request_id: request.id,
            }
            .into());
        };

        *existing = request.clone();
        Ok(())
    }

    async fn list_access_requests(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Vec<AccessRequest>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .request_ids
            .iter()
            .filter_map(|id| guard.requests_by_id.get(id))
            .filter(|r| r.dataset_id == dataset_id)
            .cloned()
            .collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
