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

use chrono::{DateTime, Utc};
use dill::*;
use internal_error::InternalError;
use nada_datasets::DatasetID;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryAccessRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    accesses_by_id: HashMap<AccessID, Access>,
    // Insertion order, ledger listings are chronological
    access_ids: Vec<AccessID>,
}

impl State {
    fn active(&self) -> impl Iterator<Item = &Access> {
        self.access_ids
            .iter()
            .filter_map(|id| self.accesses_by_id.get(id))
            .filter(|a| a.is_active())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn AccessRepository)]
#[scope(Singleton)]
impl InMemoryAccessRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AccessRepository for InMemoryAccessRepository {
    async fn create_access(&self, access: &Access) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        if guard.accesses_by_id.contains_key(&access.id) {
            return InternalError::bail(format!("Access '{}' already exists", access.id));
        }

        guard.accesses_by_id.insert(access.id, access.clone());
        guard.access_ids.push(access.id);
        Ok(())
    }

    async fn get_access(&self, access_id: AccessID) -> Result<Access, GetAccessError> {
        let guard = self.state.lock().unwrap();
        guard
            .accesses_by_id
            .get(&access_id)
            .cloned()
            .ok_or(GetAccessError::NotFound(AccessNotFoundError { access_id }))
    }

    async fn find_active_access(
        &self,
        dataset_id: DatasetID,
        subject: &Subject,
        platform: Platform,
    ) -> Result<Option<Access>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .active()
            .find(|a| a.dataset_id == dataset_id && a.subject == *subject && a.platform == platform)
            .cloned())
    }

    async fn list_active_accesses(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Vec<Access>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .active()
            .filter(|a| a.dataset_id == dataset_id)
            .cloned()
            .collect())
    }

    async fn list_all_active_accesses(&self) -> Result<Vec<Access>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.active().cloned().collect())
    }

    async fn mark_access_revoked(
        &self,
        access_id: AccessID,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), MarkAccessRevokedError> {
        let mut guard = self.state.lock().unwrap();
        let Some(access) = guard.accesses_by_id.get_mut(&access_id) else {
            return Err(AccessNotFoundError { access_id }.into());
        };
        if access.revoked.is_some() {
            return Err(AccessAlreadyRevokedError { access_id }.into());
        }

        access.revoked = Some(revoked_at);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
