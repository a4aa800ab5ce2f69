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

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryJoinableViewRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    joinable_views_by_id: BTreeMap<JoinableViewID, JoinableView>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn JoinableViewRepository)]
#[scope(Singleton)]
impl InMemoryJoinableViewRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl JoinableViewRepository for InMemoryJoinableViewRepository {
    async fn save_joinable_view(&self, joinable_view: &JoinableView) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        guard
            .joinable_views_by_id
            .insert(joinable_view.id, joinable_view.clone());
        Ok(())
    }

    async fn list_joinable_views_for_owner_and_dataset(
        &self,
        owner: &str,
        dataset_id: DatasetID,
    ) -> Result<Vec<JoinableView>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .joinable_views_by_id
            .values()
            .filter(|jv| jv.deleted.is_none() && jv.owner.eq_ignore_ascii_case(owner))
            .filter(|jv| jv.views.iter().any(|v| v.dataset_id == dataset_id))
            .cloned()
            .collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
