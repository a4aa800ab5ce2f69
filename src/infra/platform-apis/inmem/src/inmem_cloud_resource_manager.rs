// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use dill::*;
use nada_platform_apis::*;

use crate::call_counter::CallCounter;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryCloudResourceManager {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    bindings: BTreeMap<(String, String), BTreeSet<String>>,
    calls: CallCounter,
}

#[component(pub)]
#[interface(dyn CloudResourceManagerApi)]
#[scope(Singleton)]
impl InMemoryCloudResourceManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn members(&self, project_id: &str, role: &str) -> BTreeSet<String> {
        self.state
            .lock()
            .unwrap()
            .bindings
            .get(&(project_id.to_string(), role.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.count(method)
    }
}

#[async_trait::async_trait]
impl CloudResourceManagerApi for InMemoryCloudResourceManager {
    async fn add_project_binding(
        &self,
        project_id: &str,
        role: &str,
        member: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.record("add_project_binding");
        state
            .bindings
            .entry((project_id.to_string(), role.to_string()))
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn remove_project_binding(
        &self,
        project_id: &str,
        role: &str,
        member: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.record("remove_project_binding");

        let key = (project_id.to_string(), role.to_string());
        if let Some(members) = state.bindings.get_mut(&key) {
            members.remove(member);
            if members.is_empty() {
                state.bindings.remove(&key);
            }
        }
        Ok(())
    }

    async fn list_project_bindings(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectBinding>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bindings
            .iter()
            .filter(|((project, _), _)| project == project_id)
            .map(|((_, role), members)| ProjectBinding {
                role: role.clone(),
                members: members.iter().cloned().collect(),
            })
            .collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
