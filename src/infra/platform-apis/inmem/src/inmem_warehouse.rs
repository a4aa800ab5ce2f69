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

pub struct InMemoryWarehouse {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    tables: BTreeMap<TableRef, WarehouseTable>,
    policies: BTreeMap<TableRef, TablePolicy>,
    calls: CallCounter,
}

impl State {
    fn require_table(&self, table: &TableRef) -> Result<(), ApiError> {
        if self.tables.contains_key(table) {
            Ok(())
        } else {
            Err(ApiError::not_found("table", table))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WarehouseApi)]
#[scope(Singleton)]
impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn add_table(&self, table: WarehouseTable) {
        let mut state = self.state.lock().unwrap();
        state.tables.insert(table.table_ref.clone(), table);
    }

    /// Simulates a table dropped outside of the platform
    pub fn drop_table(&self, table: &TableRef) {
        let mut state = self.state.lock().unwrap();
        state.tables.remove(table);
        state.policies.remove(table);
    }

    /// Members holding any role on the table
    pub fn members(&self, table: &TableRef) -> BTreeSet<String> {
        let state = self.state.lock().unwrap();
        state
            .policies
            .get(table)
            .map(|policy| policy.bindings.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_reader(&self, table: &TableRef, member: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .policies
            .get(table)
            .is_some_and(|policy| policy.has_member(WAREHOUSE_DATA_VIEWER_ROLE, member))
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.count(method)
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().calls.total()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WarehouseApi for InMemoryWarehouse {
    async fn grant(&self, table: &TableRef, member: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_table(table)?;
        state.calls.record("grant");

        state
            .policies
            .entry(table.clone())
            .or_default()
            .bindings
            .entry(WAREHOUSE_DATA_VIEWER_ROLE.to_string())
            .or_default()
            .insert(member.to_string());

        Ok(())
    }

    async fn revoke(&self, table: &TableRef, member: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_table(table)?;
        state.calls.record("revoke");

        if let Some(members) = state
            .policies
            .get_mut(table)
            .and_then(|policy| policy.bindings.get_mut(WAREHOUSE_DATA_VIEWER_ROLE))
        {
            members.remove(member);
        }

        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<WarehouseTable, ApiError> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| ApiError::not_found("table", table))
    }

    async fn list_tables(
        &self,
        project_id: &str,
        dataset: &str,
    ) -> Result<Vec<WarehouseTable>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .values()
            .filter(|t| t.table_ref.project_id == project_id && t.table_ref.dataset == dataset)
            .cloned()
            .collect())
    }

    async fn get_table_policy(&self, table: &TableRef) -> Result<TablePolicy, ApiError> {
        let state = self.state.lock().unwrap();
        state.require_table(table)?;
        Ok(state.policies.get(table).cloned().unwrap_or_default())
    }

    async fn update_table_policy(
        &self,
        table: &TableRef,
        policy: TablePolicy,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_table(table)?;
        state.calls.record("update_table_policy");
        state.policies.insert(table.clone(), policy);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
