// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Read access role granted on tables and views
pub const WAREHOUSE_DATA_VIEWER_ROLE: &str = "roles/bigquery.dataViewer";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Fully-qualified warehouse table or view
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    pub fn same_dataset(&self, other: &TableRef) -> bool {
        self.project_id == other.project_id && self.dataset == other.dataset
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset, self.table)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseTableType {
    Table,
    View,
    MaterializedView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseColumn {
    pub name: String,
    /// Warehouse type name, e.g. `STRING`, `TIMESTAMP`
    pub field_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseTable {
    pub table_ref: TableRef,
    pub table_type: WarehouseTableType,
    pub schema: Vec<WarehouseColumn>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// IAM policy attached to a single table: role -> members.
///
/// Members use the warehouse principal syntax (`user:a@b`, `group:a@b`,
/// `serviceAccount:a@b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePolicy {
    pub bindings: BTreeMap<String, BTreeSet<String>>,
}

impl TablePolicy {
    pub fn has_member(&self, role: &str, member: &str) -> bool {
        self.bindings
            .get(role)
            .is_some_and(|members| members.contains(member))
    }

    /// Removes the member from every role, returns whether anything changed
    pub fn remove_member(&mut self, member: &str) -> bool {
        let mut changed = false;
        for members in self.bindings.values_mut() {
            changed |= members.remove(member);
        }
        self.bindings.retain(|_, members| !members.is_empty());
        changed
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
