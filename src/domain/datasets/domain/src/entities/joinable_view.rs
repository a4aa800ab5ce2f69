// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::fmt;

use chrono::{DateTime, Utc};
use nada_platform_apis::TableRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DatasetID;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinableViewID(Uuid);

impl JoinableViewID {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JoinableViewID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Set of pseudonymised views, one per participating dataset, that share a
/// salt so they can be joined on the pseudonymised columns. Created on
/// request of a single subject, who is its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinableView {
    pub id: JoinableViewID,
    pub name: String,
    /// Email of the requesting subject
    pub owner: String,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
    pub views: Vec<JoinableViewTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinableViewTable {
    pub dataset_id: DatasetID,
    pub view: TableRef,
}

impl JoinableView {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.deleted.is_none() && self.expires.is_none_or(|expires| expires > now)
    }

    pub fn views_of(&self, dataset_id: DatasetID) -> impl Iterator<Item = &TableRef> {
        self.views
            .iter()
            .filter(move |v| v.dataset_id == dataset_id)
            .map(|v| &v.view)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
