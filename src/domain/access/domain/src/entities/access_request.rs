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
use nada_datasets::DatasetID;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Platform, Subject};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessRequestID(Uuid);

impl AccessRequestID {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AccessRequestID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequestStatus {
    Pending,
    Approved,
    Denied,
}

/// Reference to the purpose documentation (legal basis) of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollyDocumentation {
    pub external_id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: AccessRequestID,
    pub dataset_id: DatasetID,
    pub subject: Subject,
    pub owner: Option<String>,
    pub platform: Platform,
    pub polly_documentation: Option<PollyDocumentation>,
    pub expires: Option<DateTime<Utc>>,
    pub status: AccessRequestStatus,
    pub created: DateTime<Utc>,
    pub closed: Option<DateTime<Utc>>,
    pub granter: Option<String>,
    pub reason: Option<String>,
}

impl AccessRequest {
    pub fn is_pending(&self) -> bool {
        self.status == AccessRequestStatus::Pending
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
