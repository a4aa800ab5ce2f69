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

use crate::{AccessRequestID, Platform, Subject};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessID(Uuid);

impl AccessID {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AccessID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Ledger entry of a granted access. Active while `revoked` is unset,
/// revocation is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub id: AccessID,
    pub dataset_id: DatasetID,
    pub subject: Subject,
    /// Who is accountable for the access: the subject itself, or the parent
    /// group of a service account
    pub owner: String,
    pub platform: Platform,
    pub granter: String,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub revoked: Option<DateTime<Utc>>,
    pub access_request_id: Option<AccessRequestID>,
}

impl Access {
    pub fn is_active(&self) -> bool {
        self.revoked.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
