// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::fmt;
use std::str::FromStr;

use nada_platform_apis::TableRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetID(Uuid);

impl DatasetID {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Compact form used where identifiers are length-limited
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0.as_bytes()).into_string()
    }

    pub fn from_base58(s: &str) -> Option<Self> {
        let bytes = bs58::decode(s).into_vec().ok()?;
        Uuid::from_slice(&bytes).ok().map(Self)
    }
}

impl fmt::Display for DatasetID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DatasetID {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataproductID(Uuid);

impl DataproductID {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DataproductID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiLevel {
    None,
    Anonymised,
    Sensitive,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Warehouse table backing a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    /// Columns replaced by pseudonyms in joinable views. Empty when the
    /// dataset does not participate in joinable views.
    pub pseudo_columns: Vec<String>,
}

impl Datasource {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset, &self.table)
    }

    pub fn has_joinable_views(&self) -> bool {
        !self.pseudo_columns.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetID,
    pub dataproduct_id: DataproductID,
    pub name: String,
    pub slug: String,
    /// Email of the owning team group
    pub owner_group: String,
    pub datasource: Datasource,
    pub pii: PiiLevel,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(any(feature = "testing", test))]
impl Dataset {
    pub fn test(name: &str, table: &str) -> Self {
        Self {
            id: DatasetID::new_random(),
            dataproduct_id: DataproductID::new_random(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            owner_group: "team-a@example.com".to_string(),
            datasource: Datasource {
                project_id: "team-a-prod".to_string(),
                dataset: "team_a".to_string(),
                table: table.to_string(),
                pseudo_columns: vec![],
            },
            pii: PiiLevel::None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
