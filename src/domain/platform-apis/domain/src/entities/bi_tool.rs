// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use serde::{Deserialize, Serialize};

use crate::{CollectionID, DatabaseID, FieldID, MembershipID, PermissionGroupID, TableID, UserID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiToolUser {
    pub id: UserID,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: PermissionGroupID,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroupMember {
    pub membership_id: MembershipID,
    pub user_id: UserID,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionID,
    pub name: String,
    pub description: String,
    pub archived: bool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Warehouse connection registered in the BI tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiToolDatabase {
    pub id: DatabaseID,
    pub name: String,
    pub project_id: String,
    pub dataset: String,
    /// Identity the BI tool uses to query the warehouse
    pub service_account_email: String,
}

#[derive(Debug)]
pub struct NewBiToolDatabase {
    pub name: String,
    pub project_id: String,
    pub dataset: String,
    pub service_account_email: String,
    pub service_account_key: secrecy::SecretString,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableVisibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiToolField {
    pub id: FieldID,
    pub name: String,
    /// Warehouse type name as reported by the BI tool, e.g. `STRING`
    pub database_type: String,
    pub semantic_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiToolTable {
    pub id: TableID,
    pub database_id: DatabaseID,
    pub name: String,
    pub visibility: TableVisibility,
    /// Empty until the BI tool finished syncing the table metadata
    pub fields: Vec<BiToolField>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const SEMANTIC_TYPE_NAME: &str = "type/Name";
pub const SEMANTIC_TYPE_CREATION_TIMESTAMP: &str = "type/CreationTimestamp";
pub const SEMANTIC_TYPE_CREATION_DATE: &str = "type/CreationDate";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionAccess {
    Write,
    Read,
    None,
}

/// Data access of a permission group to a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataAccess {
    Unrestricted,
    NoSelfService,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
