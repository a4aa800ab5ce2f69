// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Short account id, the part of the email before `@`
    pub account_id: String,
    pub email: String,
    pub display_name: String,
    pub description: String,
}

impl ServiceAccount {
    pub fn member(&self) -> String {
        service_account_member(&self.email)
    }
}

pub fn service_account_member(email: &str) -> String {
    format!("serviceAccount:{email}")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceAccount {
    pub project_id: String,
    pub account_id: String,
    pub display_name: String,
    pub description: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Freshly minted private key, in the JSON credentials format the BI tool
/// expects when registering a database
#[derive(Debug)]
pub struct ServiceAccountKey {
    pub key_id: String,
    pub private_key_data: secrecy::SecretString,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBinding {
    pub role: String,
    pub members: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
