// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use nada_datasets::DatasetID;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const RESTRICTED_SERVICE_ACCOUNT_PREFIX: &str = "nada-";

/// Account id of the per-dataset service account: `nada-<base58(dataset id)>`
pub fn restricted_service_account_id(dataset_id: DatasetID) -> String {
    format!("{RESTRICTED_SERVICE_ACCOUNT_PREFIX}{}", dataset_id.to_base58())
}

/// Inverse of [`restricted_service_account_id`] applied to an email or a
/// `serviceAccount:` member string
pub fn restricted_service_account_dataset(email_or_member: &str) -> Option<DatasetID> {
    let email = email_or_member
        .strip_prefix("serviceAccount:")
        .unwrap_or(email_or_member);
    let (account_id, _) = email.split_once('@')?;
    let encoded = account_id.strip_prefix(RESTRICTED_SERVICE_ACCOUNT_PREFIX)?;
    DatasetID::from_base58(encoded)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
