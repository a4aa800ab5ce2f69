// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use assert_matches::assert_matches;
use nada_datasets::*;
use nada_datasets_inmem::InMemoryDatasetRepository;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_missing_dataset_is_not_found() {
    let repo = InMemoryDatasetRepository::new();
    let dataset_id = DatasetID::new_random();

    assert_matches!(
        repo.get_dataset(dataset_id).await,
        Err(GetDatasetError::NotFound(e)) if e.dataset_id == dataset_id
    );
}

#[test_log::test(tokio::test)]
async fn test_save_overwrites_and_lists_by_name() {
    let repo = InMemoryDatasetRepository::new();

    let orders = Dataset::test("Orders", "orders");
    let customers = Dataset::test("Customers", "customers");
    repo.save_dataset(&orders).await.unwrap();
    repo.save_dataset(&customers).await.unwrap();

    let mut renamed = orders.clone();
    renamed.name = "Orders v2".to_string();
    repo.save_dataset(&renamed).await.unwrap();

    assert_eq!(repo.get_dataset(orders.id).await.unwrap(), renamed);
    assert_eq!(
        repo.list_datasets().await.unwrap(),
        vec![customers, renamed]
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
