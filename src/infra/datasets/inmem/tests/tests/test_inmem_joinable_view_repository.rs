// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use chrono::{TimeZone, Utc};
use nada_datasets::*;
use nada_datasets_inmem::InMemoryJoinableViewRepository;
use nada_platform_apis::TableRef;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn joinable_view(owner: &str, dataset_ids: &[DatasetID]) -> JoinableView {
    JoinableView {
        id: JoinableViewID::new_random(),
        name: "orders-with-customers".to_string(),
        owner: owner.to_string(),
        created: Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap(),
        expires: None,
        deleted: None,
        views: dataset_ids
            .iter()
            .enumerate()
            .map(|(i, dataset_id)| JoinableViewTable {
                dataset_id: *dataset_id,
                view: TableRef::new("nada-joinable", "orders_with_customers", format!("view_{i}")),
            })
            .collect(),
    }
}

#[test_log::test(tokio::test)]
async fn test_lists_views_of_owner_and_dataset() {
    let repo = InMemoryJoinableViewRepository::new();
    let orders = DatasetID::new_random();
    let customers = DatasetID::new_random();

    let alice_view = joinable_view("alice@example.com", &[orders, customers]);
    let bob_view = joinable_view("bob@example.com", &[orders]);
    let mut deleted_view = joinable_view("alice@example.com", &[orders]);
    deleted_view.deleted = Some(Utc.with_ymd_and_hms(2050, 1, 2, 12, 0, 0).unwrap());

    for jv in [&alice_view, &bob_view, &deleted_view] {
        repo.save_joinable_view(jv).await.unwrap();
    }

    assert_eq!(
        repo.list_joinable_views_for_owner_and_dataset("Alice@Example.com", orders)
            .await
            .unwrap(),
        vec![alice_view.clone()]
    );
    assert_eq!(
        repo.list_joinable_views_for_owner_and_dataset("bob@example.com", customers)
            .await
            .unwrap(),
        vec![]
    );
    assert_eq!(
        alice_view.views_of(customers).cloned().collect::<Vec<_>>(),
        vec![TableRef::new(
            "nada-joinable",
            "orders_with_customers",
            "view_1"
        )]
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
