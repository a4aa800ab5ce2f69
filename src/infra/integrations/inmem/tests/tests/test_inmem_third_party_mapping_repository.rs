// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use nada_datasets::DatasetID;
use nada_integrations::*;
use nada_integrations_inmem::InMemoryThirdPartyMappingRepository;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_set_mapping_replaces_services() {
    let repo = InMemoryThirdPartyMappingRepository::new();
    let dataset_id = DatasetID::new_random();

    let mapping = ThirdPartyMapping {
        dataset_id,
        services: vec![ThirdPartyService::BiTool],
    };
    repo.set_mapping(&mapping).await.unwrap();
    assert!(
        repo.get_mapping(dataset_id)
            .await
            .unwrap()
            .unwrap()
            .wants_bi_tool()
    );

    let cleared = ThirdPartyMapping {
        dataset_id,
        services: vec![],
    };
    repo.set_mapping(&cleared).await.unwrap();

    assert_eq!(repo.list_mappings().await.unwrap(), vec![cleared]);
    assert_eq!(
        repo.get_mapping(DatasetID::new_random()).await.unwrap(),
        None
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
