// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use super::harness::ServerHarness;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_di_server_graph_validates() {
    let harness = ServerHarness::new();

    let mut catalog_builder = nada_server::configure_catalog(&harness.config).unwrap();

    let validate_result = catalog_builder.validate();

    assert!(
        validate_result.is_ok(),
        "{}",
        validate_result.err().unwrap()
    );
}

#[test_log::test(tokio::test)]
async fn test_di_server_graph_requires_shared_key() {
    let config = nada_server::config::ServerConfig::default();

    assert!(nada_server::configure_catalog(&config).is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
