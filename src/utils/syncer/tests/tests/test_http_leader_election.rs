// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use syncer::{HttpLeaderElection, LeaderCheck};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_leader_when_elector_names_this_host() {
    let elector_path = spawn_elector("nada-7d9f-abc").await;

    let leader_election = HttpLeaderElection::new(Some(&elector_path), "nada-7d9f-abc").unwrap();
    assert!(leader_election.is_leader().await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_not_leader_when_elector_names_another_host() {
    let elector_path = spawn_elector("nada-7d9f-abc").await;

    let leader_election = HttpLeaderElection::new(Some(&elector_path), "nada-7d9f-xyz").unwrap();
    assert!(!leader_election.is_leader().await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_always_leader_without_elector() {
    let leader_election = HttpLeaderElection::new(None, "nada-7d9f-xyz").unwrap();
    assert!(leader_election.is_leader().await.unwrap());

    let leader_election = HttpLeaderElection::new(Some(""), "nada-7d9f-xyz").unwrap();
    assert!(leader_election.is_leader().await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_unreachable_elector_is_an_error() {
    // Bind and immediately release a port so nothing listens on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let leader_election =
        HttpLeaderElection::new(Some(&addr.to_string()), "nada-7d9f-abc").unwrap();
    assert!(leader_election.is_leader().await.is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn spawn_elector(leader: &'static str) -> String {
    let app = axum::Router::new().route(
        "/",
        axum::routing::get(move || async move {
            axum::Json(serde_json::json!({ "name": leader }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr.to_string()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
