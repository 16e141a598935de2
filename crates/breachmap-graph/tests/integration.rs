//! Integration tests for breachmap-graph against a live Neo4j instance.
//!
//! Run with: cargo test --package breachmap-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available. Each test seeds its own
//! partition and tears it down afterwards so runs do not interfere.

use breachmap_core::types::Partition;
use breachmap_graph::{GraphClient, GraphConfig};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = GraphConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

fn test_partition(name: &str) -> Partition {
    Partition(format!("breachmap-test-{name}"))
}

async fn cleanup(client: &GraphClient, partition: &Partition) {
    let q = neo4rs::query("MATCH (n:Physical {project: $p}) DETACH DELETE n")
        .param("p", partition.as_str());
    let _ = client.query_rows(q).await;
}

/// Seed a line topology, ws-a to sw-1 to srv-b, all within the partition.
async fn seed_line(client: &GraphClient, partition: &Partition) {
    let q = neo4rs::query(
        "CREATE (a:Physical {project: $p, id: 'ml:dev-a', name: 'ws-a', type: 'workstation', ip: '10.1.0.2'})
         CREATE (s:Physical {project: $p, id: 'ml:dev-s', name: 'sw-1', type: 'switch', ip: '10.1.0.1'})
         CREATE (b:Physical {project: $p, id: 'ml:dev-b', name: 'srv-b', type: 'server', ip: '10.2.0.2'})
         CREATE (a)-[:CONNECTED {project: $p}]->(s)
         CREATE (s)-[:CONNECTED {project: $p}]->(b)",
    )
    .param("p", partition.as_str());
    client.query_rows(q).await.expect("seed failed");
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn resolve_physical_id_hits_and_misses() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let partition = test_partition("resolve");
    cleanup(&client, &partition).await;
    seed_line(&client, &partition).await;

    let hit = client
        .resolve_physical_id(&partition, "dev-a")
        .await
        .unwrap();
    assert!(hit.is_some());

    let miss = client
        .resolve_physical_id(&partition, "no-such-device")
        .await
        .unwrap();
    assert!(miss.is_none());

    cleanup(&client, &partition).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn topology_dedupes_undirected_edges() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let partition = test_partition("topology");
    cleanup(&client, &partition).await;
    seed_line(&client, &partition).await;

    let topology = client.fetch_topology(&partition).await.unwrap();
    assert_eq!(topology.nodes.len(), 3);
    // Two physical links, each reported once despite undirected matching.
    assert_eq!(topology.edges.len(), 2);
    for edge in &topology.edges {
        assert!(edge.from < edge.to);
    }

    cleanup(&client, &partition).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn direct_paths_respect_partition_scope() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let partition = test_partition("scope");
    let other = test_partition("scope-other");
    cleanup(&client, &partition).await;
    cleanup(&client, &other).await;
    seed_line(&client, &partition).await;

    let start = client
        .resolve_physical_id(&partition, "dev-a")
        .await
        .unwrap()
        .unwrap();
    let target = client
        .resolve_physical_id(&partition, "dev-b")
        .await
        .unwrap()
        .unwrap();

    let paths = client.direct_paths(&partition, start, target).await.unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].nodes.len(), 3);

    // The same ids queried under a different partition see no edges.
    let none = client.direct_paths(&other, start, target).await.unwrap();
    assert!(none.is_empty());

    cleanup(&client, &partition).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn collect_attack_paths_empty_when_unreachable() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let partition = test_partition("unreachable");
    cleanup(&client, &partition).await;

    let q = neo4rs::query(
        "CREATE (a:Physical {project: $p, id: 'ml:iso-a', name: 'iso-a', type: 'workstation'})
         CREATE (b:Physical {project: $p, id: 'ml:iso-b', name: 'iso-b', type: 'server'})",
    )
    .param("p", partition.as_str());
    client.query_rows(q).await.unwrap();

    let start = client
        .resolve_physical_id(&partition, "iso-a")
        .await
        .unwrap()
        .unwrap();
    let target = client
        .resolve_physical_id(&partition, "iso-b")
        .await
        .unwrap()
        .unwrap();

    // Disconnected nodes: both queries come back empty, not as errors.
    let paths = client
        .collect_attack_paths(&partition, start, target)
        .await
        .unwrap();
    assert!(paths.is_empty());

    cleanup(&client, &partition).await;
}
