//! End-to-end hybrid retrieval over the playbook catalog: a real vector
//! pipeline against a mock index and embedding endpoint, fused with lexical
//! matches from the in-memory record store.

use incident_retrieval::{
    models::Playbook,
    playbooks::PlaybookCatalog,
    search::{FusionWeights, SearchType},
    store::InMemoryPlaybookStore,
    vector::{
        CollectionSpec, EmbeddingClient, RecordVectorizer, VectorIndexClient, VectorizationService,
    },
};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "all-minilm";
const DIMENSION: usize = 384;

async fn collection_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/collections/playbooks")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "result": { "config": { "params": { "vectors": {
                    "size": DIMENSION, "distance": "Cosine"
                } } } }
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn embedding_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/api/embeddings")
        .with_status(200)
        .with_body(serde_json::json!({ "embedding": vec![0.1f32; DIMENSION] }).to_string())
        .create_async()
        .await
}

async fn upsert_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("PUT", "/collections/playbooks/points")
        .match_query(Matcher::UrlEncoded("wait".into(), "true".into()))
        .with_status(200)
        .with_body(serde_json::json!({ "status": "ok" }).to_string())
        .create_async()
        .await
}

async fn search_mock(server: &mut mockito::ServerGuard, hits: Vec<(String, f32)>) -> mockito::Mock {
    let result: Vec<serde_json::Value> = hits
        .into_iter()
        .map(|(id, score)| {
            serde_json::json!({
                "id": id,
                "score": score,
                "payload": { "record_id": id }
            })
        })
        .collect();
    server
        .mock("POST", "/collections/playbooks/points/search")
        .with_status(200)
        .with_body(serde_json::json!({ "result": result }).to_string())
        .create_async()
        .await
}

fn catalog(server: &mockito::ServerGuard, store: Arc<InMemoryPlaybookStore>) -> PlaybookCatalog {
    let embeddings =
        EmbeddingClient::new(&server.url(), PROVIDER, Duration::from_secs(5)).unwrap();
    let index = VectorIndexClient::new(&server.url(), None, Duration::from_secs(5)).unwrap();
    let vectorizer = Arc::new(VectorizationService::new(
        index,
        embeddings,
        CollectionSpec::playbooks("playbooks"),
    ));

    PlaybookCatalog::new(
        store,
        vectorizer as Arc<dyn RecordVectorizer>,
        FusionWeights::default(),
        10,
    )
}

fn sample(title: &str, description: &str) -> Playbook {
    Playbook::new(title.to_string(), description.to_string())
        .with_tags(vec!["database".to_string()])
}

#[tokio::test]
async fn test_semantic_and_lexical_hits_fuse() {
    let mut server = mockito::Server::new_async().await;
    collection_mock(&mut server).await;
    embedding_mock(&mut server).await;
    upsert_mock(&mut server).await;

    let store = Arc::new(InMemoryPlaybookStore::new());
    let catalog = catalog(&server, store);

    // "failover" appears in the first description only, so the lexical path
    // finds exactly that one
    let semantic_only = catalog
        .create(sample("Restore replica", "rebuild a lagging read replica"))
        .await
        .unwrap();
    let both_paths = catalog
        .create(sample("Promote standby", "database failover promotion runbook"))
        .await
        .unwrap();

    search_mock(
        &mut server,
        vec![
            (semantic_only.id.to_string(), 0.9),
            (both_paths.id.to_string(), 0.6),
        ],
    )
    .await;

    let response = catalog.search("failover").await.unwrap();
    assert!(!response.degraded);
    assert_eq!(response.results.len(), 2);

    // Found by both paths: similarity * 0.7 + 0.3 beats the pure-vector hit
    assert_eq!(response.results[0].playbook.id, both_paths.id);
    assert_eq!(response.results[0].search_type, SearchType::Hybrid);
    assert_eq!(response.results[1].playbook.id, semantic_only.id);
    assert_eq!(response.results[1].search_type, SearchType::Vector);
    assert!(response.results[0].score > response.results[1].score);
}

#[tokio::test]
async fn test_vector_outage_degrades_to_lexical() {
    let mut server = mockito::Server::new_async().await;
    collection_mock(&mut server).await;
    embedding_mock(&mut server).await;
    upsert_mock(&mut server).await;
    server
        .mock("POST", "/collections/playbooks/points/search")
        .with_status(503)
        .with_body("index unavailable")
        .create_async()
        .await;

    let store = Arc::new(InMemoryPlaybookStore::new());
    let catalog = catalog(&server, store);

    let created = catalog
        .create(sample("Promote standby", "database failover promotion runbook"))
        .await
        .unwrap();

    let response = catalog.search("failover").await.unwrap();
    assert!(response.degraded);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].playbook.id, created.id);
    assert_eq!(response.results[0].search_type, SearchType::Text);
    assert!((response.results[0].score - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_deactivated_playbooks_are_dropped_from_results() {
    let mut server = mockito::Server::new_async().await;
    collection_mock(&mut server).await;
    embedding_mock(&mut server).await;
    upsert_mock(&mut server).await;
    let deletes = server
        .mock("POST", "/collections/playbooks/points/delete")
        .match_query(Matcher::UrlEncoded("wait".into(), "true".into()))
        .with_status(200)
        .with_body(serde_json::json!({ "status": "ok" }).to_string())
        .create_async()
        .await;

    let store = Arc::new(InMemoryPlaybookStore::new());
    let catalog = catalog(&server, store);

    let created = catalog
        .create(sample("Promote standby", "database failover promotion runbook"))
        .await
        .unwrap();
    catalog.deactivate(&created.id).await.unwrap();

    // Stale vector twin still answers; resolution must drop it
    search_mock(&mut server, vec![(created.id.to_string(), 0.9)]).await;

    let response = catalog.search("failover").await.unwrap();
    assert!(response.results.is_empty());
    deletes.assert_async().await;
}
