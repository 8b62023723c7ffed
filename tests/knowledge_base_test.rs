//! Knowledge import and retrieval through SQLite.

mod common;

use std::sync::Arc;

use common::HashingEmbedder;
use storelens::adapters::sqlite::{create_migrated_test_pool, SqliteKnowledgeRepository};
use storelens::domain::models::{KnowledgeCategory, NicheCatalog, NicheSource};
use storelens::domain::ports::{EmbeddingProvider, NullEmbeddingProvider};
use storelens::services::knowledge_base::parse_documents_yaml;
use storelens::services::KnowledgeBase;

const DOCUMENTS: &str = r#"
documents:
  - title: Kits de looks completos
    content: Combine vestido saia e blusa em kits com desconto progressivo
    category: strategy
    niche: fashion
    subcategory: womens_wear
  - title: Amostras de maquiagem no pedido
    content: Envie amostras de base e batom para aumentar recompra
    category: strategy
    niche: beauty
  - title: Frete grátis acima do ticket médio
    content: Defina o frete grátis logo acima do ticket médio atual
    category: strategy
"#;

async fn knowledge_base(embedder: Arc<dyn EmbeddingProvider>) -> KnowledgeBase {
    let pool = create_migrated_test_pool().await.unwrap();
    KnowledgeBase::new(
        Arc::new(SqliteKnowledgeRepository::new(pool)),
        embedder,
        Arc::new(NicheCatalog::builtin().unwrap()),
    )
}

#[tokio::test]
async fn test_import_embeds_and_vector_search_ranks_closest_first() {
    let kb = knowledge_base(Arc::new(HashingEmbedder)).await;
    let documents = parse_documents_yaml(DOCUMENTS).unwrap();

    let report = kb.import(documents).await.unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.embedded, 3);

    let hits = kb
        .search(
            "Amostras de maquiagem no pedido\nEnvie amostras de base e batom para aumentar recompra",
            KnowledgeCategory::Strategy,
            None,
            None,
            2,
        )
        .await
        .unwrap();
    assert_eq!(hits[0].niche, "beauty");
    assert!(hits.len() <= 2);
}

#[tokio::test]
async fn test_niche_filter_keeps_general_documents() {
    let kb = knowledge_base(Arc::new(HashingEmbedder)).await;
    kb.import(parse_documents_yaml(DOCUMENTS).unwrap()).await.unwrap();

    let hits = kb
        .search("kits frete", KnowledgeCategory::Strategy, Some("fashion"), None, 10)
        .await
        .unwrap();
    let niches: Vec<&str> = hits.iter().map(|h| h.niche.as_str()).collect();
    assert!(niches.contains(&"fashion"));
    assert!(niches.contains(&"general"));
    assert!(!niches.contains(&"beauty"));
}

#[tokio::test]
async fn test_attribute_lookup_without_embeddings() {
    let kb = knowledge_base(Arc::new(NullEmbeddingProvider::new())).await;
    let report = kb.import(parse_documents_yaml(DOCUMENTS).unwrap()).await.unwrap();
    assert_eq!(report.embedded, 0);

    let hits = kb
        .search(
            "qualquer coisa",
            KnowledgeCategory::Strategy,
            Some("fashion"),
            Some("womens_wear"),
            5,
        )
        .await
        .unwrap();
    assert_eq!(hits[0].title, "Kits de looks completos");
    assert!(hits.iter().all(|h| h.niche != "beauty"));

    assert!(kb
        .search("x", KnowledgeCategory::Benchmark, Some("fashion"), None, 5)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_store_niche_is_identified_from_keywords() {
    let kb = knowledge_base(Arc::new(NullEmbeddingProvider::new())).await;
    let niche = kb.identify_niche(&common::fashion_store()).await;
    assert_eq!(niche.niche, "fashion");
    assert_eq!(niche.subcategory, "womens_wear");
    assert_eq!(niche.source, NicheSource::KeywordMatch);
}
