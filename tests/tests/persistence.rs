use std::fs;
use std::path::PathBuf;

use application::rag_service::{RagService, RagSettings};
use application::session_context::SessionContext;
use domain::technique::RagTechnique;
use infrastructure::document_loader::DocumentLoader;
use infrastructure::index_store::IndexStore;
use tests::{corpus, FixedModel, TrigramEmbedder};

#[tokio::test]
async fn test_ingest_store_and_ask_in_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir_all(docs.join("nested")).unwrap();
    fs::write(docs.join("one.txt"), corpus(1200)).unwrap();
    fs::write(docs.join("nested").join("two.md"), "# Harbor\nShips dock in the harbor.").unwrap();
    fs::write(docs.join("skip.rs"), "fn main() {}").unwrap();
    fs::write(docs.join("nested").join("draft.txt"), "").unwrap();

    let loader = DocumentLoader::new();
    let files = loader.collect_paths(&[docs.clone()]).unwrap();
    assert_eq!(files.len(), 3);
    let outcome = loader.load_paths(&files).unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    let sources = outcome.sources;

    let rag = RagService::new(
        TrigramEmbedder::new(),
        FixedModel::replying("They dock."),
        RagSettings::default(),
    );
    let mut ingest_ctx = SessionContext::new("ingest");
    let report = rag.ingest(&mut ingest_ctx, sources).await.unwrap();
    assert_eq!(report.documents, 2);

    let db: PathBuf = dir.path().join("state").join("index.db");
    IndexStore::open(&db)
        .unwrap()
        .save(ingest_ctx.documents(), ingest_ctx.index())
        .unwrap();

    let (documents, index) = IndexStore::open(&db).unwrap().load().unwrap().unwrap();
    assert_eq!(documents, ingest_ctx.documents());
    assert_eq!(index.dimension(), ingest_ctx.index().dimension());
    assert_eq!(index.entries(), ingest_ctx.index().entries());

    let mut ask_ctx = SessionContext::new("ask");
    ask_ctx.replace_index(documents, index);
    let turn = rag
        .ask(&mut ask_ctx, "Where do ships dock?", RagTechnique::Standard, "m")
        .await
        .unwrap();
    assert_eq!(turn.answer, "They dock.");
    assert!(turn.sources.iter().any(|s| s.source.ends_with("two.md")));
}

#[test]
fn test_cleared_store_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::open(dir.path().join("index.db")).unwrap();
    assert!(store.load().unwrap().is_none());
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert_eq!(store.document_count().unwrap(), 0);
}
