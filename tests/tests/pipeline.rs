use application::lab_service::PromptLab;
use application::rag_service::{RagService, RagSettings};
use application::retriever::Retriever;
use application::session_context::SessionContext;
use domain::models::{DocumentFormat, GenerationOptions, SourceText};
use domain::prompt_composer::compose;
use domain::technique::{PromptTechnique, RagTechnique, Technique};
use domain::LabError;
use infrastructure::chunker::ChunkingConfig;
use tests::{corpus, FixedModel, TrigramEmbedder, TRIGRAM_DIMENSION};

fn text_source(name: &str, text: &str) -> SourceText {
    SourceText {
        name: name.to_string(),
        format: DocumentFormat::PlainText,
        text: text.to_string(),
    }
}

fn rag_service(model: FixedModel) -> RagService<TrigramEmbedder, FixedModel> {
    let settings = RagSettings {
        chunking: ChunkingConfig::new(1000, 200).unwrap(),
        top_k: 3,
        options: GenerationOptions::default(),
    };
    RagService::new(TrigramEmbedder::new(), model, settings)
}

#[tokio::test]
async fn test_2500_char_document_end_to_end() {
    let rag = rag_service(FixedModel::replying("answer"));
    let mut ctx = SessionContext::new("e2e");
    let text = corpus(2500);

    let report = rag
        .ingest(&mut ctx, vec![text_source("long.txt", &text)])
        .await
        .unwrap();
    assert_eq!(report.documents, 1);
    assert_eq!(report.chunks, 4);
    assert_eq!(report.dimension, TRIGRAM_DIMENSION);
    assert_eq!(rag.embedder().batches(), 1);

    let chars: Vec<char> = text.chars().collect();
    let entries = ctx.index().entries();
    let starts = [0usize, 800, 1600, 2400];
    for (entry, start) in entries.iter().zip(starts) {
        let end = (start + 1000).min(2500);
        let expected: String = chars[start..end].iter().collect();
        assert_eq!(entry.text, expected);
    }
    assert_eq!(entries[3].text.chars().count(), 100);

    let probe = entries[2].text.clone();
    let probe_id = entries[2].chunk_id.clone();
    let hits = Retriever::new(rag.embedder(), ctx.index())
        .retrieve(&probe, 4)
        .await
        .unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].chunk_id, probe_id);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits[1].score < hits[0].score);
}

#[test]
fn test_standard_rag_composition() {
    let prompt = compose(
        Technique::Rag(RagTechnique::Standard),
        "What is X?",
        Some(&["X is a widget.".to_string()]),
    );
    assert_eq!(prompt, "Context: X is a widget.\n\nQuestion: What is X?\n\nAnswer:");
}

#[tokio::test]
async fn test_ask_records_turn_with_sources() {
    let rag = rag_service(FixedModel::replying("Copper conducts."));
    let mut ctx = SessionContext::new("s");
    rag.ingest(
        &mut ctx,
        vec![
            text_source("metals.txt", "Copper is an excellent conductor of electricity."),
            text_source("plants.txt", "Meadows are full of grasses and wildflowers."),
        ],
    )
    .await
    .unwrap();

    let turn = rag
        .ask(&mut ctx, "Which metal conducts electricity?", RagTechnique::ChainOfThought, "m")
        .await
        .unwrap();

    assert_eq!(turn.answer, "Copper conducts.");
    assert_eq!(turn.sources.len(), 2);
    assert_eq!(turn.sources[0].source, "metals.txt");
    assert_eq!(ctx.history(), std::slice::from_ref(&turn));

    let prompt = &rag.generator().prompts()[0];
    assert!(prompt.starts_with("Context: Copper is an excellent conductor"));
    assert!(prompt.ends_with("Let's think step by step:\nAnswer:"));
}

#[tokio::test]
async fn test_model_errors_leave_session_intact() {
    let rag = rag_service(FixedModel::failing(LabError::ServiceUnavailable(
        "connection refused".to_string(),
    )));
    let mut ctx = SessionContext::new("s");
    rag.ingest(&mut ctx, vec![text_source("a.txt", &corpus(300))])
        .await
        .unwrap();

    let err = rag
        .ask(&mut ctx, "river?", RagTechnique::Standard, "m")
        .await
        .unwrap_err();
    assert!(matches!(err, LabError::ServiceUnavailable(_)));
    assert_eq!(err.hint(), "start the model runtime: `ollama serve`");
    assert!(ctx.history().is_empty());
    assert_eq!(ctx.index().len(), 1);

    let lab = PromptLab::new(
        FixedModel::failing(LabError::ModelNotFound("ghost".to_string())),
        GenerationOptions::default(),
    );
    let err = lab
        .run(&mut ctx, PromptTechnique::Role, "Explain tides.", "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, LabError::ModelNotFound(_)));
    assert!(ctx.history().is_empty());
}

#[tokio::test]
async fn test_reprocessing_replaces_documents() {
    let rag = rag_service(FixedModel::replying("ok"));
    let mut ctx = SessionContext::new("s");
    rag.ingest(&mut ctx, vec![text_source("old.txt", &corpus(1500))])
        .await
        .unwrap();
    assert_eq!(ctx.index().len(), 2);

    rag.ingest(&mut ctx, vec![text_source("new.txt", "A short note.")])
        .await
        .unwrap();
    assert_eq!(ctx.documents().len(), 1);
    assert_eq!(ctx.documents()[0].source, "new.txt");
    assert_eq!(ctx.index().len(), 1);
    assert_eq!(ctx.index().entries()[0].source, "new.txt");
}

#[tokio::test]
async fn test_sessions_do_not_share_indexes() {
    let rag = rag_service(FixedModel::replying("ok"));
    let mut first = SessionContext::new("first");
    let mut second = SessionContext::new("second");
    rag.ingest(&mut first, vec![text_source("a.txt", "alpha beta gamma")])
        .await
        .unwrap();

    let err = rag
        .ask(&mut second, "alpha?", RagTechnique::Standard, "m")
        .await
        .unwrap_err();
    assert!(matches!(err, LabError::InvalidInput(_)));
    assert_eq!(first.index().len(), 1);
}
