use squadsense::config::Config;
use squadsense::index::{IngestError, SourceDocument, format_as_context};
use squadsense::memory::ChunkKind;
use squadsense::App;

const VAULT_TS: &str = r"export class Vault {
    private balance = 0;

    getBalance(): number {
        return this.balance;
    }

    /** Moves funds in after checking limits. */
    deposit(amount: number): void {
        if (amount <= 0) {
            throw new Error('amount');
        }
        this.balance += amount;
        this.emit('deposit', amount);
    }
}
";

fn app() -> App {
    let mut config = Config::default();
    config.ingest.concurrency = 2;
    config.retrieval.default_top_k = 3;
    App::from_config(&config).unwrap()
}

#[tokio::test]
async fn ingest_then_query_with_citations() {
    let app = app();
    let report = app
        .ingest(
            "staking",
            vec![
                SourceDocument::code("src/vault.ts", VAULT_TS),
                SourceDocument::document("docs/vault.md", "# Vault\nDeposits must be positive.\n"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.units_filtered, 1);
    assert_eq!(report.chunks_created, 2);

    let code = app
        .query("staking", "deposit funds", Some(ChunkKind::Code))
        .await
        .unwrap();
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].chunk.metadata.unit_names, vec!["deposit"]);
    assert_eq!(code[0].chunk.metadata.language.as_deref(), Some("typescript"));

    let context = format_as_context(&code);
    assert!(context.contains("source=\"src/vault.ts\""));
    assert!(context.contains("Moves funds in"));
}

#[tokio::test]
async fn query_respects_default_top_k() {
    let app = app();
    let docs = (0..6)
        .map(|i| SourceDocument::document(format!("docs/{i}.md"), format!("# Note {i}\nstaking note {i}\n")))
        .collect();
    app.ingest("staking", docs).await.unwrap();

    let hits = app.query("staking", "staking note", None).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn shutdown_cancels_later_runs() {
    let app = app();
    app.shutdown();
    assert!(app.cancellation_token().is_cancelled());

    let err = app
        .ingest("staking", vec![SourceDocument::document("a.md", "# A\n")])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<IngestError>(),
        Some(IngestError::Cancelled)
    ));
    assert!(app.retriever().list_scopes().await.unwrap().is_empty());
}

#[tokio::test]
async fn ingest_dir_walks_scope_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("auth")).unwrap();
    std::fs::write(dir.path().join("auth/README.md"), "# Auth\nTokens rotate daily.\n").unwrap();

    let app = app();
    let report = app.ingest_dir(dir.path(), "auth").await.unwrap();
    assert_eq!(report.files_ingested, 1);

    let docs = app.query("auth", "token rotation", Some(ChunkKind::Document)).await.unwrap();
    assert_eq!(docs[0].chunk.metadata.source_file, "auth/README.md");
    assert!(app.query("staking", "token rotation", None).await.unwrap().is_empty());
}

#[test]
fn invalid_config_rejected() {
    let mut config = Config::default();
    config.ingest.doc_overlap_chars = 2000;
    assert!(App::from_config(&config).is_err());
}
