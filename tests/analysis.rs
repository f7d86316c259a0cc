//! Integration tests for the analysis operations.
//!
//! A canned [`ChatTransport`] stands in for the LLM provider, so these run
//! offline and deterministically. Retry timing uses tokio's paused clock.

use async_trait::async_trait;
use edgequake_pdf_analyzer::{
    analyze_files, AnalysisProgressCallback, Analyzer, AnalyzerConfig, AnalyzerError, CallError,
    ChatPayload, ChatTransport, DocumentContent, DocumentMetadata, RequestKind, TransportError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::EnvFilter;

const CANNED_ANALYSIS: &str = r#"{"main_topics":["Topic 1","Topic 2"],"key_points":["Point 1","Point 2"],"summary":"Test summary"}"#;
const CANNED_IMAGE: &str = "A test image containing simple geometric shapes";
const CANNED_ANSWER: &str = "The document discusses topics 1 and 2.";

/// Route library logs through the test harness; `RUST_LOG=debug` shows retries.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Test transports ──────────────────────────────────────────────────────────

/// Answers by request kind and records every payload it sees.
#[derive(Default)]
struct CannedTransport {
    seen: Mutex<Vec<ChatPayload>>,
    fail_images: bool,
    fail_text: bool,
}

impl CannedTransport {
    fn kinds(&self) -> Vec<RequestKind> {
        self.seen.lock().unwrap().iter().map(|p| p.kind).collect()
    }
}

#[async_trait]
impl ChatTransport for CannedTransport {
    async fn complete(&self, payload: &ChatPayload) -> Result<String, TransportError> {
        self.seen.lock().unwrap().push(payload.clone());
        if payload.has_images() || payload.kind == RequestKind::ImageAnalysis {
            if self.fail_images {
                return Err(TransportError::Failed("image model unavailable".into()));
            }
            Ok(CANNED_IMAGE.to_string())
        } else if payload.wants_json() {
            if self.fail_text {
                return Err(TransportError::Failed("invalid api key".into()));
            }
            Ok(CANNED_ANALYSIS.to_string())
        } else {
            Ok(CANNED_ANSWER.to_string())
        }
    }
}

/// Rate-limits the first `limited` calls, then succeeds.
struct FlakyTransport {
    limited: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn complete(&self, _payload: &ChatPayload) -> Result<String, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.limited {
            Err(TransportError::RateLimited("429 Too Many Requests".into()))
        } else {
            Ok(CANNED_ANSWER.to_string())
        }
    }
}

fn analyzer_with(transport: Arc<dyn ChatTransport>) -> Analyzer {
    Analyzer::new(transport, AnalyzerConfig::default())
}

fn sample_content(images: usize) -> DocumentContent {
    DocumentContent {
        text: vec!["Page one text".into(), "Page two text".into()],
        images: (0..images).map(|i| vec![0xFF, 0xD8, i as u8]).collect(),
        metadata: DocumentMetadata {
            pages: 2,
            title: "Quarterly Report".into(),
            author: "Finance".into(),
            subject: String::new(),
        },
    }
}

// ── Text, image, query ───────────────────────────────────────────────────────

#[tokio::test]
async fn text_analysis_returns_parsed_object() {
    let analyzer = analyzer_with(Arc::new(CannedTransport::default()));
    let map = assert_ok!(analyzer.analyze_text("Sample document text").await);
    assert_eq!(map["summary"], "Test summary");
    assert_eq!(map["main_topics"][0], "Topic 1");
    assert_eq!(map["key_points"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn image_analysis_returns_description() {
    let analyzer = analyzer_with(Arc::new(CannedTransport::default()));
    let description = assert_ok!(analyzer.analyze_image(&[0xFF, 0xD8, 0xFF]).await);
    assert_eq!(description, CANNED_IMAGE);
}

#[tokio::test]
async fn query_returns_answer_verbatim() {
    let analyzer = analyzer_with(Arc::new(CannedTransport::default()));
    let answer = assert_ok!(analyzer.query("What is this about?", "Context text").await);
    assert_eq!(answer, CANNED_ANSWER);
}

#[tokio::test]
async fn non_json_text_analysis_is_malformed() {
    struct Prose;
    #[async_trait]
    impl ChatTransport for Prose {
        async fn complete(&self, _p: &ChatPayload) -> Result<String, TransportError> {
            Ok("Sorry, I cannot do that.".into())
        }
    }

    let analyzer = analyzer_with(Arc::new(Prose));
    let err = assert_err!(analyzer.analyze_text("text").await);
    match err {
        CallError::MalformedResponse { raw, .. } => assert_eq!(raw, "Sorry, I cannot do that."),
        other => panic!("expected MalformedResponse, got {other:?}"),
    }
}

// ── Whole documents ──────────────────────────────────────────────────────────

#[tokio::test]
async fn document_analysis_covers_text_and_every_image() {
    let transport = Arc::new(CannedTransport::default());
    let analyzer = analyzer_with(transport.clone());

    let analysis = assert_ok!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &sample_content(2))
            .await
    );
    assert_eq!(analysis.text_analysis["summary"], "Test summary");
    assert_eq!(analysis.image_analyses, vec![CANNED_IMAGE, CANNED_IMAGE]);
    assert_eq!(analysis.metadata_analysis.summary, "Document with 2 pages");
    assert_eq!(analysis.metadata_analysis.title, "Quarterly Report");
    assert_eq!(
        transport.kinds(),
        vec![
            RequestKind::TextAnalysis,
            RequestKind::ImageAnalysis,
            RequestKind::ImageAnalysis
        ]
    );
}

#[tokio::test]
async fn failing_images_are_skipped() {
    let transport = Arc::new(CannedTransport {
        fail_images: true,
        ..Default::default()
    });
    let analyzer = analyzer_with(transport);

    let analysis = assert_ok!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &sample_content(3))
            .await
    );
    assert!(analysis.image_analyses.is_empty());
    assert_eq!(analysis.text_analysis["summary"], "Test summary");
}

#[tokio::test]
async fn failing_text_analysis_aborts_document() {
    let transport = Arc::new(CannedTransport {
        fail_text: true,
        ..Default::default()
    });
    let analyzer = analyzer_with(transport.clone());

    let err = assert_err!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &sample_content(2))
            .await
    );
    assert!(matches!(err, AnalyzerError::TextAnalysisFailed { .. }));
    // No image calls once the text analysis has failed.
    assert_eq!(transport.kinds(), vec![RequestKind::TextAnalysis]);
}

#[tokio::test]
async fn images_disabled_sends_no_image_calls() {
    let transport = Arc::new(CannedTransport::default());
    let config = assert_ok!(AnalyzerConfig::builder().allow_images(false).build());
    let analyzer = Analyzer::new(transport.clone(), config);

    let analysis = assert_ok!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &sample_content(2))
            .await
    );
    assert!(analysis.image_analyses.is_empty());
    assert_eq!(transport.kinds(), vec![RequestKind::TextAnalysis]);
}

#[tokio::test]
async fn progress_callback_sees_each_image() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }
    impl AnalysisProgressCallback for Recorder {
        fn on_text_analyzed(&self, _path: &Path) {
            self.events.lock().unwrap().push("text".into());
        }
        fn on_image_analyzed(&self, _path: &Path, n: usize, total: usize, error: Option<&str>) {
            let status = if error.is_some() { "err" } else { "ok" };
            self.events
                .lock()
                .unwrap()
                .push(format!("image {n}/{total} {status}"));
        }
    }

    let recorder = Arc::new(Recorder::default());
    let config = assert_ok!(AnalyzerConfig::builder()
        .progress_callback(recorder.clone())
        .build());
    let analyzer = Analyzer::new(Arc::new(CannedTransport::default()), config);

    assert_ok!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &sample_content(2))
            .await
    );
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["text", "image 1/2 ok", "image 2/2 ok"]
    );
}

#[tokio::test]
async fn query_documents_sends_collected_context() {
    let transport = Arc::new(CannedTransport::default());
    let analyzer = analyzer_with(transport.clone());

    let content = sample_content(1);
    let analysis = assert_ok!(
        analyzer
            .analyze_document(Path::new("report.pdf"), &content)
            .await
    );
    let doc = edgequake_pdf_analyzer::ProcessedDocument {
        path: "/data/report.pdf".into(),
        content,
        analysis,
    };

    let answer = assert_ok!(analyzer.query_documents("Summarise", &[doc]).await);
    assert_eq!(answer, CANNED_ANSWER);

    let seen = transport.seen.lock().unwrap();
    let query = seen.last().unwrap();
    assert_eq!(query.kind, RequestKind::Query);
    let user = query.messages.last().unwrap().text();
    assert!(user.starts_with("Context:\nDocument: report.pdf\nText Analysis:\n"));
    assert!(user.contains("Image Analyses:\nA test image containing simple geometric shapes"));
    assert!(user.ends_with("\n\nQuery: Summarise"));
}

// ── Rate limiting ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rate_limited_call_recovers_before_budget() {
    init_tracing();
    let transport = Arc::new(FlakyTransport {
        limited: 3,
        calls: AtomicUsize::new(0),
    });
    let analyzer = analyzer_with(transport.clone());

    let start = tokio::time::Instant::now();
    let answer = assert_ok!(analyzer.query("q", "ctx").await);
    assert_eq!(answer, CANNED_ANSWER);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    // 2s + 4s + 8s of backoff, each with under half a second of jitter.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(14), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(15_500), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn persistent_rate_limit_is_terminal() {
    init_tracing();
    let transport = Arc::new(FlakyTransport {
        limited: usize::MAX,
        calls: AtomicUsize::new(0),
    });
    let analyzer = analyzer_with(transport.clone());

    let err = assert_err!(analyzer.analyze_image(&[1, 2, 3]).await);
    assert!(err.is_rate_limited());
    assert!(err.to_string().contains("quota and billing"));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
}

// ── Batches ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_records_every_failure_in_order() {
    init_tracing();

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }
    impl AnalysisProgressCallback for Recorder {
        fn on_document_start(&self, path: &Path, index: usize, total: usize) {
            let name = path.file_name().unwrap().to_string_lossy();
            self.events
                .lock()
                .unwrap()
                .push(format!("start {index}/{total} {name}"));
        }
        fn on_document_complete(&self, path: &Path, error: Option<&str>) {
            let name = path.file_name().unwrap().to_string_lossy();
            let status = if error.is_some() { "failed" } else { "ok" };
            self.events
                .lock()
                .unwrap()
                .push(format!("done {name} {status}"));
        }
    }

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.pdf");
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "plain text").unwrap();
    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, "GIF89a not really a pdf").unwrap();
    let paths: Vec<PathBuf> = vec![missing.clone(), notes.clone(), fake.clone()];

    let recorder = Arc::new(Recorder::default());
    let config = assert_ok!(AnalyzerConfig::builder()
        .progress_callback(recorder.clone())
        .build());
    let transport = Arc::new(CannedTransport::default());
    let analyzer = Analyzer::new(transport.clone(), config);

    let outcome = analyze_files(&paths, &analyzer).await;

    assert!(outcome.is_empty());
    assert!(outcome.processed.is_empty());
    assert_eq!(outcome.failures.len(), 3);
    assert_eq!(outcome.failures[0].0, missing);
    assert!(matches!(outcome.failures[0].1, AnalyzerError::FileNotFound { .. }));
    assert_eq!(outcome.failures[1].0, notes);
    assert!(matches!(outcome.failures[1].1, AnalyzerError::NotPdfExtension { .. }));
    assert_eq!(outcome.failures[2].0, fake);
    assert!(matches!(outcome.failures[2].1, AnalyzerError::NotAPdf { .. }));

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start 1/3 missing.pdf",
            "done missing.pdf failed",
            "start 2/3 notes.txt",
            "done notes.txt failed",
            "start 3/3 fake.pdf",
            "done fake.pdf failed",
        ]
    );
    // Nothing reached the transport.
    assert!(transport.kinds().is_empty());
}
