//! Workflow Tests
//!
//! End-to-end runs of the batch orchestrator over a temporary input folder
//! with an in-memory inference backend.

mod helpers;

use helpers::fixtures::{
    fast_config, write_mp3, write_opus, write_tagged_mp3, TUM_HI_HO_RESPONSE,
};
use helpers::mock_transport::MockTransport;
use id3::{Tag, TagLike};
use songtag_ai::models::AudioFormat;
use songtag_ai::services::{
    tag_store_for, BatchOrchestrator, InferenceClient, InferenceOptions, Reconciler, RunOutcome,
    TagStoreOptions,
};
use songtag_ai::RunConfig;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

type TestOrchestrator = BatchOrchestrator<Cursor<Vec<u8>>, Vec<u8>>;

struct Workspace {
    _temp_dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir(&input).unwrap();
        Self {
            _temp_dir: temp_dir,
            input,
            output,
        }
    }

    fn config(&self) -> RunConfig {
        fast_config(&self.input, &self.output)
    }
}

fn orchestrator(
    config: RunConfig,
    transport: Arc<MockTransport>,
    answers: Option<&str>,
) -> TestOrchestrator {
    let client = InferenceClient::new(transport, InferenceOptions::new("test-model"));
    let reconciler = match answers {
        Some(answers) => {
            Reconciler::new(true, Cursor::new(answers.as_bytes().to_vec()), Vec::new())
        }
        None => Reconciler::new(false, Cursor::new(Vec::new()), Vec::new()),
    };
    BatchOrchestrator::new(config, client, reconciler)
}

fn comment_texts(path: &Path) -> Vec<String> {
    Tag::read_from_path(path)
        .unwrap()
        .comments()
        .map(|c| c.text.clone())
        .collect()
}

#[tokio::test]
async fn single_file_tagged_end_to_end() {
    // Given: one untagged MP3 and a backend that knows the song
    let ws = Workspace::new();
    write_mp3(&ws.input.join("01_Tum Hi Ho.mp3"));
    let transport = Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE));

    // When: the run completes
    let outcome = orchestrator(ws.config(), transport.clone(), None)
        .run()
        .await
        .unwrap();

    // Then: one success, the output copy carries the inferred tags
    let RunOutcome::Completed(stats) = outcome else {
        panic!("run should complete");
    };
    assert_eq!(
        (stats.total_files, stats.processed_files, stats.success, stats.errors, stats.skipped),
        (1, 1, 1, 0, 0)
    );

    let output = ws.output.join("01_Tum Hi Ho.mp3");
    let tag = Tag::read_from_path(&output).unwrap();
    assert_eq!(tag.title(), Some("Tum Hi Ho"));
    assert_eq!(tag.artist(), Some("Arijit Singh"));
    assert_eq!(tag.album(), Some("Aashiqui 2"));
    assert_eq!(tag.year(), Some(2013));
    assert_eq!(
        tag.get("TCOM").and_then(|frame| frame.content().text()),
        Some("Mithoon")
    );
    assert_eq!(tag.genre(), Some("Indian Pop"));
    assert!(comment_texts(&output).contains(&"Language: Hindi".to_string()));

    // The backend saw the normalized key, not the raw filename
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("\"Tum Hi Ho\""));
    assert!(!requests[0].prompt.contains("01_Tum"));
}

#[tokio::test]
async fn opus_file_tagged_end_to_end() {
    let ws = Workspace::new();
    let source = ws.input.join("02 - Tum Hi Ho.opus");
    write_opus(&source, &[("COMMENT", "ripped from CD")]);
    let before = fs::read(&source).unwrap();
    let transport = Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE));

    let outcome = orchestrator(ws.config(), transport.clone(), None)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(outcome.stats().success, 1);
    assert_eq!(fs::read(&source).unwrap(), before);

    let store = tag_store_for(AudioFormat::Opus, TagStoreOptions::default());
    let written = store.read_existing(&ws.output.join("02 - Tum Hi Ho.opus")).unwrap();
    assert_eq!(written.title.as_deref(), Some("Tum Hi Ho"));
    assert_eq!(written.artist.as_deref(), Some("Arijit Singh"));
    assert_eq!(written.composer.as_deref(), Some("Mithoon"));
    assert_eq!(written.genre.as_deref(), Some("Indian Pop"));
    assert_eq!(written.language.as_deref(), Some("Hindi"));
    assert_eq!(written.comments, vec!["ripped from CD".to_string()]);
    assert!(transport.requests()[0].prompt.contains("\"Tum Hi Ho\""));
}

#[tokio::test]
async fn unreachable_backend_counts_error_and_writes_nothing() {
    let ws = Workspace::new();
    write_mp3(&ws.input.join("01_Tum Hi Ho.mp3"));

    let outcome = orchestrator(ws.config(), Arc::new(MockTransport::unreachable()), None)
        .run()
        .await
        .unwrap();

    let stats = outcome.stats();
    assert_eq!(stats.processed_files, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.success, 0);
    assert!(!ws.output.join("01_Tum Hi Ho.mp3").exists());
}

#[tokio::test]
async fn failing_file_does_not_stop_the_batch() {
    // Given: a corrupt Opus file sorted before a valid MP3
    let ws = Workspace::new();
    fs::write(ws.input.join("a.opus"), b"not an ogg stream").unwrap();
    write_mp3(&ws.input.join("b.mp3"));
    let transport = Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE));

    let outcome = orchestrator(ws.config(), transport, None)
        .run()
        .await
        .unwrap();

    // Then: both files are visited, counters sum to processed
    let stats = outcome.stats();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.processed_files, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(
        stats.success + stats.errors + stats.skipped,
        stats.processed_files
    );
    assert!(!ws.output.join("a.opus").exists());
    assert!(ws.output.join("b.mp3").exists());
}

#[tokio::test]
async fn no_overwrite_keeps_existing_tags() {
    let ws = Workspace::new();
    let source = ws.input.join("song.mp3");
    write_tagged_mp3(&source, "Old Title", "Old Artist");
    let mut config = ws.config();
    config.overwrite = false;

    let outcome = orchestrator(
        config,
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        None,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome.stats().skipped, 1);
    let output = ws.output.join("song.mp3");
    assert_eq!(fs::read(&output).unwrap(), fs::read(&source).unwrap());
}

#[tokio::test]
async fn sources_are_never_modified() {
    let ws = Workspace::new();
    let source = ws.input.join("song.mp3");
    write_tagged_mp3(&source, "Old Title", "Old Artist");
    let before = fs::read(&source).unwrap();

    orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        None,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(fs::read(&source).unwrap(), before);
    let tag = Tag::read_from_path(ws.output.join("song.mp3")).unwrap();
    assert_eq!(tag.title(), Some("Tum Hi Ho"));
}

#[tokio::test]
async fn nested_files_land_flat_in_output() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.input.join("album/disc1")).unwrap();
    write_mp3(&ws.input.join("album/disc1/track.mp3"));

    orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        None,
    )
    .run()
    .await
    .unwrap();

    assert!(ws.output.join("track.mp3").exists());
    assert!(!ws.output.join("album").exists());
}

// =============================================================================
// Interactive sessions
// =============================================================================

#[tokio::test]
async fn declined_file_is_skipped_without_output() {
    let ws = Workspace::new();
    write_mp3(&ws.input.join("song.mp3"));

    let outcome = orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        Some("n\n"),
    )
    .run()
    .await
    .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(outcome.stats().skipped, 1);
    assert_eq!(outcome.stats().success, 0);
    assert!(!ws.output.join("song.mp3").exists());
}

#[tokio::test]
async fn quit_aborts_remaining_files() {
    // Given: two files, operator accepts the first and quits on the second
    let ws = Workspace::new();
    write_mp3(&ws.input.join("a.mp3"));
    write_mp3(&ws.input.join("b.mp3"));

    let outcome = orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        Some("y\nq\n"),
    )
    .run()
    .await
    .unwrap();

    // Then: the run is aborted after one success
    let RunOutcome::Aborted(stats) = outcome else {
        panic!("run should be aborted");
    };
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.processed_files, 1);
    assert_eq!(stats.success, 1);
    assert!(ws.output.join("a.mp3").exists());
    assert!(!ws.output.join("b.mp3").exists());
}

#[tokio::test]
async fn prompt_works_with_progress_bar_enabled() {
    let ws = Workspace::new();
    write_mp3(&ws.input.join("a.mp3"));
    write_mp3(&ws.input.join("b.mp3"));

    let mut orchestrator = orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        Some("y
q
"),
    )
    .with_progress_bar();
    let outcome = orchestrator.run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted(_)));
    assert_eq!(outcome.stats().success, 1);
    assert!(ws.output.join("a.mp3").exists());
    assert!(!ws.output.join("b.mp3").exists());
}

#[tokio::test]
async fn answering_all_stops_prompting() {
    let ws = Workspace::new();
    write_mp3(&ws.input.join("a.mp3"));
    write_mp3(&ws.input.join("b.mp3"));
    write_mp3(&ws.input.join("c.mp3"));

    // Only one answer is available; the remaining files must not prompt
    let outcome = orchestrator(
        ws.config(),
        Arc::new(MockTransport::responding(TUM_HI_HO_RESPONSE)),
        Some("all\n"),
    )
    .run()
    .await
    .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(outcome.stats().success, 3);
}
