use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, NamedTempFile};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Config file pointing every endpoint at a closed local port.
fn unreachable_endpoints() -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"endpoints:\n  versions: \"http://127.0.0.1:9/assets/{asset_id}/versions?page={page}\"\n  content: \"http://127.0.0.1:9/Asset?versionId={version_id}\"\n  cookie_domain: \"http://127.0.0.1:9/\"\n",
    )
    .expect("Writing temp config failed");
    config
}

#[test]
fn help_lists_filename_variables() {
    let mut cmd = Command::cargo_bin("asset-history").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("VersionNumber")
            .and(predicate::str::contains("--filename"))
            .and(predicate::str::contains("_v%VersionNumber")),
    );
}

#[test]
fn missing_asset_id_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("asset-history").expect("Binary exists");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--id"));
}

#[test]
fn unreachable_listing_fails_with_page_in_message() {
    let config = unreachable_endpoints();
    let out = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("asset-history").expect("Binary exists");
    cmd.arg("-i")
        .arg("1818")
        .arg("--git=false")
        .arg("-o")
        .arg(out.path())
        .arg("--config")
        .arg(config.path())
        .env_remove("ROBLOSECURITY");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("page 1"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use asset_history::cli::{run, Cli};
    use clap::Parser;

    let cli = Cli::try_parse_from(["asset-history", "-i", "5", "--config", "dummy.yaml"])
        .expect("flags parse");
    let result = run(cli).await;
    assert!(result.is_err(), "missing config file must fail");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn sync_mode_message_is_debug_only() {
    use asset_history_core::config::{LoginPolicy, PipelineConfig};
    use asset_history_core::contract::MockAssetSource;
    use asset_history_core::synchronise::synchronise;
    use tracing_subscriber::filter::LevelFilter;

    let info_events = Arc::new(Mutex::new(Vec::new()));
    let all_events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default()
        .with(
            EventCollector {
                events: info_events.clone(),
            }
            .with_filter(LevelFilter::INFO),
        )
        .with(EventCollector {
            events: all_events.clone(),
        });
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut source = MockAssetSource::new();
    source.expect_list_page().returning(|_, _| Ok(vec![]));
    source.expect_authenticate().never();
    let out = tempdir().unwrap();
    let config = PipelineConfig {
        asset_id: 5,
        output_dir: out.path().to_path_buf(),
        filename: "asset.rbxl".to_string(),
        git: false,
        tag: false,
        pipe: false,
        transform: None,
        login: LoginPolicy::Lazy,
    };
    synchronise(&config, &source).await.expect("empty history syncs");

    let all = all_events.lock().unwrap();
    assert!(
        all.iter().any(|msg| msg.contains("Using file list")),
        "Expected the mode message at debug level, got: {:?}",
        all
    );
    let info = info_events.lock().unwrap();
    assert!(
        !info.iter().any(|msg| msg.contains("Using file list")),
        "Mode message leaked to info: {:?}",
        info
    );
}
