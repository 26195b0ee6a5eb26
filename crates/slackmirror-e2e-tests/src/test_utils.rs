use eyre::Result;
use md5::{Digest, Md5};
use slackmirror_lib::cli::{Command, MirrorParams, resolve_with_config};
use slackmirror_lib::config::Config;
use slackmirror_lib::download::{Decision, RunSummary, TransferOutcome, TransferProgress};
use slackmirror_lib::error::MirrorError;
use slackmirror_lib::plan::{DownloadTarget, PlanSummary};
use slackmirror_lib::report::Reporter;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// One `PACKAGES.TXT` block in the format the mirror publishes.
pub fn manifest_entry(name: &str, location: &str, size: &str) -> String {
    format!(
        "PACKAGE NAME:  {name}\n\
         PACKAGE LOCATION:  {location}\n\
         PACKAGE SIZE (compressed):  {size}\n\
         PACKAGE SIZE (uncompressed):  40 K\n\
         PACKAGE DESCRIPTION:\n\
         {name}: test package\n\n"
    )
}

pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Temp workspace with a `store/` output directory and room for manifests.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn store(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("store")
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<String> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path.to_string_lossy().into_owned())
    }

    pub fn write_store_file(&self, relative: &str, contents: &[u8]) -> Result<()> {
        let path = self.store().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn read_store_file(&self, relative: &str) -> Option<Vec<u8>> {
        std::fs::read(self.store().join(relative)).ok()
    }

    /// A command against `base_url` with local manifest files, no throttling
    /// and no inter-package delay.
    pub fn command(&self, base_url: &str, packages_file: &str) -> Command {
        Command {
            base_url: Some(base_url.to_string()),
            packages_file: Some(packages_file.to_string()),
            output_dir: Some(self.store().to_string_lossy().into_owned()),
            sleep_secs: Some(0),
            rate_limit_kbps: Some(0),
            no_checksums: true,
            ..Command::default()
        }
    }
}

pub fn resolve(command: Command) -> Result<MirrorParams, MirrorError> {
    resolve_with_config(command, test_config())
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.download.idle_delay_ms = 0;
    config
}

pub fn write_config_file(dir: &Path, config: &Config) -> Result<String> {
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(path.to_string_lossy().into_owned())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Plan(PlanSummary),
    Decision(String, Decision),
    Progress(u64),
    Outcome(String, String),
    Fatal(String),
    Finish(RunSummary),
}

/// Captures every reporter callback for assertions.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn decisions(&self) -> Vec<(String, Decision)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Decision(name, decision) => Some((name, decision)),
                _ => None,
            })
            .collect()
    }

    pub fn progress_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Progress(_)))
            .count()
    }

    fn push(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for RecordingReporter {
    fn on_plan(&self, summary: &PlanSummary) {
        self.push(Event::Plan(summary.clone()));
    }

    fn on_decision(&self, target: &DownloadTarget, decision: &Decision) {
        self.push(Event::Decision(target.name.clone(), *decision));
    }

    fn on_progress(&self, progress: &TransferProgress) {
        self.push(Event::Progress(progress.bytes_so_far));
    }

    fn on_outcome(&self, target: &DownloadTarget, outcome: &TransferOutcome) {
        self.push(Event::Outcome(target.name.clone(), format!("{outcome:?}")));
    }

    fn on_fatal(&self, error: &MirrorError) {
        self.push(Event::Fatal(error.to_string()));
    }

    fn on_finish(&self, summary: &RunSummary) {
        self.push(Event::Finish(summary.clone()));
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("slackmirror_lib=debug,slackmirror_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
