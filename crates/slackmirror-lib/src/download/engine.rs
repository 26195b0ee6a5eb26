use super::rate_limiter::Pause;
use super::types::{
    Decision, DigestCheck, EngineOptions, MAX_ERROR_BODY_BYTES, RunSummary, SkipReason,
    TransferError, TransferOutcome, TransferProgress, TransferReason,
};
use crate::local;
use crate::plan::DownloadTarget;
use crate::report::Reporter;
use crate::verification::{ContentDigest, ContentDigestVerifier, VerificationError};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Processes targets one at a time: decide, transfer, verify.
pub struct MirrorEngine {
    client: reqwest::Client,
    output_dir: PathBuf,
    options: EngineOptions,
}

impl MirrorEngine {
    pub fn new(
        client: reqwest::Client,
        output_dir: impl Into<PathBuf>,
        options: EngineOptions,
    ) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            options,
        }
    }

    /// Runs every target in order. Per-target failures are reported and the
    /// run moves on; only cancellation stops it early.
    pub async fn run(
        &self,
        targets: &[DownloadTarget],
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary {
            dry_run: self.options.dry_run,
            ..RunSummary::default()
        };
        let mut contacted_origin = false;

        for target in targets {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if contacted_origin && !self.options.sleep_between.is_zero() {
                tracing::debug!(
                    "Sleeping for {:.2} seconds...",
                    self.options.sleep_between.as_secs_f64()
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.options.sleep_between) => {}
                }
            }

            let outcome = self.process(target, reporter, cancel).await;
            contacted_origin = matches!(
                outcome,
                TransferOutcome::Downloaded { .. } | TransferOutcome::Failed { .. }
            );
            reporter.on_outcome(target, &outcome);
            summary.record(&outcome);

            if summary.cancelled {
                break;
            }
        }

        summary
    }

    /// Decides and, unless skipping or in a dry run, transfers one target.
    #[tracing::instrument(skip_all, fields(package = %target.name))]
    pub async fn process(
        &self,
        target: &DownloadTarget,
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> TransferOutcome {
        let destination = self.output_dir.join(&target.destination_path);

        let decision = self.decide(target, &destination).await;
        reporter.on_decision(target, &decision);

        if self.options.dry_run {
            return TransferOutcome::Planned { decision };
        }

        match decision {
            Decision::Skip(reason) => TransferOutcome::Skipped { reason },
            Decision::Transfer(_) => {
                match self.transfer(target, &destination, reporter, cancel).await {
                    Ok((bytes, digest)) => TransferOutcome::Downloaded { bytes, digest },
                    Err(cause) => TransferOutcome::Failed { cause },
                }
            }
        }
    }

    /// Chooses between skipping and transferring based on the local copy.
    ///
    /// The local digest is only computed when a reference digest exists and
    /// the file would otherwise be kept.
    pub async fn decide(&self, target: &DownloadTarget, destination: &Path) -> Decision {
        let state = local::inspect(destination).await;

        if !state.exists {
            return Decision::Transfer(TransferReason::Missing);
        }
        if !state.has_content() {
            return Decision::Transfer(TransferReason::Empty);
        }
        if self.options.overwrite {
            return Decision::Transfer(TransferReason::Overwrite);
        }

        match &target.reference_digest {
            Some(expected) => match local::digest(destination, expected.algorithm()).await {
                Ok(actual) if &actual == expected => Decision::Skip(SkipReason::ChecksumValid),
                Ok(actual) => {
                    tracing::debug!(
                        path = %destination.display(),
                        expected = %expected.to_hex(),
                        actual = %actual.to_hex(),
                        "Existing file has a different checksum"
                    );
                    Decision::Transfer(TransferReason::ChecksumMismatch)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %destination.display(),
                        error = %e,
                        "Could not hash existing file"
                    );
                    Decision::Transfer(TransferReason::ChecksumMismatch)
                }
            },
            None if self.options.preserve_existing => Decision::Skip(SkipReason::AlreadyPresent),
            None => {
                tracing::debug!(
                    path = %destination.display(),
                    size_bytes = state.size_bytes,
                    age_secs = state
                        .modified
                        .and_then(|modified| modified.elapsed().ok())
                        .map(|age| age.as_secs()),
                    "Existing file has no reference checksum"
                );
                Decision::Transfer(TransferReason::Unverifiable)
            }
        }
    }

    async fn transfer(
        &self,
        target: &DownloadTarget,
        destination: &Path,
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> Result<(u64, DigestCheck), TransferError> {
        let network = |source: reqwest::Error| TransferError::Network {
            url: target.url.to_string(),
            source,
        };

        tracing::debug!(url = %target.url, "Requesting");
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            response = self.client.get(target.url.clone()).send() => {
                response.map_err(network)?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }
        let declared_total = response.content_length();
        tracing::debug!(?declared_total, "Response received");

        // The existing file is only truncated once the origin has answered.
        let mut file = ChunkedFile::create(
            destination,
            target.reference_digest.clone(),
            self.options.chunk_size,
        )
        .await?;
        let mut throttle = self.options.rate_limiter.start();
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };
            let frame = match next {
                None => {
                    file.abandon().await;
                    return Err(TransferError::Cancelled);
                }
                Some(None) => break,
                Some(Some(Err(e))) => {
                    file.abandon().await;
                    return Err(network(e));
                }
                Some(Some(Ok(frame))) => frame,
            };

            file.buffer(&frame);
            while let Some(chunk) = file.take_full_chunk() {
                file.write(&chunk).await?;
                let pause = throttle.record(chunk.len());
                reporter.on_progress(&TransferProgress {
                    name: target.name.clone(),
                    bytes_so_far: throttle.bytes_so_far(),
                    declared_total,
                    rate_kbps: throttle.average_kbps(),
                    pause,
                });

                if !wait(pause, throttle.average_kbps(), cancel).await {
                    file.abandon().await;
                    return Err(TransferError::Cancelled);
                }
            }
        }

        if let Some(rest) = file.take_remainder() {
            file.write(&rest).await?;
            let pause = throttle.record(rest.len());
            reporter.on_progress(&TransferProgress {
                name: target.name.clone(),
                bytes_so_far: throttle.bytes_so_far(),
                declared_total,
                rate_kbps: throttle.average_kbps(),
                pause,
            });
        }

        let digest = file.finish().await?;
        Ok((throttle.bytes_so_far(), digest))
    }
}

/// Sleeps for `pause` unless cancelled first. Returns `false` on cancellation.
async fn wait(pause: Pause, rate_kbps: f64, cancel: &CancellationToken) -> bool {
    if let Pause::Throttle(duration) = pause {
        tracing::trace!(
            sleep_secs = duration.as_secs_f64(),
            rate_kbps,
            "Download speed exceeded rate limit"
        );
    }
    if pause.duration().is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(pause.duration()) => true,
    }
}

/// Destination file fed in `chunk_size` pieces. Bytes that do not fill a
/// chunk yet wait in `pending`.
struct ChunkedFile<'a> {
    path: &'a Path,
    writer: BufWriter<tokio::fs::File>,
    verifier: Option<ContentDigestVerifier>,
    pending: Vec<u8>,
    chunk_size: usize,
}

impl<'a> ChunkedFile<'a> {
    async fn create(
        path: &'a Path,
        reference: Option<ContentDigest>,
        chunk_size: usize,
    ) -> Result<Self, TransferError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TransferError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|source| io_error(path, source))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            verifier: reference.map(ContentDigestVerifier::new),
            pending: Vec::with_capacity(chunk_size),
            chunk_size: chunk_size.max(1),
        })
    }

    fn buffer(&mut self, frame: &[u8]) {
        self.pending.extend_from_slice(frame);
    }

    fn take_full_chunk(&mut self) -> Option<Vec<u8>> {
        if self.pending.len() < self.chunk_size {
            return None;
        }
        let rest = self.pending.split_off(self.chunk_size);
        Some(std::mem::replace(&mut self.pending, rest))
    }

    fn take_remainder(&mut self) -> Option<Vec<u8>> {
        (!self.pending.is_empty()).then(|| std::mem::take(&mut self.pending))
    }

    async fn write(&mut self, chunk: &[u8]) -> Result<(), TransferError> {
        let path = self.path;
        self.writer
            .write_all(chunk)
            .await
            .map_err(|source| io_error(path, source))?;
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.update(chunk);
        }
        Ok(())
    }

    /// Writes out whatever was received and leaves the truncated file behind.
    async fn abandon(mut self) {
        let pending = std::mem::take(&mut self.pending);
        let result = match self.writer.write_all(&pending).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not flush partial file");
        }
    }

    async fn finish(mut self) -> Result<DigestCheck, TransferError> {
        let path = self.path;
        self.writer
            .flush()
            .await
            .map_err(|source| io_error(path, source))?;

        Ok(match self.verifier {
            None => DigestCheck::Unavailable,
            Some(verifier) => match verifier.verify() {
                Ok(_) => DigestCheck::Matched,
                Err(VerificationError::VerificationFailed { expected, actual }) => {
                    DigestCheck::Mismatched { expected, actual }
                }
            },
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn error_body(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(body) => {
            let end = body.len().min(MAX_ERROR_BODY_BYTES);
            String::from_utf8_lossy(&body[..end]).into_owned()
        }
        Err(e) => format!("<body unavailable: {e}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::RateLimiter;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::Notify;
    use url::Url;

    const HELLO_MD5: &str = "b1946ac92492d2347c6235b4d2611184";

    fn engine(output_dir: &Path, options: EngineOptions) -> MirrorEngine {
        MirrorEngine::new(reqwest::Client::new(), output_dir, options)
    }

    fn quiet_options() -> EngineOptions {
        EngineOptions {
            rate_limiter: RateLimiter::disabled(),
            sleep_between: Duration::ZERO,
            ..EngineOptions::default()
        }
    }

    fn target(reference: Option<&str>) -> DownloadTarget {
        DownloadTarget {
            name: "a-1.0.tgz".to_string(),
            location: "slackware64/a".to_string(),
            url: Url::parse("http://127.0.0.1:9/slackware64/a/a-1.0.tgz").unwrap(),
            destination_path: PathBuf::from("slackware64/a/a-1.0.tgz"),
            expected_size_kb: 1,
            reference_digest: reference.and_then(ContentDigest::from_hex),
        }
    }

    fn write_destination(dir: &Path, contents: &[u8]) -> PathBuf {
        let path = dir.join("slackware64/a/a-1.0.tgz");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_is_transferred() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), quiet_options());
        let destination = dir.path().join("slackware64/a/a-1.0.tgz");

        let decision = engine.decide(&target(None), &destination).await;

        assert_eq!(decision, Decision::Transfer(TransferReason::Missing));
    }

    #[tokio::test]
    async fn test_empty_file_is_transferred_even_when_preserving() {
        let dir = tempfile::tempdir().unwrap();
        let destination = write_destination(dir.path(), b"");
        let engine = engine(
            dir.path(),
            EngineOptions {
                preserve_existing: true,
                ..quiet_options()
            },
        );

        let decision = engine.decide(&target(Some(HELLO_MD5)), &destination).await;

        assert_eq!(decision, Decision::Transfer(TransferReason::Empty));
    }

    #[tokio::test]
    async fn test_matching_checksum_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let destination = write_destination(dir.path(), b"hello\n");
        let engine = engine(dir.path(), quiet_options());

        let decision = engine.decide(&target(Some(HELLO_MD5)), &destination).await;

        assert_eq!(decision, Decision::Skip(SkipReason::ChecksumValid));
    }

    #[tokio::test]
    async fn test_mismatched_checksum_is_transferred() {
        let dir = tempfile::tempdir().unwrap();
        let destination = write_destination(dir.path(), b"corrupt");
        let engine = engine(
            dir.path(),
            EngineOptions {
                preserve_existing: true,
                ..quiet_options()
            },
        );

        let decision = engine.decide(&target(Some(HELLO_MD5)), &destination).await;

        assert_eq!(decision, Decision::Transfer(TransferReason::ChecksumMismatch));
    }

    #[tokio::test]
    async fn test_present_without_reference_depends_on_preserve_existing() {
        let dir = tempfile::tempdir().unwrap();
        let destination = write_destination(dir.path(), b"hello\n");

        let overwriting = engine(dir.path(), quiet_options());
        assert_eq!(
            overwriting.decide(&target(None), &destination).await,
            Decision::Transfer(TransferReason::Unverifiable)
        );

        let preserving = engine(
            dir.path(),
            EngineOptions {
                preserve_existing: true,
                ..quiet_options()
            },
        );
        assert_eq!(
            preserving.decide(&target(None), &destination).await,
            Decision::Skip(SkipReason::AlreadyPresent)
        );
    }

    #[tokio::test]
    async fn test_overwrite_wins_over_valid_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let destination = write_destination(dir.path(), b"hello\n");
        let engine = engine(
            dir.path(),
            EngineOptions {
                overwrite: true,
                preserve_existing: true,
                ..quiet_options()
            },
        );

        let decision = engine.decide(&target(Some(HELLO_MD5)), &destination).await;

        assert_eq!(decision, Decision::Transfer(TransferReason::Overwrite));
    }

    #[tokio::test]
    async fn test_dry_run_reports_decision_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(
            dir.path(),
            EngineOptions {
                dry_run: true,
                ..quiet_options()
            },
        );

        let summary = engine
            .run(
                &[target(None)],
                &crate::report::NullReporter,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary.planned, 1);
        assert!(summary.dry_run);
        assert!(!dir.path().join("slackware64").exists());
    }

    #[tokio::test]
    async fn test_cancelled_run_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), quiet_options());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = engine
            .run(&[target(None), target(None)], &crate::report::NullReporter, &cancel)
            .await;

        assert!(summary.cancelled);
        assert_eq!(summary.downloaded + summary.failed + summary.skipped, 0);
    }

    /// Loopback origin that answers every request with `body` under a
    /// `Content-Length` of `declared_len`. With `hang` the connection stays
    /// open afterwards, otherwise it is closed.
    async fn spawn_origin(body: &[u8], declared_len: usize, hang: bool) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_vec();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buffer = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buffer).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buffer[..n]),
                        }
                    }
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {declared_len}\r\nConnection: close\r\n\r\n"
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    let _ = socket.flush().await;
                    if hang {
                        std::future::pending::<()>().await;
                    }
                });
            }
        });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn target_at(origin: &Url, name: &str) -> DownloadTarget {
        DownloadTarget {
            name: name.to_string(),
            location: "pkgs".to_string(),
            url: origin.join(name).unwrap(),
            destination_path: PathBuf::from("pkgs").join(name),
            expected_size_kb: 1,
            reference_digest: None,
        }
    }

    /// Records events and cancels the run on the first progress event that
    /// `cancel_on` accepts.
    struct ScriptedReporter {
        cancel: CancellationToken,
        cancel_on: fn(&TransferProgress) -> bool,
        progress: Mutex<Vec<TransferProgress>>,
        outcomes: Mutex<Vec<String>>,
        outcome_seen: Arc<Notify>,
    }

    impl ScriptedReporter {
        fn new(cancel: &CancellationToken, cancel_on: fn(&TransferProgress) -> bool) -> Self {
            Self {
                cancel: cancel.clone(),
                cancel_on,
                progress: Mutex::default(),
                outcomes: Mutex::default(),
                outcome_seen: Arc::new(Notify::new()),
            }
        }

        fn outcomes(&self) -> Vec<String> {
            self.outcomes.lock().unwrap().clone()
        }
    }

    impl Reporter for ScriptedReporter {
        fn on_progress(&self, progress: &TransferProgress) {
            self.progress.lock().unwrap().push(progress.clone());
            if (self.cancel_on)(progress) {
                self.cancel.cancel();
            }
        }

        fn on_outcome(&self, _target: &DownloadTarget, outcome: &TransferOutcome) {
            self.outcomes.lock().unwrap().push(format!("{outcome:?}"));
            self.outcome_seen.notify_one();
        }
    }

    async fn run_with_deadline(
        engine: &MirrorEngine,
        targets: &[DownloadTarget],
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> RunSummary {
        tokio::time::timeout(Duration::from_secs(10), engine.run(targets, reporter, cancel))
            .await
            .expect("run did not stop in time")
    }

    #[tokio::test]
    async fn test_small_frames_are_grouped_into_full_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![7u8; 10];
        let origin = spawn_origin(&body, body.len(), false).await;
        let engine = engine(
            dir.path(),
            EngineOptions {
                chunk_size: 4,
                ..quiet_options()
            },
        );
        let cancel = CancellationToken::new();
        let reporter = ScriptedReporter::new(&cancel, |_| false);

        let summary = run_with_deadline(
            &engine,
            &[target_at(&origin, "pkg.tgz")],
            &reporter,
            &cancel,
        )
        .await;

        assert_eq!(summary.downloaded, 1);
        let sizes: Vec<u64> = reporter
            .progress
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.bytes_so_far)
            .collect();
        assert_eq!(sizes, vec![4, 8, 10]);
        assert_eq!(std::fs::read(dir.path().join("pkgs/pkg.tgz")).unwrap(), body);
    }

    #[tokio::test]
    async fn test_cancel_mid_transfer_leaves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let origin = spawn_origin(b"01234567", 16, true).await;
        let engine = engine(
            dir.path(),
            EngineOptions {
                chunk_size: 4,
                ..quiet_options()
            },
        );
        let cancel = CancellationToken::new();
        let reporter = ScriptedReporter::new(&cancel, |_| true);

        let summary = run_with_deadline(
            &engine,
            &[target_at(&origin, "slow.tgz"), target_at(&origin, "next.tgz")],
            &reporter,
            &cancel,
        )
        .await;

        assert!(summary.cancelled);
        assert_eq!(summary.downloaded + summary.failed, 0);
        let outcomes = reporter.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].contains("Cancelled"));

        let written = std::fs::metadata(dir.path().join("pkgs/slow.tgz")).unwrap().len();
        assert!((4..16).contains(&written), "partial file has {written} bytes");
        assert!(!dir.path().join("pkgs/next.tgz").exists());
    }

    #[tokio::test]
    async fn test_stream_error_keeps_received_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let origin = spawn_origin(b"01234567", 16, false).await;
        let engine = engine(dir.path(), quiet_options());
        let cancel = CancellationToken::new();
        let reporter = ScriptedReporter::new(&cancel, |_| false);

        let summary = run_with_deadline(
            &engine,
            &[target_at(&origin, "cut.tgz")],
            &reporter,
            &cancel,
        )
        .await;

        assert_eq!(summary.failed, 1);
        assert!(reporter.outcomes()[0].contains("Network"));
        assert_eq!(
            std::fs::read(dir.path().join("pkgs/cut.tgz")).unwrap(),
            b"01234567"
        );
    }

    #[tokio::test]
    async fn test_cancel_during_sleep_between_targets() {
        let dir = tempfile::tempdir().unwrap();
        let origin = spawn_origin(b"abc", 3, false).await;
        let engine = engine(
            dir.path(),
            EngineOptions {
                sleep_between: Duration::from_secs(3600),
                ..quiet_options()
            },
        );
        let cancel = CancellationToken::new();
        let reporter = ScriptedReporter::new(&cancel, |_| false);

        let outcome_seen = reporter.outcome_seen.clone();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            outcome_seen.notified().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let summary = run_with_deadline(
            &engine,
            &[target_at(&origin, "a.tgz"), target_at(&origin, "b.tgz")],
            &reporter,
            &cancel,
        )
        .await;

        assert!(summary.cancelled);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(reporter.outcomes().len(), 1);
        assert!(dir.path().join("pkgs/a.tgz").exists());
        assert!(!dir.path().join("pkgs/b.tgz").exists());
    }

    #[tokio::test]
    async fn test_skipped_targets_do_not_wait_between() {
        let dir = tempfile::tempdir().unwrap();
        let origin = Url::parse("http://127.0.0.1:9/").unwrap();
        for name in ["a.tgz", "b.tgz"] {
            std::fs::create_dir_all(dir.path().join("pkgs")).unwrap();
            std::fs::write(dir.path().join("pkgs").join(name), b"present").unwrap();
        }
        let engine = engine(
            dir.path(),
            EngineOptions {
                sleep_between: Duration::from_secs(3600),
                preserve_existing: true,
                ..quiet_options()
            },
        );
        let cancel = CancellationToken::new();

        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            engine.run(
                &[target_at(&origin, "a.tgz"), target_at(&origin, "b.tgz")],
                &crate::report::NullReporter,
                &cancel,
            ),
        )
        .await
        .expect("skips should not sleep");

        assert_eq!(summary.skipped, 2);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_throttled_transfer_reports_pause() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![1u8; 8192];
        let origin = spawn_origin(&body, body.len(), false).await;
        let engine = engine(
            dir.path(),
            EngineOptions {
                rate_limiter: RateLimiter::new(1, Duration::ZERO),
                chunk_size: 4096,
                ..quiet_options()
            },
        );
        let cancel = CancellationToken::new();
        let reporter =
            ScriptedReporter::new(&cancel, |p| matches!(p.pause, Pause::Throttle(_)));

        let summary = run_with_deadline(
            &engine,
            &[target_at(&origin, "big.tgz")],
            &reporter,
            &cancel,
        )
        .await;

        let progress = reporter.progress.lock().unwrap().clone();
        assert_eq!(progress[0].bytes_so_far, 4096);
        assert!(matches!(progress[0].pause, Pause::Throttle(d) if d > Duration::ZERO));

        // Cancelled while sleeping off the throttle pause.
        assert!(summary.cancelled);
        assert!(reporter.outcomes()[0].contains("Cancelled"));
        let written = std::fs::metadata(dir.path().join("pkgs/big.tgz")).unwrap().len();
        assert!(written >= 4096);
    }
}
