use crate::checksum::ChecksumIndex;
use crate::cli::params::MirrorParams;
use crate::download::{MirrorEngine, RunSummary};
use crate::error::MirrorError;
use crate::manifest::parse_manifest;
use crate::plan::plan_targets;
use crate::report::Reporter;
use crate::source::fetch_text;
use tokio_util::sync::CancellationToken;

/// Fetches the manifest (and checksum listing), plans the targets and runs
/// the engine over them.
///
/// Only a missing or unparsable manifest, or an unreachable checksum listing,
/// fails the run. Per-package failures end up in the returned summary.
pub async fn run_mirror(
    params: MirrorParams,
    reporter: &dyn Reporter,
    cancel: CancellationToken,
) -> Result<RunSummary, MirrorError> {
    let result = run_inner(params, reporter, &cancel).await;
    if let Err(error) = &result {
        reporter.on_fatal(error);
    }
    result
}

async fn run_inner(
    params: MirrorParams,
    reporter: &dyn Reporter,
    cancel: &CancellationToken,
) -> Result<RunSummary, MirrorError> {
    let client = reqwest::Client::builder()
        .connect_timeout(params.request_timeout)
        .build()?;

    tracing::info!("Loading package manifest from {}", params.manifest);
    let manifest_text = fetch_text(&client, &params.manifest).await?;
    let records = parse_manifest(&manifest_text)?;
    tracing::debug!(records = records.len(), "Parsed manifest");

    let checksums = match &params.checksums {
        Some(checksums) => {
            tracing::info!("Loading checksums from {}", checksums.source);
            let text = fetch_text(&client, &checksums.source).await?;
            let index = ChecksumIndex::parse_with_prefix(&text, &checksums.prefix);
            if index.is_empty() {
                tracing::warn!(
                    "Checksum listing has no usable entries; downloads will not be verified"
                );
            }
            Some(index)
        }
        None => None,
    };

    let plan = plan_targets(
        &records,
        &params.filters,
        checksums.as_ref(),
        &params.base_url,
    )?;
    reporter.on_plan(&plan.summary(
        params.engine.rate_limiter.ceiling_kbps(),
        params.engine.sleep_between,
    ));

    let engine = MirrorEngine::new(client, params.output_dir, params.engine);
    let summary = engine.run(&plan.targets, reporter, cancel).await;
    reporter.on_finish(&summary);

    if params.strict && summary.has_failures() {
        return Err(MirrorError::StrictModeFailures {
            failed: summary.failed,
            mismatched: summary.mismatched,
        });
    }

    Ok(summary)
}
