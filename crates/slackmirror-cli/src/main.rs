use slackmirror_lib::cli::{parse_args, resolve_command, run_mirror};
use slackmirror_lib::error::MirrorError;
use slackmirror_lib::report::ConsoleReporter;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), MirrorError> {
    color_eyre::install()?;

    let args = parse_args();
    let params = resolve_command(args.command)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            on_interrupt.cancel();
        }
    });

    // Per-package failures do not change the exit code unless --strict is set.
    run_mirror(params, &ConsoleReporter::new(), cancel).await?;

    Ok(())
}
