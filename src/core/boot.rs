use crate::core::loader::discover_installations;
use crate::domain::ports::{BootOutcome, InstallationLauncher};
use crate::domain::report::{BootFailure, BootFailureReason, BootSummary};
use crate::utils::error::{LayersError, Result};
use std::path::Path;
use std::time::{Duration, Instant};

fn installation_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 啟動並確認安裝能在時限內乾淨地啟動與關閉
pub async fn verify_boots<L: InstallationLauncher + ?Sized>(
    launcher: &L,
    installation_path: &Path,
    timeout: Duration,
) -> Result<()> {
    let installation = installation_label(installation_path);
    let started = Instant::now();

    let outcome = launcher.launch(installation_path, timeout).await?;
    tracing::debug!(
        "Boot of '{}' finished in {:?}: {:?}",
        installation,
        started.elapsed(),
        outcome
    );

    match outcome {
        BootOutcome::Clean => Ok(()),
        BootOutcome::TimedOut => Err(LayersError::BootTimeout {
            installation,
            timeout_secs: timeout.as_secs(),
        }),
        BootOutcome::Failed { reason } => Err(LayersError::BootFailed {
            installation,
            reason,
        }),
    }
}

/// 依序啟動根目錄下每個安裝；失敗會累積而不中斷
pub async fn verify_all_boot<L: InstallationLauncher + ?Sized>(
    launcher: &L,
    root: &Path,
    timeout: Duration,
) -> Result<BootSummary> {
    let mut summary = BootSummary::default();

    for path in discover_installations(root)? {
        let installation = installation_label(&path);
        tracing::info!("🚀 Booting '{}'", installation);

        match verify_boots(launcher, &path, timeout).await {
            Ok(()) => summary.verified.push(installation),
            Err(LayersError::BootTimeout { timeout_secs, .. }) => {
                tracing::error!("'{}' did not boot within {}s", installation, timeout_secs);
                summary.failures.push(BootFailure {
                    installation,
                    path,
                    reason: BootFailureReason::Timeout { timeout_secs },
                });
            }
            Err(LayersError::BootFailed { reason, .. }) => {
                tracing::error!("'{}' failed to boot: {}", installation, reason);
                summary.failures.push(BootFailure {
                    installation,
                    path,
                    reason: BootFailureReason::Failed { reason },
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}
