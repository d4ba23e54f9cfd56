use crate::core::scanner::reachable_from;
use crate::domain::model::Installation;
use crate::domain::report::{DiffKind, DiffReport, SetDiff};
use crate::utils::error::{LayersError, Result};
use std::collections::BTreeSet;

/// 已佈建但無法從根模組或擴充到達的模組，必須與期望集合完全相同
pub fn check_unreferenced(
    installation: &Installation,
    expected_unreferenced: &BTreeSet<String>,
) -> Result<DiffReport> {
    let reachable = reachable_from(&installation.graph, installation.entry_points())?;

    let unprovisioned: Vec<String> = reachable
        .difference(&installation.provisioned)
        .cloned()
        .collect();
    if !unprovisioned.is_empty() {
        return Err(LayersError::BrokenInstallation {
            installation: installation.name.clone(),
            unprovisioned,
        });
    }

    let extra: BTreeSet<String> = installation
        .provisioned
        .difference(&reachable)
        .cloned()
        .collect();

    tracing::debug!(
        "'{}': {} provisioned, {} reachable, {} unreferenced",
        installation.name,
        installation.provisioned.len(),
        reachable.len(),
        extra.len()
    );

    let diff = SetDiff::compare(expected_unreferenced, &extra);
    log_unexpected(installation, &diff);

    Ok(DiffReport {
        kind: DiffKind::Unreferenced,
        installations: vec![installation.name.clone()],
        actual: extra,
        diff,
    })
}

/// 參考安裝有、但全層安裝沒有的模組，必須與期望集合完全相同
pub fn check_unused_in_layers(
    reference: &Installation,
    all_layers: &Installation,
    expected_unused: &BTreeSet<String>,
) -> DiffReport {
    let unused: BTreeSet<String> = reference
        .provisioned
        .difference(&all_layers.provisioned)
        .cloned()
        .collect();

    tracing::debug!(
        "{} modules in '{}' are not provisioned in '{}'",
        unused.len(),
        reference.name,
        all_layers.name
    );

    DiffReport {
        kind: DiffKind::UnusedInAllLayers,
        installations: vec![reference.name.clone(), all_layers.name.clone()],
        diff: SetDiff::compare(expected_unused, &unused),
        actual: unused,
    }
}

/// 說明意外出現的模組被誰依賴，協助判斷回歸來源
fn log_unexpected(installation: &Installation, diff: &SetDiff) {
    for module in &diff.unexpected {
        if let Ok(dependents) = installation.graph.dependents_of(module) {
            if !dependents.is_empty() {
                tracing::debug!(
                    "unexpected '{}' is required by unreachable modules: {:?}",
                    module,
                    dependents
                );
            }
        }
    }
}
