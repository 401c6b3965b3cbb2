use crate::cli::{CheckArgs, GlobalArgs};
use crate::config::{AppConfig, CliOverrides, build_config, resolve_input};
use crate::error::{CliError, Result};
use crate::utils::progress::file_bar;
use cgff::core::models::forcefield::ForceField;
use cgff::engine::validator::validate;
use cgff::workflows::load;
use std::path::Path;
use tracing::{error, info, warn};

pub fn run(global: &GlobalArgs, args: &CheckArgs) -> Result<()> {
    let app = build_config(global, &CliOverrides::default())?;
    let total = args.files.len();

    let bar = (total > 1).then(|| file_bar(total as u64));
    let mut failed = 0;
    for file in &args.files {
        let line = match check_file(&app, file) {
            Ok(summary) => format!("✓ {}: {}", file.display(), summary),
            Err(e) => {
                failed += 1;
                error!("Check of {:?} failed: {}", file, e);
                format!("✗ {}: {}", file.display(), e)
            }
        };
        match &bar {
            Some(bar) => {
                bar.println(line);
                bar.inc(1);
            }
            None => println!("{}", line),
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    info!("Checked {} file(s), {} failed.", total, failed);
    if failed > 0 {
        return Err(CliError::CheckFailed { failed, total });
    }
    Ok(())
}

fn check_file(app: &AppConfig, file: &Path) -> Result<String> {
    let path = resolve_input(file, &app.search_paths)?;
    let forcefield = load::from_path(&path, &app.registry, &app.normalize)?;
    for issue in validate(&forcefield, &app.registry) {
        warn!("{}: {}", file.display(), issue);
    }
    summarize(&forcefield)
}

/// One-line description: bead count, instances per kind, free parameters.
fn summarize(forcefield: &ForceField) -> Result<String> {
    let kinds: Vec<String> = forcefield
        .kinds()
        .map(|kind| format!("{} {}", forcefield.potentials_of(kind).len(), kind))
        .collect();
    let potentials = if kinds.is_empty() {
        "no potentials".to_string()
    } else {
        kinds.join(", ")
    };
    Ok(format!(
        "{} bead type(s); {}; {} free parameter(s)",
        forcefield.bead_count(),
        potentials,
        forcefield.free_parameters()?.len()
    ))
}
