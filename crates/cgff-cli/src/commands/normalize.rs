use crate::cli::{GlobalArgs, NormalizeArgs};
use crate::config::{CliOverrides, OutputFormat, build_config, resolve_input};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use cgff::core::io::csv::ParameterTable;
use cgff::core::io::shorthand::ShorthandYaml;
use cgff::core::io::traits::ForceFieldWriter;
use cgff::core::io::yaml::ExplicitYaml;
use cgff::core::models::forcefield::ForceField;
use cgff::engine::progress::ProgressReporter;
use cgff::workflows::load;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub fn run(global: &GlobalArgs, args: &NormalizeArgs) -> Result<()> {
    let app = build_config(global, &CliOverrides::from(args))?;
    let input = resolve_input(&args.input, &app.search_paths)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Normalizing {:?}", input);
    let forcefield = load::from_path_with_progress(&input, &app.registry, &app.normalize, &reporter)?;
    for summary in progress_handler.summaries() {
        eprintln!("  {}", summary);
    }

    let header = app.output.header.clone();
    match app.output.format {
        OutputFormat::Yaml => emit(&ExplicitYaml { header }, &forcefield, args.output.as_deref()),
        OutputFormat::Shorthand => {
            emit(&ShorthandYaml { header }, &forcefield, args.output.as_deref())
        }
        OutputFormat::Csv => {
            if header.is_some() {
                debug!("CSV output has no header comment; ignoring it.");
            }
            emit(&ParameterTable, &forcefield, args.output.as_deref())
        }
    }
}

fn emit<W: ForceFieldWriter>(
    writer: &W,
    forcefield: &ForceField,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            writer.write_to_path(forcefield, path)?;
            info!("Wrote {}", path.display());
            eprintln!("✓ Normalized force field written to: {}", path.display());
        }
        None => {
            let rendered = writer.render(forcefield)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const DOC: &str = "bead_types: [A 1.0, B 2.0]\npotentials:\n  gaussian: A;B A;B excl_vol;1.0\n";

    fn args(input: PathBuf, output: PathBuf, format: OutputFormat) -> NormalizeArgs {
        NormalizeArgs {
            input,
            output: Some(output),
            format: Some(format),
            ..Default::default()
        }
    }

    #[test]
    fn writes_each_format_to_the_output_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ff.yaml");
        fs::write(&input, DOC).unwrap();

        let yaml = dir.path().join("out.yaml");
        let mut normalize = args(input.clone(), yaml.clone(), OutputFormat::Yaml);
        normalize.header = Some("normalized".to_string());
        run(&GlobalArgs::default(), &normalize).unwrap();
        let text = fs::read_to_string(&yaml).unwrap();
        assert!(text.starts_with("# normalized\n---\n"));
        assert!(text.contains("excl_vol"));
        assert!(!text.contains("Kappa"));

        let csv = dir.path().join("out.csv");
        run(
            &GlobalArgs::default(),
            &args(input.clone(), csv.clone(), OutputFormat::Csv),
        )
        .unwrap();
        let text = fs::read_to_string(&csv).unwrap();
        assert_eq!(text.lines().count(), 1 + 3 * 3);

        let shorthand = dir.path().join("out.short.yaml");
        run(
            &GlobalArgs::default(),
            &args(input, shorthand.clone(), OutputFormat::Shorthand),
        )
        .unwrap();
        let text = fs::read_to_string(&shorthand).unwrap();
        assert!(text.contains("A B excl_vol;1;free"));
    }

    #[test]
    fn inputs_are_found_through_search_paths() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("searched.yaml"), DOC).unwrap();
        let global = GlobalArgs {
            search_paths: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let output = dir.path().join("out.yaml");
        run(
            &global,
            &args(PathBuf::from("searched.yaml"), output.clone(), OutputFormat::Yaml),
        )
        .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn invalid_documents_fail() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ff.yaml");
        fs::write(&input, "bead_types: [A]\npotentials:\n  gaussian: A Z\n").unwrap();
        let output = dir.path().join("out.yaml");
        assert!(run(&GlobalArgs::default(), &args(input, output.clone(), OutputFormat::Yaml)).is_err());
        assert!(!output.exists());
    }
}
