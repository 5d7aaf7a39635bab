use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indicatif::MultiProgress;

use super::command::{Cli, OutputFormat, ProcessArgs};
use super::profile::Profile;
use super::progress::{create_spinner, finish_spinner};
use crate::export::{header, image, table};
use dzt::filter::pipeline::ActiveFilterSet;
use dzt::process::encode::Encoder;
use dzt::process::session::Session;
use dzt::structs::dataset::Dataset;

pub fn cmd_process(args: &ProcessArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let filters = build_filter_set(args)?;
    if filters.is_empty() {
        log::info!("No filters given; writing data unchanged");
    } else {
        let names: Vec<_> = filters.iter().map(ToString::to_string).collect();
        log::info!("Filters: {}", names.join(" -> "));
    }

    let mut session = Session::new(args.decode.to_options(cli.fail_level()));

    let pb = create_spinner(multi, "Decoding...")?;
    let report = session.load(args.inputs.clone())?;
    finish_spinner(pb, format!("Decoded {} file(s)", report.loaded.len()));

    if let Some((path, err)) = report.failed.first() {
        if cli.strict || report.loaded.is_empty() {
            bail!("Failed to decode {}: {err:#}", path.display());
        }
    }
    if report.warnings > 0 {
        log::info!("{} warning(s) while decoding", report.warnings);
    }

    *session.filters_mut() = filters;
    let pb = create_spinner(multi, "Filtering...")?;
    session.apply_filters()?;
    finish_spinner(pb, "Filtering complete".to_string());

    let mut encoder = Encoder::default();
    encoder.set_fail_level(cli.fail_level());

    let several = session.datasets().len() > 1;
    for dataset in session.datasets() {
        let target = output_path(args, dataset, several)?;
        export(dataset, args.format, &target, &encoder)?;
    }

    Ok(())
}

/// Profile entries first, then `--filter` flags in the order given.
fn build_filter_set(args: &ProcessArgs) -> Result<ActiveFilterSet> {
    let mut filters = match &args.profile {
        Some(path) => Profile::load(path)?.to_filter_set()?,
        None => ActiveFilterSet::new(),
    };
    for spec in &args.filter {
        if let Some(old) = filters.insert(spec.clone()) {
            log::debug!("--filter {spec} replaces profile entry {old}");
        }
    }
    Ok(filters)
}

fn export(dataset: &Dataset, format: OutputFormat, target: &Path, encoder: &Encoder) -> Result<()> {
    match format {
        OutputFormat::Dzt => {
            let file = File::create(target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            let summary = encoder.write(dataset, BufWriter::new(file))?;
            if summary.unverified_multichannel {
                log::warn!(
                    "{}: multi-channel output has not been verified against field software",
                    target.display()
                );
            }
            log::info!(
                "Wrote {} ({} channel(s), {} traces, {} bytes)",
                target.display(),
                summary.channels,
                summary.traces,
                summary.header_bytes + summary.payload_bytes
            );
        }
        OutputFormat::Csv => {
            for path in table::write_tables(dataset, target)? {
                log::info!("Wrote {}", path.display());
            }
        }
        OutputFormat::Png => {
            image::write_png(dataset, target)?;
            log::info!("Wrote {}", target.display());
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let text = if format == OutputFormat::Json {
                header::to_json(dataset.channels())?
            } else {
                header::to_yaml(dataset.channels())?
            };
            std::fs::write(target, text)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            log::info!("Wrote {}", target.display());
        }
    }
    Ok(())
}

/// Where to write `dataset`.
///
/// Without `--output-path` the file goes beside its input as
/// `<stem>_processed`. With several inputs `--output-path` names a directory.
/// A path missing the format's extension gets it appended.
fn output_path(args: &ProcessArgs, dataset: &Dataset, several: bool) -> Result<PathBuf> {
    let source = dataset.source.as_deref().unwrap_or(Path::new("output"));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let processed = format!("{stem}_processed");

    let path = match &args.output_path {
        Some(dir) if several => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
            dir.join(processed)
        }
        Some(path) => path.clone(),
        None => source.with_file_name(processed),
    };

    Ok(with_extension(path, args.format.extension()))
}

fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension));
    if has_extension {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
