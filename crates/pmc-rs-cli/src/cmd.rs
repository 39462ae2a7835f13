// crates/pmc-rs-cli/src/cmd.rs
//! Each command is a thin composition of the library crates.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::info;
use pmc_rs::expand::expand_all;
use pmc_rs::{CheckResult, ExpandOptions, Models, Project, TreeKind};
use pmc_rs_export::smdx::import_smdx;
use pmc_rs_export::{ExportConfig, export_all};
use pmc_rs_smdx::load_smdx_from_str;

use crate::args::{Command, OutputArgs};

pub fn dispatch(command: Command) -> Result<ExitCode> {
    match command {
        Command::Import { project, smdx } => {
            import(&project, &smdx)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Export { project, output } => {
            let project = open(&project)?;
            export(&project.models, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { project } => {
            let project = open(&project)?;
            let (report, errors) = validate(&project.models);
            print!("{report}");
            Ok(if errors > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Build { project, output } => {
            build(&project, &output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("loading project {}", path.display()))
}

fn config(output: &OutputArgs) -> ExportConfig {
    ExportConfig {
        template_dir: output.template_dir.clone(),
        pmvs_dir: output.pmvs_dir.clone(),
        ..ExportConfig::new(&output.out)
    }
}

pub fn import(project: &Path, smdx: &Path) -> Result<()> {
    let mut target = if project.exists() {
        open(project)?
    } else {
        Project::create(project).with_context(|| format!("creating project {}", project.display()))?
    };
    let text = std::fs::read_to_string(smdx).with_context(|| format!("reading {}", smdx.display()))?;
    let model = load_smdx_from_str(&text).with_context(|| format!("parsing {}", smdx.display()))?;
    import_smdx(&mut target.models, &model).with_context(|| format!("importing SMDX model {}", model.id))?;
    target.save().context("saving project")?;
    Ok(())
}

pub fn export(models: &Models, output: &OutputArgs) -> Result<()> {
    let written = export_all(models, &config(output))
        .with_context(|| format!("exporting to {}", output.out.display()))?;
    info!("Wrote {} files", written.len());
    Ok(())
}

/// Findings of every tree as text, one per line, and the error count.
pub fn validate(models: &Models) -> (String, usize) {
    let results = models.check();
    let mut report = String::new();
    let mut errors = 0;
    for (kind, result) in TreeKind::ALL.into_iter().zip(results) {
        errors += result.count(pmc_rs::Level::Error);
        let Some(result) = result.prune() else {
            continue;
        };
        for (node, finding) in result.flatten() {
            report.push_str(&line(kind, node, finding));
        }
    }
    (report, errors)
}

fn line(kind: TreeKind, node: &CheckResult, finding: &pmc_rs::Finding) -> String {
    format!(
        "{}: {} {} \"{}\" ({}): {}\n",
        finding.level,
        kind.name(),
        node.kind.tag(),
        node.name,
        node.uuid,
        finding.message
    )
}

pub fn build(project: &Path, output: &OutputArgs) -> Result<()> {
    let mut target = open(project)?;
    let options = ExpandOptions::with_embedded_order().context("loading leaf order")?;
    let reports = expand_all(&mut target.models, &options).context("expanding tables")?;
    for report in &reports {
        if !report.skipped_seeds.is_empty() {
            log::warn!(
                "Expansion of {} skipped {} references",
                report.view,
                report.skipped_seeds.len()
            );
        }
    }
    info!("Expanded {} tables and views", reports.len());
    target.save().context("saving project")?;
    export(&target.models, output)
}
