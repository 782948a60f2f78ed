use plate_detector::config::{load_config, verify::VerifyToolConfig};
use plate_detector::image::io::{load_image, write_json_file};
use plate_detector::{CandidateVerifier, Localization, VerificationReport};
use serde::Serialize;
use std::env;
use std::path::Path;

fn usage() -> String {
    "Usage: verify_fragments <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateOutcome<'a> {
    template: &'a Path,
    #[serde(flatten)]
    report: &'a VerificationReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifySummary<'a> {
    scene: &'a Path,
    located: usize,
    results: Vec<TemplateOutcome<'a>>,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config: VerifyToolConfig = load_config(Path::new(&config_path))?;
    if config.templates.is_empty() {
        return Err(format!("No templates listed in {config_path}"));
    }

    let scene = load_image(&config.scene)?;
    let templates = config
        .templates
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<_>, String>>()?;

    let verifier = CandidateVerifier::new(config.params.clone());
    let reports = verifier.verify_batch(&templates, &scene);

    for (path, report) in config.templates.iter().zip(&reports) {
        print_line(path, report);
    }

    let located = reports.iter().filter(|r| r.localization.is_located()).count();
    println!("{located}/{} templates located", reports.len());

    if let Some(path) = &config.output_json {
        let summary = VerifySummary {
            scene: &config.scene,
            located,
            results: config
                .templates
                .iter()
                .zip(&reports)
                .map(|(template, report)| TemplateOutcome {
                    template: template.as_path(),
                    report,
                })
                .collect(),
        };
        write_json_file(path, &summary)?;
        println!("JSON summary written to {}", path.display());
    }
    Ok(())
}

fn print_line(path: &Path, report: &VerificationReport) {
    match &report.localization {
        Localization::Located {
            source_corners,
            inliers,
            ..
        } => println!(
            "{}: located inliers={} good={}/{} corners={:?}",
            path.display(),
            inliers,
            report.good_matches,
            report.matches,
            source_corners
        ),
        Localization::NotLocated { reason } => println!(
            "{}: not located ({:?}) good={}/{}",
            path.display(),
            reason,
            report.good_matches,
            report.matches
        ),
    }
}
