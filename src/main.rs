use plate_detector::config::{load_config, plate::PlateToolConfig};
use plate_detector::image::io::{load_image, save_gray, save_image, write_json_file};
use plate_detector::{DetectionReport, PlateDetector};
use std::env;
use std::path::{Path, PathBuf};

fn usage() -> String {
    "Usage: plate_detector <config.json>".to_string()
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
    let config: PlateToolConfig = load_config(Path::new(&config_path))?;

    let img = load_image(&config.input)?;
    let detector = PlateDetector::new(config.params.clone());
    let report = detector.process_with_diagnostics(&img);
    print_summary(&report);

    if let Ok(det) = &report.result {
        if let Some(path) = &config.output.plate_image {
            save_image(&det.plate, path)?;
            println!("Plate written to {}", path.display());
        }
        if let Some(dir) = &config.output.fragments_dir {
            for (idx, fragment) in det.fragments.iter().enumerate() {
                let path: PathBuf = dir.join(format!("{}.png", idx + 1));
                save_gray(&fragment.image, &path)?;
            }
            println!(
                "{} fragments written to {}",
                det.fragments.len(),
                dir.display()
            );
        }
    }

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }

    report.result.map(|_| ()).map_err(|e| e.to_string())
}

fn print_summary(report: &DetectionReport) {
    let summary = &report.summary;
    println!("Detection summary");
    println!("  found: {}", summary.found);
    if let Some(strategy) = summary.strategy {
        println!("  strategy: {strategy:?}");
    }
    if let Some(corners) = summary.corners {
        for (name, c) in ["tl", "tr", "br", "bl"].iter().zip(corners) {
            println!("  {name}: ({:.1}, {:.1})", c[0], c[1]);
        }
    }
    println!("  refined: {}", summary.refined);
    println!("  fragments: {}", summary.fragment_count);
    if let Some(err) = &summary.error {
        println!("  error: {err}");
    }

    let stages: Vec<String> = report
        .trace
        .timings
        .stages
        .iter()
        .map(|s| format!("{}={:.3}", s.label, s.elapsed_ms))
        .collect();
    println!(
        "Timings (ms): {} total={:.3}",
        stages.join(" "),
        report.trace.timings.total_ms
    );
}
