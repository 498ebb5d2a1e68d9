use clap::Parser;
use prospect_profile::utils::sanitize_filename;
use prospect_profile::{ProfileReport, Profiler, ProfilerConfig, Synthesis};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ProfilerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ProfilerConfig::default(),
    };
    config.apply_env();

    if let Some(max_subpages) = args.max_subpages {
        config.crawl.max_subpages = max_subpages;
    }
    if let Some(max_chars) = args.max_chars {
        config.crawl.max_total_chars = max_chars;
    }
    if args.no_browser {
        config.crawl.disabled = true;
    }

    if !config.crawl.disabled {
        println!("Note: Website crawling requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default {}",
            config.crawl.webdriver_url
        );
    }

    let mut profiler = match Profiler::from_config(&config) {
        Ok(profiler) => profiler,
        Err(e) => {
            ::log::error!("Failed to set up profile run: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(topic) = &args.topic {
        profiler = profiler.with_subreddit_topic(topic.as_str());
    }

    let start_time = std::time::Instant::now();
    let report = match profiler.run(&args.identifier).await {
        Ok(report) => report,
        Err(e) => {
            ::log::error!("Profile run failed: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    ::log::info!(
        "Profile run complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match &report.synthesis {
        Synthesis::Report { text } => println!("{}", text),
        Synthesis::Failed { message, details } => {
            eprintln!("Error: {}", message);
            eprintln!("Details: {}", details);
        }
    }

    if let Some(dir) = &args.output {
        match write_outputs(dir, &args.identifier, &report) {
            Ok((profile, dataset)) => {
                println!("Wrote {} and {}", profile.display(), dataset.display());
            }
            Err(e) => {
                ::log::error!("Failed to write output files to {}: {}", dir.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    match report.synthesis {
        Synthesis::Report { .. } => ExitCode::SUCCESS,
        Synthesis::Failed { .. } => ExitCode::FAILURE,
    }
}

/// Write `<stem>_profile.md` and `<stem>_dataset.json` into `dir`
fn write_outputs(
    dir: &Path,
    identifier: &str,
    report: &ProfileReport,
) -> std::io::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let stem = sanitize_filename(identifier.trim());

    let body = match &report.synthesis {
        Synthesis::Report { text } => text.clone(),
        Synthesis::Failed { message, details } => {
            format!("**Report generation failed:** {}\n\n{}", message, details)
        }
    };
    let profile_path = dir.join(format!("{}_profile.md", stem));
    std::fs::write(
        &profile_path,
        format!("# Prospect profile: {}\n\n{}\n", report.company_name, body),
    )?;

    let dataset_path = dir.join(format!("{}_dataset.json", stem));
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(&dataset_path, json)?;

    Ok((profile_path, dataset_path))
}
