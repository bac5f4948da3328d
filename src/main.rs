use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use yuba_e2e::driver::web::BrowserType;
use yuba_e2e::steps::StepRegistry;
use yuba_e2e::utils::config::Config;
use yuba_e2e::{generate_report, run_tests};

#[derive(Parser)]
#[command(name = "yuba-e2e")]
#[command(version = "0.1.0")]
#[command(about = "Browser end-to-end tests for the Yuba web app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run feature file(s) or a directory of them
    Run {
        /// Path to a feature file or directory
        #[arg(default_value = "features")]
        path: PathBuf,

        /// Only run scenarios with one of these tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Browser engine (chromium, firefox, webkit)
        #[arg(short, long)]
        browser: Option<BrowserType>,

        /// Site under test
        #[arg(long)]
        base_url: Option<String>,

        /// Directory for summary, category, JSON and JUnit reports
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        /// Directory for dashboard, detailed and timeline pages
        #[arg(long)]
        dashboards_dir: Option<PathBuf>,

        /// Pause after navigation and clicks, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,
    },

    /// Generate report from saved test results
    Report {
        /// Path to test-results.json
        results: PathBuf,

        /// Output format (html, json, junit, dashboard, detailed, timeline, sim, acm, arefresh, all)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path (directory for `all`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the step patterns feature files can use
    Steps,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            path,
            tags,
            headless,
            browser,
            base_url,
            reports_dir,
            dashboards_dir,
            settle_ms,
        } => {
            let mut config = Config::default();
            if headless {
                config.browser.headless = true;
            }
            if let Some(browser) = browser {
                config.browser.browser_type = browser;
            }
            if let Some(url) = base_url {
                config.base_url = url;
            }
            if let Some(dir) = reports_dir {
                config.reports_dir = dir;
            }
            if let Some(dir) = dashboards_dir {
                config.dashboards_dir = dir;
            }
            if let Some(ms) = settle_ms {
                config.settle_delay_ms = ms;
            }
            config.tags = tags;

            println!(
                "{} Running features from: {}",
                "▶".green().bold(),
                path.display()
            );
            println!("  Site: {}", config.base_url.cyan());
            println!(
                "  Browser: {}{}",
                config.browser.browser_type.as_str().cyan(),
                if config.browser.headless { " (headless)" } else { "" }
            );
            if let Some(ref tags_list) = config.tags {
                println!("  Tags: {}", tags_list.join(", ").yellow());
            }
            println!(
                "  Reports: {}",
                config.reports_dir.display().to_string().cyan()
            );

            let summary = run_tests(&path, config).await?;
            if !summary.success() {
                std::process::exit(1);
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            generate_report(&results, &format, output.as_deref()).await?;
        }

        Commands::Steps => {
            let registry = StepRegistry::builtin()?;
            println!("{} {} step patterns:", "ℹ".blue(), registry.len());
            for pattern in registry.patterns() {
                println!("  {}", pattern);
            }
        }
    }

    Ok(())
}
