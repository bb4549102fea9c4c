use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use std::time::Duration;
use susi_dashboard::analyzer::{table_rows, DashboardView};
use susi_dashboard::dashboard::{Dashboard, LoadState, ReportScope};
use susi_dashboard::export::{write_chart_csv, write_records_csv};
use susi_dashboard::models::{Config, RegionFilter};
use susi_dashboard::report::{generate_report, GeminiClient};
use susi_dashboard::scraper::SheetScraper;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "susi_dashboard=warn".into()),
        )
        .init();

    let matches = Command::new("susi-dashboard")
        .version("1.0")
        .about("Summarizes early-admission (수시) results from the shared spreadsheet")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("search")
                .short('s')
                .long("search")
                .value_name("TEXT")
                .help("Search university, major or student name")
                .default_value(""),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .value_name("REGION")
                .help("Region to show (전체 for all)")
                .default_value("전체"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Read a saved sheet response instead of fetching it"),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .help("Export the filtered records and chart series as CSV")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .help("Request an AI summary of the whole dataset")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("report-filtered")
                .long("report-filtered")
                .help("Base the AI summary on the filtered view instead of the whole dataset")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .context("missing config path")?;

    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration: {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut dashboard = Dashboard::new(timeout);
    let scraper = SheetScraper::new(timeout);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let load_result = match matches.get_one::<String>("input") {
        Some(input) => {
            println!("📄 Reading saved response: {}", input);
            dashboard
                .refresh(async { scraper.scrape_file(input) }, &cancel)
                .await
        }
        None => {
            let url = config.sheet_url();
            println!("🌐 Fetching sheet '{}'", config.sheet_name);
            debug!(%url, "sheet url");
            dashboard
                .refresh(scraper.scrape_url(&url, &config.sheet_query()), &cancel)
                .await
        }
    };

    if let LoadState::Failed(message) = dashboard.load_state() {
        println!("❌ Failed to load admission data: {}", message);
        if load_result
            .as_ref()
            .err()
            .is_some_and(|err| err.is_ingestion_failure())
        {
            println!("   Check the spreadsheet id, sheet name and network, then run again.");
        }
    }
    let count = load_result.context("Ingestion failed")?;
    println!("   ✅ Loaded {} admission records", count);

    let search = matches.get_one::<String>("search").cloned().unwrap_or_default();
    let region_label = matches
        .get_one::<String>("region")
        .map(String::as_str)
        .unwrap_or("전체");

    if !dashboard.region_options().iter().any(|r| r == region_label) {
        println!(
            "⚠️  Unknown region '{}'. Available: {}",
            region_label,
            dashboard.region_options().join(", ")
        );
    }
    dashboard.set_search(search);
    dashboard.set_region(RegionFilter::from_label(region_label));

    let view = dashboard.view();
    print_summary(&dashboard, &view, config.table_limit);

    if matches.get_flag("csv") {
        let output_dir = config.output_directory.as_deref().unwrap_or("output");
        fs::create_dir_all(output_dir)?;
        let records_path = write_records_csv(&view.filtered, output_dir)?;
        let chart_path = write_chart_csv(&view.chart, output_dir)?;
        println!("\n📂 Wrote {}", records_path.display());
        println!("📂 Wrote {}", chart_path.display());
    }

    if matches.get_flag("report") || matches.get_flag("report-filtered") {
        let scope = ReportScope::from_filtered_flag(matches.get_flag("report-filtered"));
        let records = dashboard.report_records(scope);

        match config.resolve_api_key() {
            Some(api_key) if !records.is_empty() => {
                println!("\n✨ Generating AI report ({} records)...", records.len());
                let client = GeminiClient::new(api_key, config.gemini_model.clone(), timeout);
                let text = generate_report(&client, &records, config.report_sample_size).await;
                println!("\n{}", text);
            }
            Some(_) => println!("\n⚠️  No records to analyze, skipping AI report"),
            None => println!("\n⚠️  No Gemini API key configured (gemini_api_key or GEMINI_API_KEY)"),
        }
    }

    Ok(())
}

fn print_summary(dashboard: &Dashboard, view: &DashboardView, table_limit: usize) {
    let filter = dashboard.filter();
    let stats = &view.stats;

    println!("\n📊 SUMMARY");
    println!("==========");
    if !filter.search.is_empty() {
        println!("🔎 Search: {}", filter.search);
    }
    println!("🗺️  Region: {}", filter.region.label());
    println!();
    println!("   검색 결과 지원 건수: {}건", stats.total_count);
    println!(
        "   합격 건수: {}건 (합격: {} / 충원합: {})",
        stats.pass_total(),
        stats.pass_initial,
        stats.pass_waiting
    );
    println!("   불합격 건수: {}건", stats.fail_count);
    println!("   검색 조건 합격률: {}%", stats.pass_rate);

    println!("\n📈 By admission track:");
    for bucket in &view.chart {
        println!(
            "   {} - 합격 {} / 충원합격 {} / 불합 {}",
            bucket.category.label(),
            bucket.pass,
            bucket.waitlist_pass,
            bucket.fail
        );
    }

    let rows = table_rows(&view.filtered, table_limit);
    println!("\n📋 Records (showing {} of {}):", rows.len(), view.filtered.len());
    if rows.is_empty() {
        println!("   검색 결과가 없습니다.");
    }
    for record in rows {
        println!(
            "   {} ({}) | {} {} | {} | 내신 {:.2} | {}",
            record.student_name,
            record.student_info,
            record.university,
            record.major,
            record.admission_type,
            record.gpa,
            record.status
        );
    }
}
