use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use lantern::classify::hf::HfInference;
use lantern::config::Config;
use lantern::db::{self, SqliteDatabase};
use lantern::eval::{self, EvalSample};
use lantern::export::ExportMirror;
use lantern::language::LanguageGate;
use lantern::pipeline::Analyzer;
use lantern::store::Store;

/// Lantern: content-risk analysis and audit trail for user posts.
///
/// Runs text through toxicity, fake-news, and hate-speech classifiers
/// (translating Russian input first), and keeps every analyzed post and
/// interaction in SQLite mirrored to CSV export files.
#[derive(Parser)]
#[command(name = "lantern", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and export directory
    Init,

    /// Analyze a piece of text
    Analyze {
        /// The text to classify
        text: String,

        /// Persist the result as a post (and rebuild the export mirror)
        #[arg(long)]
        save: bool,
    },

    /// List stored posts, newest first
    Posts {
        /// Max posts to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Record an interaction with a post
    Interact {
        /// The post id (not validated — dangling ids are accepted)
        post_id: String,

        /// Action name, e.g. like or report
        action: String,
    },

    /// Score toxicity predictions against a ground-truth sample file
    Evaluate {
        /// JSON file: [{"text": ..., "true_label": ...}, ...]
        #[arg(long)]
        file: String,

        /// Concurrent classifier calls (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Run the JSON API server
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lantern=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Lantern database...");
            let config = Config::load()?;
            let store = open_store(&config, true)?;
            store.refresh_exports().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Export mirror at: {}", config.export_dir);
            println!("\nLantern is ready. Try: cargo run -- analyze \"some text\"");
        }

        Commands::Analyze { text, save } => {
            let config = Config::load()?;
            config.require_inference()?;
            let analyzer = build_analyzer(&config)?;

            let result = analyzer.analyze(&text).await?;
            print_analysis(&result);

            if save {
                let store = open_store(&config, false)?;
                let post = store.save_post(&result.text, &result).await?;
                println!("\nSaved as post {}", post.id.bold());
            }
        }

        Commands::Posts { limit } => {
            let config = Config::load()?;
            let store = open_store(&config, false)?;
            let posts = store.list_posts().await?;

            if posts.is_empty() {
                println!("No posts stored yet.");
                return Ok(());
            }

            for post in posts.iter().take(limit) {
                let preview: String = post.text.chars().take(60).collect();
                println!(
                    "{}  {}  {}",
                    post.created_at.dimmed(),
                    post.id.dimmed(),
                    preview
                );
                println!(
                    "    fake: {} ({:.2})  hate: {} ({:.2})  toxicity: {}",
                    post.fake_label,
                    post.fake_score,
                    post.hate_label,
                    post.hate_score,
                    format_toxicity(&post.toxicity),
                );
            }
            println!("\n{} of {} posts shown", posts.len().min(limit), posts.len());
        }

        Commands::Interact { post_id, action } => {
            let config = Config::load()?;
            let store = open_store(&config, false)?;
            let interaction = store.record_interaction(&post_id, &action).await?;
            println!(
                "Recorded {} on post {} as {}",
                interaction.action.bold(),
                interaction.post_id,
                interaction.id
            );
        }

        Commands::Evaluate { file, concurrency } => {
            let config = Config::load()?;
            config.require_inference()?;
            let analyzer = build_analyzer(&config)?;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read sample file {file}"))?;
            let samples: Vec<EvalSample> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse samples in {file}"))?;

            println!("Evaluating {} samples...", samples.len());
            let report = eval::evaluate(&analyzer, &samples, concurrency, true).await?;
            print_report(&report);
        }

        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_inference()?;
            let analyzer = build_analyzer(&config)?;
            let store = open_store(&config, true)?;
            lantern::web::run_server(analyzer, store, port, &bind).await?;
        }
    }

    Ok(())
}

/// Wire the capability handles once at startup.
fn build_analyzer(config: &Config) -> Result<Arc<Analyzer>> {
    let inference = HfInference::new(
        &config.inference_api_url,
        config.inference_api_token.clone(),
        config.inference_timeout,
    )?;

    let gate = LanguageGate::new(
        Arc::new(inference.detector(&config.language_model)),
        Arc::new(inference.translator(&config.translation_model)),
        &config.source_lang,
        "en",
    );

    Ok(Arc::new(Analyzer::new(
        gate,
        Arc::new(inference.classifier(&config.toxicity_model)),
        Arc::new(inference.classifier(&config.fake_news_model)),
        Arc::new(inference.classifier(&config.hate_speech_model)),
    )))
}

/// Open (or create) the database and export mirror.
fn open_store(config: &Config, create: bool) -> Result<Arc<Store>> {
    let conn = if create {
        db::initialize(&config.db_path)?
    } else {
        db::open(&config.db_path)?
    };
    Ok(Arc::new(Store::new(
        Arc::new(SqliteDatabase::new(conn)),
        ExportMirror::new(config.export_dir.as_str())?,
    )))
}

fn print_analysis(result: &lantern::pipeline::PostAnalysis) {
    println!("{}", "Analysis".bold());
    println!("  text: {}", result.text);
    println!("  toxicity:");
    for (label, score) in &result.toxicity {
        println!("    {label}: {}", format_score(*score));
    }
    println!(
        "  fake-news: {} ({})",
        result.fake_news.label,
        format_score(result.fake_news.score)
    );
    println!(
        "  hate-speech: {} ({})",
        result.hate_speech.label,
        format_score(result.hate_speech.score)
    );
}

fn format_score(score: f64) -> String {
    let text = format!("{score:.3}");
    if score >= 0.5 {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

fn format_toxicity(toxicity: &std::collections::BTreeMap<String, f64>) -> String {
    // Show the strongest head only; the full map is in the DB and export
    toxicity
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(label, score)| format!("{label} ({score:.2})"))
        .unwrap_or_else(|| "-".to_string())
}

fn print_report(report: &eval::EvalReport) {
    println!("\n{}", "Evaluation report".bold());
    println!(
        "  {:<14} {:>9} {:>9} {:>9} {:>9}",
        "class", "precision", "recall", "f1", "support"
    );
    for (class, m) in &report.per_class {
        println!(
            "  {:<14} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            class, m.precision, m.recall, m.f1, m.support
        );
    }
    println!(
        "  {:<14} {:>9.3} {:>9.3} {:>9.3} {:>9}",
        "macro avg",
        report.macro_avg.precision,
        report.macro_avg.recall,
        report.macro_avg.f1,
        report.macro_avg.support
    );
    println!(
        "  {:<14} {:>9.3} {:>9.3} {:>9.3} {:>9}",
        "weighted avg",
        report.weighted_avg.precision,
        report.weighted_avg.recall,
        report.weighted_avg.f1,
        report.weighted_avg.support
    );
    println!("  accuracy: {:.3} over {} samples", report.accuracy, report.total);
}
