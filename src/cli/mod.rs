//! Telemark CLI Module
//!
//! Command-line interface for serving the prediction form and for one-shot
//! predictions against a model artifact.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::predictor::{Predictor, UserSelections};
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "telemark")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Subscription prediction service for telemarketing campaign data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction form server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Trained model artifact (JSON)
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Reference dataset (CSV)
        #[arg(short, long, default_value = "train.csv")]
        data: PathBuf,
    },

    /// Predict once for a selections file and print the result
    Predict {
        /// Trained model artifact (JSON)
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Reference dataset (CSV)
        #[arg(short, long, default_value = "train.csv")]
        data: PathBuf,

        /// Customer selections (JSON, one object)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the form schema (field domains and numeric bounds)
    Schema {
        /// Trained model artifact (JSON)
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Reference dataset (CSV)
        #[arg(short, long, default_value = "train.csv")]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: &str, port: u16, model: &PathBuf, data: &PathBuf) -> anyhow::Result<()> {
    let config = ServerConfig {
        host: host.to_string(),
        port,
        model_path: model.display().to_string(),
        data_path: data.display().to_string(),
    };
    run_server(config).await
}

pub fn cmd_predict(model: &PathBuf, data: &PathBuf, input: &PathBuf) -> anyhow::Result<()> {
    let predictor = Predictor::load(model, data)?;
    step_ok(&kv("model", &model.display().to_string()));
    step_ok(&kv("data", &data.display().to_string()));

    let json = std::fs::read_to_string(input)?;
    let selections: UserSelections = serde_json::from_str(&json)?;

    let prediction = predictor.predict(&selections)?;
    println!();
    println!("  {}", prediction.message().white().bold());
    println!("  {}", muted(&format!("label = {} ({})", prediction.label(), prediction.code())));
    Ok(())
}

pub fn cmd_schema(model: &PathBuf, data: &PathBuf) -> anyhow::Result<()> {
    let predictor = Predictor::load(model, data)?;
    let schema = predictor.schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
