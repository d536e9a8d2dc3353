//! Mushroom Lab CLI Module
//!
//! Command-line interface for the rule-based checker and the dataset
//! evaluation pipeline.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::edibility::{self, decision_list, rules::DEFAULT_VERDICT, DecidedBy, Verdict};
use crate::evaluation::{Diagnostic, DiagnosticChart};
use crate::pipeline::{DatasetTrainingPipeline, EvaluationRequest, PipelineConfig};
use crate::training::{Gamma, KernelType, ModelFamily, ModelParams};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(235, 110, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn verdict_str(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Edible => ok(verdict.as_str()),
        Verdict::Poisonous => bad(verdict.as_str()),
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mushroom-lab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rule-based mushroom edibility checks and a classifier comparison lab")]
#[command(long_about = None)]
pub struct Cli {
    /// Seed for the train/test split and randomized models
    #[arg(long, global = true, env = "MUSHROOM_LAB_SEED")]
    pub seed: Option<u64>,

    /// Smallest table accepted for evaluation
    #[arg(long, global = true, env = "MUSHROOM_LAB_MIN_ROWS")]
    pub min_rows: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Pipeline settings: environment defaults overridden by flags
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(seed) = self.seed {
            config = config.with_random_seed(seed);
        }
        if let Some(min_rows) = self.min_rows {
            config = config.with_min_rows(min_rows);
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check one mushroom against the decision list
    Classify {
        /// Odor (code or label, e.g. "n" or "none")
        #[arg(long)]
        odor: String,

        /// Bruises (t/f, yes/no)
        #[arg(long)]
        bruises: String,

        /// Gill color
        #[arg(long)]
        gill_color: String,

        /// Cap shape
        #[arg(long)]
        cap_shape: String,

        /// Cap surface
        #[arg(long)]
        cap_surface: String,

        /// Cap color
        #[arg(long)]
        cap_color: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the decision rules in evaluation order
    Rules,

    /// Fit one classifier family on a dataset and score it
    Evaluate {
        /// Input data file (CSV, or TSV by extension)
        #[arg(short, long)]
        data: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Diagnostics to draw (confusion_matrix, roc_curve,
        /// precision_recall_curve, recall_threshold, f1_threshold)
        #[arg(long, value_delimiter = ',')]
        diagnostics: Vec<String>,

        /// Write the annotated table here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fit every family with default parameters and rank them
    Compare {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

/// Model family and hyperparameter overrides
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Model family (lr, rf, svm, dt, knn, gnb)
    #[arg(short, long, default_value = "lr")]
    pub model: String,

    /// Inverse regularization strength (lr, svm)
    #[arg(long)]
    pub c: Option<f64>,

    /// Maximum iterations (lr)
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Number of trees (rf)
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Maximum tree depth (rf, dt)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Disable bootstrap sampling (rf)
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Kernel (svm): rbf or linear
    #[arg(long)]
    pub kernel: Option<String>,

    /// Kernel coefficient (svm): scale or auto
    #[arg(long)]
    pub gamma: Option<String>,

    /// Skip probability estimates (svm)
    #[arg(long)]
    pub no_probability: bool,

    /// Neighbors (knn)
    #[arg(long)]
    pub n_neighbors: Option<usize>,
}

impl ModelArgs {
    /// Family defaults with any flags applied
    pub fn to_params(&self) -> anyhow::Result<ModelParams> {
        let family: ModelFamily = self.model.parse()?;
        let mut params = ModelParams::default_for(family);

        match &mut params {
            ModelParams::LogisticRegression { c, max_iter } => {
                if let Some(v) = self.c { *c = v; }
                if let Some(v) = self.max_iter { *max_iter = v; }
            }
            ModelParams::RandomForest { n_estimators, max_depth, bootstrap } => {
                if let Some(v) = self.n_estimators { *n_estimators = v; }
                if let Some(v) = self.max_depth { *max_depth = v; }
                *bootstrap = !self.no_bootstrap;
            }
            ModelParams::Svm { c, kernel, gamma, probability } => {
                if let Some(v) = self.c { *c = v; }
                if let Some(k) = &self.kernel { *kernel = parse_kernel(k)?; }
                if let Some(g) = &self.gamma { *gamma = parse_gamma(g)?; }
                *probability = !self.no_probability;
            }
            ModelParams::DecisionTree { max_depth } => {
                if let Some(v) = self.max_depth { *max_depth = v; }
            }
            ModelParams::Knn { n_neighbors } => {
                if let Some(v) = self.n_neighbors { *n_neighbors = v; }
            }
            ModelParams::GaussianNaiveBayes => {}
        }

        params.validate()?;
        Ok(params)
    }
}

fn parse_kernel(s: &str) -> anyhow::Result<KernelType> {
    match s.to_ascii_lowercase().as_str() {
        "rbf" => Ok(KernelType::Rbf),
        "linear" => Ok(KernelType::Linear),
        other => anyhow::bail!("Invalid kernel '{}' (expected rbf or linear)", other),
    }
}

fn parse_gamma(s: &str) -> anyhow::Result<Gamma> {
    match s.to_ascii_lowercase().as_str() {
        "scale" => Ok(Gamma::Scale),
        "auto" => Ok(Gamma::Auto),
        other => anyhow::bail!("Invalid gamma '{}' (expected scale or auto)", other),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_classify(
    odor: &str,
    bruises: &str,
    gill_color: &str,
    cap_shape: &str,
    cap_surface: &str,
    cap_color: &str,
    json: bool,
) -> anyhow::Result<()> {
    let result =
        edibility::classify_codes(odor, bruises, gill_color, cap_shape, cap_surface, cap_color)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    section("Classify");
    println!("  {:<12} {}", muted("Verdict"), verdict_str(result.verdict).bold());
    let reason = match result.decided_by {
        DecidedBy::Rule(id) => decision_list()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.description.to_string())
            .unwrap_or_else(|| format!("{:?}", id)),
        DecidedBy::FallbackDefault => "no rule matched; fail-safe default".to_string(),
    };
    println!("  {:<12} {}", muted("Reason"), reason.white());
    println!();
    Ok(())
}

pub fn cmd_rules() -> anyhow::Result<()> {
    section("Decision list");

    for (i, rule) in decision_list().iter().enumerate() {
        println!(
            "  {:>2}. {:<10} {}",
            i + 1,
            verdict_str(rule.verdict),
            rule.description.white()
        );
    }
    println!(
        "  {:>2}. {:<10} {}",
        decision_list().len() + 1,
        verdict_str(DEFAULT_VERDICT),
        muted("otherwise")
    );
    println!();
    Ok(())
}

fn load_table(data_path: &Path) -> anyhow::Result<polars::prelude::DataFrame> {
    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));
    Ok(df)
}

pub fn cmd_evaluate(
    config: PipelineConfig,
    data_path: &Path,
    model: &ModelArgs,
    diagnostics: &[String],
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let params = model.to_params()?;
    let diagnostics = diagnostics
        .iter()
        .map(|d| d.parse::<Diagnostic>())
        .collect::<Result<Vec<_>, _>>()?;
    let request = EvaluationRequest::new(params).with_diagnostics(diagnostics);
    let pipeline = DatasetTrainingPipeline::new(config);

    if json {
        let df = DataLoader::new().load_csv(data_path)?;
        let report = pipeline.run(&df, &request)?;
        if let Some(path) = output {
            DataSaver::save_csv(&mut report.annotated.clone(), path)?;
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Evaluate");
    let df = load_table(data_path)?;

    step_run(&format!("Training {}", request.family().to_string().cyan()));
    let report = pipeline.run(&df, &request)?;
    step_done(&format!("{:.3}s", report.training_time_secs));

    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning.to_string().yellow());
    }

    println!();
    println!("  {:<16} {}", muted("Target"), report.target.white());
    println!("  {:<16} {} / {}", muted("Train / test"), report.train_size, report.test_size);
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.2}", report.metrics.accuracy).white().bold());
    println!("  {:<16} {}", muted("Precision"), format!("{:.2}", report.metrics.precision).white());
    println!("  {:<16} {}", muted("Recall"), format!("{:.2}", report.metrics.recall).white());
    println!("  {:<16} {}", muted("F1"), format!("{:.2}", report.metrics.f1_score).white());
    println!();
    println!("  {:<16} {}", muted("Edible"), ok(&report.counts.edible.to_string()));
    println!("  {:<16} {}", muted("Poisonous"), bad(&report.counts.poisonous.to_string()));

    if !report.diagnostics.is_empty() || !report.notices.is_empty() {
        section("Diagnostics");
        for chart in &report.diagnostics {
            println!("  {:<24} {}", chart.diagnostic().to_string().white(), muted(&chart_summary(chart)));
        }
        for notice in &report.notices {
            println!("  {:<24} {}", notice.diagnostic.to_string().yellow(), muted(&notice.reason));
        }
    }

    if let Some(path) = output {
        step_run(&format!("Saving → {}", path.display()));
        DataSaver::save_csv(&mut report.annotated.clone(), path)?;
        step_done(&format!("{} rows", report.annotated.height()));
    }

    println!();
    Ok(())
}

fn chart_summary(chart: &DiagnosticChart) -> String {
    match chart {
        DiagnosticChart::ConfusionMatrix(cm) => {
            let rows: Vec<String> = cm
                .labels
                .iter()
                .zip(&cm.matrix)
                .map(|(label, row)| format!("{}: {:?}", label, row))
                .collect();
            rows.join("  ")
        }
        DiagnosticChart::RocCurve(roc) => format!("AUC {:.3} over {} points", roc.auc, roc.fpr.len()),
        DiagnosticChart::PrecisionRecallCurve(pr) => format!("{} thresholds", pr.thresholds.len()),
        DiagnosticChart::RecallThreshold(c) | DiagnosticChart::F1Threshold(c) => {
            let best = c.values.iter().cloned().fold(0.0_f64, f64::max);
            format!("max {} {:.3} over {} thresholds", c.metric, best, c.thresholds.len())
        }
    }
}

pub fn cmd_compare(config: PipelineConfig, data_path: &Path, json: bool) -> anyhow::Result<()> {
    let pipeline = DatasetTrainingPipeline::new(config);

    if json {
        let df = DataLoader::new().load_csv(data_path)?;
        let results = pipeline.compare(&df)?;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    section("Compare");
    let df = load_table(data_path)?;

    step_run("Fitting every family");
    let start = Instant::now();
    let results = pipeline.compare(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
        muted("Model"), muted("Acc"), muted("Prec"), muted("Recall"), muted("F1"), muted("Time")
    );
    println!("  {}", dim(&"─".repeat(70)));

    for result in &results {
        match (&result.metrics, &result.error) {
            (Some(m), _) => println!(
                "  {:<24} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>7.2}s",
                result.family.display_name(),
                m.accuracy,
                m.precision,
                m.recall,
                m.f1_score,
                result.training_time_secs
            ),
            (None, Some(e)) => println!(
                "  {:<24} {}",
                result.family.display_name(),
                format!("err: {}", e).red()
            ),
            (None, None) => {}
        }
    }
    println!("  {}", dim(&"─".repeat(70)));

    if let Some(best) = results.first().filter(|r| r.metrics.is_some()) {
        println!();
        println!("  {} {}", ok("best"), best.family.display_name().white().bold());
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(config: PipelineConfig, host: &str, port: u16) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Mushroom Lab".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Seed   ", &config.random_seed.to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let server_config = ServerConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };

    run_server(server_config, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(model: &str) -> ModelArgs {
        ModelArgs {
            model: model.to_string(),
            c: None,
            max_iter: None,
            n_estimators: None,
            max_depth: None,
            no_bootstrap: false,
            kernel: None,
            gamma: None,
            no_probability: false,
            n_neighbors: None,
        }
    }

    #[test]
    fn test_model_args_override_defaults() {
        let mut a = args("svm");
        a.kernel = Some("linear".to_string());
        a.no_probability = true;
        assert_eq!(
            a.to_params().unwrap(),
            ModelParams::Svm {
                c: 1.0,
                kernel: KernelType::Linear,
                gamma: Gamma::Scale,
                probability: false,
            }
        );
    }

    #[test]
    fn test_model_args_reject_out_of_range() {
        let mut a = args("knn");
        a.n_neighbors = Some(50);
        assert!(a.to_params().is_err());
        assert!(args("boosting").to_params().is_err());
    }

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::try_parse_from([
            "mushroom-lab",
            "evaluate",
            "--data",
            "mushrooms.csv",
            "--model",
            "rf",
            "--n-estimators",
            "200",
            "--diagnostics",
            "roc_curve,confusion_matrix",
        ])
        .unwrap();

        match cli.command {
            Commands::Evaluate { model, diagnostics, .. } => {
                assert_eq!(
                    model.to_params().unwrap(),
                    ModelParams::RandomForest { n_estimators: 200, max_depth: 10, bootstrap: true }
                );
                assert_eq!(diagnostics, vec!["roc_curve", "confusion_matrix"]);
            }
            _ => panic!("expected evaluate"),
        }
    }
}
