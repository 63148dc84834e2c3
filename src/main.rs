// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ledger_reconcile::{
    export, load_bank_csv, load_ledger_csv, ReconConfig, ReconciliationEngine,
    ReconciliationOutcome, SynonymPolicy,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "ledger-reconcile", version, about = "Match bank statement lines against general-ledger entries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile and write matches, unmatched listings and a report
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// Output directory
        #[arg(long, default_value = "reconciliation_output")]
        out: PathBuf,
    },

    /// Reconcile and browse the results in the terminal
    View {
        #[command(flatten)]
        inputs: Inputs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Extend,
    Override,
}

impl From<PolicyArg> for SynonymPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Extend => SynonymPolicy::Extend,
            PolicyArg::Override => SynonymPolicy::Override,
        }
    }
}

#[derive(Debug, Args)]
struct Inputs {
    /// Bank statement CSV (Date,Category,Vendor,Description,Amount)
    #[arg(long)]
    bank: PathBuf,

    /// General ledger CSV (Date,Transaction ID,Type,Account,Name,Memo,Split,Debit,Credit,Amount)
    #[arg(long)]
    ledger: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON vendor synonym groups
    #[arg(long)]
    synonyms: Option<PathBuf>,

    /// How external synonyms combine with the built-in table
    #[arg(long, value_enum)]
    synonym_policy: Option<PolicyArg>,

    /// Keep only records from this calendar year
    #[arg(long)]
    year: Option<i32>,

    /// Keep only ledger rows whose account contains this text
    #[arg(long)]
    account: Option<String>,
}

impl Inputs {
    /// Config file (if any) with command-line overrides applied
    fn config(&self) -> Result<ReconConfig> {
        let mut config = match &self.config {
            Some(path) => ReconConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => ReconConfig::default(),
        };

        if let Some(path) = &self.synonyms {
            config.synonyms.file = Some(path.clone());
        }
        if let Some(policy) = self.synonym_policy {
            config.synonyms.policy = policy.into();
        }
        if let Some(year) = self.year {
            config.ingest.year = Some(year);
        }
        if let Some(account) = &self.account {
            config.ingest.ledger_account = Some(account.clone());
        }

        Ok(config)
    }

    fn reconcile(&self) -> Result<ReconciliationOutcome> {
        let config = self.config()?;

        let synonyms = config
            .synonyms
            .build_table()
            .context("Failed to load vendor synonyms")?;
        info!(rules = synonyms.len(), policy = ?config.synonyms.policy, "Synonym table ready");

        let bank = load_bank_csv(&self.bank, &config.ingest)
            .with_context(|| format!("Failed to load bank CSV: {}", self.bank.display()))?;
        let ledger = load_ledger_csv(&self.ledger, &config.ingest)
            .with_context(|| format!("Failed to load ledger CSV: {}", self.ledger.display()))?;

        let engine = ReconciliationEngine::with_synonyms(config.engine, synonyms);
        Ok(engine.reconcile(bank, ledger))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Run { inputs, out } => run(&inputs, out),
        Command::View { inputs } => run_ui_mode(&inputs),
    }
}

fn run(inputs: &Inputs, out: PathBuf) -> Result<()> {
    let outcome = inputs.reconcile()?;

    let paths = export::write_all(&outcome, &out)
        .with_context(|| format!("Failed to write results to {}", out.display()))?;

    println!("{}", outcome.summary());
    println!();
    println!("  Matches:          {}", paths.matches.display());
    println!("  Unmatched bank:   {}", paths.unmatched_bank.display());
    println!("  Unmatched ledger: {}", paths.unmatched_ledger.display());
    println!("  Report:           {}", paths.report.display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(inputs: &Inputs) -> Result<()> {
    let outcome = inputs.reconcile()?;
    println!("{}", outcome.summary());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(outcome);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_inputs: &Inputs) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with `--features tui` or use `run`")
}
