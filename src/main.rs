use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use finlit::api::{
    ApyParams, FdVsPpfParams, FundText, LoanParams, NpsParams, OverlapPayload, PpfParams,
    RetirementParams, SsyParams, TaxParams, render_cli, run_http_server,
};
use finlit::config::ServerConfig;

/// Indian personal-finance calculators, as an HTTP API or one-shot commands.
#[derive(Parser)]
#[command(name = "finlit", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the yearly or monthly ledger as CSV instead of JSON
    #[arg(long, global = true)]
    csv: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve(ServerConfig),
    /// Public Provident Fund maturity
    Ppf(PpfParams),
    /// Sukanya Samriddhi Yojana maturity
    Ssy(SsyParams),
    /// National Pension System corpus and pension
    Nps(NpsParams),
    /// Post-tax fixed deposit against PPF
    FdVsPpf(FdVsPpfParams),
    /// Atal Pension Yojana contribution
    Apy(ApyParams),
    /// Loan EMI and amortization, with an optional prepayment
    Loan(LoanParams),
    /// Old against new income tax regime
    Tax(TaxParams),
    /// Retirement corpus and required SIP
    Retirement(RetirementParams),
    /// Holdings overlap between two to five fund files (symbol,name,weight[,sector])
    Overlap {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
}

fn read_funds(files: Vec<PathBuf>) -> anyhow::Result<OverlapPayload> {
    let funds = files
        .into_iter()
        .map(|path| {
            let holdings = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FundText { name, holdings })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(OverlapPayload { funds })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Serve(config) => {
            run_http_server(config).await.context("server error")?;
            return Ok(());
        }
        Command::Ppf(params) => render_cli(params, cli.csv)?,
        Command::Ssy(params) => render_cli(params, cli.csv)?,
        Command::Nps(params) => render_cli(params, cli.csv)?,
        Command::FdVsPpf(params) => render_cli(params, cli.csv)?,
        Command::Apy(params) => render_cli(params, cli.csv)?,
        Command::Loan(params) => render_cli(params, cli.csv)?,
        Command::Tax(params) => render_cli(params, cli.csv)?,
        Command::Retirement(params) => render_cli(params, cli.csv)?,
        Command::Overlap { files } => render_cli(read_funds(files)?, cli.csv)?,
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
