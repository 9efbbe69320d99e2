use crate::infra::{load_statement, TerminalNotices};
use clap::Args;
use statement_analyzer::config::{AnalysisBackend, AppConfig};
use statement_analyzer::error::AppError;
use statement_analyzer::telemetry;
use statement_analyzer::workflows::statement::{
    client_from_config, AnalysisClient, InfoForm, NotificationSink, ResultTab, ResultView,
    Transaction, UploadPolicy, WorkflowController,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Statement PDF to upload
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// First name used for the generated password
    #[arg(long, requires = "dob")]
    pub(crate) first_name: Option<String>,
    /// Date of birth (YYYY-MM-DD) used for the generated password
    #[arg(long, requires = "first_name")]
    pub(crate) dob: Option<String>,
    /// Result tab to print: summary or transactions
    #[arg(long, default_value = "summary", value_parser = parse_tab)]
    pub(crate) tab: ResultTab,
    /// Print only the generated password (for piping into a clipboard tool)
    #[arg(long)]
    pub(crate) copy_password: bool,
    /// Also write the transaction list to this CSV file
    #[arg(long)]
    pub(crate) transactions_csv: Option<PathBuf>,
    /// Submit to a running analysis backend instead of the simulated one
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
    /// Override the simulated analysis delay
    #[arg(long)]
    pub(crate) latency_ms: Option<u64>,
}

pub(crate) fn parse_tab(raw: &str) -> Result<ResultTab, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "summary" => Ok(ResultTab::Summary),
        "transactions" => Ok(ResultTab::Transactions),
        other => Err(format!("unknown result tab '{other}' (summary|transactions)")),
    }
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;

    let mut analysis = config.analysis.clone();
    if let Some(endpoint) = args.backend_url.clone() {
        analysis.backend = AnalysisBackend::Remote { endpoint };
    }
    if let Some(latency_ms) = args.latency_ms {
        analysis.simulated_latency = Duration::from_millis(latency_ms);
    }

    let controller = WorkflowController::with_upload_policy(
        client_from_config(&analysis)?,
        Arc::new(TerminalNotices),
        UploadPolicy::capped(analysis.max_upload_bytes),
    );

    let identity = match (&args.first_name, &args.dob) {
        (Some(first_name), Some(dob)) => Some(InfoForm::new(first_name.clone(), dob.clone())),
        _ => None,
    };

    let mut view = analyze_statement(&controller, &args.file, identity.as_ref()).await?;
    view.select_tab(args.tab);

    if let Some(path) = &args.transactions_csv {
        write_transactions_csv(view.transactions(), std::fs::File::create(path)?)
            .map_err(io::Error::from)?;
        info!(path = %path.display(), "transactions exported");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.copy_password {
        match view.copy_password(Instant::now()) {
            Some(password) => writeln!(out, "{password}")?,
            None => eprintln!("no password generated; pass --first-name and --dob"),
        }
        return Ok(());
    }

    render_result(&view, &mut out)?;
    Ok(())
}

/// Upload, optionally fill in identity info, and run the analysis.
pub(crate) async fn analyze_statement<C, N>(
    controller: &WorkflowController<C, N>,
    path: &Path,
    identity: Option<&InfoForm>,
) -> Result<ResultView, AppError>
where
    C: AnalysisClient + ?Sized,
    N: NotificationSink + ?Sized,
{
    controller.submit_file(load_statement(path)?)?;
    if let Some(form) = identity {
        controller.submit_info(form)?;
    }

    let result = controller.analyze().await?;
    Ok(ResultView::new(result))
}

pub(crate) fn render_result<W: Write>(view: &ResultView, out: &mut W) -> io::Result<()> {
    match view.tab() {
        ResultTab::Summary => {
            writeln!(out, "Account summary")?;
            for row in view.summary() {
                writeln!(out, "- {}: {}", row.label, row.value)?;
            }
        }
        ResultTab::Transactions => {
            writeln!(out, "Transactions ({})", view.transactions().len())?;
            for transaction in view.transactions() {
                writeln!(
                    out,
                    "- {} | {:<24} | {:>12} | {}",
                    transaction.date,
                    transaction.description,
                    transaction.amount,
                    transaction.kind.label()
                )?;
            }
        }
    }
    Ok(())
}

pub(crate) fn write_transactions_csv<W: Write>(
    transactions: &[Transaction],
    sink: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(["Date", "Description", "Amount", "Type"])?;
    for transaction in transactions {
        writer.write_record([
            transaction.date.as_str(),
            transaction.description.as_str(),
            transaction.amount.as_str(),
            transaction.kind.label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
