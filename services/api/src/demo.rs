use crate::infra::InMemoryNoticeBoard;
use clap::Args;
use statement_analyzer::error::AppError;
use statement_analyzer::workflows::statement::{
    InfoForm, NoticeLevel, ResultView, SimulatedAnalysisClient, UploadedFile, WorkflowController,
    WorkflowSnapshot, PDF_MIME_TYPE,
};
use std::sync::Arc;
use std::time::Duration;

type DemoController = WorkflowController<SimulatedAnalysisClient, InMemoryNoticeBoard>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated analysis delay in milliseconds (defaults to 2000)
    #[arg(long)]
    pub(crate) latency_ms: Option<u64>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let latency = args
        .latency_ms
        .map(Duration::from_millis)
        .unwrap_or(SimulatedAnalysisClient::DEFAULT_LATENCY);
    let notices = Arc::new(InMemoryNoticeBoard::default());
    let controller = Arc::new(WorkflowController::new(
        Arc::new(SimulatedAnalysisClient::new(latency)),
        notices.clone(),
    ));

    println!("CASA statement analyzer demo");

    println!("\n1. Upload a statement PDF");
    if let Err(err) = controller.submit_file(demo_statement()) {
        println!("  Upload rejected: {}", err);
    }
    print_notices(&notices);
    render_snapshot(&controller.snapshot());

    println!("\n2. Fill in identity details");
    let mut form = InfoForm::default();
    form.set_first_name("Jane");
    println!("  Submit enabled after first name only: {}", form.submit_enabled());
    form.set_date_of_birth("1990-05-14");
    println!("  Submit enabled after date of birth: {}", form.submit_enabled());
    controller.submit_info(&form)?;
    let first = controller.snapshot();
    controller.submit_info(&form)?;
    println!(
        "  Second identical submit changed nothing: {}",
        first == controller.snapshot()
    );
    render_snapshot(&controller.snapshot());

    println!("\n3. Analyze the statement ({} ms simulated latency)", latency.as_millis());
    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.analyze().await }
    });
    tokio::time::sleep(Duration::from_millis(10).min(latency)).await;
    println!("  In flight while waiting: {}", controller.snapshot().in_flight);
    match task.await {
        Ok(Ok(result)) => {
            let view = ResultView::new(result);
            for row in view.summary() {
                println!("  - {}: {}", row.label, row.value);
            }
            println!("  - Transactions: {}", view.transactions().len());
        }
        Ok(Err(err)) => println!("  Analysis failed: {}", err),
        Err(err) => println!("  Analysis task aborted: {}", err),
    }
    print_notices(&notices);
    render_snapshot(&controller.snapshot());

    println!("\n4. Analyze without a statement");
    let empty: DemoController = WorkflowController::new(
        Arc::new(SimulatedAnalysisClient::new(latency)),
        notices.clone(),
    );
    if let Err(err) = empty.analyze().await {
        println!("  Refused: {}", err);
    }
    print_notices(&notices);
    render_snapshot(&empty.snapshot());

    println!("\n5. Start over");
    render_snapshot(&controller.reset());

    Ok(())
}

fn demo_statement() -> UploadedFile {
    UploadedFile::new(
        "statement.pdf",
        PDF_MIME_TYPE,
        b"%PDF-1.4\n% demo statement\n".to_vec(),
    )
}

fn print_notices(notices: &InMemoryNoticeBoard) {
    for notice in notices.drain() {
        let marker = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        println!("  [{}] {}", marker, notice.message);
    }
}

fn render_snapshot(snapshot: &WorkflowSnapshot) {
    println!(
        "  Active step: {} | in flight: {} | analyze enabled: {}",
        snapshot.active_step, snapshot.in_flight, snapshot.analyze_enabled
    );
    match &snapshot.selected_file {
        Some(file) => println!("  File: {} ({} bytes)", file.name, file.size_bytes),
        None => println!("  File: none"),
    }
    println!(
        "  Identity info: {}",
        if snapshot.identity_info.is_some() {
            "provided"
        } else {
            "none"
        }
    );
    println!(
        "  Result: {}",
        if snapshot.result.is_some() {
            "available"
        } else {
            "none"
        }
    );
    let steps: Vec<String> = snapshot
        .steps
        .iter()
        .map(|entry| {
            format!(
                "{} [{}]",
                entry.label,
                if entry.enabled { "open" } else { "locked" }
            )
        })
        .collect();
    println!("  Steps: {}", steps.join(" -> "));
}
