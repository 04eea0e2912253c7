use statementq::prelude::*;

#[tokio::main]
async fn main() -> StatementResult<()> {
    let config = StatementConfig::development();
    statementq::telemetry::init(&config.logging)?;

    let service = StatementService::new(config, JsonStatementGenerator::new())?;
    service.start().await?;

    let hamlet = Play::new("Hamlet", Genre::Tragedy);
    let as_you_like_it = Play::new("As You Like It", Genre::Comedy);
    let othello = Play::new("Othello", Genre::Tragedy);

    let invoice = Invoice::new("BigCo")
        .with_performance(&hamlet, 55)
        .with_performance(&as_you_like_it, 35)
        .with_performance(&othello, 40)
        .with_totals(173_000, 47);
    service.enqueue(InvoiceRequest::new(
        invoice,
        vec![hamlet.clone(), as_you_like_it, othello],
    ))?;

    // Missing its plays: logged and skipped
    let broken = Invoice::new("Broken Ltd").with_performance(&hamlet, 10);
    service.enqueue(InvoiceRequest::new(broken, Vec::new()))?;

    println!("Statements queued, press Ctrl+C to stop...");
    service.wait_for_shutdown().await?;

    let stats = service.processor_stats().await;
    println!(
        "{} statements written, {} failed",
        stats.completed, stats.failed
    );
    Ok(())
}
