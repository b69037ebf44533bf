//! Print a kitchen ticket and an A4 invoice through the in-memory host
//!
//! ```text
//! RUST_LOG=crab_print=debug cargo run -p crab-print --example print_receipt
//! ```

use std::sync::Arc;

use crab_print::{
    CompletionMode, EffectiveLayout, Element, HeadlessHost, HeadlessOptions, PaperSizeHint,
    PrintConfig, PrintFormat, PrintRequest, PrintService, ProviderStack, StyleNode, init_logger,
    page_size,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("info", false)?;

    let config = PrintConfig::from_env();
    let host = Arc::new(
        HeadlessHost::with_options(HeadlessOptions {
            completion: CompletionMode::Immediate,
            ..Default::default()
        })
        .with_styles(vec![
            StyleNode::link("/assets/index.css"),
            StyleNode::inline(".ticket h1 { font-size: 18px; }"),
        ]),
    );

    let providers = ProviderStack::new()
        .with_context("theme", &[("data-theme", "light")])
        .with_context("tenant", &[("data-tenant", "rest-0042")])
        .with_context("session", &[("data-operator", "caja-1")])
        .with_context("feedback", &[]);
    let service = PrintService::new(Arc::clone(&host), Arc::clone(&host), config.layout_resolver())
        .with_providers(providers)
        .with_config(config);

    let ticket = PrintRequest::new(PrintFormat::Receipt, |layout: &EffectiveLayout| {
        let width = layout.receipt_width().map(|w| w.mm()).unwrap_or_default();
        Ok(Element::new("div")
            .attr("class", "ticket")
            .child(Element::new("h1").text("Mesa 12"))
            .child(Element::new("p").text("1x Paella"))
            .child(Element::new("small").text(format!("{width}mm")))
            .into())
    })
    .with_title("Mesa 12")
    .with_paper_size_hint(PaperSizeHint::Mm58);

    let invoice = PrintRequest::new(PrintFormat::Sheet, |_: &EffectiveLayout| {
        Ok(Element::new("table")
            .child(Element::new("tr").child(Element::new("td").text("Total: 42,00 €")))
            .into())
    })
    .with_title("Factura F-0001");

    let (ticket, invoice) = tokio::join!(service.submit_print(ticket), service.submit_print(invoice));
    for receipt in [ticket?, invoice?] {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    }

    for doc in host.printed() {
        println!(
            "{} ({}): page {}",
            doc.title,
            doc.surface,
            doc.print_css().and_then(page_size).unwrap_or("?")
        );
        println!("  {}", doc.body.as_deref().unwrap_or_default());
    }
    println!("surfaces left attached: {}", host.surface_count());

    Ok(())
}
