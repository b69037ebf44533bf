//! End-to-end print flows against the in-memory host

use std::sync::Arc;
use std::time::Duration;

use crab_print::{
    CompletionMode, DocumentTree, EffectiveLayout, Element, HeadlessHost, HeadlessOptions, HostEvent,
    LayoutError, PaperSizeHint, PrintConfig, PrintError, PrintFormat, PrintPhase, PrintRequest,
    PrintService, ProviderStack, ReceiptWidth, ReleaseTrigger, SheetSize, StaticLayoutResolver,
    StyleNode, page_size, page_width,
};

type Service = PrintService<HeadlessHost, HeadlessHost>;

fn service_with(host: &Arc<HeadlessHost>) -> Service {
    PrintService::new(
        Arc::clone(host),
        Arc::clone(host),
        StaticLayoutResolver::default(),
    )
}

fn ticket(_: &EffectiveLayout) -> anyhow::Result<DocumentTree> {
    Ok(Element::new("div")
        .attr("class", "ticket")
        .child(Element::new("h1").text("Mesa 4"))
        .child(Element::new("p").text("2x Café"))
        .into())
}

#[tokio::test]
async fn test_ticket_on_58mm_paper() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let request = PrintRequest::new(PrintFormat::Receipt, ticket)
        .with_title("Mesa 4")
        .with_paper_size_hint(PaperSizeHint::Mm58);
    let receipt = service.submit_print(request).await.unwrap();

    assert_eq!(
        receipt.layout,
        EffectiveLayout::Receipt {
            receipt_width: ReceiptWidth::Mm58
        }
    );

    let printed = host.printed();
    assert_eq!(printed.len(), 1);
    let css = printed[0].print_css().expect("print css injected");
    assert_eq!(page_width(css), Some("58mm"));
    assert!(css.contains(".watermark"));
    assert!(printed[0].focused);
    assert_eq!(printed[0].title, "Mesa 4");

    assert_eq!(host.surface_count(), 0);
}

#[tokio::test]
async fn test_format_aliases_parse_from_wire_strings() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let format: PrintFormat = "TICKET".parse().unwrap();
    let hint: PaperSizeHint = "mm58".parse().unwrap();
    let receipt = service
        .submit_print(PrintRequest::new(format, ticket).with_paper_size_hint(hint))
        .await
        .unwrap();

    assert_eq!(receipt.layout.receipt_width(), Some(ReceiptWidth::Mm58));
}

#[tokio::test]
async fn test_sheet_without_hint_prints_a4() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let receipt = service
        .submit_print(PrintRequest::new(PrintFormat::Sheet, ticket))
        .await
        .unwrap();

    assert_eq!(receipt.layout.sheet_size(), Some(SheetSize::A4));
    let printed = host.printed();
    let css = printed[0].print_css().unwrap();
    assert_eq!(page_size(css), Some("A4"));
    assert!(!css.contains(".watermark"));
}

#[tokio::test]
async fn test_resolver_failure_creates_no_surface() {
    let host = Arc::new(HeadlessHost::new());
    let service = PrintService::new(
        Arc::clone(&host),
        Arc::clone(&host),
        |_: PrintFormat, _: Option<PaperSizeHint>| -> Result<EffectiveLayout, LayoutError> {
            Err(LayoutError::Policy("printer profile unavailable".into()))
        },
    );

    let invoice: PrintFormat = "A4".parse().unwrap();
    let err = service
        .submit_print(PrintRequest::new(invoice, ticket))
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::ResolveLayout);
    assert!(matches!(err.source, PrintError::LayoutResolution(_)));
    assert_eq!(host.stats().attached, 0);
    assert!(host.printed().is_empty());
}

#[tokio::test]
async fn test_mismatched_hint_is_rejected() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let err = service
        .submit_print(
            PrintRequest::new(PrintFormat::Sheet, ticket).with_paper_size_hint(PaperSizeHint::Mm80),
        )
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::ResolveLayout);
    assert_eq!(host.stats().attached, 0);
}

#[tokio::test]
async fn test_missing_mount_target_destroys_surface() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        missing_mount_target: true,
        ..Default::default()
    }));
    let service = service_with(&host);

    let err = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::Mount);
    assert!(matches!(err.source, PrintError::MountTargetMissing));
    assert_eq!(err.code(), "PRINT_MOUNT_TARGET_MISSING");
    assert_eq!(host.surface_count(), 0);
    assert_eq!(host.stats().removed, 1);
    assert!(host.printed().is_empty());
}

#[tokio::test]
async fn test_unsupported_environment_fails_before_attach() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        unsupported: true,
        ..Default::default()
    }));
    let service = service_with(&host);

    let err = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::CreateSurface);
    assert_eq!(err.code(), "PRINT_SURFACE_INIT_FAILED");
    assert_eq!(host.surface_count(), 0);
}

#[tokio::test]
async fn test_blocked_print_trigger_releases_surface() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        fail_print: true,
        ..Default::default()
    }));
    let service = service_with(&host);

    let err = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::Trigger);
    assert_eq!(host.surface_count(), 0);
    assert_eq!(host.stats().unmounted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_releases_without_completion_signal() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        completion: CompletionMode::Never,
        ..Default::default()
    }));
    let service = service_with(&host)
        .with_config(PrintConfig::default().with_fallback_delay(Duration::from_millis(500)));

    let receipt = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();

    assert_eq!(receipt.released_by, ReleaseTrigger::Fallback);
    assert_eq!(host.surface_count(), 0);
    assert_eq!(host.stats().removed, 1);
}

#[tokio::test]
async fn test_late_completion_after_fallback_is_ignored() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        completion: CompletionMode::Manual,
        ..Default::default()
    }));
    let service = service_with(&host);

    let receipt = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();
    assert_eq!(receipt.released_by, ReleaseTrigger::Fallback);

    // The dialog closes after the fallback already removed the surface
    assert_eq!(host.fire_print_complete(), 0);
    assert_eq!(host.listener_count(), 0);

    let stats = host.stats();
    assert_eq!(stats.unmounted, 1);
    assert_eq!(stats.removed, 1);
}

#[tokio::test]
async fn test_completion_and_fallback_together_release_once() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        completion: CompletionMode::Immediate,
        ..Default::default()
    }));
    // Zero delay: the fallback is due as soon as the trigger returns
    let service = service_with(&host).with_config(PrintConfig::default());

    for _ in 0..5 {
        service
            .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
            .await
            .unwrap();
    }

    let stats = host.stats();
    assert_eq!(stats.unmounted, 5);
    assert_eq!(stats.removed, 5);
}

#[tokio::test]
async fn test_repeated_prints_do_not_retain_host() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);
    let baseline = Arc::strong_count(&host);

    for _ in 0..50 {
        service
            .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
            .await
            .unwrap();
    }

    assert_eq!(host.surface_count(), 0);
    assert_eq!(host.listener_count(), 0);
    assert_eq!(Arc::strong_count(&host), baseline);

    drop(service);
    assert_eq!(Arc::strong_count(&host), 1);
}

#[tokio::test]
async fn test_renderer_failure_destroys_surface() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        fail_render: true,
        ..Default::default()
    }));
    let service = service_with(&host);

    let err = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap_err();

    assert_eq!(err.phase, PrintPhase::Mount);
    assert!(matches!(err.source, PrintError::Render(_)));
    assert_eq!(err.code(), "PRINT_RENDER_FAILED");
    assert_eq!(host.surface_count(), 0);
    assert_eq!(host.stats().removed, 1);
    assert!(host.printed().is_empty());
}

#[tokio::test]
async fn test_completion_signal_releases_first() {
    let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
        completion: CompletionMode::Immediate,
        ..Default::default()
    }));
    let service = service_with(&host)
        .with_config(PrintConfig::default().with_fallback_delay(Duration::from_secs(60)));

    let receipt = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();

    assert_eq!(receipt.released_by, ReleaseTrigger::Completion);
    assert_eq!(host.stats().removed, 1);
}

#[tokio::test]
async fn test_print_css_comes_after_host_styles() {
    let host_styles = vec![
        StyleNode::link("/assets/app.css"),
        StyleNode::link("/assets/print.css").with_media("print"),
        StyleNode::inline(".ticket { font-size: 12px; }"),
    ];
    let host = Arc::new(HeadlessHost::new().with_styles(host_styles.clone()));
    let service = service_with(&host);

    service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();

    let printed = host.printed();
    let head = &printed[0].head;
    assert_eq!(head.len(), host_styles.len() + 1);
    assert_eq!(&head[..host_styles.len()], host_styles.as_slice());
    assert_eq!(printed[0].print_css_position(), Some(host_styles.len()));
}

#[tokio::test]
async fn test_providers_wrap_mounted_tree() {
    let host = Arc::new(HeadlessHost::new());
    let providers = ProviderStack::new()
        .with_context("theme", &[("data-theme", "light")])
        .with_context("i18n", &[("lang", "es")]);
    let service = service_with(&host).with_providers(providers);

    service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();

    let body = host.printed()[0].body.clone().unwrap();
    assert!(body.starts_with(r#"<div data-provider="theme" data-theme="light"><div data-provider="i18n" lang="es">"#));
    assert!(body.contains("Mesa 4"));
}

#[tokio::test]
async fn test_concurrent_prints_are_isolated() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let ok = service.submit_print(
        PrintRequest::new(PrintFormat::Receipt, ticket).with_paper_size_hint(PaperSizeHint::Mm58),
    );
    let failing = service.submit_print(PrintRequest::new(PrintFormat::Sheet, |_| {
        anyhow::bail!("order vanished")
    }));
    let (ok, failing) = tokio::join!(ok, failing);

    let receipt = ok.unwrap();
    let err = failing.unwrap_err();
    assert_eq!(err.phase, PrintPhase::Mount);
    assert!(matches!(err.source, PrintError::Render(ref msg) if msg.contains("order vanished")));

    let printed = host.printed();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].surface, receipt.surface);
    assert_eq!(page_width(printed[0].print_css().unwrap()), Some("58mm"));

    let stats = host.stats();
    assert_eq!(stats.attached, 2);
    assert_eq!(stats.removed, 2);
    assert_eq!(host.surface_count(), 0);
}

#[tokio::test]
async fn test_each_call_gets_a_fresh_surface() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let first = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();
    let second = service
        .submit_print(PrintRequest::new(PrintFormat::Receipt, ticket))
        .await
        .unwrap();

    assert_ne!(first.surface, second.surface);
    assert_ne!(first.job_id, second.job_id);

    // Mounted content was live when printed, and removal came after
    assert!(host.printed().iter().all(|doc| doc.body.is_some()));
    for id in [first.surface, second.surface] {
        let events: Vec<HostEvent> = host
            .events()
            .into_iter()
            .filter(|event| match event {
                HostEvent::Attached(s)
                | HostEvent::Mounted(s)
                | HostEvent::Printed(s)
                | HostEvent::Unmounted(s)
                | HostEvent::Removed(s) => *s == id,
            })
            .collect();
        assert_eq!(
            events,
            [
                HostEvent::Attached(id),
                HostEvent::Mounted(id),
                HostEvent::Printed(id),
                HostEvent::Unmounted(id),
                HostEvent::Removed(id),
            ]
        );
    }
    let stats = host.stats();
    assert_eq!(stats.attached, 2);
    assert_eq!(stats.removed, 2);
    assert_eq!(stats.mounted, 2);
    assert_eq!(stats.unmounted, 2);
}

#[tokio::test]
async fn test_receipt_serializes_for_the_ui() {
    let host = Arc::new(HeadlessHost::new());
    let service = service_with(&host);

    let receipt = service
        .submit_print(PrintRequest::new(PrintFormat::Sheet, ticket).with_paper_size_hint(PaperSizeHint::A5))
        .await
        .unwrap();

    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json["layout"]["output_kind"], "sheet");
    assert_eq!(json["released_by"], "fallback");
}
