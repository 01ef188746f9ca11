//! HTML page invariant tests.
//!
//! These tests validate the generated page without a browser:
//! - Document skeleton and title
//! - CDN assets pinned with SRI integrity
//! - No inline event handlers
//! - Tabs, selectors and unavailable views follow the selection

use pv_common::{
    BmiComparison, BmiGroup, Catalog, CompartmentEntry, EffectTable, PlotKind, Selection,
    SelectionInput, SignatureCatalog, SignatureDefinition, SignatureEffectRecord,
    StablFeatureRecord, StablSelection,
};
use pv_report::config::{ReportConfig, ReportTheme};
use pv_report::generator::{ReportData, ReportGenerator};
use pv_report::views::{Panel, ViewSources};
use regex::Regex;

fn rec(cell: &str, sig: &str, group: BmiGroup, v: f64) -> SignatureEffectRecord {
    SignatureEffectRecord {
        cell_type: cell.into(),
        signature_name: sig.into(),
        bmi_group: group,
        effect_size: v,
        credible_interval_low: v - 0.15,
        credible_interval_high: v + 0.15,
        r_hat: 1.002,
        ess: 1200.0,
    }
}

/// Macrophage with Glycolysis and OXPHOS rising from Normal to Obese, plus a T cell row.
fn macrophage_effects() -> EffectTable {
    let mut records = Vec::new();
    for sig in ["Glycolysis", "OXPHOS"] {
        for (group, v) in [
            (BmiGroup::Normal, 0.1),
            (BmiGroup::Overweight, 0.3),
            (BmiGroup::Obese, 0.6),
        ] {
            records.push(rec("Macrophage", sig, group, v));
        }
    }
    records.push(rec("T cell", "Exhaustion", BmiGroup::Obese, -0.4));
    EffectTable::new("immune_fine/effects.csv", records).unwrap()
}

fn catalog(effects: &EffectTable) -> Catalog {
    Catalog::new(vec![
        CompartmentEntry::from_effects("immune_fine", "Immune Fine", Some(effects)),
        CompartmentEntry::from_effects("non_immune", "Non-Immune", None),
    ])
}

fn sources(effects: &EffectTable) -> ViewSources<'_> {
    ViewSources {
        effects: Ok(effects),
        proportions: Err("immune_fine/proportions.csv not found".into()),
        survival: Err("survival.csv not found".into()),
        energy: Err("immune_fine/energy.csv not found".into()),
        draws: Err("posterior_draws.csv not found".into()),
        signatures: Err("signatures.json not found".into()),
        stabl: None,
    }
}

fn build(config: ReportConfig, input: SelectionInput) -> (ReportGenerator, ReportData) {
    let effects = macrophage_effects();
    let catalog = catalog(&effects);
    let transition = Selection::initial(&catalog).apply(&catalog, input);
    let generator = ReportGenerator::new(config);
    let data = generator.build(
        &catalog,
        &transition.selection,
        &transition.corrections,
        &sources(&effects),
    );
    (generator, data)
}

fn default_html() -> String {
    let (generator, data) = build(ReportConfig::default(), SelectionInput::default());
    generator.generate(&data).expect("generate")
}

// ============================================================================
// HTML Structure Tests
// ============================================================================

#[test]
fn test_html_has_doctype_and_title() {
    let html = default_html();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<meta charset="UTF-8">"#));
    assert!(html.contains(r#"<meta name="viewport""#));
    assert!(html.contains("<title>PAAD Obesity Results: Immune Fine</title>"));
}

#[test]
fn test_custom_title_is_escaped() {
    let config = ReportConfig::default().with_title("Obesity & <PAAD>");
    let (generator, data) = build(config, SelectionInput::default());
    let html = generator.generate(&data).unwrap();
    assert!(html.contains("<title>Obesity &amp; &lt;PAAD&gt;</title>"));
}

#[test]
fn test_every_enabled_view_has_a_tab_and_section() {
    let html = default_html();
    for kind in PlotKind::ALL {
        assert!(
            html.contains(&format!(r#"data-tab="{}""#, kind.slug())),
            "missing tab for {}",
            kind
        );
        assert!(
            html.contains(&format!(r#"id="tab-{}""#, kind.slug())),
            "missing section for {}",
            kind
        );
    }
}

#[test]
fn test_disabled_view_has_no_tab() {
    let config = ReportConfig::default().with_panel(PlotKind::Proportions, false);
    let (generator, data) = build(config, SelectionInput::default());
    let html = generator.generate(&data).unwrap();
    assert!(!html.contains(r#"data-tab="proportions""#));
    assert!(!html.contains(r#"id="tab-proportions""#));
}

#[test]
fn test_dark_theme_class() {
    let config = ReportConfig::default().with_theme(ReportTheme::Dark);
    let (generator, data) = build(config, SelectionInput::default());
    let html = generator.generate(&data).unwrap();
    assert!(html.contains(r#"<html lang="en" class="dark">"#));
    assert!(html.contains(r#"const ECHARTS_THEME = "dark";"#));
}

// ============================================================================
// CDN Tests
// ============================================================================

#[test]
fn test_cdn_assets_are_pinned() {
    let html = default_html();
    let pinned = Regex::new(r"cdn\.jsdelivr\.net/npm/([a-z-]+)@(\d+\.\d+\.\d+)").unwrap();
    let libs: Vec<_> = pinned
        .captures_iter(&html)
        .map(|c| c[1].to_string())
        .collect();
    assert!(libs.contains(&"echarts".to_string()));
    assert!(libs.contains(&"tailwindcss".to_string()));
    assert!(!html.contains("@latest"));
}

#[test]
fn test_external_assets_have_sri() {
    let html = default_html();
    let tag = Regex::new(r#"<(script|link)[^>]+(src|href)="https://[^"]+"[^>]*>"#).unwrap();
    let integrity = Regex::new(r#"integrity="(sha\d+-[A-Za-z0-9+/=]+)""#).unwrap();
    let mut count = 0;
    for m in tag.find_iter(&html) {
        count += 1;
        assert!(integrity.is_match(m.as_str()), "missing SRI: {}", m.as_str());
        assert!(m.as_str().contains(r#"crossorigin="anonymous""#));
    }
    assert_eq!(count, 2);
}

#[test]
fn test_no_inline_event_handlers() {
    let html = default_html();
    let inline = Regex::new(r#"\son(click|change|load|submit|input)\s*="#).unwrap();
    assert!(!inline.is_match(&html));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_active_tab_follows_plot_kind() {
    let (generator, data) = build(
        ReportConfig::default(),
        SelectionInput::default().with_plot_kind("forest"),
    );
    let html = generator.generate(&data).unwrap();
    assert!(html.contains(r#"<a class="tab-btn active" data-tab="forest""#));
    assert!(html.contains(r#"<section id="tab-forest" class="tab-content active">"#));
    assert!(html.contains(r#"const ACTIVE_TAB = "forest";"#));
    let active = Regex::new(r#"class="tab-btn active""#).unwrap();
    assert_eq!(active.find_iter(&html).count(), 1);
}

#[test]
fn test_selectors_reflect_selection() {
    let (generator, data) = build(
        ReportConfig::default(),
        SelectionInput::default()
            .with_cell_type("macrophage")
            .with_signature("oxphos")
            .with_comparison("overweight_vs_normal"),
    );
    assert_eq!(data.selection.cell_type.as_deref(), Some("Macrophage"));
    assert_eq!(data.selection.comparison, BmiComparison::OverweightVsNormal);
    let html = generator.generate(&data).unwrap();
    assert!(html.contains(r#"<option value="Macrophage" selected>Macrophage</option>"#));
    assert!(html.contains(r#"<option value="OXPHOS" selected>OXPHOS</option>"#));
    assert!(html.contains(r#"<option value="overweight_vs_normal" selected>"#));
    // Compartments without results stay selectable.
    assert!(html.contains(r#"<option value="non_immune">Non-Immune</option>"#));
}

#[test]
fn test_tab_links_preserve_selection() {
    let (generator, data) = build(
        ReportConfig::default(),
        SelectionInput::default().with_cell_type("T cell"),
    );
    let html = generator.generate(&data).unwrap();
    assert!(html.contains(
        r#"href="?compartment=immune_fine&amp;cell_type=T+cell&amp;signature=Exhaustion&amp;comparison=obese_vs_normal&amp;plot=survival""#
    ));
}

#[test]
fn test_unknown_cell_type_is_corrected_with_notice() {
    let (generator, data) = build(
        ReportConfig::default(),
        SelectionInput::default().with_cell_type("Neutrophil"),
    );
    assert_eq!(data.corrections.len(), 1);
    let html = generator.generate(&data).unwrap();
    let notice = Regex::new(r#"<div class="notice" role="status">cell type &#x27;Neutrophil&#x27; is not available"#).unwrap();
    assert!(notice.is_match(&html));
}

#[test]
fn test_missing_artifact_only_affects_its_view() {
    let (generator, data) = build(ReportConfig::default(), SelectionInput::default());
    assert!(data.panel(PlotKind::Heatmap).unwrap().panel.is_ready());
    assert!(data.panel(PlotKind::Forest).unwrap().panel.is_ready());
    match &data.panel(PlotKind::Proportions).unwrap().panel {
        Panel::Unavailable { reason } => assert!(reason.contains("proportions.csv")),
        other => panic!("expected unavailable, got {:?}", other),
    }

    let html = generator.generate(&data).unwrap();
    let section = Regex::new(
        r#"<section id="tab-survival" class="tab-content"><div class="card unavailable">.*?<p>survival\.csv not found</p>"#,
    )
    .unwrap();
    assert!(section.is_match(&html));
    assert!(html.contains(r#"id="chart-heatmap""#));
}

#[test]
fn test_embedded_data_is_script_safe() {
    let effects = EffectTable::new(
        "effects.csv",
        vec![rec("Macrophage", "</script><script>alert(1)", BmiGroup::Obese, 0.2)],
    )
    .unwrap();
    let catalog = catalog(&effects);
    let selection = Selection::initial(&catalog);
    let generator = ReportGenerator::default_config();
    let data = generator.build(&catalog, &selection, &[], &sources(&effects));
    let html = generator.generate(&data).unwrap();
    // Only the CDN script and the page script close.
    assert_eq!(html.matches("</script>").count(), 2);
    assert!(html.contains("&lt;/script&gt;"));
}

#[test]
fn test_gene_counts_label_signatures() {
    let effects = macrophage_effects();
    let catalog = catalog(&effects);
    let selection = Selection::initial(&catalog)
        .apply(&catalog, SelectionInput::default().with_cell_type("Macrophage"))
        .selection;
    let signatures = SignatureCatalog::new(
        "signatures.json",
        vec![SignatureDefinition {
            cell_type: "Macrophage".into(),
            signature: "Glycolysis".into(),
            genes: vec!["HK2".into(), "PFKP".into(), "LDHA".into()],
        }],
    )
    .unwrap();
    let mut sources = sources(&effects);
    sources.signatures = Ok(&signatures);
    let generator = ReportGenerator::default_config();
    let data = generator.build(&catalog, &selection, &[], &sources);
    assert_eq!(data.gene_counts.get("Glycolysis"), Some(&3));
    let html = generator.generate(&data).unwrap();
    assert!(html.contains("Glycolysis (3 genes)"));
}

#[test]
fn test_signature_explorer_tables_follow_selection() {
    let effects = macrophage_effects();
    let catalog = catalog(&effects);
    let selection = Selection::initial(&catalog)
        .apply(
            &catalog,
            SelectionInput::default()
                .with_cell_type("Macrophage")
                .with_signature("OXPHOS")
                .with_plot_kind("signatures"),
        )
        .selection;
    let def = |sig: &str, genes: &[&str]| SignatureDefinition {
        cell_type: "Macrophage".into(),
        signature: sig.into(),
        genes: genes.iter().map(|g| g.to_string()).collect(),
    };
    let signatures = SignatureCatalog::new(
        "signatures.json",
        vec![
            def("Glycolysis", &["HK2", "PFKP", "LDHA", "PKM", "ENO1", "GAPDH"]),
            def("OXPHOS", &["NDUFA1", "<COX7C>"]),
        ],
    )
    .unwrap();
    let mut sources = sources(&effects);
    sources.signatures = Ok(&signatures);
    let generator = ReportGenerator::default_config();
    let data = generator.build(&catalog, &selection, &[], &sources);
    let html = generator.generate(&data).unwrap();

    let section = Regex::new(r#"<section id="tab-signatures" class="tab-content active">"#).unwrap();
    assert!(section.is_match(&html));
    assert!(html.contains(r#"id="table-signature-summary""#));
    assert!(html.contains("<td>HK2, PFKP, LDHA, PKM, ENO1, ...</td>"));
    let selected = Regex::new(r#"<tr class="selected"><td>OXPHOS</td><td>2</td>"#).unwrap();
    assert!(selected.is_match(&html));
    assert!(html.contains("<td>&lt;COX7C&gt;</td>"));
    assert!(html.contains(r#"id="chart-signature-gene-counts""#));
}

#[test]
fn test_signature_explorer_without_database_is_unavailable() {
    let html = default_html();
    let unavailable = Regex::new(
        r#"(?s)<section id="tab-signatures"[^>]*><div class="card unavailable">.*?signatures\.json not found"#,
    )
    .unwrap();
    assert!(unavailable.is_match(&html));
}

// ============================================================================
// Heatmap Scenario
// ============================================================================

#[test]
fn test_macrophage_heatmap_rows_and_intensity() {
    let (_, data) = build(
        ReportConfig::default(),
        SelectionInput::default().with_cell_type("Macrophage"),
    );
    let Panel::Ready { charts, .. } = &data.panel(PlotKind::Heatmap).unwrap().panel else {
        panic!("heatmap should be ready");
    };
    let chart = &charts[0];
    assert_eq!(chart.x_axis.categories, vec!["Normal", "Overweight", "Obese"]);
    assert_eq!(chart.y_axis.categories.len(), 2);

    let points = &chart.series[0].points;
    for row in 0..2 {
        let cells: Vec<_> = points.iter().filter(|p| p.y == row as f64).collect();
        assert_eq!(cells.len(), 3);
        let xs: Vec<f64> = cells.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        let values: Vec<f64> = cells.iter().map(|p| p.value.unwrap()).collect();
        assert_eq!(values, vec![0.1, 0.3, 0.6]);
        let intensity: Vec<f64> = cells.iter().map(|p| p.intensity.unwrap()).collect();
        assert!(intensity[0] < intensity[1] && intensity[1] < intensity[2]);
        assert!((intensity[2] - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_stabl_marker_on_selected_features() {
    let effects = macrophage_effects();
    let catalog = catalog(&effects);
    let selection = Selection::initial(&catalog)
        .apply(&catalog, SelectionInput::default().with_cell_type("Macrophage"))
        .selection;
    let stabl = StablSelection::new(
        "stabl_selected.csv",
        vec![StablFeatureRecord {
            feature: "Macrophage||OXPHOS".into(),
        }],
    )
    .unwrap();
    let mut sources = sources(&effects);
    sources.stabl = Some(&stabl);
    let data = ReportGenerator::default_config().build(&catalog, &selection, &[], &sources);
    let chart = &data.panel(PlotKind::Heatmap).unwrap().panel.charts()[0];
    assert!(chart.y_axis.categories.contains(&"OXPHOS ★".to_string()));
    assert!(chart.y_axis.categories.contains(&"Glycolysis".to_string()));
}
