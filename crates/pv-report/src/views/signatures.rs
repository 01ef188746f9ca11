//! Signature database explorer: the gene sets behind a cell type's signatures.

use pv_common::names::{format_signature_name, same_name};
use pv_common::{Selection, SignatureCatalog, SignatureDefinition};

use super::{html_escape, Panel};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, Series, SeriesKind};
use crate::config::ReportLimits;
use crate::table::TableSpec;

/// Genes listed per row of the summary table before truncating.
const PREVIEW_GENES: usize = 5;

fn gene_preview(genes: &[String]) -> String {
    let mut preview = genes
        .iter()
        .take(PREVIEW_GENES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if genes.len() > PREVIEW_GENES {
        preview.push_str(", ...");
    }
    preview
}

/// Summary table, member genes of the selected signature and a gene-count chart.
///
/// The selected signature is matched by name; when the database does not
/// define it, the first signature of the cell type is shown instead.
pub fn signature_explorer(
    catalog: &SignatureCatalog,
    selection: &Selection,
    limits: &ReportLimits,
) -> Panel {
    let Some(cell) = selection.cell_type.as_deref() else {
        return Panel::unavailable("No cell type selected");
    };
    let defs = catalog.for_cell_type(cell);
    if defs.is_empty() {
        return Panel::unavailable(format!("No signatures defined for {}", cell));
    }

    let requested = selection.signature.as_deref();
    let found = requested.and_then(|sig| defs.iter().position(|d| same_name(&d.signature, sig)));
    let current = found.unwrap_or(0);
    let shown: &SignatureDefinition = defs[current];
    let display =
        |d: &SignatureDefinition| format_signature_name(&d.signature, limits.max_signature_name_len);

    let mut summary = TableSpec::new(
        "signature-summary",
        format!("Signatures defined for {}", cell),
        &["Signature", "Genes", "Gene preview"],
    );
    for def in &defs {
        summary.push_row(vec![
            display(*def),
            def.genes.len().to_string(),
            gene_preview(&def.genes),
        ]);
    }
    let summary = summary.with_highlight(Some(current));

    let mut genes = TableSpec::new(
        "signature-genes",
        format!("Member genes of {}", display(shown)),
        &["#", "Gene"],
    );
    for (i, gene) in shown.genes.iter().enumerate() {
        genes.push_row(vec![(i + 1).to_string(), gene.clone()]);
    }

    let points = defs
        .iter()
        .enumerate()
        .map(|(i, d)| {
            DataPoint::new(
                i as f64,
                d.genes.len() as f64,
                format!("<b>{}</b><br>{} genes", html_escape(&d.signature), d.genes.len()),
            )
            .highlighted(i == current)
        })
        .collect();
    let chart = ChartSpec::new(
        "signature-gene-counts",
        ChartKind::Bar,
        format!("Genes per signature in {}", cell),
        Axis::category("Signature", defs.iter().map(|d| display(*d)).collect()),
        Axis::value("Genes"),
    )
    .with_series(Series::new("Genes", SeriesKind::Bar, points).with_color("#4e79a7"));

    let mut notes = Vec::new();
    if let (Some(sig), None) = (requested, found) {
        notes.push(format!(
            "{} is not in the signature database; showing {}",
            sig, shown.signature
        ));
    }
    notes.push(format!(
        "{}: cell type {}, compartment {}, {} genes",
        shown.signature,
        shown.cell_type,
        selection.compartment,
        shown.genes.len()
    ));
    if shown.genes.is_empty() {
        notes.push(format!("No genes listed for {}", shown.signature));
    }
    notes.push(format!(
        "Database: {} signatures across {} cell types, {:.1} genes per signature on average; {} for {}",
        catalog.entries().len(),
        catalog.cell_type_count(),
        catalog.mean_gene_count(),
        defs.len(),
        cell
    ));

    let mut tables = vec![summary];
    if !genes.is_empty() {
        tables.push(genes);
    }
    Panel::ready(vec![chart], notes).with_tables(tables)
}
