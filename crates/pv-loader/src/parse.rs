//! Artifact parsing.
//!
//! CSV artifacts need a header row. Columns are matched by name, so order is
//! free and extra columns are ignored. Fields are trimmed. Every parsed row
//! goes through the table's validating constructor, so a parse either yields
//! a fully valid table or the first [`DataFormatError`].

use csv::{ReaderBuilder, StringRecord, Trim};
use pv_common::{
    BmiGroup, CellProportionRecord, DataFormatError, EffectTable, EnergyDraw, EnergyTable,
    PosteriorDraw, PosteriorDrawTable, ProportionTable, SignatureCatalog, SignatureDefinition,
    SignatureEffectRecord,
    StablFeatureRecord, StablSelection, SurvivalRecord, SurvivalTable, PROPORTION_SUM_TOLERANCE,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::artifact::ArtifactKind;

/// Options that affect validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    /// Allowed deviation of a sample's proportion sum from 1.
    pub proportion_tolerance: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            proportion_tolerance: PROPORTION_SUM_TOLERANCE,
        }
    }
}

/// A validated table that can be parsed from an artifact.
pub trait ResultTable: Sized + Send + Sync + 'static {
    const KIND: ArtifactKind;

    /// Parse and validate artifact bytes. `artifact` names the source in errors.
    fn parse(artifact: &str, bytes: &[u8], options: &ParseOptions) -> Result<Self, DataFormatError>;

    /// Number of data rows.
    fn row_count(&self) -> usize;
}

/// Header lookup for one CSV artifact.
struct Columns<'a> {
    artifact: &'a str,
    index: HashMap<String, usize>,
}

impl<'a> Columns<'a> {
    fn from_headers(
        artifact: &'a str,
        headers: &StringRecord,
        required: &[&str],
    ) -> Result<Self, DataFormatError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        if let Some(missing) = required.iter().find(|c| !index.contains_key(**c)) {
            return Err(DataFormatError::MissingColumn {
                artifact: artifact.to_string(),
                column: missing.to_string(),
            });
        }
        Ok(Self { artifact, index })
    }

    fn invalid(&self, line: usize, column: &str, value: &str, reason: impl ToString) -> DataFormatError {
        DataFormatError::InvalidValue {
            artifact: self.artifact.to_string(),
            line,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Field of a present column; `None` when the column is absent or the field empty.
    fn optional<'r>(&self, row: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|i| row.get(*i))
            .filter(|v| !v.is_empty())
    }

    fn text<'r>(&self, row: &'r StringRecord, line: usize, column: &str) -> Result<&'r str, DataFormatError> {
        self.optional(row, column)
            .ok_or_else(|| self.invalid(line, column, "", "value is required"))
    }

    fn parse<T>(&self, row: &StringRecord, line: usize, column: &str) -> Result<T, DataFormatError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        let raw = self.text(row, line, column)?;
        raw.parse().map_err(|e: T::Err| self.invalid(line, column, raw, e))
    }

    fn parse_optional<T>(&self, row: &StringRecord, line: usize, column: &str) -> Result<Option<T>, DataFormatError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.optional(row, column) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: T::Err| self.invalid(line, column, raw, e)),
            None => Ok(None),
        }
    }

    fn number(&self, row: &StringRecord, line: usize, column: &str) -> Result<f64, DataFormatError> {
        let value: f64 = self.parse(row, line, column)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(line, column, &value.to_string(), "must be a finite number"))
        }
    }
}

/// Parse every data row of a CSV artifact with `row_fn`.
fn read_csv<T>(
    artifact: &str,
    bytes: &[u8],
    kind: ArtifactKind,
    mut row_fn: impl FnMut(&Columns<'_>, &StringRecord, usize) -> Result<T, DataFormatError>,
) -> Result<Vec<T>, DataFormatError> {
    let malformed = |e: csv::Error| DataFormatError::Malformed {
        artifact: artifact.to_string(),
        message: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);
    let headers = reader.headers().map_err(malformed)?.clone();
    let columns = Columns::from_headers(artifact, &headers, kind.required_columns())?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(malformed)?;
        rows.push(row_fn(&columns, &record, idx + 1)?);
    }
    Ok(rows)
}

impl ResultTable for EffectTable {
    const KIND: ArtifactKind = ArtifactKind::Effects;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let records = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(SignatureEffectRecord {
                cell_type: cols.text(row, line, "cell_type")?.to_string(),
                signature_name: cols.text(row, line, "signature")?.to_string(),
                bmi_group: cols.parse::<BmiGroup>(row, line, "bmi_group")?,
                effect_size: cols.number(row, line, "effect_size")?,
                credible_interval_low: cols.number(row, line, "ci_low")?,
                credible_interval_high: cols.number(row, line, "ci_high")?,
                r_hat: cols.number(row, line, "r_hat")?,
                ess: cols.number(row, line, "ess")?,
            })
        })?;
        EffectTable::new(artifact, records)
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

impl ResultTable for ProportionTable {
    const KIND: ArtifactKind = ArtifactKind::Proportions;

    fn parse(artifact: &str, bytes: &[u8], options: &ParseOptions) -> Result<Self, DataFormatError> {
        let records = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(CellProportionRecord {
                sample_id: cols.text(row, line, "sample_id")?.to_string(),
                cell_type: cols.text(row, line, "cell_type")?.to_string(),
                proportion: cols.number(row, line, "proportion")?,
            })
        })?;
        ProportionTable::new(artifact, records, options.proportion_tolerance)
    }

    fn row_count(&self) -> usize {
        self.records().len()
    }
}

impl ResultTable for SurvivalTable {
    const KIND: ArtifactKind = ArtifactKind::Survival;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let records = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(SurvivalRecord {
                feature: cols.text(row, line, "feature")?.to_string(),
                hazard_ratio: cols.number(row, line, "hazard_ratio")?,
                p_value: cols.number(row, line, "p_value")?,
                ci_low: cols.number(row, line, "ci_low")?,
                ci_high: cols.number(row, line, "ci_high")?,
                stratum: cols.parse_optional::<BmiGroup>(row, line, "stratum")?,
                n: cols.parse_optional::<u32>(row, line, "n")?,
                events: cols.parse_optional::<u32>(row, line, "events")?,
            })
        })?;
        SurvivalTable::new(artifact, records)
    }

    fn row_count(&self) -> usize {
        self.records().len()
    }
}

impl ResultTable for EnergyTable {
    const KIND: ArtifactKind = ArtifactKind::Energy;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let draws = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(EnergyDraw {
                chain: cols.parse::<u32>(row, line, "chain")?,
                draw: cols.parse::<u32>(row, line, "draw")?,
                energy: cols.number(row, line, "energy")?,
            })
        })?;
        EnergyTable::new(artifact, draws)
    }

    fn row_count(&self) -> usize {
        self.chains().values().map(Vec::len).sum()
    }
}

impl ResultTable for PosteriorDrawTable {
    const KIND: ArtifactKind = ArtifactKind::Draws;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let draws = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(PosteriorDraw {
                chain: cols.parse::<u32>(row, line, "chain")?,
                draw: cols.parse::<u32>(row, line, "draw")?,
                parameter: cols.text(row, line, "parameter")?.to_string(),
                value: cols.number(row, line, "value")?,
            })
        })?;
        PosteriorDrawTable::new(artifact, draws)
    }

    fn row_count(&self) -> usize {
        self.parameters()
            .iter()
            .flat_map(|p| p.chains.values())
            .map(Vec::len)
            .sum()
    }
}

impl ResultTable for StablSelection {
    const KIND: ArtifactKind = ArtifactKind::Stabl;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let records = read_csv(artifact, bytes, Self::KIND, |cols, row, line| {
            Ok(StablFeatureRecord {
                feature: cols.text(row, line, "feature")?.to_string(),
            })
        })?;
        StablSelection::new(artifact, records)
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

#[derive(Deserialize)]
struct SignatureFile {
    entries: Vec<SignatureDefinition>,
}

impl ResultTable for SignatureCatalog {
    const KIND: ArtifactKind = ArtifactKind::Signatures;

    fn parse(artifact: &str, bytes: &[u8], _options: &ParseOptions) -> Result<Self, DataFormatError> {
        let file: SignatureFile =
            serde_json::from_slice(bytes).map_err(|e| DataFormatError::Malformed {
                artifact: artifact.to_string(),
                message: e.to_string(),
            })?;
        SignatureCatalog::new(artifact, file.entries)
    }

    fn row_count(&self) -> usize {
        self.entries().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EFFECTS: &str = "\
cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess
Macrophage,Glycolysis,Normal,0.1,0.0,0.2,1.001,850
Macrophage,Glycolysis,overweight,0.3,0.2,0.4,1.002,790
Macrophage, Glycolysis ,OBESE,0.6,0.5,0.7,1.000,910
";

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn test_parse_effects() {
        let table = EffectTable::parse("effects.csv", EFFECTS.as_bytes(), &opts()).unwrap();
        assert_eq!(table.row_count(), 3);
        let obese = table.get("Macrophage", "Glycolysis", BmiGroup::Obese).unwrap();
        assert_eq!(obese.effect_size, 0.6);
        assert_eq!(obese.signature_name, "Glycolysis");
    }

    #[test]
    fn test_column_order_is_free_and_extras_ignored() {
        let csv = "ess,r_hat,note,ci_high,ci_low,effect_size,bmi_group,signature,cell_type\n\
                   500,1.01,x,0.3,0.1,0.2,Normal,OXPHOS,TAM\n";
        let table = EffectTable::parse("effects.csv", csv.as_bytes(), &opts()).unwrap();
        assert_eq!(table.records()[0].cell_type, "TAM");
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "cell_type,signature,bmi_group,effect_size,ci_low,ci_high,ess\n";
        let err = EffectTable::parse("effects.csv", csv.as_bytes(), &opts()).unwrap_err();
        assert_eq!(
            err,
            DataFormatError::MissingColumn {
                artifact: "effects.csv".into(),
                column: "r_hat".into()
            }
        );
    }

    #[test]
    fn test_bad_number_reports_line_and_column() {
        let csv = "cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess\n\
                   TAM,OXPHOS,Normal,0.2,0.1,0.3,1.0,500\n\
                   TAM,OXPHOS,Obese,abc,0.1,0.3,1.0,500\n";
        let err = EffectTable::parse("effects.csv", csv.as_bytes(), &opts()).unwrap_err();
        match err {
            DataFormatError::InvalidValue { line, column, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "effect_size");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nan_is_rejected() {
        let csv = "cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess\n\
                   TAM,OXPHOS,Normal,NaN,0.1,0.3,1.0,500\n";
        let err = EffectTable::parse("effects.csv", csv.as_bytes(), &opts()).unwrap_err();
        assert_eq!(err.kind(), "invalid_value");
    }

    #[test]
    fn test_unknown_bmi_group() {
        let csv = "cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess\n\
                   TAM,OXPHOS,Underweight,0.2,0.1,0.3,1.0,500\n";
        let err = EffectTable::parse("effects.csv", csv.as_bytes(), &opts()).unwrap_err();
        assert!(err.to_string().contains("Underweight"));
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let csv = "sample_id,cell_type,proportion\nS1,TAM\n";
        let err = ProportionTable::parse("proportions.csv", csv.as_bytes(), &opts()).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_parse_survival_optional_columns() {
        let csv = "feature,hazard_ratio,p_value,ci_low,ci_high,stratum,n\n\
                   TAM||OXPHOS,1.4,0.01,1.1,1.8,Obese,120\n\
                   Fibroblasts,0.8,0.3,0.5,1.2,,\n";
        let table = SurvivalTable::parse("survival.csv", csv.as_bytes(), &opts()).unwrap();
        let recs = table.records();
        assert_eq!(recs[0].stratum, Some(BmiGroup::Obese));
        assert_eq!(recs[0].n, Some(120));
        assert_eq!(recs[0].events, None);
        assert_eq!(recs[1].stratum, None);
        assert_eq!(recs[1].signature(), None);
    }

    #[test]
    fn test_parse_proportions_with_tolerance() {
        let csv = "sample_id,cell_type,proportion\nS1,TAM,0.5\nS1,CAF,0.49\n";
        assert!(ProportionTable::parse("proportions.csv", csv.as_bytes(), &opts()).is_err());
        let loose = ParseOptions {
            proportion_tolerance: 0.05,
        };
        assert!(ProportionTable::parse("proportions.csv", csv.as_bytes(), &loose).is_ok());
    }

    #[test]
    fn test_parse_energy_and_stabl() {
        let csv = "chain,draw,energy\n0,0,10.0\n0,1,12.0\n1,0,11.0\n";
        let energy = EnergyTable::parse("energy.csv", csv.as_bytes(), &opts()).unwrap();
        assert_eq!(energy.row_count(), 3);
        assert_eq!(energy.chains().len(), 2);

        let csv = "feature\nTAM||OXPHOS\n";
        let stabl = StablSelection::parse("stabl_selected.csv", csv.as_bytes(), &opts()).unwrap();
        assert!(stabl.contains("TAM", "OXPHOS"));
    }

    #[test]
    fn test_parse_posterior_draws() {
        let csv = "\
parameter,chain,draw,value
\"effect[TAM, Obese]\",0,0,0.41
\"effect[TAM, Obese]\",0,1,0.38
\"effect[TAM, Obese]\",1,0,0.44
sigma,0,0,1.2
";
        let draws = PosteriorDrawTable::parse("posterior_draws.csv", csv.as_bytes(), &opts()).unwrap();
        assert_eq!(draws.row_count(), 4);
        assert_eq!(draws.parameters()[0].name, "effect[TAM, Obese]");
        assert_eq!(draws.parameters()[0].chains[&0], vec![0.41, 0.38]);

        let bad = "chain,draw,parameter,value\n0,0,sigma,NaN\n";
        let err = PosteriorDrawTable::parse("posterior_draws.csv", bad.as_bytes(), &opts()).unwrap_err();
        assert_eq!(err.kind(), "invalid_value");
    }

    #[test]
    fn test_parse_signature_catalog() {
        let json = r#"{"entries":[{"cell_type":"TAM","signature":"OXPHOS","genes":["A","B","C"]}]}"#;
        let catalog = SignatureCatalog::parse("signatures.json", json.as_bytes(), &opts()).unwrap();
        assert_eq!(catalog.gene_count("TAM", "OXPHOS"), Some(3));

        let err = SignatureCatalog::parse("signatures.json", b"[1,2]", &opts()).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }
}
