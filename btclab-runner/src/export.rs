//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for forecast runs:
//! - **JSON**: the run manifest, round-trippable with schema versioning
//! - **CSV**: the fused feature table for external analysis tools
//! - **Markdown**: human-readable single-run reports
//!
//! The persisted manifest carries a `schema_version` field; unknown
//! versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use btclab_core::domain::FeatureTable;
use btclab_core::model::Backend;

use crate::runner::{AttributionOutcome, Manifest, PipelineRun, RunOutcome, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a run manifest to pretty JSON.
pub fn export_json(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest to JSON")
}

/// Deserialize a run manifest from JSON, rejecting unknown schema
/// versions.
pub fn import_json(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the fused feature table as CSV, one row per date.
///
/// Values use the shortest round-trip float representation, so an
/// import recovers them bit for bit.
pub fn export_features_csv(table: &FeatureTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push("date".to_string());
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header)?;

    for (date, row) in table.dates().iter().zip(table.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(date.to_string());
        record.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Rebuild a feature table from its CSV export.
pub fn import_features_csv(data: &str) -> Result<FeatureTable> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());

    let headers = rdr.headers().context("failed to read CSV header")?.clone();
    if headers.get(0) != Some("date") {
        bail!("feature CSV must start with a 'date' column");
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.context("failed to read CSV record")?;
        let date_field = record.get(0).context("CSV record is missing the date field")?;
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .with_context(|| format!("bad date '{date_field}' in feature CSV"))?;
        let values = record
            .iter()
            .skip(1)
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("bad value '{field}' in feature CSV"))
            })
            .collect::<Result<Vec<f64>>>()?;
        dates.push(date);
        rows.push(values);
    }

    FeatureTable::new(dates, columns, rows).context("failed to rebuild feature table from CSV")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run under `{output_dir}/{run_id}/`:
///
/// - `manifest.json` — the run manifest
/// - `features.csv` — the fused feature table
/// - `report.md` — human-readable report
///
/// The bundle is staged in a temp directory and renamed into place, so
/// readers never see a half-written run. Re-running the same config
/// replaces the bundle wholesale.
pub fn save_artifacts(run: &PipelineRun, output_dir: &Path) -> Result<PathBuf> {
    let final_dir = output_dir.join(&run.run_id);
    let stage_dir = output_dir.join(format!(".{}.tmp", run.run_id));

    if stage_dir.exists() {
        std::fs::remove_dir_all(&stage_dir)
            .with_context(|| format!("failed to clear stage dir: {}", stage_dir.display()))?;
    }
    std::fs::create_dir_all(&stage_dir)
        .with_context(|| format!("failed to create stage dir: {}", stage_dir.display()))?;

    let json = export_json(&run.manifest())?;
    std::fs::write(stage_dir.join("manifest.json"), &json)?;

    let features_csv = export_features_csv(&run.table)?;
    std::fs::write(stage_dir.join("features.csv"), &features_csv)?;

    let report = generate_report(run);
    std::fs::write(stage_dir.join("report.md"), &report)?;

    if final_dir.exists() {
        std::fs::remove_dir_all(&final_dir)
            .with_context(|| format!("failed to replace run dir: {}", final_dir.display()))?;
    }
    std::fs::rename(&stage_dir, &final_dir)
        .with_context(|| format!("failed to move bundle into place: {}", final_dir.display()))?;

    Ok(final_dir)
}

/// Load the manifest from an artifact directory.
///
/// Rejects unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single run.
pub fn generate_report(run: &PipelineRun) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Forecast Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Ticker | {} |\n", run.config.ticker));
    md.push_str(&format!("| Range | {} |\n", run.config.range));
    md.push_str(&format!("| Horizon | {} days |\n", run.config.horizon));
    md.push_str(&format!(
        "| Backend | {} |\n",
        backend_name(run.config.model.backend)
    ));
    md.push_str(&format!("| Generated | {} |\n", run.generated_at));
    if let (Some(first), Some(last)) = (run.table.dates().first(), run.table.dates().last()) {
        md.push_str(&format!(
            "| Table span | {first} to {last} ({} rows) |\n",
            run.table.len()
        ));
    }
    md.push_str(&format!("| Features | {} |\n", run.table.columns().len()));
    md.push_str(&format!("| Dataset Hash | {} |\n", run.dataset_hash));
    if run.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Forecast\n\n");
    match &run.outcome {
        RunOutcome::Forecast {
            as_of,
            predicted_return,
            signal,
            train_rows,
        } => {
            md.push_str("| Metric | Value |\n");
            md.push_str("| --- | --- |\n");
            md.push_str(&format!("| As of | {as_of} |\n"));
            md.push_str(&format!(
                "| Predicted {}d Return | {:+.4}% |\n",
                run.config.horizon,
                predicted_return * 100.0
            ));
            md.push_str(&format!("| Signal | **{signal}** |\n"));
            md.push_str(&format!("| Training rows | {train_rows} |\n"));
        }
        RunOutcome::FeaturesOnly { reason } => {
            md.push_str(&format!("No forecast: {reason}.\n\n"));
            md.push_str("The fused feature table was exported for inspection.\n");
        }
    }
    md.push('\n');

    md.push_str("## Attribution\n\n");
    match &run.attribution {
        AttributionOutcome::Ready(att) => {
            md.push_str(&format!("Base value: {:+.6}\n\n", att.base_value));
            md.push_str("| Feature | Input | Contribution |\n");
            md.push_str("| --- | --- | --- |\n");
            for c in att.ranked() {
                md.push_str(&format!(
                    "| {} | {:.6} | {:+.6} |\n",
                    c.feature, c.value, c.phi
                ));
            }
            let total: f64 = att.contributions.iter().map(|c| c.phi).sum();
            md.push_str(&format!(
                "\nContributions sum to {:+.6}; base value plus sum reconstructs the prediction {:+.6}.\n",
                total, att.prediction
            ));
        }
        AttributionOutcome::Unavailable { reason } => {
            md.push_str(&format!("Attribution unavailable: {reason}.\n"));
        }
    }

    md
}

fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Depthwise => "depthwise",
        Backend::Leafwise => "leafwise",
    }
}
