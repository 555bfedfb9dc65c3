//! Tabular exports of tier overviews and the ranking.

use std::io::Write;

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde::{Serialize, Serializer};

use super::ranking::RankingEntry;
use super::service::TierOverview;

pub const TIER_HEADERS: [&str; 6] = [
    "entrepreneurship",
    "owner",
    "score",
    "evaluations",
    "decision",
    "cohort",
];

pub const RANKING_HEADERS: [&str; 5] =
    ["position", "entrepreneurship", "owner", "score", "evaluations"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug, Serialize)]
struct TierRow<'a> {
    entrepreneurship: &'a str,
    owner: &'a str,
    #[serde(serialize_with = "two_decimals")]
    score: Option<f64>,
    evaluations: usize,
    decision: &'static str,
    cohort: Option<u8>,
}

/// Scores are written with two decimals in every export.
fn two_decimals<S: Serializer>(score: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match score {
        Some(value) => serializer.serialize_str(&format!("{value:.2}")),
        None => serializer.serialize_none(),
    }
}

fn tier_rows(overview: &TierOverview) -> impl Iterator<Item = TierRow<'_>> {
    overview.candidates.iter().map(|candidate| TierRow {
        entrepreneurship: &candidate.entrepreneurship.name,
        owner: &candidate.entrepreneurship.owner_name,
        score: candidate.aggregate.score,
        evaluations: candidate.aggregate.evaluations,
        decision: candidate
            .decision
            .as_ref()
            .map_or("pending", |decision| decision.state.label()),
        cohort: candidate
            .decision
            .as_ref()
            .and_then(|decision| decision.cohort)
            .map(u8::from),
    })
}

pub fn write_tier_csv<W: Write>(overview: &TierOverview, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in tier_rows(overview) {
        csv.serialize(row)?;
    }
    if overview.candidates.is_empty() {
        csv.write_record(TIER_HEADERS)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_ranking_csv<W: Write>(
    entries: &[RankingEntry],
    writer: W,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RANKING_HEADERS)?;
    for entry in entries {
        csv.write_record([
            entry.position.to_string(),
            entry.name.clone(),
            entry.owner_name.clone(),
            format!("{:.2}", entry.score),
            entry.evaluations.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Workbook with one sheet per tier followed by a ranking sheet.
pub fn workbook(
    overviews: &[TierOverview],
    ranking: &[RankingEntry],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();

    for overview in overviews {
        let sheet = workbook.add_worksheet();
        sheet.set_name(overview.usage.tier.title())?;
        write_tier_sheet(sheet, overview)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Ranking")?;
    write_ranking_sheet(sheet, ranking)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}

fn write_tier_sheet(sheet: &mut Worksheet, overview: &TierOverview) -> Result<(), XlsxError> {
    write_headers(sheet, &TIER_HEADERS)?;
    for (index, row) in tier_rows(overview).enumerate() {
        let line = index as u32 + 1;
        sheet.write_string(line, 0, row.entrepreneurship)?;
        sheet.write_string(line, 1, row.owner)?;
        if let Some(score) = row.score {
            sheet.write_number(line, 2, score)?;
        }
        sheet.write_number(line, 3, row.evaluations as f64)?;
        sheet.write_string(line, 4, row.decision)?;
        if let Some(cohort) = row.cohort {
            sheet.write_number(line, 5, cohort)?;
        }
    }
    Ok(())
}

fn write_ranking_sheet(sheet: &mut Worksheet, ranking: &[RankingEntry]) -> Result<(), XlsxError> {
    write_headers(sheet, &RANKING_HEADERS)?;
    for (index, entry) in ranking.iter().enumerate() {
        let line = index as u32 + 1;
        sheet.write_number(line, 0, entry.position as f64)?;
        sheet.write_string(line, 1, &entry.name)?;
        sheet.write_string(line, 2, &entry.owner_name)?;
        sheet.write_number(line, 3, entry.score)?;
        sheet.write_number(line, 4, entry.evaluations as f64)?;
    }
    Ok(())
}
