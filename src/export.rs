use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::aggregate::{BoxScore, MatchTotals};
use crate::sets::MatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub sets: usize,
    pub players: usize,
}

pub const TOTALS_HEADER: [&str; 21] = [
    "Player",
    "Kills",
    "Kill Errors",
    "Attack Attempts",
    "Hitting %",
    "3 Pass",
    "2 Pass",
    "1 Pass",
    "0 Pass",
    "Pass Rating",
    "Service Attempts",
    "Service Errors",
    "Aces",
    "Service %",
    "Digs",
    "Dig Errors",
    "Blocks",
    "Block Errors",
    "Assists",
    "Set Errors",
    "Set Attempts",
];

/// One worksheet's name and cell text, row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<String>>,
}

/// Lays out the Match, Players and Team sheets for one match.
pub fn box_score_sheets(summary: &MatchSummary, box_score: &BoxScore) -> Vec<Sheet> {
    let mut match_rows = vec![
        vec!["Opponent".to_string(), summary.match_info.opponent.clone()],
        vec!["Date".to_string(), summary.match_info.played_on.to_string()],
        vec![
            "Sets".to_string(),
            format!("{}-{}", summary.home_sets_won, summary.opponent_sets_won),
        ],
        Vec::new(),
        vec!["Set".to_string(), "Home".to_string(), "Opponent".to_string()],
    ];
    match_rows.extend(summary.sets.iter().map(|set| {
        vec![
            set.set_number.to_string(),
            set.home_score.to_string(),
            set.opponent_score.to_string(),
        ]
    }));

    let mut player_rows = vec![header_row()];
    player_rows.extend(box_score.players.iter().map(totals_row));

    vec![
        Sheet {
            name: "Match",
            rows: match_rows,
        },
        Sheet {
            name: "Players",
            rows: player_rows,
        },
        Sheet {
            name: "Team",
            rows: vec![header_row(), totals_row(&box_score.team)],
        },
    ]
}

/// Writes the box score of one match to an xlsx workbook.
pub fn export_box_score(
    path: &Path,
    summary: &MatchSummary,
    box_score: &BoxScore,
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    for sheet in box_score_sheets(summary, box_score) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;
        write_rows(worksheet, &sheet.rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    info!(
        match_id = box_score.match_id,
        path = %path.display(),
        "exported box score"
    );
    Ok(ExportReport {
        sets: summary.sets.len(),
        players: box_score.players.len(),
    })
}

fn header_row() -> Vec<String> {
    TOTALS_HEADER.iter().map(|h| h.to_string()).collect()
}

fn totals_row(totals: &MatchTotals) -> Vec<String> {
    let c = &totals.counters;
    let m = &totals.metrics;
    vec![
        totals
            .player_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "Team".to_string()),
        c.kills.to_string(),
        c.kill_errors.to_string(),
        c.attack_attempts.to_string(),
        format!("{:.3}", m.hitting_percentage),
        c.three_pass.to_string(),
        c.two_pass.to_string(),
        c.one_pass.to_string(),
        c.zero_pass.to_string(),
        format!("{:.2}", m.pass_rating),
        c.service_attempt.to_string(),
        c.service_error.to_string(),
        c.service_ace.to_string(),
        format!("{:.3}", m.service_percentage),
        c.digs.to_string(),
        c.dig_error.to_string(),
        c.blocks.to_string(),
        c.block_error.to_string(),
        c.assists.to_string(),
        c.set_error.to_string(),
        c.set_attempts.to_string(),
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
