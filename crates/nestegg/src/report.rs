//! Console rendering of simulation results

use std::fmt::Write;

use nestegg_core::error::{ErrorRecord, SimulationError};
use nestegg_core::model::{SimulationResult, SimulationSummary, Strategy, YearResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Whole dollars with thousands separators, e.g. `$1,234,567` or `-$450`
#[must_use]
pub fn format_dollars(value: f64) -> String {
    let digits = (value.abs().round() as i64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 && grouped != "0" {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[must_use]
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn ages(row: &YearResult) -> String {
    match row.age_p2 {
        Some(p2) => format!("{}/{}", row.age_p1, p2),
        None => row.age_p1.to_string(),
    }
}

fn registered_withdrawals(row: &YearResult) -> f64 {
    row.rrif_withdrawal_p1 + row.rrif_withdrawal_p2 + row.rrsp_withdrawal_p1 + row.rrsp_withdrawal_p2
}

const HEADER: [&str; 12] = [
    "Year", "Age", "Need", "Met", "Gap", "Benefits", "Registered", "TFSA", "Non-reg", "Corporate",
    "Tax", "Net worth",
];
const WIDTHS: [usize; 12] = [6, 7, 11, 11, 9, 10, 11, 10, 10, 11, 10, 13];

fn push_row(out: &mut String, cells: &[String], flag: &str) {
    for (i, (cell, width)) in cells.iter().zip(WIDTHS).enumerate() {
        if i < 2 {
            let _ = write!(out, "{cell:<width$}");
        } else {
            let _ = write!(out, "{cell:>width$}");
        }
    }
    let _ = writeln!(out, "  {flag}");
}

/// One line per year plus a summary block
#[must_use]
pub fn render_table(result: &SimulationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Strategy: {}", result.strategy);
    let _ = writeln!(out);

    let header: Vec<String> = HEADER.iter().map(|h| (*h).to_string()).collect();
    push_row(&mut out, &header, "");

    for row in &result.years {
        let cells = [
            row.year.to_string(),
            ages(row),
            format_dollars(row.spending_need),
            format_dollars(row.spending_met),
            format_dollars(row.spending_gap),
            format_dollars(row.total_benefits()),
            format_dollars(registered_withdrawals(row)),
            format_dollars(row.tfsa_withdrawal_p1 + row.tfsa_withdrawal_p2),
            format_dollars(row.nonreg_withdrawal_p1 + row.nonreg_withdrawal_p2),
            format_dollars(row.corporate_withdrawal_p1 + row.corporate_withdrawal_p2),
            format_dollars(row.total_tax),
            format_dollars(row.net_worth_end),
        ];
        let flag = if !row.plan_success {
            "SHORT"
        } else if row.rrif_cap_exceeded {
            "cap"
        } else {
            ""
        };
        push_row(&mut out, &cells, flag);
    }

    let _ = writeln!(out);
    out.push_str(&render_summary(&result.summary));
    out
}

#[must_use]
pub fn render_summary(summary: &SimulationSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Funded years:      {} of {} ({})",
        summary.years_funded,
        summary.years_simulated,
        format_percentage(summary.success_rate)
    );
    let _ = writeln!(out, "Total tax:         {}", format_dollars(summary.total_tax));
    let _ = writeln!(
        out,
        "Total withdrawals: {}",
        format_dollars(summary.total_withdrawals)
    );
    let _ = writeln!(out, "Total benefits:    {}", format_dollars(summary.total_benefits));
    let _ = writeln!(
        out,
        "Median net worth:  {}",
        format_dollars(summary.median_net_worth)
    );
    let _ = writeln!(
        out,
        "Final net worth:   {}",
        format_dollars(summary.final_net_worth)
    );
    match summary.first_failure_year {
        Some(year) => {
            let _ = writeln!(out, "First shortfall:   {year}");
        }
        None => {
            let _ = writeln!(out, "First shortfall:   none");
        }
    }
    out
}

pub fn render_json(result: &SimulationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Host-facing error document, for `--format json` runs that fail
pub fn render_error_json(err: &SimulationError) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ErrorRecord::from(err))
}

/// One summary line per strategy, in the order they were run
#[must_use]
pub fn render_comparison(results: &[(Strategy, Result<SimulationResult, SimulationError>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22}{:>9}{:>14}{:>16}{:>16}",
        "Strategy", "Funded", "Total tax", "Median worth", "Final worth"
    );
    for (strategy, result) in results {
        match result {
            Ok(result) => {
                let s = &result.summary;
                let _ = writeln!(
                    out,
                    "{:<22}{:>9}{:>14}{:>16}{:>16}",
                    strategy.name(),
                    format!("{}/{}", s.years_funded, s.years_simulated),
                    format_dollars(s.total_tax),
                    format_dollars(s.median_net_worth),
                    format_dollars(s.final_net_worth),
                );
            }
            Err(err) => {
                let _ = writeln!(out, "{:<22}error: {err}", strategy.name());
            }
        }
    }
    out
}

#[must_use]
pub fn comparison_json(
    results: &[(Strategy, Result<SimulationResult, SimulationError>)],
) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|(strategy, result)| match result {
            Ok(result) => serde_json::json!({
                "strategy": strategy.name(),
                "success": true,
                "summary": result.summary,
            }),
            Err(err) => serde_json::json!({
                "strategy": strategy.name(),
                "error": ErrorRecord::from(err),
            }),
        })
        .collect();
    serde_json::Value::Array(entries)
}
