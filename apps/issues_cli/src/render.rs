//! Plain-text rendering of the processing issues page.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use client_core::{notify::Indicator, time_since, IssueRow, PageBody, PageView};
use shared::catalog::{
    COLUMN_DETAILS, COLUMN_EVENTS, COLUMN_LAST_SEEN, COLUMN_PROBLEM, PRO_TIP,
};

/// How the page tells the operator to act on the retry and reprocess offers.
#[derive(Debug, Clone, Copy)]
pub struct ActionHints {
    pub retry: &'static str,
    pub reprocess: &'static str,
}

pub const ONE_SHOT_HINTS: ActionHints = ActionHints {
    retry: "run the command again",
    reprocess: "run `processing-issues reprocess`",
};

pub const INTERACTIVE_HINTS: ActionHints = ActionHints {
    retry: "press r",
    reprocess: "press p",
};

pub fn render_text(page: &PageView, now: DateTime<Utc>, hints: ActionHints) -> String {
    TextPage { page, now, hints }.to_string()
}

struct TextPage<'a> {
    page: &'a PageView,
    now: DateTime<Utc>,
    hints: ActionHints,
}

impl fmt::Display for TextPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = self.page;
        writeln!(f, "{}", page.title)?;
        writeln!(f, "{}", "=".repeat(page.title.chars().count()))?;
        writeln!(f)?;
        writeln!(f, "{}", page.intro)?;
        writeln!(f)?;

        match &page.body {
            PageBody::Loading => writeln!(f, "Loading...")?,
            PageBody::Error {
                message,
                retry_label,
            } => writeln!(f, "{message} {retry_label}: {}.", self.hints.retry)?,
            PageBody::Empty { message } => writeln!(f, "{message}")?,
            PageBody::Results { rows } => write_table(f, rows, self.now)?,
        }

        if let Some(cta) = &page.call_to_action {
            writeln!(f)?;
            writeln!(f, "{PRO_TIP} {} ({}).", cta.label, self.hints.reprocess)?;
        }
        Ok(())
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[IssueRow], now: DateTime<Utc>) -> fmt::Result {
    let mut links: Vec<&'static str> = Vec::new();
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            let problem = match row.help_link {
                Some(link) => {
                    let index = match links.iter().position(|known| *known == link) {
                        Some(index) => index,
                        None => {
                            links.push(link);
                            links.len() - 1
                        }
                    };
                    format!("{} [{}]", row.problem, index + 1)
                }
                None => row.problem.clone(),
            };
            [
                problem,
                row.detail.to_string(),
                row.events.clone(),
                format!(
                    "{} ({})",
                    time_since(row.last_seen, now),
                    row.last_seen.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
            ]
        })
        .collect();

    let header = [COLUMN_PROBLEM, COLUMN_DETAILS, COLUMN_EVENTS, COLUMN_LAST_SEEN];
    let mut widths = header.map(|title| title.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(f, &header.map(str::to_string), &widths)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(f, "{}", rule.join("-+-"))?;
    for row in &cells {
        write_row(f, row, &widths)?;
    }

    if !links.is_empty() {
        writeln!(f)?;
        for (index, link) in links.iter().enumerate() {
            writeln!(f, "[{}] {link}", index + 1)?;
        }
    }
    Ok(())
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String; 4], widths: &[usize; 4]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(f, "{}", line.trim_end())
}

pub fn render_indicators(indicators: &[Indicator]) -> String {
    indicators
        .iter()
        .map(|indicator| format!("* {}\n", indicator.text))
        .collect()
}
