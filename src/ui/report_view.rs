use crate::report::{AuditReport, AvalancheGrade, ReportSummary, AVALANCHE_TARGET};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color as TuiColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap},
    Frame,
};

const GOOD: TuiColor = TuiColor::Rgb(0x10, 0xb9, 0x81);
const BAD: TuiColor = TuiColor::Rgb(0xef, 0x44, 0x44);
const PROGRESS_WIDTH: usize = 20;

pub fn grade_color(grade: AvalancheGrade) -> TuiColor {
    match grade {
        AvalancheGrade::Good => GOOD,
        AvalancheGrade::Bad => BAD,
    }
}

/// Draws cards, chart and raw dump for `report` into `area`.
pub fn render(
    frame: &mut Frame<'_>,
    area: Rect,
    report: &AuditReport,
    title: Option<&str>,
    raw_scroll: u16,
    focused: bool,
) {
    let summary = report.summary();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(area);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(rows[0]);
    let analysis = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    for (card, chunk) in metric_cards(&summary).into_iter().zip(cards.iter()) {
        frame.render_widget(card, *chunk);
    }
    frame.render_widget(comparison_chart(&summary, title), analysis[0]);
    frame.render_widget(raw_block(report, raw_scroll, focused), analysis[1]);
}

pub fn metric_cards(summary: &ReportSummary) -> [Paragraph<'static>; 4] {
    let color = grade_color(summary.grade);
    [
        card(
            "Avalanche Effect",
            &summary.avalanche,
            color,
            "Target: 50% (Ideal Randomness)",
            Some(progress_bar(summary.bar_percent(), color)),
        ),
        card(
            "Encryption Speed",
            &summary.speed,
            TuiColor::Cyan,
            "Lower is Better",
            None,
        ),
        card(
            "Peak Memory",
            &summary.memory,
            TuiColor::Magenta,
            "IoT Target: < 10 KB",
            None,
        ),
        card(
            "Attack Resistance",
            &summary.attack_status,
            TuiColor::Yellow,
            "Simulation Result",
            None,
        ),
    ]
}

fn card(
    label: &str,
    value: &str,
    color: TuiColor,
    target: &str,
    extra: Option<Line<'static>>,
) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            target.to_string(),
            Style::default().fg(TuiColor::Gray),
        )),
    ];
    if let Some(extra) = extra {
        lines.push(extra);
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(label.to_string()).borders(Borders::ALL))
}

fn progress_bar(percent: f64, color: TuiColor) -> Line<'static> {
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled(
            "░".repeat(PROGRESS_WIDTH - filled),
            Style::default().fg(TuiColor::DarkGray),
        ),
    ])
}

/// Observed avalanche score against the ideal target, as horizontal bars on a 0-100 axis.
pub fn comparison_chart(summary: &ReportSummary, title: Option<&str>) -> BarChart<'static> {
    let observed = summary.bar_percent();
    let bars = [
        Bar::default()
            .value(observed.round() as u64)
            .text_value(format!("{observed:.2}"))
            .label(Line::from("Current Score"))
            .style(Style::default().fg(grade_color(summary.grade))),
        Bar::default()
            .value(AVALANCHE_TARGET as u64)
            .text_value(format!("{AVALANCHE_TARGET:.0}"))
            .label(Line::from("Ideal Target (50%)"))
            .style(Style::default().fg(TuiColor::Gray)),
    ];
    let heading = match title {
        Some(name) => format!("Visual Analysis · {name}"),
        None => "Visual Analysis".to_string(),
    };
    BarChart::default()
        .block(Block::default().title(heading).borders(Borders::ALL))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .max(100)
        .data(BarGroup::default().bars(&bars))
}

pub fn raw_block(report: &AuditReport, scroll: u16, focused: bool) -> Paragraph<'static> {
    let lines: Vec<Line> = report
        .raw_dump()
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();
    Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(super::selection::focus_block("Raw Data", focused))
}
