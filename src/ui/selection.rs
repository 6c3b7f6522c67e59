//! Cipher list and rounds slider. Both are controlled views: they read the
//! current value and return the value to emit, never storing it themselves.

use crate::api::CipherDescriptor;
use crate::session::CipherList;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    style::{Color as TuiColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Closed integer interval with a fixed step, the model of a range input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundsRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl RoundsRange {
    pub const AUDIT: RoundsRange = RoundsRange {
        min: 100,
        max: 5000,
        step: 100,
    };

    /// Clamps into range and rounds to the nearest step above `min`.
    pub fn snap(&self, value: u32) -> u32 {
        let clamped = value.clamp(self.min, self.max);
        let steps = (clamped - self.min + self.step / 2) / self.step;
        (self.min + steps * self.step).min(self.max)
    }

    /// Moves `steps` increments from `value`, saturating at the bounds.
    pub fn offset(&self, value: u32, steps: i64) -> u32 {
        let current = self.snap(value) as i64;
        let moved = current + steps * self.step as i64;
        self.snap(moved.clamp(self.min as i64, self.max as i64) as u32)
    }

    pub fn ratio(&self, value: u32) -> f64 {
        let span = (self.max - self.min) as f64;
        if span == 0.0 {
            return 0.0;
        }
        (self.snap(value) - self.min) as f64 / span
    }
}

/// Value to emit for a key on the rounds control, if the key changes it.
pub fn rounds_for_key(range: &RoundsRange, current: u32, key: &KeyEvent) -> Option<u32> {
    let next = match key.code {
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => range.offset(current, -1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => range.offset(current, 1),
        KeyCode::PageDown => range.offset(current, -10),
        KeyCode::PageUp => range.offset(current, 10),
        KeyCode::Home => range.min,
        KeyCode::End => range.max,
        _ => return None,
    };
    (next != current).then_some(next)
}

/// Cipher id to emit for a key on the cipher list.
///
/// Up/Down activate the neighbouring entry, digits `1`-`9` activate by position.
pub fn cipher_for_key(
    ciphers: &[CipherDescriptor],
    selected: Option<&str>,
    key: &KeyEvent,
) -> Option<String> {
    if ciphers.is_empty() {
        return None;
    }
    let position = selected.and_then(|id| ciphers.iter().position(|cipher| cipher.id == id));
    let target = match key.code {
        KeyCode::Up | KeyCode::Char('k') => match position {
            Some(0) => return None,
            Some(idx) => idx - 1,
            None => 0,
        },
        KeyCode::Down | KeyCode::Char('j') => match position {
            Some(idx) if idx + 1 >= ciphers.len() => return None,
            Some(idx) => idx + 1,
            None => 0,
        },
        KeyCode::Char(digit @ '1'..='9') => {
            let idx = digit as usize - '1' as usize;
            if idx >= ciphers.len() {
                return None;
            }
            idx
        }
        _ => return None,
    };
    Some(ciphers[target].id.clone())
}

pub fn cipher_block<'a>(
    list: &'a CipherList,
    selected: Option<&str>,
    focused: bool,
) -> Paragraph<'a> {
    let mut lines = Vec::new();
    match list {
        CipherList::Unloaded => lines.push(Line::from("loading ciphers...")),
        CipherList::Failed => lines.push(Line::from(Span::styled(
            "cipher list unavailable",
            Style::default().fg(TuiColor::Red),
        ))),
        CipherList::Loaded(ciphers) if ciphers.is_empty() => {
            lines.push(Line::from("backend offers no ciphers"))
        }
        CipherList::Loaded(ciphers) => {
            for (idx, cipher) in ciphers.iter().enumerate() {
                let active = selected == Some(cipher.id.as_str());
                let indicator = if active { "●" } else { "○" };
                let hotkey = if idx < 9 {
                    format!("{}", idx + 1)
                } else {
                    " ".to_string()
                };
                let style = if active {
                    Style::default()
                        .fg(TuiColor::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{hotkey} {indicator} "), style),
                    Span::styled(cipher.name.as_str(), style),
                ]));
            }
        }
    }
    Paragraph::new(lines).block(focus_block("Algorithms", focused))
}

pub fn rounds_gauge(range: &RoundsRange, rounds: u32, focused: bool) -> Gauge<'static> {
    Gauge::default()
        .block(focus_block("Avalanche Test Rounds", focused))
        .gauge_style(Style::default().fg(TuiColor::Magenta))
        .ratio(range.ratio(rounds))
        .label(format!("{} ← {rounds} → {}", range.min, range.max))
}

pub(crate) fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(TuiColor::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(style)
}
