//! Source editor for the custom cipher.
//!
//! The text itself lives in the session. `SourceEditor` only tracks the cursor
//! and scroll offsets; each edit produces the complete new text, which the
//! caller writes back and passes in again on the next key.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color as TuiColor, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::selection::focus_block;

const TAB: &str = "    ";
const GUTTER_WIDTH: u16 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceEditor {
    row: usize,
    col: usize,
    scroll: usize,
    hscroll: usize,
}

impl SourceEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Applies `key` to `text`. Returns the updated text when the key edited it.
    pub fn handle_key(&mut self, text: &str, key: &KeyEvent) -> Option<String> {
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        self.clamp(&lines);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char(ch) if !ctrl => {
                let line = &mut lines[self.row];
                let at = byte_index(line, self.col);
                line.insert(at, ch);
                self.col += 1;
            }
            KeyCode::Tab => {
                let line = &mut lines[self.row];
                let at = byte_index(line, self.col);
                line.insert_str(at, TAB);
                self.col += TAB.len();
            }
            KeyCode::Enter => {
                let line = &mut lines[self.row];
                let at = byte_index(line, self.col);
                let tail = line.split_off(at);
                lines.insert(self.row + 1, tail);
                self.row += 1;
                self.col = 0;
            }
            KeyCode::Backspace => {
                if self.col > 0 {
                    let line = &mut lines[self.row];
                    let at = byte_index(line, self.col - 1);
                    line.remove(at);
                    self.col -= 1;
                } else if self.row > 0 {
                    let current = lines.remove(self.row);
                    self.row -= 1;
                    self.col = char_len(&lines[self.row]);
                    lines[self.row].push_str(&current);
                } else {
                    return None;
                }
            }
            KeyCode::Delete => {
                if self.col < char_len(&lines[self.row]) {
                    let line = &mut lines[self.row];
                    let at = byte_index(line, self.col);
                    line.remove(at);
                } else if self.row + 1 < lines.len() {
                    let next = lines.remove(self.row + 1);
                    lines[self.row].push_str(&next);
                } else {
                    return None;
                }
            }
            _ => {
                self.move_cursor(&lines, key.code);
                return None;
            }
        }
        Some(lines.join("\n"))
    }

    fn move_cursor(&mut self, lines: &[String], code: KeyCode) {
        match code {
            KeyCode::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = char_len(&lines[self.row]);
                }
            }
            KeyCode::Right => {
                if self.col < char_len(&lines[self.row]) {
                    self.col += 1;
                } else if self.row + 1 < lines.len() {
                    self.row += 1;
                    self.col = 0;
                }
            }
            KeyCode::Up => self.row = self.row.saturating_sub(1),
            KeyCode::Down => self.row = (self.row + 1).min(lines.len() - 1),
            KeyCode::PageUp => self.row = self.row.saturating_sub(10),
            KeyCode::PageDown => self.row = (self.row + 10).min(lines.len() - 1),
            KeyCode::Home => self.col = 0,
            KeyCode::End => self.col = char_len(&lines[self.row]),
            _ => {}
        }
        self.clamp(lines);
    }

    /// Keeps the cursor inside text that may have changed since the last key.
    fn clamp(&mut self, lines: &[String]) {
        self.row = self.row.min(lines.len().saturating_sub(1));
        self.col = self.col.min(char_len(&lines[self.row]));
    }

    /// Gutter plus text, scrolled both ways so the cursor stays inside `area`.
    pub fn widget<'a>(&mut self, text: &'a str, area: Rect, focused: bool) -> Paragraph<'a> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.row = self.row.min(lines.len() - 1);
        self.col = self.col.min(char_len(lines[self.row]));

        let visible_rows = area.height.saturating_sub(2).max(1) as usize;
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + visible_rows {
            self.scroll = self.row + 1 - visible_rows;
        }
        let visible_cols = area.width.saturating_sub(2 + GUTTER_WIDTH).max(1) as usize;
        if self.col < self.hscroll {
            self.hscroll = self.col;
        } else if self.col >= self.hscroll + visible_cols {
            self.hscroll = self.col + 1 - visible_cols;
        }

        let gutter = Style::default().fg(TuiColor::DarkGray);
        let cursor = Style::default().add_modifier(Modifier::REVERSED);
        let rendered: Vec<Line> = lines
            .iter()
            .copied()
            .enumerate()
            .skip(self.scroll)
            .take(visible_rows)
            .map(|(idx, line)| {
                let shown = &line[byte_index(line, self.hscroll)..];
                let mut spans = vec![Span::styled(format!("{:>4} ", idx + 1), gutter)];
                if focused && idx == self.row {
                    let split = byte_index(shown, self.col - self.hscroll);
                    let (before, rest) = shown.split_at(split);
                    let mut rest_chars = rest.chars();
                    let under = rest_chars
                        .next()
                        .map(String::from)
                        .unwrap_or_else(|| " ".to_string());
                    spans.push(Span::raw(before));
                    spans.push(Span::styled(under, cursor));
                    spans.push(Span::raw(rest_chars.as_str()));
                } else {
                    spans.push(Span::raw(shown));
                }
                Line::from(spans)
            })
            .collect();

        let title = format!(
            "Custom Cipher Implementation · Python 3.x · {}:{}",
            self.row + 1,
            self.col + 1
        );
        Paragraph::new(rendered).block(focus_block(&title, focused))
    }
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DEFAULT_CUSTOM_SOURCE;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Feeds keys through the editor the way the dashboard does, writing each edit back.
    fn type_keys(editor: &mut SourceEditor, text: &mut String, codes: &[KeyCode]) {
        for code in codes {
            if let Some(updated) = editor.handle_key(text, &key(*code)) {
                *text = updated;
            }
        }
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut editor = SourceEditor::new();
        let mut text = "ac".to_string();
        type_keys(&mut editor, &mut text, &[KeyCode::Right, KeyCode::Char('b')]);
        assert_eq!(text, "abc");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn enter_and_backspace_split_and_join_lines() {
        let mut editor = SourceEditor::new();
        let mut text = "defx".to_string();
        type_keys(
            &mut editor,
            &mut text,
            &[KeyCode::End, KeyCode::Left, KeyCode::Enter],
        );
        assert_eq!(text, "def\nx");
        assert_eq!(editor.cursor(), (1, 0));
        type_keys(&mut editor, &mut text, &[KeyCode::Backspace]);
        assert_eq!(text, "defx");
        assert_eq!(editor.cursor(), (0, 3));
    }

    #[test]
    fn delete_joins_following_line() {
        let mut editor = SourceEditor::new();
        let mut text = "a\nb".to_string();
        type_keys(&mut editor, &mut text, &[KeyCode::End, KeyCode::Delete]);
        assert_eq!(text, "ab");
        assert_eq!(editor.handle_key(&text, &key(KeyCode::End)), None);
        assert_eq!(editor.handle_key(&text, &key(KeyCode::Delete)), None);
    }

    #[test]
    fn tab_inserts_four_spaces() {
        let mut editor = SourceEditor::new();
        let mut text = "pass".to_string();
        type_keys(&mut editor, &mut text, &[KeyCode::Tab]);
        assert_eq!(text, "    pass");
        assert_eq!(editor.cursor(), (0, 4));
    }

    #[test]
    fn navigation_does_not_emit() {
        let mut editor = SourceEditor::new();
        let text = "one\ntwo";
        assert_eq!(editor.handle_key(text, &key(KeyCode::Down)), None);
        assert_eq!(editor.handle_key(text, &key(KeyCode::End)), None);
        assert_eq!(editor.cursor(), (1, 3));
        assert_eq!(editor.handle_key(text, &key(KeyCode::Backspace)).as_deref(), Some("one\ntw"));
    }

    #[test]
    fn control_chords_are_ignored() {
        let mut editor = SourceEditor::new();
        let chord = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(editor.handle_key("x", &chord), None);
    }

    #[test]
    fn multibyte_characters_are_edited_by_char() {
        let mut editor = SourceEditor::new();
        let mut text = "é✓".to_string();
        type_keys(&mut editor, &mut text, &[KeyCode::End, KeyCode::Backspace, KeyCode::Char('z')]);
        assert_eq!(text, "éz");
    }

    #[test]
    fn cursor_follows_text_replaced_by_owner() {
        let mut editor = SourceEditor::new();
        let long = "a\nb\nc\nd";
        type_keys(&mut editor, &mut long.to_string(), &[KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        assert_eq!(editor.cursor(), (3, 0));
        // Owner swapped in shorter text; the next edit lands on its last line.
        assert_eq!(editor.handle_key("x", &key(KeyCode::Char('y'))).as_deref(), Some("yx"));
    }

    /// Renders the focused editor and returns each screen row plus the reversed cell.
    fn render(
        editor: &mut SourceEditor,
        text: &str,
        width: u16,
        height: u16,
    ) -> (Vec<String>, Option<(u16, u16)>) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                frame.render_widget(editor.widget(text, area, true), area);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut rows = Vec::new();
        let mut cursor = None;
        for y in 0..height {
            let mut row = String::new();
            for x in 0..width {
                let cell = buffer.get(x, y);
                if cell.modifier.contains(Modifier::REVERSED) {
                    cursor = Some((x, y));
                }
                row.push_str(cell.symbol());
            }
            rows.push(row);
        }
        (rows, cursor)
    }

    #[test]
    fn long_line_scrolls_to_keep_cursor_visible() {
        let mut editor = SourceEditor::new();
        let text = DEFAULT_CUSTOM_SOURCE;
        let mut codes = vec![KeyCode::Down; 6];
        codes.push(KeyCode::End);
        for code in codes {
            assert_eq!(editor.handle_key(text, &key(code)), None);
        }
        let long_line = text.lines().nth(6).unwrap();
        assert!(long_line.chars().count() > 40);
        assert_eq!(editor.cursor(), (6, long_line.chars().count()));

        let (rows, cursor) = render(&mut editor, text, 44, 5);
        let (x, y) = cursor.expect("cursor cell drawn at end of long line");
        // Last column inside the right border.
        assert_eq!(x, 42);
        assert!(rows[y as usize].contains("your own logic."), "{rows:?}");
        assert!(rows[y as usize].contains("   7 "));

        editor.handle_key(text, &key(KeyCode::Home));
        let (rows, cursor) = render(&mut editor, text, 44, 5);
        let (x, y) = cursor.expect("cursor cell drawn at line start");
        assert_eq!(x, 1 + GUTTER_WIDTH);
        assert!(rows[y as usize].contains("# Example"), "{rows:?}");
    }

    #[test]
    fn short_lines_render_unscrolled() {
        let mut editor = SourceEditor::new();
        let (rows, cursor) = render(&mut editor, "pass", 44, 5);
        assert_eq!(cursor, Some((1 + GUTTER_WIDTH, 1)));
        assert!(rows[1].contains("   1 pass"));
    }
}
