pub mod editor;
pub mod report_view;
pub mod selection;

use crate::api::{ApiClient, CipherDescriptor};
use crate::error::{SessionError, TransportError};
use crate::session::{AuditOutcome, Phase, Session};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use editor::SourceEditor;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color as TuiColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use selection::RoundsRange;
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

const LOG_LIMIT: usize = 64;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Ciphers,
    Rounds,
    Editor,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Continue,
    Submit,
    Quit,
}

/// Results delivered from request tasks back to the UI thread.
#[derive(Debug)]
pub enum BackendEvent {
    Ciphers(Result<Vec<CipherDescriptor>, TransportError>),
    Audit(AuditOutcome),
}

/// Presentation-only state: focus, editor cursor, scroll offsets, activity log.
#[derive(Debug)]
pub struct ViewState {
    pub focus: Focus,
    pub editor: SourceEditor,
    pub raw_scroll: u16,
    logs: VecDeque<String>,
    tick: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            focus: Focus::Ciphers,
            editor: SourceEditor::new(),
            raw_scroll: 0,
            logs: VecDeque::with_capacity(LOG_LIMIT),
            tick: 0,
        }
    }
}

impl ViewState {
    pub fn log<S: Into<String>>(&mut self, entry: S) {
        push_log(&mut self.logs, entry.into());
    }

    pub fn logs(&self) -> impl Iterator<Item = &str> {
        self.logs.iter().map(String::as_str)
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Routes one key press to the focused control and the session mutators.
    pub fn handle_key(&mut self, session: &mut Session, key: KeyEvent) -> UiCommand {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return UiCommand::Quit;
        }
        if key.code == KeyCode::F(5) || (ctrl && key.code == KeyCode::Char('r')) {
            return self.request_submit(session);
        }
        match key.code {
            KeyCode::Tab if self.focus != Focus::Editor => {
                self.cycle_focus(session, true);
                return UiCommand::Continue;
            }
            KeyCode::BackTab => {
                self.cycle_focus(session, false);
                return UiCommand::Continue;
            }
            _ => {}
        }

        if self.focus == Focus::Editor {
            if key.code == KeyCode::Esc {
                self.focus = Focus::Ciphers;
            } else if let Some(text) = self.editor.handle_key(session.custom_code(), &key) {
                session.set_custom_code(text);
            }
            return UiCommand::Continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return UiCommand::Quit,
            KeyCode::Char('r') | KeyCode::Enter => return self.request_submit(session),
            KeyCode::Char('e') if session.editor_visible() => {
                self.focus = Focus::Editor;
                return UiCommand::Continue;
            }
            _ => {}
        }

        match self.focus {
            Focus::Ciphers => {
                if let Some(id) =
                    selection::cipher_for_key(session.cipher_descriptors(), session.selected_cipher(), &key)
                {
                    debug!(cipher = %id, "cipher selected");
                    session.select_cipher(&id);
                }
            }
            Focus::Rounds => {
                if let Some(rounds) =
                    selection::rounds_for_key(&RoundsRange::AUDIT, session.rounds(), &key)
                {
                    session.set_rounds(rounds);
                }
            }
            Focus::Report => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.raw_scroll = self.raw_scroll.saturating_sub(1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.raw_scroll = self.raw_scroll.saturating_add(1)
                }
                KeyCode::Home => self.raw_scroll = 0,
                _ => {}
            },
            Focus::Editor => {}
        }
        UiCommand::Continue
    }

    fn request_submit(&mut self, session: &Session) -> UiCommand {
        if session.can_submit() {
            self.raw_scroll = 0;
            UiCommand::Submit
        } else {
            self.log("audit already running");
            UiCommand::Continue
        }
    }

    fn available_focus(session: &Session) -> Vec<Focus> {
        let mut order = vec![Focus::Ciphers, Focus::Rounds];
        if session.editor_visible() {
            order.push(Focus::Editor);
        }
        if session.report().is_some() {
            order.push(Focus::Report);
        }
        order
    }

    fn cycle_focus(&mut self, session: &Session, forward: bool) {
        let order = Self::available_focus(session);
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % order.len()
        } else {
            (idx + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Moves focus off controls that the current session state hides.
    pub fn normalize_focus(&mut self, session: &Session) {
        if !Self::available_focus(session).contains(&self.focus) {
            self.focus = Focus::Ciphers;
        }
    }

    /// Applies a request result to the session and notes it in the activity log.
    pub fn apply(&mut self, session: &mut Session, event: BackendEvent) {
        match event {
            BackendEvent::Ciphers(result) => {
                match &result {
                    Ok(list) => self.log(format!("loaded {} ciphers", list.len())),
                    Err(err) => self.log(format!("cipher list failed: {err}")),
                }
                session.apply_cipher_list(result);
            }
            BackendEvent::Audit(outcome) => {
                session.complete_audit(outcome);
                match session.phase() {
                    Phase::Success => self.log("audit finished"),
                    Phase::Failed => {
                        let message = session.error().map(ToString::to_string).unwrap_or_default();
                        self.log(format!("audit failed: {message}"));
                    }
                    _ => {}
                }
            }
        }
        self.normalize_focus(session);
    }
}

/// Draws the whole dashboard for the current session.
pub fn draw(frame: &mut Frame<'_>, session: &Session, view: &mut ViewState) {
    let size = frame.size();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
        ])
        .split(size);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(40)])
        .split(vertical[1]);
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(body[0]);

    frame.render_widget(header_block(session), vertical[0]);
    frame.render_widget(
        selection::cipher_block(
            session.ciphers(),
            session.selected_cipher(),
            view.focus == Focus::Ciphers,
        ),
        sidebar[0],
    );
    frame.render_widget(
        selection::rounds_gauge(
            &RoundsRange::AUDIT,
            session.rounds(),
            view.focus == Focus::Rounds,
        ),
        sidebar[1],
    );
    frame.render_widget(trigger_block(session, view.tick), sidebar[2]);
    draw_main(frame, body[1], session, view);
    frame.render_widget(log_block(view), vertical[2]);
}

fn draw_main(frame: &mut Frame<'_>, area: Rect, session: &Session, view: &mut ViewState) {
    let editor_visible = session.editor_visible();
    match (editor_visible, session.report()) {
        (true, Some(report)) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(area);
            let editor = view.editor.widget(
                session.custom_code(),
                split[0],
                view.focus == Focus::Editor,
            );
            frame.render_widget(editor, split[0]);
            report_view::render(
                frame,
                split[1],
                report,
                session.report_title(),
                view.raw_scroll,
                view.focus == Focus::Report,
            );
        }
        (true, None) => {
            let editor = view
                .editor
                .widget(session.custom_code(), area, view.focus == Focus::Editor);
            frame.render_widget(editor, area);
        }
        (false, Some(report)) => report_view::render(
            frame,
            area,
            report,
            session.report_title(),
            view.raw_scroll,
            view.focus == Focus::Report,
        ),
        (false, None) => frame.render_widget(placeholder_block(session), area),
    }
}

fn header_block(session: &Session) -> Paragraph<'static> {
    match session.error() {
        Some(err) => {
            let title = match err {
                SessionError::CiphersLoad => "Backend unavailable",
                SessionError::Audit(_) => "Audit error",
            };
            Paragraph::new(Line::from(Span::styled(
                err.to_string(),
                Style::default()
                    .fg(TuiColor::Red)
                    .add_modifier(Modifier::BOLD),
            )))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(TuiColor::Red)),
            )
        }
        None => Paragraph::new(Line::from(vec![
            Span::styled("CipherScore", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" · Security Evaluation Suite · "),
            Span::styled(
                session.phase().label(),
                Style::default().fg(TuiColor::Cyan),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL)),
    }
}

fn trigger_block(session: &Session, tick: usize) -> Paragraph<'static> {
    let (label, style) = if session.can_submit() {
        (
            "▶ Run Audit (r / F5)".to_string(),
            Style::default()
                .fg(TuiColor::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            format!("{} Auditing...", SPINNER[tick % SPINNER.len()]),
            Style::default().fg(TuiColor::DarkGray),
        )
    };
    Paragraph::new(Line::from(Span::styled(label, style)))
        .block(Block::default().borders(Borders::ALL))
}

fn placeholder_block(session: &Session) -> Paragraph<'static> {
    let text = if session.is_loading() {
        "Auditing... the report will appear here"
    } else {
        "Select a cipher and run audit to view analytics"
    };
    Paragraph::new(vec![Line::from(""), Line::from(text)])
        .style(Style::default().fg(TuiColor::Gray))
        .block(Block::default().borders(Borders::ALL))
}

fn log_block(view: &ViewState) -> Paragraph<'_> {
    let mut lines: Vec<Line> = view
        .logs
        .iter()
        .rev()
        .map(|entry| Line::from(entry.as_str()))
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(
            "Tab: focus · ↑↓: cipher · ←→: rounds · e: edit source · r: run · q: quit",
        ));
    }
    Paragraph::new(lines)
        .block(
            Block::default()
                .title("Activity (newest first)")
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(TuiColor::Gray))
}

fn push_log(logs: &mut VecDeque<String>, entry: String) {
    if logs.len() == LOG_LIMIT {
        logs.pop_front();
    }
    logs.push_back(entry);
}

/// Full-screen terminal owner. Restores the terminal on drop.
pub struct Dashboard<B: Backend> {
    terminal: Terminal<B>,
    view: ViewState,
    raw_mode: bool,
    finished: bool,
}

impl Dashboard<CrosstermBackend<Stdout>> {
    pub fn open() -> io::Result<Self> {
        enable_raw_mode()?;
        let terminal = undo_on_error(enter_alternate_screen, || {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })?;
        Ok(Self {
            terminal,
            view: ViewState::default(),
            raw_mode: true,
            finished: false,
        })
    }
}

fn enter_alternate_screen() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Runs `step`; if it fails, runs `undo` before returning the error.
fn undo_on_error<T>(step: impl FnOnce() -> io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    step().map_err(|err| {
        undo();
        err
    })
}

impl<B: Backend> Dashboard<B> {
    /// Wraps an already prepared terminal, e.g. a test backend.
    pub fn with_terminal(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            view: ViewState::default(),
            raw_mode: false,
            finished: false,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let view = &mut self.view;
        self.terminal.draw(|frame| draw(frame, session, view))?;
        Ok(())
    }

    /// Drives the dashboard until the user quits. Requests run on `runtime`.
    pub fn run(
        &mut self,
        runtime: &Handle,
        client: ApiClient,
        session: &mut Session,
    ) -> io::Result<()> {
        let (tx, rx) = mpsc::channel::<BackendEvent>();
        self.view.log(format!("connecting to {}", client.base_url()));
        {
            let tx = tx.clone();
            let client = client.clone();
            runtime.spawn(async move {
                let result = client.list_ciphers().await;
                let _ = tx.send(BackendEvent::Ciphers(result));
            });
        }

        loop {
            while let Ok(event) = rx.try_recv() {
                self.view.apply(session, event);
            }
            if session.is_loading() {
                self.view.tick();
            }
            self.render(session)?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.view.handle_key(session, key) {
                        UiCommand::Quit => break,
                        UiCommand::Submit => {
                            if let Some(pending) = session.begin_audit() {
                                self.view.log(format!(
                                    "auditing {} with {} rounds",
                                    pending.request.cipher_id, pending.request.rounds
                                ));
                                let tx = tx.clone();
                                let client = client.clone();
                                runtime.spawn(async move {
                                    let outcome = pending.run(&client).await;
                                    let _ = tx.send(BackendEvent::Audit(outcome));
                                });
                            }
                        }
                        UiCommand::Continue => {}
                    }
                    self.view.normalize_focus(session);
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        self.finish()
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if self.raw_mode {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen)?;
        }
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl<B: Backend> Drop for Dashboard<B> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
