use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::stdout;

use crate::record::FieldId;
use crate::session::{FormSession, SubmitOutcome};

struct FormApp {
    session: FormSession,
    selected: usize,
    flash: Option<String>,
}

impl FormApp {
    fn new(session: FormSession) -> Self {
        Self { session, selected: 0, flash: None }
    }

    fn current_field(&self) -> FieldId {
        FieldId::ALL[self.selected]
    }

    fn next_field(&mut self) {
        self.session.on_blur(self.current_field());
        self.selected = (self.selected + 1) % FieldId::ALL.len();
    }

    fn prev_field(&mut self) {
        self.session.on_blur(self.current_field());
        self.selected =
            if self.selected == 0 { FieldId::ALL.len() - 1 } else { self.selected - 1 };
    }

    fn push_char(&mut self, c: char) {
        let field = self.current_field();
        if field.is_flag() {
            if c == ' ' {
                self.toggle_flag();
            }
            return;
        }
        let mut value = self.session.field_state(field).value;
        value.push(c);
        self.session.on_edit(field, &value);
    }

    fn pop_char(&mut self) {
        let field = self.current_field();
        if field.is_flag() {
            return;
        }
        let mut value = self.session.field_state(field).value;
        if value.pop().is_some() {
            self.session.on_edit(field, &value);
        }
    }

    fn toggle_flag(&mut self) {
        let field = self.current_field();
        let on = self.session.field_state(field).value == "true";
        self.session.on_edit(field, if on { "false" } else { "true" });
    }
}

pub fn run_form(session: FormSession) -> Result<()> {
    let mut app = FormApp::new(session);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut FormApp,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.flash = None;
            match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    submit(terminal, app)?;
                }
                KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.session.clear_submission_error();
                }
                KeyCode::Tab | KeyCode::Down | KeyCode::Enter => app.next_field(),
                KeyCode::BackTab | KeyCode::Up => app.prev_field(),
                KeyCode::Backspace => app.pop_char(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.push_char(c);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn submit(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut FormApp,
) -> Result<()> {
    // The trigger is disabled while an attempt is in flight.
    if app.session.is_submitting() {
        return Ok(());
    }

    // Paint the in-flight frame before the blocking handoff.
    app.flash = Some("Submitting...".to_string());
    terminal.draw(|frame| draw(frame, app))?;
    app.flash = None;

    match app.session.on_submit() {
        Ok(SubmitOutcome::Submitted(record)) => {
            app.flash = Some(format!(
                "Submitted application for {} at {}.",
                record.role_title, record.company_name
            ));
            app.selected = 0;
        }
        Ok(SubmitOutcome::Invalid(issues)) => {
            app.flash = Some(format!("{} field(s) need attention.", issues.len()));
        }
        Err(_) => {
            // the retained submission error renders as the banner
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &FormApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let width = chunks[0].width;
    let (body, selected_line) = build_form(app, width);

    // Keep the selected field and its error line in view.
    let inner_height = chunks[0].height.saturating_sub(2);
    let scroll =
        if selected_line + 2 > inner_height { selected_line + 2 - inner_height } else { 0 };

    let form = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(" Job Application "))
        .scroll((scroll, 0));
    frame.render_widget(form, chunks[0]);

    let help = Paragraph::new(
        " Tab/Enter:next  Shift-Tab:prev  Space:toggle  Ctrl-S:submit  Ctrl-E:dismiss  Esc:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);
}

fn build_form(app: &FormApp, width: u16) -> (Text<'static>, u16) {
    let mut lines: Vec<Line> = Vec::new();

    // Banner: a retained submission failure, or a transient flash message
    if let Some(error) = app.session.submission_error() {
        let banner = format!("Submission failed: {error}");
        for wrapped in textwrap::fill(&banner, width.saturating_sub(4).max(20) as usize).lines() {
            lines.push(Line::from(Span::styled(
                wrapped.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(""));
    } else if let Some(flash) = &app.flash {
        lines.push(Line::from(Span::styled(flash.clone(), Style::default().fg(Color::Green))));
        lines.push(Line::from(""));
    }

    let mut selected_line = 0;
    for (i, field) in FieldId::ALL.iter().enumerate() {
        let state = app.session.field_state(*field);
        let selected = i == app.selected;
        if selected {
            selected_line = lines.len() as u16;
        }

        let marker = if selected {
            "> "
        } else if state.touched {
            "* "
        } else {
            "  "
        };
        let shown = if field.is_flag() {
            let mark = if state.value == "true" { "x" } else { " " };
            format!("[{mark}]")
        } else if selected {
            format!("{}_", state.value)
        } else {
            state.value.clone()
        };

        let label_style = if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style =
            if state.invalid { Style::default().fg(Color::Red) } else { Style::default() };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<21}", format!("{}:", field.label())), label_style),
            Span::styled(shown, value_style),
        ]));

        if let Some(error) = state.error {
            lines.push(Line::from(Span::styled(
                format!("    {error}"),
                Style::default().fg(Color::Red),
            )));
        }
    }

    (Text::from(lines), selected_line)
}
