use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use rand::Rng;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::collections::{HashMap, HashSet};
use std::{io, time::Duration, time::Instant};
use tui_input::{backend::crossterm::EventHandler, Input};

use outreach::models::{Severity, ToastMessage, TOAST_DURATION_MS};
use outreach::theme::Theme;
use outreach::validation::{validate_field, FieldError, FieldKind, ValidationResult};

// Export types needed by the main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// How long the success banner stays up, matching the toast duration.
const BANNER_DURATION_MS: i64 = 5000;

/// Number of confetti particles spawned per delivered submission.
const CONFETTI_COUNT: usize = 50;

/// Events the UI hands back to the main loop.
#[derive(Debug)]
pub enum UiEvent {
    Submit {
        name: String,
        email: String,
        message: String,
    },
    ToggleTheme,
    SubscribeNewsletter {
        email: String,
    },
    Quit,
}

pub struct FormUI {
    name_input: Input,
    email_input: Input,
    message_input: Input,
    focus: FieldKind,
    field_errors: HashMap<FieldKind, String>,
    submitting: bool,
    toast: Option<ActiveToast>,
    success_banner_until: Option<DateTime<Utc>>,
    newsletter_dialog: Option<NewsletterDialog>,
    confetti: Vec<ConfettiParticle>,
    last_tick: Instant,
    last_size: (u16, u16),
    theme: Theme,
    focus_seen: HashSet<FieldKind>,
}

struct ActiveToast {
    message: ToastMessage,
    shown_at: DateTime<Utc>,
}

struct NewsletterDialog {
    input: Input,
    subscribing: bool,
}

struct ConfettiParticle {
    x: u16,
    y: f32,
    speed: f32,
    color: Color,
    symbol: char,
}

/// The colors a theme resolves to.
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    error: Color,
    success: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            bg: Color::White,
            fg: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Blue,
            error: Color::Red,
            success: Color::Green,
        },
        Theme::Dark => Palette {
            bg: Color::Black,
            fg: Color::Gray,
            muted: Color::DarkGray,
            accent: Color::Cyan,
            error: Color::LightRed,
            success: Color::LightGreen,
        },
    }
}

impl FormUI {
    pub fn new(theme: Theme) -> Self {
        FormUI {
            name_input: Input::default(),
            email_input: Input::default(),
            message_input: Input::default(),
            focus: FieldKind::Name,
            field_errors: HashMap::new(),
            submitting: false,
            toast: None,
            success_banner_until: None,
            newsletter_dialog: None,
            confetti: Vec::new(),
            last_tick: Instant::now(),
            last_size: (80, 24),
            theme,
            focus_seen: HashSet::new(),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Replace any visible toast with a new one, restarting the dismiss
    /// timer.
    pub fn show_toast(&mut self, message: ToastMessage) {
        self.toast = Some(ActiveToast {
            message,
            shown_at: Utc::now(),
        });
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    fn has_toast(&self) -> bool {
        self.toast.is_some()
    }

    fn input_for(&mut self, kind: FieldKind) -> &mut Input {
        match kind {
            FieldKind::Name => &mut self.name_input,
            FieldKind::Email => &mut self.email_input,
            FieldKind::Message => &mut self.message_input,
        }
    }

    fn value_of(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Name => self.name_input.value(),
            FieldKind::Email => self.email_input.value(),
            FieldKind::Message => self.message_input.value(),
        }
    }

    /// Re-validate one field and update its inline error slot.
    fn revalidate(&mut self, kind: FieldKind) {
        match validate_field(kind, self.value_of(kind)) {
            ValidationResult::Valid => {
                self.field_errors.remove(&kind);
            }
            ValidationResult::Invalid(msg) => {
                self.field_errors.insert(kind, msg);
            }
        }
    }

    /// Validate everything the way a submit would, filling the inline
    /// slots. Returns true when the form may be submitted.
    fn revalidate_all(&mut self) -> bool {
        for kind in [FieldKind::Name, FieldKind::Email, FieldKind::Message] {
            self.revalidate(kind);
        }
        self.field_errors.is_empty()
    }

    fn move_focus(&mut self, forward: bool) {
        // Leaving a field counts as blur, so validate it on the way out
        self.revalidate(self.focus);

        let order = [FieldKind::Name, FieldKind::Email, FieldKind::Message];
        let idx = order.iter().position(|k| *k == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % order.len()
        } else {
            (idx + order.len() - 1) % order.len()
        };
        self.focus = order[next];

        // First focus of a field is worth a trace for form analytics
        if self.focus_seen.insert(self.focus) {
            debug!("User focused the {} field", self.focus.label());
        }
    }

    /// Record validation failures reported back from an attempted
    /// submission into the inline slots.
    pub fn apply_field_errors(&mut self, errors: &[FieldError]) {
        for err in errors {
            self.field_errors.insert(err.field, err.message.clone());
        }
    }

    /// A submission was delivered: clear the form, raise the banner, drop
    /// the confetti.
    pub fn submission_succeeded(&mut self) {
        self.name_input = Input::default();
        self.email_input = Input::default();
        self.message_input = Input::default();
        self.field_errors.clear();
        self.focus = FieldKind::Name;
        self.success_banner_until =
            Some(Utc::now() + chrono::Duration::milliseconds(BANNER_DURATION_MS));
        self.spawn_confetti();
    }

    /// Close the newsletter dialog after the subscribe call finishes.
    pub fn newsletter_finished(&mut self) {
        self.newsletter_dialog = None;
    }

    fn spawn_confetti(&mut self) {
        let (width, _) = self.last_size;
        let mut rng = rand::thread_rng();

        for _ in 0..CONFETTI_COUNT {
            self.confetti.push(ConfettiParticle {
                x: rng.gen_range(0..width.max(1)),
                // Stagger the entry so the fall reads as a shower
                y: -(rng.gen_range(0.0..10.0)),
                speed: rng.gen_range(8.0..20.0),
                color: CONFETTI_COLORS[rng.gen_range(0..CONFETTI_COLORS.len())],
                symbol: if rng.gen_bool(0.5) { '●' } else { '■' },
            });
        }
    }

    /// Advance time-driven state: toast expiry, banner expiry, confetti.
    pub fn tick(&mut self) {
        let now = Utc::now();

        if let Some(toast) = &self.toast {
            if (now - toast.shown_at).num_milliseconds() > TOAST_DURATION_MS {
                self.toast = None;
            }
        }

        if let Some(until) = self.success_banner_until {
            if now > until {
                self.success_banner_until = None;
            }
        }

        let dt = self.last_tick.elapsed().as_secs_f32();
        self.last_tick = Instant::now();

        let (_, height) = self.last_size;
        for particle in &mut self.confetti {
            particle.y += particle.speed * dt;
        }
        self.confetti.retain(|p| p.y < height as f32);
    }

    pub fn handle_input(&mut self) -> Result<Option<UiEvent>> {
        // The newsletter dialog is modal while open
        if let Some(dialog) = &self.newsletter_dialog {
            if event::poll(Duration::from_millis(10))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Esc => {
                                self.newsletter_dialog = None;
                                return Ok(None);
                            }
                            KeyCode::Enter => {
                                if dialog.subscribing {
                                    // Ignore until the pending call resolves
                                    return Ok(None);
                                }

                                let email = dialog.input.value().trim().to_string();
                                if email.is_empty() {
                                    self.show_toast(ToastMessage::new(
                                        "Please enter your email address",
                                        Severity::Error,
                                    ));
                                    return Ok(None);
                                }
                                if !validate_field(FieldKind::Email, &email).is_valid() {
                                    self.show_toast(ToastMessage::new(
                                        "Please enter a valid email address",
                                        Severity::Error,
                                    ));
                                    return Ok(None);
                                }

                                if let Some(dialog) = &mut self.newsletter_dialog {
                                    dialog.subscribing = true;
                                }
                                return Ok(Some(UiEvent::SubscribeNewsletter { email }));
                            }
                            _ => {
                                if !dialog.subscribing {
                                    let mut new_input = dialog.input.clone();
                                    new_input.handle_event(&Event::Key(key));
                                    self.newsletter_dialog = Some(NewsletterDialog {
                                        input: new_input,
                                        subscribing: false,
                                    });
                                }
                            }
                        }
                    }
                }
            }
            return Ok(None);
        }

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => {
                            // Escape dismisses a visible toast before it quits
                            if self.has_toast() {
                                self.dismiss_toast();
                                return Ok(None);
                            }
                            return Ok(Some(UiEvent::Quit));
                        }
                        KeyCode::Tab => {
                            self.move_focus(true);
                        }
                        KeyCode::BackTab => {
                            self.move_focus(false);
                        }
                        KeyCode::Enter => {
                            if self.submitting {
                                // Submit control is disabled while in flight
                                return Ok(None);
                            }

                            if !self.revalidate_all() {
                                self.show_toast(ToastMessage::new(
                                    "Please correct the errors in the form.",
                                    Severity::Error,
                                ));
                                return Ok(None);
                            }

                            info!("UI: submitting contact form");
                            return Ok(Some(UiEvent::Submit {
                                name: self.name_input.value().to_string(),
                                email: self.email_input.value().to_string(),
                                message: self.message_input.value().to_string(),
                            }));
                        }
                        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(Some(UiEvent::ToggleTheme));
                        }
                        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            self.newsletter_dialog = Some(NewsletterDialog {
                                input: Input::default(),
                                subscribing: false,
                            });
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(Some(UiEvent::Quit));
                        }
                        _ => {
                            let focus = self.focus;
                            self.input_for(focus).handle_event(&Event::Key(key));
                            // Live validation on every keystroke
                            self.revalidate(focus);
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    pub fn draw<B: Backend>(&mut self, frame: &mut Frame<B>) {
        let size = frame.size();
        self.last_size = (size.width, size.height);
        let colors = palette(self.theme);

        let background = Block::default().style(Style::default().bg(colors.bg).fg(colors.fg));
        frame.render_widget(background, size);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Name field
                Constraint::Length(1), // Name error slot
                Constraint::Length(3), // Email field
                Constraint::Length(1), // Email error slot
                Constraint::Min(5),    // Message field
                Constraint::Length(1), // Message error slot
                Constraint::Length(3), // Submit control / banner
                Constraint::Length(1), // Help line
            ])
            .split(size);

        let title = Paragraph::new("Get in touch")
            .style(Style::default().fg(colors.accent).add_modifier(Modifier::BOLD));
        frame.render_widget(title, chunks[0]);

        self.draw_field(frame, FieldKind::Name, &self.name_input, chunks[1], chunks[2], &colors);
        self.draw_field(frame, FieldKind::Email, &self.email_input, chunks[3], chunks[4], &colors);
        self.draw_field(
            frame,
            FieldKind::Message,
            &self.message_input,
            chunks[5],
            chunks[6],
            &colors,
        );

        self.draw_submit_area(frame, chunks[7], &colors);

        let theme_name = self.theme.name();
        let help = Paragraph::new(format!(
            "ESC quit | TAB next field | Enter send | Ctrl+T theme [{}] | Ctrl+N newsletter",
            theme_name
        ))
        .style(Style::default().fg(colors.muted));
        frame.render_widget(help, chunks[8]);

        // Cursor tracks the focused field unless a dialog owns it
        if self.newsletter_dialog.is_none() {
            let (field_area, input) = match self.focus {
                FieldKind::Name => (chunks[1], &self.name_input),
                FieldKind::Email => (chunks[3], &self.email_input),
                FieldKind::Message => (chunks[5], &self.message_input),
            };
            frame.set_cursor(
                field_area.x + input.cursor() as u16 + 1,
                field_area.y + 1,
            );
        }

        for particle in &self.confetti {
            let y = particle.y as i32;
            if y >= 0 && (y as u16) < size.height && particle.x < size.width {
                let cell = Rect::new(particle.x, y as u16, 1, 1);
                let dot = Paragraph::new(particle.symbol.to_string())
                    .style(Style::default().fg(particle.color));
                frame.render_widget(dot, cell);
            }
        }

        if let Some(dialog) = &self.newsletter_dialog {
            draw_newsletter_dialog(frame, dialog, size, &colors);
        }

        if let Some(toast) = &self.toast {
            draw_toast(frame, &toast.message, size, &colors);
        }
    }

    fn draw_field<B: Backend>(
        &self,
        frame: &mut Frame<B>,
        kind: FieldKind,
        input: &Input,
        field_area: Rect,
        error_area: Rect,
        colors: &Palette,
    ) {
        let error = self.field_errors.get(&kind);

        let border_style = if error.is_some() {
            Style::default().fg(colors.error)
        } else if self.focus == kind {
            Style::default().fg(colors.accent)
        } else {
            Style::default().fg(colors.muted)
        };

        let block = Block::default()
            .title(kind.label())
            .borders(Borders::ALL)
            .border_style(border_style);

        let widget = Paragraph::new(input.value())
            .block(block)
            .style(Style::default().fg(colors.fg));
        frame.render_widget(widget, field_area);

        if let Some(message) = error {
            let error_line = Paragraph::new(format!(" {}", message))
                .style(Style::default().fg(colors.error));
            frame.render_widget(error_line, error_area);
        }
    }

    fn draw_submit_area<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, colors: &Palette) {
        let (text, style) = if self.success_banner_until.is_some() {
            (
                "Thanks for reaching out! Your message is on its way.".to_string(),
                Style::default().fg(colors.success).add_modifier(Modifier::BOLD),
            )
        } else if self.submitting {
            (
                "Sending…".to_string(),
                Style::default().fg(colors.muted).add_modifier(Modifier::DIM),
            )
        } else {
            (
                "Press Enter to send".to_string(),
                Style::default().fg(colors.accent),
            )
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.muted));
        let widget = Paragraph::new(text).block(block).style(style);
        frame.render_widget(widget, area);
    }
}

// Accent colors the confetti particles cycle through.
const CONFETTI_COLORS: [Color; 5] = [
    Color::Rgb(37, 99, 235),
    Color::Rgb(124, 58, 237),
    Color::Rgb(236, 72, 153),
    Color::Rgb(16, 185, 129),
    Color::Rgb(245, 158, 11),
];

fn draw_toast<B: Backend>(
    frame: &mut Frame<B>,
    message: &ToastMessage,
    area: Rect,
    colors: &Palette,
) {
    let (title, color) = match message.severity {
        Severity::Success => ("Success", colors.success),
        Severity::Error => ("Error", colors.error),
        Severity::Info => ("Info", colors.accent),
        Severity::Warning => ("Warning", Color::Yellow),
    };

    let popup_width = area.width.saturating_sub(4).min(44);
    if popup_width < 10 || area.height < 5 {
        return;
    }
    let wrapped = textwrap::wrap(&message.text, popup_width.saturating_sub(4) as usize);
    let popup_height = (wrapped.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_x = area.width.saturating_sub(popup_width + 2);
    let popup_area = Rect::new(popup_x, 1, popup_width, popup_height);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let text: Vec<Line> = wrapped
        .iter()
        .map(|line| Line::from(line.to_string()))
        .collect();

    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(colors.fg).bg(colors.bg)),
        popup_area,
    );
}

fn draw_newsletter_dialog<B: Backend>(
    frame: &mut Frame<B>,
    dialog: &NewsletterDialog,
    area: Rect,
    colors: &Palette,
) {
    let popup_width = area.width.saturating_sub(4).min(50);
    let popup_height = 5;
    if popup_width < 10 || area.height < popup_height {
        return;
    }
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    let block = Block::default()
        .title("Newsletter signup")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(block, popup_area);

    let inner = popup_area.inner(&Margin {
        vertical: 1,
        horizontal: 2,
    });

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let input_line = Paragraph::new(dialog.input.value())
        .style(Style::default().fg(colors.fg));
    frame.render_widget(input_line, rows[0]);

    let hint = if dialog.subscribing {
        "Subscribing…"
    } else {
        "Enter subscribe | Esc cancel"
    };
    let hint_line = Paragraph::new(hint)
        .style(Style::default().fg(colors.muted))
        .wrap(Wrap { trim: true });
    frame.render_widget(hint_line, rows[2]);

    if !dialog.subscribing {
        frame.set_cursor(rows[0].x + dialog.input.cursor() as u16, rows[0].y);
    }
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
