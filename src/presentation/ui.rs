use crate::application::{
    App, FormTarget, LoginField, MedicationField, Screen, SearchMapPage, VisibleSheet,
    WizardController,
};
use crate::domain::{
    AllergyCategory, BasicField, Hospital, HospitalStatus, Phase, SheetController, StepState,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

/// Logical pixels per terminal row, so pixel thresholds keep their meaning.
pub const ROW_PX: f64 = 16.0;

const HOSPITAL_SHEET_PERCENT: u16 = 80;
const CONNECTING_SHEET_PERCENT: u16 = 50;

/// Where a sheet sits on screen this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGeometry {
    pub area: Rect,
    /// Top border row; pressing here starts a drag.
    pub handle_row: u16,
    pub header_row: u16,
    /// First hospital row of the list.
    pub list_top: u16,
}

impl SheetGeometry {
    pub fn contains_x(&self, x: u16) -> bool {
        x >= self.area.x && x < self.area.x + self.area.width
    }

    /// Columns of the header taken by the expand/collapse chevron.
    pub fn is_chevron(&self, x: u16) -> bool {
        x + 6 >= self.area.x + self.area.width && self.contains_x(x)
    }
}

/// Splits the terminal into title bar, body and status bar.
pub fn screen_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Places a sheet covering `percent` of `body`, shifted down by its drag offset.
pub fn sheet_geometry(
    body: Rect,
    sheet: &SheetController,
    percent: u16,
    peek_px: f64,
) -> SheetGeometry {
    let share = (u32::from(body.height) * u32::from(percent) / 100) as u16;
    let rows = share.max(3).min(body.height);
    let offset_px = sheet.offset(rows as f64 * ROW_PX, peek_px);
    let offset_rows = ((offset_px / ROW_PX).round() as u16).min(rows.saturating_sub(1));
    let top = body.y + body.height - rows + offset_rows;
    SheetGeometry {
        area: Rect {
            x: body.x,
            y: top,
            width: body.width,
            height: rows - offset_rows,
        },
        handle_row: top,
        header_row: top + 1,
        list_top: top + 3,
    }
}

/// Geometry of whichever sheet is visible on the search map.
pub fn visible_sheet_geometry(
    app: &App,
    page: &SearchMapPage,
) -> Option<(VisibleSheet, SheetGeometry)> {
    let area = Rect::new(0, 0, app.viewport_width, app.viewport_height);
    let [_, body, _] = screen_chunks(area);
    let peek = app.config.sheet.peek_height_px;
    match page.visible_sheet() {
        VisibleSheet::None => None,
        VisibleSheet::Hospitals => Some((
            VisibleSheet::Hospitals,
            sheet_geometry(body, &page.hospital_sheet, HOSPITAL_SHEET_PERCENT, peek),
        )),
        VisibleSheet::Connecting => Some((
            VisibleSheet::Connecting,
            sheet_geometry(body, &page.connecting_sheet, CONNECTING_SHEET_PERCENT, peek),
        )),
    }
}

pub fn render_ui(f: &mut Frame, app: &App) {
    let [title, body, status] = screen_chunks(f.area());

    render_title(f, app, title);
    match app.screen {
        Screen::Login => render_login(f, app, body),
        Screen::Onboarding => {
            if let Some(wizard) = app.wizard.as_ref() {
                render_onboarding(f, app, wizard, body);
            }
        }
        Screen::SearchMap => {
            if let Some(page) = app.search.as_ref() {
                render_search_map(f, app, page, body);
            }
        }
        Screen::Profile => render_profile(f, app, body),
    }
    render_status_bar(f, app, status);
}

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let screen = match app.screen {
        Screen::Login => "Sign in",
        Screen::Onboarding => "Health profile",
        Screen::SearchMap => "Find an ER",
        Screen::Profile => "My profile",
    };
    let header = Paragraph::new(format!("kokcall - Emergency room finder | {screen}"))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn focused_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default()
    }
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("    {message}"),
        Style::default().fg(Color::Red),
    ))
}

fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let masked = "*".repeat(app.login.credentials.password.chars().count());
    let focus = app.login.focus;
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Email:    "),
            Span::styled(
                app.login.credentials.email.clone(),
                focused_style(focus == LoginField::Email),
            ),
        ]),
        Line::from(vec![
            Span::raw("Password: "),
            Span::styled(
                masked,
                focused_style(focus == LoginField::Password),
            ),
        ]),
    ];
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Sign in"));
    f.render_widget(form, area);

    if app.login.new_user_prompt {
        let popup = centered(area, 50, 5);
        f.render_widget(Clear, popup);
        let prompt = Paragraph::new(
            "No account found for these details.\nRegister as a new user? (y/n)",
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("New user")
                .style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(prompt, popup);
    }
}

fn render_onboarding(f: &mut Frame, app: &App, wizard: &WizardController, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    if let Some(progress) = wizard.step().progress() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(progress as f64 / 4.0)
            .label(format!("{progress}/4"));
        f.render_widget(gauge, chunks[0]);
    }

    let focused = app.focused_target();
    let errors = wizard.field_errors();
    let mut lines: Vec<Line> = Vec::new();

    match wizard.state() {
        StepState::Basic(form) => {
            for field in BasicField::ALL {
                let value = match field {
                    BasicField::Gender => form
                        .gender
                        .map_or("< choose >".to_string(), |g| format!("< {} >", g.label())),
                    _ => form.text(field).unwrap_or_default().to_string(),
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{:<28}", field.label())),
                    Span::styled(value, focused_style(focused == Some(FormTarget::Basic(field)))),
                ]));
                if let Some(message) = errors.get(field.key()) {
                    lines.push(error_line(message));
                }
            }
        }
        StepState::Allergy(Phase::Prompt) => {
            lines.push(Line::from("Do you have any allergies? (y/n)"));
        }
        StepState::Allergy(Phase::Form(form)) => {
            for category in AllergyCategory::ALL {
                lines.push(Line::from(Span::styled(
                    category.title(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for &item in category.items() {
                    let mark = if form.is_selected(item) { "[x]" } else { "[ ]" };
                    let target = FormTarget::AllergyItem(category, item);
                    lines.push(Line::from(Span::styled(
                        format!("  {mark} {item}"),
                        focused_style(focused == Some(target)),
                    )));
                }
                let mark = if form.is_other_selected(category) { "[x]" } else { "[ ]" };
                lines.push(Line::from(Span::styled(
                    format!("  {mark} Other"),
                    focused_style(focused == Some(FormTarget::AllergyOther(category))),
                )));
                if form.is_other_selected(category) {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", form.other_text(category)),
                        focused_style(focused == Some(FormTarget::AllergyOtherText(category))),
                    )));
                }
            }
            let general = form.general_other().map_or("[ ] Other allergy".to_string(), |text| {
                format!("Other allergy: {text}")
            });
            lines.push(Line::from(Span::styled(
                general,
                focused_style(focused == Some(FormTarget::GeneralOther)),
            )));
            if let Some(message) = errors.get("allergies") {
                lines.push(error_line(message));
            }
        }
        StepState::Medication(Phase::Prompt) => {
            lines.push(Line::from("Do you take any medication regularly? (y/n)"));
        }
        StepState::Medication(Phase::Form(form)) => {
            for (index, (key, row)) in form.rows.iter().enumerate() {
                lines.push(Line::from(format!("Medication {}", index + 1)));
                for field in MedicationField::ALL {
                    let value = match field {
                        MedicationField::Name => row.name.clone(),
                        MedicationField::Dosage => row.dosage.clone(),
                        MedicationField::Frequency => row
                            .frequency
                            .map_or("< choose >".to_string(), |q| format!("< {} >", q.label())),
                    };
                    let label = match field {
                        MedicationField::Name => "  Name",
                        MedicationField::Dosage => "  Dosage",
                        MedicationField::Frequency => "  Frequency",
                    };
                    lines.push(Line::from(vec![
                        Span::raw(format!("{label:<14}")),
                        Span::styled(
                            value,
                            focused_style(focused == Some(FormTarget::Medication(key, field))),
                        ),
                    ]));
                    let key = format!("medications.{index}.{}", field.key());
                    if let Some(message) = errors.get(&key) {
                        lines.push(error_line(message));
                    }
                }
            }
        }
        StepState::Disease(form) => {
            lines.push(Line::from("Do you have any underlying conditions? (y/n)"));
            if form.answer == Some(true) {
                for (index, (key, row)) in form.rows.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::raw(format!("  Condition {:<4}", index + 1)),
                        Span::styled(
                            row.name.clone(),
                            focused_style(focused == Some(FormTarget::Disease(key))),
                        ),
                    ]));
                    if let Some(message) = errors.get(&format!("diseases.{index}.name")) {
                        lines.push(error_line(message));
                    }
                }
            }
        }
        StepState::Complete => {
            lines.push(Line::from("Your health profile is saved."));
            lines.push(Line::from("Press Enter to find an emergency room."));
        }
    }

    let mut title = format!("Step: {}", wizard.step());
    if wizard.can_submit() {
        title.push_str(" (ready)");
    }
    let form = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(form, chunks[1]);
}

fn render_search_map(f: &mut Frame, app: &App, page: &SearchMapPage, area: Rect) {
    let mut lines = vec![
        Line::from(format!(
            "Symptoms ({}/{}):",
            page.symptom_len(),
            page.symptom_max_len()
        )),
        Line::from(Span::styled(
            format!("  {}", page.symptom),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("Patient (Tab to choose):"),
    ];
    for (index, person) in page.people.iter().enumerate() {
        let mark = if page.selected_person == Some(index) { "(*)" } else { "( )" };
        lines.push(Line::from(format!("  {mark} {} - {}", person.name, person.tags)));
    }
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Map"));
    f.render_widget(form, area);

    let Some((visible, geometry)) = visible_sheet_geometry(app, page) else {
        return;
    };
    f.render_widget(Clear, geometry.area);
    match visible {
        VisibleSheet::Hospitals => render_hospital_sheet(f, page, geometry),
        VisibleSheet::Connecting => render_connecting_sheet(f, page, geometry),
        VisibleSheet::None => {}
    }
}

fn hospital_line(page: &SearchMapPage, hospital: &Hospital, under_cursor: bool) -> Line<'static> {
    let badge = match page.selection.order_of(hospital.id) {
        Some(order) if page.selection.is_multi() => format!("[{order}]"),
        Some(_) => "[x]".to_string(),
        None => "[ ]".to_string(),
    };
    let status = match hospital.status {
        HospitalStatus::Available => format!(
            "beds {}/{} | ER {}",
            hospital.available_beds, hospital.total_beds, hospital.emergency_beds
        ),
        HospitalStatus::Full => "full".to_string(),
        HospitalStatus::Closed => "closed".to_string(),
    };
    let style = if under_cursor {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else if hospital.is_selectable() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(Span::styled(
        format!(
            "{badge} {} ({}) {} - {status}",
            hospital.name, hospital.distance, hospital.address
        ),
        style,
    ))
}

fn render_hospital_sheet(f: &mut Frame, page: &SearchMapPage, geometry: SheetGeometry) {
    let chevron = if page.hospital_sheet.is_minimized() { "[^]" } else { "[v]" };
    let mode = if page.selection.is_multi() { "multi" } else { "single" };
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Nearby emergency rooms", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                "{:>width$}",
                chevron,
                width = (geometry.area.width as usize).saturating_sub(26)
            )),
        ]),
        Line::from(format!(
            "{} of {} available | select: {mode}",
            page.available_count(),
            page.total_count()
        )),
    ];
    for (index, hospital) in page.displayed_hospitals().into_iter().enumerate() {
        lines.push(hospital_line(page, hospital, index == page.cursor));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from("━━━━").centered())
        .title_bottom(Line::from(format!(" {} (c) ", page.confirm_label())).centered())
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block), geometry.area);
}

fn render_connecting_sheet(f: &mut Frame, page: &SearchMapPage, geometry: SheetGeometry) {
    let count = page.last_request().map_or(0, |r| r.hospitals.len());
    let lines = vec![
        Line::from(Span::styled(
            "Connecting...",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Contacting {count} emergency room(s)")),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from("━━━━").centered())
        .style(Style::default().fg(Color::Yellow).bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block), geometry.area);
}

fn render_profile(f: &mut Frame, app: &App, area: Rect) {
    let Some(profile) = app.profile.as_ref() else {
        return;
    };
    let age = profile.age.map_or("-".to_string(), |a| a.to_string());
    let mut lines = vec![
        Line::from(Span::styled(
            profile.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Age {age} | {}", profile.gender.label())),
        Line::from(""),
        Line::from(format!("Allergies: {}", or_none(&profile.allergies.join(", ")))),
        Line::from("Medications:"),
    ];
    if profile.medications.is_empty() {
        lines.push(Line::from("  none"));
    }
    for medication in &profile.medications {
        lines.push(Line::from(format!(
            "  {} {} ({})",
            medication.name,
            medication.dosage,
            medication.frequency.label()
        )));
    }
    lines.push(Line::from(format!(
        "Conditions: {}",
        or_none(&profile.diseases.join(", "))
    )));
    let view = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(view, area);
}

fn or_none(text: &str) -> &str {
    if text.is_empty() { "none" } else { text }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let toast = app.search.as_ref().and_then(|page| page.toast());
    let text = if let Some(toast) = toast {
        toast.to_string()
    } else if let Some(ref status) = app.status_message {
        status.clone()
    } else {
        help_line(app).to_string()
    };
    let style = if toast.is_some() || app.status_message.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let bar = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(bar, area);
}

fn help_line(app: &App) -> &'static str {
    match app.screen {
        Screen::Login => "Tab: switch field | Enter: sign in | Esc: quit",
        Screen::Onboarding => match app.wizard.as_ref().map(|w| w.state()) {
            Some(StepState::Allergy(Phase::Prompt) | StepState::Medication(Phase::Prompt)) => {
                "y: yes | n: no | Esc: back"
            }
            Some(StepState::Disease(form)) if form.answer != Some(true) => {
                "y: yes | n: no | Esc: back"
            }
            Some(StepState::Complete) => "Enter: continue | Esc: back",
            _ => "↑↓: field | Space/←→: choose | Ctrl+A/D: add/del row | Enter: next | Esc: back",
        },
        Screen::SearchMap => match app.search.as_ref().map(|p| p.visible_sheet()) {
            Some(VisibleSheet::Hospitals) => {
                "↑↓: move | Space: select | v: multi-select | c: connect | m: collapse | Esc: close"
            }
            Some(VisibleSheet::Connecting) => "Connecting to the selected emergency rooms...",
            _ => "Type symptoms | Tab: patient | Enter: search | Ctrl+P: profile | Ctrl+Q: quit",
        },
        Screen::Profile => "l: log out | Esc: back to map",
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
