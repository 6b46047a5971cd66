use std::time::Instant;

use crate::application::{App, FormTarget, Screen, SearchMapPage, VisibleSheet};
use crate::domain::{Destination, Phase, StepState, TapOutcome, TouchPoint};
use crate::presentation::ui::{ROW_PX, visible_sheet_geometry};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// The mouse is a single pointer, so it always reports as touch point zero.
const MOUSE_POINTER: u64 = 0;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && matches!(key, KeyCode::Char('c' | 'q')) {
            app.should_quit = true;
            return;
        }
        match app.screen {
            Screen::Login => Self::handle_login(app, key),
            Screen::Onboarding => Self::handle_onboarding(app, key, modifiers),
            Screen::SearchMap => Self::handle_search_map(app, key, modifiers, Instant::now()),
            Screen::Profile => Self::handle_profile(app, key),
        }
    }

    fn handle_login(app: &mut App, key: KeyCode) {
        if app.login.new_user_prompt {
            match key {
                KeyCode::Char('y') | KeyCode::Enter => app.answer_registration(true),
                KeyCode::Char('n') | KeyCode::Esc => app.answer_registration(false),
                _ => {}
            }
            return;
        }
        app.status_message = None;
        match key {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                app.toggle_login_focus();
            }
            KeyCode::Enter => app.submit_login(),
            KeyCode::Esc => app.should_quit = true,
            KeyCode::Backspace => {
                app.login_field_mut().pop();
            }
            KeyCode::Char(c) => app.login_field_mut().push(c),
            _ => {}
        }
    }

    /// Whether the wizard is showing a yes/no question rather than a form.
    fn shows_prompt(app: &App) -> bool {
        match app.wizard.as_ref().map(|w| w.state()) {
            Some(StepState::Allergy(Phase::Prompt) | StepState::Medication(Phase::Prompt)) => true,
            Some(StepState::Disease(form)) => form.answer != Some(true),
            _ => false,
        }
    }

    fn handle_onboarding(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        let step_state_complete = matches!(
            app.wizard.as_ref().map(|w| w.state()),
            Some(StepState::Complete)
        );
        if step_state_complete {
            match key {
                KeyCode::Enter => app.wizard_submit(),
                KeyCode::Esc => app.wizard_back(),
                _ => {}
            }
            return;
        }

        if Self::shows_prompt(app) {
            match key {
                KeyCode::Char('y') => app.wizard_choose(true),
                KeyCode::Char('n') => app.wizard_choose(false),
                KeyCode::Esc => app.wizard_back(),
                _ => {}
            }
            return;
        }

        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('a') => app.add_row(),
                KeyCode::Char('d') => app.remove_focused_row(),
                // Disease answer can still be switched to "no" from its row list
                KeyCode::Char('n') => app.wizard_choose(false),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Up | KeyCode::BackTab => app.move_focus(false),
            KeyCode::Down | KeyCode::Tab => app.move_focus(true),
            KeyCode::Left => app.cycle_focused(false),
            KeyCode::Right => app.cycle_focused(true),
            KeyCode::Enter => app.wizard_submit(),
            KeyCode::Esc => app.wizard_back(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Char(' ') if Self::space_activates(app.focused_target()) => {
                app.activate_focused();
            }
            KeyCode::Char(c) => app.type_char(c),
            _ => {}
        }
    }

    fn space_activates(target: Option<FormTarget>) -> bool {
        use crate::application::MedicationField;
        use crate::domain::BasicField;
        matches!(
            target,
            Some(
                FormTarget::AllergyItem(..)
                    | FormTarget::AllergyOther(_)
                    | FormTarget::Basic(BasicField::Gender)
                    | FormTarget::Medication(_, MedicationField::Frequency)
            )
        )
    }

    fn handle_search_map(app: &mut App, key: KeyCode, modifiers: KeyModifiers, now: Instant) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('p') {
                app.go_to(Destination::Profile);
            }
            return;
        }
        let Some(page) = app.search.as_mut() else {
            return;
        };
        match page.visible_sheet() {
            VisibleSheet::None => Self::handle_symptom_form(page, key, now),
            VisibleSheet::Hospitals => Self::handle_hospital_sheet(page, key, now),
            VisibleSheet::Connecting => {
                if key == KeyCode::Char('m') {
                    page.connecting_sheet.toggle_minimized();
                }
            }
        }
    }

    fn handle_symptom_form(page: &mut SearchMapPage, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Enter => {
                page.search(now);
            }
            KeyCode::Tab => {
                let next = page
                    .selected_person
                    .map_or(0, |i| (i + 1) % page.people.len().max(1));
                page.select_person(next);
            }
            KeyCode::BackTab => {
                if let Some(current) = page.selected_person {
                    page.select_person(current);
                }
            }
            KeyCode::Backspace => page.pop_symptom(),
            KeyCode::Char(c) => {
                page.push_symptom(c);
            }
            _ => {}
        }
    }

    fn handle_hospital_sheet(page: &mut SearchMapPage, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => page.move_cursor(false),
            KeyCode::Down | KeyCode::Char('j') => page.move_cursor(true),
            KeyCode::Char(' ') | KeyCode::Enter => {
                page.toggle_at_cursor();
            }
            KeyCode::Char('v') => page.selection.toggle_mode(),
            KeyCode::Char('c') => {
                page.confirm(now);
            }
            KeyCode::Char('m') => page.hospital_sheet.toggle_minimized(),
            KeyCode::Esc => page.close_hospital_sheet(),
            _ => {}
        }
    }

    fn handle_profile(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('l') => app.logout(),
            KeyCode::Esc | KeyCode::Char('b') => app.go_to(Destination::SearchMap),
            _ => {}
        }
    }

    /// Routes mouse input to the visible sheet on the search map.
    ///
    /// Pressing the handle row starts a drag; the pointer's row times
    /// [`ROW_PX`] is its pixel position. Clicking the header expands a
    /// minimized sheet and otherwise reaches the chevron. Clicking a list
    /// row toggles that hospital.
    pub fn handle_mouse_event(app: &mut App, event: MouseEvent) {
        if app.screen != Screen::SearchMap {
            return;
        }
        let Some(page) = app.search.as_ref() else {
            return;
        };
        let Some((visible, geometry)) = visible_sheet_geometry(app, page) else {
            return;
        };
        let Some(page) = app.search.as_mut() else {
            return;
        };
        let sheet = match visible {
            VisibleSheet::Hospitals => &mut page.hospital_sheet,
            VisibleSheet::Connecting => &mut page.connecting_sheet,
            VisibleSheet::None => return,
        };
        let point = [TouchPoint::new(MOUSE_POINTER, f64::from(event.row) * ROW_PX)];

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if geometry.contains_x(event.column) => {
                if event.row == geometry.handle_row {
                    sheet.on_drag_start(&point);
                } else if event.row == geometry.header_row {
                    let consumed = sheet.on_header_tap() == TapOutcome::Consumed;
                    if !consumed
                        && visible == VisibleSheet::Hospitals
                        && geometry.is_chevron(event.column)
                    {
                        sheet.toggle_minimized();
                    }
                } else if visible == VisibleSheet::Hospitals
                    && !sheet.is_minimized()
                    && event.row >= geometry.list_top
                {
                    let index = usize::from(event.row - geometry.list_top);
                    if index < page.displayed_hospitals().len() {
                        page.cursor = index;
                        page.toggle_at_cursor();
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => sheet.on_drag_move(&point),
            MouseEventKind::Up(MouseButton::Left) => {
                sheet.on_drag_end();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::LoginField;
    use crate::domain::WizardStep;
    use crate::infrastructure::RecordKey;

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn mouse(app: &mut App, kind: MouseEventKind, column: u16, row: u16) {
        InputHandler::handle_mouse_event(
            app,
            MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            },
        );
    }

    fn app_with_open_sheet() -> App {
        let mut app = App::default();
        app.viewport_width = 80;
        app.viewport_height = 44;
        app.go_to(Destination::SearchMap);
        type_str(&mut app, "high fever");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.search.as_ref().map(|p| p.visible_sheet()),
            Some(VisibleSheet::Hospitals)
        );
        app
    }

    fn handle_row(app: &App) -> u16 {
        let page = app.search.as_ref().unwrap();
        visible_sheet_geometry(app, page).unwrap().1.handle_row
    }

    #[test]
    fn test_ctrl_q_quits() {
        let mut app = App::default();
        InputHandler::handle_key_event(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_login_typing_and_focus() {
        let mut app = App::default();
        type_str(&mut app, "kim@example.com");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.login.focus, LoginField::Password);
        type_str(&mut app, "pw");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.login.credentials.email, "kim@example.com");
        assert_eq!(app.login.credentials.password, "p");
    }

    #[test]
    fn test_new_user_prompt_accept() {
        let mut app = App::default();
        type_str(&mut app, "kim@example.com");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "pw");
        press(&mut app, KeyCode::Enter);
        assert!(app.login.new_user_prompt);

        // Typing is ignored while the prompt is up
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.login.credentials.password, "pw");

        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.screen, Screen::Onboarding);
        assert!(app.store().get(RecordKey::Session).unwrap().is_some());
    }

    #[test]
    fn test_onboarding_prompt_keys() {
        let mut app = App::default();
        app.go_to(Destination::Onboarding);
        {
            let form = app.wizard.as_mut().unwrap().basic_form_mut().unwrap();
            form.name = "Kim".to_string();
            form.birth_date = "1990-01-02".to_string();
            form.height = "170".to_string();
            form.weight = "60".to_string();
        }
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.as_ref().unwrap().step(), WizardStep::Allergy);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.wizard.as_ref().unwrap().step(), WizardStep::Medication);

        press(&mut app, KeyCode::Esc);
        let wizard = app.wizard.as_ref().unwrap();
        assert_eq!(wizard.step(), WizardStep::Allergy);
        assert!(!wizard.shows_form());
    }

    #[test]
    fn test_space_types_into_text_fields() {
        let mut app = App::default();
        app.go_to(Destination::Onboarding);
        type_str(&mut app, "Kim Sua");
        let form = app.wizard.as_mut().unwrap().basic_form_mut().unwrap();
        assert_eq!(form.name, "Kim Sua");
    }

    #[test]
    fn test_search_gate_toast() {
        let mut app = App::default();
        app.go_to(Destination::SearchMap);
        press(&mut app, KeyCode::Enter);
        let page = app.search.as_ref().unwrap();
        assert_eq!(page.toast(), Some(crate::application::SYMPTOM_REQUIRED));
        assert_eq!(page.visible_sheet(), VisibleSheet::None);
    }

    #[test]
    fn test_sheet_keys_select_and_confirm() {
        let mut app = app_with_open_sheet();
        press(&mut app, KeyCode::Char('v'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));

        let page = app.search.as_ref().unwrap();
        assert_eq!(page.last_request().unwrap().hospitals, vec![1, 2]);
        assert_eq!(page.visible_sheet(), VisibleSheet::Connecting);
    }

    #[test]
    fn test_chevron_key_toggles() {
        let mut app = app_with_open_sheet();
        press(&mut app, KeyCode::Char('m'));
        assert!(app.search.as_ref().unwrap().hospital_sheet.is_minimized());
        press(&mut app, KeyCode::Char('m'));
        assert!(!app.search.as_ref().unwrap().hospital_sheet.is_minimized());
    }

    #[test]
    fn test_mouse_drag_past_threshold_minimizes() {
        let mut app = app_with_open_sheet();
        let top = handle_row(&app);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 10, top);
        assert!(app.search.as_ref().unwrap().hospital_sheet.is_dragging());

        // Ten rows is 160px
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 10, top + 10);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), 10, top + 10);
        let sheet = &app.search.as_ref().unwrap().hospital_sheet;
        assert!(sheet.is_minimized());
        assert!(!sheet.is_dragging());
    }

    #[test]
    fn test_short_mouse_drag_snaps_back() {
        let mut app = app_with_open_sheet();
        let top = handle_row(&app);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 10, top);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 10, top + 9);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), 10, top + 9);
        assert!(!app.search.as_ref().unwrap().hospital_sheet.is_minimized());
    }

    #[test]
    fn test_header_click_expands_without_reaching_chevron() {
        let mut app = app_with_open_sheet();
        press(&mut app, KeyCode::Char('m'));
        let page = app.search.as_ref().unwrap();
        let geometry = visible_sheet_geometry(&app, page).unwrap().1;

        mouse(
            &mut app,
            MouseEventKind::Down(MouseButton::Left),
            geometry.area.width - 2,
            geometry.header_row,
        );
        assert!(!app.search.as_ref().unwrap().hospital_sheet.is_minimized());
    }

    #[test]
    fn test_header_click_on_chevron_collapses_expanded_sheet() {
        let mut app = app_with_open_sheet();
        let page = app.search.as_ref().unwrap();
        let geometry = visible_sheet_geometry(&app, page).unwrap().1;

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 5, geometry.header_row);
        assert!(!app.search.as_ref().unwrap().hospital_sheet.is_minimized());

        mouse(
            &mut app,
            MouseEventKind::Down(MouseButton::Left),
            geometry.area.width - 2,
            geometry.header_row,
        );
        assert!(app.search.as_ref().unwrap().hospital_sheet.is_minimized());
    }

    #[test]
    fn test_click_on_list_row_toggles_hospital() {
        let mut app = app_with_open_sheet();
        let page = app.search.as_ref().unwrap();
        let geometry = visible_sheet_geometry(&app, page).unwrap().1;

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 5, geometry.list_top + 2);
        assert_eq!(app.search.as_ref().unwrap().selection.selected(), &[3]);
    }

    #[test]
    fn test_profile_logout_key() {
        let mut app = App::default();
        app.go_to(Destination::Profile);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.screen, Screen::Login);
    }
}
