//! Application state for the terminal client.
//!
//! [`App`] owns the screen on display, the shared record store, and the page
//! state of whichever screen is showing. Leaving a screen drops its page
//! state; the search-map page cancels its timers on the way out.

use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Local;

use super::search::SearchMapPage;
use super::session::{self, Credentials, LoginOutcome, ProfileView};
use super::wizard::{BackOutcome, WizardController, WizardError};
use crate::domain::{
    AllergyCategory, BasicField, DomainError, Destination, Frequency, Phase, RowKey, StepState,
    WizardStep,
};
use crate::infrastructure::{Config, HospitalSource, MemoryStore, RecordStore, StaticHospitalSource};

/// The screen currently on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Onboarding,
    SearchMap,
    Profile,
}

impl From<Destination> for Screen {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Login => Screen::Login,
            Destination::Onboarding => Screen::Onboarding,
            Destination::SearchMap => Screen::SearchMap,
            Destination::Profile => Screen::Profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub credentials: Credentials,
    pub focus: LoginField,
    /// Set when no account matched and registration is being offered.
    pub new_user_prompt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicationField {
    Name,
    Dosage,
    Frequency,
}

impl MedicationField {
    pub const ALL: [MedicationField; 3] = [
        MedicationField::Name,
        MedicationField::Dosage,
        MedicationField::Frequency,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MedicationField::Name => "name",
            MedicationField::Dosage => "dosage",
            MedicationField::Frequency => "frequency",
        }
    }
}

/// One focusable element of the onboarding form on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Basic(BasicField),
    AllergyItem(AllergyCategory, &'static str),
    AllergyOther(AllergyCategory),
    AllergyOtherText(AllergyCategory),
    GeneralOther,
    Medication(RowKey, MedicationField),
    Disease(RowKey),
}

/// Lists the focusable elements of the wizard's current form, in display order.
pub fn form_targets(wizard: &WizardController) -> Vec<FormTarget> {
    match wizard.state() {
        StepState::Basic(_) => BasicField::ALL.into_iter().map(FormTarget::Basic).collect(),
        StepState::Allergy(Phase::Form(form)) => {
            let mut targets = Vec::new();
            for category in AllergyCategory::ALL {
                targets.extend(
                    category
                        .items()
                        .iter()
                        .copied()
                        .map(|item| FormTarget::AllergyItem(category, item)),
                );
                targets.push(FormTarget::AllergyOther(category));
                if form.is_other_selected(category) {
                    targets.push(FormTarget::AllergyOtherText(category));
                }
            }
            targets.push(FormTarget::GeneralOther);
            targets
        }
        StepState::Medication(Phase::Form(form)) => form
            .rows
            .iter()
            .flat_map(|(key, _)| {
                MedicationField::ALL
                    .into_iter()
                    .map(move |field| FormTarget::Medication(key, field))
            })
            .collect(),
        StepState::Disease(form) if form.answer == Some(true) => form
            .rows
            .iter()
            .map(|(key, _)| FormTarget::Disease(key))
            .collect(),
        _ => Vec::new(),
    }
}

/// Main application state.
///
/// # Examples
///
/// ```
/// use kokcall::application::{App, Screen};
///
/// let app = App::default();
/// assert_eq!(app.screen, Screen::Login);
/// assert!(!app.should_quit);
/// ```
pub struct App {
    pub screen: Screen,
    pub config: Config,
    pub login: LoginForm,
    pub wizard: Option<WizardController>,
    pub search: Option<SearchMapPage>,
    pub profile: Option<ProfileView>,
    /// Index into [`form_targets`] of the focused onboarding element
    pub form_focus: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Terminal size, refreshed by the event loop for mouse hit-testing
    pub viewport_width: u16,
    pub viewport_height: u16,
    pub should_quit: bool,
    store: Rc<dyn RecordStore>,
    hospitals: Box<dyn HospitalSource>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(
            Config::default(),
            Rc::new(MemoryStore::new()),
            Box::new(StaticHospitalSource),
        )
    }
}

impl App {
    /// Creates the app on the login screen.
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `store` - Record store shared with the onboarding wizard
    /// * `hospitals` - Source the search-map page loads its lists from
    pub fn new(
        config: Config,
        store: Rc<dyn RecordStore>,
        hospitals: Box<dyn HospitalSource>,
    ) -> Self {
        Self {
            screen: Screen::Login,
            config,
            login: LoginForm::default(),
            wizard: None,
            search: None,
            profile: None,
            form_focus: 0,
            status_message: None,
            viewport_width: 80,
            viewport_height: 24,
            should_quit: false,
            store,
            hospitals,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        &*self.store
    }

    /// Navigates to `destination`, tearing down the page being left.
    pub fn go_to(&mut self, destination: Destination) {
        if let Some(mut page) = self.search.take() {
            page.teardown();
        }
        self.wizard = None;
        self.profile = None;
        self.form_focus = 0;
        self.status_message = None;

        match destination {
            Destination::Login => self.login = LoginForm::default(),
            Destination::Onboarding => {
                self.wizard = Some(WizardController::new(Rc::clone(&self.store)));
            }
            Destination::SearchMap => {
                self.search = Some(SearchMapPage::new(&self.config, self.hospitals.as_ref()));
            }
            Destination::Profile => {
                self.profile = Some(ProfileView::load(&*self.store, Local::now().date_naive()));
            }
        }
        self.screen = destination.into();
        tracing::debug!(screen = ?self.screen, "navigated");
    }

    /// Fires due timers on the page on screen.
    pub fn tick(&mut self, now: Instant) {
        if let Some(page) = self.search.as_mut() {
            page.tick(now);
        }
    }

    /// How long the event loop may block before a timer needs servicing.
    pub fn next_deadline_in(&self, now: Instant) -> Option<Duration> {
        self.search.as_ref().and_then(|page| page.next_deadline_in(now))
    }

    pub fn login_field_mut(&mut self) -> &mut String {
        match self.login.focus {
            LoginField::Email => &mut self.login.credentials.email,
            LoginField::Password => &mut self.login.credentials.password,
        }
    }

    pub fn toggle_login_focus(&mut self) {
        self.login.focus = match self.login.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    /// Signs in, or offers registration when no account matches.
    pub fn submit_login(&mut self) {
        if !self.login.credentials.is_complete() {
            self.status_message = Some("Enter your email and password".to_string());
            return;
        }
        match session::login(&*self.store, &self.login.credentials) {
            Ok(LoginOutcome::SignedIn) => self.go_to(Destination::SearchMap),
            Ok(LoginOutcome::NewUser) => self.login.new_user_prompt = true,
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    /// Answers the registration offer. Accepting starts onboarding.
    pub fn answer_registration(&mut self, accept: bool) {
        self.login.new_user_prompt = false;
        if !accept {
            return;
        }
        match session::register(&*self.store, &self.login.credentials) {
            Ok(()) => self.go_to(Destination::Onboarding),
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    pub fn logout(&mut self) {
        match session::logout(&*self.store) {
            Ok(()) => self.go_to(Destination::Login),
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    pub fn focused_target(&self) -> Option<FormTarget> {
        let wizard = self.wizard.as_ref()?;
        form_targets(wizard).get(self.form_focus).copied()
    }

    pub fn move_focus(&mut self, down: bool) {
        let Some(wizard) = self.wizard.as_ref() else {
            return;
        };
        let len = form_targets(wizard).len();
        if len == 0 {
            self.form_focus = 0;
        } else if down {
            self.form_focus = (self.form_focus + 1).min(len - 1);
        } else {
            self.form_focus = self.form_focus.saturating_sub(1);
        }
    }

    /// Text buffer behind the focused element, if it takes typing.
    fn focused_text_mut(&mut self) -> Option<&mut String> {
        let target = self.focused_target()?;
        let wizard = self.wizard.as_mut()?;
        match target {
            FormTarget::Basic(field) => wizard.basic_form_mut()?.text_mut(field),
            FormTarget::AllergyOtherText(category) => {
                wizard.allergy_form_mut()?.other_text_mut(category)
            }
            FormTarget::GeneralOther => wizard.allergy_form_mut()?.general_other_mut(),
            FormTarget::Medication(key, MedicationField::Name) => {
                Some(&mut wizard.medication_form_mut()?.rows.get_mut(key)?.name)
            }
            FormTarget::Medication(key, MedicationField::Dosage) => {
                Some(&mut wizard.medication_form_mut()?.rows.get_mut(key)?.dosage)
            }
            FormTarget::Disease(key) => {
                Some(&mut wizard.disease_form_mut()?.rows.get_mut(key)?.name)
            }
            _ => None,
        }
    }

    pub fn type_char(&mut self, c: char) {
        if let Some(text) = self.focused_text_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text_mut() {
            text.pop();
        }
    }

    /// Space on the focused element: checks items, opens "other" fields,
    /// steps choices forward.
    pub fn activate_focused(&mut self) {
        let Some(target) = self.focused_target() else {
            return;
        };
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        match target {
            FormTarget::AllergyItem(_, item) => {
                if let Some(form) = wizard.allergy_form_mut() {
                    form.toggle_item(item);
                }
            }
            FormTarget::AllergyOther(category) => {
                if let Some(form) = wizard.allergy_form_mut() {
                    form.toggle_other(category);
                }
            }
            FormTarget::GeneralOther => {
                if let Some(form) = wizard.allergy_form_mut() {
                    form.open_general_other();
                }
            }
            FormTarget::Basic(BasicField::Gender)
            | FormTarget::Medication(_, MedicationField::Frequency) => {
                self.cycle_focused(true);
            }
            _ => {}
        }
    }

    /// Left/Right on a choice field.
    pub fn cycle_focused(&mut self, forward: bool) {
        let Some(target) = self.focused_target() else {
            return;
        };
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        match target {
            FormTarget::Basic(BasicField::Gender) => {
                if let Some(form) = wizard.basic_form_mut() {
                    form.toggle_gender();
                }
            }
            FormTarget::Medication(key, MedicationField::Frequency) => {
                if let Some(row) = wizard
                    .medication_form_mut()
                    .and_then(|form| form.rows.get_mut(key))
                {
                    row.frequency = Some(Frequency::cycle(row.frequency, forward));
                }
            }
            _ => {}
        }
    }

    /// Appends a blank medication or disease row and focuses it.
    pub fn add_row(&mut self) {
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        let key = if let Some(form) = wizard.medication_form_mut() {
            form.add_row()
        } else if let Some(form) = wizard.disease_form_mut().filter(|f| f.answer == Some(true)) {
            form.add_row()
        } else {
            return;
        };
        let targets = form_targets(wizard);
        if let Some(index) = targets.iter().position(|t| match t {
            FormTarget::Medication(k, _) | FormTarget::Disease(k) => *k == key,
            _ => false,
        }) {
            self.form_focus = index;
        }
    }

    /// Removes the row holding focus. Refusals land in the status bar.
    pub fn remove_focused_row(&mut self) {
        let Some(target) = self.focused_target() else {
            return;
        };
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        let result = match target {
            FormTarget::Medication(key, _) => {
                wizard.medication_form_mut().map(|f| f.remove_row(key))
            }
            FormTarget::Disease(key) => wizard.disease_form_mut().map(|f| f.remove_row(key)),
            _ => None,
        };
        if let Some(Err(err)) = result {
            self.status_message = Some(err.to_string());
        }
        let len = form_targets(wizard).len();
        self.form_focus = self.form_focus.min(len.saturating_sub(1));
    }

    /// Enter on the wizard. On the completion screen this moves on to the search map.
    pub fn wizard_submit(&mut self) {
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        if wizard.step() == WizardStep::Complete {
            self.go_to(Destination::SearchMap);
            return;
        }
        let before = (wizard.step(), wizard.shows_form());
        let result = wizard.submit();
        self.after_wizard_action(before, result);
    }

    pub fn wizard_choose(&mut self, yes: bool) {
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        let before = (wizard.step(), wizard.shows_form());
        let result = wizard.choose(yes);
        self.after_wizard_action(before, result);
    }

    pub fn wizard_back(&mut self) {
        let Some(wizard) = self.wizard.as_mut() else {
            return;
        };
        self.status_message = None;
        match wizard.back() {
            BackOutcome::Exit(destination) => self.go_to(destination),
            BackOutcome::Within(_) => self.form_focus = 0,
        }
    }

    fn after_wizard_action(
        &mut self,
        before: (WizardStep, bool),
        result: Result<WizardStep, WizardError>,
    ) {
        let after = self
            .wizard
            .as_ref()
            .map(|w| (w.step(), w.shows_form()));
        match result {
            Ok(_) => {
                self.status_message = None;
                if after != Some(before) {
                    self.form_focus = 0;
                }
            }
            Err(WizardError::Domain(DomainError::Validation(_))) => {
                self.status_message = Some("Please fix the highlighted fields".to_string());
            }
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }
}
