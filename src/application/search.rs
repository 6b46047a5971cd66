//! The search-map page: symptom form, hospital sheet and connecting sheet.
//!
//! Exactly one of the two sheets is visible at a time. Each owns its own
//! [`SheetController`]. The page's timers are cancelled by [`SearchMapPage::teardown`].

use std::time::{Duration, Instant};

use crate::application::timers::{TimerKind, ViewTimers};
use crate::domain::{
    ConnectionRequest, Hospital, HospitalId, PersonProfile, SelectionController, SheetController,
};
use crate::infrastructure::{Config, HospitalSource, people};

pub const SYMPTOM_REQUIRED: &str = "Please describe the symptoms";
pub const PATIENT_REQUIRED: &str = "Please select a patient";

/// Which sheet, if any, covers the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleSheet {
    None,
    Hospitals,
    Connecting,
}

#[derive(Debug)]
pub struct SearchMapPage {
    pub symptom: String,
    pub people: Vec<PersonProfile>,
    pub selected_person: Option<usize>,
    pub hospital_sheet: SheetController,
    pub connecting_sheet: SheetController,
    pub selection: SelectionController,
    /// Row under the list cursor, indexing [`SearchMapPage::displayed_hospitals`].
    pub cursor: usize,
    available: Vec<Hospital>,
    unavailable: Vec<Hospital>,
    show_hospital_sheet: bool,
    is_connecting: bool,
    has_completed_call: bool,
    last_request: Option<ConnectionRequest>,
    toast: Option<String>,
    timers: ViewTimers,
    symptom_max_len: usize,
    connection_delay: Duration,
    toast_delay: Duration,
}

impl SearchMapPage {
    /// Creates the page, loading both hospital groups from `source`.
    ///
    /// A failing source leaves that group empty.
    pub fn new(config: &Config, source: &dyn HospitalSource) -> Self {
        let available = source.available().unwrap_or_else(|err| {
            tracing::warn!(%err, "could not load available hospitals");
            Vec::new()
        });
        let unavailable = source.unavailable().unwrap_or_else(|err| {
            tracing::warn!(%err, "could not load unavailable hospitals");
            Vec::new()
        });
        let threshold = config.sheet.minimize_threshold_px;

        Self {
            symptom: String::new(),
            people: people(),
            selected_person: None,
            hospital_sheet: SheetController::new(threshold),
            connecting_sheet: SheetController::new(threshold),
            selection: SelectionController::default(),
            cursor: 0,
            available,
            unavailable,
            show_hospital_sheet: false,
            is_connecting: false,
            has_completed_call: false,
            last_request: None,
            toast: None,
            timers: ViewTimers::default(),
            symptom_max_len: config.search.symptom_max_len,
            connection_delay: config.timers.connection_delay(),
            toast_delay: config.timers.toast_dismiss(),
        }
    }

    /// Appends to the symptom text. Input past the length limit is refused.
    pub fn push_symptom(&mut self, c: char) -> bool {
        if self.symptom.chars().count() >= self.symptom_max_len {
            return false;
        }
        self.symptom.push(c);
        true
    }

    pub fn pop_symptom(&mut self) {
        self.symptom.pop();
    }

    pub fn symptom_len(&self) -> usize {
        self.symptom.chars().count()
    }

    pub fn symptom_max_len(&self) -> usize {
        self.symptom_max_len
    }

    /// Picks a person, or clears the pick when the same person is chosen again.
    pub fn select_person(&mut self, index: usize) {
        if index >= self.people.len() {
            return;
        }
        self.selected_person = if self.selected_person == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// Opens the hospital sheet once the symptom and patient are filled in.
    pub fn search(&mut self, now: Instant) -> bool {
        if self.symptom.trim().is_empty() {
            self.show_toast(SYMPTOM_REQUIRED, now);
            return false;
        }
        if self.selected_person.is_none() {
            self.show_toast(PATIENT_REQUIRED, now);
            return false;
        }
        self.hospital_sheet.reset();
        self.show_hospital_sheet = true;
        self.cursor = 0;
        tracing::debug!("hospital sheet opened");
        true
    }

    pub fn close_hospital_sheet(&mut self) {
        self.show_hospital_sheet = false;
    }

    /// Sends the current selection and shows the connecting sheet.
    ///
    /// While a request is pending further confirms are ignored and the
    /// completion timer is not restarted.
    pub fn confirm(&mut self, now: Instant) -> Option<ConnectionRequest> {
        if self.timers.is_pending(TimerKind::ConnectionComplete) {
            tracing::info!("connection already pending, ignoring confirm");
            return None;
        }
        let request = self.selection.confirm();
        tracing::info!(count = request.hospitals.len(), "connection requested");

        self.connecting_sheet.reset();
        self.is_connecting = true;
        self.timers
            .schedule(TimerKind::ConnectionComplete, now, self.connection_delay);
        self.last_request = Some(request.clone());
        Some(request)
    }

    /// Fires every timer that is due.
    pub fn tick(&mut self, now: Instant) {
        for kind in self.timers.take_due(now) {
            match kind {
                TimerKind::ConnectionComplete => {
                    self.is_connecting = false;
                    self.has_completed_call = true;
                    tracing::info!("connection completed");
                }
                TimerKind::ToastDismiss => self.toast = None,
            }
        }
    }

    pub fn next_deadline_in(&self, now: Instant) -> Option<Duration> {
        self.timers.next_deadline_in(now)
    }

    /// Cancels pending timers before the page goes away.
    pub fn teardown(&mut self) {
        self.timers.cancel_all();
    }

    pub fn visible_sheet(&self) -> VisibleSheet {
        if self.is_connecting {
            VisibleSheet::Connecting
        } else if self.show_hospital_sheet {
            VisibleSheet::Hospitals
        } else {
            VisibleSheet::None
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.is_connecting
    }

    pub fn has_completed_call(&self) -> bool {
        self.has_completed_call
    }

    pub fn last_request(&self) -> Option<&ConnectionRequest> {
        self.last_request.as_ref()
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_deref()
    }

    pub fn available(&self) -> &[Hospital] {
        &self.available
    }

    /// Hospitals in list order; the unavailable group only after a completed call.
    pub fn displayed_hospitals(&self) -> Vec<&Hospital> {
        let unavailable = self
            .unavailable
            .iter()
            .filter(|_| self.has_completed_call);
        self.available.iter().chain(unavailable).collect()
    }

    pub fn available_count(&self) -> usize {
        self.available.iter().filter(|h| h.has_open_beds()).count()
    }

    pub fn total_count(&self) -> usize {
        if self.has_completed_call {
            self.available.len() + self.unavailable.len()
        } else {
            self.available.len()
        }
    }

    pub fn confirm_label(&self) -> String {
        match self.selection.selected().len() {
            0 => "Request connection".to_string(),
            n => format!("Request connection ({n})"),
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.displayed_hospitals().len();
        if len == 0 {
            self.cursor = 0;
        } else if down {
            self.cursor = (self.cursor + 1).min(len - 1);
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Toggles the hospital under the cursor.
    pub fn toggle_at_cursor(&mut self) -> bool {
        let Some(id) = self.displayed_hospitals().get(self.cursor).map(|h| h.id) else {
            return false;
        };
        self.toggle(id)
    }

    pub fn toggle(&mut self, id: HospitalId) -> bool {
        let hospitals: Vec<Hospital> = self.displayed_hospitals().into_iter().cloned().collect();
        self.selection.toggle(id, &hospitals)
    }

    fn show_toast(&mut self, message: &str, now: Instant) {
        self.toast = Some(message.to_string());
        self.timers
            .schedule(TimerKind::ToastDismiss, now, self.toast_delay);
    }
}
