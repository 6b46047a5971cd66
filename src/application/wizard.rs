//! Onboarding wizard controller.
//!
//! Sequences the four data-collection steps, owns the per-step sub-state and
//! the accumulated answers, and writes the merged record to the record store
//! when the wizard reaches completion.

use std::rc::Rc;

use serde_json::Value;

use crate::domain::{
    AllergyAnswers, AllergyForm, BasicAnswers, BasicInfoForm, Destination, DiseaseAnswers,
    DiseaseForm, DomainError, FieldErrors, MedicationAnswers, MedicationForm, OnboardingBuilder,
    Phase, StepState, Validate, WizardStep,
};
use crate::infrastructure::{RecordKey, RecordStore, StoreError, merge_record};

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("failed to save onboarding answers: {0}")]
    Store(#[from] StoreError),
}

/// Where a back action led.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// The wizard is still showing; this is the step now on screen.
    Within(WizardStep),
    /// The user left the wizard; the caller navigates here.
    Exit(Destination),
}

/// Drives the onboarding flow `basic → allergy → medication → disease → complete`.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use kokcall::application::WizardController;
/// use kokcall::domain::WizardStep;
/// use kokcall::infrastructure::MemoryStore;
///
/// let wizard = WizardController::new(Rc::new(MemoryStore::new()));
/// assert_eq!(wizard.step(), WizardStep::Basic);
/// assert!(!wizard.can_submit());
/// ```
pub struct WizardController {
    state: StepState,
    builder: OnboardingBuilder,
    store: Rc<dyn RecordStore>,
    field_errors: FieldErrors,
}

impl WizardController {
    pub fn new(store: Rc<dyn RecordStore>) -> Self {
        Self {
            state: StepState::Basic(BasicInfoForm::default()),
            builder: OnboardingBuilder::default(),
            store,
            field_errors: FieldErrors::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    /// The prompt/form flag of the allergy and medication steps.
    pub fn shows_form(&self) -> bool {
        self.state.shows_form()
    }

    pub fn answers(&self) -> &OnboardingBuilder {
        &self.builder
    }

    /// Errors from the last rejected submission, cleared on every step change.
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn basic_form_mut(&mut self) -> Option<&mut BasicInfoForm> {
        match &mut self.state {
            StepState::Basic(form) => Some(form),
            _ => None,
        }
    }

    pub fn allergy_form_mut(&mut self) -> Option<&mut AllergyForm> {
        match &mut self.state {
            StepState::Allergy(Phase::Form(form)) => Some(form),
            _ => None,
        }
    }

    pub fn medication_form_mut(&mut self) -> Option<&mut MedicationForm> {
        match &mut self.state {
            StepState::Medication(Phase::Form(form)) => Some(form),
            _ => None,
        }
    }

    pub fn disease_form_mut(&mut self) -> Option<&mut DiseaseForm> {
        match &mut self.state {
            StepState::Disease(form) => Some(form),
            _ => None,
        }
    }

    /// Whether the forward action is enabled for the form on screen.
    ///
    /// Yes/no prompts have no forward action; the disease step needs a "yes"
    /// with valid rows since "no" submits on its own.
    pub fn can_submit(&self) -> bool {
        match &self.state {
            StepState::Basic(form) => form.is_valid(),
            StepState::Allergy(Phase::Form(form)) => form.is_valid(),
            StepState::Medication(Phase::Form(form)) => form.is_valid(),
            StepState::Disease(form) => form.answer == Some(true) && form.is_valid(),
            _ => false,
        }
    }

    /// Validates the form on screen, merges its answers and advances.
    ///
    /// A rejected form keeps the wizard where it is and records the field
    /// errors for inline display.
    ///
    /// # Returns
    ///
    /// The step now on screen.
    pub fn submit(&mut self) -> Result<WizardStep, WizardError> {
        let result = self.try_submit();
        if let Err(WizardError::Domain(DomainError::Validation(errors))) = &result {
            self.field_errors = errors.clone();
        }
        result
    }

    fn try_submit(&mut self) -> Result<WizardStep, WizardError> {
        match &self.state {
            StepState::Basic(form) => {
                let answers = BasicAnswers::try_from(form)?;
                self.builder.set_basic(answers);
                Ok(self.enter(WizardStep::Allergy))
            }
            StepState::Allergy(Phase::Form(form)) => {
                let answers = AllergyAnswers::try_from(form)?;
                self.builder.set_allergy(answers);
                Ok(self.enter(WizardStep::Medication))
            }
            StepState::Medication(Phase::Form(form)) => {
                let answers = MedicationAnswers::try_from(form)?;
                self.builder.set_medication(answers);
                Ok(self.enter(WizardStep::Disease))
            }
            StepState::Disease(form) => {
                let answers = DiseaseAnswers::try_from(form)?;
                self.finish(answers)
            }
            other => Err(self.invalid(other.step(), "submit")),
        }
    }

    /// Answers the yes/no question of the step on screen.
    ///
    /// "Yes" opens the detail form. "No" records the step's empty answers
    /// and moves on without validating anything; on the disease step it
    /// completes the wizard.
    pub fn choose(&mut self, yes: bool) -> Result<WizardStep, WizardError> {
        self.field_errors = FieldErrors::new();
        let step = self.step();
        match (step, self.shows_form(), yes) {
            (WizardStep::Allergy, false, true) => {
                self.state = StepState::Allergy(Phase::Form(self.builder.allergy_form()));
                Ok(step)
            }
            (WizardStep::Allergy, _, false) => {
                self.builder.set_allergy(AllergyAnswers::none());
                Ok(self.enter(WizardStep::Medication))
            }
            (WizardStep::Medication, false, true) => {
                self.state = StepState::Medication(Phase::Form(MedicationForm::default()));
                Ok(step)
            }
            (WizardStep::Medication, _, false) => {
                self.builder.set_medication(MedicationAnswers::none());
                Ok(self.enter(WizardStep::Disease))
            }
            (WizardStep::Allergy | WizardStep::Medication, true, true) => Ok(step),
            (WizardStep::Disease, _, true) => {
                if let Some(form) = self.disease_form_mut() {
                    form.answer = Some(true);
                    if form.rows.is_empty() {
                        form.add_row();
                    }
                }
                Ok(step)
            }
            (WizardStep::Disease, _, false) => {
                if let Some(form) = self.disease_form_mut() {
                    form.answer = Some(false);
                    form.rows.clear();
                }
                self.finish(DiseaseAnswers::none())
            }
            _ => Err(self.invalid(step, "choose")),
        }
    }

    /// Goes back one level.
    ///
    /// A detail form collapses to its prompt first; from a prompt the wizard
    /// returns to the previous step. The disease step has no prompt phase and
    /// always returns to medication. Back from basic leaves the wizard.
    pub fn back(&mut self) -> BackOutcome {
        self.field_errors = FieldErrors::new();
        match (self.step(), self.shows_form()) {
            (WizardStep::Basic, _) => return BackOutcome::Exit(Destination::Login),
            (WizardStep::Allergy, true) => self.state = StepState::Allergy(Phase::Prompt),
            (WizardStep::Allergy, false) => {
                self.enter(WizardStep::Basic);
            }
            (WizardStep::Medication, true) => self.state = StepState::Medication(Phase::Prompt),
            (WizardStep::Medication, false) => {
                self.enter(WizardStep::Allergy);
            }
            (WizardStep::Disease, _) => {
                self.enter(WizardStep::Medication);
            }
            (WizardStep::Complete, _) => {
                self.enter(WizardStep::Disease);
            }
        }
        tracing::debug!(step = %self.step(), form = self.shows_form(), "wizard back");
        BackOutcome::Within(self.step())
    }

    /// Puts a step on screen with fresh sub-state.
    fn enter(&mut self, step: WizardStep) -> WizardStep {
        self.state = match step {
            WizardStep::Basic => StepState::Basic(self.builder.basic_form()),
            WizardStep::Allergy => StepState::Allergy(Phase::Prompt),
            WizardStep::Medication => StepState::Medication(Phase::Prompt),
            WizardStep::Disease => StepState::Disease(DiseaseForm::default()),
            WizardStep::Complete => StepState::Complete,
        };
        self.field_errors = FieldErrors::new();
        tracing::debug!(step = %step, "wizard entered step");
        step
    }

    fn finish(&mut self, answers: DiseaseAnswers) -> Result<WizardStep, WizardError> {
        self.builder.set_disease(answers);
        self.persist()?;
        Ok(self.enter(WizardStep::Complete))
    }

    /// Overlays the answers on the session record and writes the result to
    /// both the registered account and the session.
    ///
    /// The merged value is built before any write. The account goes first, so
    /// a failed account write leaves both records untouched. A failed session
    /// write leaves the account ahead of the session until the next submit
    /// writes both again.
    fn persist(&self) -> Result<(), StoreError> {
        let answers = self.builder.record();
        let merged = Value::Object(merge_record(&*self.store, RecordKey::Session, &answers));
        for key in [RecordKey::RegisteredAccount, RecordKey::Session] {
            self.store.set(key, &merged).inspect_err(|err| {
                tracing::error!(
                    key = key.as_str(),
                    error = %err,
                    "failed to write onboarding record"
                );
            })?;
        }
        tracing::info!(fields = answers.len(), "onboarding answers saved");
        Ok(())
    }

    fn invalid(&self, step: WizardStep, action: &'static str) -> WizardError {
        WizardError::Domain(DomainError::InvalidTransition {
            step: step.name(),
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AllergyCategory, Frequency, Gender};
    use crate::infrastructure::MemoryStore;
    use serde_json::json;
    use std::cell::Cell;
    use std::io;

    /// Refuses writes to one key while `failing` is set.
    struct FailingStore {
        inner: MemoryStore,
        failing: Cell<Option<RecordKey>>,
    }

    impl RecordStore for FailingStore {
        fn get(&self, key: RecordKey) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: RecordKey, value: &Value) -> Result<(), StoreError> {
            if self.failing.get() == Some(key) {
                return Err(StoreError::Io {
                    key: key.as_str(),
                    source: io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear()
        }
    }

    fn wizard() -> (Rc<MemoryStore>, WizardController) {
        let store = Rc::new(MemoryStore::with_record(
            RecordKey::Session,
            json!({"email": "kim@example.com", "password": "Secret1!"}),
        ));
        let wizard = WizardController::new(store.clone());
        (store, wizard)
    }

    fn fill_basic(wizard: &mut WizardController) {
        let form = wizard.basic_form_mut().unwrap();
        form.name = "Kim".to_string();
        form.birth_date = "1990-04-12".to_string();
        form.gender = Some(Gender::Female);
        form.height = "165".to_string();
        form.weight = "55".to_string();
    }

    fn at(wizard: &WizardController) -> (WizardStep, bool) {
        (wizard.step(), wizard.shows_form())
    }

    #[test]
    fn test_basic_submit_moves_to_allergy_prompt() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        assert!(wizard.can_submit());
        assert_eq!(wizard.submit().unwrap(), WizardStep::Allergy);
        assert_eq!(at(&wizard), (WizardStep::Allergy, false));
    }

    #[test]
    fn test_invalid_basic_keeps_step_and_reports_fields() {
        let (_, mut wizard) = wizard();
        wizard.basic_form_mut().unwrap().name = "Kim".to_string();
        assert!(!wizard.can_submit());
        assert!(matches!(
            wizard.submit(),
            Err(WizardError::Domain(DomainError::Validation(_)))
        ));
        assert_eq!(wizard.step(), WizardStep::Basic);
        assert!(wizard.field_errors().get("gender").is_some());
        assert!(wizard.field_errors().get("name").is_none());
    }

    #[test]
    fn test_skip_allergy_then_back_lands_on_allergy_prompt() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        assert_eq!(wizard.choose(false).unwrap(), WizardStep::Medication);
        assert_eq!(at(&wizard), (WizardStep::Medication, false));

        let allergy = wizard.answers().allergy().unwrap();
        assert!(!allergy.has_allergy);
        assert!(allergy.allergies.is_empty());

        assert_eq!(wizard.back(), BackOutcome::Within(WizardStep::Allergy));
        assert_eq!(at(&wizard), (WizardStep::Allergy, false));
    }

    #[test]
    fn test_form_back_collapses_then_retreats() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(true).unwrap();
        assert_eq!(at(&wizard), (WizardStep::Allergy, true));

        assert_eq!(wizard.back(), BackOutcome::Within(WizardStep::Allergy));
        assert_eq!(at(&wizard), (WizardStep::Allergy, false));
        assert_eq!(wizard.back(), BackOutcome::Within(WizardStep::Basic));
    }

    #[test]
    fn test_back_from_basic_exits() {
        let (_, mut wizard) = wizard();
        assert_eq!(wizard.back(), BackOutcome::Exit(Destination::Login));
        assert_eq!(wizard.step(), WizardStep::Basic);
    }

    #[test]
    fn test_basic_is_prefilled_after_returning() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.back();
        assert_eq!(wizard.basic_form_mut().unwrap().name, "Kim");
        assert!(wizard.can_submit());
    }

    #[test]
    fn test_show_form_is_not_inherited() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(true).unwrap();
        wizard.allergy_form_mut().unwrap().toggle_item("Latex");
        wizard.submit().unwrap();
        assert_eq!(at(&wizard), (WizardStep::Medication, false));

        wizard.choose(true).unwrap();
        assert_eq!(at(&wizard), (WizardStep::Medication, true));
        wizard.back();
        wizard.back();
        // Allergy comes back as a prompt even though its form was open last time
        assert_eq!(at(&wizard), (WizardStep::Allergy, false));
    }

    #[test]
    fn test_allergy_form_reopens_with_earlier_selection() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(true).unwrap();
        wizard.allergy_form_mut().unwrap().toggle_other(AllergyCategory::Food);
        wizard
            .allergy_form_mut()
            .unwrap()
            .other_text_mut(AllergyCategory::Food)
            .unwrap()
            .push_str("kiwi");
        wizard.submit().unwrap();
        assert_eq!(
            wizard.answers().allergy().unwrap().other_food.as_deref(),
            Some("kiwi")
        );

        wizard.back();
        wizard.choose(true).unwrap();
        let form = wizard.allergy_form_mut().unwrap();
        assert!(form.is_other_selected(AllergyCategory::Food));
        assert_eq!(form.other_text(AllergyCategory::Food), "kiwi");

        // Resubmitting unchanged keeps the free text
        assert!(wizard.can_submit());
        wizard.submit().unwrap();
        assert_eq!(
            wizard.answers().allergy().unwrap().other_food.as_deref(),
            Some("kiwi")
        );
    }

    #[test]
    fn test_prompt_has_no_submit() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        assert!(!wizard.can_submit());
        assert!(matches!(
            wizard.submit(),
            Err(WizardError::Domain(DomainError::InvalidTransition { step: "allergy", .. }))
        ));
    }

    #[test]
    fn test_choose_on_basic_is_invalid() {
        let (_, mut wizard) = wizard();
        assert!(matches!(
            wizard.choose(true),
            Err(WizardError::Domain(DomainError::InvalidTransition { action: "choose", .. }))
        ));
    }

    #[test]
    fn test_medication_form_submit_goes_to_disease() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(true).unwrap();

        let form = wizard.medication_form_mut().unwrap();
        let key = form.rows.key_at(0).unwrap();
        let row = form.rows.get_mut(key).unwrap();
        row.name = "Metformin".to_string();
        row.dosage = "500mg".to_string();
        assert!(!wizard.can_submit());

        let form = wizard.medication_form_mut().unwrap();
        form.rows.get_mut(key).unwrap().frequency = Some(Frequency::OnceDaily);
        assert_eq!(wizard.submit().unwrap(), WizardStep::Disease);
        assert_eq!(wizard.answers().medication().unwrap().medications.len(), 1);
    }

    #[test]
    fn test_disease_back_goes_straight_to_medication_prompt() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(true).unwrap();
        assert_eq!(wizard.step(), WizardStep::Disease);

        assert_eq!(wizard.back(), BackOutcome::Within(WizardStep::Medication));
        assert!(!wizard.shows_form());
    }

    #[test]
    fn test_disease_no_completes_and_persists_once() {
        let (store, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        assert_eq!(store.write_count(RecordKey::Session), 0);
        assert_eq!(store.write_count(RecordKey::RegisteredAccount), 0);

        assert_eq!(wizard.choose(false).unwrap(), WizardStep::Complete);
        assert_eq!(store.write_count(RecordKey::Session), 1);
        assert_eq!(store.write_count(RecordKey::RegisteredAccount), 1);

        let session = store.get(RecordKey::Session).unwrap().unwrap();
        let account = store.get(RecordKey::RegisteredAccount).unwrap().unwrap();
        assert_eq!(session, account);
        assert_eq!(session["email"], "kim@example.com");
        assert_eq!(session["name"], "Kim");
        assert_eq!(session["hasMedication"], false);
        assert_eq!(session["hasDisease"], false);
        assert_eq!(session["diseases"], json!([]));
    }

    #[test]
    fn test_disease_yes_requires_an_entry() {
        let (store, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        assert!(!wizard.can_submit());

        wizard.choose(true).unwrap();
        assert!(!wizard.can_submit());
        assert!(wizard.submit().is_err());
        assert!(wizard.field_errors().get("diseases.0.name").is_some());
        assert_eq!(store.write_count(RecordKey::Session), 0);

        let form = wizard.disease_form_mut().unwrap();
        let key = form.rows.key_at(0).unwrap();
        form.rows.get_mut(key).unwrap().name = "Asthma".to_string();
        assert_eq!(wizard.submit().unwrap(), WizardStep::Complete);

        let session = store.get(RecordKey::Session).unwrap().unwrap();
        assert_eq!(session["hasDisease"], true);
        assert_eq!(session["diseases"], json!(["Asthma"]));
    }

    #[test]
    fn test_back_from_complete_returns_to_disease() {
        let (_, mut wizard) = wizard();
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        assert_eq!(wizard.back(), BackOutcome::Within(WizardStep::Disease));
        assert!(matches!(wizard.state(), StepState::Disease(form) if form.answer.is_none()));
    }

    #[test]
    fn test_completion_without_session_still_writes_both_keys() {
        let store = Rc::new(MemoryStore::new());
        let mut wizard = WizardController::new(store.clone());
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();
        assert_eq!(store.write_count(RecordKey::Session), 1);
        assert_eq!(store.write_count(RecordKey::RegisteredAccount), 1);
    }

    #[test]
    fn test_failed_account_write_leaves_both_records_untouched() {
        let session = json!({"email": "kim@example.com"});
        let store = Rc::new(FailingStore {
            inner: MemoryStore::with_record(RecordKey::Session, session.clone()),
            failing: Cell::new(Some(RecordKey::RegisteredAccount)),
        });
        let mut wizard = WizardController::new(store.clone());
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();

        assert!(matches!(wizard.choose(false), Err(WizardError::Store(_))));
        assert_eq!(wizard.step(), WizardStep::Disease);
        assert_eq!(store.inner.write_count(RecordKey::Session), 0);
        assert_eq!(store.get(RecordKey::Session).unwrap(), Some(session));
    }

    #[test]
    fn test_failed_session_write_is_repaired_by_resubmitting() {
        let store = Rc::new(FailingStore {
            inner: MemoryStore::new(),
            failing: Cell::new(Some(RecordKey::Session)),
        });
        let mut wizard = WizardController::new(store.clone());
        fill_basic(&mut wizard);
        wizard.submit().unwrap();
        wizard.choose(false).unwrap();
        wizard.choose(false).unwrap();

        assert!(matches!(wizard.choose(false), Err(WizardError::Store(_))));
        assert_eq!(wizard.step(), WizardStep::Disease);
        assert!(store.get(RecordKey::Session).unwrap().is_none());

        store.failing.set(None);
        assert_eq!(wizard.choose(false).unwrap(), WizardStep::Complete);
        assert_eq!(
            store.get(RecordKey::Session).unwrap(),
            store.get(RecordKey::RegisteredAccount).unwrap()
        );
    }
}
