//! Onboarding steps, per-step sub-state and the accumulating answer builder.
//!
//! Each step is a variant of [`StepState`] carrying only the state that step
//! can have, so a prompt/form flag can never leak from one step to another.
//! Answers are collected per step in an [`OnboardingBuilder`] and only turned
//! into the loosely typed stored record when the wizard completes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};
use super::forms::{AllergyForm, BasicInfoForm, DiseaseForm, MedicationForm};
use super::models::{AllergyCategory, Frequency, Gender, OnboardingRecord};
use super::validation::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Basic,
    Allergy,
    Medication,
    Disease,
    Complete,
}

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Basic => Some(WizardStep::Allergy),
            WizardStep::Allergy => Some(WizardStep::Medication),
            WizardStep::Medication => Some(WizardStep::Disease),
            WizardStep::Disease => Some(WizardStep::Complete),
            WizardStep::Complete => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WizardStep::Basic => "basic",
            WizardStep::Allergy => "allergy",
            WizardStep::Medication => "medication",
            WizardStep::Disease => "disease",
            WizardStep::Complete => "complete",
        }
    }

    /// Position on the four-segment progress bar; the completion screen has none.
    pub fn progress(self) -> Option<usize> {
        match self {
            WizardStep::Basic => Some(1),
            WizardStep::Allergy => Some(2),
            WizardStep::Medication => Some(3),
            WizardStep::Disease => Some(4),
            WizardStep::Complete => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Yes/no prompt, or the detail form reached by answering "yes".
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<F> {
    Prompt,
    Form(F),
}

impl<F> Phase<F> {
    pub fn shows_form(&self) -> bool {
        matches!(self, Phase::Form(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepState {
    Basic(BasicInfoForm),
    Allergy(Phase<AllergyForm>),
    Medication(Phase<MedicationForm>),
    Disease(DiseaseForm),
    Complete,
}

impl StepState {
    pub fn step(&self) -> WizardStep {
        match self {
            StepState::Basic(_) => WizardStep::Basic,
            StepState::Allergy(_) => WizardStep::Allergy,
            StepState::Medication(_) => WizardStep::Medication,
            StepState::Disease(_) => WizardStep::Disease,
            StepState::Complete => WizardStep::Complete,
        }
    }

    /// The `showForm` flag; always false for steps without a prompt phase.
    pub fn shows_form(&self) -> bool {
        match self {
            StepState::Allergy(phase) => phase.shows_form(),
            StepState::Medication(phase) => phase.shows_form(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAnswers {
    pub name: String,
    pub birth_date: String,
    pub gender: Gender,
    pub height: String,
    pub weight: String,
}

impl TryFrom<&BasicInfoForm> for BasicAnswers {
    type Error = DomainError;

    fn try_from(form: &BasicInfoForm) -> DomainResult<Self> {
        let errors = form.validate();
        match form.gender {
            Some(gender) if errors.is_empty() => Ok(Self {
                name: form.name.trim().to_string(),
                birth_date: form.birth_date.trim().to_string(),
                gender,
                height: form.height.trim().to_string(),
                weight: form.weight.trim().to_string(),
            }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyAnswers {
    pub has_allergy: bool,
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_drug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_medical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_food: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_allergy: Option<String>,
}

impl AllergyAnswers {
    pub fn none() -> Self {
        Self {
            has_allergy: false,
            allergies: Vec::new(),
            other_drug: None,
            other_medical: None,
            other_food: None,
            other_allergy: None,
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TryFrom<&AllergyForm> for AllergyAnswers {
    type Error = DomainError;

    fn try_from(form: &AllergyForm) -> DomainResult<Self> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        Ok(Self {
            has_allergy: true,
            allergies: form.selected().to_vec(),
            other_drug: non_empty(form.other_text(AllergyCategory::Drug)),
            other_medical: non_empty(form.other_text(AllergyCategory::Medical)),
            other_food: non_empty(form.other_text(AllergyCategory::Food)),
            other_allergy: form.general_other().and_then(non_empty),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAnswers {
    pub has_medication: bool,
    pub medications: Vec<MedicationEntry>,
}

impl MedicationAnswers {
    pub fn none() -> Self {
        Self {
            has_medication: false,
            medications: Vec::new(),
        }
    }
}

impl TryFrom<&MedicationForm> for MedicationAnswers {
    type Error = DomainError;

    fn try_from(form: &MedicationForm) -> DomainResult<Self> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        let medications = form
            .rows
            .values()
            .filter_map(|row| {
                row.frequency.map(|frequency| MedicationEntry {
                    name: row.name.trim().to_string(),
                    dosage: row.dosage.trim().to_string(),
                    frequency,
                })
            })
            .collect();
        Ok(Self {
            has_medication: true,
            medications,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAnswers {
    pub has_disease: bool,
    pub diseases: Vec<String>,
}

impl DiseaseAnswers {
    pub fn none() -> Self {
        Self {
            has_disease: false,
            diseases: Vec::new(),
        }
    }
}

impl TryFrom<&DiseaseForm> for DiseaseAnswers {
    type Error = DomainError;

    fn try_from(form: &DiseaseForm) -> DomainResult<Self> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        match form.answer {
            Some(true) => Ok(Self {
                has_disease: true,
                diseases: form.names(),
            }),
            _ => Ok(Self::none()),
        }
    }
}

/// Step-typed accumulator for onboarding answers.
///
/// Each step owns a disjoint slot. Submitting a step again replaces its slot;
/// a skip replaces it with the step's "none" answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingBuilder {
    basic: Option<BasicAnswers>,
    allergy: Option<AllergyAnswers>,
    medication: Option<MedicationAnswers>,
    disease: Option<DiseaseAnswers>,
}

impl OnboardingBuilder {
    pub fn set_basic(&mut self, answers: BasicAnswers) {
        self.basic = Some(answers);
    }

    pub fn set_allergy(&mut self, answers: AllergyAnswers) {
        self.allergy = Some(answers);
    }

    pub fn set_medication(&mut self, answers: MedicationAnswers) {
        self.medication = Some(answers);
    }

    pub fn set_disease(&mut self, answers: DiseaseAnswers) {
        self.disease = Some(answers);
    }

    pub fn basic(&self) -> Option<&BasicAnswers> {
        self.basic.as_ref()
    }

    pub fn allergy(&self) -> Option<&AllergyAnswers> {
        self.allergy.as_ref()
    }

    pub fn medication(&self) -> Option<&MedicationAnswers> {
        self.medication.as_ref()
    }

    pub fn disease(&self) -> Option<&DiseaseAnswers> {
        self.disease.as_ref()
    }

    /// Basic info form pre-filled from earlier answers.
    pub fn basic_form(&self) -> BasicInfoForm {
        match &self.basic {
            Some(answers) => BasicInfoForm {
                name: answers.name.clone(),
                birth_date: answers.birth_date.clone(),
                gender: Some(answers.gender),
                height: answers.height.clone(),
                weight: answers.weight.clone(),
            },
            None => BasicInfoForm::default(),
        }
    }

    /// Allergy form pre-checked with earlier selections and free text.
    pub fn allergy_form(&self) -> AllergyForm {
        match &self.allergy {
            Some(answers) => AllergyForm::seeded(
                answers.allergies.clone(),
                answers.other_drug.as_deref(),
                answers.other_medical.as_deref(),
                answers.other_food.as_deref(),
                answers.other_allergy.as_deref(),
            ),
            None => AllergyForm::default(),
        }
    }

    /// Flattens every answered step into the stored record shape.
    pub fn record(&self) -> OnboardingRecord {
        let mut record = OnboardingRecord::new();
        merge_into(&mut record, &self.basic);
        merge_into(&mut record, &self.allergy);
        merge_into(&mut record, &self.medication);
        merge_into(&mut record, &self.disease);
        record
    }
}

fn merge_into<T: Serialize>(record: &mut OnboardingRecord, answers: &Option<T>) {
    if let Some(answers) = answers {
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(answers) {
            record.extend(fields);
        }
    }
}
