//! In-progress form state for the onboarding steps.
//!
//! These types hold whatever the user has typed so far, valid or not.
//! Validation lives in [`super::validation`]; conversion into the typed
//! answers merged by the wizard lives in [`super::onboarding`].

use super::errors::DomainResult;
use super::models::{AllergyCategory, Frequency, Gender};
use super::rows::{RemovalRule, RowKey, RowList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicField {
    Name,
    BirthDate,
    Gender,
    Height,
    Weight,
}

impl BasicField {
    pub const ALL: [BasicField; 5] = [
        BasicField::Name,
        BasicField::BirthDate,
        BasicField::Gender,
        BasicField::Height,
        BasicField::Weight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BasicField::Name => "Name",
            BasicField::BirthDate => "Date of birth (YYYY-MM-DD)",
            BasicField::Gender => "Gender",
            BasicField::Height => "Height (cm)",
            BasicField::Weight => "Weight (kg)",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            BasicField::Name => "name",
            BasicField::BirthDate => "birthDate",
            BasicField::Gender => "gender",
            BasicField::Height => "height",
            BasicField::Weight => "weight",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicInfoForm {
    pub name: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
    pub height: String,
    pub weight: String,
}

impl BasicInfoForm {
    /// Text buffer behind a field; gender is a choice, not text.
    pub fn text_mut(&mut self, field: BasicField) -> Option<&mut String> {
        match field {
            BasicField::Name => Some(&mut self.name),
            BasicField::BirthDate => Some(&mut self.birth_date),
            BasicField::Height => Some(&mut self.height),
            BasicField::Weight => Some(&mut self.weight),
            BasicField::Gender => None,
        }
    }

    pub fn text(&self, field: BasicField) -> Option<&str> {
        match field {
            BasicField::Name => Some(&self.name),
            BasicField::BirthDate => Some(&self.birth_date),
            BasicField::Height => Some(&self.height),
            BasicField::Weight => Some(&self.weight),
            BasicField::Gender => None,
        }
    }

    pub fn toggle_gender(&mut self) {
        self.gender = Some(self.gender.map_or(Gender::Male, Gender::toggled));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllergyForm {
    selected: Vec<String>,
    other_drug: String,
    other_medical: String,
    other_food: String,
    general_other: Option<String>,
}

impl AllergyForm {
    /// A form pre-checked with earlier selections and their free text.
    pub fn seeded(
        selected: Vec<String>,
        other_drug: Option<&str>,
        other_medical: Option<&str>,
        other_food: Option<&str>,
        general_other: Option<&str>,
    ) -> Self {
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();
        Self {
            selected,
            other_drug: text(other_drug),
            other_medical: text(other_medical),
            other_food: text(other_food),
            general_other: general_other.map(str::to_string),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.iter().any(|s| s == value)
    }

    pub fn toggle_item(&mut self, item: &str) {
        if let Some(position) = self.selected.iter().position(|s| s == item) {
            self.selected.remove(position);
        } else {
            self.selected.push(item.to_string());
        }
    }

    /// Deselecting a category's "other" wipes the text typed for it.
    pub fn toggle_other(&mut self, category: AllergyCategory) {
        let value = category.other_value();
        if self.is_selected(&value) {
            self.toggle_item(&value);
            self.other_slot(category).clear();
        } else {
            self.selected.push(value);
        }
    }

    pub fn is_other_selected(&self, category: AllergyCategory) -> bool {
        self.is_selected(&category.other_value())
    }

    /// Free text for a category, editable only while its "other" is selected.
    pub fn other_text_mut(&mut self, category: AllergyCategory) -> Option<&mut String> {
        if self.is_other_selected(category) {
            Some(self.other_slot(category))
        } else {
            None
        }
    }

    pub fn other_text(&self, category: AllergyCategory) -> &str {
        match category {
            AllergyCategory::Drug => &self.other_drug,
            AllergyCategory::Medical => &self.other_medical,
            AllergyCategory::Food => &self.other_food,
        }
    }

    fn other_slot(&mut self, category: AllergyCategory) -> &mut String {
        match category {
            AllergyCategory::Drug => &mut self.other_drug,
            AllergyCategory::Medical => &mut self.other_medical,
            AllergyCategory::Food => &mut self.other_food,
        }
    }

    pub fn open_general_other(&mut self) {
        self.general_other.get_or_insert_with(String::new);
    }

    pub fn general_other_mut(&mut self) -> Option<&mut String> {
        self.general_other.as_mut()
    }

    pub fn general_other(&self) -> Option<&str> {
        self.general_other.as_deref()
    }

    /// Whether any free-text entry holds more than whitespace.
    pub fn has_any_text(&self) -> bool {
        let filled = |text: &str| !text.trim().is_empty();
        filled(&self.other_drug)
            || filled(&self.other_medical)
            || filled(&self.other_food)
            || self.general_other.as_deref().is_some_and(filled)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationRow {
    pub name: String,
    pub dosage: String,
    pub frequency: Option<Frequency>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicationForm {
    pub rows: RowList<MedicationRow>,
}

impl Default for MedicationForm {
    fn default() -> Self {
        Self {
            rows: RowList::with_blank_row(RemovalRule::KeepOne),
        }
    }
}

impl MedicationForm {
    pub fn add_row(&mut self) -> RowKey {
        self.rows.push_blank()
    }

    pub fn remove_row(&mut self, key: RowKey) -> DomainResult<()> {
        self.rows.remove(key).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiseaseRow {
    pub name: String,
}

/// The disease step keeps its yes/no answer next to the rows instead of
/// gating them behind a separate prompt phase.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseForm {
    pub answer: Option<bool>,
    pub rows: RowList<DiseaseRow>,
}

impl Default for DiseaseForm {
    fn default() -> Self {
        Self {
            answer: None,
            rows: RowList::with_blank_row(RemovalRule::PinFirst),
        }
    }
}

impl DiseaseForm {
    pub fn add_row(&mut self) -> RowKey {
        self.rows.push_blank()
    }

    pub fn remove_row(&mut self, key: RowKey) -> DomainResult<()> {
        self.rows.remove(key).map(|_| ())
    }

    /// Entry names with blank rows dropped.
    pub fn names(&self) -> Vec<String> {
        self.rows
            .values()
            .map(|row| row.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}
