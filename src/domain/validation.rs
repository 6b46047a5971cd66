//! Field-level validation for the onboarding forms.
//!
//! Validation is a pure function of a form's contents. Failures are
//! reported as a map of field path to message so the page can show them
//! inline next to the offending input.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use super::forms::{AllergyForm, BasicInfoForm, DiseaseForm, MedicationForm};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", joined.join("; "))
    }
}

pub trait Validate {
    fn validate(&self) -> FieldErrors;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}

impl Validate for BasicInfoForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Please enter your name");
        if self.birth_date.trim().is_empty() {
            errors.insert("birthDate", "Please enter your date of birth");
        } else if NaiveDate::parse_from_str(self.birth_date.trim(), "%Y-%m-%d").is_err() {
            errors.insert("birthDate", "Use the YYYY-MM-DD format");
        }
        if self.gender.is_none() {
            errors.insert("gender", "Please select a gender");
        }
        require(&mut errors, "height", &self.height, "Please enter your height");
        require(&mut errors, "weight", &self.weight, "Please enter your weight");
        errors
    }
}

impl Validate for AllergyForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.selected().is_empty() && !self.has_any_text() {
            errors.insert("allergies", "Please enter your allergy information");
        }
        errors
    }
}

impl Validate for MedicationForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.rows.is_empty() {
            errors.insert("medications", "Please enter your medication information");
        }
        for (index, row) in self.rows.values().enumerate() {
            require(
                &mut errors,
                &format!("medications.{index}.name"),
                &row.name,
                "Please enter the medication name",
            );
            require(
                &mut errors,
                &format!("medications.{index}.dosage"),
                &row.dosage,
                "Please enter the dosage",
            );
            if row.frequency.is_none() {
                errors.insert(
                    format!("medications.{index}.frequency"),
                    "Please choose how often it is taken",
                );
            }
        }
        errors
    }
}

impl Validate for DiseaseForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match self.answer {
            None => errors.insert("hasDisease", "Please answer yes or no"),
            Some(false) => {}
            Some(true) => {
                if self.rows.is_empty() {
                    errors.insert("diseases", "Please enter your condition");
                }
                for (index, row) in self.rows.values().enumerate() {
                    require(
                        &mut errors,
                        &format!("diseases.{index}.name"),
                        &row.name,
                        "Please enter the condition name",
                    );
                }
            }
        }
        errors
    }
}
