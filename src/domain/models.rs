use serde::{Deserialize, Serialize};

pub type HospitalId = u32;

/// The open field-name-to-value mapping kept under each store key.
pub type OnboardingRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalStatus {
    #[default]
    Available,
    Full,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub distance: String,
    pub address: String,
    pub emergency_beds: u32,
    pub available_beds: u32,
    pub total_beds: u32,
    #[serde(default)]
    pub status: HospitalStatus,
}

impl Hospital {
    /// Only hospitals that are currently taking patients can be selected.
    pub fn is_selectable(&self) -> bool {
        self.status == HospitalStatus::Available
    }

    pub fn has_open_beds(&self) -> bool {
        self.available_beds > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub id: String,
    pub name: String,
    pub tags: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "once daily")]
    OnceDaily,
    #[serde(rename = "twice daily")]
    TwiceDaily,
    #[serde(rename = "three times daily")]
    ThreeTimesDaily,
    #[serde(rename = "as needed")]
    AsNeeded,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThreeTimesDaily,
        Frequency::AsNeeded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Frequency::OnceDaily => "once daily",
            Frequency::TwiceDaily => "twice daily",
            Frequency::ThreeTimesDaily => "three times daily",
            Frequency::AsNeeded => "as needed",
        }
    }

    /// Steps through the choices, starting from the first when nothing is chosen.
    pub fn cycle(current: Option<Frequency>, forward: bool) -> Frequency {
        let len = Self::ALL.len();
        let index = match current {
            None if forward => return Self::ALL[0],
            None => return Self::ALL[len - 1],
            Some(f) => Self::ALL.iter().position(|c| *c == f).unwrap_or(0),
        };
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        Self::ALL[next]
    }
}

/// Allergy groups offered on the allergy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllergyCategory {
    Drug,
    Medical,
    Food,
}

impl AllergyCategory {
    pub const ALL: [AllergyCategory; 3] = [
        AllergyCategory::Drug,
        AllergyCategory::Medical,
        AllergyCategory::Food,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AllergyCategory::Drug => "Drug allergies",
            AllergyCategory::Medical => "Test / medical allergies",
            AllergyCategory::Food => "Food allergies (acute reaction)",
        }
    }

    /// Fixed choices, not counting the category's free-text "other" entry.
    pub fn items(self) -> &'static [&'static str] {
        match self {
            AllergyCategory::Drug => &["Penicillins", "Cephalosporins", "Aspirin", "NSAIDs"],
            AllergyCategory::Medical => &["Contrast media", "Latex", "Alcohol"],
            AllergyCategory::Food => &["Tree nuts", "Shellfish", "Egg", "Dairy", "Peach"],
        }
    }

    /// Value stored in the selection list when the category's "other" is picked.
    pub fn other_value(self) -> String {
        format!("{}-other", self.title())
    }

    /// Record field that holds the category's free text.
    pub fn other_field(self) -> &'static str {
        match self {
            AllergyCategory::Drug => "otherDrug",
            AllergyCategory::Medical => "otherMedical",
            AllergyCategory::Food => "otherFood",
        }
    }
}

/// Symbolic destinations handed to the navigation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Login,
    Onboarding,
    SearchMap,
    Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospital_without_status_is_available() {
        let json = r#"{"id":7,"name":"North ER","distance":"0.4km","address":"1 Main St",
            "emergencyBeds":2,"availableBeds":1,"totalBeds":3}"#;
        let hospital: Hospital = serde_json::from_str(json).unwrap();
        assert_eq!(hospital.status, HospitalStatus::Available);
        assert!(hospital.is_selectable());
    }

    #[test]
    fn test_full_and_closed_are_not_selectable() {
        let mut hospital: Hospital = serde_json::from_str(
            r#"{"id":1,"name":"a","distance":"1km","address":"b",
            "emergencyBeds":0,"availableBeds":0,"totalBeds":0,"status":"full"}"#,
        )
        .unwrap();
        assert!(!hospital.is_selectable());
        hospital.status = HospitalStatus::Closed;
        assert!(!hospital.is_selectable());
    }

    #[test]
    fn test_frequency_cycle_wraps() {
        assert_eq!(Frequency::cycle(None, true), Frequency::OnceDaily);
        assert_eq!(Frequency::cycle(None, false), Frequency::AsNeeded);
        assert_eq!(Frequency::cycle(Some(Frequency::AsNeeded), true), Frequency::OnceDaily);
        assert_eq!(Frequency::cycle(Some(Frequency::OnceDaily), false), Frequency::AsNeeded);
    }

    #[test]
    fn test_frequency_serializes_as_label() {
        for frequency in Frequency::ALL {
            let json = serde_json::to_string(&frequency).unwrap();
            assert_eq!(json, format!("\"{}\"", frequency.label()));
        }
    }
}
