use crate::domain::{Hospital, HospitalStatus, PersonProfile};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("hospital data is unavailable: {0}")]
    Unavailable(String),
}

/// Read-only supplier of emergency rooms, split by current availability.
pub trait HospitalSource {
    fn available(&self) -> Result<Vec<Hospital>, SourceError>;
    fn unavailable(&self) -> Result<Vec<Hospital>, SourceError>;
}

/// Fixed data set bundled with the app.
pub struct StaticHospitalSource;

fn hospital(
    id: u32,
    name: &str,
    distance: &str,
    address: &str,
    beds: (u32, u32, u32),
    status: HospitalStatus,
) -> Hospital {
    Hospital {
        id,
        name: name.to_string(),
        distance: distance.to_string(),
        address: address.to_string(),
        emergency_beds: beds.0,
        available_beds: beds.1,
        total_beds: beds.2,
        status,
    }
}

impl HospitalSource for StaticHospitalSource {
    fn available(&self) -> Result<Vec<Hospital>, SourceError> {
        Ok(vec![
            hospital(
                1,
                "Seoul Central Hospital ER",
                "0.4km",
                "110 Sejong-daero, Jung-gu, Seoul",
                (2, 1, 3),
                HospitalStatus::Available,
            ),
            hospital(
                2,
                "Kangbuk Samsung Hospital ER",
                "0.8km",
                "29 Saemunan-ro, Jongno-gu, Seoul",
                (2, 3, 3),
                HospitalStatus::Available,
            ),
            hospital(
                3,
                "Kyung Hee University Hospital at Gangdong",
                "1.2km",
                "30 Eulji-ro, Jung-gu, Seoul",
                (4, 1, 3),
                HospitalStatus::Available,
            ),
        ])
    }

    fn unavailable(&self) -> Result<Vec<Hospital>, SourceError> {
        Ok(vec![
            hospital(
                4,
                "Kangbuk Samsung Hospital ER",
                "1.0km",
                "29 Saemunan-ro, Jongno-gu, Seoul",
                (0, 0, 0),
                HospitalStatus::Full,
            ),
            hospital(
                5,
                "Kangbuk Samsung Hospital ER",
                "1.0km",
                "29 Saemunan-ro, Jongno-gu, Seoul",
                (0, 0, 0),
                HospitalStatus::Closed,
            ),
        ])
    }
}

/// People the user can search on behalf of.
pub fn people() -> Vec<PersonProfile> {
    vec![
        PersonProfile {
            id: "spouse".to_string(),
            name: "Husband".to_string(),
            tags: "work · spouse".to_string(),
        },
        PersonProfile {
            id: "child".to_string(),
            name: "Sua Kim".to_string(),
            tags: "child".to_string(),
        },
    ]
}
