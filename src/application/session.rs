//! Sign-in, registration and the profile view, expressed against the record store.
//!
//! Credential policy is not enforced here; an account matches when the
//! stored email and password equal the ones entered.

use chrono::{Datelike, NaiveDate};
use serde_json::{Value, json};

use crate::domain::{Gender, MedicationEntry};
use crate::infrastructure::{RecordKey, RecordStore, StoreError, load_record};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The registered account matched and is now the session.
    SignedIn,
    /// No matching account; the user is offered registration.
    NewUser,
}

/// Checks the credentials against the registered account, copying it into
/// the session on a match.
pub fn login(
    store: &dyn RecordStore,
    credentials: &Credentials,
) -> Result<LoginOutcome, StoreError> {
    let Some(account) = load_record(store, RecordKey::RegisteredAccount) else {
        return Ok(LoginOutcome::NewUser);
    };
    let matches = account.get("email").and_then(Value::as_str) == Some(credentials.email.trim())
        && account.get("password").and_then(Value::as_str) == Some(credentials.password.as_str());
    if !matches {
        tracing::debug!("credentials did not match the registered account");
        return Ok(LoginOutcome::NewUser);
    }
    store.set(RecordKey::Session, &Value::Object(account))?;
    tracing::info!("signed in with registered account");
    Ok(LoginOutcome::SignedIn)
}

/// Saves the credentials as both the registered account and the session.
pub fn register(store: &dyn RecordStore, credentials: &Credentials) -> Result<(), StoreError> {
    let record = json!({
        "email": credentials.email.trim(),
        "password": credentials.password,
    });
    store.set(RecordKey::RegisteredAccount, &record)?;
    store.set(RecordKey::Session, &record)?;
    tracing::info!("registered new account");
    Ok(())
}

pub fn logout(store: &dyn RecordStore) -> Result<(), StoreError> {
    store.clear()?;
    tracing::info!("signed out and cleared stored records");
    Ok(())
}

const DEFAULT_NAME: &str = "Kok Kim";
const DEFAULT_AGE: i32 = 23;

/// What the profile screen shows, with fallbacks for anything not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub name: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub allergies: Vec<String>,
    pub medications: Vec<MedicationEntry>,
    pub diseases: Vec<String>,
}

impl ProfileView {
    /// Builds the view from the session record as of `today`.
    pub fn load(store: &dyn RecordStore, today: NaiveDate) -> Self {
        let record = load_record(store, RecordKey::Session).unwrap_or_default();
        let text = |field: &str| record.get(field).and_then(Value::as_str).map(str::to_string);
        let list = |field: &str| -> Vec<String> {
            record
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default()
        };

        let age = match text("birthDate") {
            Some(birth) => NaiveDate::parse_from_str(&birth, "%Y-%m-%d")
                .ok()
                .map(|birth| age_on(birth, today)),
            None => Some(DEFAULT_AGE),
        };
        let gender = record
            .get("gender")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(Gender::Female);
        let medications = record
            .get("medications")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Self {
            name: text("name")
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            age,
            gender,
            allergies: list("allergies"),
            medications,
            diseases: list("diseases"),
        }
    }
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
