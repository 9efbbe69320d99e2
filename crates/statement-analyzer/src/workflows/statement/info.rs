use super::domain::IdentityInfo;

/// Expected length of a `YYYY-MM-DD` date of birth.
pub const DATE_OF_BIRTH_LEN: usize = 10;

/// Validation rule for the info step. Only lengths are checked, so a value
/// such as `9999-99-99` passes.
pub fn is_valid(first_name: &str, date_of_birth: &str) -> bool {
    !first_name.trim().is_empty() && date_of_birth.chars().count() == DATE_OF_BIRTH_LEN
}

/// Field state of the additional-info form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoForm {
    first_name: String,
    date_of_birth: String,
}

impl InfoForm {
    pub fn new(first_name: impl Into<String>, date_of_birth: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            date_of_birth: date_of_birth.into(),
        }
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
    }

    pub fn set_date_of_birth(&mut self, value: impl Into<String>) {
        self.date_of_birth = value.into();
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    pub fn is_valid(&self) -> bool {
        is_valid(&self.first_name, &self.date_of_birth)
    }

    /// Mirrors the enabled state of the submit control.
    pub fn submit_enabled(&self) -> bool {
        self.is_valid()
    }

    /// Returns the collected info, or `None` while the form is invalid.
    pub fn submit(&self) -> Option<IdentityInfo> {
        if !self.is_valid() {
            return None;
        }

        Some(IdentityInfo {
            first_name: self.first_name.clone(),
            date_of_birth: self.date_of_birth.clone(),
        })
    }
}
