mod request;
mod response;

pub use request::*;
pub use response::*;

use serde::Deserialize;

pub const FIELD_REQUIRED: &str = "This field is required.";

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Validation messages keyed by form field. Messages that belong to the form
/// as a whole use the `__all__` key.
#[derive(Debug, Default, Clone)]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, name: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(field, _)| *field == name)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn non_field(&self) -> Vec<&str> {
        self.field(Self::NON_FIELD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_grouped_by_field() {
        let mut errors = FormErrors::default();
        assert!(errors.is_empty());
        errors.add("text", FIELD_REQUIRED);
        errors.add(FormErrors::NON_FIELD, "Something is off.");
        errors.add("text", "Too short.");
        assert_eq!(errors.field("text"), vec![FIELD_REQUIRED, "Too short."]);
        assert_eq!(errors.non_field(), vec!["Something is off."]);
        assert!(errors.field("group").is_empty());
    }
}
