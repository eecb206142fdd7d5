use serde::{Deserialize, Serialize};

/// Patient record as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "crate::core::serde_ext::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Request body for creating or updating a patient
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

impl PatientInput {
    /// Client-side checks run before the form is sent
    pub fn validate(&self) -> crate::core::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::core::error::DashboardError::Validation(
                "Patient name is required".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(crate::core::error::DashboardError::Validation(
                    format!("'{}' is not a valid email address", email),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_with_numeric_id() {
        let patient: Patient =
            serde_json::from_str(r#"{"id": 5, "name": "Lena Park", "age": 67, "gender": "F"}"#).unwrap();
        assert_eq!(patient.id, "5");
        assert_eq!(patient.age, Some(67));
        assert!(patient.phone.is_none());
    }

    #[test]
    fn test_input_validation() {
        assert!(PatientInput::default().validate().is_err());

        let mut input = PatientInput {
            name: "Lena Park".into(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        input.email = Some("lena.example.org".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_input_skips_empty_fields() {
        let input = PatientInput {
            name: "Lena Park".into(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1957, 3, 14),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["date_of_birth"], "1957-03-14");
        assert!(json.get("phone").is_none());
    }
}
