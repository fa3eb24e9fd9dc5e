//! Consumer complaint model ("Libro de Reclamaciones")

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Stored complaint
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    pub consumer_name: String,
    pub consumer_doc_type: String,
    pub consumer_doc_number: String,
    pub consumer_address: Option<String>,
    pub consumer_department: Option<String>,
    pub consumer_province: Option<String>,
    pub consumer_district: Option<String>,
    pub consumer_phone: Option<String>,
    pub consumer_email: Option<String>,
    pub is_minor: bool,
    pub rep_name: Option<String>,
    pub rep_doc_type: Option<String>,
    pub rep_doc_number: Option<String>,
    pub rep_address: Option<String>,
    pub rep_department: Option<String>,
    pub rep_province: Option<String>,
    pub rep_district: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
    /// PRODUCTO or SERVICIO
    pub good_type: String,
    #[schema(value_type = f64)]
    pub claim_amount: Decimal,
    pub good_description: String,
    /// RECLAMO (about the good) or QUEJA (about the service/attention)
    pub claim_type: String,
    pub claim_detail: String,
    pub order_request: String,
    pub created_at: DateTime<Utc>,
}

fn validate_claim_type(value: &str) -> Result<(), ValidationError> {
    match value.to_uppercase().as_str() {
        "RECLAMO" | "QUEJA" => Ok(()),
        _ => Err(ValidationError::new("claimType must be RECLAMO or QUEJA")),
    }
}

fn validate_claim_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        Err(ValidationError::new("claimAmount cannot be negative"))
    } else {
        Ok(())
    }
}

/// Complaint form submission
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaint {
    #[validate(length(min = 1, message = "consumerName is required"))]
    pub consumer_name: String,
    #[validate(length(min = 1, message = "consumerDocType is required"))]
    pub consumer_doc_type: String,
    #[validate(length(min = 1, message = "consumerDocNumber is required"))]
    pub consumer_doc_number: String,
    pub consumer_address: Option<String>,
    pub consumer_department: Option<String>,
    pub consumer_province: Option<String>,
    pub consumer_district: Option<String>,
    pub consumer_phone: Option<String>,
    /// Empty string is accepted and treated as absent
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[validate(email(message = "Invalid consumerEmail"))]
    pub consumer_email: Option<String>,
    pub is_minor: Option<bool>,
    pub rep_name: Option<String>,
    pub rep_doc_type: Option<String>,
    pub rep_doc_number: Option<String>,
    pub rep_address: Option<String>,
    pub rep_department: Option<String>,
    pub rep_province: Option<String>,
    pub rep_district: Option<String>,
    pub rep_phone: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[validate(email(message = "Invalid repEmail"))]
    pub rep_email: Option<String>,
    #[validate(length(min = 1, message = "goodType is required"))]
    pub good_type: String,
    #[validate(custom(function = "validate_claim_amount"))]
    #[schema(value_type = f64)]
    pub claim_amount: Decimal,
    #[validate(length(min = 1, message = "goodDescription is required"))]
    pub good_description: String,
    #[validate(custom(function = "validate_claim_type"))]
    pub claim_type: String,
    #[validate(length(min = 1, message = "claimDetail is required"))]
    pub claim_detail: String,
    #[validate(length(min = 1, message = "orderRequest is required"))]
    pub order_request: String,
}

/// Complaint registration acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintReceipt {
    pub message: String,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> serde_json::Value {
        json!({
            "consumerName": "Ana Quispe",
            "consumerDocType": "DNI",
            "consumerDocNumber": "45678912",
            "consumerEmail": "",
            "goodType": "SERVICIO",
            "claimAmount": 120.5,
            "goodDescription": "Entrada general",
            "claimType": "queja",
            "claimDetail": "El evento empezó dos horas tarde",
            "orderRequest": "Devolución parcial"
        })
    }

    #[test]
    fn test_empty_email_is_accepted() {
        let dto: CreateComplaint = serde_json::from_value(form()).unwrap();
        assert_eq!(dto.consumer_email, None);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut value = form();
        value["consumerEmail"] = json!("not-an-email");
        let dto: CreateComplaint = serde_json::from_value(value).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_claim_type_must_be_known() {
        let mut value = form();
        value["claimType"] = json!("SUGERENCIA");
        let dto: CreateComplaint = serde_json::from_value(value).unwrap();
        assert!(dto.validate().is_err());
    }
}
