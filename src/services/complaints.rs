//! Complaints service ("Libro de Reclamaciones")

use crate::{
    error::AppResult,
    models::complaint::{ComplaintReceipt, CreateComplaint},
    repository::Repository,
};

use super::email::EmailService;

#[derive(Clone)]
pub struct ComplaintsService {
    repository: Repository,
    email: EmailService,
}

impl ComplaintsService {
    pub fn new(repository: Repository, email: EmailService) -> Self {
        Self { repository, email }
    }

    /// Store a complaint and notify by email. A mail failure does not undo
    /// the registration.
    pub async fn submit(&self, data: &CreateComplaint) -> AppResult<ComplaintReceipt> {
        let complaint = self.repository.complaints.create(data).await?;
        tracing::info!(complaint_id = %complaint.id, claim_type = %complaint.claim_type, "complaint registered");

        if let Err(e) = self.email.send_complaint_notification(&complaint).await {
            tracing::warn!(complaint_id = %complaint.id, "complaint notification not sent: {}", e);
        }

        Ok(ComplaintReceipt {
            message: "Reclamo registrado correctamente".to_string(),
            id: complaint.id,
        })
    }
}
