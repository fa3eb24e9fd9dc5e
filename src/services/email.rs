//! Email service for complaint notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::{future::Future, str::FromStr};

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::complaint::Complaint,
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Notify the complaints mailbox, and the consumer when an address was
    /// given. Every message is attempted even when an earlier one fails.
    pub async fn send_complaint_notification(&self, complaint: &Complaint) -> AppResult<()> {
        let emails = complaint_emails(complaint, &self.config.complaints_to);
        deliver_each(emails, |email| async move {
            self.send_email(&email.to, &email.subject, &email.body).await
        })
        .await
    }

    /// Plain-text email over SMTP
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Injoyplan");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(
                username.clone(),
                password.clone(),
            ))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        // SmtpTransport blocks
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

/// A plain-text message waiting to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Messages for a new complaint: the complaints mailbox first, then the
/// consumer's copy when they left an address
pub fn complaint_emails(complaint: &Complaint, complaints_to: &str) -> Vec<OutgoingEmail> {
    let subject = format!(
        "Libro de Reclamaciones - {} {}",
        complaint.claim_type, complaint.id
    );
    let body = complaint_body(complaint);

    let mut emails = vec![OutgoingEmail {
        to: complaints_to.to_string(),
        subject: subject.clone(),
        body: body.clone(),
    }];
    if let Some(ref consumer) = complaint.consumer_email {
        emails.push(OutgoingEmail {
            to: consumer.clone(),
            subject,
            body: format!(
                "Hemos recibido su {} con el código {}.\n\n{}",
                complaint.claim_type.to_lowercase(),
                complaint.id,
                body
            ),
        });
    }
    emails
}

/// Send every message, logging each failure. Fails when at least one
/// message could not be sent.
async fn deliver_each<F, Fut>(emails: Vec<OutgoingEmail>, mut send: F) -> AppResult<()>
where
    F: FnMut(OutgoingEmail) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let total = emails.len();
    let mut failed = 0;
    for email in emails {
        let to = email.to.clone();
        if let Err(e) = send(email).await {
            tracing::error!(to = %to, "failed to send email: {}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(AppError::Internal(format!(
            "{} of {} emails could not be sent",
            failed, total
        )));
    }
    Ok(())
}

fn line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
}

/// Text of a complaint notification
pub fn complaint_body(c: &Complaint) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Registro: {}\nFecha: {}\nTipo: {}\n\n",
        c.id,
        c.created_at.format("%Y-%m-%d %H:%M UTC"),
        c.claim_type
    ));

    out.push_str("CONSUMIDOR\n");
    line(&mut out, "Nombre", Some(&c.consumer_name));
    line(
        &mut out,
        "Documento",
        Some(&format!("{} {}", c.consumer_doc_type, c.consumer_doc_number)),
    );
    line(&mut out, "Dirección", c.consumer_address.as_deref());
    line(&mut out, "Departamento", c.consumer_department.as_deref());
    line(&mut out, "Provincia", c.consumer_province.as_deref());
    line(&mut out, "Distrito", c.consumer_district.as_deref());
    line(&mut out, "Teléfono", c.consumer_phone.as_deref());
    line(&mut out, "Email", c.consumer_email.as_deref());

    if c.is_minor {
        out.push_str("\nAPODERADO (consumidor menor de edad)\n");
        line(&mut out, "Nombre", c.rep_name.as_deref());
        line(&mut out, "Tipo de documento", c.rep_doc_type.as_deref());
        line(&mut out, "Número de documento", c.rep_doc_number.as_deref());
        line(&mut out, "Dirección", c.rep_address.as_deref());
        line(&mut out, "Departamento", c.rep_department.as_deref());
        line(&mut out, "Provincia", c.rep_province.as_deref());
        line(&mut out, "Distrito", c.rep_district.as_deref());
        line(&mut out, "Teléfono", c.rep_phone.as_deref());
        line(&mut out, "Email", c.rep_email.as_deref());
    }

    out.push_str("\nBIEN CONTRATADO\n");
    line(&mut out, "Tipo", Some(&c.good_type));
    line(&mut out, "Monto reclamado", Some(&c.claim_amount.to_string()));
    line(&mut out, "Descripción", Some(&c.good_description));

    out.push_str("\nDETALLE\n");
    out.push_str(&c.claim_detail);
    out.push_str("\n\nPEDIDO DEL CONSUMIDOR\n");
    out.push_str(&c.order_request);
    out.push('\n');
    out
}
