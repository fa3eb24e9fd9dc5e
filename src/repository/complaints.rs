//! Complaints repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::complaint::{Complaint, CreateComplaint},
};

#[derive(Clone)]
pub struct ComplaintsRepository {
    pool: Pool<Postgres>,
}

impl ComplaintsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateComplaint) -> AppResult<Complaint> {
        let row = sqlx::query_as::<_, Complaint>(
            r#"
            INSERT INTO complaints (
                consumer_name, consumer_doc_type, consumer_doc_number, consumer_address,
                consumer_department, consumer_province, consumer_district,
                consumer_phone, consumer_email, is_minor,
                rep_name, rep_doc_type, rep_doc_number, rep_address,
                rep_department, rep_province, rep_district, rep_phone, rep_email,
                good_type, claim_amount, good_description,
                claim_type, claim_detail, order_request
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19,
                $20, $21, $22, $23, $24, $25
            )
            RETURNING *
            "#,
        )
        .bind(&data.consumer_name)
        .bind(&data.consumer_doc_type)
        .bind(&data.consumer_doc_number)
        .bind(&data.consumer_address)
        .bind(&data.consumer_department)
        .bind(&data.consumer_province)
        .bind(&data.consumer_district)
        .bind(&data.consumer_phone)
        .bind(&data.consumer_email)
        .bind(data.is_minor.unwrap_or(false))
        .bind(&data.rep_name)
        .bind(&data.rep_doc_type)
        .bind(&data.rep_doc_number)
        .bind(&data.rep_address)
        .bind(&data.rep_department)
        .bind(&data.rep_province)
        .bind(&data.rep_district)
        .bind(&data.rep_phone)
        .bind(&data.rep_email)
        .bind(data.good_type.to_uppercase())
        .bind(data.claim_amount)
        .bind(&data.good_description)
        .bind(data.claim_type.to_uppercase())
        .bind(&data.claim_detail)
        .bind(&data.order_request)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
