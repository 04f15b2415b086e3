//! Database operations for the `businesses` table.

use chrono::{DateTime, Utc};
use radar_core::{Business, PartnerStatus, Sector};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartnerRow {
    pub seq: i64,
    pub id: String,
    pub name: String,
    pub sector: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub office_phone: String,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub services: Vec<String>,
    pub gallery: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub rating: f64,
    pub reliability: i16,
    pub status: String,
    pub logo: String,
    pub is_premium: bool,
    pub industrial_capacity: Option<String>,
    pub view_count: Option<i64>,
    pub lead_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PartnerRow> for Business {
    type Error = DbError;

    fn try_from(row: PartnerRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| DbError::InvalidRow {
            id: row.id.clone(),
            reason,
        };
        let sector = row
            .sector
            .parse::<Sector>()
            .map_err(|e| invalid(e.to_string()))?;
        let status = row
            .status
            .parse::<PartnerStatus>()
            .map_err(|e| invalid(e.to_string()))?;
        let reliability = u8::try_from(row.reliability)
            .map_err(|_| invalid(format!("reliability {} out of range", row.reliability)))?;

        Ok(Business {
            id: row.id,
            name: row.name,
            sector,
            category: row.category,
            description: row.description,
            address: row.address,
            city: row.city,
            office_phone: row.office_phone,
            whatsapp: row.whatsapp,
            email: row.email,
            website: row.website,
            services: row.services,
            gallery: row.gallery,
            x: row.x,
            y: row.y,
            rating: row.rating,
            reliability,
            status,
            logo: row.logo,
            is_premium: row.is_premium,
            industrial_capacity: row.industrial_capacity,
            view_count: row.view_count,
            lead_count: row.lead_count,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT seq, id, name, sector, category, description, address, city, \
        office_phone, whatsapp, email, website, services, gallery, x, y, rating, reliability, \
        status, logo, is_premium, industrial_capacity, view_count, lead_count, created_at, updated_at \
     FROM businesses";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every partner, premium partners first, otherwise in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored sector/status/reliability cannot be decoded.
pub async fn list_partners(pool: &PgPool) -> Result<Vec<Business>, DbError> {
    let rows = sqlx::query_as::<_, PartnerRow>(&format!(
        "{SELECT_COLUMNS} ORDER BY is_premium DESC, seq"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Business::try_from).collect()
}

/// Returns a single partner by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_partner(pool: &PgPool, id: &str) -> Result<Option<Business>, DbError> {
    let row = sqlx::query_as::<_, PartnerRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Business::try_from).transpose()
}

/// Inserts a new partner. The id is supplied by the caller.
///
/// # Errors
///
/// Returns [`DbError::Validation`] without touching the database when the
/// record is incomplete, or [`DbError::Sqlx`] if the insert fails (for
/// example on a duplicate id).
pub async fn insert_partner(pool: &PgPool, partner: &Business) -> Result<(), DbError> {
    partner.validate()?;

    sqlx::query(
        "INSERT INTO businesses \
             (id, name, sector, category, description, address, city, office_phone, whatsapp, \
              email, website, services, gallery, x, y, rating, reliability, status, logo, \
              is_premium, industrial_capacity, view_count, lead_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                 $18, $19, $20, $21, $22, $23)",
    )
    .bind(&partner.id)
    .bind(&partner.name)
    .bind(partner.sector.label())
    .bind(&partner.category)
    .bind(&partner.description)
    .bind(&partner.address)
    .bind(&partner.city)
    .bind(&partner.office_phone)
    .bind(&partner.whatsapp)
    .bind(&partner.email)
    .bind(&partner.website)
    .bind(&partner.services)
    .bind(&partner.gallery)
    .bind(partner.x)
    .bind(partner.y)
    .bind(partner.rating)
    .bind(i16::from(partner.reliability))
    .bind(partner.status.to_string())
    .bind(&partner.logo)
    .bind(partner.is_premium)
    .bind(&partner.industrial_capacity)
    .bind(partner.view_count)
    .bind(partner.lead_count)
    .execute(pool)
    .await?;

    tracing::debug!(partner_id = %partner.id, "partner inserted");
    Ok(())
}

/// Replaces every field of the partner identified by `id`.
///
/// # Errors
///
/// Returns [`DbError::Validation`] for an incomplete record,
/// [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`].
pub async fn update_partner(pool: &PgPool, id: &str, partner: &Business) -> Result<(), DbError> {
    partner.validate()?;

    let rows_affected = sqlx::query(
        "UPDATE businesses SET \
             name = $2, sector = $3, category = $4, description = $5, address = $6, \
             city = $7, office_phone = $8, whatsapp = $9, email = $10, website = $11, \
             services = $12, gallery = $13, x = $14, y = $15, rating = $16, \
             reliability = $17, status = $18, logo = $19, is_premium = $20, \
             industrial_capacity = $21, view_count = $22, lead_count = $23, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&partner.name)
    .bind(partner.sector.label())
    .bind(&partner.category)
    .bind(&partner.description)
    .bind(&partner.address)
    .bind(&partner.city)
    .bind(&partner.office_phone)
    .bind(&partner.whatsapp)
    .bind(&partner.email)
    .bind(&partner.website)
    .bind(&partner.services)
    .bind(&partner.gallery)
    .bind(partner.x)
    .bind(partner.y)
    .bind(partner.rating)
    .bind(i16::from(partner.reliability))
    .bind(partner.status.to_string())
    .bind(&partner.logo)
    .bind(partner.is_premium)
    .bind(&partner.industrial_capacity)
    .bind(partner.view_count)
    .bind(partner.lead_count)
    .execute(pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    tracing::debug!(partner_id = %id, "partner updated");
    Ok(())
}

/// Deletes the partner identified by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`].
pub async fn delete_partner(pool: &PgPool, id: &str) -> Result<(), DbError> {
    let rows_affected = sqlx::query("DELETE FROM businesses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    tracing::debug!(partner_id = %id, "partner deleted");
    Ok(())
}
