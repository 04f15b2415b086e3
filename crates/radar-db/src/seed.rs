use radar_core::Business;
use sqlx::PgPool;

use crate::DbError;

/// Upsert seed partners into the database, keyed by id.
///
/// Returns the number of partners processed (inserted or updated). All
/// upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Validation`] if a partner is incomplete, or
/// [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_partners(pool: &PgPool, partners: &[Business]) -> Result<usize, DbError> {
    for partner in partners {
        partner.validate()?;
    }

    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for partner in partners {
        sqlx::query(
            "INSERT INTO businesses \
                 (id, name, sector, category, description, address, city, office_phone, \
                  whatsapp, email, website, services, gallery, x, y, rating, reliability, \
                  status, logo, is_premium, industrial_capacity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 sector = EXCLUDED.sector, \
                 category = EXCLUDED.category, \
                 description = EXCLUDED.description, \
                 address = EXCLUDED.address, \
                 city = EXCLUDED.city, \
                 office_phone = EXCLUDED.office_phone, \
                 whatsapp = EXCLUDED.whatsapp, \
                 email = EXCLUDED.email, \
                 website = EXCLUDED.website, \
                 services = EXCLUDED.services, \
                 gallery = EXCLUDED.gallery, \
                 x = EXCLUDED.x, \
                 y = EXCLUDED.y, \
                 rating = EXCLUDED.rating, \
                 reliability = EXCLUDED.reliability, \
                 status = EXCLUDED.status, \
                 logo = EXCLUDED.logo, \
                 is_premium = EXCLUDED.is_premium, \
                 industrial_capacity = EXCLUDED.industrial_capacity, \
                 updated_at = NOW()",
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
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "seeded partners");
    Ok(count)
}
