//! Vendor repository.

use atlas_core::models::Vendor;
use atlas_core::AppError;
use sqlx::{Postgres, QueryBuilder};

use crate::listing::{build_order_by, null_if_empty, PageParams};
use crate::session::TenantSession;

const VENDOR_COLUMNS: &str = "id, org_id, name, email, phone, notes, created_at, updated_at";

const VENDOR_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

pub async fn list(
    session: &mut TenantSession,
    q: Option<&str>,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<Vendor>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {VENDOR_COLUMNS}, COUNT(*) OVER() AS total_count FROM vendors WHERE true"
    ));
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    if let Some(q) = q {
        qb.push(" AND name ILIKE ").push_bind(format!("%{q}%"));
    }
    qb.push(build_order_by(sort, VENDOR_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        vendor: Vendor,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.vendor).collect(), total))
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<Vendor>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb =
        QueryBuilder::<Postgres>::new(format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = "));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let vendor = qb
        .build_query_as::<Vendor>()
        .fetch_optional(session.conn())
        .await?;
    Ok(vendor)
}

pub async fn create(
    session: &mut TenantSession,
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    notes: Option<&str>,
) -> Result<Vendor, AppError> {
    let org_id = session.org_id();
    let vendor = sqlx::query_as(&format!(
        "INSERT INTO vendors (org_id, name, email, phone, notes) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {VENDOR_COLUMNS}"
    ))
    .bind(org_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(notes)
    .fetch_one(session.conn())
    .await?;
    Ok(vendor)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<Vendor>, AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE vendors SET updated_at = now()");
    if let Some(name) = name {
        qb.push(", name = ").push_bind(name.to_string());
    }
    if let Some(email) = email {
        qb.push(", email = ")
            .push_bind(null_if_empty(email).map(str::to_string));
    }
    if let Some(phone) = phone {
        qb.push(", phone = ")
            .push_bind(null_if_empty(phone).map(str::to_string));
    }
    if let Some(notes) = notes {
        qb.push(", notes = ")
            .push_bind(null_if_empty(notes).map(str::to_string));
    }
    qb.push(" WHERE id = ").push_bind(id);
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(format!(" RETURNING {VENDOR_COLUMNS}"));
    let vendor = qb
        .build_query_as::<Vendor>()
        .fetch_optional(session.conn())
        .await?;
    Ok(vendor)
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM vendors WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}
