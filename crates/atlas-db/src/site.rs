//! Site repository.

use atlas_core::models::Site;
use atlas_core::AppError;
use sqlx::{Postgres, QueryBuilder};

use crate::listing::{build_order_by, null_if_empty, PageParams};
use crate::session::TenantSession;

const SITE_COLUMNS: &str = "id, org_id, name, location, notes, created_at, updated_at";

const SITE_SORT: &[(&str, &str)] = &[
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
) -> Result<(Vec<Site>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {SITE_COLUMNS}, COUNT(*) OVER() AS total_count FROM sites WHERE true"
    ));
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    if let Some(q) = q {
        qb.push(" AND name ILIKE ").push_bind(format!("%{q}%"));
    }
    qb.push(build_order_by(sort, SITE_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        site: Site,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.site).collect(), total))
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<Site>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb =
        QueryBuilder::<Postgres>::new(format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = "));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let site = qb
        .build_query_as::<Site>()
        .fetch_optional(session.conn())
        .await?;
    Ok(site)
}

pub async fn create(
    session: &mut TenantSession,
    name: &str,
    location: Option<&str>,
    notes: Option<&str>,
) -> Result<Site, AppError> {
    let org_id = session.org_id();
    let site = sqlx::query_as(&format!(
        "INSERT INTO sites (org_id, name, location, notes) VALUES ($1, $2, $3, $4) \
         RETURNING {SITE_COLUMNS}"
    ))
    .bind(org_id)
    .bind(name)
    .bind(location)
    .bind(notes)
    .fetch_one(session.conn())
    .await?;
    Ok(site)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    name: Option<&str>,
    location: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<Site>, AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE sites SET updated_at = now()");
    if let Some(name) = name {
        qb.push(", name = ").push_bind(name.to_string());
    }
    if let Some(location) = location {
        qb.push(", location = ")
            .push_bind(null_if_empty(location).map(str::to_string));
    }
    if let Some(notes) = notes {
        qb.push(", notes = ")
            .push_bind(null_if_empty(notes).map(str::to_string));
    }
    qb.push(" WHERE id = ").push_bind(id);
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(format!(" RETURNING {SITE_COLUMNS}"));
    let site = qb
        .build_query_as::<Site>()
        .fetch_optional(session.conn())
        .await?;
    Ok(site)
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM sites WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}
