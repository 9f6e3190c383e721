//! Generic inventory repository. `asset_tag` is globally unique.

use atlas_core::models::{CreateItemRequest, Item, UpdateItemRequest};
use atlas_core::AppError;
use sqlx::{Postgres, QueryBuilder};

use crate::listing::{build_order_by, null_if_empty, PageParams};
use crate::session::TenantSession;

const ITEM_COLUMNS: &str = "id, org_id, asset_tag, name, manufacturer, model, device_type, \
                            site, installed_at, warranty_end, notes, created_at, updated_at";

const ITEM_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("asset_tag", "asset_tag"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

fn map_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateAssetTag,
        _ => err.into(),
    }
}

pub async fn list(
    session: &mut TenantSession,
    q: Option<&str>,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<Item>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ITEM_COLUMNS}, COUNT(*) OVER() AS total_count FROM inventory WHERE true"
    ));
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    if let Some(q) = q {
        let pattern = format!("%{q}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR asset_tag ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(build_order_by(sort, ITEM_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        item: Item,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.item).collect(), total))
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<Item>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ITEM_COLUMNS} FROM inventory WHERE id = "
    ));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let item = qb
        .build_query_as::<Item>()
        .fetch_optional(session.conn())
        .await?;
    Ok(item)
}

pub async fn create(
    session: &mut TenantSession,
    req: &CreateItemRequest,
) -> Result<Item, AppError> {
    let org_id = session.org_id();
    let item = sqlx::query_as(&format!(
        "INSERT INTO inventory (org_id, asset_tag, name, manufacturer, model, device_type, \
                                site, installed_at, warranty_end, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(org_id)
    .bind(&req.asset_tag)
    .bind(&req.name)
    .bind(&req.manufacturer)
    .bind(&req.model)
    .bind(&req.device_type)
    .bind(&req.site)
    .bind(req.installed_at)
    .bind(req.warranty_end)
    .bind(&req.notes)
    .fetch_one(session.conn())
    .await
    .map_err(map_unique)?;
    Ok(item)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    req: &UpdateItemRequest,
) -> Result<Option<Item>, AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE inventory SET updated_at = now()");
    if let Some(asset_tag) = &req.asset_tag {
        qb.push(", asset_tag = ").push_bind(asset_tag.clone());
    }
    if let Some(name) = &req.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(manufacturer) = &req.manufacturer {
        qb.push(", manufacturer = ")
            .push_bind(null_if_empty(manufacturer).map(str::to_string));
    }
    if let Some(model) = &req.model {
        qb.push(", model = ")
            .push_bind(null_if_empty(model).map(str::to_string));
    }
    if let Some(device_type) = &req.device_type {
        qb.push(", device_type = ")
            .push_bind(null_if_empty(device_type).map(str::to_string));
    }
    if let Some(site) = &req.site {
        qb.push(", site = ")
            .push_bind(null_if_empty(site).map(str::to_string));
    }
    if let Some(installed_at) = req.installed_at {
        qb.push(", installed_at = ").push_bind(installed_at);
    }
    if let Some(warranty_end) = req.warranty_end {
        qb.push(", warranty_end = ").push_bind(warranty_end);
    }
    if let Some(notes) = &req.notes {
        qb.push(", notes = ")
            .push_bind(null_if_empty(notes).map(str::to_string));
    }
    qb.push(" WHERE id = ").push_bind(id);
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(format!(" RETURNING {ITEM_COLUMNS}"));
    let item = qb
        .build_query_as::<Item>()
        .fetch_optional(session.conn())
        .await
        .map_err(map_unique)?;
    Ok(item)
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM inventory WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}
