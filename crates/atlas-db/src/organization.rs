//! Organization repository. Organizations are the tenancy roots themselves,
//! so these operations are not org-scoped; the handlers restrict them to the
//! main tenant.

use atlas_core::models::organization::MAIN_TENANT_ORG_ID;
use atlas_core::models::{Organization, OrganizationStats};
use atlas_core::AppError;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::listing::{build_order_by, PageParams};

const ORG_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

/// Tenant-scoped tables checked before an organization may be deleted.
const DEPENDENT_TABLES: &[&str] = &["users", "sites", "vendors", "projects", "inventory", "assets"];

fn map_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Duplicate("Organization with this name already exists".to_string())
        }
        _ => err.into(),
    }
}

pub async fn list(
    pool: &PgPool,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<Organization>, i64), AppError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT id, name, created_at, updated_at, COUNT(*) OVER() AS total_count \
         FROM organizations WHERE true",
    );
    qb.push(build_order_by(sort, ORG_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        org: Organization,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(pool).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.org).collect(), total))
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Organization>, AppError> {
    let org = sqlx::query_as(
        "SELECT id, name, created_at, updated_at FROM organizations WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(org)
}

pub async fn create(pool: &PgPool, name: &str) -> Result<Organization, AppError> {
    let org = sqlx::query_as(
        "INSERT INTO organizations (name) VALUES ($1) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(map_unique)?;
    Ok(org)
}

pub async fn rename(pool: &PgPool, id: i64, name: &str) -> Result<Option<Organization>, AppError> {
    let org = sqlx::query_as(
        "UPDATE organizations SET name = $1, updated_at = now() WHERE id = $2 \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(map_unique)?;
    Ok(org)
}

/// Delete an organization. Refuses the main tenant and any organization that
/// still owns rows in a tenant-scoped table.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    if id == MAIN_TENANT_ORG_ID {
        return Err(AppError::CannotDeleteMainTenant);
    }

    for table in DEPENDENT_TABLES {
        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {table} WHERE org_id = $1"))
                .bind(id)
                .fetch_one(pool)
                .await?;
        if count > 0 {
            return Err(AppError::CannotDeleteOrgWithData);
        }
    }

    let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn stats(pool: &PgPool, id: i64) -> Result<Option<OrganizationStats>, AppError> {
    let Some(org) = get(pool, id).await? else {
        return Ok(None);
    };

    async fn count(pool: &PgPool, table: &str, org_id: i64) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {table} WHERE org_id = $1"))
                .bind(org_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    Ok(Some(OrganizationStats {
        users: count(pool, "users", id).await?,
        sites: count(pool, "sites", id).await?,
        vendors: count(pool, "vendors", id).await?,
        projects: count(pool, "projects", id).await?,
        items: count(pool, "inventory", id).await?,
        organization: org,
    }))
}
