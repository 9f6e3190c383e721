//! Project repository. Project codes are unique per organization.

use atlas_core::models::Project;
use atlas_core::AppError;
use sqlx::{Postgres, QueryBuilder};

use crate::listing::{build_order_by, null_if_empty, PageParams};
use crate::session::TenantSession;

const PROJECT_COLUMNS: &str = "id, org_id, code, name, description, created_at, updated_at";

const PROJECT_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("code", "code"),
    ("name", "name"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

fn map_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateProjectCode,
        _ => err.into(),
    }
}

pub async fn list(
    session: &mut TenantSession,
    q: Option<&str>,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<Project>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PROJECT_COLUMNS}, COUNT(*) OVER() AS total_count FROM projects WHERE true"
    ));
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    if let Some(q) = q {
        let pattern = format!("%{q}%");
        qb.push(" AND (code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(build_order_by(sort, PROJECT_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        project: Project,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.project).collect(), total))
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<Project>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = "
    ));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let project = qb
        .build_query_as::<Project>()
        .fetch_optional(session.conn())
        .await?;
    Ok(project)
}

pub async fn create(
    session: &mut TenantSession,
    code: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Project, AppError> {
    let org_id = session.org_id();
    let project = sqlx::query_as(&format!(
        "INSERT INTO projects (org_id, code, name, description) VALUES ($1, $2, $3, $4) \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(org_id)
    .bind(code)
    .bind(name)
    .bind(description)
    .fetch_one(session.conn())
    .await
    .map_err(map_unique)?;
    Ok(project)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    code: Option<&str>,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Project>, AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = now()");
    if let Some(code) = code {
        qb.push(", code = ").push_bind(code.to_string());
    }
    if let Some(name) = name {
        qb.push(", name = ").push_bind(name.to_string());
    }
    if let Some(description) = description {
        qb.push(", description = ")
            .push_bind(null_if_empty(description).map(str::to_string));
    }
    qb.push(" WHERE id = ").push_bind(id);
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(format!(" RETURNING {PROJECT_COLUMNS}"));
    let project = qb
        .build_query_as::<Project>()
        .fetch_optional(session.conn())
        .await
        .map_err(map_unique)?;
    Ok(project)
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM projects WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}
