//! User repository.
//!
//! Login and the self-service profile operations run on the pool: they act on
//! the caller's own row and happen before (or independently of) a tenant
//! session. Administrative operations run on the tenant session and carry the
//! explicit org filter unless the caller is the main tenant.

use atlas_core::models::User;
use atlas_core::AppError;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::listing::{build_order_by, PageParams};
use crate::session::TenantSession;

const USER_COLUMNS: &str = "id, email, password_digest, first_name, last_name, org_id, roles, \
                            is_active, created_at, updated_at, last_login_at";

const USER_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("email", "email"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_digest: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub org_id: i64,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub org_id: Option<i64>,
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.org_id.is_none()
            && self.roles.is_none()
            && self.is_active.is_none()
    }
}

fn map_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Duplicate("User with this email already exists".to_string())
        }
        _ => err.into(),
    }
}

/// Fetch an active user by email for login. Deliberately unscoped: login
/// happens before any tenant context exists.
pub async fn find_active_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = true"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn touch_last_login(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<Option<User>, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
    if let Some(first_name) = first_name {
        qb.push(", first_name = ").push_bind(first_name.to_string());
    }
    if let Some(last_name) = last_name {
        qb.push(", last_name = ").push_bind(last_name.to_string());
    }
    qb.push(" WHERE id = ")
        .push_bind(user_id)
        .push(format!(" RETURNING {USER_COLUMNS}"));
    let user = qb.build_query_as::<User>().fetch_optional(pool).await?;
    Ok(user)
}

pub async fn update_password(
    pool: &PgPool,
    user_id: i64,
    password_digest: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_digest = $1, updated_at = now() WHERE id = $2")
        .bind(password_digest)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list(
    session: &mut TenantSession,
    org_filter: Option<i64>,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<User>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {USER_COLUMNS}, COUNT(*) OVER() AS total_count FROM users WHERE true"
    ));
    if session.is_main() {
        // Only the main tenant may narrow the listing to an arbitrary org.
        if let Some(org) = org_filter {
            qb.push(" AND org_id = ").push_bind(org);
        }
    } else {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(build_order_by(sort, USER_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        user: User,
        total_count: i64,
    }

    let rows: Vec<Row> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.user).collect(), total))
}

pub async fn create(session: &mut TenantSession, new: NewUser) -> Result<User, AppError> {
    let user = sqlx::query_as(&format!(
        "INSERT INTO users (email, password_digest, first_name, last_name, org_id, roles) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new.email)
    .bind(&new.password_digest)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(new.org_id)
    .bind(&new.roles)
    .fetch_one(session.conn())
    .await
    .map_err(map_unique)?;
    Ok(user)
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<User>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb =
        QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id = "));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let user = qb
        .build_query_as::<User>()
        .fetch_optional(session.conn())
        .await?;
    Ok(user)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    patch: UserPatch,
) -> Result<Option<User>, AppError> {
    let org_id = session.org_id();
    let viewer_is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
    if let Some(first_name) = &patch.first_name {
        qb.push(", first_name = ").push_bind(first_name.clone());
    }
    if let Some(last_name) = &patch.last_name {
        qb.push(", last_name = ").push_bind(last_name.clone());
    }
    if let Some(new_org) = patch.org_id {
        qb.push(", org_id = ").push_bind(new_org);
    }
    if let Some(roles) = &patch.roles {
        qb.push(", roles = ").push_bind(roles.clone());
    }
    if let Some(is_active) = patch.is_active {
        qb.push(", is_active = ").push_bind(is_active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    if !viewer_is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(format!(" RETURNING {USER_COLUMNS}"));

    let user = qb
        .build_query_as::<User>()
        .fetch_optional(session.conn())
        .await
        .map_err(map_unique)?;
    Ok(user)
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM users WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}

/// Number of active org_admins in `org_id` other than `excluding_user_id`.
/// Zero means the excluded user is the last one and must not be removed or
/// deactivated.
pub async fn count_other_active_admins(
    session: &mut TenantSession,
    org_id: i64,
    excluding_user_id: i64,
) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users \
         WHERE org_id = $1 AND 'org_admin' = ANY(roles) AND is_active = true AND id != $2",
    )
    .bind(org_id)
    .bind(excluding_user_id)
    .fetch_one(session.conn())
    .await?;
    Ok(count)
}
