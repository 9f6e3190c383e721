//! Asset repository: the polymorphic core table, its switch/VLAN subtypes,
//! and the trigger-maintained per-site category counters.
//!
//! Asset and subtype writes always happen in one transaction so a subtype
//! failure rolls the asset back. Counter rows are updated by the database
//! trigger inside that same transaction, which is what gives readers
//! read-your-writes on `/sites/{id}/asset-categories`.

use atlas_core::models::{
    Asset, AssetSwitch, AssetVlan, SiteAssetCategory, SwitchListEntry, VlanListEntry,
};
use atlas_core::AppError;
use ipnetwork::IpNetwork;
use sqlx::{Connection, FromRow, Postgres, QueryBuilder};
use std::net::IpAddr;

use crate::listing::{build_order_by, null_if_empty, PageParams};
use crate::session::TenantSession;

const ASSET_COLUMNS: &str = "id, org_id, site_id, asset_type, name, vendor, model, serial, \
                             mgmt_ip, status, notes, extras, created_at, updated_at";

const ASSET_SORT: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("asset_type", "asset_type"),
    ("vendor", "vendor"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

const SWITCH_SORT: &[(&str, &str)] = &[
    ("id", "a.id"),
    ("name", "a.name"),
    ("asset_type", "a.asset_type"),
    ("vendor", "a.vendor"),
    ("created_at", "a.created_at"),
    ("updated_at", "a.updated_at"),
];

const VLAN_SORT: &[(&str, &str)] = &[
    ("id", "a.id"),
    ("name", "a.name"),
    ("asset_type", "a.asset_type"),
    ("vendor", "a.vendor"),
    ("vlan_id", "v.vlan_id"),
    ("created_at", "a.created_at"),
    ("updated_at", "a.updated_at"),
];

/// Typed input for an asset insert. IPs and CIDRs are parsed at the HTTP
/// boundary; by the time they reach here they are real addresses.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub site_id: i64,
    pub asset_type: String,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub mgmt_ip: Option<IpAddr>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub extras: serde_json::Value,
    pub switch: Option<SwitchAttrs>,
    pub vlan: Option<VlanAttrs>,
}

#[derive(Debug, Clone)]
pub struct SwitchAttrs {
    pub ports_total: Option<i32>,
    pub poe: Option<bool>,
    pub uplink_info: Option<String>,
    pub firmware: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VlanAttrs {
    pub vlan_id: i32,
    pub subnet: Option<IpNetwork>,
    pub gateway: Option<IpAddr>,
    pub purpose: Option<String>,
}

/// Partial update. `None` means "not provided"; provided empty strings clear
/// the column. `extras` is merged into the stored map key by key, never
/// replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub asset_type: Option<String>,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub mgmt_ip: Option<IpAddr>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub extras: Option<serde_json::Value>,
    pub switch: Option<SwitchAttrs>,
    pub vlan: Option<VlanAttrs>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub site_id: Option<i64>,
    pub asset_type: Option<String>,
    pub q: Option<String>,
}

fn map_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate(
            "asset with this serial already exists for this site and type".to_string(),
        ),
        _ => err.into(),
    }
}

pub async fn create(
    session: &mut TenantSession,
    new: NewAsset,
) -> Result<Asset, AppError> {
    let org_id = session.org_id();
    let mut tx = session.conn().begin().await?;

    let asset: Asset = sqlx::query_as(&format!(
        "INSERT INTO assets (org_id, site_id, asset_type, name, vendor, model, serial, \
                             mgmt_ip, status, notes, extras) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {ASSET_COLUMNS}"
    ))
    .bind(org_id)
    .bind(new.site_id)
    .bind(&new.asset_type)
    .bind(&new.name)
    .bind(&new.vendor)
    .bind(&new.model)
    .bind(&new.serial)
    .bind(new.mgmt_ip)
    .bind(&new.status)
    .bind(&new.notes)
    .bind(&new.extras)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_unique)?;

    if let Some(sw) = &new.switch {
        upsert_switch(&mut tx, asset.id, sw).await?;
    }
    if let Some(vlan) = &new.vlan {
        upsert_vlan(&mut tx, asset.id, vlan).await?;
    }

    tx.commit().await?;
    Ok(asset)
}

pub async fn get(session: &mut TenantSession, id: i64) -> Result<Option<Asset>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ASSET_COLUMNS} FROM assets WHERE id = "
    ));
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let asset = qb
        .build_query_as::<Asset>()
        .fetch_optional(session.conn())
        .await?;
    Ok(asset)
}

pub async fn update(
    session: &mut TenantSession,
    id: i64,
    patch: AssetPatch,
) -> Result<Option<Asset>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut tx = session.conn().begin().await?;

    let has_column_changes = patch.asset_type.is_some()
        || patch.name.is_some()
        || patch.vendor.is_some()
        || patch.model.is_some()
        || patch.serial.is_some()
        || patch.mgmt_ip.is_some()
        || patch.status.is_some()
        || patch.notes.is_some()
        || patch.extras.is_some();

    let asset: Option<Asset> = if has_column_changes {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE assets SET updated_at = now()");
        if let Some(asset_type) = &patch.asset_type {
            qb.push(", asset_type = ").push_bind(asset_type.clone());
        }
        if let Some(name) = &patch.name {
            qb.push(", name = ")
                .push_bind(null_if_empty(name).map(str::to_string));
        }
        if let Some(vendor) = &patch.vendor {
            qb.push(", vendor = ")
                .push_bind(null_if_empty(vendor).map(str::to_string));
        }
        if let Some(model) = &patch.model {
            qb.push(", model = ")
                .push_bind(null_if_empty(model).map(str::to_string));
        }
        if let Some(serial) = &patch.serial {
            qb.push(", serial = ")
                .push_bind(null_if_empty(serial).map(str::to_string));
        }
        if let Some(mgmt_ip) = patch.mgmt_ip {
            qb.push(", mgmt_ip = ").push_bind(mgmt_ip);
        }
        if let Some(status) = &patch.status {
            qb.push(", status = ")
                .push_bind(null_if_empty(status).map(str::to_string));
        }
        if let Some(notes) = &patch.notes {
            qb.push(", notes = ")
                .push_bind(null_if_empty(notes).map(str::to_string));
        }
        if let Some(extras) = &patch.extras {
            // Merge: declared keys replace, everything else is kept.
            qb.push(", extras = extras || ").push_bind(extras.clone());
        }
        qb.push(" WHERE id = ").push_bind(id);
        if !is_main {
            qb.push(" AND org_id = ").push_bind(org_id);
        }
        qb.push(format!(" RETURNING {ASSET_COLUMNS}"));

        qb.build_query_as::<Asset>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_unique)?
    } else {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = "
        ));
        qb.push_bind(id);
        if !is_main {
            qb.push(" AND org_id = ").push_bind(org_id);
        }
        qb.build_query_as::<Asset>()
            .fetch_optional(&mut *tx)
            .await?
    };

    let Some(asset) = asset else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(sw) = &patch.switch {
        upsert_switch(&mut tx, asset.id, sw).await?;
    }
    if let Some(vlan) = &patch.vlan {
        upsert_vlan(&mut tx, asset.id, vlan).await?;
    }

    tx.commit().await?;
    Ok(Some(asset))
}

pub async fn delete(session: &mut TenantSession, id: i64) -> Result<bool, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM assets WHERE id = ");
    qb.push_bind(id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    let result = qb.build().execute(session.conn()).await?;
    Ok(result.rows_affected() > 0)
}

async fn upsert_switch(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    asset_id: i64,
    sw: &SwitchAttrs,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO asset_switches (asset_id, ports_total, poe, uplink_info, firmware) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (asset_id) DO UPDATE SET \
             ports_total = EXCLUDED.ports_total, \
             poe = EXCLUDED.poe, \
             uplink_info = EXCLUDED.uplink_info, \
             firmware = EXCLUDED.firmware",
    )
    .bind(asset_id)
    .bind(sw.ports_total)
    .bind(sw.poe)
    .bind(&sw.uplink_info)
    .bind(&sw.firmware)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_vlan(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    asset_id: i64,
    vlan: &VlanAttrs,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO asset_vlans (asset_id, vlan_id, subnet, gateway, purpose) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (asset_id) DO UPDATE SET \
             vlan_id = EXCLUDED.vlan_id, \
             subnet = EXCLUDED.subnet, \
             gateway = EXCLUDED.gateway, \
             purpose = EXCLUDED.purpose",
    )
    .bind(asset_id)
    .bind(vlan.vlan_id)
    .bind(vlan.subnet)
    .bind(vlan.gateway)
    .bind(&vlan.purpose)
    .execute(&mut **tx)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate(
            "VLAN with this vlan_id already exists for this site".to_string(),
        ),
        _ => err.into(),
    })?;
    Ok(())
}

#[derive(FromRow)]
struct AssetRow {
    #[sqlx(flatten)]
    asset: Asset,
    total_count: i64,
}

pub async fn list(
    session: &mut TenantSession,
    filter: &AssetFilter,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<Asset>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {ASSET_COLUMNS}, COUNT(*) OVER() AS total_count FROM assets WHERE true"
    ));
    if !session.is_main() {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    if let Some(site_id) = filter.site_id {
        qb.push(" AND site_id = ").push_bind(site_id);
    }
    if let Some(asset_type) = &filter.asset_type {
        qb.push(" AND asset_type = ").push_bind(asset_type.clone());
    }
    if let Some(q) = &filter.q {
        qb.push(" AND name ILIKE ").push_bind(format!("%{q}%"));
    }
    qb.push(build_order_by(sort, ASSET_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let rows: Vec<AssetRow> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    Ok((rows.into_iter().map(|r| r.asset).collect(), total))
}

#[derive(FromRow)]
struct SwitchRow {
    #[sqlx(flatten)]
    asset: Asset,
    ports_total: Option<i32>,
    poe: Option<bool>,
    uplink_info: Option<String>,
    firmware: Option<String>,
    total_count: i64,
}

pub async fn list_switches(
    session: &mut TenantSession,
    filter: &AssetFilter,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<SwitchListEntry>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT a.id, a.org_id, a.site_id, a.asset_type, a.name, a.vendor, a.model, a.serial, \
                a.mgmt_ip, a.status, a.notes, a.extras, a.created_at, a.updated_at, \
                s.ports_total, s.poe, s.uplink_info, s.firmware, \
                COUNT(*) OVER() AS total_count \
         FROM assets a \
         LEFT JOIN asset_switches s ON a.id = s.asset_id \
         WHERE a.asset_type = 'switch'",
    );
    if !session.is_main() {
        qb.push(" AND a.org_id = ").push_bind(org_id);
    }
    if let Some(site_id) = filter.site_id {
        qb.push(" AND a.site_id = ").push_bind(site_id);
    }
    if let Some(q) = &filter.q {
        qb.push(" AND a.name ILIKE ").push_bind(format!("%{q}%"));
    }
    qb.push(build_order_by(sort, SWITCH_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let rows: Vec<SwitchRow> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    let entries = rows
        .into_iter()
        .map(|r| {
            let switch = Some(AssetSwitch {
                asset_id: r.asset.id,
                ports_total: r.ports_total,
                poe: r.poe,
                uplink_info: r.uplink_info,
                firmware: r.firmware,
            });
            SwitchListEntry {
                asset: r.asset,
                switch,
            }
        })
        .collect();
    Ok((entries, total))
}

#[derive(FromRow)]
struct VlanRow {
    #[sqlx(flatten)]
    asset: Asset,
    vlan_id: Option<i32>,
    subnet: Option<IpNetwork>,
    gateway: Option<IpAddr>,
    purpose: Option<String>,
    total_count: i64,
}

pub async fn list_vlans(
    session: &mut TenantSession,
    filter: &AssetFilter,
    page: PageParams,
    sort: &str,
) -> Result<(Vec<VlanListEntry>, i64), AppError> {
    let org_id = session.org_id();
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT a.id, a.org_id, a.site_id, a.asset_type, a.name, a.vendor, a.model, a.serial, \
                a.mgmt_ip, a.status, a.notes, a.extras, a.created_at, a.updated_at, \
                v.vlan_id, v.subnet, v.gateway, v.purpose, \
                COUNT(*) OVER() AS total_count \
         FROM assets a \
         LEFT JOIN asset_vlans v ON a.id = v.asset_id \
         WHERE a.asset_type = 'vlan'",
    );
    if !session.is_main() {
        qb.push(" AND a.org_id = ").push_bind(org_id);
    }
    if let Some(site_id) = filter.site_id {
        qb.push(" AND a.site_id = ").push_bind(site_id);
    }
    if let Some(q) = &filter.q {
        qb.push(" AND a.name ILIKE ").push_bind(format!("%{q}%"));
    }
    qb.push(build_order_by(sort, VLAN_SORT));
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let rows: Vec<VlanRow> = qb.build_query_as().fetch_all(session.conn()).await?;
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    let entries = rows
        .into_iter()
        .map(|r| {
            let vlan = r.vlan_id.map(|vlan_id| AssetVlan {
                asset_id: r.asset.id,
                vlan_id,
                subnet: r.subnet,
                gateway: r.gateway,
                purpose: r.purpose,
            });
            VlanListEntry {
                asset: r.asset,
                vlan,
            }
        })
        .collect();
    Ok((entries, total))
}

pub async fn site_categories(
    session: &mut TenantSession,
    site_id: i64,
) -> Result<Vec<SiteAssetCategory>, AppError> {
    let org_id = session.org_id();
    let is_main = session.is_main();
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT org_id, site_id, asset_type, asset_count \
         FROM site_asset_categories WHERE site_id = ",
    );
    qb.push_bind(site_id);
    if !is_main {
        qb.push(" AND org_id = ").push_bind(org_id);
    }
    qb.push(" ORDER BY asset_type");
    let categories = qb
        .build_query_as::<SiteAssetCategory>()
        .fetch_all(session.conn())
        .await?;
    Ok(categories)
}
