//! Asset CRUD, subtype projections, and the per-site category counters.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::Arc;

use atlas_core::models::{
    Asset, CreateAssetRequest, CreateSwitchRequest, CreateVlanRequest, SiteAssetCategory,
    UpdateAssetRequest,
};
use atlas_core::AppError;
use atlas_db::asset::{self, AssetFilter, AssetPatch, NewAsset, SwitchAttrs, VlanAttrs};

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

fn parse_mgmt_ip(raw: &str) -> Result<IpAddr, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation("invalid mgmt_ip format".to_string()))
}

fn switch_attrs(req: CreateSwitchRequest) -> SwitchAttrs {
    SwitchAttrs {
        ports_total: req.ports_total,
        poe: req.poe,
        uplink_info: req.uplink_info,
        firmware: req.firmware,
    }
}

fn vlan_attrs(req: CreateVlanRequest) -> Result<VlanAttrs, AppError> {
    let subnet = req
        .subnet
        .as_deref()
        .map(|s| {
            s.parse::<IpNetwork>()
                .map_err(|_| AppError::Validation("invalid subnet CIDR".to_string()))
        })
        .transpose()?;
    let gateway = req
        .gateway
        .as_deref()
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|_| AppError::Validation("invalid gateway IP".to_string()))
        })
        .transpose()?;
    Ok(VlanAttrs {
        vlan_id: req.vlan_id,
        subnet,
        gateway,
        purpose: req.purpose,
    })
}

fn filter_from(query: &ListQuery) -> AssetFilter {
    AssetFilter {
        site_id: query.site_id,
        asset_type: query.asset_type.clone(),
        q: query.q().map(str::to_string),
    }
}

#[utoipa::path(get, path = "/assets", tag = "assets", params(ListQuery), responses(
    (status = 200, description = "Assets page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (assets, total) =
        asset::list(&mut session, &filter_from(&query), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(assets, query.page(), total)))
}

#[utoipa::path(post, path = "/assets", tag = "assets", request_body = CreateAssetRequest, responses(
    (status = 201, description = "Created", body = Asset),
    (status = 400, description = "Invalid input", body = ErrorBody),
    (status = 409, description = "Serial already exists for this site and type", body = ErrorBody)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateAssetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.site_id <= 0 {
        return Err(AppError::Validation("site_id must be positive".to_string()).into());
    }
    let mgmt_ip = req.mgmt_ip.as_deref().map(parse_mgmt_ip).transpose()?;
    let vlan = req.vlan.map(vlan_attrs).transpose()?;

    let new = NewAsset {
        site_id: req.site_id,
        asset_type: req.asset_type,
        name: req.name,
        vendor: req.vendor,
        model: req.model,
        serial: req.serial,
        mgmt_ip,
        status: req.status,
        notes: req.notes,
        extras: req.extras.unwrap_or_else(|| serde_json::json!({})),
        switch: req.switch.map(switch_attrs),
        vlan,
    };

    let mut session = state.tenant_session(&ctx).await?;
    let asset = asset::create(&mut session, new).await?;
    tracing::info!(asset_id = asset.id, asset_type = %asset.asset_type, "asset created");
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(get, path = "/assets/{id}", tag = "assets", params(("id" = i64, Path)), responses(
    (status = 200, description = "Asset", body = Asset),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let asset = asset::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))?;
    Ok(Json(asset))
}

#[utoipa::path(put, path = "/assets/{id}", tag = "assets", params(("id" = i64, Path)), request_body = UpdateAssetRequest, responses(
    (status = 200, description = "Updated", body = Asset),
    (status = 404, description = "Not found", body = ErrorBody),
    (status = 409, description = "Serial already exists for this site and type", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateAssetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.is_empty() && req.switch.is_none() && req.vlan.is_none() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let mgmt_ip = req.mgmt_ip.as_deref().map(parse_mgmt_ip).transpose()?;
    let vlan = req.vlan.map(vlan_attrs).transpose()?;

    let patch = AssetPatch {
        asset_type: req.asset_type,
        name: req.name,
        vendor: req.vendor,
        model: req.model,
        serial: req.serial,
        mgmt_ip,
        status: req.status,
        notes: req.notes,
        extras: req.extras,
        switch: req.switch.map(switch_attrs),
        vlan,
    };

    let mut session = state.tenant_session(&ctx).await?;
    let asset = asset::update(&mut session, id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))?;
    Ok(Json(asset))
}

#[utoipa::path(delete, path = "/assets/{id}", tag = "assets", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted, subtype rows cascade"),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    if !asset::delete(&mut session, id).await? {
        return Err(AppError::NotFound("Asset not found".to_string()).into());
    }
    tracing::info!(asset_id = id, "asset deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/switches", tag = "assets", params(ListQuery), responses(
    (status = 200, description = "Switch assets joined with their subtype rows")
))]
pub async fn list_switches(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (switches, total) =
        asset::list_switches(&mut session, &filter_from(&query), query.page(), query.sort())
            .await?;
    Ok(Json(ListResponse::new(switches, query.page(), total)))
}

#[utoipa::path(get, path = "/vlans", tag = "assets", params(ListQuery), responses(
    (status = 200, description = "VLAN assets joined with their subtype rows")
))]
pub async fn list_vlans(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (vlans, total) =
        asset::list_vlans(&mut session, &filter_from(&query), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(vlans, query.page(), total)))
}

#[utoipa::path(get, path = "/sites/{id}/asset-categories", tag = "assets", params(("id" = i64, Path)), responses(
    (status = 200, description = "Counter rows ordered by asset_type", body = [SiteAssetCategory])
))]
pub async fn site_categories(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(site_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    if site_id <= 0 {
        return Err(AppError::Validation("invalid site_id".to_string()).into());
    }
    let mut session = state.tenant_session(&ctx).await?;
    let categories = asset::site_categories(&mut session, site_id).await?;
    Ok(Json(categories))
}
