//! The polymorphic asset record plus its optional subtypes.
//!
//! An `Asset` always belongs to an organization and a site and carries a free
//! `asset_type` discriminator. Switch and VLAN rows extend an asset 1:1 and
//! share its lifetime. `SiteAssetCategory` is the denormalized per-site
//! counter maintained by database triggers on asset writes.

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::net::IpAddr;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: i64,
    pub org_id: i64,
    pub site_id: i64,
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub mgmt_ip: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Free-form attributes, stored verbatim as JSONB.
    #[schema(value_type = Object)]
    pub extras: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AssetSwitch {
    pub asset_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports_total: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplink_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AssetVlan {
    pub asset_id: i64,
    pub vlan_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub subnet: Option<IpNetwork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub gateway: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Counter row: number of assets per `(org, site, asset_type)`.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct SiteAssetCategory {
    pub org_id: i64,
    pub site_id: i64,
    pub asset_type: String,
    pub asset_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssetRequest {
    pub site_id: i64,
    #[validate(length(min = 1, max = 64))]
    pub asset_type: String,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    /// Textual form; parsed as an IP address before it reaches the database.
    pub mgmt_ip: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub extras: Option<serde_json::Value>,
    pub switch: Option<CreateSwitchRequest>,
    pub vlan: Option<CreateVlanRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSwitchRequest {
    pub ports_total: Option<i32>,
    pub poe: Option<bool>,
    pub uplink_info: Option<String>,
    pub firmware: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVlanRequest {
    pub vlan_id: i32,
    pub subnet: Option<String>,
    pub gateway: Option<String>,
    pub purpose: Option<String>,
}

/// Partial update: only provided fields are written.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAssetRequest {
    pub asset_type: Option<String>,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub mgmt_ip: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub extras: Option<serde_json::Value>,
    pub switch: Option<CreateSwitchRequest>,
    pub vlan: Option<CreateVlanRequest>,
}

impl UpdateAssetRequest {
    /// True when no asset column (not counting subtype payloads) is provided.
    pub fn is_empty(&self) -> bool {
        self.asset_type.is_none()
            && self.name.is_none()
            && self.vendor.is_none()
            && self.model.is_none()
            && self.serial.is_none()
            && self.mgmt_ip.is_none()
            && self.status.is_none()
            && self.notes.is_none()
            && self.extras.is_none()
    }
}

/// Asset joined with its switch subtype for the `/switches` projection.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwitchListEntry {
    #[serde(flatten)]
    pub asset: Asset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<AssetSwitch>,
}

/// Asset joined with its VLAN subtype for the `/vlans` projection.
#[derive(Debug, Serialize, ToSchema)]
pub struct VlanListEntry {
    #[serde(flatten)]
    pub asset: Asset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<AssetVlan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_emptiness_ignores_subtypes() {
        let mut req = UpdateAssetRequest::default();
        assert!(req.is_empty());
        req.switch = Some(CreateSwitchRequest {
            ports_total: Some(48),
            poe: None,
            uplink_info: None,
            firmware: None,
        });
        assert!(req.is_empty());
        req.name = Some("core-sw-01".into());
        assert!(!req.is_empty());
    }

    #[test]
    fn absent_fields_are_omitted_from_wire_shape() {
        let asset = Asset {
            id: 1,
            org_id: 1,
            site_id: 1,
            asset_type: "switch".into(),
            name: None,
            vendor: None,
            model: None,
            serial: Some("TEST123".into()),
            mgmt_ip: None,
            status: None,
            notes: None,
            extras: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&asset).unwrap();
        assert!(json.get("name").is_none());
        assert!(json.get("mgmt_ip").is_none());
        assert_eq!(json["serial"], "TEST123");
        assert_eq!(json["extras"], serde_json::json!({}));
    }
}
