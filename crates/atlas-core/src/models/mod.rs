pub mod asset;
pub mod item;
pub mod organization;
pub mod project;
pub mod role;
pub mod site;
pub mod user;
pub mod vendor;

pub use asset::{
    Asset, AssetSwitch, AssetVlan, CreateAssetRequest, CreateSwitchRequest, CreateVlanRequest,
    SiteAssetCategory, SwitchListEntry, UpdateAssetRequest, VlanListEntry,
};
pub use item::{CreateItemRequest, Item, UpdateItemRequest};
pub use organization::{CreateOrganizationRequest, Organization, OrganizationStats};
pub use project::{CreateProjectRequest, Project, UpdateProjectRequest};
pub use role::{validate_roles, Role};
pub use site::{CreateSiteRequest, Site, UpdateSiteRequest};
pub use user::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginResponse, UpdateProfileRequest,
    UpdateUserRequest, User,
};
pub use vendor::{CreateVendorRequest, UpdateVendorRequest, Vendor};
