pub mod assets;
pub mod auth;
pub mod health;
pub mod imports;
pub mod items;
pub mod organizations;
pub mod projects;
pub mod sites;
pub mod users;
pub mod vendors;
