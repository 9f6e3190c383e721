//! Generate a signed session token for local testing.
//!
//! Reads the JWT settings from the environment (the same variables the API
//! server uses); flags override them.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;

use atlas_api::auth::JwtManager;
use atlas_core::config::JwtConfig;

#[derive(Parser, Debug)]
#[command(name = "jwtgen")]
#[command(about = "Generate a session token for the atlas API")]
struct Args {
    /// User ID placed in the subject claim
    #[arg(long, default_value_t = 1)]
    user: i64,

    /// Organization ID
    #[arg(long, default_value_t = 1)]
    org: i64,

    /// Comma-separated list of roles
    #[arg(long, default_value = "org_admin")]
    roles: String,

    /// Token expiry in minutes
    #[arg(long, default_value_t = 1440)]
    expiry: u64,

    /// Signing secret (overrides JWT_SECRET)
    #[arg(long)]
    secret: Option<String>,

    /// Issuer (overrides JWT_ISS)
    #[arg(long)]
    issuer: Option<String>,

    /// Audience (overrides JWT_AUD)
    #[arg(long)]
    audience: Option<String>,
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let secret = args
        .secret
        .or_else(|| std::env::var("JWT_SECRET").ok())
        .context("a signing secret is required (--secret or JWT_SECRET)")?;
    let issuer = args
        .issuer
        .or_else(|| std::env::var("JWT_ISS").ok())
        .unwrap_or_else(|| "atlas-inventory".to_string());
    let audience = args
        .audience
        .or_else(|| std::env::var("JWT_AUD").ok())
        .unwrap_or_else(|| "atlas-inventory".to_string());

    let roles: Vec<String> = args
        .roles
        .split(',')
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty())
        .collect();

    let jwt = JwtManager::new(&JwtConfig {
        secret,
        issuer: issuer.clone(),
        audience: audience.clone(),
        expiry: Duration::from_secs(args.expiry * 60),
    });

    let token = jwt
        .issue(args.user, args.org, &roles)
        .map_err(|e| anyhow::anyhow!("failed to generate token: {e}"))?;

    println!("user:     {}", args.user);
    println!("org:      {}", args.org);
    println!("roles:    {}", roles.join(", "));
    println!("expiry:   {} minutes", args.expiry);
    println!("issuer:   {issuer}");
    println!("audience: {audience}");
    println!("\n{token}\n");
    println!("curl -H \"Authorization: Bearer {token}\" http://localhost:8080/items");

    Ok(())
}
