//! Bulk-import a spreadsheet straight into the database, bypassing the HTTP
//! surface. Useful for initial loads and for checking a mapping against a
//! real file with `--dry-run`.

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use atlas_db::session::TenantSession;
use atlas_import::importer::{import_workbook, ImportOptions, DEFAULT_MAX_ERRORS};
use atlas_import::MappingConfig;

#[derive(Parser, Debug)]
#[command(name = "import_excel")]
#[command(about = "Import an .xlsx workbook into the atlas inventory")]
struct Args {
    /// Path to the workbook
    #[arg(long)]
    file: String,

    /// Organization to import into
    #[arg(long)]
    org_id: i64,

    /// Site the assets belong to
    #[arg(long)]
    site_id: i64,

    /// Mapping document path (defaults to the built-in equipment mapping)
    #[arg(long, default_value = "configs/mapping/equipment.yaml")]
    mapping: String,

    /// Parse and decide, but commit nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Abort once this many rows have failed
    #[arg(long, default_value_t = DEFAULT_MAX_ERRORS)]
    max_errors: usize,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.org_id <= 0 || args.site_id <= 0 {
        anyhow::bail!("org-id and site-id must be positive");
    }

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
    let rls_enabled = std::env::var("RLS_ENABLED").map(|v| v == "true").unwrap_or(false);

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file))?;
    let mapping = MappingConfig::load(&args.mapping)
        .with_context(|| format!("failed to load mapping {}", args.mapping))?;

    println!(
        "importing {} into org_id={}, site_id={} (dry_run={})",
        args.file, args.org_id, args.site_id, args.dry_run
    );

    let mut session = TenantSession::acquire(&pool, args.org_id, rls_enabled)
        .await
        .map_err(|e| anyhow::anyhow!("failed to acquire tenant session: {e}"))?;

    let opts = ImportOptions {
        site_id: args.site_id,
        dry_run: args.dry_run,
        max_errors: args.max_errors,
    };
    let outcome = import_workbook(&mut session, &bytes, &mapping, &opts)
        .await
        .map_err(|e| anyhow::anyhow!("import failed: {e}"))?;

    let summary = &outcome.summary;
    println!("\ninserted: {}", summary.inserted);
    println!("updated:  {}", summary.updated);
    println!("skipped:  {}", summary.skipped);
    println!("errors:   {}", summary.errors);
    println!("dry_run:  {}", summary.dry_run);

    for sheet in &summary.sheets {
        println!(
            "  {}: inserted={}, updated={}, skipped={}, errors={}",
            sheet.name, sheet.inserted, sheet.updated, sheet.skipped, sheet.errors
        );
        for sample in &sheet.samples {
            println!("    row {}: {}", sample.row, sample.message);
        }
    }

    if let Some(error) = outcome.error {
        anyhow::bail!("{error}");
    }
    Ok(())
}
