//! Multipart spreadsheet ingestion.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use atlas_core::AppError;
use atlas_import::importer::{self, ImportOptions, DEFAULT_MAX_ERRORS};
use atlas_import::MappingConfig;

use crate::auth::AuthContext;
use crate::error::{ErrorBody, HttpAppError};
use crate::state::AppState;

struct UploadForm {
    file: Vec<u8>,
    file_name: String,
    site_id: Option<i64>,
    dry_run: bool,
    mapping: Option<String>,
    max_errors: usize,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        file: Vec::new(),
        file_name: String::new(),
        site_id: None,
        dry_run: false,
        mapping: None,
        max_errors: DEFAULT_MAX_ERRORS,
    };
    let mut saw_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().unwrap_or_default().to_string();
                form.file = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read file: {e}")))?
                    .to_vec();
                saw_file = true;
            }
            "site_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid site_id: {e}")))?;
                form.site_id = text.trim().parse().ok();
            }
            "dry_run" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid dry_run: {e}")))?;
                form.dry_run = text.trim() == "true";
            }
            "mapping" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid mapping: {e}")))?;
                if !text.trim().is_empty() {
                    form.mapping = Some(text.trim().to_string());
                }
            }
            "max_errors" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid max_errors: {e}")))?;
                if let Ok(n) = text.trim().parse::<usize>() {
                    if n > 0 {
                        form.max_errors = n;
                    }
                }
            }
            _ => {}
        }
    }

    if !saw_file {
        return Err(AppError::Validation("file is required".to_string()));
    }
    Ok(form)
}

#[utoipa::path(post, path = "/imports/excel", tag = "imports", responses(
    (status = 200, description = "Import summary with per-sheet counts"),
    (status = 400, description = "Bad upload", body = ErrorBody),
    (status = 422, description = "Import aborted; body carries the partial summary")
))]
pub async fn upload_excel(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let multipart = multipart.map_err(|_| {
        AppError::Validation("content-type must be multipart/form-data".to_string())
    })?;
    let form = read_form(multipart).await?;

    if !form.file_name.to_lowercase().ends_with(".xlsx") {
        return Err(AppError::Validation("only .xlsx files are accepted".to_string()).into());
    }
    if form.file.len() > state.config.import_max_bytes {
        return Err(AppError::Validation(format!(
            "file exceeds the {} byte limit",
            state.config.import_max_bytes
        ))
        .into());
    }
    let site_id = match form.site_id {
        Some(id) if id > 0 => id,
        _ => {
            return Err(AppError::Validation(
                "site_id is required and must be a positive integer".to_string(),
            )
            .into())
        }
    };

    let mapping_path = form
        .mapping
        .unwrap_or_else(|| state.config.import_default_mapping.clone());
    let mapping = MappingConfig::load(&mapping_path)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let opts = ImportOptions {
        site_id,
        dry_run: form.dry_run,
        max_errors: form.max_errors,
    };

    let mut session = state.tenant_session(&ctx).await?;
    let outcome = importer::import_workbook(&mut session, &form.file, &mapping, &opts).await?;

    tracing::info!(
        org_id = ctx.org_id,
        site_id,
        inserted = outcome.summary.inserted,
        updated = outcome.summary.updated,
        skipped = outcome.summary.skipped,
        errors = outcome.summary.errors,
        dry_run = outcome.summary.dry_run,
        "import finished"
    );

    if let Some(details) = outcome.error {
        let body = serde_json::json!({
            "error": "Import failed",
            "code": "import_failed",
            "details": details,
            "data": outcome.summary,
        });
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
    }

    let body = serde_json::json!({
        "data": outcome.summary,
        "meta": {
            "timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "version": "1.0.0",
        },
    });
    Ok(Json(body).into_response())
}
