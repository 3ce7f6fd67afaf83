use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::ok;
use crate::state::AppState;
use holding_core::document::{self, Document};
use holding_core::project::{self, Actor};
use holding_core::types::DocumentCategory;
use holding_core::user::{User, UserDocument};
use holding_core::{io, paths, HoldingError};

struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    category: Option<DocumentCategory>,
}

/// Pull the file (and optional `category` field) out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload {
        filename: String::new(),
        content_type: None,
        bytes: Vec::new(),
        category: None,
    };
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                upload.filename = field
                    .file_name()
                    .unwrap_or("documento.bin")
                    .to_string();
                upload.content_type = field.content_type().map(|c| c.to_string());
                upload.bytes = field.bytes().await?.to_vec();
            }
            Some("category") => {
                let value = field.text().await?;
                upload.category = serde_json::from_value(serde_json::Value::String(value)).ok();
            }
            _ => {}
        }
    }
    if upload.filename.is_empty() || upload.bytes.is_empty() {
        return Err(AppError::bad_request("multipart body needs a 'file' field"));
    }
    if upload.content_type.is_none() {
        upload.content_type = mime_guess::from_path(&upload.filename)
            .first()
            .map(|m| m.to_string());
    }
    Ok(upload)
}

fn store_blob(
    root: &std::path::Path,
    document_id: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<String, HoldingError> {
    let dir = paths::upload_dir(root, document_id);
    io::atomic_write(&dir.join(filename), bytes)?;
    Ok(format!("{}/{}/{}", paths::UPLOADS_DIR, document_id, filename))
}

/// POST /api/projects/{id}/phases/{n}/documents — multipart upload into a
/// phase. Re-uploading the same name continues its version sequence.
pub async fn upload_phase_document(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, number)): Path<(String, u8)>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload = read_upload(multipart).await?;
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = project::load(&root, &id)?;
        if !p.visible_to(&actor) {
            return Err(HoldingError::Forbidden(
                "not a member of this project".to_string(),
            ));
        }
        if p.phase_read_only(number, &actor)? {
            return Err(HoldingError::Forbidden(
                "this phase is read-only for the current user".to_string(),
            ));
        }
        let phase_id = p.phase(number)?.id;
        let mut doc = Document::new(upload.filename.clone(), "", actor.id.clone(), Some(phase_id));
        doc.content_type = upload.content_type.clone();
        doc.path = store_blob(&root, &doc.id, &upload.filename, &upload.bytes)?;

        let doc_json = serde_json::to_value(&doc)?;
        let document_id = document::add_versioned(&mut p.phase_mut(number)?.documents, doc);
        p.log(&actor, format!("enviou o documento {}", upload.filename));
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(serde_json::json!({
            "document_id": document_id,
            "document": doc_json,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/projects/{id}/phases/{n}/documents/{doc_id}/download
pub async fn download_phase_document(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, number, doc_id)): Path<(String, u8, String)>,
) -> Result<Response, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let (doc, bytes) = tokio::task::spawn_blocking(move || {
        let p = project::load(&root, &id)?;
        if !p.visible_to(&actor) {
            return Err(HoldingError::Forbidden(
                "not a member of this project".to_string(),
            ));
        }
        let doc = document::find(&p.phase(number)?.documents, &doc_id)
            .ok_or_else(|| HoldingError::DocumentNotFound(doc_id.clone()))?
            .clone();
        let bytes = std::fs::read(root.join(&doc.path))?;
        Ok::<_, HoldingError>((doc, bytes))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    serve_blob(&doc.name, doc.content_type.as_deref(), bytes)
}

/// POST /api/users/{id}/documents — multipart upload of a category-tagged
/// personal document.
pub async fn upload_user_document(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() && current.id != id {
        return Err(AppError::forbidden(
            "clients can only upload to their own record",
        ));
    }
    let upload = read_upload(multipart).await?;
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut user = User::load(&root, &id)?;
        let category = upload.category.unwrap_or(DocumentCategory::Other);
        let mut doc = UserDocument::new(upload.filename.clone(), category, "");
        doc.path = store_blob(&root, &doc.id, &upload.filename, &upload.bytes)?;
        let doc_json = serde_json::to_value(&doc)?;
        user.add_document(doc);
        user.save(&root)?;
        Ok::<_, HoldingError>(doc_json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/users/{id}/documents/{doc_id}/download
pub async fn download_user_document(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if !current.role.is_staff() && current.id != id {
        return Err(AppError::forbidden(
            "clients can only read their own documents",
        ));
    }
    let root = app.root.clone();
    let (name, bytes) = tokio::task::spawn_blocking(move || {
        let user = User::load(&root, &id)?;
        let doc = user
            .documents
            .iter()
            .find(|d| d.id == doc_id)
            .ok_or_else(|| HoldingError::DocumentNotFound(doc_id.clone()))?;
        let bytes = std::fs::read(root.join(&doc.path))?;
        Ok::<_, HoldingError>((doc.name.clone(), bytes))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let content_type = mime_guess::from_path(&name).first().map(|m| m.to_string());
    serve_blob(&name, content_type.as_deref(), bytes)
}

fn serve_blob(name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type.unwrap_or("application/octet-stream"),
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError(anyhow::anyhow!("response build error: {e}")))
}
