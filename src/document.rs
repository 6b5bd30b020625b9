use actix_web::{
    delete, get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    post,
    web::{Data, Json, Path},
    HttpResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{new_id, AppState, CreatedResponse, DocumentSummary, MessageResponse},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentSubmission {
    pub filename: Option<String>,
    pub filetype: Option<String>,
    /// File contents, base64 encoded. A `data:` URL prefix is accepted.
    pub data: Option<String>,
}

/// Decodes an upload body, tolerating a leading `data:<mime>;base64,` prefix.
pub fn decode_upload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.split_once("base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => data,
    };
    STANDARD.decode(payload.trim())
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of all documents, newest first", body = Vec<DocumentSummary>, example = json!([{
            "id": "doc-1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d",
            "filename": "laundry-rules.pdf",
            "filetype": "application/pdf",
            "uploaded_at": "2024-03-01T08:30:00Z"
        }])),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/documents")]
pub async fn get_all_documents(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let documents = query_as::<_, DocumentSummary>(
        r#"
        SELECT id, filename, filetype, uploaded_at
        FROM documents
        ORDER BY uploaded_at DESC, rowid DESC
        "#,
    )
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(documents))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The raw document, served with its stored content type", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "The requested document was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/documents/{document_id}")]
pub async fn download_document(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let document_id = path.into_inner();

    let (filename, filetype, contents) = query_as::<_, (String, String, Vec<u8>)>(
        "SELECT filename, filetype, data FROM documents WHERE id = ?",
    )
    .bind(&document_id)
    .fetch_optional(&data.database)
    .await?
    .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type(filetype)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(contents))
}

#[utoipa::path(
    request_body(content = DocumentSubmission, content_type = "application/json", example = json!({
        "filename": "laundry-rules.pdf",
        "filetype": "application/pdf",
        "data": "JVBERi0xLjQK"
    })),
    responses(
        (status = 201, description = "The document was stored", body = CreatedResponse),
        (status = 400, description = "A field is missing or the data is not valid base64"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/documents")]
pub async fn upload_document(
    data: Data<AppState>,
    Json(submission): Json<DocumentSubmission>,
) -> Result<HttpResponse, ApiError> {
    let (Some(filename), Some(filetype), Some(encoded)) = (
        submission.filename.filter(|value| !value.trim().is_empty()),
        submission.filetype.filter(|value| !value.trim().is_empty()),
        submission.data.filter(|value| !value.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Missing file data".to_string()));
    };

    let contents = decode_upload(&encoded)
        .map_err(|err| ApiError::BadRequest(format!("File data is not valid base64: {err}")))?;

    let id = new_id("doc");
    query(
        r#"
        INSERT INTO documents (id, filename, filetype, data, uploaded_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(filename.trim())
    .bind(filetype.trim())
    .bind(contents)
    .bind(OffsetDateTime::now_utc())
    .execute(&data.database)
    .await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The document was deleted", body = MessageResponse),
        (status = 404, description = "The requested document was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[delete("/api/documents/{document_id}")]
pub async fn delete_document(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let document_id = path.into_inner();

    let result = query("DELETE FROM documents WHERE id = ?")
        .bind(&document_id)
        .execute(&data.database)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Document deleted")))
}
