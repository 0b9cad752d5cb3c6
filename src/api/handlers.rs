use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, PersonalitiesResponse, StatusResponse};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::store::PersonalityStore;
use crate::tts::VoiceRef;

/// Fields collected from a multipart form. Unknown fields are skipped.
#[derive(Default)]
struct FormFields {
    text: Option<String>,
    name: Option<String>,
    personality: Option<String>,
    voice: Option<Bytes>,
}

async fn read_form(mut multipart: Multipart) -> Result<FormFields, AppError> {
    let mut form = FormFields::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "text" => form.text = Some(field.text().await?),
            "name" => form.name = Some(field.text().await?),
            "personality" => form.personality = Some(field.text().await?),
            "voice" => {
                let bytes = field.bytes().await?;
                // Browsers send an empty part for an untouched file input.
                if !bytes.is_empty() {
                    form.voice = Some(bytes);
                }
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

/// Run filesystem work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// Pick the voice reference for a generation. An upload wins over a stored
/// personality.
fn resolve_voice(
    store: &PersonalityStore,
    personality: Option<&str>,
    upload: Option<Bytes>,
) -> Result<VoiceRef, AppError> {
    match (upload, personality) {
        (Some(bytes), _) => VoiceRef::from_upload(&bytes),
        (None, Some(name)) if !name.is_empty() => match store.resolve(name) {
            Some(path) => Ok(VoiceRef::Stored(path)),
            None => {
                tracing::debug!("Personality '{}' not found", name);
                Err(AppError::NoVoiceSample)
            }
        },
        _ => Err(AppError::NoVoiceSample),
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let page = tokio::fs::read_to_string(state.static_dir.join("index.html")).await?;
    Ok(Html(page))
}

pub async fn list_personalities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PersonalitiesResponse>, AppError> {
    let personalities = blocking(move || state.store.list()).await?;
    Ok(Json(PersonalitiesResponse { personalities }))
}

pub async fn add_personality(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<StatusResponse>, AppError> {
    let form = read_form(multipart).await?;

    let name = form
        .name
        .ok_or_else(|| AppError::BadRequest("Missing form field 'name'".into()))?;
    let voice = form
        .voice
        .ok_or_else(|| AppError::BadRequest("Missing form field 'voice'".into()))?;

    blocking(move || state.store.add(&name, &voice)).await?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let text = form
        .text
        .ok_or_else(|| AppError::BadRequest("Missing form field 'text'".into()))?;

    let voice = {
        let state = Arc::clone(&state);
        let (personality, upload) = (form.personality, form.voice);
        blocking(move || resolve_voice(&state.store, personality.as_deref(), upload)).await?
    };

    if text.contains('\0') {
        return Err(AppError::BadRequest("Text must not contain NUL characters".into()));
    }

    if text.chars().count() > state.max_text_chars {
        return Err(AppError::BadRequest(format!(
            "Text too long (max {} chars)",
            state.max_text_chars
        )));
    }

    let wav = state.tts.speak(text, voice).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"output.wav\""),
        ],
        wav,
    )
        .into_response())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.tts.is_shut_down() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device: state.tts.device(),
    })
}
