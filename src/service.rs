//! The AI-service boundary: trait seams for the image standardizer and the
//! title translator, failure classification, re-entrancy gates, and the
//! actions that apply service results to the editor state.
//!
//! The traits speak decoded bytes. Transport, encoding and prompt details
//! belong to implementations; this module only owns what happens to the
//! composition when a call succeeds or fails.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    assets::AssetStore,
    error::{FailureClass, ThumbError, ThumbResult},
    state::EditorState,
};

/// Input to the standardizer: a user-supplied image of any aspect.
#[derive(Clone, Debug)]
pub struct StandardizeRequest {
    pub image: Vec<u8>,
    /// Media type of `image`, e.g. `image/jpeg`.
    pub mime: String,
}

/// Standardizer output. `image_png` absent means the backend answered
/// without producing an image, which is treated as a safety refusal.
#[derive(Clone, Debug, Default)]
pub struct StandardizeOutcome {
    pub image_png: Option<Vec<u8>>,
}

/// Transport-level failure reported by a service implementation.
#[derive(thiserror::Error, Clone, Debug)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    /// HTTP status, when the transport saw one.
    pub status: Option<u16>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Reframes an arbitrary image into a clean 16:9 thumbnail base.
pub trait ImageStandardizer {
    fn standardize(&self, request: &StandardizeRequest) -> Result<StandardizeOutcome, ServiceError>;
}

/// Translates a title into another language, preserving its punch.
pub trait TitleTranslator {
    fn translate(&self, title: &str, target_language: &str) -> Result<String, ServiceError>;
}

/// Supplies the API credential for service calls.
pub trait CredentialPicker {
    /// Returns a usable key, or None when the user has not selected one.
    fn current_key(&self) -> Option<String>;
}

/// Collapse a transport failure into the user-facing class.
///
/// Entity-not-found and key-rejection messages, plus 403/404 statuses, are
/// credential problems; explicit safety refusals are safety; everything else
/// is transient.
pub fn classify(err: &ServiceError) -> FailureClass {
    if matches!(err.status, Some(403) | Some(404)) {
        return FailureClass::Auth;
    }
    let msg = &err.message;
    if msg.contains("Requested entity was not found")
        || msg.contains("API key not valid")
        || msg.contains("403")
        || msg.contains("404")
    {
        return FailureClass::Auth;
    }
    if msg.contains("Safety") {
        return FailureClass::Safety;
    }
    FailureClass::Transient
}

fn service_err(err: ServiceError) -> ThumbError {
    let class = classify(&err);
    tracing::warn!(?class, status = ?err.status, "service call failed: {}", err.message);
    ThumbError::service(class, err.message)
}

/// After an auth-class failure, ask the credential picker for a key the
/// caller can retry with. Other failure classes never prompt.
pub fn credential_for_retry(picker: &dyn CredentialPicker, err: &ThumbError) -> Option<String> {
    match err.failure_class() {
        Some(FailureClass::Auth) => picker.current_key(),
        _ => None,
    }
}

/// One-at-a-time guard for a named long-running action.
///
/// Cloneable and shareable; acquiring while held fails fast with
/// [`ThumbError::Busy`] instead of queueing.
#[derive(Clone, Debug)]
pub struct Gate {
    name: &'static str,
    busy: Arc<AtomicBool>,
}

impl Gate {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Acquire the gate, releasing it when the returned guard drops.
    pub fn try_acquire(&self) -> ThumbResult<GateGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ThumbError::Busy(self.name));
        }
        Ok(GateGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

pub struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Run the standardizer and install its result as the new base image under
/// `asset_key`, resetting the view. An outcome without an image is a safety
/// refusal and leaves the state untouched.
#[tracing::instrument(skip_all, fields(mime = %request.mime))]
pub fn standardize_action(
    standardizer: &dyn ImageStandardizer,
    gate: &Gate,
    state: &mut EditorState,
    assets: &mut AssetStore,
    asset_key: &str,
    request: &StandardizeRequest,
) -> ThumbResult<()> {
    let _guard = gate.try_acquire()?;

    let outcome = standardizer.standardize(request).map_err(service_err)?;
    let Some(png) = outcome.image_png else {
        tracing::warn!("standardizer returned no image");
        return Err(ThumbError::service(
            FailureClass::Safety,
            "backend produced no image",
        ));
    };

    assets.insert_image_bytes(asset_key, &png)?;
    state.set_base(asset_key)?;
    tracing::info!(key = asset_key, "installed standardized base image");
    Ok(())
}

/// Translate the current title and replace the text content with the result.
/// Translation failures propagate; the existing title is never silently kept.
#[tracing::instrument(skip_all, fields(lang = target_language))]
pub fn translate_action(
    translator: &dyn TitleTranslator,
    gate: &Gate,
    state: &mut EditorState,
    target_language: &str,
) -> ThumbResult<()> {
    let _guard = gate.try_acquire()?;

    let title = state.scene().text.content.clone();
    if title.trim().is_empty() {
        return Err(ThumbError::validation("no title text to translate"));
    }

    let translated = translator
        .translate(&title, target_language)
        .map_err(service_err)?;
    // Stored upper-cased: the scene content round-trips through JSON and
    // seeds later translate calls, not just the draw path.
    state.set_text_content(translated.to_uppercase());
    tracing::info!("translated title");
    Ok(())
}
