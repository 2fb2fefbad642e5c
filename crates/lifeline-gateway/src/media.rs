use std::path::PathBuf;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lifeline_types::events::source;

use crate::GatewayState;
use crate::commands::{CommandError, CommandResult, SessionContext, blocking, push};
use crate::views;

const THUMBNAIL_DIR: &str = "thumbnails";

/// On-disk store for avatar images.
///
/// Files live at `{dir}/thumbnails/{uuid}-{name}`; the relative part is what
/// gets recorded on the user and served under `/media`.
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(dir.join(THUMBNAIL_DIR)).await?;
        info!("Media directory: {}", dir.display());
        Ok(Self { dir })
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Write a thumbnail and return its path relative to the media root.
    pub async fn save_thumbnail(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let relative = format!(
            "{}/{}-{}",
            THUMBNAIL_DIR,
            Uuid::new_v4().simple(),
            sanitize_filename(filename)
        );
        fs::write(self.dir.join(&relative), bytes).await?;
        Ok(relative)
    }

    /// Delete a stored thumbnail. Paths outside the thumbnail directory are
    /// refused; a file that is already gone is not an error.
    pub async fn remove_thumbnail(&self, relative: &str) {
        let Some(name) = relative.strip_prefix(THUMBNAIL_DIR).and_then(|r| r.strip_prefix('/'))
        else {
            warn!("Refusing to remove {} outside {}", relative, THUMBNAIL_DIR);
            return;
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            warn!("Refusing to remove suspicious thumbnail path {}", relative);
            return;
        }

        match fs::remove_file(self.dir.join(THUMBNAIL_DIR).join(name)).await {
            Ok(()) => debug!("Removed thumbnail {}", relative),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove thumbnail {}: {}", relative, e),
        }
    }
}

/// Keep only the final path component, restricted to a safe character set.
fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "thumbnail".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Accepts raw base64 or a `data:...;base64,` URL.
fn decode_image(encoded: &str) -> Result<Vec<u8>, CommandError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    B64.decode(payload.trim())
        .map_err(|e| CommandError::Invalid(format!("thumbnail is not base64: {}", e)))
}

pub async fn thumbnail(
    state: &GatewayState,
    session: &SessionContext,
    encoded: &str,
    filename: &str,
) -> CommandResult {
    let bytes = decode_image(encoded)?;
    if bytes.is_empty() {
        return Err(CommandError::Invalid("empty thumbnail".into()));
    }

    let path = state.media.save_thumbnail(filename, &bytes).await?;

    let user_id = session.id();
    let new_path = path.clone();
    let stored = blocking(&state.db, move |db| {
        let Some(previous) = db.get_user_by_id(&user_id)? else {
            return Ok(None);
        };
        db.set_thumbnail(&user_id, &new_path)?;
        let user = db.get_user_by_id(&user_id)?;
        Ok(user.map(|user| (user, previous.thumbnail)))
    })
    .await;

    // The row never points at the new file unless the update went through
    let (user, previous) = match stored {
        Ok(Some(found)) => found,
        Ok(None) => {
            state.media.remove_thumbnail(&path).await;
            return Err(CommandError::NotFound(format!("user {}", session.username)));
        }
        Err(e) => {
            state.media.remove_thumbnail(&path).await;
            return Err(e);
        }
    };
    info!("{} uploaded thumbnail {}", session.username, path);

    if let Some(previous) = previous.filter(|p| *p != path) {
        state.media.remove_thumbnail(&previous).await;
    }

    push(
        &state.router,
        &session.username,
        source::THUMBNAIL,
        &views::profile(&user),
    )
    .await
}
