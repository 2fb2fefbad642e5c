pub mod commands;
pub mod connection;
pub mod conversation;
pub mod friends;
pub mod media;
pub mod presence;
pub mod rooms;
pub mod team;
pub mod views;

use std::sync::Arc;

use lifeline_db::Database;
use lifeline_types::events::RoomEvent;

use crate::media::MediaStore;
use crate::presence::PresenceRouter;

/// Shared handles every session needs.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Arc<Database>,
    pub router: PresenceRouter,
    /// Group chat rooms, keyed by `{group}_{location}`
    pub rooms: PresenceRouter<RoomEvent>,
    pub media: Arc<MediaStore>,
}

impl GatewayState {
    pub fn new(db: Arc<Database>, media: MediaStore) -> Self {
        Self {
            db,
            router: PresenceRouter::new(),
            rooms: PresenceRouter::new(),
            media: Arc::new(media),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tokio::sync::mpsc;
    use uuid::Uuid;

    use lifeline_db::Database;
    use lifeline_db::models::NewUser;
    use lifeline_types::events::Frame;

    use crate::GatewayState;
    use crate::commands::SessionContext;
    use crate::media::MediaStore;

    pub async fn state() -> GatewayState {
        let db = Database::open_in_memory().unwrap();
        let dir = std::env::temp_dir().join(format!("lifeline-test-{}", Uuid::new_v4()));
        let media = MediaStore::new(dir).await.unwrap();
        GatewayState::new(Arc::new(db), media)
    }

    /// Register a user with a position and return their session context.
    pub fn user_at(
        state: &GatewayState,
        username: &str,
        profession: &str,
        position: Option<(f64, f64)>,
    ) -> SessionContext {
        let id = Uuid::new_v4();
        state
            .db
            .create_user(&NewUser {
                id: id.to_string(),
                username: username.to_string(),
                password_hash: "hash".into(),
                first_name: username.to_string(),
                last_name: "test".into(),
                phone_no: format!("555-{}", username),
                profession: profession.to_string(),
                location: "city".into(),
                latitude: position.map(|p| p.0),
                longitude: position.map(|p| p.1),
                ..Default::default()
            })
            .unwrap();
        SessionContext {
            user_id: id,
            username: username.to_string(),
        }
    }

    pub fn user(state: &GatewayState, username: &str) -> SessionContext {
        user_at(state, username, "", None)
    }

    pub async fn online(
        state: &GatewayState,
        session: &SessionContext,
    ) -> mpsc::UnboundedReceiver<Frame> {
        state.router.join(&session.username).await.1
    }

    /// Everything queued for a session so far.
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }
}
