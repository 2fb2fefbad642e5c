use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use lifeline_db::Database;
use lifeline_types::api::Claims;
use lifeline_types::events::{Command, Frame};

use crate::presence::PresenceRouter;
use crate::{GatewayState, conversation, friends, media, team};

/// Identity of the authenticated user behind one session. Passed to every
/// handler; sessions carry no other mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub username: String,
}

impl SessionContext {
    pub fn id(&self) -> String {
        self.user_id.to_string()
    }
}

impl From<Claims> for SessionContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

/// Why a command produced no response. None of these reach the client.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type CommandResult = Result<(), CommandError>;

/// Run one command to completion. Each handler delivers its own frames
/// through the router; failures are logged here and never answered.
pub async fn dispatch(state: &GatewayState, session: &SessionContext, cmd: Command) {
    let source = cmd.source();

    let result = match cmd {
        Command::FriendList => friends::friend_list(state, session).await,
        Command::MessageList {
            connection_id,
            page,
        } => conversation::message_list(state, session, connection_id, page).await,
        Command::MessageSend {
            connection_id,
            message,
        } => conversation::message_send(state, session, connection_id, &message).await,
        Command::MessageType { username } => {
            conversation::message_type(state, session, &username).await
        }
        Command::RequestAccept { username } => {
            friends::request_accept(state, session, &username).await
        }
        Command::RequestConnect { username } => {
            friends::request_connect(state, session, &username).await
        }
        Command::RequestList => friends::request_list(state, session).await,
        Command::Search { query } => friends::search(state, session, &query).await,
        Command::Thumbnail { base64, filename } => {
            media::thumbnail(state, session, &base64, &filename).await
        }
        Command::TeamRequest {
            target_latitude,
            target_longitude,
            target_disaster_type,
            severity_level,
            target_location,
        } => {
            debug!(
                "{} requests team near {}",
                session.username,
                target_location.as_deref().unwrap_or("(unnamed)")
            );
            team::team_request(
                state,
                session,
                team::GeoPoint::new(target_latitude, target_longitude),
                &target_disaster_type,
                &severity_level,
            )
            .await
        }
    };

    match result {
        Ok(()) => debug!("{} handled {}", session.username, source),
        Err(e @ (CommandError::NotFound(_) | CommandError::Invalid(_))) => {
            warn!("{} {} aborted: {}", session.username, source, e)
        }
        Err(e) => error!("{} {} failed: {}", session.username, source, e),
    }
}

/// Run a store call off the async runtime.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T, CommandError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    Ok(tokio::task::spawn_blocking(move || f(db.as_ref())).await??)
}

/// Serialize `data` and publish it to every session of `username`.
pub(crate) async fn push<T: Serialize>(
    router: &PresenceRouter,
    username: &str,
    source: &str,
    data: &T,
) -> CommandResult {
    let frame = Frame::new(source, data)?;
    let delivered = router.publish(username, frame).await;
    if delivered == 0 {
        debug!("{} for {} dropped, no live sessions", source, username);
    }
    Ok(())
}
