//! Location-scoped group chat.
//!
//! A room socket for group `g` joins room `g_{location}`, where location is
//! the caller's profile location when the socket opens. Messages reach
//! every member of that room, the sender included. Nothing is stored.

use lifeline_types::events::RoomEvent;

use crate::GatewayState;
use crate::commands::{CommandError, SessionContext, blocking};

pub fn room_key(group: &str, location: &str) -> String {
    format!("{}_{}", group, location)
}

/// The room `session` belongs to within `group`.
pub async fn resolve_room(
    state: &GatewayState,
    session: &SessionContext,
    group: &str,
) -> Result<String, CommandError> {
    if group.trim().is_empty() {
        return Err(CommandError::Invalid("empty group name".into()));
    }

    let user_id = session.id();
    let user = blocking(&state.db, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("user {}", session.username)))?;

    Ok(room_key(group, &user.location))
}

/// Broadcast to everyone in `room`. Returns the number of sessions reached.
pub async fn send_group_message(
    state: &GatewayState,
    session: &SessionContext,
    room: &str,
    message: &str,
) -> usize {
    let event = RoomEvent::GroupMessage {
        message: message.to_string(),
        username: session.username.clone(),
    };
    state.rooms.publish(room, event).await
}
