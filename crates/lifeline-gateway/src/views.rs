//! Rendering of store rows into wire payloads. Anything relative to a
//! viewer (`is_me`, which side is the friend) takes the viewer's id.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use lifeline_db::models::{ConnectionRow, FriendRow, MessageRow, UserRow};
use lifeline_types::models::{FriendView, MessageView, RequestView, UserProfile};

/// Preview shown for a friend with no messages yet.
pub const EMPTY_PREVIEW: &str = "New connection";

pub fn profile(user: &UserRow) -> UserProfile {
    UserProfile {
        username: user.username.clone(),
        name: display_name(&user.first_name, &user.last_name),
        email: user.email.clone(),
        phone_no: user.phone_no.clone(),
        address: user.address.clone(),
        pincode: user.pincode.clone(),
        organization_name: user.organization_name.clone(),
        organization_address: user.organization_address.clone(),
        profession: user.profession.clone(),
        location: user.location.clone(),
        latitude: user.latitude,
        longitude: user.longitude,
        org_pincode: user.org_pincode.clone(),
        thumbnail: user.thumbnail.clone(),
    }
}

/// First and last name, each capitalized, joined by a space.
pub fn display_name(first: &str, last: &str) -> String {
    format!("{} {}", capitalize(first), capitalize(last))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn request_view(connection: &ConnectionRow) -> RequestView {
    RequestView {
        id: connection.id,
        sender: profile(&connection.sender),
        receiver: profile(&connection.receiver),
        created: timestamp(&connection.created_at),
    }
}

/// Friend view of `friend` as seen by `viewer_id`. `None` when the viewer
/// is not a party to the connection.
pub fn friend_view(friend: &FriendRow, viewer_id: &str) -> Option<FriendView> {
    let counterpart = friend.connection.counterpart(viewer_id)?;
    Some(FriendView {
        id: friend.connection.id,
        friend: profile(counterpart),
        preview: friend
            .latest_text
            .clone()
            .unwrap_or_else(|| EMPTY_PREVIEW.to_string()),
        updated: timestamp(friend.activity()),
    })
}

pub fn message_view(message: &MessageRow, viewer_id: &str) -> MessageView {
    MessageView {
        id: message.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", message.id, e);
            Uuid::default()
        }),
        is_me: message.author_id == viewer_id,
        text: message.text.clone(),
        created: timestamp(&message.created_at),
    }
}

pub fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::<Utc>::default()
        })
}
