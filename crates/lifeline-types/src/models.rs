use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile of a user as rendered inside every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone_no: String,
    pub address: String,
    pub pincode: String,
    pub organization_name: String,
    pub organization_address: String,
    pub profession: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub org_pincode: String,
    pub thumbnail: Option<String>,
}

/// A friend request (pending or accepted) with both endpoints expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestView {
    pub id: i64,
    pub sender: UserProfile,
    pub receiver: UserProfile,
    pub created: DateTime<Utc>,
}

/// An accepted connection seen from one side: `friend` is always the
/// counterpart of whoever receives the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendView {
    pub id: i64,
    pub friend: UserProfile,
    pub preview: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub is_me: bool,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    pub next: Option<u32>,
    pub friend: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDelivery {
    pub message: MessageView,
    pub friend: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingNotice {
    pub username: String,
}

/// Relationship of a searched user relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationStatus {
    /// The caller sent a request the other user has not accepted
    PendingThem,
    /// The other user sent a request the caller has not accepted
    PendingMe,
    Connected,
    NoConnection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub username: String,
    pub name: String,
    pub location: String,
    pub profession: String,
    pub thumbnail: Option<String>,
    pub status: RelationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub location: String,
    pub profession: String,
    pub phone_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_members: Vec<TeamMember>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let names: Vec<String> = [
            RelationStatus::PendingThem,
            RelationStatus::PendingMe,
            RelationStatus::Connected,
            RelationStatus::NoConnection,
        ]
        .iter()
        .map(|s| serde_json::to_string(s).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![
                "\"pending-them\"",
                "\"pending-me\"",
                "\"connected\"",
                "\"no-connection\""
            ]
        );
    }
}
