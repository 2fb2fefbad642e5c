/// Database row types. These map directly to SQLite rows and stay
/// independent of the wire types in lifeline-types.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
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
    pub created_at: String,
}

/// Insert payload for a new account. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
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
}

/// Owner-supplied profile edits. `None` leaves a field unchanged. There is
/// no username field: handles are immutable.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub organization_name: Option<String>,
    pub organization_address: Option<String>,
    pub profession: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub org_pincode: Option<String>,
}

/// A connection with both endpoints joined in.
#[derive(Debug, Clone)]
pub struct ConnectionRow {
    pub id: i64,
    pub sender: UserRow,
    pub receiver: UserRow,
    pub accepted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ConnectionRow {
    /// The endpoint that is not `user_id`, or `None` if `user_id` is not a party.
    pub fn counterpart(&self, user_id: &str) -> Option<&UserRow> {
        if self.sender.id == user_id {
            Some(&self.receiver)
        } else if self.receiver.id == user_id {
            Some(&self.sender)
        } else {
            None
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.sender.id == user_id || self.receiver.id == user_id
    }
}

/// An accepted connection plus its most recent message, if any.
#[derive(Debug, Clone)]
pub struct FriendRow {
    pub connection: ConnectionRow,
    pub latest_text: Option<String>,
    pub latest_created: Option<String>,
}

impl FriendRow {
    /// Sort key for the friend list: last message time, else last edge update.
    pub fn activity(&self) -> &str {
        self.latest_created
            .as_deref()
            .unwrap_or(&self.connection.updated_at)
    }
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub connection_id: i64,
    pub author_id: String,
    pub text: String,
    pub created_at: String,
}

/// Direction and state of an edge, without the joined users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub sender_id: String,
    pub receiver_id: String,
    pub accepted: bool,
}

/// A user matched by search, with the caller's edge to them if one exists.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub user: UserRow,
    pub edge: Option<EdgeRow>,
}
