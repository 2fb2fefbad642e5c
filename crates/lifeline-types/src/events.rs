use serde::{Deserialize, Serialize};

/// Frame source names. Responses echo the command that caused them, except
/// `friend.new` which follows an accepted request.
pub mod source {
    pub const FRIEND_LIST: &str = "friend.list";
    pub const FRIEND_NEW: &str = "friend.new";
    pub const MESSAGE_LIST: &str = "message.list";
    pub const MESSAGE_SEND: &str = "message.send";
    pub const MESSAGE_TYPE: &str = "message.type";
    pub const REQUEST_ACCEPT: &str = "request.accept";
    pub const REQUEST_CONNECT: &str = "request.connect";
    pub const REQUEST_LIST: &str = "request.list";
    pub const SEARCH: &str = "search";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const TEAM_REQUEST: &str = "team.request";
}

/// Commands sent FROM client TO server over the gateway socket.
///
/// Frames whose `source` is not listed here fail to deserialize and are
/// dropped by the session loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum Command {
    /// Accepted connections with their latest message preview
    #[serde(rename = "friend.list")]
    FriendList,

    /// One page of a conversation, newest first
    #[serde(rename = "message.list")]
    MessageList {
        #[serde(rename = "connectionId")]
        connection_id: i64,
        #[serde(default)]
        page: u32,
    },

    #[serde(rename = "message.send")]
    MessageSend {
        #[serde(rename = "connectionId")]
        connection_id: i64,
        #[serde(alias = "text")]
        message: String,
    },

    /// Typing indicator relayed to `username`
    #[serde(rename = "message.type")]
    MessageType { username: String },

    /// Accept the pending request sent by `username`
    #[serde(rename = "request.accept")]
    RequestAccept { username: String },

    /// Send a friend request to `username`
    #[serde(rename = "request.connect")]
    RequestConnect { username: String },

    /// Pending requests addressed to the caller
    #[serde(rename = "request.list")]
    RequestList,

    #[serde(rename = "search")]
    Search { query: String },

    /// Replace the caller's avatar with a base64-encoded image
    #[serde(rename = "thumbnail")]
    Thumbnail { base64: String, filename: String },

    /// Assemble an emergency response team around a target point
    #[serde(rename = "team.request")]
    TeamRequest {
        target_latitude: f64,
        target_longitude: f64,
        #[serde(default)]
        target_disaster_type: String,
        #[serde(default)]
        severity_level: String,
        #[serde(default)]
        target_location: Option<String>,
    },
}

impl Command {
    pub fn source(&self) -> &'static str {
        match self {
            Self::FriendList => source::FRIEND_LIST,
            Self::MessageList { .. } => source::MESSAGE_LIST,
            Self::MessageSend { .. } => source::MESSAGE_SEND,
            Self::MessageType { .. } => source::MESSAGE_TYPE,
            Self::RequestAccept { .. } => source::REQUEST_ACCEPT,
            Self::RequestConnect { .. } => source::REQUEST_CONNECT,
            Self::RequestList => source::REQUEST_LIST,
            Self::Search { .. } => source::SEARCH,
            Self::Thumbnail { .. } => source::THUMBNAIL,
            Self::TeamRequest { .. } => source::TEAM_REQUEST,
        }
    }
}

/// Frame pushed FROM server TO client: `{ "source": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub source: String,
    pub data: serde_json::Value,
}

impl Frame {
    pub fn new<T: Serialize>(source: &str, data: &T) -> serde_json::Result<Self> {
        Ok(Self {
            source: source.to_string(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// Commands accepted on a group chat room socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomCommand {
    /// Broadcast `message` to everyone in the room, the sender included
    #[serde(rename = "send_message")]
    SendMessage { message: String },
}

/// Events pushed to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    #[serde(rename = "group_message")]
    GroupMessage { message: String, username: String },
}
