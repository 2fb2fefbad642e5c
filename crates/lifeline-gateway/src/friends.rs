//! Friend requests: `unrelated -> pending -> accepted`, where only the
//! receiver of a pending request can accept it. There is no reject or
//! unfriend transition.

use tracing::info;

use lifeline_db::models::{EdgeRow, FriendRow, SearchHit};
use lifeline_types::events::source;
use lifeline_types::models::{FriendView, RelationStatus, RequestView, SearchResult};

use crate::GatewayState;
use crate::commands::{CommandError, CommandResult, SessionContext, blocking, push};
use crate::views;

/// Classify the caller's edge to another user.
pub fn classify(caller_id: &str, edge: Option<&EdgeRow>) -> RelationStatus {
    match edge {
        None => RelationStatus::NoConnection,
        Some(edge) if edge.accepted => RelationStatus::Connected,
        Some(edge) if edge.sender_id == caller_id => RelationStatus::PendingThem,
        Some(_) => RelationStatus::PendingMe,
    }
}

pub async fn request_connect(
    state: &GatewayState,
    session: &SessionContext,
    target: &str,
) -> CommandResult {
    let caller_id = session.id();
    let target_name = target.to_string();
    let receiver = blocking(&state.db, move |db| db.get_user_by_username(&target_name))
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("user {}", target)))?;

    if receiver.id == caller_id {
        return Err(CommandError::Invalid("cannot connect to self".into()));
    }

    let (connection, created) = blocking(&state.db, move |db| {
        db.get_or_create_connection(&caller_id, &receiver.id)
    })
    .await?;

    if created {
        info!(
            "{} sent a request to {} (connection {})",
            session.username, target, connection.id
        );
    }

    let view = views::request_view(&connection);
    push(&state.router, &connection.sender.username, source::REQUEST_CONNECT, &view).await?;
    push(&state.router, &connection.receiver.username, source::REQUEST_CONNECT, &view).await
}

pub async fn request_accept(
    state: &GatewayState,
    session: &SessionContext,
    sender: &str,
) -> CommandResult {
    let caller_id = session.id();
    let sender_name = sender.to_string();
    let connection = blocking(&state.db, move |db| db.accept_pending(&sender_name, &caller_id))
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("pending request from {}", sender)))?;

    info!(
        "{} accepted {} (connection {})",
        session.username, sender, connection.id
    );

    let request = views::request_view(&connection);
    push(&state.router, &connection.sender.username, source::REQUEST_ACCEPT, &request).await?;
    push(&state.router, &connection.receiver.username, source::REQUEST_ACCEPT, &request).await?;

    let sender_id = connection.sender.id.clone();
    let receiver_id = connection.receiver.id.clone();
    let sender_name = connection.sender.username.clone();
    let receiver_name = connection.receiver.username.clone();
    let friend = FriendRow {
        connection,
        latest_text: None,
        latest_created: None,
    };

    for (viewer_id, viewer_name) in [(sender_id, sender_name), (receiver_id, receiver_name)] {
        if let Some(view) = views::friend_view(&friend, &viewer_id) {
            push(&state.router, &viewer_name, source::FRIEND_NEW, &view).await?;
        }
    }
    Ok(())
}

pub async fn request_list(state: &GatewayState, session: &SessionContext) -> CommandResult {
    let caller_id = session.id();
    let pending = blocking(&state.db, move |db| db.list_pending_for(&caller_id)).await?;
    let requests: Vec<RequestView> = pending.iter().map(views::request_view).collect();
    push(&state.router, &session.username, source::REQUEST_LIST, &requests).await
}

pub async fn friend_list(state: &GatewayState, session: &SessionContext) -> CommandResult {
    let caller_id = session.id();
    let friends = {
        let caller_id = caller_id.clone();
        blocking(&state.db, move |db| db.list_friends(&caller_id)).await?
    };
    let list: Vec<FriendView> = friends
        .iter()
        .filter_map(|f| views::friend_view(f, &caller_id))
        .collect();
    push(&state.router, &session.username, source::FRIEND_LIST, &list).await
}

pub async fn search(state: &GatewayState, session: &SessionContext, query: &str) -> CommandResult {
    let caller_id = session.id();
    let hits = {
        let caller_id = caller_id.clone();
        let query = query.to_string();
        blocking(&state.db, move |db| db.search_users(&caller_id, &query)).await?
    };
    let results: Vec<SearchResult> = hits
        .iter()
        .map(|hit| search_result(hit, &caller_id))
        .collect();
    push(&state.router, &session.username, source::SEARCH, &results).await
}

fn search_result(hit: &SearchHit, caller_id: &str) -> SearchResult {
    let user = &hit.user;
    SearchResult {
        username: user.username.clone(),
        name: views::display_name(&user.first_name, &user.last_name),
        location: user.location.clone(),
        profession: user.profession.clone(),
        thumbnail: user.thumbnail.clone(),
        status: classify(caller_id, hit.edge.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{drain, online, state, user};
    use lifeline_types::events::Frame;

    fn sources(frames: &[Frame]) -> Vec<&str> {
        frames.iter().map(|f| f.source.as_str()).collect()
    }

    #[test]
    fn test_classify_is_exhaustive() {
        let edge = |sender: &str, accepted| EdgeRow {
            sender_id: sender.into(),
            receiver_id: "x".into(),
            accepted,
        };
        assert_eq!(classify("me", None), RelationStatus::NoConnection);
        assert_eq!(classify("me", Some(&edge("me", false))), RelationStatus::PendingThem);
        assert_eq!(classify("me", Some(&edge("them", false))), RelationStatus::PendingMe);
        assert_eq!(classify("me", Some(&edge("me", true))), RelationStatus::Connected);
        assert_eq!(classify("me", Some(&edge("them", true))), RelationStatus::Connected);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_and_notifies_both() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let mut alice_rx = online(&state, &alice).await;
        let mut bob_rx = online(&state, &bob).await;

        request_connect(&state, &alice, "bob").await.unwrap();
        request_connect(&state, &alice, "bob").await.unwrap();
        request_connect(&state, &bob, "alice").await.unwrap();

        let a = drain(&mut alice_rx);
        let b = drain(&mut bob_rx);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);

        // Every delivery refers to the same single connection
        let ids: Vec<i64> = a
            .iter()
            .chain(b.iter())
            .map(|f| f.data["id"].as_i64().unwrap())
            .collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(a[2].data["sender"]["username"], "alice");
        assert_eq!(state.db.list_pending_for(&bob.id()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_to_self_or_unknown_is_rejected() {
        let state = state().await;
        let alice = user(&state, "alice");
        let mut rx = online(&state, &alice).await;

        assert!(matches!(
            request_connect(&state, &alice, "alice").await,
            Err(CommandError::Invalid(_))
        ));
        assert!(matches!(
            request_connect(&state, &alice, "ghost").await,
            Err(CommandError::NotFound(_))
        ));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_accept_delivers_request_then_friend_to_both() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        request_connect(&state, &alice, "bob").await.unwrap();

        let mut alice_rx = online(&state, &alice).await;
        let mut bob_rx = online(&state, &bob).await;
        request_accept(&state, &bob, "alice").await.unwrap();

        let a = drain(&mut alice_rx);
        let b = drain(&mut bob_rx);
        assert_eq!(sources(&a), vec!["request.accept", "friend.new"]);
        assert_eq!(sources(&b), vec!["request.accept", "friend.new"]);

        // Each side sees the other as the friend
        assert_eq!(a[1].data["friend"]["username"], "bob");
        assert_eq!(b[1].data["friend"]["username"], "alice");
        assert_eq!(a[1].data["preview"], views::EMPTY_PREVIEW);
    }

    #[tokio::test]
    async fn test_accept_by_sender_or_third_party_is_noop() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let carol = user(&state, "carol");
        request_connect(&state, &alice, "bob").await.unwrap();

        let mut alice_rx = online(&state, &alice).await;
        let mut bob_rx = online(&state, &bob).await;

        assert!(request_accept(&state, &alice, "alice").await.is_err());
        assert!(request_accept(&state, &alice, "bob").await.is_err());
        assert!(request_accept(&state, &carol, "alice").await.is_err());

        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(state.db.list_pending_for(&bob.id()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_list_only_incoming_pending() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let carol = user(&state, "carol");
        request_connect(&state, &alice, "bob").await.unwrap();
        request_connect(&state, &carol, "bob").await.unwrap();
        request_connect(&state, &bob, "alice").await.unwrap();
        request_accept(&state, &bob, "carol").await.unwrap();

        let mut bob_rx = online(&state, &bob).await;
        request_list(&state, &bob).await.unwrap();

        let frames = drain(&mut bob_rx);
        assert_eq!(frames.len(), 1);
        let list = frames[0].data.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["sender"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_search_status_per_user() {
        let state = state().await;
        let me = user(&state, "sam");
        user(&state, "sally");
        let sid = user(&state, "sid");
        let sue = user(&state, "sue");
        user(&state, "sonia");

        request_connect(&state, &me, "sally").await.unwrap();
        request_connect(&state, &sid, "sam").await.unwrap();
        request_connect(&state, &sue, "sam").await.unwrap();
        request_accept(&state, &me, "sue").await.unwrap();

        let mut rx = online(&state, &me).await;
        search(&state, &me, "S").await.unwrap();

        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        let statuses: Vec<(String, String)> = frames[0]
            .data
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["username"].as_str().unwrap().to_string(),
                    r["status"].as_str().unwrap().to_string(),
                )
            })
            .collect();

        assert_eq!(
            statuses,
            vec![
                ("sally".to_string(), "pending-them".to_string()),
                ("sid".to_string(), "pending-me".to_string()),
                ("sonia".to_string(), "no-connection".to_string()),
                ("sue".to_string(), "connected".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_friend_list_from_callers_perspective() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        request_connect(&state, &alice, "bob").await.unwrap();
        request_accept(&state, &bob, "alice").await.unwrap();

        let mut rx = online(&state, &bob).await;
        friend_list(&state, &bob).await.unwrap();

        let frames = drain(&mut rx);
        let list = frames[0].data.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["friend"]["username"], "alice");
        assert_eq!(list[0]["preview"], "New connection");
    }
}
