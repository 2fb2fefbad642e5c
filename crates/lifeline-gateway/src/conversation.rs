use lifeline_db::models::ConnectionRow;
use lifeline_types::events::source;
use lifeline_types::models::{MessageDelivery, MessagePage, TypingNotice};

use crate::GatewayState;
use crate::commands::{CommandError, CommandResult, SessionContext, blocking, push};
use crate::views;

/// Messages per `message.list` page.
pub const PAGE_SIZE: u32 = 15;

/// Index of the page after `page`, if any messages remain past it.
pub fn next_page(total: u64, page: u32) -> Option<u32> {
    let seen = (u64::from(page) + 1) * u64::from(PAGE_SIZE);
    (total > seen).then(|| page + 1)
}

/// Load a connection the caller is a party to. Connections belonging to
/// other users are reported as not found.
async fn party_connection(
    state: &GatewayState,
    session: &SessionContext,
    connection_id: i64,
) -> Result<ConnectionRow, CommandError> {
    let connection = blocking(&state.db, move |db| db.get_connection(connection_id))
        .await?
        .filter(|c| c.involves(&session.id()))
        .ok_or_else(|| CommandError::NotFound(format!("connection {}", connection_id)))?;
    Ok(connection)
}

pub async fn message_list(
    state: &GatewayState,
    session: &SessionContext,
    connection_id: i64,
    page: u32,
) -> CommandResult {
    let connection = party_connection(state, session, connection_id).await?;
    let caller_id = session.id();

    let offset = u64::from(page) * u64::from(PAGE_SIZE);
    let (rows, total) = blocking(&state.db, move |db| {
        let rows = db.page_messages(connection_id, offset, PAGE_SIZE)?;
        let total = db.count_messages(connection_id)?;
        Ok((rows, total))
    })
    .await?;

    let friend = connection
        .counterpart(&caller_id)
        .map(views::profile)
        .ok_or_else(|| CommandError::NotFound(format!("counterpart in {}", connection_id)))?;

    let data = MessagePage {
        messages: rows
            .iter()
            .map(|m| views::message_view(m, &caller_id))
            .collect(),
        next: next_page(total, page),
        friend,
    };
    push(&state.router, &session.username, source::MESSAGE_LIST, &data).await
}

/// Store a message and deliver one copy to each party, rendered from that
/// party's side.
pub async fn message_send(
    state: &GatewayState,
    session: &SessionContext,
    connection_id: i64,
    text: &str,
) -> CommandResult {
    let connection = party_connection(state, session, connection_id).await?;
    let caller_id = session.id();

    let (me, recipient) = if connection.sender.id == caller_id {
        (&connection.sender, &connection.receiver)
    } else {
        (&connection.receiver, &connection.sender)
    };

    let message = {
        let author_id = caller_id.clone();
        let text = text.to_string();
        blocking(&state.db, move |db| {
            db.insert_message(connection_id, &author_id, &text)
        })
        .await?
    };

    let own_copy = MessageDelivery {
        message: views::message_view(&message, &me.id),
        friend: views::profile(recipient),
    };
    push(&state.router, &me.username, source::MESSAGE_SEND, &own_copy).await?;

    let their_copy = MessageDelivery {
        message: views::message_view(&message, &recipient.id),
        friend: views::profile(me),
    };
    push(&state.router, &recipient.username, source::MESSAGE_SEND, &their_copy).await
}

pub async fn message_type(
    state: &GatewayState,
    session: &SessionContext,
    recipient: &str,
) -> CommandResult {
    let notice = TypingNotice {
        username: session.username.clone(),
    };
    push(&state.router, recipient, source::MESSAGE_TYPE, &notice).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friends::{request_accept, request_connect};
    use crate::test_support::{drain, online, state, user};

    async fn friends(state: &GatewayState, a: &SessionContext, b: &SessionContext) -> i64 {
        request_connect(state, a, &b.username).await.unwrap();
        request_accept(state, b, &a.username).await.unwrap();
        state.db.list_friends(&a.id()).unwrap()[0].connection.id
    }

    #[test]
    fn test_next_page_boundaries() {
        assert_eq!(next_page(0, 0), None);
        assert_eq!(next_page(15, 0), None);
        assert_eq!(next_page(16, 0), Some(1));
        assert_eq!(next_page(30, 1), None);
        assert_eq!(next_page(31, 1), Some(2));
        assert_eq!(next_page(5, 3), None);
    }

    #[tokio::test]
    async fn test_send_delivers_two_perspectives() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let id = friends(&state, &alice, &bob).await;

        let mut alice_rx = online(&state, &alice).await;
        let mut bob_rx = online(&state, &bob).await;
        message_send(&state, &alice, id, "hi bob").await.unwrap();

        let a = drain(&mut alice_rx);
        let b = drain(&mut bob_rx);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].source, "message.send");
        assert_eq!(a[0].data["message"]["is_me"], true);
        assert_eq!(a[0].data["friend"]["username"], "bob");
        assert_eq!(b[0].data["message"]["is_me"], false);
        assert_eq!(b[0].data["friend"]["username"], "alice");
        assert_eq!(a[0].data["message"]["id"], b[0].data["message"]["id"]);
    }

    #[tokio::test]
    async fn test_send_persists_when_recipient_offline() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let id = friends(&state, &alice, &bob).await;

        let mut alice_rx = online(&state, &alice).await;
        message_send(&state, &alice, id, "are you there").await.unwrap();

        assert_eq!(drain(&mut alice_rx).len(), 1);
        assert_eq!(state.db.count_messages(id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_by_outsider_is_not_found() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let mallory = user(&state, "mallory");
        let id = friends(&state, &alice, &bob).await;

        let result = message_send(&state, &mallory, id, "hello").await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));
        assert_eq!(state.db.count_messages(id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pages_are_contiguous_and_descending() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let id = friends(&state, &alice, &bob).await;

        for i in 0..32 {
            state.db.insert_message(id, &bob.id(), &format!("m{}", i)).unwrap();
        }

        let mut rx = online(&state, &alice).await;
        let mut texts = Vec::new();
        let mut nexts = Vec::new();
        for page in 0..3 {
            message_list(&state, &alice, id, page).await.unwrap();
            let frame = drain(&mut rx).pop().unwrap();
            assert_eq!(frame.data["friend"]["username"], "bob");
            nexts.push(frame.data["next"].as_u64());
            for m in frame.data["messages"].as_array().unwrap() {
                assert_eq!(m["is_me"], false);
                texts.push(m["text"].as_str().unwrap().to_string());
            }
        }

        assert_eq!(nexts, vec![Some(1), Some(2), None]);
        let expected: Vec<String> = (0..32).rev().map(|i| format!("m{}", i)).collect();
        assert_eq!(texts, expected);
    }

    #[tokio::test]
    async fn test_typing_goes_to_recipient_only() {
        let state = state().await;
        let alice = user(&state, "alice");
        let bob = user(&state, "bob");
        let mut alice_rx = online(&state, &alice).await;
        let mut bob_rx = online(&state, &bob).await;

        message_type(&state, &alice, "bob").await.unwrap();

        assert!(drain(&mut alice_rx).is_empty());
        let b = drain(&mut bob_rx);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].data["username"], "alice");
    }
}
