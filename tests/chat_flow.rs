use std::sync::Arc;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::mpsc::UnboundedReceiver;

use huddle::chat::audit::TracingAudit;
use huddle::chat::dispatch::Dispatcher;
use huddle::chat::events::{ClientEvent, ServerEvent};
use huddle::chat::rooms::{ChatRooms, ConnectionHandle};
use huddle::db;
use huddle::session::Identity;

async fn dispatcher() -> (Dispatcher, SqlitePool) {
    // one connection only: each `sqlite::memory:` connection is a separate db
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::ensure_schema(&pool).await.unwrap();

    (
        Dispatcher::new(pool.clone(), ChatRooms::new(), Arc::new(TracingAudit)),
        pool,
    )
}

fn connect(user_id: &str, name: &str) -> (ConnectionHandle, UnboundedReceiver<ServerEvent>) {
    ConnectionHandle::new(Some(Identity {
        user_id: user_id.to_owned(),
        name: Some(name.to_owned()),
    }))
}

fn join(chat_id: &str) -> ClientEvent {
    ClientEvent::Join { chat_id: Some(chat_id.to_owned()) }
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn typing_reaches_the_other_member_and_never_the_sender() {
    let (dispatcher, _pool) = dispatcher().await;
    let (a, mut ra) = connect("u1", "Alice");
    let (b, mut rb) = connect("u2", "Bob");

    dispatcher.dispatch(&a, join("42")).await;
    dispatcher.dispatch(&b, join("42")).await;
    drain(&mut ra);
    drain(&mut rb);

    dispatcher
        .dispatch(&a, ClientEvent::Typing { chat_id: Some("42".to_owned()), is_typing: true })
        .await;

    assert!(drain(&mut ra).is_empty());
    assert_eq!(
        drain(&mut rb),
        vec![ServerEvent::Typing {
            chat_id: "42".to_owned(),
            sender_id: "u1".to_owned(),
            sender_name: "Alice".to_owned(),
            is_typing: true,
        }]
    );
}

#[tokio::test]
async fn mark_read_persists_and_notifies_the_full_room() {
    let (dispatcher, pool) = dispatcher().await;
    sqlx::query("INSERT INTO messages (id,chat_id,content) VALUES ('m1','42','hello')")
        .execute(&pool)
        .await
        .unwrap();

    let (a, mut ra) = connect("u1", "Alice");
    let (b, mut rb) = connect("u2", "Bob");
    dispatcher.dispatch(&a, join("42")).await;
    dispatcher.dispatch(&b, join("42")).await;
    drain(&mut ra);
    drain(&mut rb);

    dispatcher
        .dispatch(&a, ClientEvent::MarkRead { message_id: Some("m1".to_owned()) })
        .await;

    let (user_id, read_at): (String, String) =
        sqlx::query_as("SELECT user_id,read_at FROM read_receipts WHERE message_id='m1'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(user_id, "u1");

    let expected = ServerEvent::MessageRead {
        message_id: "m1".to_owned(),
        read_by: "u1".to_owned(),
        read_by_name: "Alice".to_owned(),
        read_at,
    };
    assert_eq!(drain(&mut ra), vec![expected.clone()]);
    assert_eq!(drain(&mut rb), vec![expected]);
}

#[tokio::test]
async fn ghost_mark_read_persists_quietly() {
    let (dispatcher, pool) = dispatcher().await;
    let (a, mut ra) = connect("u1", "Alice");
    dispatcher.dispatch(&a, join("42")).await;
    drain(&mut ra);

    dispatcher
        .dispatch(&a, ClientEvent::MarkRead { message_id: Some("ghost".to_owned()) })
        .await;

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM read_receipts WHERE message_id='ghost' AND user_id='u1'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
    // no broadcast, no error
    assert!(drain(&mut ra).is_empty());
}

#[tokio::test]
async fn join_and_leave_notices_flow_through_the_room() {
    let (dispatcher, _pool) = dispatcher().await;
    let (a, mut ra) = connect("u1", "Alice");
    let (b, mut rb) = connect("u2", "Bob");

    dispatcher.dispatch(&a, join("42")).await;
    dispatcher.dispatch(&b, join("42")).await;

    let a_events = drain(&mut ra);
    assert!(matches!(a_events[0], ServerEvent::Joined { .. }));
    assert_eq!(
        a_events[1],
        ServerEvent::UserJoined {
            user_id: Some("u2".to_owned()),
            user_name: "Bob".to_owned(),
            chat_id: "42".to_owned(),
        }
    );

    dispatcher
        .dispatch(&b, ClientEvent::Leave { chat_id: Some("42".to_owned()) })
        .await;

    assert_eq!(
        drain(&mut ra),
        vec![ServerEvent::UserLeft {
            user_id: Some("u2".to_owned()),
            user_name: "Bob".to_owned(),
            chat_id: "42".to_owned(),
        }]
    );
    let b_events = drain(&mut rb);
    assert!(matches!(b_events.last(), Some(ServerEvent::Left { .. })));
    assert_eq!(dispatcher.rooms().members("42"), vec![a.id]);
}

#[tokio::test]
async fn rereads_by_the_same_user_broadcast_each_time() {
    let (dispatcher, pool) = dispatcher().await;
    sqlx::query("INSERT INTO messages (id,chat_id,content) VALUES ('m1','42','hello')")
        .execute(&pool)
        .await
        .unwrap();

    let (a, mut ra) = connect("u1", "Alice");
    dispatcher.dispatch(&a, join("42")).await;
    drain(&mut ra);

    dispatcher
        .dispatch(&a, ClientEvent::MarkRead { message_id: Some("m1".to_owned()) })
        .await;
    dispatcher
        .dispatch(&a, ClientEvent::MarkRead { message_id: Some("m1".to_owned()) })
        .await;

    // two broadcasts, one persisted row
    let events = drain(&mut ra);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, ServerEvent::MessageRead { .. })));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM read_receipts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
