mod common;

use common::{MockTransport, StubEvaluator, StubShare, TEMPLATE, dispatcher};
use rustbot::bot::Dispatcher;
use rustbot::core::models::{EvaluationResult, EventKind, MessageEvent, UserRecord};
use rustbot::errors::BotError;
use rustbot::playground::SnippetTemplate;
use rustbot::slack::{Session, SessionState};
use std::time::Duration;

const BOT_ID: &str = "BOT123";

fn bot_user() -> UserRecord {
    UserRecord {
        id: BOT_ID.to_string(),
        name: Some("rustbot".to_string()),
        is_bot: true,
    }
}

fn message(text: &str) -> MessageEvent {
    MessageEvent {
        channel: "C1".to_string(),
        user: "U1".to_string(),
        text: text.to_string(),
        kind: EventKind::Message,
    }
}

fn session(transport: MockTransport, result: EvaluationResult) -> Session<MockTransport> {
    Session::new(
        transport,
        dispatcher(result, Some("http://example/x")),
        BOT_ID.to_string(),
        Duration::from_millis(1),
    )
}

#[tokio::test]
async fn test_start_resolves_identity() {
    let transport = MockTransport {
        user: Some(bot_user()),
        ..Default::default()
    };
    let looked_up = transport.looked_up.clone();
    let mut s = session(transport, EvaluationResult::Unknown);
    assert_eq!(s.state(), SessionState::Disconnected);

    let identity = s.start().await.unwrap();

    assert_eq!(identity.id, BOT_ID);
    assert_eq!(identity.display_name, "rustbot");
    assert_eq!(s.state(), SessionState::Listening);
    assert_eq!(*looked_up.lock().unwrap(), vec![BOT_ID.to_string()]);
}

#[tokio::test]
async fn test_start_rejects_human_account() {
    let transport = MockTransport {
        user: Some(UserRecord {
            is_bot: false,
            ..bot_user()
        }),
        ..Default::default()
    };
    let mut s = session(transport, EvaluationResult::Unknown);

    let err = s.start().await.unwrap_err();
    assert!(matches!(err, BotError::IdentityError(_)));
    assert_eq!(s.state(), SessionState::Identifying);
}

#[tokio::test]
async fn test_start_rejects_missing_account() {
    let mut s = session(MockTransport::default(), EvaluationResult::Unknown);
    assert!(matches!(
        s.start().await,
        Err(BotError::IdentityError(msg)) if msg.contains("user_not_found")
    ));
}

#[tokio::test]
async fn test_connect_failure_is_fatal() {
    let transport = MockTransport {
        connect_fails: true,
        user: Some(bot_user()),
        ..Default::default()
    };
    let looked_up = transport.looked_up.clone();
    let mut s = session(transport, EvaluationResult::Unknown);

    assert!(matches!(s.start().await, Err(BotError::TransportError(_))));
    assert!(looked_up.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mention_with_command_is_answered() {
    let evaluator = StubEvaluator::new(EvaluationResult::CompileError("error[E0999]".to_string()));
    let seen = evaluator.seen.clone();
    let d = Dispatcher::new(
        SnippetTemplate::new(TEMPLATE).unwrap(),
        Box::new(evaluator),
        Box::new(StubShare {
            url: Some("http://example/x".to_string()),
        }),
        1500,
    );
    let transport = MockTransport {
        user: Some(bot_user()),
        batches: vec![vec![message("<@BOT123> !rustc 1+1")]].into(),
        ..Default::default()
    };
    let sent = transport.sent.clone();
    let mut s = Session::new(transport, d, BOT_ID.to_string(), Duration::from_millis(1));
    s.start().await.unwrap();

    assert_eq!(s.run_cycle().await.unwrap(), 1);

    assert_eq!(seen.lock().unwrap()[0], "fn main() {\n    1+1\n}\n");
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C1");
    assert!(sent[0].1.starts_with("<@U1>: :scream_cat:"));
    assert!(sent[0].1.contains("http://example/x"));
}

#[tokio::test]
async fn test_escaped_text_is_unescaped_before_dispatch() {
    let evaluator = StubEvaluator::new(EvaluationResult::Success("true".to_string()));
    let seen = evaluator.seen.clone();
    let d = Dispatcher::new(
        SnippetTemplate::new("$snippet").unwrap(),
        Box::new(evaluator),
        Box::new(StubShare { url: None }),
        1500,
    );
    let transport = MockTransport {
        user: Some(bot_user()),
        ..Default::default()
    };
    let mut s = Session::new(transport, d, BOT_ID.to_string(), Duration::from_millis(1));
    s.start().await.unwrap();

    let reply = s.handle_event(&message("  rustbot 1 &lt; 2 &amp;&amp; true  ")).await;

    assert_eq!(reply.as_deref(), Some("<@U1>: :+1:\n```true```"));
    assert_eq!(seen.lock().unwrap()[0], "1 < 2 && true");
}

#[tokio::test]
async fn test_non_mentions_and_noise_are_ignored() {
    let transport = MockTransport {
        user: Some(bot_user()),
        ..Default::default()
    };
    let sent = transport.sent.clone();
    let mut s = session(transport, EvaluationResult::Success("4".to_string()));
    s.start().await.unwrap();

    assert_eq!(s.handle_event(&message("!rustc 1+1")).await, None);
    assert_eq!(s.handle_event(&message("<@BOT123>")).await, None);
    assert_eq!(s.handle_event(&message("")).await, None);

    let mut joined = message("<@BOT123> 1+1");
    joined.kind = EventKind::Other("app_mention".to_string());
    assert_eq!(s.handle_event(&joined).await, None);

    let mut own = message("<@BOT123> 1+1");
    own.user = BOT_ID.to_string();
    assert_eq!(s.handle_event(&own).await, None);

    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_events_before_start_are_ignored() {
    let s = session(
        MockTransport {
            user: Some(bot_user()),
            ..Default::default()
        },
        EvaluationResult::Success("4".to_string()),
    );
    assert_eq!(s.handle_event(&message("<@BOT123> 1+1")).await, None);
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown() {
    let transport = MockTransport {
        user: Some(bot_user()),
        batches: vec![vec![], vec![message("<@BOT123> 2+2")]].into(),
        ..Default::default()
    };
    let sent = transport.sent.clone();
    let mut s = session(transport, EvaluationResult::Success("4".to_string()));

    s.run_until(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    assert_eq!(s.state(), SessionState::Terminated);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_run_until_propagates_transport_failure() {
    let transport = MockTransport {
        user: Some(bot_user()),
        batches: vec![vec![message("<@BOT123> 2+2")]].into(),
        fail_when_drained: true,
        ..Default::default()
    };
    let sent = transport.sent.clone();
    let mut s = session(transport, EvaluationResult::Success("4".to_string()));

    let result = s.run_until(std::future::pending::<()>()).await;

    assert!(matches!(result, Err(BotError::TransportError(_))));
    assert_eq!(s.state(), SessionState::Terminated);
    assert_eq!(sent.lock().unwrap().len(), 1);
}
