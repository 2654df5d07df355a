//! Poll group end to end against an in-process fake Bot API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use botprobe::cli::{run_group, Group};
use botprobe::config::{ReceiverSettings, Settings};
use botprobe::scenario::polls::{self, titles};
use botprobe::scenario::StepReport;
use botprobe::updates::{Chat, Message, PollOption, PollSnapshot, Update, User};
use botprobe::Error;

const TOKEN: &str = "4242:probe-token";
const CHAT_ID: i64 = -100_777;

#[derive(Default)]
struct FakeState {
    next_update_id: i64,
    next_message_id: i64,
    updates: Vec<Update>,
    polls: HashMap<i64, PollSnapshot>,
    calls: Vec<String>,
    vote_on_notification: bool,
}

impl FakeState {
    fn push_update(&mut self, build: impl FnOnce(i64) -> Update) {
        self.next_update_id += 1;
        let update = build(self.next_update_id);
        self.updates.push(update);
    }

    fn message(&mut self, poll: Option<PollSnapshot>, text: Option<String>) -> Message {
        self.next_message_id += 1;
        Message {
            message_id: self.next_message_id,
            from: Some(User {
                is_bot: true,
                ..User::new(4242, "Probe")
            }),
            date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            chat: Chat::supergroup(CHAT_ID, "Probe group"),
            text,
            poll,
        }
    }

    /// A human votes for the first option of the latest poll
    fn vote(&mut self) {
        let Some(poll) = self
            .polls
            .iter()
            .max_by_key(|(message_id, _)| **message_id)
            .map(|(_, poll)| poll.clone())
        else {
            return;
        };
        let mut voted = poll;
        voted.options[0].voter_count = 1;
        voted.total_voter_count = 1;

        let chatter = Message {
            text: Some("voting now".to_string()),
            from: Some(User::new(7, "Tester").with_username("tester")),
            ..self.message(None, None)
        };
        self.push_update(|id| Update::with_message(id, chatter));
        self.push_update(|id| Update::with_poll(id, voted));
    }
}

type Shared = Arc<Mutex<FakeState>>;

fn ok(result: impl serde::Serialize) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"ok": true, "result": result})))
}

fn refused(code: u16, description: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(code).unwrap(),
        Json(json!({"ok": false, "error_code": code, "description": description})),
    )
}

async fn dispatch(
    State(state): State<Shared>,
    Path((bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if bot != format!("bot{}", TOKEN) {
        return refused(401, "Unauthorized");
    }

    let mut state = state.lock();
    state.calls.push(method.clone());

    match method.as_str() {
        "getMe" => ok(User {
            is_bot: true,
            ..User::new(4242, "Probe").with_username("probe_bot")
        }),
        "getUpdates" => {
            let offset = body["offset"].as_i64();
            if let Some(offset) = offset {
                state.updates.retain(|u| u.update_id >= offset);
            }
            // The Bot API hands out at most 100 updates per call
            ok(state.updates.iter().take(100).cloned().collect::<Vec<_>>())
        }
        "sendPoll" => {
            let options: Vec<String> = body["options"]
                .as_array()
                .map(|opts| {
                    opts.iter()
                        .filter_map(|o| o["text"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            if options.len() < 2 {
                return refused(400, polls::NOT_ENOUGH_OPTIONS);
            }
            let question = body["question"].as_str().unwrap_or_default();
            let poll = PollSnapshot::new(format!("poll-{}", state.polls.len() + 1), question, options);
            let message = state.message(Some(poll.clone()), None);
            state.polls.insert(message.message_id, poll);
            ok(message)
        }
        "sendMessage" => {
            let text = body["text"].as_str().unwrap_or_default().to_string();
            let message = state.message(None, Some(text));
            if state.vote_on_notification {
                state.vote();
            }
            ok(message)
        }
        "stopPoll" => {
            let message_id = body["message_id"].as_i64().unwrap_or_default();
            match state.polls.get_mut(&message_id) {
                Some(poll) => {
                    poll.close();
                    let closed = poll.clone();
                    ok(closed)
                }
                None => refused(400, "Bad Request: message to stop poll not found"),
            }
        }
        _ => refused(404, "Not Found"),
    }
}

async fn spawn_fake(state: Shared) -> SocketAddr {
    let app = Router::new()
        .route("/{bot}/{method}", post(dispatch))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings(addr: SocketAddr, update_timeout_secs: u64) -> Settings {
    Settings {
        api_token: TOKEN.to_string(),
        api_base: format!("http://{}", addr),
        chat_id: CHAT_ID,
        request_timeout_secs: 5,
        receiver: ReceiverSettings {
            backoff_ms: 20,
            update_timeout_secs,
        },
        ..Settings::default()
    }
}

fn step<'a>(steps: &'a [StepReport], title: &str) -> &'a StepReport {
    steps.iter().find(|s| s.title == title).unwrap()
}

#[tokio::test]
async fn test_poll_group_passes_end_to_end() {
    let state: Shared = Arc::new(Mutex::new(FakeState {
        vote_on_notification: true,
        ..FakeState::default()
    }));

    // Left over from an earlier run; must be skipped, not matched.
    {
        let mut s = state.lock();
        let stale = PollSnapshot::new("stale-poll", "old", ["a", "b"]);
        s.push_update(|id| Update::with_poll(id, stale));
    }

    let addr = spawn_fake(state.clone()).await;
    let report = run_group(&settings(addr, 5), Group::Polls).await.unwrap();

    assert!(report.all_passed(), "{}", report);
    assert_eq!(report.passed(), 4);

    let calls = state.lock().calls.clone();
    assert_eq!(calls[0], "getMe");
    assert_eq!(calls[1], "getUpdates");
    let order: Vec<&str> = calls
        .iter()
        .map(String::as_str)
        .filter(|m| *m != "getUpdates")
        .collect();
    assert_eq!(
        order,
        vec!["getMe", "sendPoll", "sendMessage", "stopPoll", "sendPoll"]
    );
}

#[tokio::test]
async fn test_poll_group_reports_timeout_when_nobody_votes() {
    let state: Shared = Arc::new(Mutex::new(FakeState::default()));
    let addr = spawn_fake(state.clone()).await;

    let report = run_group(&settings(addr, 1), Group::Polls).await.unwrap();

    assert_eq!(report.failed(), 1);
    assert!(step(&report.steps, titles::SEND_POLL).passed());
    assert!(matches!(
        step(&report.steps, titles::POLL_STATE_UPDATE).error(),
        Some(Error::Timeout { .. })
    ));
    assert!(step(&report.steps, titles::STOP_POLL).passed());
    assert!(step(&report.steps, titles::NOT_ENOUGH_OPTIONS).passed());
}

#[tokio::test]
async fn test_bad_token_fails_before_any_step() {
    let state: Shared = Arc::new(Mutex::new(FakeState::default()));
    let addr = spawn_fake(state.clone()).await;

    let mut bad = settings(addr, 1);
    bad.api_token = "1:wrong".to_string();

    let err = run_group(&bad, Group::Polls).await.unwrap_err();
    assert_eq!(err, Error::Transport("getMe: 401 Unauthorized".to_string()));
    assert!(state.lock().calls.is_empty());
}

#[tokio::test]
async fn test_single_option_poll_error_text() {
    let state: Shared = Arc::new(Mutex::new(FakeState::default()));
    let addr = spawn_fake(state).await;
    let settings = settings(addr, 1);

    let bot = botprobe::bot::BotClient::new(
        settings.api_token.clone(),
        &settings.api_base,
        settings.request_timeout(),
    )
    .unwrap();
    let err = bot
        .send_poll(CHAT_ID, polls::SINGLE_OPTION_QUESTION, &[polls::SINGLE_OPTION])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Bad Request: poll must have at least 2 option");
    assert!(matches!(err, Error::InvalidRequest { code: 400, .. }));

    let ok_poll = bot
        .send_poll(CHAT_ID, polls::QUESTION, &polls::OPTIONS)
        .await
        .unwrap();
    let poll = ok_poll.poll.unwrap();
    assert_eq!(poll.options, polls::OPTIONS.map(PollOption::new).to_vec());
}
