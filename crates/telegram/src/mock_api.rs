//! In-process stand-in for the Telegram Bot API.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde::Deserialize,
    serde_json::{Value, json},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CapturedRequest {
    SendMessage { chat_id: i64, text: String },
    SendChatAction { chat_id: i64, action: String },
    GetUpdates { offset: Option<i64> },
    Other { method: String },
}

#[derive(Deserialize)]
struct SendMessageRequest {
    chat_id: i64,
    text: String,
}

#[derive(Deserialize)]
struct SendChatActionRequest {
    chat_id: i64,
    action: String,
}

#[derive(Deserialize)]
struct GetUpdatesRequest {
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Update batches handed out by successive `getUpdates` calls; an empty
    /// queue yields an empty batch after a short pause.
    updates: Arc<Mutex<VecDeque<Vec<Value>>>>,
}

pub(crate) struct MockTelegramApi {
    url: reqwest::Url,
    state: MockState,
}

impl MockTelegramApi {
    pub(crate) async fn start() -> Self {
        Self::with_updates(Vec::new()).await
    }

    pub(crate) async fn with_updates(batches: Vec<Vec<Value>>) -> Self {
        let state = MockState {
            updates: Arc::new(Mutex::new(batches.into())),
            ..Default::default()
        };
        let app = Router::new()
            .route("/{*path}", post(handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("serve mock telegram api");
        });

        let url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        Self { url, state }
    }

    pub(crate) fn bot(&self) -> teloxide::Bot {
        teloxide::Bot::new("test-token").set_api_url(self.url.clone())
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().expect("lock requests").clone()
    }
}

async fn handler(State(state): State<MockState>, uri: Uri, body: Bytes) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();

    let captured = match method.as_str() {
        "SendMessage" => serde_json::from_slice::<SendMessageRequest>(&body)
            .map(|r| CapturedRequest::SendMessage {
                chat_id: r.chat_id,
                text: r.text,
            })
            .ok(),
        "SendChatAction" => serde_json::from_slice::<SendChatActionRequest>(&body)
            .map(|r| CapturedRequest::SendChatAction {
                chat_id: r.chat_id,
                action: r.action,
            })
            .ok(),
        "GetUpdates" => serde_json::from_slice::<GetUpdatesRequest>(&body)
            .map(|r| CapturedRequest::GetUpdates { offset: r.offset })
            .ok(),
        _ => None,
    }
    .unwrap_or(CapturedRequest::Other {
        method: method.clone(),
    });
    state.requests.lock().expect("lock requests").push(captured);

    let result = match method.as_str() {
        "SendMessage" => json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": 42, "type": "private" },
            "text": "ok"
        }),
        "GetMe" => json!({
            "id": 1,
            "is_bot": true,
            "first_name": "Ragbridge",
            "username": "ragbridge_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        }),
        "GetUpdates" => {
            let next = state.updates.lock().expect("lock updates").pop_front();
            match next {
                Some(batch) => Value::Array(batch),
                None => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    json!([])
                },
            }
        },
        _ => json!(true),
    };
    Json(json!({ "ok": true, "result": result }))
}
