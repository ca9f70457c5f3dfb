//! A drawing session: the shape store plus the bookkeeping around its two service
//! boundaries (persistence and assistant).
//!
//! Transport is the host's job. Each boundary call is issued as an [`OutboundRequest`]
//! carrying a ticket; the host performs it and reports back with [`DrawingSession::complete`]
//! or [`DrawingSession::fail`]. Tickets can be cancelled, after which their completion is
//! refused. Nothing limits how many requests are in flight at once.

use std::collections::HashMap;
use std::fmt;
use serde::Serialize;
use crate::config::EngineConfig;
use crate::error::{DrawingError, Result};
use crate::io::{assistant_request_body, decode_assistant_reply, decode_load_response, Reply, SaveRequest};
use crate::render::{render, Surface};
use crate::store::ShapeStore;
use crate::types::Shape;

pub type Ticket = u32;

const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Save,
    Load,
    Assistant,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// A request for the host to perform.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct OutboundRequest {
    pub ticket: Ticket,
    pub kind: RequestKind,
    pub method: Method,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// User-facing outcome of a boundary exchange.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    NameRequired,
    Saved,
    SaveFailed,
    Loaded { count: usize },
    NotFound,
    ConnectionFailed,
    ShapesAdded { count: usize },
    RateLimited,
    TryAgain,
}

impl Notice {
    pub fn for_error(err: &DrawingError) -> Option<Notice> {
        match err {
            DrawingError::EmptyName => Some(Notice::NameRequired),
            DrawingError::Transport(_) => Some(Notice::ConnectionFailed),
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NameRequired => write!(f, "Please enter a drawing name first."),
            Notice::Saved => write!(f, "Drawing saved."),
            Notice::SaveFailed => write!(f, "Saving the drawing failed."),
            Notice::Loaded { count } => write!(f, "Drawing loaded with {} shape(s).", count),
            Notice::NotFound => write!(f, "No drawing with that name was found."),
            Notice::ConnectionFailed => write!(f, "Could not reach the server."),
            Notice::ShapesAdded { count } => write!(f, "Added {} shape(s) to the drawing.", count),
            Notice::RateLimited => write!(f, "Request limit reached, please try again later."),
            Notice::TryAgain => write!(f, "Please try again."),
        }
    }
}

pub struct DrawingSession {
    config: EngineConfig,
    store: ShapeStore,
    transcript: Vec<ChatMessage>,
    pending: HashMap<Ticket, RequestKind>,
    next_ticket: Ticket,
}

impl DrawingSession {
    pub fn new(config: EngineConfig) -> DrawingSession {
        DrawingSession {
            config,
            store: ShapeStore::new(),
            transcript: Vec::new(),
            pending: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn store(&self) -> &ShapeStore { &self.store }
    pub fn store_mut(&mut self) -> &mut ShapeStore { &mut self.store }
    pub fn shapes(&self) -> &[Shape] { self.store.shapes() }
    pub fn transcript(&self) -> &[ChatMessage] { &self.transcript }

    pub fn in_flight(&self) -> usize { self.pending.len() }

    pub fn is_pending(&self, ticket: Ticket) -> bool { self.pending.contains_key(&ticket) }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        render(surface, self.store.shapes());
    }

    fn issue(&mut self, kind: RequestKind, method: Method, url: String, body: Option<String>) -> OutboundRequest {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1).max(1);
        self.pending.insert(ticket, kind);
        tracing::debug!(ticket, ?kind, in_flight = self.pending.len(), "issued request");
        OutboundRequest { ticket, kind, method, url, body }
    }

    /// Snapshots the current list into a save request.
    pub fn begin_save(&mut self, name: &str) -> Result<OutboundRequest> {
        if name.trim().is_empty() {
            return Err(DrawingError::EmptyName);
        }
        let request = SaveRequest::new(name, self.store.shapes())?;
        let body = serde_json::to_string(&request)?;
        let url = self.config.save_url();
        Ok(self.issue(RequestKind::Save, Method::Post, url, Some(body)))
    }

    pub fn begin_load(&mut self, name: &str) -> Result<OutboundRequest> {
        if name.trim().is_empty() {
            return Err(DrawingError::EmptyName);
        }
        let url = self.config.load_url(name);
        Ok(self.issue(RequestKind::Load, Method::Get, url, None))
    }

    /// Records the prompt in the transcript and issues the assistant call.
    pub fn begin_assistant(&mut self, prompt: &str) -> Result<OutboundRequest> {
        if prompt.trim().is_empty() {
            return Err(DrawingError::EmptyPrompt);
        }
        let body = assistant_request_body(prompt)?;
        self.transcript.push(ChatMessage { role: Role::User, text: prompt.to_string() });
        let url = self.config.assistant_url.clone();
        Ok(self.issue(RequestKind::Assistant, Method::Post, url, Some(body)))
    }

    /// Drops a pending request; its eventual completion is refused.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        let cancelled = self.pending.remove(&ticket).is_some();
        tracing::debug!(ticket, cancelled, "cancel request");
        cancelled
    }

    fn settle(&mut self, ticket: Ticket) -> Result<RequestKind> {
        self.pending.remove(&ticket).ok_or_else(|| {
            tracing::debug!(ticket, "ignoring completion of unknown or cancelled request");
            DrawingError::UnknownRequest(ticket)
        })
    }

    pub fn complete(&mut self, ticket: Ticket, reply: Reply) -> Result<Notice> {
        let notice = match self.settle(ticket)? {
            RequestKind::Save => self.finish_save(&reply),
            RequestKind::Load => self.finish_load(&reply),
            RequestKind::Assistant => self.finish_assistant(&reply),
        };
        Ok(notice)
    }

    /// Reports a transport failure for `ticket`. State is never touched.
    pub fn fail(&mut self, ticket: Ticket, message: &str) -> Result<Notice> {
        let kind = self.settle(ticket)?;
        tracing::warn!(ticket, ?kind, error = %DrawingError::Transport(message.to_string()), "request failed");
        Ok(match kind {
            RequestKind::Save | RequestKind::Load => Notice::ConnectionFailed,
            RequestKind::Assistant => self.reply_in_chat(Notice::TryAgain),
        })
    }

    fn finish_save(&mut self, reply: &Reply) -> Notice {
        if reply.is_success() {
            tracing::info!(count = self.store.shapes().len(), "drawing saved");
            Notice::Saved
        } else {
            tracing::warn!(status = reply.status, "save rejected");
            Notice::SaveFailed
        }
    }

    fn finish_load(&mut self, reply: &Reply) -> Notice {
        if !reply.is_success() {
            tracing::warn!(status = reply.status, "drawing not found");
            return Notice::NotFound;
        }
        match decode_load_response(&reply.body) {
            Ok(Some(shapes)) => {
                let count = shapes.len();
                tracing::info!(count, "drawing loaded");
                self.store.replace(shapes);
                Notice::Loaded { count }
            }
            Ok(None) => {
                tracing::warn!("load response carried no drawing data");
                Notice::Loaded { count: self.store.shapes().len() }
            }
            Err(err) => {
                tracing::warn!(error = %err, "unreadable load response");
                Notice::ConnectionFailed
            }
        }
    }

    fn finish_assistant(&mut self, reply: &Reply) -> Notice {
        let notice = if reply.status == TOO_MANY_REQUESTS {
            tracing::warn!("assistant rate limit reached");
            Notice::RateLimited
        } else if !reply.is_success() {
            tracing::warn!(status = reply.status, "assistant request rejected");
            Notice::TryAgain
        } else {
            match decode_assistant_reply(&reply.body) {
                Ok(shapes) if !shapes.is_empty() => {
                    let count = shapes.len();
                    tracing::info!(count, "assistant shapes added");
                    self.store.add_shapes(shapes);
                    Notice::ShapesAdded { count }
                }
                Ok(_) => {
                    tracing::warn!("assistant returned no shapes");
                    Notice::TryAgain
                }
                Err(err) => {
                    tracing::warn!(error = %err, "unreadable assistant reply");
                    Notice::TryAgain
                }
            }
        };
        self.reply_in_chat(notice)
    }

    fn reply_in_chat(&mut self, notice: Notice) -> Notice {
        self.transcript.push(ChatMessage { role: Role::Assistant, text: notice.to_string() });
        notice
    }

    /// Starts a fresh conversation: empties the transcript and the current list. Like a load,
    /// this is not recorded in history and leaves both stacks as they are.
    pub fn new_chat(&mut self) {
        self.transcript.clear();
        self.store.replace(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeKind;
    use serde_json::json;

    fn session() -> DrawingSession {
        DrawingSession::new(EngineConfig::default())
    }

    fn completion(content: serde_json::Value) -> String {
        json!({"choices": [{"message": {"content": content.to_string()}}]}).to_string()
    }

    #[test]
    fn test_blank_names_and_prompts_are_refused() {
        let mut session = session();
        assert!(matches!(session.begin_save("  "), Err(DrawingError::EmptyName)));
        assert!(matches!(session.begin_load(""), Err(DrawingError::EmptyName)));
        assert!(matches!(session.begin_assistant("\n"), Err(DrawingError::EmptyPrompt)));
        assert_eq!(session.in_flight(), 0);
        assert!(session.transcript().is_empty());
        assert_eq!(Notice::for_error(&DrawingError::EmptyName), Some(Notice::NameRequired));
    }

    #[test]
    fn test_save_request_snapshots_current_shapes() {
        let mut session = session();
        session.store_mut().add_shapes(vec![Shape::new(ShapeKind::Rect).at(1.0, 1.0)]);
        let request = session.begin_save("house").unwrap();
        assert_eq!(request.kind, RequestKind::Save);
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://localhost:44381/api/drawings");

        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "house");
        assert!(body["jsonData"].as_str().unwrap().contains(r#""type":"rect""#));

        assert_eq!(session.complete(request.ticket, Reply::new(200, "")).unwrap(), Notice::Saved);
    }

    #[test]
    fn test_save_outcomes() {
        let mut session = session();
        let rejected = session.begin_save("a").unwrap();
        let offline = session.begin_save("a").unwrap();
        assert_eq!(session.complete(rejected.ticket, Reply::new(500, "")).unwrap(), Notice::SaveFailed);
        assert_eq!(session.fail(offline.ticket, "connection refused").unwrap(), Notice::ConnectionFailed);
    }

    #[test]
    fn test_load_replaces_without_history() {
        let mut session = session();
        session.store_mut().add_shapes(vec![Shape::new(ShapeKind::Line)]);
        let undo_before = session.store().undo_stack().to_vec();

        let request = session.begin_load("my drawing").unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "https://localhost:44381/api/drawings/my%20drawing");
        assert_eq!(request.body, None);

        let body = json!({"jsonData": r#"{"shapes":[{"type":"circle","size":20,"x":1,"y":1}]}"#}).to_string();
        assert_eq!(session.complete(request.ticket, Reply::new(200, body)).unwrap(), Notice::Loaded { count: 1 });
        assert_eq!(session.shapes().len(), 1);
        assert_eq!(session.shapes()[0].radius, Some(20.0));
        assert_eq!(session.store().undo_stack(), undo_before.as_slice());
    }

    #[test]
    fn test_load_failures_leave_shapes_alone() {
        let mut session = session();
        session.store_mut().add_shapes(vec![Shape::new(ShapeKind::Line)]);
        let before = session.shapes().to_vec();

        let missing = session.begin_load("nope").unwrap();
        assert_eq!(session.complete(missing.ticket, Reply::new(404, "")).unwrap(), Notice::NotFound);

        let garbled = session.begin_load("x").unwrap();
        let body = json!({"jsonData": "{not json"}).to_string();
        assert_eq!(session.complete(garbled.ticket, Reply::new(200, body)).unwrap(), Notice::ConnectionFailed);

        let empty = session.begin_load("x").unwrap();
        assert_eq!(session.complete(empty.ticket, Reply::new(200, "{}")).unwrap(), Notice::Loaded { count: 1 });

        let offline = session.begin_load("x").unwrap();
        assert_eq!(session.fail(offline.ticket, "timeout").unwrap(), Notice::ConnectionFailed);

        assert_eq!(session.shapes(), before.as_slice());
    }

    #[test]
    fn test_load_of_unexpected_structure_empties_the_drawing() {
        let mut session = session();
        session.store_mut().add_shapes(vec![Shape::new(ShapeKind::Line)]);
        let request = session.begin_load("x").unwrap();
        let body = json!({"jsonData": r#"{"objects": []}"#}).to_string();
        assert_eq!(session.complete(request.ticket, Reply::new(200, body)).unwrap(), Notice::Loaded { count: 0 });
        assert!(session.shapes().is_empty());
    }

    #[test]
    fn test_assistant_adds_normalized_shapes() {
        let mut session = session();
        let request = session.begin_assistant("draw a red sun").unwrap();
        assert_eq!(request.body.as_deref(), Some(r#""draw a red sun""#));
        assert_eq!(request.url, "https://localhost:44381/OPenAI/send");

        let body = completion(json!({"shapes": [{"type": "Circle", "x": 50, "y": 50, "size": 25, "color": "red"}]}));
        let notice = session.complete(request.ticket, Reply::new(200, body)).unwrap();
        assert_eq!(notice, Notice::ShapesAdded { count: 1 });
        assert_eq!(session.shapes()[0].radius, Some(25.0));
        assert!(session.store().can_undo());

        let roles: Vec<_> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.transcript()[0].text, "draw a red sun");
    }

    #[test]
    fn test_assistant_failures_say_try_again() {
        let mut session = session();
        let cases = vec![
            Reply::new(500, ""),
            Reply::new(200, "not json"),
            Reply::new(200, r#"{"choices": []}"#),
            Reply::new(200, completion(json!({"shapes": []}))),
            Reply::new(200, json!({"choices": [{"message": {"content": "sorry"}}]}).to_string()),
        ];
        for reply in cases {
            let request = session.begin_assistant("x").unwrap();
            assert_eq!(session.complete(request.ticket, reply).unwrap(), Notice::TryAgain);
        }
        let request = session.begin_assistant("x").unwrap();
        assert_eq!(session.fail(request.ticket, "offline").unwrap(), Notice::TryAgain);

        assert!(session.shapes().is_empty());
        assert!(!session.store().can_undo());
        assert_eq!(session.transcript().len(), 12);
    }

    #[test]
    fn test_rate_limit_is_distinct() {
        let mut session = session();
        let request = session.begin_assistant("x").unwrap();
        assert_eq!(session.complete(request.ticket, Reply::new(429, "")).unwrap(), Notice::RateLimited);
        assert_eq!(session.transcript().last().unwrap().text, Notice::RateLimited.to_string());
    }

    #[test]
    fn test_cancelled_requests_are_ignored() {
        let mut session = session();
        let request = session.begin_assistant("x").unwrap();
        assert!(session.cancel(request.ticket));
        assert!(!session.cancel(request.ticket));

        let body = completion(json!({"shapes": [{"type": "rect", "x": 0, "y": 0}]}));
        let result = session.complete(request.ticket, Reply::new(200, body));
        assert!(matches!(result, Err(DrawingError::UnknownRequest(_))));
        assert!(session.shapes().is_empty());
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_requests_may_overlap() {
        let mut session = session();
        let first = session.begin_assistant("one").unwrap();
        let second = session.begin_assistant("two").unwrap();
        assert_ne!(first.ticket, second.ticket);
        assert_eq!(session.in_flight(), 2);

        let body = |x: i32| completion(json!({"shapes": [{"type": "rect", "x": x, "y": 0}]}));
        session.complete(second.ticket, Reply::new(200, body(2))).unwrap();
        session.complete(first.ticket, Reply::new(200, body(1))).unwrap();

        let xs: Vec<_> = session.shapes().iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![Some(2.0), Some(1.0)]);
        assert_eq!(session.in_flight(), 0);
    }

    #[test]
    fn test_new_chat_keeps_history() {
        let mut session = session();
        session.begin_assistant("hello").unwrap();
        session.store_mut().add_shapes(vec![Shape::new(ShapeKind::Rect).at(0.0, 0.0)]);
        session.new_chat();
        assert!(session.shapes().is_empty());
        assert!(session.transcript().is_empty());
        assert_eq!(session.in_flight(), 1);

        session.store_mut().undo();
        assert!(session.shapes().is_empty());
        assert!(session.store().can_redo());
    }

    #[test]
    fn test_notice_wire_format() {
        assert_eq!(serde_json::to_value(Notice::Saved).unwrap(), json!({"notice": "saved"}));
        assert_eq!(
            serde_json::to_value(Notice::ShapesAdded { count: 3 }).unwrap(),
            json!({"notice": "shapes_added", "count": 3})
        );
    }

    #[test]
    fn test_loaded_notice_reports_count() {
        let notice = Notice::Loaded { count: 3 };
        assert_eq!(serde_json::to_value(&notice).unwrap(), json!({"notice": "loaded", "count": 3}));
        assert_eq!(notice.to_string(), "Drawing loaded with 3 shape(s).");
    }
}
