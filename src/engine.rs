use wasm_bindgen::prelude::*;
use serde::Serialize;
use serde_json::json;
use web_sys::CanvasRenderingContext2d;
use crate::config::EngineConfig;
use crate::error::{DrawingError, Result};
use crate::io::Reply;
use crate::raster::Raster;
use crate::session::{DrawingSession, Notice, Ticket};

fn notice_value(notice: &Notice) -> serde_json::Value {
    let mut value = serde_json::to_value(notice).unwrap_or_else(|_| json!({}));
    value["message"] = json!(notice.to_string());
    value
}

fn error_json(err: &DrawingError) -> String {
    let mut value = match Notice::for_error(err) {
        Some(notice) => notice_value(&notice),
        None => json!({}),
    };
    value["error"] = json!(err.to_string());
    value.to_string()
}

fn notice_json(result: Result<Notice>) -> String {
    match result {
        Ok(notice) => notice_value(&notice).to_string(),
        Err(err) => error_json(&err),
    }
}

fn request_json(result: Result<crate::session::OutboundRequest>) -> String {
    match result.and_then(|request| Ok(serde_json::to_string(&request)?)) {
        Ok(json) => json,
        Err(err) => error_json(&err),
    }
}

/// Browser entry point. String replies are JSON.
#[wasm_bindgen]
pub struct DrawingEngine {
    session: DrawingSession,
}

#[wasm_bindgen]
impl DrawingEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> DrawingEngine {
        console_error_panic_hook::set_once();
        DrawingEngine { session: DrawingSession::new(EngineConfig::default()) }
    }

    pub fn with_config(config_json: &str) -> std::result::Result<DrawingEngine, JsValue> {
        console_error_panic_hook::set_once();
        let config = EngineConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(DrawingEngine { session: DrawingSession::new(config) })
    }

    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        match self.session.execute_command(cmd_json) {
            Ok(reply) => reply.to_string(),
            Err(err) => error_json(&err),
        }
    }

    pub fn undo(&mut self) -> bool { self.session.store_mut().undo() }
    pub fn redo(&mut self) -> bool { self.session.store_mut().redo() }
    pub fn clear(&mut self) { self.session.store_mut().clear() }
    pub fn can_undo(&self) -> bool { self.session.store().can_undo() }
    pub fn can_redo(&self) -> bool { self.session.store().can_redo() }
    pub fn new_chat(&mut self) { self.session.new_chat() }

    pub fn get_shapes_json(&self) -> String {
        serde_json::to_string(self.session.shapes()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Shapes as plain JS objects. Flattened extra fields make serde emit maps, which the
    /// default serializer would turn into `Map` instances.
    pub fn shapes(&self) -> std::result::Result<JsValue, JsValue> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        Ok(self.session.shapes().serialize(&serializer)?)
    }

    pub fn get_messages_json(&self) -> String {
        serde_json::to_string(self.session.transcript()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let mut surface = ctx.clone();
        self.session.render(&mut surface);
    }

    /// Renders offscreen at the configured surface size.
    pub fn render_png_data_url(&self) -> std::result::Result<String, JsValue> {
        let size = self.session.config().surface;
        let mut raster = Raster::new(size.width, size.height);
        self.session.render(&mut raster);
        raster.to_png_data_url().map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn request_save(&mut self, name: &str) -> String { request_json(self.session.begin_save(name)) }
    pub fn request_load(&mut self, name: &str) -> String { request_json(self.session.begin_load(name)) }
    pub fn request_assistant(&mut self, prompt: &str) -> String { request_json(self.session.begin_assistant(prompt)) }

    pub fn complete_request(&mut self, ticket: Ticket, status: u16, body: &str) -> String {
        notice_json(self.session.complete(ticket, Reply::new(status, body)))
    }

    pub fn fail_request(&mut self, ticket: Ticket, message: &str) -> String {
        notice_json(self.session.fail(ticket, message))
    }

    pub fn cancel_request(&mut self, ticket: Ticket) -> bool { self.session.cancel(ticket) }
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new()
    }
}
