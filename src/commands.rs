use serde::Deserialize;
use serde_json::{json, Value};
use crate::error::{DrawingError, Result};
use crate::normalize::{normalize, normalize_all};
use crate::session::DrawingSession;

impl DrawingSession {
    /// Runs a direct edit command of the form `{"action": ..., "params": {...}}`.
    pub fn execute_command(&mut self, cmd_json: &str) -> Result<Value> {
        #[derive(Deserialize)]
        struct Command {
            action: String,
            #[serde(default)]
            params: Value,
        }

        let cmd: Command = serde_json::from_str(cmd_json)?;
        let revision = self.store().revision();

        match cmd.action.as_str() {
            "add" => {
                let batch = match &cmd.params {
                    Value::Null => Vec::new(),
                    params => match params.get("shapes") {
                        Some(Value::Array(items)) => normalize_all(items),
                        _ => vec![normalize(params)],
                    },
                };
                self.store_mut().add_shapes(batch);
            }
            "undo" => { self.store_mut().undo(); }
            "redo" => { self.store_mut().redo(); }
            "clear" => self.store_mut().clear(),
            "new_chat" => self.new_chat(),
            other => return Err(DrawingError::UnknownCommand(other.to_string())),
        }

        Ok(json!({
            "success": true,
            "changed": self.store().revision() != revision,
            "count": self.shapes().len(),
        }))
    }
}
