use std::io::Write;

use super::{Update, View};

/// Writes each update as one JSON object per line, for piping into other tools.
pub struct JsonView<W: Write> {
    out: W,
}

impl<W: Write> JsonView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> View for JsonView<W> {
    fn render(&mut self, update: Update) {
        let line = match serde_json::to_string(&update) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode update");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write update");
        }
    }
}
