//! Incremental `text/event-stream` decoder

/// One dispatched server-sent message before name routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub data: String,
}

/// Accumulates raw body chunks and yields complete messages.
/// Chunks may split lines (and UTF-8 sequences) at any byte.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    /// Last chunk ended on `\r`; a leading `\n` in the next chunk belongs to it
    after_cr: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines end with `\n`, `\r\n` or a bare `\r`
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        let skip_lf = self.after_cr && chunk.first() == Some(&b'\n');
        if !chunk.is_empty() {
            self.after_cr = false;
        }
        let chunk = if skip_lf { &chunk[1..] } else { chunk };
        self.pending.extend_from_slice(chunk);
        let mut messages = Vec::new();

        while let Some(end) = self.pending.iter().position(|b| *b == b'\n' || *b == b'\r') {
            let terminator = self.pending[end];
            let mut consumed = end + 1;
            if terminator == b'\r' {
                match self.pending.get(end + 1) {
                    Some(b'\n') => consumed += 1,
                    Some(_) => {}
                    None => self.after_cr = true,
                }
            }

            let bytes: Vec<u8> = self.pending.drain(..consumed).collect();
            let line = String::from_utf8_lossy(&bytes[..end]);

            if let Some(message) = self.process_line(&line) {
                messages.push(message);
            }
        }

        messages
    }

    fn process_line(&mut self, line: &str) -> Option<SseMessage> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry only matter for automatic reconnection, which is not done here
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseMessage { event, data })
    }
}
