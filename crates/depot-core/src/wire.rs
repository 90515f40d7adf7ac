//! Depot wire protocol — the literal frames exchanged over the stream.
//!
//! These constants ARE the protocol. Every byte of every literal here is
//! matched by real clients; changing any of them is a breaking change.
//! The protocol is line/frame based with no length prefixing: commands
//! travel client→server as newline-terminated lines, replies travel
//! server→client as raw text frames, and file transfers alternate raw
//! chunk frames with content-agnostic acknowledgment frames.

/// Default listen port.
pub const DEFAULT_PORT: u16 = 12345;

/// Default maximum number of concurrently connected clients.
pub const DEFAULT_MAX_CLIENTS: usize = 3;

/// File transfer chunk size in bytes.
///
/// This is a wire constant, not a tunable: the receiver's read buffer is
/// sized to it, and a sender chunk larger than the receiver buffer would
/// split one chunk across two reads and desynchronize the ack alternation.
pub const CHUNK_SIZE: usize = 4096;

/// Sent to a connecting peer when every slot is occupied, followed by
/// connection close.
pub const SERVER_FULL: &str = "Server is full. Please try again later.";

/// Prefix of the transfer-start notice. The receiver derives the incoming
/// filename from the remainder of the frame.
pub const SENDING_FILE_PREFIX: &str = "Sending file: ";

/// End-of-stream marker terminating a file transfer.
///
/// A chunk frame is compared against this marker with exact equality — a
/// frame that merely starts with these bytes is file content. A file whose
/// content arrives as a frame exactly equal to the marker is mis-terminated
/// early; that collision is a documented property of the protocol and is
/// deliberately not escaped.
pub const END_OF_FILE: &[u8] = b"END_OF_FILE";

/// Readiness/acknowledgment payload. The payload is unconstrained on the
/// wire — arrival of any frame advances the transfer — but both depot ends
/// send this text.
pub const READY: &[u8] = b"Ready";

/// Suffix appended when echoing an unrecognized command line.
pub const ACK_SUFFIX: &str = " ACK";

/// Reply to `list` when the file repository is empty.
pub const NO_FILES: &str = "No files available in server repository";

/// Header line of the `list` reply when files are present.
pub const FILE_LIST_HEADER: &str = "Available files:";

/// Header line of the `status` reply.
pub const STATUS_HEADER: &str = "=== Server Cache Status ===";

/// True when a received frame is the end-of-stream marker.
pub fn is_end_of_stream(frame: &[u8]) -> bool {
    frame == END_OF_FILE
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// One client command line, as dispatched by the serving loop.
///
/// Keywords match case-insensitively; the `get` argument keeps its original
/// case. Anything that is not a keyword is echoed back with [`ACK_SUFFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Status,
    List,
    Get(String),
    Other(String),
}

impl Command {
    /// Parse one whitespace-trimmed command line.
    pub fn parse(line: &str) -> Command {
        let lower = line.to_ascii_lowercase();
        match lower.as_str() {
            "exit" => Command::Exit,
            "status" => Command::Status,
            "list" => Command::List,
            _ if lower.starts_with("get ") => Command::Get(line[4..].trim().to_string()),
            _ => Command::Other(line.to_string()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
