//! Minimal HTTP/1.1 request parser: method, path, and a JSON body read
//! per `Content-Length`. The same contract as the rest of the tree's
//! incremental wire parsers: distinguish "not enough bytes yet" from
//! "never going to parse", so the caller knows when to keep reading
//! versus when to reject and close the connection.

use serde_json::Value;

pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Value,
}

/// What `Request::try_parse` learned from the buffer so far.
pub enum ParseOutcome {
    /// A full request was parsed.
    Complete(Request),
    /// Keep reading; not enough bytes to decide yet.
    Incomplete,
    /// The buffer can never become a valid request (bad request line or
    /// a malformed header) — the caller should reject it, not wait for
    /// more bytes that won't fix it.
    Invalid,
}

impl Request {
    pub fn try_parse(buf: &[u8]) -> ParseOutcome {
        let Some(header_end) = find_double_crlf(buf) else {
            return ParseOutcome::Incomplete;
        };
        let Ok(head) = std::str::from_utf8(&buf[..header_end]) else {
            return ParseOutcome::Invalid;
        };
        let mut lines = head.split("\r\n");

        let Some(request_line) = lines.next() else {
            return ParseOutcome::Invalid;
        };
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
            return ParseOutcome::Invalid;
        };

        let mut content_length = 0usize;
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    match value.trim().parse() {
                        Ok(n) => content_length = n,
                        Err(_) => return ParseOutcome::Invalid,
                    }
                }
            }
        }

        let body_start = header_end + 4;
        if buf.len() < body_start + content_length {
            return ParseOutcome::Incomplete;
        }

        let body = if content_length == 0 {
            Value::Null
        } else {
            serde_json::from_slice(&buf[body_start..body_start + content_length]).unwrap_or(Value::Null)
        };

        ParseOutcome::Complete(Request { method: method.to_string(), path: path.to_string(), body })
    }
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_complete(outcome: ParseOutcome) -> Request {
        match outcome {
            ParseOutcome::Complete(req) => req,
            ParseOutcome::Incomplete => panic!("expected Complete, got Incomplete"),
            ParseOutcome::Invalid => panic!("expected Complete, got Invalid"),
        }
    }

    #[test]
    fn parses_request_with_json_body() {
        let raw = b"POST /api/v1/add_node HTTP/1.1\r\nContent-Length: 13\r\n\r\n{\"node_id\":7}";
        let req = unwrap_complete(Request::try_parse(raw));
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/v1/add_node");
        assert_eq!(req.body["node_id"], 7);
    }

    #[test]
    fn incomplete_body_returns_incomplete() {
        let raw = b"POST /api/v1/add_node HTTP/1.1\r\nContent-Length: 13\r\n\r\n{\"node_id\":7";
        assert!(matches!(Request::try_parse(raw), ParseOutcome::Incomplete));
    }

    #[test]
    fn malformed_content_length_is_invalid_not_incomplete() {
        let raw = b"POST /api/v1/add_node HTTP/1.1\r\nContent-Length: notanumber\r\n\r\n";
        assert!(matches!(Request::try_parse(raw), ParseOutcome::Invalid));
    }

    #[test]
    fn no_body_request_parses() {
        let raw = b"POST /api/v1/checkpoint HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        let req = unwrap_complete(Request::try_parse(raw));
        assert_eq!(req.body, Value::Null);
    }

    #[test]
    fn missing_header_terminator_returns_incomplete() {
        let raw = b"POST /api/v1/add_node HTTP/1.1\r\nContent-Length: 13\r\n";
        assert!(matches!(Request::try_parse(raw), ParseOutcome::Incomplete));
    }
}
