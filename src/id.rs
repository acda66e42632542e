//! Identifier and timestamp helpers
//!
//! Session ids and timestamps used by the memory store and event payloads.

use chrono::{DateTime, Local};

/// Current local time
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Current local time as an RFC 3339 string
pub fn now_rfc3339() -> String {
    now().to_rfc3339()
}

/// Generate a session id for the given instant
///
/// Format: `YYYYMMDD_HHMMSS`
/// Example: `20250131_154502`
pub fn session_id_at(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Generate a session id for the current instant
pub fn generate_session_id() -> String {
    session_id_at(now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_id_format() {
        let at = Local.with_ymd_and_hms(2025, 1, 31, 15, 45, 2).unwrap();
        assert_eq!(session_id_at(at), "20250131_154502");
    }

    #[test]
    fn test_generate_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 15);
        assert_eq!(id.chars().nth(8), Some('_'));
        assert!(id.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_now_rfc3339_parses() {
        let ts = now_rfc3339();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
