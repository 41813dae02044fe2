use std::io;

/// Default per-record ceiling: 256 KiB.
pub const DEFAULT_EVENT_BODY_LIMIT_BYTES: usize = 256 * 1024;

/// Packs pre-rendered record texts into one JSON array payload.
///
/// The output contract is asymmetric on purpose: a batch with zero
/// accepted records produces zero bytes, not `[]`, so the transport can
/// tell "nothing to send" apart from "send this array" by whether any
/// output was written at all.
#[derive(Debug, Clone)]
pub struct BatchFormatter {
    /// Records whose UTF-8 byte length exceeds this are dropped from the
    /// batch. `None` disables the gate.
    pub event_body_limit_bytes: Option<usize>,
}

impl Default for BatchFormatter {
    fn default() -> Self {
        BatchFormatter {
            event_body_limit_bytes: Some(DEFAULT_EVENT_BODY_LIMIT_BYTES),
        }
    }
}

impl BatchFormatter {
    pub fn new(event_body_limit_bytes: Option<usize>) -> Self {
        BatchFormatter {
            event_body_limit_bytes,
        }
    }

    /// Write `records` to `out` as a JSON array.
    ///
    /// Records are emitted in order. Empty or whitespace-only entries are
    /// skipped, as are entries over the byte limit; an oversized record is
    /// dropped alone and never blocks the rest of the batch. The closing
    /// `]` is written only if at least one record was accepted.
    pub fn format<I, S, W>(&self, records: I, out: &mut W) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: io::Write,
    {
        let mut accepted = false;

        for record in records {
            let record = record.as_ref();
            if record.trim().is_empty() {
                continue;
            }
            if let Some(limit) = self.event_body_limit_bytes {
                if record.len() > limit {
                    continue;
                }
            }

            out.write_all(if accepted { b"," } else { b"[" })?;
            out.write_all(record.as_bytes())?;
            accepted = true;
        }

        if accepted {
            out.write_all(b"]")?;
        }
        Ok(())
    }

    /// Convenience wrapper collecting the payload into a buffer.
    pub fn format_to_vec<I, S>(&self, records: I) -> io::Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buf = Vec::new();
        self.format(records, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlimited() -> BatchFormatter {
        BatchFormatter::new(None)
    }

    #[test]
    fn empty_input_produces_zero_bytes() {
        let payload = unlimited().format_to_vec(Vec::<String>::new()).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn blank_only_input_produces_zero_bytes() {
        let payload = unlimited().format_to_vec(["  ", ""]).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn oversized_only_input_produces_zero_bytes() {
        let formatter = BatchFormatter::new(Some(0));
        let payload = formatter.format_to_vec(["a"]).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn two_records_form_an_exact_array() {
        let payload = unlimited()
            .format_to_vec([r#"{"a":1}"#, r#"{"b":2}"#])
            .unwrap();
        assert_eq!(payload, br#"[{"a":1},{"b":2}]"#);
    }

    #[test]
    fn output_parses_back_to_the_accepted_records_in_order() {
        let records = [r#"{"a":1}"#, "   ", r#"{"b":2}"#, "", r#"{"c":3}"#];
        let payload = unlimited().format_to_vec(records).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&payload).unwrap();
        assert_eq!(
            parsed,
            vec![
                serde_json::json!({"a": 1}),
                serde_json::json!({"b": 2}),
                serde_json::json!({"c": 3}),
            ]
        );
    }

    #[test]
    fn an_oversized_record_is_dropped_without_disturbing_neighbors() {
        let small = r#"{"ok":1}"#;
        let big = format!("{{\"pad\":\"{}\"}}", "x".repeat(64));
        let formatter = BatchFormatter::new(Some(small.len()));
        let payload = formatter
            .format_to_vec([small.to_string(), big, small.to_string()])
            .unwrap();
        assert_eq!(payload, format!("[{},{}]", small, small).into_bytes());
    }

    #[test]
    fn limit_is_measured_in_utf8_bytes() {
        // Four characters, twelve bytes.
        let record = "\u{4e00}\u{4e00}\u{4e00}\u{4e00}";
        assert!(BatchFormatter::new(Some(4))
            .format_to_vec([record])
            .unwrap()
            .is_empty());
        assert!(!BatchFormatter::new(Some(12))
            .format_to_vec([record])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn default_limit_is_256_kib() {
        let formatter = BatchFormatter::default();
        assert_eq!(formatter.event_body_limit_bytes, Some(256 * 1024));
    }
}
