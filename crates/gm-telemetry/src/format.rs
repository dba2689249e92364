use gm_ports::{Kv, LogLevel};

use crate::config::LogFormat;

/// Render a structured log record the way a human (text) or a log
/// aggregator (JSON) would read it.
///
/// This is the pluggable formatter the specification's §6 table describes
/// sitting between a [`gm_ports::Logger`] implementation and its
/// destination; the `Logger` trait itself only receives the already-typed
/// fields, and a concrete logger calls this to turn them into one line.
pub fn render_log_line(
    level: LogLevel,
    component: &str,
    message: &str,
    kv: &[Kv<'_>],
    format: LogFormat,
) -> String {
    match format {
        LogFormat::Text => render_text(level, component, message, kv),
        LogFormat::Json => render_json(level, component, message, kv),
    }
}

fn render_text(level: LogLevel, component: &str, message: &str, kv: &[Kv<'_>]) -> String {
    let mut line = format!("{:<5} {component}: {message}", level.as_str());
    for (k, v) in kv {
        line.push(' ');
        line.push_str(k);
        line.push('=');
        line.push_str(v);
    }
    line
}

fn render_json(level: LogLevel, component: &str, message: &str, kv: &[Kv<'_>]) -> String {
    let mut out = String::with_capacity(64 + kv.len() * 16);
    out.push('{');
    out.push_str("\"level\":\"");
    out.push_str(level.as_str());
    out.push_str("\",\"component\":\"");
    json_escape_into(component, &mut out);
    out.push_str("\",\"message\":\"");
    json_escape_into(message, &mut out);
    out.push('"');
    for (k, v) in kv {
        out.push_str(",\"");
        json_escape_into(k, &mut out);
        out.push_str("\":\"");
        json_escape_into(v, &mut out);
        out.push('"');
    }
    out.push('}');
    out
}

fn json_escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_line_carries_component_message_and_tags() {
        let line = render_log_line(
            LogLevel::Info,
            "journal",
            "append ok",
            &[("branch", "main"), ("edges", "3")],
            LogFormat::Text,
        );
        assert_eq!(line, "INFO  journal: append ok branch=main edges=3");
    }

    #[test]
    fn json_line_is_well_formed_and_escapes_quotes() {
        let line = render_log_line(
            LogLevel::Error,
            "cache",
            "rebuild \"failed\"",
            &[],
            LogFormat::Json,
        );
        assert_eq!(
            line,
            "{\"level\":\"ERROR\",\"component\":\"cache\",\"message\":\"rebuild \\\"failed\\\"\"}"
        );
    }
}
