//! Purpose: Render command results and errors for the `dbrest` CLI.
//! Exports: `ColorMode`, `colorize_json`, `emit_json`, `emit_error`, `error_json`, `error_text`.
//! Role: The only place that writes to stdout/stderr on behalf of commands.
//! Invariants: Results go to stdout as JSON; pretty on a TTY (or forced color), compact otherwise.
//! Invariants: Errors go to stderr; human text on a TTY, a `{"error":{...}}` envelope otherwise.
//! Invariants: ANSI escapes appear only when color is enabled.
use clap::ValueEnum;
use databricks_rest::api::{Error, ErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use std::io::{self, IsTerminal};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub(crate) fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone)]
enum Paint {
    Key,
    Text,
    Number,
    Bool,
    Plain,
    Red,
    Yellow,
}

impl Paint {
    fn code(self) -> &'static str {
        match self {
            Paint::Key => "36",
            Paint::Text => "32",
            Paint::Number => "33",
            Paint::Bool => "35",
            Paint::Plain => "39",
            Paint::Red => "31",
            Paint::Yellow => "33",
        }
    }
}

fn paint(text: &str, style: Paint, enabled: bool, out: &mut String) {
    if enabled {
        out.push_str("\u{1b}[");
        out.push_str(style.code());
        out.push('m');
        out.push_str(text);
        out.push_str("\u{1b}[0m");
    } else {
        out.push_str(text);
    }
}

fn label(text: &str, style: Paint, enabled: bool) -> String {
    let mut out = String::new();
    paint(text, style, enabled, &mut out);
    out
}

/// Pretty JSON; byte-identical to `serde_json::to_string_pretty` when `use_color` is false.
pub(crate) fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut out = String::new();
    render(value, 0, use_color, &mut out);
    out
}

fn render(value: &Value, depth: usize, color: bool, out: &mut String) {
    match value {
        Value::Null => paint("null", Paint::Plain, color, out),
        Value::Bool(flag) => paint(if *flag { "true" } else { "false" }, Paint::Bool, color, out),
        Value::Number(number) => paint(&number.to_string(), Paint::Number, color, out),
        Value::String(text) => paint(&quote(text), Paint::Text, color, out),
        Value::Array(items) if items.is_empty() => paint("[]", Paint::Plain, color, out),
        Value::Object(map) if map.is_empty() => paint("{}", Paint::Plain, color, out),
        Value::Array(items) => {
            paint("[", Paint::Plain, color, out);
            for (idx, item) in items.iter().enumerate() {
                separator(idx, depth + 1, color, out);
                render(item, depth + 1, color, out);
            }
            newline(depth, out);
            paint("]", Paint::Plain, color, out);
        }
        Value::Object(map) => {
            paint("{", Paint::Plain, color, out);
            for (idx, (key, item)) in map.iter().enumerate() {
                separator(idx, depth + 1, color, out);
                paint(&quote(key), Paint::Key, color, out);
                paint(":", Paint::Plain, color, out);
                out.push(' ');
                render(item, depth + 1, color, out);
            }
            newline(depth, out);
            paint("}", Paint::Plain, color, out);
        }
    }
}

fn separator(idx: usize, depth: usize, color: bool, out: &mut String) {
    if idx > 0 {
        paint(",", Paint::Plain, color, out);
    }
    newline(depth, out);
}

fn newline(depth: usize, out: &mut String) {
    out.push('\n');
    out.push_str(&"  ".repeat(depth));
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_json(value: &Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let rendered = if is_tty || use_color {
        colorize_json(value, use_color)
    } else {
        serde_json::to_string(value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{rendered}");
}

pub(crate) fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }
    let rendered = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{rendered}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    let fallback = match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::NotFound => "not found",
        ErrorKind::AlreadyExists => "already exists",
        ErrorKind::Busy => "workspace is busy",
        ErrorKind::Permission => "permission denied",
        ErrorKind::Format => "unexpected response format",
        ErrorKind::Remote => "remote error",
        ErrorKind::Io => "i/o error",
    };
    fallback.to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

pub(crate) fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(code) = err.error_code() {
        inner.insert("error_code".to_string(), json!(code));
    }
    if let Some(endpoint) = err.endpoint() {
        inner.insert("endpoint".to_string(), json!(endpoint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }
    json!({ "error": Value::Object(inner) })
}

pub(crate) fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        label("error:", Paint::Red, use_color),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!("{} {hint}", label("hint:", Paint::Yellow, use_color)));
    }
    match (err.status(), err.error_code()) {
        (Some(status), Some(code)) => lines.push(format!(
            "{} {status} {code}",
            label("status:", Paint::Yellow, use_color)
        )),
        (Some(status), None) => {
            lines.push(format!("{} {status}", label("status:", Paint::Yellow, use_color)))
        }
        _ => {}
    }
    if let Some(endpoint) = err.endpoint() {
        lines.push(format!(
            "{} {endpoint}",
            label("endpoint:", Paint::Yellow, use_color)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            label("caused by:", Paint::Yellow, use_color)
        ));
    }
    lines.join("\n")
}
