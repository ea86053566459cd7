//! Tera filters available to every layout

use chrono::DateTime;
use std::collections::HashMap;
use tera::{Tera, Value};

pub fn register(tera: &mut Tera) {
    tera.register_filter("date_format", date_format_filter);
    tera.register_filter("strip_html", strip_html_filter);
    tera.register_filter("truncate_chars", truncate_chars_filter);
}

/// `{{ post.date | date_format(format="YYYY-MM-DD") }}`
fn date_format_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    let date = DateTime::parse_from_rfc3339(&s)
        .map_err(|e| tera::Error::msg(format!("date_format: {:?} is not a date: {}", s, e)))?;
    Ok(Value::String(
        date.format(&moment_to_strftime(&format)).to_string(),
    ))
}

/// Strip HTML tags, e.g. to build plain-text summaries
fn strip_html_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(Value::String(strip_html(&s)))
}

/// Truncate by character count, appending `omission` when cut
fn truncate_chars_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };

    if s.chars().count() <= length {
        return Ok(Value::String(s));
    }
    let cut: String = s.chars().take(length).collect();
    Ok(Value::String(format!("{}{}", cut.trim_end(), omission)))
}

pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Translate moment-style tokens (`YYYY-MM-DD HH:mm`) to strftime.
/// Letters outside the known tokens are copied literally.
fn moment_to_strftime(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token: String = std::iter::repeat(c).take(run).collect();
        let mapped = match token.as_str() {
            "YYYY" => Some("%Y"),
            "YY" => Some("%y"),
            "MMMM" => Some("%B"),
            "MMM" => Some("%b"),
            "MM" => Some("%m"),
            "M" => Some("%-m"),
            "DD" => Some("%d"),
            "D" => Some("%-d"),
            "dddd" => Some("%A"),
            "ddd" => Some("%a"),
            "HH" => Some("%H"),
            "H" => Some("%-H"),
            "hh" => Some("%I"),
            "h" => Some("%-I"),
            "mm" => Some("%M"),
            "ss" => Some("%S"),
            "A" => Some("%p"),
            "ZZ" => Some("%z"),
            "Z" => Some("%:z"),
            _ => None,
        };

        match mapped {
            Some(strftime) => out.push_str(strftime),
            None if c == '%' => out.push_str(&"%%".repeat(run)),
            None => out.push_str(&token),
        }
        i += run;
    }

    out
}
