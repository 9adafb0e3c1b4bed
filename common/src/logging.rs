use chrono::{DateTime, Datelike, Local, Timelike};
use log::Record;
use std::fmt::Arguments;
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "[$Y-$m-$D $H:$M:$S $LEVEL] $MESSAGE";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("Logger initialization error.")]
    SetLoggerError(log::SetLoggerError),
}

impl LogError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            LogError::IOError(err) => Some(err.to_string()),
            LogError::SetLoggerError(err) => Some(err.to_string()),
        }
    }
}

pub fn generate_file_name(title: &str) -> String {
    file_name_at(title, &Local::now())
}

fn file_name_at(title: &str, now: &DateTime<Local>) -> String {
    let date = format!(
        "{year:04}-{month:02}-{day:02}",
        year = now.year(),
        month = now.month(),
        day = now.day(),
    );

    let title_formatted = title.trim().replace(" ", "-");
    format!("{title_formatted}_{date}.log")
}

pub fn parse_format(format: String, message: &Arguments, record: &Record) -> String {
    expand(format, &Local::now(), record.level().as_str(), record.target(), message)
}

/// Placeholders, longest first so `$MESSAGE` is never read as `$M`.
const TOKENS: [&str; 9] = ["$MESSAGE", "$TARGET", "$LEVEL", "$Y", "$m", "$D", "$H", "$M", "$S"];

fn expand(
    format: String, time: &DateTime<Local>, level: &str, target: &str,
    message: &Arguments,
) -> String {
    let mut log = String::with_capacity(format.len() + 64);
    let mut rest = format.trim();

    while let Some(position) = rest.find('$') {
        log.push_str(&rest[..position]);
        rest = &rest[position..];

        let Some(token) = TOKENS.iter().find(|token| rest.starts_with(**token)) else {
            log.push('$');
            rest = &rest[1..];
            continue;
        };

        match *token {
            "$MESSAGE" => log.push_str(&message.to_string()),
            "$TARGET" => log.push_str(target),
            "$LEVEL" => log.push_str(level),
            "$Y" => log.push_str(&format!("{:0>2}", time.year())),
            "$m" => log.push_str(&format!("{:0>2}", time.month())),
            "$D" => log.push_str(&format!("{:0>2}", time.day())),
            "$H" => log.push_str(&format!("{:0>2}", time.hour())),
            "$M" => log.push_str(&format!("{:0>2}", time.minute())),
            _ => log.push_str(&format!("{:0>2}", time.second())),
        }
        rest = &rest[token.len()..];
    }
    log.push_str(rest);

    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap()
    }

    #[test]
    fn test_expand_default_format() {
        let line = expand(
            DEFAULT_FORMAT.to_string(),
            &fixed_time(),
            "INFO",
            "sniffer",
            &format_args!("capture started on channel {}", 6),
        );

        assert_eq!(line, "[2024-03-07 09:05:02 INFO] capture started on channel 6");
    }

    #[test]
    fn test_expand_target_placeholder() {
        let line = expand(
            " $TARGET: $MESSAGE ".to_string(),
            &fixed_time(),
            "WARN",
            "capture::writer",
            &format_args!("ring drained"),
        );

        assert_eq!(line, "capture::writer: ring drained");
    }

    #[test]
    fn test_file_name_replaces_spaces() {
        let name = file_name_at(" WIFI SNIFFER ", &fixed_time());
        assert_eq!(name, "WIFI-SNIFFER_2024-03-07.log");
    }

    #[test]
    fn test_expand_message_without_minute() {
        let line = expand(
            "$LEVEL $MESSAGE".to_string(),
            &fixed_time(),
            "DEBUG",
            "sniffer",
            &format_args!("hop to {}", 11),
        );

        assert_eq!(line, "DEBUG hop to 11");
    }

    #[test]
    fn test_expand_keeps_message_text_verbatim() {
        let line = expand(
            "$H:$M $MESSAGE $$".to_string(),
            &fixed_time(),
            "INFO",
            "sniffer",
            &format_args!("cost $M at $Y"),
        );

        assert_eq!(line, "09:05 cost $M at $Y $$");
    }
}
