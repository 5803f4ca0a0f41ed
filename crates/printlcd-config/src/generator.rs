//! Render a configuration back to KDL

use std::fmt::Write;

use crate::model::Config;

/// Escape a string for use as a KDL string literal.
fn kdl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Generate a complete KDL configuration file for `config`.
///
/// The output contains every option, so it doubles as a documented template
/// for `printlcd init`.
///
/// Parsing the output gives back `config`, with one exception: a
/// `control_socket` starting with `~` is written as is and comes back with
/// the home directory expanded.
pub fn generate_config(config: &Config) -> String {
    let mut out = String::new();
    let display = &config.display;

    // Writing to a String cannot fail
    let _ = writeln!(out, "// printlcd configuration");
    let _ = writeln!(out);
    let _ = writeln!(out, "global {{");
    let _ = writeln!(out, "    log-level {}", kdl_string(config.global.log_level.as_str()));
    if let Some(socket) = &config.global.control_socket {
        let _ = writeln!(
            out,
            "    control-socket {}",
            kdl_string(&socket.to_string_lossy())
        );
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "lcdproc {{");
    let _ = writeln!(out, "    enabled {}", display.enabled);
    let _ = writeln!(out, "    host {}", kdl_string(&display.host));
    let _ = writeln!(out, "    port {}", display.port);
    let _ = writeln!(out, "    // Hide the status screen once the printer has been idle for a while");
    let _ = writeln!(out, "    hide-page-when-idle {}", display.hide_page_when_idle);
    let _ = writeln!(out, "    idle-time-minutes {}", display.idle_time_minutes);
    let _ = writeln!(out, "    // One of: hidden, background, info, foreground");
    let _ = writeln!(
        out,
        "    priority-printing {}",
        kdl_string(display.priority_printing.as_str())
    );
    let _ = writeln!(
        out,
        "    priority-non-printing {}",
        kdl_string(display.priority_non_printing.as_str())
    );
    let _ = writeln!(out, "    title-show {}", display.title_show);
    let _ = writeln!(out, "    title-text {}", kdl_string(&display.title_text));
    let _ = writeln!(out, "}}");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DisplayConfig, GlobalConfig, LogLevel, Priority};
    use crate::parse_config_str;

    #[test]
    fn test_default_config_parses_back() {
        let config = Config::default();
        let generated = generate_config(&config);

        assert_eq!(parse_config_str(&generated).unwrap(), config);
    }

    #[test]
    fn test_custom_config_parses_back() {
        let config = Config {
            global: GlobalConfig {
                log_level: LogLevel::Trace,
                control_socket: Some("/run/printlcd/control.sock".into()),
            },
            display: DisplayConfig {
                enabled: false,
                host: "10.0.0.5".to_string(),
                port: 13000,
                hide_page_when_idle: false,
                priority_printing: Priority::Info,
                priority_non_printing: Priority::Hidden,
                idle_time_minutes: 5,
                title_show: true,
                title_text: "Voron \"2.4\"".to_string(),
            },
        };

        let generated = generate_config(&config);
        assert!(generated.contains("title-text \"Voron \\\"2.4\\\"\""));
        assert_eq!(parse_config_str(&generated).unwrap(), config);
    }

    #[test]
    fn test_unexpanded_socket_comes_back_expanded() {
        let config = Config {
            global: GlobalConfig {
                control_socket: Some("~/printlcd.sock".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let generated = generate_config(&config);
        assert!(generated.contains("control-socket \"~/printlcd.sock\""));

        let parsed = parse_config_str(&generated).unwrap();
        let expected: std::path::PathBuf = shellexpand::tilde("~/printlcd.sock").into_owned().into();
        assert_eq!(parsed.global.control_socket, Some(expected));
    }
}
