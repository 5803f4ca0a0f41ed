//! KDL configuration parser

use std::path::Path;

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "lcdproc" => {
                config.display = parse_display(node)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    let val = string_value(child, "log-level")?;
                    global.log_level = val
                        .parse()
                        .map_err(|e| ConfigError::invalid("log-level", e))?;
                }
                "control-socket" => {
                    let val = string_value(child, "control-socket")?;
                    global.control_socket = Some(shellexpand::tilde(val).into_owned().into());
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_display(node: &kdl::KdlNode) -> Result<DisplayConfig, ConfigError> {
    let mut display = DisplayConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value();
            match key {
                "enabled" => display.enabled = bool_value(child, key)?,
                "host" => {
                    let host = string_value(child, key)?;
                    if host.trim().is_empty() {
                        return Err(ConfigError::invalid(key, "host must not be empty"));
                    }
                    display.host = host.to_string();
                }
                "port" => {
                    let port = int_value(child, key)?;
                    display.port = u16::try_from(port)
                        .ok()
                        .filter(|p| *p != 0)
                        .ok_or_else(|| {
                            ConfigError::invalid(key, format!("{} is not a valid TCP port", port))
                        })?;
                }
                "hide-page-when-idle" => display.hide_page_when_idle = bool_value(child, key)?,
                "priority-printing" => display.priority_printing = priority_value(child, key)?,
                "priority-non-printing" => {
                    display.priority_non_printing = priority_value(child, key)?
                }
                "idle-time-minutes" => {
                    let minutes = int_value(child, key)?;
                    display.idle_time_minutes = u64::try_from(minutes).map_err(|_| {
                        ConfigError::invalid(key, format!("{} must not be negative", minutes))
                    })?;
                }
                "title-show" => display.title_show = bool_value(child, key)?,
                "title-text" => display.title_text = string_value(child, key)?.to_string(),
                name => {
                    tracing::warn!("Unknown lcdproc config option: {}", name);
                }
            }
        }
    }

    Ok(display)
}

fn first_value<'a>(node: &'a kdl::KdlNode, key: &str) -> Result<&'a kdl::KdlValue, ConfigError> {
    node.entries()
        .first()
        .map(|entry| entry.value())
        .ok_or_else(|| ConfigError::invalid(key, "missing value"))
}

fn string_value<'a>(node: &'a kdl::KdlNode, key: &str) -> Result<&'a str, ConfigError> {
    first_value(node, key)?
        .as_string()
        .ok_or_else(|| ConfigError::invalid(key, "expected a string"))
}

fn bool_value(node: &kdl::KdlNode, key: &str) -> Result<bool, ConfigError> {
    first_value(node, key)?
        .as_bool()
        .ok_or_else(|| ConfigError::invalid(key, "expected true or false"))
}

fn int_value(node: &kdl::KdlNode, key: &str) -> Result<i64, ConfigError> {
    first_value(node, key)?
        .as_i64()
        .ok_or_else(|| ConfigError::invalid(key, "expected an integer"))
}

fn priority_value(node: &kdl::KdlNode, key: &str) -> Result<Priority, ConfigError> {
    string_value(node, key)?
        .parse()
        .map_err(|e| ConfigError::invalid(key, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = r#"
            global {
                log-level "debug"
            }

            lcdproc {
                enabled true
                host "lcd.local"
                port 13667
                hide-page-when-idle false
                priority-printing "info"
                priority-non-printing "background"
                idle-time-minutes 15
                title-show true
                title-text "Prusa"
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.global.log_level, LogLevel::Debug);
        assert_eq!(result.display.host, "lcd.local");
        assert_eq!(result.display.port, 13667);
        assert!(!result.display.hide_page_when_idle);
        assert_eq!(result.display.priority_printing, Priority::Info);
        assert_eq!(result.display.priority_non_printing, Priority::Background);
        assert_eq!(result.display.idle_time_minutes, 15);
        assert!(result.display.title_show);
        assert_eq!(result.display.title_text, "Prusa");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let result = parse_config_str("").unwrap();
        assert_eq!(result, Config::default());
    }

    #[test]
    fn test_partial_display_block_keeps_other_defaults() {
        let config = r#"
            lcdproc {
                port 1234
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.display.port, 1234);
        assert_eq!(result.display.host, "127.0.0.1");
        assert!(result.display.enabled);
    }

    #[test]
    fn test_unknown_priority_fails() {
        let config = r#"
            lcdproc {
                priority-printing "alert"
            }
        "#;

        match parse_config_str(config).unwrap_err() {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "priority-printing");
                assert!(message.contains("alert"));
            }
            other => panic!("Expected InvalidValue, got: {:?}", other),
        }
    }

    #[test]
    fn test_port_out_of_range_fails() {
        for port in ["0", "70000", "-1"] {
            let config = format!("lcdproc {{\n port {}\n}}", port);
            let err = parse_config_str(&config).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "port"),
                "port {} should be rejected, got: {:?}",
                port,
                err
            );
        }
    }

    #[test]
    fn test_negative_idle_time_fails() {
        let config = r#"
            lcdproc {
                idle-time-minutes -5
            }
        "#;

        assert!(matches!(
            parse_config_str(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_wrong_value_type_fails() {
        let config = r#"
            lcdproc {
                enabled "yes"
            }
        "#;

        match parse_config_str(config).unwrap_err() {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "enabled");
                assert!(message.contains("true or false"));
            }
            other => panic!("Expected InvalidValue, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let config = r#"
            lcdproc {
                contrast 500
            }
            backlight "on"
        "#;

        assert_eq!(parse_config_str(config).unwrap(), Config::default());
    }

    #[test]
    fn test_tilde_expansion_in_control_socket() {
        let config = r#"
            global {
                control-socket "~/printlcd.sock"
            }
        "#;

        let result = parse_config_str(config).unwrap();
        let path = result.global.control_socket.unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with("printlcd.sock"));
    }

    #[test]
    fn test_invalid_kdl_reports_parse_error() {
        let result = parse_config_str("lcdproc {");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
