//! Host name placeholders in the record tag.

use tracing::debug;

use crate::command::shell_command;
use crate::config::ConfigError;

/// Placeholders replaced with the output of `hostname_command`.
pub const HOSTNAME_PLACEHOLDERS: [&str; 2] = ["${hostname}", "__HOSTNAME__"];

pub fn has_hostname_placeholder(tag: &str) -> bool {
    HOSTNAME_PLACEHOLDERS.iter().any(|p| tag.contains(p))
}

pub fn expand_hostname(tag: &str, hostname: &str) -> String {
    HOSTNAME_PLACEHOLDERS
        .iter()
        .fold(tag.to_string(), |tag, p| tag.replace(p, hostname))
}

/// Runs `command` through the shell and returns its trimmed stdout.
pub async fn lookup_hostname(command: &str) -> Result<String, ConfigError> {
    let failed = |reason: String| ConfigError::Hostname {
        command: command.to_string(),
        reason,
    };

    let output = shell_command(command)
        .output()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(format!("exited with {}", output.status)));
    }

    let hostname = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if hostname.is_empty() {
        return Err(failed("printed nothing".into()));
    }
    Ok(hostname)
}

/// Expands host name placeholders in `tag`, running `hostname_command` only
/// when a placeholder is present.
pub async fn resolve_tag(tag: &str, hostname_command: &str) -> Result<String, ConfigError> {
    if !has_hostname_placeholder(tag) {
        return Ok(tag.to_string());
    }
    let hostname = lookup_hostname(hostname_command).await?;
    debug!("Resolved hostname '{}' for tag '{}'", hostname, tag);
    Ok(expand_hostname(tag, &hostname))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_both_placeholders() {
        assert_eq!(
            expand_hostname("ps.${hostname}.__HOSTNAME__", "web01"),
            "ps.web01.web01"
        );
        assert_eq!(expand_hostname("ps.static", "web01"), "ps.static");
    }

    #[tokio::test]
    async fn test_resolve_tag_without_placeholder_skips_command() {
        let tag = resolve_tag("ps.static", "/nonexistent/hostname")
            .await
            .unwrap();
        assert_eq!(tag, "ps.static");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_tag_runs_hostname_command() {
        let tag = resolve_tag("ps.${hostname}", "echo ' web01 '")
            .await
            .unwrap();
        assert_eq!(tag, "ps.web01");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_hostname_command_is_a_config_error() {
        let err = resolve_tag("ps.${hostname}", "exit 3")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Hostname { .. }));
    }
}
