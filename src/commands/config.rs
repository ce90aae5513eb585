//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Tag written into generated configuration files.
const EXAMPLE_TAG: &str = "ps.${hostname}";

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config {
        tag: Some(EXAMPLE_TAG.to_string()),
        ..Config::default()
    };
    let output = output.unwrap_or_else(|| PathBuf::from("watch-process.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# watch-process Configuration
# ==========================
#
# tag: "ps.${hostname}"        # Required. ${hostname}/__HOSTNAME__ are expanded
# command: null                # Listing command override, used verbatim
# keys: null                   # Column names; defaults depend on the platform
#                              #   linux/mac: start_time user pid parent_pid cpu_time
#                              #   cpu_percent memory_percent mem_rss mem_size state
#                              #   proc_name command
#                              #   windows: StartTime UserName SessionId Id CPU
#                              #   WorkingSet VirtualMemorySize HandleCount ProcessName
# interval: 5s                 # Sampling interval
# timeout: null                # Bound for one tick (defaults to interval)
# lookup_user: null            # Only emit processes of these users
# hostname_command: hostname   # Command used for ${hostname}
# types: "pid:integer,..."     # Field types (string, integer, float, bool)
# platform: null               # linux | mac | windows (detected when null)

"#;
    format!("{}{}", comments, yaml)
}
