//! Builds the external process listing command for each platform.

use tokio::process::Command;

use crate::platform::Platform;

/// `ps` field spec on Linux (procps-ng).
const LINUX_PS_FIELDS: &str = "lstart,user:20,pid,ppid,time,%cpu,%mem,rss,sz,s,comm,cmd";

/// `ps` field spec on macOS (BSD ps).
const MAC_PS_FIELDS: &str = "lstart,user,pid,ppid,time,%cpu,%mem,rss,vsz,state,comm,command";

/// Forces an English locale so `lstart` renders in a parseable form.
const PS_LOCALE: &str = "LANG=en_US.UTF-8";

/// Builds the listing command for `platform`.
///
/// On Unix the field spec is fixed; `keys` only name the resulting columns.
/// On Windows the keys are the projected `Get-Process` properties.
pub fn build(platform: Platform, keys: &[String]) -> String {
    match platform {
        Platform::Linux => format!("{PS_LOCALE} ps -ewwo {LINUX_PS_FIELDS}"),
        Platform::Mac => format!("{PS_LOCALE} ps -ewwo {MAC_PS_FIELDS}"),
        Platform::Windows => build_win32(keys),
    }
}

fn build_win32(keys: &[String]) -> String {
    let command = [
        "Get-Process".to_string(),
        format!(" | Select-Object -Property {}", keys.join(",")),
        " | ForEach { ConvertTo-JSON -Compress $_; }".to_string(),
    ]
    .concat();
    format!("powershell -command \"{command}\"")
}

/// Returns the override verbatim when present, otherwise the built command.
pub fn resolve(override_command: Option<&str>, platform: Platform, keys: &[String]) -> String {
    match override_command {
        Some(cmd) => cmd.to_string(),
        None => build(platform, keys),
    }
}

/// Wraps a command string in the host shell (`sh -c`, or `cmd /C` on Windows).
///
/// The shell follows the host OS, not the configured listing layout.
#[cfg(not(windows))]
pub fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
pub fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    // cmd.exe does its own quote parsing; pass the string through untouched.
    cmd.arg("/C").raw_arg(command);
    cmd
}
