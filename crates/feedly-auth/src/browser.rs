//! Browser handoff for the authorization step.

use std::fmt;
use std::process::Command;

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync + fmt::Debug {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Launches the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        launch_command(url).spawn()?;
        Ok(())
    }
}

/// The URL is always the final argument, passed as-is with no shell in between.
fn launch_command(url: &str) -> Command {
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");
    // `cmd /C start` would split the URL at `&`.
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Command::new("rundll32");
        cmd.arg("url.dll,FileProtocolHandler");
        cmd
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
