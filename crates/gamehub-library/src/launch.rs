//! Game launching

use crate::{GameRecord, LibraryError};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

/// Result of a successful launch
#[derive(Debug)]
pub struct LaunchResult {
    /// PID of the spawned process
    pub pid: u32,

    /// Program that was started
    pub program: PathBuf,

    /// Child process handle, `None` when nothing was spawned locally.
    /// Launching does not wait; the owner reaps it with [`LaunchResult::wait`].
    pub child: Option<Child>,
}

impl LaunchResult {
    /// Block until the spawned process exits
    pub fn wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.wait().map(Some),
            None => Ok(None),
        }
    }
}

/// Platform-specific launch routine, keyed by the record's launch command
pub trait GameLauncher: Send + Sync {
    fn launch(&self, game: &GameRecord) -> Result<LaunchResult, LibraryError>;
}

/// How a launch command is executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// A URI handed to the desktop opener (`steam://rungameid/440`)
    Uri(String),
    /// An executable started from its own directory
    Executable(PathBuf),
}

impl LaunchTarget {
    /// Classify a launch command
    pub fn parse(command: &str) -> Option<Self> {
        let command = command.trim();
        if command.is_empty() {
            return None;
        }

        match command.split_once("://") {
            Some((scheme, _))
                if !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                Some(LaunchTarget::Uri(command.to_string()))
            }
            _ => Some(LaunchTarget::Executable(PathBuf::from(command))),
        }
    }
}

/// Spawns games as child processes
pub struct ProcessLauncher {
    /// Programs that can open URIs, tried in order
    openers: Vec<String>,
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self {
            openers: vec!["xdg-open".to_string(), "open".to_string()],
        }
    }
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom list of URI openers
    pub fn with_openers(openers: Vec<String>) -> Self {
        Self { openers }
    }

    /// Find the first available URI opener on PATH
    fn find_opener(&self) -> Option<PathBuf> {
        self.openers.iter().find_map(|name| which::which(name).ok())
    }

    fn spawn(mut cmd: Command, program: PathBuf) -> Result<LaunchResult, LibraryError> {
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| LibraryError::Launch(format!("Failed to spawn process: {}", e)))?;

        Ok(LaunchResult {
            pid: child.id(),
            program,
            child: Some(child),
        })
    }
}

impl GameLauncher for ProcessLauncher {
    fn launch(&self, game: &GameRecord) -> Result<LaunchResult, LibraryError> {
        let target = LaunchTarget::parse(&game.launch_command).ok_or_else(|| {
            LibraryError::Launch(format!("{} has no launch command", game))
        })?;

        match target {
            LaunchTarget::Uri(uri) => {
                let opener = self
                    .find_opener()
                    .ok_or_else(|| LibraryError::Launch("No URI opener found on PATH".into()))?;

                tracing::info!("Launching {} via {}", game.title, uri);

                let mut cmd = Command::new(&opener);
                cmd.arg(&uri);
                Self::spawn(cmd, opener)
            }
            LaunchTarget::Executable(path) => {
                if !path.exists() {
                    return Err(LibraryError::PathNotFound(path));
                }

                tracing::info!("Launching {} from {}", game.title, path.display());

                let mut cmd = Command::new(&path);
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    cmd.current_dir(dir);
                }
                Self::spawn(cmd, path)
            }
        }
    }
}
