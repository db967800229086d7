//! # Simulation script interpreter module
//!
//! This module provides an interpreter for simulation scripts, which schedule
//! commands to be executed at given simulation times.
//!
//! A script contains one command per line in the form
//!
//! ```text
//! <time_s>: <json command>;
//! ```
//!
//! Anything not matching this pattern (for instance `#` comment lines) is
//! ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command<C> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: C
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to
/// acquire a list of commands that need executing.
pub struct ScriptInterpreter<C> {
    script_path: Option<PathBuf>,
    cmds: VecDeque<Command<C>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCommand(f64, serde_json::Error),

    #[error("Script commands are not in time order (at {0} s)")]
    NotInTimeOrder(f64)
}

pub enum PendingCmds<C> {
    None,
    Some(Vec<C>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: DeserializeOwned> ScriptInterpreter<C> {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_str(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of commands
        let mut cmd_queue: VecDeque<Command<C>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = cap[1].parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(prev) = cmd_queue.back() {
                if prev.exec_time_s > exec_time_s {
                    return Err(ScriptError::NotInTimeOrder(exec_time_s))
                }
            }

            // Parse the command from the payload. The scripts contain JSON only.
            let cmd = serde_json::from_str(&cap[3])
                .map_err(|e| ScriptError::InvalidCommand(exec_time_s, e))?;

            cmd_queue.push_back(Command {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds: cmd_queue
        })
    }
}

impl<C> ScriptInterpreter<C> {

    /// Return the pending commands whose execution time is at or before
    /// `current_time_s`.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingCmds<C> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<C> = vec![];

        // Pop items from the queue while the head is due
        while self.cmds
            .front()
            .map_or(false, |c| c.exec_time_s <= current_time_s)
        {
            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        if cmd_vec.is_empty() {
            PendingCmds::None
        }
        else {
            PendingCmds::Some(cmd_vec)
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Path the script was loaded from, if any.
    pub fn get_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    enum Cmd {
        Reset,
        Nudge(f64)
    }

    const SCRIPT: &str = r#"
# Nudge twice then reset
0.5: {"Nudge": 0.1};
1.0: {"Nudge": -0.2};
2.5: "Reset";
"#;

    #[test]
    fn test_pending() {
        let mut si = ScriptInterpreter::<Cmd>::from_str(SCRIPT).unwrap();
        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 2.5);

        assert!(matches!(si.get_pending(0.0), PendingCmds::None));

        match si.get_pending(1.0) {
            PendingCmds::Some(v) => assert_eq!(v, vec![Cmd::Nudge(0.1), Cmd::Nudge(-0.2)]),
            _ => panic!("Expected two pending commands")
        }

        match si.get_pending(3.0) {
            PendingCmds::Some(v) => assert_eq!(v, vec![Cmd::Reset]),
            _ => panic!("Expected the reset command")
        }

        assert!(matches!(si.get_pending(4.0), PendingCmds::EndOfScript));
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("# nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("1.0: {\"Jump\": 2};"),
            Err(ScriptError::InvalidCommand(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::<Cmd>::from_str("2.0: \"Reset\";\n1.0: \"Reset\";"),
            Err(ScriptError::NotInTimeOrder(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../scripts/gain_sweep.sc");
        let si = ScriptInterpreter::<serde_json::Value>::new(path).unwrap();
        assert_eq!(si.get_path(), Some(Path::new(path)));
        assert_eq!(si.get_num_cmds(), 6);
        assert_eq!(si.get_duration(), 9.0);

        let si = ScriptInterpreter::<Cmd>::from_str(SCRIPT).unwrap();
        assert!(si.get_path().is_none());
    }
}
