//! # Operator input script interpreter module
//!
//! This module provides an interpreter for operator input scripts, allowing a drive session to be
//! replayed without a human at the gamepad. A script is a list of timestamped telecommands:
//!
//! ```text
//! 0.0: {"type": "AXIS", "payload": {"axis": "LeftY", "value": 0.5}};
//! 2.0: {"type": "PRESS", "payload": {"button": "BumperRight"}};
//! 2.1: {"type": "RELEASE", "payload": {"button": "BumperRight"}};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand which is scripted to occur at a specific time.
#[derive(Debug, Clone, Copy)]
struct ScriptedTc {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: Tc,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_tcs` to
/// acquire a list of telecommands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: PathBuf,
    tcs: VecDeque<ScriptedTc>,
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

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError),
}

#[derive(Debug, PartialEq)]
pub enum PendingTcs {
    None,
    Some(Vec<Tc>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut interp = Self::from_script_str(&script)?;
        interp.script_path = path;

        Ok(interp)
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {
        let mut tc_queue: VecDeque<ScriptedTc> = VecDeque::new();

        // Each entry is `<time>: <json>;`, one per line
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("script entry pattern is a valid regex");

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}: {}", time_str, e)))?;

            if let Some(prev) = tc_queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s));
                }
            }

            let tc = Tc::from_json(cap.get(3).map(|m| m.as_str()).unwrap_or_default())
                .map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            tc_queue.push_back(ScriptedTc { exec_time_s, tc });
        }

        if tc_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            script_path: PathBuf::new(),
            tcs: tc_queue,
        })
    }

    /// Return the TCs whose execution time is at or before `current_time_s`.
    pub fn get_pending_tcs(&mut self, current_time_s: f64) -> PendingTcs {
        if self.tcs.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<Tc> = vec![];

        while let Some(front) = self.tcs.front() {
            if front.exec_time_s > current_time_s {
                break;
            }
            tc_vec.push(front.tc);
            self.tcs.pop_front();
        }

        if tc_vec.is_empty() {
            PendingTcs::None
        } else {
            PendingTcs::Some(tc_vec)
        }
    }

    /// Get the number of TCs remaining in the script
    pub fn get_num_tcs(&self) -> usize {
        self.tcs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.tcs.back().map(|c| c.exec_time_s).unwrap_or(0.0)
    }

    /// Path the script was loaded from, empty if it was built from a string.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::hid::Button;

    const SCRIPT: &str = r#"
        0.0: {"type": "AXIS", "payload": {"axis": "LeftY", "value": 0.5}};
        1.0: {"type": "PRESS", "payload": {"button": "BumperLeft"}};
        1.0: {"type": "RELEASE", "payload": {"button": "BumperLeft"}};
        3.5: {"type": "NONE"};
    "#;

    #[test]
    fn test_pending_tcs() {
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();
        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 3.5);

        assert!(matches!(si.get_pending_tcs(0.0), PendingTcs::Some(v) if v.len() == 1));
        assert_eq!(si.get_pending_tcs(0.5), PendingTcs::None);
        assert_eq!(
            si.get_pending_tcs(1.0),
            PendingTcs::Some(vec![
                Tc::Press { button: Button::BumperLeft },
                Tc::Release { button: Button::BumperLeft },
            ])
        );
        assert_eq!(si.get_pending_tcs(10.0), PendingTcs::Some(vec![Tc::None]));
        assert_eq!(si.get_pending_tcs(11.0), PendingTcs::EndOfScript);
    }

    #[test]
    fn test_script_errors() {
        assert!(matches!(
            ScriptInterpreter::from_script_str("nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script_str(r#"1.0: {"type": "JUMP"};"#),
            Err(ScriptError::InvalidTc(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::from_script_str(
                "2.0: {\"type\": \"NONE\"};\n1.0: {\"type\": \"NONE\"};"
            ),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/definitely/not/a/script.prs"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
