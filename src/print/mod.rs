//! Print job lifecycle.
//!
//! At most one job exists at a time. Its state only moves when the control
//! loop polls the spooler, and faults are classified from the printer's
//! free-text status message.

pub mod controller;

pub use controller::PrintJobController;

use crate::types::JobHandle;
use std::fmt;
use std::path::PathBuf;

/// Printer fault classes, each with its own operator message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintFault {
    Ribbon,
    Paper,
    Generic,
}

impl PrintFault {
    /// Classify a printer or job status message. Ribbon wins over paper.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("ribbon") {
            PrintFault::Ribbon
        } else if lower.contains("paper") {
            PrintFault::Paper
        } else {
            PrintFault::Generic
        }
    }
}

impl fmt::Display for PrintFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintFault::Ribbon => write!(f, "ribbon error"),
            PrintFault::Paper => write!(f, "paper error"),
            PrintFault::Generic => write!(f, "printer error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    Idle,
    Submitted,
    Printing,
    Error(PrintFault),
    Completed,
}

impl PrintState {
    pub fn is_idle(&self) -> bool {
        matches!(self, PrintState::Idle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub target_path: PathBuf,
    /// `None` when the spooler refused or never answered the submission.
    pub job_handle: Option<JobHandle>,
    pub state: PrintState,
    /// Set once the operator has resubmitted this job after a fault.
    pub retry_requested: bool,
    /// A fault is currently being reported, used to detect onsets.
    fault_active: bool,
    submit_failure: Option<String>,
}

impl PrintJob {
    fn new(target_path: PathBuf) -> Self {
        Self {
            target_path,
            job_handle: None,
            state: PrintState::Submitted,
            retry_requested: false,
            fault_active: false,
            submit_failure: None,
        }
    }
}

/// Outcome of a print request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another job has not finished yet.
    JobOutstanding,
    /// No finished composite is on screen.
    NothingToPrint,
}

/// Transitions the control loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintEvent {
    Printing,
    /// A new fault appeared, or the fault class changed.
    Fault(PrintFault),
    Completed,
    /// Completed job was cleared, new requests are admitted again.
    Idle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classification() {
        assert_eq!(PrintFault::classify("Ribbon empty"), PrintFault::Ribbon);
        assert_eq!(PrintFault::classify("RIBBON missing"), PrintFault::Ribbon);
        assert_eq!(PrintFault::classify("Out of paper"), PrintFault::Paper);
        assert_eq!(PrintFault::classify("Paper jam"), PrintFault::Paper);
        assert_eq!(PrintFault::classify("Cover open"), PrintFault::Generic);
        assert_eq!(PrintFault::classify(""), PrintFault::Generic);
    }

    proptest! {
        #[test]
        fn classify_is_total_and_case_insensitive(msg in "[ -~]{0,40}") {
            let kind = PrintFault::classify(&msg);
            prop_assert_eq!(kind, PrintFault::classify(&msg.to_uppercase()));
            if !msg.to_lowercase().contains("ribbon") && !msg.to_lowercase().contains("paper") {
                prop_assert_eq!(kind, PrintFault::Generic);
            }
        }

        #[test]
        fn ribbon_anywhere_wins(prefix in "[a-z ]{0,10}", suffix in "[a-z ]{0,10}") {
            let msg = format!("{}RiBbOn{}", prefix, suffix);
            prop_assert_eq!(PrintFault::classify(&msg), PrintFault::Ribbon);
        }
    }
}
