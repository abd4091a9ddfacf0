use super::{Admission, PrintEvent, PrintFault, PrintJob, PrintState, RejectReason};
use crate::platform::PrintSpooler;
use crate::types::{JobHandle, JobStatus, PrinterStatus};
use std::path::{Path, PathBuf};

/// What one status poll saw.
enum Observation {
    Outstanding,
    Gone,
    Fault(String),
}

/// Owns the single print job and drives it from spooler status.
///
/// There is no timeout: a job the spooler keeps reporting as outstanding and
/// healthy stays in `Printing` until it disappears or the printer faults.
#[derive(Debug, Default)]
pub struct PrintJobController {
    job: Option<PrintJob>,
}

impl PrintJobController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PrintState {
        self.job.as_ref().map_or(PrintState::Idle, |job| job.state)
    }

    pub fn job(&self) -> Option<&PrintJob> {
        self.job.as_ref()
    }

    /// Bring the queue into a known state at startup: accepting, and empty.
    pub fn prepare_spooler(&self, spooler: &mut dyn PrintSpooler) {
        if let Err(e) = spooler.enable_printer() {
            log::warn!("Failed to enable printer: {}", e);
        }
        if let Err(e) = spooler.cancel_all() {
            log::warn!("Failed to cancel stale print jobs: {}", e);
        }
    }

    pub fn submit(&mut self, spooler: &mut dyn PrintSpooler, path: &Path) -> Admission {
        if self.job.is_some() {
            log::info!(
                "Print request for {:?} rejected, job still {:?}",
                path,
                self.state()
            );
            return Admission::Rejected(RejectReason::JobOutstanding);
        }

        let mut job = PrintJob::new(path.to_path_buf());
        Self::send(spooler, &mut job);
        self.job = Some(job);
        Admission::Accepted
    }

    fn send(spooler: &mut dyn PrintSpooler, job: &mut PrintJob) {
        log::info!("Try to print {:?}", job.target_path);
        match spooler.submit(&job.target_path) {
            Ok(handle) => {
                log::info!("Print job {} created", handle);
                job.job_handle = Some(handle);
                job.submit_failure = None;
            }
            Err(e) => {
                log::warn!("Print submission failed: {}", e);
                job.job_handle = None;
                job.submit_failure = Some(e.to_string());
            }
        }
        job.state = PrintState::Submitted;
        job.fault_active = false;
    }

    /// Advance the job from spooler status. Returns the transition, if any.
    pub fn poll(&mut self, spooler: &mut dyn PrintSpooler) -> Option<PrintEvent> {
        let job = self.job.as_mut()?;

        if job.state == PrintState::Completed {
            self.job = None;
            return Some(PrintEvent::Idle);
        }

        match Self::observe(spooler, job) {
            Observation::Gone => {
                log::info!("Job printed: {:?}", job.target_path);
                job.state = PrintState::Completed;
                job.fault_active = false;
                Some(PrintEvent::Completed)
            }
            Observation::Outstanding => {
                job.fault_active = false;
                match job.state {
                    PrintState::Submitted => {
                        job.state = PrintState::Printing;
                        Some(PrintEvent::Printing)
                    }
                    _ => None,
                }
            }
            Observation::Fault(message) => {
                let kind = PrintFault::classify(&message);
                let repeated = job.fault_active && job.state == PrintState::Error(kind);
                job.fault_active = true;
                if repeated {
                    return None;
                }
                log::warn!("Printer fault ({}): {}", kind, message);
                job.state = PrintState::Error(kind);
                Some(PrintEvent::Fault(kind))
            }
        }
    }

    fn observe(spooler: &mut dyn PrintSpooler, job: &PrintJob) -> Observation {
        let handle = match job.job_handle {
            Some(handle) => handle,
            None => {
                return Observation::Fault(
                    job.submit_failure
                        .clone()
                        .unwrap_or_else(|| "print job was not accepted".to_string()),
                )
            }
        };

        match spooler.printer_status() {
            Ok(PrinterStatus::Healthy) => {}
            Ok(PrinterStatus::Fault(message)) => return Observation::Fault(message),
            Err(e) => return Observation::Fault(e.to_string()),
        }

        match spooler.is_outstanding(handle) {
            Ok(true) => {}
            Ok(false) => return Observation::Gone,
            Err(e) => return Observation::Fault(e.to_string()),
        }

        match spooler.job_status(handle) {
            Ok(JobStatus::Ok) => Observation::Outstanding,
            Ok(JobStatus::Held(message)) | Ok(JobStatus::Failed(message)) => {
                Observation::Fault(message)
            }
            Err(e) => Observation::Fault(e.to_string()),
        }
    }

    /// Cancel the stuck job and submit the same file again.
    ///
    /// Only acts in `Error`; returns whether a resubmission happened.
    pub fn retry(&mut self, spooler: &mut dyn PrintSpooler) -> bool {
        let job = match self.job.as_mut() {
            Some(job) if matches!(job.state, PrintState::Error(_)) => job,
            _ => return false,
        };

        log::info!("Restart print job for {:?}", job.target_path);
        if let Err(e) = spooler.enable_printer() {
            log::warn!("Failed to enable printer: {}", e);
        }
        if let Some(handle) = job.job_handle.take() {
            Self::cancel_handle(spooler, handle);
        }
        job.retry_requested = true;
        Self::send(spooler, job);
        true
    }

    /// Drop the current job without resubmitting. Returns whether one existed.
    pub fn cancel(&mut self, spooler: &mut dyn PrintSpooler) -> bool {
        let job = match self.job.take() {
            Some(job) => job,
            None => return false,
        };

        log::info!("Cancel print job for {:?}", job.target_path);
        if job.state != PrintState::Completed {
            if let Err(e) = spooler.enable_printer() {
                log::warn!("Failed to enable printer: {}", e);
            }
            if let Some(handle) = job.job_handle {
                Self::cancel_handle(spooler, handle);
            }
        }
        true
    }

    fn cancel_handle(spooler: &mut dyn PrintSpooler, handle: JobHandle) {
        if let Err(e) = spooler.cancel(handle) {
            log::warn!("Failed to cancel {}: {}", handle, e);
        }
    }

    pub fn target(&self) -> Option<PathBuf> {
        self.job.as_ref().map(|job| job.target_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, Journal, MockSpooler};

    fn setup() -> (PrintJobController, MockSpooler, Journal) {
        let journal = Journal::new();
        (PrintJobController::new(), MockSpooler::new(journal.clone()), journal)
    }

    fn submits(journal: &Journal) -> usize {
        journal.count(|c| matches!(c, Call::Submit(_)))
    }

    #[test]
    fn test_happy_path() {
        let (mut printer, mut spooler, journal) = setup();
        let path = Path::new("photos/a_single.jpg");

        assert_eq!(printer.submit(&mut spooler, path), Admission::Accepted);
        assert_eq!(printer.state(), PrintState::Submitted);

        assert_eq!(printer.poll(&mut spooler), Some(PrintEvent::Printing));
        assert_eq!(printer.poll(&mut spooler), None);
        assert_eq!(printer.state(), PrintState::Printing);

        spooler.complete_all();
        assert_eq!(printer.poll(&mut spooler), Some(PrintEvent::Completed));
        assert_eq!(printer.poll(&mut spooler), Some(PrintEvent::Idle));
        assert_eq!(printer.state(), PrintState::Idle);
        assert_eq!(submits(&journal), 1);
    }

    #[test]
    fn test_admission_control() {
        let (mut printer, mut spooler, journal) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);

        let second = printer.submit(&mut spooler, Path::new("b.jpg"));
        assert_eq!(second, Admission::Rejected(RejectReason::JobOutstanding));
        assert_eq!(printer.state(), PrintState::Printing);
        assert_eq!(printer.target(), Some(PathBuf::from("a.jpg")));
        assert_eq!(submits(&journal), 1);
    }

    #[test]
    fn test_fault_onset_is_edge_triggered() {
        let (mut printer, mut spooler, _) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);

        spooler.set_printer_fault(Some("Ribbon empty"));
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Ribbon))
        );
        assert_eq!(printer.poll(&mut spooler), None);
        assert_eq!(printer.poll(&mut spooler), None);
        assert_eq!(printer.state(), PrintState::Error(PrintFault::Ribbon));

        spooler.set_printer_fault(Some("Paper out"));
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Paper))
        );
    }

    #[test]
    fn test_fault_reappearing_is_a_new_onset() {
        let (mut printer, mut spooler, _) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);

        spooler.set_printer_fault(Some("cover open"));
        assert!(printer.poll(&mut spooler).is_some());
        spooler.set_printer_fault(None);
        assert_eq!(printer.poll(&mut spooler), None);
        assert_eq!(printer.state(), PrintState::Error(PrintFault::Generic));

        spooler.set_printer_fault(Some("cover open"));
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Generic))
        );
    }

    #[test]
    fn test_held_job_is_a_fault() {
        let (mut printer, mut spooler, _) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);

        spooler.hold_jobs(Some("Ribbon needs replacing"));
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Ribbon))
        );
    }

    #[test]
    fn test_retry_cancels_once_and_resubmits_same_path() {
        let (mut printer, mut spooler, journal) = setup();
        printer.submit(&mut spooler, Path::new("photos/x_montage.jpg"));
        printer.poll(&mut spooler);
        spooler.set_printer_fault(Some("ribbon"));
        printer.poll(&mut spooler);
        let first = printer.job().and_then(|j| j.job_handle).unwrap();

        journal.clear();
        spooler.set_printer_fault(None);
        assert!(printer.retry(&mut spooler));
        assert_eq!(printer.state(), PrintState::Submitted);
        assert!(printer.job().unwrap().retry_requested);

        let calls: Vec<Call> = journal
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Cancel(_) | Call::Submit(_)))
            .collect();
        assert_eq!(
            calls,
            vec![
                Call::Cancel(first),
                Call::Submit(PathBuf::from("photos/x_montage.jpg")),
            ]
        );

        assert_eq!(printer.poll(&mut spooler), Some(PrintEvent::Printing));
    }

    #[test]
    fn test_retry_outside_error_does_nothing() {
        let (mut printer, mut spooler, journal) = setup();
        assert!(!printer.retry(&mut spooler));
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);
        journal.clear();
        assert!(!printer.retry(&mut spooler));
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_spooler_failure_surfaces_on_next_poll() {
        let (mut printer, mut spooler, _) = setup();
        spooler.set_unreachable(true);
        assert_eq!(printer.submit(&mut spooler, Path::new("a.jpg")), Admission::Accepted);
        assert_eq!(printer.state(), PrintState::Submitted);
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Generic))
        );

        printer.submit(&mut spooler, Path::new("b.jpg"));
        assert_eq!(printer.target(), Some(PathBuf::from("a.jpg")));
    }

    #[test]
    fn test_unreachable_while_printing_is_generic_fault() {
        let (mut printer, mut spooler, _) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);
        spooler.set_unreachable(true);
        assert_eq!(
            printer.poll(&mut spooler),
            Some(PrintEvent::Fault(PrintFault::Generic))
        );
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let (mut printer, mut spooler, journal) = setup();
        assert!(!printer.cancel(&mut spooler));

        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);
        assert!(printer.cancel(&mut spooler));
        assert_eq!(printer.state(), PrintState::Idle);
        assert_eq!(journal.count(|c| matches!(c, Call::Cancel(_))), 1);
        assert_eq!(printer.submit(&mut spooler, Path::new("b.jpg")), Admission::Accepted);
    }

    #[test]
    fn test_job_completing_while_in_error() {
        let (mut printer, mut spooler, _) = setup();
        printer.submit(&mut spooler, Path::new("a.jpg"));
        printer.poll(&mut spooler);
        spooler.hold_jobs(Some("paper"));
        printer.poll(&mut spooler);

        spooler.hold_jobs(None);
        spooler.complete_all();
        assert_eq!(printer.poll(&mut spooler), Some(PrintEvent::Completed));
    }

    #[test]
    fn test_prepare_spooler() {
        let (printer, mut spooler, journal) = setup();
        printer.prepare_spooler(&mut spooler);
        assert_eq!(journal.calls(), vec![Call::EnablePrinter, Call::CancelAll]);
    }
}
