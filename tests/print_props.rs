//! Property-Based Tests for the print job state machine
//!
//! Arbitrary interleavings of operator actions and spooler behaviour must
//! never put more than one job in the spooler.

use crabbooth::print::{Admission, PrintJobController, RejectReason};
use crabbooth::testing::{Call, Journal, MockSpooler};
use crabbooth::PrintState;
use proptest::prelude::*;
use std::path::Path;

#[derive(Debug, Clone)]
enum Op {
    Submit,
    Poll,
    CompleteAll,
    Fault(&'static str),
    ClearFault,
    Hold,
    Release,
    Retry,
    Cancel,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Submit),
        6 => Just(Op::Poll),
        2 => Just(Op::CompleteAll),
        1 => prop::sample::select(vec!["Ribbon low", "Paper out", "door open"]).prop_map(Op::Fault),
        1 => Just(Op::ClearFault),
        1 => Just(Op::Hold),
        1 => Just(Op::Release),
        2 => Just(Op::Retry),
        1 => Just(Op::Cancel),
    ]
}

proptest! {
    /// INVARIANT: at most one job is ever outstanding in the spooler
    #[test]
    fn at_most_one_outstanding_job(ops in prop::collection::vec(op(), 1..80)) {
        let journal = Journal::new();
        let mut spooler = MockSpooler::new(journal.clone());
        let mut printer = PrintJobController::new();

        for op in ops {
            match op {
                Op::Submit => {
                    let before = printer.state();
                    let submits = journal.count(|c| matches!(c, Call::Submit(_)));
                    let admission = printer.submit(&mut spooler, Path::new("photo.jpg"));
                    if before != PrintState::Idle {
                        prop_assert_eq!(admission, Admission::Rejected(RejectReason::JobOutstanding));
                        prop_assert_eq!(printer.state(), before);
                        prop_assert_eq!(journal.count(|c| matches!(c, Call::Submit(_))), submits);
                    }
                }
                Op::Poll => {
                    printer.poll(&mut spooler);
                }
                Op::CompleteAll => spooler.complete_all(),
                Op::Fault(message) => spooler.set_printer_fault(Some(message)),
                Op::ClearFault => spooler.set_printer_fault(None),
                Op::Hold => spooler.hold_jobs(Some("held by operator")),
                Op::Release => spooler.hold_jobs(None),
                Op::Retry => {
                    let was_error = matches!(printer.state(), PrintState::Error(_));
                    prop_assert_eq!(printer.retry(&mut spooler), was_error);
                }
                Op::Cancel => {
                    printer.cancel(&mut spooler);
                    prop_assert_eq!(printer.state(), PrintState::Idle);
                }
            }
            prop_assert!(spooler.outstanding().len() <= 1);
        }
    }

    /// INVARIANT: a healthy job goes Submitted, Printing, Completed, Idle
    #[test]
    fn healthy_job_lifecycle(polls_before_done in 1u32..10) {
        let journal = Journal::new();
        let mut spooler = MockSpooler::new(journal.clone());
        spooler.auto_complete_after(polls_before_done);
        let mut printer = PrintJobController::new();

        printer.submit(&mut spooler, Path::new("photo.jpg"));
        let mut seen = vec![printer.state()];
        for _ in 0..(polls_before_done + 3) {
            printer.poll(&mut spooler);
            if seen.last() != Some(&printer.state()) {
                seen.push(printer.state());
            }
        }

        prop_assert_eq!(
            seen,
            vec![
                PrintState::Submitted,
                PrintState::Printing,
                PrintState::Completed,
                PrintState::Idle,
            ]
        );
        prop_assert_eq!(journal.count(|c| matches!(c, Call::Submit(_))), 1);
    }
}
