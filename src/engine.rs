//! Engine loop
//!
//!  The reconciler is owned by a single thread that drains one command
//!  channel. Cycles and selection intents are applied strictly one after the
//!  other, so no two cycles ever overlap on the identity map.

use crossbeam_channel::Receiver;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::source::Snapshot;
use crate::view::ViewSink;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Cycle(Snapshot),
    Select(String),
    ClearSelection,
    Shutdown,
}

/// Apply commands until shutdown or until the channel closes.
/// An invariant violation stops the engine and is returned.
pub fn run_engine<S: ViewSink>(rx: Receiver<EngineCommand>, reconciler: &mut Reconciler<S>) -> Result<()> {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            EngineCommand::Cycle(snapshot) => {
                match reconciler.process_cycle(snapshot) {
                    Ok(report) if report.skipped => debug!("Cycle skipped, source unavailable"),
                    Ok(_) => {}
                    Err(e) => {
                        error!("Stopping engine: {}", e);
                        return Err(e);
                    }
                }
            }
            EngineCommand::Select(identity) => reconciler.select(&identity),
            EngineCommand::ClearSelection => reconciler.clear_selection(),
            EngineCommand::Shutdown => break,
        }
    }
    info!(
        "Engine stopped with {} live flights, selection {:?}",
        reconciler.len(),
        reconciler.selected()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::AirportRegistry;
    use crate::error::TrackerError;
    use crate::flight::RawSample;
    use crate::view::testing::{RecordingSink, SinkCall};
    use crossbeam_channel::unbounded;

    fn sample(id: &str) -> RawSample {
        RawSample {
            latitude: Some(42.6),
            longitude: Some(21.0),
            ..RawSample::new(id)
        }
    }

    #[test]
    fn test_commands_applied_in_order() {
        let (tx, rx) = unbounded();
        let mut r = Reconciler::new(AirportRegistry::builtin(), RecordingSink::default());

        tx.send(EngineCommand::Select("bbb002".to_string())).unwrap();
        tx.send(EngineCommand::Cycle(Snapshot::Observed(vec![sample("aaa001"), sample("bbb002")])))
            .unwrap();
        tx.send(EngineCommand::Cycle(Snapshot::Unavailable)).unwrap();
        tx.send(EngineCommand::Shutdown).unwrap();
        // never reached
        tx.send(EngineCommand::ClearSelection).unwrap();

        run_engine(rx, &mut r).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.selected(), Some("bbb002"));
        assert_eq!(r.sink().count(|c| *c == SinkCall::HideDetail), 0);
    }

    #[test]
    fn test_stops_when_channel_closes() {
        let (tx, rx) = unbounded();
        let mut r = Reconciler::new(AirportRegistry::builtin(), RecordingSink::default());
        tx.send(EngineCommand::Cycle(Snapshot::Observed(vec![sample("aaa001")]))).unwrap();
        tx.send(EngineCommand::ClearSelection).unwrap();
        drop(tx);

        run_engine(rx, &mut r).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.sink().count(|c| *c == SinkCall::HideDetail), 1);
    }

    #[test]
    fn test_invariant_violation_stops_engine() {
        let (tx, rx) = unbounded();
        let mut r = Reconciler::new(AirportRegistry::builtin(), RecordingSink::default());
        r.process_cycle(Snapshot::Observed(vec![sample("aaa001"), sample("bbb002")]))
            .unwrap();
        r.select("aaa001");
        r.entity_mut("bbb002").unwrap().is_selected = true;

        tx.send(EngineCommand::Cycle(Snapshot::Observed(vec![sample("aaa001"), sample("bbb002")])))
            .unwrap();
        tx.send(EngineCommand::ClearSelection).unwrap();

        let result = run_engine(rx.clone(), &mut r);
        assert!(matches!(result, Err(TrackerError::InvariantViolation(_))));
        // the command queued behind the failing cycle is never applied
        assert_eq!(r.selected(), Some("aaa001"));
        assert_eq!(tx.len(), 1);
    }
}
