use stepwise_core::Direction;

/// Progress notifications emitted by a verbose runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent<'a> {
    NothingToDo {
        version: u32,
    },
    Started {
        current: u32,
        direction: Direction,
        target: u32,
    },
    UnitStarted {
        unit: &'a str,
        order_key: u32,
        direction: Direction,
    },
    UnitFinished {
        unit: &'a str,
        from: u32,
        to: u32,
    },
    Finished {
        version: u32,
    },
}

/// Receiver of the verbose progress trace.
///
/// `message` is the event rendered through the runner's message catalog.
/// Reports only observe; they cannot influence the run.
pub trait Report {
    fn event(&mut self, event: &ReportEvent<'_>, message: &str);
}

/// Report forwarding every event to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReport;

impl Report for TracingReport {
    fn event(&mut self, event: &ReportEvent<'_>, message: &str) {
        match *event {
            ReportEvent::NothingToDo { version } => {
                tracing::info!(version, "{message}");
            }
            ReportEvent::Started {
                current,
                direction,
                target,
            } => {
                tracing::info!(current, %direction, target, "{message}");
            }
            ReportEvent::UnitStarted {
                unit,
                order_key,
                direction,
            } => {
                tracing::info!(unit, order_key, %direction, "{message}");
            }
            ReportEvent::UnitFinished { unit, from, to } => {
                tracing::info!(unit, from, to, "{message}");
            }
            ReportEvent::Finished { version } => {
                tracing::info!(version, "{message}");
            }
        }
    }
}
