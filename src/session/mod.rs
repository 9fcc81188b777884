//! Session module: the shared session record, settlement polling and the scheduler

pub mod events;
pub mod poller;
pub mod scheduler;
pub mod state;

pub use events::{FinalReport, SessionEvent, SettlementReport};
pub use poller::{PollOutcome, SettlementPoller};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerTask, TickOutcome};
pub use state::{SessionConfig, SessionHandle, SessionPhase, SessionState};
