pub mod notify;
pub mod scale;
pub mod scheduler;
pub mod step;

pub use notify::{AccentNotice, Notice, NoteNotice, NotificationBus};
pub use scheduler::{LookaheadScheduler, NoteSink, SchedulerClock, SchedulerConfig};
pub use step::{PlaybackMode, SequencerStep};
