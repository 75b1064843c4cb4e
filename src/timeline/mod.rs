// Purpose: the shared clock every deferred note event runs on

pub mod scheduler;

pub use scheduler::{Due, Scheduler, TimerHandle};
