// Purpose: the playable surface - note table and key routing

pub mod input;
pub mod notes;

pub use input::{Action, InputRouter, Routed};
pub use notes::{Note, UnknownNote, NOTE_COUNT};
