pub mod clock;
pub mod mutation;
pub mod store;
pub mod task;
pub mod undo;
pub mod views;

pub use clock::{Clock, SystemClock};
pub use mutation::{apply_mutations, Mutation};
pub use store::TaskStore;
pub use task::{Task, TaskPatch};
pub use undo::{UndoAction, UndoLog};
pub use views::{derive_views, TaskViews};
