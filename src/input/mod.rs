pub mod gesture;
pub mod handler;

pub use gesture::{GestureConfig, GestureInterpreter, Intent, ItemMode, Key};
pub use handler::{handle_key, handle_mouse, PointerPress};
