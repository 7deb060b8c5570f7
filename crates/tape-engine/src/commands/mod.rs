pub mod error;
pub mod history;
pub mod processor;

pub use error::{CmdCode, CmdError, CmdOutput, CmdResult};
pub use history::{CommandHistory, UndoableAction};
pub use processor::CommandProcessor;
