// interact/mod.rs
//
// Interactive state that lives beside the scene: annotations and their
// creation flow, selection, and the measure tool. Undo/redo history lives in
// commands/ next to the processor it complements.

pub mod drawing;
pub mod interaction;
pub mod measure;
pub mod selection;

pub use drawing::{Drawing, DrawingStore, DrawingType};
pub use interaction::{DrawingInteraction, DrawingMode};
pub use measure::{MeasureResult, MeasureState};
pub use selection::{SelectionKey, SelectionMode, SelectionState};
