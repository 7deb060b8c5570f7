/// Generic undo/redo stack for user-facing actions.
///
/// Deliberately not tied to the command processor: this tracks higher-level
/// operations (adding/removing drawings and the like) that the user may want
/// to step back through.
pub struct UndoableAction {
    /// Human-readable description, for menus and tooltips.
    pub description: String,
    /// Apply the action. Also used for redo.
    pub execute: Box<dyn FnMut()>,
    /// Reverse the action.
    pub undo: Box<dyn FnMut()>,
}

impl UndoableAction {
    pub fn new(
        description: impl Into<String>,
        execute: impl FnMut() + 'static,
        undo: impl FnMut() + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            execute: Box::new(execute),
            undo: Box::new(undo),
        }
    }
}

#[derive(Default)]
pub struct CommandHistory {
    undo_stack: Vec<UndoableAction>,
    redo_stack: Vec<UndoableAction>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run an action and push it onto the undo stack. A new action
    /// invalidates the redo branch.
    pub fn execute(&mut self, mut action: UndoableAction) {
        (action.execute)();
        self.undo_stack.push(action);
        self.redo_stack.clear();
    }

    /// Undo the most recent action. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        let Some(mut action) = self.undo_stack.pop() else {
            return false;
        };
        (action.undo)();
        self.redo_stack.push(action);
        true
    }

    /// Redo the most recently undone action. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(mut action) = self.redo_stack.pop() else {
            return false;
        };
        (action.execute)();
        self.undo_stack.push(action);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|a| a.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|a| a.description.as_str())
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter_action(value: Rc<RefCell<i32>>, delta: i32, desc: &str) -> UndoableAction {
        let v1 = Rc::clone(&value);
        let v2 = Rc::clone(&value);
        UndoableAction::new(
            desc,
            move || *v1.borrow_mut() += delta,
            move || *v2.borrow_mut() -= delta,
        )
    }

    #[test]
    fn execute_undo_redo_cycle() {
        let value = Rc::new(RefCell::new(0));
        let mut history = CommandHistory::new();

        history.execute(counter_action(Rc::clone(&value), 5, "add 5"));
        assert_eq!(*value.borrow(), 5);
        assert_eq!(history.undo_count(), 1);

        assert!(history.undo());
        assert_eq!(*value.borrow(), 0);
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(*value.borrow(), 5);
        assert_eq!(history.undo_description(), Some("add 5"));
    }

    #[test]
    fn undo_redo_on_empty_stacks_return_false() {
        let mut history = CommandHistory::new();
        assert!(!history.undo());
        assert!(!history.redo());
    }

    #[test]
    fn new_action_clears_redo_branch() {
        let value = Rc::new(RefCell::new(0));
        let mut history = CommandHistory::new();
        history.execute(counter_action(Rc::clone(&value), 1, "a"));
        history.execute(counter_action(Rc::clone(&value), 10, "b"));
        history.undo();
        assert!(history.can_redo());

        history.execute(counter_action(Rc::clone(&value), 100, "c"));
        assert!(!history.can_redo());
        assert_eq!(*value.borrow(), 101);
    }

    #[test]
    fn undoable_drawing_round_trip() {
        use crate::interact::DrawingStore;

        let store = Rc::new(RefCell::new(DrawingStore::new()));
        let mut history = CommandHistory::new();

        let created = Rc::new(RefCell::new(0u32));
        let (s1, s2) = (Rc::clone(&store), Rc::clone(&store));
        let (c1, c2) = (Rc::clone(&created), Rc::clone(&created));
        history.execute(UndoableAction::new(
            "add trendline",
            move || {
                let id = s1.borrow_mut().add_trendline(10.0, 50.0, 20.0, 60.0);
                *c1.borrow_mut() = id;
            },
            move || {
                let id = *c2.borrow();
                s2.borrow_mut().remove(id);
            },
        ));
        assert_eq!(store.borrow().count(), 1);

        assert!(history.undo());
        assert_eq!(store.borrow().count(), 0);

        assert!(history.redo());
        assert_eq!(store.borrow().count(), 1);
        let id = *created.borrow();
        let store_ref = store.borrow();
        let d = store_ref.get(id).expect("redone trendline");
        assert_eq!((d.x0, d.y0, d.x1, d.y1), (10.0, 50.0, 20.0, 60.0));
        drop(store_ref);

        // A fresh action after undo clears the redo branch.
        history.undo();
        let s3 = Rc::clone(&store);
        let s4 = Rc::clone(&store);
        let level = Rc::new(RefCell::new(0u32));
        let (l1, l2) = (Rc::clone(&level), Rc::clone(&level));
        history.execute(UndoableAction::new(
            "add level",
            move || *l1.borrow_mut() = s3.borrow_mut().add_horizontal_level(42.0),
            move || {
                let id = *l2.borrow();
                s4.borrow_mut().remove(id);
            },
        ));
        assert!(!history.can_redo());
    }

    #[test]
    fn clear_drops_everything() {
        let value = Rc::new(RefCell::new(0));
        let mut history = CommandHistory::new();
        history.execute(counter_action(Rc::clone(&value), 1, "a"));
        history.undo();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
