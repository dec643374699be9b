use bevy::prelude::*;

pub struct CommandHistoryPlugin;

impl Plugin for CommandHistoryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandHistory>()
            .add_systems(Update, handle_undo_redo_keys.run_if(resource_exists::<ButtonInput<KeyCode>>));
    }
}

// ---------------------------------------------------------------------------
// EditorCommand trait
// ---------------------------------------------------------------------------

/// A reversible scene edit. `execute` must be callable again after `undo` (redo).
pub trait EditorCommand: Send + Sync + 'static {
    fn execute(&self, world: &mut World);
    fn undo(&self, world: &mut World);
    fn description(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CommandHistory resource
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
pub struct CommandHistory {
    pub undo_stack: Vec<Box<dyn EditorCommand>>,
    pub redo_stack: Vec<Box<dyn EditorCommand>>,
}

impl CommandHistory {
    /// Record a command whose effect has already been applied to the world.
    pub fn push(&mut self, command: Box<dyn EditorCommand>) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the command `undo` would revert.
    pub fn last_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|cmd| cmd.description())
    }
}

/// Revert the most recent command. Returns false when there was nothing to undo.
pub fn undo(world: &mut World) -> bool {
    // Take ownership to avoid borrow conflict with world
    let Some(command) = world.resource_mut::<CommandHistory>().undo_stack.pop() else {
        return false;
    };
    command.undo(world);
    world.resource_mut::<CommandHistory>().redo_stack.push(command);
    true
}

/// Re-apply the most recently undone command.
pub fn redo(world: &mut World) -> bool {
    let Some(command) = world.resource_mut::<CommandHistory>().redo_stack.pop() else {
        return false;
    };
    command.execute(world);
    world.resource_mut::<CommandHistory>().undo_stack.push(command);
    true
}

// ---------------------------------------------------------------------------
// CommandGroup
// ---------------------------------------------------------------------------

pub struct CommandGroup {
    pub commands: Vec<Box<dyn EditorCommand>>,
    pub label: String,
}

impl EditorCommand for CommandGroup {
    fn execute(&self, world: &mut World) {
        for cmd in &self.commands {
            cmd.execute(world);
        }
    }

    fn undo(&self, world: &mut World) {
        for cmd in self.commands.iter().rev() {
            cmd.undo(world);
        }
    }

    fn description(&self) -> &str {
        &self.label
    }
}

fn handle_undo_redo_keys(world: &mut World) {
    let keyboard = world.resource::<ButtonInput<KeyCode>>();
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let z_pressed = keyboard.just_pressed(KeyCode::KeyZ);

    if !ctrl || !z_pressed {
        return;
    }

    if shift {
        redo(world);
    } else {
        undo(world);
    }
}
