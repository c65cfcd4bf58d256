//! Undo/redo history
//!
//! Two bounded stacks plus a bounded audit log. Every action stores full
//! object snapshots, and replay resolves its target by [`ObjectId`], so an
//! action stays correct after unrelated removals have shifted storage.
//! Edits write back only the fields their kind covers.

use super::{
    object::{ObjectId, ObjectSnapshot, SceneObject},
    object_manager::ObjectManager,
    scene::{RenderOption, RenderSettings},
};

/// Maximum depth of each stack and of the audit log
pub const MAX_ACTIONS: usize = 100;

/// A reversible mutation and the state needed to apply it in either direction
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Add {
        new: ObjectSnapshot,
    },
    Remove {
        previous: ObjectSnapshot,
    },
    Transform {
        previous: ObjectSnapshot,
        new: ObjectSnapshot,
    },
    Recolor {
        previous: ObjectSnapshot,
        new: ObjectSnapshot,
    },
    /// Shading flags, texture or material changed
    Restyle {
        previous: ObjectSnapshot,
        new: ObjectSnapshot,
    },
    OptionToggle {
        option: RenderOption,
        previous: bool,
        new: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    /// Storage position when recorded; informational only
    pub object_index: Option<usize>,
    pub description: String,
}

impl Action {
    pub fn add(new: ObjectSnapshot, index: usize) -> Self {
        Self {
            description: format!("Added {}", new.name),
            kind: ActionKind::Add { new },
            object_index: Some(index),
        }
    }

    pub fn remove(previous: ObjectSnapshot, index: usize) -> Self {
        Self {
            description: format!("Removed {}", previous.name),
            kind: ActionKind::Remove { previous },
            object_index: Some(index),
        }
    }

    pub fn transform(previous: ObjectSnapshot, new: ObjectSnapshot, index: usize) -> Self {
        Self {
            description: format!("Transformed {}", new.name),
            kind: ActionKind::Transform { previous, new },
            object_index: Some(index),
        }
    }

    pub fn recolor(previous: ObjectSnapshot, new: ObjectSnapshot, index: usize) -> Self {
        Self {
            description: format!("Changed color of {}", new.name),
            kind: ActionKind::Recolor { previous, new },
            object_index: Some(index),
        }
    }

    pub fn restyle(previous: ObjectSnapshot, new: ObjectSnapshot, index: usize) -> Self {
        Self {
            description: format!("Changed shading of {}", new.name),
            kind: ActionKind::Restyle { previous, new },
            object_index: Some(index),
        }
    }

    pub fn toggle(option: RenderOption, previous: bool, new: bool) -> Self {
        Self {
            description: format!("Toggled {} to {}", option.label(), new),
            kind: ActionKind::OptionToggle {
                option,
                previous,
                new,
            },
            object_index: None,
        }
    }

    /// The object this action targets, if any
    pub fn object_id(&self) -> Option<ObjectId> {
        match &self.kind {
            ActionKind::Add { new } => Some(new.id),
            ActionKind::Remove { previous } => Some(previous.id),
            ActionKind::Transform { new, .. }
            | ActionKind::Recolor { new, .. }
            | ActionKind::Restyle { new, .. } => Some(new.id),
            ActionKind::OptionToggle { .. } => None,
        }
    }

    /// Copies only the fields this action changed from `source` onto the live object
    fn write_fields(&self, objects: &mut ObjectManager, source: &ObjectSnapshot) -> bool {
        let Some(mut live) = objects.find(source.id).map(SceneObject::snapshot) else {
            return false;
        };
        match &self.kind {
            ActionKind::Transform { .. } => live.transform = source.transform,
            ActionKind::Recolor { .. } => live.color = source.color,
            ActionKind::Restyle { .. } => {
                live.shading = source.shading;
                live.texture = source.texture;
                live.material = source.material;
            }
            _ => return false,
        }
        objects.update_object(&live)
    }

    fn revert(&self, objects: &mut ObjectManager, settings: &mut RenderSettings) -> bool {
        match &self.kind {
            ActionKind::Add { new } => objects.remove_by_id(new.id).is_some(),
            ActionKind::Remove { previous } => objects.insert_snapshot(previous.clone()),
            ActionKind::Transform { previous, .. }
            | ActionKind::Recolor { previous, .. }
            | ActionKind::Restyle { previous, .. } => self.write_fields(objects, previous),
            ActionKind::OptionToggle {
                option, previous, ..
            } => {
                settings.set(*option, *previous);
                true
            }
        }
    }

    fn reapply(&self, objects: &mut ObjectManager, settings: &mut RenderSettings) -> bool {
        match &self.kind {
            ActionKind::Add { new } => objects.insert_snapshot(new.clone()),
            ActionKind::Remove { previous } => objects.remove_by_id(previous.id).is_some(),
            ActionKind::Transform { new, .. }
            | ActionKind::Recolor { new, .. }
            | ActionKind::Restyle { new, .. } => self.write_fields(objects, new),
            ActionKind::OptionToggle { option, new, .. } => {
                settings.set(*option, *new);
                true
            }
        }
    }
}

pub struct ActionHistory {
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    log: Vec<String>,
    capacity: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(MAX_ACTIONS)
    }
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            log: Vec::new(),
            capacity,
        }
    }

    /// Records a freshly performed action
    ///
    /// Always invalidates the redo branch. When a stack or the log is full the
    /// entry is dropped; nothing older is evicted.
    pub fn record(&mut self, action: Action) {
        self.redo_stack.clear();

        if self.log.len() < self.capacity {
            self.log.push(action.description.clone());
        }

        if self.undo_stack.len() >= self.capacity {
            log::warn!(
                "Undo history full ({} actions), '{}' cannot be undone",
                self.capacity,
                action.description
            );
            return;
        }

        log::debug!("Recorded: {}", action.description);
        self.undo_stack.push(action);
    }

    /// Reverts the most recent action; returns false if there was nothing to undo
    pub fn undo(&mut self, objects: &mut ObjectManager, settings: &mut RenderSettings) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };

        if !action.revert(objects, settings) {
            log::warn!("Undo of '{}' found nothing to change", action.description);
        }
        log::debug!("Undone: {}", action.description);

        if self.redo_stack.len() < self.capacity {
            self.redo_stack.push(action);
        }
        true
    }

    /// Re-applies the most recently undone action; returns false if there was nothing to redo
    pub fn redo(&mut self, objects: &mut ObjectManager, settings: &mut RenderSettings) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };

        if !action.reapply(objects, settings) {
            log::warn!("Redo of '{}' found nothing to change", action.description);
        }
        log::debug!("Redone: {}", action.description);

        // Unlike record, this must keep the rest of the redo branch
        if self.undo_stack.len() < self.capacity {
            self.undo_stack.push(action);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&Action> {
        self.undo_stack.last()
    }

    /// Descriptions of every recorded action, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{
        object::{Shape, Transform},
        object_manager::ObjectSpec,
    };
    use cgmath::Vector3;

    fn add_cube(objects: &mut ObjectManager, history: &mut ActionHistory, x: f32) -> ObjectId {
        let id = objects
            .add_object(ObjectSpec::new(
                Shape::Cube,
                Transform::at(Vector3::new(x, 0.0, 0.0)),
            ))
            .unwrap();
        let index = objects.index_of(id).unwrap();
        history.record(Action::add(objects.find(id).unwrap().snapshot(), index));
        id
    }

    #[test]
    fn test_add_undo_redo_restores_same_id() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        for i in 0..4 {
            add_cube(&mut objects, &mut history, i as f32);
        }
        let id = add_cube(&mut objects, &mut history, 7.0);
        assert_eq!(id.value(), 5);
        let before = objects.find(id).unwrap().snapshot();

        assert!(history.undo(&mut objects, &mut settings));
        assert_eq!(objects.len(), 4);
        assert!(objects.find(id).is_none());

        assert!(history.redo(&mut objects, &mut settings));
        assert_eq!(objects.len(), 5);
        assert_eq!(objects.find(id).unwrap().snapshot(), before);
    }

    #[test]
    fn test_undo_targets_id_after_compaction() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        let first = add_cube(&mut objects, &mut history, 0.0);
        let second = add_cube(&mut objects, &mut history, 1.0);

        // Shift the second object down to index 0 outside the history
        objects.remove_by_id(first);

        assert!(history.undo(&mut objects, &mut settings));
        assert!(objects.find(second).is_none());
        assert!(objects.is_empty());
    }

    #[test]
    fn test_remove_then_undo_reinserts_snapshot() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        let id = add_cube(&mut objects, &mut history, 3.0);
        let index = objects.index_of(id).unwrap();
        let removed = objects.remove_object(index).unwrap();
        history.record(Action::remove(removed.clone(), index));

        history.undo(&mut objects, &mut settings);
        assert_eq!(objects.find(id).unwrap().snapshot(), removed);

        history.redo(&mut objects, &mut settings);
        assert!(objects.find(id).is_none());
    }

    #[test]
    fn test_transform_and_recolor_round_trip() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        let id = add_cube(&mut objects, &mut history, 0.0);
        let previous = objects.find(id).unwrap().snapshot();

        let mut moved = previous.clone();
        moved.transform.position = Vector3::new(4.0, 5.0, 6.0);
        objects.update_object(&moved);
        history.record(Action::transform(previous.clone(), moved.clone(), 0));

        let mut tinted = moved.clone();
        tinted.color = [0.2, 0.4, 0.6, 0.5];
        objects.update_object(&tinted);
        history.record(Action::recolor(moved.clone(), tinted.clone(), 0));

        history.undo(&mut objects, &mut settings);
        assert_eq!(objects.find(id).unwrap().snapshot(), moved);
        history.undo(&mut objects, &mut settings);
        assert_eq!(objects.find(id).unwrap().snapshot(), previous);

        history.redo(&mut objects, &mut settings);
        history.redo(&mut objects, &mut settings);
        assert_eq!(objects.find(id).unwrap().snapshot(), tinted);
    }

    #[test]
    fn test_replay_writes_only_the_action_fields() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        let id = add_cube(&mut objects, &mut history, 0.0);
        let previous = objects.find(id).unwrap().snapshot();
        let mut tinted = previous.clone();
        tinted.color = [0.0, 0.0, 1.0, 1.0];
        objects.update_object(&tinted);
        history.record(Action::recolor(previous.clone(), tinted.clone(), 0));

        // An edit the history never saw
        let mut moved = tinted.clone();
        moved.transform.position = Vector3::new(0.0, 3.0, 0.0);
        moved.shading.use_lighting = false;
        objects.update_object(&moved);

        history.undo(&mut objects, &mut settings);
        let live = objects.find(id).unwrap().snapshot();
        assert_eq!(live.color, previous.color);
        assert_eq!(live.transform, moved.transform);
        assert!(!live.shading.use_lighting);

        history.redo(&mut objects, &mut settings);
        let live = objects.find(id).unwrap().snapshot();
        assert_eq!(live, moved);
    }

    #[test]
    fn test_new_action_invalidates_redo() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        add_cube(&mut objects, &mut history, 0.0);
        add_cube(&mut objects, &mut history, 1.0);
        history.undo(&mut objects, &mut settings);
        assert!(history.can_redo());

        add_cube(&mut objects, &mut history, 2.0);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut objects, &mut settings));
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_redo_keeps_remaining_redo_branch() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        add_cube(&mut objects, &mut history, 0.0);
        add_cube(&mut objects, &mut history, 1.0);
        history.undo(&mut objects, &mut settings);
        history.undo(&mut objects, &mut settings);

        assert!(history.redo(&mut objects, &mut settings));
        assert!(history.can_redo());
        assert!(history.redo(&mut objects, &mut settings));
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();
        assert!(!history.undo(&mut objects, &mut settings));
        assert!(!history.redo(&mut objects, &mut settings));
    }

    #[test]
    fn test_overflow_drops_new_actions() {
        let mut history = ActionHistory::new(2);
        for option in [
            RenderOption::Textures,
            RenderOption::Colors,
            RenderOption::Lighting,
        ] {
            history.record(Action::toggle(option, true, false));
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.entries().count(), 2);
        assert_eq!(
            history.peek_undo().map(|a| &a.kind),
            Some(&ActionKind::OptionToggle {
                option: RenderOption::Colors,
                previous: true,
                new: false
            })
        );
    }

    #[test]
    fn test_option_toggle_replay() {
        let mut objects = ObjectManager::default();
        let mut history = ActionHistory::default();
        let mut settings = RenderSettings::default();

        settings.set(RenderOption::Lighting, false);
        history.record(Action::toggle(RenderOption::Lighting, true, false));

        history.undo(&mut objects, &mut settings);
        assert!(settings.lighting_enabled);
        history.redo(&mut objects, &mut settings);
        assert!(!settings.lighting_enabled);
        assert_eq!(history.entries().next(), Some("Toggled Lighting to false"));
    }
}
