//! A named logical action owning its ordered input bindings.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ActionId;
use crate::bindings::action_input::ActionInput;
use crate::input::device::InputDevice;
use crate::str_intern::intern;

/// Logical action ("jump") with an ordered sequence of bindings. Insertion
/// order matters for iteration and serialization, not for dispatch priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub inputs: Vec<ActionInput>,
    #[serde(skip)]
    pub(crate) num_rebound_inputs: i32,
}

impl Action {
    pub fn new(id: &str) -> Self {
        Action {
            id: intern(id),
            inputs: Vec::new(),
            num_rebound_inputs: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    #[inline]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// How many bindings currently differ from their default token.
    #[inline]
    pub fn num_rebound_inputs(&self) -> i32 {
        self.num_rebound_inputs
    }

    /// Find a binding by its (already normalized) token.
    pub fn find_input(&self, token: &str) -> Option<&ActionInput> {
        self.inputs.iter().find(|i| i.input.as_ref() == token)
    }

    pub(crate) fn find_input_index(&self, token: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.input.as_ref() == token)
    }

    /// Binding at `index` among this action's inputs for `device`, in
    /// insertion order. The array is not sorted by device; the index means
    /// "the n-th one encountered".
    pub fn input_by_device(&self, device: InputDevice, index: usize) -> Option<&ActionInput> {
        self.inputs
            .iter()
            .filter(|i| i.device == device)
            .nth(index)
    }

    pub(crate) fn input_index_by_device(&self, device: InputDevice, index: usize) -> Option<usize> {
        let mut seen = 0usize;
        for (ix, input) in self.inputs.iter().enumerate() {
            if input.device == device {
                if seen == index {
                    return Some(ix);
                }
                seen += 1;
            }
        }
        None
    }

    /// Insert a binding, optionally before the `n`-th existing binding of its
    /// device. Fails (without mutating) on an empty token, a duplicate token,
    /// or an out-of-range device position.
    pub(crate) fn insert_input(
        &mut self,
        input: ActionInput,
        by_device_index: Option<usize>,
    ) -> Result<usize, InsertInputError> {
        if input.input.is_empty() {
            return Err(InsertInputError::EmptyToken);
        }
        if self.find_input(input.input.as_ref()).is_some() {
            return Err(InsertInputError::DuplicateToken);
        }

        match by_device_index {
            None => {
                self.inputs.push(input);
                Ok(self.inputs.len() - 1)
            }
            Some(target) => match self.input_index_by_device(input.device, target) {
                Some(ix) => {
                    self.inputs.insert(ix, input);
                    Ok(ix)
                }
                None => Err(InsertInputError::BadDeviceIndex(target)),
            },
        }
    }

    pub(crate) fn remove_input(&mut self, token: &str) -> bool {
        match self.find_input_index(token) {
            Some(ix) => {
                self.inputs.remove(ix);
                true
            }
            None => false,
        }
    }

    pub(crate) fn recount_rebound_inputs(&mut self) {
        self.num_rebound_inputs = self.inputs.iter().filter(|i| i.is_rebound()).count() as i32;
    }

    /// Tokens this action is currently bound to (non-empty only).
    pub fn bound_tokens(&self) -> impl Iterator<Item = &Arc<str>> {
        self.inputs.iter().filter(|i| i.is_bound()).map(|i| &i.input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertInputError {
    EmptyToken,
    DuplicateToken,
    BadDeviceIndex(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::device::InputDevice;

    #[test]
    fn duplicate_tokens_are_rejected() {
        let mut action = Action::new("jump");
        assert!(
            action
                .insert_input(ActionInput::new("space", InputDevice::Keyboard), None)
                .is_ok()
        );
        assert_eq!(
            action.insert_input(ActionInput::new("SPACE", InputDevice::Keyboard), None),
            Err(InsertInputError::DuplicateToken)
        );
        assert_eq!(action.input_count(), 1);
    }

    #[test]
    fn device_relative_lookup_walks_insertion_order() {
        let mut action = Action::new("fire");
        action
            .insert_input(ActionInput::new("mouse1", InputDevice::Mouse), None)
            .ok();
        action
            .insert_input(ActionInput::new("f", InputDevice::Keyboard), None)
            .ok();
        action
            .insert_input(ActionInput::new("g", InputDevice::Keyboard), None)
            .ok();

        let second_kb = action.input_by_device(InputDevice::Keyboard, 1);
        assert_eq!(second_kb.map(|i| i.input.as_ref()), Some("g"));
        assert!(action.input_by_device(InputDevice::Gamepad, 0).is_none());
    }

    #[test]
    fn insert_before_device_position() {
        let mut action = Action::new("fire");
        action
            .insert_input(ActionInput::new("f", InputDevice::Keyboard), None)
            .ok();
        let ix = action.insert_input(ActionInput::new("g", InputDevice::Keyboard), Some(0));
        assert_eq!(ix, Ok(0));
        assert_eq!(action.inputs[0].input.as_ref(), "g");

        let bad = action.insert_input(ActionInput::new("h", InputDevice::Keyboard), Some(5));
        assert_eq!(bad, Err(InsertInputError::BadDeviceIndex(5)));
        assert_eq!(action.input_count(), 2);
    }
}
