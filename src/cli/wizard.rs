// Wizard engine
//
// Generic named-step state machine shared by every setup flow. Steps are
// plain data; the engine only tracks which one is current and notifies
// observers when that changes.

use crate::errors::OmniError;

/// One named step holding flow-specific content
#[derive(Debug, Clone)]
pub struct WizardStep<S> {
    pub id: String,
    pub content: S,
}

impl<S> WizardStep<S> {
    pub fn new(id: impl Into<String>, content: S) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }
}

type StepChangeHook = Box<dyn FnMut(&str)>;
type Hook = Box<dyn FnMut()>;

/// Ordered list of steps plus the current position
pub struct Wizard<S> {
    steps: Vec<WizardStep<S>>,
    current_step_id: String,
    on_step_change: Option<StepChangeHook>,
    on_complete: Option<Hook>,
    on_cancel: Option<Hook>,
}

impl<S> Wizard<S> {
    /// Build a wizard starting at `initial` (or the first step)
    pub fn new(steps: Vec<WizardStep<S>>, initial: Option<&str>) -> Result<Self, OmniError> {
        let first = steps.first().ok_or(OmniError::EmptyWizard)?.id.clone();

        let current_step_id = match initial {
            Some(id) if steps.iter().any(|s| s.id == id) => id.to_string(),
            Some(id) => return Err(OmniError::UnknownStep(id.to_string())),
            None => first,
        };

        Ok(Self {
            steps,
            current_step_id,
            on_step_change: None,
            on_complete: None,
            on_cancel: None,
        })
    }

    pub fn on_step_change(mut self, hook: impl FnMut(&str) + 'static) -> Self {
        self.on_step_change = Some(Box::new(hook));
        self
    }

    pub fn on_complete(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    pub fn on_cancel(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// Announce the initial step to the step-change observer
    pub fn start(&mut self) {
        self.notify();
    }

    pub fn steps(&self) -> &[WizardStep<S>] {
        &self.steps
    }

    pub fn current_step_id(&self) -> &str {
        &self.current_step_id
    }

    /// Position of the current step; duplicate ids resolve to the first
    pub fn current_step_index(&self) -> Option<usize> {
        self.index_of(&self.current_step_id)
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step_index() == Some(0)
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step_index() == Some(self.steps.len().saturating_sub(1))
    }

    pub fn current_step(&self) -> Option<&WizardStep<S>> {
        self.current_step_index().map(|i| &self.steps[i])
    }

    pub fn current_step_mut(&mut self) -> Option<&mut WizardStep<S>> {
        let index = self.current_step_index()?;
        self.steps.get_mut(index)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut WizardStep<S>> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn has_step(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Jump to `id`; unknown ids leave the wizard where it is
    pub fn go_to_step(&mut self, id: &str) -> Result<(), OmniError> {
        if !self.has_step(id) {
            tracing::debug!("Ignoring navigation to unknown step {}", id);
            return Err(OmniError::UnknownStep(id.to_string()));
        }
        self.set_current(id.to_string());
        Ok(())
    }

    pub fn go_to_next_step(&mut self) -> Result<(), OmniError> {
        let index = self
            .current_step_index()
            .ok_or_else(|| OmniError::UnknownStep(self.current_step_id.clone()))?;
        let next = self.steps.get(index + 1).ok_or(OmniError::AtLastStep)?;
        let id = next.id.clone();
        self.set_current(id);
        Ok(())
    }

    pub fn go_to_previous_step(&mut self) -> Result<(), OmniError> {
        let index = self
            .current_step_index()
            .ok_or_else(|| OmniError::UnknownStep(self.current_step_id.clone()))?;
        if index == 0 {
            return Err(OmniError::AtFirstStep);
        }
        let id = self.steps[index - 1].id.clone();
        self.set_current(id);
        Ok(())
    }

    /// Fire the completion observer; the current step is unchanged
    pub fn complete_wizard(&mut self) {
        if let Some(hook) = self.on_complete.as_mut() {
            hook();
        }
    }

    /// Fire the cancellation observer; the current step is unchanged
    pub fn cancel_wizard(&mut self) {
        if let Some(hook) = self.on_cancel.as_mut() {
            hook();
        }
    }

    /// Swap in a rebuilt step list
    ///
    /// The current id is kept when it survives; otherwise the wizard moves
    /// to the new first step and notifies.
    pub fn set_steps(&mut self, steps: Vec<WizardStep<S>>) -> Result<(), OmniError> {
        let first = steps.first().ok_or(OmniError::EmptyWizard)?.id.clone();
        self.steps = steps;
        if !self.has_step(&self.current_step_id) {
            self.set_current(first);
        }
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    fn set_current(&mut self, id: String) {
        if id == self.current_step_id {
            return;
        }
        tracing::debug!("Wizard step {} -> {}", self.current_step_id, id);
        self.current_step_id = id;
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(hook) = self.on_step_change.as_mut() {
            hook(&self.current_step_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn steps(ids: &[&str]) -> Vec<WizardStep<()>> {
        ids.iter().map(|id| WizardStep::new(*id, ())).collect()
    }

    fn recorded() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&str)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |id: &str| sink.borrow_mut().push(id.to_string()))
    }

    #[test]
    fn test_new_defaults_to_first_step() {
        let wizard = Wizard::new(steps(&["a", "b"]), None).unwrap();
        assert_eq!(wizard.current_step_id(), "a");
        assert!(wizard.is_first_step());
        assert!(!wizard.is_last_step());
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            Wizard::<()>::new(Vec::new(), None),
            Err(OmniError::EmptyWizard)
        ));
        assert!(matches!(
            Wizard::new(steps(&["a"]), Some("zzz")),
            Err(OmniError::UnknownStep(_))
        ));
    }

    #[test]
    fn test_unknown_step_leaves_state() {
        let mut wizard = Wizard::new(steps(&["a", "b", "c"]), Some("b")).unwrap();
        let err = wizard.go_to_step("nope").unwrap_err();
        assert!(matches!(err, OmniError::UnknownStep(_)));
        assert_eq!(wizard.current_step_id(), "b");
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let mut wizard = Wizard::new(steps(&["a", "b"]), None).unwrap();
        assert!(matches!(wizard.go_to_previous_step(), Err(OmniError::AtFirstStep)));
        assert_eq!(wizard.current_step_id(), "a");

        wizard.go_to_next_step().unwrap();
        assert!(wizard.is_last_step());
        assert!(matches!(wizard.go_to_next_step(), Err(OmniError::AtLastStep)));
        assert_eq!(wizard.current_step_id(), "b");
    }

    #[test]
    fn test_step_change_notifications() {
        let (log, hook) = recorded();
        let mut wizard = Wizard::new(steps(&["a", "b", "c"]), None)
            .unwrap()
            .on_step_change(hook);

        wizard.start();
        wizard.go_to_next_step().unwrap();
        wizard.go_to_step("b").unwrap(); // unchanged, no notification
        wizard.go_to_step("c").unwrap();
        wizard.go_to_previous_step().unwrap();

        assert_eq!(*log.borrow(), vec!["a", "b", "c", "b"]);
    }

    #[test]
    fn test_complete_and_cancel_keep_current_step() {
        let completed = Rc::new(RefCell::new(0));
        let cancelled = Rc::new(RefCell::new(0));
        let (c1, c2) = (completed.clone(), cancelled.clone());

        let mut wizard = Wizard::new(steps(&["a", "b"]), Some("b"))
            .unwrap()
            .on_complete(move || *c1.borrow_mut() += 1)
            .on_cancel(move || *c2.borrow_mut() += 1);

        wizard.complete_wizard();
        wizard.cancel_wizard();

        assert_eq!(*completed.borrow(), 1);
        assert_eq!(*cancelled.borrow(), 1);
        assert_eq!(wizard.current_step_id(), "b");
    }

    #[test]
    fn test_set_steps_keeps_or_resets_current() {
        let (log, hook) = recorded();
        let mut wizard = Wizard::new(steps(&["a", "b", "c"]), Some("b"))
            .unwrap()
            .on_step_change(hook);

        wizard.set_steps(steps(&["a", "b", "d"])).unwrap();
        assert_eq!(wizard.current_step_id(), "b");
        assert!(log.borrow().is_empty());

        wizard.set_steps(steps(&["x", "y"])).unwrap();
        assert_eq!(wizard.current_step_id(), "x");
        assert_eq!(*log.borrow(), vec!["x"]);
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first() {
        let wizard = Wizard::new(steps(&["a", "b", "a"]), Some("a")).unwrap();
        assert_eq!(wizard.current_step_index(), Some(0));
    }
}
