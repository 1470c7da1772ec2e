//! Deferred single-shot tasks.
//!
//! Two things happen "later" in the controller: the web lets go on its own
//! after a while, and a hard landing locks the actor out of the grounded mode
//! until the recovery animation has played. Each is keyed by a
//! [`DeferredTask`]; scheduling a task that is already pending restarts it.

use std::time::Duration;

use bevy::prelude::*;

/// Purpose of a deferred task.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredTask {
    /// Let go of the web.
    WebRelease,
    /// Finish a hard landing and become grounded.
    LandingRecovery,
}

/// Pending deferred tasks of one actor.
#[derive(Debug, Clone, Default)]
pub struct DeferredTasks {
    web_release: Option<Timer>,
    landing_recovery: Option<Timer>,
}

impl DeferredTasks {
    fn slot(&self, task: DeferredTask) -> &Option<Timer> {
        match task {
            DeferredTask::WebRelease => &self.web_release,
            DeferredTask::LandingRecovery => &self.landing_recovery,
        }
    }

    fn slot_mut(&mut self, task: DeferredTask) -> &mut Option<Timer> {
        match task {
            DeferredTask::WebRelease => &mut self.web_release,
            DeferredTask::LandingRecovery => &mut self.landing_recovery,
        }
    }

    /// Schedule `task` to fire after `seconds`, replacing any pending one.
    pub fn schedule(&mut self, task: DeferredTask, seconds: f32) {
        *self.slot_mut(task) = Some(Timer::from_seconds(seconds, TimerMode::Once));
    }

    /// Cancel `task` if pending.
    pub fn cancel(&mut self, task: DeferredTask) {
        *self.slot_mut(task) = None;
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.web_release = None;
        self.landing_recovery = None;
    }

    pub fn is_pending(&self, task: DeferredTask) -> bool {
        self.slot(task).is_some()
    }

    /// Seconds left before `task` fires.
    pub fn remaining(&self, task: DeferredTask) -> Option<f32> {
        self.slot(task).as_ref().map(|timer| timer.remaining_secs())
    }

    /// Advance all pending tasks and return the ones that fired.
    ///
    /// Fired tasks are removed. Web release is reported before landing
    /// recovery when both fire on the same tick.
    pub fn tick(&mut self, delta: Duration) -> Vec<DeferredTask> {
        let mut fired = Vec::new();
        for task in [DeferredTask::WebRelease, DeferredTask::LandingRecovery] {
            let slot = self.slot_mut(task);
            let finished = match slot.as_mut() {
                Some(timer) => {
                    timer.tick(delta);
                    timer.finished()
                }
                None => false,
            };
            if finished {
                *slot = None;
                fired.push(task);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_pending_by_default() {
        let mut tasks = DeferredTasks::default();
        assert!(!tasks.is_pending(DeferredTask::WebRelease));
        assert!(tasks.tick(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn task_fires_once_after_its_delay() {
        let mut tasks = DeferredTasks::default();
        tasks.schedule(DeferredTask::LandingRecovery, 0.5);

        assert!(tasks.tick(Duration::from_millis(400)).is_empty());
        assert_eq!(
            tasks.tick(Duration::from_millis(150)),
            vec![DeferredTask::LandingRecovery]
        );
        assert!(!tasks.is_pending(DeferredTask::LandingRecovery));
        assert!(tasks.tick(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn rescheduling_restarts_the_delay() {
        let mut tasks = DeferredTasks::default();
        tasks.schedule(DeferredTask::WebRelease, 2.0);
        assert!(tasks.tick(Duration::from_millis(1500)).is_empty());

        tasks.schedule(DeferredTask::WebRelease, 2.0);
        assert!(tasks.tick(Duration::from_millis(1500)).is_empty());
        assert_eq!(
            tasks.tick(Duration::from_millis(600)),
            vec![DeferredTask::WebRelease]
        );
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut tasks = DeferredTasks::default();
        tasks.schedule(DeferredTask::WebRelease, 0.1);
        tasks.cancel(DeferredTask::WebRelease);
        assert!(tasks.tick(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn tasks_are_independent() {
        let mut tasks = DeferredTasks::default();
        tasks.schedule(DeferredTask::WebRelease, 2.0);
        tasks.schedule(DeferredTask::LandingRecovery, 0.5);

        assert_eq!(
            tasks.tick(Duration::from_secs(1)),
            vec![DeferredTask::LandingRecovery]
        );
        assert!(tasks.is_pending(DeferredTask::WebRelease));
        let remaining = tasks.remaining(DeferredTask::WebRelease).unwrap();
        assert!((remaining - 1.0).abs() < 1e-3);
    }
}
