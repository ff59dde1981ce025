use std::time::Duration;

/// A deferred callback that can be cancelled or superseded.
///
/// Every [`DeferredTimer::schedule`] or [`DeferredTimer::cancel`] bumps the
/// generation, so a sleep that was started earlier wakes up holding a stale
/// token and [`DeferredTimer::fire`] turns it into a no-op.
#[derive(Debug, Default)]
pub struct DeferredTimer {
    generation: u64,
    armed: bool,
}

impl DeferredTimer {
    pub fn schedule<M>(&mut self, delay: Duration, on_fire: fn(u64) -> M) -> iced::Task<M>
    where
        M: Send + 'static,
    {
        self.generation += 1;
        self.armed = true;
        let token = self.generation;
        iced::Task::perform(
            async move { tokio::time::sleep(delay).await },
            move |_| on_fire(token),
        )
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    /// Returns true exactly once for the latest scheduled token.
    pub fn fire(&mut self, token: u64) -> bool {
        if self.armed && token == self.generation {
            self.armed = false;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<u64> {
        self.armed.then_some(self.generation)
    }
}
