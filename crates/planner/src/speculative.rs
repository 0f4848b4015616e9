use std::future::Future;

/// A value shown before the backend confirms it.
///
/// [`Speculative::apply_speculative`] shows the new value at once and goes
/// back to exactly the previous one if the save fails.
#[derive(Clone, Debug, PartialEq)]
pub struct Speculative<T> {
    confirmed: T,
    current: T,
    pending: bool,
}

impl<T: Clone> Speculative<T> {
    pub fn new(value: T) -> Self {
        Self {
            confirmed: value.clone(),
            current: value,
            pending: false,
        }
    }

    /// The value to display.
    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn apply(&mut self, value: T) {
        self.current = value;
        self.pending = true;
    }

    pub fn confirm(&mut self, value: T) {
        self.confirmed = value.clone();
        self.current = value;
        self.pending = false;
    }

    pub fn revert(&mut self) {
        self.current = self.confirmed.clone();
        self.pending = false;
    }

    /// Applies `value`, then awaits `save`. The saved value returned by the
    /// backend becomes the confirmed one; an error reverts.
    pub async fn apply_speculative<F, Fut, E>(&mut self, value: T, save: F) -> Result<(), E>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.apply(value.clone());
        match save(value).await {
            Ok(saved) => {
                self.confirm(saved);
                Ok(())
            }
            Err(err) => {
                self.revert();
                Err(err)
            }
        }
    }
}
