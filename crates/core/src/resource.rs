use std::future::Future;

use crate::errors::ApiError;

#[derive(Clone, Debug, PartialEq)]
pub enum Resource<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(ApiError),
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Resource<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Fetch-then-render state shared by every view that loads one remote value.
///
/// Each load is stamped with a ticket; only the most recent ticket may complete, and
/// nothing completes after [`RemoteResource::detach`].
#[derive(Debug)]
pub struct RemoteResource<T> {
    state: Resource<T>,
    generation: u64,
    detached: bool,
}

impl<T> Default for RemoteResource<T> {
    fn default() -> Self {
        Self { state: Resource::Idle, generation: 0, detached: false }
    }
}

impl<T> RemoteResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Resource<T> {
        &self.state
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Starts a load. Returns `None` once the owner has been detached.
    pub fn begin(&mut self) -> Option<LoadTicket> {
        if self.detached {
            return None;
        }
        self.generation += 1;
        self.state = Resource::Loading;
        Some(LoadTicket(self.generation))
    }

    /// Records a result. Returns `false` when the result was discarded as stale.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<T, ApiError>) -> bool {
        if self.detached || ticket.0 != self.generation {
            return false;
        }
        self.state = match result {
            Ok(value) => Resource::Loaded(value),
            Err(error) => Resource::Failed(error),
        };
        true
    }

    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = Resource::Idle;
    }

    pub async fn load<F>(&mut self, fetch: F) -> &Resource<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if let Some(ticket) = self.begin() {
            let result = fetch.await;
            self.complete(ticket, result);
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ApiError;

    use super::{RemoteResource, Resource};

    #[tokio::test]
    async fn load_moves_through_loading_to_loaded() {
        let mut resource = RemoteResource::<u32>::new();
        assert_eq!(resource.state(), &Resource::Idle);

        let state = resource.load(async { Ok(7) }).await;

        assert_eq!(state.value(), Some(&7));
    }

    #[tokio::test]
    async fn failures_are_kept_as_state() {
        let mut resource = RemoteResource::<u32>::new();

        resource.load(async { Err(ApiError::not_found("package", "missing")) }).await;

        assert!(matches!(resource.state().error(), Some(ApiError::NotFound { .. })));
    }

    #[test]
    fn only_latest_ticket_may_complete() {
        let mut resource = RemoteResource::<&str>::new();
        let first = resource.begin().expect("attached");
        let second = resource.begin().expect("attached");

        assert!(!resource.complete(first, Ok("stale")));
        assert!(resource.state().is_loading());
        assert!(resource.complete(second, Ok("fresh")));
        assert_eq!(resource.state().value(), Some(&"fresh"));
    }

    #[test]
    fn detached_resource_ignores_in_flight_results() {
        let mut resource = RemoteResource::<&str>::new();
        let ticket = resource.begin().expect("attached");

        resource.detach();

        assert!(!resource.complete(ticket, Ok("late")));
        assert!(resource.begin().is_none());
        assert!(resource.state().is_loading());
    }
}
