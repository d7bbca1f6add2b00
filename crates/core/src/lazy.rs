use std::fmt;
use std::sync::OnceLock;

type Init<T> = Box<dyn Fn() -> T + Send + Sync>;

enum State<T> {
    Ready(T),
    Lazy { cell: OnceLock<T>, init: Init<T> },
}

/// A value built on first use, at most once, even when several threads race
/// for the first access.
pub struct LazyModel<T> {
    state: State<T>,
}

impl<T> LazyModel<T> {
    pub fn new(init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            state: State::Lazy {
                cell: OnceLock::new(),
                init: Box::new(init),
            },
        }
    }

    /// Wraps an already constructed value.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(value),
        }
    }

    pub fn get(&self) -> &T {
        match &self.state {
            State::Ready(value) => value,
            State::Lazy { cell, init } => cell.get_or_init(|| init()),
        }
    }

    fn loaded(&self) -> Option<&T> {
        match &self.state {
            State::Ready(value) => Some(value),
            State::Lazy { cell, .. } => cell.get(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModel")
            .field("value", &self.loaded())
            .finish()
    }
}
