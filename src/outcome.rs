//! Result of a contained operation.

/// Outcome of an operation whose wire failures are absorbed.
///
/// Contained operations never propagate a wire error. They log it and return
/// [`Outcome::Failed`], which keeps an outage distinguishable from a
/// legitimately empty answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The store answered.
    Done(T),
    /// The store answered that nothing is there.
    Empty,
    /// The round trip failed; the message has already been logged.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// `Done` and `Empty` both mean the round trip completed.
    pub fn succeeded(&self) -> bool {
        !self.is_failed()
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Outcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Done(v) => Outcome::Done(f(v)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Failed(msg) => Outcome::Failed(msg),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.ok().unwrap_or(default)
    }
}

impl<T: Default> Outcome<T> {
    /// Collapse to the plain default-value behavior (`false`, `0`, empty).
    pub fn unwrap_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Done(v),
            None => Outcome::Empty,
        }
    }
}
