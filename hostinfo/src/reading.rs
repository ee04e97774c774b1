use serde::Serialize;

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The OS answered the query.
    Measured,
    /// The query failed or was unavailable; the value is a default.
    Fallback,
}

/// A best-effort value tagged with its [`Origin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Reading<T> {
    pub fn measured(value: T) -> Self {
        Self { value, origin: Origin::Measured }
    }

    pub fn fallback(value: T) -> Self {
        Self { value, origin: Origin::Fallback }
    }

    pub fn is_measured(&self) -> bool {
        self.origin == Origin::Measured
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        Reading { value: f(self.value), origin: self.origin }
    }
}
