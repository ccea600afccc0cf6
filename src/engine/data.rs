/// Shared per-invocation data store, keyed by argument name.
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// A value that can live in the [`Data`] store.
///
/// Blanket-implemented for every `'static` type that is `Debug`.
pub trait Stored: Any + fmt::Debug {
    /// Upcast for typed lookups.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for typed lookups.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Owned upcast for typed removal.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + fmt::Debug> Stored for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Mapping from argument name to a typed value.
///
/// Each name is normally set once per invocation; later sets overwrite.
#[derive(Debug, Default)]
pub struct Data {
    values: BTreeMap<String, Box<dyn Stored>>,
}

impl Data {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set<T: Any + fmt::Debug>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Whether `key` has a value of any type.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Typed lookup. `None` when absent or stored with a different type.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        let value: &dyn Stored = &**self.values.get(key)?;
        value.as_any().downcast_ref::<T>()
    }

    /// Typed mutable lookup.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        let value = &mut **self.values.get_mut(key)?;
        value.as_any_mut().downcast_mut::<T>()
    }

    /// Remove `key` and return it if it held a `T`.
    ///
    /// A value of another type is left in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        if self.get::<T>(key).is_none() {
            return None;
        }
        let boxed = self.values.remove(key)?;
        boxed.into_any().downcast::<T>().ok().map(|b| *b)
    }

    /// Remove `key` regardless of its type.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Debug rendering of the value under `key`.
    #[must_use]
    pub fn display(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| format!("{v:?}"))
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // --- Typed conveniences ---

    /// The `String` under `key`, or `""`.
    #[must_use]
    pub fn string(&self, key: &str) -> &str {
        self.get::<String>(key).map_or("", String::as_str)
    }

    /// The `Vec<String>` under `key`, or an empty slice.
    #[must_use]
    pub fn string_list(&self, key: &str) -> &[String] {
        self.get::<Vec<String>>(key).map_or(&[], Vec::as_slice)
    }

    /// The `i64` under `key`, or `0`.
    #[must_use]
    pub fn int(&self, key: &str) -> i64 {
        self.get::<i64>(key).copied().unwrap_or_default()
    }

    /// The `bool` under `key`, or `false`.
    #[must_use]
    pub fn bool(&self, key: &str) -> bool {
        self.get::<bool>(key).copied().unwrap_or_default()
    }
}
