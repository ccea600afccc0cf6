/// Transformers rewrite a parsed value before validation.
use std::fmt;

type TransformFn<V> = dyn Fn(V) -> Result<V, String>;

/// A named rewrite of an argument's value.
pub struct Transformer<V> {
    name: String,
    f: Box<TransformFn<V>>,
}

impl<V> fmt::Debug for Transformer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> Transformer<V> {
    /// Transformer named `name` applying `f`.
    #[must_use]
    pub fn new(name: impl Into<String>, f: impl Fn(V) -> Result<V, String> + 'static) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }

    /// Transformer name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the rewrite.
    ///
    /// # Errors
    ///
    /// Returns the transformer's reason when the value cannot be rewritten.
    pub fn apply(&self, value: V) -> Result<V, String> {
        (self.f)(value)
    }
}

/// Uppercase the value.
#[must_use]
pub fn to_upper() -> Transformer<String> {
    Transformer::new("ToUpper", |s: String| Ok(s.to_uppercase()))
}

/// Lowercase the value.
#[must_use]
pub fn to_lower() -> Transformer<String> {
    Transformer::new("ToLower", |s: String| Ok(s.to_lowercase()))
}

/// Strip leading and trailing whitespace.
#[must_use]
pub fn trim() -> Transformer<String> {
    Transformer::new("Trim", |s: String| Ok(s.trim().to_owned()))
}

/// Apply `inner` to every element of a list.
#[must_use]
pub fn for_each<T: 'static>(inner: Transformer<T>) -> Transformer<Vec<T>> {
    let name = format!("ForEach({})", inner.name);
    Transformer::new(name, move |values: Vec<T>| {
        values.into_iter().map(|v| inner.apply(v)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_transformers() {
        assert_eq!(to_upper().apply("abc".to_owned()), Ok("ABC".to_owned()));
        assert_eq!(to_lower().apply("AbC".to_owned()), Ok("abc".to_owned()));
        assert_eq!(trim().apply("  x ".to_owned()), Ok("x".to_owned()));
    }

    #[test]
    fn test_for_each() {
        let t = for_each(to_upper());
        assert_eq!(t.name(), "ForEach(ToUpper)");
        assert_eq!(
            t.apply(vec!["a".to_owned(), "b".to_owned()]),
            Ok(vec!["A".to_owned(), "B".to_owned()])
        );
    }

    #[test]
    fn test_failure_stops_list() {
        let strict = Transformer::new("NonEmpty", |s: String| {
            if s.is_empty() {
                Err("empty value".to_owned())
            } else {
                Ok(s)
            }
        });
        let err = for_each(strict)
            .apply(vec!["a".to_owned(), String::new()])
            .unwrap_err();
        assert_eq!(err, "empty value");
    }
}
