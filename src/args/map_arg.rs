/// Map-lookup argument: the user types a key, the graph sees its value.
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::argument::Argument;
use super::validate::Validator;
use crate::engine::{
    Completion, Data, Error, ExecuteData, Output, Processor, Result, SimpleCompleter, TokenStream,
    Usage,
};

/// Data key under which a [`MapArg`] stores the raw key that was typed.
#[must_use]
pub fn key_name(name: &str) -> String {
    format!("{name}.key")
}

/// An argument restricted to the keys of a map.
///
/// Completes over the keys, rejects unknown keys, stores the looked-up value
/// under its own name and the raw key under [`key_name`].
pub struct MapArg<V> {
    inner: Argument<String>,
    values: Rc<BTreeMap<String, V>>,
}

impl<V: fmt::Debug> fmt::Debug for MapArg<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapArg")
            .field("name", &self.inner.name())
            .field("values", &self.values)
            .finish()
    }
}

impl<V: Clone + fmt::Debug + 'static> MapArg<V> {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        values: BTreeMap<String, V>,
    ) -> Self {
        let name = name.into();
        let values = Rc::new(values);
        let keys: Vec<String> = values.keys().cloned().collect();

        let known = Rc::clone(&values);
        let choices = keys.join(" ");
        let is_key = Validator::new("MapKey", move |key: &String, _| {
            if known.contains_key(key) {
                Ok(())
            } else {
                Err(format!("\"{key}\" is not one of [{choices}]"))
            }
        });

        let lookup = Rc::clone(&values);
        let value_name = name.clone();
        let setter = move |key: String, data: &mut Data| -> Result<()> {
            let value = lookup
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::msg(format!("no value for key \"{key}\"")))?;
            data.set(value_name.clone(), value);
            data.set(key_name(&value_name), key);
            Ok(())
        };

        let inner = Argument::<String>::new(name, description)
            .with_validator(is_key)
            .with_completer(SimpleCompleter::new(keys))
            .with_custom_setter(setter);
        Self { inner, values }
    }

    /// Make the key optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.inner = self.inner.optional();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The lookup table.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, V> {
        &self.values
    }
}

impl<V: Clone + fmt::Debug + 'static> Processor for MapArg<V> {
    fn execute(
        &self,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        self.inner.execute(input, output, data, exec)
    }

    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        self.inner.complete(input, data)
    }

    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()> {
        self.inner.usage(input, data, usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BufferedOutput;
    use crate::settings::CompletionSettings;

    fn colors() -> MapArg<u32> {
        let values = BTreeMap::from([
            ("red".to_owned(), 1),
            ("green".to_owned(), 2),
        ]);
        MapArg::new("color", "A color", values)
    }

    #[test]
    fn test_lookup_stores_value_and_key() {
        let mut data = Data::new();
        colors()
            .execute(
                &mut TokenStream::new(["green"]),
                &mut BufferedOutput::new(),
                &mut data,
                &mut ExecuteData::new(),
            )
            .unwrap();
        assert_eq!(data.get::<u32>("color"), Some(&2));
        assert_eq!(data.string("color.key"), "green");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = colors()
            .execute(
                &mut TokenStream::new(["blue"]),
                &mut BufferedOutput::new(),
                &mut Data::new(),
                &mut ExecuteData::new(),
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "validation for \"color\" failed: [MapKey] \"blue\" is not one of [green red]"
        );
    }

    #[test]
    fn test_completes_keys() {
        let completion = colors()
            .complete(&mut TokenStream::new(["r"]), &mut Data::new())
            .unwrap()
            .unwrap();
        assert_eq!(completion.process(&CompletionSettings::default()), ["red"]);
    }
}
