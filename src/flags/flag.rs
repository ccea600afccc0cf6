/// Flag descriptors.
///
/// A flag is a name, an optional short rune, a value processor run on the
/// tokens that follow it, and a capability set telling the flag processor how
/// the flag may be used.
use std::fmt;

use crate::args::{ArgValue, Argument, Scalar, Transformer, Validator};
use crate::engine::{
    Completer, Completion, Data, Error, ExecuteData, Output, Processor, Result, TokenStream, Usage,
};

/// How a flag may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FlagCapabilities {
    /// May appear in a short-flag bundle such as `-xyz`.
    pub combinable: bool,
    /// May be given more than once.
    pub allows_multiple: bool,
    /// [`FlagInterface::process_missing`] should run when the flag is absent.
    pub missing_handler: bool,
    /// [`FlagInterface::post_process`] should run after every scan.
    pub post_handler: bool,
}

/// A flag as seen by the flag processor.
pub trait FlagInterface {
    /// Long name, without dashes.
    fn name(&self) -> &str;

    /// Short rune, without the dash.
    fn short_name(&self) -> Option<char>;

    fn description(&self) -> &str;

    /// Processor run on the tokens following the flag.
    fn processor(&self) -> &dyn Processor;

    fn capabilities(&self) -> FlagCapabilities;

    /// Called for flags that were never given.
    ///
    /// # Errors
    ///
    /// Returns an error when the fallback value cannot be stored.
    fn process_missing(&self, _data: &mut Data) -> Result<()> {
        Ok(())
    }

    /// Called for every flag once the scan is complete.
    ///
    /// # Errors
    ///
    /// Returns an error when accumulated values are invalid.
    fn post_process(&self, _output: &mut dyn Output, _data: &mut Data) -> Result<()> {
        Ok(())
    }

    /// Usage token, e.g. `--name|-n NAME`.
    fn usage_display(&self) -> String;
}

fn flag_prefix(name: &str, short: Option<char>) -> String {
    match short {
        Some(c) => format!("--{name}|-{c}"),
        None => format!("--{name}"),
    }
}

// --- Value flag ---

/// A flag whose value is parsed by a typed [`Argument`].
pub struct Flag<V> {
    argument: Argument<V>,
    short: Option<char>,
    combinable: bool,
    allows_multiple: bool,
}

impl<V: fmt::Debug> fmt::Debug for Flag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("argument", &self.argument)
            .field("short", &self.short)
            .field("combinable", &self.combinable)
            .field("allows_multiple", &self.allows_multiple)
            .finish()
    }
}

impl<V: ArgValue> Flag<V> {
    /// Flag taking the default arity of `V`.
    #[must_use]
    pub fn new(name: impl Into<String>, short: Option<char>, description: impl Into<String>) -> Self {
        Self::from_argument(Argument::new(name, description), short)
    }
}

impl<V: Clone + fmt::Debug + 'static> Flag<V> {
    /// Flag whose value is parsed by `argument`; the flag takes its name.
    #[must_use]
    pub fn from_argument(argument: Argument<V>, short: Option<char>) -> Self {
        Self {
            argument,
            short,
            combinable: false,
            allows_multiple: false,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: V) -> Self {
        self.argument = self.argument.with_default(value);
        self
    }

    #[must_use]
    pub fn with_arity(mut self, min: usize, optional: Option<usize>) -> Self {
        self.argument = self.argument.with_arity(min, optional);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: Transformer<V>) -> Self {
        self.argument = self.argument.with_transformer(transformer);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator<V>) -> Self {
        self.argument = self.argument.with_validator(validator);
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.argument = self.argument.with_completer(completer);
        self
    }

    /// Allow the flag in short bundles. Only takes effect when the flag
    /// needs no value tokens.
    #[must_use]
    pub fn combinable(mut self) -> Self {
        self.combinable = true;
        self
    }

    /// Allow the flag to be given more than once; the last value wins.
    #[must_use]
    pub fn allow_multiple(mut self) -> Self {
        self.allows_multiple = true;
        self
    }
}

impl<V: Clone + fmt::Debug + 'static> FlagInterface for Flag<V> {
    fn name(&self) -> &str {
        self.argument.name()
    }

    fn short_name(&self) -> Option<char> {
        self.short
    }

    fn description(&self) -> &str {
        self.argument.description()
    }

    fn processor(&self) -> &dyn Processor {
        &self.argument
    }

    fn capabilities(&self) -> FlagCapabilities {
        FlagCapabilities {
            combinable: self.combinable && self.argument.arity().0 == 0,
            allows_multiple: self.allows_multiple,
            missing_handler: true,
            post_handler: false,
        }
    }

    fn process_missing(&self, data: &mut Data) -> Result<()> {
        self.argument.apply_default(data)
    }

    fn usage_display(&self) -> String {
        let prefix = flag_prefix(self.name(), self.short);
        let value = self.argument.usage_display();
        if value.is_empty() {
            prefix
        } else {
            format!("{prefix} {value}")
        }
    }
}

// --- Bool flags ---

/// A flag taking no value: stores `true_value` when given and, if set,
/// `false_value` when absent.
#[derive(Debug, Clone)]
pub struct BoolValuesFlag<T> {
    name: String,
    short: Option<char>,
    description: String,
    true_value: T,
    false_value: Option<T>,
}

/// The common `bool` case: `true` when given, `false` otherwise.
pub type BoolFlag = BoolValuesFlag<bool>;

impl BoolValuesFlag<bool> {
    #[must_use]
    pub fn new(name: impl Into<String>, short: Option<char>, description: impl Into<String>) -> Self {
        Self::with_values(name, short, description, true, Some(false))
    }
}

impl<T: Clone + fmt::Debug + 'static> BoolValuesFlag<T> {
    #[must_use]
    pub fn with_values(
        name: impl Into<String>,
        short: Option<char>,
        description: impl Into<String>,
        true_value: T,
        false_value: Option<T>,
    ) -> Self {
        Self {
            name: name.into(),
            short,
            description: description.into(),
            true_value,
            false_value,
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> Processor for BoolValuesFlag<T> {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

impl<T: Clone + fmt::Debug + 'static> FlagInterface for BoolValuesFlag<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn short_name(&self) -> Option<char> {
        self.short
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn processor(&self) -> &dyn Processor {
        self
    }

    fn capabilities(&self) -> FlagCapabilities {
        FlagCapabilities {
            combinable: true,
            allows_multiple: false,
            missing_handler: self.false_value.is_some(),
            post_handler: false,
        }
    }

    fn process_missing(&self, data: &mut Data) -> Result<()> {
        if let Some(value) = &self.false_value {
            data.set(self.name.clone(), value.clone());
        }
        Ok(())
    }

    fn usage_display(&self) -> String {
        flag_prefix(&self.name, self.short)
    }
}

// --- Itemized list flag ---

/// Takes one token per occurrence and stores them as one raw list under the
/// flag name until the post-process hook parses it.
struct ItemCollector {
    name: String,
    completer: Option<Box<dyn Completer>>,
}

impl ItemCollector {
    fn pop_item(&self, input: &mut TokenStream, data: &Data) -> Result<String> {
        let (mut tokens, _) = input.pop_n(1, Some(0), &[], data);
        tokens.pop().ok_or_else(|| Error::NotEnoughArgs {
            name: self.name.clone(),
            min: 1,
            got: 0,
        })
    }

    fn push_raw(&self, data: &mut Data, item: String) {
        match data.get_mut::<Vec<String>>(&self.name) {
            Some(items) => items.push(item),
            None => data.set(self.name.clone(), vec![item]),
        }
    }
}

impl Processor for ItemCollector {
    fn execute(
        &self,
        input: &mut TokenStream,
        _output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        let item = self.pop_item(input, data)?;
        self.push_raw(data, item);
        Ok(())
    }

    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        let last = input.len() == 1;
        let item = self.pop_item(input, data)?;
        if !last {
            self.push_raw(data, item);
            return Ok(None);
        }
        let previous = data.string_list(&self.name).to_vec();
        let completion = match &self.completer {
            Some(completer) => completer.complete(&item, data)?,
            None => None,
        };
        Ok(Some(
            completion
                .unwrap_or_default()
                .for_partial(item)
                .excluding(&previous),
        ))
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

/// A repeatable flag: `-t a -t b` yields the typed list `[a, b]`.
pub struct ItemizedListFlag<T> {
    collector: ItemCollector,
    list: Argument<Vec<T>>,
    short: Option<char>,
}

impl<T: fmt::Debug> fmt::Debug for ItemizedListFlag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemizedListFlag")
            .field("list", &self.list)
            .field("short", &self.short)
            .finish_non_exhaustive()
    }
}

impl<T: Scalar> ItemizedListFlag<T> {
    #[must_use]
    pub fn new(name: impl Into<String>, short: Option<char>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collector: ItemCollector {
                name: name.clone(),
                completer: None,
            },
            list: Argument::new(name, description).with_arity(0, None),
            short,
        }
    }

    /// Validate or transform the combined list.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator<Vec<T>>) -> Self {
        self.list = self.list.with_validator(validator);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: Transformer<Vec<T>>) -> Self {
        self.list = self.list.with_transformer(transformer);
        self
    }

    /// List stored when the flag is never given.
    #[must_use]
    pub fn with_default(mut self, values: Vec<T>) -> Self {
        self.list = self.list.with_default(values);
        self
    }

    /// Completer for each item. Items already given are not re-suggested when
    /// the completion is distinct.
    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.collector.completer = Some(Box::new(completer));
        self
    }
}

impl<T: Scalar> FlagInterface for ItemizedListFlag<T> {
    fn name(&self) -> &str {
        self.list.name()
    }

    fn short_name(&self) -> Option<char> {
        self.short
    }

    fn description(&self) -> &str {
        self.list.description()
    }

    fn processor(&self) -> &dyn Processor {
        &self.collector
    }

    fn capabilities(&self) -> FlagCapabilities {
        FlagCapabilities {
            combinable: false,
            allows_multiple: true,
            missing_handler: false,
            post_handler: true,
        }
    }

    fn post_process(&self, _output: &mut dyn Output, data: &mut Data) -> Result<()> {
        match data.take::<Vec<String>>(self.name()) {
            Some(raw) => self.list.apply_tokens(&raw, data),
            None => self.list.apply_default(data),
        }
    }

    fn usage_display(&self) -> String {
        format!(
            "{} {}",
            flag_prefix(self.name(), self.short),
            self.name().to_uppercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BufferedOutput;

    #[test]
    fn test_usage_display() {
        let f = Flag::<i64>::new("count", Some('c'), "How many");
        assert_eq!(f.usage_display(), "--count|-c COUNT");
        let b = BoolFlag::new("verbose", None, "Chatty");
        assert_eq!(b.usage_display(), "--verbose");
        let t = ItemizedListFlag::<String>::new("tag", Some('t'), "Tags");
        assert_eq!(t.usage_display(), "--tag|-t TAG");
    }

    #[test]
    fn test_combinable_requires_no_values() {
        let f = Flag::<String>::new("s", Some('s'), "").combinable();
        assert!(!f.capabilities().combinable);
        let f = Flag::<String>::new("s", Some('s'), "")
            .with_arity(0, Some(1))
            .combinable();
        assert!(f.capabilities().combinable);
        assert!(BoolFlag::new("b", Some('b'), "").capabilities().combinable);
    }

    #[test]
    fn test_bool_values_flag() {
        let f = BoolValuesFlag::with_values("mode", None, "", "fast".to_owned(), None);
        let mut data = Data::new();
        f.process_missing(&mut data).unwrap();
        assert!(!data.has("mode"));
        f.processor()
            .execute(
                &mut TokenStream::default(),
                &mut BufferedOutput::new(),
                &mut data,
                &mut ExecuteData::new(),
            )
            .unwrap();
        assert_eq!(data.string("mode"), "fast");
    }

    #[test]
    fn test_itemized_post_process_types_the_list() {
        let f = ItemizedListFlag::<u32>::new("n", None, "");
        let mut data = Data::new();
        data.set("n", vec!["1".to_owned(), "2".to_owned()]);
        f.post_process(&mut BufferedOutput::new(), &mut data).unwrap();
        assert_eq!(data.get::<Vec<u32>>("n"), Some(&vec![1, 2]));
    }
}
