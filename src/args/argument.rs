/// The typed argument leaf.
///
/// An argument consumes between `min` and `min + optional` tokens (the
/// optional part may be unbounded), converts them with its parser, rewrites
/// the value with its transformers, checks it with its validators and stores
/// it in [`Data`] under its name.
use std::fmt;

use super::transform::Transformer;
use super::validate::Validator;
use super::value::{ArgValue, Scalar};
use crate::engine::usage::arity_display;
use crate::engine::{
    Breaker, Completer, Completion, Data, Error, ExecuteData, Output, Processor, Result,
    TokenStream, Usage,
};

type ParseFn<V> = dyn Fn(&[String]) -> std::result::Result<V, String>;
type SetterFn<V> = dyn Fn(V, &mut Data) -> Result<()>;

/// A typed argument bound to one data key.
pub struct Argument<V> {
    name: String,
    description: String,
    min: usize,
    optional: Option<usize>,
    parser: Box<ParseFn<V>>,
    transformers: Vec<Transformer<V>>,
    validators: Vec<Validator<V>>,
    default: Option<V>,
    completer: Option<Box<dyn Completer>>,
    breakers: Vec<Breaker>,
    custom_setter: Option<Box<SetterFn<V>>>,
    hidden: bool,
}

impl<V: fmt::Debug> fmt::Debug for Argument<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("min", &self.min)
            .field("optional", &self.optional)
            .field("transformers", &self.transformers)
            .field("validators", &self.validators)
            .field("default", &self.default)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

impl<V: ArgValue> Argument<V> {
    /// Argument using the built-in adapter and default arity for `V`.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let (min, optional) = V::DEFAULT_ARITY;
        Self::custom(name, description, V::from_tokens).with_arity(min, optional)
    }
}

impl<T: Scalar> Argument<Vec<T>> {
    /// List argument taking `min` tokens plus up to `optional` more
    /// (`None` = unbounded).
    #[must_use]
    pub fn list(
        name: impl Into<String>,
        description: impl Into<String>,
        min: usize,
        optional: Option<usize>,
    ) -> Self {
        Self::new(name, description).with_arity(min, optional)
    }
}

impl<V: Clone + fmt::Debug + 'static> Argument<V> {
    /// Argument of any type, converted by `parser`. Arity defaults to one
    /// token.
    #[must_use]
    pub fn custom(
        name: impl Into<String>,
        description: impl Into<String>,
        parser: impl Fn(&[String]) -> std::result::Result<V, String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            min: 1,
            optional: Some(0),
            parser: Box::new(parser),
            transformers: Vec::new(),
            validators: Vec::new(),
            default: None,
            completer: None,
            breakers: Vec::new(),
            custom_setter: None,
            hidden: false,
        }
    }

    // --- Builders ---

    /// Replace the token adapter.
    #[must_use]
    pub fn with_parser(
        mut self,
        parser: impl Fn(&[String]) -> std::result::Result<V, String> + 'static,
    ) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Set the arity to `min` tokens plus up to `optional` more.
    #[must_use]
    pub fn with_arity(mut self, min: usize, optional: Option<usize>) -> Self {
        self.min = min;
        self.optional = optional;
        self
    }

    /// Make every token optional, keeping the upper bound.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = self.optional.map(|o| o.saturating_add(self.min));
        self.min = 0;
        self
    }

    /// Value stored when no token is given.
    #[must_use]
    pub fn with_default(mut self, value: V) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: Transformer<V>) -> Self {
        self.transformers.push(transformer);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator<V>) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Stop consuming where `breaker` says so.
    #[must_use]
    pub fn with_breaker(mut self, breaker: Breaker) -> Self {
        self.breakers.push(breaker);
        self
    }

    /// Store the final value through `setter` instead of under the
    /// argument's own name.
    #[must_use]
    pub fn with_custom_setter(
        mut self,
        setter: impl Fn(V, &mut Data) -> Result<()> + 'static,
    ) -> Self {
        self.custom_setter = Some(Box::new(setter));
        self
    }

    /// Leave the argument out of usage output.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    // --- Accessors ---

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `(min, optional)` arity.
    #[must_use]
    pub fn arity(&self) -> (usize, Option<usize>) {
        (self.min, self.optional)
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Placeholder text for usage output, e.g. `NAME [ NAME ... ]`.
    #[must_use]
    pub fn usage_display(&self) -> String {
        arity_display(&self.name.to_uppercase(), self.min, self.optional)
    }

    // --- Pipeline ---

    fn not_enough(&self, got: usize) -> Error {
        Error::NotEnoughArgs {
            name: self.name.clone(),
            min: self.min,
            got,
        }
    }

    fn consume(&self, input: &mut TokenStream, data: &Data) -> Result<Vec<String>> {
        let (tokens, enough) = input.pop_n(self.min, self.optional, &self.breakers, data);
        tracing::trace!(name = %self.name, ?tokens, enough, "argument consumed tokens");
        if enough {
            Ok(tokens)
        } else {
            Err(self.not_enough(tokens.len()))
        }
    }

    /// Convert, transform and validate `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conversion` when the parser or a transformer fails and
    /// `Error::Validation` naming the first validator that rejects the value.
    pub fn parse(&self, tokens: &[String], data: &Data) -> Result<V> {
        let conversion = |message: String| Error::Conversion {
            name: self.name.clone(),
            message,
        };
        let mut value = (self.parser)(tokens).map_err(conversion)?;
        for transformer in &self.transformers {
            value = transformer
                .apply(value)
                .map_err(|reason| conversion(format!("[{}] {reason}", transformer.name())))?;
        }
        for validator in &self.validators {
            validator
                .check(&value, data)
                .map_err(|message| Error::Validation {
                    name: self.name.clone(),
                    validator: validator.name().to_owned(),
                    message,
                })?;
        }
        Ok(value)
    }

    fn store(&self, value: V, data: &mut Data) -> Result<()> {
        match &self.custom_setter {
            Some(setter) => setter(value, data),
            None => {
                data.set(self.name.clone(), value);
                Ok(())
            }
        }
    }

    /// Store the parsed `tokens`, or the default when there are none.
    fn apply(&self, tokens: &[String], data: &mut Data) -> Result<()> {
        if tokens.is_empty() {
            return match &self.default {
                Some(default) => self.store(default.clone(), data),
                None => Ok(()),
            };
        }
        let value = self.parse(tokens, data)?;
        self.store(value, data)
    }

    /// Store the default, if any. Used by flags that were never given.
    ///
    /// # Errors
    ///
    /// Returns the custom setter's error.
    pub fn apply_default(&self, data: &mut Data) -> Result<()> {
        self.apply(&[], data)
    }

    /// Parse `tokens` outside a traversal and store the result.
    ///
    /// # Errors
    ///
    /// Same as [`Argument::parse`], plus `Error::NotEnoughArgs` when fewer
    /// than `min` tokens are given.
    pub fn apply_tokens(&self, tokens: &[String], data: &mut Data) -> Result<()> {
        if tokens.len() < self.min {
            return Err(self.not_enough(tokens.len()));
        }
        self.apply(tokens, data)
    }

    /// Suggestions for `partial`, with `previous` values of the same
    /// argument excluded when the completion is distinct.
    fn completion_for(
        &self,
        partial: &str,
        previous: &[String],
        data: &Data,
    ) -> Result<Option<Completion>> {
        let completion = match &self.completer {
            Some(completer) => completer.complete(partial, data)?,
            None => None,
        };
        Ok(Some(
            completion
                .unwrap_or_default()
                .for_partial(partial)
                .excluding(previous),
        ))
    }
}

impl<V: Clone + fmt::Debug + 'static> Processor for Argument<V> {
    fn execute(
        &self,
        input: &mut TokenStream,
        _output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        let tokens = self.consume(input, data)?;
        self.apply(&tokens, data)
    }

    /// Completes the last token if this argument consumes it; otherwise
    /// processes its tokens as in execution.
    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        let available = input.len();
        if available == 0 {
            return Ok(None);
        }
        let (tokens, enough) = input.pop_n(self.min, self.optional, &self.breakers, data);
        match tokens.split_last() {
            Some((partial, previous)) if tokens.len() == available => {
                // Earlier values are visible to the completer when they parse.
                if !previous.is_empty() {
                    if let Ok(value) = self.parse(previous, data) {
                        self.store(value, data)?;
                    }
                }
                self.completion_for(partial, previous, data)
            }
            _ if !enough => Err(self.not_enough(tokens.len())),
            _ => self.apply(&tokens, data).map(|()| None),
        }
    }

    /// Documents the argument unless all of its required tokens were given.
    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()> {
        let (tokens, enough) = input.pop_n(self.min, self.optional, &self.breakers, data);
        if enough && !tokens.is_empty() {
            if let Err(err) = self.apply(&tokens, data) {
                tracing::debug!(name = %self.name, error = %err, "ignoring value during usage");
            }
            return Ok(());
        }
        if self.hidden {
            return Ok(());
        }
        let description = (!self.description.is_empty()).then_some(self.description.as_str());
        usage.add_arg(&self.name, self.usage_display(), description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::args::transform;
    use crate::args::validate;
    use crate::engine::{BufferedOutput, SimpleCompleter};
    use crate::settings::{CompletionSettings, UsageSettings};

    fn execute<P: Processor>(p: &P, args: &[&str]) -> (Result<()>, Data, TokenStream) {
        let mut input = TokenStream::new(args.iter().copied());
        let mut data = Data::new();
        let result = p.execute(
            &mut input,
            &mut BufferedOutput::new(),
            &mut data,
            &mut ExecuteData::new(),
        );
        (result, data, input)
    }

    #[test]
    fn test_scalar_argument() {
        let arg = Argument::<i64>::new("n", "A number");
        let (result, data, input) = execute(&arg, &["7", "rest"]);
        result.unwrap();
        assert_eq!(data.int("n"), 7);
        assert_eq!(input.remaining(), ["rest"]);
    }

    #[test]
    fn test_missing_required() {
        let arg = Argument::<String>::new("s", "");
        let (result, _, _) = execute(&arg, &[]);
        let err = result.unwrap_err();
        assert!(err.is_not_enough_args());
        assert_eq!(
            err.to_string(),
            "Argument \"s\" requires at least 1 argument, got 0"
        );
    }

    #[test]
    fn test_conversion_error() {
        let arg = Argument::<u8>::new("n", "");
        let (result, _, _) = execute(&arg, &["x"]);
        assert!(matches!(result, Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_optional_and_default() {
        let arg = Argument::<String>::new("s", "").optional();
        let (result, data, _) = execute(&arg, &[]);
        result.unwrap();
        assert!(!data.has("s"));

        let arg = Argument::<String>::new("s", "")
            .optional()
            .with_default("dflt".to_owned());
        let (result, data, _) = execute(&arg, &[]);
        result.unwrap();
        assert_eq!(data.string("s"), "dflt");

        let arg = Argument::<Vec<String>>::list("all", "", 2, Some(usize::MAX)).optional();
        let (result, data, _) = execute(&arg, &["a", "b", "c"]);
        result.unwrap();
        assert_eq!(data.string_list("all"), ["a", "b", "c"]);
    }

    #[test]
    fn test_transform_then_validate() {
        let arg = Argument::<Vec<String>>::new("words", "")
            .with_transformer(transform::for_each(transform::to_upper()))
            .with_validator(validate::for_each(validate::contains("A")));
        let (result, data, _) = execute(&arg, &["ab", "ca"]);
        result.unwrap();
        assert_eq!(data.string_list("words"), ["AB", "CA"]);
    }

    #[test]
    fn test_validator_short_circuit() {
        let spy_calls = Rc::new(Cell::new(0));
        let spy = {
            let calls = Rc::clone(&spy_calls);
            validate::Validator::new("Spy", move |_: &String, _| {
                calls.set(calls.get() + 1);
                Ok(())
            })
        };
        let arg = Argument::<String>::new("s", "")
            .with_validator(validate::min_length(3))
            .with_validator(validate::contains("X"))
            .with_validator(spy);
        let (result, _, _) = execute(&arg, &["ab"]);
        let err = result.unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            err.root(),
            Error::Validation { validator, .. } if validator == "MinLength(3)"
        ));
        assert_eq!(spy_calls.get(), 0);
    }

    #[test]
    fn test_custom_setter() {
        let arg = Argument::<i64>::new("n", "").with_custom_setter(|n, data| {
            data.set("doubled", n * 2);
            Ok(())
        });
        let (result, data, _) = execute(&arg, &["4"]);
        result.unwrap();
        assert!(!data.has("n"));
        assert_eq!(data.int("doubled"), 8);
    }

    #[test]
    fn test_breaker() {
        let arg = Argument::<Vec<String>>::new("cmd", "").with_breaker(Breaker::until(";"));
        let (result, data, input) = execute(&arg, &["a", "b", ";", "c"]);
        result.unwrap();
        assert_eq!(data.string_list("cmd"), ["a", "b"]);
        assert_eq!(input.remaining(), ["c"]);
    }

    #[test]
    fn test_custom_parser() {
        #[derive(Debug, Clone, PartialEq)]
        struct Pair(String, String);
        let arg = Argument::custom("pair", "", |tokens: &[String]| {
            tokens[0]
                .split_once('=')
                .map(|(k, v)| Pair(k.to_owned(), v.to_owned()))
                .ok_or_else(|| "expected KEY=VALUE".to_owned())
        });
        let (result, data, _) = execute(&arg, &["a=b"]);
        result.unwrap();
        assert_eq!(
            data.get::<Pair>("pair"),
            Some(&Pair("a".to_owned(), "b".to_owned()))
        );
    }

    #[test]
    fn test_complete_last_token() {
        let arg = Argument::<Vec<String>>::new("files", "")
            .with_completer(SimpleCompleter::new(["alpha", "beta", "apple"]).distinct());
        let mut input = TokenStream::new(["alpha", "a"]);
        let mut data = Data::new();
        let completion = arg.complete(&mut input, &mut data).unwrap().unwrap();
        assert_eq!(data.string_list("files"), ["alpha"]);
        let settings = CompletionSettings {
            fuzzy_fallback: false,
            ..CompletionSettings::default()
        };
        assert_eq!(completion.process(&settings), ["apple"]);
    }

    #[test]
    fn test_complete_earlier_token_processes() {
        let arg = Argument::<i64>::new("n", "");
        let mut input = TokenStream::new(["3", ""]);
        let mut data = Data::new();
        assert!(arg.complete(&mut input, &mut data).unwrap().is_none());
        assert_eq!(data.int("n"), 3);
        assert_eq!(input.remaining(), [""]);
    }

    #[test]
    fn test_usage_display() {
        let arg = Argument::<Vec<String>>::list("n", "Names", 2, Some(1));
        let mut usage = Usage::new();
        arg.usage(&mut TokenStream::default(), &mut Data::new(), &mut usage)
            .unwrap();
        assert_eq!(
            usage.render(&UsageSettings::default()),
            "N N [ N ]\n\nArguments:\n  N: Names"
        );

        let mut usage = Usage::new();
        arg.usage(&mut TokenStream::new(["a", "b"]), &mut Data::new(), &mut usage)
            .unwrap();
        assert!(usage.tokens().is_empty());
    }

    #[test]
    fn test_hidden_usage() {
        let arg = Argument::<String>::new("secret", "Shh").hidden();
        let mut usage = Usage::new();
        arg.usage(&mut TokenStream::default(), &mut Data::new(), &mut usage)
            .unwrap();
        assert!(usage.tokens().is_empty());
        assert!(usage.arguments().is_empty());
    }
}
