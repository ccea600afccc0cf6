/// The flag sub-engine.
///
/// Scan strategy (left to right over the whole remaining stream):
///
/// 1. **`--`**: consumed; scanning stops, later tokens stay positional.
/// 2. **Short bundle** (`-` followed by two or more letters): if no letter is
///    a registered short flag, the token is positional. If every letter is,
///    each flag must be combinable and runs against an empty stream. A partial
///    match is an ambiguity error.
/// 3. **Registered `--name` or `-x`**: consumed, then the flag's value
///    processor runs on a window starting right after it. A breaker keeps the
///    value from swallowing other flag tokens.
/// 4. **Anything else**: skipped; left for positional arguments.
///
/// After the scan, absent flags run their missing handler and every flag runs
/// its post-process handler, both in name order.
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::flag::FlagInterface;
use crate::engine::{
    Breaker, Completion, Data, DiscardOutput, Error, ExecuteData, Output, Processor, Result,
    TokenStream, Usage,
};

/// Token that ends flag scanning.
pub const END_OF_FLAGS: &str = "--";

/// What a scan is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Execute,
    Complete,
    Usage,
}

/// Per-flag outcome of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagState {
    Unset,
    /// Given, but its value ran out of tokens.
    Started,
    Set,
}

/// Result of classifying a short bundle.
enum Bundle {
    /// No letter is a registered short flag.
    Unrelated,
    /// Every letter is; indices into the flag list, in bundle order.
    All(Vec<usize>),
    /// Only some letters are.
    Partial,
}

/// Whether `token` has the short-bundle shape `-ab...`.
fn is_bundle(token: &str) -> bool {
    token
        .strip_prefix('-')
        .is_some_and(|rest| rest.len() >= 2 && rest.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Extracts registered flags from anywhere in the stream.
pub struct FlagProcessor {
    /// Sorted by name.
    flags: Vec<Box<dyn FlagInterface>>,
    /// `--name` and `-x` forms -> index into `flags`.
    lookup: Rc<BTreeMap<String, usize>>,
    shorts: Rc<BTreeMap<char, usize>>,
}

impl fmt::Debug for FlagProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagProcessor")
            .field("flags", &self.lookup.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FlagProcessor {
    /// Register `flags`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGraph` when two flags share a name or a short
    /// rune, or a name is empty.
    pub fn new(mut flags: Vec<Box<dyn FlagInterface>>) -> Result<Self> {
        flags.sort_by(|a, b| a.name().cmp(b.name()));
        let mut lookup = BTreeMap::new();
        let mut shorts = BTreeMap::new();
        for (i, flag) in flags.iter().enumerate() {
            if flag.name().is_empty() {
                return Err(Error::InvalidGraph("flag name cannot be empty".to_owned()));
            }
            if lookup.insert(format!("--{}", flag.name()), i).is_some() {
                return Err(Error::InvalidGraph(format!(
                    "flag \"{}\" is registered more than once",
                    flag.name()
                )));
            }
            if let Some(short) = flag.short_name() {
                if shorts.insert(short, i).is_some() {
                    return Err(Error::InvalidGraph(format!(
                        "short flag \"-{short}\" is registered more than once"
                    )));
                }
                lookup.insert(format!("-{short}"), i);
            }
        }
        Ok(Self {
            flags,
            lookup: Rc::new(lookup),
            shorts: Rc::new(shorts),
        })
    }

    fn classify_bundle(&self, token: &str) -> Bundle {
        let letters = &token[1..];
        let matched: Vec<usize> = letters
            .chars()
            .filter_map(|c| self.shorts.get(&c).copied())
            .collect();
        if matched.is_empty() {
            Bundle::Unrelated
        } else if matched.len() == letters.chars().count() {
            Bundle::All(matched)
        } else {
            Bundle::Partial
        }
    }

    /// Breaker keeping a flag's value processor off other flag tokens.
    fn value_breaker(&self) -> Breaker {
        let lookup = Rc::clone(&self.lookup);
        let shorts = Rc::clone(&self.shorts);
        Breaker::new(move |token, _| {
            if token == END_OF_FLAGS || lookup.contains_key(token) {
                return false;
            }
            !(is_bundle(token) && token[1..].chars().any(|c| shorts.contains_key(&c)))
        })
    }

    /// Flag names offered when completing a token that starts with `-`.
    fn name_suggestions(&self, states: &[FlagState]) -> Vec<String> {
        self.flags
            .iter()
            .zip(states)
            .filter(|(flag, state)| {
                **state != FlagState::Set || flag.capabilities().allows_multiple
            })
            .map(|(flag, _)| format!("--{}", flag.name()))
            .collect()
    }

    fn run_value(
        &self,
        idx: usize,
        mode: Mode,
        window: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<Option<Completion>> {
        let processor = self.flags[idx].processor();
        match mode {
            Mode::Execute => processor.execute(window, output, data, exec).map(|()| None),
            Mode::Complete => processor.complete(window, data),
            Mode::Usage => processor
                .execute(window, &mut DiscardOutput, data, &mut ExecuteData::new())
                .map(|()| None),
        }
    }

    /// Record the outcome of running flag `idx`'s value processor.
    ///
    /// In usage mode, running out of tokens marks the flag as started and any
    /// other value error still counts as set; neither aborts the scan.
    fn settle(
        &self,
        idx: usize,
        mode: Mode,
        result: Result<Option<Completion>>,
        states: &mut [FlagState],
    ) -> Result<Option<Completion>> {
        match (mode, result) {
            (Mode::Usage, Err(err)) => {
                states[idx] = if err.is_not_enough_args() {
                    FlagState::Started
                } else {
                    tracing::debug!(
                        flag = self.flags[idx].name(),
                        error = %err,
                        "ignoring flag value error during usage"
                    );
                    FlagState::Set
                };
                Ok(None)
            }
            (_, result) => {
                states[idx] = FlagState::Set;
                result
            }
        }
    }

    /// Reject a repeat of a flag that may only be given once.
    fn check_repeat(&self, idx: usize, mode: Mode, states: &[FlagState]) -> Result<()> {
        let flag = &self.flags[idx];
        if mode == Mode::Execute
            && states[idx] == FlagState::Set
            && !flag.capabilities().allows_multiple
        {
            return Err(Error::FlagAlreadySet {
                name: flag.name().to_owned(),
            });
        }
        Ok(())
    }

    fn scan(
        &self,
        mode: Mode,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<(Vec<FlagState>, Option<Completion>)> {
        let mut states = vec![FlagState::Unset; self.flags.len()];
        let mut i = 0;
        while let Some(token) = input.peek_at(i).map(str::to_owned) {
            if mode == Mode::Complete && i + 1 == input.len() {
                if token.starts_with('-') {
                    let suggestions = self.name_suggestions(&states);
                    return Ok((states, Some(Completion::new(suggestions).for_partial(token))));
                }
                break;
            }

            if token == END_OF_FLAGS {
                input.pop_at(i);
                tracing::trace!("end of flags");
                break;
            }

            if is_bundle(&token) {
                let indices = match self.classify_bundle(&token) {
                    Bundle::Unrelated => {
                        i += 1;
                        continue;
                    }
                    Bundle::All(indices) => indices,
                    Bundle::Partial if mode == Mode::Complete => {
                        i += 1;
                        continue;
                    }
                    Bundle::Partial => {
                        return Err(Error::AmbiguousMultiFlag {
                            token,
                            reason: "only some of its letters are registered short flags"
                                .to_owned(),
                        });
                    }
                };
                if let Some(&idx) = indices
                    .iter()
                    .find(|&&idx| !self.flags[idx].capabilities().combinable)
                {
                    if mode == Mode::Complete {
                        i += 1;
                        continue;
                    }
                    return Err(Error::AmbiguousMultiFlag {
                        token,
                        reason: format!("flag \"{}\" is not combinable", self.flags[idx].name()),
                    });
                }
                input.pop_at(i);
                tracing::debug!(bundle = %token, "processing multi-flag");
                for idx in indices {
                    self.check_repeat(idx, mode, &states)?;
                    let mut empty = TokenStream::default();
                    let result = self.run_value(idx, mode, &mut empty, output, data, exec);
                    self.settle(idx, mode, result, &mut states)?;
                }
                continue;
            }

            let Some(&idx) = self.lookup.get(&token) else {
                i += 1;
                continue;
            };
            self.check_repeat(idx, mode, &states)?;
            input.pop_at(i);
            tracing::debug!(flag = self.flags[idx].name(), "processing flag");
            let breaker = self.value_breaker();
            let result = input.run_at_offset(i, |window| {
                let pushed = window.push_breakers([breaker]);
                let result = self.run_value(idx, mode, window, output, data, exec);
                window.pop_breakers(pushed);
                result
            });
            if let Some(completion) = self.settle(idx, mode, result, &mut states)? {
                return Ok((states, Some(completion)));
            }
        }
        Ok((states, None))
    }

    /// Run missing handlers for absent flags, then every post handler.
    fn finish(&self, states: &[FlagState], output: &mut dyn Output, data: &mut Data) -> Result<()> {
        for (flag, state) in self.flags.iter().zip(states) {
            if *state == FlagState::Unset && flag.capabilities().missing_handler {
                flag.process_missing(data)?;
            }
        }
        for flag in &self.flags {
            if flag.capabilities().post_handler {
                flag.post_process(output, data)?;
            }
        }
        Ok(())
    }
}

impl Processor for FlagProcessor {
    fn execute(
        &self,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        let (states, _) = self.scan(Mode::Execute, input, output, data, exec)?;
        self.finish(&states, output, data)
    }

    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        let mut exec = ExecuteData::new();
        let (states, completion) =
            self.scan(Mode::Complete, input, &mut DiscardOutput, data, &mut exec)?;
        if completion.is_some() {
            return Ok(completion);
        }
        if let Err(err) = self.finish(&states, &mut DiscardOutput, data) {
            tracing::debug!(error = %err, "ignoring flag post-processing error during completion");
        }
        Ok(None)
    }

    /// Documents every flag that was not fully given, in name order.
    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()> {
        let mut exec = ExecuteData::new();
        let (states, _) = self.scan(Mode::Usage, input, &mut DiscardOutput, data, &mut exec)?;
        for (flag, state) in self.flags.iter().zip(&states) {
            if *state == FlagState::Set {
                continue;
            }
            usage.add_flag(
                flag.name(),
                flag.short_name(),
                flag.usage_display(),
                flag.description(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Argument;
    use crate::engine::BufferedOutput;
    use crate::flags::{BoolFlag, Flag, ItemizedListFlag};
    use crate::settings::{CompletionSettings, UsageSettings};

    fn flags(list: Vec<Box<dyn FlagInterface>>) -> FlagProcessor {
        FlagProcessor::new(list).unwrap()
    }

    fn execute(fp: &FlagProcessor, args: &[&str]) -> (Result<()>, Data, TokenStream) {
        let mut input = TokenStream::new(args.iter().copied());
        let mut data = Data::new();
        let result = fp.execute(
            &mut input,
            &mut BufferedOutput::new(),
            &mut data,
            &mut ExecuteData::new(),
        );
        (result, data, input)
    }

    fn nd() -> FlagProcessor {
        flags(vec![
            Box::new(BoolFlag::new("dry", Some('d'), "Dry run")),
            Box::new(BoolFlag::new("new", Some('n'), "New")),
        ])
    }

    #[test]
    fn test_flags_anywhere() {
        let fp = flags(vec![
            Box::new(Flag::<i64>::new("count", Some('c'), "")),
            Box::new(BoolFlag::new("verbose", Some('v'), "")),
        ]);
        let (result, data, input) = execute(&fp, &["a", "--count", "3", "b", "-v"]);
        result.unwrap();
        assert_eq!(data.int("count"), 3);
        assert!(data.bool("verbose"));
        assert_eq!(input.remaining(), ["a", "b"]);
    }

    #[test]
    fn test_bundle_sets_all() {
        let (result, data, input) = execute(&nd(), &["-nd"]);
        result.unwrap();
        assert!(data.bool("new"));
        assert!(data.bool("dry"));
        assert!(input.fully_processed());
    }

    #[test]
    fn test_bundle_with_no_matches_is_positional() {
        let fp = flags(vec![Box::new(BoolFlag::new("new", Some('n'), ""))]);
        let (result, data, input) = execute(&fp, &["-xy"]);
        result.unwrap();
        assert_eq!(input.remaining(), ["-xy"]);
        assert!(!data.bool("new"));
    }

    #[test]
    fn test_partial_bundle_is_ambiguous() {
        let fp = flags(vec![Box::new(BoolFlag::new("new", Some('n'), ""))]);
        let (result, _, _) = execute(&fp, &["-nx"]);
        let err = result.unwrap_err();
        assert!(err.is_ambiguous_multi_flag());
        assert!(err.is_usage());
    }

    #[test]
    fn test_bundle_rejects_non_combinable() {
        let fp = flags(vec![
            Box::new(BoolFlag::new("new", Some('n'), "")),
            Box::new(Flag::<String>::new("name", Some('m'), "")),
        ]);
        let (result, _, _) = execute(&fp, &["-nm"]);
        assert!(result.unwrap_err().is_ambiguous_multi_flag());
    }

    #[test]
    fn test_end_of_flags() {
        let (result, data, input) = execute(&nd(), &["--", "-n"]);
        result.unwrap();
        assert!(!data.bool("new"));
        assert_eq!(input.remaining(), ["-n"]);
    }

    #[test]
    fn test_repeat_rejected() {
        let (result, _, _) = execute(&nd(), &["-n", "--new"]);
        assert!(matches!(result, Err(Error::FlagAlreadySet { name }) if name == "new"));
    }

    #[test]
    fn test_repeat_in_bundle_rejected() {
        let (result, _, _) = execute(&nd(), &["-nn"]);
        assert!(matches!(result, Err(Error::FlagAlreadySet { name }) if name == "new"));
    }

    #[test]
    fn test_allow_multiple_keeps_last_value() {
        let fp = flags(vec![Box::new(
            Flag::<i64>::new("count", Some('c'), "").allow_multiple(),
        )]);
        let (result, data, input) = execute(&fp, &["--count", "1", "x", "-c", "2"]);
        result.unwrap();
        assert_eq!(data.int("count"), 2);
        assert_eq!(input.remaining(), ["x"]);
    }

    #[test]
    fn test_value_stops_at_other_flags() {
        let fp = flags(vec![
            Box::new(Flag::<Vec<String>>::new("items", Some('i'), "")),
            Box::new(BoolFlag::new("dry", Some('d'), "")),
        ]);
        let (result, data, input) = execute(&fp, &["-i", "a", "b", "-d", "c"]);
        result.unwrap();
        assert_eq!(data.string_list("items"), ["a", "b"]);
        assert!(data.bool("dry"));
        assert_eq!(input.remaining(), ["c"]);
    }

    #[test]
    fn test_missing_flag_gets_default() {
        let fp = flags(vec![Box::new(
            Flag::<i64>::new("count", None, "").with_default(5),
        )]);
        let (result, data, _) = execute(&fp, &[]);
        result.unwrap();
        assert_eq!(data.int("count"), 5);
    }

    #[test]
    fn test_missing_value() {
        let fp = flags(vec![Box::new(Flag::<i64>::new("count", None, ""))]);
        let (result, _, _) = execute(&fp, &["--count"]);
        assert!(result.unwrap_err().is_not_enough_args());
    }

    #[test]
    fn test_itemized_accumulates() {
        let fp = flags(vec![Box::new(ItemizedListFlag::<u32>::new("n", Some('n'), ""))]);
        let (result, data, input) = execute(&fp, &["-n", "1", "x", "--n", "2"]);
        result.unwrap();
        assert_eq!(data.get::<Vec<u32>>("n"), Some(&vec![1, 2]));
        assert_eq!(input.remaining(), ["x"]);
    }

    #[test]
    fn test_duplicate_registration() {
        let err = FlagProcessor::new(vec![
            Box::new(BoolFlag::new("a", Some('x'), "")),
            Box::new(BoolFlag::new("b", Some('x'), "")),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn test_complete_flag_names() {
        let fp = flags(vec![
            Box::new(BoolFlag::new("dry", Some('d'), "")),
            Box::new(BoolFlag::new("new", Some('n'), "")),
            Box::new(ItemizedListFlag::<String>::new("tag", Some('t'), "")),
        ]);
        let mut data = Data::new();
        let completion = fp
            .complete(&mut TokenStream::new(["--new", "-t", "x", "--"]), &mut data)
            .unwrap()
            .unwrap();
        assert_eq!(
            completion.process(&CompletionSettings::default()),
            ["--dry", "--tag"]
        );
    }

    #[test]
    fn test_complete_flag_value() {
        let fp = flags(vec![Box::new(Flag::from_argument(
            Argument::<String>::new("color", "")
                .with_completer(crate::engine::SimpleCompleter::new(["red", "green"])),
            Some('c'),
        ))]);
        let completion = fp
            .complete(&mut TokenStream::new(["-c", "g"]), &mut Data::new())
            .unwrap()
            .unwrap();
        assert_eq!(completion.process(&CompletionSettings::default()), ["green"]);
    }

    #[test]
    fn test_complete_tolerates_repeats_and_bad_bundles() {
        let completion = nd()
            .complete(&mut TokenStream::new(["-n", "-n", "-nx", "--d"]), &mut Data::new())
            .unwrap()
            .unwrap();
        assert_eq!(completion.process(&CompletionSettings::default()), ["--dry"]);
    }

    #[test]
    fn test_usage_sorted_and_skips_set_flags() {
        let fp = flags(vec![
            Box::new(BoolFlag::new("second", Some('a'), "Second")),
            Box::new(BoolFlag::new("first", Some('b'), "First")),
            Box::new(Flag::<i64>::new("count", Some('c'), "Count")),
        ]);
        let mut usage = Usage::new();
        fp.usage(&mut TokenStream::new(["-a", "-c"]), &mut Data::new(), &mut usage)
            .unwrap();
        assert_eq!(
            usage.render(&UsageSettings::default()),
            "--count|-c COUNT --first|-b\n\nFlags:\n  [c] count: Count\n  [b] first: First"
        );
    }
}
