/// Completion suggestions, completers, and the final filtering pass.
use nucleo_matcher::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};
use serde::Serialize;

use super::data::Data;
use super::errors::Result;
use crate::settings::CompletionSettings;

/// A suggestion set for the token currently being completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Candidate values, unfiltered.
    pub suggestions: Vec<String>,
    /// Drop candidates already given to the same list argument.
    pub distinct: bool,
    /// Match the partial token case-insensitively.
    pub case_insensitive: bool,
    /// Return every suggestion, even ones not matching the partial token.
    pub ignore_filter: bool,
    /// The (possibly empty) token being completed. Set by the producing leaf.
    pub partial: String,
    /// Values already provided; removed when `distinct` is set.
    pub exclude: Vec<String>,
}

impl Completion {
    /// Completion over `suggestions`.
    #[must_use]
    pub fn new<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Exclude values that were already provided.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Match case-insensitively.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Skip prefix filtering.
    #[must_use]
    pub fn ignore_filter(mut self) -> Self {
        self.ignore_filter = true;
        self
    }

    /// Attach the token being completed.
    #[must_use]
    pub fn for_partial(mut self, partial: impl Into<String>) -> Self {
        self.partial = partial.into();
        self
    }

    /// Attach the values already provided to the same argument.
    #[must_use]
    pub fn excluding(mut self, previous: &[String]) -> Self {
        self.exclude.extend_from_slice(previous);
        self
    }

    /// Produce the final suggestion list.
    ///
    /// Strategy, in order:
    /// 1. Drop excluded values (distinct completions only).
    /// 2. Keep candidates starting with the partial token; sort and dedupe.
    /// 3. If nothing matched, optionally rank all candidates by fuzzy score.
    /// 4. Truncate, and escape spaces when a single suggestion remains so the
    ///    shell inserts it as one word.
    #[must_use]
    pub fn process(&self, settings: &CompletionSettings) -> Vec<String> {
        let case_insensitive = self.case_insensitive || !settings.case_sensitive;
        let candidates: Vec<&str> = self
            .suggestions
            .iter()
            .map(String::as_str)
            .filter(|s| !(self.distinct && self.exclude.iter().any(|e| e == s)))
            .collect();

        let mut out: Vec<String> = candidates
            .iter()
            .filter(|s| self.ignore_filter || has_prefix(s, &self.partial, case_insensitive))
            .map(|s| (*s).to_owned())
            .collect();
        out.sort();
        out.dedup();

        if out.is_empty()
            && settings.fuzzy_fallback
            && !self.ignore_filter
            && !self.partial.is_empty()
        {
            out = fuzzy_rank(&candidates, &self.partial, case_insensitive);
        }

        if let Some(max) = settings.max_suggestions {
            out.truncate(max);
        }
        if let [only] = out.as_mut_slice() {
            *only = escape_spaces(only);
        }
        out
    }
}

fn has_prefix(candidate: &str, partial: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        candidate.to_lowercase().starts_with(&partial.to_lowercase())
    } else {
        candidate.starts_with(partial)
    }
}

fn fuzzy_rank(candidates: &[&str], partial: &str, case_insensitive: bool) -> Vec<String> {
    let case_matching = if case_insensitive {
        CaseMatching::Ignore
    } else {
        CaseMatching::Smart
    };
    let pattern = Pattern::parse(partial, case_matching, Normalization::Smart);
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);

    let mut scored: Vec<(&str, u32)> = candidates
        .iter()
        .filter_map(|&candidate| {
            let mut buf = Vec::new();
            let haystack = Utf32Str::new(candidate, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| (candidate, score))
        })
        .collect();

    // Best score first; ties alphabetical.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored.into_iter().map(|(s, _)| s.to_owned()).collect()
}

fn escape_spaces(s: &str) -> String {
    s.replace(' ', "\\ ")
}

/// Produces suggestions for a partial token.
pub trait Completer {
    /// Suggestions for `partial`, given what has been parsed so far.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the completion request then fails.
    fn complete(&self, partial: &str, data: &Data) -> Result<Option<Completion>>;
}

impl<F> Completer for F
where
    F: Fn(&str, &Data) -> Result<Option<Completion>>,
{
    fn complete(&self, partial: &str, data: &Data) -> Result<Option<Completion>> {
        self(partial, data)
    }
}

/// Completer over a fixed suggestion list.
#[derive(Debug, Clone, Default)]
pub struct SimpleCompleter {
    suggestions: Vec<String>,
    distinct: bool,
}

impl SimpleCompleter {
    /// Completer suggesting `suggestions`.
    #[must_use]
    pub fn new<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            distinct: false,
        }
    }

    /// Do not re-suggest values already given to the same list.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl Completer for SimpleCompleter {
    fn complete(&self, _partial: &str, _data: &Data) -> Result<Option<Completion>> {
        let completion = Completion::new(self.suggestions.iter().cloned());
        Ok(Some(if self.distinct {
            completion.distinct()
        } else {
            completion
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CompletionSettings {
        CompletionSettings {
            fuzzy_fallback: false,
            ..CompletionSettings::default()
        }
    }

    #[test]
    fn test_prefix_filter_sorts_and_dedupes() {
        let c = Completion::new(["beta", "alpha", "alpine", "alpha"]).for_partial("al");
        assert_eq!(c.process(&settings()), ["alpha", "alpine"]);
    }

    #[test]
    fn test_distinct_excludes_previous() {
        let c = Completion::new(["a", "b", "c"])
            .distinct()
            .excluding(&["a".to_owned(), "c".to_owned()]);
        assert_eq!(c.process(&settings()), ["b"]);
    }

    #[test]
    fn test_non_distinct_keeps_previous() {
        let c = Completion::new(["a", "b"]).excluding(&["a".to_owned()]);
        assert_eq!(c.process(&settings()), ["a", "b"]);
    }

    #[test]
    fn test_case_insensitive() {
        let c = Completion::new(["Hello", "help"]).for_partial("HE");
        assert!(c.process(&settings()).is_empty());
        assert_eq!(c.case_insensitive().process(&settings()), ["Hello", "help"]);
    }

    #[test]
    fn test_single_suggestion_escapes_spaces() {
        let c = Completion::new(["two words"]).for_partial("tw");
        assert_eq!(c.process(&settings()), ["two\\ words"]);
    }

    #[test]
    fn test_fuzzy_fallback() {
        let c = Completion::new(["remove", "list", "add"]).for_partial("rmv");
        let with_fuzzy = CompletionSettings::default();
        assert_eq!(c.process(&with_fuzzy), ["remove"]);
        assert!(c.process(&settings()).is_empty());
    }

    #[test]
    fn test_max_suggestions() {
        let c = Completion::new(["a1", "a2", "a3"]).for_partial("a");
        let limited = CompletionSettings {
            max_suggestions: Some(2),
            ..settings()
        };
        assert_eq!(c.process(&limited), ["a1", "a2"]);
    }

    #[test]
    fn test_simple_completer() {
        let c = SimpleCompleter::new(["x", "y"]).distinct();
        let completion = c.complete("", &Data::new()).unwrap().unwrap();
        assert!(completion.distinct);
        assert_eq!(completion.suggestions, ["x", "y"]);
    }
}
