/// Validators: named predicates over a parsed value.
///
/// Validators run in declaration order after transformers; the first failure
/// stops the chain and is reported under the validator's name.
use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::engine::Data;

type CheckFn<V> = dyn Fn(&V, &Data) -> Result<(), String>;

/// A named check of an argument's value.
pub struct Validator<V> {
    name: String,
    check: Box<CheckFn<V>>,
}

impl<V> fmt::Debug for Validator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> Validator<V> {
    /// Validator named `name`. `check` returns the failure reason on rejection.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&V, &Data) -> Result<(), String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    /// Validator name, e.g. `MinLength(3)`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the check.
    ///
    /// # Errors
    ///
    /// Returns the reason the value was rejected.
    pub fn check(&self, value: &V, data: &Data) -> Result<(), String> {
        (self.check)(value, data)
    }
}

fn require(ok: bool, reason: impl FnOnce() -> String) -> Result<(), String> {
    if ok { Ok(()) } else { Err(reason()) }
}

// --- Strings ---

/// At least `n` characters.
#[must_use]
pub fn min_length(n: usize) -> Validator<String> {
    Validator::new(format!("MinLength({n})"), move |s: &String, _| {
        require(s.chars().count() >= n, || {
            format!("value must be at least {n} characters")
        })
    })
}

/// At most `n` characters.
#[must_use]
pub fn max_length(n: usize) -> Validator<String> {
    Validator::new(format!("MaxLength({n})"), move |s: &String, _| {
        require(s.chars().count() <= n, || {
            format!("value must be at most {n} characters")
        })
    })
}

/// Contains `needle`.
#[must_use]
pub fn contains(needle: &str) -> Validator<String> {
    let needle = needle.to_owned();
    Validator::new(format!("Contains(\"{needle}\")"), move |s: &String, _| {
        require(s.contains(&needle), || {
            format!("value doesn't contain substring \"{needle}\"")
        })
    })
}

/// Matches the regular expression `pattern`.
///
/// # Errors
///
/// Returns the regex compile error for an invalid pattern.
pub fn matches_regex(pattern: &str) -> Result<Validator<String>, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(Validator::new(
        format!("MatchesRegex(\"{pattern}\")"),
        move |s: &String, _| {
            require(re.is_match(s), || {
                format!("value \"{s}\" doesn't match regex \"{}\"", re.as_str())
            })
        },
    ))
}

// --- Any comparable value ---

/// One of `allowed`.
#[must_use]
pub fn in_list<V>(allowed: Vec<V>) -> Validator<V>
where
    V: PartialEq + fmt::Debug + 'static,
{
    Validator::new(format!("InList({allowed:?})"), move |v: &V, _| {
        require(allowed.contains(v), || {
            format!("{v:?} is not one of {allowed:?}")
        })
    })
}

/// Greater than or equal to `min`.
#[must_use]
pub fn at_least<V>(min: V) -> Validator<V>
where
    V: PartialOrd + fmt::Display + 'static,
{
    Validator::new(format!("AtLeast({min})"), move |v: &V, _| {
        require(*v >= min, || format!("value must be at least {min}"))
    })
}

/// Less than or equal to `max`.
#[must_use]
pub fn at_most<V>(max: V) -> Validator<V>
where
    V: PartialOrd + fmt::Display + 'static,
{
    Validator::new(format!("AtMost({max})"), move |v: &V, _| {
        require(*v <= max, || format!("value must be at most {max}"))
    })
}

/// Strictly greater than zero (the type's default).
#[must_use]
pub fn positive<V>() -> Validator<V>
where
    V: PartialOrd + Default + 'static,
{
    Validator::new("Positive()", |v: &V, _| {
        require(*v > V::default(), || "value isn't positive".to_owned())
    })
}

/// Zero or greater.
#[must_use]
pub fn non_negative<V>() -> Validator<V>
where
    V: PartialOrd + Default + 'static,
{
    Validator::new("NonNegative()", |v: &V, _| {
        require(*v >= V::default(), || "value isn't non-negative".to_owned())
    })
}

// --- Filesystem ---

/// The path exists.
#[must_use]
pub fn file_exists<V>() -> Validator<V>
where
    V: AsRef<Path> + 'static,
{
    Validator::new("FileExists()", |v: &V, _| {
        let path = v.as_ref();
        require(path.exists(), || {
            format!("file \"{}\" does not exist", path.display())
        })
    })
}

/// The path is a directory.
#[must_use]
pub fn is_dir<V>() -> Validator<V>
where
    V: AsRef<Path> + 'static,
{
    Validator::new("IsDir()", |v: &V, _| {
        let path = v.as_ref();
        require(path.is_dir(), || {
            format!("\"{}\" is not a directory", path.display())
        })
    })
}

// --- Lists ---

/// Apply `inner` to every element; the first failing element is reported.
#[must_use]
pub fn for_each<T: 'static>(inner: Validator<T>) -> Validator<Vec<T>> {
    let name = format!("ForEach({})", inner.name);
    Validator::new(name, move |values: &Vec<T>, data| {
        values
            .iter()
            .enumerate()
            .try_for_each(|(i, v)| {
                inner
                    .check(v, data)
                    .map_err(|reason| format!("element {i}: {reason}"))
            })
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn ok<V: 'static>(v: &Validator<V>, value: V) -> bool {
        v.check(&value, &Data::new()).is_ok()
    }

    #[test]
    fn test_lengths() {
        assert!(ok(&min_length(3), "abc".to_owned()));
        assert!(!ok(&min_length(3), "ab".to_owned()));
        assert!(ok(&max_length(2), "ab".to_owned()));
        assert!(!ok(&max_length(2), "abc".to_owned()));
        assert_eq!(min_length(3).name(), "MinLength(3)");
    }

    #[test]
    fn test_contains_and_regex() {
        assert!(ok(&contains("X"), "aXb".to_owned()));
        assert!(!ok(&contains("X"), "ab".to_owned()));
        let re = matches_regex("^[a-z]+$").unwrap();
        assert!(ok(&re, "abc".to_owned()));
        assert!(!ok(&re, "ab1".to_owned()));
        assert!(matches_regex("(").is_err());
    }

    #[test]
    fn test_numeric() {
        assert!(ok(&at_least(2), 2));
        assert!(!ok(&at_least(2), 1));
        assert!(ok(&at_most(2.5), 2.0));
        assert!(!ok(&positive::<i64>(), 0));
        assert!(ok(&non_negative::<i64>(), 0));
        assert!(!ok(&non_negative::<f64>(), -0.5));
    }

    #[test]
    fn test_in_list() {
        let v = in_list(vec!["a".to_owned(), "b".to_owned()]);
        assert!(ok(&v, "a".to_owned()));
        assert!(!ok(&v, "c".to_owned()));
    }

    #[test]
    fn test_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(ok(&file_exists::<PathBuf>(), file.clone()));
        assert!(!ok(&is_dir::<PathBuf>(), file));
        assert!(ok(&is_dir::<PathBuf>(), dir.path().to_path_buf()));
        assert!(!ok(&file_exists::<String>(), "/nonexistent/x".to_owned()));
    }

    #[test]
    fn test_for_each_reports_element() {
        let v = for_each(min_length(2));
        let err = v
            .check(&vec!["ab".to_owned(), "c".to_owned()], &Data::new())
            .unwrap_err();
        assert_eq!(err, "element 1: value must be at least 2 characters");
    }
}
