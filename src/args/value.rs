/// Type adapters: conversion from raw tokens to typed argument values.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A value parsed from exactly one token.
pub trait Scalar: Sized + Clone + fmt::Debug + 'static {
    /// Convert one token.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `token` is not a valid value.
    fn from_token(token: &str) -> Result<Self, String>;
}

/// A value an argument can produce from its consumed tokens.
pub trait ArgValue: Sized + Clone + fmt::Debug + 'static {
    /// Arity used unless the argument overrides it, as `(min, optional)`.
    /// `None` means unbounded.
    const DEFAULT_ARITY: (usize, Option<usize>);

    /// Convert the consumed tokens.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when a token is not a valid value.
    fn from_tokens(tokens: &[String]) -> Result<Self, String>;
}

fn single<T: Scalar>(tokens: &[String]) -> Result<T, String> {
    match tokens {
        [token] => T::from_token(token),
        _ => Err(format!("expected exactly one value, got {}", tokens.len())),
    }
}

macro_rules! from_str_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl Scalar for $ty {
            fn from_token(token: &str) -> Result<Self, String> {
                <$ty as FromStr>::from_str(token).map_err(|e| format!("\"{token}\": {e}"))
            }
        }

        impl ArgValue for $ty {
            const DEFAULT_ARITY: (usize, Option<usize>) = (1, Some(0));

            fn from_tokens(tokens: &[String]) -> Result<Self, String> {
                single(tokens)
            }
        }
    )+};
}

from_str_scalar!(
    String, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    PathBuf,
);

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
impl Scalar for bool {
    fn from_token(token: &str) -> Result<Self, String> {
        match token {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            other => Err(format!("\"{other}\" is not a boolean")),
        }
    }
}

impl ArgValue for bool {
    const DEFAULT_ARITY: (usize, Option<usize>) = (1, Some(0));

    fn from_tokens(tokens: &[String]) -> Result<Self, String> {
        single(tokens)
    }
}

impl<T: Scalar> ArgValue for Vec<T> {
    const DEFAULT_ARITY: (usize, Option<usize>) = (1, None);

    fn from_tokens(tokens: &[String]) -> Result<Self, String> {
        tokens.iter().map(|t| T::from_token(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(i64::from_tokens(&toks(&["-3"])), Ok(-3));
        assert_eq!(char::from_tokens(&toks(&["x"])), Ok('x'));
        assert_eq!(f64::from_tokens(&toks(&["2.5"])), Ok(2.5));
        assert_eq!(
            PathBuf::from_tokens(&toks(&["/tmp"])),
            Ok(PathBuf::from("/tmp"))
        );
        assert!(u8::from_tokens(&toks(&["300"])).is_err());
        assert!(i32::from_tokens(&toks(&["1", "2"])).is_err());
    }

    #[test]
    fn test_bool() {
        assert_eq!(bool::from_token("T"), Ok(true));
        assert_eq!(bool::from_token("0"), Ok(false));
        assert!(bool::from_token("yes").is_err());
    }

    #[test]
    fn test_list() {
        assert_eq!(
            Vec::<u32>::from_tokens(&toks(&["1", "2"])),
            Ok(vec![1, 2])
        );
        let err = Vec::<u32>::from_tokens(&toks(&["1", "x"])).unwrap_err();
        assert!(err.contains("\"x\""));
        assert_eq!(<Vec<u32> as ArgValue>::DEFAULT_ARITY, (1, None));
    }
}
