//! End-to-end behavior of the engine through the public API.
use std::cell::Cell;
use std::rc::Rc;

use cmdgraph::args::validate;
use cmdgraph::engine::BRANCH_SYMBOL;
use cmdgraph::runner;
use cmdgraph::{
    Argument, BoolFlag, BranchNode, BufferedOutput, Description, Error, FlagProcessor, Node,
    Settings, TokenStream, Validator, serial,
};

fn execute(root: &dyn Node, args: &[&str]) -> cmdgraph::Result<runner::Outcome> {
    runner::execute(root, args, &mut BufferedOutput::new())
}

// --- Stream consumption ---

#[test]
fn test_consumed_stream_has_no_extra_args() {
    let root = serial![
        Argument::<String>::new("a", ""),
        Argument::<Vec<i64>>::list("rest", "", 0, None)
    ];
    for args in [&["x"][..], &["x", "1"], &["x", "1", "2", "3"]] {
        let outcome = execute(root.as_ref(), args).unwrap();
        assert_eq!(outcome.data.string("a"), "x");
    }

    let bounded = serial![Argument::<String>::new("a", "")];
    let err = execute(bounded.as_ref(), &["x", "y"]).unwrap_err();
    assert!(matches!(&err, Error::ExtraArgs { remaining, node: 1 } if remaining == &["y"]));
}

#[test]
fn test_snapshot_round_trip() {
    let mut stream = TokenStream::new(["cmd", "alias", "tail"]);
    stream.pop();
    let id = stream.snapshot();
    stream.pop();
    stream.push_front(["expanded", "alias"]);
    stream.push_front(["more"]);

    let first = stream.get_snapshot(id);
    assert_eq!(first, ["alias", "more", "expanded", "alias", "tail"]);
    assert_eq!(stream.get_snapshot(id), first);
    assert_eq!(stream.remaining(), ["more", "expanded", "alias", "tail"]);
}

// --- Flags ---

fn new_and_dry() -> FlagProcessor {
    FlagProcessor::new(vec![
        Box::new(BoolFlag::new("new", Some('n'), "")),
        Box::new(BoolFlag::new("dry", Some('d'), "")),
    ])
    .unwrap()
}

#[test]
fn test_multi_flag_all_or_nothing() {
    let root = serial![new_and_dry()];
    let outcome = execute(root.as_ref(), &["-nd"]).unwrap();
    assert!(outcome.data.bool("new"));
    assert!(outcome.data.bool("dry"));

    let only_new = FlagProcessor::new(vec![Box::new(BoolFlag::new("new", Some('n'), ""))]).unwrap();
    let root = serial![only_new, Argument::<String>::new("word", "")];
    let outcome = execute(root.as_ref(), &["-xy"]).unwrap();
    assert_eq!(outcome.data.string("word"), "-xy");
    assert!(!outcome.data.bool("new"));

    let err = execute(root.as_ref(), &["-nx"]).unwrap_err();
    assert!(err.is_ambiguous_multi_flag());
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_missing_flags_documented_by_name() {
    let flags = FlagProcessor::new(vec![
        Box::new(BoolFlag::new("second", Some('a'), "Second")),
        Box::new(BoolFlag::new("first", Some('b'), "First")),
    ])
    .unwrap();
    let root = serial![flags];
    let usage = runner::usage::<&str>(root.as_ref(), &[]).unwrap();
    let names: Vec<&str> = usage.flags().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    let text = usage.render(&Settings::default().usage);
    assert!(text.ends_with("Flags:\n  [b] first: First\n  [a] second: Second"));
}

// --- Arguments ---

#[test]
fn test_list_arity_boundary() {
    let root = serial![
        Argument::<Vec<String>>::list("items", "", 2, Some(1)),
        Argument::<Vec<String>>::list("rest", "", 0, None)
    ];
    let outcome = execute(root.as_ref(), &["a", "b"]).unwrap();
    assert_eq!(outcome.data.string_list("items"), ["a", "b"]);

    let outcome = execute(root.as_ref(), &["a", "b", "c"]).unwrap();
    assert_eq!(outcome.data.string_list("items"), ["a", "b", "c"]);

    let outcome = execute(root.as_ref(), &["a", "b", "c", "d"]).unwrap();
    assert_eq!(outcome.data.string_list("items"), ["a", "b", "c"]);
    assert_eq!(outcome.data.string_list("rest"), ["d"]);

    let err = execute(root.as_ref(), &["a"]).unwrap_err();
    assert!(matches!(err, Error::NotEnoughArgs { min: 2, got: 1, .. }));
}

#[test]
fn test_validator_short_circuit() {
    let spy_calls = Rc::new(Cell::new(0));
    let calls = Rc::clone(&spy_calls);
    let spy = Validator::new("Spy", move |_: &String, _| {
        calls.set(calls.get() + 1);
        Ok(())
    });
    let root = serial![
        Argument::<String>::new("s", "")
            .with_validator(validate::min_length(3))
            .with_validator(validate::contains("X"))
            .with_validator(spy)
    ];
    let err = execute(root.as_ref(), &["ab"]).unwrap_err();
    match &err {
        Error::Validation { validator, .. } => assert_eq!(validator, "MinLength(3)"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(spy_calls.get(), 0);

    execute(root.as_ref(), &["abX"]).unwrap();
    assert_eq!(spy_calls.get(), 1);
}

// --- Branches ---

#[test]
fn test_branch_usage_is_complete() {
    let node = BranchNode::new()
        .branch("a", serial![Description::new("First"), Argument::<String>::new("x", "An x")])
        .branch("b", serial![Description::new("Second")])
        .with_default(serial![
            Description::new("Default behavior"),
            Argument::<String>::new("path", "A path")
        ]);
    let root = serial![Description::new("Root") => Box::new(node)];

    for args in [&[][..], &["a"], &["b", "zzz"]] {
        let usage = runner::usage(root.as_ref(), args).unwrap();
        let names: Vec<&str> = usage
            .branches()
            .iter()
            .map(|b| b.names[0].as_str())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    let branch_only = BranchNode::new()
        .branch("a", serial![Description::new("First")])
        .branch("b", serial![Description::new("Second")])
        .with_default(serial![
            Description::new("Default behavior"),
            Argument::<String>::new("path", "A path")
        ]);
    let text = runner::usage::<&str>(&branch_only, &[])
        .unwrap()
        .render(&Settings::default().usage);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Default behavior");
    assert_eq!(lines[1], format!("PATH {BRANCH_SYMBOL}"));
    assert_eq!(lines[2], "├── a");
    assert_eq!(lines[3], "│     First");
    assert_eq!(lines[4], "└── b");
    assert_eq!(lines[5], "      Second");
}

#[test]
fn test_branching_error_names_choices() {
    let node = BranchNode::new()
        .branch("add", serial![])
        .branch("remove rm", serial![]);
    let err = execute(&node, &["nope"]).unwrap_err();
    assert!(err.is_branching());
    assert_eq!(
        err.to_string(),
        "Branching argument must be one of [add remove], got \"nope\""
    );

    execute(&node, &["rm"]).unwrap();
}

// --- Completion and reporting ---

#[test]
fn test_autocomplete_from_comp_line() {
    let tags = FlagProcessor::new(vec![Box::new(
        cmdgraph::ItemizedListFlag::<String>::new("tag", Some('t'), "")
            .with_completer(cmdgraph::SimpleCompleter::new(["one", "two words"]).distinct()),
    )])
    .unwrap();
    let root = serial![tags];
    let settings = Settings::default();
    assert_eq!(
        runner::autocomplete(root.as_ref(), "prog -t one -t ", &settings).unwrap(),
        ["two\\ words"]
    );
    assert_eq!(
        runner::autocomplete(root.as_ref(), "prog --t", &settings).unwrap(),
        ["--tag"]
    );
}

#[test]
fn test_run_reports_message_then_usage() {
    let root = serial![Description::new("Needs a name"), Argument::<String>::new("name", "")];
    let mut out = BufferedOutput::new();
    let err = runner::run::<&str>(root.as_ref(), &[], &mut out, &Settings::default()).unwrap_err();
    assert!(err.is_usage());
    assert_eq!(out.stderr[0], err.to_string());
    assert!(out.stderr.iter().any(|l| l == "Needs a name"));
    assert!(out.stdout.is_empty());
}
