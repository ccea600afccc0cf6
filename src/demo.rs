/// The demo grammar driven by the binary: a small notes manager.
///
/// ```text
/// notes add TEXT ... [--tag|-t TAG] [--priority|-p N] [--pin|-P]
/// notes [list|ls] [ORDER] [--tag|-t TAG] [--limit|-n N]
/// notes remove|rm ID ...
/// notes open DIR
/// ```
///
/// Notes live in a fixed in-memory sample, so every command is safe to run.
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::PathBuf;

use cmdgraph::args::{transform, validate};
use cmdgraph::{
    Argument, BoolFlag, BranchNode, Data, DeferredExecutor, Description, Error, ExecutableLines,
    Flag, FlagProcessor, FunctionWrap, ItemizedListFlag, MapArg, Node, Output, Result,
    SimpleCompleter, serial,
};

const TAGS: [&str; 4] = ["home", "idea", "urgent", "work"];

struct Note {
    id: u32,
    text: &'static str,
    tags: &'static [&'static str],
    priority: u32,
}

static NOTES: [Note; 4] = [
    Note {
        id: 1,
        text: "renew passport",
        tags: &["home", "urgent"],
        priority: 5,
    },
    Note {
        id: 2,
        text: "draft quarterly report",
        tags: &["work"],
        priority: 3,
    },
    Note {
        id: 3,
        text: "shell completion for the notes tool",
        tags: &["idea", "work"],
        priority: 2,
    },
    Note {
        id: 4,
        text: "fix the garden gate",
        tags: &["home"],
        priority: 1,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Newest,
    Oldest,
    Priority,
}

/// Build the notes graph.
///
/// # Errors
///
/// Returns `Error::InvalidGraph` if a flag set is malformed.
pub fn build() -> Result<Box<dyn Node>> {
    let branches = BranchNode::new()
        .branch("add", add()?)
        .branch("list ls", list()?)
        .branch("remove rm", remove())
        .branch("open", open())
        .with_default(list()?)
        .display_order(&["add", "list", "remove", "open"]);
    Ok(serial![
        Description::new("Keep short notes from the command line") => Box::new(branches)
    ])
}

fn tag_flag() -> ItemizedListFlag<String> {
    ItemizedListFlag::new("tag", Some('t'), "Tag (repeatable)")
        .with_transformer(transform::for_each(transform::to_lower()))
        .with_completer(SimpleCompleter::new(TAGS).distinct())
}

// --- add ---

fn add() -> Result<Box<dyn Node>> {
    let flags = FlagProcessor::new(vec![
        Box::new(tag_flag()),
        Box::new(
            Flag::<u32>::new("priority", Some('p'), "Priority from 1 to 5")
                .with_default(3)
                .with_validator(validate::at_least(1))
                .with_validator(validate::at_most(5))
                .with_completer(SimpleCompleter::new(["1", "2", "3", "4", "5"])),
        ),
        Box::new(BoolFlag::new("pin", Some('P'), "Pin the note to the top")),
    ])?;
    let text = Argument::<Vec<String>>::list("text", "Note text", 1, None)
        .with_transformer(transform::for_each(transform::trim()));
    Ok(serial![
        Description::new("Add a note"),
        flags,
        text,
        DeferredExecutor::new(report_added)
    ])
}

fn report_added(output: &mut dyn Output, data: &Data) -> Result<()> {
    let text = data.string_list("text").join(" ");
    let priority = data.get::<u32>("priority").copied().unwrap_or_default();
    let id = NOTES.iter().map(|n| n.id).max().unwrap_or_default() + 1;
    let mut line = format!("added note {id}: {text} (priority {priority}");
    let tags = data.string_list("tag");
    if !tags.is_empty() {
        line.push_str(&format!(", tags: {}", tags.join(", ")));
    }
    line.push(')');
    if data.bool("pin") {
        line.push_str(" [pinned]");
    }
    output.stdout(&line);
    Ok(())
}

// --- list ---

fn list() -> Result<Box<dyn Node>> {
    let orders = BTreeMap::from([
        ("newest".to_owned(), Order::Newest),
        ("oldest".to_owned(), Order::Oldest),
        ("priority".to_owned(), Order::Priority),
    ]);
    let flags = FlagProcessor::new(vec![
        Box::new(tag_flag()),
        Box::new(
            Flag::<usize>::new("limit", Some('n'), "Show at most N notes")
                .with_validator(validate::positive()),
        ),
    ])?;
    Ok(serial![
        Description::new("List notes"),
        flags,
        MapArg::new("order", "Sort order", orders).optional(),
        DeferredExecutor::new(report_listed)
    ])
}

fn report_listed(output: &mut dyn Output, data: &Data) -> Result<()> {
    let tags = data.string_list("tag");
    let mut notes: Vec<&Note> = NOTES
        .iter()
        .filter(|n| tags.is_empty() || tags.iter().any(|t| n.tags.contains(&t.as_str())))
        .collect();
    match data.get::<Order>("order").copied().unwrap_or(Order::Newest) {
        Order::Newest => notes.sort_by_key(|n| Reverse(n.id)),
        Order::Oldest => notes.sort_by_key(|n| n.id),
        Order::Priority => notes.sort_by_key(|n| (Reverse(n.priority), n.id)),
    }
    if let Some(limit) = data.get::<usize>("limit") {
        notes.truncate(*limit);
    }
    for note in notes {
        output.stdout(&format!(
            "{:>3}  {}  [{}]",
            note.id,
            note.text,
            note.tags.join(", ")
        ));
    }
    Ok(())
}

// --- remove ---

fn remove() -> Box<dyn Node> {
    let ids = Argument::<Vec<u32>>::list("id", "Ids of the notes to remove", 1, None)
        .with_validator(validate::for_each(validate::positive()))
        .with_completer(SimpleCompleter::new(NOTES.iter().map(|n| n.id.to_string())).distinct());
    serial![
        Description::new("Remove notes by id"),
        ids,
        DeferredExecutor::new(|output, data| {
            let ids = data.get::<Vec<u32>>("id").map_or(&[][..], Vec::as_slice);
            for id in ids {
                if !NOTES.iter().any(|n| n.id == *id) {
                    return Err(Error::msg(format!("no note with id {id}")));
                }
            }
            for id in ids {
                output.stdout(&format!("removed note {id}"));
            }
            Ok(())
        })
    ]
}

// --- open ---

fn open() -> Box<dyn Node> {
    let dir = Argument::<PathBuf>::new("dir", "Directory holding the notes")
        .with_validator(validate::is_dir());
    serial![
        Description::new("Print shell lines that change into the notes directory"),
        dir,
        ExecutableLines::new(|data| {
            let dir = data
                .get::<PathBuf>("dir")
                .ok_or_else(|| Error::msg("no directory given"))?;
            Ok(vec![format!("cd {}", dir.display())])
        }),
        FunctionWrap
    ]
}
