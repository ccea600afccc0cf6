/// Usage documents: built while a usage traversal descends, rendered at the end.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::errors::{Error, Result};
use crate::settings::UsageSettings;

/// Glyph placed where subcommand branches start.
pub const BRANCH_SYMBOL: &str = "┳";

/// An argument description row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgEntry {
    pub name: String,
    pub description: String,
}

/// A flag description row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub description: String,
}

/// One documented branch of a branch node.
#[derive(Debug, Clone, Serialize)]
pub struct BranchUsage {
    /// Canonical name first, then synonyms.
    pub names: Vec<String>,
    pub usage: Usage,
}

/// The usage document.
///
/// Every name placed in the argument or flag table also appears as a usage
/// token, unless it was explicitly suppressed; [`Usage::check_consistency`]
/// verifies this.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    tokens: Vec<String>,
    flag_tokens: Vec<String>,
    arguments: Vec<ArgEntry>,
    flags: Vec<FlagEntry>,
    symbols: BTreeMap<String, String>,
    branches: Vec<BranchUsage>,
    #[serde(skip)]
    names: BTreeSet<String>,
    #[serde(skip)]
    suppressed: BTreeSet<String>,
}

impl Usage {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description. The first description set wins.
    pub fn set_description(&mut self, description: impl Into<String>) {
        if self.description.is_none() {
            self.description = Some(description.into());
        }
    }

    /// Append an argument token and, if given, its description row.
    pub fn add_arg(&mut self, name: &str, display: impl Into<String>, description: Option<&str>) {
        let display = display.into();
        if !display.is_empty() {
            self.tokens.push(display);
        }
        self.names.insert(name.to_owned());
        if let Some(description) = description {
            self.describe_arg(name, description);
        }
    }

    /// Append a literal token (branch markers, fixed words).
    pub fn add_literal(&mut self, text: impl Into<String>) {
        self.tokens.push(text.into());
    }

    /// Add an argument description row on its own.
    ///
    /// The name must also be added as a token or suppressed, otherwise
    /// [`Usage::check_consistency`] fails.
    pub fn describe_arg(&mut self, name: &str, description: &str) {
        if self.arguments.iter().any(|a| a.name == name) {
            return;
        }
        self.arguments.push(ArgEntry {
            name: name.to_owned(),
            description: description.to_owned(),
        });
    }

    /// Append a flag token and its description row. Rows stay name-sorted.
    pub fn add_flag(
        &mut self,
        name: &str,
        short: Option<char>,
        display: impl Into<String>,
        description: &str,
    ) {
        self.flag_tokens.push(display.into());
        self.names.insert(name.to_owned());
        self.insert_flag_entry(FlagEntry {
            name: name.to_owned(),
            short,
            description: description.to_owned(),
        });
    }

    fn insert_flag_entry(&mut self, entry: FlagEntry) {
        match self.flags.binary_search_by(|f| f.name.cmp(&entry.name)) {
            Ok(_) => {}
            Err(pos) => self.flags.insert(pos, entry),
        }
    }

    /// Mark `name` as intentionally absent from the token line.
    pub fn suppress(&mut self, name: &str) {
        self.suppressed.insert(name.to_owned());
    }

    /// Add a symbol legend entry.
    pub fn add_symbol(&mut self, glyph: impl Into<String>, meaning: impl Into<String>) {
        self.symbols.insert(glyph.into(), meaning.into());
    }

    /// Record a branch's own usage and fold its tables into this document.
    pub fn add_branch(&mut self, names: Vec<String>, branch: Usage) {
        for entry in &branch.arguments {
            self.describe_arg(&entry.name, &entry.description);
        }
        for entry in &branch.flags {
            self.insert_flag_entry(entry.clone());
        }
        self.symbols
            .extend(branch.symbols.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.names.extend(branch.names.iter().cloned());
        self.suppressed.extend(branch.suppressed.iter().cloned());
        self.branches.push(BranchUsage {
            names,
            usage: branch,
        });
    }

    /// The description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Positional and literal tokens, in order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Flag tokens, in the order they were added.
    #[must_use]
    pub fn flag_tokens(&self) -> &[String] {
        &self.flag_tokens
    }

    /// Argument description rows.
    #[must_use]
    pub fn arguments(&self) -> &[ArgEntry] {
        &self.arguments
    }

    /// Flag description rows, sorted by name.
    #[must_use]
    pub fn flags(&self) -> &[FlagEntry] {
        &self.flags
    }

    /// Symbol legend.
    #[must_use]
    pub fn symbols(&self) -> &BTreeMap<String, String> {
        &self.symbols
    }

    /// Documented branches, in display order.
    #[must_use]
    pub fn branches(&self) -> &[BranchUsage] {
        &self.branches
    }

    /// Verify that table rows and usage tokens agree.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGraph` naming the first row without a token.
    pub fn check_consistency(&self) -> Result<()> {
        let known = |name: &str| self.names.contains(name) || self.suppressed.contains(name);
        let orphan = self
            .arguments
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.flags.iter().map(|f| f.name.as_str()))
            .find(|name| !known(name));
        match orphan {
            Some(name) => Err(Error::InvalidGraph(format!(
                "usage table entry \"{name}\" has no usage token"
            ))),
            None => Ok(()),
        }
    }

    fn head(&self) -> Vec<&str> {
        let mut head: Vec<&str> = self
            .tokens
            .iter()
            .chain(&self.flag_tokens)
            .map(String::as_str)
            .collect();
        if !self.branches.is_empty() {
            head.push(BRANCH_SYMBOL);
        }
        head
    }

    /// Render the document as text.
    #[must_use]
    pub fn render(&self, settings: &UsageSettings) -> String {
        let mut lines: Vec<String> = Vec::new();
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        let head = self.head();
        if !head.is_empty() {
            lines.push(head.join(" "));
        }
        let count = self.branches.len();
        for (i, branch) in self.branches.iter().enumerate() {
            render_branch(branch, "", i + 1 == count, &mut lines);
        }

        if settings.show_arguments && !self.arguments.is_empty() {
            lines.push(String::new());
            lines.push("Arguments:".to_owned());
            for arg in &self.arguments {
                lines.push(format!("  {}: {}", arg.name.to_uppercase(), arg.description));
            }
        }

        if settings.show_flags && !self.flags.is_empty() {
            lines.push(String::new());
            lines.push("Flags:".to_owned());
            for flag in &self.flags {
                let short = flag.short.map_or_else(|| "   ".to_owned(), |c| format!("[{c}]"));
                lines.push(format!("  {short} {}: {}", flag.name, flag.description));
            }
        }

        if settings.show_symbols && !self.symbols.is_empty() {
            lines.push(String::new());
            lines.push("Symbols:".to_owned());
            for (glyph, meaning) in &self.symbols {
                lines.push(format!("  {glyph}: {meaning}"));
            }
        }

        lines.join("\n")
    }
}

fn render_branch(branch: &BranchUsage, prefix: &str, is_last: bool, lines: &mut Vec<String>) {
    let connector = if is_last { "└── " } else { "├── " };
    let mut line = format!("{prefix}{connector}{}", branch.names.join("|"));
    let head = branch.usage.head();
    if !head.is_empty() {
        line.push(' ');
        line.push_str(&head.join(" "));
    }
    lines.push(line);

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    if let Some(description) = &branch.usage.description {
        lines.push(format!("{child_prefix}  {description}"));
    }
    let child_count = branch.usage.branches.len();
    for (i, child) in branch.usage.branches.iter().enumerate() {
        render_branch(child, &child_prefix, i + 1 == child_count, lines);
    }
}

/// Placeholder text for an argument of arity `[min, min + optional]`.
///
/// `optional == None` means unbounded.
#[must_use]
pub fn arity_display(label: &str, min: usize, optional: Option<usize>) -> String {
    let mut parts: Vec<String> = std::iter::repeat_n(label.to_owned(), min).collect();
    match optional {
        Some(0) => {}
        Some(n) => {
            let optional_part = std::iter::repeat_n(label, n).collect::<Vec<_>>().join(" ");
            parts.push(format!("[ {optional_part} ]"));
        }
        None => parts.push(format!("[ {label} ... ]")),
    }
    parts.join(" ")
}
