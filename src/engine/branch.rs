/// Branch selection: the node used for subcommands.
///
/// Resolution of the branch token (in priority order):
///
/// 1. **Canonical name**: the first word of a branch key (`"remove rm del"`
///    registers `remove`).
/// 2. **Synonym**: any other word of a key, or a name added through
///    [`BranchNode::synonyms`]. Resolves to its canonical branch.
/// 3. **Default**: if nothing matched and a default node exists, descend into
///    it without consuming the token.
/// 4. **Branching error**: otherwise, naming the valid choices.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::complete::Completion;
use super::data::Data;
use super::errors::{Error, Result};
use super::output::Output;
use super::processor::{ExecuteData, Node, Processor};
use super::stream::TokenStream;
use super::traverse::{complete_walk, usage_walk};
use super::usage::{BRANCH_SYMBOL, Usage};

/// A node that selects one of several subgraphs by the next token.
#[derive(Default)]
pub struct BranchNode {
    branches: BTreeMap<String, Box<dyn Node>>,
    /// Synonym -> canonical name.
    synonyms: BTreeMap<String, String>,
    /// Canonical name -> synonyms, in declaration order.
    synonyms_of: BTreeMap<String, Vec<String>>,
    default: Option<Box<dyn Node>>,
    display_order: Option<Vec<String>>,
    /// Names registered more than once; reported by [`BranchNode::validate`].
    conflicts: Vec<String>,
}

impl fmt::Debug for BranchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNode")
            .field("branches", &self.branches.keys().collect::<Vec<_>>())
            .field("synonyms", &self.synonyms)
            .field("has_default", &self.default.is_some())
            .field("display_order", &self.display_order)
            .finish()
    }
}

impl BranchNode {
    /// Create a branch node with no branches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a branch. `key` is split on whitespace: the first word is the
    /// canonical name, the rest are synonyms.
    #[must_use]
    pub fn branch(mut self, key: &str, node: Box<dyn Node>) -> Self {
        let mut words = key.split_whitespace();
        let Some(canonical) = words.next() else {
            self.conflicts.push(key.to_owned());
            return self;
        };
        let canonical = canonical.to_owned();
        if self.is_known(&canonical) {
            self.conflicts.push(canonical.clone());
        }
        self.branches.insert(canonical.clone(), node);
        let rest: Vec<&str> = words.collect();
        self.add_synonyms(&canonical, &rest);
        self
    }

    /// Add synonyms for an already registered canonical name.
    #[must_use]
    pub fn synonyms(mut self, canonical: &str, names: &[&str]) -> Self {
        self.add_synonyms(canonical, names);
        self
    }

    fn add_synonyms(&mut self, canonical: &str, names: &[&str]) {
        for &name in names {
            if self.is_known(name) {
                self.conflicts.push(name.to_owned());
                continue;
            }
            self.synonyms.insert(name.to_owned(), canonical.to_owned());
            self.synonyms_of
                .entry(canonical.to_owned())
                .or_default()
                .push(name.to_owned());
        }
    }

    fn is_known(&self, name: &str) -> bool {
        self.branches.contains_key(name) || self.synonyms.contains_key(name)
    }

    /// Node taken when the next token names no branch.
    #[must_use]
    pub fn with_default(mut self, node: Box<dyn Node>) -> Self {
        self.default = Some(node);
        self
    }

    /// Order in which usage lists the branches. Must name every branch once.
    #[must_use]
    pub fn display_order(mut self, order: &[&str]) -> Self {
        self.display_order = Some(order.iter().map(|&s| s.to_owned()).collect());
        self
    }

    /// Check the definition: no name registered twice, every synonym points
    /// at a branch, and the display order is a permutation of the branches.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGraph` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.conflicts.first() {
            return Err(Error::InvalidGraph(format!(
                "branch name \"{name}\" is registered more than once"
            )));
        }
        if let Some((synonym, canonical)) = self
            .synonyms
            .iter()
            .find(|(_, canonical)| !self.branches.contains_key(*canonical))
        {
            return Err(Error::InvalidGraph(format!(
                "synonym \"{synonym}\" refers to unknown branch \"{canonical}\""
            )));
        }
        if let Some(order) = &self.display_order {
            let mut seen = BTreeSet::new();
            for name in order {
                if !self.branches.contains_key(name) {
                    return Err(Error::InvalidGraph(format!(
                        "display order names unknown branch \"{name}\""
                    )));
                }
                if !seen.insert(name.as_str()) {
                    return Err(Error::InvalidGraph(format!(
                        "display order lists branch \"{name}\" twice"
                    )));
                }
            }
            if let Some(missing) = self.branches.keys().find(|k| !seen.contains(k.as_str())) {
                return Err(Error::InvalidGraph(format!(
                    "display order is missing branch \"{missing}\""
                )));
            }
        }
        Ok(())
    }

    /// Canonical branch names, sorted.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    fn ordered_names(&self) -> Vec<&str> {
        match &self.display_order {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => self.branches.keys().map(String::as_str).collect(),
        }
    }

    /// Resolve `token` to its canonical name and node.
    fn resolve(&self, token: &str) -> Option<(&str, &dyn Node)> {
        let canonical = self.synonyms.get(token).map_or(token, String::as_str);
        self.branches
            .get_key_value(canonical)
            .map(|(name, node)| (name.as_str(), node.as_ref()))
    }
}

impl Processor for BranchNode {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        _data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        self.validate()
    }

    /// Suggest branch names (and whatever the default would suggest) when the
    /// branch token is the one being completed.
    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        if input.len() != 1 {
            return Ok(None);
        }
        let partial = input.peek().map_or_else(String::new, str::to_owned);
        let mut suggestions = self.choices();
        if let Some(default) = &self.default {
            let mut sub = input.clone();
            match complete_walk(default.as_ref(), &mut sub, data) {
                Ok(Some(completion)) => suggestions.extend(completion.suggestions),
                Ok(None) => {}
                Err(err) => tracing::debug!(error = %err, "default branch completion failed"),
            }
        }
        Ok(Some(Completion::new(suggestions).for_partial(partial)))
    }

    /// Document the default node inline, then every branch as a subtree.
    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()> {
        self.validate()?;
        if let Some(default) = &self.default {
            // A branch token belongs to the branch, not to the default's arguments.
            if input.peek().and_then(|token| self.resolve(token)).is_some() {
                usage_walk(default.as_ref(), &mut TokenStream::default(), data, usage)?;
            } else {
                usage_walk(default.as_ref(), input, data, usage)?;
            }
        }
        for name in self.ordered_names() {
            let Some(node) = self.branches.get(name) else {
                continue;
            };
            let mut branch_usage = Usage::new();
            usage_walk(
                node.as_ref(),
                &mut TokenStream::default(),
                &mut Data::new(),
                &mut branch_usage,
            )
            .map_err(|err| Error::annotate(format!("failed to get usage for branch {name}"), err))?;
            let mut names = vec![name.to_owned()];
            if let Some(synonyms) = self.synonyms_of.get(name) {
                names.extend(synonyms.iter().cloned());
            }
            usage.add_branch(names, branch_usage);
        }
        if !self.branches.is_empty() {
            usage.add_symbol(BRANCH_SYMBOL, "Start of subcommand branches");
        }
        Ok(())
    }
}

impl Node for BranchNode {
    fn next(&self, input: &mut TokenStream, _data: &mut Data) -> Result<Option<&dyn Node>> {
        if let Some((name, node)) = input.peek().and_then(|token| self.resolve(token)) {
            tracing::debug!(branch = name, "selected branch");
            input.pop();
            return Ok(Some(node));
        }
        if let Some(default) = &self.default {
            tracing::debug!("selected default branch");
            return Ok(Some(default.as_ref()));
        }
        Err(Error::Branching {
            token: input.peek().map(str::to_owned),
            choices: self.choices(),
        })
    }

    /// Usage already walked every branch.
    fn usage_next(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<&dyn Node>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::output::BufferedOutput;
    use crate::engine::serial::{Description, SimpleProcessor};
    use crate::engine::traverse::execute_walk;
    use crate::settings::{CompletionSettings, UsageSettings};

    fn marker(name: &'static str) -> Box<dyn Node> {
        crate::serial![SimpleProcessor::new(move |_, _, data, _| {
            data.set("picked", name.to_owned());
            Ok(())
        })]
    }

    fn tree() -> BranchNode {
        BranchNode::new()
            .branch("add a", marker("add"))
            .branch("remove rm del", marker("remove"))
            .with_default(marker("default"))
    }

    fn run(node: &BranchNode, args: &[&str]) -> Result<Data> {
        let mut data = Data::new();
        execute_walk(
            node,
            &mut TokenStream::new(args.iter().copied()),
            &mut BufferedOutput::new(),
            &mut data,
            &mut ExecuteData::new(),
        )?;
        Ok(data)
    }

    #[test]
    fn test_select_by_name_and_synonym() {
        let node = tree();
        assert_eq!(run(&node, &["add"]).unwrap().string("picked"), "add");
        assert_eq!(run(&node, &["rm"]).unwrap().string("picked"), "remove");
        assert_eq!(run(&node, &["del"]).unwrap().string("picked"), "remove");
    }

    #[test]
    fn test_default_does_not_consume() {
        let node = tree();
        assert_eq!(run(&node, &[]).unwrap().string("picked"), "default");
        let err = run(&node, &["other"]).unwrap_err();
        assert!(err.is_extra_args());
    }

    #[test]
    fn test_branching_error_without_default() {
        let node = BranchNode::new()
            .branch("a", marker("a"))
            .branch("b", marker("b"));
        let err = run(&node, &["c"]).unwrap_err();
        assert!(err.is_branching());
        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "Branching argument must be one of [a b], got \"c\""
        );
    }

    #[test]
    fn test_validate_display_order() {
        let base = || {
            BranchNode::new()
                .branch("a", marker("a"))
                .branch("b", marker("b"))
        };
        assert!(base().display_order(&["b", "a"]).validate().is_ok());
        assert!(base().display_order(&["a"]).validate().is_err());
        assert!(base().display_order(&["a", "a", "b"]).validate().is_err());
        assert!(base().display_order(&["a", "b", "c"]).validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let node = BranchNode::new()
            .branch("a x", marker("a"))
            .branch("x", marker("x"));
        assert!(matches!(node.validate(), Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn test_complete_branch_names() {
        let node = tree();
        let mut data = Data::new();
        let completion = complete_walk(&node, &mut TokenStream::new(["r"]), &mut data)
            .unwrap()
            .unwrap();
        assert_eq!(completion.process(&CompletionSettings::default()), ["remove"]);
    }

    #[test]
    fn test_usage_lists_every_branch_in_order() {
        let node = BranchNode::new()
            .branch("a", crate::serial![Description::new("Alpha")])
            .branch("b", crate::serial![Description::new("Beta")])
            .with_default(crate::serial![Description::new("Default behavior")])
            .display_order(&["b", "a"]);
        let mut usage = Usage::new();
        usage_walk(&node, &mut TokenStream::default(), &mut Data::new(), &mut usage).unwrap();
        let text = usage.render(&UsageSettings::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Default behavior");
        assert_eq!(lines[1], BRANCH_SYMBOL);
        assert_eq!(lines[2], "├── b");
        assert_eq!(lines[3], "│     Beta");
        assert_eq!(lines[4], "└── a");
        assert_eq!(lines[5], "      Alpha");
    }

    #[test]
    fn test_usage_keeps_default_tokens_when_input_names_a_branch() {
        let node = BranchNode::new()
            .branch("a", crate::serial![Description::new("Alpha")])
            .branch("b", crate::serial![Description::new("Beta")])
            .with_default(crate::serial![
                Description::new("Default behavior"),
                crate::args::Argument::<String>::new("path", "A path")
            ]);
        let usage_for = |args: &[&str]| {
            let mut usage = Usage::new();
            usage_walk(
                &node,
                &mut TokenStream::new(args.iter().copied()),
                &mut Data::new(),
                &mut usage,
            )
            .unwrap();
            usage
        };
        let bare = usage_for(&[]);
        assert_eq!(bare.tokens(), ["PATH"]);
        assert_eq!(usage_for(&["a"]).tokens(), bare.tokens());
        assert_eq!(usage_for(&["b"]).tokens(), bare.tokens());
    }
}
