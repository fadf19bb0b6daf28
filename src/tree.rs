//! Section/Command registry
//!
//! A minimal ordered tree: sections hold named commands and named
//! subsections. Registration mutates the tree; after install the host only
//! reads it, so no locking is involved. Child order is preserved for help
//! output while lookups stay name-keyed. Sibling names must be unique within
//! each mapping independently, so a command and a subsection may share a
//! name without collision.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ClientContext;
use crate::error::{CommandError, RegistryError};

/// The closed set of command variants this plugin installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Update,
    Delete,
    List,
    Copy,
    Remove,
    ContentSearch,
    RunSync,
    RunPublish,
}

/// What a command hands back to the host for rendering.
#[derive(Debug)]
pub enum Outcome {
    Done,
    Message(String),
    Records(Vec<serde_json::Value>),
}

/// Arguments the host parsed for a single command invocation: positional
/// values, `--key value` options, and bare `--flag` switches.
#[derive(Debug, Default, Clone)]
pub struct CommandArgs {
    positional: Vec<String>,
    options: HashMap<String, String>,
    flags: Vec<String>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw CLI tokens. A `--name` followed by a non-flag token is an
    /// option; a `--name` followed by another flag (or nothing) is a switch.
    pub fn parse_tokens(tokens: &[String]) -> Self {
        let mut args = Self::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if let Some(name) = token.strip_prefix("--") {
                match tokens.get(i + 1) {
                    Some(value) if !value.starts_with("--") => {
                        args.options.insert(name.to_string(), value.clone());
                        i += 2;
                    }
                    _ => {
                        args.flags.push(name.to_string());
                        i += 1;
                    }
                }
            } else {
                args.positional.push(token.clone());
                i += 1;
            }
        }
        args
    }

    pub fn set_option(&mut self, name: &str, value: &str) {
        self.options.insert(name.to_string(), value.to_string());
    }

    pub fn set_flag(&mut self, name: &str) {
        self.flags.push(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &'static str) -> Result<&str, CommandError> {
        self.get(name).ok_or(CommandError::MissingOption(name))
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }
}

/// A named, described unit of executable behavior bound to the shared
/// context. Identity (name, kind, context binding) is fixed at construction.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn kind(&self) -> CommandKind;

    /// The shared context this command was bound to at registration.
    fn context(&self) -> &Arc<ClientContext>;

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError>;
}

/// A named node in the command tree. Owns its commands and subsections
/// exclusively; there are no parent back-references, so traversal is
/// strictly top-down and cycles cannot form.
pub struct Section {
    name: String,
    description: String,
    commands: Vec<Arc<dyn Command>>,
    subsections: Vec<Section>,
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.name)
            .field("description", &self.description)
            .field(
                "commands",
                &self.commands.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("subsections", &self.subsections)
            .finish()
    }
}

impl Section {
    pub fn new(name: &str, description: &str) -> Result<Self, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidArgument {
                reason: "section name must not be empty".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            commands: Vec::new(),
            subsections: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn add_command(&mut self, command: Arc<dyn Command>) -> Result<(), RegistryError> {
        if self.command(command.name()).is_some() {
            return Err(RegistryError::DuplicateName {
                kind: "command",
                name: command.name().to_string(),
                section: self.name.clone(),
            });
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn add_subsection(&mut self, section: Section) -> Result<(), RegistryError> {
        if self.find_section(section.name()).is_some() {
            return Err(RegistryError::DuplicateName {
                kind: "section",
                name: section.name().to_string(),
                section: self.name.clone(),
            });
        }
        self.subsections.push(section);
        Ok(())
    }

    pub fn command(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// Single-level lookup of a direct subsection by name. A missing name is
    /// `None`, not an error; nested paths are resolved by the host walking
    /// one level at a time.
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.subsections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.subsections.iter_mut().find(|s| s.name == name)
    }

    /// Commands in insertion order, for help output.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    /// Subsections in insertion order.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.subsections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockContentClient;
    use crate::config::Config;

    fn test_context() -> Arc<ClientContext> {
        Arc::new(ClientContext::new(
            Arc::new(Config::default()),
            Arc::new(MockContentClient::new()),
        ))
    }

    struct NoopCommand {
        name: &'static str,
        ctx: Arc<ClientContext>,
    }

    #[async_trait]
    impl Command for NoopCommand {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "does nothing"
        }

        fn kind(&self) -> CommandKind {
            CommandKind::List
        }

        fn context(&self) -> &Arc<ClientContext> {
            &self.ctx
        }

        async fn execute(&self, _args: &CommandArgs) -> Result<Outcome, CommandError> {
            Ok(Outcome::Done)
        }
    }

    fn noop(name: &'static str) -> Arc<dyn Command> {
        Arc::new(NoopCommand {
            name,
            ctx: test_context(),
        })
    }

    #[test]
    fn test_empty_section_name_rejected() {
        let err = Section::new("", "no name").expect_err("empty name must fail");
        assert!(matches!(err, RegistryError::InvalidArgument { .. }));

        let err = Section::new("   ", "blank name").expect_err("blank name must fail");
        assert!(matches!(err, RegistryError::InvalidArgument { .. }));
    }

    #[test]
    fn test_duplicate_subsection_rejected() {
        let mut parent = Section::new("parent", "Test parent section.").expect("section");
        parent
            .add_subsection(Section::new("child", "first").expect("section"))
            .expect("first insert");

        let err = parent
            .add_subsection(Section::new("child", "second").expect("section"))
            .expect_err("duplicate must fail");
        assert!(matches!(err, RegistryError::DuplicateName { kind: "section", .. }));

        // A differently-named sibling is fine
        parent
            .add_subsection(Section::new("other", "third").expect("section"))
            .expect("distinct name inserts");
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let mut section = Section::new("repo", "repo section").expect("section");
        section.add_command(noop("list")).expect("first insert");

        let err = section
            .add_command(noop("list"))
            .expect_err("duplicate must fail");
        assert!(matches!(err, RegistryError::DuplicateName { kind: "command", .. }));

        section.add_command(noop("create")).expect("distinct name inserts");
    }

    #[test]
    fn test_command_and_subsection_may_share_a_name() {
        let mut section = Section::new("repo", "repo section").expect("section");
        section.add_command(noop("sync")).expect("command");
        section
            .add_subsection(Section::new("sync", "sync tasks").expect("section"))
            .expect("subsection with same name");

        assert!(section.command("sync").is_some());
        assert!(section.find_section("sync").is_some());
    }

    #[test]
    fn test_find_section_is_single_level() {
        let mut root = Section::new("root", "root").expect("section");
        let mut repo = Section::new("repo", "repo").expect("section");
        repo.add_subsection(Section::new("sync", "sync").expect("section"))
            .expect("subsection");
        root.add_subsection(repo).expect("subsection");

        assert!(root.find_section("repo").is_some());
        assert!(root.find_section("sync").is_none());
        assert!(root
            .find_section("repo")
            .and_then(|s| s.find_section("sync"))
            .is_some());
        assert!(root.find_section("missing").is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut section = Section::new("repo", "repo section").expect("section");
        for name in ["create", "update", "delete", "list"] {
            section.add_command(noop(name)).expect("insert");
        }

        let names: Vec<&str> = section.commands().map(|c| c.name()).collect();
        assert_eq!(names, vec!["create", "update", "delete", "list"]);
    }

    #[test]
    fn test_parse_tokens() {
        let tokens: Vec<String> = [
            "--repo-id", "fedora-isos", "--details", "extra", "--force",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let args = CommandArgs::parse_tokens(&tokens);
        assert_eq!(args.get("repo-id"), Some("fedora-isos"));
        assert_eq!(args.get("details"), Some("extra"));
        assert!(args.flag("force"));
        assert!(!args.flag("missing"));
        assert!(args.positional().is_empty());
    }

    #[test]
    fn test_require_missing_option() {
        let args = CommandArgs::new();
        let err = args.require("repo-id").expect_err("missing option");
        assert!(matches!(err, CommandError::MissingOption("repo-id")));
    }
}
