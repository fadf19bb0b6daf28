//! Tests for the plugin's command-tree wiring: section layout, command
//! cardinality, context binding, and installer semantics.

use std::sync::Arc;

use isorepo_cli::client::MockContentClient;
use isorepo_cli::error::RegistryError;
use isorepo_cli::structure::{
    self, DESC_PUBLISH, DESC_REPO, DESC_ROOT, DESC_SYNC, SECTION_PUBLISH, SECTION_REPO,
    SECTION_ROOT, SECTION_SYNC,
};
use isorepo_cli::tree::CommandKind;
use isorepo_cli::upload::MockUploadManagerFactory;
use isorepo_cli::{ClientContext, Config, Section};

/// Context backed by mocks with no expectations: any client call or upload
/// manager resolution during registration would panic the test.
fn test_context() -> Arc<ClientContext> {
    Arc::new(
        ClientContext::new(
            Arc::new(Config::default()),
            Arc::new(MockContentClient::new()),
        )
        .with_upload_factory(Arc::new(MockUploadManagerFactory::new())),
    )
}

fn parent_section() -> Section {
    Section::new("parent", "Test parent section.").expect("parent section")
}

#[test]
fn test_install_adds_root_section() {
    let ctx = test_context();
    let mut cli_root = Section::new("root", "host root").expect("host root");

    structure::install(&ctx, &mut cli_root).expect("install");

    let root_section = cli_root.find_section(SECTION_ROOT).expect("root section");
    assert_eq!(root_section.name(), SECTION_ROOT);
    assert_eq!(root_section.description(), DESC_ROOT);

    let repo_section = root_section.find_section(SECTION_REPO).expect("repo section");
    assert_eq!(repo_section.name(), SECTION_REPO);
}

#[test]
fn test_install_twice_is_duplicate() {
    let ctx = test_context();
    let mut cli_root = Section::new("root", "host root").expect("host root");

    structure::install(&ctx, &mut cli_root).expect("first install");
    let err = structure::install(&ctx, &mut cli_root).expect_err("second install must fail");
    assert!(matches!(err, RegistryError::DuplicateName { .. }));
}

#[test]
fn test_register_repo_section() {
    let ctx = test_context();
    let mut parent = parent_section();

    structure::register_repo(&ctx, &mut parent).expect("register repo");

    let repo_section = parent.find_section(SECTION_REPO).expect("repo section");
    assert_eq!(repo_section.name(), SECTION_REPO);
    assert_eq!(repo_section.description(), DESC_REPO);

    // The sync and publish sections should have been added as well
    assert!(repo_section.find_section(SECTION_SYNC).is_some());
    assert!(repo_section.find_section(SECTION_PUBLISH).is_some());
    assert_eq!(repo_section.subsections().count(), 2);

    // Exactly seven commands with the fixed key set
    assert_eq!(repo_section.commands().count(), 7);
    for (name, kind) in [
        ("create", CommandKind::Create),
        ("update", CommandKind::Update),
        ("delete", CommandKind::Delete),
        ("list", CommandKind::List),
        ("copy", CommandKind::Copy),
        ("remove", CommandKind::Remove),
        ("content", CommandKind::ContentSearch),
    ] {
        let command = repo_section
            .command(name)
            .unwrap_or_else(|| panic!("missing command '{}'", name));
        assert_eq!(command.kind(), kind);
        assert!(
            Arc::ptr_eq(command.context(), &ctx),
            "command '{}' not bound to the given context",
            name
        );
    }
}

#[test]
fn test_register_sync_section() {
    let ctx = test_context();
    let mut parent = parent_section();

    structure::register_sync(&ctx, &mut parent).expect("register sync");

    let sync_section = parent.find_section(SECTION_SYNC).expect("sync section");
    assert_eq!(sync_section.name(), SECTION_SYNC);
    assert_eq!(sync_section.description(), DESC_SYNC);

    let run_command = sync_section.command("run").expect("run command");
    assert_eq!(run_command.kind(), CommandKind::RunSync);
    assert!(Arc::ptr_eq(run_command.context(), &ctx));
}

#[test]
fn test_register_publish_section() {
    let ctx = test_context();
    let mut parent = parent_section();

    structure::register_publish(&ctx, &mut parent).expect("register publish");

    let publish_section = parent.find_section(SECTION_PUBLISH).expect("publish section");
    assert_eq!(publish_section.name(), SECTION_PUBLISH);
    assert_eq!(publish_section.description(), DESC_PUBLISH);

    let run_command = publish_section.command("run").expect("run command");
    assert_eq!(run_command.kind(), CommandKind::RunPublish);
    assert!(Arc::ptr_eq(run_command.context(), &ctx));
}

#[test]
fn test_registrars_leave_siblings_untouched() {
    let ctx = test_context();
    let mut parent = parent_section();
    parent
        .add_subsection(Section::new("existing", "pre-existing sibling").expect("section"))
        .expect("sibling");

    structure::register_repo(&ctx, &mut parent).expect("register repo");

    // The pre-existing sibling is still there and still empty
    let sibling = parent.find_section("existing").expect("sibling survives");
    assert_eq!(sibling.commands().count(), 0);
    assert_eq!(sibling.subsections().count(), 0);
    assert_eq!(parent.subsections().count(), 2);
}

#[test]
fn test_missing_upload_factory_fails_fast() {
    // A context without an upload factory cannot register upload-dependent
    // commands
    let ctx = Arc::new(ClientContext::new(
        Arc::new(Config::default()),
        Arc::new(MockContentClient::new()),
    ));
    let mut parent = parent_section();

    let err = structure::register_repo(&ctx, &mut parent).expect_err("must fail fast");
    assert!(matches!(err, RegistryError::MissingCollaborator { .. }));

    // Nothing was attached to the parent
    assert!(parent.find_section(SECTION_REPO).is_none());
}

#[test]
fn test_stub_upload_factory_does_not_change_tree_shape() {
    // Swapping the resolver for a stub must not alter section or command
    // cardinality or names; only the handle inside upload-dependent commands
    // differs.
    let stubbed = test_context();
    let production_shape = {
        let ctx = test_context();
        let mut parent = parent_section();
        structure::register_repo(&ctx, &mut parent).expect("register repo");
        shape_of(parent.find_section(SECTION_REPO).expect("repo section"))
    };

    let mut parent = parent_section();
    structure::register_repo(&stubbed, &mut parent).expect("register repo");
    let stub_shape = shape_of(parent.find_section(SECTION_REPO).expect("repo section"));

    assert_eq!(production_shape, stub_shape);
}

fn shape_of(section: &Section) -> (Vec<String>, Vec<String>) {
    (
        section.commands().map(|c| c.name().to_string()).collect(),
        section.subsections().map(|s| s.name().to_string()).collect(),
    )
}
