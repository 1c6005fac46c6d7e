use class_discovery::{
    Annotation, AutoloadState, Convention, Finder, PrefixStyle, StaticReflector, TypeDescriptor,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "class_discovery_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "<?php\n").unwrap();
}

fn names<R: class_discovery::Reflector>(finder: &Finder<R>) -> Vec<String> {
    finder.iter().map(|(name, _)| name).collect()
}

fn fixture_reflector() -> StaticReflector {
    [
        TypeDescriptor::class(r"Acme\Lib\Widget")
            .implements([r"\Foo\Bar"])
            .annotated(Annotation::resolved("Entity", r"Acme\Meta\Entity")),
        TypeDescriptor::class(r"Acme\Lib\Gadget")
            .extends(r"Acme\Lib\Widget")
            .implements([r"Foo\Other"]),
        TypeDescriptor::interface(r"Acme\Lib\Contract").implements([r"Foo\Bar"]),
        TypeDescriptor::class(r"Acme\Lib\Internal\Secret").abstract_(),
        TypeDescriptor::class(r"Acme\App\Main").extends(r"Acme\Lib\Missing"),
    ]
    .into_iter()
    .collect()
}

fn fixture_tree(name: &str) -> PathBuf {
    let root = temp_dir(name);
    for file in [
        "Acme/Lib/Widget.php",
        "Acme/Lib/Gadget.php",
        "Acme/Lib/Contract.php",
        "Acme/Lib/Internal/Secret.php",
        "Acme/App/Main.php",
        "Acme/App/Broken.php",
        "Acme/App/notes.txt",
    ] {
        touch(&root.join(file));
    }
    root
}

#[test]
fn directory_finder_resolves_nested_names() {
    let root = temp_dir("single");
    touch(&root.join("Acme/Lib/Widget.php"));

    let reflector = StaticReflector::new().with(TypeDescriptor::class(r"Acme\Lib\Widget"));
    let finder = Finder::in_dir(&root, Convention::php(), reflector);

    let found: Vec<_> = finder.iter().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, r"Acme\Lib\Widget");
    assert!(
        found[0]
            .1
            .file
            .as_deref()
            .is_some_and(|f| f.ends_with("Acme/Lib/Widget.php"))
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unreflectable_files_are_skipped_and_iteration_restarts() {
    let root = fixture_tree("restart");
    let finder = Finder::in_dir(&root, Convention::php(), fixture_reflector());

    let first: BTreeSet<_> = names(&finder).into_iter().collect();
    let second: BTreeSet<_> = names(&finder).into_iter().collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    assert!(!first.contains(r"Acme\App\Broken"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn namespace_filters_apply_deny_before_allow() {
    let root = fixture_tree("namespace");
    let finder = Finder::in_dir(&root, Convention::php(), fixture_reflector())
        .in_namespace([r"Acme\Lib"])
        .not_in_namespace([r"Acme\Lib\Internal"]);

    let found: BTreeSet<_> = names(&finder).into_iter().collect();
    let expected: BTreeSet<String> = [r"Acme\Lib\Contract", r"Acme\Lib\Gadget", r"Acme\Lib\Widget"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(found, expected);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn leading_separator_is_trimmed_with_the_finder_convention() {
    let root = fixture_tree("leading_separator");
    let finder = Finder::in_dir(&root, Convention::php(), fixture_reflector())
        .in_namespace([r"\Acme\Lib"])
        .not_in_namespace([r"\Acme\Lib\Internal"])
        .implementation_of([r"\Foo\Bar"]);

    assert_eq!(names(&finder), vec![r"Acme\Lib\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn interface_superclass_and_annotation_filters() {
    let root = fixture_tree("predicates");
    let php = Convention::php;

    let implementing = Finder::in_dir(&root, php(), fixture_reflector())
        .implementation_of([r"Foo\Bar"]);
    assert_eq!(names(&implementing), vec![r"Acme\Lib\Widget".to_string()]);

    let subclasses = Finder::in_dir(&root, php(), fixture_reflector())
        .subclass_of([r"\Acme\Lib\Widget"]);
    assert_eq!(names(&subclasses), vec![r"Acme\Lib\Gadget".to_string()]);

    let annotated = Finder::in_dir(&root, php(), fixture_reflector())
        .annotated_by([r"Acme\Meta\Entity"]);
    assert_eq!(names(&annotated), vec![r"Acme\Lib\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn separate_calls_combine_with_and() {
    let root = fixture_tree("and_or");

    let either = Finder::in_dir(&root, Convention::php(), fixture_reflector())
        .implementation_of([r"Foo\Bar", r"Foo\Other"]);
    assert_eq!(names(&either).len(), 2);

    let both = Finder::in_dir(&root, Convention::php(), fixture_reflector())
        .implementation_of([r"Foo\Bar"])
        .implementation_of([r"Foo\Other"]);
    assert!(names(&both).is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn directory_and_instantiable_filters() {
    let root = fixture_tree("dirs");
    let finder = Finder::in_dir(&root, Convention::php(), fixture_reflector())
        .in_dirs([root.join("Acme/Lib")])
        .skip_non_instantiable()
        .filter(|name, _| !name.ends_with("Gadget"));

    assert_eq!(names(&finder), vec![r"Acme\Lib\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn prefix_table_resolves_relative_namespace() {
    let base = temp_dir("prefixed");
    touch(&base.join("src/lib/Sub/Thing.php"));

    let state = AutoloadState::new(Convention::php()).with_prefix(
        PrefixStyle::Prefixed,
        r"Acme\Lib\",
        base.join("src/lib"),
    );
    let reflector = StaticReflector::new().with(TypeDescriptor::class(r"Acme\Lib\Sub\Thing"));
    let finder = Finder::from_state(state, reflector).unwrap();

    assert_eq!(names(&finder), vec![r"Acme\Lib\Sub\Thing".to_string()]);

    let _ = std::fs::remove_dir_all(base);
}

#[test]
fn nested_prefix_table_keeps_only_names_under_prefix() {
    let base = temp_dir("nested");
    touch(&base.join("lib/Acme/Lib/Widget.php"));
    touch(&base.join("lib/Vendor/Thing.php"));

    let state = AutoloadState::new(Convention::php()).with_prefix(
        PrefixStyle::Nested,
        r"Acme\",
        base.join("lib"),
    );
    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\Lib\Widget"),
        TypeDescriptor::class(r"Vendor\Thing"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::from_state(state, reflector).unwrap();

    assert_eq!(names(&finder), vec![r"Acme\Lib\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(base);
}

#[test]
fn overlapping_prefix_directories_are_each_walked() {
    let base = temp_dir("overlap");
    touch(&base.join("app/Widget.php"));
    touch(&base.join("app/tests/WidgetTest.php"));

    let state = AutoloadState::new(Convention::php())
        .with_prefix(PrefixStyle::Prefixed, r"Acme\", base.join("app"))
        .with_prefix(PrefixStyle::Prefixed, r"Acme\Tests\", base.join("app/tests"));
    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\Widget"),
        TypeDescriptor::class(r"Acme\Tests\WidgetTest"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::from_state(state, reflector).unwrap();

    assert_eq!(
        names(&finder),
        vec![r"Acme\Widget".to_string(), r"Acme\Tests\WidgetTest".to_string()]
    );

    let _ = std::fs::remove_dir_all(base);
}

#[test]
fn class_map_entries_come_first_and_win_duplicates() {
    let base = temp_dir("class_map_dup");
    touch(&base.join("src/A.php"));
    touch(&base.join("src/C.php"));
    touch(&base.join("legacy/a.php"));

    let state = AutoloadState::new(Convention::php())
        .with_class(r"Acme\A", base.join("legacy/a.php"))
        .with_prefix(PrefixStyle::Prefixed, r"Acme\", base.join("src"));
    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\A"),
        TypeDescriptor::class(r"Acme\C"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::from_state(state, reflector).unwrap();

    let found: Vec<_> = finder.iter().collect();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, r"Acme\A");
    assert!(
        found[0]
            .1
            .file
            .as_deref()
            .is_some_and(|f| f.ends_with("legacy/a.php"))
    );
    assert_eq!(found[1].0, r"Acme\C");

    let _ = std::fs::remove_dir_all(base);
}

#[test]
fn authoritative_class_map_skips_prefix_directories() {
    let base = temp_dir("authoritative");
    for file in ["src/A.php", "src/B.php", "src/C.php"] {
        touch(&base.join(file));
    }

    let state = AutoloadState::new(Convention::php())
        .with_class(r"Acme\A", base.join("src/A.php"))
        .with_class(r"Acme\B", base.join("src/B.php"))
        .with_prefix(PrefixStyle::Prefixed, r"Acme\", base.join("src"))
        .authoritative(true);
    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\A"),
        TypeDescriptor::class(r"Acme\B"),
        TypeDescriptor::class(r"Acme\C"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::from_state(state, reflector).unwrap();

    assert_eq!(
        names(&finder),
        vec![r"Acme\A".to_string(), r"Acme\B".to_string()]
    );

    let _ = std::fs::remove_dir_all(base);
}

#[test]
fn directory_pre_filter_over_matches_and_predicate_corrects() {
    let base = temp_dir("over_match");
    touch(&base.join("psr4/Foobar.php"));
    touch(&base.join("psr4/SubNs/FooBaz.php"));

    let state = AutoloadState::new(Convention::php()).with_prefix(
        PrefixStyle::Prefixed,
        r"Acme\",
        base.join("psr4"),
    );
    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\Foobar"),
        TypeDescriptor::class(r"Acme\SubNs\FooBaz"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::from_state(state, reflector)
        .unwrap()
        .in_dirs([base.join("psr4/SubNs")]);

    assert_eq!(names(&finder), vec![r"Acme\SubNs\FooBaz".to_string()]);

    let _ = std::fs::remove_dir_all(base);
}

#[cfg(unix)]
#[test]
fn symlink_cycles_do_not_loop() {
    let root = temp_dir("symlink");
    touch(&root.join("Acme/Widget.php"));
    std::os::unix::fs::symlink(&root, root.join("Acme/loop")).unwrap();

    let reflector = StaticReflector::new().with(TypeDescriptor::class(r"Acme\Widget"));
    let finder = Finder::in_dir(&root, Convention::php(), reflector);

    assert_eq!(names(&finder), vec![r"Acme\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}

#[cfg(unix)]
#[test]
fn dangling_links_do_not_hide_valid_classes() {
    let root = temp_dir("dangling");
    touch(&root.join("Acme/Widget.php"));
    std::os::unix::fs::symlink(root.join("missing.php"), root.join("Acme/Gone.php")).unwrap();
    std::os::unix::fs::symlink(root.join("missing_dir"), root.join("Acme/Removed")).unwrap();

    let reflector: StaticReflector = [
        TypeDescriptor::class(r"Acme\Gone"),
        TypeDescriptor::class(r"Acme\Widget"),
    ]
    .into_iter()
    .collect();
    let finder = Finder::in_dir(&root, Convention::php(), reflector);

    assert_eq!(names(&finder), vec![r"Acme\Widget".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}
