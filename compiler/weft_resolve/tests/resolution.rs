#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

//! End-to-end resolution scenarios.
//!
//! Each test drives a `Session` the way the parser would: declare, derive
//! environments, expand macros by stamping marks, resolve, then uniquify and
//! ask for emitted names.
//!
//! Set `RUST_LOG=weft_resolve=trace` to see the resolver's events.

use std::num::NonZeroU32;
use std::sync::Once;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use weft_ir::{Mark, MarkSet, Span, Syntax};
use weft_resolve::{
    BindingKind, Collect, Disambiguation, Environ, ItemState, LookupStrategy, Namespace,
    ResolveError, Session, SymbolKey,
};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer())
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn id(sess: &Session, text: &str) -> Syntax {
    Syntax::id(sess.intern(text), Span::DUMMY)
}

fn marked(sess: &Session, text: &str, marks: &[Mark]) -> Syntax {
    let set = sess
        .hygiene()
        .extend(MarkSet::EMPTY, marks.iter().copied());
    Syntax::marked_id(sess.intern(text), set, Span::DUMMY)
}

/// Expand a macro body: stamp a fresh mark onto every identifier in it.
fn expand(sess: &Session, definition: &Environ<'_>, body: &Syntax) -> (Mark, Syntax) {
    let mark = sess.new_macro_mark(definition);
    (mark, body.marked(sess.hygiene(), mark))
}

#[test]
fn counter_declared_by_two_expansions() {
    init_tracing();
    let sess = Session::new();
    let mut root = sess.root();
    let template = id(&sess, "counter");

    let (_, first) = expand(&sess, &root, &template);
    let (_, second) = expand(&sess, &root, &template);
    let a = root.declare_var(&first).unwrap();
    let b = root.declare_var(&second).unwrap();
    assert_ne!(a, b);

    assert_eq!(sess.uniquify().unwrap(), 2);
    assert_eq!(
        sess.binding(a).num,
        Some(Disambiguation::Number(NonZeroU32::new(1).unwrap()))
    );
    assert_eq!(sess.uniq_name(a).unwrap(), "counter$1");
    assert_eq!(sess.uniq_name(b).unwrap(), "counter$2");

    // each expansion still resolves its own counter
    assert_eq!(root.resolve(&first, Namespace::Ordinary).unwrap(), a);
    assert_eq!(root.resolve(&second, Namespace::Ordinary).unwrap(), b);
}

#[test]
fn uniquify_is_incremental() {
    let sess = Session::new();
    let mut root = sess.root();
    let x = id(&sess, "x");
    let first = root.declare_var(&x).unwrap();
    sess.uniquify().unwrap();

    let mut module_body = root.new_scope();
    let second = module_body.declare_var(&x).unwrap();
    assert_eq!(sess.uniquify().unwrap(), 1);
    assert_eq!(sess.uniq_name(first).unwrap(), "x$1");
    assert_eq!(sess.uniq_name(second).unwrap(), "x$2");
    assert_eq!(sess.uniquify().unwrap(), 0);
}

#[test]
fn macro_temporary_does_not_capture_user_variable() {
    init_tracing();
    let sess = Session::new();
    let root = sess.root();

    // swap(a, b) => { tmp = a; a = b; b = tmp }
    let mut func = root.new_frame();
    let user_tmp = func.declare_var(&id(&sess, "tmp")).unwrap();
    let (mark, macro_tmp) = expand(&sess, &root, &id(&sess, "tmp"));

    let mut block = func.new_scope();
    let hidden = block.declare_var(&macro_tmp).unwrap();
    assert_ne!(hidden, user_tmp);

    // the user's `tmp` written inside the expanded block is still theirs
    assert_eq!(block.resolve(&id(&sess, "tmp"), Namespace::Ordinary).unwrap(), user_tmp);
    assert_eq!(
        block
            .resolve(&marked(&sess, "tmp", &[mark]), Namespace::Ordinary)
            .unwrap(),
        hidden
    );

    sess.uniquify().unwrap();
    assert_eq!(sess.uniq_name(user_tmp).unwrap(), "tmp$L1");
    assert_eq!(sess.uniq_name(hidden).unwrap(), "tmp$L2");
}

#[test]
fn macro_reference_skips_use_site_shadowing() {
    let sess = Session::new();
    let mut root = sess.root();
    let printf = root
        .add(
            SymbolKey::plain(sess.intern("printf"), Namespace::Ordinary),
            BindingKind::Function,
            Span::DUMMY,
        )
        .unwrap();
    let definition = root.clone();

    // a function that happens to have a local called `printf`
    let mut func = root.new_frame();
    let shadow = func.declare_var(&id(&sess, "printf")).unwrap();
    let (_, call) = expand(&sess, &definition, &id(&sess, "printf"));

    assert_eq!(func.resolve(&call, Namespace::Ordinary).unwrap(), printf);
    assert_eq!(func.resolve(&id(&sess, "printf"), Namespace::Ordinary).unwrap(), shadow);
}

#[test]
fn local_never_prints_like_the_global_it_hides() {
    init_tracing();
    let sess = Session::new();
    let mut root = sess.root();
    let global = root.declare_var(&id(&sess, "x")).unwrap();
    let definition = root.clone();

    let mut func = root.new_frame();
    let local = func.declare_var(&id(&sess, "x")).unwrap();
    let (_, macro_x) = expand(&sess, &definition, &id(&sess, "x"));

    // the expansion means the global even inside the function
    assert_eq!(func.resolve(&macro_x, Namespace::Ordinary).unwrap(), global);
    assert_eq!(func.resolve(&id(&sess, "x"), Namespace::Ordinary).unwrap(), local);

    sess.uniquify().unwrap();
    let global_name = sess.uniq_name(global).unwrap();
    let local_name = sess.uniq_name(local).unwrap();
    assert_eq!(global_name, "x$1");
    assert_eq!(local_name, "x$L1");
    assert_ne!(global_name, local_name);
}

#[test]
fn tag_and_ordinary_namespaces_are_isolated() {
    let sess = Session::new();
    let mut root = sess.root();
    let tag = root
        .add(
            SymbolKey::plain(sess.intern("foo"), Namespace::Tag),
            BindingKind::Type,
            Span::DUMMY,
        )
        .unwrap();
    let foo = id(&sess, "foo");
    assert!(root.resolve(&foo, Namespace::Ordinary).is_err());

    let value = root.declare_var(&foo).unwrap();
    assert_eq!(root.resolve(&foo, Namespace::Tag).unwrap(), tag);
    assert_eq!(root.resolve(&foo, Namespace::Ordinary).unwrap(), value);

    sess.uniquify().unwrap();
    assert_eq!(sess.uniq_name(tag).unwrap(), "foo$1");
    assert_eq!(sess.uniq_name(value).unwrap(), "foo$1");
}

#[test]
fn import_through_two_expansion_layers() {
    init_tracing();
    let sess = Session::new();
    let mut root = sess.root();
    let (module, mut body) = root.open_module(&id(&sess, "m")).unwrap();
    let y = body.declare_var(&id(&sess, "y")).unwrap();
    root.close_module(module, &body).unwrap();

    let a = sess.new_mark();
    let b = sess.new_mark();
    let mut site = root.new_scope();
    site.import(&marked(&sess, "m", &[a, b])).unwrap();

    assert_eq!(
        site.resolve(&marked(&sess, "y", &[a, b]), Namespace::Ordinary)
            .unwrap(),
        y
    );
    let err = site
        .resolve(&marked(&sess, "y", &[a]), Namespace::Ordinary)
        .unwrap_err();
    assert_eq!(err.code(), weft_diagnostic::ErrorCode::E2003);
}

#[test]
fn forward_references_across_a_unit() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();

    let mut declare = |env: &mut Environ<'_>, name: &str, calls: &'static str| {
        env.declare_forward(
            &mut collect,
            &id(&sess, name),
            BindingKind::Function,
            Namespace::Ordinary,
            Some(calls),
        )
    };
    let ping = declare(&mut root, "ping", "pong").unwrap();
    let pong = declare(&mut root, "pong", "ping").unwrap();

    let mut calls = Vec::new();
    collect
        .finish_all(&root, |env, item, callee| {
            let target = env.resolve(&id(env.session(), callee), Namespace::Ordinary)?;
            calls.push((item, target));
            Ok(())
        })
        .unwrap();

    assert_eq!(calls, vec![(ping, pong), (pong, ping)]);
    assert_eq!(sess.item_state(ping), ItemState::Finished);
    sess.uniquify().unwrap();
    assert_eq!(sess.uniq_name(ping).unwrap(), "ping$1");
}

#[test]
fn errors_render_as_diagnostics() {
    let source = "int main() { return missing; }";
    let sess = Session::new();
    let root = sess.root();
    let missing = Syntax::id(sess.intern("missing"), Span::new(20, 27));

    let err = root.resolve(&missing, Namespace::Ordinary).unwrap_err();
    assert_eq!(err.span(), Some(Span::new(20, 27)));
    let rendered = err.to_diagnostic().render("main.w", source);
    assert!(rendered.contains("E2003"), "{rendered}");
    assert!(rendered.contains("main.w:1:21"), "{rendered}");
}

#[test]
fn lookup_reports_stripped_marks() {
    let sess = Session::new();
    let mut root = sess.root();
    let x = root.declare_var(&id(&sess, "x")).unwrap();
    let a = sess.new_mark();
    let b = sess.new_mark();

    let key = root
        .expand_reference(&marked(&sess, "x", &[a, b]), Namespace::Ordinary)
        .unwrap();
    let found = root.lookup(&key, LookupStrategy::StripMarks).unwrap();
    assert_eq!(found.binding, x);
    assert_eq!(found.stripped.as_slice(), &[b, a]);
    assert_eq!(sess.display_key(&key), "x'1'2");
}

#[test]
fn redeclaration_is_reported_once() {
    let sess = Session::new();
    let mut root = sess.root();
    root.declare_var(&Syntax::id(sess.intern("x"), Span::new(0, 1)))
        .unwrap();
    let err = root
        .declare_var(&Syntax::id(sess.intern("x"), Span::new(5, 6)))
        .unwrap_err();
    assert!(matches!(err, ResolveError::Redeclaration { .. }));
    assert_eq!(err.to_diagnostic().labels.len(), 2);
    // the failed declaration left nothing behind
    assert_eq!(root.dump_this_scope().len(), 1);
}

proptest! {
    #[test]
    fn expansions_of_one_name_get_distinct_emitted_names(expansions in 1usize..24) {
        let sess = Session::new();
        let mut root = sess.root();
        let template = id(&sess, "item");
        let ids: Vec<_> = (0..expansions)
            .map(|_| {
                let (_, name) = expand(&sess, &root, &template);
                root.declare_var(&name).unwrap()
            })
            .collect();

        prop_assert_eq!(sess.uniquify().unwrap(), expansions);
        let names: Vec<_> = ids.iter().map(|&b| sess.uniq_name(b).unwrap()).collect();
        let expected: Vec<_> = (1..=expansions).map(|n| format!("item${n}")).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn adding_a_mark_is_memoized(depth in 0usize..8) {
        let sess = Session::new();
        let hygiene = sess.hygiene();
        let marks: Vec<_> = (0..=depth).map(|_| sess.new_mark()).collect();
        let base = hygiene.extend(MarkSet::EMPTY, marks[..depth].iter().copied());
        let once = hygiene.add(base, marks[depth]);
        let twice = hygiene.add(base, marks[depth]);
        prop_assert_eq!(once, twice);
    }
}
