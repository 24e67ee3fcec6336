use pretty_assertions::assert_eq;
use weft_ir::Span;

use super::*;
use crate::Session;

fn id(sess: &Session, text: &str) -> Syntax {
    Syntax::id(sess.intern(text), Span::DUMMY)
}

/// Declare a function whose body is the list of names it references.
fn function<'s>(
    env: &mut Environ<'s>,
    collect: &mut Collect<Vec<&'static str>>,
    name: &str,
    body: Option<Vec<&'static str>>,
) -> Result<BindingId, ResolveError> {
    let sess = env.session();
    env.declare_forward(
        collect,
        &id(sess, name),
        BindingKind::Function,
        Namespace::Ordinary,
        body,
    )
}

#[test]
fn mutually_recursive_functions_resolve() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();
    let even = function(&mut root, &mut collect, "is_even", Some(vec!["is_odd"])).unwrap();
    let odd = function(&mut root, &mut collect, "is_odd", Some(vec!["is_even"])).unwrap();
    assert_eq!(sess.item_state(even), ItemState::BodyPending);

    let mut resolved = Vec::new();
    let count = collect
        .finish_all(&root, |env, item, body| {
            for name in body {
                let target = env.resolve(&id(env.session(), name), Namespace::Ordinary)?;
                resolved.push((item, target));
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(resolved, vec![(even, odd), (odd, even)]);
    assert_eq!(sess.item_state(even), ItemState::Finished);
    assert_eq!(sess.item_state(odd), ItemState::Finished);
}

#[test]
fn prototype_then_definition_is_one_item() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();

    let proto = function(&mut root, &mut collect, "f", None).unwrap();
    assert_eq!(sess.item_state(proto), ItemState::Declared);
    assert!(collect.is_empty());

    let def = function(&mut root, &mut collect, "f", Some(vec![])).unwrap();
    assert_eq!(def, proto);
    assert_eq!(collect.len(), 1);

    // another prototype after the definition is harmless
    let again = function(&mut root, &mut collect, "f", None).unwrap();
    assert_eq!(again, proto);
    assert_eq!(sess.item_state(proto), ItemState::BodyPending);

    let err = function(&mut root, &mut collect, "f", Some(vec![])).unwrap_err();
    assert!(matches!(err, ResolveError::Redeclaration { .. }));
}

#[test]
fn kind_mismatch_is_a_redeclaration() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect: Collect<()> = Collect::new();
    root.declare_forward(
        &mut collect,
        &id(&sess, "thing"),
        BindingKind::Type,
        Namespace::Ordinary,
        None,
    )
    .unwrap();
    let err = root
        .declare_forward(
            &mut collect,
            &id(&sess, "thing"),
            BindingKind::Function,
            Namespace::Ordinary,
            Some(()),
        )
        .unwrap_err();
    assert!(matches!(err, ResolveError::Redeclaration { .. }));
}

#[test]
fn interface_only_drops_bodies() {
    let sess = Session::new();
    let mut header = sess.root().with_interface_only(true);
    let mut collect = Collect::new();
    let f = function(&mut header, &mut collect, "f", Some(vec!["g"])).unwrap();

    assert!(collect.is_empty());
    assert_eq!(sess.item_state(f), ItemState::Declared);
    let finished = collect
        .finish_all(&header, |_, _, _| panic!("no body should be finished"))
        .unwrap();
    assert_eq!(finished, 0);
}

#[test]
fn finishing_follows_queue_order() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();
    let names = ["c", "a", "b"];
    let ids: Vec<_> = names
        .iter()
        .map(|name| function(&mut root, &mut collect, name, Some(vec![])).unwrap())
        .collect();

    let mut order = Vec::new();
    collect
        .finish_all(&root, |_, item, _| {
            order.push(item);
            Ok(())
        })
        .unwrap();
    assert_eq!(order, ids);
}

#[test]
fn functions_get_frames_types_get_scopes() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();
    let f = root
        .declare_forward(
            &mut collect,
            &id(&sess, "f"),
            BindingKind::Function,
            Namespace::Ordinary,
            Some(()),
        )
        .unwrap();
    root.declare_forward(
        &mut collect,
        &id(&sess, "list"),
        BindingKind::Type,
        Namespace::Tag,
        Some(()),
    )
    .unwrap();

    let mut frames = Vec::new();
    collect
        .finish_all(&root, |env, item, ()| {
            frames.push((item == f, env.frame().is_some()));
            Ok(())
        })
        .unwrap();
    assert_eq!(frames, vec![(true, true), (false, false)]);
}

#[test]
fn finisher_errors_stop_the_pass() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();
    let bad = function(&mut root, &mut collect, "bad", Some(vec!["missing"])).unwrap();
    let later = function(&mut root, &mut collect, "later", Some(vec![])).unwrap();

    let err = collect
        .finish_all(&root, |env, _, body| {
            for name in body {
                env.resolve(&id(env.session(), name), Namespace::Ordinary)?;
            }
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnknownIdentifier { name, .. } if name == "missing"));
    assert_eq!(sess.item_state(bad), ItemState::BodyPending);
    assert_eq!(sess.item_state(later), ItemState::BodyPending);
}

#[test]
fn finishing_twice_is_an_invariant_violation() {
    let sess = Session::new();
    let mut root = sess.root();
    let mut collect = Collect::new();
    function(&mut root, &mut collect, "f", Some(vec![])).unwrap();

    let copy = collect.clone();
    collect.finish_all(&root, |_, _, _| Ok(())).unwrap();
    let err = copy.finish_all(&root, |_, _, _| Ok(())).unwrap_err();
    assert!(matches!(err, ResolveError::UniquificationInvariant { .. }));
}
