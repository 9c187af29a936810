//! Scenario tests for length resolution over descriptions loaded from JSON.

use std::sync::Arc;

use prog_sizes::error::SizeError;
use prog_sizes::sampler::RandGen;
use prog_sizes::size::{assign_sizes_call, mutate_size};
use prog_sizes::testing::{init_tracing, len_values, value, SplitMix64};
use prog_sizes::types::{Type, TypeKind};
use prog_sizes::{Arg, Call};

fn ty(json: &str) -> Arc<Type> {
    Arc::new(Type::from_json(json).expect("valid type description"))
}

/// msg[v1] { hdr { size len[msg]; count len[msg:items]; tail_off offset[msg:tail]; hdr_size len[parent] }
///           items array[int32]; tail buffer }
fn msg_call(items: usize, tail: usize) -> Call {
    let size = ty(r#"{"name":"len32","field_name":"size","size":4,"kind":"len","path":["msg"]}"#);
    let count = ty(r#"{"name":"len16","field_name":"count","size":2,"kind":"len","path":["msg","items"]}"#);
    let tail_off = ty(r#"{"name":"len16","field_name":"tail_off","size":2,"kind":"len","path":["msg","tail"],"offset":true}"#);
    let hdr_size = ty(r#"{"name":"len16","field_name":"hdr_size","size":2,"kind":"len","path":["parent"]}"#);
    let hdr = ty(r#"{"name":"hdr","field_name":"hdr","kind":"struct"}"#);
    let items_ty = ty(
        r#"{"name":"array[int32]","field_name":"items","kind":"array","elem":{"name":"int32","size":4,"kind":"int"}}"#,
    );
    let elem = match &items_ty.kind {
        TypeKind::Array { elem } => Arc::new((**elem).clone()),
        _ => unreachable!(),
    };
    let tail_ty = ty(r#"{"name":"buffer","field_name":"tail","kind":"buffer"}"#);
    let msg = ty(r#"{"name":"msg[v1]","field_name":"m","kind":"struct"}"#);

    let hdr_arg = Arg::group(hdr, vec![Arg::constant(size, 0), Arg::constant(count, 0), Arg::constant(tail_off, 0), Arg::constant(hdr_size, 0)]);
    let items_arg = Arg::group(items_ty, (0..items).map(|_| Arg::constant(elem.clone(), 0)).collect());
    let tail_arg = Arg::data(tail_ty, vec![0xaa; tail]);
    let msg_arg = Arg::group(msg, vec![hdr_arg, items_arg, tail_arg]);

    let total = ty(r#"{"name":"len64","field_name":"total","size":8,"kind":"len","path":["m"],"bit_size":8}"#);
    let ptr = ty(r#"{"name":"ptr","field_name":"m","size":8,"kind":"ptr"}"#);
    Call::new("sendmsg", vec![Arg::pointer(ptr, Some(msg_arg)), Arg::constant(total, 0)])
}

#[test]
fn test_nested_message_lengths() {
    init_tracing();
    let mut call = msg_call(5, 3);
    assign_sizes_call(&mut call, None).unwrap();
    // hdr = 4 + 2 + 2 + 2, items = 5 * 4, tail = 3
    assert_eq!(value(&call.args, &["m", "hdr", "size"]), 33);
    assert_eq!(value(&call.args, &["m", "hdr", "count"]), 5);
    assert_eq!(value(&call.args, &["m", "hdr", "tail_off"]), 30);
    assert_eq!(value(&call.args, &["m", "hdr", "hdr_size"]), 10);
    assert_eq!(value(&call.args, &["total"]), 33);
}

#[test]
fn test_renamed_ancestor_is_fatal() {
    let mut call = msg_call(1, 1);
    let Arg::Pointer(p) = &mut call.args[0] else { unreachable!() };
    let Some(Arg::Group(m)) = p.res.as_deref_mut() else { unreachable!() };
    m.ty = Arc::new(Type::structure("other", "m"));
    let err = assign_sizes_call(&mut call, None).unwrap_err();
    match err {
        SizeError::UnresolvedReference { field, token, siblings, .. } => {
            assert_eq!(field, "size");
            assert_eq!(token, "msg");
            assert_eq!(siblings, vec!["size", "count", "tail_off", "hdr_size"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_reassign_after_resize_tracks_new_sizes() {
    let mut call = msg_call(2, 0);
    assign_sizes_call(&mut call, None).unwrap();
    let before = len_values(&call.args);

    let mut bigger = msg_call(7, 9);
    assign_sizes_call(&mut bigger, None).unwrap();
    assert_ne!(len_values(&bigger.args), before);
    assert_eq!(value(&bigger.args, &["m", "hdr", "count"]), 7);
    assert_eq!(value(&bigger.args, &["m", "hdr", "size"]), 10 + 28 + 9);
}

#[test]
fn test_mutation_after_assignment_keeps_tree_shape() {
    let mut call = msg_call(3, 4);
    let mut r = RandGen::new(SplitMix64::new(99));
    assign_sizes_call(&mut call, Some(&mut r)).unwrap();
    let shape = call.args.iter().map(Arg::size).collect::<Vec<_>>();
    assert!(mutate_size(&mut r, &mut call.args, 1).unwrap());
    assert_eq!(call.args.iter().map(Arg::size).collect::<Vec<_>>(), shape);
}
