#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stately_core::{DraftResult, Path, Seg, Value, produce_with_stats};

#[derive(Arbitrary, Debug)]
enum FuzzSeg {
    Key(u8),
    Index(u8),
}

#[derive(Arbitrary, Debug)]
enum FuzzLeaf {
    Null,
    Bool(bool),
    Int(i64),
    Str(u8),
    EmptyList,
    EmptyRecord,
}

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Set(Vec<FuzzSeg>, FuzzLeaf),
    Remove(Vec<FuzzSeg>),
    Push(Vec<FuzzSeg>, FuzzLeaf),
    Insert(Vec<FuzzSeg>, u8, FuzzLeaf),
    Replace(FuzzLeaf),
}

fn to_path(segs: &[FuzzSeg]) -> Path {
    segs.iter()
        .take(6)
        .map(|s| match s {
            FuzzSeg::Key(k) => Seg::key(format!("k{}", k % 4)),
            FuzzSeg::Index(i) => Seg::index(usize::from(i % 4)),
        })
        .collect()
}

fn to_value(leaf: &FuzzLeaf) -> Value {
    match leaf {
        FuzzLeaf::Null => Value::Null,
        FuzzLeaf::Bool(b) => Value::from(*b),
        FuzzLeaf::Int(n) => Value::from(*n),
        FuzzLeaf::Str(s) => Value::from(format!("s{}", s % 8)),
        FuzzLeaf::EmptyList => Value::list(Vec::<Value>::new()),
        FuzzLeaf::EmptyRecord => Value::empty_record(),
    }
}

fn base() -> Value {
    Value::record([
        ("k0", Value::list([Value::from(1), Value::record([("k1", Value::from("x"))])])),
        ("k1", Value::record([("k2", Value::list(Vec::<Value>::new()))])),
        ("k2", Value::from(true)),
    ])
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let base = base();
    let snapshot = base.to_json();

    let result = produce_with_stats(&base, |draft| -> DraftResult<()> {
        for op in ops.iter().take(32) {
            // Individual failures are expected; keep going.
            let _ = match op {
                FuzzOp::Set(p, v) => draft.set(to_path(p), to_value(v)),
                FuzzOp::Remove(p) => draft.remove(to_path(p)).map(|_| ()),
                FuzzOp::Push(p, v) => draft.push(to_path(p), to_value(v)),
                FuzzOp::Insert(p, i, v) => draft.insert(to_path(p), usize::from(i % 4), to_value(v)),
                FuzzOp::Replace(v) => {
                    draft.replace(to_value(v));
                    Ok(())
                }
            };
        }
        Ok(())
    });

    let Ok((next, stats)) = result else {
        unreachable!("recipe never fails");
    };
    assert_eq!(base.to_json(), snapshot, "base was modified");
    if stats.writes == 0 {
        assert!(next.ptr_eq(&base));
    }
});
