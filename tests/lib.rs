mod common;

use std::env;
use std::process::Command;

use common::{counter, live, tracked};
use proptest::prelude::*;
use smallfn::space::S4;
use smallfn::{varargs, Error, Mutable, NoUnwind, SharedFn, StackFn, VarArgs, Variadic};

type Prototype = fn() -> u64;

#[test]
fn inline_to_shared() {
    let instances = counter();
    let inline: StackFn<Prototype> = StackFn::new(tracked(&instances, 1));
    let mut shared: SharedFn<Prototype> = SharedFn::from_facade(&inline).unwrap();
    assert_eq!(live(&instances), 2);
    assert_eq!(shared.call(), Ok(1));

    let mut moved: StackFn<Prototype> = StackFn::new(tracked(&instances, 2));
    shared.take_from(&mut moved).unwrap();
    assert_eq!(live(&instances), 2);
    assert!(!moved.is_present());
    assert_eq!(shared.call(), Ok(2));

    drop((inline, shared, moved));
    assert_eq!(live(&instances), 0);
}

#[test]
fn shared_to_inline() {
    let instances = counter();
    let mut shared: SharedFn<Prototype> = SharedFn::new(tracked(&instances, 3));
    let mut inline: StackFn<Prototype> = StackFn::empty();

    inline.assign(&shared).unwrap();
    assert_eq!(live(&instances), 2);
    assert_eq!(inline.call(), Ok(3));

    inline.clear();
    inline.take_from(&mut shared).unwrap();
    assert_eq!(live(&instances), 1);
    assert!(!shared.is_present());
    // a moved-from region keeps its memory
    assert!(shared.allocates());
    assert_eq!(inline.call(), Ok(3));
}

#[test]
fn take_from_aliased_region() {
    let instances = counter();
    let mut shared: SharedFn<Prototype> = SharedFn::new(tracked(&instances, 4));
    let alias = shared.clone();
    let mut inline: StackFn<Prototype> = StackFn::empty();

    inline.take_from(&mut shared).unwrap();
    assert!(!shared.is_present());
    assert!(!shared.shares_with(&alias));
    assert_eq!(alias.call(), Ok(4));
    assert_eq!(inline.call(), Ok(4));
    assert_eq!(live(&instances), 2);
}

#[test]
fn failed_take_leaves_both_sides() {
    let table = [2u64; 8];
    let mut shared: SharedFn<Prototype> = SharedFn::new(move || table.iter().sum::<u64>());
    let mut inline: StackFn<Prototype, S4> = StackFn::new(|| 1);

    assert!(matches!(
        inline.take_from(&mut shared),
        Err(Error::IncompatibleBuffer(_))
    ));
    assert_eq!(shared.call(), Ok(16));
    assert_eq!(inline.call(), Ok(1));
}

#[test]
fn convert() {
    let inline: StackFn<NoUnwind<fn(i64) -> i64>> = StackFn::new(NoUnwind(|x: i64| -x));
    let shared: SharedFn<NoUnwind<fn(i64) -> i64>> = inline.convert().unwrap();
    let relaxed: SharedFn<fn(i64) -> i64> = shared.convert().unwrap();
    let back: StackFn<fn(i64) -> i64> = relaxed.convert().unwrap();

    assert_eq!(shared.call(1), -1);
    assert!(relaxed.shares_with(&shared));
    assert_eq!(back.call(2), Ok(-2));
}

#[test]
fn convert_empty() {
    let empty: SharedFn<fn()> = SharedFn::empty();
    let inline: StackFn<fn()> = empty.convert().unwrap();
    assert_eq!(inline.call(), Err(Error::Uninitialized));
}

#[test]
fn variadic_across_facades() {
    fn join(separator: char, rest: VarArgs<'_>) -> String {
        rest.iter()
            .filter_map(|arg| arg.downcast_ref::<&str>())
            .copied()
            .collect::<Vec<_>>()
            .join(separator.to_string().as_str())
    }

    let inline: StackFn<Variadic<fn(char) -> String>> = StackFn::new(join);
    let shared: SharedFn<Variadic<fn(char) -> String>> = inline.convert().unwrap();
    assert_eq!(
        shared.call('-', varargs!["a", "b", 3, "c"]).as_deref(),
        Ok("a-b-c")
    );
}

const ABORT_CHILD: &str = "SMALLFN_ABORT_CHILD";

fn run_child(test: &str, mode: &str) {
    if env::var(ABORT_CHILD).as_deref() == Ok(mode) {
        match mode {
            "empty" => {
                let f: StackFn<NoUnwind<fn()>> = StackFn::empty();
                f.call();
            }
            "unwind" => {
                let f: SharedFn<fn()> = SharedFn::new(NoUnwind(|| panic!("unwinding")));
                let _ = f.call();
            }
            "variadic_empty" => {
                let f: StackFn<NoUnwind<Variadic<fn()>>> = StackFn::empty();
                f.call(varargs![1u8, "two"]);
            }
            "mutable_empty" => {
                let mut f: SharedFn<Mutable<NoUnwind<fn()>>> = SharedFn::empty();
                f.call_mut();
            }
            _ => {}
        }
        // reaching this point fails the parent's assertions
        return;
    }

    let status = Command::new(env::current_exe().unwrap())
        .args([test, "--exact", "--test-threads=1"])
        .env(ABORT_CHILD, mode)
        .status()
        .unwrap();
    assert!(!status.success());

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(6));
    }
}

#[test]
fn no_unwind_empty_call_aborts() {
    run_child("no_unwind_empty_call_aborts", "empty");
}

#[test]
fn no_unwind_callable_unwinding_aborts() {
    run_child("no_unwind_callable_unwinding_aborts", "unwind");
}

#[test]
fn no_unwind_variadic_empty_call_aborts() {
    run_child("no_unwind_variadic_empty_call_aborts", "variadic_empty");
}

#[test]
fn no_unwind_mutable_empty_call_aborts() {
    run_child("no_unwind_mutable_empty_call_aborts", "mutable_empty");
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Set(usize, u64),
    Assign(usize, usize),
    Take(usize, usize),
    Clear(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, any::<u64>()).prop_map(|(slot, value)| Op::Set(slot, value)),
        (0..4usize, 0..4usize).prop_map(|(dst, src)| Op::Assign(dst, src)),
        (0..4usize, 0..4usize).prop_map(|(dst, src)| Op::Take(dst, src)),
        (0..4usize).prop_map(Op::Clear),
    ]
}

/// Two inline and two shared wrappers, addressed by index 0..4.
struct Slots {
    inline: [StackFn<Prototype>; 2],
    shared: [SharedFn<Prototype>; 2],
}

enum Slot<'a> {
    Inline(&'a mut StackFn<Prototype>),
    Shared(&'a mut SharedFn<Prototype>),
}

impl Slots {
    fn new() -> Slots {
        Slots {
            inline: [StackFn::empty(), StackFn::empty()],
            shared: [SharedFn::empty(), SharedFn::empty()],
        }
    }

    fn slot(&mut self, index: usize) -> Slot<'_> {
        match index {
            0 | 1 => Slot::Inline(&mut self.inline[index]),
            _ => Slot::Shared(&mut self.shared[index - 2]),
        }
    }

    fn pair(&mut self, dst: usize, src: usize) -> Option<(Slot<'_>, Slot<'_>)> {
        let [i0, i1] = &mut self.inline;
        let [s0, s1] = &mut self.shared;
        let mut all = [
            Some(Slot::Inline(i0)),
            Some(Slot::Inline(i1)),
            Some(Slot::Shared(s0)),
            Some(Slot::Shared(s1)),
        ];
        let dst = all[dst].take()?;
        let src = all[src].take()?;
        Some((dst, src))
    }

    fn observe(&self) -> [Result<u64, Error>; 4] {
        [
            self.inline[0].call(),
            self.inline[1].call(),
            self.shared[0].call(),
            self.shared[1].call(),
        ]
    }
}

fn assign(dst: Slot<'_>, src: Slot<'_>) -> Result<(), Error> {
    match (dst, src) {
        (Slot::Inline(d), Slot::Inline(s)) => d.assign(&*s),
        (Slot::Inline(d), Slot::Shared(s)) => d.assign(&*s),
        (Slot::Shared(d), Slot::Inline(s)) => d.assign(&*s),
        (Slot::Shared(d), Slot::Shared(s)) => d.assign(&*s),
    }
}

fn take(dst: Slot<'_>, src: Slot<'_>) -> Result<(), Error> {
    match (dst, src) {
        (Slot::Inline(d), Slot::Inline(s)) => d.take_from(s),
        (Slot::Inline(d), Slot::Shared(s)) => d.take_from(s),
        (Slot::Shared(d), Slot::Inline(s)) => d.take_from(s),
        (Slot::Shared(d), Slot::Shared(s)) => d.take_from(s),
    }
}

proptest! {
    #[test]
    fn wrappers_follow_a_model(ops in proptest::collection::vec(op(), 0..32)) {
        let instances = counter();
        let mut slots = Slots::new();
        let mut model: [Option<u64>; 4] = [None; 4];

        for op in ops {
            match op {
                Op::Set(index, value) => {
                    match slots.slot(index) {
                        Slot::Inline(f) => f.set(tracked(&instances, value)),
                        Slot::Shared(f) => f.set(tracked(&instances, value)),
                    }
                    model[index] = Some(value);
                }
                Op::Assign(dst, src) => {
                    if let Some((d, s)) = slots.pair(dst, src) {
                        prop_assert_eq!(assign(d, s), Ok(()));
                        model[dst] = model[src];
                    }
                }
                Op::Take(dst, src) => {
                    if let Some((d, s)) = slots.pair(dst, src) {
                        prop_assert_eq!(take(d, s), Ok(()));
                        model[dst] = model[src].take();
                    }
                }
                Op::Clear(index) => {
                    match slots.slot(index) {
                        Slot::Inline(f) => f.clear(),
                        Slot::Shared(f) => f.clear(),
                    }
                    model[index] = None;
                }
            }

            let expected = model.map(|value| value.ok_or(Error::Uninitialized));
            prop_assert_eq!(slots.observe(), expected);
        }

        drop(slots);
        prop_assert_eq!(live(&instances), 0);
    }
}
