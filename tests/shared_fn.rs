mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{counter, live, tracked};
use futures::executor::block_on;
use futures::future::BoxFuture;
use smallfn::{Error, Extent, Mutable, SharedFn, StackFn};

#[test]
fn basic() {
    let table: HashMap<i32, i32> = [(7, 70)].into_iter().collect();
    let f: SharedFn<fn(i32) -> i32> =
        SharedFn::new(move |key: i32| table.get(&key).copied().unwrap_or(-1));
    assert_eq!(f.call(7), Ok(70));
    assert_eq!(f.call(9), Ok(-1));
    assert!(f.is_present());
    assert!(f.allocates());
}

#[test]
fn empty() {
    let f: SharedFn<fn() -> u8> = SharedFn::default();
    assert!(!f.is_present());
    assert!(f.allocates());
    assert_eq!(f.buffer(), Extent::DEFAULT);
    assert_eq!(f.call(), Err(Error::Uninitialized));
}

#[test]
fn grows() {
    let mut f: SharedFn<fn(usize) -> u8> = SharedFn::new(|_: usize| 0);
    assert_eq!(f.buffer(), Extent::DEFAULT);

    let table = [3u8; 256];
    f.set(move |i: usize| table[i]);
    assert!(f.buffer().size() >= 256);
    assert_eq!(f.buffer(), f.occupied());
    assert_eq!(f.call(255), Ok(3));

    // a smaller callable reuses the grown region
    let grown = f.buffer();
    f.set(|i: usize| u8::from(i == 0));
    assert_eq!(f.buffer(), grown);
    assert_eq!(f.call(0), Ok(1));
}

#[test]
fn new_allocates_for_large_callables() {
    let table = [1u64; 64];
    let f: SharedFn<fn() -> u64> = SharedFn::new(move || table.iter().sum::<u64>());
    assert!(f.buffer().size() > Extent::DEFAULT.size());
    assert_eq!(f.call(), Ok(64));
}

#[test]
fn clones_share() {
    let instances = counter();
    let f: SharedFn<fn() -> u64> = SharedFn::new(tracked(&instances, 5));
    let g = f.clone();
    let h = g.clone();

    assert_eq!(live(&instances), 1);
    assert_eq!(f.share_count(), 3);
    assert!(f.shares_with(&h));
    assert_eq!(h.call(), Ok(5));

    drop(f);
    drop(g);
    assert_eq!(live(&instances), 1);
    drop(h);
    assert_eq!(live(&instances), 0);
}

#[test]
fn detach_on_write() {
    let first_instances = counter();
    let second_instances = counter();

    let f: SharedFn<fn() -> u64> = SharedFn::new(tracked(&first_instances, 1));
    let mut g = f.clone();

    g.set(tracked(&second_instances, 2));
    assert!(!g.shares_with(&f));
    assert_eq!(f.call(), Ok(1));
    assert_eq!(g.call(), Ok(2));
    assert_eq!(live(&first_instances), 1);
    assert_eq!(live(&second_instances), 1);

    // exclusive again, so the region is reused
    let before = g.buffer();
    g.set(tracked(&second_instances, 3));
    assert_eq!(g.buffer(), before);
    assert_eq!(live(&second_instances), 1);
}

#[test]
fn assign_shares() {
    let instances = counter();
    let f: SharedFn<fn() -> u64> = SharedFn::new(tracked(&instances, 8));
    let mut g: SharedFn<fn() -> u64> = SharedFn::new(|| 0);

    g.assign(&f).unwrap();
    assert!(g.shares_with(&f));
    assert_eq!(live(&instances), 1);
    assert_eq!(g.call(), Ok(8));
}

#[test]
fn take_from() {
    let instances = counter();
    let mut source: SharedFn<fn() -> u64> = SharedFn::new(tracked(&instances, 6));
    let alias = source.clone();
    let mut target: SharedFn<fn() -> u64> = SharedFn::empty();

    target.take_from(&mut source).unwrap();
    assert!(!source.is_present());
    assert!(target.shares_with(&alias));
    assert_eq!(target.call(), Ok(6));
    assert_eq!(live(&instances), 1);
}

#[test]
fn clear() {
    let instances = counter();
    let mut f: SharedFn<fn() -> u64> = SharedFn::new(tracked(&instances, 1));
    let alias = f.clone();

    f.clear();
    assert!(!f.is_present());
    assert!(!f.shares_with(&alias));
    assert_eq!(live(&instances), 1);

    drop(alias);
    assert_eq!(live(&instances), 0);
}

#[test]
fn threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let f: SharedFn<fn(usize) -> usize> = SharedFn::new(move |x: usize| {
        counted.fetch_add(1, Ordering::SeqCst);
        x * 2
    });

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let f = f.clone();
            thread::spawn(move || f.call(i))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results, vec![Ok(0), Ok(2), Ok(4), Ok(6)]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(f.share_count(), 1);
}

#[test]
fn boxed_futures() {
    let double: SharedFn<fn(u32) -> BoxFuture<'static, u32>> =
        SharedFn::new(|x: u32| -> BoxFuture<'static, u32> { Box::pin(async move { x * 2 }) });

    let pending = double.call(21).unwrap();
    assert_eq!(block_on(pending), 42);
}

#[test]
fn debug() {
    let f: SharedFn<fn()> = SharedFn::new(|| ());
    let text = format!("{:?}", f);
    assert!(text.starts_with("SharedFn"));
    assert!(text.contains("share_count: 1"));
}

#[test]
fn mutable_detaches_before_calling() {
    let instances = counter();
    let mut total = 0u64;
    let tracker = tracked(&instances, 0);
    let mut first: SharedFn<Mutable<fn(u64) -> u64>> = SharedFn::new(move |x: u64| {
        total += x + tracker();
        total
    });
    assert_eq!(first.call_mut(1), Ok(1));

    let mut second = first.clone();
    assert_eq!(live(&instances), 1);
    assert_eq!(second.call_mut(10), Ok(11));
    assert!(!second.shares_with(&first));
    assert_eq!(live(&instances), 2);

    // an exclusive region is called in place
    assert_eq!(first.call_mut(1), Ok(2));
    assert_eq!(first.share_count(), 1);

    drop((first, second));
    assert_eq!(live(&instances), 0);
}

#[test]
fn mutable_threads() {
    let mut f: SharedFn<Mutable<fn() -> usize>> = SharedFn::new({
        let mut calls = 0;
        move || {
            calls += 1;
            calls
        }
    });
    assert_eq!(f.call_mut(), Ok(1));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mut f = f.clone();
            thread::spawn(move || f.call_mut())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(2));
    }
    assert_eq!(f.call_mut(), Ok(2));
}

#[test]
fn mutable_into_stack() {
    let mut calls = 0u8;
    let shared: SharedFn<Mutable<fn() -> u8>> = SharedFn::new(move || {
        calls += 1;
        calls
    });
    let mut inline: StackFn<Mutable<fn() -> u8>> = shared.convert().unwrap();
    assert_eq!(inline.call_mut(), Ok(1));
    assert_eq!(inline.call_mut(), Ok(2));
}
