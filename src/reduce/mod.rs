pub mod builtin;
pub mod change;
pub mod tracer;

use serde::{Serialize, Deserialize};

/// The four-operation fold contract a terminal pipeline stage reduces into.
///
/// `accumulate` updates the accumulator in place and may legitimately leave
/// its observable state unchanged (an element deduplicated away, a filtered
/// no-op). `combine` only runs under partitioned execution, merging two
/// partial accumulators that were always driven by distinct threads.
pub trait Reduction {
    type Item;
    type Acc;
    type Output;

    fn init(&self) -> Self::Acc;

    fn accumulate(&self, acc: &mut Self::Acc, item: Self::Item);

    fn combine(&self, left: &mut Self::Acc, right: Self::Acc);

    fn finish(&self, acc: Self::Acc) -> Self::Output;

    fn characteristics(&self) -> Characteristics {
        Characteristics::default()
    }
}

/// Optimization hints declared by a contract. The host executor may apply
/// shortcuts based on these, so wrappers must forward them verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    /// `finish` is the identity transform.
    pub identity_finish: bool,
    /// Encounter order carries no meaning.
    pub unordered: bool,
    /// The accumulator itself tolerates concurrent accumulation.
    pub concurrent: bool,
}

/// Sequential fold of `items` through `reduction`.
pub fn collect<R, I>(reduction: &R, items: I) -> R::Output
where
    R: Reduction,
    I: IntoIterator<Item = R::Item>,
{
    let mut acc = reduction.init();
    for item in items {
        reduction.accumulate(&mut acc, item);
    }
    reduction.finish(acc)
}

/// Partitioned fold: one partial accumulator per partition, each driven on
/// its own thread, merged left-to-right with `combine` at the end.
///
/// A panicking step resumes its unwind here so contract failures surface to
/// the caller exactly as in the sequential path.
pub fn collect_partitioned<R>(reduction: &R, partitions: Vec<Vec<R::Item>>) -> R::Output
where
    R: Reduction + Sync,
    R::Item: Send,
    R::Acc: Send,
{
    let partials: Vec<R::Acc> = std::thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .into_iter()
            .map(|partition| {
                scope.spawn(move || {
                    let mut acc = reduction.init();
                    for item in partition {
                        reduction.accumulate(&mut acc, item);
                    }
                    acc
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(acc) => acc,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    });

    let mut partials = partials.into_iter();
    let mut merged = match partials.next() {
        Some(acc) => acc,
        None => reduction.init(),
    };
    for partial in partials {
        reduction.combine(&mut merged, partial);
    }
    reduction.finish(merged)
}
