//! The reduction tracing wrapper.
//!
//! Wrapping is observationally transparent: the wrapped contract computes
//! the same result as the bare one and only adds side-channel events. Effect
//! detection compares a change mark taken before the step against the
//! accumulator after it, because most reduction targets are mutated in place
//! and old-vs-new value comparison cannot see anything. Merges of partial
//! accumulators (`combine`) are untraced, so a parallel pipeline
//! under-reports effects that only materialize during merging; see
//! DESIGN.md before changing that, as it alters event counts.

use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::change::{ChangePolicy, HashChangePolicy};
use super::{Characteristics, Reduction};
use crate::trace::channel::TraceChannel;
use crate::trace::event::Direction;

/// A reduction contract wrapped with change-detection instrumentation.
pub struct Traced<R, P = HashChangePolicy> {
    base: R,
    policy: P,
    operation: String,
    operation_id: i32,
    stream_id: i32,
    param: String,
    channel: TraceChannel,
}

/// Wrap `base` for the stage labelled `operation`. `param` is the stage's
/// static parameter descriptor (e.g. the closure source text) and rides
/// along on every emitted event.
pub fn wrap<R>(
    operation: &str,
    operation_id: i32,
    stream_id: i32,
    param: &str,
    base: R,
    channel: TraceChannel,
) -> Traced<R> {
    Traced {
        base,
        policy: HashChangePolicy,
        operation: operation.to_string(),
        operation_id,
        stream_id,
        param: param.to_string(),
        channel,
    }
}

impl<R, P> Traced<R, P> {
    /// Swap the change-detection policy, e.g. for [`CloneEqPolicy`] when
    /// soundness matters more than per-element cost.
    ///
    /// [`CloneEqPolicy`]: super::change::CloneEqPolicy
    pub fn with_policy<Q>(self, policy: Q) -> Traced<R, Q> {
        Traced {
            base: self.base,
            policy,
            operation: self.operation,
            operation_id: self.operation_id,
            stream_id: self.stream_id,
            param: self.param,
            channel: self.channel,
        }
    }
}

impl<R, P> Reduction for Traced<R, P>
where
    R: Reduction,
    R::Acc: Debug,
    P: ChangePolicy<R::Acc>,
{
    type Item = R::Item;
    type Acc = R::Acc;
    type Output = R::Output;

    fn init(&self) -> R::Acc {
        self.base.init()
    }

    fn accumulate(&self, acc: &mut R::Acc, item: R::Item) {
        // A panicking mark must not stop the real accumulation; with no
        // usable mark the step is classified as an effect.
        let before = catch_unwind(AssertUnwindSafe(|| self.policy.mark(acc))).ok();

        // The wrapped step runs unguarded: a genuine contract failure
        // propagates to the host, with zero events for a call that never
        // completed.
        self.base.accumulate(acc, item);

        let changed = match &before {
            Some(mark) => {
                catch_unwind(AssertUnwindSafe(|| self.policy.changed(mark, acc))).unwrap_or(true)
            }
            None => true,
        };

        // Emission strictly after the step, so the reported state is always
        // the post-step accumulator.
        let snapshot = render_snapshot(acc);
        let direction = if changed { Direction::End } else { Direction::Nop };
        self.channel.emit_object(
            direction,
            snapshot.clone(),
            &self.operation,
            self.operation_id,
            self.stream_id,
            &self.param,
            Some(snapshot),
        );
    }

    fn combine(&self, left: &mut R::Acc, right: R::Acc) {
        // Untraced; see the module docs.
        self.base.combine(left, right)
    }

    fn finish(&self, acc: R::Acc) -> R::Output {
        self.base.finish(acc)
    }

    fn characteristics(&self) -> Characteristics {
        // Forwarded verbatim, or the host executor could apply shortcuts the
        // base contract never declared.
        self.base.characteristics()
    }
}

fn render_snapshot<A: Debug>(acc: &A) -> String {
    // A panicking Debug impl degrades to an empty snapshot; the event is
    // still emitted.
    catch_unwind(AssertUnwindSafe(|| format!("{acc:?}"))).unwrap_or_default()
}
