use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use pipetrace::probe::{pipeline_complete, probe_condition, probe_index_access};
use pipetrace::reduce::builtin::{Summing, ToSet};
use pipetrace::reduce::collect;
use pipetrace::trace::sink::ChannelSink;
use pipetrace::{wrap, TraceChannel};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("pipetrace demo starting");

    // Trace transport: events flow through a tokio channel to a drain task,
    // the stand-in for the external socket towards a visualizer.
    let (tx, mut rx) = mpsc::channel(256);
    let channel = TraceChannel::new(Arc::new(ChannelSink::new(tx)));

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("event serialization failed: {}", e),
            }
        }
    });

    // Pipeline 0: keep the even numbers, sum them. The filter condition and
    // every element access run through probes; the terminal sum is wrapped.
    let numbers = vec![1i64, 2, 3, 4, 5, 6];
    let sum = wrap("sum", 0, 0, "|acc, n| *acc += n", Summing, channel.clone());
    let evens = (0..numbers.len())
        .map(|i| numbers[probe_index_access(&numbers, i, 0, 1, &channel)])
        .filter(|n| probe_condition(n % 2 == 0, 0, &channel));
    let total = collect(&sum, evens);
    pipeline_complete(0);
    tracing::info!("filtered sum = {}", total);

    // Pipeline 1: dedup into a set; repeated elements classify as NOP.
    let dedup = wrap("to_set", 0, 1, "identity", ToSet::new(), channel.clone());
    let set = collect(&dedup, vec![1i64, 1, 2, 2, 3]);
    pipeline_complete(1);
    tracing::info!("deduplicated = {:?}", set);

    // Release every channel clone so the drain task sees end-of-stream.
    drop(sum);
    drop(dedup);
    drop(channel);
    printer.await?;

    Ok(())
}
