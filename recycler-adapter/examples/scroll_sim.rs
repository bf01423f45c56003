use std::sync::Arc;

use recycler_adapter::sim::SimHost;
use recycler_adapter::{Controller, EvictionPolicy, RepeatOptions, ScrollSample};

fn main() {
    // Example: drive the controller against the in-memory host.
    //
    // A real adapter would:
    // - call on_collection_changed whenever the watched collection may have changed
    // - queue a sample on every scroll event and tick once per frame
    // - implement RepeatHost on top of its own retained node tree
    let items: Arc<[String]> = (0..10_000).map(|i| format!("row {i}")).collect();
    let options =
        RepeatOptions::default().with_eviction(EvictionPolicy::Distance { windows: 2 });
    let mut c = Controller::new(SimHost::new(32.0), options).with_value_identifier("row");

    c.on_collection_changed(items.clone(), 480u32).unwrap();
    println!("initial: {:?}", c.snapshot());

    let mut now_ms = 0u64;
    let mut scroll_top = 0u64;
    for _ in 0..120 {
        now_ms += 16;
        scroll_top += 40;
        c.queue_scroll(ScrollSample::Top(scroll_top));
        if let Some(outcome) = c.tick(now_ms).unwrap() {
            if outcome.is_shift() && now_ms % 320 == 0 {
                println!("t={now_ms} top={scroll_top} {outcome:?}");
            }
        }
    }

    // A scrollbar jump: one sample is not enough, settle catches up.
    let shifts = c.settle(200_000).unwrap();
    println!("settle: shifts={shifts} window={:?}", c.window().and_then(|w| w.bounds()));

    // Same identity: nothing happens.
    let rebuilt = c.on_collection_changed(items, 480u32).unwrap();
    println!("rebuilt={rebuilt} stats={:?}", c.host().stats());

    let host = c.into_host();
    println!("after teardown: live={} stats={:?}", host.live_count(), host.stats());
}
