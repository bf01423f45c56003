// Example: sizing a window and walking it forward with raw scroll deltas.
use core::num::NonZeroU32;

use recycler::{WindowOptions, WindowState, geometry};

fn main() {
    let item = NonZeroU32::new(50).unwrap();
    println!("container_extent={}", geometry::container_extent(100, item));
    println!("capacity={}", geometry::capacity(400, item, geometry::DEFAULT_OVERSCAN));

    let mut w = WindowState::initialize(100, 400, item, WindowOptions::default());
    println!("initial={:?} threshold={}", w.bounds(), w.crossing_threshold());

    for scroll_top in [60u64, 120, 180, 240] {
        let delta = w.scroll_delta_for(scroll_top);
        if w.should_extend_forward(delta) {
            let next = w.advance_window().unwrap();
            println!("scroll_top={scroll_top} delta={delta} -> {next:?}");
        } else {
            println!("scroll_top={scroll_top} delta={delta} -> idle");
        }
    }

    // A host reporting a fractional or zero height.
    println!("49.6 -> {:?}", geometry::item_extent_from_measurement(49.6));
    println!("0.0  -> {:?}", geometry::item_extent_from_measurement(0.0));
}
