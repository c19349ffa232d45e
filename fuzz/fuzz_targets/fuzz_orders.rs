#![no_main]

use frontier::game::{Order, parse_orders};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Text orders that parse must print back to the same order.
    if let Ok(orders) = parse_orders(text) {
        for order in orders {
            let printed = order.to_string();
            let reparsed: Order = printed.parse().expect("printed order should parse");
            assert_eq!(reparsed, order, "text round trip changed {printed}");
        }
    }

    // Same for JSON.
    if let Ok(order) = Order::from_json(text) {
        let json = serde_json::to_string(&order).expect("order should serialize");
        let reparsed = Order::from_json(&json).expect("serialized order should parse");
        assert_eq!(reparsed, order);
    }
});
