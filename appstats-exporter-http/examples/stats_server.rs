use std::thread;
use std::time::Duration;

use appstats_exporter_http::ServerBuilder;
use rand::Rng;

fn main() {
    tracing_subscriber::fmt::init();

    let server = ServerBuilder::new()
        .listen_address(([127, 0, 0, 1], 9000))
        .build()
        .expect("failed to build stats server");
    let address = server.start().expect("failed to start stats server");
    println!("serving stats on http://{}/stats", address);

    let registry = server.registry();
    registry.set_label("version", env!("CARGO_PKG_VERSION"));

    // Loop over and over, pretending to do some work.
    let mut rng = rand::rng();
    loop {
        registry.increment_counter("loops");

        registry.time("work", || {
            thread::sleep(Duration::from_millis(rng.random_range(5..50)));
        });

        if rng.random_bool(0.1) {
            registry.increment_counter("lucky_loops");
        }
    }
}
