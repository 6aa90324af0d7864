//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! Set `RUST_LOG=component_container=trace` to also see cache hits.

use component_container::{Container, Factory, Options};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Option<Arc<Database>>,
}

#[allow(dead_code)]
struct RequestContext {
    request_id: u64,
}

fn main() {
    component_container::logging::init();

    println!("=== Component Container Logging Demo ===\n");

    // Falls back to a generic request context for unregistered "request" ids
    let container = Container::with_resolver(|id| {
        id.starts_with("request:")
            .then(|| Factory::constructor(|_, _| RequestContext { request_id: 0 }))
    });

    // logs: "Registering component"
    container.register(
        "db:main",
        Factory::constructor(|_, _| Database {
            url: "postgres://localhost/mydb".into(),
        }),
    );
    container.register(
        "service:users",
        Factory::extendable(|props, _| UserService {
            db: props.get_as::<Database>("db"),
        }),
    );

    // logs: "Registering injection rule", "Merging type-level options"
    container.inject("service", "db", "db:main");
    container
        .options_for_type("request", Options::transient())
        .expect("bare type name");

    // logs: "Augmenting extendable factory with injections", "Constructing component"
    let _users = container.resolve("service:users").expect("resolvable");

    // Second resolve is a cache hit (TRACE)
    let _users = container.resolve("service:users").expect("resolvable");

    // logs: "Identifier not registered, consulting fallback resolver"
    let _request = container.resolve("request:42").expect("resolvable");

    // logs: "Component not found in registry or fallback resolver"
    let missing = container.resolve("cache:main").expect("no injections");
    assert!(missing.is_none());

    // logs: "Circular dependency detected"
    container.register("a:main", Factory::constructor(|_, _| ()));
    container.register("b:main", Factory::constructor(|_, _| ()));
    container.inject("a:main", "b", "b:main");
    container.inject("b:main", "a", "a:main");
    let cycle = container.resolve("a:main");
    assert!(cycle.is_err());

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
