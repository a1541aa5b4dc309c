//! Counter application: one key, several views with different transforms

use propwire::{Binder, Bindings, Connected, Transform, TransformError, Value};
use tracing_subscriber::EnvFilter;

fn count_of(v: &Value) -> Result<i64, TransformError> {
    v.try_ref::<i64>().copied()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Counter Application ===\n");

    let binder = Binder::new();

    println!("1. Seeding the counter");
    binder.set("count", Value::new(0_i64));
    binder.set("step", Value::new(1_i64));

    println!("\n2. Mounting the display");
    let display = Connected::builder(
        Bindings::new()
            .bind("count", "count")
            .bind_with(
                "negated",
                "count",
                Transform::new(|v| Ok(Value::new(-count_of(v)?))),
            )
            .bind_with(
                "parity",
                "count",
                Transform::new(|v| {
                    let label = if count_of(v)? % 2 == 0 { "even" } else { "odd" };
                    Ok(Value::new(label))
                }),
            )
            .bind("step", "step"),
    )
    .on_render(|props| {
        let show = |name: &str| {
            props
                .get(name)
                .and_then(Option::as_ref)
                .map(|v| {
                    v.downcast_ref::<i64>()
                        .map(ToString::to_string)
                        .or_else(|| v.downcast_ref::<&'static str>().map(ToString::to_string))
                        .unwrap_or_else(|| format!("{v:?}"))
                })
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "   [render] count: {} | negated: {} | parity: {} | step: {}",
            show("count"),
            show("negated"),
            show("parity"),
            show("step")
        );
    })
    .build();
    display.on_attach(&binder);

    let increment = |binder: &Binder| {
        let count = binder.get("count").and_then(|v| v.downcast_ref::<i64>().copied()).unwrap_or(0);
        let step = binder.get("step").and_then(|v| v.downcast_ref::<i64>().copied()).unwrap_or(1);
        binder.set("count", Value::new(count + step));
    };

    println!("\n3. Incrementing...");
    increment(&binder);
    increment(&binder);
    increment(&binder);

    println!("\n4. Changing step size to 5");
    binder.set("step", Value::new(5_i64));
    increment(&binder);

    println!("\n5. Writing the same value again (no render expected)");
    if let Some(current) = binder.get("count") {
        binder.set("count", current);
    }

    println!("\n6. Unmounting the display");
    display.on_detach(&binder);
    increment(&binder);
    println!(
        "   renders: {} | bindings left: {}",
        display.render_count(),
        binder.registry().total_bindings()
    );

    println!("\n✓ Counter application complete!");
}
