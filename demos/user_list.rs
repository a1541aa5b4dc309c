//! Demonstration of a connected component tree: a root view listing user cards

use propwire::{Binder, Bindings, Connected, FieldMap, Transform, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct User {
    id: u32,
    name: String,
    online: bool,
}

impl User {
    fn new(id: u32, name: &str, online: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            online,
        }
    }
}

fn status(online: bool) -> &'static str {
    if online {
        "online"
    } else {
        "offline"
    }
}

fn users_of(props: &FieldMap) -> Vec<User> {
    props
        .get("users")
        .and_then(Option::as_ref)
        .and_then(|v| v.downcast_ref::<Vec<User>>().cloned())
        .unwrap_or_default()
}

/// One card per user; the card reads its user by index from the shared list.
fn user_card(idx: usize) -> Arc<Connected> {
    Connected::builder(Bindings::new().bind("users", "users"))
        .prop("idx", Value::new(idx))
        .on_render(|props| {
            let idx = props
                .get("idx")
                .and_then(Option::as_ref)
                .and_then(|v| v.downcast_ref::<usize>().copied())
                .unwrap_or(usize::MAX);
            if let Some(user) = users_of(props).get(idx) {
                println!("     [card #{}] {} is {}", user.id, user.name, status(user.online));
            }
        })
        .build()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== User List Example ===\n");

    let binder = Binder::new();

    println!("1. Loading initial data");
    let mut seed = HashMap::new();
    seed.insert("me.name".to_string(), Value::new("Thomas Foteau".to_string()));
    seed.insert("me.online".to_string(), Value::new(true));
    seed.insert(
        "users".to_string(),
        Value::new(vec![User::new(123, "Pierre", true), User::new(456, "Paul", false)]),
    );
    binder.init(Some(seed));

    println!("\n2. Mounting the root view");
    let root = Connected::builder(
        Bindings::new()
            .bind_with(
                "user_count",
                "users",
                Transform::new(|v| Ok(Value::new(v.try_ref::<Vec<User>>()?.len()))),
            )
            .bind("name", "me.name")
            .bind_with(
                "status",
                "me.online",
                Transform::new(|v| Ok(Value::new(status(*v.try_ref::<bool>()?)))),
            ),
    )
    .on_render(|props| {
        let text = |name: &str| {
            props
                .get(name)
                .and_then(Option::as_ref)
                .and_then(|v| {
                    v.downcast_ref::<String>()
                        .cloned()
                        .or_else(|| v.downcast_ref::<&'static str>().map(ToString::to_string))
                        .or_else(|| v.downcast_ref::<usize>().map(ToString::to_string))
                })
                .unwrap_or_default()
        };
        println!(
            "   [root] connected as {} ({}) | {} users",
            text("name"),
            text("status"),
            text("user_count")
        );
    })
    .build();
    root.on_attach(&binder);

    let mut cards: Vec<Arc<Connected>> = Vec::new();
    let mount_cards = |binder: &Binder, cards: &mut Vec<Arc<Connected>>| {
        let count = binder
            .get("users")
            .and_then(|v| v.downcast_ref::<Vec<User>>().map(Vec::len))
            .unwrap_or(0);
        while cards.len() < count {
            let card = user_card(cards.len());
            card.on_attach(binder);
            cards.push(card);
        }
    };
    mount_cards(&binder, &mut cards);

    println!("\n3. Adding a user (copy, then write the new list)");
    let mut users = binder
        .get("users")
        .and_then(|v| v.downcast_ref::<Vec<User>>().cloned())
        .unwrap_or_default();
    users.push(User::new(789, "Jacques", true));
    binder.set("users", Value::new(users));
    mount_cards(&binder, &mut cards);

    println!("\n4. Toggling my status");
    let toggle_my_status = |binder: &Binder| {
        let online = binder
            .get("me.online")
            .and_then(|v| v.downcast_ref::<bool>().copied())
            .unwrap_or(false);
        binder.set("me.online", Value::new(!online));
    };
    toggle_my_status(&binder);
    toggle_my_status(&binder);

    println!("\n5. Unmounting the last card");
    if let Some(card) = cards.pop() {
        card.on_detach(&binder);
    }
    println!(
        "   subscribers on \"users\": {}",
        binder.registry().subscriber_count("users")
    );

    println!("\n✓ Example complete!");
}
