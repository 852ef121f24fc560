//! End-to-end scenarios across the whole engine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::persist::{attach, JsonFilePersistor};
use crate::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn record(store: &Store) -> Rc<RefCell<Vec<Notification>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.subscribe(move |n| sink.borrow_mut().push(n.clone()));
    seen
}

fn todos() -> ModuleDescriptor {
    ModuleDescriptor::new()
        .state(json!({ "items": [], "filter": "all" }))
        .reducer("add", |state, args| {
            let mut items = state.get("items")?.as_array()?.clone();
            items.push(json!({ "text": args.first()?.clone(), "done": false }));
            Some(Slice::from(json!({ "items": items })))
        })
        .reducer("toggle", |state, args| {
            let index = usize::try_from(args.first()?.as_u64()?).ok()?;
            let mut items = state.get("items")?.as_array()?.clone();
            let done = items.get(index)?.get("done")?.as_bool()?;
            items[index]["done"] = json!(!done);
            Some(Slice::from(json!({ "items": items })))
        })
        .reducer("filter", |_, args| {
            Some(Slice::from(json!({ "filter": args.first()?.clone() })))
        })
        .action("add_all", |ctx, args| {
            for text in args {
                ctx.commit("add", std::slice::from_ref(text))?;
            }
            Ok(Some(json!(args.len())))
        })
        .getter("remaining", |state| {
            let items = state.get("items").and_then(Slice::as_array);
            let n = items.map_or(0, |items| {
                items.iter().filter(|item| item["done"] == json!(false)).count()
            });
            Slice::from(n as i64)
        })
        .selector(
            "visible",
            Selector::new(["items", "filter"], |inputs, _| {
                let filter = inputs[1].as_str().unwrap_or("all");
                let items = inputs[0].as_array().cloned().unwrap_or_default();
                let visible: Vec<Value> = items
                    .into_iter()
                    .filter(|item| match filter {
                        "done" => item["done"] == json!(true),
                        "open" => item["done"] == json!(false),
                        _ => true,
                    })
                    .collect();
                Slice::from(Value::Array(visible))
            }),
        )
}

fn stats() -> ModuleDescriptor {
    ModuleDescriptor::new()
        .state(json!({ "added": 0 }))
        .listener("todos/add", |ctx, _, _| {
            let added = ctx.state.get("added")?.as_i64()?;
            Some(Slice::from(json!({ "added": added + 1 })))
        })
}

#[test]
fn todo_app() {
    init_logging();
    let store = Store::new(
        ModuleDescriptor::new()
            .module("todos", todos())
            .module("stats", stats()),
    )
    .unwrap();
    let seen = record(&store);

    let added = store
        .dispatch("todos/add_all", &[json!("milk"), json!("eggs"), json!("tea")])
        .unwrap();
    assert_eq!(added, Some(json!(3)));
    assert_eq!(store.get("stats/added").unwrap().as_i64(), Some(3));
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].trigger, Trigger::Action);

    store.commit("todos/toggle", &[json!(1)]).unwrap();
    store.commit("todos/filter", &[json!("open")]).unwrap();
    assert_eq!(store.get("todos/remaining").unwrap().as_i64(), Some(2));
    let visible = store.select("todos/visible", &[]).unwrap();
    assert_eq!(visible.as_array().map(Vec::len), Some(2));

    // Unrelated changes keep the memoized result.
    store.commit("stats/push", &[json!({ "added": 0 })]).unwrap();
    let again = store.select("todos/visible", &[]).unwrap();
    assert!(Slice::ptr_eq(&visible, &again));
    assert_eq!(store.recomputations("todos/visible"), Some(1));
    assert_eq!(seen.borrow().len(), 4);
}

#[test]
fn combined_counters() {
    init_logging();
    let adder = |step: i64| {
        Store::new(
            ModuleDescriptor::new()
                .state(0)
                .reducer("call", move |state, _| Some(Slice::from(state.as_i64()? + step))),
        )
        .unwrap()
    };
    let foo = adder(1);
    let bar = adder(2);
    let foo_call = Rc::clone(foo.mutate().leaf("call").unwrap());

    let app = Store::combine("app", [("foo", foo), ("bar", bar.clone())]).unwrap();
    let seen = record(&app);

    foo_call.call(&[]).unwrap();
    bar.commit("call", &[]).unwrap();
    assert_eq!(app.state(), json!({ "foo": 1, "bar": 2 }));

    let paths: Vec<String> = seen.borrow().iter().map(|n| n.path.clone()).collect();
    assert_eq!(paths, ["foo/call", "bar/call"]);
}

#[test]
fn listeners_inside_composed_members() {
    init_logging();
    let list = Store::new(
        ModuleDescriptor::new()
            .module("todos", todos())
            .module("stats", stats()),
    )
    .unwrap();
    let counter = Store::new(
        ModuleDescriptor::new()
            .state(0)
            .reducer("inc", |state, _| Some(Slice::from(state.as_i64()? + 1))),
    )
    .unwrap();
    let app = Store::combine("app", [("list", list.clone()), ("counter", counter)]).unwrap();
    let seen = record(&app);

    app.commit("list/todos/add", &[json!("bread")]).unwrap();
    assert_eq!(app.get("list/stats/added").unwrap().as_i64(), Some(1));
    assert_eq!(list.get("stats/added").unwrap().as_i64(), Some(1));
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].path, "list/todos/add");
}

#[test]
fn staging_and_batching_across_members() {
    init_logging();
    let counter = || {
        Store::new(
            ModuleDescriptor::new()
                .state(0)
                .reducer("inc", |state, _| Some(Slice::from(state.as_i64()? + 1))),
        )
        .unwrap()
    };
    let a = counter();
    let app = Store::combine("app", [("a", a.clone()), ("b", counter())]).unwrap();
    let seen = record(&app);

    // A member's stage is the aggregate's stage.
    a.stage();
    assert!(app.is_staging());
    a.commit("inc", &[]).unwrap();
    app.commit("b/inc", &[]).unwrap();
    app.stage_push("b/inc", &[]);
    assert_eq!(seen.borrow().len(), 1);

    app.batch().push("a/inc", &[]).push("b/inc", &[]);
    app.batch().done().unwrap();
    assert_eq!(app.state(), json!({ "a": 2, "b": 2 }));
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].trigger, Trigger::Batch);
    assert_eq!(seen[1].entries.len(), 2);
}

#[test]
fn persisted_across_restarts() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.json");
    let build = || {
        Store::new(
            ModuleDescriptor::new()
                .module("todos", todos())
                .module("stats", stats()),
        )
        .unwrap()
    };

    {
        let store = build();
        attach(&store, Rc::new(JsonFilePersistor::new(&path))).unwrap();
        store.dispatch("todos/add_all", &[json!("a"), json!("b")]).unwrap();
    }

    let store = build();
    let subscription = attach(&store, Rc::new(JsonFilePersistor::new(&path))).unwrap();
    assert_eq!(store.get("todos/remaining").unwrap().as_i64(), Some(2));
    assert_eq!(store.get("stats/added").unwrap().as_i64(), Some(2));
    assert!(subscription.unsubscribe());
}

#[test]
fn configuration_from_toml() {
    let config = StoreConfig::from_toml_str(
        r#"
        name = "relaxed"
        strict_listeners = false

        [enhance]
        auto_apply_actions = true
        "#,
    )
    .unwrap();
    let store = Store::with_config(
        ModuleDescriptor::new().module(
            "session",
            ModuleDescriptor::new()
                .state(json!({ "user": null }))
                .action("login", |_, args| {
                    let user = args.first().cloned().unwrap_or(Value::Null);
                    Ok(Some(json!({ "user": user })))
                })
                .listener("auth/logout", |_, _, _| None),
        ),
        config,
    )
    .unwrap();

    assert_eq!(store.name(), "relaxed");
    store.dispatch("session/login", &[json!("ada")]).unwrap();
    assert_eq!(store.get("session/user").unwrap(), json!("ada"));
}
