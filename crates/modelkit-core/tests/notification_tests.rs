//! Notification Tests
//!
//! Observer delivery for reflective writes and list mutations.
//!
//! ## Scenarios Covered
//!
//! 1. Bulk insert produces exactly one ADD_MANY
//! 2. Bulk removal reports original positions in one REMOVE_MANY
//! 3. Single-element batches report ADD and REMOVE
//! 4. SET, UNSET and touch detection
//! 5. MOVE carries the previous index
//! 6. Observer registration and REMOVING_ADAPTER
//! 7. Delivery switch and fixed delivery
//! 8. Inverse updates are dispatched before the owner's event
//! 9. Chain merging of compatible events

mod common;

use common::{feature, ints, library_with_books, new_graph, numbers_with, obj};
use modelkit_core::{
    EventKind, EventLog, EventValue, ModelError, Notification, NotificationChain, Observer,
    ObserverHandle, ObjectId, ObjectOptions, OrderedList, Value,
};

fn observe(graph: &mut modelkit_core::Graph, object: ObjectId) -> std::rc::Rc<std::cell::RefCell<EventLog>> {
    let log = EventLog::shared();
    assert!(graph.add_observer(object, log.clone()).unwrap());
    log
}

#[test]
fn test_insert_all_emits_single_add_many() {
    // GIVEN [1,2,3] with an observer
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3]);
    let values = feature(&graph, numbers, "values");
    let log = observe(&mut graph, numbers);

    // WHEN two elements are inserted at the front
    graph
        .list(numbers, values)
        .unwrap()
        .insert_all(0, ints(&[4, 5]))
        .unwrap();

    // THEN exactly one ADD_MANY arrives
    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::AddMany]);
    let event = log.last().unwrap();
    assert_eq!(event.new_value(), &EventValue::Values(ints(&[4, 5])));
    assert_eq!(event.position(), Some(0));
    assert_eq!(event.feature(), Some(values));
    assert_eq!(graph.values(numbers, values).unwrap(), ints(&[4, 5, 1, 2, 3]));
}

#[test]
fn test_remove_all_reports_original_positions() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3, 4, 5]);
    let values = feature(&graph, numbers, "values");
    let log = observe(&mut graph, numbers);

    graph
        .list(numbers, values)
        .unwrap()
        .remove_all(&ints(&[2, 4]))
        .unwrap();

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::RemoveMany]);
    let event = log.last().unwrap();
    assert_eq!(event.old_value(), &EventValue::Values(ints(&[2, 4])));
    assert_eq!(event.new_value(), &EventValue::Positions(vec![1, 3]));
    assert_eq!(event.position(), Some(1));
}

#[test]
fn test_single_element_batches_report_single_events() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3]);
    let values = feature(&graph, numbers, "values");
    let log = observe(&mut graph, numbers);

    {
        let mut list = graph.list(numbers, values).unwrap();
        list.add_all(ints(&[7])).unwrap();
        list.remove_all(&ints(&[2])).unwrap();
        list.remove_all(&ints(&[42])).unwrap();
        list.add_all(Vec::new()).unwrap();
    }

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::Add, EventKind::Remove]);
    assert_eq!(log.events()[0].position(), Some(3));
    assert_eq!(log.events()[1].old_value(), &EventValue::Value(Value::Int(2)));
    assert_eq!(log.events()[1].position(), Some(1));
}

#[test]
fn test_set_and_touch() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let title = feature(&graph, book, "title");
    let log = observe(&mut graph, book);

    graph.set(book, title, Some("Dune".into())).unwrap();
    graph.set(book, title, Some("Dune".into())).unwrap();

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::Set, EventKind::Set]);
    assert_eq!(log.events()[0].old_value(), &EventValue::None);
    assert_eq!(log.events()[0].new_value(), &EventValue::Value("Dune".into()));
    assert!(!log.events()[0].is_touch());
    assert!(log.events()[1].is_touch());
}

#[test]
fn test_unset_kind_depends_on_unsettable() {
    let (mut graph, classes) = new_graph();
    let novel = graph.create(classes.novel).unwrap();
    let genre = feature(&graph, novel, "genre");
    let pages = feature(&graph, novel, "pages");
    graph.set(novel, genre, Some("sf".into())).unwrap();
    graph.set(novel, pages, Some(Value::Int(300))).unwrap();
    let log = observe(&mut graph, novel);

    graph.unset(novel, genre).unwrap();
    graph.unset(novel, pages).unwrap();

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::Unset, EventKind::Set]);
    assert_eq!(log.events()[1].old_value(), &EventValue::Value(Value::Int(300)));
    assert_eq!(log.events()[1].new_value(), &EventValue::Value(Value::Int(0)));
    assert!(!graph.is_set(novel, genre).unwrap());
    assert!(!graph.is_set(novel, pages).unwrap());
}

#[test]
fn test_move_carries_previous_index() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3]);
    let values = feature(&graph, numbers, "values");
    let log = observe(&mut graph, numbers);

    {
        let mut list = graph.list(numbers, values).unwrap();
        list.move_to(0, 2).unwrap();
        list.move_to(1, 1).unwrap();
    }

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::Move, EventKind::Move]);
    let first = &log.events()[0];
    assert_eq!(first.old_value(), &EventValue::Index(0));
    assert_eq!(first.new_value(), &EventValue::Value(Value::Int(1)));
    assert_eq!(first.position(), Some(2));
    assert!(!first.is_touch());
    assert!(log.events()[1].is_touch());
}

#[test]
fn test_observer_registration_and_removal() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let log = EventLog::shared();
    let handle: ObserverHandle = log.clone();

    assert!(graph.add_observer(book, handle.clone()).unwrap());
    assert!(!graph.add_observer(book, handle.clone()).unwrap());
    assert_eq!(graph.observers(book).unwrap().len(), 1);
    assert_eq!(log.borrow().target(), Some(book));

    assert!(graph.remove_observer(book, &handle).unwrap());
    assert!(!graph.remove_observer(book, &handle).unwrap());

    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::RemovingAdapter]);
    assert_eq!(log.last().unwrap().position(), Some(0));
    assert_eq!(log.target(), None);
    assert!(graph.observers(book).unwrap().is_empty());
}

#[test]
fn test_delivery_switch() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let title = feature(&graph, book, "title");
    let log = observe(&mut graph, book);

    graph.set_deliver(book, false).unwrap();
    assert!(!graph.notification_required(book));
    graph.set(book, title, Some("quiet".into())).unwrap();
    assert!(log.borrow().is_empty());

    graph.set_deliver(book, true).unwrap();
    graph.set(book, title, Some("loud".into())).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_fixed_delivery_cannot_be_switched() {
    let (mut graph, classes) = new_graph();
    let book = graph
        .create_with(
            classes.book,
            ObjectOptions {
                fixed_delivery: true,
                ..ObjectOptions::default()
            },
        )
        .unwrap();

    let err = graph.set_deliver(book, false).unwrap_err();
    assert!(matches!(err, ModelError::UnsupportedOperation { .. }));
    assert!(graph.deliver(book));
}

#[test]
fn test_inverse_update_dispatched_before_owner_event() {
    // GIVEN one log observing both a library and a loose book
    let (mut graph, classes) = new_graph();
    let (library, _) = library_with_books(&mut graph, &classes, 0);
    let book = graph.create(classes.book).unwrap();
    let books = feature(&graph, library, "books");
    let book_library = feature(&graph, book, "library");
    let log = observe(&mut graph, library);
    assert!(graph.add_observer(book, log.clone()).unwrap());

    // WHEN the book is added to the library
    graph.list(library, books).unwrap().add(obj(book)).unwrap();

    // THEN the book's container SET precedes the library's ADD
    let log = log.borrow();
    assert_eq!(log.kinds(), vec![EventKind::Set, EventKind::Add]);
    assert_eq!(log.events()[0].notifier(), book);
    assert_eq!(log.events()[0].feature(), Some(book_library));
    assert_eq!(log.events()[0].new_value(), &EventValue::Value(obj(library)));
    assert_eq!(log.events()[1].notifier(), library);
}

#[test]
fn test_chain_merges_in_queue_order() {
    let (o, f) = (ObjectId::new(0), modelkit_core::FeatureId::new(0));
    let mut chain = NotificationChain::new();

    assert!(chain.add(Notification::set(o, f, Some(1.into()), Some(2.into()))));
    assert!(!chain.add(Notification::set(o, f, Some(2.into()), Some(3.into()))));
    assert!(chain.add(Notification::remove(o, f, 10.into(), 4)));
    assert!(!chain.add(Notification::remove(o, f, 11.into(), 4)));
    assert!(chain.add(Notification::no_event(o)));

    let events = chain.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].old_value(), &EventValue::Value(1.into()));
    assert_eq!(events[0].new_value(), &EventValue::Value(3.into()));
    assert_eq!(events[1].kind(), EventKind::RemoveMany);
    assert_eq!(events[1].old_value(), &EventValue::Values(ints(&[10, 11])));
    assert_eq!(events[1].new_value(), &EventValue::Positions(vec![4, 5]));
}
