//! Ordered List Tests
//!
//! Public list operations over feature-backed lists.
//!
//! ## Scenarios Covered
//!
//! 1. Insert bounds and uniqueness filtering
//! 2. Insertion-point moves of an element
//! 3. Index moves keep the moved element at the target index
//! 4. Set on unique lists rejects duplicates
//! 5. Bulk operations and clear
//! 6. Property: add implies contains, unique add is idempotent

mod common;

use common::{feature, int_values, ints, new_graph, numbers_with};
use modelkit_core::{ElementList, ListPrimitives, ModelError, OrderedList, Value};
use proptest::prelude::*;

#[test]
fn test_move_object_scenarios() {
    // GIVEN [2,4,6,8,10]
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[2, 4, 6, 8, 10]);
    let values = feature(&graph, numbers, "values");

    // WHEN 4 is moved in front of index 3
    graph
        .list(numbers, values)
        .unwrap()
        .move_object(3, &Value::Int(4))
        .unwrap();

    // THEN it lands between 6 and 8
    assert_eq!(int_values(&graph, numbers, "values"), vec![2, 6, 4, 8, 10]);

    // AND moving it to the front of a fresh list puts it first
    let fresh = numbers_with(&mut graph, &classes, "values", &[2, 4, 6, 8, 10]);
    graph
        .list(fresh, values)
        .unwrap()
        .move_object(0, &Value::Int(4))
        .unwrap();
    assert_eq!(int_values(&graph, fresh, "values"), vec![4, 2, 6, 8, 10]);
}

#[test]
fn test_unique_insert_of_present_element_is_noop() {
    // GIVEN a unique list [3,5,7]
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "unique_values", &[3, 5, 7]);
    let unique = feature(&graph, numbers, "unique_values");

    // WHEN 3 is inserted at index 2
    let inserted = graph
        .list(numbers, unique)
        .unwrap()
        .insert(2, Value::Int(3))
        .unwrap();

    // THEN nothing changes
    assert!(!inserted);
    assert_eq!(int_values(&graph, numbers, "unique_values"), vec![3, 5, 7]);
}

#[test]
fn test_insert_out_of_range_reports_bounds() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2]);
    let values = feature(&graph, numbers, "values");

    let err = graph
        .list(numbers, values)
        .unwrap()
        .insert(3, Value::Int(9))
        .unwrap_err();

    assert_eq!(err, ModelError::IndexOutOfRange { index: 3, size: 2 });
    assert_eq!(int_values(&graph, numbers, "values"), vec![1, 2]);
}

#[test]
fn test_insert_rejects_wrong_data_type_atomically() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1]);
    let values = feature(&graph, numbers, "values");

    let result = graph
        .list(numbers, values)
        .unwrap()
        .add_all(vec![Value::Int(2), Value::from("three")]);

    assert!(matches!(result, Err(ModelError::InvalidValue { .. })));
    assert_eq!(int_values(&graph, numbers, "values"), vec![1]);
}

#[test]
fn test_set_duplicate_in_unique_list() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "unique_values", &[1, 2, 3]);
    let unique = feature(&graph, numbers, "unique_values");
    let mut list = graph.list(numbers, unique).unwrap();

    assert_eq!(
        list.set(0, Value::Int(3)),
        Err(ModelError::DuplicateElement { index: 2 })
    );
    assert_eq!(list.set(0, Value::Int(1)), Ok(Value::Int(1)));
    assert_eq!(list.set(0, Value::Int(9)), Ok(Value::Int(1)));
    assert_eq!(list.to_vec(), ints(&[9, 2, 3]));
}

#[test]
fn test_non_unique_list_keeps_duplicates() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1]);
    let values = feature(&graph, numbers, "values");
    let mut list = graph.list(numbers, values).unwrap();

    assert!(list.add(Value::Int(1)).unwrap());
    assert_eq!(list.len(), 2);
    assert!(list.remove(&Value::Int(1)).unwrap());
    assert_eq!(list.to_vec(), ints(&[1]));
    assert!(!list.remove(&Value::Int(5)).unwrap());
}

#[test]
fn test_move_to_bounds() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3]);
    let values = feature(&graph, numbers, "values");
    let mut list = graph.list(numbers, values).unwrap();

    assert!(matches!(
        list.move_to(0, 3),
        Err(ModelError::IndexOutOfRange { index: 3, size: 3 })
    ));
    assert!(matches!(
        list.move_object(1, &Value::Int(7)),
        Err(ModelError::ElementNotFound { .. })
    ));
    assert_eq!(list.move_to(2, 0).unwrap(), Value::Int(3));
    assert_eq!(list.to_vec(), ints(&[3, 1, 2]));
}

#[test]
fn test_bulk_removal_and_clear() {
    let (mut graph, classes) = new_graph();
    let numbers = numbers_with(&mut graph, &classes, "values", &[1, 2, 3, 4, 5, 6]);
    let values = feature(&graph, numbers, "values");
    let mut list = graph.list(numbers, values).unwrap();

    assert!(list.remove_all(&ints(&[2, 4])).unwrap());
    assert_eq!(list.to_vec(), ints(&[1, 3, 5, 6]));
    assert_eq!(list.remove_range(1, 3).unwrap(), ints(&[3, 5]));
    assert_eq!(list.remove_at(0).unwrap(), Value::Int(1));
    assert_eq!(list.clear().unwrap(), ints(&[6]));
    assert!(list.is_empty());
    assert!(matches!(
        list.remove_at(0),
        Err(ModelError::IndexOutOfRange { index: 0, size: 0 })
    ));
}

#[test]
fn test_list_on_single_valued_feature_rejected() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let title = feature(&graph, book, "title");
    assert!(matches!(
        graph.list(book, title),
        Err(ModelError::NotMany { .. })
    ));
}

proptest! {
    #[test]
    fn prop_add_implies_contains(items in proptest::collection::vec(0i64..20, 0..30), extra in 0i64..20) {
        let mut list = ElementList::from_vec(items);
        list.add(extra).unwrap();
        prop_assert!(list.contains(&extra));
    }

    #[test]
    fn prop_unique_add_is_idempotent(items in proptest::collection::vec(0i64..20, 0..30), extra in 0i64..20) {
        let mut list = ElementList::unique();
        list.add_all(items).unwrap();
        list.add(extra).unwrap();
        let size = list.len();
        prop_assert!(!list.add(extra).unwrap());
        prop_assert_eq!(list.len(), size);
    }

    #[test]
    fn prop_move_to_places_element(len in 1usize..15, a in 0usize..15, b in 0usize..15) {
        let from = a % len;
        let to = b % len;
        let mut list = ElementList::from_vec((0..len).collect::<Vec<_>>());
        let moved = list.move_to(from, to).unwrap();
        prop_assert_eq!(list.index_of(&moved), Some(to));
        prop_assert_eq!(list.len(), len);
    }
}
