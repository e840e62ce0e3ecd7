//! Deep Copy Tests
//!
//! Containment-subtree copies and cross-reference rewiring.
//!
//! ## Scenarios Covered
//!
//! 1. Attributes and containment are copied structurally
//! 2. Copies are independent of their originals
//! 3. References inside the copied set point at copies
//! 4. One-way references leaving the set keep their original target
//! 5. Bidirectional references leaving the set are dropped
//! 6. Derived features are not copied
//! 7. Proxy locators are carried over

mod common;

use common::{feature, library_with_books, new_graph, obj, objects};
use modelkit_core::copy::{copy, copy_all};
use modelkit_core::{CopyOptions, Copier, OrderedList, Value};

#[test]
fn test_copy_is_structurally_equal() {
    // GIVEN a library with two books, one with a cover and tags
    let (mut graph, classes) = new_graph();
    let (library, books) = library_with_books(&mut graph, &classes, 2);
    let name = feature(&graph, library, "name");
    graph.set(library, name, Some("Central".into())).unwrap();
    let pages = feature(&graph, books[0], "pages");
    graph.set(books[0], pages, Some(Value::Int(412))).unwrap();
    let tags = feature(&graph, books[0], "tags");
    graph
        .list(books[0], tags)
        .unwrap()
        .add_all(vec!["sf".into(), "sf".into()])
        .unwrap();
    let image = graph.create(classes.image).unwrap();
    let cover = feature(&graph, books[0], "cover");
    graph.set(books[0], cover, Some(obj(image))).unwrap();

    // WHEN the library is copied
    let copied = copy(&mut graph, library).unwrap();

    // THEN the copy is a new object with equal values
    assert_ne!(copied, library);
    assert_eq!(graph.get(copied, name).unwrap(), Some("Central".into()));
    let copied_books = objects(&graph, copied, "books");
    assert_eq!(copied_books.len(), 2);
    assert!(copied_books.iter().all(|b| !books.contains(b)));
    let title = feature(&graph, books[0], "title");
    assert_eq!(graph.get(copied_books[0], title).unwrap(), Some("b0".into()));
    assert_eq!(graph.get(copied_books[1], title).unwrap(), Some("b1".into()));
    assert_eq!(graph.get(copied_books[0], pages).unwrap(), Some(Value::Int(412)));
    assert_eq!(
        graph.values(copied_books[0], tags).unwrap(),
        vec![Value::from("sf"), Value::from("sf")]
    );

    // AND containers point into the copy
    assert_eq!(graph.container(copied_books[0]), Some(copied));
    let copied_cover = graph.get(copied_books[0], cover).unwrap().and_then(|v| v.as_object());
    assert!(copied_cover.is_some_and(|c| c != image));
    assert_eq!(graph.container(copied_cover.unwrap()), Some(copied_books[0]));
    assert_eq!(graph.container(image), Some(books[0]));
}

#[test]
fn test_copy_is_independent() {
    let (mut graph, classes) = new_graph();
    let (library, books) = library_with_books(&mut graph, &classes, 1);
    let copied = copy(&mut graph, library).unwrap();
    let copied_book = objects(&graph, copied, "books")[0];
    let title = feature(&graph, books[0], "title");

    graph.set(copied_book, title, Some("changed".into())).unwrap();
    let books_f = feature(&graph, copied, "books");
    graph.list(copied, books_f).unwrap().clear().unwrap();

    assert_eq!(graph.get(books[0], title).unwrap(), Some("b0".into()));
    assert_eq!(objects(&graph, library, "books"), books);
}

#[test]
fn test_references_inside_set_are_rewired() {
    // GIVEN b0 related to b1 and written by a writer of the same library
    let (mut graph, classes) = new_graph();
    let (library, books) = library_with_books(&mut graph, &classes, 2);
    let writer = graph.create(classes.writer).unwrap();
    let writers = feature(&graph, library, "writers");
    graph.list(library, writers).unwrap().add(obj(writer)).unwrap();
    let related = feature(&graph, books[0], "related");
    graph.list(books[0], related).unwrap().add(obj(books[1])).unwrap();
    let authors = feature(&graph, books[0], "authors");
    graph.list(books[0], authors).unwrap().add(obj(writer)).unwrap();

    // WHEN the library is copied
    let mut copier = Copier::new(&mut graph, CopyOptions::default());
    let copied = copier.copy(library).unwrap();
    copier.copy_references().unwrap();
    let book0 = copier.get(books[0]).unwrap();
    let book1 = copier.get(books[1]).unwrap();
    let copied_writer = copier.get(writer).unwrap();
    assert_eq!(copier.len(), 4);

    // THEN references point at copies and opposites are consistent
    assert_eq!(objects(&graph, copied, "books"), vec![book0, book1]);
    assert_eq!(objects(&graph, book0, "related"), vec![book1]);
    assert_eq!(objects(&graph, book0, "authors"), vec![copied_writer]);
    assert_eq!(objects(&graph, copied_writer, "books_written"), vec![book0]);
    assert_eq!(objects(&graph, writer, "books_written"), vec![books[0]]);
}

#[test]
fn test_one_way_reference_leaving_set_keeps_original() {
    let (mut graph, classes) = new_graph();
    let (_, books) = library_with_books(&mut graph, &classes, 2);
    let related = feature(&graph, books[0], "related");
    graph.list(books[0], related).unwrap().add(obj(books[1])).unwrap();

    let kept = copy(&mut graph, books[0]).unwrap();
    assert_eq!(objects(&graph, kept, "related"), vec![books[1]]);

    let mut copier = Copier::new(
        &mut graph,
        CopyOptions {
            use_original_references: false,
            ..CopyOptions::default()
        },
    );
    let dropped = copier.copy(books[0]).unwrap();
    copier.copy_references().unwrap();
    assert!(objects(&graph, dropped, "related").is_empty());
}

#[test]
fn test_bidirectional_reference_leaving_set_is_dropped() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let writer = graph.create(classes.writer).unwrap();
    let authors = feature(&graph, book, "authors");
    graph.list(book, authors).unwrap().add(obj(writer)).unwrap();

    let copied = copy(&mut graph, book).unwrap();

    assert!(objects(&graph, copied, "authors").is_empty());
    assert_eq!(objects(&graph, writer, "books_written"), vec![book]);
}

#[test]
fn test_copy_all_rewires_between_roots() {
    let (mut graph, classes) = new_graph();
    let a = graph.create(classes.writer).unwrap();
    let b = graph.create(classes.writer).unwrap();
    let spouse = feature(&graph, a, "spouse");
    graph.set(a, spouse, Some(obj(b))).unwrap();

    let copies = copy_all(&mut graph, &[a, b]).unwrap();

    assert_eq!(graph.get(copies[0], spouse).unwrap(), Some(obj(copies[1])));
    assert_eq!(graph.get(copies[1], spouse).unwrap(), Some(obj(copies[0])));
    assert_eq!(graph.get(a, spouse).unwrap(), Some(obj(b)));
}

#[test]
fn test_derived_feature_not_copied() {
    let (mut graph, classes) = new_graph();
    let book = graph.create(classes.book).unwrap();
    let summary = feature(&graph, book, "summary");
    graph.set(book, summary, Some("cached".into())).unwrap();

    let copied = copy(&mut graph, book).unwrap();

    assert_eq!(graph.get(copied, summary).unwrap(), None);
}

#[test]
fn test_proxy_locator_carried_over() {
    let (mut graph, classes) = new_graph();
    let proxy = graph.create_proxy(classes.book, "remote.xml#b7").unwrap();

    let copied = copy(&mut graph, proxy).unwrap();

    assert!(graph.is_proxy(copied));
    assert_eq!(graph.proxy_uri(copied), Some("remote.xml#b7"));
}
