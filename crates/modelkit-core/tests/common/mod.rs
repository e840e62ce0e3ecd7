//! Shared fixture: a small library metamodel
//!
//! - Library: name, books (Book*, opposite Book.library), writers (Writer*),
//!   branches (Library*, opposite Library.parent)
//! - Book: title, pages, tags (Str*, duplicates allowed), library
//!   (container), authors (Writer*, opposite Writer.books_written), related
//!   (Book*, one-way), cover (Image, single containment), summary (derived)
//! - Novel extends Book: genre
//! - Writer: name, books_written, spouse (self-opposite)
//! - Image: uri
//! - Numbers: values (Int*, duplicates allowed), unique_values (Int*)

use std::sync::Arc;

use modelkit_core::{
    ClassId, DataType, FeatureDef, FeatureId, Graph, Metamodel, MetamodelBuilder, ObjectId,
    OrderedList, Value,
};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub struct Classes {
    pub library: ClassId,
    pub book: ClassId,
    pub novel: ClassId,
    pub writer: ClassId,
    pub image: ClassId,
    pub numbers: ClassId,
}

#[allow(dead_code)]
pub fn library_metamodel() -> (Arc<Metamodel>, Classes) {
    let mut b = MetamodelBuilder::new("library");
    let library = b.class("Library");
    let book = b.class("Book");
    let novel = b.class("Novel");
    let writer = b.class("Writer");
    let image = b.class("Image");
    let numbers = b.class("Numbers");

    b.feature(library, FeatureDef::attribute("name", DataType::Str))
        .feature(library, FeatureDef::containment("books", book).many())
        .feature(library, FeatureDef::containment("writers", writer).many())
        .feature(library, FeatureDef::containment("branches", library).many())
        .feature(library, FeatureDef::reference("parent", library))
        .opposites(library, "branches", library, "parent");

    b.feature(book, FeatureDef::attribute("title", DataType::Str))
        .feature(
            book,
            FeatureDef::attribute("pages", DataType::Int).with_default(Value::Int(0)),
        )
        .feature(book, FeatureDef::attribute("tags", DataType::Str).many())
        .feature(book, FeatureDef::reference("library", library))
        .feature(book, FeatureDef::reference("authors", writer).many())
        .feature(book, FeatureDef::reference("related", book).many())
        .feature(book, FeatureDef::containment("cover", image))
        .feature(
            book,
            FeatureDef::attribute("summary", DataType::Str).derived(),
        )
        .opposites(library, "books", book, "library")
        .opposites(book, "authors", writer, "books_written");

    b.supertype(novel, book)
        .feature(novel, FeatureDef::attribute("genre", DataType::Str).unsettable());

    b.feature(writer, FeatureDef::attribute("name", DataType::Str))
        .feature(writer, FeatureDef::reference("books_written", book).many())
        .feature(writer, FeatureDef::reference("spouse", writer))
        .opposites(writer, "spouse", writer, "spouse");

    b.feature(image, FeatureDef::attribute("uri", DataType::Str));

    b.feature(numbers, FeatureDef::attribute("values", DataType::Int).many())
        .feature(
            numbers,
            FeatureDef::attribute("unique_values", DataType::Int)
                .many()
                .unique(true),
        );

    let metamodel = b.build().expect("library metamodel is valid");
    (
        Arc::new(metamodel),
        Classes {
            library,
            book,
            novel,
            writer,
            image,
            numbers,
        },
    )
}

/// Empty graph over the library metamodel
#[allow(dead_code)]
pub fn new_graph() -> (Graph, Classes) {
    let (metamodel, classes) = library_metamodel();
    (Graph::new(metamodel), classes)
}

/// Feature id by name on the object's class
#[allow(dead_code)]
pub fn feature(graph: &Graph, object: ObjectId, name: &str) -> FeatureId {
    graph
        .feature_id(object, name)
        .unwrap_or_else(|e| panic!("feature {} on {}: {}", name, object, e))
}

#[allow(dead_code)]
pub fn obj(id: ObjectId) -> Value {
    Value::Object(id)
}

#[allow(dead_code)]
pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

/// Raw contents of a list feature as object ids
#[allow(dead_code)]
pub fn objects(graph: &Graph, object: ObjectId, name: &str) -> Vec<ObjectId> {
    graph
        .values(object, feature(graph, object, name))
        .unwrap()
        .iter()
        .filter_map(Value::as_object)
        .collect()
}

/// Raw contents of an Int list feature
#[allow(dead_code)]
pub fn int_values(graph: &Graph, object: ObjectId, name: &str) -> Vec<i64> {
    graph
        .values(object, feature(graph, object, name))
        .unwrap()
        .iter()
        .filter_map(Value::as_int)
        .collect()
}

/// A Numbers object whose `name` list holds `values`
#[allow(dead_code)]
pub fn numbers_with(graph: &mut Graph, classes: &Classes, name: &str, values: &[i64]) -> ObjectId {
    let numbers = graph.create(classes.numbers).unwrap();
    let f = feature(graph, numbers, name);
    graph.list(numbers, f).unwrap().add_all(ints(values)).unwrap();
    numbers
}

/// A library holding `count` books titled "b0", "b1", ...
#[allow(dead_code)]
pub fn library_with_books(graph: &mut Graph, classes: &Classes, count: usize) -> (ObjectId, Vec<ObjectId>) {
    let library = graph.create(classes.library).unwrap();
    let books_f = feature(graph, library, "books");
    let mut books = Vec::new();
    for i in 0..count {
        let book = graph.create(classes.book).unwrap();
        let title = feature(graph, book, "title");
        graph
            .set(book, title, Some(Value::from(format!("b{}", i))))
            .unwrap();
        graph.list(library, books_f).unwrap().add(obj(book)).unwrap();
        books.push(book);
    }
    (library, books)
}
