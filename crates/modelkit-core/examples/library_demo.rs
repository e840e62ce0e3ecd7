//! Library Graph Demo
//!
//! Builds a tiny metamodel, populates a graph and shows the kernel keeping
//! opposite references, containment and observers consistent.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use modelkit_core::{
    copy, logging_facility, DataType, EventLog, FeatureDef, Graph, MetamodelBuilder, ObserverHandle,
    OrderedList, Value,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging_facility::init(logging_facility::Profile::Development);
    println!("=== modelkit Library Demo ===\n");

    let mut b = MetamodelBuilder::new("library");
    let library = b.class("Library");
    let book = b.class("Book");
    b.feature(library, FeatureDef::containment("books", book).many())
        .feature(book, FeatureDef::attribute("title", DataType::Str))
        .feature(book, FeatureDef::reference("library", library))
        .opposites(library, "books", book, "library");
    let mut graph = Graph::new(Arc::new(b.build()?));

    let lib = graph.create(library)?;
    let log = EventLog::shared();
    let handle: ObserverHandle = log.clone();
    graph.add_observer(lib, handle)?;

    let books = graph.feature_id(lib, "books")?;
    for title in ["Dune", "Emma", "Ulysses"] {
        let b = graph.create(book)?;
        let title_f = graph.feature_id(b, "title")?;
        graph.set(b, title_f, Some(Value::from(title)))?;
        graph.list(lib, books)?.add(Value::Object(b))?;
        println!("✓ Added {} as {}", title, b);
    }

    let first = graph.list(lib, books)?.get(0)?;
    graph.list(lib, books)?.move_object(3, &first)?;
    println!("\nObserver saw {:?}", log.borrow().kinds());

    let moved = first.as_object().expect("books hold objects");
    let back = graph.feature_id(moved, "library")?;
    println!("{} knows its library: {:?}", moved, graph.get(moved, back)?);

    let copied = copy::copy(&mut graph, lib)?;
    println!("\nCopied {} into {} with {} descendants", lib, copied, graph.all_contents(copied)?.count());
    Ok(())
}
