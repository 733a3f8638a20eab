//! Integration tests for the markup codec

use folio_markup::{parse, parse_with_ids, serialize, IdGenerator, Node, NodeId, TagCategory};

fn paragraphs(count: usize) -> String {
    (1..=count).map(|i| format!("<p>Line {i}</p>")).collect()
}

#[test]
fn test_document_of_many_paragraphs() {
    let source = paragraphs(60);
    let nodes = parse(&source);

    assert_eq!(nodes.len(), 60);
    assert!(nodes.iter().all(|n| TagCategory::of(n.tag().unwrap()) == TagCategory::Block));
    assert_eq!(serialize(&nodes), source);
}

#[test]
fn test_concatenated_slices_equal_whole() {
    let source = "<h2>Chapter</h2><p>First <i>para</i>.</p><img src=\"a.png\"><p>Last</p>";
    let nodes = parse(source);

    // Any split point of the top-level sequence serializes back to the whole
    for split in 0..=nodes.len() {
        let (head, tail) = nodes.split_at(split);
        assert_eq!(format!("{}{}", serialize(head), serialize(tail)), source);
    }
}

#[test]
fn test_shared_generator_keeps_ids_unique_across_parses() {
    let mut ids = IdGenerator::new();
    let first = parse_with_ids("<p>a</p>", &mut ids);
    let second = parse_with_ids("<p>b</p>", &mut ids);

    assert_ne!(first[0].id, second[0].id);
    assert!(second[0].id > first[0].children()[0].id);
}

#[test]
fn test_nodes_serialize_with_serde() {
    let node = Node::element(NodeId(7), "p", vec![Node::text(NodeId(8), "hi")]);
    let json = serde_json::to_string(&node).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(node, back);
}

#[test]
fn test_unicode_text_lengths_are_chars() {
    let nodes = parse("<p>héllo wörld ✓</p>");
    assert_eq!(nodes[0].text_len(), 13);
}

#[test]
fn test_partial_tags_keep_their_text() {
    let cases = [
        ("<p>a<b c</p>", "<p>a&lt;b c</p>"),
        ("<p>x <a href=\"y</p>", "<p>x &lt;a href=\"y</p>"),
        ("<p>1<2 and 3<x=</p>", "<p>1&lt;2 and 3&lt;x=</p>"),
    ];
    for (source, expected) in cases {
        assert_eq!(serialize(&parse(source)), expected, "source: {source}");
    }
}
