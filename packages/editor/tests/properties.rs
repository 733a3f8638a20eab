//! Property tests for pagination, caret stability, and history

use folio_editor::{
    Cursor, EditOrigin, EditableSurface, Editor, EditorConfig, EventBus, InputEvent,
    LayoutMetrics, MemorySurface, PageGeometry, PageId, PageManager, RichTextSurface,
};
use proptest::prelude::*;
use std::time::{Duration, Instant};

const LINES_PER_PAGE: usize = 10;

fn manager() -> PageManager<MemorySurface> {
    let geometry = PageGeometry::new(600.0, LINES_PER_PAGE as f32 * 24.0);
    let surface = MemorySurface::new(geometry, LayoutMetrics::default());
    let mut manager = PageManager::new(surface, geometry, EventBus::new());
    manager.add_page();
    manager
}

fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z ]{0,300}".prop_map(|text| format!("<p>{text}</p>")),
        1 => "[a-z ]{1,60}".prop_map(|text| format!("<h2>{text}</h2>")),
        1 => (10u32..400).prop_map(|h| format!(r#"<img src="figure.png" height="{h}">"#)),
        1 => Just("<hr>".to_string()),
        1 => prop::collection::vec("[a-z]{1,20}", 1..4).prop_map(|items| {
            let items: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
            format!("<ul>{items}</ul>")
        }),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(block(), 0..40).prop_map(|blocks| blocks.concat())
}

proptest! {
    #[test]
    fn content_is_preserved(source in document()) {
        let mut manager = manager();
        manager.load_content(&source).unwrap();

        prop_assert_eq!(manager.get_all_content().unwrap(), source);
        for summary in manager.page_summaries().unwrap() {
            prop_assert!(!summary.overflowing || summary.node_count == 1);
        }
    }

    #[test]
    fn reflow_is_idempotent(source in document()) {
        let mut manager = manager();
        manager.load_content(&source).unwrap();
        let pages = manager.page_count();

        let report = manager.propagate_content(0).unwrap();
        prop_assert_eq!(report.moved, 0);
        prop_assert_eq!(report.pages_created, 0);
        prop_assert_eq!(manager.page_count(), pages);
    }

    #[test]
    fn page_count_follows_fit(paragraphs in 0usize..80) {
        let mut manager = manager();
        let source: String = (0..paragraphs).map(|i| format!("<p>paragraph {i}</p>")).collect();
        manager.load_content(&source).unwrap();

        let expected = paragraphs.div_ceil(LINES_PER_PAGE).max(1);
        prop_assert_eq!(manager.page_count(), expected);
    }

    #[test]
    fn caret_keeps_document_offset_across_migration(
        filled in 8usize..=LINES_PER_PAGE,
        from_end in 0usize..3,
        offset_seed in 0usize..1000,
        typed in "[a-z ]{1,160}",
    ) {
        let mut manager = manager();
        let source: String = (0..filled).map(|i| format!("<p>line number {i}</p>")).collect();
        manager.load_content(&source).unwrap();

        let nodes = manager.surface().page_nodes(PageId(0)).unwrap();
        let block = &nodes[nodes.len() - 1 - from_end.min(nodes.len() - 1)];
        let text = &block.children()[0];
        let cursor = Cursor::new(text.id, offset_seed % (text.text_len() + 1));
        manager.surface_mut().set_cursor(cursor).unwrap();

        let before = manager.cursor_document_offset().unwrap();
        manager.surface_mut().insert_text(&typed).unwrap();
        let expected = before + typed.chars().count();
        prop_assert_eq!(manager.cursor_document_offset(), Some(expected));

        let content = manager.get_all_content().unwrap();
        manager.check_overflow(EditOrigin::Page(PageId(0)));

        prop_assert_eq!(manager.get_all_content().unwrap(), content);
        prop_assert_eq!(manager.cursor_document_offset(), Some(expected));
    }

    #[test]
    fn undo_then_redo_restores_final_state(bursts in prop::collection::vec("[a-z ]{1,8}", 1..10)) {
        let mut editor = Editor::in_memory(EditorConfig::default());
        editor.init().unwrap();
        let mut now = Instant::now();

        for burst in &bursts {
            editor
                .handle_input(now, InputEvent::InsertText { text: burst.clone() })
                .unwrap();
            now += Duration::from_secs(2);
            prop_assert!(editor.tick(now).unwrap().recorded);
        }
        let final_state = editor.get_all_content().unwrap();

        for _ in 0..bursts.len() {
            prop_assert!(editor.undo().unwrap());
        }
        prop_assert_eq!(editor.get_all_content().unwrap(), "");

        for _ in 0..bursts.len() {
            prop_assert!(editor.redo().unwrap());
        }
        prop_assert_eq!(editor.get_all_content().unwrap(), final_state);
    }
}
