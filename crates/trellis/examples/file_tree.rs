//! File-browser style demo of the tree/list core.
//!
//! Builds a small project tree, prints it from the flat visible row list,
//! then walks through collapsing, sorting, selection and a simulated drag
//! gesture, reprinting after each step.
//!
//! Run with: cargo run -p trellis --example file_tree

use trellis::{
    ExpanderGlyph, NodeInfo, Pixmap, Point, Rect, RenderSurface, SelectionMode, Stroke, TreeList,
};

/// Prints drag feedback to the console instead of drawing it.
#[derive(Default)]
struct ConsoleSurface;

impl RenderSurface for ConsoleSurface {
    fn draw_line(&mut self, from: Point, to: Point, _stroke: &Stroke) {
        println!("  [marker line ({}, {}) -> ({}, {})]", from.x, from.y, to.x, to.y);
    }
    fn draw_rect(&mut self, rect: Rect, _stroke: &Stroke) {
        println!(
            "  [marker rect {}x{} at ({}, {})]",
            rect.width, rect.height, rect.x, rect.y
        );
    }
    fn grab_pointer(&mut self) {
        println!("  [pointer grabbed]");
    }
    fn release_pointer(&mut self) {
        println!("  [pointer released]");
    }
    fn show_drag_icon(&mut self, _icon: &Pixmap, at: Point) {
        println!("  [drag icon shown at ({}, {})]", at.x, at.y);
    }
    fn move_drag_icon(&mut self, _at: Point) {}
    fn hide_drag_icon(&mut self) {
        println!("  [drag icon hidden]");
    }
}

fn print_tree(list: &TreeList, heading: &str) {
    println!("{heading}");
    for node in list.visible_nodes() {
        let row = list.row_appearance(node).expect("visible row");
        let glyph = match row.expander {
            ExpanderGlyph::Open => "v ",
            ExpanderGlyph::Closed => "> ",
            ExpanderGlyph::None => "  ",
        };
        let marker = if row.selected { "*" } else { " " };
        let pad = "  ".repeat(row.level - 1);
        let name = row.cells[0].text().unwrap_or("");
        let size = list.cell_text(node, 1).unwrap_or("");
        println!("{marker} {pad}{glyph}{name:<20} {size}");
    }
    println!();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=debug".into()),
        )
        .init();

    let mut list = TreeList::new(2, 0).expect("two columns, tree in column 0");
    list.set_viewport(400, 300);
    list.set_reorderable(true);
    list.set_use_drag_icons(false);

    list.subtree_moved.connect(|_| println!("  (subtree moved)"));
    list.row_selected.connect(|_| println!("  (row selected)"));

    let src = list.insert(None, None, NodeInfo::branch("src")).unwrap();
    let parser = list
        .insert(Some(src), None, NodeInfo::branch("parser"))
        .unwrap();
    for (name, size) in [("grammar.rs", "12 KiB"), ("lexer.rs", "8 KiB")] {
        let file = list.insert(Some(parser), None, NodeInfo::leaf(name)).unwrap();
        list.set_cell_text(file, 1, size);
    }
    let main_rs = list.insert(Some(src), None, NodeInfo::leaf("main.rs")).unwrap();
    list.set_cell_text(main_rs, 1, "2 KiB");
    list.insert(None, None, NodeInfo::branch("docs")).unwrap();
    let readme = list.insert(None, None, NodeInfo::leaf("README.md")).unwrap();
    list.set_cell_text(readme, 1, "1 KiB");

    print_tree(&list, "initial tree:");

    list.collapse(parser);
    print_tree(&list, "after collapsing parser/:");
    list.expand(parser);

    list.sort_recursive(None);
    print_tree(&list, "after recursive sort:");

    list.set_selection_mode(SelectionMode::Browse);
    list.select(main_rs);
    print_tree(&list, "after selecting main.rs:");

    // After the sort README.md sits in row 0 (y 0..20) and docs/ in row 1
    // (y 20..40). Drag the file into the middle of the directory row.
    println!("dragging README.md into docs/:");
    let mut surface = ConsoleSurface;
    list.button_press(50, 10, false, &mut surface);
    list.drag_motion(50, 30, &mut surface);
    list.button_release(50, 30, &mut surface);
    print_tree(&list, "after the drop:");
}
