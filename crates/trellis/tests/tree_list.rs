//! End-to-end scenarios that cross module boundaries: structure edits
//! driving the flat row list, selection policies, sorting, user data
//! lifecycles, and pointer-driven reordering.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis::{
    NodeId, NodeInfo, Pixmap, Point, Rect, RenderSurface, RowData, SelectionMode, Stroke, TreeList,
};

fn names(list: &TreeList) -> Vec<String> {
    list.visible_nodes()
        .map(|n| list.node_info(n).unwrap().text)
        .collect()
}

/// A renderer stand-in for drag tests; marker drawing goes nowhere.
#[derive(Default)]
struct NullSurface;

impl RenderSurface for NullSurface {
    fn draw_line(&mut self, _from: Point, _to: Point, _stroke: &Stroke) {}
    fn draw_rect(&mut self, _rect: Rect, _stroke: &Stroke) {}
    fn grab_pointer(&mut self) {}
    fn release_pointer(&mut self) {}
    fn show_drag_icon(&mut self, _icon: &Pixmap, _at: Point) {}
    fn move_drag_icon(&mut self, _at: Point) {}
    fn hide_drag_icon(&mut self) {}
}

/// src
///  +- parser
///  |   +- lexer.rs
///  |   +- grammar.rs
///  +- main.rs
/// docs
fn sample_tree(list: &mut TreeList) -> (NodeId, NodeId) {
    let src = list.insert(None, None, NodeInfo::branch("src")).unwrap();
    let parser = list
        .insert(Some(src), None, NodeInfo::branch("parser"))
        .unwrap();
    list.insert(Some(parser), None, NodeInfo::leaf("lexer.rs"))
        .unwrap();
    list.insert(Some(parser), None, NodeInfo::leaf("grammar.rs"))
        .unwrap();
    list.insert(Some(src), None, NodeInfo::leaf("main.rs"))
        .unwrap();
    list.insert(None, None, NodeInfo::branch("docs")).unwrap();
    (src, parser)
}

#[test]
fn collapse_detaches_run_and_expand_restores_it() {
    let mut list = TreeList::new(1, 0).unwrap();
    let (src, parser) = sample_tree(&mut list);
    let full = vec![
        "src",
        "parser",
        "lexer.rs",
        "grammar.rs",
        "main.rs",
        "docs",
    ];
    assert_eq!(names(&list), full);

    list.collapse(parser);
    assert_eq!(names(&list), vec!["src", "parser", "main.rs", "docs"]);

    list.collapse(src);
    assert_eq!(names(&list), vec!["src", "docs"]);

    // Expanding src brings parser back still collapsed.
    list.expand(src);
    assert_eq!(names(&list), vec!["src", "parser", "main.rs", "docs"]);

    list.expand(parser);
    assert_eq!(names(&list), full);
}

#[test]
fn visible_count_always_matches_the_flat_list() {
    let mut list = TreeList::new(1, 0).unwrap();
    let (src, parser) = sample_tree(&mut list);

    let check = |list: &TreeList| {
        assert_eq!(list.visible_count(), list.visible_nodes().count());
    };

    check(&list);
    list.collapse(parser);
    check(&list);
    list.remove(parser);
    check(&list);
    list.insert(Some(src), None, NodeInfo::leaf("lib.rs"))
        .unwrap();
    check(&list);
    list.collapse(src);
    check(&list);
    list.clear();
    check(&list);
    assert_eq!(list.visible_count(), 0);
    assert!(list.is_empty());
}

#[test]
fn moving_under_a_leaf_is_rejected() {
    let mut list = TreeList::new(1, 0).unwrap();
    let branch = list.insert(None, None, NodeInfo::branch("branch")).unwrap();
    let leaf = list.insert(None, None, NodeInfo::leaf("leaf")).unwrap();

    list.move_node(branch, Some(leaf), None);
    assert_eq!(list.parent(branch), None);
    assert_eq!(list.first_child(leaf), None);

    // And a leaf never takes an insert either.
    assert!(list.insert(Some(leaf), None, NodeInfo::leaf("x")).is_none());
}

#[test]
fn auto_sort_keeps_every_chain_ordered() {
    let mut list = TreeList::new(1, 0).unwrap();
    list.set_auto_sort(true);

    let src = list.insert(None, None, NodeInfo::branch("src")).unwrap();
    let docs = list.insert(None, None, NodeInfo::branch("docs")).unwrap();
    for name in ["main.rs", "ast.rs", "lexer.rs"] {
        list.insert(Some(src), None, NodeInfo::leaf(name)).unwrap();
    }
    assert_eq!(
        names(&list),
        vec!["docs", "src", "ast.rs", "lexer.rs", "main.rs"]
    );

    // A cross-parent move lands at the comparator position too.
    let ast = list.first_child(src).unwrap();
    list.move_node(ast, Some(docs), None);
    assert_eq!(list.parent(ast), Some(docs));
    assert_eq!(
        names(&list),
        vec!["docs", "ast.rs", "src", "lexer.rs", "main.rs"]
    );
}

#[test]
fn single_mode_selection_swaps_with_a_signal_pair() {
    let mut list = TreeList::new(1, 0).unwrap();
    let a = list.insert(None, None, NodeInfo::leaf("a")).unwrap();
    let b = list.insert(None, None, NodeInfo::leaf("b")).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let log_sel = log.clone();
    list.row_selected.connect(move |&n| {
        log_sel.borrow_mut().push(("+", n));
    });
    let log_unsel = log.clone();
    list.row_unselected.connect(move |&n| {
        log_unsel.borrow_mut().push(("-", n));
    });

    list.select(a);
    list.select(b);
    assert_eq!(list.selection(), &[b]);
    assert_eq!(*log.borrow(), vec![("+", a), ("-", a), ("+", b)]);
}

#[test]
fn selection_survives_collapse_and_mode_changes_prune_it() {
    let mut list = TreeList::new(1, 0).unwrap();
    list.set_selection_mode(SelectionMode::Multiple);
    let (src, parser) = sample_tree(&mut list);
    let lexer = list.first_child(parser).unwrap();

    list.select(lexer);
    list.select(src);
    list.collapse(src);
    // Hidden rows stay selected.
    assert!(list.is_selected(lexer));
    assert_eq!(list.selection().len(), 2);

    // Dropping to browse keeps only the most recent pick; single would
    // clear everything.
    list.set_selection_mode(SelectionMode::Browse);
    assert_eq!(list.selection(), &[src]);
    assert!(!list.is_selected(lexer));
}

#[test]
fn removing_a_subtree_runs_every_destructor_once() {
    let mut list = TreeList::new(1, 0).unwrap();
    let (src, parser) = sample_tree(&mut list);
    let drops = Rc::new(Cell::new(0u32));

    let mut tagged = vec![src, parser];
    let mut cur = list.first_child(parser);
    while let Some(c) = cur {
        tagged.push(c);
        cur = list.next_sibling(c);
    }
    for &node in &tagged {
        let drops = drops.clone();
        list.set_row_data(
            node,
            RowData::with_destroy((), move || {
                drops.set(drops.get() + 1);
            }),
        );
    }

    let before = list.len();
    list.remove(src);
    // Five rows are gone; the four that carried destructors fired once each.
    assert_eq!(drops.get(), tagged.len() as u32);
    assert_eq!(list.len(), before - 5);
    assert_eq!(names(&list), vec!["docs"]);
}

#[test]
fn sort_recursive_orders_a_deep_tree() {
    let mut list = TreeList::new(1, 0).unwrap();
    let z = list.insert(None, None, NodeInfo::branch("zeta")).unwrap();
    let inner = list.insert(Some(z), None, NodeInfo::branch("omega")).unwrap();
    list.insert(Some(inner), None, NodeInfo::leaf("9")).unwrap();
    list.insert(Some(inner), None, NodeInfo::leaf("1")).unwrap();
    list.insert(Some(z), None, NodeInfo::branch("alpha")).unwrap();
    list.insert(None, None, NodeInfo::branch("beta")).unwrap();

    let refreshes = Rc::new(Cell::new(0u32));
    let refreshes_clone = refreshes.clone();
    list.refresh.connect(move |_| {
        refreshes_clone.set(refreshes_clone.get() + 1);
    });

    list.sort_recursive(None);
    assert_eq!(
        names(&list),
        vec!["beta", "zeta", "alpha", "omega", "1", "9"]
    );
    // The whole recursive sort collapses into one redraw request.
    assert_eq!(refreshes.get(), 1);
}

#[test]
fn drag_gesture_reparents_a_row() {
    let mut list = TreeList::new(1, 0).unwrap();
    list.set_reorderable(true);
    list.set_use_drag_icons(false);
    list.set_viewport(300, 300);
    // Rows are 20px tall: "dir" spans y 0..20, "file" y 20..40.
    let dir = list.insert(None, None, NodeInfo::branch("dir")).unwrap();
    let file = list.insert(None, None, NodeInfo::leaf("file")).unwrap();

    let moved = Rc::new(Cell::new(0u32));
    let moved_clone = moved.clone();
    list.subtree_moved.connect(move |_| {
        moved_clone.set(moved_clone.get() + 1);
    });

    let mut surface = NullSurface;
    // Press on "file", hover the middle of "dir" (drop-as-child), release.
    list.button_press(50, 30, false, &mut surface);
    list.drag_motion(50, 10, &mut surface);
    list.button_release(50, 10, &mut surface);

    assert_eq!(list.parent(file), Some(dir));
    assert_eq!(names(&list), vec!["dir", "file"]);
    assert_eq!(list.level(file), Some(2));
    assert_eq!(moved.get(), 1);
    assert!(!list.is_dragging());
}
