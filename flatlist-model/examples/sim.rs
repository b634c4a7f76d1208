use std::cell::RefCell;
use std::rc::Rc;

use flatlist::{FlatChangeSet, FlattenedAdapter, ItemPath, LayoutInfo};
use flatlist_model::{FlatMirror, Section, SectionedList};

fn main() {
    // A contact list grouped by initial, rendered with section headers and a global footer.
    let list = Rc::new(SectionedList::from_sections(vec![
        Section::new('A', vec!["Ada", "Alan"]),
        Section::new('B', vec!["Barbara"]),
    ]));
    let layout = LayoutInfo::new()
        .with_section_header(true)
        .with_global_footer(true);
    let adapter = Rc::new(FlattenedAdapter::new(Rc::clone(&list), layout));

    // The "renderer": logs every flat change set and keeps a mirror of its rows.
    let mirror = Rc::new(RefCell::new(
        FlatMirror::from_adapter(&*adapter).expect("initial snapshot"),
    ));
    let _sub = {
        let adapter_weak = Rc::downgrade(&adapter);
        let mirror = Rc::clone(&mirror);
        adapter.subscribe(move |changes: &FlatChangeSet| {
            println!("flat changes: {:?}", changes.as_slice());
            if let Some(adapter) = adapter_weak.upgrade() {
                mirror
                    .borrow_mut()
                    .apply(&*adapter, changes)
                    .expect("mirror stays in sync");
            }
        })
    };

    println!("initial rows: {:?}", mirror.borrow().slots());

    list.insert_items(0, 1, vec!["Alonzo"]).expect("insert");
    list.push_section('C', vec!["Claude", "Charles"]);
    list.move_item(ItemPath::new(2, 1), ItemPath::new(1, 0)).expect("move");
    list.move_section(2, 0).expect("move section");
    list.remove_items(1, 0..2).expect("remove");

    println!("rows: {:?}", mirror.borrow().slots());

    for flat_index in 0..adapter.item_count() {
        println!(
            "{flat_index:>2}: {:?} -> {:?}",
            adapter.position(flat_index),
            adapter.try_get_section_and_item_index(flat_index)
        );
    }

    adapter.change_layout_info(LayoutInfo::all());
    println!(
        "after layout change: {} rows, resets={}",
        adapter.item_count(),
        mirror.borrow().resets()
    );
}
