use crate::*;

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use flatlist::{
    FlatChange, FlatChangeSet, FlatItem, FlattenedAdapter, ItemPath, LayoutInfo, SectionSource,
    SourceChange, SourceChangeSet,
};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

type List = SectionedList<u32, u32>;

/// Hands out unique values so that a stale slot is always detectable.
struct Ids(u32);

impl Ids {
    fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }

    fn items(&mut self, count: usize) -> Vec<u32> {
        (0..count).map(|_| self.next()).collect()
    }

    fn section(&mut self, items: usize) -> Section<u32, u32> {
        let value = self.next();
        Section::new(value, self.items(items))
    }
}

fn expected_slots(sections: &[Section<u32, u32>], layout: LayoutInfo) -> Vec<Slot<u32, u32>> {
    let mut out = Vec::new();
    if layout.has_global_header {
        out.push(Slot::GlobalHeader);
    }
    for section in sections {
        if layout.has_section_header {
            out.push(Slot::SectionHeader(section.value));
        }
        out.extend(section.items.iter().copied().map(Slot::Item));
        if layout.has_section_footer {
            out.push(Slot::SectionFooter(section.value));
        }
    }
    if layout.has_global_footer {
        out.push(Slot::GlobalFooter);
    }
    out
}

fn random_layout(rng: &mut Lcg) -> LayoutInfo {
    LayoutInfo::new()
        .with_global_header(rng.gen_bool())
        .with_global_footer(rng.gen_bool())
        .with_section_header(rng.gen_bool())
        .with_section_footer(rng.gen_bool())
}

/// Records every flat change set an adapter emits.
fn record(
    adapter: &FlattenedAdapter<List>,
) -> (Rc<RefCell<Vec<FlatChangeSet>>>, flatlist::Subscription) {
    let log: Rc<RefCell<Vec<FlatChangeSet>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = adapter.subscribe(move |changes| sink.borrow_mut().push(changes.clone()));
    (log, sub)
}

fn two_sections() -> Rc<List> {
    Rc::new(List::from_sections(vec![
        Section::new(100, vec![1, 2, 3]),
        Section::new(200, vec![4, 5]),
    ]))
}

#[test]
fn list_publishes_one_change_per_mutation() {
    let list = two_sections();
    let log: Rc<RefCell<Vec<SourceChangeSet>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _sub = list.subscribe(move |changes: &SourceChangeSet| {
        sink.borrow_mut().push(changes.clone())
    });

    list.insert_items(0, 1, vec![10, 11]).unwrap();
    list.remove_items(1, 0..1).unwrap();
    list.move_item(ItemPath::new(0, 0), ItemPath::new(1, 1)).unwrap();
    list.move_section(0, 1).unwrap();
    list.refresh_section(0).unwrap();

    let got: Vec<SourceChange> = log.borrow().iter().flat_map(|set| set.iter().copied()).collect();
    assert_eq!(
        got,
        vec![
            SourceChange::insert_items(0, 1, 2),
            SourceChange::remove_items(1, 0, 0),
            SourceChange::move_item(ItemPath::new(0, 0), ItemPath::new(1, 1)),
            SourceChange::move_section(0, 1),
            SourceChange::refresh_section(0),
        ]
    );
    assert_eq!(log.borrow().len(), 5);

    let sections = list.to_sections();
    assert_eq!(sections[0], Section::new(200, vec![5, 1]));
    assert_eq!(sections[1], Section::new(100, vec![10, 11, 2, 3]));
}

#[test]
fn failed_or_empty_mutations_publish_nothing() {
    let list = two_sections();
    let published = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&published);
    let _sub = list.subscribe(move |_: &SourceChangeSet| *counter.borrow_mut() += 1);

    assert_eq!(
        list.remove_sections(1..3),
        Err(ModelError::InvalidRange { start: 1, end: 3 })
    );
    assert_eq!(
        list.insert_items(2, 0, vec![1]),
        Err(ModelError::SectionOutOfRange { section: 2, count: 2 })
    );
    assert_eq!(
        list.insert_items(1, 3, vec![1]),
        Err(ModelError::ItemOutOfRange {
            section: 1,
            item: 3,
            count: 2
        })
    );
    assert_eq!(
        list.refresh_item(0, 3),
        Err(ModelError::ItemOutOfRange {
            section: 0,
            item: 3,
            count: 3
        })
    );
    assert_eq!(
        list.move_section(0, 2),
        Err(ModelError::SectionOutOfRange { section: 2, count: 2 })
    );
    // Within one section the destination is bounded by the length after removal.
    assert_eq!(
        list.move_item(ItemPath::new(0, 0), ItemPath::new(0, 3)),
        Err(ModelError::ItemOutOfRange {
            section: 0,
            item: 3,
            count: 2
        })
    );

    list.insert_items(0, 0, Vec::new()).unwrap();
    list.insert_sections(1, Vec::new()).unwrap();
    assert!(list.remove_items(0, 1..1).unwrap().is_empty());
    list.move_section(1, 1).unwrap();
    list.move_item(ItemPath::new(0, 1), ItemPath::new(0, 1)).unwrap();

    assert_eq!(*published.borrow(), 0);
    assert_eq!(list.to_sections(), two_sections().to_sections());
}

#[test]
fn section_source_reads_live_values() {
    let list = two_sections();
    assert_eq!(list.section_count(), 2);
    assert_eq!(list.item_count(0), 3);
    assert_eq!(list.item_count(5), 0);
    assert_eq!(list.section(1), Some(200));
    assert_eq!(list.item(1, 1), Some(5));
    assert_eq!(list.item(1, 2), None);
    assert_eq!(list.total_items(), 5);

    let old = list.replace_section(1, 300, vec![7]).unwrap();
    assert_eq!(old, Section::new(200, vec![4, 5]));
    assert_eq!(list.set_section_value(0, 150).unwrap(), 100);
    assert_eq!(
        list.with_sections(|s| s.iter().map(|s| s.value).collect::<Vec<_>>()),
        vec![150, 300]
    );
    assert_eq!(list.replace_items(0, 1, vec![20, 30]).unwrap(), vec![2, 3]);
    assert_eq!(list.push_item(1, 8).unwrap(), 1);
    assert_eq!(list.push_section(400, vec![9]), 2);
    assert_eq!(list.remove_sections(0..1).unwrap(), vec![Section::new(150, vec![1, 20, 30])]);
    assert_eq!(
        list.to_sections(),
        vec![Section::new(300, vec![7, 8]), Section::new(400, vec![9])]
    );
}

#[test]
fn adapter_follows_list_mutations() {
    let list = two_sections();
    let adapter = FlattenedAdapter::new(Rc::clone(&list), LayoutInfo::all());
    let (log, _sub) = record(&adapter);

    // [GH, H0, 1, 2, 3, F0, H1, 4, 5, F1, GF]
    assert_eq!(adapter.item_count(), 11);

    list.insert_items(1, 2, vec![6]).unwrap();
    list.move_section(1, 0).unwrap();
    list.remove_sections(1..2).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            FlatChangeSet::single(FlatChange::InsertItem(9)),
            [
                FlatChange::RemoveItemRange { start: 6, end: 10 },
                FlatChange::InsertItemRange { start: 1, end: 5 },
            ]
            .into_iter()
            .collect(),
            FlatChangeSet::single(FlatChange::RemoveItemRange { start: 6, end: 10 }),
        ]
    );
    assert_eq!(adapter.item_count(), 7);
    assert_eq!(
        adapter.get_item(3),
        Ok(FlatItem::Item {
            section: 0,
            item: 1,
            value: 5
        })
    );
}

#[test]
fn dropping_the_adapter_detaches_it() {
    let list = two_sections();
    let adapter = FlattenedAdapter::new(Rc::clone(&list), LayoutInfo::new());
    assert_eq!(list.listener_count(), 1);
    assert!(adapter.is_attached());
    drop(adapter);
    assert_eq!(list.listener_count(), 0);
    list.push_section(1, vec![2]);
}

#[test]
fn mirror_tracks_changes_inside_the_listener() {
    let list = two_sections();
    let adapter = Rc::new(FlattenedAdapter::new(Rc::clone(&list), LayoutInfo::all()));
    let mirror = Rc::new(RefCell::new(FlatMirror::from_adapter(&*adapter).unwrap()));

    let weak = Rc::downgrade(&adapter);
    let target = Rc::clone(&mirror);
    let _sub = adapter.subscribe(move |changes| {
        if let Some(adapter) = weak.upgrade() {
            target.borrow_mut().apply(&*adapter, changes).unwrap();
        }
    });

    list.insert_items(0, 0, vec![50]).unwrap();
    list.replace_section(1, 201, vec![6, 7, 8]).unwrap();
    list.move_item(ItemPath::new(1, 2), ItemPath::new(0, 0)).unwrap();
    list.set_section_value(0, 101).unwrap();

    assert_eq!(
        mirror.borrow().slots(),
        expected_slots(&list.to_sections(), LayoutInfo::all()).as_slice()
    );
    assert_eq!(mirror.borrow().resets(), 1);

    list.clear();
    assert_eq!(mirror.borrow().resets(), 2);
    assert_eq!(mirror.borrow().slots(), &[Slot::GlobalHeader, Slot::GlobalFooter]);
}

#[test]
fn mirror_rejects_changes_that_do_not_fit() {
    let list = two_sections();
    let adapter = FlattenedAdapter::new(Rc::clone(&list), LayoutInfo::new());
    let mut mirror = FlatMirror::from_adapter(&adapter).unwrap();
    let before = mirror.clone();

    let bogus = FlatChangeSet::single(FlatChange::RemoveItemRange { start: 3, end: 7 });
    assert_eq!(
        mirror.apply(&adapter, &bogus),
        Err(MirrorError::ChangeOutOfRange {
            change: FlatChange::RemoveItemRange { start: 3, end: 7 },
            len: 5
        })
    );
    assert_eq!(mirror, before);

    // The adapter moved on but the mirror never saw the change.
    list.push_item(0, 9).unwrap();
    assert_eq!(
        mirror.apply(&adapter, &FlatChangeSet::new()),
        Err(MirrorError::LengthMismatch {
            mirror: 5,
            adapter: 6
        })
    );
    assert_eq!(mirror, before);

    mirror.resync(&adapter).unwrap();
    assert_eq!(mirror.len(), 6);
}

#[test]
fn slot_from_flat_item_drops_indices() {
    let header: FlatItem<u32, u32> = FlatItem::SectionHeader {
        section: 3,
        value: 7,
    };
    assert_eq!(Slot::from(header), Slot::SectionHeader(7));
    let item: FlatItem<u32, u32> = FlatItem::Item {
        section: 0,
        item: 2,
        value: 9,
    };
    assert_eq!(Slot::from(item), Slot::Item(9));
    assert_eq!(Slot::<u32, u32>::from(FlatItem::GlobalFooter), Slot::GlobalFooter);
}

#[test]
fn batched_edit_is_translated_in_order() {
    let list = two_sections();
    let adapter = FlattenedAdapter::new(
        Rc::clone(&list),
        LayoutInfo::new().with_section_header(true),
    );
    let mut mirror = FlatMirror::from_adapter(&adapter).unwrap();
    let (log, _sub) = record(&adapter);

    list.edit(|sections| {
        sections[1].items.insert(0, 40);
        sections[0].items.pop();
    });
    list.publish_all(
        [
            SourceChange::insert_items(1, 0, 0),
            SourceChange::remove_items(0, 2, 2),
        ]
        .into_iter()
        .collect(),
    );

    let sets = log.borrow().clone();
    assert_eq!(sets.len(), 1);
    assert_eq!(
        sets[0].as_slice(),
        &[FlatChange::InsertItem(5), FlatChange::RemoveItem(3)]
    );
    mirror.apply(&adapter, &sets[0]).unwrap();
    assert_eq!(
        mirror.slots(),
        expected_slots(&list.to_sections(), adapter.layout_info()).as_slice()
    );

    // Empty sets are dropped.
    list.publish_all(SourceChangeSet::new());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn section_and_item_batch_stays_in_sync() {
    let list = Rc::new(List::from_sections(vec![Section::new(1, vec![10])]));
    let adapter = FlattenedAdapter::new(Rc::clone(&list), LayoutInfo::new());
    let mut mirror = FlatMirror::from_adapter(&adapter).unwrap();
    let (log, _sub) = record(&adapter);

    list.edit(|sections| {
        sections.insert(0, Section::new(2, Vec::new()));
        sections[0].items.push(20);
    });
    list.publish_all(
        [
            SourceChange::insert_sections(0, 0),
            SourceChange::insert_items(0, 0, 0),
        ]
        .into_iter()
        .collect(),
    );

    let sets = log.borrow().clone();
    assert_eq!(sets, vec![FlatChangeSet::single(FlatChange::Reset)]);
    assert_eq!(adapter.item_count(), list.total_items());
    assert!(adapter.snapshot().is_ok());
    mirror.apply(&adapter, &sets[0]).unwrap();
    assert_eq!(
        mirror.slots(),
        expected_slots(&list.to_sections(), adapter.layout_info()).as_slice()
    );
}

fn random_op(rng: &mut Lcg, ids: &mut Ids, list: &List, adapter: &FlattenedAdapter<List>) {
    let sections = list.len();
    match rng.gen_range_usize(0, 15) {
        0 => {
            let items = rng.gen_range_usize(0, 4);
            list.push_section(ids.next(), ids.items(items));
        }
        1 => {
            let at = rng.gen_range_usize(0, sections + 1);
            let count = rng.gen_range_usize(1, 3);
            let new = (0..count)
                .map(|_| {
                    let items = rng.gen_range_usize(0, 4);
                    ids.section(items)
                })
                .collect();
            list.insert_sections(at, new).unwrap();
        }
        2 if sections > 0 => {
            let start = rng.gen_range_usize(0, sections);
            let end = rng.gen_range_usize(start + 1, (start + 2).min(sections) + 1);
            list.remove_sections(start..end).unwrap();
        }
        3 if sections > 0 => {
            // Item counts change on purpose.
            let start = rng.gen_range_usize(0, sections);
            let count = rng.gen_range_usize(1, sections - start + 1).min(2);
            let new = (0..count)
                .map(|_| {
                    let items = rng.gen_range_usize(0, 5);
                    ids.section(items)
                })
                .collect();
            list.replace_sections(start, new).unwrap();
        }
        4 if sections > 0 => {
            let from = rng.gen_range_usize(0, sections);
            let to = rng.gen_range_usize(0, sections);
            list.move_section(from, to).unwrap();
        }
        5 if sections > 0 => {
            let section = rng.gen_range_usize(0, sections);
            list.set_section_value(section, ids.next()).unwrap();
        }
        6 if sections > 0 => {
            let section = rng.gen_range_usize(0, sections);
            let len = list.item_count(section);
            let at = rng.gen_range_usize(0, len + 1);
            let count = rng.gen_range_usize(1, 4);
            list.insert_items(section, at, ids.items(count)).unwrap();
        }
        7 if sections > 0 => {
            let section = rng.gen_range_usize(0, sections);
            let len = list.item_count(section);
            if len > 0 {
                let start = rng.gen_range_usize(0, len);
                let end = rng.gen_range_usize(start + 1, len + 1);
                list.remove_items(section, start..end).unwrap();
            }
        }
        8 if sections > 0 => {
            let section = rng.gen_range_usize(0, sections);
            let len = list.item_count(section);
            if len > 0 {
                let start = rng.gen_range_usize(0, len);
                let count = rng.gen_range_usize(1, len - start + 1);
                list.replace_items(section, start, ids.items(count)).unwrap();
            }
        }
        9 if sections > 0 => {
            let from_section = rng.gen_range_usize(0, sections);
            let from_len = list.item_count(from_section);
            if from_len > 0 {
                let from = ItemPath::new(from_section, rng.gen_range_usize(0, from_len));
                let to_section = rng.gen_range_usize(0, sections);
                let to_len = if to_section == from_section {
                    from_len - 1
                } else {
                    list.item_count(to_section)
                };
                let to = ItemPath::new(to_section, rng.gen_range_usize(0, to_len + 1));
                list.move_item(from, to).unwrap();
            }
        }
        10 if sections > 0 => {
            let section = rng.gen_range_usize(0, sections);
            let len = list.item_count(section);
            if len > 0 {
                let item = rng.gen_range_usize(0, len);
                let value = ids.next();
                list.edit(|s| s[section].items[item] = value);
                let change = SourceChange::refresh_item(section, item);
                list.publish_all(SourceChangeSet::single(change));
            }
        }
        11 if sections > 0 => {
            // Two edits published as one set; the second is expressed against the first's result.
            let first = rng.gen_range_usize(0, sections);
            let second = rng.gen_range_usize(0, sections);
            let value = ids.next();
            let removed = list.edit(|s| {
                s[first].items.insert(0, value);
                let len = s[second].items.len();
                (len > 0).then(|| {
                    s[second].items.pop();
                    len - 1
                })
            });
            let mut changes = SourceChangeSet::single(SourceChange::insert_items(first, 0, 0));
            if let Some(last) = removed {
                changes.push(SourceChange::remove_items(second, last, last));
            }
            list.publish_all(changes);
        }
        12 => {
            if rng.gen_range_usize(0, 4) == 0 {
                let count = rng.gen_range_usize(0, 4);
                let new = (0..count)
                    .map(|_| {
                        let items = rng.gen_range_usize(0, 4);
                        ids.section(items)
                    })
                    .collect();
                list.reset(new);
            }
        }
        13 => adapter.change_layout_info(random_layout(rng)),
        14 => {
            // A new section and an item pushed into it, published as one set.
            let at = rng.gen_range_usize(0, sections + 1);
            let (value, item) = (ids.next(), ids.next());
            list.edit(|s| {
                s.insert(at, Section::new(value, Vec::new()));
                s[at].items.push(item);
            });
            let changes = [
                SourceChange::insert_sections(at, at),
                SourceChange::insert_items(at, 0, 0),
            ];
            list.publish_all(changes.into_iter().collect());
        }
        _ => {
            let items = rng.gen_range_usize(0, 3);
            list.push_section(ids.next(), ids.items(items));
        }
    }
}

#[test]
fn randomized_mirror_never_drifts() {
    for seed in 1..=24u64 {
        let mut rng = Lcg::new(seed);
        let mut ids = Ids(0);
        let list = Rc::new(List::new());
        for _ in 0..rng.gen_range_usize(0, 4) {
            let items = rng.gen_range_usize(0, 4);
            list.push_section(ids.next(), ids.items(items));
        }
        let adapter = FlattenedAdapter::new(Rc::clone(&list), random_layout(&mut rng));
        let mut mirror = FlatMirror::from_adapter(&adapter).unwrap();
        let (log, _sub) = record(&adapter);

        for step in 0..300 {
            random_op(&mut rng, &mut ids, &list, &adapter);

            let sets: Vec<FlatChangeSet> = log.borrow_mut().drain(..).collect();
            assert!(sets.len() <= 1, "seed {seed} step {step}: one set per mutation");
            for set in &sets {
                mirror.apply(&adapter, set).unwrap();
            }

            let layout = adapter.layout_info();
            let expected = expected_slots(&list.to_sections(), layout);
            assert_eq!(mirror.slots(), expected.as_slice(), "seed {seed} step {step}");
            assert_eq!(adapter.item_count(), expected.len(), "seed {seed} step {step}");
            assert_eq!(adapter.section_count(), list.len(), "seed {seed} step {step}");

            let mut previous_start = None;
            for section in 0..list.len() {
                let start = adapter.flat_index_for_section_start(section).unwrap();
                if let Some(previous) = previous_start {
                    assert!(
                        start > previous || layout.section_header_footer_size() == 0,
                        "seed {seed} step {step}: section starts must increase"
                    );
                    assert!(start >= previous);
                }
                previous_start = Some(start);

                for item in 0..list.item_count(section) {
                    let flat_index = adapter.flat_index_for_item(section, item).unwrap();
                    assert_eq!(
                        adapter.try_get_section_and_item_index(flat_index),
                        Some((section, item)),
                        "seed {seed} step {step}: round trip"
                    );
                }
            }
            assert_eq!(adapter.position(adapter.item_count()), None);
            let resolvable = (0..expected.len())
                .filter(|&i| adapter.get_item(i).is_ok())
                .count();
            assert_eq!(resolvable, adapter.item_count(), "seed {seed} step {step}");
        }
    }
}
