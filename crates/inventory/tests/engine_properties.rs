//! Property tests over generated operation sequences.

use std::collections::HashMap;

use proptest::prelude::*;
use stowage_inventory::{
    Container, ContainerId, Engine, GridState, ItemCatalog, ItemId, ItemMetadata, ItemSpec,
    ModeConfig,
};

fn cid(s: &str) -> ContainerId {
    ContainerId::new(s).unwrap()
}

fn iid(s: &str) -> ItemId {
    ItemId::new(s).unwrap()
}

const ITEMS: [&str; 4] = ["ore", "gem", "beam", "slab"];

fn catalog() -> ItemCatalog {
    ItemCatalog::new()
        .with_item(iid("ore"), ItemSpec::new().weight(3.0).stack_limit(20))
        .with_item(iid("gem"), ItemSpec::new().weight(0.25).stack_limit(5))
        .with_item(iid("beam"), ItemSpec::new().size(3, 1).weight(4.0).stack_limit(2))
        .with_item(iid("slab"), ItemSpec::new().size(2, 2).weight(6.0).stack_limit(3))
}

fn mode_strategy() -> impl Strategy<Value = ModeConfig> {
    prop_oneof![
        Just(ModeConfig::unlimited()),
        (1u32..6).prop_map(ModeConfig::count),
        (1u32..80).prop_map(|w| ModeConfig::weight(f64::from(w))),
        (1u32..6, 1u32..6, any::<bool>()).prop_map(|(w, h, r)| ModeConfig::grid(w, h).rotation(r)),
        (1u32..4, 1u32..6, 1u32..60).prop_map(|(n, side, weight)| ModeConfig::combined(vec![
            ModeConfig::count(n),
            ModeConfig::grid(side, side),
            ModeConfig::weight(f64::from(weight)),
        ])),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Add { container: usize, item: usize, quantity: u32 },
    Remove { container: usize, item: usize, quantity: u32 },
    Transfer { from: usize, to: usize, item: usize, quantity: u32 },
    Consolidate { container: usize },
    Arrange { container: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..3, 0usize..4, 0u32..12).prop_map(|(container, item, quantity)| Op::Add { container, item, quantity }),
        2 => (0usize..3, 0usize..4, 1u32..8).prop_map(|(container, item, quantity)| Op::Remove { container, item, quantity }),
        2 => (0usize..3, 0usize..3, 0usize..4, 1u32..10)
            .prop_map(|(from, to, item, quantity)| Op::Transfer { from, to, item, quantity }),
        1 => (0usize..3).prop_map(|container| Op::Consolidate { container }),
        1 => (0usize..3).prop_map(|container| Op::Arrange { container }),
    ]
}

fn names() -> [ContainerId; 3] {
    [cid("alpha"), cid("beta"), cid("gamma")]
}

fn build(modes: &[ModeConfig]) -> Engine {
    let mut engine = Engine::new(catalog());
    for (id, mode) in names().into_iter().zip(modes) {
        engine.create_container(id, mode.clone()).unwrap();
    }
    engine
}

/// Apply `op`, ignoring rejections that are legitimate for the mode
/// (consolidating a grid, removing more than is held).
fn apply(engine: &mut Engine, op: &Op) {
    let ids = names();
    let _ = match op {
        Op::Add { container, item, quantity } => {
            engine.add_item(&ids[*container], &iid(ITEMS[*item]), *quantity).map(drop)
        }
        Op::Remove { container, item, quantity } => {
            let held = engine.quantity(&ids[*container], &iid(ITEMS[*item])).unwrap();
            let take = (*quantity).min(held as u32);
            engine.remove_item(&ids[*container], &iid(ITEMS[*item]), take).map(drop)
        }
        Op::Transfer { from, to, item, quantity } => engine
            .transfer(&ids[*from], &ids[*to], &iid(ITEMS[*item]), *quantity)
            .map(drop),
        Op::Consolidate { container } => engine.consolidate(&ids[*container]),
        Op::Arrange { container } => engine.auto_arrange(&ids[*container]),
    };
}

fn totals(engine: &Engine) -> HashMap<(String, String), u64> {
    let mut out = HashMap::new();
    for id in names() {
        for entry in engine.contents(&id, false).unwrap() {
            *out.entry((id.to_string(), entry.item_id.to_string())).or_default() += u64::from(entry.quantity);
        }
    }
    out
}

/// Every cell resolves to a live positioned stack whose footprint covers it,
/// and no two stacks claim the same cell.
fn assert_grid_consistent(container: &Container, grid: &GridState, meta: &ItemCatalog) {
    let mut claimed = vec![0u32; (grid.width() * grid.height()) as usize];
    for (item, stacks) in container.entries() {
        let size = meta.size(item);
        for stack in stacks {
            let at = stack.position.expect("grid stacks carry a position");
            let footprint = size.oriented(at.rotated);
            for dy in 0..footprint.height {
                for dx in 0..footprint.width {
                    let (x, y) = (at.x + dx, at.y + dy);
                    assert!(x < grid.width() && y < grid.height(), "footprint leaves the grid");
                    claimed[(y * grid.width() + x) as usize] += 1;
                }
            }
        }
    }
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let count = claimed[(y * grid.width() + x) as usize];
            assert!(count <= 1, "cell ({x}, {y}) claimed {count} times");
            match grid.cell(x, y) {
                Some(cell) => {
                    assert_eq!(count, 1, "cell ({x}, {y}) points at nothing");
                    let stack = &container.stacks(&cell.item_id)[cell.stack_index];
                    assert!(stack.quantity > 0);
                }
                None => assert_eq!(count, 0, "cell ({x}, {y}) covered but empty"),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Removing exactly what `add_item` reports as added restores the quantity.
    #[test]
    fn add_then_remove_is_identity(
        mode in mode_strategy(),
        seed in prop::collection::vec((0usize..4, 0u32..6), 0..4),
        item in 0usize..4,
        quantity in 0u32..30,
    ) {
        let mut engine = build(&[mode]);
        let alpha = cid("alpha");
        for (i, q) in seed {
            let _ = engine.add_item(&alpha, &iid(ITEMS[i]), q).unwrap();
        }
        let item = iid(ITEMS[item]);
        let before = engine.quantity(&alpha, &item).unwrap();

        let outcome = engine.add_item(&alpha, &item, quantity).unwrap();
        prop_assert_eq!(outcome.added + outcome.overflow, quantity);
        engine.remove_item(&alpha, &item, outcome.added).unwrap();
        prop_assert_eq!(engine.quantity(&alpha, &item).unwrap(), before);
    }

    /// Transfers conserve units and account for every requested unit.
    #[test]
    fn transfer_conserves_units(
        from_mode in mode_strategy(),
        to_mode in mode_strategy(),
        held in 0u32..25,
        item in 0usize..4,
        quantity in 0u32..30,
    ) {
        let mut engine = build(&[from_mode, to_mode]);
        let (alpha, beta) = (cid("alpha"), cid("beta"));
        let item = iid(ITEMS[item]);
        engine.add_item(&alpha, &item, held).unwrap();
        let before = engine.quantity(&alpha, &item).unwrap() + engine.quantity(&beta, &item).unwrap();

        let outcome = engine.transfer(&alpha, &beta, &item, quantity).unwrap();
        prop_assert_eq!(outcome.transferred + outcome.overflow, quantity);
        let after = engine.quantity(&alpha, &item).unwrap() + engine.quantity(&beta, &item).unwrap();
        prop_assert_eq!(before, after);
    }

    /// Any reachable state survives serialize/deserialize unchanged, and the
    /// grid invariant holds at every step.
    #[test]
    fn random_histories_round_trip_and_keep_grids_consistent(
        modes in prop::collection::vec(mode_strategy(), 3),
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let meta = catalog();
        let mut engine = build(&modes);
        for op in &ops {
            apply(&mut engine, op);
            for id in names() {
                let container = engine.container(&id).unwrap();
                if let Some(grid) = container.grid() {
                    assert_grid_consistent(container, grid, &meta);
                }
            }
        }

        let value = engine.serialize().unwrap();
        let mut copy = Engine::new(catalog());
        copy.deserialize(&value).unwrap();
        prop_assert_eq!(copy.serialize().unwrap(), value);
        for id in names() {
            prop_assert_eq!(copy.container(&id).unwrap().grid(), engine.container(&id).unwrap().grid());
        }
    }

    /// Consolidation keeps per-item totals and leaves no empty or
    /// over-capacity stacks.
    #[test]
    fn consolidation_keeps_totals(
        max_stack in 1u32..10,
        adds in prop::collection::vec((0usize..4, 1u32..15), 1..8),
        splits in prop::collection::vec((0usize..4, 0usize..4, 1u32..5), 0..10),
    ) {
        let meta = catalog();
        let mut engine = Engine::new(catalog());
        let bin = cid("bin");
        let config = ModeConfig::unlimited().max_stack_size(max_stack);
        let policy = config.stacking_policy();
        engine.create_container(bin.clone(), config).unwrap();
        for (i, q) in adds {
            engine.add_item(&bin, &iid(ITEMS[i]), q).unwrap();
        }
        // Fragment the stacks; out-of-range splits are simply rejected.
        for (i, index, q) in splits {
            let _ = engine.split_stack(&bin, &iid(ITEMS[i]), index, q);
        }
        let before = totals(&engine);

        engine.consolidate(&bin).unwrap();
        prop_assert_eq!(totals(&engine), before.clone());
        engine.consolidate(&bin).unwrap();
        prop_assert_eq!(totals(&engine), before);

        for (item, stacks) in engine.container(&bin).unwrap().entries() {
            let cap = policy.cap(meta.stack_limit(item));
            for stack in stacks {
                prop_assert!(stack.quantity > 0);
                prop_assert!(stack.quantity <= cap);
            }
        }
    }

    /// A transaction whose body fails leaves every container as it was.
    #[test]
    fn failed_transactions_change_nothing(
        modes in prop::collection::vec(mode_strategy(), 3),
        setup in prop::collection::vec(op_strategy(), 0..15),
        body in prop::collection::vec(op_strategy(), 0..15),
    ) {
        let mut engine = build(&modes);
        for op in &setup {
            apply(&mut engine, op);
        }
        let before = engine.serialize().unwrap();

        let result: Result<(), _> = engine.transaction(|e| {
            for op in &body {
                apply(e, op);
            }
            e.remove_container(&cid("missing"))
        });
        prop_assert!(result.is_err());
        prop_assert_eq!(engine.serialize().unwrap(), before);
    }

    /// No sequence of nesting adds ever produces a container that reaches
    /// itself.
    #[test]
    fn nesting_never_cycles(
        edges in prop::collection::vec((0usize..3, 0usize..3), 0..12),
    ) {
        let mut engine = build(&[ModeConfig::unlimited(), ModeConfig::unlimited(), ModeConfig::unlimited()]);
        let ids = names();
        for (outer, inner) in edges {
            let nested = iid(ids[inner].as_str());
            match engine.add_item(&ids[outer], &nested, 1) {
                Ok(_) => prop_assert_ne!(outer, inner),
                Err(err) => prop_assert!(err.is_validation()),
            }
        }
        for start in &ids {
            let deep = engine.contents(start, true).unwrap();
            prop_assert!(deep.iter().all(|e| e.item_id.as_str() != start.as_str()));
        }
    }
}
