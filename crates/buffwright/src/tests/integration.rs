//! End-to-end scenarios through the engines and the [`BuffSystem`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::arena::Arena;
use crate::container::{BuffContainer, BuffOwner, BuffWorld};
use crate::fusion::{
    FusionCondition, FusionError, FusionEvent, FusionOutcome, FusionRecipe, Ingredient,
};
use crate::model::{BuffData, BuffDataId, OwnerId};
use crate::snapshot::NamedAttributeCapturer;
use crate::system::BuffSystem;
use crate::transmission::{TransmissionEvent, TransmissionProfile};

use super::helpers::{contagious, debug_system, independent, line_world, stackable};

const A: BuffDataId = BuffDataId::new(1);
const RESULT: BuffDataId = BuffDataId::new(100);

/// One owner carrying `count` independent instances of `A`, with `A` and
/// `RESULT` in the catalog.
fn fusion_world(count: usize) -> (Arena, OwnerId) {
    let (mut arena, ids) = line_world(1, 1.0);
    let a = independent(A.as_u32());
    arena.register_data(a.clone());
    arena.register_data(BuffData::new(RESULT, "result"));
    for _ in 0..count {
        arena.apply_buff(ids[0], &a, None);
    }
    (arena, ids[0])
}

// =============================================================================
// Fusion Scenarios
// =============================================================================

#[test]
fn instant_fusion_consumes_and_produces() {
    let (mut arena, owner) = fusion_world(2);
    let mut system = debug_system(0, 10);
    system
        .fusion_mut()
        .register_recipe(
            FusionRecipe::new("r1", RESULT).with_ingredient(Ingredient::consumed(A, 2)),
        )
        .unwrap();

    let outcome = system.fusion_mut().try_fusion("r1", owner, &mut arena).unwrap();
    let FusionOutcome::Completed(result) = outcome else {
        panic!("expected instant completion, got {outcome:?}");
    };

    assert_eq!(arena.buff(result).unwrap().data_id(), RESULT);
    assert_eq!(arena.count_of(owner, A), 0);
}

#[test]
fn timed_fusion_completes_once_after_five_ticks() {
    let (mut arena, owner) = fusion_world(2);
    let mut system = debug_system(0, 10);
    system
        .fusion_mut()
        .register_recipe(
            FusionRecipe::new("r2", RESULT)
                .with_ingredient(Ingredient::consumed(A, 2))
                .with_fusion_time(5.0),
        )
        .unwrap();

    let outcome = system.fusion_mut().try_fusion("r2", owner, &mut arena).unwrap();
    assert_eq!(outcome.result(), None);
    assert_eq!(arena.count_of(owner, RESULT), 0);

    let mut fused = Vec::new();
    for _ in 0..5 {
        fused.extend(system.tick(&mut arena, 1.0).fused);
    }

    let completed = system
        .fusion_mut()
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, FusionEvent::Completed { .. }))
        .count();
    assert_eq!(completed, 1);
    assert_eq!(fused.len(), 1);
    assert!(system.fusion().active_fusions().is_empty());
    assert_eq!(arena.count_of(owner, RESULT), 1);
}

#[test]
fn missing_result_data_leaves_ingredients() {
    let (mut arena, owner) = fusion_world(2);
    let mut system = debug_system(0, 10);
    system
        .fusion_mut()
        .register_recipe(
            FusionRecipe::new("broken", BuffDataId::new(999))
                .with_ingredient(Ingredient::consumed(A, 2)),
        )
        .unwrap();

    let err = system
        .fusion_mut()
        .try_fusion("broken", owner, &mut arena)
        .unwrap_err();

    assert_eq!(
        err,
        FusionError::ResultDataMissing {
            recipe_id: "broken".to_string(),
            result: BuffDataId::new(999),
        }
    );
    assert_eq!(arena.count_of(owner, A), 2);
}

#[test]
fn available_fusions_track_container_state() {
    let (mut arena, owner) = fusion_world(1);
    let mut system = debug_system(0, 10);
    system
        .load_recipes(
            r#"[
                { "recipe_id": "pair", "result_buff_id": 100,
                  "ingredients": [ { "buff_id": 1, "required_count": 2 } ] },
                { "recipe_id": "single", "result_buff_id": 100,
                  "ingredients": [ { "buff_id": 1, "required_count": 1, "consume": false } ],
                  "conditions": [ { "BuffCount": { "min": 1, "max": 1 } } ] }
            ]"#,
        )
        .unwrap();

    let names = |system: &BuffSystem, arena: &Arena| -> Vec<String> {
        let container = arena.get(owner).unwrap().container();
        system
            .fusion()
            .available_fusions(container)
            .into_iter()
            .map(|r| r.recipe_id.clone())
            .collect()
    };
    assert_eq!(names(&system, &arena), vec!["single".to_string()]);

    arena.apply_buff(owner, &independent(A.as_u32()), None);
    assert_eq!(names(&system, &arena), vec!["pair".to_string()]);
}

#[test]
fn custom_condition_gates_fusion() {
    let (mut arena, owner) = fusion_world(2);
    let mut system = debug_system(0, 10);
    system
        .fusion_mut()
        .register_recipe(
            FusionRecipe::new("even", RESULT)
                .with_ingredient(Ingredient::catalyst(A, 1))
                .with_condition(FusionCondition::custom("even count", |c, _| c.len() % 2 == 0)),
        )
        .unwrap();

    assert!(system.fusion_mut().try_fusion("even", owner, &mut arena).is_ok());
    // Three buffs now: two catalysts plus the result.
    let err = system
        .fusion_mut()
        .try_fusion("even", owner, &mut arena)
        .unwrap_err();
    assert!(matches!(
        err,
        FusionError::ConditionsNotMet { condition, .. } if condition == "even count"
    ));
}

// =============================================================================
// Strategy Scenarios
// =============================================================================

#[test]
fn stackable_applications_accumulate_on_one_instance() {
    let (mut arena, ids) = line_world(1, 1.0);
    let data = stackable(3, 2).with_max_stack(1_000);
    for _ in 0..7 {
        arena.apply_buff(ids[0], &data, None);
    }

    let owner = arena.get(ids[0]).unwrap();
    let instances = owner.container().get_buffs(data.id);
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].stack(), 14);
}

#[test]
fn reduce_mode_sheds_stacks_through_arena_ticks() {
    let (mut arena, ids) = line_world(1, 1.0);
    let data = stackable(3, 1).with_duration(1.0).reduce_on_expiry(2, 0.5);
    for _ in 0..5 {
        arena.apply_buff(ids[0], &data, None);
    }

    assert!(arena.tick(1.0).is_empty());
    assert!(arena.tick(0.5).is_empty());
    assert_eq!(arena.get(ids[0]).unwrap().container().get_buffs(data.id)[0].stack(), 3);

    let removed = arena.tick(1.0);
    assert_eq!(removed.len(), 1);
    assert_eq!(arena.count_of(ids[0], data.id), 0);
}

// =============================================================================
// Transmission Scenarios
// =============================================================================

#[test]
fn queue_budget_processes_in_enqueue_order() {
    let mut arena = Arena::new();
    let data = contagious(5, TransmissionProfile::range(2.0, 0.0));
    arena.register_data(data.clone());

    let mut carriers = Vec::new();
    for i in 0..5u8 {
        let x = f32::from(i) * 100.0;
        let carrier = arena.spawn("carrier", 0, Vec2::new(x, 0.0));
        arena.spawn("neighbor", 1, Vec2::new(x + 1.0, 0.0));
        carriers.push(carrier);
    }

    let mut system = debug_system(0, 2);
    for &carrier in &carriers {
        let id = arena.apply_buff(carrier, &data, None).unwrap();
        assert!(system.transmission_mut().request_for(&arena, id));
    }

    let mut batches = Vec::new();
    for _ in 0..3 {
        let processed = system.tick(&mut arena, 0.1).transmissions;
        let from: Vec<OwnerId> = system
            .transmission_mut()
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                TransmissionEvent::Transmitted { from, .. } => Some(from),
                TransmissionEvent::ChainAdvanced { .. } => None,
            })
            .collect();
        batches.push((processed, from));
    }

    assert_eq!(batches[0], (2, vec![carriers[0], carriers[1]]));
    assert_eq!(batches[1], (2, vec![carriers[2], carriers[3]]));
    assert_eq!(batches[2], (1, vec![carriers[4]]));
}

#[test]
fn chain_spreads_one_hop_per_tick_through_system() {
    let (mut arena, ids) = line_world(6, 1.0);
    let data = contagious(7, TransmissionProfile::chain(1.5, 0.5, 4));
    arena.register_data(data.clone());
    let first = arena.apply_buff(ids[0], &data, None).unwrap();

    let mut system = debug_system(0, 10);
    system.transmission_mut().request_for(&arena, first);

    for tick in 1..=4 {
        system.tick(&mut arena, 0.1);
        assert_eq!(arena.count_of(ids[tick], data.id), 1, "hop {tick}");
    }
    system.tick(&mut arena, 0.1);
    assert_eq!(arena.count_of(ids[5], data.id), 0);
    assert_eq!(system.transmission().pending(), 0);
}

#[test]
fn subscribers_observe_transmissions() {
    let (mut arena, ids) = line_world(3, 1.0);
    let data = contagious(7, TransmissionProfile::contact(1.5, 1.0, 0.0));
    arena.register_data(data.clone());
    let id = arena.apply_buff(ids[1], &data, None).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut system = debug_system(0, 10);
    system.transmission_mut().events_mut().subscribe(move |e| {
        if let TransmissionEvent::Transmitted { to, .. } = e {
            sink.borrow_mut().push(*to);
        }
    });

    system.transmission_mut().request_for(&arena, id);
    system.tick(&mut arena, 0.1);

    assert_eq!(*seen.borrow(), vec![ids[0], ids[2]]);
}

// =============================================================================
// Snapshot Scenarios
// =============================================================================

#[test]
fn snapshot_survives_attribute_change_until_buff_is_gone() {
    let (mut arena, ids) = line_world(1, 1.0);
    let ignite = BuffData::new(BuffDataId::new(9), "ignite").with_duration(3.0);
    arena.register_data(ignite.clone());
    arena.get_mut(ids[0]).unwrap().set_attribute("attack", 40.0);
    let id = arena.apply_buff(ids[0], &ignite, None).unwrap();

    let mut system = debug_system(0, 10);
    system
        .snapshots_mut()
        .register_capturer(ignite.id, NamedAttributeCapturer::new(["attack"]));
    {
        let owner = arena.get(ids[0]).unwrap();
        let buff = owner.container().get_buff(id).unwrap();
        system
            .snapshots_mut()
            .create_snapshot_with_registered_capturer(owner, buff)
            .unwrap();
    }

    arena.get_mut(ids[0]).unwrap().set_attribute("attack", 5.0);
    system.tick(&mut arena, 1.0);
    assert_eq!(
        system.snapshots().snapshot(id).unwrap().attribute("attack"),
        Some(40.0)
    );

    let removed = arena.tick(3.0);
    system.forget(&removed);
    assert!(!system.snapshots().has_snapshot(id));
}
