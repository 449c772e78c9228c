use ai_core::{BbKey, Blackboard, IVec2, Interner};

#[test]
fn blackboard_set_get_unset_roundtrip() {
    let mut names = Interner::new();
    let k_hp: BbKey<f32> = names.key("hp");
    let k_enemy: BbKey<u64> = names.key("enemy");
    let k_wp: BbKey<IVec2> = names.key("next_wp");

    let mut bb = Blackboard::<u64>::new();
    assert!(!bb.contains(k_hp));

    bb.set(k_hp, 12.5);
    bb.set(k_enemy, 7);
    bb.set(k_wp, IVec2::new(-5, 10));

    assert_eq!(bb.get(k_hp), Some(12.5));
    assert_eq!(bb.get(k_enemy), Some(7));
    assert_eq!(bb.get(k_wp), Some(IVec2::new(-5, 10)));

    assert_eq!(bb.unset(k_enemy), Some(7));
    assert_eq!(bb.get(k_enemy), None);
    assert_eq!(bb.unset(k_enemy), None);
}

#[test]
fn unset_keys_read_absent_for_every_type() {
    let mut names = Interner::new();
    let k_f: BbKey<f32> = names.key("f");
    let k_i: BbKey<i32> = names.key("i");
    let k_a: BbKey<u64> = names.key("a");
    let k_v: BbKey<IVec2> = names.key("v");

    let mut bb = Blackboard::<u64>::for_interner(&names);
    assert_eq!(bb.get(k_f), None);
    assert_eq!(bb.get(k_i), None);
    assert_eq!(bb.get(k_a), None);
    assert_eq!(bb.get(k_v), None);

    bb.set(k_f, 0.0);
    bb.set(k_i, 0);
    bb.set(k_a, 0);
    bb.set(k_v, IVec2::ZERO);
    bb.unset(k_f);
    bb.unset(k_i);
    bb.unset(k_a);
    bb.unset(k_v);

    assert_eq!(bb.get(k_f), None);
    assert_eq!(bb.get(k_i), None);
    assert_eq!(bb.get(k_a), None);
    assert_eq!(bb.get(k_v), None);
}

#[test]
fn same_name_is_independent_per_type() {
    let mut names = Interner::new();
    let as_int: BbKey<i32> = names.key("target");
    let as_vec: BbKey<IVec2> = names.key("target");
    assert_eq!(as_int.symbol(), as_vec.symbol());

    let mut bb = Blackboard::<u32>::new();
    bb.set(as_int, 3);
    assert_eq!(bb.get(as_vec), None);

    bb.set(as_vec, IVec2::new(1, 2));
    bb.clear();
    assert_eq!(bb.get(as_int), None);
    assert_eq!(bb.get(as_vec), None);
}

#[test]
fn keys_interned_later_still_work_on_older_blackboards() {
    let mut names = Interner::new();
    let mut bb = Blackboard::<u64>::for_interner(&names);
    for i in 0..64 {
        let _ = names.intern(&format!("pad{i}"));
    }
    let late: BbKey<i32> = names.key("late");
    bb.set(late, 99);
    assert_eq!(bb.get(late), Some(99));
}
