use squad_engine::expr::{roll_expr, DiceExpr, DiceTerm, HALVE_TOTAL};
use squad_engine::{Dice, EngineError};

#[test]
fn empty_and_zero_are_no_op() {
    let mut dice = Dice::from_scripted(vec![6]);
    for src in ["", "0", "  "] {
        let expr = DiceExpr::parse(src).unwrap();
        assert!(expr.is_zero());
        let r = expr.roll(&mut dice);
        assert_eq!(r.total, 0.0);
        assert_eq!(r.formula, "0");
    }
}

#[test]
fn parses_mixed_terms_and_renders_canonically() {
    let expr = DiceExpr::parse("+1d20+ 3d10 -2").unwrap();
    assert_eq!(
        expr,
        DiceExpr::Terms(vec![
            DiceTerm::Dice { count: 1, sides: 20, negative: false },
            DiceTerm::Dice { count: 3, sides: 10, negative: false },
            DiceTerm::Flat(-2),
        ])
    );
    assert_eq!(expr.to_string(), "1d20 + 3d10 - 2");
    assert_eq!(DiceExpr::parse("-1d10").unwrap().to_string(), "-1d10");
    assert_eq!(DiceExpr::parse("d6").unwrap().to_string(), "1d6");
}

#[test]
fn rolls_every_die_in_order() {
    let mut dice = Dice::from_scripted(vec![12, 3, 4, 5]);
    let r = roll_expr(&mut dice, "1d20 + 3d10 - 2").unwrap();
    assert_eq!(r.total, 22.0);
    assert_eq!(r.formula, "1d20 + 3d10 - 2");
}

#[test]
fn negative_dice_subtract() {
    let mut dice = Dice::from_scripted(vec![7]);
    let r = roll_expr(&mut dice, "-1d20").unwrap();
    assert_eq!(r.total, -7.0);
    assert!(DiceExpr::parse("-1d20").unwrap().leads_negative());
    assert!(!DiceExpr::parse("+1d20").unwrap().leads_negative());
}

#[test]
fn halve_marker_is_minus_half() {
    let expr = DiceExpr::parse("-1/2").unwrap();
    assert_eq!(expr, DiceExpr::Halve);
    let mut dice = Dice::from_scripted(vec![]);
    let r = expr.roll(&mut dice);
    assert_eq!(r.total, HALVE_TOTAL);
    assert!(r.is_halve());
    assert_eq!(r.formula, "-1/2");
}

#[test]
fn zero_count_rolls_nothing() {
    let mut dice = Dice::from_scripted(vec![9, 1]);
    let r = DiceExpr::dice(0, 10).roll(&mut dice);
    assert_eq!(r.total, 0.0);
    assert_eq!(dice.roll_die(10), 9);
}

#[test]
fn malformed_expressions_are_rejected() {
    for src in ["1d", "xd6", "2d0", "1d6++2", "3*4", "1d6-"] {
        let err = DiceExpr::parse(src).unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidExpression { ref expr, .. } if expr == src),
            "{src}: {err:?}"
        );
    }
}

#[test]
fn serializes_as_its_string() {
    let expr = DiceExpr::parse("+2d10").unwrap();
    assert_eq!(serde_json::to_string(&expr).unwrap(), "\"2d10\"");
    let back: DiceExpr = serde_json::from_str("\"-1/2\"").unwrap();
    assert_eq!(back, DiceExpr::Halve);
    assert!(serde_json::from_str::<DiceExpr>("\"1d\"").is_err());
}

#[test]
fn seeded_rolls_stay_in_range_and_replay() {
    let mut a = Dice::from_seed(7);
    let mut b = Dice::from_seed(7);
    for _ in 0..200 {
        let x = a.roll_die(6);
        assert!((1..=6).contains(&x));
        assert_eq!(x, b.roll_die(6));
    }
    for _ in 0..200 {
        assert!((1..=100).contains(&a.d100()));
    }
}

#[test]
fn scripted_source_cycles_and_picks_one_based() {
    let mut dice = Dice::from_scripted(vec![1, 2]);
    assert_eq!(dice.roll_die(20), 1);
    assert_eq!(dice.roll_die(20), 2);
    assert_eq!(dice.roll_die(20), 1);
    let mut dice = Dice::from_scripted(vec![2, 3]);
    assert_eq!(dice.pick(2), 1);
    assert_eq!(dice.pick(2), 0);
}
