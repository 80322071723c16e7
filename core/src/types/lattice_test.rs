use super::*;
use crate::types::Precision;
use pretty_assertions::assert_eq;

fn sample_types() -> Vec<Type> {
    let p84 = Precision::new(8, 4).unwrap();
    let p164 = Precision::new(16, 4).unwrap();
    vec![
        Type::Unknown,
        Type::Boolean,
        Type::UnsignedByte,
        Type::Short,
        Type::Int,
        Type::Long,
        Type::Float,
        Type::Double,
        Type::Complex,
        Type::fix(p84),
        Type::fix(p164),
        Type::Fix(None),
        Type::Scalar,
        Type::String,
        Type::object("Clock"),
        Type::Object(None),
        Type::General,
        Type::array(Type::Int),
        Type::array(Type::Double),
        Type::matrix(Type::Int),
        Type::matrix(Type::Complex),
        Type::record([("a", Type::Int), ("b", Type::String)]),
        Type::record([("a", Type::Double)]),
        Type::union([("a", Type::Int)]),
        Type::union([("a", Type::Int), ("b", Type::Boolean)]),
        Type::function(vec![Type::Double], Type::Int),
        Type::function(vec![Type::Int], Type::Double),
    ]
}

#[test]
fn test_compare_is_reflexive() {
    for ty in sample_types() {
        assert_eq!(compare(&ty, &ty), Relation::Equal, "{ty}");
    }
}

#[test]
fn test_compare_is_antisymmetric() {
    let types = sample_types();
    for a in &types {
        for b in &types {
            assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
        }
    }
}

#[test]
fn test_compare_is_transitive() {
    let types = sample_types();
    for a in &types {
        for b in &types {
            for c in &types {
                if is_lower_or_equal(a, b) && is_lower_or_equal(b, c) {
                    assert!(is_lower_or_equal(a, c), "{a} <= {b} <= {c}");
                }
            }
        }
    }
}

#[test]
fn test_join_is_commutative_and_idempotent() {
    let types = sample_types();
    for a in &types {
        assert_eq!(least_upper_bound(a, a), a.clone());
        for b in &types {
            assert_eq!(least_upper_bound(a, b), least_upper_bound(b, a), "{a} v {b}");
        }
    }
}

#[test]
fn test_join_is_an_upper_bound() {
    let types = sample_types();
    for a in &types {
        for b in &types {
            let join = least_upper_bound(a, b);
            assert!(is_lower_or_equal(a, &join), "{a} <= {join}");
            assert!(is_lower_or_equal(b, &join), "{b} <= {join}");
        }
    }
}

#[test]
fn test_numeric_chain() {
    assert_eq!(compare(&Type::UnsignedByte, &Type::Long), Relation::Lower);
    assert_eq!(compare(&Type::Int, &Type::Double), Relation::Lower);
    assert_eq!(compare(&Type::Complex, &Type::Short), Relation::Higher);
    assert_eq!(compare(&Type::Long, &Type::Double), Relation::Incomparable);
    assert_eq!(compare(&Type::Boolean, &Type::Int), Relation::Incomparable);
    assert_eq!(compare(&Type::Int, &Type::String), Relation::Lower);
}

#[test]
fn test_scalar_joins() {
    assert_eq!(least_upper_bound(&Type::Int, &Type::Float), Type::Double);
    assert_eq!(least_upper_bound(&Type::Short, &Type::UnsignedByte), Type::Short);
    assert_eq!(least_upper_bound(&Type::Long, &Type::Double), Type::Scalar);
    assert_eq!(least_upper_bound(&Type::Boolean, &Type::Int), Type::Scalar);
    assert_eq!(least_upper_bound(&Type::Int, &Type::String), Type::String);
    assert_eq!(least_upper_bound(&Type::Unknown, &Type::Long), Type::Long);
}

#[test]
fn test_unrelated_types_join_to_general() {
    assert_eq!(
        least_upper_bound(&Type::array(Type::Int), &Type::Int),
        Type::General
    );
    assert_eq!(
        least_upper_bound(&Type::object("A"), &Type::String),
        Type::General
    );
}

#[test]
fn test_containers_compare_through_inner_types() {
    assert_eq!(
        compare(&Type::array(Type::Int), &Type::array(Type::Double)),
        Relation::Lower
    );
    assert_eq!(
        compare(&Type::array(Type::Int), &Type::matrix(Type::Int)),
        Relation::Incomparable
    );
    assert_eq!(
        least_upper_bound(&Type::array(Type::Int), &Type::array(Type::Float)),
        Type::array(Type::Double)
    );
    assert_eq!(
        least_upper_bound(&Type::array(Type::Unknown), &Type::array(Type::String)),
        Type::array(Type::String)
    );
}

#[test]
fn test_record_width_subtyping() {
    let wide = Type::record([("a", Type::Int), ("b", Type::String)]);
    let narrow = Type::record([("a", Type::Double)]);
    assert_eq!(compare(&wide, &narrow), Relation::Lower);
    assert_eq!(
        least_upper_bound(&wide, &Type::record([("b", Type::Int), ("c", Type::Int)])),
        Type::record([("b", Type::String)])
    );
}

#[test]
fn test_union_is_dual_of_record() {
    let small = Type::union([("a", Type::Int)]);
    let large = Type::union([("a", Type::Int), ("b", Type::Boolean)]);
    assert_eq!(compare(&small, &large), Relation::Lower);
}

#[test]
fn test_fixed_point_precisions() {
    let p84 = Type::fix(Precision::new(8, 4).unwrap());
    let p106 = Type::fix(Precision::new(10, 6).unwrap());
    let p124 = Type::fix(Precision::new(12, 4).unwrap());
    assert_eq!(compare(&p84, &p124), Relation::Lower);
    assert_eq!(compare(&p84, &p106), Relation::Lower);
    assert_eq!(compare(&p106, &p124), Relation::Incomparable);
    assert_eq!(
        least_upper_bound(&p106, &p124),
        Type::fix(Precision::new(14, 6).unwrap())
    );
    assert_eq!(compare(&p84, &Type::Fix(None)), Relation::Lower);
}

#[test]
fn test_functions_are_contravariant() {
    let takes_double = Type::function(vec![Type::Double], Type::Int);
    let takes_int = Type::function(vec![Type::Int], Type::Double);
    assert_eq!(compare(&takes_double, &takes_int), Relation::Lower);
}

#[test]
fn test_join_of_many() {
    let types = [Type::Short, Type::Int, Type::Float];
    assert_eq!(least_upper_bound_of(&types), Type::Double);
    assert_eq!(least_upper_bound_of(&[]), Type::Unknown);
}
