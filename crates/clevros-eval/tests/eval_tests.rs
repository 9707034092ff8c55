//! Integration tests for the CLEVROS evaluator.
//!
//! Covers:
//! - filter / unique / query / exists / count scenarios
//! - spatial relations
//! - union and intersection laws
//! - filter commutativity and unique/count consistency
//! - answer type safety and gold answer parsing
//! - validator behaviour on malformed candidates
//! - error kinds and determinism

use std::collections::BTreeSet;
use std::sync::Arc;

use clevros_eval::{
    AnswerValidator, AnswerValue, Attribute, EvalError, ObjectId, Ontology, RawScene, Relation,
    RelationTable, Scene, SceneObject, Vocabulary,
};
use clevros_types::ast::{LogicalExpr, Variable};
use clevros_types::ty::Type;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn ontology() -> Arc<Ontology> {
    Ontology::clevr().shared()
}

fn scene_of(objects: Vec<SceneObject>) -> Scene {
    Scene::new(ontology(), 0, objects, RelationTable::new()).expect("valid scene")
}

/// `{red,small,cylinder,metal}` and `{blue,large,cylinder,rubber}`.
fn two_cylinders() -> Scene {
    scene_of(vec![
        SceneObject::new("red", "small", "cylinder", "metal"),
        SceneObject::new("blue", "large", "cylinder", "rubber"),
    ])
}

/// Six objects covering repeated and unique attribute values.
fn busy_scene() -> Scene {
    scene_of(vec![
        SceneObject::new("red", "small", "cylinder", "metal"),
        SceneObject::new("blue", "large", "cylinder", "rubber"),
        SceneObject::new("red", "large", "cube", "rubber"),
        SceneObject::new("green", "small", "sphere", "metal"),
        SceneObject::new("blue", "small", "cube", "metal"),
        SceneObject::new("gray", "large", "sphere", "rubber"),
    ])
}

fn eval(scene: &Scene, src: &str) -> Result<AnswerValue, EvalError> {
    scene.evaluate_str(src)
}

fn eval_ok(scene: &Scene, src: &str) -> AnswerValue {
    match eval(scene, src) {
        Ok(answer) => answer,
        Err(err) => panic!("evaluating {src}: {err}"),
    }
}

fn ids(scene: &Scene, indices: &[usize]) -> BTreeSet<ObjectId> {
    indices.iter().map(|&i| scene.object_id(i).unwrap()).collect()
}

fn members(answer: AnswerValue) -> BTreeSet<ObjectId> {
    match answer {
        AnswerValue::Set(set) => set,
        other => panic!("expected a set, got {other}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn basic_filter() {
    let scene = two_cylinders();
    let answer = eval_ok(
        &scene,
        "(filter_material:<<e,t>,<pm,<e,t>>> scene:<e,t> rubber:pm)",
    );
    assert_eq!(answer, AnswerValue::Set(ids(&scene, &[1])));
}

#[test]
fn unique_then_query() {
    let scene = two_cylinders();
    let answer = eval_ok(
        &scene,
        "(query_material:<e,pm> (unique:<<e,t>,e> (filter_size:<<e,t>,<psi,<e,t>>> scene:<e,t> large:psi)))",
    );
    assert_eq!(answer, AnswerValue::String("rubber".into()));
}

#[test]
fn exists_false() {
    let scene = two_cylinders();
    let answer = eval_ok(&scene, "(exists (filter_color scene brown))");
    assert_eq!(answer, AnswerValue::Boolean(false));
}

#[test]
fn count_cylinders() {
    let scene = scene_of(vec![
        SceneObject::new("red", "small", "cylinder", "metal"),
        SceneObject::new("blue", "large", "cylinder", "rubber"),
        SceneObject::new("green", "large", "cube", "metal"),
    ]);
    let answer = eval_ok(
        &scene,
        "(count:<<e,t>,i> (filter_shape:<<e,t>,<psh,<e,t>>> scene:<e,t> cylinder:psh))",
    );
    assert_eq!(answer, AnswerValue::Integer(2));
}

#[test]
fn relate_front() {
    // Object 0 (A) is in front of object 1 (B).
    let mut relations = RelationTable::new();
    relations
        .entry(Relation::Front)
        .or_default()
        .insert(1, BTreeSet::from([0]));
    relations
        .entry(Relation::Behind)
        .or_default()
        .insert(0, BTreeSet::from([1]));
    let scene = Scene::new(
        ontology(),
        0,
        vec![
            SceneObject::new("red", "small", "cylinder", "metal"),
            SceneObject::new("blue", "large", "cylinder", "rubber"),
        ],
        relations,
    )
    .unwrap();

    let in_front_of_b = eval_ok(
        &scene,
        "(relate (unique (filter_color scene blue)) front)",
    );
    assert_eq!(in_front_of_b, AnswerValue::Set(ids(&scene, &[0])));

    let behind_a = eval_ok(&scene, "(relate (unique (filter_color scene red)) behind)");
    assert_eq!(behind_a, AnswerValue::Set(ids(&scene, &[1])));

    let in_front_of_a = eval_ok(&scene, "(relate (unique (filter_color scene red)) front)");
    assert_eq!(in_front_of_a, AnswerValue::Set(BTreeSet::new()));
}

#[test]
fn chained_filters_are_conjunctive() {
    let scene = busy_scene();
    let answer = eval_ok(
        &scene,
        "(filter_shape (filter_color scene red) cube)",
    );
    assert_eq!(answer, AnswerValue::Set(ids(&scene, &[2])));
}

#[test]
fn same_attribute_pairs_with_itself() {
    let scene = busy_scene();
    let answer = eval_ok(
        &scene,
        "(same_shape (unique (filter_color scene green)))",
    );
    assert_eq!(answer, AnswerValue::Set(ids(&scene, &[3, 5])));
}

#[test]
fn equal_attribute_and_integer() {
    let scene = busy_scene();
    assert_eq!(
        eval_ok(
            &scene,
            "(equal_color (query_color (unique (filter_shape (filter_size scene small) cylinder))) (query_color (unique (filter_shape (filter_size scene large) cube))))",
        ),
        AnswerValue::Boolean(true)
    );
    assert_eq!(
        eval_ok(
            &scene,
            "(equal_integer (count (filter_size scene large)) (count (filter_size scene small)))",
        ),
        AnswerValue::Boolean(true)
    );
    assert_eq!(
        eval_ok(
            &scene,
            "(greater_than (count (filter_material scene metal)) (count (filter_shape scene sphere)))",
        ),
        AnswerValue::Boolean(true)
    );
    assert_eq!(
        eval_ok(&scene, "(less_than (count (filter_color scene red)) 2:i)"),
        AnswerValue::Boolean(false)
    );
}

#[test]
fn factored_forms() {
    let scene = busy_scene();
    assert_eq!(
        eval_ok(&scene, "(count (filter shape:a scene sphere))"),
        AnswerValue::Integer(2)
    );
    assert_eq!(
        eval_ok(
            &scene,
            "(query:<a,<e,pc>> color:a (unique (filter material:a (filter shape:a scene sphere) metal)))",
        ),
        AnswerValue::String("green".into())
    );
    assert_eq!(
        eval_ok(
            &scene,
            "(equal (query size:a (unique (filter color:a scene green))) (query size:a (unique (filter color:a scene gray))))",
        ),
        AnswerValue::Boolean(false)
    );
    assert_eq!(
        members(eval_ok(&scene, "(same material:a (unique (filter color:a scene gray)))")),
        ids(&scene, &[1, 2, 5])
    );
}

#[test]
fn factored_equal_rejects_mixed_kinds() {
    let scene = busy_scene();
    let err = eval(&scene, "(equal (count scene) (query_color (unique (filter_color scene green))))")
        .unwrap_err();
    assert!(matches!(err, EvalError::ArgumentType(_)));
}

#[test]
fn attribute_value_set_literal() {
    let scene = busy_scene();
    assert_eq!(
        eval_ok(&scene, "(count cube:<e,t>)"),
        AnswerValue::Integer(2)
    );
}

#[test]
fn explicit_lambda_projects_first_element() {
    let scene = busy_scene();
    let answer = eval_ok(
        &scene,
        "(lambda $0:e (filter_size:<<e,t>,<psi,<e,t>>> scene:<e,t> small:psi $0))",
    );
    assert_eq!(answer, AnswerValue::Set(ids(&scene, &[0, 3, 4])));

    let pairs = eval_ok(
        &scene,
        "(lambda $0:e (lambda $1:e (same_color $0 $1)))",
    );
    // Projection keeps every object that pairs with at least itself.
    assert_eq!(members(pairs).len(), 6);
}

#[test]
fn unique_result_as_object_answer() {
    let scene = busy_scene();
    assert_eq!(
        eval_ok(&scene, "(unique (filter_color scene gray))"),
        AnswerValue::Object(scene.object_id(5).unwrap())
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Properties
// ══════════════════════════════════════════════════════════════════════════════

fn attribute_values() -> Vec<(Attribute, String)> {
    let vocab = Vocabulary::clevr();
    Attribute::ALL
        .into_iter()
        .flat_map(|attr| {
            vocab
                .values(attr)
                .map(move |v| (attr, v.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn filter_conjunction_commutes() {
    let scene = busy_scene();
    let pairs = attribute_values();
    for (a1, v1) in &pairs {
        for (a2, v2) in &pairs {
            let forward = eval_ok(&scene, &format!("(filter_{a2} (filter_{a1} scene {v1}) {v2})"));
            let backward = eval_ok(&scene, &format!("(filter_{a1} (filter_{a2} scene {v2}) {v1})"));
            assert_eq!(forward, backward, "{a1}={v1} / {a2}={v2}");
        }
    }
}

#[test]
fn unique_agrees_with_count() {
    let scene = busy_scene();
    for (attr, value) in attribute_values() {
        let filter = format!("(filter_{attr} scene {value})");
        let count = eval_ok(&scene, &format!("(count {filter})"));
        let queried = eval(&scene, &format!("(query_shape (unique {filter}))"));
        if count == AnswerValue::Integer(1) {
            let denotation = members(eval_ok(&scene, &filter));
            let only = *denotation.iter().next().unwrap();
            assert_eq!(
                eval_ok(&scene, &format!("(unique {filter})")),
                AnswerValue::Object(only)
            );
            assert!(queried.is_ok(), "{filter}");
        } else {
            assert!(
                matches!(queried, Err(EvalError::AmbiguousOrEmptyReference(_))),
                "{filter}: {queried:?}"
            );
        }
    }
}

#[test]
fn union_and_intersection_laws() {
    let scene = busy_scene();
    let sets = [
        "(filter_color scene red)",
        "(filter_size scene large)",
        "(filter_shape scene sphere)",
        "(filter_material scene metal)",
        "(filter_color scene pink)",
    ];
    for a in sets {
        for b in sets {
            let in_a = members(eval_ok(&scene, a));
            let in_b = members(eval_ok(&scene, b));
            let union = members(eval_ok(&scene, &format!("(union {a} {b})")));
            let inter = members(eval_ok(&scene, &format!("(intersection {a} {b})")));
            for o in scene.object_ids() {
                assert_eq!(union.contains(&o), in_a.contains(&o) || in_b.contains(&o));
                assert_eq!(inter.contains(&o), in_a.contains(&o) && in_b.contains(&o));
            }
        }
    }
}

#[test]
fn union_of_exhaustive_filters_is_the_scene() {
    let scene = busy_scene();
    let answer = eval_ok(
        &scene,
        "(union (filter_size scene large) (filter_size scene small))",
    );
    assert_eq!(answer, AnswerValue::Set(scene.object_ids().collect()));
}

#[test]
fn answer_type_safety() {
    assert_ne!(AnswerValue::Integer(2), AnswerValue::String("2".into()));
}

#[test]
fn determinism_100_iterations() {
    let scene = busy_scene();
    let src = "(count (union (filter_color scene red) (relate (unique (filter_color scene green)) left)))";
    let first = eval(&scene, src);
    for i in 0..100 {
        assert_eq!(first, eval(&scene, src), "Determinism failure at iteration {i}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_operator() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(frobnicate scene)"),
        Err(EvalError::UnknownOperator(_))
    ));
}

#[test]
fn unknown_constant() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(filter_shape scene cone)"),
        Err(EvalError::UnknownConstant(_))
    ));
}

#[test]
fn variable_in_predicate_position() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(lambda $0:e ($0 scene))"),
        Err(EvalError::UnsupportedConstruct(_))
    ));
}

#[test]
fn set_where_object_expected() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(query_color (filter_size scene large))"),
        Err(EvalError::ArgumentType(_))
    ));
}

#[test]
fn object_where_set_expected() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(count (unique (filter_size scene large)))"),
        Err(EvalError::ArgumentType(_))
    ));
}

#[test]
fn empty_unique_is_dereferenced() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(query_color (unique (filter_shape scene cube)))"),
        Err(EvalError::AmbiguousOrEmptyReference(_))
    ));
    assert!(matches!(
        eval(&scene, "(unique (filter_shape scene cylinder))"),
        Err(EvalError::AmbiguousOrEmptyReference(_))
    ));
}

#[test]
fn non_entity_variable() {
    let scene = two_cylinders();
    assert!(matches!(
        eval(&scene, "(lambda $0:i (greater_than $0 1:i))"),
        Err(EvalError::UnsupportedVariableType(_))
    ));
}

#[test]
fn unbound_variable_in_hand_built_tree() {
    let scene = two_cylinders();
    let expr = LogicalExpr::literal(
        LogicalExpr::constant("scene", Some(Type::entity_set())),
        vec![LogicalExpr::variable(3, Some(Type::entity()))],
    );
    assert!(matches!(
        scene.evaluate(&expr),
        Err(EvalError::UnsupportedConstruct(_))
    ));
    let bound = LogicalExpr::lambda(Variable::new(3, Some(Type::entity())), expr);
    assert_eq!(
        scene.evaluate(&bound).unwrap(),
        AnswerValue::Set(scene.object_ids().collect())
    );
}

#[test]
fn bare_attribute_or_relation_is_not_an_answer() {
    let scene = two_cylinders();
    assert!(matches!(eval(&scene, "shape:a"), Err(EvalError::UnsupportedConstruct(_))));
    assert!(matches!(eval(&scene, "left"), Err(EvalError::UnsupportedConstruct(_))));
}

#[test]
fn syntax_error_is_reported() {
    let scene = two_cylinders();
    assert!(matches!(eval(&scene, "(count scene"), Err(EvalError::Syntax(_))));
}

// ══════════════════════════════════════════════════════════════════════════════
// Scene construction
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn scene_from_raw_json() {
    let raw: RawScene = serde_json::from_str(
        r#"{
            "image_index": 7,
            "objects": [
                {"color": "red", "size": "small", "shape": "cylinder", "material": "metal",
                 "rotation": 1.0, "3d_coords": [0.0, 0.0, 0.35]},
                {"color": "blue", "size": "large", "shape": "cylinder", "material": "rubber",
                 "rotation": 2.0, "3d_coords": [1.0, 1.0, 0.7]}
            ],
            "relationships": {"front": [[], [0]], "behind": [[1], []], "left": [[1], []], "right": [[], [0]]}
        }"#,
    )
    .unwrap();
    let scene = Scene::from_raw(ontology(), &raw).unwrap();
    assert_eq!(scene.image_index(), 7);
    assert_eq!(
        eval_ok(&scene, "(relate (unique (filter_color scene blue)) front)"),
        AnswerValue::Set(ids(&scene, &[0]))
    );
}

#[test]
fn scene_from_raw_rejects_bad_input() {
    let cases = [
        // relation index out of range
        r#"{"image_index": 0, "objects": [{"color": "red", "size": "small", "shape": "cube", "material": "metal"}],
            "relationships": {"left": [[3]]}}"#,
        // more rows than objects
        r#"{"image_index": 0, "objects": [{"color": "red", "size": "small", "shape": "cube", "material": "metal"}],
            "relationships": {"left": [[], []]}}"#,
        // unknown relation
        r#"{"image_index": 0, "objects": [], "relationships": {"above": []}}"#,
        // unknown attribute token
        r#"{"image_index": 0, "objects": [{"color": "mauve", "size": "small", "shape": "cube", "material": "metal"}]}"#,
    ];
    for case in cases {
        let raw: RawScene = serde_json::from_str(case).unwrap();
        assert!(
            matches!(Scene::from_raw(ontology(), &raw), Err(EvalError::MalformedScene(_))),
            "{case}"
        );
    }
}

#[test]
fn custom_vocabulary() {
    let ontology = Ontology::new(Vocabulary::clevr().with_values(Attribute::Shape, ["cone"])).shared();
    let scene = Scene::new(
        ontology,
        0,
        vec![SceneObject::new("red", "small", "cone", "metal")],
        RelationTable::new(),
    )
    .unwrap();
    assert_eq!(eval_ok(&scene, "(count (filter_shape scene cone))"), AnswerValue::Integer(1));
}

#[test]
fn gold_answers() {
    let scene = two_cylinders();
    let gold = AnswerValue::from_gold(&serde_json::json!("2"), &scene).unwrap();
    assert_eq!(gold, eval_ok(&scene, "(count scene)"));
    let gold = AnswerValue::from_gold(&serde_json::json!("no"), &scene).unwrap();
    assert_eq!(gold, eval_ok(&scene, "(exists (filter_shape scene cube))"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Validator
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn validator_accepts_correct_candidate() {
    let scene = two_cylinders();
    let label = clevros_parser::read("(query_material (unique (filter_size scene large)))").unwrap();
    let validator = AnswerValidator::new();
    assert!(validator.is_valid(&scene, &AnswerValue::String("rubber".into()), &label));
    assert!(!validator.is_valid(&scene, &AnswerValue::String("metal".into()), &label));
}

#[test]
fn validator_fallback_on_malformed_candidate() {
    let scene = two_cylinders();
    let label = clevros_parser::read("(count (frobnicate scene))").unwrap();
    assert!(!AnswerValidator::new().is_valid(&scene, &AnswerValue::Integer(2), &label));
}

#[test]
fn validator_truth_typed_label() {
    let scene = two_cylinders();
    let validator = AnswerValidator::new();
    let yes = clevros_parser::read("true:t").unwrap();
    let no = clevros_parser::read("false:t").unwrap();
    assert!(validator.is_valid(&scene, &AnswerValue::Boolean(true), &yes));
    assert!(!validator.is_valid(&scene, &AnswerValue::Boolean(false), &yes));
    assert!(validator.is_valid(&scene, &AnswerValue::Boolean(false), &no));

    // A truth-typed label that is not the constant `true` is taken as false
    // without being evaluated.
    let typed = clevros_parser::read("(exists:<<e,t>,t> scene:<e,t>)").unwrap();
    assert!(validator.is_valid(&scene, &AnswerValue::Boolean(false), &typed));
}

#[test]
fn validator_grade_evaluates_typed_programs() {
    let scene = two_cylinders();
    let validator = AnswerValidator::new();
    let program = |color: &str| {
        clevros_parser::read(&format!(
            "(exists:<<e,t>,t> (filter_color:<<e,t>,<pc,<e,t>>> scene:<e,t> {color}:pc))"
        ))
        .unwrap()
    };

    let red = validator.grade(&scene, &AnswerValue::Boolean(true), &program("red"));
    assert!(red.valid);
    assert_eq!(red.answer, Some(AnswerValue::Boolean(true)));

    let green = validator.grade(&scene, &AnswerValue::Boolean(true), &program("green"));
    assert!(!green.valid);
    assert_eq!(green.answer, Some(AnswerValue::Boolean(false)));

    // The same typed program through `check` is never evaluated.
    let shortcut = validator.check(&scene, &AnswerValue::Boolean(true), &program("red"));
    assert_eq!(shortcut.answer, Some(AnswerValue::Boolean(false)));
}

#[test]
fn validator_grade_reports_errors() {
    let scene = two_cylinders();
    let program = clevros_parser::read("(exists:<<e,t>,t> (frobnicate:<<e,t>,<e,t>> scene:<e,t>))").unwrap();
    let verdict = AnswerValidator::new().grade(&scene, &AnswerValue::Boolean(false), &program);
    assert!(!verdict.valid);
    assert!(matches!(verdict.error, Some(EvalError::UnknownOperator(_))));
}

#[test]
fn validator_step_limit() {
    let scene = busy_scene();
    let label = clevros_parser::read("(count (filter_size scene large))").unwrap();
    assert!(AnswerValidator::new().is_valid(&scene, &AnswerValue::Integer(3), &label));
    assert!(!AnswerValidator::with_step_limit(3).is_valid(&scene, &AnswerValue::Integer(3), &label));
}
