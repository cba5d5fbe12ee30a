use std::path::PathBuf;

use menuclip::{
    AnimationArtifact, CompileSettings, ControlKind, MenuTree, ParameterKind, Project, PropertyId,
    Value, compile,
};

fn fixture() -> Project {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/outfit_project.json");
    let s = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&s).unwrap()
}

fn names(tree: &MenuTree) -> Vec<&str> {
    tree.controls.iter().map(|c| c.name.as_str()).collect()
}

fn submenu<'a>(tree: &'a MenuTree, name: &str) -> &'a MenuTree {
    match &tree.controls.iter().find(|c| c.name == name).unwrap().kind {
        ControlKind::Submenu { menu } => menu,
        other => panic!("expected submenu, got {other:?}"),
    }
}

fn smile() -> PropertyId {
    PropertyId::blend_shape("Body", "smile")
}

fn frown() -> PropertyId {
    PropertyId::blend_shape("Body", "frown")
}

#[test]
fn fixture_validates() {
    let project = fixture();
    project.validate().unwrap();
    assert_eq!(project.nodes.len(), 7);
}

#[test]
fn fixture_menu_layout() {
    let out = compile(&fixture(), &CompileSettings::default()).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let root = &out.menu.root;
    assert_eq!(names(root), vec!["Outfit", "Mood", "Wardrobe", "Wave"]);
    assert_eq!(root.controls[0].icon.as_deref(), Some("icons/outfit.png"));
    assert_eq!(names(submenu(root, "Outfit")), vec!["Shirt", "Hat"]);

    let wardrobe = submenu(root, "Wardrobe");
    assert_eq!(names(wardrobe), vec!["Red", "Blue"]);
    assert!(matches!(
        &wardrobe.controls[1].kind,
        ControlKind::Toggle { parameter, value: Some(1) } if parameter == "Look"
    ));
    assert!(matches!(root.controls[1].kind, ControlKind::Continuous { .. }));
    assert!(matches!(root.controls[3].kind, ControlKind::Button { .. }));

    // Nodes on editor-only objects never reach the output.
    assert!(root.find(&"Debug".into()).is_none());
    assert!(out.parameter("Debug").is_none());
}

#[test]
fn fixture_parameters() {
    let out = compile(&fixture(), &CompileSettings::default()).unwrap();
    let names: Vec<_> = out.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Shirt", "Hat", "Mood", "Look", "Wave"]);

    let shirt = out.parameter("Shirt").unwrap();
    assert_eq!(shirt.kind, ParameterKind::Bool);
    assert_eq!(shirt.default, 1.0);
    assert!(out.parameter("Hat").unwrap().local_only);
    assert_eq!(out.parameter("Mood").unwrap().default, 0.5);
    let look = out.parameter("Look").unwrap();
    assert_eq!(look.kind, ParameterKind::Int);
    assert_eq!(look.default, 1.0);
}

#[test]
fn fixture_mood_blends_between_keyframes() {
    let out = compile(&fixture(), &CompileSettings::default()).unwrap();
    let mood = out.animation(&"Mood".into()).unwrap();
    assert!(matches!(mood.artifact, AnimationArtifact::BlendGraph(_)));

    let at = |v: f64| mood.sample(v);
    assert_eq!(at(0.0)[&frown()], Value::Float(100.0));
    assert_eq!(at(0.0)[&smile()], Value::Float(0.0));
    assert_eq!(at(0.25)[&frown()], Value::Float(50.0));
    assert_eq!(at(0.5)[&frown()], Value::Float(0.0));
    assert_eq!(at(0.75)[&smile()], Value::Float(50.0));
    assert_eq!(at(1.0)[&smile()], Value::Float(100.0));
}

#[test]
fn fixture_toggles_and_costumes_sample() {
    let out = compile(&fixture(), &CompileSettings::default()).unwrap();

    let shirt = out.animation(&"Shirt".into()).unwrap();
    let active = PropertyId::active("Shirt");
    assert_eq!(shirt.sample(0.0)[&active], Value::Bool(true));
    assert_eq!(shirt.sample(1.0)[&active], Value::Bool(false));

    let look = out.animation(&"Wardrobe".into()).unwrap();
    let color = PropertyId::new("Body", menuclip::PropertyKind::MaterialVector, "_Color");
    assert_eq!(look.sample(0.0)[&color], Value::Vector4([1.0, 0.0, 0.0, 1.0]));
    assert_eq!(look.sample(1.0)[&color], Value::Vector4([0.0, 0.0, 1.0, 1.0]));
    let AnimationArtifact::LayeredAutomaton(layer) = &look.artifact else {
        panic!("expected automaton");
    };
    assert_eq!(layer.default_state, 1);
    assert_eq!(layer.states[1].name, "Blue");
}

#[test]
fn output_serializes_to_json() {
    let out = compile(&fixture(), &CompileSettings::default()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["project"], "avatar");
    assert_eq!(json["menu"]["root"]["name"], "Root");
    assert_eq!(json["menu"]["root"]["controls"][0]["type"], "submenu");
    assert_eq!(json["animations"][2]["artifact"]["type"], "BlendGraph");
    assert_eq!(json["parameters"][3]["kind"], "Int");
}
