use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::NodeId,
    diagnostics::{Diagnostic, Diagnostics},
    menu::resolve::{Placement, Resolver},
    model::{MenuNode, NodeKind},
    source::ObjectGraph,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MenuTree {
    pub name: String,
    pub controls: Vec<Control>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Control {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The node this control was emitted for.
    pub source: NodeId,
    #[serde(flatten)]
    pub kind: ControlKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    Submenu {
        menu: MenuTree,
    },
    Toggle {
        parameter: String,
        /// Value written while the toggle is held; `None` means boolean on.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<u32>,
    },
    Continuous {
        parameter: String,
    },
    Button {
        parameter: String,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompiledMenu {
    pub root: MenuTree,
    /// Trees hosted under externally-owned submenu hosts, keyed by host.
    pub external: BTreeMap<NodeId, MenuTree>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MenuTree {
    /// Depth-first visit over every control, with its nesting depth.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(usize, &'a Control)) {
        fn go<'a>(tree: &'a MenuTree, depth: usize, f: &mut dyn FnMut(usize, &'a Control)) {
            for c in &tree.controls {
                f(depth, c);
                if let ControlKind::Submenu { menu } = &c.kind {
                    go(menu, depth + 1, f);
                }
            }
        }
        go(self, 0, &mut f);
    }

    pub fn find(&self, source: &NodeId) -> Option<&Control> {
        let mut found = None;
        self.walk(|_, c| {
            if found.is_none() && &c.source == source {
                found = Some(c);
            }
        });
        found
    }
}

/// Sibling order: declaration position, then index within the owning node.
type SortKey = (usize, usize);

#[derive(Clone, Debug)]
enum Pending {
    Submenu(NodeId),
    Toggle { parameter: String, value: Option<u32> },
    Continuous { parameter: String },
    Button { parameter: String },
}

#[derive(Clone, Debug)]
struct Entry {
    key: SortKey,
    name: String,
    icon: Option<String>,
    source: NodeId,
    pending: Pending,
}

#[derive(Default)]
struct Collected {
    /// Submenu host -> its parent host (`None` for the root).
    host_parents: BTreeMap<NodeId, Option<NodeId>>,
    external_hosts: Vec<NodeId>,
    children: BTreeMap<Option<NodeId>, Vec<Entry>>,
}

impl Collected {
    fn place(&mut self, placement: &Placement, node: &NodeId, entry: Entry, diags: &mut Diagnostics) {
        if let Placement::Orphaned { parent } = placement {
            diags.push(Diagnostic::InactiveParent {
                node: node.clone(),
                parent: parent.clone(),
            });
        }
        self.children
            .entry(placement.parent().cloned())
            .or_default()
            .push(entry);
    }

    fn host(&mut self, id: &NodeId, placement: &Placement) {
        match placement {
            Placement::External => {
                self.external_hosts.push(id.clone());
            }
            _ => {
                self.host_parents
                    .insert(id.clone(), placement.parent().cloned());
            }
        }
    }
}

/// Build the control tree for every participating node.
///
/// `animated` names the changers that produced an animation; a smooth or
/// costume changer without one has nothing to drive and gets no control.
#[tracing::instrument(skip_all, fields(root = %root_name))]
pub fn build_menu(
    graph: &dyn ObjectGraph,
    animated: &BTreeSet<NodeId>,
    root_name: &str,
) -> CompiledMenu {
    let resolver = Resolver::new(graph);
    let mut diags = Diagnostics::new();
    let mut collected = Collected::default();

    let nodes = graph.nodes();
    for node in &nodes {
        collect_node(graph, &resolver, animated, node, &mut collected, &mut diags);
    }

    let cyclic = find_cycles(graph, &collected.host_parents, &mut diags);
    for entries in collected.children.values_mut() {
        entries.retain(|e| !matches!(&e.pending, Pending::Submenu(h) if cyclic.contains(h)));
        entries.sort_by_key(|e| e.key);
    }
    for host in &cyclic {
        collected.children.remove(&Some(host.clone()));
    }

    let names: BTreeMap<&NodeId, &str> = nodes.iter().map(|n| (&n.id, n.name.as_str())).collect();
    let root = assemble(root_name, None, &collected.children);
    let external = collected
        .external_hosts
        .iter()
        .map(|h| {
            let name = names.get(h).copied().unwrap_or(h.as_str());
            (h.clone(), assemble(name, Some(h), &collected.children))
        })
        .collect();

    tracing::debug!(
        controls = root.controls.len(),
        external = collected.external_hosts.len(),
        "menu built"
    );

    CompiledMenu {
        root,
        external,
        diagnostics: diags.into_vec(),
    }
}

fn sort_key(graph: &dyn ObjectGraph, node: &MenuNode, sub: usize) -> SortKey {
    (graph.position(&node.id).unwrap_or(usize::MAX), sub)
}

fn collect_node(
    graph: &dyn ObjectGraph,
    resolver: &Resolver<'_>,
    animated: &BTreeSet<NodeId>,
    node: &MenuNode,
    out: &mut Collected,
    diags: &mut Diagnostics,
) {
    let placement = resolver.resolve(node);
    let parameter = node.parameter_name().unwrap_or(node.name.as_str()).to_string();
    let entry = |sub: usize, pending: Pending| Entry {
        key: sort_key(graph, node, sub),
        name: node.name.clone(),
        icon: node.icon.clone(),
        source: node.id.clone(),
        pending,
    };

    let pending = match &node.kind {
        NodeKind::Folder => {
            out.host(&node.id, &placement);
            Pending::Submenu(node.id.clone())
        }
        NodeKind::Toggler(_) => Pending::Toggle {
            parameter,
            value: None,
        },
        NodeKind::SmoothChanger(_) => {
            if !animated.contains(&node.id) {
                tracing::debug!(node = %node.id, "smooth changer has no animation, skipped");
                return;
            }
            Pending::Continuous { parameter }
        }
        NodeKind::Preset(_) => Pending::Button { parameter },
        NodeKind::CostumeChanger(changer) => {
            if !animated.contains(&node.id) {
                tracing::debug!(node = %node.id, "costume changer has no animation, skipped");
                return;
            }
            for (i, costume) in changer.costumes.iter().enumerate() {
                let costume_placement = resolver.resolve_costume(node, costume);
                if costume_placement == Placement::External {
                    continue;
                }
                let e = Entry {
                    key: sort_key(graph, node, i + 1),
                    name: costume.name.clone(),
                    icon: costume.icon.clone(),
                    source: node.id.clone(),
                    pending: Pending::Toggle {
                        parameter: parameter.clone(),
                        value: Some(i as u32),
                    },
                };
                out.place(&costume_placement, &node.id, e, diags);
            }
            let hosts_costumes = changer
                .costumes
                .iter()
                .any(|c| !c.external && c.parent.is_none());
            if !hosts_costumes {
                return;
            }
            out.host(&node.id, &placement);
            Pending::Submenu(node.id.clone())
        }
    };

    if placement != Placement::External {
        out.place(&placement, &node.id, entry(0, pending), diags);
    }
}

/// Report every loop in the host -> parent relation once, members in
/// declaration order, and return the hosts that sit on a loop.
fn find_cycles(
    graph: &dyn ObjectGraph,
    host_parents: &BTreeMap<NodeId, Option<NodeId>>,
    diags: &mut Diagnostics,
) -> BTreeSet<NodeId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Open,
        Done,
    }

    let mut order: Vec<&NodeId> = host_parents.keys().collect();
    order.sort_by_key(|id| graph.position(id).unwrap_or(usize::MAX));

    let mut marks: BTreeMap<&NodeId, Mark> = BTreeMap::new();
    let mut cyclic = BTreeSet::new();
    for start in order {
        let mut path: Vec<&NodeId> = Vec::new();
        let mut cur = Some(start);
        while let Some(id) = cur {
            match marks.get(id) {
                Some(Mark::Done) => break,
                Some(Mark::Open) => {
                    let at = path.iter().position(|p| *p == id).unwrap_or(0);
                    let mut members: Vec<NodeId> = path[at..].iter().map(|n| (*n).clone()).collect();
                    members.sort_by_key(|n| graph.position(n).unwrap_or(usize::MAX));
                    cyclic.extend(members.iter().cloned());
                    diags.push(Diagnostic::CircularReference { nodes: members });
                    break;
                }
                None => {}
            }
            marks.insert(id, Mark::Open);
            path.push(id);
            cur = host_parents.get(id).and_then(|p| p.as_ref());
            if cur.is_some_and(|p| !host_parents.contains_key(p)) {
                cur = None;
            }
        }
        for id in path {
            marks.insert(id, Mark::Done);
        }
    }
    cyclic
}

fn assemble(
    name: &str,
    host: Option<&NodeId>,
    children: &BTreeMap<Option<NodeId>, Vec<Entry>>,
) -> MenuTree {
    let controls = children
        .get(&host.cloned())
        .map(|entries| {
            entries
                .iter()
                .map(|e| Control {
                    name: e.name.clone(),
                    icon: e.icon.clone(),
                    source: e.source.clone(),
                    kind: match &e.pending {
                        Pending::Submenu(h) => ControlKind::Submenu {
                            menu: assemble(&e.name, Some(h), children),
                        },
                        Pending::Toggle { parameter, value } => ControlKind::Toggle {
                            parameter: parameter.clone(),
                            value: *value,
                        },
                        Pending::Continuous { parameter } => ControlKind::Continuous {
                            parameter: parameter.clone(),
                        },
                        Pending::Button { parameter } => ControlKind::Button {
                            parameter: parameter.clone(),
                        },
                    },
                })
                .collect()
        })
        .unwrap_or_default();
    MenuTree {
        name: name.to_string(),
        controls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsl::{ProjectBuilder, costume, costume_changer, folder, smooth_changer, toggler},
        model::Project,
    };

    fn build(project: &Project) -> CompiledMenu {
        let index = project.index().unwrap();
        let animated = project
            .nodes
            .iter()
            .filter(|n| {
                matches!(
                    n.kind,
                    NodeKind::SmoothChanger(_) | NodeKind::CostumeChanger(_)
                )
            })
            .map(|n| n.id.clone())
            .collect();
        build_menu(&index, &animated, "Root")
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

    fn outfit() -> Project {
        ProjectBuilder::new("avatar")
            .object("root", None)
            .object("outfit", Some("root"))
            .object("shirt", Some("outfit"))
            .object("hat", Some("outfit"))
            .node(folder("Outfit", "outfit"))
            .node(toggler("Shirt", "shirt"))
            .node(toggler("Hat", "hat"))
            .build()
            .unwrap()
    }

    #[test]
    fn hierarchy_groups_toggles_under_folder() {
        let menu = build(&outfit());
        assert!(menu.diagnostics.is_empty());
        assert_eq!(names(&menu.root), vec!["Outfit"]);
        let sub = submenu(&menu.root, "Outfit");
        assert_eq!(names(sub), vec!["Shirt", "Hat"]);
        assert!(matches!(
            &sub.controls[0].kind,
            ControlKind::Toggle { parameter, value: None } if parameter == "Shirt"
        ));
    }

    #[test]
    fn siblings_follow_declaration_order() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(toggler("C", "root"))
            .node(toggler("A", "root"))
            .node(toggler("B", "root"))
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(names(&menu.root), vec!["C", "A", "B"]);
    }

    #[test]
    fn three_node_cycle_is_reported_once_and_pruned() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("A", "root").parent("C"))
            .node(folder("B", "root").parent("A"))
            .node(folder("C", "root").parent("B"))
            .node(toggler("Inside", "root").parent("B"))
            .node(toggler("Outside", "root"))
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(
            menu.diagnostics,
            vec![Diagnostic::CircularReference {
                nodes: vec!["A".into(), "B".into(), "C".into()]
            }]
        );
        assert_eq!(names(&menu.root), vec!["Outside"]);
        assert!(menu.root.find(&"Inside".into()).is_none());
    }

    #[test]
    fn tree_below_a_cycle_is_dropped_but_siblings_survive() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("A", "root").parent("B"))
            .node(folder("B", "root").parent("A"))
            .node(folder("Hanging", "root").parent("A"))
            .node(toggler("Deep", "root").parent("Hanging"))
            .node(folder("Fine", "root"))
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(menu.diagnostics.len(), 1);
        assert_eq!(names(&menu.root), vec!["Fine"]);
    }

    #[test]
    fn self_parented_folder_is_a_cycle() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Loop", "root").parent("Loop"))
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(
            menu.diagnostics,
            vec![Diagnostic::CircularReference {
                nodes: vec!["Loop".into()]
            }]
        );
        assert!(menu.root.controls.is_empty());
    }

    #[test]
    fn inactive_parent_falls_back_to_root() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Hidden", "root").disabled())
            .node(toggler("Shirt", "root").parent("Hidden"))
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(names(&menu.root), vec!["Shirt"]);
        assert_eq!(
            menu.diagnostics,
            vec![Diagnostic::InactiveParent {
                node: "Shirt".into(),
                parent: "Hidden".into()
            }]
        );
    }

    #[test]
    fn external_host_gets_its_own_tree() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("kit", Some("root"))
            .node(folder("Kit", "kit").external())
            .node(toggler("Part", "kit").parent("Kit"))
            .node(toggler("Loose", "root").external())
            .build()
            .unwrap();
        let menu = build(&project);
        assert!(menu.root.controls.is_empty());
        let kit = &menu.external[&NodeId::from("Kit")];
        assert_eq!(kit.name, "Kit");
        assert_eq!(names(kit), vec!["Part"]);
        assert!(menu.root.find(&"Loose".into()).is_none());
    }

    #[test]
    fn costume_changer_hosts_its_costumes() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Looks", "root"))
            .node(
                costume_changer("Wardrobe", "root")
                    .costume(costume("Casual"))
                    .costume(costume("Formal"))
                    .costume(costume("Party").parent("Looks")),
            )
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(names(&menu.root), vec!["Looks", "Wardrobe"]);
        let wardrobe = submenu(&menu.root, "Wardrobe");
        assert_eq!(names(wardrobe), vec!["Casual", "Formal"]);
        assert!(matches!(
            &wardrobe.controls[1].kind,
            ControlKind::Toggle { parameter, value: Some(1) } if parameter == "Wardrobe"
        ));
        let looks = submenu(&menu.root, "Looks");
        assert!(matches!(
            &looks.controls[0].kind,
            ControlKind::Toggle { value: Some(2), .. }
        ));
    }

    #[test]
    fn costume_changer_without_local_costumes_has_no_submenu() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Looks", "root"))
            .node(
                costume_changer("Wardrobe", "root")
                    .costume(costume("Casual").parent("Looks"))
                    .costume(costume("Hidden").external()),
            )
            .build()
            .unwrap();
        let menu = build(&project);
        assert_eq!(names(&menu.root), vec!["Looks"]);
        assert_eq!(names(submenu(&menu.root, "Looks")), vec!["Casual"]);
    }

    #[test]
    fn costume_changer_without_animation_is_skipped() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Looks", "root"))
            .node(
                costume_changer("Wardrobe", "root")
                    .costume(costume("Casual"))
                    .costume(costume("Party").parent("Looks")),
            )
            .build()
            .unwrap();
        let index = project.index().unwrap();
        let menu = build_menu(&index, &BTreeSet::new(), "Root");
        assert_eq!(names(&menu.root), vec!["Looks"]);
        assert!(submenu(&menu.root, "Looks").controls.is_empty());
    }

    #[test]
    fn smooth_changer_without_animation_is_skipped() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(smooth_changer("Mood", "root"))
            .build()
            .unwrap();
        let index = project.index().unwrap();
        let menu = build_menu(&index, &BTreeSet::new(), "Root");
        assert!(menu.root.controls.is_empty());
        let menu = build(&project);
        assert!(matches!(
            &menu.root.controls[0].kind,
            ControlKind::Continuous { parameter } if parameter == "Mood"
        ));
    }

    #[test]
    fn permuting_unrelated_declarations_keeps_sibling_order() {
        let a = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("x", Some("root"))
            .node(folder("X", "x"))
            .node(toggler("One", "x"))
            .node(toggler("Two", "x"))
            .node(toggler("Free", "root"))
            .build()
            .unwrap();
        let b = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("x", Some("root"))
            .node(toggler("Free", "root"))
            .node(folder("X", "x"))
            .node(toggler("One", "x"))
            .node(toggler("Two", "x"))
            .build()
            .unwrap();
        let ma = build(&a);
        let mb = build(&b);
        assert_eq!(names(submenu(&ma.root, "X")), names(submenu(&mb.root, "X")));
        assert_eq!(names(submenu(&ma.root, "X")), vec!["One", "Two"]);
    }

    #[test]
    fn depth_matches_authoring_depth() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("l1", Some("root"))
            .object("l2", Some("l1"))
            .object("l3", Some("l2"))
            .node(folder("L1", "l1"))
            .node(folder("L2", "l2"))
            .node(toggler("Leaf", "l3"))
            .build()
            .unwrap();
        let menu = build(&project);
        let mut depths = BTreeMap::new();
        menu.root.walk(|d, c| {
            depths.insert(c.name.clone(), d);
        });
        assert_eq!(depths["L1"], 0);
        assert_eq!(depths["L2"], 1);
        assert_eq!(depths["Leaf"], 2);
    }

    #[test]
    fn compiled_menu_serializes_flat_controls() {
        let menu = build(&outfit());
        let json = serde_json::to_value(&menu).unwrap();
        let outfit = &json["root"]["controls"][0];
        assert_eq!(outfit["type"], "submenu");
        assert_eq!(outfit["menu"]["controls"][1]["name"], "Hat");
        assert_eq!(outfit["menu"]["controls"][1]["parameter"], "Hat");
    }
}
