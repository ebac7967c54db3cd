//! CIM RDF/XML emission for a resolved equipment hierarchy.
//!
//! Containers become `cim:AssetContainer`, leaves become `me:GenericPSR`.  Each
//! element links to its parent twice (the generic `ParentObject` link plus the
//! category specific asset link) and containers list their children.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use crate::config::{ModelConfig, RootParent};
use crate::errors::{ConvertError, Result};
use crate::hierarchy::ResolvedHierarchy;
use crate::output::{generate_formatted, xml_escape, F};
use crate::tree::{Category, IdMinter, NodeTree, ParentRef, TreeNode};

impl Category {
    pub fn element(self) -> &'static str {
        match self {
            Category::Container => "cim:AssetContainer",
            Category::Leaf => "me:GenericPSR",
        }
    }

    /// The second, category specific, link to the parent.
    fn parent_link(self) -> &'static str {
        match self {
            Category::Container => "cim:Asset.AssetContainer",
            Category::Leaf => "cim:PowerSystemResource.Assets",
        }
    }

    fn inventory_code_field(self) -> &'static str {
        match self {
            Category::Container => "me:IdentifiedObject.mRIDStr",
            Category::Leaf => "rh:PowerSystemResource.ccsCode",
        }
    }
}

/// `rdf:resource` value for an object that exists outside this document.
pub fn external_resource(uid: &str) -> String {
    format!("#_{}", uid)
}

fn parent_resource(tree: &NodeTree, node: &TreeNode, root_parent: &RootParent) -> String {
    match node.parent {
        ParentRef::RootParent => root_parent.as_resource().to_string(),
        ParentRef::External(ref uid) => external_resource(uid),
        ParentRef::Node(parent) => tree.nodes[parent].id.clone(),
    }
}

fn resource_link(property: &str, resource: &str) -> F {
    F::T(format!(
        r#"<{} rdf:resource="{}" />"#,
        property,
        xml_escape(resource)
    ))
}

fn node_element(tree: &NodeTree, node: &TreeNode, root_parent: &RootParent) -> F {
    let category = node.category;
    let parent = parent_resource(tree, node, root_parent);

    let mut body = vec![
        F::T(format!(
            "<cim:IdentifiedObject.name>{}</cim:IdentifiedObject.name>",
            xml_escape(node.path.name())
        )),
        resource_link("me:IdentifiedObject.ParentObject", &parent),
        resource_link(category.parent_link(), &parent),
    ];

    if let Some(code) = &node.inventory_code {
        let field = category.inventory_code_field();
        body.push(F::T(format!("<{0}>{1}</{0}>", field, xml_escape(code))));
    }

    if category == Category::Container {
        for &child in &node.children {
            body.push(resource_link(
                "me:IdentifiedObject.ChildObjects",
                &tree.nodes[child].id,
            ));
        }
        for uid in &node.external_children {
            body.push(resource_link(
                "me:IdentifiedObject.ChildObjects",
                &external_resource(uid),
            ));
        }
    }

    F::Seq(vec![
        F::T(format!(
            r#"<{} rdf:about="{}">"#,
            category.element(),
            xml_escape(&node.id)
        )),
        F::Indent(body),
        F::T(format!("</{}>", category.element())),
    ])
}

/// Breadth-first over every node.  All nodes start out queued so that nodes
/// unreachable through child edges are still emitted, and the visited set keeps
/// every node to exactly one element.
fn traverse(tree: &NodeTree, root_parent: &RootParent) -> Vec<F> {
    let mut queue: VecDeque<usize> = (0..tree.len()).collect();
    let mut visited = HashSet::with_capacity(tree.len());
    let mut elements = Vec::with_capacity(tree.len());

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        let node = &tree.nodes[current];
        elements.push(node_element(tree, node, root_parent));
        if node.category == Category::Container {
            queue.extend(node.children.iter().filter(|c| !visited.contains(*c)));
        }
    }

    elements
}

fn full_model(model: &ModelConfig) -> F {
    F::Seq(vec![
        F::T(format!(
            r#"<md:FullModel rdf:about="{}">"#,
            xml_escape(&external_resource(&model.model_id))
        )),
        F::Indent(vec![
            F::T(format!(
                "<md:Model.created>{}</md:Model.created>",
                xml_escape(&model.created())
            )),
            F::T(format!(
                "<md:Model.version>{}</md:Model.version>",
                xml_escape(&model.model_version)
            )),
            F::T(format!(
                "<me:Model.name>{}</me:Model.name>",
                xml_escape(&model.model_name)
            )),
        ]),
        F::S("</md:FullModel>"),
    ])
}

/// Render an already built tree into a complete document.
pub fn render_document(
    tree: &NodeTree,
    root_parent: &RootParent,
    model: &ModelConfig,
) -> Result<String> {
    let rdf_open = model
        .namespaces
        .iter()
        .fold("<rdf:RDF".to_string(), |mut acc, (prefix, uri)| {
            acc.push_str(&format!(r#" xmlns:{}="{}""#, prefix, xml_escape(uri)));
            acc
        });

    let mut top = vec![full_model(model)];
    top.extend(traverse(tree, root_parent));

    let document = F::Seq(vec![
        F::S(r#"<?xml version="1.0" encoding="utf-8"?>"#),
        F::S(r#"<?iec61970-552 version="2.0"?>"#),
        F::S("<?floatExporter 1?>"),
        F::T(format!("{}>", rdf_open)),
        F::Indent(top),
        F::S("</rdf:RDF>"),
    ]);

    let mut out = Vec::new();
    generate_formatted(&mut out, &document, 0)?;
    String::from_utf8(out).map_err(|err| ConvertError::Generation(err.to_string()))
}

/// Build a fresh node tree (minting new identifiers) and render it.
pub fn generate(
    resolved: &ResolvedHierarchy,
    root_parent: &RootParent,
    model: &ModelConfig,
    minter: &mut dyn IdMinter,
) -> Result<String> {
    info!(paths = resolved.paths_to_create.len(), "generating RDF/XML");
    let tree = NodeTree::build(resolved, minter)?;
    debug!(
        containers = tree
            .nodes
            .iter()
            .filter(|n| n.category == Category::Container)
            .count(),
        nodes = tree.len(),
        "node tree built"
    );
    let document = render_document(&tree, root_parent, model)?;
    info!(bytes = document.len(), "RDF/XML generation finished");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quick_xml::events::{BytesStart, Event};
    use quick_xml::Reader;

    use super::*;
    use crate::hierarchy::{resolve, AttachmentPolicy, HierarchyOptions, Record};
    use crate::tree::UuidMinter;

    fn resolved(rows: &[(&str, &str, &str)], policy: AttachmentPolicy) -> ResolvedHierarchy {
        let records: Vec<_> = rows
            .iter()
            .map(|(path, uid, code)| Record::new(path, Some(*uid), Some(*code)))
            .collect();
        resolve(
            &records,
            &HierarchyOptions {
                policy,
                ..HierarchyOptions::default()
            },
        )
    }

    fn model() -> ModelConfig {
        ModelConfig {
            model_created: "2024-05-01T10:00:00Z".to_string(),
            ..ModelConfig::default()
        }
    }

    fn root() -> RootParent {
        RootParent::new("_root").unwrap()
    }

    /// One element's worth of structure, with ids replaced by element names so
    /// two generations can be compared.
    #[derive(Debug, PartialEq, Eq)]
    struct Shape {
        element: String,
        name: String,
        parent: String,
        children: Vec<String>,
        code: Option<String>,
    }

    #[derive(Default)]
    struct RawShape {
        element: String,
        about: String,
        name: String,
        parent: String,
        children: Vec<String>,
        code: Option<String>,
    }

    fn qname(e: &BytesStart) -> String {
        String::from_utf8_lossy(e.name().as_ref()).into_owned()
    }

    fn attr(e: &BytesStart, key: &str) -> String {
        e.attributes()
            .flatten()
            .find(|a| a.key.as_ref() == key.as_bytes())
            .map(|a| a.unescape_value().unwrap().into_owned())
            .unwrap_or_else(|| panic!("{} has no {}", qname(e), key))
    }

    fn shapes(xml: &str) -> Vec<Shape> {
        let mut reader = Reader::from_str(xml);
        let mut raw = Vec::new();
        let mut current: Option<RawShape> = None;
        let mut field: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = qname(&e);
                    if name == "cim:AssetContainer" || name == "me:GenericPSR" {
                        current = Some(RawShape {
                            about: attr(&e, "rdf:about"),
                            element: name,
                            ..RawShape::default()
                        });
                    } else if current.is_some() {
                        field = Some(name);
                    }
                }
                Ok(Event::Empty(e)) => {
                    if let Some(shape) = current.as_mut() {
                        match qname(&e).as_str() {
                            "me:IdentifiedObject.ParentObject" => {
                                shape.parent = attr(&e, "rdf:resource")
                            }
                            "me:IdentifiedObject.ChildObjects" => {
                                shape.children.push(attr(&e, "rdf:resource"))
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(shape), Some(field)) = (current.as_mut(), field.as_deref()) {
                        let text = t.unescape().unwrap().into_owned();
                        match field {
                            "cim:IdentifiedObject.name" => shape.name = text,
                            "me:IdentifiedObject.mRIDStr" | "rh:PowerSystemResource.ccsCode" => {
                                shape.code = Some(text)
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    field = None;
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if current.as_ref().map_or(false, |shape| shape.element == name) {
                        raw.extend(current.take());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("unparseable output at {}: {}", reader.buffer_position(), err),
            }
        }

        let names: HashMap<String, String> = raw
            .iter()
            .map(|s| (s.about.clone(), s.name.clone()))
            .collect();
        let name_of = |id: &String| names.get(id).cloned().unwrap_or_else(|| id.clone());
        raw.into_iter()
            .map(|s| Shape {
                element: s.element,
                name: s.name,
                parent: name_of(&s.parent),
                children: s.children.iter().map(name_of).collect(),
                code: s.code,
            })
            .collect()
    }

    fn sample() -> ResolvedHierarchy {
        resolved(
            &[
                (r"Net\", "", ""),
                (r"Net\Buildings", "", "KKS-B"),
                (r"Net\Buildings\Substation", "12CC9FCB", "KKS-001"),
                (r"Net\Buildings\Substation\Cell", "", "KKS-C"),
                (r"Net\Yard\Bay", "", ""),
            ],
            AttachmentPolicy::VirtualContainer,
        )
    }

    #[test]
    fn test_structure() {
        let xml = generate(&sample(), &root(), &model(), &mut UuidMinter).unwrap();
        let shapes = shapes(&xml);
        let expected = vec![
            Shape {
                element: "cim:AssetContainer".to_string(),
                name: "Net".to_string(),
                parent: "#_root".to_string(),
                children: vec!["Buildings".to_string(), "Yard".to_string()],
                code: None,
            },
            Shape {
                element: "cim:AssetContainer".to_string(),
                name: "Buildings".to_string(),
                parent: "Net".to_string(),
                children: vec!["#_12CC9FCB".to_string()],
                code: Some("KKS-B".to_string()),
            },
            Shape {
                element: "me:GenericPSR".to_string(),
                name: "Cell".to_string(),
                parent: "#_12CC9FCB".to_string(),
                children: vec![],
                code: Some("KKS-C".to_string()),
            },
            Shape {
                element: "cim:AssetContainer".to_string(),
                name: "Yard".to_string(),
                parent: "Net".to_string(),
                children: vec!["Bay".to_string()],
                code: None,
            },
            Shape {
                element: "me:GenericPSR".to_string(),
                name: "Bay".to_string(),
                parent: "Yard".to_string(),
                children: vec![],
                code: None,
            },
        ];
        assert_eq!(shapes, expected);
        assert!(xml.contains("<rh:PowerSystemResource.ccsCode>KKS-C</rh:PowerSystemResource.ccsCode>"));
        assert!(xml.contains("<me:IdentifiedObject.mRIDStr>KKS-B</me:IdentifiedObject.mRIDStr>"));
        assert!(!xml.contains("KKS-001"));
    }

    #[test]
    fn test_structure_is_idempotent() {
        let resolved = sample();
        let first = generate(&resolved, &root(), &model(), &mut UuidMinter).unwrap();
        let second = generate(&resolved, &root(), &model(), &mut UuidMinter).unwrap();
        assert_ne!(first, second);
        assert_eq!(shapes(&first), shapes(&second));
    }

    #[test]
    fn test_every_path_emitted_once() {
        let resolved = sample();
        let xml = generate(&resolved, &root(), &model(), &mut UuidMinter).unwrap();
        let opening = xml
            .lines()
            .filter(|l| l.contains(" rdf:about=") && !l.contains("md:FullModel"))
            .count();
        let closing = xml
            .lines()
            .map(str::trim)
            .filter(|l| *l == "</cim:AssetContainer>" || *l == "</me:GenericPSR>")
            .count();
        assert_eq!(opening, resolved.paths_to_create.len());
        assert_eq!(closing, resolved.paths_to_create.len());
        let names: Vec<_> = shapes(&xml).into_iter().map(|s| s.name).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_framing() {
        let xml = generate(&sample(), &root(), &model(), &mut UuidMinter).unwrap();
        let lines: Vec<_> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="utf-8"?>"#);
        assert_eq!(lines[1], r#"<?iec61970-552 version="2.0"?>"#);
        assert_eq!(lines[2], "<?floatExporter 1?>");
        assert!(lines[3].starts_with("<rdf:RDF xmlns:cim="));
        assert!(lines[3].contains(r#"xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#""#));
        assert_eq!(
            lines[4],
            r##"  <md:FullModel rdf:about="#_00000000-0000-0000-0000-000000000000">"##
        );
        assert_eq!(lines[5], "    <md:Model.created>2024-05-01T10:00:00Z</md:Model.created>");
        assert_eq!(lines[6], "    <md:Model.version>1.0</md:Model.version>");
        assert_eq!(lines[7], "    <me:Model.name>Equipment hierarchy</me:Model.name>");
        assert_eq!(lines[8], "  </md:FullModel>");
        assert_eq!(*lines.last().unwrap(), "</rdf:RDF>");
    }

    #[test]
    fn test_external_child_policy_lists_uids() {
        let resolved = resolved(
            &[(r"A\B", "uid-b", ""), (r"A\B\C", "", ""), (r"A\D", "", "")],
            AttachmentPolicy::ExternalChild,
        );
        let xml = generate(&resolved, &root(), &model(), &mut UuidMinter).unwrap();
        let shapes = shapes(&xml);
        assert_eq!(shapes[0].name, "A");
        assert_eq!(shapes[0].children, vec!["D".to_string(), "#_uid-b".to_string()]);
        let c = shapes.iter().find(|s| s.name == "C").unwrap();
        assert_eq!(c.parent, "#_root");
    }

    #[test]
    fn test_names_are_escaped() {
        let resolved = resolved(
            &[(r#"Plant\Substation "North" & Co"#, "", "")],
            AttachmentPolicy::VirtualContainer,
        );
        let xml = generate(&resolved, &root(), &model(), &mut UuidMinter).unwrap();
        assert!(xml.contains(
            "<cim:IdentifiedObject.name>Substation &quot;North&quot; &amp; Co</cim:IdentifiedObject.name>"
        ));
        let names: Vec<_> = shapes(&xml).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Plant", r#"Substation "North" & Co"#]);
    }

    #[test]
    fn test_empty_hierarchy_is_an_error() {
        let resolved = resolved(&[], AttachmentPolicy::VirtualContainer);
        assert!(matches!(
            generate(&resolved, &root(), &model(), &mut UuidMinter),
            Err(ConvertError::EmptyInput)
        ));
    }
}
