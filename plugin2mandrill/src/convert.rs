//! The structural walk from plugin XML to Mandrill definitions.
//!
//! [`Context::convert_document`] drives a post-order walk over the plugin
//! tree: children are rendered before their container's body can be interned,
//! so structurally identical containers collapse to a single [`Definition`]
//! no matter where they appear.

use fxhash::FxHashMap;
use roxmltree::{Document, Node};

use crate::field::{self, FieldKind};
use crate::reporting::Message;
use crate::FileId;

/// Tag group token prefixed to every generated definition name.
pub const TAG_GROUP: &str = "chdt";

/// Maximum element nesting depth the walker will follow.
pub const MAX_WALK_DEPTH: usize = 64;

/// One emitted, named, reusable structural unit: a tag block, or the string
/// list backing an enum or flag set.
#[derive(Debug, Clone)]
pub struct Definition {
    kind: FieldKind,
    name: String,
    body: String,
}

impl Definition {
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The definition's resolved name, unique within one conversion run.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rendered field lines of the definition's children, one per line,
    /// each carrying a single leading tab.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Opening wrapper text, determined by the classification alone.
    pub fn prefix(&self) -> String {
        if self.kind == FieldKind::Block {
            format!("TAG_BLOCK({}, 65536)\n{{\n", self.name)
        } else {
            format!("STRINGS({})\n{{\n", self.name)
        }
    }

    /// Closing wrapper text. String lists restate their element count.
    pub fn postfix(&self) -> String {
        if self.kind == FieldKind::Block {
            "\t{ _field_terminator }\n};\n".to_owned()
        } else {
            format!(
                "}};\nSTRING_LIST({name}, {name}_strings, _countof({name}_strings));\n",
                name = self.name,
            )
        }
    }
}

/// A finished conversion: every interned definition in first-registration
/// order, plus the synthetic root block. The root block aggregates the
/// plugin's direct children and never participates in deduplication or name
/// resolution.
#[derive(Debug)]
pub struct Module {
    pub definitions: Vec<Definition>,
    pub root: Definition,
}

/// Run-scoped conversion state: the definition registry keyed by rendered
/// body content, and the usage count for every candidate name handed out.
pub struct Context {
    file_id: FileId,
    definitions: Vec<Definition>,
    bodies: FxHashMap<String, usize>,
    name_counts: FxHashMap<String, u32>,
}

impl Context {
    pub fn new(file_id: FileId) -> Context {
        Context {
            file_id,
            definitions: Vec::new(),
            bodies: FxHashMap::default(),
            name_counts: FxHashMap::default(),
        }
    }

    /// Convert the document's `plugin` element into a [`Module`].
    ///
    /// Non-fatal findings are reported through `on_message`; whether a
    /// message is fatal to the run is decided by its severity, not here.
    pub fn convert_document(
        mut self,
        document: &Document<'_>,
        on_message: &mut dyn FnMut(Message),
    ) -> Module {
        let mut root_body = String::new();

        let plugin = document
            .root()
            .children()
            .find(|node| node.is_element() && node.has_tag_name("plugin"));
        match plugin {
            Some(plugin) => {
                for child in plugin.children().filter(Node::is_element) {
                    if let Some(line) = self.field_line(child, 1, on_message) {
                        root_body.push('\t');
                        root_body.push_str(&line);
                    }
                }
            }
            None => on_message(Message::MissingPluginElement {
                file_id: self.file_id,
            }),
        }

        Module {
            definitions: self.definitions,
            root: Definition {
                kind: FieldKind::Block,
                name: format!("{TAG_GROUP}_block"),
                body: root_body,
            },
        }
    }

    /// Produce the one-line field rendering for `node`, interning a
    /// [`Definition`] first when the field is container-shaped.
    ///
    /// Returns `None` for nodes with no rendering of their own:
    /// organizational wrappers, comments, and anything past the depth bound.
    fn field_line(
        &mut self,
        node: Node<'_, '_>,
        depth: usize,
        on_message: &mut dyn FnMut(Message),
    ) -> Option<String> {
        if depth > MAX_WALK_DEPTH {
            on_message(Message::DepthLimitExceeded {
                file_id: self.file_id,
                range: node.range(),
                limit: MAX_WALK_DEPTH,
            });
            return None;
        }

        let tag = node.tag_name().name().to_ascii_lowercase();

        if is_organizational(&tag) {
            // Walked for their children, but the children's lines belong to
            // no body. Definitions interned below stay reachable by content.
            for child in node.children().filter(Node::is_element) {
                self.field_line(child, depth + 1, on_message);
            }
            return None;
        }

        let kind = FieldKind::classify(&tag);
        if kind == FieldKind::Undefined {
            on_message(Message::UnknownFieldType {
                file_id: self.file_id,
                range: node.range(),
                name: tag.clone(),
                suggestion: field::closest_known_type(&tag),
            });
        }

        // TODO: render comments as `_field_explanation` lines from the
        // `title` attribute and text content instead of dropping them.
        if kind == FieldKind::Comment {
            return None;
        }

        let display_name = node.attribute("name").unwrap_or("").to_ascii_lowercase();

        if !kind.is_container() {
            return Some(render_field(kind, &display_name, None));
        }

        let mut body = String::new();
        for child in node.children().filter(Node::is_element) {
            if let Some(line) = self.field_line(child, depth + 1, on_message) {
                body.push('\t');
                body.push_str(&line);
            }
        }

        let name = self.intern_definition(kind, &display_name, body);
        Some(render_field(kind, &display_name, Some(&name)))
    }

    /// Intern a container's rendered body, reusing a structurally identical
    /// definition when one exists, otherwise resolving a unique name for the
    /// new definition.
    ///
    /// Structural identity is the full body text: two definitions collapse
    /// only when their rendered content is exactly equal.
    fn intern_definition(&mut self, kind: FieldKind, display_name: &str, body: String) -> String {
        if let Some(&index) = self.bodies.get(&body) {
            return self.definitions[index].name.clone();
        }

        let name = self.resolve_name(candidate_name(display_name, kind));
        let index = self.definitions.len();
        self.definitions.push(Definition {
            kind,
            name: name.clone(),
            body: body.clone(),
        });
        self.bodies.insert(body, index);
        name
    }

    /// Resolve a candidate name against every name handed out so far. The
    /// first definition to request a candidate keeps it unchanged; later
    /// requests (necessarily different bodies) are marked with the new usage
    /// count, starting at `$2`.
    fn resolve_name(&mut self, candidate: String) -> String {
        let count = self.name_counts.entry(candidate.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            candidate
        } else {
            format!("{candidate}${count}")
        }
    }
}

/// Organizational wrappers carrying no field semantics of their own.
fn is_organizational(tag: &str) -> bool {
    matches!(tag, "plugin" | "revisions" | "revision")
}

/// Derive a definition's candidate name from its declaring field's display
/// name: case-folded, whitespace and hyphens mapped to underscores, quote
/// characters dropped, prefixed with the tag group and suffixed by shape.
fn candidate_name(display_name: &str, kind: FieldKind) -> String {
    let mut name = format!("{TAG_GROUP}_");
    for c in display_name.chars() {
        match c {
            '\'' | '"' => {}
            c if c.is_ascii_whitespace() || c == '-' => name.push('_'),
            c => name.push(c.to_ascii_lowercase()),
        }
    }
    if kind == FieldKind::Block {
        name.push_str("_block");
    } else {
        name.push_str("_definition");
    }
    name
}

/// Render a single field line. Bit and option fields are bare string
/// literals; everything else is a `{ type, name, ... }` record.
fn render_field(kind: FieldKind, display_name: &str, definition: Option<&str>) -> String {
    if matches!(kind, FieldKind::Bit | FieldKind::Option) {
        return format!("\"{display_name}\",\n");
    }

    let mut line = format!("{{ {}, \"{}\"", kind.mandrill_token(), display_name);
    match kind {
        FieldKind::Block => {
            // `TAG_BLOCK` declares both the definition and a `<name>_block`
            // block variable; field lines reference the latter.
            line.push_str(", &");
            line.push_str(definition.unwrap_or(""));
            line.push_str("_block");
        }
        FieldKind::TagRef => line.push_str(", &tagref_fixme"),
        kind if kind.is_enum_or_flags() => {
            line.push_str(", &");
            line.push_str(definition.unwrap_or(""));
        }
        _ => {}
    }
    line.push_str(" },\n");
    line
}
