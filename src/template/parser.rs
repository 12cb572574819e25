//! Template tokenizer and block parser.
//!
//! Turns a placeholder-bearing string into a tree of text, placeholder, and
//! block nodes. Blocks (`{{#if}}`, `{{#unless}}`, `{{#each}}`) nest; a close
//! tag closes only the innermost open block of the same kind. Every node
//! keeps its original source text so malformed input — unclosed opens,
//! orphaned closes, mismatched pairs — degrades to the literal `{{...}}`
//! token in the output instead of an error.

/// Block flavor of an open/close tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    If,
    Unless,
    Each,
}

/// One node of the parsed template tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    /// Literal text between tokens (also produced by degraded tags).
    Text(String),
    /// A `{{...}}` token that is not a block tag. `body` is trimmed,
    /// `raw` is the exact source including braces.
    Placeholder { body: String, raw: String },
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub kind: BlockKind,
    pub arg: String,
    pub raw_open: String,
    pub raw_close: String,
    pub children: Vec<Node>,
}

impl Node {
    /// Reconstruct the original source of this node.
    pub(crate) fn write_raw(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Placeholder { raw, .. } => out.push_str(raw),
            Node::Block(b) => b.write_raw(out),
        }
    }
}

impl Block {
    pub(crate) fn write_raw(&self, out: &mut String) {
        out.push_str(&self.raw_open);
        for child in &self.children {
            child.write_raw(out);
        }
        out.push_str(&self.raw_close);
    }
}

enum Token {
    Text(String),
    Open { kind: BlockKind, arg: String, raw: String },
    Close { kind: BlockKind, raw: String },
    Placeholder { body: String, raw: String },
}

struct Frame {
    kind: BlockKind,
    arg: String,
    raw_open: String,
    children: Vec<Node>,
}

/// Parse a template into a node tree. Never fails: anything that does not
/// form a proper block falls back to literal text.
pub(crate) fn parse(template: &str) -> Vec<Node> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokenize(template) {
        match token {
            Token::Text(t) => push_node(&mut root, &mut stack, Node::Text(t)),
            Token::Placeholder { body, raw } => {
                push_node(&mut root, &mut stack, Node::Placeholder { body, raw });
            }
            Token::Open { kind, arg, raw } => {
                stack.push(Frame { kind, arg, raw_open: raw, children: Vec::new() });
            }
            Token::Close { kind, raw } => match stack.pop() {
                Some(frame) if frame.kind == kind => {
                    let node = Node::Block(Block {
                        kind: frame.kind,
                        arg: frame.arg,
                        raw_open: frame.raw_open,
                        raw_close: raw,
                        children: frame.children,
                    });
                    push_node(&mut root, &mut stack, node);
                }
                Some(frame) => {
                    // wrong-kind close: keep the open frame, emit the close
                    // as literal text
                    stack.push(frame);
                    push_node(&mut root, &mut stack, Node::Text(raw));
                }
                None => push_node(&mut root, &mut stack, Node::Text(raw)),
            },
        }
    }

    // unclosed opens degrade: the open tag becomes literal text and its
    // children are spliced into the parent, innermost first
    while let Some(frame) = stack.pop() {
        let mut nodes = Vec::with_capacity(frame.children.len() + 1);
        nodes.push(Node::Text(frame.raw_open));
        nodes.extend(frame.children);
        match stack.last_mut() {
            Some(parent) => parent.children.extend(nodes),
            None => root.extend(nodes),
        }
    }
    root
}

fn push_node(root: &mut Vec<Node>, stack: &mut Vec<Frame>, node: Node) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(node),
        None => root.push(node),
    }
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let raw = &rest[start..start + 2 + end + 2];
                tokens.push(classify(&after[..end], raw));
                rest = &after[end + 2..];
            }
            None => {
                // dangling `{{` with no close: the remainder is text
                tokens.push(Token::Text(rest[start..].to_string()));
                return tokens;
            }
        }
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    tokens
}

fn classify(body: &str, raw: &str) -> Token {
    let t = body.trim();
    for (prefix, kind) in [
        ("#if ", BlockKind::If),
        ("#unless ", BlockKind::Unless),
        ("#each ", BlockKind::Each),
    ] {
        if let Some(arg) = t.strip_prefix(prefix) {
            return Token::Open {
                kind,
                arg: arg.trim().to_string(),
                raw: raw.to_string(),
            };
        }
    }
    let close = match t {
        "/if" => Some(BlockKind::If),
        "/unless" => Some(BlockKind::Unless),
        "/each" => Some(BlockKind::Each),
        _ => None,
    };
    match close {
        Some(kind) => Token::Close { kind, raw: raw.to_string() },
        None => Token::Placeholder {
            body: t.to_string(),
            raw: raw.to_string(),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
