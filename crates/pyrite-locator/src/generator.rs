use std::fmt::Write;

use pyrite_types::{LiveMethod, LiveParameter, LiveProperty, LiveType, LiveTypeKind};

/// Turns the shape of a live type back into declaration source text.
///
/// The output does not carry the source preamble; the caller adds it.
pub trait DeclarationGenerator: Send + Sync {
    fn generate(&self, live_type: &LiveType) -> String;
}

/// Regenerates declarations with empty method bodies.
///
/// The result is not byte-identical to any original file, but it declares
/// the same name, hierarchy, constants, properties and method signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeclarationGenerator;

const INDENT: &str = "    ";

impl DeclarationGenerator for DefaultDeclarationGenerator {
    fn generate(&self, live_type: &LiveType) -> String {
        let mut out = String::new();

        if let Some(namespace) = live_type.namespace() {
            let _ = writeln!(out, "namespace {};\n", namespace.name());
        }

        out.push_str(&header(live_type));
        out.push_str("\n{\n");

        let mut sections: Vec<String> = Vec::new();

        if !live_type.constants.is_empty() {
            let mut block = String::new();
            for constant in &live_type.constants {
                let _ = writeln!(block, "{}const {} = {};", INDENT, constant.name, constant.value);
            }
            sections.push(block);
        }

        // Interfaces cannot declare properties
        if live_type.kind != LiveTypeKind::Interface && !live_type.properties.is_empty() {
            let mut block = String::new();
            for property in &live_type.properties {
                let _ = writeln!(block, "{}{}", INDENT, property_declaration(property));
            }
            sections.push(block);
        }

        for method in &live_type.methods {
            sections.push(method_declaration(live_type.kind, method));
        }

        out.push_str(&sections.join("\n"));
        out.push_str("}\n");
        out
    }
}

fn header(live_type: &LiveType) -> String {
    let mut header = String::new();

    match live_type.kind {
        LiveTypeKind::Class => {
            if live_type.is_abstract {
                header.push_str("abstract ");
            }
            if live_type.is_final {
                header.push_str("final ");
            }
            header.push_str("class ");
        }
        LiveTypeKind::Interface => header.push_str("interface "),
        LiveTypeKind::Trait => header.push_str("trait "),
    }
    header.push_str(live_type.short_name());

    match live_type.kind {
        LiveTypeKind::Class => {
            if let Some(parent) = &live_type.parent {
                let _ = write!(header, " extends {}", qualify(parent));
            }
            if !live_type.interfaces.is_empty() {
                let _ = write!(header, " implements {}", qualify_all(&live_type.interfaces));
            }
        }
        // Interfaces extend other interfaces
        LiveTypeKind::Interface if !live_type.interfaces.is_empty() => {
            let _ = write!(header, " extends {}", qualify_all(&live_type.interfaces));
        }
        _ => {}
    }

    header
}

fn property_declaration(property: &LiveProperty) -> String {
    let mut decl = property.visibility.to_string();
    if property.is_static {
        decl.push_str(" static");
    }
    let _ = write!(decl, " ${}", property.name);
    if let Some(default) = &property.default {
        let _ = write!(decl, " = {}", default);
    }
    decl.push(';');
    decl
}

fn method_declaration(kind: LiveTypeKind, method: &LiveMethod) -> String {
    let mut decl = String::from(INDENT);

    if method.is_abstract && kind != LiveTypeKind::Interface {
        decl.push_str("abstract ");
    }
    if method.is_final {
        decl.push_str("final ");
    }
    let _ = write!(decl, "{} ", method.visibility);
    if method.is_static {
        decl.push_str("static ");
    }

    let params: Vec<String> = method.parameters.iter().map(parameter_declaration).collect();
    let _ = write!(decl, "function {}({})", method.name, params.join(", "));

    if let Some(return_type) = &method.return_type {
        let _ = write!(decl, ": {}", return_type);
    }

    if method.is_abstract || kind == LiveTypeKind::Interface {
        decl.push_str(";\n");
    } else {
        let _ = write!(decl, "\n{}{{\n{}}}\n", INDENT, INDENT);
    }
    decl
}

fn parameter_declaration(param: &LiveParameter) -> String {
    let mut decl = String::new();
    if let Some(type_hint) = &param.type_hint {
        let _ = write!(decl, "{} ", type_hint);
    }
    if param.by_ref {
        decl.push('&');
    }
    if param.is_variadic {
        decl.push_str("...");
    }
    let _ = write!(decl, "${}", param.name);
    if let Some(default) = &param.default {
        let _ = write!(decl, " = {}", default);
    }
    decl
}

fn qualify(name: &str) -> String {
    format!("\\{}", name.trim_start_matches('\\'))
}

fn qualify_all(names: &[String]) -> String {
    names.iter().map(|n| qualify(n)).collect::<Vec<_>>().join(", ")
}
