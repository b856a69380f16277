//! Reflected methods.

use std::collections::HashSet;
use std::fmt;

use bitflags::bitflags;
use pyrite_types::node::MethodNode;

use crate::class::ClassInfo;
use crate::parameter::{ParameterData, ParameterInfo};
use crate::{Error, Result};

const CONSTRUCTOR_NAME: &str = "__construct";
const DESTRUCTOR_NAME: &str = "__destruct";

bitflags! {
    /// Modifier keywords of a method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierFlags: u8 {
        const ABSTRACT = 1 << 0;
        const FINAL = 1 << 1;
        const PRIVATE = 1 << 2;
        const PROTECTED = 1 << 3;
        const PUBLIC = 1 << 4;
        const STATIC = 1 << 5;
    }
}

impl ModifierFlags {
    /// Test each modifier predicate of the node independently.
    ///
    /// Contradictory combinations such as abstract + final are passed
    /// through as declared.
    pub fn from_node(node: &MethodNode) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::ABSTRACT, node.is_abstract());
        flags.set(Self::FINAL, node.is_final());
        flags.set(Self::PRIVATE, node.is_private());
        flags.set(Self::PROTECTED, node.is_protected());
        flags.set(Self::PUBLIC, node.is_public());
        flags.set(Self::STATIC, node.is_static());
        flags
    }
}

/// Owned method record, stored in its class's method table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MethodData {
    pub(crate) name: String,
    pub(crate) flags: ModifierFlags,
    pub(crate) parameters: Vec<ParameterData>,
}

impl MethodData {
    pub(crate) fn from_node(node: &MethodNode, class_name: &str) -> Result<Self> {
        if node.name.is_empty() {
            return Err(Error::MalformedNode {
                node: "method",
                reason: format!("method in {} has no name", class_name),
            });
        }

        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(node.params.len());
        for (position, param) in node.params.iter().enumerate() {
            if param.name.is_empty() {
                return Err(Error::MalformedNode {
                    node: "parameter",
                    reason: format!(
                        "parameter #{} of {}::{} has no name",
                        position, class_name, node.name
                    ),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(Error::MalformedNode {
                    node: "parameter",
                    reason: format!(
                        "parameter ${} is declared twice in {}::{}",
                        param.name, class_name, node.name
                    ),
                });
            }
            parameters.push(ParameterData::from_node(param));
        }

        Ok(Self {
            name: node.name.clone(),
            flags: ModifierFlags::from_node(node),
            parameters,
        })
    }
}

/// A method of a reflected class.
///
/// This is a borrowed handle into the owning [`ClassInfo`]; the class
/// outlives every handle, so [`MethodInfo::declaring_class`] is always
/// available and can never be used to mutate the class.
#[derive(Clone, Copy)]
pub struct MethodInfo<'a> {
    class: &'a ClassInfo,
    data: &'a MethodData,
}

impl<'a> MethodInfo<'a> {
    pub(crate) fn new(class: &'a ClassInfo, data: &'a MethodData) -> Self {
        Self { class, data }
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.data.flags
    }

    pub fn is_abstract(&self) -> bool {
        self.data.flags.contains(ModifierFlags::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.data.flags.contains(ModifierFlags::FINAL)
    }

    pub fn is_private(&self) -> bool {
        self.data.flags.contains(ModifierFlags::PRIVATE)
    }

    pub fn is_protected(&self) -> bool {
        self.data.flags.contains(ModifierFlags::PROTECTED)
    }

    pub fn is_public(&self) -> bool {
        self.data.flags.contains(ModifierFlags::PUBLIC)
    }

    pub fn is_static(&self) -> bool {
        self.data.flags.contains(ModifierFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.data.name == CONSTRUCTOR_NAME
    }

    pub fn is_destructor(&self) -> bool {
        self.data.name == DESTRUCTOR_NAME
    }

    /// Formal parameters in declaration order.
    pub fn parameters(&self) -> Vec<ParameterInfo<'a>> {
        self.data
            .parameters
            .iter()
            .enumerate()
            .map(|(position, data)| ParameterInfo::new(*self, position, data))
            .collect()
    }

    /// Look up a parameter by name (without the `$` sigil).
    pub fn parameter(&self, name: &str) -> Option<ParameterInfo<'a>> {
        self.parameters().into_iter().find(|p| p.name() == name)
    }

    pub fn number_of_parameters(&self) -> usize {
        self.data.parameters.len()
    }

    pub fn number_of_required_parameters(&self) -> usize {
        self.data
            .parameters
            .iter()
            .filter(|p| !p.is_optional())
            .count()
    }

    pub fn declaring_class(&self) -> &'a ClassInfo {
        self.class
    }
}

/// Two handles are equal when they point at the same method of the same class.
impl PartialEq for MethodInfo<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.class, other.class) && std::ptr::eq(self.data, other.data)
    }
}

impl Eq for MethodInfo<'_> {}

impl fmt::Debug for MethodInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("class", &self.class.name())
            .field("name", &self.data.name)
            .field("modifiers", &self.data.flags)
            .field("parameters", &self.data.parameters.len())
            .finish()
    }
}
