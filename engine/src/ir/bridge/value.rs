use std::fmt::{Display, Formatter};

use crate::ir::bridge::constant::Constant;
use crate::ir::bridge::typing::Type;

/// Represents an identifier in the program
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub struct Identifier(String);

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}
impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Identity of an instruction, unique within its function
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug)]
pub struct InstId(usize);

impl From<usize> for InstId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}
impl From<&usize> for InstId {
    fn from(index: &usize) -> Self {
        Self(*index)
    }
}

impl Display for InstId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Label of a basic block, unique within its function
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug)]
pub struct BlockLabel(usize);

impl From<usize> for BlockLabel {
    fn from(label: usize) -> Self {
        Self(label)
    }
}
impl From<&usize> for BlockLabel {
    fn from(label: &usize) -> Self {
        Self(*label)
    }
}

impl Display for BlockLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// An naive translation of an operand
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Value {
    /// a constant value
    Constant(Constant),
    /// input
    Argument { index: usize, ty: Type },
    /// intermediate state
    Register { index: InstId, ty: Type },
    /// reference to an instruction that does not exist in the function
    Unresolved { index: usize, ty: Type },
}

impl Value {
    /// The defining instruction, if this operand is an intermediate state
    pub fn as_register(&self) -> Option<InstId> {
        match self {
            Self::Register { index, .. } => Some(*index),
            Self::Constant(_) | Self::Argument { .. } | Self::Unresolved { .. } => None,
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            Self::Constant(constant) => constant.ty(),
            Self::Argument { ty, .. }
            | Self::Register { ty, .. }
            | Self::Unresolved { ty, .. } => ty,
        }
    }
}
