use serde::{Deserialize, Serialize};

/// Static type of a value as serialized by the front end
///
/// Pointers are opaque: the pointee type travels with the instructions that
/// access memory (`Load`, `Store`, `GEP`, `Alloca`) instead of the pointer.
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone)]
pub enum Type {
    Void,
    Int {
        width: usize,
    },
    Float {
        width: usize,
        name: String,
    },
    Array {
        element: Box<Type>,
        length: usize,
    },
    /// `name` is absent for literal structs, `fields` for opaque ones
    Struct {
        name: Option<String>,
        fields: Option<Vec<Type>>,
    },
    Function {
        params: Vec<Type>,
        variadic: bool,
        ret: Box<Type>,
    },
    Pointer {
        #[serde(default)]
        address_space: usize,
    },
    /// `fixed` is false for scalable vectors
    Vector {
        element: Box<Type>,
        fixed: bool,
        length: usize,
    },
    Label,
    Token,
    Metadata,
}

/// A named struct definition shared by the whole module
#[derive(Serialize, Deserialize, Clone)]
pub struct UserDefinedStruct {
    pub name: Option<String>,
    /// absent when the struct is only declared
    pub fields: Option<Vec<Type>>,
}
