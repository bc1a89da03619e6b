//! Serialized representation of a program, as emitted by the front end
pub mod cfg;
pub mod constant;
pub mod function;
pub mod instruction;
pub mod module;
pub mod typing;
pub mod value;

#[cfg(test)]
mod tests {
    use super::instruction::{Inst, Instruction};
    use super::module::Module;
    use super::typing::Type;
    use super::value::Value;

    #[test]
    fn optional_fields_default() {
        let content = r#"{
            "name": "m",
            "functions": [{
                "name": "f",
                "ty": {"Function": {"params": [], "variadic": false, "ret": "Void"}},
                "is_defined": true,
                "params": [],
                "blocks": [{
                    "label": 0,
                    "body": [
                        {"ty": {"Pointer": {}}, "index": 1,
                         "repr": {"Alloca": {"allocated_type": {"Int": {"width": 32}}}}}
                    ],
                    "terminator": {"ty": "Void", "index": 2, "repr": {"Return": {}}}
                }]
            }]
        }"#;
        let module: Module = serde_json::from_str(content).unwrap();
        assert!(module.asm.is_empty());
        assert!(module.structs.is_empty());

        let block = &module.functions[0].blocks[0];
        assert!(block.name.is_none());
        assert!(matches!(
            &block.body[0],
            Instruction {
                ty: Type::Pointer { address_space: 0 },
                index: 1,
                repr: Inst::Alloca {
                    size: None,
                    address_space: 0,
                    ..
                },
            }
        ));
        assert!(matches!(
            block.terminator.repr,
            Inst::Return { value: None }
        ));
    }

    #[test]
    fn operands_are_tagged() {
        let value: Value = serde_json::from_str(
            r#"{"Constant": {"ty": {"Int": {"width": 64}}, "repr": {"Int": {"value": "-7"}}}}"#,
        )
        .unwrap();
        assert!(matches!(value, Value::Constant(_)));

        let value: Value =
            serde_json::from_str(r#"{"Instruction": {"ty": {"Pointer": {}}, "index": 3}}"#)
                .unwrap();
        assert!(matches!(value, Value::Instruction { index: 3, .. }));
    }
}
