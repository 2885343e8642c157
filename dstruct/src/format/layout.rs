/* Compact layout string: |<dtype[,dtype...]>[offset,length]|... */

use super::partition_groups;
use crate::field::FieldType;
use crate::struct_type::StructType;

pub(crate) fn layout_string(ty: &StructType) -> String {
    let mut tokens = Vec::new();
    push_tokens(ty, 0, &mut tokens);
    if tokens.is_empty() {
        "|".to_string()
    } else {
        format!("|{}|", tokens.join("|"))
    }
}

/* Appends the tokens of `ty` with every offset shifted by `base` */
fn push_tokens(ty: &StructType, base: usize, tokens: &mut Vec<String>) {
    for group in partition_groups(ty.field_list()) {
        let first = &group[0];
        if let [field] = group {
            if let FieldType::Struct(child) = &field.field_type {
                /* A nested struct expands to its own tokens; arrays once per element */
                let stride = child.byte_length();
                for i in 0..field.length.unwrap_or(1) {
                    push_tokens(child, base + field.byte_offset + i * stride, tokens);
                }
                continue;
            }
        }
        let labels = group
            .iter()
            .map(|f| f.field_type.label())
            .collect::<Vec<_>>()
            .join(",");
        tokens.push(format!(
            "<{}>[{},{}]",
            labels,
            base + first.byte_offset,
            first.byte_length
        ));
    }
}
