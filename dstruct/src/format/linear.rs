/* Byte-per-line table: | byte | field[byte] or -- | // notes | */

use super::partition_groups;
use crate::field::Field;
use crate::struct_type::StructType;

/* Nested structs stay opaque; their own layout is not re-derived here */
pub(crate) fn linear_string(ty: &StructType) -> String {
    let fields = ty.field_list();
    let byte_length = ty.byte_length();
    if byte_length == 0 {
        return String::new();
    }
    let w0 = (byte_length - 1).to_string().len();
    let w1 = fields
        .iter()
        .map(|f| f.name.len() + 2 + f.byte_length.saturating_sub(1).to_string().len())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(byte_length);
    let mut byte = 0usize;
    for group in partition_groups(fields) {
        let (owner, aliases) = (&group[0], &group[1..]);
        let element = owner.element_size().max(1);
        for j in 0..owner.byte_length {
            let name = format!("{}[{}]", owner.name, j);
            let mut note = String::new();
            if element > 1 && !owner.field_type.is_struct() {
                note.push_str(&format!(" (byte {})", j % element));
            }
            if !aliases.is_empty() {
                let members = aliases
                    .iter()
                    .map(|f| alias_note(f, j))
                    .collect::<Vec<_>>()
                    .join(", ");
                note.push_str(&format!(" => union: {}", members));
            }
            let label = owner.field_type.label();
            let notes = if owner.length.is_some() {
                format!("// {}[{}]{}", label, j / element, note)
            } else {
                format!("// {}{}", label, note)
            };
            lines.push(format!("{:>w0$}: {:>w1$}   {}", byte, name, notes));
            byte += 1;
        }
        for _ in 0..owner.padding {
            lines.push(format!("{:>w0$}: {:>w1$}   // padding", byte, "--"));
            byte += 1;
        }
    }
    lines.join("\n")
}

fn alias_note(field: &Field, j: usize) -> String {
    format!(
        "{}<{}>[{}]",
        field.name,
        field.field_type.label(),
        j % field.element_size().max(1)
    )
}
