/* C-style layout resolution: alignment, offsets, padding, flattening */

use crate::errors::{StructError, StructResult};
use crate::field::{Element, Field};
use indexmap::IndexMap;
use tracing::trace;

/* Round `value` up to a multiple of `alignment` (any positive alignment) */
fn align_up(value: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl Element {
    fn alignment(&self) -> usize {
        match self {
            Element::Field(field) => field.alignment,
            Element::Union(union) => union
                .fields
                .iter()
                .map(|f| f.alignment)
                .max()
                .unwrap_or(0),
        }
    }

    fn byte_length(&self) -> usize {
        match self {
            Element::Field(field) => field.byte_length,
            Element::Union(union) => union.fields.first().map_or(0, |f| f.byte_length),
        }
    }

    fn members_mut(&mut self) -> &mut [Field] {
        match self {
            Element::Field(field) => std::slice::from_mut(field),
            Element::Union(union) => &mut union.fields,
        }
    }

    fn set_byte_offset(&mut self, offset: usize) {
        for field in self.members_mut() {
            field.byte_offset = offset;
        }
    }

    fn set_padding(&mut self, padding: usize) {
        for field in self.members_mut() {
            field.padding = padding;
        }
    }
}

/// Resolved placement of every field of a struct type.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub(crate) fields: Vec<Field>,
    pub(crate) names: IndexMap<String, usize>,
    pub(crate) byte_length: usize,
    pub(crate) alignment: usize,
}

/// Largest natural alignment over all fields (union members included);
/// zero when there are no fields.
pub(crate) fn resolve_alignment(elements: &[Element]) -> usize {
    elements.iter().map(Element::alignment).max().unwrap_or(0)
}

/// Assigns offsets in one pass. Padding needed before an element is charged
/// to the element preceding it; trailing padding goes to the last element.
pub(crate) fn assign_byte_offsets(elements: &mut [Element], struct_alignment: usize) -> usize {
    let mut offset = 0usize;
    for i in 0..elements.len() {
        let align = elements[i].alignment().min(struct_alignment);
        let padding = align_up(offset, align) - offset;
        offset += padding;
        if i > 0 {
            elements[i - 1].set_padding(padding);
        }
        elements[i].set_byte_offset(offset);
        offset += elements[i].byte_length();
    }
    if let Some(last) = elements.last_mut() {
        let padding = align_up(offset, struct_alignment) - offset;
        offset += padding;
        last.set_padding(padding);
    }
    offset
}

/// Expands unions in place. Members of one union share a partition id;
/// every other field gets its own.
pub(crate) fn flatten(elements: Vec<Element>) -> Vec<Field> {
    let mut fields = Vec::new();
    for (partition, element) in elements.into_iter().enumerate() {
        let members = match element {
            Element::Field(field) => vec![field],
            Element::Union(union) => union.fields,
        };
        for mut field in members {
            field.partition = partition;
            fields.push(field);
        }
    }
    fields
}

/* Name -> flattened index; names are unique across union members too */
fn index_names(fields: &[Field]) -> StructResult<IndexMap<String, usize>> {
    let mut names = IndexMap::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if names.insert(field.name.clone(), index).is_some() {
            return Err(StructError::DuplicateField {
                name: field.name.clone(),
            });
        }
    }
    Ok(names)
}

pub(crate) fn compute(mut elements: Vec<Element>) -> StructResult<Layout> {
    let alignment = resolve_alignment(&elements);
    let byte_length = assign_byte_offsets(&mut elements, alignment);
    let fields = flatten(elements);
    let names = index_names(&fields)?;
    for field in &fields {
        trace!(
            field = %field.name,
            byte_offset = field.byte_offset,
            byte_length = field.byte_length,
            padding = field.padding,
            partition = field.partition,
            "placed field"
        );
    }
    Ok(Layout {
        fields,
        names,
        byte_length,
        alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{normalize, ElementSpec, FieldSpec, UnionSpec};
    use dstruct_types::DataType;

    fn layout(specs: Vec<ElementSpec>) -> Layout {
        compute(normalize(&specs).unwrap()).unwrap()
    }

    #[test]
    fn padding_is_charged_to_the_previous_field() {
        let layout = layout(vec![
            FieldSpec::new("a", DataType::Int8).into(),
            FieldSpec::new("b", DataType::Float64).into(),
        ]);
        assert_eq!(layout.alignment, 8);
        assert_eq!(layout.byte_length, 16);
        assert_eq!(layout.fields[0].padding, 7);
        assert_eq!(layout.fields[1].byte_offset, 8);
        assert_eq!(layout.fields[1].padding, 0);
    }

    #[test]
    fn trailing_padding_reaches_struct_alignment() {
        let layout = layout(vec![
            FieldSpec::new("a", DataType::Int32).into(),
            FieldSpec::new("b", DataType::Int8).into(),
        ]);
        assert_eq!(layout.byte_length, 8);
        assert_eq!(layout.fields[1].padding, 3);
    }

    #[test]
    fn union_members_share_offset_and_padding() {
        let layout = layout(vec![
            FieldSpec::new("tag", DataType::Uint8).into(),
            UnionSpec::new([
                FieldSpec::new("f", DataType::Float64),
                FieldSpec::new("u", DataType::Uint32).length(2),
            ])
            .into(),
            FieldSpec::new("flag", DataType::Bool).into(),
        ]);
        let [tag, f, u, flag] = &layout.fields[..] else {
            panic!("expected four fields");
        };
        assert_eq!(tag.padding, 7);
        assert_eq!((f.byte_offset, u.byte_offset), (8, 8));
        assert_eq!((f.padding, u.padding), (0, 0));
        assert_eq!(f.partition, u.partition);
        assert_ne!(tag.partition, f.partition);
        assert_eq!(flag.byte_offset, 16);
        assert_eq!(flag.padding, 7);
        assert_eq!(layout.byte_length, 24);
    }

    #[test]
    fn duplicate_names_across_unions_are_rejected() {
        let err = compute(
            normalize(&[
                ElementSpec::from(FieldSpec::new("x", DataType::Int8)),
                ElementSpec::from(UnionSpec::new([FieldSpec::new("x", DataType::Uint8)])),
            ])
            .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, StructError::DuplicateField { name } if name == "x"));
    }

    #[test]
    fn empty_layout_has_no_size() {
        let layout = layout(Vec::new());
        assert_eq!(layout.byte_length, 0);
        assert_eq!(layout.alignment, 0);
        assert!(layout.names.is_empty());
    }
}
