use proptest::prelude::*;
use textdoc::{Position, Range, TextBuffer, TextChange};

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!['a', 'b', ' ', '\n', '⌘', 'é', '𝄞', '\r']),
        0..48,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn char_boundaries(text: &str) -> Vec<usize> {
    (0..=text.len())
        .filter(|&i| text.is_char_boundary(i))
        .collect()
}

fn all_positions(text: &str) -> Vec<Position> {
    text.split('\n')
        .enumerate()
        .flat_map(|(line, content)| {
            (0..=content.chars().count()).map(move |ch| Position::new(line as u32, ch as u32))
        })
        .collect()
}

proptest! {
    /// Every scalar boundary survives byte -> position -> byte.
    #[test]
    fn prop_byte_offset_roundtrip(text in arb_text()) {
        let buffer = TextBuffer::new(text.as_str());
        for offset in char_boundaries(&text) {
            let position = buffer.byte_offset_to_position(offset).unwrap();
            prop_assert_eq!(buffer.position_to_byte_offset(position).unwrap(), offset);
        }
    }

    /// Every valid position survives position -> byte -> position.
    #[test]
    fn prop_position_roundtrip(text in arb_text()) {
        let buffer = TextBuffer::new(text.as_str());
        for position in all_positions(&text) {
            let offset = buffer.position_to_byte_offset(position).unwrap();
            prop_assert_eq!(buffer.byte_offset_to_position(offset).unwrap(), position);
        }
    }

    /// Points and positions describe the same places.
    #[test]
    fn prop_point_roundtrip(text in arb_text()) {
        let buffer = TextBuffer::new(text.as_str());
        for position in all_positions(&text) {
            let point = buffer.position_to_point(position).unwrap();
            prop_assert_eq!(point.row, position.line as usize);
            prop_assert_eq!(buffer.point_to_position(point).unwrap(), position);
        }
    }

    /// Line count tracks the terminator count after every edit in a sequence.
    #[test]
    fn prop_edits_keep_lines_consistent(
        text in arb_text(),
        edits in prop::collection::vec(
            (arb_text(), any::<prop::sample::Index>(), any::<prop::sample::Index>()),
            1..8,
        ),
    ) {
        let mut buffer = TextBuffer::new(text.as_str());
        let mut expected = text;

        for (insert, a, b) in edits {
            let boundaries = char_boundaries(&expected);
            let (x, y) = (a.get(&boundaries), b.get(&boundaries));
            let (start, end) = (*x.min(y), *x.max(y));

            let range = Range::new(
                buffer.byte_offset_to_position(start).unwrap(),
                buffer.byte_offset_to_position(end).unwrap(),
            );
            let edit = buffer.apply_change(&TextChange::new(range, insert.as_str())).unwrap();
            expected.replace_range(start..end, &insert);

            prop_assert_eq!(buffer.as_str().unwrap(), expected.as_str());
            prop_assert_eq!(buffer.line_count(), 1 + expected.matches('\n').count());
            prop_assert_eq!(buffer.line_index().starts().len(), buffer.line_count());
            prop_assert_eq!(edit.new_end_byte, start + insert.len());
            let new_end_point = buffer.byte_offset_to_point(edit.new_end_byte).unwrap();
            prop_assert_eq!(new_end_point, edit.new_end_point);
        }
    }
}
